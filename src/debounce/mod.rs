//! Delay-coalescing of rapid input
//!
//! A [`Debouncer`] accepts a stream of values and emits only the most recent
//! one after no new value has arrived for the configured quiet window. Each
//! new value restarts the window.

use std::time::Duration;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::sleep;
use tracing::trace;

/// Input side of a debounced channel
#[derive(Debug)]
pub struct Debouncer<T> {
    input: mpsc::UnboundedSender<T>,
    delay: Duration,
    worker: JoinHandle<()>,
}

/// Output side of a debounced channel
#[derive(Debug)]
pub struct Debounced<T> {
    output: mpsc::Receiver<T>,
}

impl<T: Send + 'static> Debouncer<T> {
    /// Start a debouncer with the given quiet window
    ///
    /// Must be called from within a tokio runtime.
    pub fn new(delay: Duration) -> (Self, Debounced<T>) {
        let (input, input_rx) = mpsc::unbounded_channel();
        let (output_tx, output) = mpsc::channel(1);
        let worker = tokio::spawn(run(delay, input_rx, output_tx));

        (
            Self {
                input,
                delay,
                worker,
            },
            Debounced { output },
        )
    }

    /// Submit a value, restarting the quiet window
    ///
    /// Returns false once the output side has been dropped.
    pub fn push(&self, value: T) -> bool {
        self.input.send(value).is_ok()
    }

    pub fn delay(&self) -> Duration {
        self.delay
    }
}

impl<T> Drop for Debouncer<T> {
    fn drop(&mut self) {
        // Closing the input lets the worker flush a pending value; abort only
        // if nobody is listening any more.
        if self.input.is_closed() {
            self.worker.abort();
        }
    }
}

impl<T> Debounced<T> {
    /// Wait for the next settled value
    ///
    /// Returns `None` when the [`Debouncer`] was dropped and nothing is pending.
    pub async fn recv(&mut self) -> Option<T> {
        self.output.recv().await
    }
}

async fn run<T>(delay: Duration, mut input: mpsc::UnboundedReceiver<T>, output: mpsc::Sender<T>) {
    let mut pending: Option<T> = None;

    loop {
        match pending.take() {
            None => match input.recv().await {
                Some(value) => pending = Some(value),
                None => break,
            },
            Some(value) => {
                tokio::select! {
                    next = input.recv() => match next {
                        Some(newer) => {
                            trace!("Debounce window restarted");
                            pending = Some(newer);
                        }
                        None => {
                            // Input closed: flush the last value right away
                            let _ = output.send(value).await;
                            break;
                        }
                    },
                    _ = sleep(delay) => {
                        if output.send(value).await.is_err() {
                            break;
                        }
                    }
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::time::{Instant, timeout};

    const WINDOW: Duration = Duration::from_millis(40);

    #[tokio::test]
    async fn test_emits_only_last_value() {
        let (debouncer, mut out) = Debouncer::new(WINDOW);

        for term in ["j", "jo", "joa", "joao"] {
            assert!(debouncer.push(term.to_string()));
            tokio::time::sleep(Duration::from_millis(5)).await;
        }

        assert_eq!(out.recv().await.as_deref(), Some("joao"));
        assert!(timeout(WINDOW * 3, out.recv()).await.is_err());
    }

    #[tokio::test]
    async fn test_waits_for_quiet_window() {
        let (debouncer, mut out) = Debouncer::new(WINDOW);
        let start = Instant::now();

        debouncer.push(1);
        tokio::time::sleep(Duration::from_millis(20)).await;
        debouncer.push(2);

        assert_eq!(out.recv().await, Some(2));
        // Window restarted by the second value
        assert!(start.elapsed() >= Duration::from_millis(20) + WINDOW);
    }

    #[tokio::test]
    async fn test_separate_bursts_emit_separately() {
        let (debouncer, mut out) = Debouncer::new(WINDOW);

        debouncer.push("first");
        assert_eq!(out.recv().await, Some("first"));

        debouncer.push("second");
        debouncer.push("third");
        assert_eq!(out.recv().await, Some("third"));
    }

    #[tokio::test]
    async fn test_drop_flushes_pending_value() {
        let (debouncer, mut out) = Debouncer::new(Duration::from_secs(60));
        debouncer.push(42);
        drop(debouncer);

        let value = timeout(Duration::from_secs(1), out.recv()).await.unwrap();
        assert_eq!(value, Some(42));
        assert_eq!(out.recv().await, None);
    }

    #[tokio::test]
    async fn test_push_fails_after_output_dropped() {
        let (debouncer, out) = Debouncer::new(Duration::from_millis(1));
        assert_eq!(debouncer.delay(), Duration::from_millis(1));
        drop(out);

        debouncer.push(1);
        tokio::time::sleep(Duration::from_millis(30)).await;
        assert!(!debouncer.push(2));
    }
}
