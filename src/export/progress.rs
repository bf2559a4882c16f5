//! Progress tracking for export operations
//!
//! [`ExportProgress`] is the snapshot the pipeline emits after every page.
//! [`ProgressTracker`] renders those snapshots as a terminal progress bar.

use std::time::Instant;

use indicatif::{ProgressBar, ProgressStyle};

/// Snapshot emitted after each page fetch
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportProgress {
    pub current_page: u32,
    pub total_pages: u32,
    /// Records accumulated so far
    pub record_count: usize,
    pub message: String,
}

impl ExportProgress {
    pub fn new(current_page: u32, total_pages: u32, record_count: usize) -> Self {
        Self {
            current_page,
            total_pages,
            record_count,
            message: format!("Carregando página {current_page}/{total_pages}..."),
        }
    }

    /// Completed fraction in `0.0..=1.0`
    pub fn fraction(&self) -> f64 {
        if self.total_pages == 0 {
            return 1.0;
        }
        (f64::from(self.current_page) / f64::from(self.total_pages)).min(1.0)
    }
}

/// Progress tracker for export operations
///
/// Displays a page-based progress bar with the accumulated record count.
pub struct ProgressTracker {
    /// Start time of the operation
    start_time: Instant,
    /// Progress bar (optional, can be disabled)
    bar: Option<ProgressBar>,
}

impl ProgressTracker {
    /// Create a new progress tracker
    ///
    /// # Arguments
    /// * `enable_bar` - Whether to display a progress bar
    pub fn new(enable_bar: bool) -> Self {
        let bar = if enable_bar {
            let bar = ProgressBar::new(0);
            bar.set_style(
                ProgressStyle::default_bar()
                    .template("{spinner:.green} [{bar:40.cyan/blue}] {pos}/{len} {msg}")
                    .unwrap_or_else(|_| ProgressStyle::default_bar())
                    .progress_chars("#>-"),
            );
            Some(bar)
        } else {
            None
        };

        Self {
            start_time: Instant::now(),
            bar,
        }
    }

    /// Update the bar from a pipeline snapshot
    pub fn update(&self, progress: &ExportProgress) {
        if let Some(ref bar) = self.bar {
            bar.set_length(u64::from(progress.total_pages));
            bar.set_position(u64::from(progress.current_page));

            let elapsed = self.start_time.elapsed().as_secs_f64();
            let speed = if elapsed > 0.0 {
                progress.record_count as f64 / elapsed
            } else {
                0.0
            };
            bar.set_message(format!(
                "{} ({} registros, {:.0}/s)",
                progress.message, progress.record_count, speed
            ));
        }
    }

    /// Finish and clear the progress bar
    pub fn finish(&self) {
        if let Some(ref bar) = self.bar {
            bar.finish_and_clear();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_progress_message() {
        let progress = ExportProgress::new(2, 2, 180);
        assert_eq!(progress.message, "Carregando página 2/2...");
        assert_eq!(progress.fraction(), 1.0);
    }

    #[test]
    fn test_fraction_without_pages() {
        assert_eq!(ExportProgress::new(0, 0, 0).fraction(), 1.0);
        assert_eq!(ExportProgress::new(1, 4, 10).fraction(), 0.25);
    }

    #[test]
    fn test_tracker_without_bar() {
        let tracker = ProgressTracker::new(false);
        tracker.update(&ExportProgress::new(1, 3, 100));
        tracker.finish();
    }
}
