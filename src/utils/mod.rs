//! Utility functions and helpers for atlas-export
//!
//! This module provides common utility functions used throughout the application:
//! - String truncation for fixed-width layouts
//! - Elapsed-time formatting for summaries
//! - Path helpers
//! - Size formatting

use std::path::PathBuf;

/// String utilities
pub mod string {
    /// Truncate string to maximum length in characters
    ///
    /// # Arguments
    /// * `s` - String to truncate
    /// * `max_len` - Maximum length, ellipsis included
    ///
    /// # Returns
    /// * `String` - Truncated string with ellipsis if needed
    pub fn truncate(s: &str, max_len: usize) -> String {
        if s.chars().count() <= max_len {
            return s.to_string();
        }
        let kept: String = s.chars().take(max_len.saturating_sub(3)).collect();
        format!("{}...", kept)
    }
}

/// Time utilities
pub mod time {
    /// Elapsed time of an export run for the summary line
    ///
    /// Below a second in milliseconds, below a minute in tenths of a
    /// second, otherwise minutes and zero-padded seconds.
    pub fn format_elapsed(elapsed_ms: u64) -> String {
        match elapsed_ms {
            0..=999 => format!("{elapsed_ms} ms"),
            1_000..=59_999 => format!("{:.1} s", elapsed_ms as f64 / 1000.0),
            _ => {
                let secs = elapsed_ms / 1000;
                format!("{} min {:02} s", secs / 60, secs % 60)
            }
        }
    }
}

/// File system utilities
pub mod fs {
    use super::*;

    /// Expand ~ to home directory
    ///
    /// # Arguments
    /// * `path` - Path potentially starting with ~
    ///
    /// # Returns
    /// * `PathBuf` - Expanded path
    pub fn expand_home(path: &str) -> PathBuf {
        if let Some(rest) = path.strip_prefix("~/")
            && let Some(home) = dirs::home_dir()
        {
            return home.join(rest);
        }
        PathBuf::from(path)
    }
}

/// Conversion utilities
pub mod convert {
    const UNITS: [&str; 4] = ["KB", "MB", "GB", "TB"];

    /// Size of a written export file, one decimal above a kilobyte
    pub fn format_size(bytes: u64) -> String {
        if bytes < 1024 {
            return format!("{bytes} B");
        }
        let mut size = bytes as f64 / 1024.0;
        let mut unit = UNITS[0];
        for next in &UNITS[1..] {
            if size < 1024.0 {
                break;
            }
            size /= 1024.0;
            unit = next;
        }
        format!("{size:.1} {unit}")
    }
}
