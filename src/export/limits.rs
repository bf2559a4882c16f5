//! Export size limits and request pacing.

use std::time::Duration;

/// Records requested per page
pub const PAGE_SIZE: u32 = 100;

/// Maximum number of titulares a single export may contain
pub const MAX_RECORDS: u64 = 50_000;

/// Titular count above which callers should ask for confirmation
pub const WARNING_THRESHOLD: u64 = 10_000;

/// Pause between consecutive page requests, in milliseconds
pub const BATCH_DELAY_MS: u64 = 50;

/// Limits applied to one export run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExportLimits {
    pub page_size: u32,
    pub max_records: u64,
    pub warning_threshold: u64,
    pub batch_delay: Duration,
}

impl Default for ExportLimits {
    fn default() -> Self {
        Self {
            page_size: PAGE_SIZE,
            max_records: MAX_RECORDS,
            warning_threshold: WARNING_THRESHOLD,
            batch_delay: Duration::from_millis(BATCH_DELAY_MS),
        }
    }
}

impl ExportLimits {
    /// Same limits without the inter-page pause
    pub fn without_delay(self) -> Self {
        Self {
            batch_delay: Duration::ZERO,
            ..self
        }
    }

    pub fn exceeds_max(&self, titular_count: u64) -> bool {
        titular_count > self.max_records
    }

    pub fn exceeds_warning(&self, titular_count: u64) -> bool {
        titular_count > self.warning_threshold
    }
}
