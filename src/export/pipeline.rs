//! Paginated fetch-all and export size estimation
//!
//! The pipeline walks the search endpoint one page at a time, never issuing
//! two requests concurrently, and pauses briefly between pages so a large
//! export does not flood the backend.

use std::sync::Arc;
use std::time::Instant;

use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use crate::client::SearchEndpoint;
use crate::error::{ExportError, Result};
use crate::model::{FilterCriteria, PageResponse, Record};

use super::limits::ExportLimits;
use super::progress::ExportProgress;

/// Pre-flight size estimate derived from the first page only
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExportEstimate {
    pub titular_count: u64,
    pub total_pages: u32,
    /// First-page row count times page count; assumes uniform pages
    pub records_estimate: u64,
}

impl ExportEstimate {
    pub fn exceeds_warning(&self, limits: &ExportLimits) -> bool {
        limits.exceeds_warning(self.titular_count)
    }

    pub fn exceeds_limit(&self, limits: &ExportLimits) -> bool {
        limits.exceeds_max(self.titular_count)
    }
}

/// Result of a fetch-all run
#[derive(Debug, Clone, Default)]
pub struct FetchOutcome {
    /// Records of every page fetched successfully, in page order
    pub records: Vec<Record>,
    /// Titular count reported by the first page
    pub titular_count: u64,
    pub total_pages: u32,
    /// Pages requested, including failed ones
    pub attempted_pages: u32,
    /// Pages whose request failed and were skipped
    pub failed_pages: Vec<u32>,
    /// Whether the run stopped early on cancellation
    pub cancelled: bool,
    /// Time taken by the run
    pub elapsed_ms: u64,
}

impl FetchOutcome {
    /// True when every page was fetched
    pub fn is_complete(&self) -> bool {
        self.failed_pages.is_empty() && !self.cancelled
    }

    /// Number of pages that contributed records
    pub fn fetched_pages(&self) -> u32 {
        self.attempted_pages.saturating_sub(self.failed_pages.len() as u32)
    }
}

/// Export pipeline over a search endpoint
pub struct ExportPipeline {
    endpoint: Arc<dyn SearchEndpoint>,
    limits: ExportLimits,
    cancel_token: Option<CancellationToken>,
}

impl ExportPipeline {
    /// Create a new pipeline
    pub fn new(endpoint: Arc<dyn SearchEndpoint>, limits: ExportLimits) -> Self {
        Self {
            endpoint,
            limits,
            cancel_token: None,
        }
    }

    /// Set cancellation token for fetch-all runs
    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancel_token = Some(token);
        self
    }

    pub fn limits(&self) -> &ExportLimits {
        &self.limits
    }

    /// Fetch a single page, mapping failures to `PageFetch`
    async fn fetch_page(&self, filters: &FilterCriteria, page: u32) -> Result<PageResponse> {
        let params = filters.to_params(page, self.limits.page_size);
        self.endpoint.search(&params).await.map_err(|e| {
            ExportError::PageFetch {
                page,
                message: e.to_string(),
            }
            .into()
        })
    }

    fn is_cancelled(&self) -> bool {
        self.cancel_token
            .as_ref()
            .is_some_and(|token| token.is_cancelled())
    }

    /// Sleep for the configured delay; returns false if cancelled meanwhile
    async fn pause(&self) -> bool {
        if self.limits.batch_delay.is_zero() {
            return !self.is_cancelled();
        }
        match self.cancel_token {
            Some(ref token) => {
                tokio::select! {
                    _ = token.cancelled() => false,
                    _ = tokio::time::sleep(self.limits.batch_delay) => true,
                }
            }
            None => {
                tokio::time::sleep(self.limits.batch_delay).await;
                true
            }
        }
    }

    /// Estimate the export size from the first page
    ///
    /// Issues exactly one request. The estimate is approximate and never
    /// enforces the record limit; [`fetch_all`](Self::fetch_all) does.
    pub async fn estimate(&self, filters: &FilterCriteria) -> Result<ExportEstimate> {
        let first = self.fetch_page(filters, 1).await?;
        let estimate = ExportEstimate {
            titular_count: first.total_titular_count,
            total_pages: first.total_pages,
            records_estimate: first.records.len() as u64 * u64::from(first.total_pages),
        };
        debug!("Export estimate: {:?}", estimate);
        Ok(estimate)
    }

    /// Fetch every page matching `filters`
    pub async fn fetch_all(&self, filters: &FilterCriteria) -> Result<FetchOutcome> {
        self.fetch_all_with_progress(filters, |_| {}).await
    }

    /// Fetch every page matching `filters`, reporting progress after each page
    ///
    /// Steps:
    /// 1. Request page 1 and check the titular count against the limit
    /// 2. Request the following pages one by one, pausing between them
    /// 3. Skip (and record) any page whose request fails
    ///
    /// # Returns
    /// * `Result<FetchOutcome>` - Aggregated records, or `LimitExceeded` /
    ///   `PageFetch` when the first page cannot be used
    pub async fn fetch_all_with_progress<F>(
        &self,
        filters: &FilterCriteria,
        mut on_progress: F,
    ) -> Result<FetchOutcome>
    where
        F: FnMut(&ExportProgress),
    {
        let start_time = Instant::now();
        info!("Starting export fetch");

        let first = self.fetch_page(filters, 1).await?;
        let titular_count = first.total_titular_count;

        if self.limits.exceeds_max(titular_count) {
            warn!(
                "Export aborted: {} titulares exceeds limit of {}",
                titular_count, self.limits.max_records
            );
            return Err(ExportError::LimitExceeded {
                count: titular_count,
                max: self.limits.max_records,
            }
            .into());
        }
        if self.limits.exceeds_warning(titular_count) {
            warn!(
                "Large export: {} titulares (warning threshold {})",
                titular_count, self.limits.warning_threshold
            );
        }

        let total_pages = first.total_pages;
        let mut has_next = first.has_next;
        let mut last_count = titular_count;
        let mut current_page = 1u32;
        let mut failed_pages = Vec::new();
        let mut cancelled = false;

        let mut records = first.records;
        on_progress(&ExportProgress::new(current_page, total_pages, records.len()));

        while has_next && current_page < total_pages {
            if self.is_cancelled() || !self.pause().await {
                info!("Export fetch cancelled after page {}", current_page);
                cancelled = true;
                break;
            }

            current_page += 1;
            debug!("Fetching page {}/{}", current_page, total_pages);

            match self.fetch_page(filters, current_page).await {
                Ok(page) => {
                    if page.total_titular_count < last_count {
                        warn!(
                            "Titular count decreased from {} to {} on page {}",
                            last_count, page.total_titular_count, current_page
                        );
                    }
                    last_count = last_count.max(page.total_titular_count);
                    has_next = page.has_next;
                    debug!("Page {} returned {} records", current_page, page.records.len());
                    records.extend(page.records);
                }
                Err(e) => {
                    error!("Skipping page {}: {}", current_page, e);
                    failed_pages.push(current_page);
                }
            }

            on_progress(&ExportProgress::new(current_page, total_pages, records.len()));
        }

        let elapsed_ms = start_time.elapsed().as_millis() as u64;
        info!(
            "Export fetch finished: {} records from {} pages ({} failed) in {} ms",
            records.len(),
            current_page,
            failed_pages.len(),
            elapsed_ms
        );

        Ok(FetchOutcome {
            records,
            titular_count,
            total_pages,
            attempted_pages: current_page,
            failed_pages,
            cancelled,
            elapsed_ms,
        })
    }
}
