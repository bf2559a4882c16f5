//! Command-line interface for atlas-export
//!
//! This module handles:
//! - Command-line argument parsing using clap
//! - Configuration loading and CLI overrides
//! - Dispatch of the export, estimate and search commands
//! - Reporting of authorization events raised by the search client

pub mod completion;
pub mod confirmation;

use std::path::PathBuf;
use std::sync::Arc;

use chrono::NaiveDate;
use clap::{Args, Parser, Subcommand, ValueEnum};
use nu_ansi_term::Color;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use crate::client::{HttpSearchClient, SearchEndpoint};
use crate::config::{Config, LogLevel};
use crate::error::{AtlasError, ExportError, Result};
use crate::events::{AppEvent, EventBus};
use crate::export::{ExportFormat, ExportPipeline, FetchOutcome, ProgressTracker, writers};
use crate::model::{BondStatus, FilterCriteria, RelativePeriod};
use crate::presenter::ListingTable;
use crate::utils::{convert::format_size, fs::expand_home, time::format_elapsed};

/// Atlas search export tool
#[derive(Parser, Debug)]
#[command(
    name = "atlas-export",
    version,
    about = "Export Atlas search results to CSV, XLSX and PDF",
    long_about = "Fetches every page of an Atlas unified search, enforces the export
limits and writes the results as CSV, XLSX and PDF files."
)]
pub struct CliArgs {
    /// Configuration file path
    #[arg(short = 'c', long = "config", value_name = "FILE", global = true)]
    pub config_file: Option<PathBuf>,

    /// Backend base URL (overrides api.base_url)
    #[arg(long, value_name = "URL", global = true)]
    pub base_url: Option<String>,

    /// Bearer token (overrides api.token)
    #[arg(long, value_name = "TOKEN", global = true)]
    pub token: Option<String>,

    /// Disable colored output
    #[arg(long = "no-color", global = true)]
    pub no_color: bool,

    /// Quiet mode (minimal output)
    #[arg(short = 'q', long, global = true)]
    pub quiet: bool,

    /// Verbose mode (detailed logging)
    #[arg(short = 'v', long, global = true)]
    pub verbose: bool,

    /// Very verbose mode (debug logging)
    #[arg(long = "vv", global = true)]
    pub very_verbose: bool,

    /// Subcommands
    #[command(subcommand)]
    pub command: Commands,
}

/// Bond status accepted by `--status`
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum StatusArg {
    Active,
    Inactive,
}

impl From<StatusArg> for BondStatus {
    fn from(value: StatusArg) -> Self {
        match value {
            StatusArg::Active => BondStatus::Active,
            StatusArg::Inactive => BondStatus::Inactive,
        }
    }
}

/// Search filters shared by export, estimate and search
#[derive(Args, Debug, Clone, Default)]
pub struct FilterArgs {
    /// Free-text search term
    #[arg(long, value_name = "TEXT")]
    pub search: Option<String>,

    /// Restrict the search term to titular, dependente or a field name
    #[arg(long, value_name = "FIELD")]
    pub search_field: Option<String>,

    /// Nationality
    #[arg(long, value_name = "NAME")]
    pub nationality: Option<String>,

    /// Consulate
    #[arg(long, value_name = "NAME")]
    pub consulate: Option<String>,

    /// Company
    #[arg(long, value_name = "NAME")]
    pub company: Option<String>,

    /// Bond type
    #[arg(long, value_name = "TYPE")]
    pub bond_type: Option<String>,

    /// Bond status
    #[arg(long, value_enum)]
    pub status: Option<StatusArg>,

    /// Date the range applies to (e.g. data_fim_vinculo)
    #[arg(long, value_name = "TYPE")]
    pub event_type: Option<String>,

    /// Range start (YYYY-MM-DD)
    #[arg(long, value_name = "DATE")]
    pub from: Option<NaiveDate>,

    /// Range end (YYYY-MM-DD)
    #[arg(long, value_name = "DATE")]
    pub to: Option<NaiveDate>,

    /// Relative range of N days from today, backward unless --forward
    #[arg(long, value_name = "DAYS", conflicts_with_all = ["from", "to"])]
    pub period_days: Option<u32>,

    /// Count --period-days forward from today
    #[arg(long, requires = "period_days")]
    pub forward: bool,
}

impl FilterArgs {
    /// Convert into search criteria; blank strings count as unset
    pub fn to_criteria(&self) -> FilterCriteria {
        fn text(value: &Option<String>) -> Option<String> {
            value
                .as_deref()
                .map(str::trim)
                .filter(|v| !v.is_empty())
                .map(str::to_string)
        }

        FilterCriteria {
            search_term: text(&self.search),
            search_field: text(&self.search_field),
            nationality: text(&self.nationality),
            consulate: text(&self.consulate),
            company: text(&self.company),
            bond_type: text(&self.bond_type),
            status: self.status.map(BondStatus::from),
            event_type: text(&self.event_type),
            date_from: self.from,
            date_to: self.to,
            period: self.period_days.map(|days| {
                if self.forward {
                    RelativePeriod::forward(days)
                } else {
                    RelativePeriod::backward(days)
                }
            }),
        }
    }
}

/// Options of the export subcommand
#[derive(Args, Debug, Clone)]
pub struct ExportArgs {
    #[command(flatten)]
    pub filters: FilterArgs,

    /// Output format; repeat for several (default: all)
    #[arg(short = 'f', long = "format", value_name = "FORMAT")]
    pub formats: Vec<ExportFormat>,

    /// File name prefix (overrides export.stem)
    #[arg(long, value_name = "NAME")]
    pub stem: Option<String>,

    /// Output directory (overrides export.output_dir)
    #[arg(short = 'o', long, value_name = "DIR")]
    pub output_dir: Option<PathBuf>,

    /// Skip the large-export confirmation
    #[arg(short = 'y', long)]
    pub yes: bool,
}

impl ExportArgs {
    /// Requested formats without duplicates, in request order
    pub fn selected_formats(&self) -> Vec<ExportFormat> {
        if self.formats.is_empty() {
            return ExportFormat::ALL.to_vec();
        }
        let mut selected = Vec::new();
        for format in &self.formats {
            if !selected.contains(format) {
                selected.push(*format);
            }
        }
        selected
    }
}

/// Subcommands for atlas-export
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Fetch every matching record and write export files
    Export(ExportArgs),

    /// Estimate the size of an export from the first page
    Estimate {
        #[command(flatten)]
        filters: FilterArgs,
    },

    /// Print one page of search results
    Search {
        #[command(flatten)]
        filters: FilterArgs,

        /// Page number
        #[arg(long, default_value_t = 1, value_parser = clap::value_parser!(u32).range(1..))]
        page: u32,
    },

    /// Show configuration
    Config {
        /// Show effective configuration
        #[arg(long)]
        show: bool,

        /// Validate configuration file
        #[arg(long)]
        validate: bool,
    },

    /// Generate shell completion script
    Completion {
        /// Shell type (bash, zsh, fish, powershell)
        #[arg(value_name = "SHELL")]
        shell: String,
    },

    /// Show version information
    Version,
}

/// CLI interface handler
pub struct CliInterface {
    /// Parsed command-line arguments
    args: CliArgs,

    /// Loaded configuration
    config: Config,
}

impl CliInterface {
    /// Create a new CLI interface from the process arguments
    ///
    /// # Returns
    /// * `Result<Self>` - New CLI interface or error
    pub fn new() -> Result<Self> {
        Self::from_args(CliArgs::parse())
    }

    /// Create a CLI interface from already parsed arguments
    pub fn from_args(args: CliArgs) -> Result<Self> {
        let config = Self::load_config(&args)?;
        Ok(Self { args, config })
    }

    /// Load configuration from file and merge with arguments
    fn load_config(args: &CliArgs) -> Result<Config> {
        let mut config = Config::load(args.config_file.as_deref())?;
        Self::apply_args_to_config(&mut config, args);
        config.validate()?;
        Ok(config)
    }

    /// Apply CLI arguments to configuration
    fn apply_args_to_config(config: &mut Config, args: &CliArgs) {
        Self::apply_api_args(config, args);
        Self::apply_logging_args(config, args);
    }

    fn apply_api_args(config: &mut Config, args: &CliArgs) {
        if let Some(url) = &args.base_url {
            config.api.base_url = url.trim_end_matches('/').to_string();
        }
        if let Some(token) = &args.token {
            config.api.token = Some(token.clone());
        }
    }

    /// Apply logging-related CLI arguments to configuration
    fn apply_logging_args(config: &mut Config, args: &CliArgs) {
        config.logging.level = if args.very_verbose {
            LogLevel::Trace
        } else if args.verbose {
            LogLevel::Debug
        } else if args.quiet {
            LogLevel::Error
        } else {
            config.logging.level
        };
    }

    /// Get the configuration
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Get the CLI arguments
    pub fn args(&self) -> &CliArgs {
        &self.args
    }

    fn use_colors(&self) -> bool {
        !self.args.no_color
    }

    /// Print a status line unless in quiet mode
    fn status(&self, message: &str) {
        if !self.args.quiet {
            println!("{}", message);
        }
    }

    fn warning(&self, message: &str) {
        if self.use_colors() {
            eprintln!("{}", Color::Yellow.paint(message));
        } else {
            eprintln!("{}", message);
        }
    }

    /// Run the selected subcommand
    pub async fn run(&self) -> Result<()> {
        match &self.args.command {
            Commands::Version => {
                self.show_version();
                Ok(())
            }
            Commands::Completion { shell } => completion::generate_completion(shell),
            Commands::Config { show, validate } => self.handle_config_command(*show, *validate),
            Commands::Export(_) | Commands::Estimate { .. } | Commands::Search { .. } => {
                let bus = EventBus::default();
                let reporter = self.spawn_event_reporter(&bus);

                let result = self.run_remote(&bus).await;

                // Reporter ends once every publisher is gone
                drop(bus);
                let _ = reporter.await;
                result
            }
        }
    }

    /// Commands that talk to the backend
    async fn run_remote(&self, bus: &EventBus) -> Result<()> {
        let timeout = self.config.request_timeout();
        let client = HttpSearchClient::new(&self.config.api.base_url, timeout)?
            .with_token(self.config.api.token.clone())
            .with_events(bus.clone());
        debug!("Using search endpoint {}", client.search_url());
        let client = Arc::new(client);

        match &self.args.command {
            Commands::Export(opts) => self.run_export(client, opts).await,
            Commands::Estimate { filters } => self.run_estimate(client, filters).await,
            Commands::Search { filters, page } => {
                self.run_search(client.as_ref(), filters, *page).await
            }
            _ => Ok(()),
        }
    }

    /// Print authorization events published by the client
    fn spawn_event_reporter(&self, bus: &EventBus) -> JoinHandle<()> {
        let mut subscription = bus.subscribe();
        let use_colors = self.use_colors();

        tokio::spawn(async move {
            while let Some(event) = subscription.recv().await {
                let text = match event {
                    AppEvent::PermissionDenied { message } => {
                        format!("Permission denied by the backend: {}", message)
                    }
                    AppEvent::SessionExpired => {
                        "Session expired: provide a new token with --token or api.token".to_string()
                    }
                };
                if use_colors {
                    eprintln!("{}", Color::Red.bold().paint(text));
                } else {
                    eprintln!("{}", text);
                }
            }
        })
    }

    async fn run_estimate(
        &self,
        client: Arc<HttpSearchClient>,
        filters: &FilterArgs,
    ) -> Result<()> {
        let limits = self.config.export.limits();
        let pipeline = ExportPipeline::new(client, limits);
        let estimate = pipeline.estimate(&filters.to_criteria()).await?;

        println!("Titulares:           {}", estimate.titular_count);
        println!("Páginas:             {}", estimate.total_pages);
        println!("Registros estimados: ~{}", estimate.records_estimate);

        if estimate.exceeds_limit(&limits) {
            self.warning(&format!(
                "Above the export limit of {}; narrow the filters before exporting.",
                limits.max_records
            ));
        } else if estimate.exceeds_warning(&limits) {
            self.warning(&format!(
                "Large export: above the warning threshold of {}.",
                limits.warning_threshold
            ));
        }
        Ok(())
    }

    async fn run_search(
        &self,
        client: &HttpSearchClient,
        filters: &FilterArgs,
        page: u32,
    ) -> Result<()> {
        let params = filters
            .to_criteria()
            .to_params(page, self.config.export.page_size);
        let response = client.search(&params).await?;

        println!(
            "{}",
            ListingTable::new()
                .with_colors(self.use_colors())
                .render(&response.records)
        );
        self.status(&format!(
            "Página {}/{} · {} titulares",
            page, response.total_pages, response.total_titular_count
        ));
        Ok(())
    }

    async fn run_export(&self, client: Arc<HttpSearchClient>, opts: &ExportArgs) -> Result<()> {
        let criteria = opts.filters.to_criteria();
        let limits = self.config.export.limits();
        let cancel_token = CancellationToken::new();
        let pipeline = ExportPipeline::new(client, limits).with_cancellation(cancel_token.clone());

        let estimate = pipeline.estimate(&criteria).await?;
        self.status(&format!(
            "Found {} titulares in {} pages",
            estimate.titular_count, estimate.total_pages
        ));

        // Over the hard limit the fetch fails after page 1; no point asking
        if estimate.exceeds_warning(&limits) && !estimate.exceeds_limit(&limits) && !opts.yes {
            let description = confirmation::large_export_description(&estimate, &limits);
            if !confirmation::prompt_confirmation(&description, self.use_colors())? {
                self.status("Export cancelled.");
                return Ok(());
            }
        }

        // Setup Ctrl+C handler for the fetch
        let cancel_token_clone = cancel_token.clone();
        let ctrl_c_handle = tokio::spawn(async move {
            match tokio::signal::ctrl_c().await {
                Ok(()) => cancel_token_clone.cancel(),
                Err(err) => eprintln!("Failed to listen for Ctrl+C: {}", err),
            }
        });

        let tracker = ProgressTracker::new(!self.args.quiet);
        let fetched = pipeline
            .fetch_all_with_progress(&criteria, |progress| tracker.update(progress))
            .await;
        tracker.finish();
        ctrl_c_handle.abort();

        let outcome = fetched?;
        if outcome.cancelled {
            return Err(ExportError::Cancelled.into());
        }
        self.report_incomplete(&outcome);

        self.write_files(&outcome, opts).await
    }

    fn report_incomplete(&self, outcome: &FetchOutcome) {
        if outcome.is_complete() {
            return;
        }
        let pages = outcome
            .failed_pages
            .iter()
            .map(|p| p.to_string())
            .collect::<Vec<_>>()
            .join(", ");
        self.warning(&format!(
            "Incomplete export: fetched {} of {} pages (failed: {}). Files contain {} records.",
            outcome.fetched_pages(),
            outcome.total_pages,
            pages,
            outcome.records.len()
        ));
    }

    /// Run every requested writer; one failing format does not stop the others
    async fn write_files(&self, outcome: &FetchOutcome, opts: &ExportArgs) -> Result<()> {
        let dir = opts
            .output_dir
            .clone()
            .unwrap_or_else(|| self.config.export.output_dir.clone());
        let dir = expand_home(&dir.to_string_lossy());
        let stem = opts.stem.as_deref().unwrap_or(&self.config.export.stem);

        let formats = opts.selected_formats();
        let mut failures = 0usize;

        for format in &formats {
            let writer = format.writer();
            match writers::save(writer.as_ref(), &outcome.records, &dir, stem).await {
                Ok(file) => self.status(&format!(
                    "✅ {} written to {} ({})",
                    format.extension().to_uppercase(),
                    file.path.display(),
                    format_size(file.size_bytes)
                )),
                Err(e) => {
                    failures += 1;
                    if self.use_colors() {
                        eprintln!("{} {}", Color::Red.paint("❌"), e);
                    } else {
                        eprintln!("❌ {}", e);
                    }
                }
            }
        }

        info!(
            "Export finished: {} records, {} formats, {} failed",
            outcome.records.len(),
            formats.len(),
            failures
        );
        self.status(&format!(
            "Exported {} records in {}",
            outcome.records.len(),
            format_elapsed(outcome.elapsed_ms)
        ));

        if failures > 0 {
            return Err(AtlasError::Generic(format!(
                "{} of {} export formats failed",
                failures,
                formats.len()
            )));
        }
        Ok(())
    }

    /// Show version information
    fn show_version(&self) {
        println!("atlas-export version {}", crate::VERSION);
        println!("Rust version: {}", env!("CARGO_PKG_RUST_VERSION"));
    }

    /// Handle config subcommand
    fn handle_config_command(&self, show: bool, validate: bool) -> Result<()> {
        if validate {
            self.validate_config_file();
        }

        if show || !validate {
            self.show_config()?;
        }

        Ok(())
    }

    /// Validate configuration file
    fn validate_config_file(&self) {
        let path = self.get_config_path();
        println!("Validating configuration file: {}", path.display());

        if !path.exists() {
            println!("❌ Configuration file does not exist");
            return;
        }

        match Config::from_file(&path) {
            Ok(_) => println!("✅ Configuration is valid"),
            Err(e) => println!("❌ {}", e),
        }
    }

    /// Show effective configuration with the token masked
    fn show_config(&self) -> Result<()> {
        println!("Configuration file: {}", self.get_config_path().display());
        println!();
        println!("=== Effective Configuration ===");
        println!();

        let mut shown = self.config.clone();
        if shown.api.token.is_some() {
            shown.api.token = Some("***".to_string());
        }
        println!("{}", shown.to_toml()?);
        Ok(())
    }

    /// Get configuration file path (from args or default)
    fn get_config_path(&self) -> PathBuf {
        self.args
            .config_file
            .clone()
            .unwrap_or_else(Config::default_path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(argv: &[&str]) -> CliArgs {
        CliArgs::try_parse_from(argv).unwrap()
    }

    #[test]
    fn test_cli_args_requires_command() {
        assert!(CliArgs::try_parse_from(["atlas-export"]).is_err());
    }

    #[test]
    fn test_global_flags_after_subcommand() {
        let args = parse(&["atlas-export", "estimate", "--no-color", "--quiet", "--vv"]);
        assert!(args.no_color);
        assert!(args.quiet);
        assert!(args.very_verbose);
        assert!(matches!(args.command, Commands::Estimate { .. }));
    }

    #[test]
    fn test_export_formats() {
        let args = parse(&["atlas-export", "export", "-f", "pdf", "--format", "csv", "-f", "pdf"]);
        let Commands::Export(opts) = args.command else {
            panic!("expected export command");
        };
        assert_eq!(opts.selected_formats(), vec![ExportFormat::Pdf, ExportFormat::Csv]);

        let args = parse(&["atlas-export", "export"]);
        let Commands::Export(opts) = args.command else {
            panic!("expected export command");
        };
        assert_eq!(opts.selected_formats(), ExportFormat::ALL.to_vec());
        assert!(!opts.yes);

        assert!(CliArgs::try_parse_from(["atlas-export", "export", "-f", "docx"]).is_err());
    }

    #[test]
    fn test_filter_conversion() {
        let args = parse(&[
            "atlas-export",
            "export",
            "--search",
            "joao",
            "--nationality",
            "  ",
            "--status",
            "inactive",
            "--event-type",
            "data_fim_vinculo",
            "--from",
            "2025-01-01",
            "--to",
            "2025-03-31",
        ]);
        let Commands::Export(opts) = args.command else {
            panic!("expected export command");
        };
        let criteria = opts.filters.to_criteria();

        assert_eq!(criteria.search_term.as_deref(), Some("joao"));
        assert_eq!(criteria.nationality, None);
        assert_eq!(criteria.status, Some(BondStatus::Inactive));
        assert_eq!(criteria.event_type.as_deref(), Some("data_fim_vinculo"));
        assert_eq!(criteria.date_from, NaiveDate::from_ymd_opt(2025, 1, 1));
        assert_eq!(criteria.date_to, NaiveDate::from_ymd_opt(2025, 3, 31));
        assert_eq!(criteria.period, None);
    }

    #[test]
    fn test_period_flags() {
        let args = parse(&["atlas-export", "estimate", "--period-days", "30", "--forward"]);
        let Commands::Estimate { filters } = args.command else {
            panic!("expected estimate command");
        };
        assert_eq!(filters.to_criteria().period, Some(RelativePeriod::forward(30)));

        let args = parse(&["atlas-export", "estimate", "--period-days", "7"]);
        let Commands::Estimate { filters } = args.command else {
            panic!("expected estimate command");
        };
        assert_eq!(filters.to_criteria().period, Some(RelativePeriod::backward(7)));

        // --forward needs --period-days; explicit dates conflict with it
        assert!(CliArgs::try_parse_from(["atlas-export", "estimate", "--forward"]).is_err());
        assert!(
            CliArgs::try_parse_from([
                "atlas-export",
                "estimate",
                "--period-days",
                "7",
                "--from",
                "2025-01-01"
            ])
            .is_err()
        );
    }

    #[test]
    fn test_search_page_must_be_positive() {
        let args = parse(&["atlas-export", "search", "--page", "3"]);
        assert!(matches!(args.command, Commands::Search { page: 3, .. }));
        assert!(CliArgs::try_parse_from(["atlas-export", "search", "--page", "0"]).is_err());
    }

    #[test]
    fn test_args_override_config() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(
            &path,
            "[api]\nbase_url = \"http://localhost:8000\"\n\n[logging]\nlevel = \"info\"\n",
        )
        .unwrap();
        let path_arg = path.to_string_lossy().into_owned();

        let cli = CliInterface::from_args(parse(&[
            "atlas-export",
            "--config",
            &path_arg,
            "--base-url",
            "https://atlas.example.com/",
            "--token",
            "abc",
            "-v",
            "version",
        ]))
        .unwrap();

        assert_eq!(cli.config().api.base_url, "https://atlas.example.com");
        assert_eq!(cli.config().api.token.as_deref(), Some("abc"));
        assert_eq!(cli.config().logging.level, LogLevel::Debug);
        assert!(cli.args().verbose);
    }

    #[test]
    fn test_invalid_override_is_rejected() {
        let result = CliInterface::from_args(parse(&[
            "atlas-export",
            "--base-url",
            "ftp://nope",
            "version",
        ]));
        assert!(result.is_err());
    }

    #[test]
    fn test_missing_explicit_config_is_error() {
        let result = CliInterface::from_args(parse(&[
            "atlas-export",
            "--config",
            "/no/such/atlas/config.toml",
            "version",
        ]));
        assert!(result.is_err());
    }
}
