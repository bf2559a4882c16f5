//! Atlas Export - command-line front end
//!
//! Fetches every page of an Atlas unified search and writes the results as
//! CSV, XLSX and PDF files.
//!
//! # Usage
//!
//! ```bash
//! # How big would the export be?
//! atlas-export estimate --search joao
//!
//! # Export to every format in the current directory
//! atlas-export export --search joao --status active
//! ```

use atlas_export::cli::CliInterface;
use atlas_export::error::Result;

/// Application entry point
#[tokio::main]
async fn main() {
    if let Err(e) = run().await {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

/// Main application logic
///
/// 1. Parse command-line arguments
/// 2. Load configuration
/// 3. Initialize logging
/// 4. Run the selected subcommand
async fn run() -> Result<()> {
    let cli = CliInterface::new()?;

    initialize_logging(&cli);

    cli.run().await
}

/// Initialize logging system based on verbosity level
///
/// # Arguments
/// * `cli` - CLI interface with verbosity settings
fn initialize_logging(cli: &CliInterface) {
    // -v / --vv / --quiet are already folded into the configured level
    let level = cli.config().logging.level.to_tracing_level();

    let subscriber = tracing_subscriber::fmt()
        .with_max_level(level)
        .with_target(false)
        .with_writer(std::io::stderr);

    if cli.config().logging.timestamps {
        subscriber.init();
    } else {
        subscriber.without_time().init();
    }
}
