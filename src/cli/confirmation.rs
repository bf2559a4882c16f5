//! User confirmation for large exports
//!
//! Exports above the warning threshold ask before fetching every page.

use std::io::{self, BufRead, Write};

use nu_ansi_term::Color;

use crate::error::{AtlasError, Result};
use crate::export::{ExportEstimate, ExportLimits};

/// Describe what a large export will do
pub fn large_export_description(estimate: &ExportEstimate, limits: &ExportLimits) -> String {
    format!(
        "This export matches {} titulares across {} pages (about {} rows); \
         the warning threshold is {}.",
        estimate.titular_count,
        estimate.total_pages,
        estimate.records_estimate,
        limits.warning_threshold
    )
}

/// Prompt user for confirmation on stdin
///
/// # Arguments
/// * `operation_desc` - Description of the operation to perform
/// * `use_colors` - Highlight the warning line
///
/// # Returns
/// * `Result<bool>` - True if user confirmed, false if cancelled, error on I/O failure
pub fn prompt_confirmation(operation_desc: &str, use_colors: bool) -> Result<bool> {
    let stdin = io::stdin();
    let mut stdout = io::stdout();
    prompt_with(operation_desc, use_colors, &mut stdin.lock(), &mut stdout)
}

/// Prompt on arbitrary streams
pub fn prompt_with<R: BufRead, W: Write>(
    operation_desc: &str,
    use_colors: bool,
    input: &mut R,
    output: &mut W,
) -> Result<bool> {
    let title = "WARNING: Large export!";
    let title = if use_colors {
        Color::Yellow.bold().paint(title).to_string()
    } else {
        title.to_string()
    };

    let write_err = |e: io::Error| AtlasError::Generic(format!("Failed to write prompt: {}", e));
    writeln!(output, "{}", title).map_err(write_err)?;
    writeln!(output, "   {}", operation_desc).map_err(write_err)?;
    write!(output, "   Continue? (yes/no): ").map_err(write_err)?;
    output.flush().map_err(write_err)?;

    let mut answer = String::new();
    input
        .read_line(&mut answer)
        .map_err(|e| AtlasError::Generic(format!("Failed to read input: {}", e)))?;

    Ok(is_affirmative(&answer))
}

fn is_affirmative(answer: &str) -> bool {
    matches!(
        answer.trim().to_lowercase().as_str(),
        "yes" | "y" | "sim" | "s"
    )
}
