//! Terminal rendering for run summaries and estimates

use console::style;
use ferrosync_engine::{format_bytes, format_duration, format_rate};
use ferrosync_types::{RunSummary, SpaceEstimate};

/// Print the summary of a finished run
pub fn display_run_summary(summary: &RunSummary) {
    println!();
    println!("{}", style("Backup Summary:").bold().underlined());

    println!("  Files copied: {}", style(summary.files_copied).green());
    println!(
        "  Bytes copied: {}",
        style(format_bytes(summary.bytes_copied)).green()
    );
    println!(
        "  Directories created: {}",
        style(summary.directories_created).green()
    );
    println!(
        "  Unchanged: {}",
        style(summary.skipped_unchanged).dim()
    );
    println!(
        "  Symlinks skipped: {}",
        style(summary.skipped_symlink).yellow()
    );
    println!(
        "  Special files skipped: {}",
        style(summary.skipped_special).yellow()
    );
    println!(
        "  Permission denied: {}",
        if summary.skipped_permission > 0 {
            style(summary.skipped_permission).red()
        } else {
            style(summary.skipped_permission).green()
        }
    );
    println!(
        "  Failed: {}",
        if summary.failed > 0 {
            style(summary.failed).red()
        } else {
            style(summary.failed).green()
        }
    );
    println!(
        "  Duration: {}",
        style(format_duration(summary.elapsed)).blue()
    );
    println!(
        "  Transfer rate: {}",
        style(format_rate(summary.transfer_rate())).blue().bold()
    );

    if !summary.failures.is_empty() {
        println!();
        println!("{}", style("Failed files:").red().bold());
        for failure in &summary.failures {
            println!(
                "    • {}: {}",
                failure.path.display(),
                style(&failure.detail).dim()
            );
        }
    }
    if !summary.permission_denied.is_empty() {
        println!();
        println!("{}", style("Permission denied:").yellow().bold());
        for path in &summary.permission_denied {
            println!("    • {}", path.display());
        }
    }

    println!();
    if summary.is_clean() {
        display_success("Backup completed");
    } else {
        display_warning(&format!(
            "Backup completed with {} problem entries",
            summary.problem_count()
        ));
    }
}

/// Print what a run would copy and whether it fits
pub fn display_estimate(estimate: &SpaceEstimate) {
    println!();
    println!("{}", style("Backup Estimate:").bold().underlined());

    if !estimate.entries.is_empty() {
        for entry in &estimate.entries {
            println!(
                "    {} {}",
                style(format!("{:>10}", format_bytes(entry.size))).dim(),
                entry.relative_path.display()
            );
        }
        println!();
    }

    println!(
        "  Files to copy: {}",
        style(estimate.files_to_copy).cyan()
    );
    println!(
        "  Space required: {}",
        style(format_bytes(estimate.required_bytes)).cyan()
    );
    println!(
        "  Space available: {}",
        style(format_bytes(estimate.available_bytes)).cyan()
    );

    println!();
    if estimate.fits() {
        display_success("The backup fits on the destination");
    } else {
        display_error(&format!(
            "Not enough space on the destination: {} short",
            format_bytes(estimate.shortfall())
        ));
    }
}

/// Display a warning message with proper formatting
pub fn display_warning(message: &str) {
    println!("{} {}", style("⚠").yellow().bold(), style(message).yellow());
}

/// Display an error message with proper formatting
pub fn display_error(message: &str) {
    eprintln!("{} {}", style("✗").red().bold(), style(message).red());
}

/// Display a success message with proper formatting
pub fn display_success(message: &str) {
    println!("{} {}", style("✓").green().bold(), style(message).green());
}

/// Display an info message with proper formatting
pub fn display_info(message: &str) {
    println!("{} {}", style("ℹ").blue().bold(), style(message).blue());
}
