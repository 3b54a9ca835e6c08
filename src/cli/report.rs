//! Report formatting and printing utilities.
//!
//! Resolved stylesheets go to stdout (or to files); everything printed here
//! goes to stderr so it never mixes with stylesheet output.

use std::{
    io::{self, Write},
    path::Path,
};

use colored::Colorize;

use crate::pipeline::PassReport;

/// Success mark for consistent output formatting.
pub const SUCCESS_MARK: &str = "\u{2713}"; // ✓

/// Failure mark for consistent output formatting.
pub const FAILURE_MARK: &str = "\u{2718}"; // ✘

fn plural(count: usize, one: &str, many: &str) -> String {
    format!("{} {}", count, if count == 1 { one } else { many })
}

/// Print per-file counts (verbose mode).
pub fn print_file_report(path: &Path, report: &PassReport) {
    print_file_report_to(path, report, &mut io::stderr().lock());
}

pub fn print_file_report_to<W: Write>(path: &Path, report: &PassReport, writer: &mut W) {
    let mut details = vec![
        format!("{} defined", plural(report.collected, "property", "properties")),
        format!("{} rewritten", plural(report.rewritten, "declaration", "declarations")),
    ];
    if report.imported > 0 {
        details.insert(1, format!("{} imported", report.imported));
    }
    if report.exported > 0 {
        details.push(format!("{} exported", plural(report.exported, "file", "files")));
    }

    let _ = writeln!(
        writer,
        "{} {}: {}",
        SUCCESS_MARK.green(),
        path.display(),
        details.join(", ")
    );
}

/// Print a failed file with its error chain.
pub fn print_file_error(path: &Path, error: &anyhow::Error) {
    print_file_error_to(path, error, &mut io::stderr().lock());
}

pub fn print_file_error_to<W: Write>(path: &Path, error: &anyhow::Error, writer: &mut W) {
    let _ = writeln!(
        writer,
        "{} {}: {}",
        FAILURE_MARK.red(),
        path.display().to_string().bold(),
        format!("{:#}", error).red()
    );
}

/// Print the final summary line.
pub fn print_summary(processed: usize, failed: usize, rewritten: usize) {
    print_summary_to(processed, failed, rewritten, &mut io::stderr().lock());
}

pub fn print_summary_to<W: Write>(processed: usize, failed: usize, rewritten: usize, writer: &mut W) {
    let msg = if failed == 0 {
        format!(
            "{} {}",
            SUCCESS_MARK.green(),
            format!(
                "Resolved {} - {} rewritten",
                plural(processed, "file", "files"),
                plural(rewritten, "declaration", "declarations")
            )
            .green()
        )
    } else {
        format!(
            "{} {}",
            FAILURE_MARK.red(),
            format!("Failed to resolve {} of {}", failed, plural(processed, "file", "files")).red()
        )
    };
    let _ = writeln!(writer, "{}", msg);
}

/// Print a verbose diagnostic line.
pub fn print_info(message: &str) {
    let _ = writeln!(io::stderr().lock(), "{} {}", "info:".bold().cyan(), message);
}

/// Print a warning line.
pub fn print_warning(message: &str) {
    let _ = writeln!(io::stderr().lock(), "{} {}", "warning:".bold().yellow(), message);
}
