//! Output formatting utilities

use clap::ValueEnum;
use colored::Colorize;
use footprint_lib::Severity;
use serde::Serialize;
use tabled::{settings::Style, Table, Tabled};

/// Output format for CLI commands
#[derive(Debug, Clone, Copy, Default, ValueEnum)]
pub enum OutputFormat {
    /// Table format (default)
    #[default]
    Table,
    /// JSON format
    Json,
}

/// Print rows as a table, or the raw value as JSON
pub fn print_rows<T: Tabled, J: Serialize + ?Sized>(
    rows: &[T],
    raw: &J,
    format: OutputFormat,
) -> anyhow::Result<()> {
    match format {
        OutputFormat::Table => {
            if rows.is_empty() {
                println!("{}", "No items found".yellow());
            } else {
                println!("{}", Table::new(rows).with(Style::rounded()));
            }
        }
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(raw)?),
    }
    Ok(())
}

pub fn print_error(message: &str) {
    eprintln!("{} {}", "✗".red().bold(), message);
}

pub fn print_warning(message: &str) {
    println!("{} {}", "⚠".yellow().bold(), message);
}

pub fn print_info(message: &str) {
    println!("{} {}", "ℹ".blue().bold(), message);
}

/// Color text by footprint severity
pub fn color_severity(severity: Severity, text: &str) -> String {
    match severity {
        Severity::Danger => text.red().to_string(),
        Severity::Warning => text.yellow().to_string(),
        Severity::Success => text.green().to_string(),
        Severity::Info => text.blue().to_string(),
    }
}

/// Text bar of `count` relative to `max`, `width` cells wide
pub fn bar(count: f64, max: f64, width: usize) -> String {
    if max <= 0.0 || !count.is_finite() {
        return String::new();
    }
    let cells = ((count / max) * width as f64).round() as usize;
    "█".repeat(cells.min(width))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bar() {
        assert_eq!(bar(5.0, 10.0, 10).chars().count(), 5);
        assert_eq!(bar(10.0, 10.0, 4).chars().count(), 4);
        assert_eq!(bar(1.0, 0.0, 10), "");
    }

    #[test]
    fn test_color_severity_keeps_text() {
        colored::control::set_override(false);
        assert_eq!(color_severity(Severity::Danger, "mem_bw"), "mem_bw");
    }
}
