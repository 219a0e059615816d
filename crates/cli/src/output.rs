//! Output formatting utilities

use clap::ValueEnum;
use colored::Colorize;
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

/// Print rows as a table, or `json_value` as JSON
pub fn print_table<T: Tabled, J: Serialize + ?Sized>(rows: &[T], json_value: &J, format: OutputFormat) {
    match format {
        OutputFormat::Table => {
            if rows.is_empty() {
                println!("{}", "No items found".yellow());
                return;
            }
            let table = Table::new(rows).with(Style::rounded()).to_string();
            println!("{}", table);
        }
        OutputFormat::Json => print_json(json_value),
    }
}

pub fn print_json<J: Serialize + ?Sized>(value: &J) {
    match serde_json::to_string_pretty(value) {
        Ok(json) => println!("{}", json),
        Err(e) => print_error(&format!("Failed to encode JSON: {}", e)),
    }
}

pub fn print_success(message: &str) {
    println!("{} {}", "✓".green().bold(), message);
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

/// Color a pod phase
pub fn color_status(status: &str) -> String {
    match status.to_lowercase().as_str() {
        "running" | "succeeded" => status.green().to_string(),
        "pending" => status.yellow().to_string(),
        "failed" => status.red().to_string(),
        _ => status.dimmed().to_string(),
    }
}

/// Dim sentinel values such as `N/A (Error)` so real values stand out
pub fn dim_missing(value: &str) -> String {
    if value.starts_with("N/A") {
        value.dimmed().to_string()
    } else {
        value.to_string()
    }
}

/// `request / limit` in one cell
pub fn pair(request: &str, limit: &str) -> String {
    format!("{} / {}", dim_missing(request), dim_missing(limit))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pair_keeps_values() {
        colored::control::set_override(false);
        assert_eq!(pair("100m", "N/A"), "100m / N/A");
        assert_eq!(color_status("Running"), "Running");
        assert_eq!(dim_missing("N/A (Error)"), "N/A (Error)");
    }
}
