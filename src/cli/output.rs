// Output formatting and display for CLI

use crate::logs::LogLevel;
use crate::settings::SinkSettings;
use colored::*;
use std::path::Path;
use tabled::{
    settings::{object::Rows, Alignment, Modify, Style},
    Table, Tabled,
};

/// Print an error message to stderr
pub fn print_error(error: &str) {
    eprintln!("{} {}", "✗ Error:".red().bold(), error);
}

/// Print an info message
pub fn print_info(message: &str) {
    println!("{} {}", "ℹ".blue().bold(), message);
}

/// Print a success message
pub fn print_success_msg(message: &str) {
    println!("{} {}", "✓".green().bold(), message);
}

/// Print the sink settings and the state of the log file
pub fn print_settings(settings: &SinkSettings, log_path: &Path, log_lines: Option<usize>) {
    println!("\n{}", "General".bold().underline());
    println!();
    println!(
        "  {:<16} {}",
        "Enabled:".bold(),
        if settings.enabled {
            "yes".green().to_string()
        } else {
            "no".bright_black().to_string()
        }
    );
    println!("  {:<16} {}", "Count of lines:".bold(), settings.count);
    println!("  {:<16} {}", "Log file:".bold(), log_path.display());

    print_types_table(settings);

    match log_lines {
        Some(lines) => {
            println!(
                "{}",
                format!("{} line(s) retained", format_count(lines))
                    .dimmed()
                    .italic()
            );
            print_info("Download the most recent log messages with `dblog-file download`.");
        }
        None => println!("{}", "No log file written yet".yellow()),
    }
}

/// Print a table of every level and whether it is written to the file
fn print_types_table(settings: &SinkSettings) {
    #[derive(Tabled)]
    struct TypeRow {
        #[tabled(rename = "Type")]
        name: &'static str,
        #[tabled(rename = "Label")]
        label: &'static str,
        #[tabled(rename = "Logged")]
        logged: String,
    }

    let rows: Vec<TypeRow> = LogLevel::ALL
        .iter()
        .map(|level| TypeRow {
            name: level.as_str(),
            label: level.label(),
            logged: format_logged(settings.types.contains(level)),
        })
        .collect();

    let mut table = Table::new(rows);
    table
        .with(Style::rounded())
        .with(Modify::new(Rows::first()).with(Alignment::center()));

    println!("\n{}\n", table);
}

fn format_logged(logged: bool) -> String {
    if logged {
        "✓".green().to_string()
    } else {
        "-".bright_black().to_string()
    }
}

/// Format a count with thousands separators
fn format_count(n: usize) -> String {
    let digits = n.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    out
}

/// Format a byte size in human-readable format
pub fn format_size(bytes: u64) -> String {
    const KB: u64 = 1024;
    const MB: u64 = KB * 1024;

    if bytes < KB {
        format!("{}B", bytes)
    } else if bytes < MB {
        format!("{:.1}KB", bytes as f64 / KB as f64)
    } else {
        format!("{:.1}MB", bytes as f64 / MB as f64)
    }
}
