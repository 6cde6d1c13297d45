//! ui::output
//!
//! Output formatting and display.
//!
//! # Design
//!
//! Output is formatted consistently and respects the quiet flag. Errors
//! are always shown; everything else is suppressed by `--quiet`.

use std::fmt::Display;

/// Output verbosity level.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verbosity {
    /// Quiet mode - minimal output
    Quiet,
    /// Normal mode - standard output
    Normal,
    /// Debug mode - verbose output
    Debug,
}

impl Verbosity {
    /// Create verbosity from flags.
    pub fn from_flags(quiet: bool, debug: bool) -> Self {
        if quiet {
            Verbosity::Quiet
        } else if debug {
            Verbosity::Debug
        } else {
            Verbosity::Normal
        }
    }
}

/// Print a message (respects quiet mode).
pub fn print(message: impl Display, verbosity: Verbosity) {
    if verbosity != Verbosity::Quiet {
        println!("{}", message);
    }
}

/// Print a debug message (only in debug mode).
pub fn debug(message: impl Display, verbosity: Verbosity) {
    if verbosity == Verbosity::Debug {
        eprintln!("[debug] {}", message);
    }
}

/// Print an error message (always shown).
pub fn error(message: impl Display) {
    eprintln!("error: {}", message);
}

/// Print a warning message (respects quiet mode).
pub fn warn(message: impl Display, verbosity: Verbosity) {
    if verbosity != Verbosity::Quiet {
        eprintln!("warning: {}", message);
    }
}

/// Print a success message (respects quiet mode).
pub fn success(message: impl Display, verbosity: Verbosity) {
    if verbosity != Verbosity::Quiet {
        println!("{}", message);
    }
}

/// Format a list of items.
pub fn format_list<T: Display>(items: &[T], prefix: &str) -> String {
    items
        .iter()
        .map(|item| format!("{}{}", prefix, item))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Indent a tree line by `depth` levels.
pub fn format_tree_line(depth: usize, label: impl Display) -> String {
    format!("{}{}", "  ".repeat(depth), label)
}

/// Lay out a shelf grid.
///
/// `columns` are given bottom-up, like tray indices; the output shows the
/// top row first. Short columns are blank above their last cell, and a
/// footer row numbers the columns.
pub fn format_grid(columns: &[Vec<String>]) -> String {
    let width = columns
        .iter()
        .flatten()
        .map(|cell| cell.chars().count())
        .max()
        .unwrap_or(0)
        .max(3);
    let height = columns.iter().map(Vec::len).max().unwrap_or(0);

    let mut lines = Vec::with_capacity(height + 1);
    for row in (0..height).rev() {
        let line = columns
            .iter()
            .map(|column| {
                let cell = column.get(row).map(String::as_str).unwrap_or("");
                format!("{:<width$}", cell, width = width)
            })
            .collect::<Vec<_>>()
            .join(" | ");
        lines.push(line.trim_end().to_string());
    }
    lines.push(
        (0..columns.len())
            .map(|i| format!("{:<width$}", i, width = width))
            .collect::<Vec<_>>()
            .join("   ")
            .trim_end()
            .to_string(),
    );
    lines.join("\n")
}
