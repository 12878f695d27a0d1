//! Output formatting for CLI commands
//!
//! Every handler writes through [`OutputFormatter`] so that `--json` and
//! `--no-color` behave the same across commands.

use crate::error::Result;
use colored::Colorize;
use serde::Serialize;

/// Formats command output as colored text or JSON
#[derive(Debug, Clone, Copy)]
pub struct OutputFormatter {
    json: bool,
    color: bool,
}

impl OutputFormatter {
    pub fn new(json: bool, no_color: bool) -> Self {
        if no_color {
            colored::control::set_override(false);
        }
        Self {
            json,
            color: !no_color,
        }
    }

    pub const fn is_json(&self) -> bool {
        self.json
    }

    /// Print a success line
    pub fn success(&self, message: &str) {
        if self.json {
            return;
        }
        if self.color {
            println!("{} {}", "✓".green().bold(), message);
        } else {
            println!("✓ {message}");
        }
    }

    /// Print an informational line
    pub fn info(&self, message: &str) {
        if !self.json {
            println!("{message}");
        }
    }

    /// Print a warning to stderr
    pub fn warning(&self, message: &str) {
        if self.color {
            eprintln!("{} {}", "⚠".yellow().bold(), message.yellow());
        } else {
            eprintln!("⚠ {message}");
        }
    }

    /// Print an error to stderr
    pub fn error(&self, message: &str) {
        if self.color {
            eprintln!("{} {}", "✗".red().bold(), message.red());
        } else {
            eprintln!("✗ {message}");
        }
    }

    /// Print a bold header line
    pub fn heading(&self, message: &str) {
        if self.json {
            return;
        }
        if self.color {
            println!("{}", message.bold());
        } else {
            println!("{message}");
        }
    }

    /// Print a value as pretty JSON on stdout
    pub fn print_json<T: Serialize + ?Sized>(&self, value: &T) -> Result<()> {
        println!("{}", serde_json::to_string_pretty(value)?);
        Ok(())
    }
}
