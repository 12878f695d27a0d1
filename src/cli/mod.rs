//! Command-line interface for ticket-relay
//!
//! The CLI is an operator tool: it inspects the persisted ticket state,
//! renders transcripts offline from exported history and prints the
//! effective configuration.

pub mod handlers;
mod output;

pub use output::OutputFormatter;

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// ticket-relay operator CLI
#[derive(Parser, Debug)]
#[command(name = "ticket-relay", version, about, long_about = None)]
pub struct Cli {
    /// Enable debug logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Output as JSON
    #[arg(long, global = true)]
    pub json: bool,

    /// Disable colored output
    #[arg(long, global = true)]
    pub no_color: bool,

    /// Ticket state file
    #[arg(long, global = true, env = "DATA_FILE", default_value = crate::config::DEFAULT_DATA_FILE)]
    pub data_file: PathBuf,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// List open tickets
    Tickets,

    /// Show the open ticket of a user
    Show {
        /// Owner user id
        owner: u64,
    },

    /// Render a transcript from a JSON history file
    Render {
        /// JSON array of history messages, oldest first
        input: PathBuf,

        /// Guild name used in the header and file name
        #[arg(long)]
        guild: String,

        /// Channel name used in the header and file name
        #[arg(long)]
        channel: String,

        /// Output directory
        #[arg(long, default_value = crate::config::DEFAULT_EXPORT_DIR)]
        out_dir: PathBuf,
    },

    /// Print the effective configuration
    Config,
}
