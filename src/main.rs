//! ticket-relay - Operator CLI
//!
//! This is the main entry point for the ticket-relay CLI application.
//! It handles command-line argument parsing and dispatches to the appropriate
//! command handlers.

use clap::Parser;
use std::process;
use ticket_relay::cli::handlers::{
    handle_config_command, handle_render_command, handle_show_command, handle_tickets_command,
};
use ticket_relay::cli::{Cli, Commands, OutputFormatter};
use ticket_relay::error::{Result, TicketRelayError};
use tracing_subscriber::EnvFilter;

/// Main entry point for the ticket-relay CLI
///
/// Parses command-line arguments and executes the requested command.
fn main() {
    let cli = Cli::parse();

    let formatter = OutputFormatter::new(cli.json, cli.no_color);

    if let Err(e) = run(cli, &formatter) {
        handle_error(&e, &formatter);
        process::exit(1);
    }
}

/// Run the CLI application with the parsed arguments
///
/// # Errors
///
/// Returns any error that occurs during command execution
fn run(cli: Cli, formatter: &OutputFormatter) -> Result<()> {
    init_tracing(cli.verbose);

    match cli.command {
        Commands::Tickets => handle_tickets_command(&cli.data_file, formatter),
        Commands::Show { owner } => handle_show_command(owner, &cli.data_file, formatter),
        Commands::Render {
            input,
            guild,
            channel,
            out_dir,
        } => handle_render_command(&input, guild, channel, out_dir, formatter),
        Commands::Config => handle_config_command(formatter),
    }
}

/// Log to stderr, honouring `RUST_LOG`; `--verbose` forces debug
fn init_tracing(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

/// Handle errors and display them to the user
///
/// In verbose mode the full error is printed as well.
fn handle_error(error: &TicketRelayError, formatter: &OutputFormatter) {
    formatter.error(&error.to_string());

    if formatter.is_json() {
        let _ = formatter.print_json(&serde_json::json!({
            "status": "error",
            "error": error.to_string(),
            "platform": error.is_platform(),
        }));
    }

    if tracing::enabled!(tracing::Level::DEBUG) {
        eprintln!("\nDebug information:");
        eprintln!("{error:?}");
    }
}
