//! Handlers for the `tickets` and `show` commands
//!
//! Both commands read the persisted ticket state without modifying it.

use crate::cli::OutputFormatter;
use crate::core::{Ticket, UserId};
use crate::error::{Result, TicketRelayError};
use crate::storage::{FileStorage, TicketRepository, TicketStore};
use std::path::Path;

fn ticket_json(ticket: &Ticket) -> serde_json::Value {
    serde_json::json!({
        "ticket_id": ticket.id.0,
        "owner": ticket.owner,
        "channel_id": ticket.channel,
        "provisioning": !ticket.is_bound(),
    })
}

/// Handler for the `tickets` command
///
/// Lists every open ticket, lowest ticket id first.
///
/// # Arguments
///
/// * `data_file` - Ticket state file
/// * `output` - Output formatter for displaying results
pub fn handle_tickets_command(data_file: &Path, output: &OutputFormatter) -> Result<()> {
    if !data_file.exists() {
        output.warning(&format!(
            "No state file at {}, showing an empty store",
            data_file.display()
        ));
    }
    let store = TicketStore::open(FileStorage::new(data_file));
    let mut tickets = store.open_tickets();
    tickets.sort_by_key(|t| t.id);

    if output.is_json() {
        return output.print_json(&serde_json::json!({
            "last_ticket_id": store.last_ticket_id().0,
            "panel_message_id": store.panel_message(),
            "tickets": tickets.iter().map(ticket_json).collect::<Vec<_>>(),
        }));
    }

    if tickets.is_empty() {
        output.info("No open tickets");
        return Ok(());
    }

    output.heading(&format!("{} open ticket(s)", tickets.len()));
    for ticket in &tickets {
        let channel = ticket
            .channel
            .map_or_else(|| "(provisioning)".to_string(), |c| c.to_string());
        output.info(&format!(
            "  {:<6} owner {:<20} channel {}",
            ticket.id.to_string(),
            ticket.owner,
            channel
        ));
    }
    output.info(&format!("Last ticket id: {}", store.last_ticket_id()));
    Ok(())
}

/// Handler for the `show` command
///
/// # Errors
///
/// Returns [`TicketRelayError::TicketNotFound`] when the user has no open
/// ticket.
pub fn handle_show_command(owner: u64, data_file: &Path, output: &OutputFormatter) -> Result<()> {
    let store = TicketStore::open(FileStorage::new(data_file));
    let ticket = store
        .lookup_by_owner(UserId(owner))
        .ok_or_else(|| TicketRelayError::TicketNotFound {
            owner: owner.to_string(),
        })?;

    if output.is_json() {
        return output.print_json(&ticket_json(&ticket));
    }

    output.success(&format!("Ticket {}", ticket.id));
    output.info(&format!("  Owner: {}", ticket.owner));
    if let Some(channel) = ticket.channel {
        output.info(&format!("  Channel: {channel}"));
    }
    Ok(())
}
