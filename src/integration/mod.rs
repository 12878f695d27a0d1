//! Ticket notification bus
//!
//! Observers (the platform adapter, audit logging) subscribe to lifecycle and
//! relay notifications without the core knowing who listens.

use crate::core::{ChannelId, Ticket, TicketId, UserId};
use std::path::PathBuf;
use tokio::sync::broadcast;

/// Direction a message was relayed in
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RelayDirection {
    /// From the user's private channel into the ticket channel
    ToSupport,
    /// From the ticket channel to the user's private channel
    ToUser,
}

/// Notifications published by the relay core
#[derive(Debug, Clone)]
pub enum TicketEvent {
    Opened {
        ticket: Ticket,
    },
    Closed {
        ticket: Ticket,
        transcript: PathBuf,
    },
    Relayed {
        ticket_id: TicketId,
        owner: UserId,
        source: ChannelId,
        direction: RelayDirection,
        attachments: usize,
    },
}

/// Broadcast channel for [`TicketEvent`]s
pub struct TicketEvents {
    sender: broadcast::Sender<TicketEvent>,
}

impl std::fmt::Debug for TicketEvents {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TicketEvents")
            .field("subscribers", &self.sender.receiver_count())
            .finish()
    }
}

impl Default for TicketEvents {
    fn default() -> Self {
        Self::new(100)
    }
}

impl TicketEvents {
    /// Create a bus buffering up to `capacity` events per slow subscriber
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    /// Get an event receiver
    pub fn subscribe(&self) -> broadcast::Receiver<TicketEvent> {
        self.sender.subscribe()
    }

    /// Notify about a ticket creation
    pub fn ticket_opened(&self, ticket: &Ticket) {
        let _ = self.sender.send(TicketEvent::Opened {
            ticket: ticket.clone(),
        });
    }

    /// Notify about a ticket closure
    pub fn ticket_closed(&self, ticket: &Ticket, transcript: PathBuf) {
        let _ = self.sender.send(TicketEvent::Closed {
            ticket: ticket.clone(),
            transcript,
        });
    }

    /// Notify about a relayed message
    pub fn message_relayed(
        &self,
        ticket: &Ticket,
        source: ChannelId,
        direction: RelayDirection,
        attachments: usize,
    ) {
        let _ = self.sender.send(TicketEvent::Relayed {
            ticket_id: ticket.id,
            owner: ticket.owner,
            source,
            direction,
            attachments,
        });
    }
}
