use super::file::StoredTicket;
use super::store::TicketStore;
use crate::core::{ChannelId, MessageId, Ticket, TicketId, UserId};
use crate::error::{Result, TicketRelayError};
use tracing::{debug, info};

/// Repository trait for ticket storage operations
///
/// All lookups are answered from the same owner-keyed mapping, so a lookup by
/// channel can never disagree with a lookup by owner.
pub trait TicketRepository: Send + Sync {
    /// Allocates the next ticket id for an owner and stores the ticket
    ///
    /// Fails with [`TicketRelayError::AlreadyOpen`] without touching state
    /// when the owner already has a ticket.
    fn allocate_ticket(&self, owner: UserId) -> Result<Ticket>;

    /// Records the channel provisioned for an owner's ticket
    fn bind_channel(&self, owner: UserId, channel: ChannelId) -> Result<Ticket>;

    /// Finds the open ticket of an owner
    fn lookup_by_owner(&self, owner: UserId) -> Option<Ticket>;

    /// Finds the open ticket whose channel is `channel`
    fn lookup_by_channel(&self, channel: ChannelId) -> Option<Ticket>;

    /// Removes an owner's ticket, returning it if there was one
    fn remove(&self, owner: UserId) -> Result<Option<Ticket>>;

    /// Records (or clears) the panel message handle
    fn set_panel_message(&self, id: Option<MessageId>) -> Result<()>;

    /// Gets the recorded panel message handle
    fn panel_message(&self) -> Option<MessageId>;

    /// Lists all open tickets ordered by owner
    fn open_tickets(&self) -> Vec<Ticket>;

    /// Last allocated ticket id (0 on a fresh install)
    fn last_ticket_id(&self) -> TicketId;
}

const fn to_ticket(owner: UserId, stored: &StoredTicket) -> Ticket {
    Ticket {
        id: stored.ticket_id,
        owner,
        channel: stored.channel_id,
    }
}

impl TicketRepository for TicketStore {
    fn allocate_ticket(&self, owner: UserId) -> Result<Ticket> {
        let ticket = self.mutate(|state| {
            if let Some(existing) = state.tickets.get(&owner) {
                return Err(TicketRelayError::AlreadyOpen {
                    owner: owner.to_string(),
                    ticket: existing.ticket_id.to_string(),
                });
            }
            state.last_ticket_id += 1;
            let ticket = Ticket::pending(TicketId(state.last_ticket_id), owner);
            state.tickets.insert(
                owner,
                StoredTicket {
                    ticket_id: ticket.id,
                    channel_id: None,
                },
            );
            Ok(ticket)
        })?;
        info!(ticket = %ticket.id, owner = %owner, "ticket allocated");
        Ok(ticket)
    }

    fn bind_channel(&self, owner: UserId, channel: ChannelId) -> Result<Ticket> {
        self.mutate(|state| {
            let stored = state
                .tickets
                .get_mut(&owner)
                .ok_or_else(|| TicketRelayError::TicketNotFound {
                    owner: owner.to_string(),
                })?;
            stored.channel_id = Some(channel);
            Ok(to_ticket(owner, stored))
        })
    }

    fn lookup_by_owner(&self, owner: UserId) -> Option<Ticket> {
        self.read()
            .tickets
            .get(&owner)
            .map(|stored| to_ticket(owner, stored))
    }

    fn lookup_by_channel(&self, channel: ChannelId) -> Option<Ticket> {
        self.read()
            .tickets
            .iter()
            .find(|(_, stored)| stored.channel_id == Some(channel))
            .map(|(owner, stored)| to_ticket(*owner, stored))
    }

    fn remove(&self, owner: UserId) -> Result<Option<Ticket>> {
        let removed = self.mutate(|state| {
            Ok(state
                .tickets
                .remove(&owner)
                .map(|stored| to_ticket(owner, &stored)))
        })?;
        match &removed {
            Some(ticket) => info!(ticket = %ticket.id, owner = %owner, "ticket removed"),
            None => debug!(owner = %owner, "remove on owner without ticket"),
        }
        Ok(removed)
    }

    fn set_panel_message(&self, id: Option<MessageId>) -> Result<()> {
        self.mutate(|state| {
            state.panel_message_id = id;
            Ok(())
        })
    }

    fn panel_message(&self) -> Option<MessageId> {
        self.read().panel_message_id
    }

    fn open_tickets(&self) -> Vec<Ticket> {
        self.read()
            .tickets
            .iter()
            .map(|(owner, stored)| to_ticket(*owner, stored))
            .collect()
    }

    fn last_ticket_id(&self) -> TicketId {
        TicketId(self.read().last_ticket_id)
    }
}
