//! Bidirectional message relay
//!
//! Messages a user sends to the bot privately are mirrored into their ticket
//! channel, and messages support posts in a ticket channel are mirrored back
//! to the user. Every relayed message carries the original author's display
//! name and avatar, and attachments are re-uploaded as files.
//!
//! Nothing is relayed into a ticket whose close has started, so its
//! transcript holds every message that was relayed through it.

use crate::core::{
    ChannelId, EmbedBuilder, MessageEvent, OutgoingMessage, OutgoingMessageBuilder, Ticket,
};
use crate::error::Result;
use crate::integration::{RelayDirection, TicketEvents};
use crate::lifecycle::ClosingTickets;
use crate::platform::Platform;
use crate::storage::{TicketRepository, TicketStore};
use std::collections::HashMap;
use std::sync::{Arc, Mutex as StdMutex, PoisonError};
use tokio::sync::Mutex;
use tracing::{debug, info};

const TO_SUPPORT_COLOR: u32 = 0x2B2D31;
const TO_USER_COLOR: u32 = 0x5865F2;

/// What the router did with an event
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RouteOutcome {
    /// Posted by the bot itself (or another bot); never relayed
    Ignored,
    /// Private message from a user without an open ticket
    NoTicket,
    /// Mirrored to the paired side
    Relayed {
        ticket: Ticket,
        direction: RelayDirection,
    },
    /// Guild message outside any ticket channel
    Unrelated,
    /// The ticket is being closed; the message was not relayed
    Closing(Ticket),
}

/// Mirrors message events between private channels and ticket channels
pub struct MessageRouter {
    platform: Arc<dyn Platform>,
    store: Arc<TicketStore>,
    closing: Arc<ClosingTickets>,
    events: Arc<TicketEvents>,
    /// One FIFO lane per source channel
    lanes: StdMutex<HashMap<ChannelId, Arc<Mutex<()>>>>,
}

impl std::fmt::Debug for MessageRouter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MessageRouter")
            .field("platform", &"Arc<dyn Platform>")
            .finish_non_exhaustive()
    }
}

impl MessageRouter {
    pub fn new(
        platform: Arc<dyn Platform>,
        store: Arc<TicketStore>,
        closing: Arc<ClosingTickets>,
        events: Arc<TicketEvents>,
    ) -> Self {
        Self {
            platform,
            store,
            closing,
            events,
            lanes: StdMutex::new(HashMap::new()),
        }
    }

    fn lane(&self, channel: ChannelId) -> Arc<Mutex<()>> {
        let mut lanes = self.lanes.lock().unwrap_or_else(PoisonError::into_inner);
        // Drop lanes nobody is waiting on
        lanes.retain(|id, lane| *id == channel || Arc::strong_count(lane) > 1);
        Arc::clone(lanes.entry(channel).or_default())
    }

    /// Route one inbound message event
    ///
    /// Events from the same channel are relayed in the order `route` was
    /// called for them; events from different channels do not wait on each
    /// other.
    pub async fn route(&self, event: &MessageEvent) -> Result<RouteOutcome> {
        if event.author.bot || event.author.id == self.platform.self_id() {
            return Ok(RouteOutcome::Ignored);
        }

        let (ticket, channel, direction) = if event.is_private() {
            match self
                .store
                .lookup_by_owner(event.author.id)
                .and_then(|ticket| ticket.channel.map(|channel| (ticket, channel)))
            {
                Some((ticket, channel)) => (ticket, channel, RelayDirection::ToSupport),
                None => {
                    debug!(author = %event.author.id, "private message without ticket dropped");
                    return Ok(RouteOutcome::NoTicket);
                },
            }
        } else {
            match self.store.lookup_by_channel(event.channel) {
                Some(ticket) => (ticket, event.channel, RelayDirection::ToUser),
                None => return Ok(RouteOutcome::Unrelated),
            }
        };

        let Some(_permit) = self.closing.relay_permit(channel).await else {
            info!(ticket = %ticket.id, "ticket is closing, message not relayed");
            return Ok(RouteOutcome::Closing(ticket));
        };
        // A close may have completed while the permit was pending
        if self.store.lookup_by_channel(channel).as_ref() != Some(&ticket) {
            info!(ticket = %ticket.id, "ticket closed, message not relayed");
            return Ok(RouteOutcome::Closing(ticket));
        }

        let lane = self.lane(event.channel);
        let _turn = lane.lock().await;

        let message = self.build_relay(event, direction).await?;
        match direction {
            RelayDirection::ToSupport => {
                self.platform.send_to_channel(channel, message).await?;
            },
            RelayDirection::ToUser => {
                self.platform.send_direct(ticket.owner, message).await?;
            },
        }

        info!(
            ticket = %ticket.id,
            direction = ?direction,
            attachments = event.attachments.len(),
            "message relayed"
        );
        self.events
            .message_relayed(&ticket, event.channel, direction, event.attachments.len());
        Ok(RouteOutcome::Relayed { ticket, direction })
    }

    async fn build_relay(
        &self,
        event: &MessageEvent,
        direction: RelayDirection,
    ) -> Result<OutgoingMessage> {
        let color = match direction {
            RelayDirection::ToSupport => TO_SUPPORT_COLOR,
            RelayDirection::ToUser => TO_USER_COLOR,
        };
        let embed = EmbedBuilder::new()
            .description(event.text.clone())
            .color(color)
            .author(
                event.author.display_name.clone(),
                Some(event.author.avatar_url.clone()),
            )
            .build();

        let mut files = Vec::with_capacity(event.attachments.len());
        for attachment in &event.attachments {
            files.push(self.platform.download_attachment(attachment.clone()).await?);
        }

        Ok(OutgoingMessageBuilder::new()
            .embed(embed)
            .files(files)
            .build())
    }
}
