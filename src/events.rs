//! Inbound events handed to the relay core by the platform adapter
//!
//! How a request originated visually (button, slash command) is the adapter's
//! business; the core only sees these flat events.

use crate::core::{ChannelId, EventOrigin, MessageEvent, TicketAction, UserId};

/// An event delivered by the platform adapter
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InboundEvent {
    /// The adapter connected and is ready to serve
    Ready,
    /// A message was posted somewhere the bot can see
    Message(MessageEvent),
    /// A user asked for a new ticket
    CreateRequested { actor: UserId },
    /// A user asked to close a ticket from `channel`
    CloseRequested {
        actor: UserId,
        origin: EventOrigin,
        channel: ChannelId,
    },
}

impl InboundEvent {
    /// Translate an activated action into the matching request event
    #[must_use]
    pub const fn from_action(
        action: TicketAction,
        actor: UserId,
        origin: EventOrigin,
        channel: ChannelId,
    ) -> Self {
        match action {
            TicketAction::Create => Self::CreateRequested { actor },
            TicketAction::Close => Self::CloseRequested {
                actor,
                origin,
                channel,
            },
        }
    }
}

/// Reply the adapter should show to the actor of an event
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EventReply {
    /// Nothing to show
    None,
    /// Short notice visible only to the actor
    Ephemeral(String),
}

impl EventReply {
    pub fn ephemeral(text: impl Into<String>) -> Self {
        Self::Ephemeral(text.into())
    }

    /// Text of the reply, if any
    #[must_use]
    pub fn text(&self) -> Option<&str> {
        match self {
            Self::None => None,
            Self::Ephemeral(text) => Some(text),
        }
    }
}
