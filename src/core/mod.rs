//! Core domain types for ticket-relay
//!
//! Identifiers are opaque platform snowflakes wrapped in newtypes so that a
//! channel id can never be passed where a user id is expected.

mod builders;
mod message;

pub use builders::{EmbedBuilder, OutgoingMessageBuilder};
pub use message::{
    Attachment, Author, Embed, EmbedAuthor, EventOrigin, FileUpload, HistoryMessage,
    MessageEvent, OutgoingMessage, TicketAction, UserProfile,
};

use serde::{Deserialize, Serialize};
use std::fmt;

macro_rules! snowflake_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(pub u64);

        impl $name {
            #[must_use]
            pub const fn get(self) -> u64 {
                self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl From<u64> for $name {
            fn from(value: u64) -> Self {
                Self(value)
            }
        }
    };
}

snowflake_id!(
    /// Identifier of a platform user
    UserId
);
snowflake_id!(
    /// Identifier of a channel (guild text channel, category or DM channel)
    ChannelId
);
snowflake_id!(
    /// Identifier of a guild
    GuildId
);
snowflake_id!(
    /// Identifier of a guild role
    RoleId
);
snowflake_id!(
    /// Identifier of a sent message
    MessageId
);

/// Sequential ticket number, allocated from the persisted counter
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TicketId(pub u64);

impl TicketId {
    #[must_use]
    pub const fn get(self) -> u64 {
        self.0
    }
}

impl fmt::Display for TicketId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// An open support ticket
///
/// A ticket lives in the store from creation until it is closed. Its channel
/// is `None` only while the dedicated channel is being provisioned.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Ticket {
    pub id: TicketId,
    pub owner: UserId,
    pub channel: Option<ChannelId>,
}

impl Ticket {
    /// Create a ticket that has no channel yet
    #[must_use]
    pub const fn pending(id: TicketId, owner: UserId) -> Self {
        Self {
            id,
            owner,
            channel: None,
        }
    }

    /// Whether the ticket's channel has been provisioned
    #[must_use]
    pub const fn is_bound(&self) -> bool {
        self.channel.is_some()
    }
}
