//! Messaging platform seam
//!
//! The relay core never talks to a chat service directly. A platform adapter
//! (gateway connection, REST client) implements [`Platform`] and feeds inbound
//! events to [`crate::service::TicketService`].

use crate::core::{
    Attachment, ChannelId, FileUpload, HistoryMessage, MessageId, OutgoingMessage, RoleId,
    UserId, UserProfile,
};
use crate::error::Result;
use async_trait::async_trait;
use futures::stream::BoxStream;

/// Lazily fetched channel history, oldest message first
pub type HistoryStream = BoxStream<'static, Result<HistoryMessage>>;

/// Who a permission overwrite applies to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PermissionTarget {
    /// Every member of the guild
    Everyone,
    Role(RoleId),
    Member(UserId),
}

/// Channel permission overwrite
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PermissionOverwrite {
    pub target: PermissionTarget,
    pub view_channel: bool,
    pub send_messages: bool,
}

/// Request to create a ticket channel
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChannelRequest {
    pub name: String,
    pub category: ChannelId,
    pub overwrites: Vec<PermissionOverwrite>,
}

impl ChannelRequest {
    /// A channel hidden from everyone except the support role and the bot
    #[must_use]
    pub fn private_ticket(
        name: impl Into<String>,
        category: ChannelId,
        support_role: RoleId,
        bot: UserId,
    ) -> Self {
        Self {
            name: name.into(),
            category,
            overwrites: vec![
                PermissionOverwrite {
                    target: PermissionTarget::Everyone,
                    view_channel: false,
                    send_messages: false,
                },
                PermissionOverwrite {
                    target: PermissionTarget::Role(support_role),
                    view_channel: true,
                    send_messages: true,
                },
                PermissionOverwrite {
                    target: PermissionTarget::Member(bot),
                    view_channel: true,
                    send_messages: false,
                },
            ],
        }
    }
}

/// Display metadata of a guild channel
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChannelInfo {
    pub id: ChannelId,
    pub name: String,
    pub guild_name: String,
}

/// Operations the relay consumes from the messaging platform
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait Platform: Send + Sync {
    /// Identity the bot posts as
    fn self_id(&self) -> UserId;

    /// Create a guild text channel
    async fn create_ticket_channel(&self, request: ChannelRequest) -> Result<ChannelId>;

    /// Move a channel under another category
    async fn move_channel(&self, channel: ChannelId, category: ChannelId) -> Result<()>;

    /// Post a message into a channel
    async fn send_to_channel(&self, channel: ChannelId, message: OutgoingMessage)
    -> Result<MessageId>;

    /// Send a direct message to a user
    async fn send_direct(&self, user: UserId, message: OutgoingMessage) -> Result<MessageId>;

    /// Fetch a user's profile
    async fn fetch_user(&self, user: UserId) -> Result<UserProfile>;

    /// Fetch display metadata of a channel
    async fn channel_info(&self, channel: ChannelId) -> Result<ChannelInfo>;

    /// Whether a message still exists in a channel
    async fn message_exists(&self, channel: ChannelId, message: MessageId) -> Result<bool>;

    /// Download an attachment so it can be uploaded again
    async fn download_attachment(&self, attachment: Attachment) -> Result<FileUpload>;

    /// Full history of a channel, oldest first
    async fn fetch_history(&self, channel: ChannelId) -> Result<HistoryStream>;
}
