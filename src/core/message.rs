use super::{ChannelId, GuildId, MessageId, UserId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Author of an inbound or historical message
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Author {
    pub id: UserId,
    /// Account name, used to derive ticket channel names
    pub name: String,
    /// Name shown next to messages (nickname or global display name)
    pub display_name: String,
    pub avatar_url: String,
    #[serde(default)]
    pub bot: bool,
}

/// Profile of a user fetched from the platform
pub type UserProfile = Author;

/// File attached to a message
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Attachment {
    pub url: String,
    pub filename: String,
    #[serde(default)]
    pub content_type: Option<String>,
}

impl Attachment {
    /// Whether the attachment is a common raster image
    #[must_use]
    pub fn is_image(&self) -> bool {
        if self
            .content_type
            .as_deref()
            .is_some_and(|ct| ct.starts_with("image/"))
        {
            return true;
        }
        Path::new(&self.filename)
            .extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| {
                matches!(
                    ext.to_ascii_lowercase().as_str(),
                    "png" | "jpg" | "jpeg" | "gif" | "webp" | "bmp"
                )
            })
    }
}

/// Where an inbound event was posted
///
/// Decided by the platform adapter; the core never inspects channel types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum EventOrigin {
    /// The author's private (direct message) channel with the bot
    Private,
    /// A channel inside a guild
    Guild { guild_id: GuildId },
}

/// A message received from the platform
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MessageEvent {
    pub id: MessageId,
    pub channel: ChannelId,
    pub origin: EventOrigin,
    pub author: Author,
    #[serde(default)]
    pub text: String,
    pub timestamp: DateTime<Utc>,
    #[serde(default)]
    pub attachments: Vec<Attachment>,
}

impl MessageEvent {
    /// Whether the event was posted in a direct message channel
    #[must_use]
    pub const fn is_private(&self) -> bool {
        matches!(self.origin, EventOrigin::Private)
    }
}

/// Author block of an embed
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmbedAuthor {
    pub name: String,
    #[serde(default)]
    pub icon_url: Option<String>,
}

/// Rich card attached to an outgoing message
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Embed {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub color: Option<u32>,
    #[serde(default)]
    pub author: Option<EmbedAuthor>,
}

/// A message as retrieved from a channel's history
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryMessage {
    pub author: Author,
    #[serde(default)]
    pub text: String,
    pub timestamp: DateTime<Utc>,
    #[serde(default)]
    pub attachments: Vec<Attachment>,
    /// First embed of the message, if any
    #[serde(default)]
    pub embed: Option<Embed>,
}

/// Interactive action offered alongside a message
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TicketAction {
    Create,
    Close,
}

impl TicketAction {
    /// Stable identifier the adapter attaches to the button
    #[must_use]
    pub const fn custom_id(self) -> &'static str {
        match self {
            Self::Create => "ticket:create",
            Self::Close => "ticket:close",
        }
    }

    /// Resolve a button identifier back to an action
    #[must_use]
    pub fn from_custom_id(id: &str) -> Option<Self> {
        match id {
            "ticket:create" => Some(Self::Create),
            "ticket:close" => Some(Self::Close),
            _ => None,
        }
    }
}

/// File uploaded with an outgoing message
#[derive(Clone, PartialEq, Eq)]
pub struct FileUpload {
    pub filename: String,
    pub data: Vec<u8>,
}

impl std::fmt::Debug for FileUpload {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FileUpload")
            .field("filename", &self.filename)
            .field("len", &self.data.len())
            .finish()
    }
}

impl FileUpload {
    /// Read a file from disk, keeping its file name
    pub async fn from_path(path: &Path) -> std::io::Result<Self> {
        let data = tokio::fs::read(path).await?;
        let filename = path
            .file_name()
            .and_then(|name| name.to_str())
            .unwrap_or("transcript.html")
            .to_string();
        Ok(Self { filename, data })
    }
}

/// A message the core asks the platform to deliver
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct OutgoingMessage {
    pub content: Option<String>,
    pub embed: Option<Embed>,
    pub files: Vec<FileUpload>,
    pub action: Option<TicketAction>,
}
