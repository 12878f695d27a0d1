use super::{Embed, EmbedAuthor, FileUpload, OutgoingMessage, TicketAction};

/// Builder for creating Embed instances
#[derive(Default)]
pub struct EmbedBuilder {
    title: Option<String>,
    description: Option<String>,
    color: Option<u32>,
    author: Option<EmbedAuthor>,
}

impl EmbedBuilder {
    /// Create a new embed builder
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the title
    #[must_use]
    pub fn title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    /// Set the description
    #[must_use]
    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Set the accent colour
    #[must_use]
    pub const fn color(mut self, color: u32) -> Self {
        self.color = Some(color);
        self
    }

    /// Attribute the embed to an author
    #[must_use]
    pub fn author(mut self, name: impl Into<String>, icon_url: Option<String>) -> Self {
        self.author = Some(EmbedAuthor {
            name: name.into(),
            icon_url,
        });
        self
    }

    /// Build the embed
    pub fn build(self) -> Embed {
        Embed {
            title: self.title,
            description: self.description,
            color: self.color,
            author: self.author,
        }
    }
}

/// Builder for creating OutgoingMessage instances
#[derive(Default)]
pub struct OutgoingMessageBuilder {
    content: Option<String>,
    embed: Option<Embed>,
    files: Vec<FileUpload>,
    action: Option<TicketAction>,
}

impl OutgoingMessageBuilder {
    /// Create a new message builder
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the plain text content
    #[must_use]
    pub fn content(mut self, content: impl Into<String>) -> Self {
        self.content = Some(content.into());
        self
    }

    /// Set the embed
    #[must_use]
    pub fn embed(mut self, embed: Embed) -> Self {
        self.embed = Some(embed);
        self
    }

    /// Add files
    #[must_use]
    pub fn files(mut self, files: Vec<FileUpload>) -> Self {
        self.files = files;
        self
    }

    /// Add a single file
    #[must_use]
    pub fn file(mut self, file: FileUpload) -> Self {
        self.files.push(file);
        self
    }

    /// Offer an action button with the message
    #[must_use]
    pub const fn action(mut self, action: TicketAction) -> Self {
        self.action = Some(action);
        self
    }

    /// Build the message
    pub fn build(self) -> OutgoingMessage {
        OutgoingMessage {
            content: self.content,
            embed: self.embed,
            files: self.files,
            action: self.action,
        }
    }
}
