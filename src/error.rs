//! Error types for ticket-relay
//!
//! All fallible operations in the crate return [`Result`], whose error side is
//! [`TicketRelayError`]. Outcomes that are part of normal ticket flow (a
//! duplicate creation request, a close on an unrelated channel) are modelled as
//! outcome enums by the lifecycle layer and never show up here.

use thiserror::Error;

/// Crate-wide result type
pub type Result<T> = std::result::Result<T, TicketRelayError>;

/// Errors raised by the ticket relay core
#[derive(Error, Debug)]
pub enum TicketRelayError {
    /// Filesystem failure while persisting state or writing a transcript
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON (de)serialization failure
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Transcript template failed to render
    #[error("Template error: {0}")]
    Template(#[from] tera::Error),

    /// Configuration could not be assembled
    #[error("Configuration error: {0}")]
    Config(#[from] config::ConfigError),

    /// The owner already has an open ticket
    #[error("User {owner} already has an open ticket ({ticket})")]
    AlreadyOpen { owner: String, ticket: String },

    /// No ticket is bound to the given owner
    #[error("No open ticket for user {owner}")]
    TicketNotFound { owner: String },

    /// A call into the messaging platform failed
    #[error("Platform operation '{operation}' failed: {source}")]
    Platform {
        operation: &'static str,
        #[source]
        source: anyhow::Error,
    },

    /// Invalid user input (CLI arguments, history files)
    #[error("Invalid input: {0}")]
    InvalidInput(String),
}

impl TicketRelayError {
    /// Wrap an adapter error for the given platform operation
    pub fn platform(operation: &'static str, source: impl Into<anyhow::Error>) -> Self {
        Self::Platform {
            operation,
            source: source.into(),
        }
    }

    /// Text shown to the person whose action triggered the error
    #[must_use]
    pub fn user_message(&self) -> String {
        match self {
            Self::AlreadyOpen { .. } => "❌ You already have an open ticket.".to_string(),
            Self::TicketNotFound { .. } => "❌ No active ticket.".to_string(),
            Self::Platform { operation, .. } => match *operation {
                "create_ticket_channel" => {
                    "❌ Could not create a ticket channel. Please contact an administrator."
                        .to_string()
                },
                "send_direct" => {
                    "❌ Could not send you a direct message. Check your privacy settings."
                        .to_string()
                },
                _ => "❌ Something went wrong, please try again.".to_string(),
            },
            _ => "❌ Something went wrong, please try again.".to_string(),
        }
    }

    /// Whether the error came from the platform collaborator
    #[must_use]
    pub const fn is_platform(&self) -> bool {
        matches!(self, Self::Platform { .. })
    }
}
