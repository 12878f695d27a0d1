//! Configuration for ticket-relay
//!
//! Values are layered, later sources winning:
//! 1. built-in defaults (`data_file`, `export_dir`)
//! 2. an optional `ticket-relay.{toml,yaml,json}` file
//! 3. the process environment (`BOT_TOKEN`, `CREATE_CHANNEL_ID`, ...), with a
//!    `.env` file in the working directory loaded first

use crate::core::{ChannelId, RoleId};
use crate::error::Result;
use serde::Deserialize;
use std::collections::HashMap;
use std::fmt;
use std::path::PathBuf;

/// Default location of the persisted ticket state
pub const DEFAULT_DATA_FILE: &str = "tickets.json";

/// Default directory for rendered transcripts
pub const DEFAULT_EXPORT_DIR: &str = "exports/html";

/// Default base name of the optional configuration file
pub const DEFAULT_CONFIG_FILE: &str = "ticket-relay";

/// Effective runtime configuration
#[derive(Clone, Deserialize)]
pub struct Config {
    /// Bot credential handed to the platform adapter
    pub bot_token: String,
    /// Channel hosting the create-ticket panel
    pub create_channel_id: ChannelId,
    /// Category receiving new ticket channels
    pub ticket_category_id: ChannelId,
    /// Category closed ticket channels are moved to
    pub archive_category_id: ChannelId,
    /// Role allowed to see ticket channels
    pub support_role_id: RoleId,
    pub data_file: PathBuf,
    pub export_dir: PathBuf,
}

impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("bot_token", &"<redacted>")
            .field("create_channel_id", &self.create_channel_id)
            .field("ticket_category_id", &self.ticket_category_id)
            .field("archive_category_id", &self.archive_category_id)
            .field("support_role_id", &self.support_role_id)
            .field("data_file", &self.data_file)
            .field("export_dir", &self.export_dir)
            .finish()
    }
}

/// Ticket placement settings used by the lifecycle manager
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TicketSettings {
    pub panel_channel: ChannelId,
    pub ticket_category: ChannelId,
    pub archive_category: ChannelId,
    pub support_role: RoleId,
}

impl Config {
    /// Load configuration from `.env`, the default config file and the environment
    pub fn load() -> Result<Self> {
        if let Ok(path) = dotenvy::dotenv() {
            tracing::debug!(path = %path.display(), "loaded .env");
        }
        Self::from_sources(Some(DEFAULT_CONFIG_FILE), None)
    }

    /// Build configuration from an optional file and an environment
    ///
    /// `env` replaces the process environment when given.
    pub fn from_sources(file: Option<&str>, env: Option<HashMap<String, String>>) -> Result<Self> {
        let mut builder = config::Config::builder()
            .set_default("data_file", DEFAULT_DATA_FILE)?
            .set_default("export_dir", DEFAULT_EXPORT_DIR)?;

        if let Some(name) = file {
            builder = builder.add_source(config::File::with_name(name).required(false));
        }

        let config: Self = builder
            .add_source(
                config::Environment::default()
                    .try_parsing(true)
                    .source(env),
            )
            .build()?
            .try_deserialize()?;

        if config.bot_token.trim().is_empty() {
            return Err(config::ConfigError::Message("BOT_TOKEN must not be empty".to_string()).into());
        }
        Ok(config)
    }

    /// Placement settings for ticket channels
    #[must_use]
    pub const fn ticket_settings(&self) -> TicketSettings {
        TicketSettings {
            panel_channel: self.create_channel_id,
            ticket_category: self.ticket_category_id,
            archive_category: self.archive_category_id,
            support_role: self.support_role_id,
        }
    }
}
