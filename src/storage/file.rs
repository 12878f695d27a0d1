use crate::core::{ChannelId, MessageId, TicketId, UserId};
use crate::error::Result;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Serialized form of the relay state
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreState {
    pub last_ticket_id: u64,
    pub panel_message_id: Option<MessageId>,
    pub tickets: BTreeMap<UserId, StoredTicket>,
}

/// A ticket entry keyed by its owner
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredTicket {
    pub ticket_id: TicketId,
    /// `null` only while the ticket channel is being created
    pub channel_id: Option<ChannelId>,
}

/// JSON file backend for [`StoreState`]
#[derive(Debug, Clone)]
pub struct FileStorage {
    path: PathBuf,
}

impl FileStorage {
    /// Create a storage handle for the given state file
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Path of the state file
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load the state file
    ///
    /// A missing, unreadable or unparsable file yields the default state.
    #[must_use]
    pub fn load_state(&self) -> StoreState {
        let content = match fs::read_to_string(&self.path) {
            Ok(content) => content,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                debug!(path = %self.path.display(), "state file absent, starting fresh");
                return StoreState::default();
            },
            Err(e) => {
                warn!(path = %self.path.display(), error = %e, "state file unreadable, starting fresh");
                return StoreState::default();
            },
        };

        match serde_json::from_str(&content) {
            Ok(state) => state,
            Err(e) => {
                warn!(path = %self.path.display(), error = %e, "state file corrupt, starting fresh");
                StoreState::default()
            },
        }
    }

    /// Write the state file, replacing the previous version
    ///
    /// The document is written to a sibling temporary file first and then
    /// renamed over the target, so readers see either the old or the new state.
    pub fn save_state(&self, state: &StoreState) -> Result<()> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }

        let tmp_path = self.tmp_path();
        let content = serde_json::to_string_pretty(state)?;
        fs::write(&tmp_path, content)?;
        if let Err(e) = fs::rename(&tmp_path, &self.path) {
            let _ = fs::remove_file(&tmp_path);
            return Err(e.into());
        }

        debug!(
            path = %self.path.display(),
            tickets = state.tickets.len(),
            last_ticket_id = state.last_ticket_id,
            "state saved"
        );
        Ok(())
    }

    fn tmp_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_default();
        name.push(".tmp");
        self.path.with_file_name(name)
    }
}
