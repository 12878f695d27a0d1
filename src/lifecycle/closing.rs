//! Registry of tickets whose close is in flight

use crate::core::ChannelId;
use std::collections::HashSet;
use tokio::sync::{RwLock, RwLockReadGuard};

/// Held by a relay for as long as it sends into a ticket
pub type RelayPermit<'a> = RwLockReadGuard<'a, HashSet<ChannelId>>;

/// Ticket channels that are being closed
///
/// Relays take a [`RelayPermit`] before sending. Marking a channel as closing
/// waits for every outstanding permit, so history read after
/// [`ClosingTickets::begin`] returns contains every relayed message.
#[derive(Debug, Default)]
pub struct ClosingTickets {
    channels: RwLock<HashSet<ChannelId>>,
}

impl ClosingTickets {
    /// Mark `channel` as closing; `false` if a close is already running
    pub async fn begin(&self, channel: ChannelId) -> bool {
        self.channels.write().await.insert(channel)
    }

    /// Clear the closing mark of `channel`
    pub async fn finish(&self, channel: ChannelId) {
        self.channels.write().await.remove(&channel);
    }

    /// Permission to relay through `channel`, refused while it is closing
    pub async fn relay_permit(&self, channel: ChannelId) -> Option<RelayPermit<'_>> {
        let channels = self.channels.read().await;
        (!channels.contains(&channel)).then_some(channels)
    }
}
