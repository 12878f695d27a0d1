//! Test utilities for ticket-relay
//!
//! Provides an in-memory [`FakePlatform`] and a [`TestRelay`] fixture wiring
//! the real store, exporter and lifecycle manager on a temporary directory.

#![cfg(test)]

use crate::config::TicketSettings;
use crate::core::{
    Attachment, Author, ChannelId, FileUpload, HistoryMessage, MessageId, OutgoingMessage,
    RoleId, Ticket, UserId, UserProfile,
};
use crate::error::{Result, TicketRelayError};
use crate::integration::TicketEvents;
use crate::lifecycle::{CreateOutcome, LifecycleManager};
use crate::platform::{ChannelInfo, ChannelRequest, HistoryStream, PermissionOverwrite, Platform};
use crate::router::MessageRouter;
use crate::storage::{FileStorage, TicketStore};
use crate::transcript::TranscriptExporter;
use async_trait::async_trait;
use chrono::Utc;
use futures::StreamExt;
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use tempfile::TempDir;
use tokio::sync::{Notify, Semaphore};

/// Bot identity used by the fake platform
pub const BOT_ID: UserId = UserId(1);

/// Settings used by every test fixture
pub const fn settings() -> TicketSettings {
    TicketSettings {
        panel_channel: ChannelId(2),
        ticket_category: ChannelId(3),
        archive_category: ChannelId(5),
        support_role: RoleId(4),
    }
}

/// Create a user profile with a deterministic avatar
pub fn profile(id: u64, display_name: &str) -> UserProfile {
    Author {
        id: UserId(id),
        name: display_name.to_lowercase(),
        display_name: display_name.to_string(),
        avatar_url: format!("https://cdn.example.com/avatars/{id}.png"),
        bot: false,
    }
}

/// Pauses a fake platform call until opened
///
/// Lets a test act while a create or close is suspended inside the platform.
#[derive(Debug)]
pub struct CallGate {
    entered: Notify,
    release: Semaphore,
}

impl CallGate {
    fn new() -> Self {
        Self {
            entered: Notify::new(),
            release: Semaphore::new(0),
        }
    }

    async fn pass(&self) {
        self.entered.notify_one();
        if let Ok(permit) = self.release.acquire().await {
            permit.forget();
        }
    }

    /// Wait until a call is paused at the gate
    pub async fn reached(&self) {
        self.entered.notified().await;
    }

    /// Let paused and later calls through
    pub fn open(&self) {
        self.release.add_permits(1_000);
    }
}

/// A channel created through the fake platform
#[derive(Debug, Clone)]
pub struct FakeChannel {
    pub name: String,
    pub category: ChannelId,
    pub overwrites: Vec<PermissionOverwrite>,
    pub history: Vec<HistoryMessage>,
}

#[derive(Debug, Default)]
struct FakeState {
    channels: HashMap<ChannelId, FakeChannel>,
    sent: Vec<(ChannelId, MessageId, OutgoingMessage)>,
    direct: Vec<(UserId, OutgoingMessage)>,
    deleted: HashSet<MessageId>,
    users: HashMap<UserId, UserProfile>,
    blocked_dms: HashSet<UserId>,
    move_gate: Option<Arc<CallGate>>,
    create_gate: Option<Arc<CallGate>>,
}

/// In-memory platform that records everything the core asks of it
#[derive(Debug)]
pub struct FakePlatform {
    next_id: AtomicU64,
    fail_channel_creation: AtomicBool,
    state: Mutex<FakeState>,
}

impl Default for FakePlatform {
    fn default() -> Self {
        Self {
            next_id: AtomicU64::new(1000),
            fail_channel_creation: AtomicBool::new(false),
            state: Mutex::new(FakeState::default()),
        }
    }
}

impl FakePlatform {
    pub const GUILD_NAME: &'static str = "Help Desk";

    fn next_id(&self) -> u64 {
        self.next_id.fetch_add(1, Ordering::SeqCst)
    }

    fn state(&self) -> std::sync::MutexGuard<'_, FakeState> {
        self.state.lock().expect("fake platform state poisoned")
    }

    fn bot_author() -> Author {
        Author {
            id: BOT_ID,
            name: "relay".to_string(),
            display_name: "Relay".to_string(),
            avatar_url: "https://cdn.example.com/avatars/bot.png".to_string(),
            bot: true,
        }
    }

    /// Register a user the platform can resolve
    pub fn add_user(&self, id: u64, display_name: &str) -> UserProfile {
        let user = profile(id, display_name);
        self.state().users.insert(user.id, user.clone());
        user
    }

    /// Make channel creation fail (or succeed again)
    pub fn fail_channel_creation(&self, fail: bool) {
        self.fail_channel_creation.store(fail, Ordering::SeqCst);
    }

    /// Make direct messages to a user fail
    pub fn block_direct_messages(&self, user: UserId) {
        self.state().blocked_dms.insert(user);
    }

    /// Pause every following `move_channel` call at a gate
    pub fn gate_moves(&self) -> Arc<CallGate> {
        let gate = Arc::new(CallGate::new());
        self.state().move_gate = Some(Arc::clone(&gate));
        gate
    }

    /// Pause every following `create_ticket_channel` call at a gate
    pub fn gate_channel_creation(&self) -> Arc<CallGate> {
        let gate = Arc::new(CallGate::new());
        self.state().create_gate = Some(Arc::clone(&gate));
        gate
    }

    /// Delete a previously sent message
    pub fn delete_message(&self, id: MessageId) {
        self.state().deleted.insert(id);
    }

    /// Append a plain message from a support member to a channel's history
    pub fn post_history(&self, channel: ChannelId, author: &str, text: &str) {
        let mut state = self.state();
        if let Some(ch) = state.channels.get_mut(&channel) {
            ch.history.push(HistoryMessage {
                author: profile(500, author),
                text: text.to_string(),
                timestamp: Utc::now(),
                attachments: Vec::new(),
                embed: None,
            });
        }
    }

    pub fn channel(&self, id: ChannelId) -> Option<FakeChannel> {
        self.state().channels.get(&id).cloned()
    }

    pub fn channel_count(&self) -> usize {
        self.state().channels.len()
    }

    /// Messages posted into a channel, oldest first
    pub fn sent_to(&self, channel: ChannelId) -> Vec<OutgoingMessage> {
        self.state()
            .sent
            .iter()
            .filter(|(ch, _, _)| *ch == channel)
            .map(|(_, _, msg)| msg.clone())
            .collect()
    }

    /// Direct messages delivered to a user, oldest first
    pub fn direct_to(&self, user: UserId) -> Vec<OutgoingMessage> {
        self.state()
            .direct
            .iter()
            .filter(|(to, _)| *to == user)
            .map(|(_, msg)| msg.clone())
            .collect()
    }
}

#[async_trait]
impl Platform for FakePlatform {
    fn self_id(&self) -> UserId {
        BOT_ID
    }

    async fn create_ticket_channel(&self, request: ChannelRequest) -> Result<ChannelId> {
        let gate = self.state().create_gate.clone();
        if let Some(gate) = gate {
            gate.pass().await;
        }
        if self.fail_channel_creation.load(Ordering::SeqCst) {
            return Err(TicketRelayError::platform(
                "create_ticket_channel",
                anyhow::anyhow!("Missing Permissions"),
            ));
        }
        let id = ChannelId(self.next_id());
        self.state().channels.insert(
            id,
            FakeChannel {
                name: request.name,
                category: request.category,
                overwrites: request.overwrites,
                history: Vec::new(),
            },
        );
        Ok(id)
    }

    async fn move_channel(&self, channel: ChannelId, category: ChannelId) -> Result<()> {
        let gate = self.state().move_gate.clone();
        if let Some(gate) = gate {
            gate.pass().await;
        }
        let mut state = self.state();
        let ch = state.channels.get_mut(&channel).ok_or_else(|| {
            TicketRelayError::platform("move_channel", anyhow::anyhow!("Unknown Channel"))
        })?;
        ch.category = category;
        Ok(())
    }

    async fn send_to_channel(
        &self,
        channel: ChannelId,
        message: OutgoingMessage,
    ) -> Result<MessageId> {
        // Sends complete on a later poll, like a network round trip
        tokio::task::yield_now().await;
        let id = MessageId(self.next_id());
        let mut state = self.state();
        if let Some(ch) = state.channels.get_mut(&channel) {
            ch.history.push(HistoryMessage {
                author: Self::bot_author(),
                text: message.content.clone().unwrap_or_default(),
                timestamp: Utc::now(),
                attachments: message
                    .files
                    .iter()
                    .map(|file| Attachment {
                        url: format!("https://cdn.example.com/attachments/{}", file.filename),
                        filename: file.filename.clone(),
                        content_type: None,
                    })
                    .collect(),
                embed: message.embed.clone(),
            });
        }
        state.sent.push((channel, id, message));
        Ok(id)
    }

    async fn send_direct(&self, user: UserId, message: OutgoingMessage) -> Result<MessageId> {
        tokio::task::yield_now().await;
        let mut state = self.state();
        if state.blocked_dms.contains(&user) {
            return Err(TicketRelayError::platform(
                "send_direct",
                anyhow::anyhow!("Cannot send messages to this user"),
            ));
        }
        state.direct.push((user, message));
        Ok(MessageId(self.next_id()))
    }

    async fn fetch_user(&self, user: UserId) -> Result<UserProfile> {
        self.state().users.get(&user).cloned().ok_or_else(|| {
            TicketRelayError::platform("fetch_user", anyhow::anyhow!("Unknown User"))
        })
    }

    async fn channel_info(&self, channel: ChannelId) -> Result<ChannelInfo> {
        let state = self.state();
        let ch = state.channels.get(&channel).ok_or_else(|| {
            TicketRelayError::platform("channel_info", anyhow::anyhow!("Unknown Channel"))
        })?;
        Ok(ChannelInfo {
            id: channel,
            name: ch.name.clone(),
            guild_name: Self::GUILD_NAME.to_string(),
        })
    }

    async fn message_exists(&self, channel: ChannelId, message: MessageId) -> Result<bool> {
        let state = self.state();
        Ok(!state.deleted.contains(&message)
            && state
                .sent
                .iter()
                .any(|(ch, id, _)| *ch == channel && *id == message))
    }

    async fn download_attachment(&self, attachment: Attachment) -> Result<FileUpload> {
        Ok(FileUpload {
            filename: attachment.filename,
            data: attachment.url.into_bytes(),
        })
    }

    async fn fetch_history(&self, channel: ChannelId) -> Result<HistoryStream> {
        let history = self
            .state()
            .channels
            .get(&channel)
            .map(|ch| ch.history.clone())
            .unwrap_or_default();
        Ok(futures::stream::iter(history.into_iter().map(Ok)).boxed())
    }
}

/// Fully wired relay core on a temporary directory
pub struct TestRelay {
    pub temp_dir: TempDir,
    pub platform: Arc<FakePlatform>,
    pub store: Arc<TicketStore>,
    pub events: Arc<TicketEvents>,
    pub lifecycle: LifecycleManager,
    pub router: MessageRouter,
}

impl TestRelay {
    pub fn new() -> Self {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let platform = Arc::new(FakePlatform::default());
        let store = Arc::new(TicketStore::open(FileStorage::new(
            temp_dir.path().join("tickets.json"),
        )));
        let exporter = Arc::new(
            TranscriptExporter::new(temp_dir.path().join("exports"))
                .expect("Failed to create exporter"),
        );
        let events = Arc::new(TicketEvents::default());
        let lifecycle = LifecycleManager::new(
            platform.clone(),
            Arc::clone(&store),
            exporter,
            Arc::clone(&events),
            settings(),
        );
        let router = MessageRouter::new(
            platform.clone(),
            Arc::clone(&store),
            lifecycle.closing(),
            Arc::clone(&events),
        );

        Self {
            temp_dir,
            platform,
            store,
            events,
            lifecycle,
            router,
        }
    }

    /// Open a ticket for `user` and return it
    pub async fn open_ticket(&self, user: &UserProfile) -> Ticket {
        match self
            .lifecycle
            .create_ticket(user)
            .await
            .expect("Failed to create ticket")
        {
            CreateOutcome::Created { ticket, .. } => ticket,
            CreateOutcome::AlreadyOpen(ticket) => ticket,
        }
    }
}
