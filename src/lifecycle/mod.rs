//! Ticket lifecycle: creation, closure and the create-ticket panel
//!
//! Per user the lifecycle is `NoTicket -> Open -> NoTicket`; closed tickets
//! only survive as their transcript file.
//!
//! # Concurrency
//!
//! One async lock serializes the store mutations of every sequence: the
//! duplicate check and allocation of a create, the binding (or rollback) of
//! its channel, and the final removal of a close. Platform calls run outside
//! it; while a channel is provisioned the allocated, unbound ticket reserves
//! the owner. A transcript export never holds the lock.
//!
//! Channels whose close is in flight are tracked in [`ClosingTickets`], which
//! the message router consults before every relay.

use crate::config::TicketSettings;
use crate::core::{
    ChannelId, EmbedBuilder, FileUpload, MessageId, OutgoingMessage, OutgoingMessageBuilder,
    Ticket, TicketAction, TicketId, UserId, UserProfile,
};
use crate::error::{Result, TicketRelayError};
use crate::integration::TicketEvents;
use crate::platform::{ChannelRequest, Platform};
use crate::storage::{TicketRepository, TicketStore};
use crate::transcript::{TranscriptExporter, TranscriptFile, sanitize_filename};
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{error, info, warn};

mod closing;

pub use closing::{ClosingTickets, RelayPermit};

const PANEL_COLOR: u32 = 0x5865F2;
const OPENED_COLOR: u32 = 0x2ECC71;

/// Result of a ticket creation request
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CreateOutcome {
    /// A ticket and its channel were created
    Created {
        ticket: Ticket,
        /// Whether the opening direct message reached the user
        user_notified: bool,
    },
    /// The requester already has this open ticket; nothing changed
    AlreadyOpen(Ticket),
}

/// Result of a ticket closure request
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CloseOutcome {
    Closed {
        ticket: Ticket,
        transcript: TranscriptFile,
        /// Whether the transcript reached the user by direct message
        user_notified: bool,
    },
    /// The channel does not belong to an open ticket
    NotTicketChannel,
    /// The requester has no open ticket
    NoActiveTicket,
    /// Another close of the same ticket is still running
    AlreadyClosing(Ticket),
}

/// Result of panel maintenance
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PanelOutcome {
    Existing(MessageId),
    Created(MessageId),
}

/// Name of the channel created for a ticket
#[must_use]
pub fn ticket_channel_name(username: &str, id: TicketId) -> String {
    format!("{}-{}", sanitize_filename(&username.to_lowercase()), id.get())
}

fn panel_message() -> OutgoingMessage {
    OutgoingMessageBuilder::new()
        .embed(
            EmbedBuilder::new()
                .title("🎫 Support Tickets")
                .description(
                    "Click **Create Ticket** to open a support ticket.\nAll communication happens via **DMs**.",
                )
                .color(PANEL_COLOR)
                .build(),
        )
        .action(TicketAction::Create)
        .build()
}

fn channel_greeting(ticket: &Ticket, owner: &UserProfile) -> OutgoingMessage {
    OutgoingMessageBuilder::new()
        .embed(
            EmbedBuilder::new()
                .title(format!("🎫 Ticket {}", ticket.id))
                .description(format!(
                    "Opened by **{}**. This ticket is handled via **DMs**.",
                    owner.display_name
                ))
                .color(OPENED_COLOR)
                .build(),
        )
        .action(TicketAction::Close)
        .build()
}

fn user_greeting(ticket: &Ticket) -> OutgoingMessage {
    OutgoingMessageBuilder::new()
        .embed(
            EmbedBuilder::new()
                .title(format!("🎫 Ticket {} Opened", ticket.id))
                .description("Reply here to contact support.")
                .color(OPENED_COLOR)
                .build(),
        )
        .action(TicketAction::Close)
        .build()
}

/// Creates and closes tickets
pub struct LifecycleManager {
    platform: Arc<dyn Platform>,
    store: Arc<TicketStore>,
    exporter: Arc<TranscriptExporter>,
    events: Arc<TicketEvents>,
    settings: TicketSettings,
    /// Global store mutation lock
    mutations: Mutex<()>,
    /// Serializes panel maintenance
    panel: Mutex<()>,
    closing: Arc<ClosingTickets>,
}

impl std::fmt::Debug for LifecycleManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LifecycleManager")
            .field("platform", &"Arc<dyn Platform>")
            .field("settings", &self.settings)
            .finish_non_exhaustive()
    }
}

impl LifecycleManager {
    pub fn new(
        platform: Arc<dyn Platform>,
        store: Arc<TicketStore>,
        exporter: Arc<TranscriptExporter>,
        events: Arc<TicketEvents>,
        settings: TicketSettings,
    ) -> Self {
        Self {
            platform,
            store,
            exporter,
            events,
            settings,
            mutations: Mutex::new(()),
            panel: Mutex::new(()),
            closing: Arc::new(ClosingTickets::default()),
        }
    }

    /// Registry of closes in flight, shared with the message router
    #[must_use]
    pub fn closing(&self) -> Arc<ClosingTickets> {
        Arc::clone(&self.closing)
    }

    /// Run a store mutation on the blocking pool and wait for it to be durable
    async fn persist<T, F>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&TicketStore) -> Result<T> + Send + 'static,
        T: Send + 'static,
    {
        let store = Arc::clone(&self.store);
        tokio::task::spawn_blocking(move || f(&store))
            .await
            .map_err(|e| TicketRelayError::Io(std::io::Error::other(e)))?
    }

    async fn rollback(&self, owner: UserId) {
        let _guard = self.mutations.lock().await;
        if let Err(e) = self.persist(move |store| store.remove(owner)).await {
            error!(owner = %owner, error = %e, "failed to roll back ticket allocation");
        }
    }

    /// Open a ticket for `requester`
    ///
    /// The ticket is allocated first and reserves the owner while its channel
    /// is provisioned; a concurrent request for the same owner sees it as
    /// already open. If the channel cannot be created the allocated ticket is
    /// removed again before the error is returned. The ticket id stays
    /// consumed.
    pub async fn create_ticket(&self, requester: &UserProfile) -> Result<CreateOutcome> {
        let owner = requester.id;
        let ticket = {
            let _guard = self.mutations.lock().await;

            if let Some(existing) = self.store.lookup_by_owner(owner) {
                info!(owner = %owner, ticket = %existing.id, "create rejected, ticket already open");
                return Ok(CreateOutcome::AlreadyOpen(existing));
            }

            self.persist(move |store| store.allocate_ticket(owner))
                .await?
        };

        let ticket = {
            let request = ChannelRequest::private_ticket(
                ticket_channel_name(&requester.name, ticket.id),
                self.settings.ticket_category,
                self.settings.support_role,
                self.platform.self_id(),
            );
            let channel = match self.platform.create_ticket_channel(request).await {
                Ok(channel) => channel,
                Err(e) => {
                    warn!(owner = %owner, ticket = %ticket.id, error = %e, "channel provisioning failed, rolling back");
                    self.rollback(owner).await;
                    return Err(e);
                },
            };

            let bound = {
                let _guard = self.mutations.lock().await;
                self.persist(move |store| store.bind_channel(owner, channel))
                    .await
            };
            match bound {
                Ok(ticket) => ticket,
                Err(e) => {
                    error!(owner = %owner, channel = %channel, error = %e, "failed to record ticket channel");
                    self.rollback(owner).await;
                    return Err(e);
                },
            }
        };

        info!(ticket = %ticket.id, owner = %owner, channel = ?ticket.channel, "ticket opened");
        self.events.ticket_opened(&ticket);

        if let Some(channel) = ticket.channel {
            if let Err(e) = self
                .platform
                .send_to_channel(channel, channel_greeting(&ticket, requester))
                .await
            {
                warn!(ticket = %ticket.id, error = %e, "failed to greet ticket channel");
            }
        }

        let user_notified = match self.platform.send_direct(owner, user_greeting(&ticket)).await {
            Ok(_) => true,
            Err(e) => {
                warn!(ticket = %ticket.id, owner = %owner, error = %e, "failed to greet user");
                false
            },
        };

        Ok(CreateOutcome::Created {
            ticket,
            user_notified,
        })
    }

    /// Close the ticket owned by `owner`, wherever the request came from
    pub async fn close_for_owner(&self, owner: UserId) -> Result<CloseOutcome> {
        match self.store.lookup_by_owner(owner).and_then(|t| t.channel) {
            Some(channel) => self.close_ticket(channel).await,
            None => Ok(CloseOutcome::NoActiveTicket),
        }
    }

    /// Close the ticket whose channel is `channel`
    ///
    /// Exports the transcript, archives the channel, delivers the transcript
    /// to the channel and to the owner, then forgets the ticket. If any step
    /// before the removal fails the ticket stays open and the error is
    /// returned, so the close can be retried.
    pub async fn close_ticket(&self, channel: ChannelId) -> Result<CloseOutcome> {
        let ticket = {
            let _guard = self.mutations.lock().await;
            let Some(ticket) = self.store.lookup_by_channel(channel) else {
                info!(channel = %channel, "close requested outside a ticket channel");
                return Ok(CloseOutcome::NotTicketChannel);
            };
            // Waits for relays into this ticket that are still sending
            if !self.closing.begin(channel).await {
                info!(ticket = %ticket.id, "close already in flight");
                return Ok(CloseOutcome::AlreadyClosing(ticket));
            }
            ticket
        };

        let delivered = self.archive(&ticket, channel).await;

        let guard = self.mutations.lock().await;
        let result = match delivered {
            Ok((transcript, user_notified)) => {
                let owner = ticket.owner;
                self.persist(move |store| store.remove(owner))
                    .await
                    .map(|_| (transcript, user_notified))
            },
            Err(e) => Err(e),
        };
        self.closing.finish(channel).await;
        drop(guard);

        let (transcript, user_notified) = result.inspect_err(|e| {
            error!(ticket = %ticket.id, channel = %channel, error = %e, "ticket close failed");
        })?;

        info!(
            ticket = %ticket.id,
            owner = %ticket.owner,
            transcript = %transcript.path.display(),
            "ticket closed"
        );
        self.events.ticket_closed(&ticket, transcript.path.clone());
        Ok(CloseOutcome::Closed {
            ticket,
            transcript,
            user_notified,
        })
    }

    async fn archive(&self, ticket: &Ticket, channel: ChannelId) -> Result<(TranscriptFile, bool)> {
        let info = self.platform.channel_info(channel).await?;
        let history = self.platform.fetch_history(channel).await?;
        let transcript = self.exporter.export(&info, history).await?;

        self.platform
            .move_channel(channel, self.settings.archive_category)
            .await?;

        let upload = FileUpload::from_path(&transcript.path).await?;
        self.platform
            .send_to_channel(
                channel,
                OutgoingMessageBuilder::new().file(upload.clone()).build(),
            )
            .await?;

        let notice = OutgoingMessageBuilder::new()
            .content("🔒 Your ticket has been closed. Here is the transcript:")
            .file(upload)
            .build();
        let user_notified = match self.platform.send_direct(ticket.owner, notice).await {
            Ok(_) => true,
            Err(e) => {
                warn!(ticket = %ticket.id, owner = %ticket.owner, error = %e, "failed to send transcript to user");
                false
            },
        };

        Ok((transcript, user_notified))
    }

    /// Make sure exactly one create-ticket panel is live
    ///
    /// A recorded panel that no longer exists is forgotten and replaced.
    pub async fn ensure_panel(&self) -> Result<PanelOutcome> {
        let _panel = self.panel.lock().await;
        let channel = self.settings.panel_channel;

        if let Some(id) = self.store.panel_message() {
            if self.platform.message_exists(channel, id).await? {
                return Ok(PanelOutcome::Existing(id));
            }
            warn!(message = %id, "panel message is gone, recreating");
            let _guard = self.mutations.lock().await;
            self.persist(|store| store.set_panel_message(None)).await?;
        }

        let id = self.platform.send_to_channel(channel, panel_message()).await?;
        let _guard = self.mutations.lock().await;
        self.persist(move |store| store.set_panel_message(Some(id)))
            .await?;
        info!(message = %id, channel = %channel, "panel created");
        Ok(PanelOutcome::Created(id))
    }
}
