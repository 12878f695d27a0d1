//! Event dispatch for the relay core
//!
//! [`TicketService`] is the single entry point a platform adapter talks to:
//! it owns the store, lifecycle manager and router built from a [`Config`]
//! and turns their outcomes into replies for the acting user.

use crate::config::Config;
use crate::core::{EventOrigin, UserId};
use crate::error::Result;
use crate::events::{EventReply, InboundEvent};
use crate::integration::{TicketEvent, TicketEvents};
use crate::lifecycle::{CloseOutcome, CreateOutcome, LifecycleManager, PanelOutcome};
use crate::platform::Platform;
use crate::router::{MessageRouter, RouteOutcome};
use crate::storage::{FileStorage, TicketStore};
use crate::transcript::TranscriptExporter;
use std::sync::Arc;
use tokio::sync::broadcast;
use tracing::{debug, info, warn};

/// The relay core wired together
pub struct TicketService {
    platform: Arc<dyn Platform>,
    store: Arc<TicketStore>,
    events: Arc<TicketEvents>,
    lifecycle: LifecycleManager,
    router: MessageRouter,
}

impl std::fmt::Debug for TicketService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TicketService")
            .field("store", &self.store)
            .field("lifecycle", &self.lifecycle)
            .finish_non_exhaustive()
    }
}

impl TicketService {
    /// Build the service from configuration
    pub fn new(config: &Config, platform: Arc<dyn Platform>) -> Result<Self> {
        let store = Arc::new(TicketStore::open(FileStorage::new(&config.data_file)));
        let exporter = Arc::new(TranscriptExporter::new(&config.export_dir)?);
        let events = Arc::new(TicketEvents::default());

        let lifecycle = LifecycleManager::new(
            Arc::clone(&platform),
            Arc::clone(&store),
            exporter,
            Arc::clone(&events),
            config.ticket_settings(),
        );
        let router = MessageRouter::new(
            Arc::clone(&platform),
            Arc::clone(&store),
            lifecycle.closing(),
            Arc::clone(&events),
        );

        info!(
            data_file = %config.data_file.display(),
            export_dir = %config.export_dir.display(),
            "ticket service ready"
        );
        Ok(Self {
            platform,
            store,
            events,
            lifecycle,
            router,
        })
    }

    pub fn store(&self) -> &TicketStore {
        &self.store
    }

    pub const fn lifecycle(&self) -> &LifecycleManager {
        &self.lifecycle
    }

    pub const fn router(&self) -> &MessageRouter {
        &self.router
    }

    /// Subscribe to lifecycle and relay notifications
    pub fn subscribe(&self) -> broadcast::Receiver<TicketEvent> {
        self.events.subscribe()
    }

    /// Handle one inbound event
    ///
    /// Failures of create/close requests become replies for the actor and
    /// are logged; message relay failures are returned to the adapter.
    pub async fn handle(&self, event: InboundEvent) -> Result<EventReply> {
        match event {
            InboundEvent::Ready => {
                match self.lifecycle.ensure_panel().await? {
                    PanelOutcome::Existing(id) => debug!(message = %id, "panel still live"),
                    PanelOutcome::Created(id) => info!(message = %id, "panel posted"),
                }
                Ok(EventReply::None)
            },
            InboundEvent::Message(message) => {
                let outcome = self.router.route(&message).await.inspect_err(|e| {
                    warn!(channel = %message.channel, error = %e, "relay failed");
                })?;
                match outcome {
                    RouteOutcome::Relayed { ticket, direction } => {
                        debug!(ticket = %ticket.id, ?direction, "relay complete");
                    },
                    RouteOutcome::Closing(ticket) => {
                        info!(ticket = %ticket.id, message = %message.id, "ticket closing, message not relayed");
                    },
                    _ => {},
                }
                Ok(EventReply::None)
            },
            InboundEvent::CreateRequested { actor } => Ok(self
                .create(actor)
                .await
                .unwrap_or_else(|e| {
                    warn!(actor = %actor, error = %e, "create request failed");
                    EventReply::Ephemeral(e.user_message())
                })),
            InboundEvent::CloseRequested {
                actor,
                origin,
                channel,
            } => {
                let outcome = match origin {
                    EventOrigin::Private => self.lifecycle.close_for_owner(actor).await,
                    EventOrigin::Guild { .. } => self.lifecycle.close_ticket(channel).await,
                };
                Ok(match outcome {
                    Ok(outcome) => close_reply(&outcome),
                    Err(e) => {
                        warn!(actor = %actor, channel = %channel, error = %e, "close request failed");
                        EventReply::Ephemeral(e.user_message())
                    },
                })
            },
        }
    }

    async fn create(&self, actor: UserId) -> Result<EventReply> {
        let requester = self.platform.fetch_user(actor).await?;
        Ok(match self.lifecycle.create_ticket(&requester).await? {
            CreateOutcome::Created {
                user_notified: true,
                ..
            } => EventReply::ephemeral("✅ Ticket created. Check your DMs."),
            CreateOutcome::Created { ticket, .. } => EventReply::Ephemeral(format!(
                "⚠️ Ticket {} created, but I couldn't DM you. Allow direct messages from this server to talk to support.",
                ticket.id
            )),
            CreateOutcome::AlreadyOpen(_) => {
                EventReply::ephemeral("❌ You already have an open ticket.")
            },
        })
    }
}

fn close_reply(outcome: &CloseOutcome) -> EventReply {
    match outcome {
        CloseOutcome::Closed { .. } => EventReply::ephemeral("🔒 Ticket closed."),
        CloseOutcome::NotTicketChannel => EventReply::ephemeral("❌ This channel is not a ticket."),
        CloseOutcome::NoActiveTicket => EventReply::ephemeral("❌ No active ticket."),
        CloseOutcome::AlreadyClosing(_) => {
            EventReply::ephemeral("⏳ This ticket is already being closed.")
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{Attachment, ChannelId, GuildId, MessageEvent, MessageId};
    use crate::storage::TicketRepository;
    use crate::test_utils::FakePlatform;
    use chrono::Utc;
    use std::collections::HashMap;
    use tempfile::TempDir;

    fn test_service(temp_dir: &TempDir) -> (TicketService, Arc<FakePlatform>) {
        let env: HashMap<String, String> = [
            ("BOT_TOKEN", "token".to_string()),
            ("CREATE_CHANNEL_ID", "2".to_string()),
            ("TICKET_CATEGORY_ID", "3".to_string()),
            ("ARCHIVE_CATEGORY_ID", "5".to_string()),
            ("SUPPORT_ROLE_ID", "4".to_string()),
            (
                "DATA_FILE",
                temp_dir.path().join("tickets.json").display().to_string(),
            ),
            (
                "EXPORT_DIR",
                temp_dir.path().join("exports").display().to_string(),
            ),
        ]
        .into_iter()
        .map(|(k, v)| (k.to_string(), v))
        .collect();
        let config = Config::from_sources(None, Some(env)).expect("Failed to load config");
        let platform = Arc::new(FakePlatform::default());
        let service = TicketService::new(&config, platform.clone()).expect("Failed to build service");
        (service, platform)
    }

    #[tokio::test]
    async fn test_full_ticket_round_trip() {
        let temp_dir = TempDir::new().unwrap();
        let (service, platform) = test_service(&temp_dir);
        let ana = platform.add_user(10, "Ana");
        let mut notifications = service.subscribe();

        assert_eq!(service.handle(InboundEvent::Ready).await.unwrap(), EventReply::None);

        let reply = service
            .handle(InboundEvent::CreateRequested { actor: ana.id })
            .await
            .unwrap();
        assert_eq!(reply.text(), Some("✅ Ticket created. Check your DMs."));
        let channel = service.store().lookup_by_owner(ana.id).unwrap().channel.unwrap();

        let reply = service
            .handle(InboundEvent::CreateRequested { actor: ana.id })
            .await
            .unwrap();
        assert_eq!(reply.text(), Some("❌ You already have an open ticket."));

        service
            .handle(InboundEvent::Message(MessageEvent {
                id: MessageId(1),
                channel: ChannelId(8_000),
                origin: EventOrigin::Private,
                author: ana.clone(),
                text: "<b>help</b> & thanks".to_string(),
                timestamp: Utc::now(),
                attachments: vec![Attachment {
                    url: "https://cdn.example.com/error.log".to_string(),
                    filename: "error.log".to_string(),
                    content_type: Some("text/plain".to_string()),
                }],
            }))
            .await
            .unwrap();

        let reply = service
            .handle(InboundEvent::CloseRequested {
                actor: UserId(20),
                origin: EventOrigin::Guild {
                    guild_id: GuildId(1),
                },
                channel,
            })
            .await
            .unwrap();
        assert_eq!(reply.text(), Some("🔒 Ticket closed."));
        assert!(service.store().lookup_by_owner(ana.id).is_none());

        let mut transcript = None;
        while let Ok(event) = notifications.try_recv() {
            if let TicketEvent::Closed { transcript: path, .. } = event {
                transcript = Some(path);
            }
        }
        let html = std::fs::read_to_string(transcript.expect("no Closed event")).unwrap();
        assert!(html.contains("&lt;b&gt;help&lt;&#x2F;b&gt; &amp; thanks"));
        assert!(html.contains("error.log"));

        let reply = service
            .handle(InboundEvent::CloseRequested {
                actor: ana.id,
                origin: EventOrigin::Private,
                channel: ChannelId(8_000),
            })
            .await
            .unwrap();
        assert_eq!(reply.text(), Some("❌ No active ticket."));
    }

    #[tokio::test]
    async fn test_provisioning_failure_is_reported_to_requester() {
        let temp_dir = TempDir::new().unwrap();
        let (service, platform) = test_service(&temp_dir);
        let ana = platform.add_user(10, "Ana");
        platform.fail_channel_creation(true);

        let reply = service
            .handle(InboundEvent::CreateRequested { actor: ana.id })
            .await
            .unwrap();
        assert!(reply.text().unwrap().contains("Could not create a ticket channel"));
        assert!(service.store().open_tickets().is_empty());
    }

    #[tokio::test]
    async fn test_close_in_unrelated_channel() {
        let temp_dir = TempDir::new().unwrap();
        let (service, _platform) = test_service(&temp_dir);

        let reply = service
            .handle(InboundEvent::CloseRequested {
                actor: UserId(20),
                origin: EventOrigin::Guild {
                    guild_id: GuildId(1),
                },
                channel: ChannelId(31_337),
            })
            .await
            .unwrap();
        assert_eq!(reply.text(), Some("❌ This channel is not a ticket."));
    }
}
