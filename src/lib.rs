//! ticket-relay - Support tickets relayed between direct messages and private channels
//!
//! This crate provides the core of a support-ticket bot:
//! - One open ticket per user, each backed by a private staff channel
//! - Bidirectional mirroring between the user's DMs and the ticket channel
//! - Self-contained HTML transcripts produced when a ticket closes
//! - JSON persistence that survives restarts
//!
//! The messaging platform itself is reached through the [`platform::Platform`]
//! trait; an adapter feeds [`events::InboundEvent`]s into
//! [`service::TicketService`].

// Allow missing error documentation for internal implementations
#![allow(clippy::missing_errors_doc)]
// Allow some pedantic lints that don't improve code quality
#![allow(clippy::option_if_let_else)]
#![allow(clippy::needless_pass_by_value)]
#![allow(clippy::match_same_arms)]
#![allow(clippy::redundant_closure_for_method_calls)]
#![allow(clippy::items_after_statements)]
#![allow(clippy::single_match_else)]
#![allow(clippy::too_many_lines)]
#![allow(clippy::module_name_repetitions)]

//! # Concurrency
//!
//! Ticket mutations (create, the final step of close, panel maintenance) are
//! serialized through a single lock inside the lifecycle manager. Transcript
//! export runs outside that lock, so a long export never blocks other users
//! from opening tickets.
//!
//! # Example
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use ticket_relay::config::Config;
//! use ticket_relay::events::InboundEvent;
//! use ticket_relay::service::TicketService;
//!
//! let config = Config::load()?;
//! let service = TicketService::new(&config, Arc::new(my_adapter))?;
//!
//! service.handle(InboundEvent::Ready).await?;
//! let reply = service.handle(InboundEvent::CreateRequested { actor }).await?;
//! ```

pub mod cli;
pub mod config;
pub mod core;
pub mod error;
pub mod events;
pub mod integration;
pub mod lifecycle;
pub mod platform;
pub mod router;
pub mod service;
pub mod storage;
pub mod transcript;

#[cfg(test)]
pub mod test_utils;

// Re-export commonly used types
pub use error::{Result, TicketRelayError};
