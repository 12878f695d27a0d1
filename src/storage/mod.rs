//! Persistent ticket storage
//!
//! The whole relay state (ticket counter, panel handle and the open tickets)
//! lives in a single JSON document:
//!
//! ```json
//! {
//!   "last_ticket_id": 12,
//!   "panel_message_id": 1181234567890,
//!   "tickets": { "2093847561": { "ticket_id": 12, "channel_id": 1189876543210 } }
//! }
//! ```
//!
//! [`TicketStore`] owns the in-memory copy and writes it through
//! [`FileStorage`] on every mutation; callers never see the serialized form.

mod file;
mod repository;
mod store;

pub use file::{FileStorage, StoreState, StoredTicket};
pub use repository::TicketRepository;
pub use store::TicketStore;
