//! Command handlers
//!
//! Each submodule implements one group of CLI commands on top of the library.

mod config;
mod render;
mod tickets;

pub use config::handle_config_command;
pub use render::handle_render_command;
pub use tickets::{handle_show_command, handle_tickets_command};
