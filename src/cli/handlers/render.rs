//! Handler for the `render` command
//!
//! Renders a transcript offline from a JSON export of channel history.

use crate::cli::OutputFormatter;
use crate::core::{ChannelId, HistoryMessage};
use crate::error::{Result, TicketRelayError};
use crate::platform::ChannelInfo;
use crate::transcript::TranscriptExporter;
use std::path::{Path, PathBuf};

/// Handler for the `render` command
///
/// # Arguments
///
/// * `input` - JSON array of history messages, oldest first
/// * `guild` - Guild name for the header and file name
/// * `channel` - Channel name for the header and file name
/// * `out_dir` - Directory the transcript is written to
/// * `output` - Output formatter for displaying results
///
/// # Errors
///
/// Returns an error if the history file cannot be read or parsed, or the
/// transcript cannot be written.
pub fn handle_render_command(
    input: &Path,
    guild: String,
    channel: String,
    out_dir: PathBuf,
    output: &OutputFormatter,
) -> Result<()> {
    let raw = std::fs::read_to_string(input)?;
    let history: Vec<HistoryMessage> = serde_json::from_str(&raw).map_err(|e| {
        TicketRelayError::InvalidInput(format!("{}: {e}", input.display()))
    })?;

    let info = ChannelInfo {
        id: ChannelId(0),
        name: channel,
        guild_name: guild,
    };

    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()?;
    let transcript = runtime.block_on(async {
        let exporter = TranscriptExporter::new(out_dir)?;
        exporter
            .export(&info, futures::stream::iter(history.into_iter().map(Ok)))
            .await
    })?;

    if output.is_json() {
        return output.print_json(&serde_json::json!({
            "status": "success",
            "path": transcript.path,
            "messages": transcript.message_count,
        }));
    }

    output.success(&format!(
        "Rendered {} message(s) to {}",
        transcript.message_count,
        transcript.path.display()
    ));
    Ok(())
}
