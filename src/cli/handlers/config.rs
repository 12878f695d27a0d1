//! Handler for the `config` command

use crate::cli::OutputFormatter;
use crate::config::Config;
use crate::error::Result;

/// Handler for the `config` command
///
/// Prints the effective configuration with the bot token redacted.
///
/// # Errors
///
/// Returns an error if the configuration cannot be loaded.
pub fn handle_config_command(output: &OutputFormatter) -> Result<()> {
    let config = Config::load()?;

    if output.is_json() {
        return output.print_json(&serde_json::json!({
            "bot_token": "<redacted>",
            "create_channel_id": config.create_channel_id,
            "ticket_category_id": config.ticket_category_id,
            "archive_category_id": config.archive_category_id,
            "support_role_id": config.support_role_id,
            "data_file": config.data_file,
            "export_dir": config.export_dir,
        }));
    }

    output.heading("Configuration");
    output.info(&format!("  create_channel_id:   {}", config.create_channel_id));
    output.info(&format!("  ticket_category_id:  {}", config.ticket_category_id));
    output.info(&format!("  archive_category_id: {}", config.archive_category_id));
    output.info(&format!("  support_role_id:     {}", config.support_role_id));
    output.info(&format!("  data_file:           {}", config.data_file.display()));
    output.info(&format!("  export_dir:          {}", config.export_dir.display()));
    output.info("  bot_token:           <redacted>");
    Ok(())
}
