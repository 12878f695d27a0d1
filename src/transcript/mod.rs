//! HTML transcripts of ticket channels
//!
//! A transcript is rendered once, when a ticket closes, from the channel's
//! history. Records are rendered and written one at a time so that long
//! channels never need their whole history in memory.

use crate::core::HistoryMessage;
use crate::error::Result;
use crate::platform::ChannelInfo;
use chrono::{DateTime, Local, Utc};
use futures::{Stream, StreamExt};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;
use std::path::{Path, PathBuf};
use tera::{Context, Tera};
use tokio::fs;
use tokio::io::{AsyncWriteExt, BufWriter};
use tracing::{debug, info};

const HEADER: &str = "header.html";
const MESSAGE: &str = "message.html";
const FOOTER: &str = "footer.html";

/// Longest sanitized name component
const MAX_NAME_LEN: usize = 120;

static UNSAFE_FILENAME_CHARS: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[^A-Za-z0-9._-]").expect("valid regex"));

/// Replace every character outside `[A-Za-z0-9._-]` and bound the length
#[must_use]
pub fn sanitize_filename(value: &str) -> String {
    let mut sanitized = UNSAFE_FILENAME_CHARS.replace_all(value, "_").into_owned();
    sanitized.truncate(MAX_NAME_LEN);
    sanitized
}

/// Deterministic transcript file name for a channel exported at `at`
#[must_use]
pub fn transcript_filename(guild_name: &str, channel_name: &str, at: DateTime<Local>) -> String {
    format!(
        "{}_{}_{}.html",
        sanitize_filename(guild_name),
        sanitize_filename(channel_name),
        at.format("%Y%m%d_%H%M%S")
    )
}

/// A written transcript
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TranscriptFile {
    pub path: PathBuf,
    pub message_count: usize,
}

#[derive(Debug, Serialize)]
struct AttachmentRecord {
    url: String,
    filename: String,
    image: bool,
}

#[derive(Debug, Serialize)]
struct MessageRecord {
    author: String,
    avatar_url: String,
    body_html: String,
    timestamp: String,
    attachments: Vec<AttachmentRecord>,
}

impl From<HistoryMessage> for MessageRecord {
    fn from(message: HistoryMessage) -> Self {
        let mut author = message.author.display_name;
        let mut avatar_url = message.author.avatar_url;
        let mut body = Vec::new();
        if !message.text.is_empty() {
            body.push(message.text);
        }

        // Relayed messages carry the original author in the embed
        if let Some(embed) = message.embed {
            if let Some(embed_author) = embed.author {
                author = embed_author.name;
                if let Some(icon) = embed_author.icon_url {
                    avatar_url = icon;
                }
            }
            body.extend(embed.title.filter(|t| !t.is_empty()));
            body.extend(embed.description.filter(|d| !d.is_empty()));
        }

        Self {
            author,
            avatar_url: safe_url(&avatar_url),
            body_html: body_to_html(&body.join("\n")),
            timestamp: format_timestamp(message.timestamp),
            attachments: message
                .attachments
                .into_iter()
                .map(|att| AttachmentRecord {
                    image: att.is_image(),
                    url: safe_url(&att.url),
                    filename: att.filename,
                })
                .collect(),
        }
    }
}

/// Escape a message body and turn line breaks into `<br>`
fn body_to_html(text: &str) -> String {
    tera::escape_html(&text.replace("\r\n", "\n")).replace('\n', "<br>")
}

/// Only web URLs end up in `src`/`href` attributes
fn safe_url(url: &str) -> String {
    let lower = url.trim_start().to_ascii_lowercase();
    if lower.starts_with("https://") || lower.starts_with("http://") {
        url.trim_start().to_string()
    } else {
        "#".to_string()
    }
}

fn format_timestamp(ts: DateTime<Utc>) -> String {
    ts.format("%Y-%m-%d %H:%M:%S").to_string()
}

/// Renders channel histories into self-contained HTML files
#[derive(Debug)]
pub struct TranscriptExporter {
    export_dir: PathBuf,
    tera: Tera,
}

impl TranscriptExporter {
    /// Create an exporter writing into `export_dir`
    pub fn new(export_dir: impl Into<PathBuf>) -> Result<Self> {
        let mut tera = Tera::default();
        tera.add_raw_templates(vec![
            (HEADER, include_str!("templates/header.html")),
            (MESSAGE, include_str!("templates/message.html")),
            (FOOTER, include_str!("templates/footer.html")),
        ])?;
        Ok(Self {
            export_dir: export_dir.into(),
            tera,
        })
    }

    /// Directory transcripts are written to
    #[must_use]
    pub fn export_dir(&self) -> &Path {
        &self.export_dir
    }

    /// Render a channel history, named after the current local time
    pub async fn export<S>(&self, channel: &ChannelInfo, history: S) -> Result<TranscriptFile>
    where
        S: Stream<Item = Result<HistoryMessage>> + Send,
    {
        self.export_at(channel, history, Local::now()).await
    }

    /// Render a channel history with an explicit export time
    pub async fn export_at<S>(
        &self,
        channel: &ChannelInfo,
        history: S,
        at: DateTime<Local>,
    ) -> Result<TranscriptFile>
    where
        S: Stream<Item = Result<HistoryMessage>> + Send,
    {
        fs::create_dir_all(&self.export_dir).await?;
        let path = self
            .unique_path(&transcript_filename(&channel.guild_name, &channel.name, at))
            .await?;
        let mut part_name = path.file_name().map(|n| n.to_os_string()).unwrap_or_default();
        part_name.push(".part");
        let part_path = path.with_file_name(part_name);

        match self.write_transcript(&part_path, channel, history, at).await {
            Ok(message_count) => {
                fs::rename(&part_path, &path).await?;
                info!(
                    channel = %channel.id,
                    path = %path.display(),
                    message_count,
                    "transcript written"
                );
                Ok(TranscriptFile {
                    path,
                    message_count,
                })
            },
            Err(e) => {
                let _ = fs::remove_file(&part_path).await;
                Err(e)
            },
        }
    }

    async fn write_transcript<S>(
        &self,
        path: &Path,
        channel: &ChannelInfo,
        history: S,
        at: DateTime<Local>,
    ) -> Result<usize>
    where
        S: Stream<Item = Result<HistoryMessage>> + Send,
    {
        let mut out = BufWriter::new(fs::File::create(path).await?);

        let mut context = Context::new();
        context.insert("channel_name", &channel.name);
        context.insert("guild_name", &channel.guild_name);
        context.insert("exported_at", &at.format("%Y-%m-%d %H:%M:%S").to_string());
        out.write_all(self.tera.render(HEADER, &context)?.as_bytes())
            .await?;

        let mut history = std::pin::pin!(history);
        let mut message_count = 0usize;
        while let Some(message) = history.next().await {
            let record = MessageRecord::from(message?);
            let html = self
                .tera
                .render(MESSAGE, &Context::from_serialize(&record)?)?;
            out.write_all(html.as_bytes()).await?;
            message_count += 1;
        }

        let mut context = Context::new();
        context.insert("message_count", &message_count);
        out.write_all(self.tera.render(FOOTER, &context)?.as_bytes())
            .await?;
        out.flush().await?;
        debug!(path = %path.display(), message_count, "transcript rendered");
        Ok(message_count)
    }

    /// First free path for `filename`, suffixing `_N` when taken
    async fn unique_path(&self, filename: &str) -> Result<PathBuf> {
        let candidate = self.export_dir.join(filename);
        if !fs::try_exists(&candidate).await? {
            return Ok(candidate);
        }
        let stem = filename.strip_suffix(".html").unwrap_or(filename);
        let mut n = 1;
        loop {
            let candidate = self.export_dir.join(format!("{stem}_{n}.html"));
            if !fs::try_exists(&candidate).await? {
                return Ok(candidate);
            }
            n += 1;
        }
    }
}
