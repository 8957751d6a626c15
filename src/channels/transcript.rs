//! Line-oriented transcript feed (stdin or a file).
//!
//! ```text
//! # comment
//! JOIN #dev yuri
//! MSG #dev xena yuri++ thanks
//! NICK yuri yuri_afk
//! QUERY yuri
//! RELOAD
//! SAVE
//! ```

use anyhow::{Context, Result};
use async_trait::async_trait;
use tokio::io::{AsyncBufRead, AsyncBufReadExt};
use tokio::sync::{mpsc, Mutex};
use tracing::{debug, info, warn};

use super::{Channel, ChatEvent};

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum EventLineError {
    #[error("unknown event kind `{0}`")]
    UnknownKind(String),
    #[error("{kind} is missing its {field}")]
    MissingField {
        kind: &'static str,
        field: &'static str,
    },
    #[error("{kind} takes no arguments")]
    UnexpectedArgs { kind: &'static str },
}

/// Parse one transcript line. Blank lines and `#` comments yield `Ok(None)`.
pub fn parse_event_line(line: &str) -> Result<Option<ChatEvent>, EventLineError> {
    let line = line.trim_end_matches(['\r', '\n']);
    let trimmed = line.trim_start();
    if trimmed.is_empty() || trimmed.starts_with('#') {
        return Ok(None);
    }

    let (kind, rest) = split_word(trimmed);
    let event = match kind.to_ascii_uppercase().as_str() {
        "MSG" => {
            let (channel, rest) = required(rest, "MSG", "channel")?;
            let (sender, text) = required(rest, "MSG", "sender")?;
            ChatEvent::Message {
                channel: channel.to_string(),
                sender: sender.to_string(),
                text: text.to_string(),
            }
        }
        "JOIN" => {
            let (channel, rest) = required(rest, "JOIN", "channel")?;
            let (name, _) = required(rest, "JOIN", "name")?;
            ChatEvent::Join {
                channel: channel.to_string(),
                name: name.to_string(),
            }
        }
        "NICK" => {
            let (prev, rest) = required(rest, "NICK", "old name")?;
            let (cur, _) = required(rest, "NICK", "new name")?;
            ChatEvent::Nick {
                prev: prev.to_string(),
                cur: cur.to_string(),
            }
        }
        "QUERY" => {
            let (name, _) = required(rest, "QUERY", "name")?;
            ChatEvent::Query {
                name: name.to_string(),
            }
        }
        "RELOAD" => no_args(rest, "RELOAD", ChatEvent::Reload)?,
        "SAVE" => no_args(rest, "SAVE", ChatEvent::Save)?,
        _ => return Err(EventLineError::UnknownKind(kind.to_string())),
    };
    Ok(Some(event))
}

/// First space-delimited word and the remainder after a single separator.
fn split_word(text: &str) -> (&str, &str) {
    match text.split_once(' ') {
        Some((word, rest)) => (word, rest),
        None => (text, ""),
    }
}

fn required<'a>(
    text: &'a str,
    kind: &'static str,
    field: &'static str,
) -> Result<(&'a str, &'a str), EventLineError> {
    let (word, rest) = split_word(text.trim_start_matches(' '));
    if word.is_empty() {
        return Err(EventLineError::MissingField { kind, field });
    }
    Ok((word, rest))
}

fn no_args(
    rest: &str,
    kind: &'static str,
    event: ChatEvent,
) -> Result<ChatEvent, EventLineError> {
    if rest.trim().is_empty() {
        Ok(event)
    } else {
        Err(EventLineError::UnexpectedArgs { kind })
    }
}

/// Reads transcript lines from any async buffered reader.
pub struct TranscriptChannel<R> {
    label: String,
    reader: Mutex<Option<R>>,
}

impl<R> TranscriptChannel<R> {
    pub fn new(label: impl Into<String>, reader: R) -> Self {
        Self {
            label: label.into(),
            reader: Mutex::new(Some(reader)),
        }
    }
}

#[async_trait]
impl<R> Channel for TranscriptChannel<R>
where
    R: AsyncBufRead + Unpin + Send + 'static,
{
    fn name(&self) -> &str {
        &self.label
    }

    async fn listen(&self, tx: mpsc::Sender<ChatEvent>) -> Result<()> {
        let Some(reader) = self.reader.lock().await.take() else {
            anyhow::bail!("transcript {} was already consumed", self.label);
        };

        info!("Reading events from {}", self.label);
        let mut lines = reader.lines();
        let mut line_no = 0usize;
        while let Some(line) = lines
            .next_line()
            .await
            .with_context(|| format!("Failed to read from {}", self.label))?
        {
            line_no += 1;
            match parse_event_line(&line) {
                Ok(Some(event)) => {
                    if tx.send(event).await.is_err() {
                        debug!("Dispatcher gone, stopping {}", self.label);
                        return Ok(());
                    }
                }
                Ok(None) => {}
                Err(e) => warn!("{}:{}: skipping line: {}", self.label, line_no, e),
            }
        }

        info!("End of input on {} after {} line(s)", self.label, line_no);
        Ok(())
    }
}
