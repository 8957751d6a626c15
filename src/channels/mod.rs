//! Chat event sources.
//!
//! A channel turns some outside feed into [`ChatEvent`]s and pushes them into
//! an mpsc queue drained by the single dispatcher that owns the karma module.

pub mod transcript;

use anyhow::Result;
use async_trait::async_trait;
use tokio::sync::mpsc;

pub use transcript::{parse_event_line, EventLineError, TranscriptChannel};

/// One event from the chat network, as the karma module consumes it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChatEvent {
    /// A line of text said in a channel.
    Message {
        channel: String,
        sender: String,
        text: String,
    },
    Join {
        channel: String,
        name: String,
    },
    Nick {
        prev: String,
        cur: String,
    },
    /// Another module asks for someone's net karma.
    Query { name: String },
    /// The data file changed on disk.
    Reload,
    /// Write the data file now.
    Save,
}

#[async_trait]
pub trait Channel: Send + Sync {
    fn name(&self) -> &str;

    /// Feed events into `tx` until the source is exhausted or the receiver
    /// goes away.
    async fn listen(&self, tx: mpsc::Sender<ChatEvent>) -> Result<()>;
}
