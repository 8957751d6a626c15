//! The `run` event loop: one listener task, one dispatcher.

use std::sync::Arc;

use anyhow::{Context, Result};
use tokio::io::{AsyncWrite, AsyncWriteExt};
use tokio::signal;
use tokio::sync::mpsc;
use tracing::{error, info};

use crate::channels::{Channel, ChatEvent};
use crate::config::Config;
use crate::host::Dispatcher;

const EVENT_QUEUE_DEPTH: usize = 64;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunSummary {
    pub events: usize,
    pub saves: usize,
}

/// Drain `channel` into the karma module until end of input or Ctrl-C,
/// writing operator-visible lines to `out`.
pub async fn run<C, W>(config: &Config, channel: C, out: &mut W) -> Result<RunSummary>
where
    C: Channel + 'static,
    W: AsyncWrite + Unpin,
{
    let mut dispatcher = Dispatcher::new(config);
    let channel = Arc::new(channel);
    let (tx, mut rx) = mpsc::channel::<ChatEvent>(EVENT_QUEUE_DEPTH);

    let listener = {
        let channel = Arc::clone(&channel);
        tokio::spawn(async move {
            if let Err(e) = channel.listen(tx).await {
                error!("Channel {} failed: {e:#}", channel.name());
            }
        })
    };

    let mut events = 0usize;
    loop {
        tokio::select! {
            event = rx.recv() => {
                let Some(event) = event else { break };
                events += 1;
                for line in dispatcher.dispatch(event) {
                    out.write_all(line.as_bytes()).await.context("Failed to write output")?;
                    out.write_all(b"\n").await.context("Failed to write output")?;
                }
                out.flush().await.context("Failed to flush output")?;
            }
            _ = signal::ctrl_c() => {
                info!("Received Ctrl+C, shutting down");
                listener.abort();
                break;
            }
        }
    }

    dispatcher.shutdown();
    let summary = RunSummary {
        events,
        saves: dispatcher.saves(),
    };
    info!(
        "Processed {} event(s), saved {} time(s)",
        summary.events, summary.saves
    );
    Ok(summary)
}
