//! Error types for the karma module boundary.

use std::path::PathBuf;

/// Failures surfaced to the host. Policy rejections and malformed data-file
/// lines are not errors; they are logged and otherwise ignored.
#[derive(Debug, thiserror::Error)]
pub enum KarmaError {
    #[error("failed to write karma data: {0}")]
    Write(#[source] std::io::Error),

    #[error("failed to persist karma data to {path:?}: {source}")]
    Persist {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

pub type Result<T> = std::result::Result<T, KarmaError>;
