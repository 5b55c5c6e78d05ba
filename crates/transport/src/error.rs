//! Transport error types.

use std::path::PathBuf;

/// Errors produced by the helper process transport.
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    #[error("failed to spawn {}: {source}", path.display())]
    Spawn {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A line that is not valid UTF-8; `line` is its lossy rendering.
    #[error("line is not valid UTF-8: {line}")]
    InvalidUtf8 { line: String },

    #[error("{0} pipe was not captured")]
    MissingPipe(&'static str),

    #[error("termination failed: {0}")]
    Terminate(String),

    #[error("process exit can no longer be observed")]
    Detached,
}
