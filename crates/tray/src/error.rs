//! Engine error types.

use std::path::PathBuf;
use std::sync::Arc;

use systray_protocol::DecodeError;
use systray_transport::{ExitInfo, TransportError};

use crate::tray::Phase;

/// Errors surfaced by the tray engine, either returned from a call or
/// dispatched as an `error` event.
#[derive(Debug, thiserror::Error)]
pub enum TrayError {
    /// The helper could not be started. Fatal.
    #[error("tray process failed to start: {0}")]
    Spawn(#[source] TransportError),

    /// Reading from the helper failed, or produced a line that is not text.
    #[error("tray transport error: {0}")]
    Transport(#[from] TransportError),

    /// A click referenced an identifier the registry does not know.
    #[error("unknown menu item identifier {0}")]
    UnknownIdentifier(u32),

    /// A line on the output stream was JSON but not a known event.
    #[error("failed to decode tray line: {0}")]
    Decode(#[from] DecodeError),

    #[error("failed to load icon {}: {source}", path.display())]
    IconLoad {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The helper exited before it ever reported `ready`.
    #[error("tray process exited before becoming ready ({0})")]
    PrematureExit(ExitInfo),

    /// A line the helper wrote to its error stream.
    #[error("tray process stderr: {0}")]
    Stderr(String),

    /// The helper printed the literal `error` marker.
    #[error("tray process reported an error")]
    Reported,

    #[error("tray is not running (phase: {0:?})")]
    NotRunning(Phase),

    #[error("tray was already launched")]
    AlreadyLaunched,

    #[error("tray executable unavailable: {0}")]
    Executable(String),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("tray engine stopped")]
    Closed,

    /// Launch failed; the same error was dispatched as an `error` event.
    #[error("tray failed: {0}")]
    Failed(Arc<TrayError>),
}
