//! Stderr pump: surfaces the helper's diagnostics.

use std::sync::Arc;

use systray_transport::{LineStream, TransportError};
use tokio::io::AsyncRead;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use crate::error::TrayError;
use crate::tray::Shared;

/// Logs each non-empty stderr line and dispatches it as an `error` event.
pub(crate) async fn stderr_pump<R>(
    mut stderr: LineStream<R>,
    shared: Arc<Shared>,
    cancel: CancellationToken,
) where
    R: AsyncRead + Unpin,
{
    loop {
        tokio::select! {
            _ = cancel.cancelled() => break,
            line = stderr.next_line() => {
                let line = match line {
                    // Diagnostics are free text; a lossy rendering is still useful.
                    Ok(Some(line)) | Err(TransportError::InvalidUtf8 { line }) => line,
                    Ok(None) => break,
                    Err(e) => {
                        debug!("failed to read tray stderr: {e}");
                        break;
                    }
                };
                let line = line.trim();
                if line.is_empty() {
                    continue;
                }
                warn!(line, "tray process stderr");
                shared.emit_error(TrayError::Stderr(line.to_string()));
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    use systray_protocol::Menu;
    use tokio::io::AsyncWriteExt;

    use crate::config::TrayConfig;
    use crate::render::FsIconSource;

    #[tokio::test]
    async fn each_line_becomes_an_error_event() {
        let shared = Arc::new(Shared::new(
            TrayConfig::new(Menu::default()),
            Arc::new(FsIconSource),
        ));
        let seen = Arc::new(Mutex::new(Vec::new()));
        let s = Arc::clone(&seen);
        shared.events().on_error(move |err| s.lock().unwrap().push(err.to_string()));

        let (mut helper, ours) = tokio::io::duplex(1024);
        helper.write_all(b"first\n\n  \n\xffbad\nsecond\n").await.unwrap();
        drop(helper);

        stderr_pump(LineStream::new(ours), shared, CancellationToken::new()).await;

        assert_eq!(
            *seen.lock().unwrap(),
            vec![
                "tray process stderr: first".to_string(),
                "tray process stderr: \u{fffd}bad".to_string(),
                "tray process stderr: second".to_string(),
            ]
        );
    }
}
