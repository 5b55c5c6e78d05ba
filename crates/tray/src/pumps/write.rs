//! Write pump: serialises every line sent to the helper.

use std::sync::Arc;

use systray_transport::LineSink;
use tokio::io::AsyncWrite;
use tokio::sync::{mpsc, oneshot};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error};

use crate::tray::Shared;

/// A line queued for the helper.
#[derive(Debug)]
pub(crate) struct Outgoing {
    pub(crate) line: String,
    /// Held until the initial menu has been written.
    pub(crate) gated: bool,
}

/// Writes the initial menu, then queued lines in order.
///
/// Gated lines that arrive before the initial menu are held and flushed
/// right after it. Ungated lines go out immediately. The helper's input is
/// closed when the pump ends.
pub(crate) async fn write_pump<W>(
    mut stdin: LineSink<W>,
    mut initial: oneshot::Receiver<String>,
    mut outgoing: mpsc::Receiver<Outgoing>,
    shared: Arc<Shared>,
    stop: CancellationToken,
) where
    W: AsyncWrite + Unpin,
{
    let mut released = false;
    let mut held: Vec<String> = Vec::new();

    loop {
        tokio::select! {
            biased;
            _ = stop.cancelled() => break,

            menu = &mut initial, if !released => {
                released = true;
                let Ok(menu) = menu else {
                    debug!(held = held.len(), "initial menu withdrawn, dropping held actions");
                    held.clear();
                    continue;
                };
                if !write(&mut stdin, &shared, &menu).await {
                    break;
                }
                let mut failed = false;
                for line in held.drain(..) {
                    if !write(&mut stdin, &shared, &line).await {
                        failed = true;
                        break;
                    }
                }
                if failed {
                    break;
                }
            }

            msg = outgoing.recv() => {
                match msg {
                    Some(Outgoing { line, gated }) if gated && !released => held.push(line),
                    Some(Outgoing { line, .. }) => {
                        if !write(&mut stdin, &shared, &line).await {
                            break;
                        }
                    }
                    None => break,
                }
            }
        }
    }
    debug!("tray writer stopped");
}

async fn write<W>(stdin: &mut LineSink<W>, shared: &Shared, line: &str) -> bool
where
    W: AsyncWrite + Unpin,
{
    shared.log_wire("send", line);
    match stdin.write_line(line).await {
        Ok(()) => true,
        Err(e) => {
            error!("failed to write to tray process: {e}");
            false
        }
    }
}
