//! Read pump: decodes the helper's output and dispatches events.

use std::sync::Arc;

use systray_protocol::{ClickedEvent, DecodeError, Event, Menu, decode_line, encode_menu};
use systray_transport::{ExitInfo, LineStream, ProcessControl, TransportError};
use tokio::io::AsyncRead;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, trace, warn};

use crate::error::TrayError;
use crate::events::{ClickEvent, TrayEvent};
use crate::render::normalize_click_patch;
use crate::tray::{Phase, Shared};

/// Helper output literal announcing a failure.
const ERROR_MARKER: &str = "error";
/// Helper output literal announcing its own exit.
const EXIT_MARKER: &str = "exit";

pub(crate) struct ReadPump {
    pub(crate) shared: Arc<Shared>,
    pub(crate) control: ProcessControl,
    /// Rendering of the initial menu, started at launch.
    pub(crate) prepare: Option<JoinHandle<Menu>>,
    /// Hands the initial menu line to the write pump.
    pub(crate) initial: Option<oneshot::Sender<String>>,
    pub(crate) writer_stop: CancellationToken,
    pub(crate) cancel: CancellationToken,
}

impl ReadPump {
    /// Reads lines until the helper closes its output, then waits for the
    /// process and publishes the exit.
    pub(crate) async fn run<R>(mut self, mut stdout: LineStream<R>)
    where
        R: AsyncRead + Unpin,
    {
        loop {
            tokio::select! {
                _ = self.cancel.cancelled() => return,
                line = stdout.next_line() => {
                    match line {
                        Ok(Some(line)) => self.handle_line(line).await,
                        Ok(None) => {
                            debug!("tray output closed");
                            break;
                        }
                        Err(TransportError::InvalidUtf8 { line }) => {
                            warn!(line, "tray output line is not valid UTF-8");
                            let err = TransportError::InvalidUtf8 { line };
                            self.shared.emit_error(TrayError::Transport(err));
                        }
                        Err(e) => {
                            warn!("failed to read tray output: {e}");
                            self.shared.emit_error(TrayError::Transport(e));
                            break;
                        }
                    }
                }
            }
        }
        self.finish().await;
    }

    async fn handle_line(&mut self, line: String) {
        if line.trim().is_empty() {
            return;
        }
        self.shared.log_wire("recv", &line);

        match decode_line(&line) {
            Ok(Event::Ready) => self.on_ready().await,
            Ok(Event::Clicked(clicked)) => self.on_clicked(clicked).await,
            Err(DecodeError::NotJson { line }) => self.on_text(line),
            Err(err) => {
                warn!("{err}");
                self.shared.emit_error(TrayError::Decode(err));
            }
        }
    }

    async fn on_ready(&mut self) {
        if let (Some(prepare), Some(initial)) = (self.prepare.take(), self.initial.take()) {
            let menu = match prepare.await {
                Ok(menu) => menu,
                Err(e) => {
                    warn!("initial menu rendering failed: {e}");
                    let model = self.shared.model.lock().await;
                    model.menu.clone()
                }
            };

            // kill() may have run while the menu was rendering.
            if self.shared.phase() == Phase::AwaitingReady {
                match encode_menu(&menu) {
                    Ok(line) => {
                        if initial.send(line).is_err() {
                            debug!("tray writer gone before initial menu");
                        }
                    }
                    Err(e) => self.shared.emit_error(TrayError::Json(e)),
                }
                if self
                    .shared
                    .transition(&[Phase::AwaitingReady], Phase::Ready)
                {
                    info!("tray ready");
                }
            }
        } else {
            debug!("repeated ready from tray process");
        }
        self.shared.emit(TrayEvent::Ready);
    }

    async fn on_clicked(&self, clicked: ClickedEvent) {
        let ClickedEvent {
            item: mut patch,
            seq_id,
            identifier,
        } = clicked;

        let Some(id) = identifier.or(patch.identifier) else {
            debug!("click without identifier, dropped");
            return;
        };
        normalize_click_patch(&mut patch, self.shared.platform);

        let item = {
            let model = self.shared.model.lock().await;
            match model.registry.resolve(&model.menu, id) {
                Ok(stored) => patch.apply_to(stored),
                Err(e) => {
                    debug!("{e}, click dropped");
                    return;
                }
            }
        };

        trace!(id, seq_id, title = %item.title, "tray item clicked");
        self.shared.emit(TrayEvent::Click(ClickEvent {
            item,
            seq_id,
            identifier: id,
        }));
    }

    fn on_text(&self, line: String) {
        match line.trim() {
            EXIT_MARKER => debug!("tray process announced exit"),
            ERROR_MARKER => {
                warn!("tray process reported an error");
                self.shared.emit_error(TrayError::Reported);
            }
            _ => self.shared.emit(TrayEvent::Data(line)),
        }
    }

    async fn finish(self) {
        let info = tokio::select! {
            _ = self.cancel.cancelled() => return,
            status = self.control.wait() => match status {
                Ok(info) => info,
                Err(e) => {
                    warn!("tray exit status unavailable: {e}");
                    ExitInfo::default()
                }
            },
        };

        if self
            .shared
            .transition(&[Phase::Launching, Phase::AwaitingReady], Phase::Failed)
        {
            warn!(status = %info, "tray process exited before becoming ready");
            self.shared.emit_error(TrayError::PrematureExit(info));
        } else {
            self.shared
                .transition(&[Phase::Ready, Phase::Exiting], Phase::Exited);
        }

        self.shared.model.lock().await.registry.clear();
        self.writer_stop.cancel();
        info!(status = %info, "tray process stopped");
        self.shared.emit(TrayEvent::Exit(info));
    }
}
