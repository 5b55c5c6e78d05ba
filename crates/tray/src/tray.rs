//! The tray engine.
//!
//! A [`Tray`] owns the host-side menu model and drives one helper process
//! through its lifecycle:
//!
//! ```text
//! Uninitialized -> Launching -> AwaitingReady -> Ready -> Exiting -> Exited
//!                      \              \                               ^
//!                       +-> Failed     +-> Failed (exit before ready) |
//!                                       +-------- kill() -------------+
//! ```
//!
//! Three background tasks (see `pumps`) move lines between the helper and the
//! engine. Actions sent before the helper has received its initial menu are
//! held and flushed right after it, in call order.

use std::sync::{Arc, OnceLock};

use systray_protocol::{Action, Menu, MenuItem, encode_action};
use systray_transport::{ExitInfo, ProcessControl, ProcessIo};
use tokio::sync::{Mutex, mpsc, oneshot, watch};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, trace};

use crate::config::{Platform, TrayConfig};
use crate::error::TrayError;
use crate::events::{ClickEvent, EventDispatcher, EventKind, TrayEvent};
use crate::pumps::read::ReadPump;
use crate::pumps::stderr::stderr_pump;
use crate::pumps::write::{Outgoing, write_pump};
use crate::redact::redact;
use crate::registry::IdentifierRegistry;
use crate::render::{
    FsIconSource, IconSource, apply_platform_checked, apply_platform_checked_menu,
    resolve_item_icons, resolve_menu_icons,
};
use crate::resolver::ExecutableResolver;

/// Depth of the outgoing action queue.
const OUTGOING_CAPACITY: usize = 256;

/// Lifecycle phase of a [`Tray`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Uninitialized,
    Launching,
    AwaitingReady,
    Ready,
    Exiting,
    Exited,
    Failed,
}

impl Phase {
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Exited | Self::Failed)
    }

    /// Whether update actions are accepted (possibly held until ready).
    pub fn accepts_actions(self) -> bool {
        matches!(self, Self::AwaitingReady | Self::Ready)
    }
}

/// Host-side menu model.
pub(crate) struct Model {
    pub(crate) menu: Menu,
    pub(crate) registry: IdentifierRegistry,
}

/// State shared between the [`Tray`] handle and its pumps.
pub(crate) struct Shared {
    pub(crate) platform: Platform,
    debug: bool,
    pub(crate) model: Mutex<Model>,
    phase: watch::Sender<Phase>,
    events: EventDispatcher,
    icons: Arc<dyn IconSource>,
}

impl Shared {
    pub(crate) fn new(config: TrayConfig, icons: Arc<dyn IconSource>) -> Self {
        let (phase, _) = watch::channel(Phase::Uninitialized);
        Self {
            platform: config.platform,
            debug: config.debug,
            model: Mutex::new(Model {
                menu: config.menu,
                registry: IdentifierRegistry::new(),
            }),
            phase,
            events: EventDispatcher::new(),
            icons,
        }
    }

    pub(crate) fn phase(&self) -> Phase {
        *self.phase.borrow()
    }

    pub(crate) fn set_phase(&self, to: Phase) {
        let from = self.phase.send_replace(to);
        if from != to {
            debug!(?from, ?to, "tray phase changed");
        }
    }

    /// Moves to `to` only when the current phase is one of `from`.
    pub(crate) fn transition(&self, from: &[Phase], to: Phase) -> bool {
        let mut previous = None;
        let changed = self.phase.send_if_modified(|phase| {
            if from.contains(phase) {
                previous = Some(*phase);
                *phase = to;
                true
            } else {
                false
            }
        });
        if let Some(from) = previous {
            debug!(?from, ?to, "tray phase changed");
        }
        changed
    }

    pub(crate) fn events(&self) -> &EventDispatcher {
        &self.events
    }

    pub(crate) fn emit(&self, event: TrayEvent) {
        self.events.emit(event);
    }

    pub(crate) fn emit_error(&self, err: TrayError) {
        self.events.emit(TrayEvent::Error(Arc::new(err)));
    }

    /// Logs one line of wire traffic with icons and long payloads shortened.
    pub(crate) fn log_wire(&self, direction: &'static str, line: &str) {
        if self.debug {
            debug!(direction, line = %redact(line), "tray wire");
        } else {
            trace!(direction, line = %redact(line), "tray wire");
        }
    }

    /// Outgoing form of `menu`: icons encoded, platform conventions applied.
    pub(crate) async fn render_menu(&self, mut menu: Menu) -> Menu {
        resolve_menu_icons(&mut menu, self.icons.as_ref()).await;
        apply_platform_checked_menu(&mut menu, self.platform);
        menu
    }

    pub(crate) async fn render_item(&self, mut item: MenuItem) -> MenuItem {
        resolve_item_icons(&mut item, self.icons.as_ref()).await;
        apply_platform_checked(&mut item, self.platform);
        item
    }

    async fn render_action(&self, action: Action) -> Action {
        match action {
            Action::UpdateItem { item, seq_id } => Action::UpdateItem {
                item: self.render_item(item).await,
                seq_id,
            },
            Action::UpdateMenu { menu } => Action::UpdateMenu {
                menu: self.render_menu(menu).await,
            },
            Action::UpdateMenuAndItem {
                menu,
                item,
                seq_id,
            } => Action::UpdateMenuAndItem {
                menu: self.render_menu(menu).await,
                item: self.render_item(item).await,
                seq_id,
            },
            Action::Exit => Action::Exit,
        }
    }
}

/// Connection to a launched helper.
struct Link {
    outgoing: mpsc::Sender<Outgoing>,
    control: ProcessControl,
    cancel: CancellationToken,
}

/// Handle on a tray icon backed by a native helper process.
///
/// Dropping the handle asks a still-running helper to terminate and stops
/// the background tasks.
pub struct Tray {
    shared: Arc<Shared>,
    link: OnceLock<Link>,
}

impl Tray {
    pub fn new(config: TrayConfig) -> Self {
        Self::with_icon_source(config, Arc::new(FsIconSource))
    }

    /// Like [`Tray::new`], reading icon files through `icons`.
    pub fn with_icon_source(config: TrayConfig, icons: Arc<dyn IconSource>) -> Self {
        Self {
            shared: Arc::new(Shared::new(config, icons)),
            link: OnceLock::new(),
        }
    }

    /// Creates a tray and launches it in one step.
    pub async fn spawn<R>(config: TrayConfig, resolver: &R) -> Result<Self, TrayError>
    where
        R: ExecutableResolver + ?Sized,
    {
        let tray = Self::new(config);
        tray.launch(resolver).await?;
        Ok(tray)
    }

    /// Starts the helper found by `resolver`.
    ///
    /// Identifiers are assigned to the menu before the process starts, and
    /// the outgoing form of the initial menu is prepared while the helper
    /// boots. A failure to start leaves the tray in [`Phase::Failed`] and is
    /// also dispatched as an `error` event.
    pub async fn launch<R>(&self, resolver: &R) -> Result<(), TrayError>
    where
        R: ExecutableResolver + ?Sized,
    {
        let prepare = self.begin().await?;
        let io = resolver.resolve_executable().and_then(|path| {
            info!(path = %path.display(), "launching tray process");
            systray_transport::spawn(&path).map_err(TrayError::Spawn)
        });
        match io {
            Ok(io) => {
                self.attach(io, prepare);
                Ok(())
            }
            Err(err) => {
                prepare.abort();
                Err(self.fail(err))
            }
        }
    }

    /// Launches over an already established transport instead of spawning.
    pub async fn launch_with(&self, io: ProcessIo) -> Result<(), TrayError> {
        let prepare = self.begin().await?;
        self.attach(io, prepare);
        Ok(())
    }

    async fn begin(&self) -> Result<JoinHandle<Menu>, TrayError> {
        if !self
            .shared
            .transition(&[Phase::Uninitialized], Phase::Launching)
        {
            return Err(TrayError::AlreadyLaunched);
        }

        let menu = {
            let mut model = self.shared.model.lock().await;
            let Model { menu, registry } = &mut *model;
            let count = registry.register(&mut menu.items);
            debug!(items = count, "menu identifiers assigned");
            menu.clone()
        };

        let shared = Arc::clone(&self.shared);
        Ok(tokio::spawn(async move { shared.render_menu(menu).await }))
    }

    fn attach(&self, io: ProcessIo, prepare: JoinHandle<Menu>) {
        let ProcessIo {
            stdin,
            stdout,
            stderr,
            control,
        } = io;

        let (outgoing_tx, outgoing_rx) = mpsc::channel(OUTGOING_CAPACITY);
        let (initial_tx, initial_rx) = oneshot::channel();
        let cancel = CancellationToken::new();
        let writer_stop = cancel.child_token();

        let link = Link {
            outgoing: outgoing_tx,
            control: control.clone(),
            cancel: cancel.clone(),
        };
        if self.link.set(link).is_err() {
            error!("tray link attached twice");
            return;
        }
        self.shared.set_phase(Phase::AwaitingReady);

        tokio::spawn(write_pump(
            stdin,
            initial_rx,
            outgoing_rx,
            Arc::clone(&self.shared),
            writer_stop.clone(),
        ));

        let reader = ReadPump {
            shared: Arc::clone(&self.shared),
            control,
            prepare: Some(prepare),
            initial: Some(initial_tx),
            writer_stop,
            cancel: cancel.clone(),
        };
        tokio::spawn(reader.run(stdout));

        tokio::spawn(stderr_pump(stderr, Arc::clone(&self.shared), cancel));
    }

    fn fail(&self, err: TrayError) -> TrayError {
        error!("{err}");
        self.shared.set_phase(Phase::Failed);
        let err = Arc::new(err);
        self.shared.emit(TrayEvent::Error(Arc::clone(&err)));
        TrayError::Failed(err)
    }

    /// Sends `action` to the helper.
    ///
    /// The stored model is updated first, so clicks resolve against what the
    /// host last sent. The helper receives a rendered copy. `Exit` is the
    /// same as [`Tray::kill`].
    pub async fn send_action(&self, action: Action) -> Result<(), TrayError> {
        if matches!(action, Action::Exit) {
            return self.kill().await;
        }

        let phase = self.shared.phase();
        let link = match self.link.get() {
            Some(link) if phase.accepts_actions() => link,
            _ => return Err(TrayError::NotRunning(phase)),
        };

        self.store(&action).await;
        let kind = action.kind();
        let rendered = self.shared.render_action(action).await;
        let line = encode_action(&rendered)?;
        trace!(kind, "queueing tray action");

        link.outgoing
            .send(Outgoing { line, gated: true })
            .await
            .map_err(|_| TrayError::Closed)
    }

    pub async fn update_item(&self, item: MenuItem, seq_id: Option<i64>) -> Result<(), TrayError> {
        self.send_action(Action::UpdateItem { item, seq_id }).await
    }

    pub async fn update_menu(&self, menu: Menu) -> Result<(), TrayError> {
        self.send_action(Action::UpdateMenu { menu }).await
    }

    pub async fn update_menu_and_item(
        &self,
        menu: Menu,
        item: MenuItem,
        seq_id: Option<i64>,
    ) -> Result<(), TrayError> {
        self.send_action(Action::UpdateMenuAndItem {
            menu,
            item,
            seq_id,
        })
        .await
    }

    async fn store(&self, action: &Action) {
        let mut model = self.shared.model.lock().await;
        match action {
            Action::UpdateItem { item, .. } => store_item(&mut model.menu, item),
            Action::UpdateMenu { menu } => model.menu = menu.clone(),
            Action::UpdateMenuAndItem { menu, item, .. } => {
                model.menu = menu.clone();
                store_item(&mut model.menu, item);
            }
            Action::Exit => {}
        }
    }

    /// Stops the helper: sends `exit` and requests graceful termination.
    ///
    /// Returns once the request is issued; use [`Tray::wait_exit`] to wait
    /// for the process. Calling it again, or on a tray that never launched,
    /// does nothing.
    pub async fn kill(&self) -> Result<(), TrayError> {
        let Some(link) = self.link.get() else {
            return Ok(());
        };
        if !self
            .shared
            .transition(&[Phase::AwaitingReady, Phase::Ready], Phase::Exiting)
        {
            return Ok(());
        }

        info!("stopping tray process");
        let line = encode_action(&Action::Exit)?;
        if link
            .outgoing
            .send(Outgoing { line, gated: false })
            .await
            .is_err()
        {
            debug!("tray writer already stopped");
        }
        link.control.request_terminate();
        Ok(())
    }

    /// Waits until the helper has reported `ready` and received its menu.
    ///
    /// Fails with [`TrayError::NotRunning`] if the tray stops first.
    pub async fn ready(&self) -> Result<(), TrayError> {
        let mut phase = self.shared.phase.subscribe();
        let reached = *phase
            .wait_for(|p| matches!(p, Phase::Ready | Phase::Exiting) || p.is_terminal())
            .await
            .map_err(|_| TrayError::Closed)?;
        match reached {
            Phase::Ready => Ok(()),
            other => Err(TrayError::NotRunning(other)),
        }
    }

    /// Waits for the helper to exit and returns how it ended.
    pub async fn wait_exit(&self) -> Result<ExitInfo, TrayError> {
        let mut phase = self.shared.phase.subscribe();
        phase
            .wait_for(|p| p.is_terminal())
            .await
            .map_err(|_| TrayError::Closed)?;
        Ok(self
            .link
            .get()
            .and_then(|link| link.control.exit_info())
            .unwrap_or_default())
    }

    pub fn phase(&self) -> Phase {
        self.shared.phase()
    }

    pub fn platform(&self) -> Platform {
        self.shared.platform
    }

    /// Snapshot of the stored menu.
    pub async fn menu(&self) -> Menu {
        self.shared.model.lock().await.menu.clone()
    }

    /// Stored item registered under `id`.
    pub async fn item(&self, id: u32) -> Option<MenuItem> {
        let model = self.shared.model.lock().await;
        model.registry.resolve(&model.menu, id).ok().cloned()
    }

    pub fn events(&self) -> &EventDispatcher {
        &self.shared.events
    }

    pub fn subscribe<F>(&self, kind: EventKind, listener: F)
    where
        F: Fn(&TrayEvent) + Send + Sync + 'static,
    {
        self.shared.events.subscribe(kind, listener);
    }

    pub fn on_ready<F>(&self, listener: F)
    where
        F: Fn() + Send + Sync + 'static,
    {
        self.shared.events.on_ready(listener);
    }

    pub fn on_click<F>(&self, listener: F)
    where
        F: Fn(&ClickEvent) + Send + Sync + 'static,
    {
        self.shared.events.on_click(listener);
    }

    pub fn on_data<F>(&self, listener: F)
    where
        F: Fn(&str) + Send + Sync + 'static,
    {
        self.shared.events.on_data(listener);
    }

    pub fn on_error<F>(&self, listener: F)
    where
        F: Fn(&TrayError) + Send + Sync + 'static,
    {
        self.shared.events.on_error(listener);
    }

    pub fn on_exit<F>(&self, listener: F)
    where
        F: Fn(ExitInfo) + Send + Sync + 'static,
    {
        self.shared.events.on_exit(listener);
    }
}

impl Drop for Tray {
    fn drop(&mut self) {
        if let Some(link) = self.link.get() {
            if !self.shared.phase().is_terminal() {
                link.control.request_terminate();
            }
            link.cancel.cancel();
        }
    }
}

fn store_item(menu: &mut Menu, item: &MenuItem) {
    let Some(id) = item.identifier() else {
        debug!(title = %item.title, "item update without identifier, model unchanged");
        return;
    };
    match menu.find_mut(id) {
        Some(slot) => *slot = item.clone(),
        None => debug!(id, "item update for unknown identifier, model unchanged"),
    }
}
