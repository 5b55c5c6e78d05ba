//! Typed lifecycle events and their publish/subscribe dispatcher.

use std::sync::{Arc, Mutex, PoisonError};

use systray_protocol::MenuItem;
use systray_transport::ExitInfo;
use tracing::trace;

use crate::error::TrayError;

/// The fixed set of event channels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
    Ready,
    Click,
    Data,
    Error,
    Exit,
}

/// A click, correlated back to the host's item.
#[derive(Debug, Clone)]
pub struct ClickEvent {
    /// Copy of the stored item with the wire payload merged over it.
    pub item: MenuItem,
    pub seq_id: i64,
    pub identifier: u32,
}

#[derive(Debug, Clone)]
pub enum TrayEvent {
    /// The helper reported `ready`.
    Ready,
    Click(ClickEvent),
    /// Free text printed by the helper on its output stream.
    Data(String),
    Error(Arc<TrayError>),
    /// The helper process ended.
    Exit(ExitInfo),
}

impl TrayEvent {
    pub fn kind(&self) -> EventKind {
        match self {
            Self::Ready => EventKind::Ready,
            Self::Click(_) => EventKind::Click,
            Self::Data(_) => EventKind::Data,
            Self::Error(_) => EventKind::Error,
            Self::Exit(_) => EventKind::Exit,
        }
    }
}

type Listener = Arc<dyn Fn(&TrayEvent) + Send + Sync>;

/// Per-engine event fan-out.
///
/// Listeners run synchronously on the task that emits the event, in
/// registration order. They may subscribe further listeners; those see the
/// next event, not the current one.
#[derive(Clone, Default)]
pub struct EventDispatcher {
    listeners: Arc<Mutex<Vec<(EventKind, Listener)>>>,
}

impl EventDispatcher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `listener` for every event of `kind`.
    pub fn subscribe<F>(&self, kind: EventKind, listener: F)
    where
        F: Fn(&TrayEvent) + Send + Sync + 'static,
    {
        self.listeners
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push((kind, Arc::new(listener)));
    }

    pub fn on_ready<F>(&self, listener: F)
    where
        F: Fn() + Send + Sync + 'static,
    {
        self.subscribe(EventKind::Ready, move |_| listener());
    }

    pub fn on_click<F>(&self, listener: F)
    where
        F: Fn(&ClickEvent) + Send + Sync + 'static,
    {
        self.subscribe(EventKind::Click, move |event| {
            if let TrayEvent::Click(click) = event {
                listener(click);
            }
        });
    }

    pub fn on_data<F>(&self, listener: F)
    where
        F: Fn(&str) + Send + Sync + 'static,
    {
        self.subscribe(EventKind::Data, move |event| {
            if let TrayEvent::Data(line) = event {
                listener(line);
            }
        });
    }

    pub fn on_error<F>(&self, listener: F)
    where
        F: Fn(&TrayError) + Send + Sync + 'static,
    {
        self.subscribe(EventKind::Error, move |event| {
            if let TrayEvent::Error(err) = event {
                listener(err);
            }
        });
    }

    pub fn on_exit<F>(&self, listener: F)
    where
        F: Fn(ExitInfo) + Send + Sync + 'static,
    {
        self.subscribe(EventKind::Exit, move |event| {
            if let TrayEvent::Exit(info) = event {
                listener(*info);
            }
        });
    }

    /// Delivers `event` to every listener of its kind.
    pub fn emit(&self, event: TrayEvent) {
        let kind = event.kind();
        let matching: Vec<Listener> = self
            .listeners
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .filter(|(k, _)| *k == kind)
            .map(|(_, listener)| Arc::clone(listener))
            .collect();

        trace!(?kind, listeners = matching.len(), "dispatching event");
        for listener in matching {
            listener(&event);
        }
    }

    #[cfg(test)]
    fn listener_count(&self, kind: EventKind) -> usize {
        self.listeners
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .filter(|(k, _)| *k == kind)
            .count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn recorder() -> (Arc<Mutex<Vec<String>>>, EventDispatcher) {
        (Arc::new(Mutex::new(Vec::new())), EventDispatcher::new())
    }

    #[test]
    fn routes_by_kind() {
        let (seen, events) = recorder();
        let s = Arc::clone(&seen);
        events.on_data(move |line| s.lock().unwrap().push(format!("data:{line}")));
        let s = Arc::clone(&seen);
        events.on_ready(move || s.lock().unwrap().push("ready".into()));

        events.emit(TrayEvent::Data("Quit".into()));
        events.emit(TrayEvent::Ready);
        events.emit(TrayEvent::Exit(ExitInfo::default()));

        assert_eq!(*seen.lock().unwrap(), vec!["data:Quit", "ready"]);
    }

    #[test]
    fn all_listeners_of_a_kind_fire_in_order() {
        let (seen, events) = recorder();
        for n in 0..3 {
            let s = Arc::clone(&seen);
            events.on_exit(move |info| s.lock().unwrap().push(format!("{n}:{info}")));
        }
        events.emit(TrayEvent::Exit(ExitInfo {
            code: Some(0),
            signal: None,
        }));

        assert_eq!(
            *seen.lock().unwrap(),
            vec!["0:exit code 0", "1:exit code 0", "2:exit code 0"]
        );
        assert_eq!(events.listener_count(EventKind::Exit), 3);
        assert_eq!(events.listener_count(EventKind::Click), 0);
    }

    #[test]
    fn click_listener_receives_item() {
        let (seen, events) = recorder();
        let s = Arc::clone(&seen);
        events.on_click(move |click| {
            s.lock()
                .unwrap()
                .push(format!("{}#{}@{}", click.item.title, click.identifier, click.seq_id));
        });
        events.emit(TrayEvent::Click(ClickEvent {
            item: MenuItem::new("Item 1", ""),
            seq_id: 0,
            identifier: 1,
        }));
        assert_eq!(*seen.lock().unwrap(), vec!["Item 1#1@0"]);
    }

    #[test]
    fn error_listener_sees_message() {
        let (seen, events) = recorder();
        let s = Arc::clone(&seen);
        events.on_error(move |err| s.lock().unwrap().push(err.to_string()));
        events.emit(TrayEvent::Error(Arc::new(TrayError::Reported)));
        assert_eq!(
            *seen.lock().unwrap(),
            vec!["tray process reported an error"]
        );
    }

    #[test]
    fn listener_may_subscribe_during_dispatch() {
        let events = EventDispatcher::new();
        let inner = events.clone();
        events.on_ready(move || inner.on_ready(|| {}));
        events.emit(TrayEvent::Ready);
        assert_eq!(events.listener_count(EventKind::Ready), 2);
    }
}
