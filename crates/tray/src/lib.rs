//! Host-side engine for a native system tray helper.
//!
//! The helper is a separate executable that draws the tray icon and its menu.
//! This crate launches it, keeps the host's menu model in sync with it over a
//! line-delimited JSON protocol, and turns what the helper prints back into
//! typed events.
//!
//! ```no_run
//! use systray::{BundledBinary, Tray, TrayConfig};
//! use systray_protocol::{Menu, MenuItem};
//!
//! # async fn run() -> Result<(), systray::TrayError> {
//! let menu = Menu {
//!     title: "Demo".into(),
//!     items: vec![MenuItem::new("Quit", "Exit the demo")],
//!     ..Menu::default()
//! };
//! let tray = Tray::new(TrayConfig::new(menu));
//! tray.on_click(|click| println!("clicked {}", click.item.title));
//! tray.launch(&BundledBinary::new("bin")).await?;
//! tray.ready().await?;
//! # Ok(())
//! # }
//! ```
//!
//! # Platform notes
//! - Linux helpers have no checkmarks; checked items get a ` (√)` title suffix
//!   on the wire while the host model keeps the plain title.
//! - Icons are given as file paths and sent base64 encoded.

pub mod config;
pub mod error;
pub mod events;
mod pumps;
mod redact;
pub mod registry;
pub mod render;
pub mod resolver;
mod tray;

pub use config::{Platform, TrayConfig};
pub use error::TrayError;
pub use events::{ClickEvent, EventDispatcher, EventKind, TrayEvent};
pub use registry::IdentifierRegistry;
pub use render::{CHECKED_SUFFIX, FsIconSource, IconSource};
pub use resolver::{BundledBinary, ExecutableResolver};
pub use tray::{Phase, Tray};

pub use systray_protocol::{Action, Menu, MenuItem};
pub use systray_transport::{ExitInfo, ProcessControl, ProcessIo, ProcessMonitor};
