//! Menu model and wire codec shared by the tray engine and the native helper.
//!
//! The host describes its tray as a [`Menu`] of [`MenuItem`]s. Before anything
//! crosses the process boundary it is projected ("trimmed") into the
//! [`wire`] shapes, which carry only the fields the helper renders plus the
//! identifier used to correlate clicks.
//!
//! # Wire format
//!
//! One JSON value per line, UTF-8, newline terminated:
//!
//! ```text
//! host -> helper:  {"type":"update-item","item":{..},"seq_id":n}
//!                  {"type":"update-menu","menu":{..}}
//!                  {"type":"update-menu-and-item","menu":{..},"item":{..},"seq_id":n}
//!                  {"type":"exit"}
//! helper -> host:  {"type":"ready"}
//!                  {"type":"clicked","item":{..},"seq_id":n,"__id":id}
//! ```
//!
//! The first line written after `ready` is the bare trimmed menu, without an
//! action tag.

pub mod error;
pub mod menu;
pub mod wire;

pub use error::DecodeError;
pub use menu::{Menu, MenuItem, SEPARATOR_TITLE};
pub use wire::{
    Action, ClickedEvent, DEFAULT_SEQ_ID, Event, ItemPatch, WireAction, WireItem, WireMenu,
    decode_line, encode_action, encode_menu,
};
