//! Per-platform rendering applied to items right before they are encoded.
//!
//! - Linux helpers have no checkmark support, so `checked` is encoded as a
//!   literal title suffix.
//! - Icon paths are replaced by the base64 encoding of the file they point to.

use std::path::Path;

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use futures_util::future::BoxFuture;
use systray_protocol::{ItemPatch, Menu, MenuItem};
use tracing::debug;

use crate::config::Platform;
use crate::error::TrayError;

/// Title suffix marking a checked item on Linux.
pub const CHECKED_SUFFIX: &str = " (√)";

/// Applies the checked-suffix convention to `item` and its submenu.
///
/// Only Linux is affected. The suffix is stripped first and re-appended when
/// `checked` is true, so repeated calls never stack it.
pub fn apply_platform_checked(item: &mut MenuItem, platform: Platform) {
    if platform != Platform::Linux {
        return;
    }
    apply_checked_suffix(item);
}

/// [`apply_platform_checked`] over every item of a menu.
pub fn apply_platform_checked_menu(menu: &mut Menu, platform: Platform) {
    for item in &mut menu.items {
        apply_platform_checked(item, platform);
    }
}

fn apply_checked_suffix(item: &mut MenuItem) {
    if let Some(stripped) = item.title.strip_suffix(CHECKED_SUFFIX) {
        let len = stripped.len();
        item.title.truncate(len);
    }
    if item.is_checked() {
        item.title.push_str(CHECKED_SUFFIX);
    }
    if let Some(children) = item.items.as_deref_mut() {
        for child in children {
            apply_checked_suffix(child);
        }
    }
}

/// Undoes the outgoing transforms on an item echoed back in a click.
///
/// The helper reports the title it displays and the encoded icon it was
/// sent; neither should overwrite the host's stored values.
pub fn normalize_click_patch(patch: &mut ItemPatch, platform: Platform) {
    if platform == Platform::Linux {
        if let Some(title) = patch.title.as_mut() {
            if let Some(stripped) = title.strip_suffix(CHECKED_SUFFIX) {
                let len = stripped.len();
                title.truncate(len);
            }
        }
    }
    patch.icon = None;
}

/// Source of icon bytes.
pub trait IconSource: Send + Sync {
    fn load<'a>(&'a self, path: &'a Path) -> BoxFuture<'a, std::io::Result<Vec<u8>>>;
}

/// Reads icons from the local filesystem.
#[derive(Debug, Clone, Copy, Default)]
pub struct FsIconSource;

impl IconSource for FsIconSource {
    fn load<'a>(&'a self, path: &'a Path) -> BoxFuture<'a, std::io::Result<Vec<u8>>> {
        Box::pin(tokio::fs::read(path))
    }
}

/// Replaces every icon path in `item` and its submenu with the encoded file.
///
/// Icons that fail to load are left exactly as they were. Returns the number
/// of icons resolved.
pub async fn resolve_item_icons(item: &mut MenuItem, source: &dyn IconSource) -> usize {
    let mut slots = Vec::new();
    icon_slots(std::slice::from_mut(item), &mut slots);
    resolve_slots(slots, source).await
}

/// Resolves the root icon and every item icon of `menu`.
pub async fn resolve_menu_icons(menu: &mut Menu, source: &dyn IconSource) -> usize {
    let mut resolved = 0;
    if !menu.icon.is_empty() {
        if let Some(encoded) = load_encoded(&menu.icon, source).await {
            menu.icon = encoded;
            resolved += 1;
        }
    }
    let mut slots = Vec::new();
    icon_slots(&mut menu.items, &mut slots);
    resolved + resolve_slots(slots, source).await
}

fn icon_slots<'a>(items: &'a mut [MenuItem], slots: &mut Vec<&'a mut Option<String>>) {
    for item in items {
        slots.push(&mut item.icon);
        if let Some(children) = item.items.as_deref_mut() {
            icon_slots(children, slots);
        }
    }
}

async fn resolve_slots(slots: Vec<&mut Option<String>>, source: &dyn IconSource) -> usize {
    let mut resolved = 0;
    for slot in slots {
        let Some(path) = slot.as_deref().filter(|p| !p.is_empty()) else {
            continue;
        };
        if let Some(encoded) = load_encoded(path, source).await {
            *slot = Some(encoded);
            resolved += 1;
        }
    }
    resolved
}

async fn load_encoded(path: &str, source: &dyn IconSource) -> Option<String> {
    match source.load(Path::new(path)).await {
        Ok(bytes) => Some(STANDARD.encode(bytes)),
        Err(e) => {
            let err = TrayError::IconLoad {
                path: path.into(),
                source: e,
            };
            debug!("{err}, leaving icon unresolved");
            None
        }
    }
}
