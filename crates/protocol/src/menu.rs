//! Host-side menu model.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Title reserved for the separator sentinel.
pub const SEPARATOR_TITLE: &str = "<SEPARATOR>";

/// A single tray menu entry, possibly carrying a submenu.
///
/// `extra` holds host-only data (anything the host attaches next to the
/// rendering fields). It is kept on the host side and never trimmed onto the
/// wire.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MenuItem {
    pub title: String,
    #[serde(default)]
    pub tooltip: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub checked: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub enabled: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hidden: Option<bool>,
    /// Filesystem path before icon resolution, base64 payload after.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub icon: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_template_icon: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub items: Option<Vec<MenuItem>>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
    #[serde(skip)]
    id: Option<u32>,
}

impl MenuItem {
    /// Creates an enabled, unchecked item.
    pub fn new(title: impl Into<String>, tooltip: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            tooltip: tooltip.into(),
            ..Self::default()
        }
    }

    /// The separator sentinel.
    pub fn separator() -> Self {
        Self {
            title: SEPARATOR_TITLE.into(),
            tooltip: String::new(),
            enabled: Some(true),
            ..Self::default()
        }
    }

    pub fn is_separator(&self) -> bool {
        self.title == SEPARATOR_TITLE
    }

    pub fn with_checked(mut self, checked: bool) -> Self {
        self.checked = Some(checked);
        self
    }

    pub fn with_enabled(mut self, enabled: bool) -> Self {
        self.enabled = Some(enabled);
        self
    }

    pub fn with_icon(mut self, icon: impl Into<String>) -> Self {
        self.icon = Some(icon.into());
        self
    }

    pub fn with_items(mut self, items: Vec<MenuItem>) -> Self {
        self.items = Some(items);
        self
    }

    /// Attaches a host-only value under `key`.
    pub fn with_extra(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.extra.insert(key.into(), value.into());
        self
    }

    /// `enabled` as rendered: absent means enabled.
    pub fn is_enabled(&self) -> bool {
        self.enabled.unwrap_or(true)
    }

    pub fn is_checked(&self) -> bool {
        self.checked.unwrap_or(false)
    }

    /// Identifier assigned by the engine's registration pass, if any.
    pub fn identifier(&self) -> Option<u32> {
        self.id
    }

    /// Attaches a registration identifier. Only the identifier registry
    /// should call this.
    pub fn set_identifier(&mut self, id: u32) {
        self.id = Some(id);
    }

    pub fn clear_identifier(&mut self) {
        self.id = None;
    }

    /// Submenu entries, empty when the item has none.
    pub fn children(&self) -> &[MenuItem] {
        self.items.as_deref().unwrap_or_default()
    }
}

/// Root of the tray: icon, title, tooltip and top-level items.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Menu {
    /// Filesystem path before icon resolution, base64 payload after.
    #[serde(default)]
    pub icon: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub tooltip: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_template_icon: Option<bool>,
    #[serde(default)]
    pub items: Vec<MenuItem>,
}

impl Menu {
    /// Finds the item carrying `id` anywhere in the tree (depth-first).
    pub fn find(&self, id: u32) -> Option<&MenuItem> {
        find_in(&self.items, id)
    }

    pub fn find_mut(&mut self, id: u32) -> Option<&mut MenuItem> {
        find_in_mut(&mut self.items, id)
    }
}

fn find_in(items: &[MenuItem], id: u32) -> Option<&MenuItem> {
    for item in items {
        if item.id == Some(id) {
            return Some(item);
        }
        if let Some(found) = find_in(item.children(), id) {
            return Some(found);
        }
    }
    None
}

fn find_in_mut(items: &mut [MenuItem], id: u32) -> Option<&mut MenuItem> {
    for item in items {
        if item.id == Some(id) {
            return Some(item);
        }
        if let Some(children) = item.items.as_deref_mut() {
            if let Some(found) = find_in_mut(children, id) {
                return Some(found);
            }
        }
    }
    None
}
