//! Wire projections, actions and events.
//!
//! Field names and the `type` discriminators mirror what the native helper
//! decodes; see the crate docs for the line format.

use serde::{Deserialize, Serialize};

use crate::error::DecodeError;
use crate::menu::{Menu, MenuItem};

/// `seq_id` sent when the host does not supply one.
pub const DEFAULT_SEQ_ID: i64 = -1;

fn default_seq_id() -> i64 {
    DEFAULT_SEQ_ID
}

fn default_true() -> bool {
    true
}

/// A [`MenuItem`] trimmed to the fields the helper understands.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WireItem {
    pub title: String,
    #[serde(default)]
    pub tooltip: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub checked: Option<bool>,
    #[serde(default = "default_true")]
    pub enabled: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hidden: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub items: Option<Vec<WireItem>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub icon: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_template_icon: Option<bool>,
    #[serde(rename = "__id", default, skip_serializing_if = "Option::is_none")]
    pub identifier: Option<u32>,
}

impl WireItem {
    /// Projects an item (and its submenu) onto the wire shape. Host-only
    /// fields are dropped; the registration identifier is kept.
    pub fn trim(item: &MenuItem) -> Self {
        Self {
            title: item.title.clone(),
            tooltip: item.tooltip.clone(),
            checked: item.checked,
            enabled: item.is_enabled(),
            hidden: item.hidden,
            items: item
                .items
                .as_ref()
                .map(|items| items.iter().map(WireItem::trim).collect()),
            icon: item.icon.clone(),
            is_template_icon: item.is_template_icon,
            identifier: item.identifier(),
        }
    }
}

/// A [`Menu`] trimmed to the fields the helper understands.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WireMenu {
    #[serde(default)]
    pub icon: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub tooltip: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_template_icon: Option<bool>,
    #[serde(default)]
    pub items: Vec<WireItem>,
}

impl WireMenu {
    pub fn trim(menu: &Menu) -> Self {
        Self {
            icon: menu.icon.clone(),
            title: menu.title.clone(),
            tooltip: menu.tooltip.clone(),
            is_template_icon: menu.is_template_icon,
            items: menu.items.iter().map(WireItem::trim).collect(),
        }
    }
}

/// Host-issued request to change what the helper renders.
#[derive(Debug, Clone, PartialEq)]
pub enum Action {
    UpdateItem {
        item: MenuItem,
        seq_id: Option<i64>,
    },
    UpdateMenu {
        menu: Menu,
    },
    UpdateMenuAndItem {
        menu: Menu,
        item: MenuItem,
        seq_id: Option<i64>,
    },
    Exit,
}

impl Action {
    /// The wire discriminator for this action.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::UpdateItem { .. } => "update-item",
            Self::UpdateMenu { .. } => "update-menu",
            Self::UpdateMenuAndItem { .. } => "update-menu-and-item",
            Self::Exit => "exit",
        }
    }
}

/// Tagged action as written to the helper's input.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum WireAction {
    UpdateItem {
        item: WireItem,
        #[serde(default = "default_seq_id")]
        seq_id: i64,
    },
    UpdateMenu {
        menu: WireMenu,
    },
    UpdateMenuAndItem {
        menu: WireMenu,
        item: WireItem,
        #[serde(default = "default_seq_id")]
        seq_id: i64,
    },
    Exit,
}

impl From<&Action> for WireAction {
    fn from(action: &Action) -> Self {
        match action {
            Action::UpdateItem { item, seq_id } => Self::UpdateItem {
                item: WireItem::trim(item),
                seq_id: seq_id.unwrap_or(DEFAULT_SEQ_ID),
            },
            Action::UpdateMenu { menu } => Self::UpdateMenu {
                menu: WireMenu::trim(menu),
            },
            Action::UpdateMenuAndItem {
                menu,
                item,
                seq_id,
            } => Self::UpdateMenuAndItem {
                menu: WireMenu::trim(menu),
                item: WireItem::trim(item),
                seq_id: seq_id.unwrap_or(DEFAULT_SEQ_ID),
            },
            Action::Exit => Self::Exit,
        }
    }
}

/// Encodes an action as one JSON line (without the trailing newline).
pub fn encode_action(action: &Action) -> Result<String, serde_json::Error> {
    serde_json::to_string(&WireAction::from(action))
}

/// Encodes the initial, untagged menu line.
pub fn encode_menu(menu: &Menu) -> Result<String, serde_json::Error> {
    serde_json::to_string(&WireMenu::trim(menu))
}

/// Partial item as echoed by the helper in a click event.
///
/// Every field is optional: only the fields present on the wire overwrite the
/// host's stored item when merged.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ItemPatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tooltip: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub checked: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub enabled: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hidden: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub items: Option<Vec<ItemPatch>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub icon: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_template_icon: Option<bool>,
    #[serde(rename = "__id", default, skip_serializing_if = "Option::is_none")]
    pub identifier: Option<u32>,
}

impl ItemPatch {
    /// Copies `stored` and overwrites the fields present in this patch.
    ///
    /// The copy keeps the stored identifier, host-only fields and submenu;
    /// the tree structure stays owned by the host.
    pub fn apply_to(&self, stored: &MenuItem) -> MenuItem {
        let mut merged = stored.clone();
        if let Some(title) = &self.title {
            merged.title.clone_from(title);
        }
        if let Some(tooltip) = &self.tooltip {
            merged.tooltip.clone_from(tooltip);
        }
        if self.checked.is_some() {
            merged.checked = self.checked;
        }
        if self.enabled.is_some() {
            merged.enabled = self.enabled;
        }
        if self.hidden.is_some() {
            merged.hidden = self.hidden;
        }
        if self.icon.is_some() {
            merged.icon.clone_from(&self.icon);
        }
        if self.is_template_icon.is_some() {
            merged.is_template_icon = self.is_template_icon;
        }
        merged
    }
}

/// A user click reported by the helper.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClickedEvent {
    #[serde(default)]
    pub item: ItemPatch,
    #[serde(default = "default_seq_id")]
    pub seq_id: i64,
    #[serde(rename = "__id", default, skip_serializing_if = "Option::is_none")]
    pub identifier: Option<u32>,
}

/// Event parsed from one line of the helper's output.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum Event {
    Ready,
    Clicked(ClickedEvent),
}

/// Parses one output line.
///
/// Free text yields [`DecodeError::NotJson`]; JSON that is not a known event
/// yields [`DecodeError::Malformed`].
pub fn decode_line(line: &str) -> Result<Event, DecodeError> {
    let value: serde_json::Value =
        serde_json::from_str(line).map_err(|_| DecodeError::NotJson {
            line: line.to_string(),
        })?;
    serde_json::from_value(value).map_err(|source| DecodeError::Malformed {
        line: line.to_string(),
        source,
    })
}
