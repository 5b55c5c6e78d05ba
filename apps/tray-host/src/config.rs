//! Host configuration.
//!
//! Stored as TOML at `$SYSTRAY_HOST_CONFIG` when set, otherwise:
//! - Linux: `~/.config/systray-host/host.toml`
//! - Windows: `%APPDATA%/systray-host/host.toml`

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use systray_protocol::{Menu, MenuItem};

/// Environment variable overriding the configuration path.
const CONFIG_ENV: &str = "SYSTRAY_HOST_CONFIG";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Explicit helper executable. Takes precedence over `binary_dir`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub binary: Option<PathBuf>,

    /// Directory holding the prebuilt helpers (`tray_linux`, ...).
    #[serde(default = "default_binary_dir")]
    pub binary_dir: PathBuf,

    /// Log wire traffic at debug level.
    #[serde(default)]
    pub debug: bool,

    #[serde(default = "default_menu")]
    pub menu: Menu,
}

fn default_binary_dir() -> PathBuf {
    PathBuf::from("bin")
}

fn default_menu() -> Menu {
    Menu {
        title: "systray".into(),
        tooltip: "systray host".into(),
        items: vec![
            MenuItem::new("Notifications", "Toggle notifications").with_checked(true),
            MenuItem::new("More", "").with_items(vec![
                MenuItem::new("Option A", "").with_checked(false),
                MenuItem::new("Option B", "").with_checked(false),
            ]),
            MenuItem::separator(),
            MenuItem::new("Quit", "Exit the host").with_extra("action", "quit"),
        ],
        ..Menu::default()
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            binary: None,
            binary_dir: default_binary_dir(),
            debug: false,
            menu: default_menu(),
        }
    }
}

impl Config {
    /// Loads configuration from disk, or creates a default if not found.
    pub fn load() -> anyhow::Result<Self> {
        Self::load_from(&config_path()?)
    }

    pub fn load_from(path: &Path) -> anyhow::Result<Self> {
        if path.exists() {
            let content = std::fs::read_to_string(path)?;
            Ok(toml::from_str(&content)?)
        } else {
            let config = Config::default();
            config.save_to(path)?;
            Ok(config)
        }
    }

    pub fn save_to(&self, path: &Path) -> anyhow::Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)?;

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            std::fs::set_permissions(path, std::fs::Permissions::from_mode(0o600))?;
        }

        tracing::debug!(path = %path.display(), "configuration saved");
        Ok(())
    }
}

/// Returns the configuration file path for this platform.
fn config_path() -> anyhow::Result<PathBuf> {
    if let Some(path) = std::env::var_os(CONFIG_ENV) {
        return Ok(PathBuf::from(path));
    }

    #[cfg(target_os = "windows")]
    {
        let appdata =
            std::env::var("APPDATA").unwrap_or_else(|_| "C:\\Users\\Default\\AppData".into());
        Ok(PathBuf::from(appdata)
            .join("systray-host")
            .join("host.toml"))
    }

    #[cfg(not(target_os = "windows"))]
    {
        let home = std::env::var("HOME").unwrap_or_else(|_| "/tmp".into());
        Ok(PathBuf::from(home)
            .join(".config")
            .join("systray-host")
            .join("host.toml"))
    }
}
