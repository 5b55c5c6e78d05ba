//! Engine configuration.

use systray_protocol::Menu;

/// Target whose rendering conventions the engine applies.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Platform {
    Linux,
    MacOs,
    Windows,
    Other,
}

impl Platform {
    /// The platform this crate was compiled for.
    pub const fn current() -> Self {
        if cfg!(target_os = "linux") {
            Self::Linux
        } else if cfg!(target_os = "macos") {
            Self::MacOs
        } else if cfg!(target_os = "windows") {
            Self::Windows
        } else {
            Self::Other
        }
    }

    /// File name of the prebuilt tray helper for this platform.
    pub fn helper_binary_name(self) -> Option<&'static str> {
        match self {
            Self::Linux => Some("tray_linux"),
            Self::MacOs => Some("tray_darwin"),
            Self::Windows => Some("tray_windows.exe"),
            Self::Other => None,
        }
    }
}

/// Everything the engine needs besides the helper executable.
#[derive(Debug, Clone)]
pub struct TrayConfig {
    /// Initial menu; identifiers are assigned to it at launch.
    pub menu: Menu,
    /// Log wire traffic at `debug` instead of `trace`.
    pub debug: bool,
    pub platform: Platform,
}

impl TrayConfig {
    pub fn new(menu: Menu) -> Self {
        Self {
            menu,
            debug: false,
            platform: Platform::current(),
        }
    }

    pub fn with_debug(mut self, debug: bool) -> Self {
        self.debug = debug;
        self
    }

    pub fn with_platform(mut self, platform: Platform) -> Self {
        self.platform = platform;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config() {
        let config = TrayConfig::new(Menu::default());
        assert!(!config.debug);
        assert_eq!(config.platform, Platform::current());
    }

    #[test]
    fn helper_names_per_platform() {
        assert_eq!(Platform::Linux.helper_binary_name(), Some("tray_linux"));
        assert_eq!(Platform::MacOs.helper_binary_name(), Some("tray_darwin"));
        assert_eq!(
            Platform::Windows.helper_binary_name(),
            Some("tray_windows.exe")
        );
        assert_eq!(Platform::Other.helper_binary_name(), None);
    }

    #[cfg(target_os = "linux")]
    #[test]
    fn current_is_linux_on_linux() {
        assert_eq!(Platform::current(), Platform::Linux);
    }
}
