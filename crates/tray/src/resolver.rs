//! Locating the native tray helper.
//!
//! Acquiring the helper (download, cache, build) is the host's business; the
//! engine only asks a resolver for a path.

use std::path::{Path, PathBuf};

use crate::config::Platform;
use crate::error::TrayError;

/// Provides the path of the helper executable.
pub trait ExecutableResolver {
    fn resolve_executable(&self) -> Result<PathBuf, TrayError>;
}

impl ExecutableResolver for PathBuf {
    fn resolve_executable(&self) -> Result<PathBuf, TrayError> {
        Ok(self.clone())
    }
}

impl ExecutableResolver for Path {
    fn resolve_executable(&self) -> Result<PathBuf, TrayError> {
        Ok(self.to_path_buf())
    }
}

/// A directory holding prebuilt helpers named per platform
/// (`tray_linux`, `tray_darwin`, `tray_windows.exe`).
#[derive(Debug, Clone)]
pub struct BundledBinary {
    dir: PathBuf,
    platform: Platform,
}

impl BundledBinary {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self::for_platform(dir, Platform::current())
    }

    pub fn for_platform(dir: impl Into<PathBuf>, platform: Platform) -> Self {
        Self {
            dir: dir.into(),
            platform,
        }
    }
}

impl ExecutableResolver for BundledBinary {
    fn resolve_executable(&self) -> Result<PathBuf, TrayError> {
        let name = self.platform.helper_binary_name().ok_or_else(|| {
            TrayError::Executable(format!("no tray helper for {:?}", self.platform))
        })?;
        let path = self.dir.join(name);
        if !path.is_file() {
            return Err(TrayError::Executable(format!(
                "{} not found",
                path.display()
            )));
        }
        Ok(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fixed_path_resolves_to_itself() {
        let path = PathBuf::from("/opt/tray/tray_linux");
        assert_eq!(path.resolve_executable().unwrap(), path);
        assert_eq!(path.as_path().resolve_executable().unwrap(), path);
    }

    #[test]
    fn bundled_binary_picks_platform_name() {
        let tmp = tempfile::tempdir().unwrap();
        std::fs::write(tmp.path().join("tray_darwin"), b"").unwrap();

        let resolver = BundledBinary::for_platform(tmp.path(), Platform::MacOs);
        assert_eq!(
            resolver.resolve_executable().unwrap(),
            tmp.path().join("tray_darwin")
        );
    }

    #[test]
    fn bundled_binary_missing_file() {
        let tmp = tempfile::tempdir().unwrap();
        let resolver = BundledBinary::for_platform(tmp.path(), Platform::Linux);
        let err = resolver.resolve_executable().unwrap_err();
        assert!(err.to_string().contains("tray_linux not found"));
    }

    #[test]
    fn bundled_binary_unsupported_platform() {
        let resolver = BundledBinary::for_platform("/opt/tray", Platform::Other);
        assert!(matches!(
            resolver.resolve_executable(),
            Err(TrayError::Executable(_))
        ));
    }
}
