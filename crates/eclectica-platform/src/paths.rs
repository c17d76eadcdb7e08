use std::path::{Path, PathBuf};
use thiserror::Error;

/// File name of the dispatcher binary copied once per exposed command.
#[cfg(not(windows))]
pub const PROXY_BINARY: &str = "ec-proxy";
#[cfg(windows)]
pub const PROXY_BINARY: &str = "ec-proxy.exe";

const HOME_ENV: &str = "EC_HOME";
const PROXY_ENV: &str = "EC_PROXY_PLACE";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum AppPathsError {
    #[error("Could not determine home directory")]
    HomeDirUnavailable,
    #[error("Could not determine config directory")]
    ConfigDirUnavailable,
    #[error("Could not determine data directory")]
    DataDirUnavailable,
    #[error("Could not determine location of the running executable")]
    ExecutableUnavailable,
}

/// Every location eclectica reads or writes.
///
/// `root` holds installed versions and the shared proxy directory; config
/// and data follow the platform conventions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppPaths {
    pub root: PathBuf,
    pub config_dir: PathBuf,
    pub data_dir: PathBuf,
    pub proxy_dir: PathBuf,
}

impl AppPaths {
    /// Build application paths for the current platform.
    ///
    /// `EC_HOME` overrides the root directory and `EC_PROXY_PLACE` the
    /// directory the proxy binary is copied from.
    ///
    /// # Errors
    /// Returns an error when a required base directory (for example the user
    /// home/config/data directory) cannot be determined.
    pub fn new() -> Result<Self, AppPathsError> {
        let root = match std::env::var_os(HOME_ENV) {
            Some(root) if !root.is_empty() => PathBuf::from(root),
            _ => dirs::home_dir()
                .ok_or(AppPathsError::HomeDirUnavailable)?
                .join(".eclectica"),
        };

        let proxy_dir = match std::env::var_os(PROXY_ENV) {
            Some(place) if !place.is_empty() => PathBuf::from(place),
            _ => std::env::current_exe()
                .ok()
                .and_then(|exe| exe.parent().map(Path::to_path_buf))
                .ok_or(AppPathsError::ExecutableUnavailable)?,
        };

        #[cfg(target_os = "macos")]
        {
            let home = dirs::home_dir().ok_or(AppPathsError::HomeDirUnavailable)?;
            Ok(Self {
                root,
                config_dir: home.join("Library/Application Support/eclectica"),
                data_dir: home.join("Library/Application Support/eclectica"),
                proxy_dir,
            })
        }

        #[cfg(not(target_os = "macos"))]
        {
            Ok(Self {
                root,
                config_dir: dirs::config_dir()
                    .ok_or(AppPathsError::ConfigDirUnavailable)?
                    .join("eclectica"),
                data_dir: dirs::data_dir()
                    .ok_or(AppPathsError::DataDirUnavailable)?
                    .join("eclectica"),
                proxy_dir,
            })
        }
    }

    /// Paths rooted entirely under `root`, used for alternate homes and tests.
    #[must_use]
    pub fn with_root(root: impl Into<PathBuf>) -> Self {
        let root = root.into();
        Self {
            config_dir: root.join("config"),
            data_dir: root.join("data"),
            proxy_dir: root.join("proxy"),
            root,
        }
    }

    #[must_use]
    pub fn with_root_override(mut self, root: Option<PathBuf>) -> Self {
        if let Some(root) = root {
            self.root = root;
        }
        self
    }

    /// Directory holding one prefix per language.
    #[must_use]
    pub fn versions_home(&self) -> PathBuf {
        self.root.join("versions")
    }

    #[must_use]
    pub fn language_prefix(&self, language: &str) -> PathBuf {
        self.versions_home().join(language)
    }

    #[must_use]
    pub fn version_dir(&self, language: &str, version: &str) -> PathBuf {
        self.language_prefix(language).join(version)
    }

    /// Symlink pointing at the globally active version of a language.
    #[must_use]
    pub fn current_link(&self, language: &str) -> PathBuf {
        self.language_prefix(language).join("current")
    }

    /// Shared directory where proxy binaries live. Belongs on `PATH`.
    #[must_use]
    pub fn bin_dir(&self) -> PathBuf {
        self.root.join("bin")
    }

    #[must_use]
    pub fn lock_file(&self, language: &str) -> PathBuf {
        self.versions_home().join(format!(".{language}.lock"))
    }

    #[must_use]
    pub fn proxy_source(&self) -> PathBuf {
        self.proxy_dir.join(PROXY_BINARY)
    }

    #[must_use]
    pub fn temp_dir(&self) -> PathBuf {
        std::env::temp_dir()
    }

    #[must_use]
    pub fn settings_file(&self) -> PathBuf {
        self.config_dir.join("settings.json")
    }

    #[must_use]
    pub fn log_file(&self) -> PathBuf {
        self.data_dir.join("debug.log")
    }

    /// Ensure the directories eclectica writes to exist on disk.
    ///
    /// # Errors
    /// Returns an error if any directory cannot be created.
    pub fn ensure_dirs(&self) -> std::io::Result<()> {
        std::fs::create_dir_all(self.versions_home())?;
        std::fs::create_dir_all(self.bin_dir())?;
        std::fs::create_dir_all(&self.config_dir)?;
        std::fs::create_dir_all(&self.data_dir)?;
        Ok(())
    }
}
