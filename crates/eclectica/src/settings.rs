use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use eclectica_platform::AppPaths;
use eclectica_plugins::BackendOptions;

const HOME_ENV: &str = "EC_HOME";
const DEBUG_ENV: &str = "EC_DEBUG";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Settings {
    /// Root for installed versions and proxies. `EC_HOME` wins over it.
    #[serde(default)]
    pub home: Option<PathBuf>,

    #[serde(default)]
    pub node_dist_mirror: Option<String>,

    /// Carry global node packages over when switching versions.
    #[serde(default)]
    pub with_modules: bool,

    #[serde(default = "default_http_timeout")]
    pub http_timeout_secs: u64,

    #[serde(default = "default_connect_timeout")]
    pub connect_timeout_secs: u64,

    #[serde(default)]
    pub debug_logging: bool,

    #[serde(default = "default_max_log_size_bytes")]
    pub max_log_size_bytes: u64,
}

fn default_http_timeout() -> u64 {
    30
}

fn default_connect_timeout() -> u64 {
    10
}

fn default_max_log_size_bytes() -> u64 {
    5 * 1024 * 1024
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            home: None,
            node_dist_mirror: None,
            with_modules: false,
            http_timeout_secs: default_http_timeout(),
            connect_timeout_secs: default_connect_timeout(),
            debug_logging: false,
            max_log_size_bytes: default_max_log_size_bytes(),
        }
    }
}

impl Settings {
    /// Settings from `settings.json`, or defaults when the file is missing
    /// or unreadable.
    #[must_use]
    pub fn load(paths: &AppPaths) -> Self {
        Self::load_from(&paths.settings_file())
    }

    #[must_use]
    pub fn load_from(path: &Path) -> Self {
        if !path.exists() {
            return Self::default();
        }
        match std::fs::read_to_string(path) {
            Ok(content) => serde_json::from_str(&content).unwrap_or_else(|error| {
                log::warn!("Ignoring malformed {}: {error}", path.display());
                Self::default()
            }),
            Err(_) => Self::default(),
        }
    }

    pub fn save(&self, paths: &AppPaths) -> Result<(), std::io::Error> {
        std::fs::create_dir_all(&paths.config_dir)?;

        let content = serde_json::to_string_pretty(self)?;
        std::fs::write(paths.settings_file(), content)?;
        Ok(())
    }

    /// Point `paths` at the configured home unless `EC_HOME` already did.
    #[must_use]
    pub fn apply_home(&self, paths: AppPaths) -> AppPaths {
        let env_home = std::env::var_os(HOME_ENV).is_some_and(|home| !home.is_empty());
        if env_home {
            paths
        } else {
            paths.with_root_override(self.home.clone())
        }
    }

    /// Debug logging is on when configured or when `EC_DEBUG` is set to
    /// anything but `0`.
    #[must_use]
    pub fn debug_enabled(&self) -> bool {
        self.debug_logging
            || std::env::var(DEBUG_ENV).is_ok_and(|value| !value.is_empty() && value != "0")
    }

    #[must_use]
    pub fn backend_options(&self) -> BackendOptions {
        BackendOptions {
            node_dist_mirror: self.node_dist_mirror.clone(),
            with_modules: self.with_modules,
        }
    }

    /// HTTP client shared by every backend of one invocation.
    pub fn http_client(&self) -> Result<reqwest::Client, reqwest::Error> {
        reqwest::Client::builder()
            .user_agent(concat!("eclectica/", env!("CARGO_PKG_VERSION")))
            .connect_timeout(Duration::from_secs(self.connect_timeout_secs))
            .read_timeout(Duration::from_secs(self.http_timeout_secs))
            .build()
    }
}
