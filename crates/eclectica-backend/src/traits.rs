use std::path::{Path, PathBuf};

use async_trait::async_trait;
use eclectica_platform::AppPaths;
use eclectica_versions::{RemoteVersion, Version};

use crate::error::BackendError;
use crate::events::EventSink;
use crate::info::InfoMap;
use crate::language::Language;

/// Shared resources handed to every backend at construction.
#[derive(Debug, Clone)]
pub struct BackendContext {
    pub paths: AppPaths,
    pub client: reqwest::Client,
    pub events: EventSink,
}

impl BackendContext {
    #[must_use]
    pub fn new(paths: AppPaths, client: reqwest::Client, events: EventSink) -> Self {
        Self {
            paths,
            client,
            events,
        }
    }

    #[must_use]
    pub fn version_dir(&self, language: Language, version: &Version) -> PathBuf {
        self.paths
            .version_dir(language.name(), &version.to_string())
    }
}

/// One concrete version being installed, with its finished Info Map.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstallTarget {
    pub language: Language,
    pub version: Version,
    pub info: InfoMap,
    pub destination: PathBuf,
    pub archive_path: PathBuf,
}

/// Capabilities every language backend provides to the installation engine.
///
/// Lifecycle hooks default to doing nothing so backends only implement the
/// steps their toolchain needs.
#[async_trait]
pub trait LanguageBackend: Send + Sync {
    fn language(&self) -> Language;

    fn context(&self) -> &BackendContext;

    fn events(&self) -> &EventSink {
        &self.context().events
    }

    /// Download metadata for `version`. The engine fills in defaults for
    /// every key left out.
    fn info(&self, version: &Version) -> Result<InfoMap, BackendError>;

    /// Command names exposed through proxy binaries.
    fn bins(&self) -> &'static [&'static str];

    /// Dotfile names that select a local version, most specific first.
    fn dots(&self) -> &'static [&'static str];

    async fn list_remote(&self) -> Result<Vec<RemoteVersion>, BackendError>;

    /// `KEY=VALUE` pairs the toolchain needs at run time.
    fn environment(&self, _version: &Version) -> Result<Vec<String>, BackendError> {
        Ok(Vec::new())
    }

    /// Directory containing the executables of an installed version.
    fn bin_dir(&self, version_dir: &Path) -> PathBuf {
        version_dir.join("bin")
    }

    /// URL of a checksum list covering the archive, when upstream has one.
    fn checksums_url(&self, _target: &InstallTarget) -> Option<String> {
        None
    }

    async fn pre_download(&mut self, _target: &InstallTarget) -> Result<(), BackendError> {
        Ok(())
    }

    async fn pre_install(&mut self, _target: &InstallTarget) -> Result<(), BackendError> {
        Ok(())
    }

    async fn install(&self, _target: &InstallTarget) -> Result<(), BackendError> {
        Ok(())
    }

    async fn post_install(&self, _target: &InstallTarget) -> Result<(), BackendError> {
        Ok(())
    }

    async fn link(&self, _target: &InstallTarget) -> Result<(), BackendError> {
        Ok(())
    }

    async fn switch(&self, _target: &InstallTarget) -> Result<(), BackendError> {
        Ok(())
    }

    /// Undo backend-specific side effects. Must not fail.
    async fn rollback(&self, _target: &InstallTarget) {}
}
