use std::path::{Path, PathBuf};

use eclectica_backend::{BackendError, Language, Version};
use eclectica_core::{ArchiveError, DownloadError};
use eclectica_platform::LockError;
use eclectica_versions::VersionError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum EngineError {
    #[error("version was not defined")]
    VersionNotDefined,

    #[error("incorrect version {version}")]
    IncorrectVersion { version: String },

    #[error("{language} {version} is not installed")]
    NotInstalled { language: Language, version: Version },

    #[error("can't find ec-proxy binary at {}", path.display())]
    ProxyMissing { path: PathBuf },

    #[error("installation was interrupted")]
    Interrupted,

    #[error(transparent)]
    Backend(#[from] BackendError),

    #[error(transparent)]
    Download(#[from] DownloadError),

    #[error(transparent)]
    Archive(#[from] ArchiveError),

    #[error(transparent)]
    Locked(#[from] LockError),

    #[error("{context} {}: {source}", path.display())]
    Io {
        context: &'static str,
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("background task failed: {0}")]
    Task(String),
}

impl EngineError {
    pub(crate) fn io(context: &'static str, path: &Path, source: std::io::Error) -> Self {
        Self::Io {
            context,
            path: path.to_path_buf(),
            source,
        }
    }

    /// Whether retrying later could help: the remote end was unreachable.
    #[must_use]
    pub fn is_connection(&self) -> bool {
        match self {
            Self::Backend(error) => error.is_connection(),
            Self::Download(error) => error.is_connection(),
            _ => false,
        }
    }

    #[must_use]
    pub fn is_interrupted(&self) -> bool {
        matches!(self, Self::Interrupted)
    }
}

impl From<VersionError> for EngineError {
    fn from(error: VersionError) -> Self {
        match error {
            VersionError::NotDefined => Self::VersionNotDefined,
            VersionError::Invalid { input } | VersionError::NotFound { input } => {
                Self::IncorrectVersion { version: input }
            }
        }
    }
}
