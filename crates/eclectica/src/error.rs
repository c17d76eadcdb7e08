use std::path::PathBuf;

use thiserror::Error;

use eclectica_backend::{BackendError, Language, UnknownLanguage};
use eclectica_engine::EngineError;
use eclectica_platform::AppPathsError;
use eclectica_shell::{ActivationError, ProfileError};

/// Exit status after Ctrl+C, as shells report it.
pub const INTERRUPTED_EXIT_CODE: i32 = 130;

#[derive(Debug, Error)]
pub enum AppError {
    #[error(transparent)]
    Paths(#[from] AppPathsError),

    #[error(transparent)]
    Engine(#[from] EngineError),

    #[error(transparent)]
    Backend(#[from] BackendError),

    #[error(transparent)]
    Activation(#[from] ActivationError),

    #[error(transparent)]
    Profile(#[from] ProfileError),

    #[error(transparent)]
    Language(#[from] UnknownLanguage),

    #[error("failed to set up HTTP client: {0}")]
    Http(#[from] reqwest::Error),

    #[error("no {language} version is active, install one with `ec {language}@<version>`")]
    NoActiveVersion { language: Language },

    #[error("\"{0}\" is not a command eclectica provides")]
    UnknownCommand(String),

    #[error("failed to run {}: {source}", path.display())]
    Exec {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("{context}: {source}")]
    Io {
        context: &'static str,
        #[source]
        source: std::io::Error,
    },
}

impl AppError {
    #[must_use]
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::Engine(error) if error.is_interrupted() => INTERRUPTED_EXIT_CODE,
            _ => 1,
        }
    }

    /// Extra line printed under the error, if any.
    #[must_use]
    pub fn hint(&self) -> Option<&'static str> {
        let connection = match self {
            Self::Engine(error) => error.is_connection(),
            Self::Backend(error) => error.is_connection(),
            _ => false,
        };
        connection.then_some("Check your internet connection and try again.")
    }
}
