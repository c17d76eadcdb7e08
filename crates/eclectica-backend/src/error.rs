use eclectica_core::DownloadError;
use eclectica_platform::CommandError;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum BackendError {
    #[error("{details}")]
    CommandFailed { program: String, details: String },

    #[error("Installation failed during {phase}: {details}")]
    InstallFailed {
        phase: &'static str,
        details: String,
    },

    #[error("Can't establish connection during {operation}: {details}")]
    Connection {
        operation: &'static str,
        details: String,
    },

    #[error("Network error during {operation} ({stage}): {details}")]
    NetworkError {
        operation: &'static str,
        stage: NetworkStage,
        details: String,
    },

    #[error("Version not found: {version}")]
    VersionNotFound { version: String },

    #[error("IO error ({kind}): {message}")]
    IoError {
        kind: std::io::ErrorKind,
        message: String,
    },

    #[error("{tool} is required to build {language} but was not found in PATH")]
    MissingTool {
        tool: &'static str,
        language: &'static str,
    },

    #[error("Backend-specific error in {context}: {details}")]
    BackendSpecific {
        context: &'static str,
        details: String,
    },
}

#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum NetworkStage {
    #[error("request")]
    Request,
    #[error("response parse")]
    ResponseParse,
}

impl BackendError {
    pub fn install_failed(phase: &'static str, details: impl Into<String>) -> Self {
        Self::InstallFailed {
            phase,
            details: details.into(),
        }
    }

    pub fn network_request(operation: &'static str, details: impl Into<String>) -> Self {
        Self::NetworkError {
            operation,
            stage: NetworkStage::Request,
            details: details.into(),
        }
    }

    pub fn network_parse(operation: &'static str, details: impl Into<String>) -> Self {
        Self::NetworkError {
            operation,
            stage: NetworkStage::ResponseParse,
            details: details.into(),
        }
    }

    pub fn network_parse_from<E>(operation: &'static str, error: E) -> Self
    where
        E: std::fmt::Display,
    {
        Self::network_parse(operation, error.to_string())
    }

    /// Map a transfer failure, keeping connection problems distinguishable.
    #[must_use]
    pub fn from_download(operation: &'static str, error: &DownloadError) -> Self {
        if error.is_connection() {
            Self::Connection {
                operation,
                details: error.to_string(),
            }
        } else {
            Self::network_request(operation, error.to_string())
        }
    }

    #[must_use]
    pub fn is_connection(&self) -> bool {
        matches!(self, Self::Connection { .. })
    }
}

impl From<std::io::Error> for BackendError {
    fn from(err: std::io::Error) -> Self {
        BackendError::IoError {
            kind: err.kind(),
            message: err.to_string(),
        }
    }
}

impl From<CommandError> for BackendError {
    fn from(err: CommandError) -> Self {
        let program = match &err {
            CommandError::Spawn { program, .. }
            | CommandError::Failed { program, .. }
            | CommandError::Io { program, .. } => program.clone(),
        };
        let details = match err {
            CommandError::Failed { details, .. } => details,
            other => other.to_string(),
        };
        BackendError::CommandFailed { program, details }
    }
}
