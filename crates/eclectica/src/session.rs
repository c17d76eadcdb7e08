use std::path::PathBuf;

use eclectica_backend::{BackendContext, EventSink, Language};
use eclectica_platform::AppPaths;
use eclectica_plugins::{Backend, BackendOptions};

use crate::error::AppError;
use crate::settings::Settings;

/// Paths and settings for one invocation.
#[derive(Debug, Clone)]
pub struct Session {
    pub paths: AppPaths,
    pub settings: Settings,
}

impl Session {
    pub fn load() -> Result<Self, AppError> {
        let paths = AppPaths::new()?;
        let settings = Settings::load(&paths);
        Ok(Self::new(settings.apply_home(paths), settings))
    }

    #[must_use]
    pub fn new(paths: AppPaths, settings: Settings) -> Self {
        Self { paths, settings }
    }

    pub fn backend(
        &self,
        language: Language,
        events: EventSink,
        options: &BackendOptions,
    ) -> Result<Backend, AppError> {
        let client = self.settings.http_client()?;
        let context = BackendContext::new(self.paths.clone(), client, events);
        Ok(Backend::new(language, context, options))
    }

    /// Backend configured from settings alone, without progress reporting.
    pub fn quiet_backend(&self, language: Language) -> Result<Backend, AppError> {
        self.backend(language, EventSink::disabled(), &self.settings.backend_options())
    }

    pub fn current_dir() -> Result<PathBuf, AppError> {
        std::env::current_dir().map_err(|source| AppError::Io {
            context: "failed to read the working directory",
            source,
        })
    }
}
