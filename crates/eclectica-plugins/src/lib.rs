//! Language backends for eclectica.
//!
//! Each toolchain gets its own [`LanguageBackend`]; [`Backend`] is the closed
//! set the engine and the CLI work with, picked once per invocation.

mod compile;
mod listing;
mod platform;

pub mod elm;
pub mod golang;
pub mod node;
pub mod python;
pub mod ruby;
pub mod rust;

use std::path::{Path, PathBuf};

use async_trait::async_trait;

use eclectica_backend::{
    BackendContext, BackendError, InfoMap, InstallTarget, Language, LanguageBackend, RemoteVersion,
    Version,
};

pub use elm::ElmBackend;
pub use golang::GoBackend;
pub use node::NodeBackend;
pub use python::PythonBackend;
pub use ruby::RubyBackend;
pub use rust::RustBackend;

/// User preferences that change how individual backends behave.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BackendOptions {
    pub node_dist_mirror: Option<String>,
    pub with_modules: bool,
}

#[derive(Debug, Clone)]
pub enum Backend {
    Node(NodeBackend),
    Go(GoBackend),
    Python(PythonBackend),
    Ruby(RubyBackend),
    Rust(RustBackend),
    Elm(ElmBackend),
}

impl Backend {
    #[must_use]
    pub fn new(language: Language, context: BackendContext, options: &BackendOptions) -> Self {
        match language {
            Language::Node => {
                let mut backend = NodeBackend::new(context).with_modules(options.with_modules);
                if let Some(mirror) = &options.node_dist_mirror {
                    backend = backend.with_dist_url(mirror.clone());
                }
                Self::Node(backend)
            }
            Language::Go => Self::Go(GoBackend::new(context)),
            Language::Python => Self::Python(PythonBackend::new(context)),
            Language::Ruby => Self::Ruby(RubyBackend::new(context)),
            Language::Rust => Self::Rust(RustBackend::new(context)),
            Language::Elm => Self::Elm(ElmBackend::new(context)),
        }
    }

    #[must_use]
    pub fn bins_for(language: Language) -> &'static [&'static str] {
        match language {
            Language::Node => node::BINS,
            Language::Go => golang::BINS,
            Language::Python => python::BINS,
            Language::Ruby => ruby::BINS,
            Language::Rust => rust::BINS,
            Language::Elm => elm::BINS,
        }
    }

    #[must_use]
    pub fn dots_for(language: Language) -> &'static [&'static str] {
        match language {
            Language::Node => node::DOTS,
            Language::Go => golang::DOTS,
            Language::Python => python::DOTS,
            Language::Ruby => ruby::DOTS,
            Language::Rust => rust::DOTS,
            Language::Elm => elm::DOTS,
        }
    }

    /// The language whose proxies include a command called `bin`.
    #[must_use]
    pub fn language_for_bin(bin: &str) -> Option<Language> {
        Language::ALL
            .into_iter()
            .find(|language| Self::bins_for(*language).contains(&bin))
    }
}

macro_rules! dispatch {
    ($self:ident, $backend:ident => $body:expr) => {
        match $self {
            Backend::Node($backend) => $body,
            Backend::Go($backend) => $body,
            Backend::Python($backend) => $body,
            Backend::Ruby($backend) => $body,
            Backend::Rust($backend) => $body,
            Backend::Elm($backend) => $body,
        }
    };
}

#[async_trait]
impl LanguageBackend for Backend {
    fn language(&self) -> Language {
        dispatch!(self, backend => backend.language())
    }

    fn context(&self) -> &BackendContext {
        dispatch!(self, backend => backend.context())
    }

    fn info(&self, version: &Version) -> Result<InfoMap, BackendError> {
        dispatch!(self, backend => backend.info(version))
    }

    fn bins(&self) -> &'static [&'static str] {
        dispatch!(self, backend => backend.bins())
    }

    fn dots(&self) -> &'static [&'static str] {
        dispatch!(self, backend => backend.dots())
    }

    async fn list_remote(&self) -> Result<Vec<RemoteVersion>, BackendError> {
        dispatch!(self, backend => backend.list_remote().await)
    }

    fn environment(&self, version: &Version) -> Result<Vec<String>, BackendError> {
        dispatch!(self, backend => backend.environment(version))
    }

    fn bin_dir(&self, version_dir: &Path) -> PathBuf {
        dispatch!(self, backend => backend.bin_dir(version_dir))
    }

    fn checksums_url(&self, target: &InstallTarget) -> Option<String> {
        dispatch!(self, backend => backend.checksums_url(target))
    }

    async fn pre_download(&mut self, target: &InstallTarget) -> Result<(), BackendError> {
        dispatch!(self, backend => backend.pre_download(target).await)
    }

    async fn pre_install(&mut self, target: &InstallTarget) -> Result<(), BackendError> {
        dispatch!(self, backend => backend.pre_install(target).await)
    }

    async fn install(&self, target: &InstallTarget) -> Result<(), BackendError> {
        dispatch!(self, backend => backend.install(target).await)
    }

    async fn post_install(&self, target: &InstallTarget) -> Result<(), BackendError> {
        dispatch!(self, backend => backend.post_install(target).await)
    }

    async fn link(&self, target: &InstallTarget) -> Result<(), BackendError> {
        dispatch!(self, backend => backend.link(target).await)
    }

    async fn switch(&self, target: &InstallTarget) -> Result<(), BackendError> {
        dispatch!(self, backend => backend.switch(target).await)
    }

    async fn rollback(&self, target: &InstallTarget) {
        dispatch!(self, backend => backend.rollback(target).await);
    }
}
