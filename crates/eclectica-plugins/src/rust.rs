use async_trait::async_trait;

use eclectica_backend::{
    BackendContext, BackendError, InfoMap, InstallPhase, InstallTarget, Language, LanguageBackend,
    RemoteVersion, Version, keys,
};

use crate::compile::BuildStep;
use crate::listing::github_tags;
use crate::platform::rust_triple;

pub const DIST_URL: &str = "https://static.rust-lang.org/dist";
pub const GITHUB_API: &str = "https://api.github.com";
const REPOSITORY: &str = "rust-lang/rust";

pub(crate) const BINS: &[&str] = &["rustc", "cargo", "rustdoc"];
pub(crate) const DOTS: &[&str] = &[".rust-version"];

#[derive(Debug, Clone)]
pub struct RustBackend {
    context: BackendContext,
    dist_url: String,
    api_url: String,
}

impl RustBackend {
    #[must_use]
    pub fn new(context: BackendContext) -> Self {
        Self {
            context,
            dist_url: DIST_URL.to_string(),
            api_url: GITHUB_API.to_string(),
        }
    }

    #[must_use]
    pub fn with_urls(mut self, dist_url: impl Into<String>, api_url: impl Into<String>) -> Self {
        self.dist_url = dist_url.into();
        self.api_url = api_url.into();
        self
    }
}

#[async_trait]
impl LanguageBackend for RustBackend {
    fn language(&self) -> Language {
        Language::Rust
    }

    fn context(&self) -> &BackendContext {
        &self.context
    }

    fn info(&self, version: &Version) -> Result<InfoMap, BackendError> {
        let filename = format!("rust-{version}-{}", rust_triple());
        let url = format!("{}/{filename}.tar.gz", self.dist_url);
        Ok(InfoMap::new()
            .with(keys::FILENAME, filename)
            .with(keys::URL, url))
    }

    fn bins(&self) -> &'static [&'static str] {
        BINS
    }

    fn dots(&self) -> &'static [&'static str] {
        DOTS
    }

    async fn list_remote(&self) -> Result<Vec<RemoteVersion>, BackendError> {
        let tags = github_tags(&self.context.client, &self.api_url, REPOSITORY).await?;
        Ok(tags.into_iter().map(RemoteVersion::new).collect())
    }

    async fn install(&self, target: &InstallTarget) -> Result<(), BackendError> {
        BuildStep::new(InstallPhase::Install, "sh")
            .arg("install.sh")
            .arg(format!("--prefix={}", target.destination.display()))
            .arg("--disable-ldconfig")
            .run(self.events(), &target.destination)
            .await
    }
}
