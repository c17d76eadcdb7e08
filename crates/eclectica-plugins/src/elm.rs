use async_trait::async_trait;

use eclectica_backend::{
    BackendContext, BackendError, InfoMap, Language, LanguageBackend, RemoteVersion, Version, keys,
};

use crate::listing::github_tags;
use crate::platform::elm_platform;

pub const DOWNLOAD_URL: &str = "https://github.com/elm/compiler/releases/download";
pub const GITHUB_API: &str = "https://api.github.com";
const REPOSITORY: &str = "elm/compiler";

pub(crate) const BINS: &[&str] = &["elm"];
pub(crate) const DOTS: &[&str] = &[".elm-version"];

/// Releases before this shipped as npm packages, not bare binaries.
const MINIMUM_VERSION: (u64, u64) = (0, 19);

#[derive(Debug, Clone)]
pub struct ElmBackend {
    context: BackendContext,
    download_url: String,
    api_url: String,
}

impl ElmBackend {
    #[must_use]
    pub fn new(context: BackendContext) -> Self {
        Self {
            context,
            download_url: DOWNLOAD_URL.to_string(),
            api_url: GITHUB_API.to_string(),
        }
    }

    #[must_use]
    pub fn with_urls(mut self, download_url: impl Into<String>, api_url: impl Into<String>) -> Self {
        self.download_url = download_url.into();
        self.api_url = api_url.into();
        self
    }
}

#[async_trait]
impl LanguageBackend for ElmBackend {
    fn language(&self) -> Language {
        Language::Elm
    }

    fn context(&self) -> &BackendContext {
        &self.context
    }

    fn info(&self, version: &Version) -> Result<InfoMap, BackendError> {
        let filename = format!("binary-for-{}-64-bit", elm_platform());
        let url = format!("{}/{version}/{filename}.gz", self.download_url);
        Ok(InfoMap::new()
            .with(keys::FILENAME, filename)
            .with(keys::URL, url)
            .with(keys::EXTENSION, "gz"))
    }

    fn bins(&self) -> &'static [&'static str] {
        BINS
    }

    fn dots(&self) -> &'static [&'static str] {
        DOTS
    }

    async fn list_remote(&self) -> Result<Vec<RemoteVersion>, BackendError> {
        let tags = github_tags(&self.context.client, &self.api_url, REPOSITORY).await?;
        Ok(tags
            .into_iter()
            .map(RemoteVersion::new)
            .filter(|remote| {
                remote
                    .version()
                    .is_some_and(|version| (version.major(), version.minor()) >= MINIMUM_VERSION)
            })
            .collect())
    }
}
