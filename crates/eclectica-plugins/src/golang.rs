use async_trait::async_trait;
use log::debug;
use serde::Deserialize;

use eclectica_backend::{
    BackendContext, BackendError, InfoMap, Language, LanguageBackend, RemoteVersion, Version, keys,
};
use eclectica_versions::unsemverify;

use crate::listing::fetch_json;
use crate::platform::go_platform;

pub const DOWNLOAD_URL: &str = "https://dl.google.com/go";
pub const LISTING_URL: &str = "https://go.dev/dl/?mode=json&include=all";

pub(crate) const BINS: &[&str] = &["go", "gofmt"];
pub(crate) const DOTS: &[&str] = &[".go-version"];

/// Releases from here on always spell out the patch component.
const FULL_SPELLING_SINCE: (u64, u64) = (1, 21);

#[derive(Deserialize)]
struct Release {
    version: String,
}

#[derive(Debug, Clone)]
pub struct GoBackend {
    context: BackendContext,
    download_url: String,
    listing_url: String,
}

impl GoBackend {
    #[must_use]
    pub fn new(context: BackendContext) -> Self {
        Self {
            context,
            download_url: DOWNLOAD_URL.to_string(),
            listing_url: LISTING_URL.to_string(),
        }
    }

    #[must_use]
    pub fn with_urls(mut self, download_url: impl Into<String>, listing_url: impl Into<String>) -> Self {
        self.download_url = download_url.into();
        self.listing_url = listing_url.into();
        self
    }
}

/// Upstream spelling of `version`, e.g. `1.7`, `1.8beta2` or `1.21.0`.
fn native_spelling(version: &Version) -> String {
    if !version.is_prerelease() && (version.major(), version.minor()) >= FULL_SPELLING_SINCE {
        version.to_string()
    } else {
        unsemverify(&version.to_string())
    }
}

#[async_trait]
impl LanguageBackend for GoBackend {
    fn language(&self) -> Language {
        Language::Go
    }

    fn context(&self) -> &BackendContext {
        &self.context
    }

    fn info(&self, version: &Version) -> Result<InfoMap, BackendError> {
        let filename = format!("go{}.{}", native_spelling(version), go_platform());
        let url = format!("{}/{filename}.tar.gz", self.download_url);
        Ok(InfoMap::new()
            .with(keys::FILENAME, filename)
            .with(keys::URL, url)
            .with(keys::UNARCHIVE_FILENAME, "go"))
    }

    fn bins(&self) -> &'static [&'static str] {
        BINS
    }

    fn dots(&self) -> &'static [&'static str] {
        DOTS
    }

    async fn list_remote(&self) -> Result<Vec<RemoteVersion>, BackendError> {
        let releases: Vec<Release> = fetch_json(&self.context.client, &self.listing_url).await?;
        let remote: Vec<RemoteVersion> = releases
            .into_iter()
            .filter_map(|release| release.version.strip_prefix("go").map(RemoteVersion::new))
            .collect();
        debug!("Go download index lists {} releases", remote.len());
        Ok(remote)
    }

    fn environment(&self, version: &Version) -> Result<Vec<String>, BackendError> {
        let root = self.context.version_dir(Language::Go, version);
        let mut environment = vec![format!("GOROOT={}", root.display())];

        if std::env::var_os("GOPATH").is_none()
            && let Some(home) = dirs::home_dir()
        {
            environment.push(format!("GOPATH={}", home.join("go").display()));
        }
        Ok(environment)
    }
}
