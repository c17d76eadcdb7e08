use async_trait::async_trait;
use log::debug;

use eclectica_backend::{
    BackendContext, BackendError, InfoMap, InstallPhase, InstallTarget, Language, LanguageBackend,
    RemoteVersion, Version, keys,
};

use crate::compile::{BuildStep, jobs, require_tool};
use crate::listing::fetch_listing;

pub const DIST_URL: &str = "https://cache.ruby-lang.org/pub/ruby";

pub(crate) const BINS: &[&str] = &["ruby", "gem", "irb", "erb", "rake", "bundle", "bundler"];
pub(crate) const DOTS: &[&str] = &[".ruby-version"];

const MINIMUM_MAJOR: u64 = 2;

#[derive(Debug, Clone)]
pub struct RubyBackend {
    context: BackendContext,
    dist_url: String,
}

impl RubyBackend {
    #[must_use]
    pub fn new(context: BackendContext) -> Self {
        Self {
            context,
            dist_url: DIST_URL.to_string(),
        }
    }

    #[must_use]
    pub fn with_dist_url(mut self, dist_url: impl Into<String>) -> Self {
        self.dist_url = dist_url.into();
        self
    }
}

/// Versions from the tab separated `index.txt`, keeping only source
/// tarballs.
fn parse_index(index: &str) -> Vec<RemoteVersion> {
    index
        .lines()
        .filter_map(|line| {
            let mut columns = line.split('\t');
            let name = columns.next()?.strip_prefix("ruby-")?;
            let url = columns.next()?;
            url.ends_with(".tar.gz").then(|| RemoteVersion::new(name))
        })
        .filter(|remote| {
            remote
                .version()
                .is_some_and(|version| version.major() >= MINIMUM_MAJOR)
        })
        .collect()
}

#[async_trait]
impl LanguageBackend for RubyBackend {
    fn language(&self) -> Language {
        Language::Ruby
    }

    fn context(&self) -> &BackendContext {
        &self.context
    }

    fn info(&self, version: &Version) -> Result<InfoMap, BackendError> {
        let filename = format!("ruby-{version}");
        let url = format!(
            "{}/{}.{}/{filename}.tar.gz",
            self.dist_url,
            version.major(),
            version.minor()
        );
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
        let index = fetch_listing(&self.context.client, &format!("{}/index.txt", self.dist_url)).await?;
        let remote = parse_index(&index);
        debug!("Ruby index lists {} releases", remote.len());
        Ok(remote)
    }

    async fn pre_install(&mut self, _target: &InstallTarget) -> Result<(), BackendError> {
        require_tool("make", "ruby")?;
        require_tool("cc", "ruby")?;
        Ok(())
    }

    async fn install(&self, target: &InstallTarget) -> Result<(), BackendError> {
        let events = self.events();
        let source = &target.destination;

        BuildStep::new(InstallPhase::Configure, "./configure")
            .arg(format!("--prefix={}", source.display()))
            .arg("--disable-install-doc")
            .run(events, source)
            .await?;

        BuildStep::new(InstallPhase::Build, "make")
            .arg("-j")
            .arg(jobs().to_string())
            .run(events, source)
            .await?;

        BuildStep::new(InstallPhase::Install, "make")
            .arg("install")
            .run(events, source)
            .await
    }
}
