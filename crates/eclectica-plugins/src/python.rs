use std::path::Path;

use async_trait::async_trait;
use log::{debug, info};
use regex::Regex;

use eclectica_backend::{
    BackendContext, BackendError, InfoMap, InstallPhase, InstallTarget, Language, LanguageBackend,
    RemoteVersion, Version, keys,
};
use eclectica_core::{BatchItem, download_batch};
use eclectica_platform::symlink;
use eclectica_versions::unsemverify;

use crate::compile::{BuildStep, jobs, require_tool};
use crate::listing::{fetch_listing, scrape_links};

pub const FTP_URL: &str = "https://www.python.org/ftp/python";
pub const GET_PIP_URL: &str = "https://bootstrap.pypa.io/pip/2.7/get-pip.py";

pub(crate) const BINS: &[&str] = &["2to3", "idle", "pydoc", "python", "python-config", "pip"];
pub(crate) const DOTS: &[&str] = &[".python-version"];

const MINIMUM_VERSION: (u64, u64) = (2, 7);
/// First release shipping `ensurepip`.
const BUNDLED_PIP_SINCE: (u64, u64, u64) = (2, 7, 9);
/// Releases before this are published without a zero patch component.
const FULL_SPELLING_SINCE: (u64, u64, u64) = (3, 3, 0);

const LISTING_PATTERN: &str = r#"href="(\d+\.\d+(?:\.\d+)?)/""#;
const VERSIONED_BIN_PATTERN: &str = r"^(.*?)-?3(?:\.\d+)?(-config)?$";
const GET_PIP: &str = "get-pip.py";

#[derive(Debug, Clone)]
pub struct PythonBackend {
    context: BackendContext,
    ftp_url: String,
    get_pip_url: String,
}

impl PythonBackend {
    #[must_use]
    pub fn new(context: BackendContext) -> Self {
        Self {
            context,
            ftp_url: FTP_URL.to_string(),
            get_pip_url: GET_PIP_URL.to_string(),
        }
    }

    #[must_use]
    pub fn with_urls(mut self, ftp_url: impl Into<String>, get_pip_url: impl Into<String>) -> Self {
        self.ftp_url = ftp_url.into();
        self.get_pip_url = get_pip_url.into();
        self
    }

    async fn download_externals(&self, target: &InstallTarget) -> Result<(), BackendError> {
        if has_bundled_pip(&target.version) {
            return Ok(());
        }
        info!("Fetching pip bootstrap for python {}", target.version);
        let items = vec![BatchItem::new(&self.get_pip_url, target.destination.join(GET_PIP))];
        download_batch(&self.context.client, items)
            .await
            .map_err(|error| BackendError::from_download("pip bootstrap download", &error))?;
        Ok(())
    }
}

fn has_bundled_pip(version: &Version) -> bool {
    (version.major(), version.minor(), version.patch()) >= BUNDLED_PIP_SINCE
}

fn native_spelling(version: &Version) -> String {
    if (version.major(), version.minor(), version.patch()) >= FULL_SPELLING_SINCE {
        version.to_string()
    } else {
        unsemverify(&version.to_string())
    }
}

/// Give python 3 executables their unversioned names (`python3.12` as
/// `python`, `pip3` as `pip`) so the proxies find them.
fn rename_links(bin_dir: &Path) -> Result<(), BackendError> {
    let pattern = Regex::new(VERSIONED_BIN_PATTERN)
        .map_err(|error| BackendError::install_failed("linking", error.to_string()))?;

    let mut names: Vec<String> = std::fs::read_dir(bin_dir)?
        .filter_map(Result::ok)
        .map(|entry| entry.file_name().to_string_lossy().into_owned())
        .collect();
    names.sort();

    for name in names {
        let Some(captures) = pattern.captures(&name) else {
            continue;
        };
        let base = format!(
            "{}{}",
            captures.get(1).map_or("", |m| m.as_str()),
            captures.get(2).map_or("", |m| m.as_str())
        );
        if !BINS.contains(&base.as_str()) {
            continue;
        }
        let link = bin_dir.join(&base);
        if link.symlink_metadata().is_ok() {
            continue;
        }
        debug!("Linking {base} to {name}");
        symlink(Path::new(&name), &link)?;
    }
    Ok(())
}

#[async_trait]
impl LanguageBackend for PythonBackend {
    fn language(&self) -> Language {
        Language::Python
    }

    fn context(&self) -> &BackendContext {
        &self.context
    }

    fn info(&self, version: &Version) -> Result<InfoMap, BackendError> {
        let native = native_spelling(version);
        let filename = format!("Python-{native}");
        let url = format!("{}/{native}/{filename}.tgz", self.ftp_url);
        Ok(InfoMap::new()
            .with(keys::FILENAME, filename)
            .with(keys::URL, url)
            .with(keys::EXTENSION, "tgz"))
    }

    fn bins(&self) -> &'static [&'static str] {
        BINS
    }

    fn dots(&self) -> &'static [&'static str] {
        DOTS
    }

    async fn list_remote(&self) -> Result<Vec<RemoteVersion>, BackendError> {
        let page = fetch_listing(&self.context.client, &format!("{}/", self.ftp_url)).await?;
        let remote: Vec<RemoteVersion> = scrape_links(&page, LISTING_PATTERN)?
            .into_iter()
            .map(RemoteVersion::new)
            .filter(|remote| {
                remote.version().is_some_and(|version| {
                    !version.is_prerelease() && (version.major(), version.minor()) >= MINIMUM_VERSION
                })
            })
            .collect();
        debug!("Python index lists {} releases", remote.len());
        Ok(remote)
    }

    async fn pre_install(&mut self, _target: &InstallTarget) -> Result<(), BackendError> {
        require_tool("make", "python")?;
        require_tool("cc", "python")?;
        Ok(())
    }

    async fn install(&self, target: &InstallTarget) -> Result<(), BackendError> {
        self.download_externals(target).await?;

        let events = self.events();
        let source = &target.destination;
        let prefix = source.to_string_lossy().into_owned();

        let mut configure = BuildStep::new(InstallPhase::Configure, "./configure")
            .arg(format!("--prefix={prefix}"));
        if has_bundled_pip(&target.version) {
            configure = configure.arg("--with-ensurepip=upgrade");
        }
        configure.run(events, source).await?;

        BuildStep::new(InstallPhase::Build, "make")
            .arg("-j")
            .arg(jobs().to_string())
            .run(events, source)
            .await?;

        BuildStep::new(InstallPhase::Install, "make")
            .arg("install")
            .run(events, source)
            .await?;

        rename_links(&source.join("bin"))
    }

    async fn post_install(&self, target: &InstallTarget) -> Result<(), BackendError> {
        let bin = target.destination.join("bin");
        if bin.join("pip").exists() {
            return Ok(());
        }

        let python = bin.join("python").to_string_lossy().into_owned();
        let step = if has_bundled_pip(&target.version) {
            BuildStep::new(InstallPhase::PostInstall, &python)
                .arg("-m")
                .arg("ensurepip")
                .arg("--upgrade")
        } else {
            BuildStep::new(InstallPhase::PostInstall, &python).arg(GET_PIP)
        };
        step.run(self.events(), &target.destination).await?;

        rename_links(&bin)
    }
}
