use std::io;
use std::path::Path;

use async_trait::async_trait;
use log::{debug, info, warn};
use serde::Deserialize;

use eclectica_backend::{
    BackendContext, BackendError, InfoMap, InstallPhase, InstallTarget, Language, LanguageBackend,
    RemoteVersion, Version, keys,
};
use eclectica_platform::{copy_dir, read_link_version, symlink};

use crate::compile::BuildStep;
use crate::listing::fetch_json;
use crate::platform::{node_arch, node_os};

pub const DIST_URL: &str = "https://nodejs.org/dist";

pub(crate) const BINS: &[&str] = &["node", "npm", "npx"];
pub(crate) const DOTS: &[&str] = &[".node-version", ".nvmrc"];

const MINIMUM_VERSION: (u64, u64) = (0, 10);
const NPMRC: &str = "scripts-prepend-node-path=false\n";

/// Packages bundled with node itself; never carried between versions.
const BUNDLED_PACKAGES: &[&str] = &["npm", "corepack"];

#[derive(Deserialize)]
struct IndexEntry {
    version: String,
    #[serde(default)]
    lts: serde_json::Value,
}

impl IndexEntry {
    fn into_remote(self) -> RemoteVersion {
        let name = self
            .version
            .strip_prefix('v')
            .unwrap_or(&self.version)
            .to_string();
        let remote = RemoteVersion::new(name);
        match self.lts {
            serde_json::Value::String(codename) => remote.with_lts(codename),
            _ => remote,
        }
    }
}

#[derive(Debug, Clone)]
pub struct NodeBackend {
    context: BackendContext,
    dist_url: String,
    carry_modules: bool,
    previous: Option<Version>,
}

impl NodeBackend {
    #[must_use]
    pub fn new(context: BackendContext) -> Self {
        Self {
            context,
            dist_url: DIST_URL.to_string(),
            carry_modules: false,
            previous: None,
        }
    }

    #[must_use]
    pub fn with_dist_url(mut self, dist_url: impl Into<String>) -> Self {
        self.dist_url = dist_url.into().trim_end_matches('/').to_string();
        self
    }

    #[must_use]
    pub fn with_modules(mut self, enabled: bool) -> Self {
        self.carry_modules = enabled;
        self
    }

    fn filename(version: &Version) -> String {
        format!("node-v{version}-{}-{}", node_os(), node_arch())
    }

    async fn migrate_modules(&self, previous: &Version, target: &InstallTarget) -> Result<(), BackendError> {
        let previous_dir = self.context.version_dir(Language::Node, previous);
        let from_modules = previous_dir.join("lib").join("node_modules");
        let packages = global_packages(&from_modules)?;
        if packages.is_empty() {
            debug!("No global modules to carry over from {previous}");
            return Ok(());
        }

        let events = self.events();
        events.phase(InstallPhase::Modules);
        info!(
            "Carrying {} global modules from node {previous} to {}",
            packages.len(),
            target.version
        );

        if previous.major() == target.version.major() {
            let to_modules = target.destination.join("lib").join("node_modules");
            copy_packages(&from_modules, &to_modules, &packages)?;
            relink_bins(&previous_dir.join("bin"), &target.destination.join("bin"))?;
            return Ok(());
        }

        let bin_dir = target.destination.join("bin");
        let npm = bin_dir.join("npm").to_string_lossy().into_owned();
        let path = match std::env::var_os("PATH") {
            Some(existing) => {
                let mut entries = vec![bin_dir.clone()];
                entries.extend(std::env::split_paths(&existing));
                std::env::join_paths(entries)
                    .map_err(|error| BackendError::install_failed("modules", error.to_string()))?
                    .to_string_lossy()
                    .into_owned()
            }
            None => bin_dir.to_string_lossy().into_owned(),
        };

        let mut step = BuildStep::new(InstallPhase::Modules, &npm)
            .arg("install")
            .arg("--global")
            .env("PATH", path);
        for package in packages {
            step = step.arg(package);
        }
        step.run(events, &target.destination).await
    }
}

#[async_trait]
impl LanguageBackend for NodeBackend {
    fn language(&self) -> Language {
        Language::Node
    }

    fn context(&self) -> &BackendContext {
        &self.context
    }

    fn info(&self, version: &Version) -> Result<InfoMap, BackendError> {
        let filename = Self::filename(version);
        let url = format!("{}/v{version}/{filename}.tar.gz", self.dist_url);
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
        let url = format!("{}/index.json", self.dist_url);
        let entries: Vec<IndexEntry> = fetch_json(&self.context.client, &url).await?;

        let remote: Vec<RemoteVersion> = entries
            .into_iter()
            .map(IndexEntry::into_remote)
            .filter(|remote| {
                remote
                    .version()
                    .is_some_and(|version| (version.major(), version.minor()) >= MINIMUM_VERSION)
            })
            .collect();
        debug!("Node dist index lists {} versions", remote.len());
        Ok(remote)
    }

    fn checksums_url(&self, target: &InstallTarget) -> Option<String> {
        Some(format!("{}/v{}/SHASUMS256.txt", self.dist_url, target.version))
    }

    async fn pre_download(&mut self, _target: &InstallTarget) -> Result<(), BackendError> {
        let current = self.context.paths.current_link(Language::Node.name());
        self.previous = read_link_version(&current);
        debug!("Node version active before install: {:?}", self.previous);
        Ok(())
    }

    async fn post_install(&self, target: &InstallTarget) -> Result<(), BackendError> {
        let etc = target.destination.join("etc");
        tokio::fs::create_dir_all(&etc).await?;
        tokio::fs::write(etc.join("npmrc"), NPMRC).await?;
        Ok(())
    }

    async fn switch(&self, target: &InstallTarget) -> Result<(), BackendError> {
        if !self.carry_modules {
            return Ok(());
        }
        let Some(previous) = self.previous.as_ref() else {
            return Ok(());
        };
        if *previous == target.version {
            return Ok(());
        }
        self.migrate_modules(previous, target).await
    }
}

/// Names of globally installed packages under `modules`, scoped packages as
/// `@scope/name`. A missing directory has none.
fn global_packages(modules: &Path) -> io::Result<Vec<String>> {
    let entries = match std::fs::read_dir(modules) {
        Ok(entries) => entries,
        Err(error) if error.kind() == io::ErrorKind::NotFound => return Ok(Vec::new()),
        Err(error) => return Err(error),
    };

    let mut packages = Vec::new();
    for entry in entries {
        let entry = entry?;
        let name = entry.file_name().to_string_lossy().into_owned();
        if name.starts_with('.') || BUNDLED_PACKAGES.contains(&name.as_str()) {
            continue;
        }
        if name.starts_with('@') {
            for scoped in std::fs::read_dir(entry.path())? {
                let scoped = scoped?;
                packages.push(format!("{name}/{}", scoped.file_name().to_string_lossy()));
            }
        } else {
            packages.push(name);
        }
    }
    packages.sort();
    Ok(packages)
}

fn copy_packages(from: &Path, to: &Path, packages: &[String]) -> io::Result<()> {
    for package in packages {
        let destination = to.join(package);
        if destination.exists() {
            continue;
        }
        copy_dir(&from.join(package), &destination)?;
    }
    Ok(())
}

/// Recreate the executable links global packages placed in `from` under
/// `to`, leaving node's own commands alone.
fn relink_bins(from: &Path, to: &Path) -> io::Result<()> {
    let entries = match std::fs::read_dir(from) {
        Ok(entries) => entries,
        Err(error) if error.kind() == io::ErrorKind::NotFound => return Ok(()),
        Err(error) => return Err(error),
    };

    for entry in entries {
        let entry = entry?;
        let name = entry.file_name();
        let name_str = name.to_string_lossy();
        if BINS.contains(&name_str.as_ref()) || BUNDLED_PACKAGES.contains(&name_str.as_ref()) {
            continue;
        }
        if !entry.file_type()?.is_symlink() {
            continue;
        }
        let link = to.join(&name);
        if link.symlink_metadata().is_ok() {
            warn!("Keeping existing {}", link.display());
            continue;
        }
        let target = std::fs::read_link(entry.path())?;
        symlink(&target, &link)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use eclectica_backend::EventSink;
    use eclectica_platform::AppPaths;

    fn backend(root: &Path) -> NodeBackend {
        NodeBackend::new(BackendContext::new(
            AppPaths::with_root(root),
            reqwest::Client::new(),
            EventSink::disabled(),
        ))
    }

    fn target(root: &Path, version: Version) -> InstallTarget {
        let paths = AppPaths::with_root(root);
        InstallTarget {
            language: Language::Node,
            destination: paths.version_dir("node", &version.to_string()),
            archive_path: root.join("node.tar.gz"),
            info: InfoMap::new(),
            version,
        }
    }

    #[test]
    fn info_uses_dist_layout() {
        let dir = tempfile::tempdir().unwrap();
        let info = backend(dir.path())
            .with_dist_url("https://mirror.example/node/")
            .info(&Version::new(6, 8, 0))
            .unwrap();

        let filename = format!("node-v6.8.0-{}-{}", node_os(), node_arch());
        assert_eq!(info.filename(), Some(filename.as_str()));
        assert_eq!(
            info.url(),
            Some(format!("https://mirror.example/node/v6.8.0/{filename}.tar.gz").as_str())
        );
    }

    #[tokio::test]
    async fn list_remote_reads_index_with_lts_codenames() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/index.json")
            .with_status(200)
            .with_body(
                r#"[
                    {"version": "v20.11.0", "lts": "Iron"},
                    {"version": "v21.6.0", "lts": false},
                    {"version": "v0.10.48", "lts": false},
                    {"version": "v0.8.28", "lts": false}
                ]"#,
            )
            .create_async()
            .await;

        let dir = tempfile::tempdir().unwrap();
        let remote = backend(dir.path())
            .with_dist_url(server.url())
            .list_remote()
            .await
            .unwrap();

        assert_eq!(
            remote,
            vec![
                RemoteVersion::new("20.11.0").with_lts("Iron"),
                RemoteVersion::new("21.6.0"),
                RemoteVersion::new("0.10.48"),
            ]
        );
    }

    #[tokio::test]
    async fn list_remote_without_connection() {
        let dir = tempfile::tempdir().unwrap();
        let error = backend(dir.path())
            .with_dist_url("http://127.0.0.1:1")
            .list_remote()
            .await
            .unwrap_err();
        assert!(error.is_connection());
    }

    #[test]
    fn checksums_live_next_to_archives() {
        let dir = tempfile::tempdir().unwrap();
        let backend = backend(dir.path());
        let target = target(dir.path(), Version::new(20, 11, 0));
        assert_eq!(
            backend.checksums_url(&target).as_deref(),
            Some("https://nodejs.org/dist/v20.11.0/SHASUMS256.txt")
        );
    }

    #[tokio::test]
    async fn post_install_writes_npmrc() {
        let dir = tempfile::tempdir().unwrap();
        let target = target(dir.path(), Version::new(6, 8, 0));
        std::fs::create_dir_all(&target.destination).unwrap();

        backend(dir.path()).post_install(&target).await.unwrap();

        let npmrc = std::fs::read_to_string(target.destination.join("etc/npmrc")).unwrap();
        assert_eq!(npmrc, "scripts-prepend-node-path=false\n");
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn switch_copies_modules_within_major() {
        let dir = tempfile::tempdir().unwrap();
        let paths = AppPaths::with_root(dir.path());
        let old = paths.version_dir("node", "6.3.1");
        let old_modules = old.join("lib/node_modules");
        std::fs::create_dir_all(old_modules.join("npm")).unwrap();
        std::fs::create_dir_all(old_modules.join("eslint/bin")).unwrap();
        std::fs::write(old_modules.join("eslint/bin/eslint.js"), "").unwrap();
        std::fs::create_dir_all(old_modules.join("@babel/cli")).unwrap();
        std::fs::create_dir_all(old.join("bin")).unwrap();
        std::os::unix::fs::symlink(
            "../lib/node_modules/eslint/bin/eslint.js",
            old.join("bin/eslint"),
        )
        .unwrap();
        symlink(&old, &paths.current_link("node")).unwrap();

        let target = target(dir.path(), Version::new(6, 8, 0));
        std::fs::create_dir_all(target.destination.join("bin")).unwrap();

        let mut backend = backend(dir.path()).with_modules(true);
        backend.pre_download(&target).await.unwrap();
        assert_eq!(backend.previous, Some(Version::new(6, 3, 1)));
        backend.switch(&target).await.unwrap();

        let new_modules = target.destination.join("lib/node_modules");
        assert!(new_modules.join("eslint/bin/eslint.js").is_file());
        assert!(new_modules.join("@babel/cli").is_dir());
        assert!(!new_modules.join("npm").exists());
        assert_eq!(
            std::fs::read_link(target.destination.join("bin/eslint")).unwrap(),
            Path::new("../lib/node_modules/eslint/bin/eslint.js")
        );
    }

    #[tokio::test]
    async fn switch_without_modules_flag_leaves_new_version_alone() {
        let dir = tempfile::tempdir().unwrap();
        let paths = AppPaths::with_root(dir.path());
        let old = paths.version_dir("node", "6.3.1");
        std::fs::create_dir_all(old.join("lib/node_modules/eslint")).unwrap();
        symlink(&old, &paths.current_link("node")).unwrap();

        let target = target(dir.path(), Version::new(6, 8, 0));
        std::fs::create_dir_all(&target.destination).unwrap();

        let mut backend = backend(dir.path());
        backend.pre_download(&target).await.unwrap();
        backend.switch(&target).await.unwrap();

        assert!(!target.destination.join("lib/node_modules/eslint").exists());
    }

    #[test]
    fn global_packages_skip_bundled_and_expand_scopes() {
        let dir = tempfile::tempdir().unwrap();
        for package in ["npm", "corepack", "typescript", "@vue/cli", "@vue/devtools"] {
            std::fs::create_dir_all(dir.path().join(package)).unwrap();
        }

        assert_eq!(
            global_packages(dir.path()).unwrap(),
            vec!["@vue/cli", "@vue/devtools", "typescript"]
        );
        assert!(global_packages(&dir.path().join("missing")).unwrap().is_empty());
    }
}
