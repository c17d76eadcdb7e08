use std::path::{Path, PathBuf};

use log::{debug, info, warn};

use eclectica_backend::{
    BackendError, InfoMap, InstallEvent, InstallPhase, InstallTarget, Language, LanguageBackend,
    Version, keys,
};
use eclectica_core::{
    ArchiveFormat, DownloadError, decompress_gz, download_file, extract_tar_gz, partial_path,
    verify_checksum,
};
use eclectica_platform::{AppPaths, list_versions, remove_path, symlink, write_version_file};
use eclectica_plugins::Backend;
use eclectica_versions::{Alias, is_partial, resolve};

use crate::error::EngineError;
use crate::installed::{is_installed, mark_installed};
use crate::proxy::{install_proxies, remove_proxies};

const DEFAULT_EXTENSION: &str = "tar.gz";

/// Where a switch makes the version active.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InstallMode {
    /// Repoint the global `current` symlink.
    Global,
    /// Write the language dotfile into `dir`.
    Local { dir: PathBuf },
}

/// Turn user input (full, partial or an alias) into a concrete version.
///
/// Full versions are taken as given; the download reports versions that do
/// not exist upstream. Partial input and aliases consult the remote listing.
///
/// # Errors
/// [`EngineError::VersionNotDefined`] for empty input,
/// [`EngineError::IncorrectVersion`] for input that matches nothing, and
/// listing failures from the backend.
pub async fn resolve_version<B: LanguageBackend>(
    backend: &B,
    input: &str,
) -> Result<Version, EngineError> {
    let input = input.trim();
    if input.is_empty() {
        return Err(EngineError::VersionNotDefined);
    }

    if Alias::from_input(input).is_some() || is_partial(input) {
        let remote = backend.list_remote().await?;
        let version = resolve(input, &remote)?;
        info!("Resolved {} {input} to {version}", backend.language());
        return Ok(version);
    }

    Version::from_native(input).map_err(|_| EngineError::IncorrectVersion {
        version: input.to_string(),
    })
}

/// One installation of one concrete version, threading the backend, its
/// Info Map and what rollback needs to know.
pub struct Attempt<B: LanguageBackend = Backend> {
    backend: B,
    paths: AppPaths,
    target: InstallTarget,
    previous_pointer: Option<PathBuf>,
    pointer_changed: bool,
}

impl<B: LanguageBackend> Attempt<B> {
    /// Bind `backend` to `version` and freeze the Info Map.
    ///
    /// # Errors
    /// Returns the backend's error when it cannot describe the download.
    pub fn new(backend: B, version: Version) -> Result<Self, EngineError> {
        let language = backend.language();
        let paths = backend.context().paths.clone();
        let mut info = backend.info(&version)?;
        fill_defaults(&mut info, language, &version, &paths);

        let destination = PathBuf::from(info.get(keys::DESTINATION_FOLDER).unwrap_or_default());
        let archive_path = PathBuf::from(info.get(keys::ARCHIVE_PATH).unwrap_or_default());
        debug!("Info for {language} {version}: {info:?}");

        Ok(Self {
            backend,
            paths,
            target: InstallTarget {
                language,
                version,
                info,
                destination,
                archive_path,
            },
            previous_pointer: None,
            pointer_changed: false,
        })
    }

    #[must_use]
    pub fn language(&self) -> Language {
        self.target.language
    }

    #[must_use]
    pub fn version(&self) -> &Version {
        &self.target.version
    }

    #[must_use]
    pub fn info(&self) -> &InfoMap {
        &self.target.info
    }

    #[must_use]
    pub fn target(&self) -> &InstallTarget {
        &self.target
    }

    #[must_use]
    pub fn backend(&self) -> &B {
        &self.backend
    }

    #[must_use]
    pub fn paths(&self) -> &AppPaths {
        &self.paths
    }

    #[must_use]
    pub fn is_installed(&self) -> bool {
        is_installed(&self.target.destination)
    }

    fn prefix(&self) -> PathBuf {
        self.paths.language_prefix(self.language().name())
    }

    fn current_link(&self) -> PathBuf {
        self.paths.current_link(self.language().name())
    }

    /// Whether a global pointer exists for this language.
    #[must_use]
    pub fn has_global_pointer(&self) -> bool {
        self.current_link().symlink_metadata().is_ok()
    }

    /// Remember the global pointer for rollback, then run the backend hook.
    ///
    /// # Errors
    /// Propagates the backend hook's error.
    pub async fn pre_download(&mut self) -> Result<(), EngineError> {
        self.previous_pointer = std::fs::read_link(self.current_link()).ok();
        self.backend.pre_download(&self.target).await?;
        Ok(())
    }

    /// Fetch the archive. Returns `false` without touching the network when
    /// the destination folder already exists.
    ///
    /// # Errors
    /// [`EngineError::IncorrectVersion`] when upstream has no such archive,
    /// transfer and checksum errors otherwise.
    pub async fn download(&self) -> Result<bool, EngineError> {
        if self.target.destination.exists() {
            debug!(
                "{} already exists, skipping download",
                self.target.destination.display()
            );
            return Ok(false);
        }

        let url = self.target.info.url().ok_or_else(|| BackendError::BackendSpecific {
            context: "download",
            details: format!("no download url for {}", self.target.version),
        })?;

        let events = self.backend.events();
        events.phase(InstallPhase::Download);
        let client = &self.backend.context().client;

        download_file(client, url, &self.target.archive_path, |downloaded, total| {
            events.emit(InstallEvent::Downloading { downloaded, total });
        })
        .await
        .map_err(|error| match error {
            DownloadError::NotFound { .. } => EngineError::IncorrectVersion {
                version: self.target.version.to_string(),
            },
            other => EngineError::Download(other),
        })?;

        if let Some(checksums_url) = self.backend.checksums_url(&self.target) {
            let asset = self
                .target
                .archive_path
                .file_name()
                .map(|name| name.to_string_lossy().into_owned())
                .unwrap_or_default();
            if let Err(error) =
                verify_checksum(client, &checksums_url, &asset, &self.target.archive_path).await
            {
                remove_quietly(&self.target.archive_path);
                return Err(error.into());
            }
        }

        Ok(true)
    }

    /// Unpack the archive into the language prefix and move the unpacked
    /// directory to the destination. Stale leftovers of earlier attempts are
    /// removed first, so running it twice is safe.
    ///
    /// # Errors
    /// Archive and filesystem errors.
    pub async fn extract(&self) -> Result<(), EngineError> {
        self.backend.events().phase(InstallPhase::Extract);

        let prefix = self.prefix();
        let unarchive_name = self
            .target
            .info
            .unarchive_filename()
            .unwrap_or_default()
            .to_string();
        let staging = prefix.join(&unarchive_name);
        let destination = self.target.destination.clone();
        let archive = self.target.archive_path.clone();
        let format = ArchiveFormat::from_extension(
            self.target.info.extension().unwrap_or(DEFAULT_EXTENSION),
        )?;
        let binary_name = self
            .target
            .info
            .get(keys::NAME)
            .unwrap_or(self.language().name())
            .to_string();

        tokio::task::spawn_blocking(move || -> Result<(), EngineError> {
            for stale in [&staging, &destination] {
                remove_path(stale)
                    .map_err(|error| EngineError::io("failed to remove stale directory", stale, error))?;
            }
            std::fs::create_dir_all(&prefix)
                .map_err(|error| EngineError::io("failed to create prefix", &prefix, error))?;

            match format {
                ArchiveFormat::TarGz => extract_tar_gz(&archive, &prefix)?,
                ArchiveFormat::Gz => {
                    decompress_gz(&archive, &staging.join("bin").join(&binary_name))?;
                }
            }

            if staging != destination {
                std::fs::rename(&staging, &destination)
                    .map_err(|error| EngineError::io("failed to move unpacked files", &staging, error))?;
            }
            Ok(())
        })
        .await
        .map_err(|error| EngineError::Task(error.to_string()))??;

        debug!("Extracted into {}", self.target.destination.display());
        Ok(())
    }

    /// # Errors
    /// Propagates the backend hook's error.
    pub async fn pre_install(&mut self) -> Result<(), EngineError> {
        if self.is_installed() {
            return Ok(());
        }
        self.backend.pre_install(&self.target).await?;
        Ok(())
    }

    /// # Errors
    /// Propagates the backend's build errors.
    pub async fn install(&self) -> Result<(), EngineError> {
        self.backend.install(&self.target).await?;
        Ok(())
    }

    /// Install missing proxies, run the backend hook and mark the version
    /// as installed.
    ///
    /// # Errors
    /// Proxy, backend and marker errors.
    pub async fn post_install(&self) -> Result<(), EngineError> {
        if self.is_installed() {
            return Ok(());
        }
        self.backend.events().phase(InstallPhase::PostInstall);
        install_proxies(&self.paths, self.backend.bins())?;
        self.backend.post_install(&self.target).await?;
        mark_installed(&self.target.destination)
    }

    /// Point the global symlink at this version and create backend links.
    ///
    /// # Errors
    /// Filesystem and backend errors.
    pub async fn link(&mut self) -> Result<(), EngineError> {
        self.backend.events().phase(InstallPhase::Link);
        self.point_global()?;
        self.backend.link(&self.target).await?;
        Ok(())
    }

    /// Make this version the active one and let the backend migrate state.
    ///
    /// The local dotfile is written only once the backend hook succeeded; a
    /// repointed global link is left for [`Attempt::restore_pointer`].
    ///
    /// # Errors
    /// Filesystem and backend errors.
    pub async fn switch(&mut self, mode: &InstallMode) -> Result<(), EngineError> {
        self.backend.events().phase(InstallPhase::Switch);
        install_proxies(&self.paths, self.backend.bins())?;

        match mode {
            InstallMode::Global => {
                self.point_global()?;
                self.backend.switch(&self.target).await?;
            }
            InstallMode::Local { dir } => {
                self.backend.switch(&self.target).await?;
                let name = self.language().local_dotfile();
                let path = write_version_file(dir, &name, &self.target.version.to_string())
                    .map_err(|error| EngineError::io("failed to write version file", &dir.join(&name), error))?;
                info!("Wrote {}", path.display());
            }
        }
        Ok(())
    }

    fn point_global(&mut self) -> Result<(), EngineError> {
        let link = self.current_link();
        symlink(&self.target.destination, &link)
            .map_err(|error| EngineError::io("failed to update global version", &link, error))?;
        self.pointer_changed = true;
        info!("{} {} is now the global version", self.language(), self.version());
        Ok(())
    }

    /// Point the global link back to where it was before this attempt, if
    /// the attempt moved it.
    pub fn restore_pointer(&self) {
        if !self.pointer_changed {
            return;
        }
        let link = self.current_link();
        let restored = match &self.previous_pointer {
            Some(previous) if previous.exists() => symlink(previous, &link),
            _ => remove_path(&link),
        };
        match restored {
            Ok(()) => debug!("Restored {}", link.display()),
            Err(error) => warn!("Failed to restore {}: {error}", link.display()),
        }
    }

    /// Undo a failed or interrupted fresh install. Never fails; problems are
    /// logged.
    pub async fn rollback(&self) {
        warn!("Rolling back {} {}", self.language(), self.version());

        remove_quietly(&self.target.destination);
        if let Some(staging) = self.target.info.unarchive_filename() {
            let staging = self.prefix().join(staging);
            if staging != self.target.destination {
                remove_quietly(&staging);
            }
        }
        remove_quietly(&self.target.archive_path);
        remove_quietly(&partial_path(&self.target.archive_path));

        self.backend.rollback(&self.target).await;

        self.restore_pointer();

        let prefix = self.prefix();
        let remaining = list_versions(&prefix).unwrap_or_default();
        if remaining.is_empty() {
            debug!("No {} versions left, removing proxies", self.language());
            remove_proxies(&self.paths, self.backend.bins());
            remove_quietly(&prefix);
        }

        self.backend.events().emit(InstallEvent::RolledBack {
            language: self.language(),
            version: self.target.version.clone(),
        });
    }

    pub(crate) fn clean_archive(&self) {
        remove_quietly(&self.target.archive_path);
    }
}

fn fill_defaults(info: &mut InfoMap, language: Language, version: &Version, paths: &AppPaths) {
    info.insert_default(keys::NAME, language.name());
    info.insert_default(keys::VERSION, version.to_string());
    info.insert_default(keys::FILENAME, format!("{language}-{version}"));
    info.insert_default(keys::EXTENSION, DEFAULT_EXTENSION);

    let filename = info.filename().unwrap_or_default().to_string();
    info.insert_default(keys::UNARCHIVE_FILENAME, filename.clone());
    info.insert_default(
        keys::DESTINATION_FOLDER,
        paths
            .version_dir(language.name(), &version.to_string())
            .to_string_lossy(),
    );
    info.insert_default(keys::ARCHIVE_FOLDER, paths.temp_dir().to_string_lossy());

    let extension = info.extension().unwrap_or(DEFAULT_EXTENSION).to_string();
    let archive_folder = PathBuf::from(info.get(keys::ARCHIVE_FOLDER).unwrap_or_default());
    info.insert_default(
        keys::ARCHIVE_PATH,
        archive_folder
            .join(format!("{filename}.{extension}"))
            .to_string_lossy(),
    );
}

fn remove_quietly(path: &Path) {
    if let Err(error) = remove_path(path) {
        warn!("Failed to remove {}: {error}", path.display());
    }
}
