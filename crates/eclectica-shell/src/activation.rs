use std::ffi::OsString;
use std::path::{Path, PathBuf};

use log::debug;
use thiserror::Error;

use eclectica_backend::{Language, Version};
use eclectica_engine::{EngineError, current_version, installed_versions};
use eclectica_platform::{AppPaths, find_dotfile, read_version_file};
use eclectica_versions::{complete, is_partial};

#[derive(Error, Debug)]
pub enum ActivationError {
    #[error("{} does not name a {language} version", path.display())]
    Malformed { language: Language, path: PathBuf },

    #[error("{language} {version} from {} is not installed", path.display())]
    NotInstalled {
        language: Language,
        version: String,
        path: PathBuf,
    },

    #[error("{context} {}: {source}", path.display())]
    Io {
        context: &'static str,
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error(transparent)]
    Engine(#[from] EngineError),
}

/// Where the active version came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ActiveSource {
    Local(PathBuf),
    Global,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActiveVersion {
    pub version: Version,
    pub source: ActiveSource,
}

/// The version of `language` in effect for `cwd`.
///
/// A dotfile in `cwd` or any ancestor wins over the global pointer, even
/// when it is unusable: an empty or unparsable dotfile is
/// [`ActivationError::Malformed`] and one naming a version that is not
/// installed is [`ActivationError::NotInstalled`]. Partial dotfile versions
/// pick the highest installed match.
pub fn active_version(
    paths: &AppPaths,
    language: Language,
    dots: &[&str],
    cwd: &Path,
) -> Result<Option<ActiveVersion>, ActivationError> {
    let Some(dotfile) = find_dotfile(cwd, dots) else {
        return Ok(current_version(paths, language).map(|version| ActiveVersion {
            version,
            source: ActiveSource::Global,
        }));
    };
    debug!("Using {} for {language}", dotfile.display());

    let requested = read_version_file(&dotfile).map_err(|source| ActivationError::Io {
        context: "failed to read version file",
        path: dotfile.clone(),
        source,
    })?;
    let malformed = || ActivationError::Malformed {
        language,
        path: dotfile.clone(),
    };
    if requested.is_empty() {
        return Err(malformed());
    }

    let installed: Vec<String> = installed_versions(paths, language)?
        .into_iter()
        .map(|installed| installed.version.to_string())
        .collect();

    let version = if is_partial(&requested) {
        complete(&requested, &installed).ok()
    } else {
        let wanted = Version::from_native(&requested).map_err(|_| malformed())?;
        installed
            .iter()
            .any(|name| *name == wanted.to_string())
            .then_some(wanted)
    };

    match version {
        Some(version) => Ok(Some(ActiveVersion {
            version,
            source: ActiveSource::Local(dotfile),
        })),
        None => Err(ActivationError::NotInstalled {
            language,
            version: requested,
            path: dotfile,
        }),
    }
}

/// `PATH` with the proxy directory first and any other occurrence of it
/// dropped.
#[must_use]
pub fn path_with_proxies(paths: &AppPaths, current: Option<OsString>) -> OsString {
    let bin_dir = paths.bin_dir();
    let mut entries = vec![bin_dir.clone()];
    if let Some(current) = current {
        entries.extend(std::env::split_paths(&current).filter(|entry| *entry != bin_dir));
    }
    std::env::join_paths(&entries).unwrap_or_else(|_| bin_dir.into_os_string())
}

/// Render `KEY=VALUE` pairs as shell `export` lines.
#[must_use]
pub fn export_lines(environment: &[String]) -> String {
    environment
        .iter()
        .filter_map(|pair| pair.split_once('='))
        .map(|(key, value)| format!("export {key}=\"{value}\"\n"))
        .collect()
}
