use std::path::Path;

use chrono::{DateTime, Utc};
use log::trace;

use eclectica_backend::{InstalledVersion, Language, Version};
use eclectica_platform::{AppPaths, list_versions, read_link_version};

use crate::error::EngineError;

/// Written into a version directory once post-install has finished.
pub const INSTALLED_MARKER: &str = ".ec-installed";

/// Whether `dir` holds a finished installation. Always read from disk.
#[must_use]
pub fn is_installed(dir: &Path) -> bool {
    dir.join(INSTALLED_MARKER).is_file()
}

pub(crate) fn mark_installed(dir: &Path) -> Result<(), EngineError> {
    let marker = dir.join(INSTALLED_MARKER);
    std::fs::write(&marker, Utc::now().to_rfc3339())
        .map_err(|error| EngineError::io("failed to write install marker", &marker, error))
}

/// Version the global pointer of `language` refers to.
#[must_use]
pub fn current_version(paths: &AppPaths, language: Language) -> Option<Version> {
    read_link_version(&paths.current_link(language.name()))
}

/// Finished installations of `language`, ascending.
///
/// # Errors
/// Returns an error when the language prefix cannot be read.
pub fn installed_versions(
    paths: &AppPaths,
    language: Language,
) -> Result<Vec<InstalledVersion>, EngineError> {
    let prefix = paths.language_prefix(language.name());
    let current = current_version(paths, language);

    let versions = list_versions(&prefix)
        .map_err(|error| EngineError::io("failed to list installed versions", &prefix, error))?;

    Ok(versions
        .into_iter()
        .filter_map(|version| {
            let dir = prefix.join(version.to_string());
            if !is_installed(&dir) {
                trace!("Skipping unfinished {}", dir.display());
                return None;
            }
            Some(InstalledVersion {
                is_current: current.as_ref() == Some(&version),
                install_date: install_date(&dir),
                version,
            })
        })
        .collect())
}

fn install_date(dir: &Path) -> Option<DateTime<Utc>> {
    std::fs::metadata(dir.join(INSTALLED_MARKER))
        .and_then(|metadata| metadata.modified())
        .ok()
        .map(DateTime::<Utc>::from)
}
