use std::fs::File;
use std::path::{Path, PathBuf};

use flate2::read::GzDecoder;
use log::debug;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ArchiveError {
    #[error("{context} {}: {source}", path.display())]
    Io {
        context: &'static str,
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("unsupported archive extension \"{0}\"")]
    Unsupported(String),
}

impl ArchiveError {
    fn io(context: &'static str, path: &Path, source: std::io::Error) -> Self {
        Self::Io {
            context,
            path: path.to_path_buf(),
            source,
        }
    }
}

/// Archive layouts published by the supported upstreams.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArchiveFormat {
    TarGz,
    /// A single gzip-compressed executable.
    Gz,
}

impl ArchiveFormat {
    /// # Errors
    /// Returns [`ArchiveError::Unsupported`] for unknown extensions.
    pub fn from_extension(extension: &str) -> Result<Self, ArchiveError> {
        match extension.trim_start_matches('.') {
            "tar.gz" | "tgz" => Ok(Self::TarGz),
            "gz" => Ok(Self::Gz),
            other => Err(ArchiveError::Unsupported(other.to_string())),
        }
    }
}

/// Unpack a gzip-compressed tarball into `dest`.
///
/// Entries that would escape `dest` are skipped by `tar`.
///
/// # Errors
/// Returns an error if the archive cannot be read or an entry cannot be
/// written.
pub fn extract_tar_gz(archive_path: &Path, dest: &Path) -> Result<(), ArchiveError> {
    let file = File::open(archive_path)
        .map_err(|error| ArchiveError::io("failed to open archive", archive_path, error))?;
    std::fs::create_dir_all(dest)
        .map_err(|error| ArchiveError::io("failed to create extraction directory", dest, error))?;

    let mut archive = tar::Archive::new(GzDecoder::new(file));
    archive.set_preserve_permissions(true);
    archive.set_overwrite(true);
    archive
        .unpack(dest)
        .map_err(|error| ArchiveError::io("failed to unpack archive", archive_path, error))?;

    debug!("Extraction complete to {}", dest.display());
    Ok(())
}

/// Decompress a single gzip-compressed executable to `dest_file` and mark
/// it executable.
///
/// # Errors
/// Returns an error if the archive cannot be read or the output written.
pub fn decompress_gz(archive_path: &Path, dest_file: &Path) -> Result<(), ArchiveError> {
    let file = File::open(archive_path)
        .map_err(|error| ArchiveError::io("failed to open archive", archive_path, error))?;
    if let Some(parent) = dest_file.parent() {
        std::fs::create_dir_all(parent).map_err(|error| {
            ArchiveError::io("failed to create extraction directory", parent, error)
        })?;
    }

    let mut decoder = GzDecoder::new(file);
    let mut output = File::create(dest_file)
        .map_err(|error| ArchiveError::io("failed to create extracted file", dest_file, error))?;
    std::io::copy(&mut decoder, &mut output)
        .map_err(|error| ArchiveError::io("failed to decompress archive", archive_path, error))?;

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        std::fs::set_permissions(dest_file, std::fs::Permissions::from_mode(0o755)).map_err(
            |error| ArchiveError::io("failed to mark file executable", dest_file, error),
        )?;
    }

    debug!("Decompressed {}", dest_file.display());
    Ok(())
}
