use std::fs::{File, OpenOptions};
use std::io::{Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};

use fs2::FileExt;
use log::debug;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum LockError {
    #[error("another eclectica process is already working on {language}")]
    Locked { language: String },
    #[error("{context}: {source}")]
    Io {
        context: &'static str,
        #[source]
        source: std::io::Error,
    },
}

impl LockError {
    fn io(context: &'static str, source: std::io::Error) -> Self {
        Self::Io { context, source }
    }
}

/// Advisory per-language lock held for the duration of an install or
/// removal. Released when dropped.
#[derive(Debug)]
pub struct LanguageLock {
    _file: File,
    path: PathBuf,
}

impl LanguageLock {
    /// # Errors
    /// Returns [`LockError::Locked`] when another process holds the lock.
    pub fn acquire(path: &Path, language: &str) -> Result<Self, LockError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .map_err(|error| LockError::io("failed to create lock directory", error))?;
        }

        let mut lock_file = OpenOptions::new()
            .create(true)
            .read(true)
            .write(true)
            .truncate(false)
            .open(path)
            .map_err(|error| LockError::io("failed to open lock file", error))?;

        match lock_file.try_lock_exclusive() {
            Ok(()) => {}
            Err(error)
                if error.kind() == std::io::ErrorKind::WouldBlock
                    || error.raw_os_error() == fs2::lock_contended_error().raw_os_error() =>
            {
                return Err(LockError::Locked {
                    language: language.to_string(),
                });
            }
            Err(error) => return Err(LockError::io("failed to acquire lock", error)),
        }

        lock_file
            .set_len(0)
            .and_then(|()| lock_file.seek(SeekFrom::Start(0)).map(|_| ()))
            .and_then(|()| writeln!(lock_file, "{}", std::process::id()))
            .map_err(|error| LockError::io("failed to write lock metadata", error))?;

        debug!("Acquired {language} lock at {}", path.display());
        Ok(Self {
            _file: lock_file,
            path: path.to_path_buf(),
        })
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }
}
