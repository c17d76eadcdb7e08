use std::path::{Path, PathBuf};

use futures_util::StreamExt;
use log::{debug, info, warn};
use thiserror::Error;
use tokio::io::AsyncWriteExt;

#[derive(Debug, Error)]
pub enum DownloadError {
    #[error("can't establish connection to {url}: {source}")]
    Connection {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("{url} was not found")]
    NotFound { url: String },

    #[error("unexpected HTTP status {status} for {url}")]
    Status { url: String, status: u16 },

    #[error("{context}: {source}")]
    Http {
        context: &'static str,
        #[source]
        source: reqwest::Error,
    },

    #[error("{context} {}: {source}", path.display())]
    Io {
        context: &'static str,
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("checksum mismatch for {file}")]
    ChecksumMismatch { file: String },

    #[error("no checksum entry found for {file}")]
    ChecksumMissing { file: String },

    #[error("download task failed: {0}")]
    Task(String),
}

impl DownloadError {
    pub(crate) fn io(context: &'static str, path: &Path, source: std::io::Error) -> Self {
        Self::Io {
            context,
            path: path.to_path_buf(),
            source,
        }
    }

    /// Classify a transport error: anything that never reached the server is
    /// a connection problem.
    pub(crate) fn request(url: &str, source: reqwest::Error) -> Self {
        if source.is_connect() || source.is_timeout() {
            Self::Connection {
                url: url.to_string(),
                source,
            }
        } else {
            Self::Http {
                context: "request failed",
                source,
            }
        }
    }

    #[must_use]
    pub fn is_connection(&self) -> bool {
        matches!(self, Self::Connection { .. })
    }
}

async fn get(client: &reqwest::Client, url: &str) -> Result<reqwest::Response, DownloadError> {
    let response = client
        .get(url)
        .send()
        .await
        .map_err(|error| DownloadError::request(url, error))?;

    let status = response.status();
    if status == reqwest::StatusCode::NOT_FOUND {
        return Err(DownloadError::NotFound {
            url: url.to_string(),
        });
    }
    if !status.is_success() {
        return Err(DownloadError::Status {
            url: url.to_string(),
            status: status.as_u16(),
        });
    }

    Ok(response)
}

/// Stream `url` into `dest`, reporting `(downloaded, total)` after every
/// chunk. `total` is zero when the server does not announce a length.
///
/// Data is written to the [`partial_path`] sibling first and renamed into
/// place once complete; a failed transfer removes the partial file.
///
/// # Errors
/// Returns [`DownloadError::NotFound`] on HTTP 404,
/// [`DownloadError::Connection`] when the server cannot be reached, and I/O
/// errors for the destination file.
pub async fn download_file(
    client: &reqwest::Client,
    url: &str,
    dest: &Path,
    progress: impl FnMut(u64, u64) + Send,
) -> Result<u64, DownloadError> {
    info!("Downloading {url}");
    let response = get(client, url).await?;

    if let Some(parent) = dest.parent() {
        tokio::fs::create_dir_all(parent)
            .await
            .map_err(|error| DownloadError::io("failed to create download directory", parent, error))?;
    }

    let partial = partial_path(dest);
    let result = match write_partial(response, &partial, progress).await {
        Ok(downloaded) => tokio::fs::rename(&partial, dest)
            .await
            .map(|()| downloaded)
            .map_err(|error| DownloadError::io("failed to move download into place", dest, error)),
        Err(error) => Err(error),
    };

    match result {
        Ok(downloaded) => {
            debug!("Downloaded {downloaded} bytes to {}", dest.display());
            Ok(downloaded)
        }
        Err(error) => {
            if let Err(cleanup) = tokio::fs::remove_file(&partial).await
                && cleanup.kind() != std::io::ErrorKind::NotFound
            {
                warn!("Failed to remove {}: {cleanup}", partial.display());
            }
            Err(error)
        }
    }
}

async fn write_partial(
    response: reqwest::Response,
    partial: &Path,
    mut progress: impl FnMut(u64, u64) + Send,
) -> Result<u64, DownloadError> {
    let total = response.content_length().unwrap_or(0);
    let mut downloaded: u64 = 0;

    let mut file = tokio::fs::File::create(partial)
        .await
        .map_err(|error| DownloadError::io("failed to create download file", partial, error))?;

    let mut stream = response.bytes_stream();
    while let Some(chunk) = stream.next().await {
        let chunk = chunk.map_err(|error| DownloadError::Http {
            context: "download stream error",
            source: error,
        })?;
        file.write_all(&chunk)
            .await
            .map_err(|error| DownloadError::io("failed to write download data", partial, error))?;
        downloaded += chunk.len() as u64;
        progress(downloaded, total);
    }

    file.flush()
        .await
        .map_err(|error| DownloadError::io("failed to flush download file", partial, error))?;
    Ok(downloaded)
}

/// Fetch a small text document such as a listing page or checksum file.
///
/// # Errors
/// Same classification as [`download_file`].
pub async fn fetch_text(client: &reqwest::Client, url: &str) -> Result<String, DownloadError> {
    debug!("Fetching {url}");
    get(client, url)
        .await?
        .text()
        .await
        .map_err(|error| DownloadError::Http {
            context: "failed to read response body",
            source: error,
        })
}

/// Where [`download_file`] keeps an unfinished transfer for `dest`.
#[must_use]
pub fn partial_path(dest: &Path) -> PathBuf {
    let mut name = dest.as_os_str().to_owned();
    name.push(".part");
    PathBuf::from(name)
}
