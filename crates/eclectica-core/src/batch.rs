use std::path::PathBuf;
use std::time::Duration;

use log::{debug, warn};
use tokio::task::JoinHandle;

use crate::download::{DownloadError, download_file};

/// How often the batch checks its transfers for completion.
pub const POLL_INTERVAL: Duration = Duration::from_millis(200);

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BatchItem {
    pub url: String,
    pub dest: PathBuf,
}

impl BatchItem {
    #[must_use]
    pub fn new(url: impl Into<String>, dest: impl Into<PathBuf>) -> Self {
        Self {
            url: url.into(),
            dest: dest.into(),
        }
    }
}

/// Download every item concurrently and return the destinations in input
/// order.
///
/// Completion is checked every [`POLL_INTERVAL`]. The first failure ends
/// the batch; transfers still running at that point are left to finish in
/// the background and their results are discarded.
///
/// # Errors
/// Returns the first transfer error observed.
pub async fn download_batch(
    client: &reqwest::Client,
    items: Vec<BatchItem>,
) -> Result<Vec<PathBuf>, DownloadError> {
    debug!("Starting batch of {} downloads", items.len());

    let mut pending: Vec<(usize, JoinHandle<Result<PathBuf, DownloadError>>)> = items
        .into_iter()
        .enumerate()
        .map(|(index, item)| {
            let client = client.clone();
            let handle = tokio::spawn(async move {
                download_file(&client, &item.url, &item.dest, |_, _| {}).await?;
                Ok(item.dest)
            });
            (index, handle)
        })
        .collect();

    let mut finished: Vec<Option<PathBuf>> = vec![None; pending.len()];
    let mut ticker = tokio::time::interval(POLL_INTERVAL);

    while !pending.is_empty() {
        ticker.tick().await;

        let mut position = 0;
        while position < pending.len() {
            if !pending[position].1.is_finished() {
                position += 1;
                continue;
            }

            let (index, handle) = pending.swap_remove(position);
            match handle.await {
                Ok(Ok(path)) => finished[index] = Some(path),
                Ok(Err(error)) => {
                    warn!(
                        "Batch download failed, abandoning {} transfers",
                        pending.len()
                    );
                    return Err(error);
                }
                Err(error) => return Err(DownloadError::Task(error.to_string())),
            }
        }
    }

    Ok(finished.into_iter().flatten().collect())
}
