use std::io::Read;
use std::path::Path;

use log::info;
use sha2::{Digest, Sha256};

use crate::download::{DownloadError, fetch_text};

/// Look up `asset_name` in a `sha256sum`-style listing.
#[must_use]
pub fn parse_expected_checksum(checksums: &str, asset_name: &str) -> Option<String> {
    checksums.lines().find_map(|line| {
        let mut parts = line.split_whitespace();
        let hash = parts.next()?;
        let name = parts
            .next()?
            .trim_start_matches('*')
            .trim_start_matches("./");
        if name == asset_name {
            Some(hash.to_ascii_lowercase())
        } else {
            None
        }
    })
}

/// Hex-encoded SHA-256 of a file.
///
/// # Errors
/// Returns an error if the file cannot be read.
pub fn sha256_file(path: &Path) -> Result<String, DownloadError> {
    let mut file = std::fs::File::open(path)
        .map_err(|error| DownloadError::io("failed to open file for checksum", path, error))?;
    let mut hasher = Sha256::new();
    let mut buffer = [0_u8; 8192];

    loop {
        let read = file
            .read(&mut buffer)
            .map_err(|error| DownloadError::io("failed to read file for checksum", path, error))?;
        if read == 0 {
            break;
        }
        hasher.update(&buffer[..read]);
    }

    Ok(format!("{:x}", hasher.finalize()))
}

/// Download the checksum list at `checksums_url` and compare the entry for
/// `asset_name` with the SHA-256 of `downloaded_path`.
///
/// # Errors
/// Returns [`DownloadError::ChecksumMissing`] when the list has no entry for
/// the asset and [`DownloadError::ChecksumMismatch`] when the hashes differ.
pub async fn verify_checksum(
    client: &reqwest::Client,
    checksums_url: &str,
    asset_name: &str,
    downloaded_path: &Path,
) -> Result<(), DownloadError> {
    let checksums = fetch_text(client, checksums_url).await?;
    let expected = parse_expected_checksum(&checksums, asset_name).ok_or_else(|| {
        DownloadError::ChecksumMissing {
            file: asset_name.to_string(),
        }
    })?;
    let path = downloaded_path.to_path_buf();
    let actual = tokio::task::spawn_blocking(move || sha256_file(&path))
        .await
        .map_err(|error| DownloadError::Task(error.to_string()))??;

    if actual.eq_ignore_ascii_case(&expected) {
        info!("Checksum verified for {asset_name}");
        Ok(())
    } else {
        Err(DownloadError::ChecksumMismatch {
            file: asset_name.to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // sha256("hello")
    const HELLO: &str = "2cf24dba5fb0a30e26e83b2ac5b9e29e1b161e5c1fa7425e73043362938b9824";

    #[test]
    fn parse_expected_checksum_handles_prefixes() {
        let listing = format!(
            "{HELLO}  node-v6.8.0-linux-x64.tar.gz\n\
             ABCDEF *./node-v6.8.0-darwin-x64.tar.gz\n"
        );

        assert_eq!(
            parse_expected_checksum(&listing, "node-v6.8.0-linux-x64.tar.gz").as_deref(),
            Some(HELLO)
        );
        assert_eq!(
            parse_expected_checksum(&listing, "node-v6.8.0-darwin-x64.tar.gz").as_deref(),
            Some("abcdef")
        );
        assert_eq!(parse_expected_checksum(&listing, "node.zip"), None);
    }

    #[test]
    fn sha256_file_matches_known_digest() {
        let temp = tempfile::tempdir().unwrap();
        let path = temp.path().join("file");
        std::fs::write(&path, "hello").unwrap();

        assert_eq!(sha256_file(&path).unwrap(), HELLO);
    }

    #[tokio::test]
    async fn verify_checksum_accepts_match_and_rejects_mismatch() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/SHASUMS256.txt")
            .with_body(format!("{HELLO}  good.tar.gz\n{HELLO}  bad.tar.gz\n"))
            .create_async()
            .await;
        let url = format!("{}/SHASUMS256.txt", server.url());

        let temp = tempfile::tempdir().unwrap();
        let good = temp.path().join("good.tar.gz");
        let bad = temp.path().join("bad.tar.gz");
        std::fs::write(&good, "hello").unwrap();
        std::fs::write(&bad, "tampered").unwrap();
        let client = reqwest::Client::new();

        verify_checksum(&client, &url, "good.tar.gz", &good)
            .await
            .unwrap();
        assert!(matches!(
            verify_checksum(&client, &url, "bad.tar.gz", &bad).await,
            Err(DownloadError::ChecksumMismatch { .. })
        ));
        assert!(matches!(
            verify_checksum(&client, &url, "other.tar.gz", &good).await,
            Err(DownloadError::ChecksumMissing { .. })
        ));
    }
}
