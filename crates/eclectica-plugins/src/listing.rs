use log::debug;
use regex::Regex;
use serde::Deserialize;
use serde::de::DeserializeOwned;

use eclectica_backend::BackendError;
use eclectica_core::fetch_text;

const OPERATION: &str = "remote listing";

#[derive(Debug, Clone, Deserialize)]
pub(crate) struct GitHubRelease {
    pub tag_name: String,
    #[serde(default)]
    pub draft: bool,
    #[serde(default)]
    pub prerelease: bool,
}

pub(crate) async fn fetch_listing(
    client: &reqwest::Client,
    url: &str,
) -> Result<String, BackendError> {
    fetch_text(client, url)
        .await
        .map_err(|error| BackendError::from_download(OPERATION, &error))
}

pub(crate) async fn fetch_json<T: DeserializeOwned>(
    client: &reqwest::Client,
    url: &str,
) -> Result<T, BackendError> {
    let body = fetch_listing(client, url).await?;
    serde_json::from_str(&body).map_err(|error| BackendError::network_parse_from(OPERATION, error))
}

const MAX_RELEASE_PAGES: usize = 50;

/// Published release tags of a GitHub repository, drafts and prereleases
/// left out. Follows the `Link: rel="next"` chain across pages.
pub(crate) async fn github_tags(
    client: &reqwest::Client,
    api_base: &str,
    repo: &str,
) -> Result<Vec<String>, BackendError> {
    let mut next = Some(format!("{api_base}/repos/{repo}/releases?per_page=100"));
    let mut tags = Vec::new();
    let mut pages = 0;

    while let Some(url) = next.take() {
        let response = client
            .get(&url)
            .header("User-Agent", "eclectica")
            .header("Accept", "application/vnd.github+json")
            .send()
            .await
            .and_then(reqwest::Response::error_for_status)
            .map_err(|error| {
                if error.is_connect() || error.is_timeout() {
                    BackendError::Connection {
                        operation: OPERATION,
                        details: error.to_string(),
                    }
                } else {
                    BackendError::network_request(OPERATION, error.to_string())
                }
            })?;

        pages += 1;
        if pages < MAX_RELEASE_PAGES {
            next = response
                .headers()
                .get(reqwest::header::LINK)
                .and_then(|value| value.to_str().ok())
                .and_then(next_page);
        }

        let body = response
            .text()
            .await
            .map_err(|error| BackendError::network_parse_from(OPERATION, error))?;
        let releases: Vec<GitHubRelease> = serde_json::from_str(&body)
            .map_err(|error| BackendError::network_parse_from(OPERATION, error))?;

        tags.extend(
            releases
                .into_iter()
                .filter(|release| !release.draft && !release.prerelease)
                .map(|release| release.tag_name),
        );
    }

    debug!("{repo} has {} published releases over {pages} pages", tags.len());
    Ok(tags)
}

/// Target of the `rel="next"` entry of a `Link` header.
fn next_page(link: &str) -> Option<String> {
    link.split(',').find_map(|entry| {
        let (target, params) = entry.split_once(';')?;
        params
            .split(';')
            .any(|param| param.trim() == r#"rel="next""#)
            .then(|| {
                target
                    .trim()
                    .trim_start_matches('<')
                    .trim_end_matches('>')
                    .to_string()
            })
    })
}

/// Every `href` target on an HTML index page matching `pattern`, using its
/// first capture group.
pub(crate) fn scrape_links(page: &str, pattern: &str) -> Result<Vec<String>, BackendError> {
    let regex = Regex::new(pattern).map_err(|error| BackendError::network_parse_from(OPERATION, error))?;
    Ok(regex
        .captures_iter(page)
        .filter_map(|captures| captures.get(1))
        .map(|capture| capture.as_str().to_string())
        .collect())
}
