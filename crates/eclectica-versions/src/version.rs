use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

use crate::spelling::semverify;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum VersionError {
    #[error("version was not defined")]
    NotDefined,

    #[error("can't parse version \"{input}\"")]
    Invalid { input: String },

    #[error("version \"{input}\" was not found")]
    NotFound { input: String },
}

impl VersionError {
    pub(crate) fn invalid(input: impl Into<String>) -> Self {
        Self::Invalid {
            input: input.into(),
        }
    }

    pub(crate) fn not_found(input: impl Into<String>) -> Self {
        Self::NotFound {
            input: input.into(),
        }
    }
}

/// A concrete, comparable toolchain version in canonical semver form.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Version(semver::Version);

impl Version {
    #[must_use]
    pub fn new(major: u64, minor: u64, patch: u64) -> Self {
        Self(semver::Version::new(major, minor, patch))
    }

    /// Parse an upstream spelling such as `1.7`, `1.8beta2` or `v6.8.0`.
    ///
    /// # Errors
    /// Returns [`VersionError::Invalid`] when the input cannot be expressed as
    /// a full version.
    pub fn from_native(input: &str) -> Result<Self, VersionError> {
        let canonical = semverify(input);
        semver::Version::parse(&canonical)
            .map(Self)
            .map_err(|_| VersionError::invalid(input.trim()))
    }

    #[must_use]
    pub fn major(&self) -> u64 {
        self.0.major
    }

    #[must_use]
    pub fn minor(&self) -> u64 {
        self.0.minor
    }

    #[must_use]
    pub fn patch(&self) -> u64 {
        self.0.patch
    }

    #[must_use]
    pub fn is_prerelease(&self) -> bool {
        !self.0.pre.is_empty()
    }

    #[must_use]
    pub fn pre(&self) -> &str {
        self.0.pre.as_str()
    }

    #[must_use]
    pub fn as_semver(&self) -> &semver::Version {
        &self.0
    }
}

impl Ord for Version {
    fn cmp(&self, other: &Self) -> Ordering {
        self.0.cmp(&other.0)
    }
}

impl PartialOrd for Version {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl fmt::Display for Version {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for Version {
    type Err = VersionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        let trimmed = trimmed.strip_prefix('v').unwrap_or(trimmed);
        semver::Version::parse(trimmed)
            .map(Self)
            .map_err(|_| VersionError::invalid(trimmed))
    }
}

impl From<semver::Version> for Version {
    fn from(version: semver::Version) -> Self {
        Self(version)
    }
}

/// One entry of a backend's remote listing, in the upstream spelling.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteVersion {
    pub name: String,
    pub lts_codename: Option<String>,
}

impl RemoteVersion {
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            lts_codename: None,
        }
    }

    #[must_use]
    pub fn with_lts(mut self, codename: impl Into<String>) -> Self {
        self.lts_codename = Some(codename.into());
        self
    }

    #[must_use]
    pub fn version(&self) -> Option<Version> {
        Version::from_native(&self.name).ok()
    }
}

impl AsRef<str> for RemoteVersion {
    fn as_ref(&self) -> &str {
        &self.name
    }
}

/// Parse a remote listing, dropping entries that are not versions and
/// collapsing duplicates to their first occurrence.
pub fn parse_listing<S: AsRef<str>>(remote: &[S]) -> Vec<Version> {
    let mut seen = std::collections::HashSet::new();
    let mut parsed = Vec::with_capacity(remote.len());

    for entry in remote {
        match Version::from_native(entry.as_ref()) {
            Ok(version) => {
                if seen.insert(version.clone()) {
                    parsed.push(version);
                }
            }
            Err(_) => log::trace!("Skipping unparsable listing entry {:?}", entry.as_ref()),
        }
    }

    parsed
}
