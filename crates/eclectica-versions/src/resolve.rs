use crate::version::{RemoteVersion, Version, VersionError, parse_listing};

/// Named shortcuts accepted wherever a version is expected.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Alias {
    Latest,
    Lts,
}

impl Alias {
    #[must_use]
    pub fn from_input(input: &str) -> Option<Self> {
        match input.trim().to_ascii_lowercase().as_str() {
            "latest" | "stable" | "current" => Some(Self::Latest),
            "lts" | "lts/*" => Some(Self::Lts),
            _ => None,
        }
    }
}

/// Leading components of a version, e.g. `5` or `5.2`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PartialVersion {
    pub major: u64,
    pub minor: Option<u64>,
}

impl PartialVersion {
    /// # Errors
    /// Returns [`VersionError::Invalid`] when the input is not a partial
    /// version.
    pub fn parse(input: &str) -> Result<Self, VersionError> {
        if !is_partial(input) {
            return Err(VersionError::invalid(input.trim()));
        }

        let trimmed = strip_prefix(input);
        let mut parts = trimmed.split('.').filter(|part| !is_wildcard(part));
        let major = parts
            .next()
            .and_then(|part| part.parse().ok())
            .ok_or_else(|| VersionError::invalid(trimmed))?;
        let minor = parts.next().and_then(|part| part.parse().ok());

        Ok(Self { major, minor })
    }

    #[must_use]
    pub fn matches(&self, version: &Version) -> bool {
        version.major() == self.major && self.minor.is_none_or(|minor| version.minor() == minor)
    }
}

fn strip_prefix(input: &str) -> &str {
    let trimmed = input.trim();
    trimmed.strip_prefix('v').unwrap_or(trimmed)
}

fn is_wildcard(part: &str) -> bool {
    matches!(part, "x" | "X" | "*")
}

/// Whether `input` names a family of versions rather than one version.
///
/// `5`, `5.2` and `5.x` are partial; `5.2.1`, `1.7rc1` and aliases are not.
#[must_use]
pub fn is_partial(input: &str) -> bool {
    let trimmed = strip_prefix(input);
    if trimmed.is_empty() {
        return false;
    }

    let parts: Vec<&str> = trimmed.split('.').collect();
    if parts.len() > 3 {
        return false;
    }

    let numeric_ok = parts.iter().enumerate().all(|(index, part)| {
        (!part.is_empty() && part.chars().all(|c| c.is_ascii_digit()))
            || (index > 0 && is_wildcard(part))
    });
    if !numeric_ok {
        return false;
    }

    parts.len() < 3 || parts.iter().any(|part| is_wildcard(part))
}

/// Complete `input` against a remote listing.
///
/// Full versions must be present in the listing. Partial versions and the
/// `latest` alias select the highest stable (non pre-release) match.
///
/// # Errors
/// Returns [`VersionError::NotDefined`] for empty input,
/// [`VersionError::Invalid`] for input that is neither a version nor a
/// known alias, and [`VersionError::NotFound`] when nothing in the listing
/// matches.
pub fn complete<S: AsRef<str>>(input: &str, remote: &[S]) -> Result<Version, VersionError> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return Err(VersionError::NotDefined);
    }

    let listing = parse_listing(remote);

    if let Some(alias) = Alias::from_input(trimmed) {
        return match alias {
            Alias::Latest => highest_stable(listing.into_iter(), |_| true)
                .ok_or_else(|| VersionError::not_found(trimmed)),
            // Listings passed as plain strings carry no LTS information.
            Alias::Lts => Err(VersionError::not_found(trimmed)),
        };
    }

    if is_partial(trimmed) {
        let partial = PartialVersion::parse(trimmed)?;
        return highest_stable(listing.into_iter(), |version| partial.matches(version))
            .ok_or_else(|| VersionError::not_found(trimmed));
    }

    let wanted = Version::from_native(trimmed)?;
    listing
        .into_iter()
        .find(|version| *version == wanted)
        .ok_or_else(|| VersionError::not_found(trimmed))
}

/// Like [`complete`], but also understands the `lts` alias by looking at
/// the codenames carried by the listing.
///
/// # Errors
/// Same as [`complete`].
pub fn resolve(input: &str, remote: &[RemoteVersion]) -> Result<Version, VersionError> {
    if Alias::from_input(input) == Some(Alias::Lts) {
        let lts = remote
            .iter()
            .filter(|entry| entry.lts_codename.is_some())
            .filter_map(RemoteVersion::version);
        return highest_stable(lts, |_| true).ok_or_else(|| VersionError::not_found(input.trim()));
    }

    complete(input, remote)
}

fn highest_stable(
    versions: impl Iterator<Item = Version>,
    accept: impl Fn(&Version) -> bool,
) -> Option<Version> {
    versions
        .filter(|version| !version.is_prerelease() && accept(version))
        .max()
}
