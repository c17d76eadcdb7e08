/// Convert an upstream spelling into canonical semver.
///
/// `1.7` becomes `1.7.0`, `1.8beta2` becomes `1.8.0-beta2`, `3.6.0a1`
/// becomes `3.6.0-a1`. Input that is already valid semver is returned
/// unchanged (minus a leading `v`); input that cannot be interpreted is
/// returned trimmed so the caller's parse reports it.
#[must_use]
pub fn semverify(input: &str) -> String {
    let trimmed = input.trim();
    let trimmed = trimmed.strip_prefix('v').unwrap_or(trimmed);

    if semver::Version::parse(trimmed).is_ok() {
        return trimmed.to_string();
    }

    let split = trimmed
        .find(|c: char| !(c.is_ascii_digit() || c == '.'))
        .unwrap_or(trimmed.len());
    let (numeric, pre) = trimmed.split_at(split);

    let mut parts: Vec<&str> = numeric.trim_end_matches('.').split('.').collect();
    if parts.is_empty() || parts.len() > 3 || parts.iter().any(|part| part.is_empty()) {
        return trimmed.to_string();
    }
    while parts.len() < 3 {
        parts.push("0");
    }

    let core = parts.join(".");
    let pre = pre.trim_start_matches('-');
    if pre.is_empty() {
        core
    } else {
        format!("{core}-{pre}")
    }
}

/// Convert a canonical version back to the compact upstream spelling.
///
/// A zero patch component is dropped and the pre-release tag is glued to the
/// numeric part: `1.7.0` becomes `1.7`, `1.8.0-beta2` becomes `1.8beta2`.
/// `semverify(unsemverify(v)) == v` holds for every canonical version without
/// build metadata.
#[must_use]
pub fn unsemverify(canonical: &str) -> String {
    let trimmed = canonical.trim();
    let trimmed = trimmed.strip_prefix('v').unwrap_or(trimmed);
    let Ok(version) = semver::Version::parse(trimmed) else {
        return trimmed.to_string();
    };

    let mut compact = if version.patch == 0 {
        format!("{}.{}", version.major, version.minor)
    } else {
        format!("{}.{}.{}", version.major, version.minor, version.patch)
    };

    let pre = version.pre.as_str();
    if !pre.is_empty() {
        // A numeric tag would merge into the last component.
        if pre.starts_with(|c: char| c.is_ascii_digit()) {
            compact.push('-');
        }
        compact.push_str(pre);
    }

    compact
}
