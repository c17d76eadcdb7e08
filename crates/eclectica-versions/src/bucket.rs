use std::collections::BTreeMap;

use crate::version::{Version, parse_listing};

/// Versions grouped by major component, keyed `"M.x"`.
///
/// Buckets iterate in ascending numeric order of their major component and
/// the versions inside each bucket are ascending and unique.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BucketMap {
    buckets: BTreeMap<u64, Vec<Version>>,
}

impl BucketMap {
    #[must_use]
    pub fn len(&self) -> usize {
        self.buckets.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.buckets.is_empty()
    }

    #[must_use]
    pub fn keys(&self) -> Vec<String> {
        self.buckets.keys().map(|major| bucket_key(*major)).collect()
    }

    #[must_use]
    pub fn get(&self, key: &str) -> Option<&[Version]> {
        let major = key.strip_suffix(".x")?.parse::<u64>().ok()?;
        self.buckets.get(&major).map(Vec::as_slice)
    }

    pub fn iter(&self) -> impl Iterator<Item = (String, &[Version])> {
        self.buckets
            .iter()
            .map(|(major, versions)| (bucket_key(*major), versions.as_slice()))
    }

    /// Highest version of every bucket, buckets ascending.
    pub fn latest_per_bucket(&self) -> impl Iterator<Item = (String, &Version)> {
        self.buckets
            .iter()
            .filter_map(|(major, versions)| Some((bucket_key(*major), versions.last()?)))
    }
}

fn bucket_key(major: u64) -> String {
    format!("{major}.x")
}

/// Group a remote listing into `M.x` buckets. Unparsable entries are
/// skipped and duplicates collapse to their first occurrence.
pub fn compose<S: AsRef<str>>(remote: &[S]) -> BucketMap {
    let mut buckets: BTreeMap<u64, Vec<Version>> = BTreeMap::new();

    for version in parse_listing(remote) {
        buckets.entry(version.major()).or_default().push(version);
    }

    for versions in buckets.values_mut() {
        versions.sort();
    }

    BucketMap { buckets }
}
