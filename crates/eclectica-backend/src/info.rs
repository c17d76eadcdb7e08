use std::collections::BTreeMap;

/// Well-known Info Map keys.
pub mod keys {
    pub const NAME: &str = "name";
    pub const VERSION: &str = "version";
    pub const FILENAME: &str = "filename";
    pub const URL: &str = "url";
    pub const EXTENSION: &str = "extension";
    pub const UNARCHIVE_FILENAME: &str = "unarchive-filename";
    pub const DESTINATION_FOLDER: &str = "destination-folder";
    pub const ARCHIVE_FOLDER: &str = "archive-folder";
    pub const ARCHIVE_PATH: &str = "archive-path";
}

/// Metadata describing where to fetch and how to unpack one version.
///
/// Backends fill in what they know; the engine supplies defaults for the
/// rest before the map is frozen into an install target.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InfoMap(BTreeMap<String, String>);

impl InfoMap {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with(mut self, key: &str, value: impl Into<String>) -> Self {
        self.insert(key, value);
        self
    }

    pub fn insert(&mut self, key: &str, value: impl Into<String>) {
        self.0.insert(key.to_string(), value.into());
    }

    /// Insert `value` only when `key` is absent or empty.
    pub fn insert_default(&mut self, key: &str, value: impl Into<String>) {
        if self.get(key).is_none() {
            self.insert(key, value);
        }
    }

    /// Value for `key`; empty values count as absent.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&str> {
        self.0
            .get(key)
            .map(String::as_str)
            .filter(|value| !value.is_empty())
    }

    #[must_use]
    pub fn contains(&self, key: &str) -> bool {
        self.get(key).is_some()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(key, value)| (key.as_str(), value.as_str()))
    }

    #[must_use]
    pub fn filename(&self) -> Option<&str> {
        self.get(keys::FILENAME)
    }

    #[must_use]
    pub fn url(&self) -> Option<&str> {
        self.get(keys::URL)
    }

    #[must_use]
    pub fn extension(&self) -> Option<&str> {
        self.get(keys::EXTENSION)
    }

    #[must_use]
    pub fn unarchive_filename(&self) -> Option<&str> {
        self.get(keys::UNARCHIVE_FILENAME)
    }
}
