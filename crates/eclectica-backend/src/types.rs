use eclectica_versions::Version;

/// A version present on disk, as shown by `ec ls`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstalledVersion {
    pub version: Version,
    pub is_current: bool,
    pub install_date: Option<chrono::DateTime<chrono::Utc>>,
}
