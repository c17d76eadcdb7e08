//! Version model shared by every eclectica crate.
//!
//! Upstream projects publish versions in their own spellings (`1.7`,
//! `1.8beta2`, `v6.8.0`). Everything inside eclectica works on the canonical
//! semver form and only converts back at the edges:
//! - [`semverify`] / [`unsemverify`] translate between the two spellings.
//! - [`complete`] and [`resolve`] turn partial input or aliases into a
//!   concrete [`Version`] using a remote listing.
//! - [`compose`] groups a listing into `M.x` buckets for display.

mod bucket;
mod resolve;
mod spelling;
mod version;

pub use bucket::{BucketMap, compose};
pub use resolve::{Alias, PartialVersion, complete, is_partial, resolve};
pub use spelling::{semverify, unsemverify};
pub use version::{RemoteVersion, Version, VersionError, parse_listing};
