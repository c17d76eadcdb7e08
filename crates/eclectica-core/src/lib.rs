//! Transfer and unpacking primitives used by the installation engine and
//! the language backends.
//!
//! - Streaming HTTP downloads with progress reporting, plus a fail-fast
//!   batch variant for auxiliary files.
//! - Archive extraction for tarballs and single gzip binaries.
//! - SHA-256 verification against published checksum lists.

mod archive;
mod batch;
mod checksum;
mod download;

pub use archive::{ArchiveError, ArchiveFormat, decompress_gz, extract_tar_gz};
pub use batch::{BatchItem, POLL_INTERVAL, download_batch};
pub use checksum::{parse_expected_checksum, sha256_file, verify_checksum};
pub use download::{DownloadError, download_file, fetch_text, partial_path};
