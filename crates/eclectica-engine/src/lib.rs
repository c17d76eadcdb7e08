//! Installation engine: drives a language backend through download,
//! extraction, build, proxy setup and activation, rolling back whatever a
//! failed attempt left on disk.

mod attempt;
mod error;
mod installed;
mod interrupt;
mod pipeline;
mod proxy;

pub use attempt::{Attempt, InstallMode, resolve_version};
pub use error::EngineError;
pub use installed::{INSTALLED_MARKER, current_version, installed_versions, is_installed};
pub use interrupt::InterruptGuard;
pub use pipeline::{install, remove};
pub use proxy::{install_proxies, remove_proxies};
