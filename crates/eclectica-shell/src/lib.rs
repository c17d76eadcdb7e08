#![allow(clippy::missing_errors_doc)]

mod activation;
mod profile;

pub use activation::{
    ActivationError, ActiveSource, ActiveVersion, active_version, export_lines, path_with_proxies,
};
pub use profile::{
    END_MARKER, INIT_COMMAND, ProfileConfig, ProfileEdit, ProfileError, START_MARKER, ShellType,
    update_profiles,
};

/// Home directory whose startup files receive the PATH hook.
pub fn home_dir() -> Result<std::path::PathBuf, ProfileError> {
    dirs::home_dir().ok_or(ProfileError::NoHome)
}
