use std::ffi::OsString;
use std::fmt::Write as _;
use std::path::Path;

use eclectica_backend::{Language, LanguageBackend};
use eclectica_shell::{ShellType, active_version, export_lines, path_with_proxies, update_profiles};

use crate::error::AppError;
use crate::session::Session;

/// `export` lines for the version of `language` active in `cwd`. Empty when
/// nothing is active.
pub fn env(session: &Session, language: Language, cwd: &Path) -> Result<String, AppError> {
    let backend = session.quiet_backend(language)?;
    let Some(active) = active_version(&session.paths, language, backend.dots(), cwd)? else {
        return Ok(String::new());
    };
    Ok(export_lines(&backend.environment(&active.version)?))
}

#[must_use]
pub fn path(session: &Session, current: Option<OsString>) -> String {
    path_with_proxies(&session.paths, current)
        .to_string_lossy()
        .into_owned()
}

/// Add or remove the PATH hook and describe what changed.
pub fn hook(shell: Option<&str>, enable: bool) -> Result<String, AppError> {
    let shell = match shell {
        Some(shell) => ShellType::from_path(shell)?,
        None => ShellType::detect()?,
    };
    let home = eclectica_shell::home_dir()?;
    describe_edits(shell, &home, enable)
}

fn describe_edits(shell: ShellType, home: &Path, enable: bool) -> Result<String, AppError> {
    let edits = update_profiles(shell, home, enable)?;
    if edits.is_empty() {
        return Ok(if enable {
            "PATH hook is already installed\n".to_string()
        } else {
            "No PATH hook to remove\n".to_string()
        });
    }

    let mut output = String::new();
    for edit in &edits {
        output.push_str(&edit.diff_preview());
    }
    if enable {
        let _ = writeln!(output, "Restart your shell to pick up the change");
    }
    Ok(output)
}
