//! Runtime side of the proxy binaries: figure out which real executable a
//! proxied command name stands for and hand the process over to it.

use std::convert::Infallible;
use std::ffi::{OsStr, OsString};
use std::path::{Path, PathBuf};
use std::process::Command;

use log::debug;

use eclectica_backend::{Language, LanguageBackend};
use eclectica_plugins::Backend;
use eclectica_shell::active_version;

use crate::error::AppError;
use crate::session::Session;

/// The executable a proxy named `bin` runs in `cwd`, plus the environment it
/// needs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resolved {
    pub language: Language,
    pub program: PathBuf,
    pub environment: Vec<(String, String)>,
}

pub fn resolve(session: &Session, bin: &str, cwd: &Path) -> Result<Resolved, AppError> {
    let language =
        Backend::language_for_bin(bin).ok_or_else(|| AppError::UnknownCommand(bin.to_string()))?;
    let backend = session.quiet_backend(language)?;

    let active = active_version(&session.paths, language, backend.dots(), cwd)?
        .ok_or(AppError::NoActiveVersion { language })?;
    debug!("{bin} resolves to {language} {} ({:?})", active.version, active.source);

    let version_dir = session
        .paths
        .version_dir(language.name(), &active.version.to_string());
    let environment = backend
        .environment(&active.version)?
        .iter()
        .filter_map(|pair| pair.split_once('='))
        .map(|(key, value)| (key.to_string(), value.to_string()))
        .collect();

    Ok(Resolved {
        language,
        program: backend.bin_dir(&version_dir).join(bin),
        environment,
    })
}

/// Name a proxy was invoked under, taken from `argv[0]`.
#[must_use]
pub fn invoked_name(argv0: &OsStr) -> Option<String> {
    let name = Path::new(argv0).file_name()?.to_str()?;
    Some(name.strip_suffix(".exe").unwrap_or(name).to_string())
}

/// Replace the current process with the resolved executable. Only returns
/// on failure.
pub fn exec(resolved: &Resolved, args: impl IntoIterator<Item = OsString>) -> Result<Infallible, AppError> {
    let mut command = Command::new(&resolved.program);
    command.args(args);
    command.envs(resolved.environment.iter().map(|(key, value)| (key, value)));

    #[cfg(unix)]
    {
        use std::os::unix::process::CommandExt;

        let source = command.exec();
        Err(AppError::Exec {
            path: resolved.program.clone(),
            source,
        })
    }

    #[cfg(not(unix))]
    {
        let status = command.status().map_err(|source| AppError::Exec {
            path: resolved.program.clone(),
            source,
        })?;
        std::process::exit(status.code().unwrap_or(1))
    }
}
