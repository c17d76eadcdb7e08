use log::{debug, warn};

use eclectica_backend::{EventSink, Version};
use eclectica_engine::{
    Attempt, EngineError, InstallMode, InterruptGuard, installed_versions, resolve_version,
};
use eclectica_versions::{complete, is_partial};

use crate::cli::{InstallArgs, Target};
use crate::error::AppError;
use crate::progress;
use crate::session::Session;

/// Install `target` (or switch to it when already installed) and make it
/// active globally or, with `--local`, for the working directory.
pub async fn install(
    session: &Session,
    target: &Target,
    args: &InstallArgs,
    verbose: bool,
) -> Result<(), AppError> {
    let (events, receiver) = EventSink::channel();
    let printer = progress::spawn(receiver, verbose);

    // Every sender lives inside `run`, so the printer drains and exits once
    // it returns.
    let result = run(session, target, args, events).await;
    if printer.join().is_err() {
        warn!("Progress printer panicked");
    }
    result
}

async fn run(
    session: &Session,
    target: &Target,
    args: &InstallArgs,
    events: EventSink,
) -> Result<(), AppError> {
    let mut options = session.settings.backend_options();
    options.with_modules |= args.with_modules;

    let backend = session.backend(target.language, events, &options)?;
    let version = resolve_version(&backend, &target.version).await?;
    debug!("Installing {} {version}", target.language);

    let mode = if args.local {
        InstallMode::Local {
            dir: Session::current_dir()?,
        }
    } else {
        InstallMode::Global
    };

    let mut attempt = Attempt::new(backend, version)?;
    let guard = InterruptGuard::arm();
    eclectica_engine::install(&mut attempt, &mode, guard.token()).await?;
    Ok(())
}

/// Remove one installed version. Partial input picks the highest installed
/// match.
pub fn remove(session: &Session, target: &Target) -> Result<Version, AppError> {
    let backend = session.quiet_backend(target.language)?;
    let version = installed_match(session, target)?;
    eclectica_engine::remove(&backend, &version)?;
    Ok(version)
}

fn installed_match(session: &Session, target: &Target) -> Result<Version, AppError> {
    let input = target.version.trim();
    if input.is_empty() {
        return Err(EngineError::VersionNotDefined.into());
    }

    if is_partial(input) {
        let installed: Vec<String> = installed_versions(&session.paths, target.language)?
            .into_iter()
            .map(|installed| installed.version.to_string())
            .collect();
        return complete(input, &installed).map_err(|error| EngineError::from(error).into());
    }

    Version::from_native(input).map_err(|error| EngineError::from(error).into())
}
