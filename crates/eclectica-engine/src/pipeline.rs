use std::future::Future;

use log::{debug, info, warn};
use tokio_util::sync::CancellationToken;

use eclectica_backend::{InstallEvent, Language, LanguageBackend, Version};
use eclectica_platform::{AppPaths, LanguageLock, list_versions, remove_path};

use crate::attempt::{Attempt, InstallMode};
use crate::error::EngineError;
use crate::installed::current_version;
use crate::proxy::remove_proxies;

/// Run one step unless the attempt has been interrupted. An interrupt drops
/// the step's future, which kills any child process it started.
async fn step<T>(
    cancel: &CancellationToken,
    future: impl Future<Output = Result<T, EngineError>>,
) -> Result<T, EngineError> {
    tokio::select! {
        biased;
        () = cancel.cancelled() => Err(EngineError::Interrupted),
        result = future => result,
    }
}

/// Drive `attempt` through the install lifecycle.
///
/// An already installed version is only switched to. A fresh install
/// downloads, extracts, builds and links it; any failure or interrupt on the
/// way rolls back and returns the original error.
///
/// # Errors
/// [`EngineError::Locked`] when another process works on the same language,
/// [`EngineError::Interrupted`] after Ctrl+C, and the first failing step's
/// error otherwise.
pub async fn install<B: LanguageBackend>(
    attempt: &mut Attempt<B>,
    mode: &InstallMode,
    cancel: &CancellationToken,
) -> Result<(), EngineError> {
    let language = attempt.language();
    let _lock = LanguageLock::acquire(&attempt.paths().lock_file(language.name()), language.name())?;

    let events = attempt.backend().events().clone();
    events.emit(InstallEvent::Started {
        language,
        version: attempt.version().clone(),
    });

    step(cancel, attempt.pre_download()).await?;

    if attempt.is_installed() {
        info!("{language} {} is already installed", attempt.version());
        if let Err(error) = step(cancel, attempt.switch(mode)).await {
            attempt.restore_pointer();
            return Err(error);
        }
    } else {
        step(cancel, attempt.pre_install()).await?;

        if let Err(error) = fresh_install(attempt, mode, cancel).await {
            attempt.rollback().await;
            return Err(error);
        }
        attempt.clean_archive();
    }

    events.emit(InstallEvent::Done {
        language,
        version: attempt.version().clone(),
    });
    Ok(())
}

async fn fresh_install<B: LanguageBackend>(
    attempt: &mut Attempt<B>,
    mode: &InstallMode,
    cancel: &CancellationToken,
) -> Result<(), EngineError> {
    if step(cancel, attempt.download()).await? {
        step(cancel, attempt.extract()).await?;
    }
    step(cancel, attempt.install()).await?;
    step(cancel, attempt.post_install()).await?;

    let link = match mode {
        InstallMode::Global => true,
        InstallMode::Local { .. } => !attempt.has_global_pointer(),
    };
    if link {
        step(cancel, attempt.link()).await?;
    }

    step(cancel, attempt.switch(mode)).await
}

/// Uninstall one version of `backend`'s language.
///
/// Removing the active version takes its proxies and the global pointer
/// with it; removing the last version also removes the language prefix.
///
/// # Errors
/// [`EngineError::NotInstalled`] when the version is not on disk,
/// [`EngineError::Locked`] on contention and filesystem errors.
pub fn remove<B: LanguageBackend>(backend: &B, version: &Version) -> Result<(), EngineError> {
    let language = backend.language();
    let paths = &backend.context().paths;
    let _lock = LanguageLock::acquire(&paths.lock_file(language.name()), language.name())?;

    let dir = paths.version_dir(language.name(), &version.to_string());
    if !dir.is_dir() {
        return Err(EngineError::NotInstalled {
            language,
            version: version.clone(),
        });
    }

    if current_version(paths, language).as_ref() == Some(version) {
        debug!("Removing the active {language} version");
        remove_proxies(paths, backend.bins());
        let link = paths.current_link(language.name());
        remove_path(&link)
            .map_err(|error| EngineError::io("failed to remove global version", &link, error))?;
    }

    remove_path(&dir).map_err(|error| EngineError::io("failed to remove version", &dir, error))?;
    info!("Removed {language} {version}");

    remove_prefix_if_empty(paths, language, backend.bins());
    Ok(())
}

fn remove_prefix_if_empty(paths: &AppPaths, language: Language, bins: &[&str]) {
    let prefix = paths.language_prefix(language.name());
    match list_versions(&prefix) {
        Ok(remaining) if remaining.is_empty() => {
            remove_proxies(paths, bins);
            if let Err(error) = remove_path(&prefix) {
                warn!("Failed to remove {}: {error}", prefix.display());
            }
        }
        Ok(_) => {}
        Err(error) => warn!("Failed to list {}: {error}", prefix.display()),
    }
}
