use log::{debug, info, warn};

use eclectica_platform::{AppPaths, create_dir, remove_path};

use crate::error::EngineError;

/// Copy the proxy dispatcher into the shared bin directory once per command
/// name. Existing copies are kept.
///
/// # Errors
/// Returns [`EngineError::ProxyMissing`] when the dispatcher binary is not
/// where it is expected, and I/O errors from copying.
pub fn install_proxies(paths: &AppPaths, bins: &[&str]) -> Result<(), EngineError> {
    let source = paths.proxy_source();
    let bin_dir = paths.bin_dir();
    let missing: Vec<&str> = bins
        .iter()
        .copied()
        .filter(|bin| !bin_dir.join(bin).exists())
        .collect();
    if missing.is_empty() {
        return Ok(());
    }

    if !source.is_file() {
        return Err(EngineError::ProxyMissing { path: source });
    }
    create_dir(&bin_dir)
        .map_err(|error| EngineError::io("failed to create proxy directory", &bin_dir, error))?;

    for bin in missing {
        let dest = bin_dir.join(bin);
        std::fs::copy(&source, &dest)
            .map_err(|error| EngineError::io("failed to install proxy", &dest, error))?;

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            std::fs::set_permissions(&dest, std::fs::Permissions::from_mode(0o755))
                .map_err(|error| EngineError::io("failed to mark proxy executable", &dest, error))?;
        }
        debug!("Installed proxy {}", dest.display());
    }
    info!("Proxies ready for {}", bins.join(", "));
    Ok(())
}

/// Delete the proxy copies for `bins`. Failures are logged and skipped.
pub fn remove_proxies(paths: &AppPaths, bins: &[&str]) {
    let bin_dir = paths.bin_dir();
    for bin in bins {
        let path = bin_dir.join(bin);
        if let Err(error) = remove_path(&path) {
            warn!("Failed to remove proxy {}: {error}", path.display());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn paths_with_proxy() -> (tempfile::TempDir, AppPaths) {
        let temp = tempfile::tempdir().unwrap();
        let paths = AppPaths::with_root(temp.path());
        std::fs::create_dir_all(&paths.proxy_dir).unwrap();
        std::fs::write(paths.proxy_source(), "#!/bin/sh\n").unwrap();
        (temp, paths)
    }

    #[test]
    fn installs_one_copy_per_bin() {
        let (_temp, paths) = paths_with_proxy();

        install_proxies(&paths, &["node", "npm"]).unwrap();

        assert_eq!(
            std::fs::read_to_string(paths.bin_dir().join("npm")).unwrap(),
            "#!/bin/sh\n"
        );
        assert!(paths.bin_dir().join("node").is_file());
    }

    #[test]
    fn missing_dispatcher_is_reported() {
        let temp = tempfile::tempdir().unwrap();
        let paths = AppPaths::with_root(temp.path());

        let error = install_proxies(&paths, &["go"]).unwrap_err();

        assert!(matches!(error, EngineError::ProxyMissing { ref path } if *path == paths.proxy_source()));
    }

    #[test]
    fn existing_proxies_need_no_dispatcher() {
        let temp = tempfile::tempdir().unwrap();
        let paths = AppPaths::with_root(temp.path());
        std::fs::create_dir_all(paths.bin_dir()).unwrap();
        std::fs::write(paths.bin_dir().join("elm"), "").unwrap();

        install_proxies(&paths, &["elm"]).unwrap();
    }

    #[test]
    fn remove_leaves_other_languages() {
        let (_temp, paths) = paths_with_proxy();
        install_proxies(&paths, &["node", "npm", "go"]).unwrap();

        remove_proxies(&paths, &["node", "npm"]);

        assert!(!paths.bin_dir().join("node").exists());
        assert!(!paths.bin_dir().join("npm").exists());
        assert!(paths.bin_dir().join("go").exists());
    }
}
