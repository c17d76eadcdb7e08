//! Filesystem helpers shared by the engine, the backends and activation.

use std::io;
use std::path::{Path, PathBuf};

use eclectica_versions::Version;
use log::{debug, trace};

/// Create `path` and all of its parents.
///
/// # Errors
/// Returns the underlying I/O error.
pub fn create_dir(path: &Path) -> io::Result<()> {
    std::fs::create_dir_all(path)
}

/// Remove a file, symlink or directory tree. Missing paths are not an error.
///
/// # Errors
/// Returns the underlying I/O error for anything but a missing path.
pub fn remove_path(path: &Path) -> io::Result<()> {
    let metadata = match std::fs::symlink_metadata(path) {
        Ok(metadata) => metadata,
        Err(error) if error.kind() == io::ErrorKind::NotFound => return Ok(()),
        Err(error) => return Err(error),
    };

    trace!("Removing {}", path.display());
    if metadata.is_dir() {
        std::fs::remove_dir_all(path)
    } else {
        std::fs::remove_file(path)
    }
}

/// Point `link` at `target`, replacing whatever `link` was before.
///
/// # Errors
/// Returns an error if the old entry cannot be removed or the link cannot be
/// created.
pub fn symlink(target: &Path, link: &Path) -> io::Result<()> {
    if let Some(parent) = link.parent() {
        create_dir(parent)?;
    }
    remove_path(link)?;

    debug!("Linking {} -> {}", link.display(), target.display());

    #[cfg(unix)]
    {
        std::os::unix::fs::symlink(target, link)
    }

    #[cfg(windows)]
    {
        std::os::windows::fs::symlink_dir(target, link)
    }
}

/// Version named by the final component of the directory `link` points to.
#[must_use]
pub fn read_link_version(link: &Path) -> Option<Version> {
    let target = std::fs::read_link(link).ok()?;
    target.file_name()?.to_str()?.parse().ok()
}

/// Versions physically present under a language prefix, ascending.
///
/// Only real directories whose name is a full version count, so the
/// `current` symlink and staging leftovers are ignored.
///
/// # Errors
/// Returns an I/O error when the prefix exists but cannot be read.
pub fn list_versions(prefix: &Path) -> io::Result<Vec<Version>> {
    let entries = match std::fs::read_dir(prefix) {
        Ok(entries) => entries,
        Err(error) if error.kind() == io::ErrorKind::NotFound => return Ok(Vec::new()),
        Err(error) => return Err(error),
    };

    let mut versions = Vec::new();
    for entry in entries {
        let entry = entry?;
        if !entry.file_type()?.is_dir() {
            continue;
        }
        if let Some(version) = entry
            .file_name()
            .to_str()
            .and_then(|name| name.parse::<Version>().ok())
        {
            versions.push(version);
        }
    }

    versions.sort();
    Ok(versions)
}

/// Walk from `start` towards the filesystem root and return the first file
/// named in `names`. Within one directory, earlier names win.
#[must_use]
pub fn find_dotfile(start: &Path, names: &[&str]) -> Option<PathBuf> {
    start.ancestors().find_map(|dir| {
        names
            .iter()
            .map(|name| dir.join(name))
            .find(|candidate| candidate.is_file())
    })
}

/// First non-empty line of a version file, trimmed and without a `v` prefix.
///
/// # Errors
/// Returns the underlying I/O error; an empty file yields an empty string.
pub fn read_version_file(path: &Path) -> io::Result<String> {
    let contents = std::fs::read_to_string(path)?;
    let line = contents
        .lines()
        .map(str::trim)
        .find(|line| !line.is_empty())
        .unwrap_or_default();
    Ok(line.strip_prefix('v').unwrap_or(line).to_string())
}

/// Write `version` into `dir/name`, followed by a newline.
///
/// # Errors
/// Returns the underlying I/O error.
pub fn write_version_file(dir: &Path, name: &str, version: &str) -> io::Result<PathBuf> {
    let path = dir.join(name);
    std::fs::write(&path, format!("{version}\n"))?;
    Ok(path)
}

/// Recursively copy `src` into `dest`, recreating symlinks as symlinks.
///
/// # Errors
/// Returns the first I/O error encountered.
pub fn copy_dir(src: &Path, dest: &Path) -> io::Result<()> {
    create_dir(dest)?;

    for entry in std::fs::read_dir(src)? {
        let entry = entry?;
        let file_type = entry.file_type()?;
        let src_path = entry.path();
        let dest_path = dest.join(entry.file_name());

        if file_type.is_symlink() {
            let target = std::fs::read_link(&src_path)?;
            #[cfg(unix)]
            std::os::unix::fs::symlink(&target, &dest_path)?;
            #[cfg(windows)]
            std::fs::copy(&target, &dest_path).map(|_| ())?;
        } else if file_type.is_dir() {
            copy_dir(&src_path, &dest_path)?;
        } else {
            std::fs::copy(&src_path, &dest_path)?;
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn remove_path_handles_missing_files_dirs_and_links() {
        let temp = tempfile::tempdir().unwrap();
        let dir = temp.path().join("dir");
        std::fs::create_dir_all(dir.join("nested")).unwrap();
        std::fs::write(dir.join("nested/file"), "x").unwrap();
        let file = temp.path().join("file");
        std::fs::write(&file, "x").unwrap();

        remove_path(&temp.path().join("missing")).unwrap();
        remove_path(&dir).unwrap();
        remove_path(&file).unwrap();

        assert!(!dir.exists());
        assert!(!file.exists());
    }

    #[cfg(unix)]
    #[test]
    fn symlink_replaces_existing_link_without_touching_target() {
        let temp = tempfile::tempdir().unwrap();
        let first = temp.path().join("6.3.1");
        let second = temp.path().join("6.8.0");
        std::fs::create_dir_all(&first).unwrap();
        std::fs::create_dir_all(&second).unwrap();
        let link = temp.path().join("current");

        symlink(&first, &link).unwrap();
        symlink(&second, &link).unwrap();

        assert_eq!(std::fs::read_link(&link).unwrap(), second);
        assert!(first.is_dir());
        assert_eq!(read_link_version(&link), Some(Version::new(6, 8, 0)));
    }

    #[test]
    fn read_link_version_of_missing_link_is_none() {
        let temp = tempfile::tempdir().unwrap();
        assert_eq!(read_link_version(&temp.path().join("current")), None);
    }

    #[cfg(unix)]
    #[test]
    fn list_versions_ignores_links_files_and_staging_dirs() {
        let temp = tempfile::tempdir().unwrap();
        let prefix = temp.path();
        for name in ["6.8.0", "6.3.1", "10.0.0", "node-v6.8.0-linux-x64"] {
            std::fs::create_dir_all(prefix.join(name)).unwrap();
        }
        std::fs::write(prefix.join("1.0.0"), "not a dir").unwrap();
        std::os::unix::fs::symlink(prefix.join("6.8.0"), prefix.join("current")).unwrap();

        let versions = list_versions(prefix).unwrap();

        assert_eq!(
            versions,
            vec![
                Version::new(6, 3, 1),
                Version::new(6, 8, 0),
                Version::new(10, 0, 0)
            ]
        );
    }

    #[test]
    fn list_versions_of_missing_prefix_is_empty() {
        let temp = tempfile::tempdir().unwrap();
        assert!(list_versions(&temp.path().join("node")).unwrap().is_empty());
    }

    #[test]
    fn find_dotfile_walks_upwards() {
        let temp = tempfile::tempdir().unwrap();
        let project = temp.path().join("project");
        let nested = project.join("src/deep");
        std::fs::create_dir_all(&nested).unwrap();
        std::fs::write(project.join(".nvmrc"), "6.8.0").unwrap();

        let found = find_dotfile(&nested, &[".node-version", ".nvmrc"]);
        assert_eq!(found, Some(project.join(".nvmrc")));

        std::fs::write(project.join(".node-version"), "6.3.1").unwrap();
        let found = find_dotfile(&nested, &[".node-version", ".nvmrc"]);
        assert_eq!(found, Some(project.join(".node-version")));
    }

    #[test]
    fn find_dotfile_prefers_closest_directory() {
        let temp = tempfile::tempdir().unwrap();
        let nested = temp.path().join("nested");
        std::fs::create_dir_all(&nested).unwrap();
        std::fs::write(temp.path().join(".go-version"), "1.7.0").unwrap();
        std::fs::write(nested.join(".go-version"), "1.8.0").unwrap();

        assert_eq!(
            find_dotfile(&nested, &[".go-version"]),
            Some(nested.join(".go-version"))
        );
    }

    #[test]
    fn version_file_round_trip() {
        let temp = tempfile::tempdir().unwrap();
        let path = write_version_file(temp.path(), ".node-version", "6.8.0").unwrap();
        assert_eq!(read_version_file(&path).unwrap(), "6.8.0");

        std::fs::write(&path, "\n  v6.3.1  \nignored\n").unwrap();
        assert_eq!(read_version_file(&path).unwrap(), "6.3.1");

        std::fs::write(&path, "").unwrap();
        assert_eq!(read_version_file(&path).unwrap(), "");
    }

    #[test]
    fn copy_dir_copies_nested_files() {
        let temp = tempfile::tempdir().unwrap();
        let src = temp.path().join("src");
        std::fs::create_dir_all(src.join("a/b")).unwrap();
        std::fs::write(src.join("a/b/file.txt"), "hello").unwrap();

        let dest = temp.path().join("dest");
        copy_dir(&src, &dest).unwrap();

        assert_eq!(
            std::fs::read_to_string(dest.join("a/b/file.txt")).unwrap(),
            "hello"
        );
    }
}
