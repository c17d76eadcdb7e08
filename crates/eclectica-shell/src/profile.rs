use std::fmt::Write as _;
use std::fs;
use std::path::{Path, PathBuf};

use log::debug;
use thiserror::Error;

pub const START_MARKER: &str = "#eclectica start";
pub const END_MARKER: &str = "#eclectica end";
pub const INIT_COMMAND: &str = r#"command -v ec > /dev/null && export PATH="$(ec path)""#;

#[derive(Error, Debug)]
pub enum ProfileError {
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Unsupported shell: {0}")]
    UnsupportedShell(String),

    #[error("Could not determine home directory")]
    NoHome,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShellType {
    Bash,
    Zsh,
}

impl ShellType {
    /// Shell named by `$SHELL`.
    pub fn detect() -> Result<Self, ProfileError> {
        let shell = std::env::var("SHELL").unwrap_or_default();
        Self::from_path(&shell)
    }

    pub fn from_path(shell: &str) -> Result<Self, ProfileError> {
        match Path::new(shell).file_name().and_then(|name| name.to_str()) {
            Some("bash" | "sh") => Ok(Self::Bash),
            Some("zsh") => Ok(Self::Zsh),
            _ => Err(ProfileError::UnsupportedShell(shell.to_string())),
        }
    }

    /// Startup files this shell reads, relative to the home directory.
    #[must_use]
    pub fn profile_names(self) -> &'static [&'static str] {
        match self {
            Self::Bash => &[".bash_profile", ".bashrc", ".profile"],
            Self::Zsh => &[".zshrc"],
        }
    }

    /// Files the hook goes into: every existing startup file, or the first
    /// candidate when none exists yet.
    #[must_use]
    pub fn profile_files(self, home: &Path) -> Vec<PathBuf> {
        let candidates: Vec<PathBuf> = self
            .profile_names()
            .iter()
            .map(|name| home.join(name))
            .collect();
        let existing: Vec<PathBuf> = candidates.iter().filter(|path| path.exists()).cloned().collect();
        if existing.is_empty() {
            candidates.into_iter().take(1).collect()
        } else {
            existing
        }
    }
}

/// One shell startup file and the eclectica block inside it.
pub struct ProfileConfig {
    pub path: PathBuf,
    pub content: String,
}

impl ProfileConfig {
    pub fn load(path: PathBuf) -> Result<Self, ProfileError> {
        let content = if path.exists() {
            fs::read_to_string(&path)?
        } else {
            String::new()
        };
        Ok(Self { path, content })
    }

    #[must_use]
    pub fn has_init(&self) -> bool {
        self.content.contains(START_MARKER)
    }

    #[must_use]
    pub fn add_init(&self) -> ProfileEdit {
        if self.has_init() {
            return ProfileEdit::unchanged(&self.content);
        }

        let mut modified = self.content.clone();
        if !modified.is_empty() && !modified.ends_with('\n') {
            modified.push('\n');
        }
        let _ = write!(modified, "\n{START_MARKER}\n{INIT_COMMAND}\n{END_MARKER}\n");

        ProfileEdit {
            original: self.content.clone(),
            modified,
            changes: vec![format!("Add PATH hook to {}", self.path.display())],
        }
    }

    /// Drop the marked block and the blank line written before it.
    #[must_use]
    pub fn remove_init(&self) -> ProfileEdit {
        if !self.has_init() {
            return ProfileEdit::unchanged(&self.content);
        }

        let mut kept: Vec<&str> = Vec::new();
        let mut inside = false;
        for line in self.content.lines() {
            if line.trim() == START_MARKER {
                inside = true;
                if kept.last().is_some_and(|previous| previous.trim().is_empty()) {
                    kept.pop();
                }
                continue;
            }
            if inside {
                if line.trim() == END_MARKER {
                    inside = false;
                }
                continue;
            }
            kept.push(line);
        }

        let mut modified = kept.join("\n");
        if !modified.is_empty() {
            modified.push('\n');
        }

        ProfileEdit {
            original: self.content.clone(),
            modified,
            changes: vec![format!("Remove PATH hook from {}", self.path.display())],
        }
    }

    pub fn apply_edit(&mut self, edit: &ProfileEdit) -> Result<(), ProfileError> {
        if !edit.has_changes() {
            return Ok(());
        }
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }

        fs::write(&self.path, &edit.modified)?;
        self.content.clone_from(&edit.modified);
        debug!("Updated {}", self.path.display());
        Ok(())
    }
}

pub struct ProfileEdit {
    pub original: String,
    pub modified: String,
    pub changes: Vec<String>,
}

impl ProfileEdit {
    fn unchanged(content: &str) -> Self {
        Self {
            original: content.to_string(),
            modified: content.to_string(),
            changes: Vec::new(),
        }
    }

    #[must_use]
    pub fn has_changes(&self) -> bool {
        !self.changes.is_empty()
    }

    #[must_use]
    pub fn diff_preview(&self) -> String {
        if !self.has_changes() {
            return "No changes needed.".to_string();
        }

        let mut preview = String::new();
        for change in &self.changes {
            let _ = writeln!(preview, "+ {change}");
        }
        preview
    }
}

/// Add (or with `enable == false`, remove) the hook in every startup file
/// of `shell` under `home`. Returns the edits that changed something.
pub fn update_profiles(shell: ShellType, home: &Path, enable: bool) -> Result<Vec<ProfileEdit>, ProfileError> {
    let mut applied = Vec::new();
    for path in shell.profile_files(home) {
        let mut config = ProfileConfig::load(path)?;
        let edit = if enable {
            config.add_init()
        } else {
            config.remove_init()
        };
        if edit.has_changes() {
            config.apply_edit(&edit)?;
            applied.push(edit);
        }
    }
    Ok(applied)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(content: &str) -> ProfileConfig {
        ProfileConfig {
            path: PathBuf::from("/test/.bashrc"),
            content: content.to_string(),
        }
    }

    #[test]
    fn test_add_init_appends_marked_block() {
        let edit = config("export EDITOR=vim").add_init();
        assert!(edit.has_changes());
        assert_eq!(
            edit.modified,
            format!("export EDITOR=vim\n\n{START_MARKER}\n{INIT_COMMAND}\n{END_MARKER}\n")
        );
    }

    #[test]
    fn test_add_init_is_idempotent() {
        let added = config("").add_init();
        let again = config(&added.modified).add_init();
        assert!(!again.has_changes());
        assert_eq!(again.diff_preview(), "No changes needed.");
    }

    #[test]
    fn test_remove_init_restores_original() {
        let original = "export EDITOR=vim\nalias ll='ls -l'\n";
        let added = config(original).add_init();
        let removed = config(&added.modified).remove_init();
        assert_eq!(removed.modified, original);
    }

    #[test]
    fn test_remove_init_without_block_is_noop() {
        assert!(!config("export A=1\n").remove_init().has_changes());
    }

    #[test]
    fn test_shell_from_path() {
        assert_eq!(ShellType::from_path("/bin/bash").unwrap(), ShellType::Bash);
        assert_eq!(ShellType::from_path("/usr/local/bin/zsh").unwrap(), ShellType::Zsh);
        assert!(matches!(
            ShellType::from_path("/usr/bin/fish"),
            Err(ProfileError::UnsupportedShell(_))
        ));
    }

    #[test]
    fn test_profile_files_prefer_existing() {
        let home = tempfile::tempdir().unwrap();
        assert_eq!(
            ShellType::Bash.profile_files(home.path()),
            vec![home.path().join(".bash_profile")]
        );

        std::fs::write(home.path().join(".bashrc"), "").unwrap();
        std::fs::write(home.path().join(".profile"), "").unwrap();
        assert_eq!(
            ShellType::Bash.profile_files(home.path()),
            vec![home.path().join(".bashrc"), home.path().join(".profile")]
        );
    }
}
