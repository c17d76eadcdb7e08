use std::fmt::Write as _;

use eclectica_backend::{InstalledVersion, Language, LanguageBackend};
use eclectica_engine::installed_versions;
use eclectica_versions::{BucketMap, compose};

use crate::error::AppError;
use crate::session::Session;

const CURRENT_MARKER: &str = "♥";

/// Installed versions of one language (or all of them), newest first.
pub fn ls(session: &Session, language: Option<Language>) -> Result<String, AppError> {
    let languages = language.map_or_else(|| Language::ALL.to_vec(), |language| vec![language]);

    let mut output = String::new();
    for language in languages {
        let installed = installed_versions(&session.paths, language)?;
        if installed.is_empty() {
            continue;
        }
        let _ = writeln!(output, "{language}");
        output.push_str(&format_installed(&installed));
    }

    if output.is_empty() {
        output = match language {
            Some(language) => format!("No {language} versions installed\n"),
            None => "Nothing installed yet\n".to_string(),
        };
    }
    Ok(output)
}

fn format_installed(installed: &[InstalledVersion]) -> String {
    let mut output = String::new();
    for entry in installed.iter().rev() {
        let marker = if entry.is_current { CURRENT_MARKER } else { " " };
        let date = entry
            .install_date
            .map(|date| date.format("%Y-%m-%d").to_string())
            .unwrap_or_default();
        let _ = writeln!(
            output,
            "  {marker} {:<16}{date}",
            entry.version.to_string()
        );
    }
    output
}

/// Remote versions of `language` grouped into `M.x` buckets.
pub async fn ls_remote(session: &Session, language: Language, latest: bool) -> Result<String, AppError> {
    let backend = session.quiet_backend(language)?;
    let remote = backend.list_remote().await?;
    Ok(format_buckets(&compose(&remote), latest))
}

fn format_buckets(buckets: &BucketMap, latest: bool) -> String {
    let mut output = String::new();
    if latest {
        for (key, version) in buckets.latest_per_bucket() {
            let _ = writeln!(output, "{key:<6}{version}");
        }
        return output;
    }

    for (key, versions) in buckets.iter() {
        let shown: Vec<String> = versions.iter().map(ToString::to_string).collect();
        let _ = writeln!(output, "{key:<6}{}", shown.join(", "));
    }
    output
}
