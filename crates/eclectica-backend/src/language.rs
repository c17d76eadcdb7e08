use std::fmt;
use std::str::FromStr;

/// The toolchains eclectica knows how to manage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Language {
    Node,
    Rust,
    Ruby,
    Go,
    Python,
    Elm,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown language \"{0}\", expected one of: node, rust, ruby, go, python, elm")]
pub struct UnknownLanguage(pub String);

impl Language {
    pub const ALL: [Language; 6] = [
        Language::Node,
        Language::Rust,
        Language::Ruby,
        Language::Go,
        Language::Python,
        Language::Elm,
    ];

    /// Name used for directories, dotfiles and on the command line.
    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            Self::Node => "node",
            Self::Rust => "rust",
            Self::Ruby => "ruby",
            Self::Go => "go",
            Self::Python => "python",
            Self::Elm => "elm",
        }
    }

    /// The `.<language>-version` file written by local installs.
    #[must_use]
    pub fn local_dotfile(self) -> String {
        format!(".{}-version", self.name())
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Language {
    type Err = UnknownLanguage;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "node" | "nodejs" | "node.js" => Ok(Self::Node),
            "rust" => Ok(Self::Rust),
            "ruby" => Ok(Self::Ruby),
            "go" | "golang" => Ok(Self::Go),
            "python" => Ok(Self::Python),
            "elm" => Ok(Self::Elm),
            other => Err(UnknownLanguage(other.to_string())),
        }
    }
}
