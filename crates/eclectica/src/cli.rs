use std::fmt;
use std::str::FromStr;

use clap::{Args, Parser, Subcommand};

use eclectica_backend::{Language, UnknownLanguage};

#[derive(Parser, Debug)]
#[command(name = "ec", version, about = "Manage versions of node, go, rust, ruby, python and elm")]
#[command(args_conflicts_with_subcommands = true)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Command>,

    /// Install and activate `<language>@<version>`, e.g. `node@6` or `go@latest`
    pub target: Option<Target>,

    #[command(flatten)]
    pub install: InstallArgs,

    /// Print debug logs to stderr
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Install a version and make it active
    #[command(alias = "i")]
    Install {
        target: Target,

        #[command(flatten)]
        args: InstallArgs,
    },

    /// Remove an installed version
    #[command(alias = "rm")]
    Remove { target: Target },

    /// List installed versions
    Ls { language: Option<Language> },

    /// List versions available for download, grouped by major
    #[command(name = "ls-remote")]
    LsRemote {
        language: Language,

        /// Only show the newest version of each major
        #[arg(long)]
        latest: bool,
    },

    /// Print the environment variables the active version needs
    Env { language: Language },

    /// Print PATH with the proxy directory in front
    Path,

    /// Add the PATH hook to your shell startup files
    Init {
        /// Shell to configure instead of $SHELL
        #[arg(long)]
        shell: Option<String>,
    },

    /// Remove the PATH hook from your shell startup files
    Deinit {
        #[arg(long)]
        shell: Option<String>,
    },
}

#[derive(Args, Debug, Clone, Default, PartialEq, Eq)]
pub struct InstallArgs {
    /// Activate for the current directory only
    #[arg(short, long)]
    pub local: bool,

    /// Carry globally installed node packages over to the new version
    #[arg(long)]
    pub with_modules: bool,
}

/// `<language>[@<version>]` as typed on the command line. The version is
/// kept verbatim and may be partial, an alias, or empty.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Target {
    pub language: Language,
    pub version: String,
}

impl FromStr for Target {
    type Err = UnknownLanguage;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (language, version) = s.split_once('@').unwrap_or((s, ""));
        Ok(Self {
            language: language.parse()?,
            version: version.trim().to_string(),
        })
    }
}

impl fmt::Display for Target {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.version.is_empty() {
            write!(f, "{}", self.language)
        } else {
            write!(f, "{}@{}", self.language, self.version)
        }
    }
}
