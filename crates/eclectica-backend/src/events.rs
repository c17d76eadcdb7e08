use std::fmt;

use crossbeam_channel::{Receiver, Sender};

use crate::language::Language;
use eclectica_versions::Version;

/// Coarse stages reported while an install runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InstallPhase {
    Download,
    Extract,
    Configure,
    Build,
    Install,
    PostInstall,
    Modules,
    Link,
    Switch,
}

impl fmt::Display for InstallPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Download => "Downloading",
            Self::Extract => "Extracting",
            Self::Configure => "Configuring",
            Self::Build => "Building",
            Self::Install => "Installing",
            Self::PostInstall => "Finishing installation",
            Self::Modules => "Reapplying modules",
            Self::Link => "Linking",
            Self::Switch => "Switching",
        };
        f.write_str(label)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InstallEvent {
    Started { language: Language, version: Version },
    Phase(InstallPhase),
    Downloading { downloaded: u64, total: u64 },
    Output(String),
    RolledBack { language: Language, version: Version },
    Done { language: Language, version: Version },
}

/// Sending half of the progress channel. A disabled sink drops events.
#[derive(Debug, Clone, Default)]
pub struct EventSink {
    sender: Option<Sender<InstallEvent>>,
}

impl EventSink {
    #[must_use]
    pub fn channel() -> (Self, Receiver<InstallEvent>) {
        let (sender, receiver) = crossbeam_channel::unbounded();
        (
            Self {
                sender: Some(sender),
            },
            receiver,
        )
    }

    #[must_use]
    pub fn disabled() -> Self {
        Self::default()
    }

    pub fn emit(&self, event: InstallEvent) {
        if let Some(sender) = &self.sender {
            // The receiver going away only means nobody is watching.
            let _ = sender.send(event);
        }
    }

    pub fn phase(&self, phase: InstallPhase) {
        self.emit(InstallEvent::Phase(phase));
    }

    pub fn output(&self, line: &str) {
        self.emit(InstallEvent::Output(line.to_string()));
    }
}
