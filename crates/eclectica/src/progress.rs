use std::io::Write;
use std::thread::JoinHandle;

use crossbeam_channel::Receiver;

use eclectica_backend::InstallEvent;

/// Turns install events into terminal lines.
#[derive(Debug, Default)]
pub struct Printer {
    verbose: bool,
    last_percent: Option<u64>,
}

impl Printer {
    #[must_use]
    pub fn new(verbose: bool) -> Self {
        Self {
            verbose,
            last_percent: None,
        }
    }

    /// Text for `event`, or `None` when it is not worth a line.
    pub fn render(&mut self, event: &InstallEvent) -> Option<String> {
        let line = match event {
            InstallEvent::Started { language, version } => {
                format!("Language {language}\nVersion {version}")
            }
            InstallEvent::Phase(phase) => format!("> {phase}"),
            InstallEvent::Downloading { downloaded, total } => {
                let percent = percent(*downloaded, *total)?;
                if self.last_percent.is_some_and(|last| percent < last + 10 && percent < 100) {
                    return None;
                }
                self.last_percent = Some(percent);
                format!("  {} / {} ({percent}%)", megabytes(*downloaded), megabytes(*total))
            }
            InstallEvent::Output(line) if self.verbose => format!("  {line}"),
            InstallEvent::Output(_) => return None,
            InstallEvent::RolledBack { language, version } => {
                format!("> Rolled back {language} {version}")
            }
            InstallEvent::Done { language, version } => {
                format!("> {language} {version} is ready")
            }
        };
        Some(line)
    }
}

fn percent(downloaded: u64, total: u64) -> Option<u64> {
    (total > 0).then(|| downloaded.saturating_mul(100) / total)
}

#[allow(clippy::cast_precision_loss)]
fn megabytes(bytes: u64) -> String {
    format!("{:.1} MB", bytes as f64 / (1024.0 * 1024.0))
}

/// Print events from `receiver` until every sender is gone.
#[must_use]
pub fn spawn(receiver: Receiver<InstallEvent>, verbose: bool) -> JoinHandle<()> {
    std::thread::spawn(move || {
        let mut printer = Printer::new(verbose);
        let mut stdout = std::io::stdout();
        for event in receiver {
            if let Some(line) = printer.render(&event) {
                let _ = writeln!(stdout, "{line}");
            }
        }
        let _ = stdout.flush();
    })
}
