use std::path::{Path, PathBuf};

use log::{debug, info};
use tokio::process::Command;

use eclectica_backend::{BackendError, EventSink, InstallPhase};
use eclectica_platform::run_streaming;

/// Locate `tool` in `PATH` or explain which toolchain needed it.
pub(crate) fn require_tool(tool: &'static str, language: &'static str) -> Result<PathBuf, BackendError> {
    which::which(tool).map_err(|_| BackendError::MissingTool { tool, language })
}

/// `-j` value for parallel builds.
pub(crate) fn jobs() -> usize {
    std::thread::available_parallelism().map_or(2, std::num::NonZero::get)
}

/// A build command run inside an unpacked source tree with its output
/// forwarded to the event sink.
pub(crate) struct BuildStep<'a> {
    phase: InstallPhase,
    program: &'a str,
    args: Vec<String>,
    envs: Vec<(String, String)>,
}

impl<'a> BuildStep<'a> {
    pub(crate) fn new(phase: InstallPhase, program: &'a str) -> Self {
        Self {
            phase,
            program,
            args: Vec::new(),
            envs: Vec::new(),
        }
    }

    #[must_use]
    pub(crate) fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    #[must_use]
    pub(crate) fn env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.envs.push((key.into(), value.into()));
        self
    }

    pub(crate) async fn run(self, events: &EventSink, dir: &Path) -> Result<(), BackendError> {
        info!("{}: {} {}", self.phase, self.program, self.args.join(" "));
        events.phase(self.phase);

        let mut command = Command::new(self.program);
        command
            .args(&self.args)
            .current_dir(dir)
            .env("LC_ALL", "C")
            .envs(self.envs);
        debug!("Build step runs in {}", dir.display());

        run_streaming(command, |line| events.output(line)).await?;
        Ok(())
    }
}
