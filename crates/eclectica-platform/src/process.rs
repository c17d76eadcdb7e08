use std::collections::VecDeque;
use std::process::{ExitStatus, Stdio};

use log::{debug, error, trace};
use thiserror::Error;
use tokio::io::{AsyncBufReadExt, AsyncReadExt, BufReader};
use tokio::process::Command;

/// Streamed output lines are cut to this many characters.
pub const MAX_LINE_WIDTH: usize = 80;

const TAIL_LINES: usize = 20;

#[derive(Debug, Error)]
pub enum CommandError {
    #[error("failed to start {program}: {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("{details}")]
    Failed {
        program: String,
        code: Option<i32>,
        details: String,
    },

    #[error("failed to read output of {program}: {source}")]
    Io {
        program: String,
        #[source]
        source: std::io::Error,
    },
}

fn program_name(command: &Command) -> String {
    command
        .as_std()
        .get_program()
        .to_string_lossy()
        .into_owned()
}

/// Run `command`, handing every non-empty stdout line to `on_line` while
/// the process runs.
///
/// Lines are trimmed and cut to [`MAX_LINE_WIDTH`] characters. The child is
/// killed if the returned future is dropped.
///
/// # Errors
/// Returns [`CommandError::Failed`] carrying stderr (or the tail of stdout
/// when stderr is empty) if the process exits unsuccessfully.
pub async fn run_streaming(
    mut command: Command,
    mut on_line: impl FnMut(&str) + Send,
) -> Result<(), CommandError> {
    let program = program_name(&command);
    debug!("Running {program} with streamed output");

    let mut child = command
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true)
        .spawn()
        .map_err(|source| CommandError::Spawn {
            program: program.clone(),
            source,
        })?;

    let stderr_task = child.stderr.take().map(|mut stderr| {
        tokio::spawn(async move {
            let mut buffer = Vec::new();
            if let Err(error) = stderr.read_to_end(&mut buffer).await {
                debug!("Stopped reading stderr: {error}");
            }
            String::from_utf8_lossy(&buffer).into_owned()
        })
    });

    let mut tail: VecDeque<String> = VecDeque::with_capacity(TAIL_LINES);
    if let Some(stdout) = child.stdout.take() {
        let mut reader = BufReader::new(stdout);
        let mut raw = Vec::new();
        loop {
            raw.clear();
            let read = reader
                .read_until(b'\n', &mut raw)
                .await
                .map_err(|source| CommandError::Io {
                    program: program.clone(),
                    source,
                })?;
            if read == 0 {
                break;
            }

            // Non-UTF-8 bytes become U+FFFD.
            let decoded = String::from_utf8_lossy(&raw);
            let line = decoded.trim();
            if line.is_empty() {
                continue;
            }
            trace!("{program}: {line}");
            on_line(&truncate_line(line));

            if tail.len() == TAIL_LINES {
                tail.pop_front();
            }
            tail.push_back(line.to_string());
        }
    }

    let status = child.wait().await.map_err(|source| CommandError::Io {
        program: program.clone(),
        source,
    })?;

    let stderr = match stderr_task {
        Some(task) => task.await.unwrap_or_default(),
        None => String::new(),
    };

    if status.success() {
        return Ok(());
    }

    let stdout_tail = tail.into_iter().collect::<Vec<_>>().join("\n");
    let details = describe_failure(&stderr, &stdout_tail, status);
    error!("{program} failed: {details}");
    Err(CommandError::Failed {
        program,
        code: status.code(),
        details,
    })
}

fn truncate_line(line: &str) -> String {
    line.chars().take(MAX_LINE_WIDTH).collect()
}

fn describe_failure(stderr: &str, stdout: &str, status: ExitStatus) -> String {
    let stderr = stderr.trim();
    if !stderr.is_empty() {
        return stderr.to_string();
    }

    let stdout = stdout.trim();
    if !stdout.is_empty() {
        return stdout.to_string();
    }

    match status.code() {
        Some(code) => format!("unknown error, command exited with status {code}"),
        None => "unknown error, command was terminated by a signal".to_string(),
    }
}
