use std::fs::{self, File, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use simplelog::{
    ColorChoice, CombinedLogger, ConfigBuilder, LevelFilter, SharedLogger, TermLogger,
    TerminalMode, WriteLogger,
};

use eclectica_platform::AppPaths;

/// Append handle on `debug.log`. The file is reopened when it vanished
/// between two records, e.g. after the whole root was wiped.
struct LogFile {
    path: PathBuf,
    file: File,
}

impl LogFile {
    fn open(path: PathBuf) -> io::Result<Self> {
        let file = append_to(&path)?;
        Ok(Self { path, file })
    }
}

fn append_to(path: &Path) -> io::Result<File> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    OpenOptions::new().create(true).append(true).open(path)
}

impl Write for LogFile {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        if !self.path.exists() {
            self.file = append_to(&self.path)?;
        }
        self.file.write(buf)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.file.flush()
    }
}

/// Once the log grows past `limit` bytes, keep only its newest whole lines
/// fitting in half of `limit`.
fn rotate(path: &Path, limit: u64) -> io::Result<()> {
    let size = match fs::metadata(path) {
        Ok(metadata) => metadata.len(),
        Err(error) if error.kind() == io::ErrorKind::NotFound => return Ok(()),
        Err(error) => return Err(error),
    };
    if size <= limit {
        return Ok(());
    }

    let contents = fs::read(path)?;
    let budget = usize::try_from(limit / 2).unwrap_or(usize::MAX);
    let cut = contents.len().saturating_sub(budget);
    let start = contents[cut..]
        .iter()
        .position(|&byte| byte == b'\n')
        .map_or(contents.len(), |newline| cut + newline + 1);
    fs::write(path, &contents[start..])
}

/// Log to `debug.log` under the data directory and, with `verbose`, to
/// stderr as well. Nothing is recorded unless `debug_enabled` or `verbose`.
pub fn init_logging(paths: &AppPaths, debug_enabled: bool, verbose: bool, max_log_size: u64) {
    let log_path = paths.log_file();
    let recording = debug_enabled || verbose;

    if recording && let Err(error) = rotate(&log_path, max_log_size) {
        eprintln!("Cannot shorten {}: {error}", log_path.display());
    }

    let config = ConfigBuilder::new()
        .set_time_format_rfc3339()
        .add_filter_allow_str("eclectica")
        .build();

    let mut loggers: Vec<Box<dyn SharedLogger>> = Vec::new();
    if verbose {
        loggers.push(TermLogger::new(
            LevelFilter::Debug,
            config.clone(),
            TerminalMode::Stderr,
            ColorChoice::Auto,
        ));
    }
    if recording {
        match LogFile::open(log_path.clone()) {
            Ok(file) => loggers.push(WriteLogger::new(LevelFilter::Debug, config, file)),
            Err(error) => eprintln!("Cannot open {}: {error}", log_path.display()),
        }
    }

    if !loggers.is_empty() {
        let _ = CombinedLogger::init(loggers);
    }
    set_logging_enabled(recording);

    if debug_enabled {
        log::info!("Debug log at {}", log_path.display());
    }
}

pub fn set_logging_enabled(enabled: bool) {
    if enabled {
        log::set_max_level(log::LevelFilter::Debug);
    } else {
        log::set_max_level(log::LevelFilter::Off);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn log_file_is_reopened_after_removal() {
        let temp = tempfile::tempdir().unwrap();
        let path = temp.path().join("debug.log");
        let mut log = LogFile::open(path.clone()).unwrap();

        log.write_all(b"resolving node 6\n").unwrap();
        std::fs::remove_file(&path).unwrap();
        log.write_all(b"installing node 6.8.0\n").unwrap();

        assert_eq!(std::fs::read_to_string(&path).unwrap(), "installing node 6.8.0\n");
    }

    #[test]
    fn log_file_creates_data_dir() {
        let temp = tempfile::tempdir().unwrap();
        let path = temp.path().join("data/eclectica/debug.log");

        LogFile::open(path.clone()).unwrap();

        assert!(path.is_file());
    }

    #[test]
    fn rotate_keeps_newest_whole_lines() {
        let temp = tempfile::tempdir().unwrap();
        let path = temp.path().join("debug.log");
        std::fs::write(&path, "line-1\nline-2\nline-3\nline-4\nline-5\n").unwrap();

        rotate(&path, 20).unwrap();

        assert_eq!(std::fs::read_to_string(&path).unwrap(), "line-5\n");
    }

    #[test]
    fn rotate_leaves_small_or_missing_log_alone() {
        let temp = tempfile::tempdir().unwrap();
        let path = temp.path().join("debug.log");
        rotate(&path, 10).unwrap();
        assert!(!path.exists());

        std::fs::write(&path, "line-1\n").unwrap();
        rotate(&path, 1024).unwrap();
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "line-1\n");
    }

    #[test]
    fn set_logging_enabled_updates_global_level() {
        set_logging_enabled(true);
        assert_eq!(log::max_level(), log::LevelFilter::Debug);

        set_logging_enabled(false);
        assert_eq!(log::max_level(), log::LevelFilter::Off);
    }
}
