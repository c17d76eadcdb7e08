mod fs;
mod lock;
mod paths;
mod process;

pub use fs::{
    copy_dir, create_dir, find_dotfile, list_versions, read_link_version, read_version_file,
    remove_path, symlink, write_version_file,
};
pub use lock::{LanguageLock, LockError};
pub use paths::{AppPaths, AppPathsError, PROXY_BINARY};
pub use process::{CommandError, MAX_LINE_WIDTH, run_streaming};
