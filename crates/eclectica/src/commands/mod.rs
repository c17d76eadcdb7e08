mod install;
mod list;
mod shell;

pub use install::{install, remove};
pub use list::{ls, ls_remote};
pub use shell::{env, hook, path};
