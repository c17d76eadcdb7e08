//! Copied into the proxy directory once per exposed command. Runs the
//! matching executable of whichever version is active where it is invoked.

use eclectica::{AppError, Session, dispatch, logging};

fn main() {
    if let Err(error) = run() {
        eprintln!("> {error}");
        std::process::exit(error.exit_code());
    }
}

fn run() -> Result<(), AppError> {
    let mut args = std::env::args_os();
    let argv0 = args.next().unwrap_or_default();
    let bin = dispatch::invoked_name(&argv0)
        .ok_or_else(|| AppError::UnknownCommand(argv0.to_string_lossy().into_owned()))?;

    let session = Session::load()?;
    if session.settings.debug_enabled() {
        logging::init_logging(
            &session.paths,
            true,
            false,
            session.settings.max_log_size_bytes,
        );
    }

    let resolved = dispatch::resolve(&session, &bin, &Session::current_dir()?)?;
    match dispatch::exec(&resolved, args)? {}
}
