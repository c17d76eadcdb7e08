use clap::Parser;

use eclectica::cli::{Cli, Command};
use eclectica::{AppError, Session, commands, logging};

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    if let Err(error) = run(cli).await {
        log::error!("{error}");
        eprintln!("> {error}");
        if let Some(hint) = error.hint() {
            eprintln!("{hint}");
        }
        std::process::exit(error.exit_code());
    }
}

async fn run(cli: Cli) -> Result<(), AppError> {
    let session = Session::load()?;
    logging::init_logging(
        &session.paths,
        session.settings.debug_enabled(),
        cli.verbose,
        session.settings.max_log_size_bytes,
    );
    log::debug!(
        "eclectica {} rooted at {}",
        env!("CARGO_PKG_VERSION"),
        session.paths.root.display()
    );

    let Some(command) = cli.command else {
        return match cli.target {
            Some(target) => commands::install(&session, &target, &cli.install, cli.verbose).await,
            None => {
                print!("{}", commands::ls(&session, None)?);
                Ok(())
            }
        };
    };

    match command {
        Command::Install { target, args } => {
            commands::install(&session, &target, &args, cli.verbose).await?;
        }
        Command::Remove { target } => {
            let version = commands::remove(&session, &target)?;
            println!("> Removed {} {version}", target.language);
        }
        Command::Ls { language } => print!("{}", commands::ls(&session, language)?),
        Command::LsRemote { language, latest } => {
            print!("{}", commands::ls_remote(&session, language, latest).await?);
        }
        Command::Env { language } => {
            print!("{}", commands::env(&session, language, &Session::current_dir()?)?);
        }
        Command::Path => println!("{}", commands::path(&session, std::env::var_os("PATH"))),
        Command::Init { shell } => print!("{}", commands::hook(shell.as_deref(), true)?),
        Command::Deinit { shell } => print!("{}", commands::hook(shell.as_deref(), false)?),
    }
    Ok(())
}
