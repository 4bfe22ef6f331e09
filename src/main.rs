use std::path::PathBuf;
use std::process;

use clap::Parser as ClapParser;

use nox::error::NoxError;
use nox::nox::Nox;

#[derive(ClapParser, Debug)]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Script file to run; omit to start the REPL
    script: Option<PathBuf>,
}

fn main() -> anyhow::Result<()> {
    env_logger::init();

    let args: Cli = match Cli::try_parse() {
        Ok(args) => args,
        Err(err) => {
            let _ = err.print();

            // --help/--version exit cleanly; anything clap rejects (extra
            // arguments, bad flags) is a usage error.
            match err.kind() {
                clap::error::ErrorKind::DisplayHelp | clap::error::ErrorKind::DisplayVersion => {
                    process::exit(0)
                }
                _ => process::exit(64),
            }
        }
    };

    let mut runtime: Nox = Nox::new();

    match args.script {
        Some(path) => {
            if let Err(err) = runtime.run_file(&path) {
                eprintln!("{}", err);
                process::exit(exit_code(&err));
            }
        }

        None => {
            runtime.run_prompt()?;
        }
    }

    Ok(())
}

fn exit_code(err: &NoxError) -> i32 {
    match err {
        NoxError::Lex { .. } | NoxError::Parse { .. } => 65,
        NoxError::Resolve { .. } | NoxError::Runtime { .. } => 70,
        // Io: a missing or unreadable script path is a usage error.
        _ => 64,
    }
}
