mod commands;
mod helpers;

use clap::Parser;
use tabstudy_core::ImportError;

pub fn run_from_env() -> i32 {
    match parse_and_dispatch() {
        Ok(code) => code,
        Err(error) => {
            let import_error = error.as_import_error();
            eprintln!("{}", import_error.diagnostic_line());
            eprintln!("{}", import_error.fatal_exit_line());
            import_error.exit_code()
        }
    }
}

fn parse_and_dispatch() -> Result<i32, CliError> {
    match Cli::try_parse() {
        Ok(cli) => dispatch_parsed(cli.command),
        Err(err) => match err.kind() {
            clap::error::ErrorKind::DisplayHelp | clap::error::ErrorKind::DisplayVersion => {
                print!("{}", err);
                Ok(0)
            }
            _ => Err(CliError::Usage(err.to_string())),
        },
    }
}

#[derive(Parser)]
#[command(name = "tabstudy", about = "Tab-delimited study export importer")]
struct Cli {
    #[command(subcommand)]
    command: CliCommand,
}

#[derive(clap::Subcommand)]
enum CliCommand {
    /// Import the manifest's data files and export the consolidated study map
    Import(commands::ImportArgs),
}

fn dispatch_parsed(command: CliCommand) -> Result<i32, CliError> {
    match command {
        CliCommand::Import(args) => commands::run_import_command(args),
    }
}

#[derive(Debug, thiserror::Error)]
pub enum CliError {
    #[error("{0}")]
    Usage(String),
    #[error("{0}")]
    Import(ImportError),
    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

impl CliError {
    fn as_import_error(&self) -> ImportError {
        match self {
            Self::Usage(message) => {
                ImportError::input_validation("INPUT.CLI_USAGE", message.clone())
            }
            Self::Import(error) => error.clone(),
            Self::Internal(error) => ImportError::io_system("IO.CLI", format!("{error:#}")),
        }
    }
}
