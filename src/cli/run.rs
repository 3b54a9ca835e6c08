use anyhow::Result;

use super::{
    args::{Arguments, Command},
    commands::{init::init, resolve::resolve},
    exit_status::ExitStatus,
};

/// Dispatch to the command handler for the parsed arguments.
pub fn run(Arguments { command }: Arguments) -> Result<ExitStatus> {
    match command {
        Some(Command::Resolve(cmd)) => resolve(cmd),
        Some(Command::Init) => init(),
        None => {
            anyhow::bail!("No command provided. Use --help to see available commands.")
        }
    }
}
