//! CLI argument definitions using clap.
//!
//! ## Commands
//!
//! - `resolve`: Resolve custom properties in stylesheets
//! - `init`: Initialize unvar configuration file

use std::path::PathBuf;

use clap::{Args, CommandFactory, Parser, Subcommand};

#[derive(Debug, Parser)]
#[command(author, version, about, long_about = None)]
pub struct Arguments {
    #[command(subcommand)]
    pub command: Option<Command>,
}

impl Arguments {
    /// Check if a command was provided, otherwise print help and return None.
    pub fn with_command_or_help(self) -> Option<Self> {
        if self.command.is_none() {
            Self::command().print_help().ok();
            None
        } else {
            Some(self)
        }
    }

    /// Get the verbose flag from the command's common args.
    pub fn verbose(&self) -> bool {
        match &self.command {
            Some(Command::Resolve(cmd)) => cmd.args.common.verbose,
            Some(Command::Init) | None => false,
        }
    }
}

/// Common arguments shared by all commands.
#[derive(Debug, Clone, Args)]
pub struct CommonArgs {
    /// Configuration file (default: nearest .unvarrc.json)
    #[arg(long, env = "UNVAR_CONFIG")]
    pub config: Option<PathBuf>,

    /// Enable verbose output
    #[arg(short, long)]
    pub verbose: bool,
}

#[derive(Debug, Parser)]
pub struct ResolveArgs {
    #[command(flatten)]
    pub common: CommonArgs,

    /// Import definitions from a file (overrides config file)
    /// Can be specified multiple times; later files win
    #[arg(long = "import-from", value_name = "PATH")]
    pub import_from: Vec<PathBuf>,

    /// Export the final definitions to a file (overrides config file)
    /// Can be specified multiple times
    #[arg(long = "export-to", value_name = "PATH")]
    pub export_to: Vec<PathBuf>,

    /// Remove definitions and replace declarations in place
    #[arg(long)]
    pub no_preserve: bool,

    /// Write results into this directory instead of stdout
    #[arg(long, value_name = "DIR", conflicts_with = "write")]
    pub out_dir: Option<PathBuf>,

    /// Overwrite the input files
    #[arg(long)]
    pub write: bool,
}

#[derive(Debug, Args)]
pub struct ResolveCommand {
    /// Stylesheets, or directories to search for .css and .pcss files
    #[arg(required = true, value_name = "INPUT")]
    pub inputs: Vec<PathBuf>,
    #[command(flatten)]
    pub args: ResolveArgs,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Replace var() references with the values of their custom properties
    Resolve(ResolveCommand),
    /// Initialize a new .unvarrc.json configuration file
    Init,
}
