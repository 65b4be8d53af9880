use clap::Parser;
use colored::*;
use std::process;
use virid::cli::{commands, Cli, Commands};
use virid::{ConfigError, ViridError};

fn main() {
    let cli = Cli::parse();

    if let Err(e) = run(cli) {
        eprintln!("{} {:#}", "Error:".red().bold(), e);

        // Use appropriate exit codes based on error type
        let exit_code = match e.downcast_ref::<ViridError>() {
            Some(ViridError::Config(_)) => 2,
            Some(ViridError::Io(_)) => 3,
            Some(ViridError::Parse(_)) | Some(ViridError::InvalidInput(_)) => 4,
            Some(ViridError::Execution(_)) => 5,
            Some(ViridError::Other(_)) => 1,
            None if e.downcast_ref::<ConfigError>().is_some() => 2,
            None => 1,
        };
        process::exit(exit_code);
    }
}

fn run(cli: Cli) -> anyhow::Result<()> {
    let global = cli.global;

    match cli.command {
        Commands::Run(args) => commands::run::run(args, &global),
        Commands::Plan(args) => commands::plan::run(args, &global),
        Commands::Config(args) => commands::config::run(args, &global),
    }
}
