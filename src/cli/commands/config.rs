use anyhow::{bail, Result};
use clap::{Args, Subcommand, ValueEnum};
use std::path::PathBuf;

use crate::cli::{logging, output, BlastArgs, GlobalArgs};
use crate::core::config::{default_config, save_config, to_toml};
use crate::core::paths;

#[derive(Args)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub command: ConfigCommands,
}

#[derive(Subcommand)]
pub enum ConfigCommands {
    /// Print the effective configuration
    Show(ShowArgs),

    /// Write a configuration file with the defaults
    Init(InitArgs),

    /// Show where outputs, work directories and the run log go
    Paths,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ConfigFormat {
    Toml,
    Json,
}

#[derive(Args)]
pub struct ShowArgs {
    #[command(flatten)]
    pub blast: BlastArgs,

    /// Output format
    #[arg(long, value_enum, default_value = "toml")]
    pub format: ConfigFormat,
}

#[derive(Args)]
pub struct InitArgs {
    /// Where to write the file
    #[arg(default_value = crate::cli::DEFAULT_CONFIG_FILE)]
    pub path: PathBuf,

    /// Overwrite an existing file
    #[arg(long)]
    pub force: bool,
}

pub fn run(args: ConfigArgs, global: &GlobalArgs) -> Result<()> {
    logging::init(global.verbose, None)?;
    let launch = paths::launch_dir()?;

    match args.command {
        ConfigCommands::Show(show) => {
            let mut config = global.load_config(&launch)?;
            show.blast.apply(&mut config);
            match show.format {
                ConfigFormat::Toml => print!("{}", to_toml(&config)?),
                ConfigFormat::Json => println!("{}", serde_json::to_string_pretty(&config)?),
            }
            if let Err(e) = config.validate() {
                output::warning(&e.to_string());
            }
        }
        ConfigCommands::Init(init) => {
            if init.path.exists() && !init.force {
                bail!("{:?} already exists (use --force to overwrite)", init.path);
            }
            save_config(&init.path, &default_config())?;
            output::success(&format!("Wrote default configuration to {}", init.path.display()));
        }
        ConfigCommands::Paths => {
            let config = global.load_config(&launch)?;
            println!("{}", paths::describe_paths(&launch, &config.pipeline));
        }
    }

    Ok(())
}
