pub mod commands;
pub mod logging;
pub mod output;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use std::path::{Path, PathBuf};

use crate::core::config::{self, Config, SearchType, TaxidFilter};
use crate::core::paths;
use crate::error::ViridError;
use crate::pipeline::samples;
use crate::tools::blast::SampleUnit;

/// Config file picked up from the launch directory when --config is not given
pub const DEFAULT_CONFIG_FILE: &str = "virid.toml";

#[derive(Parser)]
#[command(
    name = "virid",
    version,
    about = "BLASTN search stage of the virID pipeline",
    long_about = "Runs the BLASTN wrapper script once per sample with a validated configuration, \
                  publishing <sampleID>_blast.out files under <outDir>/blast/."
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    #[command(flatten)]
    pub global: GlobalArgs,
}

#[derive(Args, Debug, Clone)]
pub struct GlobalArgs {
    /// Verbosity level (can be repeated)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// CPUs available to the whole run (0 = all available)
    #[arg(short = 'j', long, default_value = "0", global = true)]
    pub threads: usize,

    /// Configuration file (TOML)
    #[arg(short, long, env = "VIRID_CONFIG", global = true)]
    pub config: Option<PathBuf>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Run BLASTN for every sample and publish the outputs
    Run(commands::run::RunArgs),

    /// Print the commands that would run, without running them
    Plan(commands::plan::PlanArgs),

    /// Inspect or create configuration files
    Config(commands::config::ConfigArgs),
}

/// Overrides for the BLAST options; each flag can also be set from the environment
#[derive(Args, Debug, Clone, Default)]
pub struct BlastArgs {
    /// BLAST database to search against
    #[arg(long, env = "VIRID_BLAST_DB")]
    pub database: Option<PathBuf>,

    /// E-value threshold
    #[arg(long, env = "VIRID_EVALUE")]
    pub evalue: Option<f64>,

    /// BLAST -outfmt value, e.g. "6 qseqid sseqid evalue"
    #[arg(long = "outfmt", env = "VIRID_OUTFMT")]
    pub output_format: Option<String>,

    /// Log file handed to the wrapper script
    #[arg(id = "blast_log", long = "blast-log", env = "VIRID_BLAST_LOG")]
    pub log_file: Option<PathBuf>,

    /// BLASTN task
    #[arg(long, value_enum, env = "VIRID_SEARCH_TYPE")]
    pub search_type: Option<SearchType>,

    /// Maximum HSPs per query-subject pair
    #[arg(long, env = "VIRID_MAX_HSPS")]
    pub max_hsps: Option<u32>,

    /// Maximum target sequences reported
    #[arg(long, env = "VIRID_MAX_TARGETS")]
    pub max_targets: Option<u32>,

    /// Taxids to restrict the search to, or "no"
    #[arg(long, env = "VIRID_RESTRICT_TAXIDS")]
    pub restrict_taxids: Option<TaxidFilter>,

    /// Taxids to exclude from the search, or "no"
    #[arg(long, env = "VIRID_IGNORE_TAXIDS")]
    pub ignore_taxids: Option<TaxidFilter>,

    /// Wrapper script that runs blastn
    #[arg(long, env = "VIRID_BLAST_SCRIPT")]
    pub script: Option<PathBuf>,

    /// CPUs allotted to each task (BLAST thread count)
    #[arg(long, env = "VIRID_CPUS")]
    pub cpus: Option<usize>,
}

impl BlastArgs {
    pub fn apply(&self, config: &mut Config) {
        let blast = &mut config.blast;
        if let Some(database) = &self.database {
            blast.database = database.clone();
        }
        if let Some(evalue) = self.evalue {
            blast.evalue = evalue;
        }
        if let Some(format) = &self.output_format {
            blast.output_format = format.clone();
        }
        if let Some(log_file) = &self.log_file {
            blast.log_file = log_file.clone();
        }
        if let Some(search_type) = self.search_type {
            blast.search_type = search_type;
        }
        if let Some(max_hsps) = self.max_hsps {
            blast.max_hsps = max_hsps;
        }
        if let Some(max_targets) = self.max_targets {
            blast.max_targets = max_targets;
        }
        if let Some(filter) = &self.restrict_taxids {
            blast.restrict_taxids = filter.clone();
        }
        if let Some(filter) = &self.ignore_taxids {
            blast.ignore_taxids = filter.clone();
        }
        if let Some(script) = &self.script {
            blast.script = script.clone();
        }
        if let Some(cpus) = self.cpus {
            config.resources.cpus = cpus;
        }
    }
}

/// Where the samples come from
#[derive(Args, Debug, Clone, Default)]
pub struct SampleArgs {
    /// Sample sheet with `sample_id,path` rows
    #[arg(long, env = "VIRID_SAMPLESHEET")]
    pub samplesheet: Option<PathBuf>,

    /// FASTA files or glob patterns; the sample ID is the file name without extension
    pub inputs: Vec<String>,
}

impl SampleArgs {
    pub fn collect(&self) -> crate::Result<Vec<SampleUnit>> {
        let mut units = match &self.samplesheet {
            Some(sheet) => samples::from_sheet(sheet)?,
            None => Vec::new(),
        };
        if !self.inputs.is_empty() {
            units.extend(samples::from_paths(&self.inputs)?);
        }
        if units.is_empty() {
            return Err(ViridError::InvalidInput(
                "no samples given (use --samplesheet or list FASTA files)".to_string(),
            ));
        }
        Ok(units)
    }
}

impl GlobalArgs {
    /// Defaults, then the config file, if any
    pub fn load_config(&self, launch: &Path) -> Result<Config> {
        let path = match &self.config {
            Some(path) => Some(path.clone()),
            None => Some(launch.join(DEFAULT_CONFIG_FILE)).filter(|p| p.is_file()),
        };

        match path {
            Some(path) => {
                let config = config::load_config(&path)
                    .with_context(|| format!("Failed to load config from {:?}", path))?;
                Ok(config)
            }
            None => Ok(config::default_config()),
        }
    }
}

/// Anchor relative script and log paths at the launch directory, since each
/// task runs in its own working directory. A bare script name is left for
/// PATH lookup and the database is left for BLASTDB resolution.
pub fn anchor_paths(config: &mut Config, launch: &Path) {
    let blast = &mut config.blast;
    if blast.script.components().count() > 1 {
        blast.script = paths::resolve(launch, &blast.script);
    }
    if !blast.log_file.as_os_str().is_empty() {
        blast.log_file = paths::resolve(launch, &blast.log_file);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_overrides_apply_on_top_of_config() {
        let cli = Cli::try_parse_from([
            "virid",
            "plan",
            "--restrict-taxids",
            "10239",
            "--evalue",
            "1e-5",
            "--search-type",
            "blastn",
            "--cpus",
            "4",
            "s1.fasta",
        ])
        .unwrap();

        let Commands::Plan(args) = cli.command else {
            panic!("expected plan");
        };

        let mut config = Config::default();
        args.blast.apply(&mut config);
        assert_eq!(config.blast.restrict_taxids, TaxidFilter::from("10239"));
        assert_eq!(config.blast.ignore_taxids, TaxidFilter::Off);
        assert_eq!(config.blast.evalue, 1e-5);
        assert_eq!(config.blast.search_type, SearchType::Blastn);
        assert_eq!(config.resources.cpus, 4);
        assert_eq!(args.samples.inputs, vec!["s1.fasta"]);
    }

    #[test]
    fn test_anchor_paths() {
        let mut config = Config::default();
        config.blast.script = PathBuf::from("bin/blast.sh");
        config.blast.log_file = PathBuf::from("logs/blast.log");
        anchor_paths(&mut config, Path::new("/launch"));

        assert_eq!(config.blast.script, PathBuf::from("/launch/bin/blast.sh"));
        assert_eq!(config.blast.log_file, PathBuf::from("/launch/logs/blast.log"));

        let mut config = Config::default();
        anchor_paths(&mut config, Path::new("/launch"));
        assert_eq!(config.blast.script, PathBuf::from("blast.sh"));
        assert_eq!(config.blast.log_file, PathBuf::new());
    }
}
