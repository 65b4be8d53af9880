use anyhow::Result;
use clap::Args;
use std::path::PathBuf;

use super::OutputMode;
use crate::cli::{anchor_paths, logging, output, BlastArgs, GlobalArgs, SampleArgs};
use crate::core::config::ErrorStrategy;
use crate::core::paths;
use crate::error::ViridError;
use crate::pipeline::Runner;
use crate::tools::executor::ProcessExecutor;

#[derive(Args, Debug)]
pub struct RunArgs {
    #[command(flatten)]
    pub samples: SampleArgs,

    #[command(flatten)]
    pub blast: BlastArgs,

    /// Base output directory
    #[arg(long, env = "VIRID_OUT_DIR")]
    pub out_dir: Option<PathBuf>,

    /// Parent directory of per-task working directories
    #[arg(long, env = "VIRID_WORK_DIR")]
    pub work_dir: Option<PathBuf>,

    /// Run log (default: <out_dir>/reports/virID.log)
    #[arg(long, env = "VIRID_LOG_FILE")]
    pub log_file: Option<PathBuf>,

    /// What to do when a sample's task fails
    #[arg(long, value_enum)]
    pub error_strategy: Option<ErrorStrategy>,

    /// Maximum tasks run at once (0 = CPUs / cpus per task)
    #[arg(long)]
    pub max_forks: Option<usize>,

    /// Summary format
    #[arg(long, value_enum, default_value = "text")]
    pub format: OutputMode,

    /// Hide the progress bar
    #[arg(long)]
    pub no_progress: bool,
}

pub fn run(args: RunArgs, global: &GlobalArgs) -> Result<()> {
    let launch = paths::launch_dir()?;
    let mut config = global.load_config(&launch)?;
    args.blast.apply(&mut config);
    if let Some(out_dir) = &args.out_dir {
        config.pipeline.out_dir = out_dir.clone();
    }
    if let Some(work_dir) = &args.work_dir {
        config.pipeline.work_dir = work_dir.clone();
    }
    if let Some(log_file) = &args.log_file {
        config.pipeline.log_file = Some(log_file.clone());
    }
    if let Some(strategy) = args.error_strategy {
        config.pipeline.error_strategy = strategy;
    }
    if let Some(max_forks) = args.max_forks {
        config.pipeline.max_forks = max_forks;
    }
    anchor_paths(&mut config, &launch);

    // Nothing, not even the run log, is written for an invalid configuration
    config.validate().map_err(ViridError::from)?;

    logging::init(global.verbose, Some(&paths::run_log(&launch, &config.pipeline)))?;
    tracing::info!("virID BLAST stage, launched from {}", launch.display());
    tracing::debug!("{}", paths::describe_paths(&launch, &config.pipeline));

    let samples = args.samples.collect()?;
    let executor = ProcessExecutor::new();
    let runner = Runner::new(&config, &executor, &launch)
        .with_available_cpus(global.threads)
        .with_progress(!args.no_progress && args.format == OutputMode::Text);

    let summary = runner.run(&samples)?;

    match args.format {
        OutputMode::Json => println!("{}", serde_json::to_string_pretty(&summary)?),
        OutputMode::Text => {
            output::section_header("BLAST results");
            println!("{}", output::summary_table(&summary));
            let elapsed = summary.finished - summary.started;
            output::success(&format!(
                "{} of {} samples published to {} ({} hits, {}s)",
                summary.results.len(),
                samples.len(),
                summary.publish_dir.display(),
                summary.total_hits(),
                elapsed.num_seconds()
            ));
            for failure in &summary.failures {
                output::warning(&format!("{}: {}", failure.sample_id, failure.error));
            }
        }
    }

    Ok(())
}
