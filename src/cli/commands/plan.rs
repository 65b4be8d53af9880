use anyhow::Result;
use clap::Args;

use super::OutputMode;
use crate::cli::{anchor_paths, logging, output, BlastArgs, GlobalArgs, SampleArgs};
use crate::core::paths;
use crate::pipeline::Runner;
use crate::tools::executor::ProcessExecutor;

#[derive(Args, Debug)]
pub struct PlanArgs {
    #[command(flatten)]
    pub samples: SampleArgs,

    #[command(flatten)]
    pub blast: BlastArgs,

    /// Output format
    #[arg(long, value_enum, default_value = "text")]
    pub format: OutputMode,
}

pub fn run(args: PlanArgs, global: &GlobalArgs) -> Result<()> {
    logging::init(global.verbose, None)?;

    let launch = paths::launch_dir()?;
    let mut config = global.load_config(&launch)?;
    args.blast.apply(&mut config);
    anchor_paths(&mut config, &launch);

    let samples = args.samples.collect()?;
    let executor = ProcessExecutor::new();
    let runner = Runner::new(&config, &executor, &launch).with_available_cpus(global.threads);
    let invocations = runner.plan(&samples)?;

    match args.format {
        OutputMode::Json => println!("{}", serde_json::to_string_pretty(&invocations)?),
        OutputMode::Text => {
            output::section_header("Planned BLAST tasks");
            println!("{}", output::plan_table(&invocations));
            output::info(&format!(
                "{} tasks, {} at a time, {} CPU(s) each",
                invocations.len(),
                runner.max_forks(),
                config.resources.cpus
            ));
        }
    }

    Ok(())
}
