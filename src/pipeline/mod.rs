//! Local runner for the BLAST stage
//!
//! Validates the configuration once, builds every task up front, then runs
//! the tasks on a bounded pool and publishes `<sampleID>_blast.out` files
//! under `<outDir>/blast/`.

pub mod samples;

use chrono::{DateTime, Utc};
use indicatif::{ProgressBar, ProgressStyle};
use rayon::prelude::*;
use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};

use crate::core::config::{Config, ErrorStrategy};
use crate::core::paths;
use crate::error::{Result, ViridError};
use crate::tools::blast::{SampleUnit, TaskBuilder, TaskInvocation, TaskResult};
use crate::tools::executor::remove_stale;
use crate::tools::outfmt::{self, OutputFormat};
use crate::tools::traits::Executor;

/// A sample whose task failed under `ErrorStrategy::Ignore`
#[derive(Debug, Clone, Serialize)]
pub struct SampleFailure {
    pub sample_id: String,
    pub error: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct RunSummary {
    pub started: DateTime<Utc>,
    pub finished: DateTime<Utc>,
    pub publish_dir: PathBuf,
    pub results: Vec<TaskResult>,
    pub failures: Vec<SampleFailure>,
}

impl RunSummary {
    pub fn total_hits(&self) -> usize {
        self.results.iter().filter_map(|r| r.hits).sum()
    }
}

pub struct Runner<'a> {
    config: &'a Config,
    executor: &'a dyn Executor,
    launch_dir: PathBuf,
    available_cpus: usize,
    show_progress: bool,
}

impl<'a> Runner<'a> {
    pub fn new(config: &'a Config, executor: &'a dyn Executor, launch_dir: impl Into<PathBuf>) -> Self {
        Self {
            config,
            executor,
            launch_dir: launch_dir.into(),
            available_cpus: num_cpus::get(),
            show_progress: false,
        }
    }

    /// CPU budget shared by all concurrent tasks (0 = all available)
    pub fn with_available_cpus(mut self, cpus: usize) -> Self {
        if cpus > 0 {
            self.available_cpus = cpus;
        }
        self
    }

    pub fn with_progress(mut self, show: bool) -> Self {
        self.show_progress = show;
        self
    }

    /// Number of tasks run at once
    pub fn max_forks(&self) -> usize {
        match self.config.pipeline.max_forks {
            0 => (self.available_cpus / self.config.resources.cpus.max(1)).max(1),
            n => n,
        }
    }

    /// Validate and build every invocation without running anything.
    ///
    /// Query paths are made absolute because each task runs in its own
    /// working directory.
    pub fn plan(&self, units: &[SampleUnit]) -> Result<Vec<TaskInvocation>> {
        self.config.validate()?;
        let builder = TaskBuilder::new(&self.config.blast)?;
        samples::check_unique(units)?;

        Ok(units
            .iter()
            .map(|sample| {
                let sample = SampleUnit {
                    sample_id: sample.sample_id.clone(),
                    sequence_file: paths::resolve(&self.launch_dir, &sample.sequence_file),
                };
                builder.build(&sample, &self.config.resources)
            })
            .collect())
    }

    pub fn run(&self, units: &[SampleUnit]) -> Result<RunSummary> {
        let started = Utc::now();
        let invocations = self.plan(units)?;
        self.executor.verify_installation(&self.config.blast.script)?;

        let publish_dir = paths::publish_dir(&self.launch_dir, &self.config.pipeline);
        fs::create_dir_all(&publish_dir)?;

        let format = match OutputFormat::parse(&self.config.blast.output_format) {
            Ok(format) => Some(format),
            Err(e) => {
                tracing::warn!("Hit counts disabled: {}", e);
                None
            }
        };

        let forks = self.max_forks();
        tracing::info!(
            samples = invocations.len(),
            forks,
            cpus_per_task = self.config.resources.cpus,
            "Starting BLAST stage"
        );

        let progress = self.progress_bar(invocations.len() as u64);
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(forks)
            .build()
            .map_err(|e| ViridError::Other(format!("failed to build task pool: {}", e)))?;

        let run_one = |invocation: &TaskInvocation| {
            let outcome = self.run_task(invocation, &publish_dir, format.as_ref());
            progress.inc(1);
            outcome
        };

        let (results, failures) = match self.config.pipeline.error_strategy {
            ErrorStrategy::Terminate => {
                let results = pool.install(|| {
                    invocations
                        .par_iter()
                        .map(run_one)
                        .collect::<Result<Vec<_>>>()
                });
                progress.finish_and_clear();
                (results?, Vec::new())
            }
            ErrorStrategy::Ignore => {
                let outcomes: Vec<_> = pool.install(|| {
                    invocations
                        .par_iter()
                        .map(|invocation| (invocation.sample_id.clone(), run_one(invocation)))
                        .collect()
                });
                progress.finish_and_clear();

                let mut results = Vec::new();
                let mut failures = Vec::new();
                for (sample_id, outcome) in outcomes {
                    match outcome {
                        Ok(result) => results.push(result),
                        Err(e) if e.is_fatal() => return Err(e),
                        Err(e) => {
                            tracing::warn!(sample = %sample_id, "Task failed, ignoring: {}", e);
                            failures.push(SampleFailure {
                                sample_id,
                                error: e.to_string(),
                            });
                        }
                    }
                }
                (results, failures)
            }
        };

        tracing::info!(
            completed = results.len(),
            failed = failures.len(),
            "BLAST stage finished"
        );

        Ok(RunSummary {
            started,
            finished: Utc::now(),
            publish_dir,
            results,
            failures,
        })
    }

    fn run_task(
        &self,
        invocation: &TaskInvocation,
        publish_dir: &Path,
        format: Option<&OutputFormat>,
    ) -> Result<TaskResult> {
        let work_dir =
            paths::task_work_dir(&self.launch_dir, &self.config.pipeline, &invocation.sample_id);
        tracing::info!(sample = %invocation.sample_id, "Submitted BLAST task");

        let published = publish_dir.join(&invocation.output_file);
        remove_stale(&published)?;

        let produced = self.executor.execute(invocation, &work_dir)?;
        fs::copy(&produced, &published)?;

        let hits = match format {
            Some(format) => outfmt::count_hits(&published, format).unwrap_or_else(|e| {
                tracing::warn!(sample = %invocation.sample_id, "Could not read hits: {}", e);
                None
            }),
            None => None,
        };

        tracing::info!(
            sample = %invocation.sample_id,
            output = %published.display(),
            hits = ?hits,
            "Published BLAST output"
        );

        Ok(TaskResult {
            sample_id: invocation.sample_id.clone(),
            output_file: published,
            hits,
        })
    }

    fn progress_bar(&self, total: u64) -> ProgressBar {
        if !self.show_progress {
            return ProgressBar::hidden();
        }
        let pb = ProgressBar::new(total);
        if let Ok(style) = ProgressStyle::default_bar()
            .template("[{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} {msg}")
        {
            pb.set_style(style.progress_chars("=>-"));
        }
        pb.set_message("samples");
        pb
    }
}
