//! BLASTN task construction
//!
//! Turns the validated [`BlastConfig`] and one [`SampleUnit`] into the exact
//! argument list the `blast.sh` wrapper expects. Construction is pure: no
//! files are touched and no process is started here; see
//! [`crate::tools::executor`] for that.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::core::config::BlastConfig;
use crate::error::{ConfigError, Result};

/// Suffix of the per-sample output file, `<sampleID>_blast.out`
pub const OUTPUT_SUFFIX: &str = "_blast.out";

/// Wrapper script flags in the order they are emitted
pub const FLAGS: [&str; 13] = [
    "-d", // database
    "-q", // query sequence file
    "-o", // output file
    "-t", // threads
    "-e", // e-value
    "-f", // output format
    "-l", // log file
    "-b", // search type
    "-m", // max HSPs
    "-s", // max target sequences
    "-r", // restrict taxids
    "-i", // ignore taxids
    "-n", // sample ID
];

/// Output file name for a sample
pub fn output_file_name(sample_id: &str) -> String {
    format!("{}{}", sample_id, OUTPUT_SUFFIX)
}

/// One sample's input: its identifier and query sequence file
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SampleUnit {
    pub sample_id: String,
    pub sequence_file: PathBuf,
}

impl SampleUnit {
    pub fn new(sample_id: impl Into<String>, sequence_file: impl Into<PathBuf>) -> Self {
        Self {
            sample_id: sample_id.into(),
            sequence_file: sequence_file.into(),
        }
    }
}

/// Resources allotted to a single task
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TaskResources {
    /// Passed to BLAST as its thread count
    pub cpus: usize,
}

impl Default for TaskResources {
    fn default() -> Self {
        Self { cpus: 1 }
    }
}

impl TaskResources {
    pub fn with_cpus(cpus: usize) -> Self {
        Self { cpus }
    }

    pub fn validate(&self) -> std::result::Result<(), ConfigError> {
        if self.cpus == 0 {
            return Err(ConfigError::InvalidValue {
                field: "cpus",
                reason: "at least one CPU per task is required".to_string(),
            });
        }
        Ok(())
    }
}

/// Fully-formed external command for one sample
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TaskInvocation {
    pub sample_id: String,
    pub program: PathBuf,
    pub args: Vec<String>,
    /// File the command must leave in its working directory
    pub output_file: PathBuf,
}

impl TaskInvocation {
    /// Value bound to `flag`, if the flag is present
    pub fn flag_value(&self, flag: &str) -> Option<&str> {
        self.args
            .iter()
            .position(|arg| arg == flag)
            .and_then(|idx| self.args.get(idx + 1))
            .map(String::as_str)
    }

    /// Shell rendering for dry runs and logs
    pub fn command_line(&self) -> String {
        std::iter::once(self.program.to_string_lossy().into_owned())
            .chain(self.args.iter().cloned())
            .map(|token| shell_quote(&token))
            .collect::<Vec<_>>()
            .join(" ")
    }
}

/// Outcome of one sample's task after publishing
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TaskResult {
    pub sample_id: String,
    pub output_file: PathBuf,
    /// Rows read back from a tabular output; `None` for other formats
    pub hits: Option<usize>,
}

/// Builds invocations from a configuration that has already passed validation.
///
/// Holding a `TaskBuilder` is proof the taxonomy filters are consistent, so
/// [`TaskBuilder::build`] cannot fail. The builder is read-only and can be
/// shared across threads.
#[derive(Debug, Clone)]
pub struct TaskBuilder {
    config: BlastConfig,
}

impl TaskBuilder {
    /// Validate `config` once for the whole run
    pub fn new(config: &BlastConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            config: config.clone(),
        })
    }

    pub fn config(&self) -> &BlastConfig {
        &self.config
    }

    pub fn build(&self, sample: &SampleUnit, resources: &TaskResources) -> TaskInvocation {
        let config = &self.config;
        let output_file = output_file_name(&sample.sample_id);

        let values = [
            path_arg(&config.database),
            path_arg(&sample.sequence_file),
            output_file.clone(),
            resources.cpus.to_string(),
            format_evalue(config.evalue),
            config.output_format.clone(),
            path_arg(&config.log_file),
            config.search_type.to_string(),
            config.max_hsps.to_string(),
            config.max_targets.to_string(),
            config.restrict_taxids.to_string(),
            config.ignore_taxids.to_string(),
            sample.sample_id.clone(),
        ];

        let args = FLAGS
            .iter()
            .zip(values)
            .flat_map(|(flag, value)| [flag.to_string(), value])
            .collect();

        TaskInvocation {
            sample_id: sample.sample_id.clone(),
            program: config.script.clone(),
            args,
            output_file: PathBuf::from(output_file),
        }
    }
}

/// Validate `config` and `resources`, then build the invocation for a single sample.
///
/// Fails with a configuration error before anything is constructed when both
/// taxonomy filters are set or a value is out of range.
pub fn build_invocation(
    config: &BlastConfig,
    sample: &SampleUnit,
    resources: &TaskResources,
) -> Result<TaskInvocation> {
    let builder = TaskBuilder::new(config)?;
    resources.validate()?;
    Ok(builder.build(sample, resources))
}

fn path_arg(path: &Path) -> String {
    path.to_string_lossy().into_owned()
}

fn format_evalue(evalue: f64) -> String {
    let plain = evalue.to_string();
    // 1e-50 would otherwise print fifty zeros
    if plain.len() > 12 {
        format!("{:e}", evalue)
    } else {
        plain
    }
}

fn shell_quote(token: &str) -> String {
    let safe = !token.is_empty()
        && token
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || "_-./:,=+@%".contains(c));
    if safe {
        token.to_string()
    } else {
        format!("'{}'", token.replace('\'', r"'\''"))
    }
}
