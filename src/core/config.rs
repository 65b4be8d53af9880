use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use crate::error::{ConfigError, ViridError};
use crate::tools::blast::TaskResources;

pub const DEFAULT_DATABASE: &str = "/n/blastdb/nt_v5";
pub const DEFAULT_OUTPUT_FORMAT: &str = "6 qseqid stitle sseqid staxid evalue bitscore pident length";
pub const DEFAULT_SCRIPT: &str = "blast.sh";

/// Sentinel the wrapper script understands as "no taxonomy filter"
pub const NO_FILTER: &str = "no";

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub blast: BlastConfig,
    pub pipeline: PipelineConfig,
    pub resources: TaskResources,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BlastConfig {
    /// BLAST database to search against
    pub database: PathBuf,
    pub evalue: f64,
    /// Passed to BLAST as one `-outfmt` token
    pub output_format: String,
    /// Log file handed to the wrapper script; empty means none
    pub log_file: PathBuf,
    pub search_type: SearchType,
    pub max_hsps: u32,
    pub max_targets: u32,
    pub restrict_taxids: TaxidFilter,
    pub ignore_taxids: TaxidFilter,
    /// Wrapper script translating the flags into a blastn call
    pub script: PathBuf,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Base output directory, relative to the launch directory
    pub out_dir: PathBuf,
    /// Run log; defaults to `<out_dir>/reports/virID.log`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub log_file: Option<PathBuf>,
    /// Parent of the per-task working directories
    pub work_dir: PathBuf,
    pub error_strategy: ErrorStrategy,
    /// Concurrent tasks (0 = available CPUs / cpus per task)
    pub max_forks: usize,
}

/// BLASTN `-task` variants
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "kebab-case")]
pub enum SearchType {
    Megablast,
    DcMegablast,
    Blastn,
    BlastnShort,
    Rmblastn,
}

impl SearchType {
    pub fn as_str(&self) -> &'static str {
        match self {
            SearchType::Megablast => "megablast",
            SearchType::DcMegablast => "dc-megablast",
            SearchType::Blastn => "blastn",
            SearchType::BlastnShort => "blastn-short",
            SearchType::Rmblastn => "rmblastn",
        }
    }
}

impl fmt::Display for SearchType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SearchType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "megablast" => Ok(SearchType::Megablast),
            "dc-megablast" => Ok(SearchType::DcMegablast),
            "blastn" => Ok(SearchType::Blastn),
            "blastn-short" => Ok(SearchType::BlastnShort),
            "rmblastn" => Ok(SearchType::Rmblastn),
            _ => Err(format!("Unknown search type: {}", s)),
        }
    }
}

/// A taxonomy filter option: either the `"no"` sentinel or a taxid list
/// handed through verbatim.
///
/// Only the exact string `"no"` disables the filter; anything else,
/// including an empty string, counts as set.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum TaxidFilter {
    #[default]
    Off,
    Taxids(String),
}

impl TaxidFilter {
    pub fn is_set(&self) -> bool {
        matches!(self, TaxidFilter::Taxids(_))
    }

    /// Value passed to the wrapper script
    pub fn as_arg(&self) -> &str {
        match self {
            TaxidFilter::Off => NO_FILTER,
            TaxidFilter::Taxids(taxids) => taxids,
        }
    }
}

impl From<String> for TaxidFilter {
    fn from(value: String) -> Self {
        if value == NO_FILTER {
            TaxidFilter::Off
        } else {
            TaxidFilter::Taxids(value)
        }
    }
}

impl From<&str> for TaxidFilter {
    fn from(value: &str) -> Self {
        TaxidFilter::from(value.to_string())
    }
}

impl From<TaxidFilter> for String {
    fn from(filter: TaxidFilter) -> Self {
        filter.as_arg().to_string()
    }
}

impl FromStr for TaxidFilter {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(TaxidFilter::from(s))
    }
}

impl fmt::Display for TaxidFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_arg())
    }
}

/// What the runner does when one sample's task fails
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum,
)]
#[serde(rename_all = "lowercase")]
pub enum ErrorStrategy {
    /// Stop at the first failed sample
    #[default]
    Terminate,
    /// Log the failure and keep going with the remaining samples
    Ignore,
}

impl Default for BlastConfig {
    fn default() -> Self {
        Self {
            database: PathBuf::from(DEFAULT_DATABASE),
            evalue: 10.0,
            output_format: DEFAULT_OUTPUT_FORMAT.to_string(),
            log_file: PathBuf::new(),
            search_type: SearchType::Megablast,
            max_hsps: 1,
            max_targets: 30,
            restrict_taxids: TaxidFilter::Off,
            ignore_taxids: TaxidFilter::Off,
            script: PathBuf::from(DEFAULT_SCRIPT),
        }
    }
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            out_dir: PathBuf::from("output"),
            log_file: None,
            work_dir: PathBuf::from("work"),
            error_strategy: ErrorStrategy::Terminate,
            max_forks: 0,
        }
    }
}

impl BlastConfig {
    /// Check the options for consistency before any task is built.
    ///
    /// Both taxonomy filters set to `"no"` is valid (no filtering); only
    /// both set to real values is rejected.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.restrict_taxids.is_set() && self.ignore_taxids.is_set() {
            return Err(ConfigError::ConflictingTaxonomyFilters {
                restrict_taxids: self.restrict_taxids.to_string(),
                ignore_taxids: self.ignore_taxids.to_string(),
            });
        }
        if !(self.evalue.is_finite() && self.evalue > 0.0) {
            return Err(ConfigError::InvalidValue {
                field: "evalue",
                reason: format!("must be a positive number, got {}", self.evalue),
            });
        }
        if self.max_hsps == 0 {
            return Err(ConfigError::InvalidValue {
                field: "max_hsps",
                reason: "must be at least 1".to_string(),
            });
        }
        if self.max_targets == 0 {
            return Err(ConfigError::InvalidValue {
                field: "max_targets",
                reason: "must be at least 1".to_string(),
            });
        }
        Ok(())
    }
}

impl Config {
    /// Validate every section that ends up on a task's command line
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.blast.validate()?;
        self.resources.validate()
    }
}

pub fn default_config() -> Config {
    Config::default()
}

pub fn load_config<P: AsRef<Path>>(path: P) -> Result<Config, ViridError> {
    let contents = std::fs::read_to_string(path)?;
    let config: Config =
        toml::from_str(&contents).map_err(|e| ConfigError::Parse(e.to_string()))?;
    Ok(config)
}

pub fn save_config<P: AsRef<Path>>(path: P, config: &Config) -> Result<(), ViridError> {
    let contents = to_toml(config)?;
    std::fs::write(path, contents)?;
    Ok(())
}

pub fn to_toml(config: &Config) -> Result<String, ViridError> {
    Ok(toml::to_string_pretty(config).map_err(|e| ConfigError::Serialize(e.to_string()))?)
}
