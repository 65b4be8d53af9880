//! Error types for the BLAST stage

use std::path::PathBuf;
use thiserror::Error;

/// Main error type for virid operations
#[derive(Error, Debug)]
pub enum ViridError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Execution error: {0}")]
    Execution(#[from] ExecutionError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Parsing error: {0}")]
    Parse(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("{0}")]
    Other(String),
}

/// Global misconfiguration. Always fatal to the whole run.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ConfigError {
    #[error(
        "mutually exclusive taxonomy filters: restrict_taxids={restrict_taxids} \
         and ignore_taxids={ignore_taxids} are both set; set one of them to \"no\""
    )]
    ConflictingTaxonomyFilters {
        restrict_taxids: String,
        ignore_taxids: String,
    },

    #[error("failed to parse config: {0}")]
    Parse(String),

    #[error("failed to serialize config: {0}")]
    Serialize(String),

    #[error("invalid value for {field}: {reason}")]
    InvalidValue { field: &'static str, reason: String },
}

/// Failure of one sample's external BLAST invocation.
#[derive(Error, Debug)]
pub enum ExecutionError {
    #[error("sample {sample_id}: failed to start {program:?}: {source}")]
    Spawn {
        sample_id: String,
        program: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("sample {sample_id}: external command exited with {}", exit_label(.code))]
    NonZeroExit { sample_id: String, code: Option<i32> },

    #[error("sample {sample_id}: expected output {path:?} was not produced")]
    MissingOutput { sample_id: String, path: PathBuf },
}

fn exit_label(code: &Option<i32>) -> String {
    match code {
        Some(code) => format!("status {}", code),
        None => "no status (terminated by signal)".to_string(),
    }
}

impl ExecutionError {
    pub fn sample_id(&self) -> &str {
        match self {
            ExecutionError::Spawn { sample_id, .. }
            | ExecutionError::NonZeroExit { sample_id, .. }
            | ExecutionError::MissingOutput { sample_id, .. } => sample_id,
        }
    }
}

impl ViridError {
    /// Errors that must stop the whole run rather than a single sample
    pub fn is_fatal(&self) -> bool {
        !matches!(self, ViridError::Execution(_))
    }
}

/// Result type alias for virid operations
pub type Result<T> = std::result::Result<T, ViridError>;

impl From<serde_json::Error> for ViridError {
    fn from(err: serde_json::Error) -> Self {
        ViridError::Parse(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io;

    #[test]
    fn test_error_display() {
        let conflict = ViridError::from(ConfigError::ConflictingTaxonomyFilters {
            restrict_taxids: "9606".to_string(),
            ignore_taxids: "10239".to_string(),
        });
        let message = conflict.to_string();
        assert!(message.starts_with("Configuration error: mutually exclusive taxonomy filters"));
        assert!(message.contains("restrict_taxids=9606"));
        assert!(message.contains("ignore_taxids=10239"));

        let exit = ViridError::from(ExecutionError::NonZeroExit {
            sample_id: "S1".to_string(),
            code: Some(2),
        });
        assert_eq!(
            exit.to_string(),
            "Execution error: sample S1: external command exited with status 2"
        );

        let killed = ExecutionError::NonZeroExit {
            sample_id: "S2".to_string(),
            code: None,
        };
        assert!(killed.to_string().contains("terminated by signal"));

        let io_error = ViridError::Io(io::Error::new(io::ErrorKind::NotFound, "gone"));
        assert!(io_error.to_string().contains("IO error"));
    }

    #[test]
    fn test_fatality() {
        let config = ViridError::from(ConfigError::Parse("bad".to_string()));
        assert!(config.is_fatal());

        let missing = ViridError::from(ExecutionError::MissingOutput {
            sample_id: "S1".to_string(),
            path: PathBuf::from("S1_blast.out"),
        });
        assert!(!missing.is_fatal());
    }

    #[test]
    fn test_sample_id_accessor() {
        let err = ExecutionError::Spawn {
            sample_id: "S9".to_string(),
            program: PathBuf::from("blast.sh"),
            source: io::Error::new(io::ErrorKind::NotFound, "no such file"),
        };
        assert_eq!(err.sample_id(), "S9");
    }
}
