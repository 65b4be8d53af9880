pub mod cli;
pub mod core;
pub mod error;
pub mod pipeline;
pub mod tools;

pub use crate::core::config::{BlastConfig, Config};
pub use crate::error::{ConfigError, ExecutionError, Result, ViridError};
pub use crate::tools::blast::{
    build_invocation, SampleUnit, TaskBuilder, TaskInvocation, TaskResources, TaskResult,
};
