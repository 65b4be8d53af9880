/// External tool integration: building, running and reading back BLASTN tasks
pub mod blast;
pub mod executor;
pub mod outfmt;
pub mod traits;

pub use blast::{build_invocation, SampleUnit, TaskBuilder, TaskInvocation, TaskResources, TaskResult};
pub use executor::ProcessExecutor;
pub use outfmt::{BlastHit, OutputFormat};
pub use traits::Executor;
