/// Trait definitions for tool abstractions
///
/// The executor seam separates building a task from running it, so the
/// runner can be exercised without a BLAST installation.
use std::path::{Path, PathBuf};

use crate::error::Result;
use crate::tools::blast::TaskInvocation;

/// Runs built invocations
#[cfg_attr(test, mockall::automock)]
pub trait Executor: Send + Sync {
    /// Run `invocation` with `work_dir` as its working directory and return
    /// the path of the output file it produced
    fn execute(&self, invocation: &TaskInvocation, work_dir: &Path) -> Result<PathBuf>;

    /// Verify that the program is available before any task starts
    fn verify_installation(&self, _program: &Path) -> Result<()> {
        Ok(())
    }
}
