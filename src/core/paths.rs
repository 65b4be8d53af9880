use std::path::{Path, PathBuf};

use crate::core::config::PipelineConfig;

pub const REPORTS_DIR: &str = "reports";
pub const RUN_LOG_NAME: &str = "virID.log";
pub const PUBLISH_SUBDIR: &str = "blast";

/// Directory the run was launched from
/// Checks VIRID_LAUNCH_DIR environment variable, falls back to the current directory
pub fn launch_dir() -> std::io::Result<PathBuf> {
    match std::env::var("VIRID_LAUNCH_DIR") {
        Ok(path) => Ok(PathBuf::from(path)),
        Err(_) => std::env::current_dir(),
    }
}

/// Join `path` onto `base` unless it is already absolute
pub fn resolve(base: &Path, path: &Path) -> PathBuf {
    if path.is_absolute() {
        path.to_path_buf()
    } else {
        base.join(path)
    }
}

/// `${launchDir}/${outDir}`
pub fn output_dir(launch: &Path, pipeline: &PipelineConfig) -> PathBuf {
    resolve(launch, &pipeline.out_dir)
}

/// Pipeline-level run log, `${launchDir}/${outDir}/reports/virID.log` unless overridden
pub fn run_log(launch: &Path, pipeline: &PipelineConfig) -> PathBuf {
    match &pipeline.log_file {
        Some(path) => resolve(launch, path),
        None => output_dir(launch, pipeline).join(REPORTS_DIR).join(RUN_LOG_NAME),
    }
}

/// Where finished `<sampleID>_blast.out` files are published
pub fn publish_dir(launch: &Path, pipeline: &PipelineConfig) -> PathBuf {
    output_dir(launch, pipeline).join(PUBLISH_SUBDIR)
}

/// Private working directory of one sample's task
pub fn task_work_dir(launch: &Path, pipeline: &PipelineConfig, sample_id: &str) -> PathBuf {
    resolve(launch, &pipeline.work_dir).join(sample_id)
}

/// Get a human-readable description of the current path configuration
pub fn describe_paths(launch: &Path, pipeline: &PipelineConfig) -> String {
    format!(
        "virID Paths:\n  \
        Launch: {}\n  \
        Output: {}\n  \
        Published: {}\n  \
        Work: {}\n  \
        Run log: {}",
        launch.display(),
        output_dir(launch, pipeline).display(),
        publish_dir(launch, pipeline).display(),
        resolve(launch, &pipeline.work_dir).display(),
        run_log(launch, pipeline).display(),
    )
}
