use std::fs;
use std::io::Read;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use std::thread::JoinHandle;

use crate::error::{ExecutionError, Result, ViridError};
use crate::tools::blast::TaskInvocation;
use crate::tools::traits::Executor;

/// Forward a child's output to the log, one event per line.
/// Carriage returns end a line too, so BLAST progress updates are not lost.
fn stream_output<R: Read + Send + 'static>(
    mut reader: R,
    sample_id: String,
    stream: &'static str,
) -> JoinHandle<()> {
    std::thread::spawn(move || {
        let mut current_line = Vec::new();
        let mut buf = [0u8; 4096];

        let flush = |line: &mut Vec<u8>| {
            if !line.is_empty() {
                tracing::info!(
                    sample = %sample_id,
                    stream,
                    "{}",
                    String::from_utf8_lossy(line).trim_end()
                );
                line.clear();
            }
        };

        loop {
            match reader.read(&mut buf) {
                Ok(0) | Err(_) => break,
                Ok(n) => {
                    for &byte in &buf[..n] {
                        if byte == b'\n' || byte == b'\r' {
                            flush(&mut current_line);
                        } else {
                            current_line.push(byte);
                        }
                    }
                }
            }
        }
        flush(&mut current_line);
    })
}

/// Remove a file left by an earlier run, if there is one
pub(crate) fn remove_stale(path: &Path) -> std::io::Result<()> {
    match fs::remove_file(path) {
        Err(e) if e.kind() != std::io::ErrorKind::NotFound => Err(e),
        _ => Ok(()),
    }
}

/// Runs invocations as local child processes
#[derive(Debug, Clone, Default)]
pub struct ProcessExecutor {
    env: Vec<(String, String)>,
}

impl ProcessExecutor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Extra environment for every task, e.g. `BLASTDB`
    pub fn with_env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.env.push((key.into(), value.into()));
        self
    }

    fn resolve_program(&self, program: &Path) -> Option<PathBuf> {
        if program.components().count() > 1 {
            program.exists().then(|| program.to_path_buf())
        } else {
            which::which(program).ok()
        }
    }
}

impl Executor for ProcessExecutor {
    fn execute(&self, invocation: &TaskInvocation, work_dir: &Path) -> Result<PathBuf> {
        let sample_id = invocation.sample_id.clone();
        fs::create_dir_all(work_dir)?;
        // Work dirs outlive runs; a leftover output must not pass the check below
        let output = work_dir.join(&invocation.output_file);
        remove_stale(&output)?;

        let mut cmd = Command::new(&invocation.program);
        cmd.args(&invocation.args)
            .current_dir(work_dir)
            .envs(self.env.iter().map(|(k, v)| (k.as_str(), v.as_str())))
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());

        tracing::debug!(sample = %sample_id, work_dir = %work_dir.display(), "Running {}", invocation.command_line());

        let mut child = cmd.spawn().map_err(|source| ExecutionError::Spawn {
            sample_id: sample_id.clone(),
            program: invocation.program.clone(),
            source,
        })?;

        let handles: Vec<_> = [
            child
                .stdout
                .take()
                .map(|out| stream_output(out, sample_id.clone(), "stdout")),
            child
                .stderr
                .take()
                .map(|err| stream_output(err, sample_id.clone(), "stderr")),
        ]
        .into_iter()
        .flatten()
        .collect();

        for handle in handles {
            handle.join().ok();
        }

        let status = child.wait()?;
        if !status.success() {
            return Err(ExecutionError::NonZeroExit {
                sample_id,
                code: status.code(),
            }
            .into());
        }

        if !output.is_file() {
            return Err(ExecutionError::MissingOutput {
                sample_id,
                path: output,
            }
            .into());
        }

        Ok(output)
    }

    fn verify_installation(&self, program: &Path) -> Result<()> {
        match self.resolve_program(program) {
            Some(path) => {
                tracing::debug!("Using BLAST wrapper at {}", path.display());
                Ok(())
            }
            None => Err(ViridError::InvalidInput(format!(
                "BLAST wrapper script {:?} not found (set blast.script or add it to PATH)",
                program
            ))),
        }
    }
}
