/// Common test utilities for virid tests
///
/// Shared setup for integration tests: scratch launch directories, FASTA
/// inputs and stand-in wrapper scripts.
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// Test environment that manages a temporary launch directory
pub struct TestEnvironment {
    _temp_dir: TempDir,
    pub launch_dir: PathBuf,
}

impl TestEnvironment {
    pub fn new() -> Self {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let launch_dir = temp_dir.path().join("launch");
        fs::create_dir_all(&launch_dir).expect("Failed to create launch dir");

        TestEnvironment {
            _temp_dir: temp_dir,
            launch_dir,
        }
    }

    /// Get a path within the launch directory
    pub fn path(&self, relative: &str) -> PathBuf {
        self.launch_dir.join(relative)
    }

    /// Write a small FASTA file and return its path
    #[allow(dead_code)]
    pub fn fasta(&self, name: &str) -> PathBuf {
        let path = self.path(name);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).unwrap();
        }
        fs::write(&path, ">read1\nACGTACGTACGT\n>read2\nTTGACCA\n").unwrap();
        path
    }

    /// Install a wrapper script with the given shell body
    #[allow(dead_code)]
    #[cfg(unix)]
    pub fn script(&self, body: &str) -> PathBuf {
        write_script(&self.path("bin/blast.sh"), body)
    }
}

/// Stand-in for blast.sh: records its arguments and writes one hit per
/// query file line starting with '>' into the -o file
#[allow(dead_code)]
pub const FAKE_BLAST: &str = r#"
while getopts "d:q:o:t:e:f:l:b:m:s:r:i:n:" opt; do
  case "$opt" in
    q) query="$OPTARG" ;;
    o) out="$OPTARG" ;;
    n) sample="$OPTARG" ;;
    r) restrict="$OPTARG" ;;
  esac
done
[ -f "$query" ] || { echo "query not found: $query" >&2; exit 2; }
echo "blast for $sample restrict=$restrict" >&2
grep '^>' "$query" | sed 's/^>//' | while read -r id; do
  printf '%s\tVirus\tNC_000001\t10239\t1e-20\t100\t99.0\t50\n' "$id"
done > "$out"
printf '%s\n' "$@" > args.txt
"#;

#[allow(dead_code)]
#[cfg(unix)]
pub fn write_script(path: &Path, body: &str) -> PathBuf {
    use std::os::unix::fs::PermissionsExt;

    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).unwrap();
    }
    fs::write(path, format!("#!/bin/sh\n{}\n", body)).unwrap();
    fs::set_permissions(path, fs::Permissions::from_mode(0o755)).unwrap();
    path.to_path_buf()
}
