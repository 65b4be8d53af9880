//! Sample discovery: sample sheets and FASTA paths/globs

use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};

use crate::core::paths;
use crate::error::{Result, ViridError};
use crate::tools::blast::SampleUnit;

const FASTA_EXTENSIONS: [&str; 5] = ["fasta", "fa", "fna", "fas", "fsa"];
const HEADER_NAMES: [&str; 3] = ["sample_id", "sampleid", "sample"];

/// Sample ID derived from a file name: `reads/S1.fasta.gz` -> `S1`
pub fn sample_id_from_path(path: &Path) -> Option<String> {
    let name = path.file_name()?.to_str()?;
    let name = name.strip_suffix(".gz").unwrap_or(name);
    let stem = match name.rsplit_once('.') {
        Some((stem, ext)) if FASTA_EXTENSIONS.contains(&ext.to_ascii_lowercase().as_str()) => stem,
        _ => name,
    };
    (!stem.is_empty()).then(|| stem.to_string())
}

fn is_glob(pattern: &str) -> bool {
    pattern.contains(['*', '?', '['])
}

/// Samples from plain paths or glob patterns, in the order given
pub fn from_paths<S: AsRef<str>>(patterns: &[S]) -> Result<Vec<SampleUnit>> {
    let mut files = Vec::new();

    for pattern in patterns.iter().map(AsRef::as_ref) {
        if is_glob(pattern) {
            let entries = glob::glob(pattern).map_err(|e| {
                ViridError::InvalidInput(format!("invalid pattern {}: {}", pattern, e))
            })?;
            let mut matched: Vec<PathBuf> = entries
                .filter_map(|entry| entry.ok())
                .filter(|path| path.is_file())
                .collect();
            if matched.is_empty() {
                return Err(ViridError::InvalidInput(format!(
                    "no files match {}",
                    pattern
                )));
            }
            matched.sort();
            files.extend(matched);
        } else {
            let path = PathBuf::from(pattern);
            if !path.is_file() {
                return Err(ViridError::InvalidInput(format!(
                    "sequence file not found: {}",
                    pattern
                )));
            }
            files.push(path);
        }
    }

    files
        .into_iter()
        .map(|path| {
            let sample_id = sample_id_from_path(&path).ok_or_else(|| {
                ViridError::InvalidInput(format!("cannot derive a sample ID from {:?}", path))
            })?;
            Ok(SampleUnit::new(sample_id, path))
        })
        .collect()
}

/// Field separator for a sample sheet: by extension, else sniffed from the
/// first data line
fn sheet_delimiter(sheet: &Path, contents: &str) -> u8 {
    match sheet
        .extension()
        .and_then(|ext| ext.to_str())
        .map(str::to_ascii_lowercase)
        .as_deref()
    {
        Some("tsv") | Some("tab") => b'\t',
        Some("csv") => b',',
        _ => {
            let first = contents
                .lines()
                .map(str::trim)
                .find(|line| !line.is_empty() && !line.starts_with('#'));
            if first.is_some_and(|line| line.contains('\t')) {
                b'\t'
            } else {
                b','
            }
        }
    }
}

/// Samples from a two-column sheet, `sample_id,path` (CSV or TSV).
///
/// A header line is optional; `#` comments and blank lines are skipped and
/// fields may be quoted. Relative paths are resolved against the sheet's
/// directory.
pub fn from_sheet(sheet: &Path) -> Result<Vec<SampleUnit>> {
    let contents = fs::read_to_string(sheet)?;
    let base = sheet.parent().unwrap_or_else(|| Path::new("."));

    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .delimiter(sheet_delimiter(sheet, &contents))
        .comment(Some(b'#'))
        .trim(csv::Trim::All)
        .flexible(true)
        .from_reader(contents.as_bytes());

    let mut samples = Vec::new();
    let mut seen_row = false;

    for record in reader.records() {
        let record = record
            .map_err(|e| ViridError::Parse(format!("{}: {}", sheet.display(), e)))?;
        if record.iter().all(str::is_empty) {
            continue;
        }

        let line = record.position().map_or(0, |pos| pos.line());
        if record.len() != 2 {
            return Err(ViridError::Parse(format!(
                "{}:{}: expected 2 columns (sample_id, path), found {}",
                sheet.display(),
                line,
                record.len()
            )));
        }

        let first_row = !seen_row;
        seen_row = true;
        if first_row && HEADER_NAMES.contains(&record[0].to_ascii_lowercase().as_str()) {
            continue;
        }

        samples.push(SampleUnit::new(
            &record[0],
            paths::resolve(base, Path::new(&record[1])),
        ));
    }

    Ok(samples)
}

/// Reject IDs that would collide or escape the output directory
pub fn check_unique(samples: &[SampleUnit]) -> Result<()> {
    let mut seen = HashSet::new();
    for sample in samples {
        let id = sample.sample_id.as_str();
        if id.is_empty() {
            return Err(ViridError::InvalidInput(format!(
                "empty sample ID for {:?}",
                sample.sequence_file
            )));
        }
        if id.contains(['/', '\\']) || id == "." || id == ".." {
            return Err(ViridError::InvalidInput(format!(
                "sample ID {:?} is not a valid file name prefix",
                id
            )));
        }
        if !seen.insert(id) {
            return Err(ViridError::InvalidInput(format!(
                "duplicate sample ID {:?}",
                id
            )));
        }
    }
    Ok(())
}
