//! BLAST `-outfmt` column specs and tabular hit reading

use indexmap::IndexMap;
use serde::Serialize;
use std::fs;
use std::io::{BufRead, BufReader};
use std::path::Path;
use std::str::FromStr;

use crate::error::{Result, ViridError};

/// Columns BLAST writes for `std` or a bare tabular code
pub const STD_COLUMNS: [&str; 12] = [
    "qaccver", "saccver", "pident", "length", "mismatch", "gapopen", "qstart", "qend", "sstart",
    "send", "evalue", "bitscore",
];

const TABULAR: u8 = 6;
const TABULAR_COMMENTED: u8 = 7;
const MAX_FORMAT_CODE: u8 = 18;

/// Parsed `-outfmt` value such as `6 qseqid sseqid evalue`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputFormat {
    pub code: u8,
    pub columns: Vec<String>,
}

impl OutputFormat {
    pub fn parse(spec: &str) -> Result<Self> {
        let mut tokens = spec.split_whitespace();
        let code_token = tokens
            .next()
            .ok_or_else(|| ViridError::Parse("empty output format".to_string()))?;
        let code: u8 = code_token
            .parse()
            .ok()
            .filter(|code| *code <= MAX_FORMAT_CODE)
            .ok_or_else(|| {
                ViridError::Parse(format!("invalid output format code: {}", code_token))
            })?;

        let mut columns = Vec::new();
        for token in tokens {
            if token == "std" {
                columns.extend(STD_COLUMNS.iter().map(|c| c.to_string()));
            } else {
                columns.push(token.to_string());
            }
        }

        if columns.is_empty() && Self::code_is_tabular(code) {
            columns = STD_COLUMNS.iter().map(|c| c.to_string()).collect();
        }

        Ok(Self { code, columns })
    }

    fn code_is_tabular(code: u8) -> bool {
        code == TABULAR || code == TABULAR_COMMENTED
    }

    /// Whether hits can be read back as tab-separated rows
    pub fn is_tabular(&self) -> bool {
        Self::code_is_tabular(self.code)
    }
}

impl FromStr for OutputFormat {
    type Err = ViridError;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

/// One row of tabular output, keyed by column name in format order
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BlastHit {
    pub fields: IndexMap<String, String>,
}

impl BlastHit {
    pub fn get(&self, column: &str) -> Option<&str> {
        self.fields.get(column).map(String::as_str)
    }

    pub fn query_id(&self) -> Option<&str> {
        self.get("qseqid").or_else(|| self.get("qaccver"))
    }

    pub fn subject_id(&self) -> Option<&str> {
        self.get("sseqid").or_else(|| self.get("saccver"))
    }

    pub fn evalue(&self) -> Option<f64> {
        self.get("evalue")?.parse().ok()
    }

    pub fn bit_score(&self) -> Option<f64> {
        self.get("bitscore")?.parse().ok()
    }

    /// First subject taxid (`staxid`, or the first of `staxids`)
    pub fn taxid(&self) -> Option<u32> {
        self.get("staxid")
            .or_else(|| self.get("staxids"))?
            .split(';')
            .next()?
            .trim()
            .parse()
            .ok()
    }
}

/// Parse tab-separated rows, skipping blank and `#` comment lines
pub fn parse_hits<R: BufRead>(reader: R, format: &OutputFormat) -> Result<Vec<BlastHit>> {
    if !format.is_tabular() {
        return Err(ViridError::Parse(format!(
            "output format {} is not tabular",
            format.code
        )));
    }

    let mut hits = Vec::new();
    for (idx, line) in reader.lines().enumerate() {
        let line = line?;
        if line.trim().is_empty() || line.starts_with('#') {
            continue;
        }

        let values: Vec<&str> = line.split('\t').collect();
        if values.len() != format.columns.len() {
            return Err(ViridError::Parse(format!(
                "line {}: expected {} columns, found {}",
                idx + 1,
                format.columns.len(),
                values.len()
            )));
        }

        let fields = format
            .columns
            .iter()
            .cloned()
            .zip(values.into_iter().map(str::to_string))
            .collect();
        hits.push(BlastHit { fields });
    }

    Ok(hits)
}

pub fn read_hits(path: &Path, format: &OutputFormat) -> Result<Vec<BlastHit>> {
    let file = fs::File::open(path)?;
    parse_hits(BufReader::new(file), format)
        .map_err(|e| match e {
            ViridError::Parse(msg) => ViridError::Parse(format!("{}: {}", path.display(), msg)),
            other => other,
        })
}

/// Number of hits in a published output, `None` when the format is not tabular
pub fn count_hits(path: &Path, format: &OutputFormat) -> Result<Option<usize>> {
    if !format.is_tabular() {
        return Ok(None);
    }
    read_hits(path, format).map(|hits| Some(hits.len()))
}
