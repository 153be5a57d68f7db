//! CSV dataset loading
//!
//! The dataset must start with a header row naming its columns. Two columns
//! are required by name:
//! - `text`: the raw email body
//! - `label_num`: 0 for ham, 1 for spam
//!
//! Any other column (a leading unnamed index, a textual `label`) is ignored.
//! Fields may be quoted; quoted fields can contain commas, doubled quotes and
//! line breaks, which real email bodies do.

use crate::core::{Label, RawExample, Result, SpamHamError};
use crate::data::Corpus;
use csv::{ReaderBuilder, StringRecord};
use log::debug;
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;

pub const TEXT_COLUMN: &str = "text";
pub const LABEL_COLUMN: &str = "label_num";

impl Corpus {
    /// Load a corpus from a CSV file
    pub fn from_csv_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let file = File::open(path).map_err(SpamHamError::IoError)?;
        Self::from_csv_reader(BufReader::new(file))
    }

    /// Load a corpus from any reader producing CSV text
    pub fn from_csv_reader<R: Read>(mut reader: R) -> Result<Self> {
        let mut content = String::new();
        reader
            .read_to_string(&mut content)
            .map_err(SpamHamError::IoError)?;
        Self::from_csv_str(&content)
    }

    /// Parse a corpus from CSV text
    pub fn from_csv_str(content: &str) -> Result<Self> {
        let content = content.strip_prefix('\u{feff}').unwrap_or(content);

        // Short rows are reported as a missing field of that record
        let mut reader = ReaderBuilder::new()
            .has_headers(true)
            .flexible(true)
            .from_reader(content.as_bytes());

        let header = reader
            .headers()
            .map_err(|e| SpamHamError::DatasetValidation {
                record: 0,
                reason: format!("failed to read header row: {e}"),
            })?
            .clone();
        if header.iter().all(|h| h.trim().is_empty()) {
            return Err(SpamHamError::DatasetValidation {
                record: 0,
                reason: "dataset is empty (no header row)".to_string(),
            });
        }
        let text_idx = column_index(&header, TEXT_COLUMN)?;
        let label_idx = column_index(&header, LABEL_COLUMN)?;

        let mut examples = Vec::new();
        for (i, row) in reader.records().enumerate() {
            let record = i + 1;
            let fields = row.map_err(|e| SpamHamError::DatasetValidation {
                record,
                reason: e.to_string(),
            })?;
            examples.push(parse_example(&fields, text_idx, label_idx, record)?);
        }

        if examples.is_empty() {
            return Err(SpamHamError::DatasetValidation {
                record: 0,
                reason: "dataset has a header but no data rows".to_string(),
            });
        }

        debug!("Parsed {} examples from CSV", examples.len());
        Ok(Corpus::new(examples))
    }
}

fn column_index(header: &StringRecord, name: &str) -> Result<usize> {
    header
        .iter()
        .position(|h| h.trim() == name)
        .ok_or_else(|| SpamHamError::DatasetValidation {
            record: 0,
            reason: format!(
                "missing required column `{name}` (found: {:?})",
                header.iter().collect::<Vec<_>>()
            ),
        })
}

fn parse_example(
    fields: &StringRecord,
    text_idx: usize,
    label_idx: usize,
    record: usize,
) -> Result<RawExample> {
    let invalid = |reason: String| SpamHamError::DatasetValidation { record, reason };

    let text = fields
        .get(text_idx)
        .filter(|t| !t.is_empty())
        .ok_or_else(|| invalid("missing text".to_string()))?;

    let label_str = fields
        .get(label_idx)
        .map(|l| l.trim())
        .filter(|l| !l.is_empty())
        .ok_or_else(|| invalid("missing label".to_string()))?;

    let value = label_str
        .parse::<f64>()
        .map_err(|_| invalid(format!("non-numeric label: {label_str}")))?;
    let label = if value == 0.0 {
        Label::Ham
    } else if value == 1.0 {
        Label::Spam
    } else {
        return Err(invalid(format!("label must be 0 or 1, got {label_str}")));
    };

    Ok(RawExample::new(text, label))
}
