// 📥 Household Importer - delimited text → Household records
//
// Two entry points:
// - Header guessing (best effort): column meaning is inferred from header names
// - Explicit ColumnMapping: caller states which column holds what
//
// Row-level problems never fail an import; the offending row is skipped.
// Blank rows are dropped without being counted as skipped.
// Only a missing size column is fatal, and it is reported once per import.

use crate::error::ImportError;
use crate::model::{normalize_label, Household, VulnerabilityAttribute};
use csv::{ReaderBuilder, StringRecord};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use tracing::{debug, info};

const UNKNOWN: &str = "Unknown";

// ============================================================================
// COLUMN MAPPING
// ============================================================================

/// Which column holds which household field (0-based indices)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnMapping {
    pub id: Option<usize>,
    pub head_name: Option<usize>,
    pub member_count: usize,
    pub attributes: Option<usize>,
    pub delimiter: u8,
    /// Whether the first line is a header to skip
    pub skip_header: bool,
}

impl ColumnMapping {
    /// Explicit mapping with no optional columns and a header line to skip
    pub fn new(member_count: usize, delimiter: u8) -> Self {
        ColumnMapping {
            id: None,
            head_name: None,
            member_count,
            attributes: None,
            delimiter,
            skip_header: true,
        }
    }

    pub fn with_id(mut self, column: usize) -> Self {
        self.id = Some(column);
        self
    }

    pub fn with_head_name(mut self, column: usize) -> Self {
        self.head_name = Some(column);
        self
    }

    pub fn with_attributes(mut self, column: usize) -> Self {
        self.attributes = Some(column);
        self
    }

    pub fn without_header(mut self) -> Self {
        self.skip_header = false;
        self
    }

    /// Guess the mapping from a header line
    ///
    /// # Rules (case-insensitive, first match wins per header):
    /// - equals "id" → household id
    /// - contains "head" or "name" → head of household
    /// - contains "size" → member count (required)
    /// - contains "priorit" → attribute list
    pub fn guess(header_line: &str) -> Result<Self, ImportError> {
        let delimiter = detect_delimiter(header_line);

        let mut id = None;
        let mut head_name = None;
        let mut member_count = None;
        let mut attributes = None;

        for (i, raw) in header_line.split(delimiter as char).enumerate() {
            let h = clean_cell(raw).to_lowercase();
            if h == "id" {
                id = Some(i);
            } else if h.contains("head") || h.contains("name") {
                head_name = Some(i);
            } else if h.contains("size") {
                member_count = Some(i);
            } else if h.contains("priorit") {
                attributes = Some(i);
            }
        }

        let member_count = member_count.ok_or(ImportError::MissingSizeColumn)?;

        Ok(ColumnMapping {
            id,
            head_name,
            member_count,
            attributes,
            delimiter,
            skip_header: true,
        })
    }
}

/// `;` if the header line contains one, otherwise `,`
pub fn detect_delimiter(header_line: &str) -> u8 {
    if header_line.contains(';') {
        b';'
    } else {
        b','
    }
}

// ============================================================================
// IMPORT OUTCOME
// ============================================================================

#[derive(Debug, Clone)]
pub struct ImportOutcome {
    pub households: Vec<Household>,
    pub skipped_rows: usize,
    pub mapping: ColumnMapping,
}

impl ImportOutcome {
    pub fn summary(&self) -> String {
        format!(
            "{} households loaded, {} rows skipped",
            self.households.len(),
            self.skipped_rows
        )
    }
}

// ============================================================================
// ENTRY POINTS
// ============================================================================

/// Read a file and import it with header guessing
pub fn import_households(file_path: &Path) -> Result<ImportOutcome, ImportError> {
    let text = fs::read_to_string(file_path).map_err(|source| ImportError::Io {
        path: file_path.to_path_buf(),
        source,
    })?;

    let outcome = parse_households(&text)?;
    info!(
        file = %file_path.display(),
        households = outcome.households.len(),
        skipped = outcome.skipped_rows,
        "household import finished"
    );
    Ok(outcome)
}

/// Parse delimited text, guessing column meaning from the header line
pub fn parse_households(text: &str) -> Result<ImportOutcome, ImportError> {
    let text = strip_bom(text);
    let header_line = text.lines().next().ok_or(ImportError::EmptyInput)?;
    let mapping = ColumnMapping::guess(header_line)?;
    debug!(?mapping, "guessed column mapping");
    parse_households_with_mapping(text, &mapping)
}

/// Parse delimited text with an explicit column mapping
pub fn parse_households_with_mapping(
    text: &str,
    mapping: &ColumnMapping,
) -> Result<ImportOutcome, ImportError> {
    let text = strip_bom(text);

    let mut reader = ReaderBuilder::new()
        .has_headers(mapping.skip_header)
        .delimiter(mapping.delimiter)
        .flexible(true)
        .from_reader(text.as_bytes());

    let mut households = Vec::new();
    let mut skipped_rows = 0;

    for result in reader.records() {
        let record = result?;
        if record.iter().all(|cell| cell.trim().is_empty()) {
            continue;
        }
        let line = record.position().map(|p| p.line()).unwrap_or(0);

        match household_from_record(&record, mapping) {
            Some(household) => households.push(household),
            None => {
                debug!(line, "skipping malformed household row");
                skipped_rows += 1;
            }
        }
    }

    Ok(ImportOutcome {
        households,
        skipped_rows,
        mapping: mapping.clone(),
    })
}

// ============================================================================
// ROW HANDLING
// ============================================================================

fn household_from_record(record: &StringRecord, mapping: &ColumnMapping) -> Option<Household> {
    let size = clean_cell(record.get(mapping.member_count)?)
        .parse::<i64>()
        .ok()?;

    let id = optional_cell(record, mapping.id);
    let head_name = optional_cell(record, mapping.head_name);
    let attributes = mapping
        .attributes
        .and_then(|column| record.get(column))
        .map(parse_attributes)
        .unwrap_or_default();

    Household::new(id, head_name, size, attributes).ok()
}

fn optional_cell(record: &StringRecord, column: Option<usize>) -> String {
    column
        .and_then(|c| record.get(c))
        .map(clean_cell)
        .unwrap_or_else(|| UNKNOWN.to_string())
}

/// Parse a `;`-separated attribute cell. Unknown tokens and "NONE" are dropped.
pub fn parse_attributes(cell: &str) -> Vec<VulnerabilityAttribute> {
    clean_cell(cell)
        .split(';')
        .map(normalize_label)
        .filter(|key| !key.is_empty() && key != "NONE")
        .filter_map(|key| VulnerabilityAttribute::from_label(&key))
        .collect()
}

fn clean_cell(cell: &str) -> String {
    cell.replace('"', "").trim().to_string()
}

fn strip_bom(text: &str) -> &str {
    text.trim_start_matches('\u{feff}')
}

// ============================================================================
// TESTS
// ============================================================================
