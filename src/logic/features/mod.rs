//! Features Module - reference schema and input alignment
//!
//! Incoming records rarely match the model's column layout exactly:
//! uploads carry index and label columns, hand-written requests omit most
//! flow statistics. Everything is reconciled here before inference.

pub mod align;
pub mod schema;

pub use align::{prepare_features, FeatureInput};
pub use schema::{FeatureSchema, SchemaError, DUMMY_FEATURE};

use thiserror::Error;

// ============================================================================
// ERRORS
// ============================================================================

#[derive(Debug, Error)]
pub enum FeatureError {
    #[error("Invalid value {value:?} for feature '{column}'{}", row_suffix(.row))]
    InvalidValue {
        column: String,
        row: Option<usize>,
        value: String,
    },

    #[error("Row {row} has {found} fields, expected {expected}")]
    RaggedRow {
        row: usize,
        expected: usize,
        found: usize,
    },

    #[error("{0}")]
    Csv(#[from] csv::Error),
}

fn row_suffix(row: &Option<usize>) -> String {
    row.map(|r| format!(" at row {}", r)).unwrap_or_default()
}

// ============================================================================
// FEATURE MATRIX
// ============================================================================

/// Dense row-major matrix handed to the classifier
#[derive(Debug, Clone, PartialEq)]
pub struct FeatureMatrix {
    columns: Vec<String>,
    data: Vec<f32>,
    rows: usize,
}

impl FeatureMatrix {
    /// Build from row-major data; `data.len()` must be `rows * columns.len()`
    pub fn new(columns: Vec<String>, data: Vec<f32>) -> Self {
        let width = columns.len();
        let rows = if width == 0 { 0 } else { data.len() / width };
        debug_assert_eq!(rows * width, data.len());
        Self { columns, data, rows }
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn width(&self) -> usize {
        self.columns.len()
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn row(&self, index: usize) -> &[f32] {
        let width = self.width();
        &self.data[index * width..(index + 1) * width]
    }

    pub fn iter_rows(&self) -> impl Iterator<Item = &[f32]> {
        // chunks_exact panics on 0
        self.data.chunks_exact(self.width().max(1)).take(self.rows)
    }

    pub fn as_slice(&self) -> &[f32] {
        &self.data
    }
}

// ============================================================================
// FEATURE FRAME (tabular upload)
// ============================================================================

/// Raw tabular input: header plus string cells, exactly as uploaded
#[derive(Debug, Clone, Default)]
pub struct FeatureFrame {
    header: Vec<String>,
    rows: Vec<Vec<String>>,
}

impl FeatureFrame {
    /// Parse CSV bytes with a header row. Blank lines are skipped; short
    /// rows are padded with empty (missing) cells, long rows are rejected.
    pub fn from_csv(data: &[u8]) -> Result<Self, FeatureError> {
        let data = data.strip_prefix(b"\xEF\xBB\xBF").unwrap_or(data);

        let mut reader = csv::ReaderBuilder::new()
            .has_headers(true)
            .flexible(true)
            .from_reader(data);

        let header: Vec<String> = reader.headers()?.iter().map(|h| h.to_string()).collect();
        let mut rows = Vec::new();

        for (i, record) in reader.records().enumerate() {
            let record = record?;
            if record.len() > header.len() {
                return Err(FeatureError::RaggedRow {
                    row: i + 1,
                    expected: header.len(),
                    found: record.len(),
                });
            }
            let mut cells: Vec<String> = record.iter().map(|c| c.to_string()).collect();
            cells.resize(header.len(), String::new());
            rows.push(cells);
        }

        Ok(Self { header, rows })
    }

    pub fn header(&self) -> &[String] {
        &self.header
    }

    pub fn rows(&self) -> &[Vec<String>] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// No data rows (a header alone counts as empty)
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}
