//! Feature Schema - reference column list expected by the model
//!
//! **The column order here is the order the model was trained on.**
//!
//! The schema comes from the header row of a reference CSV exported
//! alongside the model, minus the bookkeeping columns (index, raw label,
//! encoded label). When no reference file is configured the built-in
//! CIC-IDS2017 layout is used.

use std::collections::HashSet;
use std::fs::File;
use std::io::Read;
use std::path::Path;

use serde::Serialize;
use thiserror::Error;

// ============================================================================
// CONSTANTS
// ============================================================================

/// Columns present in training exports that are not model inputs
pub const DEFAULT_EXCLUDED_COLUMNS: &[&str] = &["Unnamed: 0", "Label", "Label_Encoded"];

/// Name of the zero column appended when the model expects one extra input
pub const DUMMY_FEATURE: &str = "Dummy_Feature";

/// CIC-IDS2017 flow features (MachineLearningCVE export), in export order
pub const CIC_IDS2017_FEATURES: &[&str] = &[
    // === Flow basics ===
    "Destination Port",
    "Flow Duration",
    "Total Fwd Packets",
    "Total Backward Packets",
    "Total Length of Fwd Packets",
    "Total Length of Bwd Packets",
    // === Packet lengths ===
    "Fwd Packet Length Max",
    "Fwd Packet Length Min",
    "Fwd Packet Length Mean",
    "Fwd Packet Length Std",
    "Bwd Packet Length Max",
    "Bwd Packet Length Min",
    "Bwd Packet Length Mean",
    "Bwd Packet Length Std",
    // === Rates ===
    "Flow Bytes/s",
    "Flow Packets/s",
    // === Inter-arrival times ===
    "Flow IAT Mean",
    "Flow IAT Std",
    "Flow IAT Max",
    "Flow IAT Min",
    "Fwd IAT Total",
    "Fwd IAT Mean",
    "Fwd IAT Std",
    "Fwd IAT Max",
    "Fwd IAT Min",
    "Bwd IAT Total",
    "Bwd IAT Mean",
    "Bwd IAT Std",
    "Bwd IAT Max",
    "Bwd IAT Min",
    // === Flags & headers ===
    "Fwd PSH Flags",
    "Bwd PSH Flags",
    "Fwd URG Flags",
    "Bwd URG Flags",
    "Fwd Header Length",
    "Bwd Header Length",
    "Fwd Packets/s",
    "Bwd Packets/s",
    "Min Packet Length",
    "Max Packet Length",
    "Packet Length Mean",
    "Packet Length Std",
    "Packet Length Variance",
    "FIN Flag Count",
    "SYN Flag Count",
    "RST Flag Count",
    "PSH Flag Count",
    "ACK Flag Count",
    "URG Flag Count",
    "CWE Flag Count",
    "ECE Flag Count",
    "Down/Up Ratio",
    "Average Packet Size",
    "Avg Fwd Segment Size",
    "Avg Bwd Segment Size",
    "Fwd Header Length.1",
    // === Bulk ===
    "Fwd Avg Bytes/Bulk",
    "Fwd Avg Packets/Bulk",
    "Fwd Avg Bulk Rate",
    "Bwd Avg Bytes/Bulk",
    "Bwd Avg Packets/Bulk",
    "Bwd Avg Bulk Rate",
    // === Subflows & windows ===
    "Subflow Fwd Packets",
    "Subflow Fwd Bytes",
    "Subflow Bwd Packets",
    "Subflow Bwd Bytes",
    "Init_Win_bytes_forward",
    "Init_Win_bytes_backward",
    "act_data_pkt_fwd",
    "min_seg_size_forward",
    // === Active / idle ===
    "Active Mean",
    "Active Std",
    "Active Max",
    "Active Min",
    "Idle Mean",
    "Idle Std",
    "Idle Max",
    "Idle Min",
];

// ============================================================================
// ERRORS
// ============================================================================

#[derive(Debug, Error)]
pub enum SchemaError {
    #[error("cannot open reference CSV {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("cannot read reference CSV header: {0}")]
    Csv(#[from] csv::Error),

    #[error("reference schema has no feature columns")]
    NoFeatures,

    #[error("reference schema lists column '{0}' more than once")]
    DuplicateColumn(String),
}

// ============================================================================
// SCHEMA
// ============================================================================

/// Ordered reference column list
#[derive(Debug, Clone, Serialize)]
pub struct FeatureSchema {
    columns: Vec<String>,
    excluded: Vec<String>,
    source: String,
}

impl FeatureSchema {
    /// Build a schema from raw column names, dropping excluded ones
    pub fn new<I, S>(columns: I, excluded: &[String], source: &str) -> Result<Self, SchemaError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let excluded: Vec<String> = excluded.iter().map(|c| c.trim().to_string()).collect();

        let mut seen = HashSet::new();
        let mut kept = Vec::new();
        for column in columns {
            let name = column.as_ref().trim();
            if excluded.iter().any(|e| e == name) {
                continue;
            }
            if !seen.insert(name.to_string()) {
                return Err(SchemaError::DuplicateColumn(name.to_string()));
            }
            kept.push(name.to_string());
        }

        if kept.is_empty() {
            return Err(SchemaError::NoFeatures);
        }

        Ok(Self {
            columns: kept,
            excluded,
            source: source.to_string(),
        })
    }

    /// Built-in CIC-IDS2017 schema with the default exclusions
    pub fn cic_ids2017() -> Self {
        Self {
            columns: CIC_IDS2017_FEATURES.iter().map(|c| c.to_string()).collect(),
            excluded: default_excluded(),
            source: "builtin:cic-ids2017".to_string(),
        }
    }

    /// Load the schema from the header row of a reference CSV
    pub fn from_reference_csv(path: &Path, excluded: &[String]) -> Result<Self, SchemaError> {
        let file = File::open(path).map_err(|source| SchemaError::Io {
            path: path.display().to_string(),
            source,
        })?;
        let schema = Self::from_header_reader(file, excluded, &path.display().to_string())?;

        tracing::info!(
            "Loaded feature schema from {} ({} columns)",
            path.display(),
            schema.len()
        );
        Ok(schema)
    }

    /// Read only the header of CSV data; rows are never parsed
    pub fn from_header_reader<R: Read>(
        reader: R,
        excluded: &[String],
        source: &str,
    ) -> Result<Self, SchemaError> {
        let mut csv_reader = csv::ReaderBuilder::new()
            .has_headers(true)
            .flexible(true)
            .from_reader(reader);
        let headers = csv_reader.headers()?.clone();

        Self::new(headers.iter().map(strip_bom), excluded, source)
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn len(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    pub fn is_excluded(&self, name: &str) -> bool {
        self.excluded.iter().any(|e| e == name.trim())
    }

    /// Where the schema was loaded from (file path or builtin tag)
    pub fn source(&self) -> &str {
        &self.source
    }
}

/// Default exclusion list as owned strings (config default)
pub fn default_excluded() -> Vec<String> {
    DEFAULT_EXCLUDED_COLUMNS.iter().map(|c| c.to_string()).collect()
}

fn strip_bom(name: &str) -> &str {
    name.strip_prefix('\u{feff}').unwrap_or(name)
}

// ============================================================================
// TESTS
// ============================================================================
