//! Feature Alignment - reconcile arbitrary input with the reference schema
//!
//! Steps, in order:
//! 1. drop non-feature columns (index, labels)
//! 2. fill schema columns absent from the input with `0.0`
//! 3. select schema columns in schema order, ignoring extras
//! 4. pad one trailing `Dummy_Feature` when the model expects exactly one
//!    more input than the schema provides
//!
//! Missing values inside a present column (`null`, empty cell) become
//! `NaN` and are left to the model's default-branch handling.

use std::collections::HashMap;

use serde_json::{Map, Value};

use super::schema::{FeatureSchema, DUMMY_FEATURE};
use super::{FeatureError, FeatureFrame, FeatureMatrix};

/// Value used for schema columns absent from the input
pub const MISSING_FILL: f32 = 0.0;

/// Input accepted by [`prepare_features`]
#[derive(Debug, Clone, Copy)]
pub enum FeatureInput<'a> {
    /// Single record: feature name → value
    Record(&'a Map<String, Value>),
    /// Batch upload
    Frame(&'a FeatureFrame),
}

/// Align input to the schema and produce the model's input matrix.
///
/// `expected_width` is the model's input width when known; it only
/// controls dummy padding.
pub fn prepare_features(
    input: FeatureInput<'_>,
    schema: &FeatureSchema,
    expected_width: Option<usize>,
) -> Result<FeatureMatrix, FeatureError> {
    match input {
        FeatureInput::Record(record) => prepare_record(record, schema, expected_width),
        FeatureInput::Frame(frame) => prepare_frame(frame, schema, expected_width),
    }
}

// ============================================================================
// PLAN
// ============================================================================

/// Where each schema column comes from in the input
struct Alignment {
    sources: Vec<Option<usize>>,
    pad: bool,
}

impl Alignment {
    fn plan<'a, I>(schema: &FeatureSchema, input_columns: I, expected_width: Option<usize>) -> Self
    where
        I: IntoIterator<Item = &'a str>,
    {
        let mut positions: HashMap<&str, usize> = HashMap::new();
        for (i, name) in input_columns.into_iter().enumerate() {
            let name = name.trim();
            if schema.is_excluded(name) {
                continue;
            }
            positions.entry(name).or_insert(i);
        }

        let sources: Vec<Option<usize>> = schema
            .columns()
            .iter()
            .map(|c| positions.get(c.as_str()).copied())
            .collect();

        let missing: Vec<&str> = schema
            .columns()
            .iter()
            .zip(&sources)
            .filter(|(_, src)| src.is_none())
            .map(|(c, _)| c.as_str())
            .collect();
        if !missing.is_empty() {
            tracing::warn!(
                "Missing features ({}), filling with {}: {:?}",
                missing.len(),
                MISSING_FILL,
                missing
            );
        }

        let pad = expected_width == Some(schema.len() + 1);

        Self { sources, pad }
    }

    fn width(&self) -> usize {
        self.sources.len() + usize::from(self.pad)
    }

    fn columns(&self, schema: &FeatureSchema) -> Vec<String> {
        let mut columns = schema.columns().to_vec();
        if self.pad {
            columns.push(DUMMY_FEATURE.to_string());
        }
        columns
    }
}

// ============================================================================
// RECORD / FRAME
// ============================================================================

fn prepare_record(
    record: &Map<String, Value>,
    schema: &FeatureSchema,
    expected_width: Option<usize>,
) -> Result<FeatureMatrix, FeatureError> {
    let keys: Vec<&str> = record.keys().map(String::as_str).collect();
    let values: Vec<&Value> = record.values().collect();
    let plan = Alignment::plan(schema, keys.iter().copied(), expected_width);

    let mut data = Vec::with_capacity(plan.width());
    for (column, src) in schema.columns().iter().zip(&plan.sources) {
        let value = match src {
            Some(i) => coerce_json(values[*i]).ok_or_else(|| FeatureError::InvalidValue {
                column: column.clone(),
                row: None,
                value: values[*i].to_string(),
            })?,
            None => MISSING_FILL,
        };
        data.push(value);
    }
    if plan.pad {
        data.push(MISSING_FILL);
    }

    Ok(FeatureMatrix::new(plan.columns(schema), data))
}

fn prepare_frame(
    frame: &FeatureFrame,
    schema: &FeatureSchema,
    expected_width: Option<usize>,
) -> Result<FeatureMatrix, FeatureError> {
    let plan = Alignment::plan(schema, frame.header().iter().map(String::as_str), expected_width);

    let mut data = Vec::with_capacity(plan.width() * frame.len());
    for (r, row) in frame.rows().iter().enumerate() {
        for (column, src) in schema.columns().iter().zip(&plan.sources) {
            let value = match src {
                Some(i) => {
                    let cell = row.get(*i).map(String::as_str).unwrap_or("");
                    parse_cell(cell).ok_or_else(|| FeatureError::InvalidValue {
                        column: column.clone(),
                        row: Some(r + 1),
                        value: cell.to_string(),
                    })?
                }
                None => MISSING_FILL,
            };
            data.push(value);
        }
        if plan.pad {
            data.push(MISSING_FILL);
        }
    }

    Ok(FeatureMatrix::new(plan.columns(schema), data))
}

// ============================================================================
// COERCION
// ============================================================================

/// JSON value → feature value. `None` for arrays, objects, junk strings.
pub fn coerce_json(value: &Value) -> Option<f32> {
    match value {
        Value::Number(n) => n.as_f64().map(|v| v as f32),
        Value::Bool(b) => Some(if *b { 1.0 } else { 0.0 }),
        Value::Null => Some(f32::NAN),
        Value::String(s) => parse_cell(s),
        Value::Array(_) | Value::Object(_) => None,
    }
}

/// Text cell → feature value. Empty is missing; `inf`/`Infinity`/`NaN`
/// are accepted in any case.
pub fn parse_cell(cell: &str) -> Option<f32> {
    let cell = cell.trim();
    if cell.is_empty() {
        return Some(f32::NAN);
    }
    cell.parse::<f32>().ok()
}

// ============================================================================
// TESTS
// ============================================================================
