//! JSON export and import of quote lists.
//!
//! Export is the plain record array, pretty-printed. Import is tolerant per
//! element: the top level must be an array, but elements that are not valid
//! records are dropped and counted instead of failing the whole payload.

use crate::{error::Result, Error, QuoteRecord};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashSet;

/// What an import did.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImportSummary {
    /// Records appended to the store
    pub added: usize,
    /// Candidates dropped because they were not valid records
    pub invalid: usize,
    /// Candidates dropped because their text was already present
    pub duplicates: usize,
}

/// Validated candidates from an import payload.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ImportBatch {
    /// Candidates that passed validation, in payload order
    pub records: Vec<QuoteRecord>,
    /// Number of candidates that failed validation
    pub invalid: usize,
}

impl ImportBatch {
    /// Validate a decoded payload.
    ///
    /// Fails with [`Error::MalformedImport`] unless `value` is an array.
    pub fn from_value(value: &Value) -> Result<Self> {
        let candidates = value.as_array().ok_or_else(|| {
            Error::MalformedImport(format!("expected a JSON array, got {}", kind_of(value)))
        })?;

        let mut batch = Self::default();
        for candidate in candidates {
            match QuoteRecord::from_candidate(candidate) {
                Some(record) => batch.records.push(record),
                None => batch.invalid += 1,
            }
        }
        Ok(batch)
    }

    /// Parse and validate JSON text.
    pub fn from_json(json: &str) -> Result<Self> {
        let value: Value =
            serde_json::from_str(json).map_err(|e| Error::MalformedImport(e.to_string()))?;
        Self::from_value(&value)
    }

    /// Split the batch against existing records.
    ///
    /// Existing records win on a `text` collision, and within the batch the
    /// first occurrence of a `text` wins.
    pub fn merge_into(self, existing: &[QuoteRecord]) -> (Vec<QuoteRecord>, ImportSummary) {
        let mut seen: HashSet<String> = existing.iter().map(|r| r.text.clone()).collect();
        let mut summary = ImportSummary {
            invalid: self.invalid,
            ..ImportSummary::default()
        };

        let mut additions = Vec::new();
        for record in self.records {
            if seen.insert(record.text.clone()) {
                additions.push(record);
            } else {
                summary.duplicates += 1;
            }
        }
        summary.added = additions.len();

        (additions, summary)
    }
}

/// Serialize records as pretty JSON.
pub fn export_json(records: &[QuoteRecord]) -> Result<String> {
    Ok(serde_json::to_string_pretty(records)?)
}

/// Parse a persisted record list.
///
/// Fails unless the payload is a JSON array. Elements that are not valid
/// records are skipped, the rest are kept in order.
pub fn decode_records(json: &str) -> Result<Vec<QuoteRecord>> {
    let value: Value = serde_json::from_str(json)?;
    let elements = value.as_array().ok_or_else(|| {
        Error::Serialization(format!("expected a JSON array, got {}", kind_of(&value)))
    })?;
    Ok(elements.iter().filter_map(QuoteRecord::from_candidate).collect())
}

fn kind_of(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
