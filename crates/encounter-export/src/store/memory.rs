//! In-memory record store.

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use parking_lot::RwLock;
use serde_json::Value;

use crate::datetime::{DateRange, parse_stored, saturating_add};
use crate::error::{BackendError, ExportResult, SearchError, ValidationError};
use crate::record::{EncounterRecord, row_text};
use crate::search::{SearchParamType, SearchPrefix, SearchValue};

use super::{FieldFilter, RecordQuery, RecordStore};

/// A [`RecordStore`] backed by a vector of JSON rows.
///
/// Rows are returned in insertion order.
#[derive(Debug, Default)]
pub struct MemoryRecordStore {
    rows: RwLock<Vec<Value>>,
}

impl MemoryRecordStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a store holding the given rows.
    pub fn with_rows(rows: Vec<Value>) -> Self {
        Self {
            rows: RwLock::new(rows),
        }
    }

    /// Loads rows from a JSON array.
    ///
    /// # Errors
    ///
    /// * `ValidationError::InvalidConfiguration` - If the text is not a JSON array
    pub fn from_json_str(json: &str) -> ExportResult<Self> {
        let value: Value =
            serde_json::from_str(json).map_err(|e| ValidationError::InvalidConfiguration {
                message: format!("record file is not valid JSON: {}", e),
            })?;
        match value {
            Value::Array(rows) => Ok(Self::with_rows(rows)),
            _ => Err(ValidationError::InvalidConfiguration {
                message: "record file must contain a JSON array".to_string(),
            }
            .into()),
        }
    }

    /// Appends a raw row.
    pub fn insert(&self, row: Value) {
        self.rows.write().push(row);
    }

    /// Appends a typed record.
    pub fn insert_record(&self, record: &EncounterRecord) {
        // EncounterRecord only holds strings, so this cannot fail.
        if let Ok(row) = serde_json::to_value(record) {
            self.insert(row);
        }
    }

    /// Returns the number of stored rows.
    pub fn len(&self) -> usize {
        self.rows.read().len()
    }

    /// Returns true if the store is empty.
    pub fn is_empty(&self) -> bool {
        self.rows.read().is_empty()
    }
}

#[async_trait]
impl RecordStore for MemoryRecordStore {
    fn backend_name(&self) -> &'static str {
        "memory"
    }

    async fn search(&self, query: &RecordQuery) -> ExportResult<Vec<Value>> {
        let rows = self.rows.read();
        let mut matches = Vec::new();

        for row in rows.iter() {
            if let Some(patient) = &query.restrict_to_patient {
                if row_text(row, &query.patient_field).as_deref() != Some(patient.as_str()) {
                    continue;
                }
            }

            let mut keep = true;
            for filter in &query.filters {
                if !matches_filter(row, filter)? {
                    keep = false;
                    break;
                }
            }

            if keep {
                matches.push(row.clone());
            }
        }

        tracing::debug!(
            backend = self.backend_name(),
            filters = query.filters.len(),
            restricted = query.restrict_to_patient.is_some(),
            matched = matches.len(),
            "Executed record query"
        );

        Ok(matches)
    }
}

fn matches_filter(row: &Value, filter: &FieldFilter) -> ExportResult<bool> {
    for field in &filter.fields {
        let Some(actual) = row_text(row, field) else {
            continue;
        };
        for value in &filter.values {
            if matches_value(&actual, value, filter)? {
                return Ok(true);
            }
        }
    }
    Ok(false)
}

fn matches_value(actual: &str, value: &SearchValue, filter: &FieldFilter) -> ExportResult<bool> {
    match filter.param_type {
        SearchParamType::Date => {
            let range = DateRange::parse(&value.value).ok_or_else(|| BackendError::QueryError {
                message: format!("invalid date '{}' for {}", value.value, filter.param),
            })?;
            Ok(parse_stored(actual)
                .map(|instant| date_matches(value.prefix, &range, instant))
                .unwrap_or(false))
        }
        SearchParamType::Token => {
            if value.prefix != SearchPrefix::Eq {
                return Err(SearchError::UnsupportedPrefix {
                    name: filter.param.clone(),
                    prefix: value.prefix.to_string(),
                    param_type: filter.param_type.to_string(),
                }
                .into());
            }
            Ok(actual == value.value)
        }
    }
}

fn date_matches(prefix: SearchPrefix, range: &DateRange, instant: DateTime<Utc>) -> bool {
    match prefix {
        SearchPrefix::Eq => range.contains(instant),
        SearchPrefix::Ne => !range.contains(instant),
        SearchPrefix::Gt | SearchPrefix::Sa => instant >= range.end,
        SearchPrefix::Lt | SearchPrefix::Eb => instant < range.start,
        SearchPrefix::Ge => instant >= range.start,
        SearchPrefix::Le => instant < range.end,
        SearchPrefix::Ap => {
            let low = saturating_add(range.start, -Duration::days(1));
            let high = saturating_add(range.end, Duration::days(1));
            low <= instant && instant < high
        }
    }
}
