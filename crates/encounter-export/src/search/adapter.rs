//! Translation of external search parameters into record store queries.
//!
//! [`RecordSearchAdapter`] is the boundary between loosely-typed store rows
//! and the typed records the mapper consumes. It resolves parameter names
//! against the catalog, validates values, executes the query, and validates
//! every returned row.
//!
//! # Patient restriction
//!
//! When a search is confined to one patient, rows for any other patient are
//! never returned, even if the store failed to apply the restriction.

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::datetime::DateRange;
use crate::error::{ExportError, ExportResult, SearchError, ValidationError};
use crate::record::{EncounterRecord, fields, row_text};
use crate::store::{FieldFilter, RecordQuery, RecordStore};

use super::catalog::{SearchParameterCatalog, SearchParameterDefinition};
use super::params::{SearchParamType, SearchParams, SearchValue};

/// Severity of an [`OutcomeIssue`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IssueSeverity {
    /// A row was withheld for a reason that must not happen in a correct store.
    Error,
    /// A row was skipped.
    Warning,
}

impl fmt::Display for IssueSeverity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IssueSeverity::Error => write!(f, "error"),
            IssueSeverity::Warning => write!(f, "warning"),
        }
    }
}

/// A non-fatal problem encountered while processing search results.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutcomeIssue {
    /// How serious the issue is.
    pub severity: IssueSeverity,
    /// Human-readable description.
    pub message: String,
    /// Id of the affected record, when known.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub record_id: Option<String>,
}

/// Records returned by a search, plus any non-fatal issues.
#[derive(Debug, Clone, Default)]
pub struct ProcessingOutcome {
    records: Vec<EncounterRecord>,
    issues: Vec<OutcomeIssue>,
}

impl ProcessingOutcome {
    /// Returns the records in result order.
    pub fn records(&self) -> &[EncounterRecord] {
        &self.records
    }

    /// Returns the accumulated issues.
    pub fn issues(&self) -> &[OutcomeIssue] {
        &self.issues
    }

    /// Returns true if any issue was recorded.
    pub fn has_issues(&self) -> bool {
        !self.issues.is_empty()
    }

    /// Splits the outcome into records and issues.
    pub fn into_parts(self) -> (Vec<EncounterRecord>, Vec<OutcomeIssue>) {
        (self.records, self.issues)
    }

    /// Returns the number of records.
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Returns true if there are no records.
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    fn issue(&mut self, severity: IssueSeverity, message: String, record_id: Option<String>) {
        self.issues.push(OutcomeIssue {
            severity,
            message,
            record_id,
        });
    }
}

/// Executes encounter searches against a [`RecordStore`].
#[derive(Debug)]
pub struct RecordSearchAdapter<S> {
    store: S,
    catalog: SearchParameterCatalog,
}

impl<S: RecordStore> RecordSearchAdapter<S> {
    /// Creates an adapter over the given store and catalog.
    pub fn new(store: S, catalog: SearchParameterCatalog) -> Self {
        Self { store, catalog }
    }

    /// Returns the parameter catalog.
    pub fn catalog(&self) -> &SearchParameterCatalog {
        &self.catalog
    }

    /// Returns the underlying store.
    pub fn store(&self) -> &S {
        &self.store
    }

    /// Searches for encounters.
    ///
    /// # Arguments
    ///
    /// * `params` - External search parameters
    /// * `restrict_to_patient` - Confine results to this patient id
    ///
    /// # Errors
    ///
    /// * `SearchError::UnsupportedParameter` - If a parameter is not in the catalog
    /// * `SearchError::UnsupportedPrefix` - If the store rejects a prefix for the parameter type
    /// * `ValidationError::InvalidSearchParameter` - If a value is empty or malformed
    /// * `ExportError::Backend` - If the store fails
    pub async fn search(
        &self,
        params: &SearchParams,
        restrict_to_patient: Option<&str>,
    ) -> ExportResult<ProcessingOutcome> {
        let query = self.build_query(params, restrict_to_patient)?;
        let rows = self.store.search(&query).await?;

        tracing::debug!(
            backend = self.store.backend_name(),
            rows = rows.len(),
            "Record store returned rows"
        );

        Ok(self.process_rows(rows, restrict_to_patient))
    }

    /// Builds the internal query without executing it.
    pub fn build_query(
        &self,
        params: &SearchParams,
        restrict_to_patient: Option<&str>,
    ) -> ExportResult<RecordQuery> {
        let mut query = RecordQuery::new(self.catalog.patient_field());

        for (name, raw) in params.iter() {
            let definition = self
                .catalog
                .get(name)
                .ok_or_else(|| SearchError::UnsupportedParameter {
                    name: name.to_string(),
                })?;

            query = query.with_filter(FieldFilter {
                param: definition.name.clone(),
                fields: definition.fields.clone(),
                param_type: definition.param_type,
                values: parse_values(definition, raw)?,
            });
        }

        if let Some(patient) = restrict_to_patient {
            query = query.restricted_to(patient);
        }

        Ok(query)
    }

    fn process_rows(
        &self,
        rows: Vec<Value>,
        restrict_to_patient: Option<&str>,
    ) -> ProcessingOutcome {
        let mut outcome = ProcessingOutcome::default();
        let patient_field = self.catalog.patient_field();

        for (index, row) in rows.into_iter().enumerate() {
            if let Some(patient) = restrict_to_patient {
                if row_text(&row, patient_field).as_deref() != Some(patient) {
                    let record_id = row_text(&row, fields::EUUID);
                    tracing::warn!(
                        row = index,
                        record = ?record_id,
                        "Store returned a row outside the patient restriction; withheld"
                    );
                    outcome.issue(
                        IssueSeverity::Error,
                        format!("row {} belongs to another patient and was withheld", index),
                        record_id,
                    );
                    continue;
                }
            }

            match EncounterRecord::from_row(&row) {
                Ok(record) => outcome.records.push(record),
                Err(e) => {
                    tracing::warn!(row = index, error = %e, "Skipping invalid encounter row");
                    outcome.issue(
                        IssueSeverity::Warning,
                        format!("row {} skipped: {}", index, e),
                        None,
                    );
                }
            }
        }

        outcome
    }
}

fn parse_values(
    definition: &SearchParameterDefinition,
    raw: &str,
) -> ExportResult<Vec<SearchValue>> {
    let mut values = Vec::new();

    for part in raw.split(',') {
        if part.is_empty() {
            return Err(invalid(definition, "empty value"));
        }

        // Token values are exact ids; a leading "ne" is part of the id.
        let value = match definition.param_type {
            SearchParamType::Date => SearchValue::parse(part),
            SearchParamType::Token => SearchValue::eq(part),
        };

        if definition.param_type == SearchParamType::Date
            && DateRange::parse(&value.value).is_none()
        {
            return Err(invalid(
                definition,
                &format!("'{}' is not a valid date", value.value),
            ));
        }

        values.push(value);
    }

    Ok(values)
}

fn invalid(definition: &SearchParameterDefinition, message: &str) -> ExportError {
    ValidationError::InvalidSearchParameter {
        parameter: definition.name.clone(),
        message: message.to_string(),
    }
    .into()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::search::SearchPrefix;
    use crate::store::MemoryRecordStore;
    use serde_json::json;

    fn adapter() -> RecordSearchAdapter<MemoryRecordStore> {
        RecordSearchAdapter::new(
            MemoryRecordStore::with_rows(vec![
                json!({"euuid": "e1", "puuid": "p1", "date": "2023-01-01"}),
                json!({"euuid": "e2", "puuid": "p2", "date": "2023-06-01"}),
                json!({"puuid": "p1", "date": "2023-07-01"}),
            ]),
            SearchParameterCatalog::default(),
        )
    }

    #[test]
    fn test_build_query_date() {
        let params = SearchParams::new().with("date", "le2023-12-31T00:00:00+00:00");
        let query = adapter().build_query(&params, None).unwrap();
        assert_eq!(query.filters.len(), 1);
        assert_eq!(query.filters[0].fields, vec!["date"]);
        assert_eq!(query.filters[0].values[0].prefix, SearchPrefix::Le);
        assert!(query.restrict_to_patient.is_none());
    }

    #[test]
    fn test_token_values_keep_prefix_letters() {
        let params = SearchParams::new().with("_id", "lexicon,ge-1");
        let query = adapter().build_query(&params, None).unwrap();
        let values: Vec<_> = query.filters[0].values.iter().map(|v| v.value.as_str()).collect();
        assert_eq!(values, vec!["lexicon", "ge-1"]);
    }

    #[test]
    fn test_unknown_parameter() {
        let params = SearchParams::new().with("subject", "p1");
        let err = adapter().build_query(&params, None).unwrap_err();
        assert!(err.to_string().contains("unsupported search parameter: subject"));
    }

    #[test]
    fn test_invalid_date_value() {
        let params = SearchParams::new().with("date", "lenever");
        assert!(adapter().build_query(&params, None).is_err());

        let params = SearchParams::new().with("date", "");
        assert!(adapter().build_query(&params, None).is_err());
    }

    #[tokio::test]
    async fn test_invalid_rows_become_issues() {
        let outcome = adapter().search(&SearchParams::new(), None).await.unwrap();
        assert_eq!(outcome.len(), 2);
        assert_eq!(outcome.issues().len(), 1);
        assert_eq!(outcome.issues()[0].severity, IssueSeverity::Warning);
    }

    #[tokio::test]
    async fn test_patient_restriction() {
        let outcome = adapter().search(&SearchParams::new(), Some("p2")).await.unwrap();
        let ids: Vec<_> = outcome.records().iter().map(|r| r.euuid.as_str()).collect();
        assert_eq!(ids, vec!["e2"]);
        assert!(!outcome.has_issues());
    }
}
