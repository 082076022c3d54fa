//! Record store abstraction.
//!
//! The record store is the persistence collaborator that executes internal
//! queries and returns raw encounter rows. Rows are loosely-typed JSON
//! objects; validation into [`EncounterRecord`](crate::record::EncounterRecord)
//! happens in the search adapter.
//!
//! - [`RecordStore`] - Query execution trait
//! - [`RecordQuery`] - Internal query built from external search parameters
//! - [`MemoryRecordStore`] - In-memory implementation

use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::ExportResult;
use crate::search::{SearchParamType, SearchValue};

pub mod memory;

pub use memory::MemoryRecordStore;

/// A filter on one or more record fields.
///
/// The filter matches when any bound field matches any value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldFilter {
    /// The external parameter name this filter came from.
    pub param: String,
    /// Record fields to match against.
    pub fields: Vec<String>,
    /// How values are compared.
    pub param_type: SearchParamType,
    /// Values, ORed.
    pub values: Vec<SearchValue>,
}

/// An internal query executed by a [`RecordStore`].
///
/// Filters are ANDed. When `restrict_to_patient` is set, the store must only
/// return rows belonging to that patient.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecordQuery {
    /// Field filters, ANDed.
    pub filters: Vec<FieldFilter>,
    /// Patient id the results are confined to.
    pub restrict_to_patient: Option<String>,
    /// Record field holding the patient id.
    pub patient_field: String,
}

impl RecordQuery {
    /// Creates an unrestricted query with no filters.
    pub fn new(patient_field: impl Into<String>) -> Self {
        Self {
            filters: Vec::new(),
            restrict_to_patient: None,
            patient_field: patient_field.into(),
        }
    }

    /// Adds a filter.
    pub fn with_filter(mut self, filter: FieldFilter) -> Self {
        self.filters.push(filter);
        self
    }

    /// Confines results to one patient.
    pub fn restricted_to(mut self, patient: impl Into<String>) -> Self {
        self.restrict_to_patient = Some(patient.into());
        self
    }
}

/// Persistence collaborator that executes encounter queries.
///
/// # Example
///
/// ```ignore
/// use helios_encounter_export::store::{RecordQuery, RecordStore};
///
/// async fn count_rows<S: RecordStore>(store: &S) -> usize {
///     let query = RecordQuery::new("puuid");
///     store.search(&query).await.map(|rows| rows.len()).unwrap_or(0)
/// }
/// ```
#[async_trait]
pub trait RecordStore: Send + Sync {
    /// Returns a short name for logging.
    fn backend_name(&self) -> &'static str;

    /// Executes a query and returns matching rows in a stable order.
    ///
    /// # Errors
    ///
    /// * `ExportError::Backend` - If the store cannot execute the query
    async fn search(&self, query: &RecordQuery) -> ExportResult<Vec<Value>>;
}

#[async_trait]
impl<T: RecordStore + ?Sized> RecordStore for Arc<T> {
    fn backend_name(&self) -> &'static str {
        (**self).backend_name()
    }

    async fn search(&self, query: &RecordQuery) -> ExportResult<Vec<Value>> {
        (**self).search(query).await
    }
}
