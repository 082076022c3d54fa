//! Encounter search.
//!
//! - [`params`] - Search parameter value types and query-string parsing
//! - [`catalog`] - The table of supported parameters and their field bindings
//! - [`adapter`] - Translation of external parameters into record store queries
//!
//! # Example
//!
//! ```ignore
//! use helios_encounter_export::search::{
//!     RecordSearchAdapter, SearchParameterCatalog, SearchParams,
//! };
//! use helios_encounter_export::store::MemoryRecordStore;
//!
//! let store = MemoryRecordStore::new();
//! let adapter = RecordSearchAdapter::new(store, SearchParameterCatalog::default());
//! let params = SearchParams::parse("date=ge2023-01-01")?;
//! let outcome = adapter.search(&params, Some("patient-123")).await?;
//! ```

pub mod adapter;
pub mod catalog;
pub mod params;

pub use adapter::{IssueSeverity, OutcomeIssue, ProcessingOutcome, RecordSearchAdapter};
pub use catalog::{
    PatientSearchCapability, PatientUuidSearch, SearchParamCapability, SearchParameterCatalog,
    SearchParameterDefinition,
};
pub use params::{SearchParamType, SearchParams, SearchPrefix, SearchValue};
