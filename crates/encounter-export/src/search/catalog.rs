//! Supported search parameters for encounters.
//!
//! The catalog is a fixed table built once at startup. Each definition binds
//! an external parameter name to one or more record fields and a value type.
//! The `patient` parameter is contributed by a [`PatientSearchCapability`]
//! so every patient-compartment resource binds it the same way.

use serde::{Deserialize, Serialize};

use crate::record::fields;

use super::params::{SearchParamType, SearchPrefix};

/// Definition of a supported search parameter.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchParameterDefinition {
    /// Parameter code (the URL param name, e.g., "_id", "date").
    pub name: String,

    /// The parameter type.
    pub param_type: SearchParamType,

    /// Record fields the parameter is matched against.
    pub fields: Vec<String>,

    /// Description of the parameter.
    pub description: Option<String>,
}

impl SearchParameterDefinition {
    /// Creates a new definition bound to the given fields.
    pub fn new<I, S>(name: impl Into<String>, param_type: SearchParamType, fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            name: name.into(),
            param_type,
            fields: fields.into_iter().map(Into::into).collect(),
            description: None,
        }
    }

    /// Sets the description.
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Returns the comparison prefixes this parameter accepts.
    pub fn comparators(&self) -> Vec<SearchPrefix> {
        SearchPrefix::ALL
            .into_iter()
            .filter(|p| p.is_valid_for(self.param_type))
            .collect()
    }
}

/// Information about a supported search parameter, for capability statements.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchParamCapability {
    /// The parameter name.
    pub name: String,
    /// The parameter type.
    #[serde(rename = "type")]
    pub param_type: SearchParamType,
    /// Supported comparators.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub comparators: Vec<String>,
    /// Documentation for this parameter.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub documentation: Option<String>,
}

/// Provides the `patient` search parameter for a resource type.
pub trait PatientSearchCapability: Send + Sync {
    /// Returns the definition of the `patient` parameter.
    fn patient_search_parameter(&self) -> SearchParameterDefinition;

    /// Returns the record field holding the patient id.
    fn patient_field(&self) -> &str;
}

/// Patient search bound to the `puuid` record field.
#[derive(Debug, Clone)]
pub struct PatientUuidSearch {
    field: String,
}

impl PatientUuidSearch {
    /// Creates a patient search bound to a custom field.
    pub fn new(field: impl Into<String>) -> Self {
        Self {
            field: field.into(),
        }
    }
}

impl Default for PatientUuidSearch {
    fn default() -> Self {
        Self::new(fields::PUUID)
    }
}

impl PatientSearchCapability for PatientUuidSearch {
    fn patient_search_parameter(&self) -> SearchParameterDefinition {
        SearchParameterDefinition::new("patient", SearchParamType::Token, [self.field.as_str()])
            .with_description("The patient present at the encounter")
    }

    fn patient_field(&self) -> &str {
        &self.field
    }
}

/// Table of search parameters supported for encounters.
#[derive(Debug, Clone)]
pub struct SearchParameterCatalog {
    definitions: Vec<SearchParameterDefinition>,
    patient_field: String,
}

impl SearchParameterCatalog {
    /// Builds the encounter catalog: `_id`, `patient` and `date`.
    pub fn encounter(patient: &dyn PatientSearchCapability) -> Self {
        let definitions = vec![
            SearchParameterDefinition::new("_id", SearchParamType::Token, [fields::EUUID])
                .with_description("Logical id of the encounter"),
            patient.patient_search_parameter(),
            SearchParameterDefinition::new("date", SearchParamType::Date, [fields::DATE])
                .with_description("A date within the period the encounter lasted"),
        ];

        Self {
            definitions,
            patient_field: patient.patient_field().to_string(),
        }
    }

    /// Looks up a parameter by name.
    pub fn get(&self, name: &str) -> Option<&SearchParameterDefinition> {
        self.definitions.iter().find(|d| d.name == name)
    }

    /// Iterates the definitions in declaration order.
    pub fn iter(&self) -> impl Iterator<Item = &SearchParameterDefinition> {
        self.definitions.iter()
    }

    /// Returns the number of supported parameters.
    pub fn len(&self) -> usize {
        self.definitions.len()
    }

    /// Returns true if the catalog is empty.
    pub fn is_empty(&self) -> bool {
        self.definitions.is_empty()
    }

    /// Returns the record field holding the patient id.
    pub fn patient_field(&self) -> &str {
        &self.patient_field
    }

    /// Describes the supported parameters for a capability statement.
    pub fn capabilities(&self) -> Vec<SearchParamCapability> {
        self.definitions
            .iter()
            .map(|d| SearchParamCapability {
                name: d.name.clone(),
                param_type: d.param_type,
                comparators: if d.param_type == SearchParamType::Date {
                    d.comparators().iter().map(ToString::to_string).collect()
                } else {
                    Vec::new()
                },
                documentation: d.description.clone(),
            })
            .collect()
    }
}

impl Default for SearchParameterCatalog {
    fn default() -> Self {
        Self::encounter(&PatientUuidSearch::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_encounter_catalog_has_three_parameters() {
        let catalog = SearchParameterCatalog::default();
        let names: Vec<_> = catalog.iter().map(|d| d.name.as_str()).collect();
        assert_eq!(names, vec!["_id", "patient", "date"]);
        assert_eq!(catalog.len(), 3);
    }

    #[test]
    fn test_bindings() {
        let catalog = SearchParameterCatalog::default();
        assert_eq!(catalog.get("_id").unwrap().fields, vec!["euuid"]);
        assert_eq!(catalog.get("patient").unwrap().fields, vec!["puuid"]);
        let date = catalog.get("date").unwrap();
        assert_eq!(date.fields, vec!["date"]);
        assert_eq!(date.param_type, SearchParamType::Date);
        assert!(catalog.get("subject").is_none());
    }

    #[test]
    fn test_custom_patient_capability() {
        let catalog = SearchParameterCatalog::encounter(&PatientUuidSearch::new("pid"));
        assert_eq!(catalog.get("patient").unwrap().fields, vec!["pid"]);
        assert_eq!(catalog.patient_field(), "pid");
    }

    #[test]
    fn test_date_comparators() {
        let catalog = SearchParameterCatalog::default();
        let comparators = catalog.get("date").unwrap().comparators();
        assert!(comparators.contains(&SearchPrefix::Le));
        assert!(comparators.contains(&SearchPrefix::Ge));
        assert_eq!(catalog.get("_id").unwrap().comparators(), vec![SearchPrefix::Eq]);
    }

    #[test]
    fn test_capabilities() {
        let caps = SearchParameterCatalog::default().capabilities();
        assert_eq!(caps.len(), 3);
        assert!(caps[0].comparators.is_empty());
        assert_eq!(caps[2].comparators.len(), 9);
    }
}
