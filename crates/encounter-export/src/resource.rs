//! FHIR R4 Encounter wire model.
//!
//! Only the elements the mapper populates are modelled. Absent elements are
//! skipped on serialization so the output matches the FHIR JSON format.

use serde::{Deserialize, Serialize};

/// Resource type name of [`Encounter`].
pub const ENCOUNTER: &str = "Encounter";

/// Resource metadata.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Meta {
    /// Version id.
    pub version_id: String,
    /// Last update instant, extended ISO-8601.
    pub last_updated: String,
}

/// A business identifier.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identifier {
    /// Namespace of the identifier value.
    pub system: String,
    /// The identifier value.
    pub value: String,
}

/// A code from a code system.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Coding {
    /// Code system URI.
    pub system: String,
    /// Code within the system.
    pub code: String,
    /// Human-readable display.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display: Option<String>,
}

impl Coding {
    /// Creates a coding.
    pub fn new(
        system: impl Into<String>,
        code: impl Into<String>,
        display: Option<String>,
    ) -> Self {
        Self {
            system: system.into(),
            code: code.into(),
            display,
        }
    }
}

/// A concept with codings and/or text.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CodeableConcept {
    /// Codings for the concept.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub coding: Vec<Coding>,
    /// Plain-text representation.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
}

impl CodeableConcept {
    /// Creates a concept with a single coding.
    pub fn from_coding(coding: Coding) -> Self {
        Self {
            coding: vec![coding],
            text: None,
        }
    }

    /// Creates a text-only concept.
    pub fn from_text(text: impl Into<String>) -> Self {
        Self {
            coding: Vec::new(),
            text: Some(text.into()),
        }
    }
}

/// An extension with a code value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Extension {
    /// Extension definition URL.
    pub url: String,
    /// Code value.
    pub value_code: String,
}

/// A reference to another resource.
///
/// A reference whose target is unknown carries a data-absent-reason
/// extension and no `reference`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Reference {
    /// Relative reference, e.g. `Patient/123`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reference: Option<String>,
    /// Target resource type.
    #[serde(default, rename = "type", skip_serializing_if = "Option::is_none")]
    pub target_type: Option<String>,
    /// Extensions.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub extension: Vec<Extension>,
}

impl Reference {
    /// Creates a relative reference to `resource_type/id`.
    pub fn to(resource_type: &str, id: &str) -> Self {
        Self {
            reference: Some(format!("{}/{}", resource_type, id)),
            target_type: Some(resource_type.to_string()),
            extension: Vec::new(),
        }
    }

    /// Creates a reference that only carries a data-absent extension.
    pub fn data_absent(extension: Extension) -> Self {
        Self {
            reference: None,
            target_type: None,
            extension: vec![extension],
        }
    }

    /// Returns the id part of a relative reference.
    pub fn target_id(&self) -> Option<&str> {
        self.reference
            .as_deref()
            .and_then(|r| r.split_once('/'))
            .map(|(_, id)| id)
    }

    /// Returns true if this reference is a data-absent marker.
    pub fn is_data_absent(&self) -> bool {
        self.reference.is_none() && !self.extension.is_empty()
    }
}

/// A time period.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Period {
    /// Start instant, extended ISO-8601.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start: Option<String>,
    /// End instant, extended ISO-8601.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end: Option<String>,
}

/// A participant in the encounter.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EncounterParticipant {
    /// Role of the participant.
    #[serde(rename = "type")]
    pub participant_type: Vec<CodeableConcept>,
    /// Period of participation.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub period: Option<Period>,
    /// The practitioner.
    pub individual: Reference,
}

/// Details about an admission.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Hospitalization {
    /// Category of location after discharge.
    pub discharge_disposition: CodeableConcept,
}

/// A location where the encounter took place.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EncounterLocation {
    /// The location.
    pub location: Reference,
}

/// A FHIR R4 Encounter resource.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Encounter {
    /// Always `"Encounter"`.
    pub resource_type: String,
    /// Resource metadata.
    pub meta: Meta,
    /// Logical id.
    pub id: String,
    /// Business identifiers.
    pub identifier: Vec<Identifier>,
    /// Encounter status.
    pub status: String,
    /// Classification of the encounter.
    pub class: Coding,
    /// Specific type of encounter.
    #[serde(rename = "type")]
    pub encounter_type: Vec<CodeableConcept>,
    /// The patient.
    pub subject: Reference,
    /// People involved in the encounter.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub participant: Vec<EncounterParticipant>,
    /// Start of the encounter.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub period: Option<Period>,
    /// Reason for the encounter.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub reason_code: Vec<CodeableConcept>,
    /// Admission details.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hospitalization: Option<Hospitalization>,
    /// Organization responsible for the encounter.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub service_provider: Option<Reference>,
    /// Locations where the encounter took place.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub location: Vec<EncounterLocation>,
}

impl Encounter {
    /// Returns the relative URL of this resource.
    pub fn url(&self) -> String {
        format!("{}/{}", self.resource_type, self.id)
    }

    /// Serializes the resource as a single-line JSON document.
    pub fn to_json_line(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }
}
