//! Code system configuration for the encounter mapper.
//!
//! Every namespace URI and fixed concept the mapper emits lives in a
//! [`CodeSystemConfig`]. The mapper holds one by value, so tests and
//! deployments can substitute alternate namespaces without touching the
//! mapping rules.
//!
//! # Example
//!
//! ```
//! use helios_encounter_export::config::CodeSystemConfig;
//!
//! let config = CodeSystemConfig::default()
//!     .with_identifier_system("https://ehr.example.org/encounters");
//!
//! assert_eq!(config.identifier_system, "https://ehr.example.org/encounters");
//! assert_eq!(config.encounter_type.code, "185349003");
//! ```

use serde::{Deserialize, Serialize};

use crate::error::{ExportResult, ValidationError};

/// Default namespace for encounter identifiers.
pub const DEFAULT_IDENTIFIER_SYSTEM: &str = "urn:ietf:rfc:3986";

/// HL7 v3 ActCode system, used for `Encounter.class`.
pub const HL7_V3_ACT_CODE: &str = "http://terminology.hl7.org/CodeSystem/v3-ActCode";

/// HL7 v3 ParticipationType system, used for `Encounter.participant.type`.
pub const HL7_V3_PARTICIPATION_TYPE: &str =
    "http://terminology.hl7.org/CodeSystem/v3-ParticipationType";

/// HL7 discharge disposition system.
pub const HL7_DISCHARGE_DISPOSITION: &str =
    "http://terminology.hl7.org/CodeSystem/discharge-disposition";

/// HL7 data-absent-reason code system.
pub const HL7_DATA_ABSENT_REASON: &str = "http://terminology.hl7.org/CodeSystem/data-absent-reason";

/// Extension URL for the data-absent-reason extension.
pub const DATA_ABSENT_REASON_EXTENSION: &str =
    "http://hl7.org/fhir/StructureDefinition/data-absent-reason";

/// SNOMED CT.
pub const SNOMED_CT: &str = "http://snomed.info/sct";

/// A fixed coded concept carried in the configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConceptConfig {
    /// Code system URI.
    pub system: String,
    /// Code within the system.
    pub code: String,
    /// Human-readable display.
    pub display: String,
    /// Optional text for the enclosing CodeableConcept.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
}

impl ConceptConfig {
    /// Creates a concept without text.
    pub fn new(
        system: impl Into<String>,
        code: impl Into<String>,
        display: impl Into<String>,
    ) -> Self {
        Self {
            system: system.into(),
            code: code.into(),
            display: display.into(),
            text: None,
        }
    }

    /// Sets the CodeableConcept text.
    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.text = Some(text.into());
        self
    }
}

/// Immutable set of code systems and fixed concepts used by the mapper.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CodeSystemConfig {
    /// System for `Encounter.identifier`.
    pub identifier_system: String,
    /// System for `Encounter.class` when a class code is present.
    pub act_code_system: String,
    /// System for `hospitalization.dischargeDisposition`.
    pub discharge_disposition_system: String,
    /// Extension URL for the data-absent-reason marker on references.
    pub data_absent_extension_url: String,
    /// Placeholder coding used when the class is unknown.
    pub unknown_class: ConceptConfig,
    /// The single encounter type emitted for every record.
    pub encounter_type: ConceptConfig,
    /// Participant type for the primary performer.
    pub primary_performer: ConceptConfig,
}

impl Default for CodeSystemConfig {
    fn default() -> Self {
        Self {
            identifier_system: DEFAULT_IDENTIFIER_SYSTEM.to_string(),
            act_code_system: HL7_V3_ACT_CODE.to_string(),
            discharge_disposition_system: HL7_DISCHARGE_DISPOSITION.to_string(),
            data_absent_extension_url: DATA_ABSENT_REASON_EXTENSION.to_string(),
            unknown_class: ConceptConfig::new(HL7_DATA_ABSENT_REASON, "unknown", "Unknown"),
            encounter_type: ConceptConfig::new(
                SNOMED_CT,
                "185349003",
                "Encounter for check up (procedure)",
            ),
            primary_performer: ConceptConfig::new(
                HL7_V3_PARTICIPATION_TYPE,
                "PPRF",
                "primary performer",
            )
            .with_text("Primary Performer"),
        }
    }
}

impl CodeSystemConfig {
    /// Reads a configuration from JSON. Missing keys take their defaults.
    pub fn from_json_str(json: &str) -> ExportResult<Self> {
        serde_json::from_str(json).map_err(|e| {
            ValidationError::InvalidConfiguration {
                message: e.to_string(),
            }
            .into()
        })
    }

    /// Sets the identifier system.
    pub fn with_identifier_system(mut self, system: impl Into<String>) -> Self {
        self.identifier_system = system.into();
        self
    }

    /// Sets the class code system.
    pub fn with_act_code_system(mut self, system: impl Into<String>) -> Self {
        self.act_code_system = system.into();
        self
    }

    /// Sets the discharge disposition system.
    pub fn with_discharge_disposition_system(mut self, system: impl Into<String>) -> Self {
        self.discharge_disposition_system = system.into();
        self
    }

    /// Sets the encounter type concept.
    pub fn with_encounter_type(mut self, concept: ConceptConfig) -> Self {
        self.encounter_type = concept;
        self
    }
}
