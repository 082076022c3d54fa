//! Encounter record to FHIR Encounter mapping.
//!
//! [`EncounterMapper::map`] is total: every record with an id yields a
//! resource. Required elements whose source value is missing are filled with
//! data-absent markers instead of being omitted. Optional elements are
//! emitted only when their source fields are present.
//!
//! # Known limitation
//!
//! `Encounter.type` is always the single configured concept (SNOMED CT
//! `185349003`, encounter for check up). Records are not classified further.
//!
//! # Example
//!
//! ```
//! use helios_encounter_export::mapper::EncounterMapper;
//! use helios_encounter_export::record::EncounterRecord;
//!
//! let mapper = EncounterMapper::default();
//! let record = EncounterRecord::new("enc-1")
//!     .with_patient("pat-1")
//!     .with_class("AMB", "ambulatory");
//!
//! let encounter = mapper.map(&record);
//! assert_eq!(encounter.status, "finished");
//! assert_eq!(encounter.subject.reference.as_deref(), Some("Patient/pat-1"));
//! assert_eq!(encounter.class.code, "AMB");
//! ```

use chrono::{DateTime, Utc};

use crate::config::{CodeSystemConfig, ConceptConfig};
use crate::datetime::{format_extended, stored_to_extended};
use crate::record::{EncounterRecord, present};
use crate::resource::{
    CodeableConcept, Coding, ENCOUNTER, Encounter, EncounterLocation, EncounterParticipant,
    Extension, Hospitalization, Identifier, Meta, Period, Reference,
};

/// Version id stamped on every mapped resource.
pub const VERSION_ID: &str = "1";

/// Status of every mapped encounter; only completed encounters are exported.
pub const STATUS_FINISHED: &str = "finished";

/// Maps [`EncounterRecord`]s to FHIR R4 [`Encounter`] resources.
#[derive(Debug, Clone, Default)]
pub struct EncounterMapper {
    codes: CodeSystemConfig,
}

impl EncounterMapper {
    /// Creates a mapper with the given code systems.
    pub fn new(codes: CodeSystemConfig) -> Self {
        Self { codes }
    }

    /// Returns the code systems used by this mapper.
    pub fn codes(&self) -> &CodeSystemConfig {
        &self.codes
    }

    /// Maps a record, stamping `meta.lastUpdated` with the current time.
    pub fn map(&self, record: &EncounterRecord) -> Encounter {
        self.map_at(record, Utc::now())
    }

    /// Maps a record, stamping `meta.lastUpdated` with `now`.
    pub fn map_at(&self, record: &EncounterRecord, now: DateTime<Utc>) -> Encounter {
        let started = present(&record.date).and_then(|date| {
            let converted = stored_to_extended(date);
            if converted.is_none() {
                tracing::warn!(
                    encounter = %record.euuid,
                    date = %date,
                    "Encounter date is not a recognised timestamp; period omitted"
                );
            }
            converted
        });

        let (service_provider, location) = self.facility(record);

        Encounter {
            resource_type: ENCOUNTER.to_string(),
            meta: Meta {
                version_id: VERSION_ID.to_string(),
                last_updated: format_extended(now),
            },
            id: record.euuid.clone(),
            identifier: vec![Identifier {
                system: self.codes.identifier_system.clone(),
                value: record.euuid.clone(),
            }],
            status: STATUS_FINISHED.to_string(),
            class: self.class(record),
            encounter_type: vec![concept(&self.codes.encounter_type)],
            subject: self.subject(record),
            participant: self.participant(record, started.as_deref()),
            period: started.map(|start| Period {
                start: Some(start),
                end: None,
            }),
            reason_code: present(&record.reason)
                .map(|reason| vec![CodeableConcept::from_text(reason)])
                .unwrap_or_default(),
            hospitalization: self.hospitalization(record),
            service_provider,
            location,
        }
    }

    fn class(&self, record: &EncounterRecord) -> Coding {
        match present(&record.class_code) {
            Some(code) => Coding::new(
                self.codes.act_code_system.as_str(),
                code,
                present(&record.class_title).map(String::from),
            ),
            None => {
                let unknown = &self.codes.unknown_class;
                Coding::new(
                    unknown.system.as_str(),
                    unknown.code.as_str(),
                    Some(unknown.display.clone()),
                )
            }
        }
    }

    fn subject(&self, record: &EncounterRecord) -> Reference {
        match present(&record.puuid) {
            Some(puuid) => Reference::to("Patient", puuid),
            None => Reference::data_absent(Extension {
                url: self.codes.data_absent_extension_url.clone(),
                value_code: "unknown".to_string(),
            }),
        }
    }

    fn participant(
        &self,
        record: &EncounterRecord,
        started: Option<&str>,
    ) -> Vec<EncounterParticipant> {
        let Some(provider) = present(&record.provider_uuid) else {
            return Vec::new();
        };

        vec![EncounterParticipant {
            participant_type: vec![concept(&self.codes.primary_performer)],
            period: started.map(|start| Period {
                start: Some(start.to_string()),
                end: None,
            }),
            individual: Reference::to("Practitioner", provider),
        }]
    }

    fn hospitalization(&self, record: &EncounterRecord) -> Option<Hospitalization> {
        let code = present(&record.discharge_disposition)?;
        Some(Hospitalization {
            discharge_disposition: CodeableConcept::from_coding(Coding::new(
                self.codes.discharge_disposition_system.as_str(),
                code,
                present(&record.discharge_disposition_text).map(String::from),
            )),
        })
    }

    // Location hangs off the facility: a location id without a facility id
    // produces neither element.
    fn facility(&self, record: &EncounterRecord) -> (Option<Reference>, Vec<EncounterLocation>) {
        let Some(facility) = present(&record.facility_uuid) else {
            return (None, Vec::new());
        };

        let location = present(&record.facility_location_uuid)
            .map(|loc| {
                vec![EncounterLocation {
                    location: Reference::to("Location", loc),
                }]
            })
            .unwrap_or_default();

        (Some(Reference::to("Organization", facility)), location)
    }
}

fn concept(config: &ConceptConfig) -> CodeableConcept {
    CodeableConcept {
        coding: vec![Coding::new(
            config.system.as_str(),
            config.code.as_str(),
            Some(config.display.clone()),
        )],
        text: config.text.clone(),
    }
}
