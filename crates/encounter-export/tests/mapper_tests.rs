//! Mapping property tests.
//!
//! Every record, from fully populated to id-only, must map to a resource
//! that satisfies the invariants below.

mod common;

use chrono::{TimeZone, Utc};
use serde_json::json;

use helios_encounter_export::config::{
    CodeSystemConfig, ConceptConfig, DATA_ABSENT_REASON_EXTENSION, HL7_DATA_ABSENT_REASON,
    HL7_V3_ACT_CODE,
};
use helios_encounter_export::mapper::EncounterMapper;
use helios_encounter_export::record::EncounterRecord;

use common::{full_record, minimal_record};

fn sample_records() -> Vec<EncounterRecord> {
    vec![
        full_record(),
        minimal_record(),
        EncounterRecord::new("enc-a").with_patient("pat-2").with_class("IMP", ""),
        EncounterRecord::new("enc-b").with_provider("prac-9"),
        EncounterRecord::new("enc-c").with_facility_location("loc-only"),
        EncounterRecord::new("enc-d")
            .with_facility("org-2")
            .with_date("not a date"),
        EncounterRecord::new("enc-e").with_discharge_disposition("snf", ""),
    ]
}

// ============================================================================
// Fixed elements
// ============================================================================

#[test]
fn test_fixed_elements() {
    let mapper = EncounterMapper::default();
    for record in sample_records() {
        let encounter = mapper.map(&record);
        assert_eq!(encounter.resource_type, "Encounter");
        assert_eq!(encounter.id, record.euuid);
        assert_eq!(encounter.status, "finished");
        assert_eq!(encounter.meta.version_id, "1");

        assert_eq!(encounter.identifier.len(), 1);
        assert_eq!(encounter.identifier[0].system, "urn:ietf:rfc:3986");
        assert_eq!(encounter.identifier[0].value, record.euuid);

        assert_eq!(encounter.encounter_type.len(), 1);
        assert_eq!(encounter.encounter_type[0].coding[0].code, "185349003");
    }
}

#[test]
fn test_class_is_always_coded() {
    let mapper = EncounterMapper::default();
    for record in sample_records() {
        let class = mapper.map(&record).class;
        match record.class_code.as_deref() {
            Some(code) => {
                assert_eq!(class.system, HL7_V3_ACT_CODE);
                assert_eq!(class.code, code);
            }
            None => {
                assert_eq!(class.system, HL7_DATA_ABSENT_REASON);
                assert_eq!(class.code, "unknown");
                assert_eq!(class.display.as_deref(), Some("Unknown"));
            }
        }
    }
}

#[test]
fn test_empty_class_title_has_no_display() {
    let encounter = EncounterMapper::default()
        .map(&EncounterRecord::new("enc-a").with_class("IMP", ""));
    assert_eq!(encounter.class.code, "IMP");
    assert!(encounter.class.display.is_none());
}

// ============================================================================
// References
// ============================================================================

#[test]
fn test_subject_is_reference_or_data_absent() {
    let mapper = EncounterMapper::default();
    for record in sample_records() {
        let subject = mapper.map(&record).subject;
        match record.puuid.as_deref() {
            Some(puuid) => {
                assert_eq!(subject.target_id(), Some(puuid));
                assert_eq!(subject.target_type.as_deref(), Some("Patient"));
            }
            None => {
                assert!(subject.is_data_absent());
                assert_eq!(subject.extension[0].url, DATA_ABSENT_REASON_EXTENSION);
                assert_eq!(subject.extension[0].value_code, "unknown");
            }
        }
    }
}

#[test]
fn test_optional_elements_follow_their_sources() {
    let mapper = EncounterMapper::default();
    for record in sample_records() {
        let encounter = mapper.map(&record);

        assert_eq!(
            !encounter.participant.is_empty(),
            record.provider_uuid.is_some(),
            "participant for {}",
            record.euuid
        );
        assert_eq!(
            encounter.service_provider.is_some(),
            record.facility_uuid.is_some(),
            "serviceProvider for {}",
            record.euuid
        );
        assert_eq!(
            !encounter.location.is_empty(),
            record.facility_uuid.is_some() && record.facility_location_uuid.is_some(),
            "location for {}",
            record.euuid
        );
        assert_eq!(encounter.reason_code.is_empty(), record.reason.is_none());
        assert_eq!(
            encounter.hospitalization.is_some(),
            record.discharge_disposition.is_some()
        );
    }
}

#[test]
fn test_participant_is_primary_performer() {
    let encounter = EncounterMapper::default().map(&full_record());
    let participant = &encounter.participant[0];
    assert_eq!(participant.individual.reference.as_deref(), Some("Practitioner/prac-1"));
    assert_eq!(participant.participant_type[0].coding[0].code, "PPRF");
    assert_eq!(participant.participant_type[0].text.as_deref(), Some("Primary Performer"));
    assert_eq!(
        participant.period.as_ref().and_then(|p| p.start.as_deref()),
        Some("2023-06-01T09:30:00+00:00")
    );
}

// ============================================================================
// Dates
// ============================================================================

#[test]
fn test_unparseable_date_omits_periods() {
    let record = EncounterRecord::new("enc-x")
        .with_provider("prac-1")
        .with_date("31/12/2023");
    let encounter = EncounterMapper::default().map(&record);
    assert!(encounter.period.is_none());
    assert!(encounter.participant[0].period.is_none());
}

#[test]
fn test_bare_date_starts_at_midnight_utc() {
    let encounter =
        EncounterMapper::default().map(&EncounterRecord::new("enc-y").with_date("2023-01-01"));
    assert_eq!(
        encounter.period.and_then(|p| p.start).as_deref(),
        Some("2023-01-01T00:00:00+00:00")
    );
}

#[test]
fn test_mapping_is_deterministic_apart_from_last_updated() {
    let mapper = EncounterMapper::default();
    let first = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
    let later = Utc.with_ymd_and_hms(2024, 6, 1, 12, 0, 0).unwrap();

    for record in sample_records() {
        let mut a = mapper.map_at(&record, first);
        let b = mapper.map_at(&record, later);
        assert_ne!(a.meta.last_updated, b.meta.last_updated);
        a.meta.last_updated = b.meta.last_updated.clone();
        assert_eq!(a, b);
    }
}

// ============================================================================
// Wire format and configuration
// ============================================================================

#[test]
fn test_minimal_record_wire_format() {
    let now = Utc.with_ymd_and_hms(2024, 2, 3, 4, 5, 6).unwrap();
    let encounter = EncounterMapper::default().map_at(&minimal_record(), now);
    let value = serde_json::to_value(&encounter).unwrap();

    assert_eq!(value["meta"]["lastUpdated"], "2024-02-03T04:05:06+00:00");
    assert_eq!(
        value["subject"],
        json!({"extension": [{
            "url": "http://hl7.org/fhir/StructureDefinition/data-absent-reason",
            "valueCode": "unknown"
        }]})
    );
    for absent in [
        "participant",
        "period",
        "reasonCode",
        "hospitalization",
        "serviceProvider",
        "location",
    ] {
        assert!(value.get(absent).is_none(), "{} should be omitted", absent);
    }
}

#[test]
fn test_code_systems_from_json() {
    let codes = CodeSystemConfig::from_json_str(
        r#"{"identifier_system": "https://example.org/encounters"}"#,
    )
    .unwrap()
    .with_encounter_type(ConceptConfig::new(
        "http://snomed.info/sct",
        "270427003",
        "Patient-initiated encounter",
    ));

    let encounter = EncounterMapper::new(codes).map(&full_record());
    assert_eq!(encounter.identifier[0].system, "https://example.org/encounters");
    assert_eq!(encounter.encounter_type[0].coding[0].code, "270427003");
    // Untouched keys keep their defaults.
    assert_eq!(encounter.class.system, HL7_V3_ACT_CODE);
}
