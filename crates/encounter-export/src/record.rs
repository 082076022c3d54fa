//! Typed encounter records.
//!
//! The record store hands back loosely-typed JSON rows. [`EncounterRecord`]
//! is the validated form the mapper consumes: the id is guaranteed present and
//! every optional field is either `Some` non-empty text or `None`.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::ValidationError;

/// Row field names produced by the record store.
pub mod fields {
    /// Encounter unique id.
    pub const EUUID: &str = "euuid";
    /// Patient unique id.
    pub const PUUID: &str = "puuid";
    /// Performing provider unique id.
    pub const PROVIDER_UUID: &str = "provider_uuid";
    /// Facility unique id.
    pub const FACILITY_UUID: &str = "facility_uuid";
    /// Facility location unique id.
    pub const FACILITY_LOCATION_UUID: &str = "facility_location_uuid";
    /// Encounter class code.
    pub const CLASS_CODE: &str = "class_code";
    /// Encounter class title.
    pub const CLASS_TITLE: &str = "class_title";
    /// Encounter date.
    pub const DATE: &str = "date";
    /// Free-text reason for visit.
    pub const REASON: &str = "reason";
    /// Discharge disposition code.
    pub const DISCHARGE_DISPOSITION: &str = "discharge_disposition";
    /// Discharge disposition display text.
    pub const DISCHARGE_DISPOSITION_TEXT: &str = "discharge_disposition_text";
}

/// A single encounter as stored internally.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EncounterRecord {
    /// Encounter unique id.
    pub euuid: String,
    /// Patient unique id.
    pub puuid: Option<String>,
    /// Performing provider unique id.
    pub provider_uuid: Option<String>,
    /// Facility unique id.
    pub facility_uuid: Option<String>,
    /// Facility location unique id.
    pub facility_location_uuid: Option<String>,
    /// Encounter class code (v3 ActCode).
    pub class_code: Option<String>,
    /// Encounter class title.
    pub class_title: Option<String>,
    /// Encounter date as stored (zone-less).
    pub date: Option<String>,
    /// Free-text reason for visit.
    pub reason: Option<String>,
    /// Discharge disposition code.
    pub discharge_disposition: Option<String>,
    /// Discharge disposition display text.
    pub discharge_disposition_text: Option<String>,
}

impl EncounterRecord {
    /// Creates a record with only an id.
    pub fn new(euuid: impl Into<String>) -> Self {
        Self {
            euuid: euuid.into(),
            ..Default::default()
        }
    }

    /// Validates a raw store row.
    ///
    /// Absent, `null` and empty-string fields all become `None`. Numeric
    /// values are accepted and rendered as text.
    ///
    /// # Errors
    ///
    /// * `ValidationError::NotAnObject` - If the row is not a JSON object
    /// * `ValidationError::MissingRequiredField` - If `euuid` is absent or empty
    /// * `ValidationError::InvalidField` - If a field holds an array, object or boolean
    pub fn from_row(row: &Value) -> Result<Self, ValidationError> {
        let map = row.as_object().ok_or_else(|| ValidationError::NotAnObject {
            found: json_kind(row).to_string(),
        })?;

        let euuid = text_field(map, fields::EUUID)?.ok_or_else(|| {
            ValidationError::MissingRequiredField {
                field: fields::EUUID.to_string(),
            }
        })?;

        Ok(Self {
            euuid,
            puuid: text_field(map, fields::PUUID)?,
            provider_uuid: text_field(map, fields::PROVIDER_UUID)?,
            facility_uuid: text_field(map, fields::FACILITY_UUID)?,
            facility_location_uuid: text_field(map, fields::FACILITY_LOCATION_UUID)?,
            class_code: text_field(map, fields::CLASS_CODE)?,
            class_title: text_field(map, fields::CLASS_TITLE)?,
            date: text_field(map, fields::DATE)?,
            reason: text_field(map, fields::REASON)?,
            discharge_disposition: text_field(map, fields::DISCHARGE_DISPOSITION)?,
            discharge_disposition_text: text_field(map, fields::DISCHARGE_DISPOSITION_TEXT)?,
        })
    }

    /// Sets the patient id.
    pub fn with_patient(mut self, puuid: impl Into<String>) -> Self {
        self.puuid = Some(puuid.into());
        self
    }

    /// Sets the provider id.
    pub fn with_provider(mut self, provider_uuid: impl Into<String>) -> Self {
        self.provider_uuid = Some(provider_uuid.into());
        self
    }

    /// Sets the facility id.
    pub fn with_facility(mut self, facility_uuid: impl Into<String>) -> Self {
        self.facility_uuid = Some(facility_uuid.into());
        self
    }

    /// Sets the facility location id.
    pub fn with_facility_location(mut self, location_uuid: impl Into<String>) -> Self {
        self.facility_location_uuid = Some(location_uuid.into());
        self
    }

    /// Sets the class code and title.
    pub fn with_class(mut self, code: impl Into<String>, title: impl Into<String>) -> Self {
        self.class_code = Some(code.into());
        self.class_title = Some(title.into());
        self
    }

    /// Sets the encounter date.
    pub fn with_date(mut self, date: impl Into<String>) -> Self {
        self.date = Some(date.into());
        self
    }

    /// Sets the reason text.
    pub fn with_reason(mut self, reason: impl Into<String>) -> Self {
        self.reason = Some(reason.into());
        self
    }

    /// Sets the discharge disposition code and text.
    pub fn with_discharge_disposition(
        mut self,
        code: impl Into<String>,
        text: impl Into<String>,
    ) -> Self {
        self.discharge_disposition = Some(code.into());
        self.discharge_disposition_text = Some(text.into());
        self
    }
}

/// Returns the value of a present, non-empty optional field.
///
/// Records built in code may carry `Some("")`; the mapper treats that the
/// same as `None`.
pub(crate) fn present(value: &Option<String>) -> Option<&str> {
    value.as_deref().filter(|v| !v.is_empty())
}

/// Reads a raw row field as text.
///
/// Non-empty strings are returned as-is and numbers are rendered; anything
/// else reads as absent. Every component that compares row values goes
/// through here so `"42"` and `42` are the same id.
pub(crate) fn row_text(row: &Value, field: &str) -> Option<String> {
    row.get(field).and_then(scalar_text)
}

fn scalar_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) if !s.is_empty() => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

fn text_field(map: &Map<String, Value>, name: &str) -> Result<Option<String>, ValidationError> {
    match map.get(name) {
        None | Some(Value::Null) => Ok(None),
        Some(value @ (Value::String(_) | Value::Number(_))) => Ok(scalar_text(value)),
        Some(other) => Err(ValidationError::InvalidField {
            field: name.to_string(),
            message: format!("expected string, found {}", json_kind(other)),
        }),
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
