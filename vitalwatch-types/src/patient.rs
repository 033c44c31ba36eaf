//! Patient identity, demographics and latest readings.

use core::fmt;

use chrono::{DateTime, FixedOffset, NaiveDate};

use crate::{BloodPressureReading, Reading, UNAVAILABLE};

/// Opaque patient identifier assigned by the clinical-record source.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(transparent))]
pub struct PatientId(String);

impl PatientId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PatientId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for PatientId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

impl From<String> for PatientId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

impl AsRef<str> for PatientId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Demographic fields of a patient.
///
/// Every field is optional: a transient source failure degrades the whole
/// record to unavailable rather than dropping the patient.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Demographics {
    pub name: Option<String>,
    pub gender: Option<String>,
    pub birth_date: Option<NaiveDate>,
    pub address: Option<String>,
}

impl Demographics {
    /// Demographics carrying only a display name.
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
            ..Default::default()
        }
    }

    /// Demographics with every field unavailable.
    pub fn unavailable() -> Self {
        Self::default()
    }

    /// Birth date formatted for display, e.g. `Tue Mar 04 1986`.
    pub fn birth_date_display(&self) -> String {
        self.birth_date.map_or_else(
            || UNAVAILABLE.to_string(),
            |d| d.format("%a %b %d %Y").to_string(),
        )
    }
}

/// A patient with their most recent readings.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Patient {
    pub id: PatientId,
    pub demographics: Demographics,
    /// Latest total cholesterol, or `None` when the source had none.
    pub cholesterol: Option<Reading>,
    /// Up to [`crate::HISTORY_LIMIT`] blood-pressure readings, newest first.
    /// May be shorter than the limit, or empty.
    pub blood_pressure: Vec<BloodPressureReading>,
}

impl Patient {
    /// Create a patient with no readings.
    pub fn new(id: PatientId, demographics: Demographics) -> Self {
        Self {
            id,
            demographics,
            cholesterol: None,
            blood_pressure: Vec::new(),
        }
    }

    /// Display name, falling back to [`UNAVAILABLE`].
    pub fn name(&self) -> &str {
        self.demographics.name.as_deref().unwrap_or(UNAVAILABLE)
    }

    pub fn cholesterol_value(&self) -> Option<f64> {
        self.cholesterol.as_ref().map(|r| r.value)
    }

    pub fn cholesterol_effective(&self) -> Option<&DateTime<FixedOffset>> {
        self.cholesterol.as_ref().map(|r| &r.effective)
    }

    /// The newest blood-pressure reading, if any.
    pub fn latest_blood_pressure(&self) -> Option<&BloodPressureReading> {
        self.blood_pressure.first()
    }

    pub fn latest_systolic(&self) -> Option<f64> {
        self.latest_blood_pressure().and_then(|bp| bp.systolic)
    }

    pub fn latest_diastolic(&self) -> Option<f64> {
        self.latest_blood_pressure().and_then(|bp| bp.diastolic)
    }

    pub fn latest_blood_pressure_effective(&self) -> Option<&DateTime<FixedOffset>> {
        self.latest_blood_pressure().and_then(|bp| bp.effective.as_ref())
    }

    /// Systolic readings with their times, newest first, skipping empty slots.
    pub fn systolic_history(&self) -> impl Iterator<Item = (f64, Option<&DateTime<FixedOffset>>)> {
        self.blood_pressure
            .iter()
            .filter_map(|bp| bp.systolic.map(|v| (v, bp.effective.as_ref())))
    }
}
