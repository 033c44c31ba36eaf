//! Timestamped numeric observations.

use core::fmt;

use chrono::{DateTime, FixedOffset};

use crate::UNAVAILABLE;

/// A single timestamped numeric observation.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Reading {
    /// Measured value in the unit of its kind (mg/dL or mmHg).
    pub value: f64,
    /// When the observation was taken, as reported by the source.
    pub effective: DateTime<FixedOffset>,
}

impl Reading {
    /// Create a reading.
    pub fn new(value: f64, effective: DateTime<FixedOffset>) -> Self {
        Self { value, effective }
    }
}

impl fmt::Display for Reading {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.value, self.effective.to_rfc3339())
    }
}

/// One blood-pressure observation.
///
/// Each slot may be missing independently: a source can return a panel with
/// only one component, or a panel with no effective time.
#[derive(Debug, Clone, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct BloodPressureReading {
    pub systolic: Option<f64>,
    pub diastolic: Option<f64>,
    pub effective: Option<DateTime<FixedOffset>>,
}

impl BloodPressureReading {
    /// Create a fully populated blood-pressure reading.
    pub fn new(systolic: f64, diastolic: f64, effective: DateTime<FixedOffset>) -> Self {
        Self {
            systolic: Some(systolic),
            diastolic: Some(diastolic),
            effective: Some(effective),
        }
    }

    /// True when neither component carries a value.
    pub fn is_empty(&self) -> bool {
        self.systolic.is_none() && self.diastolic.is_none()
    }
}

/// Format an optional value, rendering a missing one as [`UNAVAILABLE`].
pub fn display_value(value: Option<f64>) -> String {
    value.map_or_else(|| UNAVAILABLE.to_string(), |v| v.to_string())
}

/// Format an optional timestamp, rendering a missing one as [`UNAVAILABLE`].
pub fn display_timestamp(effective: Option<&DateTime<FixedOffset>>) -> String {
    effective.map_or_else(|| UNAVAILABLE.to_string(), |t| t.to_rfc3339())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn at(s: &str) -> DateTime<FixedOffset> {
        DateTime::parse_from_rfc3339(s).unwrap()
    }

    #[test]
    fn display_missing_values_as_unavailable() {
        assert_eq!(display_value(None), "N/A");
        assert_eq!(display_value(Some(120.0)), "120");
        assert_eq!(display_timestamp(None), "N/A");
    }

    #[test]
    fn reading_display_includes_timestamp() {
        let reading = Reading::new(198.4, at("2021-03-04T10:00:00+10:00"));
        assert_eq!(reading.to_string(), "198.4 (2021-03-04T10:00:00+10:00)");
    }

    #[test]
    fn blood_pressure_reading_emptiness() {
        assert!(BloodPressureReading::default().is_empty());

        let partial = BloodPressureReading {
            systolic: Some(130.0),
            ..Default::default()
        };
        assert!(!partial.is_empty());
    }
}
