//! Normal/abnormal classification of readings.
//!
//! Classifications are recomputed on demand and never stored on a patient.
//! An unavailable reading is always [`Classification::Normal`].

use vitalwatch_types::{Classification, MeasurementKind, Patient};

use crate::error::InputError;

/// Clinician-set blood-pressure thresholds.
///
/// A reading strictly above its threshold is abnormal. Both thresholds start
/// at infinity, so nothing is flagged until the clinician sets one.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BloodPressureThresholds {
    pub systolic: f64,
    pub diastolic: f64,
}

impl Default for BloodPressureThresholds {
    fn default() -> Self {
        Self {
            systolic: f64::INFINITY,
            diastolic: f64::INFINITY,
        }
    }
}

impl BloodPressureThresholds {
    /// Create thresholds, rejecting non-positive or non-finite values.
    pub fn new(systolic: f64, diastolic: f64) -> Result<Self, InputError> {
        Ok(Self {
            systolic: validate_threshold(systolic)?,
            diastolic: validate_threshold(diastolic)?,
        })
    }

    /// The threshold for a blood-pressure kind. Cholesterol has none.
    pub fn for_kind(&self, kind: MeasurementKind) -> Option<f64> {
        match kind {
            MeasurementKind::Systolic => Some(self.systolic),
            MeasurementKind::Diastolic => Some(self.diastolic),
            MeasurementKind::Cholesterol => None,
        }
    }

    /// Replace a single threshold.
    pub fn set(&mut self, kind: MeasurementKind, value: f64) -> Result<(), InputError> {
        let value = validate_threshold(value)?;
        match kind {
            MeasurementKind::Systolic => self.systolic = value,
            MeasurementKind::Diastolic => self.diastolic = value,
            MeasurementKind::Cholesterol => return Err(InputError::NoFixedThreshold(kind)),
        }
        Ok(())
    }
}

fn validate_threshold(value: f64) -> Result<f64, InputError> {
    if value.is_finite() && value > 0.0 {
        Ok(value)
    } else {
        Err(InputError::Threshold(value.to_string()))
    }
}

/// Parse threshold text entered by the clinician.
pub fn parse_threshold(input: &str) -> Result<f64, InputError> {
    input
        .trim()
        .parse::<f64>()
        .ok()
        .and_then(|value| validate_threshold(value).ok())
        .ok_or_else(|| InputError::Threshold(input.to_string()))
}

/// Cholesterol against the monitored average.
///
/// Abnormal iff the value is known, strictly above the average, and the set
/// has more than one member. A lone member has nothing to compare against.
pub fn classify_cholesterol(value: Option<f64>, average: f64, members: usize) -> Classification {
    match value {
        Some(value) if members > 1 && value > average => Classification::Abnormal,
        _ => Classification::Normal,
    }
}

/// A reading against a fixed threshold.
pub fn classify_above(value: Option<f64>, threshold: f64) -> Classification {
    match value {
        Some(value) if value > threshold => Classification::Abnormal,
        _ => Classification::Normal,
    }
}

/// Classify the latest reading of `kind` for a patient.
pub fn classify_patient(
    patient: &Patient,
    kind: MeasurementKind,
    thresholds: &BloodPressureThresholds,
    average: f64,
    members: usize,
) -> Classification {
    match kind {
        MeasurementKind::Cholesterol => {
            classify_cholesterol(patient.cholesterol_value(), average, members)
        }
        MeasurementKind::Systolic => classify_above(patient.latest_systolic(), thresholds.systolic),
        MeasurementKind::Diastolic => {
            classify_above(patient.latest_diastolic(), thresholds.diastolic)
        }
    }
}

/// Which measurement classes are currently shown.
///
/// Hiding a class only suppresses its classification; data and statistics
/// keep updating underneath.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Visibility {
    pub cholesterol: bool,
    pub blood_pressure: bool,
}

impl Default for Visibility {
    fn default() -> Self {
        Self {
            cholesterol: true,
            blood_pressure: true,
        }
    }
}

impl Visibility {
    /// Flip cholesterol visibility and return the new state.
    pub fn toggle_cholesterol(&mut self) -> bool {
        self.cholesterol = !self.cholesterol;
        self.cholesterol
    }

    /// Flip blood-pressure visibility (both components) and return the new state.
    pub fn toggle_blood_pressure(&mut self) -> bool {
        self.blood_pressure = !self.blood_pressure;
        self.blood_pressure
    }

    pub fn is_visible(&self, kind: MeasurementKind) -> bool {
        if kind.is_blood_pressure() {
            self.blood_pressure
        } else {
            self.cholesterol
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lone_member_never_abnormal() {
        for value in [0.0, 180.0, 10_000.0] {
            assert_eq!(
                classify_cholesterol(Some(value), 0.0, 1),
                Classification::Normal
            );
        }
    }

    #[test]
    fn test_cholesterol_above_average() {
        assert_eq!(classify_cholesterol(Some(220.0), 210.0, 2), Classification::Abnormal);
        assert_eq!(classify_cholesterol(Some(200.0), 210.0, 2), Classification::Normal);
        assert_eq!(classify_cholesterol(Some(210.0), 210.0, 2), Classification::Normal);
        assert_eq!(classify_cholesterol(None, 210.0, 5), Classification::Normal);
    }

    #[test]
    fn test_default_thresholds_flag_nothing() {
        let thresholds = BloodPressureThresholds::default();
        assert_eq!(
            classify_above(Some(400.0), thresholds.systolic),
            Classification::Normal
        );
        assert_eq!(
            classify_above(Some(400.0), thresholds.diastolic),
            Classification::Normal
        );
    }

    #[test]
    fn test_threshold_is_strict() {
        assert_eq!(classify_above(Some(140.0), 140.0), Classification::Normal);
        assert_eq!(classify_above(Some(140.5), 140.0), Classification::Abnormal);
        assert_eq!(classify_above(None, 1.0), Classification::Normal);
    }

    #[test]
    fn test_thresholds_reject_invalid() {
        assert!(BloodPressureThresholds::new(140.0, 90.0).is_ok());
        assert!(matches!(
            BloodPressureThresholds::new(-1.0, 90.0),
            Err(InputError::Threshold(_))
        ));
        assert!(BloodPressureThresholds::new(140.0, f64::NAN).is_err());
        assert!(BloodPressureThresholds::new(0.0, 90.0).is_err());
    }

    #[test]
    fn test_set_single_threshold() {
        let mut thresholds = BloodPressureThresholds::default();
        thresholds.set(MeasurementKind::Diastolic, 85.0).unwrap();
        assert_eq!(thresholds.diastolic, 85.0);
        assert!(thresholds.systolic.is_infinite());

        assert_eq!(
            thresholds.set(MeasurementKind::Cholesterol, 200.0),
            Err(InputError::NoFixedThreshold(MeasurementKind::Cholesterol))
        );
        assert_eq!(thresholds.for_kind(MeasurementKind::Cholesterol), None);
    }

    #[test]
    fn test_parse_threshold() {
        assert_eq!(parse_threshold(" 135.5 "), Ok(135.5));
        assert!(parse_threshold("abc").is_err());
        assert!(parse_threshold("-4").is_err());
        assert!(parse_threshold("inf").is_err());
        assert!(parse_threshold("").is_err());
    }

    #[test]
    fn test_visibility_toggles_independently() {
        let mut visibility = Visibility::default();
        assert!(!visibility.toggle_cholesterol());
        assert!(!visibility.is_visible(MeasurementKind::Cholesterol));
        assert!(visibility.is_visible(MeasurementKind::Systolic));

        assert!(!visibility.toggle_blood_pressure());
        assert!(!visibility.is_visible(MeasurementKind::Diastolic));
        assert!(visibility.toggle_cholesterol());
    }
}
