//! Patient construction.
//!
//! Both the directory build and the refresh tick go through this module, so
//! every patient has the same shape: blood-pressure history newest first,
//! capped at the history limit, with unavailable slots kept rather than
//! dropped.

use chrono::{DateTime, FixedOffset};
use vitalwatch_types::{BloodPressureReading, Demographics, Patient, PatientId, Reading, HISTORY_LIMIT};

/// Builds fully populated [`Patient`]s from fetched fields. No I/O.
#[derive(Debug, Clone, Copy)]
pub struct PatientFactory {
    history_limit: usize,
}

impl Default for PatientFactory {
    fn default() -> Self {
        Self::new(HISTORY_LIMIT)
    }
}

impl PatientFactory {
    pub fn new(history_limit: usize) -> Self {
        Self { history_limit }
    }

    pub fn history_limit(&self) -> usize {
        self.history_limit
    }

    /// Create a patient from demographics, a cholesterol reading and three
    /// parallel blood-pressure arrays.
    ///
    /// The arrays are taken in the order given (callers pass newest first).
    /// They may differ in length; missing slots become unavailable.
    pub fn create_patient(
        &self,
        id: PatientId,
        demographics: Demographics,
        cholesterol: Option<Reading>,
        diastolic: &[Option<f64>],
        systolic: &[Option<f64>],
        effective: &[Option<DateTime<FixedOffset>>],
    ) -> Patient {
        Patient {
            id,
            demographics,
            cholesterol,
            blood_pressure: self.blood_pressure_history(diastolic, systolic, effective),
        }
    }

    /// Zip the parallel arrays into readings, truncated to the history limit.
    pub fn blood_pressure_history(
        &self,
        diastolic: &[Option<f64>],
        systolic: &[Option<f64>],
        effective: &[Option<DateTime<FixedOffset>>],
    ) -> Vec<BloodPressureReading> {
        let len = diastolic
            .len()
            .max(systolic.len())
            .max(effective.len())
            .min(self.history_limit);

        (0..len)
            .map(|i| BloodPressureReading {
                systolic: systolic.get(i).copied().flatten(),
                diastolic: diastolic.get(i).copied().flatten(),
                effective: effective.get(i).copied().flatten(),
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn at(s: &str) -> DateTime<FixedOffset> {
        DateTime::parse_from_rfc3339(s).unwrap()
    }

    #[test]
    fn test_arrays_passed_through_in_order() {
        let factory = PatientFactory::default();
        let t1 = at("2021-03-02T10:00:00Z");
        let t2 = at("2021-03-01T10:00:00Z");

        let patient = factory.create_patient(
            PatientId::from("p1"),
            Demographics::named("Ana Diaz"),
            Some(Reading::new(190.0, t1)),
            &[Some(80.0), Some(85.0)],
            &[Some(120.0), Some(130.0)],
            &[Some(t1), Some(t2)],
        );

        assert_eq!(patient.blood_pressure.len(), 2);
        assert_eq!(patient.latest_systolic(), Some(120.0));
        assert_eq!(patient.blood_pressure[1].diastolic, Some(85.0));
        assert_eq!(patient.blood_pressure[1].effective, Some(t2));
        assert_eq!(patient.cholesterol_value(), Some(190.0));
    }

    #[test]
    fn test_unequal_arrays_zip_defensively() {
        let factory = PatientFactory::default();
        let history = factory.blood_pressure_history(&[Some(80.0)], &[Some(120.0), Some(125.0)], &[]);

        assert_eq!(history.len(), 2);
        assert_eq!(history[0].effective, None);
        assert_eq!(history[1].systolic, Some(125.0));
        assert_eq!(history[1].diastolic, None);
    }

    #[test]
    fn test_history_truncated_to_limit() {
        let factory = PatientFactory::new(3);
        let systolic: Vec<Option<f64>> = (0..8).map(|i| Some(100.0 + i as f64)).collect();
        let history = factory.blood_pressure_history(&[], &systolic, &[]);

        assert_eq!(history.len(), 3);
        assert_eq!(history[2].systolic, Some(102.0));
    }

    #[test]
    fn test_empty_arrays_give_empty_history() {
        let patient = PatientFactory::default().create_patient(
            PatientId::from("p"),
            Demographics::unavailable(),
            None,
            &[],
            &[],
            &[],
        );
        assert!(patient.blood_pressure.is_empty());
        assert!(patient.cholesterol.is_none());
    }
}
