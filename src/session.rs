//! Practitioner session state.
//!
//! A [`Practitioner`] owns every patient in a single store keyed by id. The
//! [`Directory`] and [`MonitorSet`] hold ids only, so a reading replaced in
//! the store is seen through both. Readings change only through
//! [`Practitioner::replace_readings`], which keeps the monitor statistics in
//! step with the stored values.

use std::collections::HashMap;

use vitalwatch_types::{
    BloodPressureReading, Classification, MeasurementKind, Patient, PatientId, Reading,
};

use crate::data::{
    classify_patient, BloodPressureThresholds, Directory, MonitorSet, PatientFactory, PatientList,
    Visibility,
};
use crate::error::{InputError, SessionError};
use crate::fetch::Fetcher;

/// State for one logged-in practitioner.
#[derive(Debug, Clone)]
pub struct Practitioner {
    id: String,
    patients: HashMap<PatientId, Patient>,
    directory: Directory,
    monitor: MonitorSet,
    thresholds: BloodPressureThresholds,
    visibility: Visibility,
}

impl Practitioner {
    /// Create an empty session.
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            patients: HashMap::new(),
            directory: Directory::new(),
            monitor: MonitorSet::new(),
            thresholds: BloodPressureThresholds::default(),
            visibility: Visibility::default(),
        }
    }

    /// Verify the practitioner and build their directory from the source.
    ///
    /// Patients the source no longer knows are skipped. Any other per-patient
    /// failure degrades that patient's fields to unavailable.
    pub async fn load(
        id: &str,
        fetcher: &Fetcher,
        factory: &PatientFactory,
    ) -> Result<Self, SessionError> {
        if !fetcher.verify(id).await? {
            return Err(SessionError::LoginRejected(id.to_string()));
        }

        let mut practitioner = Self::new(id);
        for patient_id in fetcher.patient_ids(id).await {
            let demographics = match fetcher.demographics(&patient_id).await {
                Ok(demographics) => demographics,
                Err(e) if e.is_not_found() => {
                    tracing::warn!(patient = %patient_id, "Skipping unknown patient");
                    continue;
                }
                Err(e) => {
                    tracing::warn!(patient = %patient_id, error = %e, "Demographics unavailable");
                    vitalwatch_types::Demographics::unavailable()
                }
            };

            let readings = fetcher.readings(&patient_id).await;
            let bp = &readings.blood_pressure;
            let patient = factory.create_patient(
                patient_id,
                demographics,
                readings.cholesterol,
                &bp.diastolic,
                &bp.systolic,
                &bp.effective,
            );
            practitioner.insert_patient(patient);
        }

        tracing::info!(
            practitioner = id,
            patients = practitioner.directory.len(),
            "Directory loaded"
        );
        Ok(practitioner)
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    /// Add a patient to the store and the end of the directory.
    ///
    /// Returns `false`, leaving everything untouched, if the id is known.
    pub fn insert_patient(&mut self, patient: Patient) -> bool {
        if !self.directory.append(&patient) {
            return false;
        }
        self.patients.insert(patient.id.clone(), patient);
        true
    }

    pub fn patient(&self, id: &PatientId) -> Option<&Patient> {
        self.patients.get(id)
    }

    pub fn directory(&self) -> &Directory {
        &self.directory
    }

    pub fn monitor(&self) -> &MonitorSet {
        &self.monitor
    }

    /// Directory patients in order.
    pub fn all_patients(&self) -> impl Iterator<Item = &Patient> {
        self.directory.iter().filter_map(|id| self.patients.get(id))
    }

    /// Monitored patients in order.
    pub fn monitored_patients(&self) -> impl Iterator<Item = &Patient> {
        self.monitor.iter().filter_map(|id| self.patients.get(id))
    }

    pub fn average_cholesterol(&self) -> f64 {
        self.monitor.average_cholesterol()
    }

    /// Start monitoring a directory patient.
    ///
    /// `Ok(false)` if they are already monitored.
    pub fn add_to_monitor(&mut self, id: &PatientId) -> Result<bool, SessionError> {
        let patient = self
            .patients
            .get(id)
            .ok_or_else(|| SessionError::UnknownPatient(id.clone()))?;
        Ok(self.monitor.append(patient))
    }

    /// Stop monitoring a patient. `Ok(false)` if they were not monitored.
    pub fn remove_from_monitor(&mut self, id: &PatientId) -> Result<bool, SessionError> {
        let patient = self
            .patients
            .get(id)
            .ok_or_else(|| SessionError::UnknownPatient(id.clone()))?;
        Ok(self.monitor.remove(patient))
    }

    /// Replace a patient's readings.
    ///
    /// If the patient is monitored, their old cholesterol contribution is
    /// swapped for the new one.
    pub fn replace_readings(
        &mut self,
        id: &PatientId,
        cholesterol: Option<Reading>,
        blood_pressure: Vec<BloodPressureReading>,
    ) -> Result<(), SessionError> {
        let patient = self
            .patients
            .get_mut(id)
            .ok_or_else(|| SessionError::UnknownPatient(id.clone()))?;

        let old = patient.cholesterol_value();
        let new = cholesterol.as_ref().map(|r| r.value);
        patient.cholesterol = cholesterol;
        patient.blood_pressure = blood_pressure;

        self.monitor.resync(id, old, new);
        Ok(())
    }

    /// Re-fetch readings for every monitored patient, in monitor order.
    ///
    /// Each patient is handled independently; a failed fetch leaves that
    /// patient with unavailable readings and the loop carries on.
    pub async fn refresh(&mut self, fetcher: &Fetcher, factory: &PatientFactory) -> usize {
        let members: Vec<PatientId> = self.monitor.ids().to_vec();
        let mut refreshed = 0;

        for id in &members {
            let readings = fetcher.readings(id).await;
            let bp = &readings.blood_pressure;
            let history = factory.blood_pressure_history(&bp.diastolic, &bp.systolic, &bp.effective);
            match self.replace_readings(id, readings.cholesterol, history) {
                Ok(()) => refreshed += 1,
                Err(e) => tracing::warn!(patient = %id, error = %e, "Refresh skipped"),
            }
        }

        tracing::debug!(
            refreshed,
            average = self.monitor.average_cholesterol(),
            "Refresh complete"
        );
        refreshed
    }

    pub fn thresholds(&self) -> BloodPressureThresholds {
        self.thresholds
    }

    /// Set both blood-pressure thresholds at once.
    pub fn set_blood_pressure_thresholds(
        &mut self,
        systolic: f64,
        diastolic: f64,
    ) -> Result<(), InputError> {
        self.thresholds = BloodPressureThresholds::new(systolic, diastolic)?;
        Ok(())
    }

    pub fn set_threshold(&mut self, kind: MeasurementKind, value: f64) -> Result<(), InputError> {
        self.thresholds.set(kind, value)
    }

    pub fn visibility(&self) -> Visibility {
        self.visibility
    }

    pub fn toggle_cholesterol_visibility(&mut self) -> bool {
        self.visibility.toggle_cholesterol()
    }

    pub fn toggle_blood_pressure_visibility(&mut self) -> bool {
        self.visibility.toggle_blood_pressure()
    }

    /// Classify a patient's latest reading of `kind`.
    pub fn classify(&self, patient: &Patient, kind: MeasurementKind) -> Classification {
        classify_patient(
            patient,
            kind,
            &self.thresholds,
            self.monitor.average_cholesterol(),
            self.monitor.len(),
        )
    }

    /// Classification as shown to the clinician: `None` while `kind` is hidden.
    pub fn display_status(
        &self,
        id: &PatientId,
        kind: MeasurementKind,
    ) -> Result<Option<Classification>, SessionError> {
        let patient = self
            .patients
            .get(id)
            .ok_or_else(|| SessionError::UnknownPatient(id.clone()))?;
        if !self.visibility.is_visible(kind) {
            return Ok(None);
        }
        Ok(Some(self.classify(patient, kind)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{DateTime, FixedOffset};
    use vitalwatch_types::Demographics;

    fn at(s: &str) -> DateTime<FixedOffset> {
        DateTime::parse_from_rfc3339(s).unwrap()
    }

    fn patient(id: &str, cholesterol: Option<f64>) -> Patient {
        let mut patient = Patient::new(PatientId::from(id), Demographics::named(id));
        patient.cholesterol = cholesterol.map(|v| Reading::new(v, at("2021-01-01T00:00:00Z")));
        patient
    }

    fn practitioner(patients: &[(&str, Option<f64>)]) -> Practitioner {
        let mut practitioner = Practitioner::new("dr");
        for (id, cholesterol) in patients {
            practitioner.insert_patient(patient(id, *cholesterol));
        }
        practitioner
    }

    #[test]
    fn test_insert_deduplicates() {
        let mut practitioner = practitioner(&[("a", Some(1.0))]);
        assert!(!practitioner.insert_patient(patient("a", Some(99.0))));
        assert_eq!(practitioner.directory().len(), 1);
        assert_eq!(
            practitioner.patient(&PatientId::from("a")).unwrap().cholesterol_value(),
            Some(1.0)
        );
    }

    #[test]
    fn test_monitor_shares_patient_with_directory() {
        let mut practitioner = practitioner(&[("a", Some(200.0)), ("b", Some(220.0))]);
        let a = PatientId::from("a");
        practitioner.add_to_monitor(&a).unwrap();

        practitioner
            .replace_readings(&a, Some(Reading::new(250.0, at("2021-02-01T00:00:00Z"))), Vec::new())
            .unwrap();

        let from_directory = practitioner.all_patients().next().unwrap();
        let from_monitor = practitioner.monitored_patients().next().unwrap();
        assert_eq!(from_directory.cholesterol_value(), Some(250.0));
        assert_eq!(from_monitor.cholesterol_value(), Some(250.0));
        assert_eq!(practitioner.average_cholesterol(), 250.0);
    }

    #[test]
    fn test_replace_readings_resyncs_average() {
        let mut practitioner = practitioner(&[("a", Some(200.0)), ("b", Some(220.0))]);
        let (a, b) = (PatientId::from("a"), PatientId::from("b"));
        practitioner.add_to_monitor(&a).unwrap();
        practitioner.add_to_monitor(&b).unwrap();

        practitioner.replace_readings(&b, None, Vec::new()).unwrap();
        assert_eq!(practitioner.average_cholesterol(), 200.0);
        assert_eq!(practitioner.monitor().stats().unmeasured, 1);

        // Removing b now must not subtract its old value.
        practitioner.remove_from_monitor(&b).unwrap();
        assert_eq!(practitioner.average_cholesterol(), 200.0);
        assert_eq!(practitioner.monitor().stats().unmeasured, 0);
    }

    #[test]
    fn test_replace_unmonitored_leaves_stats() {
        let mut practitioner = practitioner(&[("a", Some(200.0)), ("b", Some(220.0))]);
        practitioner.add_to_monitor(&PatientId::from("a")).unwrap();
        let before = practitioner.monitor().stats();

        practitioner
            .replace_readings(
                &PatientId::from("b"),
                Some(Reading::new(999.0, at("2021-02-01T00:00:00Z"))),
                Vec::new(),
            )
            .unwrap();
        assert_eq!(practitioner.monitor().stats(), before);
    }

    #[test]
    fn test_unknown_patient_rejected() {
        let mut practitioner = practitioner(&[]);
        let ghost = PatientId::from("ghost");
        assert!(matches!(
            practitioner.add_to_monitor(&ghost),
            Err(SessionError::UnknownPatient(_))
        ));
        assert!(practitioner.replace_readings(&ghost, None, Vec::new()).is_err());
    }

    #[test]
    fn test_classify_against_average() {
        let mut practitioner = practitioner(&[("a", Some(200.0)), ("b", Some(220.0))]);
        let (a, b) = (PatientId::from("a"), PatientId::from("b"));
        practitioner.add_to_monitor(&a).unwrap();

        let pa = practitioner.patient(&a).unwrap().clone();
        assert_eq!(
            practitioner.classify(&pa, MeasurementKind::Cholesterol),
            Classification::Normal
        );

        practitioner.add_to_monitor(&b).unwrap();
        let pb = practitioner.patient(&b).unwrap().clone();
        assert_eq!(
            practitioner.classify(&pb, MeasurementKind::Cholesterol),
            Classification::Abnormal
        );
    }

    #[test]
    fn test_display_status_hidden() {
        let mut practitioner = practitioner(&[("a", Some(200.0))]);
        let a = PatientId::from("a");
        practitioner
            .replace_readings(
                &a,
                None,
                vec![BloodPressureReading::new(150.0, 95.0, at("2021-02-01T00:00:00Z"))],
            )
            .unwrap();
        practitioner.set_blood_pressure_thresholds(140.0, 90.0).unwrap();

        assert_eq!(
            practitioner.display_status(&a, MeasurementKind::Systolic).unwrap(),
            Some(Classification::Abnormal)
        );

        practitioner.toggle_blood_pressure_visibility();
        assert_eq!(
            practitioner.display_status(&a, MeasurementKind::Systolic).unwrap(),
            None
        );
        assert_eq!(
            practitioner.display_status(&a, MeasurementKind::Cholesterol).unwrap(),
            Some(Classification::Normal)
        );

        practitioner.toggle_blood_pressure_visibility();
        assert_eq!(
            practitioner.display_status(&a, MeasurementKind::Diastolic).unwrap(),
            Some(Classification::Abnormal)
        );
    }

    #[test]
    fn test_invalid_thresholds_keep_previous() {
        let mut practitioner = practitioner(&[]);
        practitioner.set_blood_pressure_thresholds(140.0, 90.0).unwrap();
        assert!(practitioner.set_blood_pressure_thresholds(-1.0, 90.0).is_err());
        assert_eq!(practitioner.thresholds().systolic, 140.0);

        practitioner.set_threshold(MeasurementKind::Systolic, 150.0).unwrap();
        assert_eq!(practitioner.thresholds().systolic, 150.0);
        assert_eq!(practitioner.thresholds().diastolic, 90.0);
    }
}
