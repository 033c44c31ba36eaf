//! In-memory gateway with scripted data.
//!
//! Useful for tests, demos and offline runs. Observations can be replaced
//! while the gateway is shared, so a refresh loop sees the source change.
//!
//! ## Example
//!
//! ```rust
//! use vitalwatch_adapters::{Demographics, MemoryGateway, Observation, ObservationKind};
//! use chrono::DateTime;
//!
//! let at = DateTime::parse_from_rfc3339("2021-01-01T00:00:00Z").unwrap();
//! let gateway = MemoryGateway::builder()
//!     .practitioner("500", ["p1", "p2", "p1"])
//!     .patient("p1", Demographics::named("Ana Silva"))
//!     .patient("p2", Demographics::named("Ben Okafor"))
//!     .observations("p1", ObservationKind::Cholesterol, vec![Observation::quantity(200.0, at)])
//!     .build();
//!
//! assert_eq!(gateway.call_count(), 0);
//! ```

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::RwLock;

use crate::{
    dedup_preserving_order, Demographics, Gateway, GatewayError, Observation, ObservationKind,
    PatientId,
};

#[derive(Debug, Default)]
struct MemoryData {
    /// Encounter subjects per practitioner, repeats allowed.
    encounters: HashMap<String, Vec<PatientId>>,
    demographics: HashMap<PatientId, Demographics>,
    observations: HashMap<(PatientId, ObservationKind), Vec<Observation>>,
    failing: HashSet<PatientId>,
    slow: HashMap<PatientId, Duration>,
}

/// A gateway backed by in-memory maps.
#[derive(Debug)]
pub struct MemoryGateway {
    data: RwLock<MemoryData>,
    latency: Option<Duration>,
    calls: AtomicU64,
    description: String,
}

impl MemoryGateway {
    /// Create a new builder for configuring the gateway.
    pub fn builder() -> MemoryGatewayBuilder {
        MemoryGatewayBuilder::default()
    }

    /// Replace the observations of one kind for a patient.
    ///
    /// Observations must be given newest first.
    pub fn set_observations(
        &self,
        patient_id: impl Into<PatientId>,
        kind: ObservationKind,
        observations: Vec<Observation>,
    ) {
        self.data
            .write()
            .observations
            .insert((patient_id.into(), kind), observations);
    }

    /// Remove every observation of one kind for a patient.
    pub fn clear_observations(&self, patient_id: impl Into<PatientId>, kind: ObservationKind) {
        self.data
            .write()
            .observations
            .remove(&(patient_id.into(), kind));
    }

    /// Make every patient-level call for this patient fail (or succeed again).
    pub fn set_failing(&self, patient_id: impl Into<PatientId>, failing: bool) {
        let mut data = self.data.write();
        let id = patient_id.into();
        if failing {
            data.failing.insert(id);
        } else {
            data.failing.remove(&id);
        }
    }

    /// Total number of gateway calls served so far.
    pub fn call_count(&self) -> u64 {
        self.calls.load(Ordering::Relaxed)
    }

    async fn begin_call(&self, patient_id: Option<&PatientId>) {
        self.calls.fetch_add(1, Ordering::Relaxed);
        let extra = patient_id.and_then(|id| self.data.read().slow.get(id).copied());
        let delay = self.latency.unwrap_or_default() + extra.unwrap_or_default();
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }
    }

    fn check_failing(&self, patient_id: &PatientId) -> Result<(), GatewayError> {
        if self.data.read().failing.contains(patient_id) {
            return Err(GatewayError::Connection(format!(
                "source unreachable for patient {}",
                patient_id
            )));
        }
        Ok(())
    }
}

#[async_trait]
impl Gateway for MemoryGateway {
    async fn verify_practitioner(&self, id: &str) -> Result<bool, GatewayError> {
        self.begin_call(None).await;
        Ok(self.data.read().encounters.contains_key(id))
    }

    async fn list_associated_patient_ids(
        &self,
        practitioner_id: &str,
    ) -> Result<Vec<PatientId>, GatewayError> {
        self.begin_call(None).await;
        let data = self.data.read();
        let encounters = data
            .encounters
            .get(practitioner_id)
            .ok_or_else(|| GatewayError::NotFound(format!("Practitioner/{}", practitioner_id)))?;
        Ok(dedup_preserving_order(encounters.iter().cloned()))
    }

    async fn fetch_demographics(
        &self,
        patient_id: &PatientId,
    ) -> Result<Demographics, GatewayError> {
        self.begin_call(Some(patient_id)).await;
        self.check_failing(patient_id)?;
        self.data
            .read()
            .demographics
            .get(patient_id)
            .cloned()
            .ok_or_else(|| GatewayError::NotFound(format!("Patient/{}", patient_id)))
    }

    async fn fetch_latest_observations(
        &self,
        patient_id: &PatientId,
        kind: ObservationKind,
        limit: usize,
    ) -> Result<Vec<Observation>, GatewayError> {
        self.begin_call(Some(patient_id)).await;
        self.check_failing(patient_id)?;
        let data = self.data.read();
        let observations = data
            .observations
            .get(&(patient_id.clone(), kind))
            .map(|obs| obs.iter().take(limit).cloned().collect())
            .unwrap_or_default();
        Ok(observations)
    }

    fn description(&self) -> &str {
        &self.description
    }
}

/// Builder for MemoryGateway.
#[derive(Debug, Default)]
pub struct MemoryGatewayBuilder {
    data: MemoryData,
    latency: Option<Duration>,
}

impl MemoryGatewayBuilder {
    /// Register a practitioner with the subjects of their encounters.
    ///
    /// The same patient may appear in several encounters.
    pub fn practitioner<I, P>(mut self, id: impl Into<String>, encounter_subjects: I) -> Self
    where
        I: IntoIterator<Item = P>,
        P: Into<PatientId>,
    {
        self.data.encounters.insert(
            id.into(),
            encounter_subjects.into_iter().map(Into::into).collect(),
        );
        self
    }

    /// Register a patient's demographics.
    pub fn patient(mut self, id: impl Into<PatientId>, demographics: Demographics) -> Self {
        self.data.demographics.insert(id.into(), demographics);
        self
    }

    /// Set the observations of one kind for a patient, newest first.
    pub fn observations(
        mut self,
        patient_id: impl Into<PatientId>,
        kind: ObservationKind,
        observations: Vec<Observation>,
    ) -> Self {
        self.data
            .observations
            .insert((patient_id.into(), kind), observations);
        self
    }

    /// Make every patient-level call for this patient fail.
    pub fn failing(mut self, patient_id: impl Into<PatientId>) -> Self {
        self.data.failing.insert(patient_id.into());
        self
    }

    /// Delay every call concerning this patient, on top of any global latency.
    pub fn slow(mut self, patient_id: impl Into<PatientId>, latency: Duration) -> Self {
        self.data.slow.insert(patient_id.into(), latency);
        self
    }

    /// Delay every call by this much.
    pub fn latency(mut self, latency: Duration) -> Self {
        self.latency = Some(latency);
        self
    }

    /// Build the gateway.
    pub fn build(self) -> MemoryGateway {
        MemoryGateway {
            data: RwLock::new(self.data),
            latency: self.latency,
            calls: AtomicU64::new(0),
            description: "memory".to_string(),
        }
    }
}
