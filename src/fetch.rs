//! Bounded, failure-tolerant queries against a [`Gateway`].
//!
//! Every call except the paged patient listing is wrapped in a per-call
//! timeout. Reading fetches never fail:
//! a transport error, a timeout or an empty result all degrade the field to
//! unavailable, with a warning logged.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, FixedOffset};
use vitalwatch_adapters::{Gateway, GatewayError, ObservationKind, ObservationValue};
use vitalwatch_types::{Demographics, PatientId, Reading, HISTORY_LIMIT};

/// Default per-call timeout.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

/// Blood-pressure history as three parallel arrays, newest first.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BloodPressureSeries {
    pub diastolic: Vec<Option<f64>>,
    pub systolic: Vec<Option<f64>>,
    pub effective: Vec<Option<DateTime<FixedOffset>>>,
}

/// The readings fetched for one patient.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FetchedReadings {
    pub cholesterol: Option<Reading>,
    pub blood_pressure: BloodPressureSeries,
}

/// Issues gateway calls on behalf of the session.
#[derive(Debug, Clone)]
pub struct Fetcher {
    gateway: Arc<dyn Gateway>,
    timeout: Duration,
    history_limit: usize,
}

impl Fetcher {
    pub fn new(gateway: Arc<dyn Gateway>) -> Self {
        Self {
            gateway,
            timeout: DEFAULT_TIMEOUT,
            history_limit: HISTORY_LIMIT,
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_history_limit(mut self, limit: usize) -> Self {
        self.history_limit = limit;
        self
    }

    pub fn gateway(&self) -> &Arc<dyn Gateway> {
        &self.gateway
    }

    async fn bounded<T, F>(&self, call: F) -> Result<T, GatewayError>
    where
        F: Future<Output = Result<T, GatewayError>>,
    {
        tokio::time::timeout(self.timeout, call).await?
    }

    /// Whether the practitioner exists.
    pub async fn verify(&self, practitioner_id: &str) -> Result<bool, GatewayError> {
        self.bounded(self.gateway.verify_practitioner(practitioner_id))
            .await
    }

    /// The practitioner's patients, de-duplicated in first-seen order.
    ///
    /// A failed listing is logged and yields no patients. The listing as a
    /// whole is not timed out: it may span many pages, and the gateway bounds
    /// each page and returns what it gathered.
    pub async fn patient_ids(&self, practitioner_id: &str) -> Vec<PatientId> {
        match self
            .gateway
            .list_associated_patient_ids(practitioner_id)
            .await
        {
            Ok(ids) => vitalwatch_adapters::dedup_preserving_order(ids),
            Err(e) => {
                tracing::warn!(practitioner = practitioner_id, error = %e, "Failed to list patients");
                Vec::new()
            }
        }
    }

    pub async fn demographics(&self, id: &PatientId) -> Result<Demographics, GatewayError> {
        self.bounded(self.gateway.fetch_demographics(id)).await
    }

    /// Latest cholesterol reading, or `None` if unavailable.
    pub async fn cholesterol(&self, id: &PatientId) -> Option<Reading> {
        let observations = match self
            .bounded(
                self.gateway
                    .fetch_latest_observations(id, ObservationKind::Cholesterol, 1),
            )
            .await
        {
            Ok(observations) => observations,
            Err(e) => {
                tracing::warn!(patient = %id, error = %e, "Cholesterol unavailable");
                return None;
            }
        };

        let latest = observations.into_iter().next()?;
        match (latest.value, latest.effective) {
            (ObservationValue::Quantity(Some(value)), Some(effective)) => {
                Some(Reading::new(value, effective))
            }
            _ => {
                tracing::debug!(patient = %id, "Cholesterol observation incomplete");
                None
            }
        }
    }

    /// Recent blood-pressure readings, newest first. Empty if unavailable.
    pub async fn blood_pressure(&self, id: &PatientId) -> BloodPressureSeries {
        let observations = match self
            .bounded(self.gateway.fetch_latest_observations(
                id,
                ObservationKind::BloodPressure,
                self.history_limit,
            ))
            .await
        {
            Ok(observations) => observations,
            Err(e) => {
                tracing::warn!(patient = %id, error = %e, "Blood pressure unavailable");
                return BloodPressureSeries::default();
            }
        };

        let mut series = BloodPressureSeries::default();
        for observation in observations.into_iter().take(self.history_limit) {
            let (systolic, diastolic) = match observation.value {
                ObservationValue::BloodPressure {
                    systolic,
                    diastolic,
                } => (systolic, diastolic),
                ObservationValue::Quantity(_) => (None, None),
            };
            series.systolic.push(systolic);
            series.diastolic.push(diastolic);
            series.effective.push(observation.effective);
        }
        series
    }

    /// Cholesterol and blood pressure for one patient.
    pub async fn readings(&self, id: &PatientId) -> FetchedReadings {
        FetchedReadings {
            cholesterol: self.cholesterol(id).await,
            blood_pressure: self.blood_pressure(id).await,
        }
    }
}
