//! # vitalwatch-adapters
//!
//! Gateways that translate identifier-based queries into clinical-record
//! lookups for the vitalwatch engine.
//!
//! ## Supported Sources
//!
//! - **In-memory** ([`memory::MemoryGateway`]) - a scripted source for tests,
//!   demos and offline use. Always available.
//! - **FHIR R4** (`fhir` feature) - queries a FHIR REST server for
//!   Practitioner, Encounter, Patient and Observation resources.
//!
//! ## Quick Start (FHIR)
//!
//! ```rust,ignore
//! use vitalwatch_adapters::fhir::FhirGateway;
//! use vitalwatch_adapters::{Gateway, ObservationKind};
//! use std::time::Duration;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let gateway = FhirGateway::builder()
//!         .endpoint("https://hapi.fhir.org/baseR4")
//!         .timeout(Duration::from_secs(5))
//!         .build()?;
//!
//!     if gateway.verify_practitioner("500").await? {
//!         let patients = gateway.list_associated_patient_ids("500").await?;
//!         println!("{} patients", patients.len());
//!     }
//!     Ok(())
//! }
//! ```

use std::fmt::Debug;

use async_trait::async_trait;
use chrono::{DateTime, FixedOffset};

pub mod error;
pub mod memory;

#[cfg(feature = "fhir")]
pub mod fhir;

pub use error::GatewayError;
pub use memory::MemoryGateway;

// Re-export types for convenience
pub use vitalwatch_types::{Demographics, PatientId};

/// Kind of observation that can be requested from a source.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ObservationKind {
    /// Total cholesterol (LOINC 2093-3).
    Cholesterol,
    /// Blood pressure panel (LOINC 55284-4).
    BloodPressure,
}

impl ObservationKind {
    /// LOINC code used to search for this kind.
    pub fn loinc_code(&self) -> &'static str {
        match self {
            ObservationKind::Cholesterol => "2093-3",
            ObservationKind::BloodPressure => "55284-4",
        }
    }
}

/// FHIR server queried when no endpoint is configured.
pub const DEFAULT_ENDPOINT: &str = "https://fhir.monash.edu/hapi-fhir-jpaserver/fhir";

/// LOINC code of the systolic component of a blood pressure panel.
pub const SYSTOLIC_CODE: &str = "8480-6";

/// LOINC code of the diastolic component of a blood pressure panel.
pub const DIASTOLIC_CODE: &str = "8462-4";

/// Value carried by an observation.
#[derive(Debug, Clone, PartialEq)]
pub enum ObservationValue {
    /// A single quantity, e.g. total cholesterol.
    Quantity(Option<f64>),
    /// A systolic/diastolic pair.
    BloodPressure {
        systolic: Option<f64>,
        diastolic: Option<f64>,
    },
}

/// One observation as returned by a source.
#[derive(Debug, Clone, PartialEq)]
pub struct Observation {
    pub effective: Option<DateTime<FixedOffset>>,
    pub value: ObservationValue,
}

impl Observation {
    pub fn quantity(value: f64, effective: DateTime<FixedOffset>) -> Self {
        Self {
            effective: Some(effective),
            value: ObservationValue::Quantity(Some(value)),
        }
    }

    pub fn blood_pressure(systolic: f64, diastolic: f64, effective: DateTime<FixedOffset>) -> Self {
        Self {
            effective: Some(effective),
            value: ObservationValue::BloodPressure {
                systolic: Some(systolic),
                diastolic: Some(diastolic),
            },
        }
    }
}

/// A clinical-record source the engine can query by identifier.
///
/// Implementations must return promptly; the engine additionally bounds
/// every call except the paged patient listing with its own timeout.
#[async_trait]
pub trait Gateway: Send + Sync + Debug {
    /// Returns `Ok(true)` iff `id` resolves to a known practitioner.
    ///
    /// An unknown but well-formed id yields `Ok(false)`, never an error.
    async fn verify_practitioner(&self, id: &str) -> Result<bool, GatewayError>;

    /// Ids of patients who had an encounter with this practitioner.
    ///
    /// De-duplicated in first-seen order and possibly empty. If the source
    /// fails part-way through, the ids gathered so far are returned.
    ///
    /// The engine applies no overall timeout to this call, so implementations
    /// must bound each request they make.
    async fn list_associated_patient_ids(
        &self,
        practitioner_id: &str,
    ) -> Result<Vec<PatientId>, GatewayError>;

    /// Demographic fields of a patient.
    async fn fetch_demographics(&self, patient_id: &PatientId)
        -> Result<Demographics, GatewayError>;

    /// Up to `limit` observations of `kind`, newest first.
    ///
    /// An empty list means the source holds no such observation.
    async fn fetch_latest_observations(
        &self,
        patient_id: &PatientId,
        kind: ObservationKind,
        limit: usize,
    ) -> Result<Vec<Observation>, GatewayError>;

    /// Returns a human-readable description of the source.
    fn description(&self) -> &str;
}

/// Keep the first occurrence of each id, preserving order.
pub fn dedup_preserving_order(ids: impl IntoIterator<Item = PatientId>) -> Vec<PatientId> {
    let mut seen = std::collections::HashSet::new();
    ids.into_iter().filter(|id| seen.insert(id.clone())).collect()
}
