//! Error types for the monitoring engine.

use thiserror::Error;
use vitalwatch_adapters::GatewayError;
use vitalwatch_types::{MeasurementKind, PatientId};

/// Rejected clinician input. The message is shown to the clinician as-is.
///
/// Validation happens before any state is touched, so a rejected input
/// never changes the engine.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum InputError {
    #[error("Invalid refresh period {0:?}: enter a positive integer.")]
    RefreshPeriod(String),

    #[error("Invalid threshold {0:?}: enter a positive number.")]
    Threshold(String),

    #[error("{0} is compared against the monitored average and has no fixed threshold.")]
    NoFixedThreshold(MeasurementKind),
}

/// Errors surfaced by the session facade.
#[derive(Debug, Error)]
pub enum SessionError {
    #[error("No practitioner is logged in")]
    NotLoggedIn,

    #[error("Practitioner {0} was not recognised by the data source")]
    LoginRejected(String),

    #[error("Patient {0} is not in the directory")]
    UnknownPatient(PatientId),

    #[error(transparent)]
    Gateway(#[from] GatewayError),

    #[error(transparent)]
    Input(#[from] InputError),
}
