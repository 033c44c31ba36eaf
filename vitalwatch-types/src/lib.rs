//! # vitalwatch-types
//!
//! Core types for clinician-side vital-sign monitoring. These are shared by the
//! `vitalwatch` engine and by every data-source gateway, so a gateway can be
//! written without depending on the engine itself.
//!
//! ## Features
//!
//! - `serde`: serialization of every public type via serde
//!
//! ## Example
//!
//! ```rust
//! use vitalwatch_types::{Demographics, Patient, PatientId, Reading};
//! use chrono::{TimeZone, Utc};
//!
//! let mut patient = Patient::new(PatientId::new("29163"), Demographics::named("Ana Silva"));
//! patient.cholesterol = Some(Reading::new(212.5, Utc.with_ymd_and_hms(2020, 1, 1, 9, 0, 0).unwrap().into()));
//!
//! assert_eq!(patient.cholesterol_value(), Some(212.5));
//! assert!(patient.latest_systolic().is_none());
//! ```

mod measurement;
mod patient;
mod reading;

pub use measurement::*;
pub use patient::*;
pub use reading::*;

/// Maximum number of blood-pressure readings kept per patient.
pub const HISTORY_LIMIT: usize = 5;

/// Placeholder rendered for any value the source could not provide.
pub const UNAVAILABLE: &str = "N/A";
