//! In-memory patient collections and classification.
//!
//! ## Submodules
//!
//! - [`patient_list`]: The [`PatientList`] capability shared by both collections
//! - [`directory`]: Every patient associated with the practitioner
//! - [`monitor`]: The monitored subset with running cholesterol statistics
//! - [`classify`]: Threshold and average based classification
//! - [`factory`]: Uniform [`Patient`](vitalwatch_types::Patient) construction
//!
//! ## Data Flow
//!
//! ```text
//! Gateway fetches
//!        │
//!        ▼
//! PatientFactory::create_patient()
//!        │
//!        ├──▶ patient store (single owner, keyed by id)
//!        │
//!        ├──▶ Directory (ids)
//!        │
//!        └──▶ MonitorSet (ids + CholesterolStats)
//!                   │
//!                   ▼
//!             classify_patient()
//! ```

pub mod classify;
pub mod directory;
pub mod factory;
pub mod monitor;
pub mod patient_list;

pub use classify::{
    classify_above, classify_cholesterol, classify_patient, parse_threshold,
    BloodPressureThresholds, Visibility,
};
pub use directory::Directory;
pub use factory::PatientFactory;
pub use monitor::{CholesterolStats, MonitorSet, NOISE_FLOOR};
pub use patient_list::PatientList;
