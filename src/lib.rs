//! # vitalwatch
//!
//! A clinician-side engine for tracking a practitioner's patients and
//! flagging abnormal vital signs.
//!
//! After login the engine holds every patient associated with the
//! practitioner. The clinician promotes some of them into a monitor set, whose
//! readings are refreshed periodically from a clinical data source and
//! classified against the set's running average cholesterol and
//! clinician-set blood-pressure thresholds.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │                        MonitorService                        │
//! │  ┌───────────┐   ┌─────────────────────────────────────────┐ │
//! │  │ scheduler │──▶│ session (Practitioner, behind a mutex)  │ │
//! │  │ (ticks)   │   │  patient store ─▶ Directory / MonitorSet│ │
//! │  └───────────┘   │  thresholds, visibility ─▶ classify     │ │
//! │                  └───────────────┬─────────────────────────┘ │
//! │                                  │                           │
//! │                                  ▼                           │
//! │                  ┌───────────────────────────┐               │
//! │                  │ fetch (timeouts, degrade) │               │
//! │                  └───────────────┬───────────┘               │
//! └──────────────────────────────────┼───────────────────────────┘
//!                                    ▼
//!                   Gateway ◀── MemoryGateway | FhirGateway
//! ```
//!
//! - **[`service`]**: The facade presentation layers call ([`MonitorService`])
//! - **[`session`]**: Per-practitioner state and the single reading-replacement path
//! - **[`data`]**: Directory, monitor set statistics, classification and patient construction
//! - **[`scheduler`]**: The single cancellable refresh task
//! - **[`fetch`]**: Bounded gateway calls that degrade failures to unavailable readings
//! - **[`report`]**: Chart series and the systolic history text
//! - **[`config`]**: Layered settings for the binary
//!
//! ## Usage
//!
//! ```
//! use std::sync::Arc;
//! use vitalwatch::{MeasurementKind, MonitorService, PatientId};
//! use vitalwatch_adapters::{Demographics, MemoryGateway};
//!
//! # tokio::runtime::Runtime::new().unwrap().block_on(async {
//! let gateway = MemoryGateway::builder()
//!     .practitioner("dr-1", ["p-1"])
//!     .patient("p-1", Demographics::named("Ana Diaz"))
//!     .build();
//!
//! let service = MonitorService::new(Arc::new(gateway));
//! service.login("dr-1").await.unwrap();
//! assert!(service.add_to_monitor(&PatientId::from("p-1")).await.unwrap());
//!
//! service.set_refresh_period("30").unwrap();
//! let status = service
//!     .display_status(&PatientId::from("p-1"), MeasurementKind::Cholesterol)
//!     .await
//!     .unwrap();
//! assert!(status.is_some());
//! # });
//! ```

pub mod config;
pub mod data;
pub mod error;
pub mod fetch;
pub mod report;
pub mod scheduler;
pub mod service;
pub mod session;

pub use config::Settings;
pub use data::{
    BloodPressureThresholds, CholesterolStats, Directory, MonitorSet, PatientFactory, PatientList,
    Visibility,
};
pub use error::{InputError, SessionError};
pub use fetch::Fetcher;
pub use scheduler::{RefreshPeriod, RefreshScheduler};
pub use service::{MonitorService, MonitorView, MonitoredPatient};
pub use session::Practitioner;

// Re-export domain types for convenience
pub use vitalwatch_types::{
    BloodPressureReading, Classification, Demographics, MeasurementKind, Patient, PatientId,
    Reading,
};
