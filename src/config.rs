//! Layered configuration.
//!
//! Sources, lowest precedence first:
//!
//! 1. Built-in defaults
//! 2. An optional TOML file
//! 3. `VITALWATCH_*` environment variables, with `__` separating nested
//!    keys (e.g. `VITALWATCH_GATEWAY__ENDPOINT`)
//!
//! Command-line flags are applied on top by the binary.

use std::path::Path;
use std::time::Duration;

use anyhow::{bail, Result};
use config::{Config, Environment, File};
use serde::Deserialize;
use vitalwatch_adapters::DEFAULT_ENDPOINT;
use vitalwatch_types::HISTORY_LIMIT;

use crate::scheduler::RefreshPeriod;

/// Gateway connection settings.
#[derive(Debug, Clone, Deserialize)]
pub struct GatewaySettings {
    /// Base URL of the FHIR server.
    pub endpoint: String,
    /// Per-call timeout in seconds.
    pub timeout_secs: u64,
}

/// Refresh schedule settings.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RefreshSettings {
    /// Start refreshing at this period after login. Unset means manual only.
    #[serde(default)]
    pub period_secs: Option<u64>,
}

/// Initial blood-pressure thresholds. Unset means never flagged.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ThresholdSettings {
    #[serde(default)]
    pub systolic: Option<f64>,
    #[serde(default)]
    pub diastolic: Option<f64>,
}

/// Application settings.
#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    pub gateway: GatewaySettings,
    #[serde(default)]
    pub refresh: RefreshSettings,
    #[serde(default)]
    pub thresholds: ThresholdSettings,
    /// Blood-pressure readings kept per patient.
    pub history_limit: usize,
}

impl Settings {
    /// Load settings from defaults, an optional file and the environment.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut builder = Config::builder()
            .set_default("gateway.endpoint", DEFAULT_ENDPOINT)?
            .set_default("gateway.timeout_secs", 10)?
            .set_default("history_limit", HISTORY_LIMIT as u64)?;

        if let Some(path) = path {
            builder = builder.add_source(File::from(path));
        }

        let settings: Settings = builder
            .add_source(
                Environment::with_prefix("VITALWATCH")
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?
            .try_deserialize()?;

        settings.validate()?;
        Ok(settings)
    }

    fn validate(&self) -> Result<()> {
        if self.gateway.timeout_secs == 0 {
            bail!("gateway.timeout_secs must be positive");
        }
        if self.history_limit == 0 {
            bail!("history_limit must be positive");
        }
        Ok(())
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.gateway.timeout_secs)
    }

    /// The configured refresh period, if any.
    pub fn refresh_period(&self) -> Result<Option<RefreshPeriod>> {
        Ok(self
            .refresh
            .period_secs
            .map(RefreshPeriod::from_secs)
            .transpose()?)
    }
}
