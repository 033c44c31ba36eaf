use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use tracing_subscriber::EnvFilter;

use vitalwatch::data::parse_threshold;
use vitalwatch::{
    Classification, MeasurementKind, MonitorService, MonitorView, PatientId, RefreshPeriod,
    Settings,
};
use vitalwatch_adapters::Gateway;
use vitalwatch_types::{display_timestamp, display_value};

/// Used when neither the command line nor the settings give a period.
const DEFAULT_REFRESH_SECS: u64 = 60;

#[derive(Parser, Debug)]
#[command(name = "vitalwatch")]
#[command(about = "Monitor cholesterol and blood pressure for a practitioner's patients")]
struct Args {
    /// Path to a TOML settings file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Practitioner identifier to log in as
    #[arg(short, long)]
    practitioner: String,

    /// Patient ids to monitor (repeatable). Defaults to every associated patient.
    #[arg(short, long)]
    monitor: Vec<String>,

    /// Refresh period in seconds
    #[arg(short, long)]
    refresh: Option<String>,

    /// Systolic threshold in mmHg
    #[arg(long)]
    systolic: Option<String>,

    /// Diastolic threshold in mmHg
    #[arg(long)]
    diastolic: Option<String>,

    /// Print the monitored patients once and exit
    #[arg(long, conflicts_with = "export")]
    once: bool,

    /// Export the monitored patients to a JSON file and exit
    #[arg(short, long)]
    export: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("vitalwatch=info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();
    let settings = Settings::load(args.config.as_deref())?;

    let gateway = build_gateway(&settings)?;
    tracing::info!(source = gateway.description(), "Using data source");

    let service = MonitorService::builder(gateway)
        .timeout(settings.request_timeout())
        .history_limit(settings.history_limit)
        .build();

    service
        .login(&args.practitioner)
        .await
        .with_context(|| format!("Login failed for practitioner {}", args.practitioner))?;

    let ids: Vec<PatientId> = if args.monitor.is_empty() {
        service
            .all_patients()
            .await?
            .into_iter()
            .map(|p| p.id)
            .collect()
    } else {
        args.monitor.iter().map(|id| PatientId::from(id.as_str())).collect()
    };
    for id in &ids {
        match service.add_to_monitor(id).await {
            Ok(true) => {}
            Ok(false) => tracing::warn!(patient = %id, "Already monitored"),
            Err(e) => tracing::warn!(patient = %id, error = %e, "Cannot monitor patient"),
        }
    }

    apply_threshold(
        &service,
        MeasurementKind::Systolic,
        args.systolic.as_deref(),
        settings.thresholds.systolic,
    )
    .await?;
    apply_threshold(
        &service,
        MeasurementKind::Diastolic,
        args.diastolic.as_deref(),
        settings.thresholds.diastolic,
    )
    .await?;

    // Handle export mode (non-interactive)
    if let Some(path) = args.export {
        let view = service.monitored_patients().await?;
        let json = serde_json::to_string_pretty(&view)?;
        std::fs::write(&path, json)
            .with_context(|| format!("Failed to write {}", path.display()))?;
        println!("Exported monitored patients to {}", path.display());
        return Ok(());
    }

    if args.once {
        print_view(&service).await?;
        return Ok(());
    }

    let period = match args.refresh {
        Some(input) => service.set_refresh_period(&input)?,
        None => {
            let period = match settings.refresh_period()? {
                Some(period) => period,
                None => RefreshPeriod::from_secs(DEFAULT_REFRESH_SECS)?,
            };
            service.schedule_refresh(period);
            period
        }
    };
    println!("Refreshing every {period}. Press Ctrl-C to stop.");

    let mut ticks = service.subscribe();
    loop {
        tokio::select! {
            changed = ticks.changed() => {
                if changed.is_err() {
                    break;
                }
                print_view(&service).await?;
            }
            _ = tokio::signal::ctrl_c() => break,
        }
    }

    service.logout().await;
    Ok(())
}

#[cfg(feature = "fhir")]
fn build_gateway(settings: &Settings) -> Result<Arc<dyn Gateway>> {
    let gateway = vitalwatch_adapters::fhir::FhirGateway::builder()
        .endpoint(settings.gateway.endpoint.clone())
        .timeout(settings.request_timeout())
        .build()?;
    Ok(Arc::new(gateway))
}

#[cfg(not(feature = "fhir"))]
fn build_gateway(_settings: &Settings) -> Result<Arc<dyn Gateway>> {
    anyhow::bail!("vitalwatch was built without the `fhir` feature; no data source is available")
}

/// Command-line value wins over the settings file.
async fn apply_threshold(
    service: &MonitorService,
    kind: MeasurementKind,
    input: Option<&str>,
    configured: Option<f64>,
) -> Result<()> {
    let value = match input {
        Some(input) => Some(parse_threshold(input)?),
        None => configured,
    };
    if let Some(value) = value {
        service.set_threshold(kind, value).await?;
        tracing::info!(kind = %kind, threshold = value, "Threshold set");
    }
    Ok(())
}

fn flag(status: Option<Classification>) -> &'static str {
    match status {
        Some(Classification::Abnormal) => "HIGH",
        Some(Classification::Normal) => "",
        None => "-",
    }
}

async fn print_view(service: &MonitorService) -> Result<()> {
    let MonitorView {
        patients,
        average_cholesterol,
    } = service.monitored_patients().await?;

    println!(
        "{:<28} {:>12} {:<5} {:<26} {:>9} {:<5} {:>9} {:<5} {:<26}",
        "Name", "Cholesterol", "", "Time", "Systolic", "", "Diastolic", "", "Time"
    );
    for row in &patients {
        let patient = &row.patient;
        println!(
            "{:<28} {:>12} {:<5} {:<26} {:>9} {:<5} {:>9} {:<5} {:<26}",
            patient.name(),
            display_value(patient.cholesterol_value()),
            flag(row.cholesterol),
            display_timestamp(patient.cholesterol_effective()),
            display_value(patient.latest_systolic()),
            flag(row.systolic),
            display_value(patient.latest_diastolic()),
            flag(row.diastolic),
            display_timestamp(patient.latest_blood_pressure_effective()),
        );
    }
    println!(
        "Average cholesterol: {:.2} mg/dL ({} monitored)",
        average_cholesterol,
        patients.len()
    );

    let report = service.systolic_report().await?;
    if !report.is_empty() {
        println!("\nSystolic history:\n{report}");
    }
    Ok(())
}
