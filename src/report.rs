//! Derived series and text for presenting monitored readings.

use chrono::{DateTime, FixedOffset};
use serde::Serialize;
use vitalwatch_types::{display_timestamp, Patient, PatientId};

/// One point on a systolic history line.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SeriesPoint {
    pub value: f64,
    pub effective: Option<DateTime<FixedOffset>>,
}

/// A patient's systolic readings, oldest first.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SystolicSeries {
    pub patient: PatientId,
    pub name: String,
    pub points: Vec<SeriesPoint>,
}

/// A patient's latest cholesterol, for bar charts.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CholesterolBar {
    pub patient: PatientId,
    pub name: String,
    pub value: f64,
}

/// Systolic lines for every patient with at least one systolic reading.
pub fn systolic_series<'a, I>(patients: I) -> Vec<SystolicSeries>
where
    I: IntoIterator<Item = &'a Patient>,
{
    patients
        .into_iter()
        .filter_map(|patient| {
            let mut points: Vec<SeriesPoint> = patient
                .systolic_history()
                .map(|(value, effective)| SeriesPoint {
                    value,
                    effective: effective.copied(),
                })
                .collect();
            if points.is_empty() {
                return None;
            }
            points.reverse();
            Some(SystolicSeries {
                patient: patient.id.clone(),
                name: patient.name().to_string(),
                points,
            })
        })
        .collect()
}

/// Cholesterol bars for patients with a known value.
pub fn cholesterol_bars<'a, I>(patients: I) -> Vec<CholesterolBar>
where
    I: IntoIterator<Item = &'a Patient>,
{
    patients
        .into_iter()
        .filter_map(|patient| {
            patient.cholesterol_value().map(|value| CholesterolBar {
                patient: patient.id.clone(),
                name: patient.name().to_string(),
                value,
            })
        })
        .collect()
}

/// One line per patient: `Name: v1 (t1), v2 (t2), ...`, oldest first.
pub fn systolic_report<'a, I>(patients: I) -> String
where
    I: IntoIterator<Item = &'a Patient>,
{
    systolic_series(patients)
        .iter()
        .map(|series| {
            let readings: Vec<String> = series
                .points
                .iter()
                .map(|p| format!("{} ({})", p.value, display_timestamp(p.effective.as_ref())))
                .collect();
            format!("{}: {}", series.name, readings.join(", "))
        })
        .collect::<Vec<_>>()
        .join("\n")
}
