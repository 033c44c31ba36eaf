//! Monitor set behaviour through the public service API.

use std::sync::Arc;

use chrono::{DateTime, FixedOffset};
use proptest::prelude::*;
use vitalwatch::{Classification, MeasurementKind, MonitorService, PatientId, PatientList};
use vitalwatch::{Demographics, Directory, MonitorSet, Patient, Reading};
use vitalwatch_adapters::{MemoryGateway, Observation, ObservationKind};

fn at(s: &str) -> DateTime<FixedOffset> {
    DateTime::parse_from_rfc3339(s).unwrap()
}

fn cholesterol(value: f64) -> Vec<Observation> {
    vec![Observation::quantity(value, at("2021-06-01T09:00:00+10:00"))]
}

/// A: 200, B: 220, C: no cholesterol, D: 180. Encounters repeat A and B.
fn clinic() -> MemoryGateway {
    MemoryGateway::builder()
        .practitioner("dr-who", ["A", "B", "A", "C", "B", "D"])
        .patient("A", Demographics::named("Alice Ames"))
        .patient("B", Demographics::named("Bob Bell"))
        .patient("C", Demographics::named("Cat Cole"))
        .patient("D", Demographics::named("Dan Dee"))
        .observations("A", ObservationKind::Cholesterol, cholesterol(200.0))
        .observations("B", ObservationKind::Cholesterol, cholesterol(220.0))
        .observations("D", ObservationKind::Cholesterol, cholesterol(180.0))
        .observations(
            "A",
            ObservationKind::BloodPressure,
            vec![
                Observation::blood_pressure(150.0, 95.0, at("2021-06-03T09:00:00Z")),
                Observation::blood_pressure(138.0, 88.0, at("2021-06-02T09:00:00Z")),
            ],
        )
        .build()
}

async fn logged_in() -> MonitorService {
    let service = MonitorService::new(Arc::new(clinic()));
    service.login("dr-who").await.unwrap();
    service
}

fn id(s: &str) -> PatientId {
    PatientId::from(s)
}

#[tokio::test]
async fn directory_deduplicates_in_first_seen_order() {
    let service = logged_in().await;
    let ids: Vec<PatientId> = service
        .all_patients()
        .await
        .unwrap()
        .into_iter()
        .map(|p| p.id)
        .collect();

    assert_eq!(ids, vec![id("A"), id("B"), id("C"), id("D")]);
}

#[tokio::test]
async fn two_member_average_and_classification() {
    let service = logged_in().await;
    assert!(service.add_to_monitor(&id("A")).await.unwrap());
    assert!(service.add_to_monitor(&id("B")).await.unwrap());

    assert_eq!(service.average_cholesterol().await.unwrap(), 210.0);
    assert_eq!(
        service.classify(&id("A"), MeasurementKind::Cholesterol).await.unwrap(),
        Classification::Normal
    );
    assert_eq!(
        service.classify(&id("B"), MeasurementKind::Cholesterol).await.unwrap(),
        Classification::Abnormal
    );
}

#[tokio::test]
async fn lone_member_is_normal() {
    let service = logged_in().await;
    service.add_to_monitor(&id("B")).await.unwrap();

    assert_eq!(
        service.classify(&id("B"), MeasurementKind::Cholesterol).await.unwrap(),
        Classification::Normal
    );
}

#[tokio::test]
async fn no_data_excluded_from_denominator() {
    let service = logged_in().await;
    for patient in ["A", "B", "C"] {
        service.add_to_monitor(&id(patient)).await.unwrap();
    }

    let view = service.monitored_patients().await.unwrap();
    assert_eq!(view.patients.len(), 3);
    assert_eq!(view.average_cholesterol, 210.0);

    let c = &view.patients[2];
    assert_eq!(c.patient.id, id("C"));
    assert_eq!(c.patient.cholesterol_value(), None);
    assert_eq!(c.cholesterol, Some(Classification::Normal));
}

#[tokio::test]
async fn duplicate_add_and_absent_remove_are_noops() {
    let service = logged_in().await;
    service.add_to_monitor(&id("A")).await.unwrap();
    service.add_to_monitor(&id("D")).await.unwrap();
    let average = service.average_cholesterol().await.unwrap();

    assert!(!service.add_to_monitor(&id("A")).await.unwrap());
    assert!(!service.remove_from_monitor(&id("B")).await.unwrap());

    assert_eq!(service.average_cholesterol().await.unwrap(), average);
    assert_eq!(service.monitored_count().await.unwrap(), 2);
}

#[tokio::test]
async fn blood_pressure_thresholds() {
    let service = logged_in().await;
    service.add_to_monitor(&id("A")).await.unwrap();

    // Nothing is flagged until a threshold is set.
    assert_eq!(
        service.classify(&id("A"), MeasurementKind::Systolic).await.unwrap(),
        Classification::Normal
    );

    service.set_blood_pressure_thresholds(140.0, 100.0).await.unwrap();
    assert_eq!(
        service.classify(&id("A"), MeasurementKind::Systolic).await.unwrap(),
        Classification::Abnormal
    );
    assert_eq!(
        service.classify(&id("A"), MeasurementKind::Diastolic).await.unwrap(),
        Classification::Normal
    );

    assert!(service.set_blood_pressure_thresholds(0.0, 80.0).await.is_err());
    assert_eq!(
        service.classify(&id("A"), MeasurementKind::Diastolic).await.unwrap(),
        Classification::Normal
    );
}

#[tokio::test]
async fn visibility_hides_status_but_not_data() {
    let service = logged_in().await;
    service.add_to_monitor(&id("A")).await.unwrap();
    service.add_to_monitor(&id("B")).await.unwrap();

    assert!(!service.toggle_cholesterol_visibility().await.unwrap());
    assert_eq!(
        service.display_status(&id("B"), MeasurementKind::Cholesterol).await.unwrap(),
        None
    );
    // Statistics keep tracking while hidden.
    service.remove_from_monitor(&id("A")).await.unwrap();
    assert_eq!(service.average_cholesterol().await.unwrap(), 220.0);

    assert!(service.toggle_cholesterol_visibility().await.unwrap());
    assert_eq!(
        service.display_status(&id("B"), MeasurementKind::Cholesterol).await.unwrap(),
        Some(Classification::Normal)
    );
}

#[tokio::test]
async fn systolic_report_lists_history_oldest_first() {
    let service = logged_in().await;
    service.add_to_monitor(&id("A")).await.unwrap();
    service.add_to_monitor(&id("B")).await.unwrap();

    let report = service.systolic_report().await.unwrap();
    assert_eq!(
        report,
        "Alice Ames: 138 (2021-06-02T09:00:00+00:00), 150 (2021-06-03T09:00:00+00:00)"
    );
}

proptest! {
    #[test]
    fn average_matches_naive_mean_after_any_interleaving(
        cholesterol in proptest::collection::vec(proptest::option::of(50.0..400.0f64), 1..16),
        ops in proptest::collection::vec((any::<usize>(), any::<bool>()), 0..200)
    ) {
        let patients: Vec<Patient> = cholesterol
            .iter()
            .enumerate()
            .map(|(i, value)| {
                let mut patient =
                    Patient::new(PatientId::new(format!("p{i}")), Demographics::unavailable());
                patient.cholesterol = value.map(|v| Reading::new(v, at("2021-01-01T00:00:00Z")));
                patient
            })
            .collect();

        let directory = Directory::from_ids(patients.iter().map(|p| p.id.clone()));
        prop_assert_eq!(directory.len(), patients.len());

        let mut set = MonitorSet::new();
        for (index, add) in ops {
            let patient = &patients[index % patients.len()];
            if add {
                set.append(patient);
            } else {
                set.remove(patient);
            }

            let known: Vec<f64> = set
                .iter()
                .filter_map(|id| patients.iter().find(|p| &p.id == id))
                .filter_map(Patient::cholesterol_value)
                .collect();
            let naive = if known.is_empty() {
                0.0
            } else {
                known.iter().sum::<f64>() / known.len() as f64
            };

            prop_assert!(
                (set.average_cholesterol() - naive).abs() < 1e-6,
                "average {} drifted from {}",
                set.average_cholesterol(),
                naive
            );
            prop_assert_eq!(set.stats().measured + set.stats().unmeasured, set.len());
        }
    }
}
