//! The monitoring facade used by presentation layers.
//!
//! [`MonitorService`] owns the session behind one async mutex. Every command
//! and every refresh tick takes the lock for its whole duration, so an
//! add/remove never interleaves with a tick's per-patient loop.

use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;
use tokio::sync::{watch, Mutex};
use vitalwatch_adapters::Gateway;
use vitalwatch_types::{Classification, MeasurementKind, Patient, PatientId, HISTORY_LIMIT};

use crate::data::{PatientFactory, PatientList};
use crate::error::{InputError, SessionError};
use crate::fetch::{Fetcher, DEFAULT_TIMEOUT};
use crate::report::{self, CholesterolBar, SystolicSeries};
use crate::scheduler::{RefreshPeriod, RefreshScheduler};
use crate::session::Practitioner;

/// A monitored patient with the classification of each reading.
///
/// A classification is `None` while its measurement class is hidden.
#[derive(Debug, Clone, Serialize)]
pub struct MonitoredPatient {
    pub patient: Patient,
    pub cholesterol: Option<Classification>,
    pub systolic: Option<Classification>,
    pub diastolic: Option<Classification>,
}

/// Snapshot of the monitor set.
#[derive(Debug, Clone, Serialize)]
pub struct MonitorView {
    pub patients: Vec<MonitoredPatient>,
    pub average_cholesterol: f64,
}

type SharedSession = Arc<Mutex<Option<Practitioner>>>;

/// Entry point for logging in, managing the monitor set and refreshing.
#[derive(Debug)]
pub struct MonitorService {
    fetcher: Fetcher,
    factory: PatientFactory,
    session: SharedSession,
    scheduler: RefreshScheduler,
    ticks: Arc<watch::Sender<u64>>,
}

impl MonitorService {
    /// Create a service with default timeout and history limit.
    pub fn new(gateway: Arc<dyn Gateway>) -> Self {
        Self::builder(gateway).build()
    }

    pub fn builder(gateway: Arc<dyn Gateway>) -> MonitorServiceBuilder {
        MonitorServiceBuilder {
            gateway,
            timeout: None,
            history_limit: None,
        }
    }

    /// Log a practitioner in and build their directory.
    ///
    /// On failure the current session, if any, is left as it was.
    pub async fn login(&self, practitioner_id: &str) -> Result<(), SessionError> {
        let practitioner = Practitioner::load(practitioner_id, &self.fetcher, &self.factory).await?;

        self.scheduler.cancel();
        *self.session.lock().await = Some(practitioner);
        tracing::info!(practitioner = practitioner_id, "Logged in");
        Ok(())
    }

    /// End the session and stop refreshing.
    pub async fn logout(&self) {
        self.scheduler.cancel();
        if let Some(practitioner) = self.session.lock().await.take() {
            tracing::info!(practitioner = practitioner.id(), "Logged out");
        }
    }

    pub async fn is_logged_in(&self) -> bool {
        self.session.lock().await.is_some()
    }

    async fn with_session<T>(
        &self,
        f: impl FnOnce(&mut Practitioner) -> Result<T, SessionError>,
    ) -> Result<T, SessionError> {
        let mut guard = self.session.lock().await;
        let practitioner = guard.as_mut().ok_or(SessionError::NotLoggedIn)?;
        f(practitioner)
    }

    /// The directory, in source order.
    pub async fn all_patients(&self) -> Result<Vec<Patient>, SessionError> {
        self.with_session(|p| Ok(p.all_patients().cloned().collect()))
            .await
    }

    /// The monitor set in order, classified, with the current average.
    pub async fn monitored_patients(&self) -> Result<MonitorView, SessionError> {
        self.with_session(|p| {
            let visibility = p.visibility();
            let status = |patient: &Patient, kind: MeasurementKind| {
                visibility
                    .is_visible(kind)
                    .then(|| p.classify(patient, kind))
            };
            let patients = p
                .monitored_patients()
                .map(|patient| MonitoredPatient {
                    cholesterol: status(patient, MeasurementKind::Cholesterol),
                    systolic: status(patient, MeasurementKind::Systolic),
                    diastolic: status(patient, MeasurementKind::Diastolic),
                    patient: patient.clone(),
                })
                .collect();
            Ok(MonitorView {
                patients,
                average_cholesterol: p.average_cholesterol(),
            })
        })
        .await
    }

    pub async fn average_cholesterol(&self) -> Result<f64, SessionError> {
        self.with_session(|p| Ok(p.average_cholesterol())).await
    }

    pub async fn monitored_count(&self) -> Result<usize, SessionError> {
        self.with_session(|p| Ok(p.monitor().len())).await
    }

    pub async fn add_to_monitor(&self, id: &PatientId) -> Result<bool, SessionError> {
        self.with_session(|p| p.add_to_monitor(id)).await
    }

    pub async fn remove_from_monitor(&self, id: &PatientId) -> Result<bool, SessionError> {
        self.with_session(|p| p.remove_from_monitor(id)).await
    }

    pub async fn set_blood_pressure_thresholds(
        &self,
        systolic: f64,
        diastolic: f64,
    ) -> Result<(), SessionError> {
        self.with_session(|p| Ok(p.set_blood_pressure_thresholds(systolic, diastolic)?))
            .await
    }

    pub async fn set_threshold(
        &self,
        kind: MeasurementKind,
        value: f64,
    ) -> Result<(), SessionError> {
        self.with_session(|p| Ok(p.set_threshold(kind, value)?))
            .await
    }

    /// Returns the new visibility.
    pub async fn toggle_cholesterol_visibility(&self) -> Result<bool, SessionError> {
        self.with_session(|p| Ok(p.toggle_cholesterol_visibility()))
            .await
    }

    /// Returns the new visibility.
    pub async fn toggle_blood_pressure_visibility(&self) -> Result<bool, SessionError> {
        self.with_session(|p| Ok(p.toggle_blood_pressure_visibility()))
            .await
    }

    pub async fn classify(
        &self,
        id: &PatientId,
        kind: MeasurementKind,
    ) -> Result<Classification, SessionError> {
        self.with_session(|p| {
            let patient = p
                .patient(id)
                .ok_or_else(|| SessionError::UnknownPatient(id.clone()))?;
            Ok(p.classify(patient, kind))
        })
        .await
    }

    pub async fn display_status(
        &self,
        id: &PatientId,
        kind: MeasurementKind,
    ) -> Result<Option<Classification>, SessionError> {
        self.with_session(|p| p.display_status(id, kind)).await
    }

    pub async fn systolic_report(&self) -> Result<String, SessionError> {
        self.with_session(|p| Ok(report::systolic_report(p.monitored_patients())))
            .await
    }

    pub async fn systolic_series(&self) -> Result<Vec<SystolicSeries>, SessionError> {
        self.with_session(|p| Ok(report::systolic_series(p.monitored_patients())))
            .await
    }

    pub async fn cholesterol_bars(&self) -> Result<Vec<CholesterolBar>, SessionError> {
        self.with_session(|p| Ok(report::cholesterol_bars(p.monitored_patients())))
            .await
    }

    /// Run one refresh tick now. Returns the number of patients refreshed.
    pub async fn refresh_now(&self) -> Result<usize, SessionError> {
        run_tick(&self.session, &self.fetcher, &self.factory, &self.ticks)
            .await
            .ok_or(SessionError::NotLoggedIn)
    }

    /// Parse and apply a refresh period entered by the clinician.
    ///
    /// Invalid input is rejected and the current schedule is left running.
    ///
    /// # Panics
    ///
    /// Panics if a valid period is given outside a tokio runtime, since the
    /// refresh task is spawned onto the current runtime.
    pub fn set_refresh_period(&self, input: &str) -> Result<RefreshPeriod, InputError> {
        let period: RefreshPeriod = input.parse()?;
        self.schedule_refresh(period);
        Ok(period)
    }

    /// Refresh the monitor set every `period`, replacing any current schedule.
    ///
    /// # Panics
    ///
    /// Panics when called outside a tokio runtime.
    pub fn schedule_refresh(&self, period: RefreshPeriod) {
        let session = Arc::clone(&self.session);
        let fetcher = self.fetcher.clone();
        let factory = self.factory;
        let ticks = Arc::clone(&self.ticks);

        self.scheduler.schedule(period, move || {
            let session = Arc::clone(&session);
            let fetcher = fetcher.clone();
            let ticks = Arc::clone(&ticks);
            async move {
                run_tick(&session, &fetcher, &factory, &ticks).await;
            }
        });
    }

    pub fn cancel_refresh(&self) -> bool {
        self.scheduler.cancel()
    }

    pub fn refresh_period(&self) -> Option<RefreshPeriod> {
        self.scheduler.period()
    }

    /// Receive the tick count after every completed refresh.
    pub fn subscribe(&self) -> watch::Receiver<u64> {
        self.ticks.subscribe()
    }

    pub fn gateway_description(&self) -> &str {
        self.fetcher.gateway().description()
    }
}

/// Refresh every monitored patient under the session lock.
///
/// Returns `None` when nobody is logged in.
async fn run_tick(
    session: &Mutex<Option<Practitioner>>,
    fetcher: &Fetcher,
    factory: &PatientFactory,
    ticks: &watch::Sender<u64>,
) -> Option<usize> {
    let mut guard = session.lock().await;
    let practitioner = guard.as_mut()?;
    let refreshed = practitioner.refresh(fetcher, factory).await;
    drop(guard);

    ticks.send_modify(|count| *count += 1);
    Some(refreshed)
}

/// Builder for [`MonitorService`].
#[derive(Debug)]
pub struct MonitorServiceBuilder {
    gateway: Arc<dyn Gateway>,
    timeout: Option<Duration>,
    history_limit: Option<usize>,
}

impl MonitorServiceBuilder {
    /// Per-call gateway timeout.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Number of blood-pressure readings kept per patient.
    pub fn history_limit(mut self, limit: usize) -> Self {
        self.history_limit = Some(limit);
        self
    }

    pub fn build(self) -> MonitorService {
        let history_limit = self.history_limit.unwrap_or(HISTORY_LIMIT);
        let (ticks, _) = watch::channel(0);

        MonitorService {
            fetcher: Fetcher::new(self.gateway)
                .with_timeout(self.timeout.unwrap_or(DEFAULT_TIMEOUT))
                .with_history_limit(history_limit),
            factory: PatientFactory::new(history_limit),
            session: Arc::new(Mutex::new(None)),
            scheduler: RefreshScheduler::new(),
            ticks: Arc::new(ticks),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use vitalwatch_adapters::{Demographics, MemoryGateway};

    fn service() -> MonitorService {
        let gateway = MemoryGateway::builder()
            .practitioner("dr", ["p1", "p2"])
            .patient("p1", Demographics::named("Ana Diaz"))
            .patient("p2", Demographics::named("Ben Ode"))
            .build();
        MonitorService::new(Arc::new(gateway))
    }

    #[test]
    fn test_invalid_period_rejected_outside_runtime() {
        let service = service();
        assert_eq!(
            service.set_refresh_period("abc").unwrap_err(),
            InputError::RefreshPeriod("abc".to_string())
        );
        assert_eq!(service.refresh_period(), None);
    }

    #[test]
    #[should_panic]
    fn test_scheduling_outside_runtime_panics() {
        let service = service();
        let _ = service.set_refresh_period("5");
    }

    #[tokio::test]
    async fn test_commands_require_login() {
        let service = service();
        assert!(!service.is_logged_in().await);
        assert!(matches!(
            service.add_to_monitor(&PatientId::from("p1")).await,
            Err(SessionError::NotLoggedIn)
        ));
        assert!(matches!(
            service.refresh_now().await,
            Err(SessionError::NotLoggedIn)
        ));
    }

    #[tokio::test]
    async fn test_login_unknown_practitioner_rejected() {
        let service = service();
        let result = service.login("stranger").await;
        assert!(matches!(result, Err(SessionError::LoginRejected(id)) if id == "stranger"));
        assert!(!service.is_logged_in().await);
    }

    #[tokio::test]
    async fn test_logout_clears_session_and_schedule() {
        let service = service();
        service.login("dr").await.unwrap();
        service.set_refresh_period("60").unwrap();
        assert!(service.refresh_period().is_some());

        service.logout().await;
        assert!(!service.is_logged_in().await);
        assert_eq!(service.refresh_period(), None);
    }

    #[tokio::test]
    async fn test_refresh_now_notifies_subscribers() {
        let service = service();
        service.login("dr").await.unwrap();
        let mut ticks = service.subscribe();

        service.add_to_monitor(&PatientId::from("p1")).await.unwrap();
        assert_eq!(service.refresh_now().await.unwrap(), 1);

        assert!(ticks.has_changed().unwrap());
        assert_eq!(*ticks.borrow_and_update(), 1);
    }

    #[tokio::test]
    async fn test_hidden_class_has_no_status() {
        let service = service();
        service.login("dr").await.unwrap();
        service.add_to_monitor(&PatientId::from("p1")).await.unwrap();

        assert!(!service.toggle_cholesterol_visibility().await.unwrap());
        let view = service.monitored_patients().await.unwrap();
        assert_eq!(view.patients.len(), 1);
        assert_eq!(view.patients[0].cholesterol, None);
        assert_eq!(view.patients[0].systolic, Some(Classification::Normal));
    }
}
