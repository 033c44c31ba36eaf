//! FHIR R4 gateway using the REST API.
//!
//! This gateway resolves practitioners, their patients and the patients'
//! observations by querying a FHIR server (HAPI or compatible).
//!
//! ## Resources Queried
//!
//! - **Practitioner**: existence check and identifier lookup
//! - **Encounter**: patients seen by the practitioner (paginated)
//! - **Patient**: name, gender, birth date and address
//! - **Observation**: latest cholesterol and blood pressure panels
//!
//! ## Example
//!
//! ```rust,no_run
//! use vitalwatch_adapters::fhir::FhirGateway;
//! use vitalwatch_adapters::{Gateway, ObservationKind, PatientId};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let gateway = FhirGateway::builder()
//!         .endpoint("https://hapi.fhir.org/baseR4")
//!         .build()?;
//!
//!     let observations = gateway
//!         .fetch_latest_observations(&PatientId::new("29163"), ObservationKind::BloodPressure, 5)
//!         .await?;
//!
//!     for observation in &observations {
//!         println!("{:?}", observation.value);
//!     }
//!
//!     Ok(())
//! }
//! ```

use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, FixedOffset, NaiveDate};
use reqwest::{Client, StatusCode};
use serde::de::DeserializeOwned;
use serde::Deserialize;

use crate::{
    dedup_preserving_order, Demographics, Gateway, GatewayError, Observation, ObservationKind,
    ObservationValue, PatientId, DEFAULT_ENDPOINT, DIASTOLIC_CODE, SYSTOLIC_CODE,
};

/// Upper bound on Encounter pages followed for one practitioner.
const MAX_PAGES: usize = 200;

/// FHIR gateway for a single server.
#[derive(Debug, Clone)]
pub struct FhirGateway {
    client: Client,
    endpoint: String,
    description: String,
}

impl FhirGateway {
    /// Create a new builder for configuring the gateway.
    pub fn builder() -> FhirGatewayBuilder {
        FhirGatewayBuilder::default()
    }

    /// The base URL requests are made against.
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        url: &str,
        query: &[(&str, String)],
    ) -> Result<T, GatewayError> {
        let response = self.client.get(url).query(query).send().await?;

        if response.status() == StatusCode::NOT_FOUND || response.status() == StatusCode::GONE {
            return Err(GatewayError::NotFound(url.to_string()));
        }

        if !response.status().is_success() {
            return Err(GatewayError::Http(format!(
                "API returned status {}",
                response.status()
            )));
        }

        response
            .json()
            .await
            .map_err(|e| GatewayError::Parse(e.to_string()))
    }

    async fn fetch_practitioner(&self, id: &str) -> Result<PractitionerResource, GatewayError> {
        let url = format!("{}/Practitioner/{}", self.endpoint, id);
        self.get_json(&url, &[]).await
    }
}

#[async_trait]
impl Gateway for FhirGateway {
    async fn verify_practitioner(&self, id: &str) -> Result<bool, GatewayError> {
        match self.fetch_practitioner(id).await {
            Ok(_) => Ok(true),
            Err(GatewayError::NotFound(_)) => Ok(false),
            Err(e) => Err(e),
        }
    }

    async fn list_associated_patient_ids(
        &self,
        practitioner_id: &str,
    ) -> Result<Vec<PatientId>, GatewayError> {
        let practitioner = self.fetch_practitioner(practitioner_id).await?;
        let identifier = practitioner.search_token().ok_or_else(|| {
            GatewayError::Parse(format!(
                "Practitioner/{} has no identifier",
                practitioner_id
            ))
        })?;

        let url = format!("{}/Encounter", self.endpoint);
        let mut bundle: Bundle<EncounterResource> = self
            .get_json(&url, &[("participant.identifier", identifier)])
            .await?;

        let mut ids = Vec::new();
        for _ in 0..MAX_PAGES {
            ids.extend(bundle.resources().filter_map(|e| e.subject_id()));

            let Some(next) = bundle.next_link() else {
                break;
            };
            // A failed page ends the listing; what was gathered is kept
            match self.get_json(&next, &[]).await {
                Ok(page) => bundle = page,
                Err(_) => break,
            }
        }

        Ok(dedup_preserving_order(ids))
    }

    async fn fetch_demographics(
        &self,
        patient_id: &PatientId,
    ) -> Result<Demographics, GatewayError> {
        let url = format!("{}/Patient/{}", self.endpoint, patient_id);
        let patient: PatientResource = self.get_json(&url, &[]).await?;
        Ok(patient.into_demographics())
    }

    async fn fetch_latest_observations(
        &self,
        patient_id: &PatientId,
        kind: ObservationKind,
        limit: usize,
    ) -> Result<Vec<Observation>, GatewayError> {
        let url = format!("{}/Observation", self.endpoint);
        let bundle: Bundle<ObservationResource> = self
            .get_json(
                &url,
                &[
                    ("patient", patient_id.to_string()),
                    ("code", kind.loinc_code().to_string()),
                    ("_sort", "-date".to_string()),
                    ("_count", limit.to_string()),
                ],
            )
            .await?;

        Ok(bundle
            .resources()
            .take(limit)
            .map(|o| o.to_observation(kind))
            .collect())
    }

    fn description(&self) -> &str {
        &self.description
    }
}

/// Builder for FhirGateway.
#[derive(Debug, Default)]
pub struct FhirGatewayBuilder {
    endpoint: Option<String>,
    timeout: Option<Duration>,
}

impl FhirGatewayBuilder {
    /// Set the FHIR base URL (e.g., "https://hapi.fhir.org/baseR4").
    pub fn endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = Some(endpoint.into());
        self
    }

    /// Set the request timeout (default: 10 seconds).
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Build the gateway.
    pub fn build(self) -> Result<FhirGateway, GatewayError> {
        let timeout = self.timeout.unwrap_or(Duration::from_secs(10));

        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| GatewayError::Connection(e.to_string()))?;

        let endpoint = self
            .endpoint
            .unwrap_or_else(|| DEFAULT_ENDPOINT.to_string())
            .trim_end_matches('/')
            .to_string();

        Ok(FhirGateway {
            client,
            description: format!("fhir: {}", endpoint),
            endpoint,
        })
    }
}

/// Parse a FHIR `dateTime`, which may be a full timestamp or a bare date.
fn parse_fhir_datetime(s: &str) -> Option<DateTime<FixedOffset>> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt);
    }
    let date = NaiveDate::parse_from_str(s, "%Y-%m-%d").ok()?;
    Some(date.and_hms_opt(0, 0, 0)?.and_utc().fixed_offset())
}

fn capitalize(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

#[derive(Debug, Deserialize)]
struct Bundle<R> {
    #[serde(default = "Vec::new")]
    entry: Vec<BundleEntry<R>>,
    #[serde(default)]
    link: Vec<BundleLink>,
}

impl<R> Bundle<R> {
    fn resources(&self) -> impl Iterator<Item = &R> {
        self.entry.iter().filter_map(|e| e.resource.as_ref())
    }

    fn next_link(&self) -> Option<String> {
        self.link
            .iter()
            .find(|l| l.relation == "next")
            .map(|l| l.url.clone())
    }
}

#[derive(Debug, Deserialize)]
struct BundleEntry<R> {
    resource: Option<R>,
}

#[derive(Debug, Deserialize)]
struct BundleLink {
    relation: String,
    url: String,
}

#[derive(Debug, Deserialize)]
struct PractitionerResource {
    #[serde(default)]
    identifier: Vec<Identifier>,
}

impl PractitionerResource {
    /// `system|value` token of the first identifier.
    fn search_token(&self) -> Option<String> {
        let first = self.identifier.first()?;
        let value = first.value.as_deref()?;
        Some(format!("{}|{}", first.system.as_deref().unwrap_or(""), value))
    }
}

#[derive(Debug, Deserialize)]
struct Identifier {
    system: Option<String>,
    value: Option<String>,
}

#[derive(Debug, Deserialize)]
struct EncounterResource {
    subject: Option<Reference>,
}

impl EncounterResource {
    fn subject_id(&self) -> Option<PatientId> {
        let reference = self.subject.as_ref()?.reference.as_deref()?;
        let id = reference.strip_prefix("Patient/").unwrap_or(reference);
        (!id.is_empty()).then(|| PatientId::new(id))
    }
}

#[derive(Debug, Deserialize)]
struct Reference {
    reference: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PatientResource {
    #[serde(default)]
    name: Vec<HumanName>,
    gender: Option<String>,
    birth_date: Option<String>,
    #[serde(default)]
    address: Vec<Address>,
}

impl PatientResource {
    fn into_demographics(self) -> Demographics {
        let name = self.name.first().and_then(HumanName::display);
        let address = self.address.first().and_then(Address::display);
        Demographics {
            name,
            gender: self.gender.as_deref().map(capitalize),
            birth_date: self
                .birth_date
                .as_deref()
                .and_then(|d| NaiveDate::parse_from_str(d, "%Y-%m-%d").ok()),
            address,
        }
    }
}

#[derive(Debug, Deserialize)]
struct HumanName {
    #[serde(default)]
    given: Vec<String>,
    family: Option<String>,
}

impl HumanName {
    fn display(&self) -> Option<String> {
        let parts: Vec<&str> = self
            .given
            .iter()
            .map(String::as_str)
            .chain(self.family.as_deref())
            .collect();
        (!parts.is_empty()).then(|| parts.join(" "))
    }
}

#[derive(Debug, Deserialize)]
struct Address {
    #[serde(default)]
    line: Vec<String>,
    city: Option<String>,
    state: Option<String>,
    country: Option<String>,
}

impl Address {
    fn display(&self) -> Option<String> {
        let parts: Vec<&str> = self
            .line
            .first()
            .map(String::as_str)
            .into_iter()
            .chain(self.city.as_deref())
            .chain(self.state.as_deref())
            .chain(self.country.as_deref())
            .collect();
        (!parts.is_empty()).then(|| parts.join(", "))
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ObservationResource {
    effective_date_time: Option<String>,
    value_quantity: Option<Quantity>,
    #[serde(default)]
    component: Vec<Component>,
}

impl ObservationResource {
    fn to_observation(&self, kind: ObservationKind) -> Observation {
        let effective = self
            .effective_date_time
            .as_deref()
            .and_then(parse_fhir_datetime);

        let value = match kind {
            ObservationKind::Cholesterol => {
                ObservationValue::Quantity(self.value_quantity.as_ref().and_then(|q| q.value))
            }
            ObservationKind::BloodPressure => ObservationValue::BloodPressure {
                systolic: self.component_value(SYSTOLIC_CODE, 1),
                diastolic: self.component_value(DIASTOLIC_CODE, 0),
            },
        };

        Observation { effective, value }
    }

    /// Value of the component with this LOINC code, or of the component at
    /// `position` when no component is coded.
    fn component_value(&self, code: &str, position: usize) -> Option<f64> {
        let coded = self.component.iter().find(|c| c.has_code(code));
        let any_coded = self.component.iter().any(|c| !c.code.coding.is_empty());
        match coded {
            Some(c) => c.value_quantity.as_ref().and_then(|q| q.value),
            None if !any_coded => self
                .component
                .get(position)
                .and_then(|c| c.value_quantity.as_ref())
                .and_then(|q| q.value),
            None => None,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Component {
    #[serde(default)]
    code: CodeableConcept,
    value_quantity: Option<Quantity>,
}

impl Component {
    fn has_code(&self, code: &str) -> bool {
        self.code
            .coding
            .iter()
            .any(|c| c.code.as_deref() == Some(code))
    }
}

#[derive(Debug, Default, Deserialize)]
struct CodeableConcept {
    #[serde(default)]
    coding: Vec<Coding>,
}

#[derive(Debug, Deserialize)]
struct Coding {
    code: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Quantity {
    value: Option<f64>,
}
