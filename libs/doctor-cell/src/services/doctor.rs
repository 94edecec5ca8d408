use std::sync::Arc;

use reqwest::Method;
use serde_json::Value;
use tracing::{debug, instrument, warn};

use shared_api::ApiClient;
use shared_config::AppConfig;
use shared_models::auth::Session;

use crate::error::DoctorError;
use crate::models::{Doctor, DoctorSearchFilters};

/// Read access to the doctor directory.
pub struct DoctorService {
    api: Arc<ApiClient>,
}

impl DoctorService {
    pub fn new(api: Arc<ApiClient>) -> Self {
        Self { api }
    }

    pub fn from_config(config: &AppConfig) -> Result<Self, DoctorError> {
        Ok(Self::new(Arc::new(ApiClient::new(config)?)))
    }

    /// Lists every doctor. The directory is public, so a session is optional.
    #[instrument(skip(self, session))]
    pub async fn list_doctors(&self, session: Option<&Session>) -> Result<Vec<Doctor>, DoctorError> {
        let token = session.map(|s| s.token.as_str());
        let result: Value = self.api.request(Method::GET, "/doctors", token, None).await?;

        let records = match result {
            Value::Array(items) => items,
            Value::Object(mut map) => match map.remove("doctors") {
                Some(Value::Array(items)) => items,
                _ => {
                    return Err(DoctorError::InvalidResponse(
                        "Expected a list of doctors".to_string(),
                    ))
                }
            },
            _ => {
                return Err(DoctorError::InvalidResponse(
                    "Expected a list of doctors".to_string(),
                ))
            }
        };

        let doctors: Vec<Doctor> = records
            .into_iter()
            .filter_map(|raw| match serde_json::from_value(raw) {
                Ok(doctor) => Some(doctor),
                Err(e) => {
                    warn!("Skipping unparseable doctor record: {}", e);
                    None
                }
            })
            .collect();

        debug!("Fetched {} doctors", doctors.len());
        Ok(doctors)
    }

    #[instrument(skip(self, session))]
    pub async fn get_doctor(&self, doctor_id: &str, session: Option<&Session>) -> Result<Doctor, DoctorError> {
        let token = session.map(|s| s.token.as_str());
        let path = format!("/doctors/{}", doctor_id);
        let result: Value = self.api.request(Method::GET, &path, token, None).await?;

        let raw = match result {
            Value::Object(mut map) if map.contains_key("doctor") => {
                map.remove("doctor").unwrap_or(Value::Null)
            }
            other => other,
        };
        serde_json::from_value(raw)
            .map_err(|e| DoctorError::InvalidResponse(format!("Failed to parse doctor: {}", e)))
    }

    /// Lists doctors and keeps those matching `filters`.
    pub async fn search_doctors(
        &self,
        filters: &DoctorSearchFilters,
        session: Option<&Session>,
    ) -> Result<Vec<Doctor>, DoctorError> {
        debug!("Searching doctors with filters: {:?}", filters);
        let doctors = self.list_doctors(session).await?;
        Ok(Self::filter(doctors, filters))
    }

    pub fn filter_by_specialization(doctors: Vec<Doctor>, specialization: &str) -> Vec<Doctor> {
        Self::filter(doctors, &DoctorSearchFilters::specialization(specialization))
    }

    fn filter(doctors: Vec<Doctor>, filters: &DoctorSearchFilters) -> Vec<Doctor> {
        doctors.into_iter().filter(|d| filters.matches(d)).collect()
    }
}
