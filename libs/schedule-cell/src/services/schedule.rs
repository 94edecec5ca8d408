use std::sync::Arc;

use async_trait::async_trait;
use reqwest::Method;
use serde_json::Value;
use tracing::{debug, info, instrument, warn};

use shared_api::ApiClient;
use shared_config::AppConfig;
use shared_models::auth::Session;

use crate::error::ScheduleError;
use crate::models::{CreateScheduleRequest, ScheduleEntry, UpdateScheduleRequest};

/// Backend operations on schedule entries.
#[async_trait]
pub trait ScheduleStore: Send + Sync {
    /// Entries owned by the session's user (doctor view).
    async fn fetch_own_entries(&self, session: &Session) -> Result<Vec<ScheduleEntry>, ScheduleError>;

    /// Entries of one doctor, as seen by a patient.
    async fn fetch_doctor_entries(
        &self,
        doctor_id: &str,
        session: &Session,
    ) -> Result<Vec<ScheduleEntry>, ScheduleError>;

    async fn create_entry(
        &self,
        request: &CreateScheduleRequest,
        session: &Session,
    ) -> Result<ScheduleEntry, ScheduleError>;

    async fn update_entry(
        &self,
        entry_id: &str,
        request: &UpdateScheduleRequest,
        session: &Session,
    ) -> Result<ScheduleEntry, ScheduleError>;

    async fn delete_entry(&self, entry_id: &str, session: &Session) -> Result<(), ScheduleError>;

    /// Detaches the patient from a booked entry, returning it to `created`.
    async fn reject_booking(
        &self,
        entry_id: &str,
        session: &Session,
    ) -> Result<ScheduleEntry, ScheduleError>;
}

pub struct ScheduleService {
    api: Arc<ApiClient>,
}

impl ScheduleService {
    pub fn new(api: Arc<ApiClient>) -> Self {
        Self { api }
    }

    pub fn from_config(config: &AppConfig) -> Result<Self, ScheduleError> {
        Ok(Self::new(Arc::new(ApiClient::new(config)?)))
    }

    /// `doctor_id` attributes records that name no doctor.
    async fn fetch_entries(
        &self,
        path: &str,
        doctor_id: &str,
        session: &Session,
    ) -> Result<Vec<ScheduleEntry>, ScheduleError> {
        let result: Vec<Value> = self
            .api
            .request(Method::GET, path, Some(&session.token), None)
            .await?;

        // A malformed record should not blank the whole calendar. If its cell
        // is known it stays occupied so nothing is offered on top of it.
        let total = result.len();
        let entries: Vec<ScheduleEntry> = result
            .iter()
            .filter_map(|raw| match ScheduleEntry::decode(raw, doctor_id) {
                Ok(entry) => {
                    if entry.unreadable {
                        warn!("Schedule entry {} is malformed; holding its slot", entry.id);
                    }
                    Some(entry)
                }
                Err(e) => {
                    warn!("Skipping unparseable schedule entry: {}", e);
                    None
                }
            })
            .collect();

        debug!("Fetched {} of {} schedule entries from {}", entries.len(), total, path);
        Ok(entries)
    }

    fn parse_entry(value: Value) -> Result<ScheduleEntry, ScheduleError> {
        // Some endpoints wrap the record as {"schedule": {...}}.
        let raw = match value {
            Value::Object(mut map) if map.contains_key("schedule") => {
                map.remove("schedule").unwrap_or(Value::Null)
            }
            other => other,
        };
        serde_json::from_value(raw).map_err(|e| {
            ScheduleError::Validation(format!("Failed to parse schedule entry: {}", e))
        })
    }

    fn to_body<T: serde::Serialize>(request: &T) -> Result<Value, ScheduleError> {
        serde_json::to_value(request)
            .map_err(|e| ScheduleError::Validation(format!("Failed to encode request: {}", e)))
    }
}

#[async_trait]
impl ScheduleStore for ScheduleService {
    #[instrument(skip(self, session), fields(user_id = %session.user_id()))]
    async fn fetch_own_entries(&self, session: &Session) -> Result<Vec<ScheduleEntry>, ScheduleError> {
        self.fetch_entries("/schedules/me", session.user_id(), session)
            .await
    }

    #[instrument(skip(self, session))]
    async fn fetch_doctor_entries(
        &self,
        doctor_id: &str,
        session: &Session,
    ) -> Result<Vec<ScheduleEntry>, ScheduleError> {
        self.fetch_entries(&format!("/schedules/doctor/{}", doctor_id), doctor_id, session)
            .await
    }

    #[instrument(skip(self, request, session), fields(date = %request.date, slot = %request.time_slot))]
    async fn create_entry(
        &self,
        request: &CreateScheduleRequest,
        session: &Session,
    ) -> Result<ScheduleEntry, ScheduleError> {
        request.validate()?;

        let result: Value = self
            .api
            .request(
                Method::POST,
                "/schedules",
                Some(&session.token),
                Some(Self::to_body(request)?),
            )
            .await
            .map_err(ScheduleError::from)
            .inspect_err(|e| {
                if e.is_conflict() {
                    warn!("Slot creation rejected by backend: {}", e);
                }
            })?;

        let entry = Self::parse_entry(result)?;
        info!("Created schedule entry {}", entry.id);
        Ok(entry)
    }

    #[instrument(skip(self, request, session))]
    async fn update_entry(
        &self,
        entry_id: &str,
        request: &UpdateScheduleRequest,
        session: &Session,
    ) -> Result<ScheduleEntry, ScheduleError> {
        let result: Value = self
            .api
            .request(
                Method::PUT,
                &format!("/schedules/{}", entry_id),
                Some(&session.token),
                Some(Self::to_body(request)?),
            )
            .await
            .map_err(ScheduleError::from)
            .inspect_err(|e| {
                if e.is_conflict() {
                    warn!("Update of schedule entry {} rejected: {}", entry_id, e);
                }
            })?;

        let entry = Self::parse_entry(result)?;
        info!("Updated schedule entry {} (status {})", entry.id, entry.status);
        Ok(entry)
    }

    #[instrument(skip(self, session))]
    async fn delete_entry(&self, entry_id: &str, session: &Session) -> Result<(), ScheduleError> {
        self.api
            .request_empty(
                Method::DELETE,
                &format!("/schedules/{}", entry_id),
                Some(&session.token),
                None,
            )
            .await?;

        info!("Deleted schedule entry {}", entry_id);
        Ok(())
    }

    #[instrument(skip(self, session))]
    async fn reject_booking(
        &self,
        entry_id: &str,
        session: &Session,
    ) -> Result<ScheduleEntry, ScheduleError> {
        let result: Value = self
            .api
            .request(
                Method::POST,
                &format!("/schedules/{}/reject", entry_id),
                Some(&session.token),
                None,
            )
            .await?;

        let entry = Self::parse_entry(result)?;
        info!("Rejected booking on schedule entry {}", entry.id);
        Ok(entry)
    }
}
