use std::sync::Arc;

use chrono::Utc;
use serde_json::{json, Value};
use uuid::Uuid;

use shared_config::AppConfig;
use shared_models::auth::{Role, Session, User};

pub struct TestConfig {
    pub api_base_url: String,
}

impl Default for TestConfig {
    fn default() -> Self {
        Self {
            api_base_url: "http://localhost:5000/api".to_string(),
        }
    }
}

impl TestConfig {
    pub fn with_base_url(api_base_url: impl Into<String>) -> Self {
        Self {
            api_base_url: api_base_url.into(),
        }
    }

    pub fn to_app_config(&self) -> AppConfig {
        AppConfig::new(self.api_base_url.clone())
    }

    pub fn to_arc(&self) -> Arc<AppConfig> {
        Arc::new(self.to_app_config())
    }
}

pub struct TestUser {
    pub id: String,
    pub name: String,
    pub email: String,
    pub role: Role,
}

impl Default for TestUser {
    fn default() -> Self {
        Self::new("test@example.com", Role::Patient)
    }
}

impl TestUser {
    pub fn new(email: &str, role: Role) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            name: "Test User".to_string(),
            email: email.to_string(),
            role,
        }
    }

    pub fn with_id(mut self, id: &str) -> Self {
        self.id = id.to_string();
        self
    }

    pub fn doctor(email: &str) -> Self {
        Self::new(email, Role::Doctor)
    }

    pub fn patient(email: &str) -> Self {
        Self::new(email, Role::Patient)
    }

    pub fn admin(email: &str) -> Self {
        Self::new(email, Role::Admin)
    }

    pub fn to_user(&self) -> User {
        User {
            id: self.id.clone(),
            name: self.name.clone(),
            email: self.email.clone(),
            role: self.role,
            is_verified: true,
            created_at: Some(Utc::now()),
        }
    }

    pub fn token(&self) -> String {
        format!("test-token-{}", self.id)
    }

    pub fn to_session(&self) -> Session {
        Session::new(self.token(), self.to_user())
    }
}

pub struct MockApiResponses;

impl MockApiResponses {
    pub fn user_response(user: &TestUser) -> Value {
        json!({
            "_id": user.id,
            "name": user.name,
            "email": user.email,
            "role": user.role.to_string(),
            "isVerified": true,
            "createdAt": "2024-01-01T00:00:00Z"
        })
    }

    pub fn login_response(user: &TestUser) -> Value {
        json!({
            "token": user.token(),
            "user": Self::user_response(user)
        })
    }

    pub fn schedule_entry_response(
        id: &str,
        doctor_id: &str,
        date: &str,
        start_time: &str,
        end_time: &str,
        patient: Option<&str>,
    ) -> Value {
        json!({
            "_id": id,
            "doctor": doctor_id,
            "date": format!("{}T00:00:00.000Z", date),
            "timeSlot": { "startTime": start_time, "endTime": end_time },
            "patient": patient,
            "status": if patient.is_some() { "booked" } else { "created" },
            "appointmentType": "offline",
            "notes": null
        })
    }

    pub fn doctor_response(id: &str, specialization: &str) -> Value {
        json!({
            "_id": id,
            "name": "Dr. Jane Smith",
            "email": "jane.smith@example.com",
            "specialization": specialization,
            "experience": 12,
            "fees": 150.0,
            "about": "Experienced practitioner",
            "available": true
        })
    }

    pub fn blog_post_response(id: &str, author_id: &str) -> Value {
        json!({
            "_id": id,
            "title": "Staying healthy in winter",
            "content": "<p>Wash your hands.</p>",
            "author": { "_id": author_id, "name": "Dr. Jane Smith" },
            "likes": [],
            "comments": [],
            "createdAt": "2024-01-01T00:00:00Z",
            "updatedAt": "2024-01-01T00:00:00Z"
        })
    }

    pub fn error_response(message: &str) -> Value {
        json!({ "message": message })
    }
}
