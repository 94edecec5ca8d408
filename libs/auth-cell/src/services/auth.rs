use std::sync::{Arc, OnceLock};

use regex::Regex;
use reqwest::Method;
use serde_json::Value;
use tracing::{debug, info, instrument, warn};

use shared_api::ApiClient;
use shared_config::AppConfig;
use shared_models::auth::{Role, Session};

use crate::error::AuthError;
use crate::models::{AuthResponse, LoginRequest, MessageResponse, RegisterRequest, VerifyEmailRequest};

const MIN_PASSWORD_LENGTH: usize = 6;
const MAX_EMAIL_LENGTH: usize = 254;

fn email_regex() -> Option<&'static Regex> {
    static EMAIL: OnceLock<Option<Regex>> = OnceLock::new();
    EMAIL
        .get_or_init(|| Regex::new(r"^[a-zA-Z0-9._%+-]+@[a-zA-Z0-9.-]+\.[a-zA-Z]{2,}$").ok())
        .as_ref()
}

pub fn is_valid_email(email: &str) -> bool {
    email.len() <= MAX_EMAIL_LENGTH && email_regex().is_some_and(|re| re.is_match(email))
}

/// Login, registration and email verification against the backend.
pub struct AuthService {
    api: Arc<ApiClient>,
}

impl AuthService {
    pub fn new(api: Arc<ApiClient>) -> Self {
        Self { api }
    }

    pub fn from_config(config: &AppConfig) -> Result<Self, AuthError> {
        Ok(Self::new(Arc::new(ApiClient::new(config)?)))
    }

    fn to_body<T: serde::Serialize>(request: &T) -> Result<Value, AuthError> {
        serde_json::to_value(request)
            .map_err(|e| AuthError::Validation(format!("Failed to encode request: {}", e)))
    }

    fn into_session(response: AuthResponse) -> Result<Session, AuthError> {
        if response.token.trim().is_empty() {
            return Err(AuthError::InvalidResponse(
                "Backend returned an empty token".to_string(),
            ));
        }
        Ok(response.into())
    }

    #[instrument(skip(self, password))]
    pub async fn login(&self, email: &str, password: &str) -> Result<Session, AuthError> {
        let email = email.trim();
        if !is_valid_email(email) {
            return Err(AuthError::Validation("Please enter a valid email".to_string()));
        }
        if password.is_empty() {
            return Err(AuthError::Validation("Password is required".to_string()));
        }

        let request = LoginRequest {
            email: email.to_string(),
            password: password.to_string(),
        };

        let response: AuthResponse = self
            .api
            .request(Method::POST, "/auth/login", None, Some(Self::to_body(&request)?))
            .await
            .inspect_err(|e| warn!("Login failed for {}: {}", email, e))?;

        let session = Self::into_session(response)?;
        info!("Logged in as {} ({})", session.user_id(), session.role());
        Ok(session)
    }

    /// Creates an account. The backend replies with a notice that a
    /// verification code was emailed; the account is usable after
    /// [`AuthService::verify_email`].
    #[instrument(skip(self, request), fields(email = %request.email, role = %request.role))]
    pub async fn register(&self, request: &RegisterRequest) -> Result<MessageResponse, AuthError> {
        validate_registration(request)?;

        let response: MessageResponse = self
            .api
            .request(Method::POST, "/auth/register", None, Some(Self::to_body(request)?))
            .await?;

        info!("Registered {} as {}", request.email, request.role);
        Ok(response)
    }

    #[instrument(skip(self, otp))]
    pub async fn verify_email(&self, email: &str, otp: &str) -> Result<Session, AuthError> {
        let otp = otp.trim();
        if otp.is_empty() {
            return Err(AuthError::Validation("Verification code is required".to_string()));
        }

        let request = VerifyEmailRequest {
            email: email.trim().to_string(),
            otp: otp.to_string(),
        };

        let response: AuthResponse = self
            .api
            .request(Method::POST, "/auth/verify-email", None, Some(Self::to_body(&request)?))
            .await?;

        debug!("Email verified for {}", email);
        Self::into_session(response)
    }
}

pub fn validate_registration(request: &RegisterRequest) -> Result<(), AuthError> {
    if request.name.trim().is_empty() {
        return Err(AuthError::Validation("Name is required".to_string()));
    }
    if !is_valid_email(request.email.trim()) {
        return Err(AuthError::Validation("Please enter a valid email".to_string()));
    }
    if request.password.len() < MIN_PASSWORD_LENGTH {
        return Err(AuthError::Validation(format!(
            "Password must be at least {} characters",
            MIN_PASSWORD_LENGTH
        )));
    }
    if request.role == Role::Doctor
        && request
            .specialization
            .as_deref()
            .map_or(true, |s| s.trim().is_empty())
    {
        return Err(AuthError::Validation(
            "Doctors must provide a specialization".to_string(),
        ));
    }
    Ok(())
}
