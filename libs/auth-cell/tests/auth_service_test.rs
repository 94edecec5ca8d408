use std::sync::Arc;

use assert_matches::assert_matches;
use serde_json::json;
use wiremock::matchers::{body_json, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use auth_cell::{AuthError, AuthService, RegisterRequest};
use shared_api::ApiClient;
use shared_models::auth::Role;
use shared_utils::test_utils::{MockApiResponses, TestConfig, TestUser};

fn service_for(server: &MockServer) -> AuthService {
    let config = TestConfig::with_base_url(server.uri()).to_app_config();
    AuthService::new(Arc::new(ApiClient::new(&config).unwrap()))
}

#[tokio::test]
async fn test_login_returns_session() {
    let server = MockServer::start().await;
    let doctor = TestUser::doctor("doc@example.com");

    Mock::given(method("POST"))
        .and(path("/auth/login"))
        .and(body_json(json!({ "email": "doc@example.com", "password": "hunter22" })))
        .respond_with(ResponseTemplate::new(200).set_body_json(MockApiResponses::login_response(&doctor)))
        .expect(1)
        .mount(&server)
        .await;

    let session = service_for(&server)
        .login(" doc@example.com ", "hunter22")
        .await
        .unwrap();

    assert_eq!(session.token, doctor.token());
    assert_eq!(session.user_id(), doctor.id);
    assert!(session.is_doctor());
}

#[tokio::test]
async fn test_login_with_wrong_password_is_invalid_credentials() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/auth/login"))
        .respond_with(
            ResponseTemplate::new(401).set_body_json(MockApiResponses::error_response("Invalid email or password")),
        )
        .mount(&server)
        .await;

    let result = service_for(&server).login("pat@example.com", "wrong").await;

    assert_matches!(result, Err(AuthError::InvalidCredentials(msg)) if msg == "Invalid email or password");
}

#[tokio::test]
async fn test_login_rejects_malformed_email_locally() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let result = service_for(&server).login("not-an-email", "secret1").await;

    assert_matches!(result, Err(AuthError::Validation(_)));
}

#[tokio::test]
async fn test_register_doctor_sends_specialization() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/auth/register"))
        .and(body_json(json!({
            "name": "Jane Smith",
            "email": "jane@example.com",
            "password": "secret1",
            "role": "doctor",
            "specialization": "Cardiology"
        })))
        .respond_with(
            ResponseTemplate::new(201).set_body_json(json!({ "message": "Verification code sent" })),
        )
        .expect(1)
        .mount(&server)
        .await;

    let request = RegisterRequest {
        name: "Jane Smith".to_string(),
        email: "jane@example.com".to_string(),
        password: "secret1".to_string(),
        role: Role::Doctor,
        specialization: Some("Cardiology".to_string()),
    };
    let response = service_for(&server).register(&request).await.unwrap();

    assert_eq!(response.message, "Verification code sent");
}

#[tokio::test]
async fn test_register_existing_email_is_conflict() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/auth/register"))
        .respond_with(ResponseTemplate::new(409).set_body_json(MockApiResponses::error_response("User already exists")))
        .mount(&server)
        .await;

    let request = RegisterRequest {
        name: "Pat".to_string(),
        email: "pat@example.com".to_string(),
        password: "secret1".to_string(),
        role: Role::Patient,
        specialization: None,
    };

    assert_matches!(
        service_for(&server).register(&request).await,
        Err(AuthError::AlreadyRegistered(_))
    );
}

#[tokio::test]
async fn test_verify_email_logs_user_in() {
    let server = MockServer::start().await;
    let patient = TestUser::patient("pat@example.com");

    Mock::given(method("POST"))
        .and(path("/auth/verify-email"))
        .and(body_json(json!({ "email": "pat@example.com", "otp": "123456" })))
        .respond_with(ResponseTemplate::new(200).set_body_json(MockApiResponses::login_response(&patient)))
        .mount(&server)
        .await;

    let session = service_for(&server)
        .verify_email("pat@example.com", "123456")
        .await
        .unwrap();

    assert!(session.is_patient());
    assert!(session.user.is_verified);
}

#[tokio::test]
async fn test_empty_token_is_rejected() {
    let server = MockServer::start().await;
    let patient = TestUser::patient("pat@example.com");

    Mock::given(method("POST"))
        .and(path("/auth/login"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "token": "",
            "user": MockApiResponses::user_response(&patient)
        })))
        .mount(&server)
        .await;

    assert_matches!(
        service_for(&server).login("pat@example.com", "secret1").await,
        Err(AuthError::InvalidResponse(_))
    );
}
