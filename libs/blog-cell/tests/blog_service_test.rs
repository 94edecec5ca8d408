use std::sync::Arc;

use assert_matches::assert_matches;
use serde_json::json;
use wiremock::matchers::{body_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use blog_cell::{BlogError, BlogService, CreateBlogRequest, UpdateBlogRequest};
use shared_api::ApiClient;
use shared_utils::test_utils::{MockApiResponses, TestConfig, TestUser};

fn service_for(server: &MockServer) -> BlogService {
    let config = TestConfig::with_base_url(server.uri()).to_app_config();
    BlogService::new(Arc::new(ApiClient::new(&config).unwrap()))
}

#[tokio::test]
async fn test_list_posts_is_public() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/blogs"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            MockApiResponses::blog_post_response("b-1", "doc-1"),
            MockApiResponses::blog_post_response("b-2", "doc-2"),
        ])))
        .mount(&server)
        .await;

    let posts = service_for(&server).list_posts(None).await.unwrap();

    assert_eq!(posts.len(), 2);
    assert_eq!(posts[1].author.id, "doc-2");
    assert_eq!(posts[0].like_count(), 0);
}

#[tokio::test]
async fn test_doctor_publishes_post() {
    let server = MockServer::start().await;
    let doctor = TestUser::doctor("doc@example.com").with_id("doc-1");

    Mock::given(method("POST"))
        .and(path("/blogs"))
        .and(header("Authorization", format!("Bearer {}", doctor.token()).as_str()))
        .and(body_json(json!({ "title": "Winter tips", "content": "<p>Stay warm.</p>" })))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({
            "blog": MockApiResponses::blog_post_response("b-9", "doc-1")
        })))
        .expect(1)
        .mount(&server)
        .await;

    let request = CreateBlogRequest {
        title: "Winter tips".to_string(),
        content: "<p>Stay warm.</p>".to_string(),
    };
    let post = service_for(&server)
        .create_post(&request, &doctor.to_session())
        .await
        .unwrap();

    assert_eq!(post.id, "b-9");
    assert!(post.is_authored_by("doc-1"));
}

#[tokio::test]
async fn test_patient_cannot_publish() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(201))
        .expect(0)
        .mount(&server)
        .await;

    let request = CreateBlogRequest {
        title: "Hello".to_string(),
        content: "World".to_string(),
    };
    let session = TestUser::patient("pat@example.com").to_session();

    assert_matches!(
        service_for(&server).create_post(&request, &session).await,
        Err(BlogError::Forbidden(_))
    );
}

#[tokio::test]
async fn test_toggle_like_returns_updated_post() {
    let server = MockServer::start().await;
    let patient = TestUser::patient("pat@example.com").with_id("pat-1");

    let mut liked = MockApiResponses::blog_post_response("b-1", "doc-1");
    liked["likes"] = json!(["pat-1"]);

    Mock::given(method("POST"))
        .and(path("/blogs/b-1/like"))
        .respond_with(ResponseTemplate::new(200).set_body_json(liked))
        .expect(1)
        .mount(&server)
        .await;

    let post = service_for(&server)
        .toggle_like("b-1", &patient.to_session())
        .await
        .unwrap();

    assert!(post.is_liked_by("pat-1"));
    assert_eq!(post.like_count(), 1);
}

#[tokio::test]
async fn test_comment_lifecycle() {
    let server = MockServer::start().await;
    let patient = TestUser::patient("pat@example.com").with_id("pat-1");
    let session = patient.to_session();

    let mut commented = MockApiResponses::blog_post_response("b-1", "doc-1");
    commented["comments"] = json!([{ "_id": "c-1", "user": { "_id": "pat-1", "name": "Test User" }, "text": "Great read" }]);

    Mock::given(method("POST"))
        .and(path("/blogs/b-1/comments"))
        .and(body_json(json!({ "text": "Great read" })))
        .respond_with(ResponseTemplate::new(201).set_body_json(commented.clone()))
        .expect(1)
        .mount(&server)
        .await;

    let mut edited = commented.clone();
    edited["comments"][0]["text"] = json!("Great read, thanks");

    Mock::given(method("PUT"))
        .and(path("/blogs/b-1/comments/c-1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(edited))
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("DELETE"))
        .and(path("/blogs/b-1/comments/c-1"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(MockApiResponses::blog_post_response("b-1", "doc-1")),
        )
        .expect(1)
        .mount(&server)
        .await;

    let service = service_for(&server);

    let post = service.add_comment("b-1", "  Great read ", &session).await.unwrap();
    assert_eq!(post.comments.len(), 1);
    assert_eq!(post.comments[0].user.name.as_deref(), Some("Test User"));

    let post = service
        .update_comment("b-1", "c-1", "Great read, thanks", &session)
        .await
        .unwrap();
    assert_eq!(post.comment("c-1").unwrap().text, "Great read, thanks");

    let post = service.delete_comment("b-1", "c-1", &session).await.unwrap();
    assert!(post.comments.is_empty());

    assert_matches!(
        service.add_comment("b-1", "   ", &session).await,
        Err(BlogError::Validation(_))
    );
}

#[tokio::test]
async fn test_update_and_delete_post() {
    let server = MockServer::start().await;
    let doctor = TestUser::doctor("doc@example.com").with_id("doc-1");
    let session = doctor.to_session();

    let mut renamed = MockApiResponses::blog_post_response("b-1", "doc-1");
    renamed["title"] = json!("Renamed");

    Mock::given(method("PUT"))
        .and(path("/blogs/b-1"))
        .and(body_json(json!({ "title": "Renamed" })))
        .respond_with(ResponseTemplate::new(200).set_body_json(renamed))
        .mount(&server)
        .await;

    Mock::given(method("DELETE"))
        .and(path("/blogs/b-1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "message": "Blog deleted" })))
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/blogs/b-1"))
        .respond_with(ResponseTemplate::new(404).set_body_json(MockApiResponses::error_response("Blog not found")))
        .mount(&server)
        .await;

    let service = service_for(&server);
    let update = UpdateBlogRequest {
        title: Some("Renamed".to_string()),
        content: None,
    };

    assert_eq!(service.update_post("b-1", &update, &session).await.unwrap().title, "Renamed");
    service.delete_post("b-1", &session).await.unwrap();
    assert_matches!(service.get_post("b-1", None).await, Err(BlogError::NotFound(_)));
}
