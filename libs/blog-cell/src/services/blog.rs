use std::sync::Arc;

use reqwest::Method;
use serde_json::Value;
use tracing::{debug, info, instrument, warn};

use shared_api::ApiClient;
use shared_config::AppConfig;
use shared_models::auth::{Role, Session};

use crate::error::BlogError;
use crate::models::{BlogPost, CommentRequest, CreateBlogRequest, UpdateBlogRequest};

pub struct BlogService {
    api: Arc<ApiClient>,
}

impl BlogService {
    pub fn new(api: Arc<ApiClient>) -> Self {
        Self { api }
    }

    pub fn from_config(config: &AppConfig) -> Result<Self, BlogError> {
        Ok(Self::new(Arc::new(ApiClient::new(config)?)))
    }

    fn parse_post(value: Value) -> Result<BlogPost, BlogError> {
        // Mutations reply either with the post or with {"blog": {...}}.
        let raw = match value {
            Value::Object(mut map) if map.contains_key("blog") => {
                map.remove("blog").unwrap_or(Value::Null)
            }
            other => other,
        };
        serde_json::from_value(raw)
            .map_err(|e| BlogError::InvalidResponse(format!("Failed to parse blog post: {}", e)))
    }

    fn to_body<T: serde::Serialize>(request: &T) -> Result<Value, BlogError> {
        serde_json::to_value(request)
            .map_err(|e| BlogError::Validation(format!("Failed to encode request: {}", e)))
    }

    async fn send_for_post(
        &self,
        method: Method,
        path: &str,
        session: &Session,
        body: Option<Value>,
    ) -> Result<BlogPost, BlogError> {
        let result: Value = self
            .api
            .request(method, path, Some(&session.token), body)
            .await?;
        Self::parse_post(result)
    }

    pub async fn list_posts(&self, session: Option<&Session>) -> Result<Vec<BlogPost>, BlogError> {
        let token = session.map(|s| s.token.as_str());
        let result: Vec<Value> = self.api.request(Method::GET, "/blogs", token, None).await?;

        let posts: Vec<BlogPost> = result
            .into_iter()
            .filter_map(|raw| match serde_json::from_value(raw) {
                Ok(post) => Some(post),
                Err(e) => {
                    warn!("Skipping unparseable blog post: {}", e);
                    None
                }
            })
            .collect();

        debug!("Fetched {} blog posts", posts.len());
        Ok(posts)
    }

    pub async fn get_post(&self, post_id: &str, session: Option<&Session>) -> Result<BlogPost, BlogError> {
        let token = session.map(|s| s.token.as_str());
        let result: Value = self
            .api
            .request(Method::GET, &format!("/blogs/{}", post_id), token, None)
            .await?;
        Self::parse_post(result)
    }

    /// Publishes a post. Only doctors and admins write for the blog.
    #[instrument(skip(self, request, session), fields(user_id = %session.user_id()))]
    pub async fn create_post(
        &self,
        request: &CreateBlogRequest,
        session: &Session,
    ) -> Result<BlogPost, BlogError> {
        if session.role() == Role::Patient {
            return Err(BlogError::Forbidden(
                "Only doctors can publish blog posts".to_string(),
            ));
        }
        request.validate()?;

        let post = self
            .send_for_post(Method::POST, "/blogs", session, Some(Self::to_body(request)?))
            .await?;
        info!("Published blog post {}", post.id);
        Ok(post)
    }

    #[instrument(skip(self, request, session))]
    pub async fn update_post(
        &self,
        post_id: &str,
        request: &UpdateBlogRequest,
        session: &Session,
    ) -> Result<BlogPost, BlogError> {
        request.validate()?;
        self.send_for_post(
            Method::PUT,
            &format!("/blogs/{}", post_id),
            session,
            Some(Self::to_body(request)?),
        )
        .await
    }

    #[instrument(skip(self, session))]
    pub async fn delete_post(&self, post_id: &str, session: &Session) -> Result<(), BlogError> {
        self.api
            .request_empty(
                Method::DELETE,
                &format!("/blogs/{}", post_id),
                Some(&session.token),
                None,
            )
            .await?;
        info!("Deleted blog post {}", post_id);
        Ok(())
    }

    /// Likes the post, or removes the like if the user already gave one.
    #[instrument(skip(self, session), fields(user_id = %session.user_id()))]
    pub async fn toggle_like(&self, post_id: &str, session: &Session) -> Result<BlogPost, BlogError> {
        self.send_for_post(Method::POST, &format!("/blogs/{}/like", post_id), session, None)
            .await
    }

    #[instrument(skip(self, text, session))]
    pub async fn add_comment(
        &self,
        post_id: &str,
        text: &str,
        session: &Session,
    ) -> Result<BlogPost, BlogError> {
        let request = CommentRequest::new(text)?;
        self.send_for_post(
            Method::POST,
            &format!("/blogs/{}/comments", post_id),
            session,
            Some(Self::to_body(&request)?),
        )
        .await
    }

    #[instrument(skip(self, text, session))]
    pub async fn update_comment(
        &self,
        post_id: &str,
        comment_id: &str,
        text: &str,
        session: &Session,
    ) -> Result<BlogPost, BlogError> {
        let request = CommentRequest::new(text)?;
        self.send_for_post(
            Method::PUT,
            &format!("/blogs/{}/comments/{}", post_id, comment_id),
            session,
            Some(Self::to_body(&request)?),
        )
        .await
    }

    #[instrument(skip(self, session))]
    pub async fn delete_comment(
        &self,
        post_id: &str,
        comment_id: &str,
        session: &Session,
    ) -> Result<BlogPost, BlogError> {
        self.send_for_post(
            Method::DELETE,
            &format!("/blogs/{}/comments/{}", post_id, comment_id),
            session,
            None,
        )
        .await
    }
}
