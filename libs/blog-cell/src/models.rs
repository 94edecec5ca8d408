use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::BlogError;

/// A user referenced from a post. The backend sends either the bare id or a
/// populated `{ _id, name }` object.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(from = "RawUserRef")]
pub struct UserRef {
    pub id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawUserRef {
    Id(String),
    Populated {
        #[serde(alias = "_id")]
        id: String,
        #[serde(default)]
        name: Option<String>,
    },
}

impl From<RawUserRef> for UserRef {
    fn from(raw: RawUserRef) -> Self {
        match raw {
            RawUserRef::Id(id) => UserRef { id, name: None },
            RawUserRef::Populated { id, name } => UserRef { id, name },
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Comment {
    #[serde(alias = "_id")]
    pub id: String,
    pub user: UserRef,
    pub text: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct BlogPost {
    #[serde(alias = "_id")]
    pub id: String,
    pub title: String,
    pub content: String,
    pub author: UserRef,
    #[serde(default)]
    pub likes: Vec<UserRef>,
    #[serde(default)]
    pub comments: Vec<Comment>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
}

impl BlogPost {
    pub fn is_liked_by(&self, user_id: &str) -> bool {
        self.likes.iter().any(|like| like.id == user_id)
    }

    pub fn like_count(&self) -> usize {
        self.likes.len()
    }

    pub fn is_authored_by(&self, user_id: &str) -> bool {
        self.author.id == user_id
    }

    pub fn comment(&self, comment_id: &str) -> Option<&Comment> {
        self.comments.iter().find(|c| c.id == comment_id)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateBlogRequest {
    pub title: String,
    pub content: String,
}

impl CreateBlogRequest {
    pub fn validate(&self) -> Result<(), BlogError> {
        require_text("Title", &self.title)?;
        require_text("Content", &self.content)
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdateBlogRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
}

impl UpdateBlogRequest {
    pub fn validate(&self) -> Result<(), BlogError> {
        if self.title.is_none() && self.content.is_none() {
            return Err(BlogError::Validation("Nothing to update".to_string()));
        }
        if let Some(title) = &self.title {
            require_text("Title", title)?;
        }
        if let Some(content) = &self.content {
            require_text("Content", content)?;
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CommentRequest {
    pub text: String,
}

impl CommentRequest {
    pub fn new(text: &str) -> Result<Self, BlogError> {
        require_text("Comment", text)?;
        Ok(Self {
            text: text.trim().to_string(),
        })
    }
}

fn require_text(field: &str, value: &str) -> Result<(), BlogError> {
    if value.trim().is_empty() {
        return Err(BlogError::Validation(format!("{} cannot be empty", field)));
    }
    Ok(())
}
