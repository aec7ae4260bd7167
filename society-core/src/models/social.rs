use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Collection the `author` id points into.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AuthorModel {
    Resident,
    Society,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PostStatus {
    Active,
    Deactivated,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SocialPost {
    pub id: String,
    pub society_id: String,
    pub author: String,
    pub author_model: AuthorModel,
    pub content: String,
    #[serde(default)]
    pub images: Vec<String>,
    #[serde(default)]
    pub likes: Vec<String>,
    pub likes_count: u32,
    /// Ids of active comments.
    #[serde(default)]
    pub comments: Vec<String>,
    pub comments_count: u32,
    pub status: PostStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl SocialPost {
    pub fn is_active(&self) -> bool {
        self.status == PostStatus::Active
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SocialComment {
    pub id: String,
    pub society_id: String,
    pub post_id: String,
    pub author: String,
    pub author_model: AuthorModel,
    pub content: String,
    pub status: PostStatus,
    pub created_at: DateTime<Utc>,
}

impl_document!(SocialPost);
impl_document!(SocialComment);
