use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::{ContentType, User};

/// Rating given when the client does not send one
pub const DEFAULT_RATING: f64 = 5.0;

fn default_rating() -> f64 {
    DEFAULT_RATING
}

/// A user comment on a movie or series
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Comment {
    #[serde(rename = "_id")]
    pub id: Uuid,
    pub user_id: Uuid,
    pub user_name: String,
    pub content_id: String,
    pub content_type: ContentType,
    pub text: String,
    /// Stars, fractions allowed
    pub rating: f64,
    pub created_at: DateTime<Utc>,
}

impl Comment {
    /// Builds a comment authored by `author`
    pub fn new(author: &User, request: NewComment) -> Self {
        Self {
            id: Uuid::new_v4(),
            user_id: author.id,
            user_name: author.name.clone(),
            content_id: request.content_id,
            content_type: request.content_type,
            text: request.text,
            rating: request.rating,
            created_at: Utc::now(),
        }
    }

    /// Only the author or an admin may delete a comment
    pub fn can_be_deleted_by(&self, user: &User) -> bool {
        self.user_id == user.id || user.is_admin
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewComment {
    pub content_id: String,
    pub content_type: ContentType,
    #[serde(default)]
    pub text: String,
    #[serde(default = "default_rating")]
    pub rating: f64,
}
