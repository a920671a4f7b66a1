use async_trait::async_trait;
use uuid::Uuid;

use crate::{
    error::{AppError, AppResult},
    models::{Comment, User},
};

pub mod memory;
pub mod postgres;

pub use memory::MemoryStore;
pub use postgres::{create_pool, run_migrations, PgStore};

/// Error for an email that already belongs to another account
pub fn email_taken() -> AppError {
    AppError::InvalidInput("User already exists".to_string())
}

/// Persistence for user accounts.
///
/// Watchlist and watch history travel with the user record: callers load a
/// user, mutate it and hand it back to `save`. There is no locking between the
/// two steps, so concurrent writers to the same user race and the last save wins.
///
/// Emails are unique across accounts. `insert` and `save` fail with
/// [`email_taken`] when another record already holds the email.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait UserStore: Send + Sync {
    async fn find_by_id(&self, id: Uuid) -> AppResult<Option<User>>;

    async fn find_by_email(&self, email: &str) -> AppResult<Option<User>>;

    async fn insert(&self, user: &User) -> AppResult<()>;

    /// Overwrites the stored record with the same id
    async fn save(&self, user: &User) -> AppResult<()>;

    async fn count(&self) -> AppResult<usize>;

    async fn delete_all(&self) -> AppResult<()>;
}

/// Persistence for comments
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait CommentStore: Send + Sync {
    async fn insert(&self, comment: &Comment) -> AppResult<()>;

    async fn find_by_id(&self, id: Uuid) -> AppResult<Option<Comment>>;

    /// All comments for a content id, newest first
    async fn find_by_content(&self, content_id: &str) -> AppResult<Vec<Comment>>;

    async fn delete(&self, id: Uuid) -> AppResult<()>;
}
