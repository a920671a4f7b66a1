use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{postgres::PgPoolOptions, types::Json, FromRow, PgPool};
use uuid::Uuid;

use super::{email_taken, CommentStore, UserStore};
use crate::{
    error::{AppError, AppResult},
    models::{Comment, ContentType, HistoryEntry, User, WatchlistItem},
};

/// Creates a PostgreSQL connection pool
///
/// Establishes a pool of database connections for efficient reuse.
/// The pool automatically manages connection lifecycle and limits.
pub async fn create_pool(database_url: &str) -> anyhow::Result<PgPool> {
    let pool = PgPoolOptions::new()
        .max_connections(5)
        .connect(database_url)
        .await?;

    Ok(pool)
}

/// Applies the schema in `migrations/`
pub async fn run_migrations(pool: &PgPool) -> anyhow::Result<()> {
    sqlx::migrate!("./migrations").run(pool).await?;
    Ok(())
}

#[derive(FromRow)]
struct UserRow {
    id: Uuid,
    name: String,
    email: String,
    password_hash: String,
    is_admin: bool,
    watchlist: Json<Vec<WatchlistItem>>,
    watch_history: Json<Vec<HistoryEntry>>,
    created_at: DateTime<Utc>,
}

impl From<UserRow> for User {
    fn from(row: UserRow) -> Self {
        Self {
            id: row.id,
            name: row.name,
            email: row.email,
            password_hash: row.password_hash,
            is_admin: row.is_admin,
            watchlist: row.watchlist.0,
            watch_history: row.watch_history.0,
            created_at: row.created_at,
        }
    }
}

#[derive(FromRow)]
struct CommentRow {
    id: Uuid,
    user_id: Uuid,
    user_name: String,
    content_id: String,
    content_type: String,
    text: String,
    rating: f64,
    created_at: DateTime<Utc>,
}

impl TryFrom<CommentRow> for Comment {
    type Error = AppError;

    fn try_from(row: CommentRow) -> AppResult<Self> {
        let content_type = row
            .content_type
            .parse::<ContentType>()
            .map_err(AppError::Internal)?;

        Ok(Self {
            id: row.id,
            user_id: row.user_id,
            user_name: row.user_name,
            content_id: row.content_id,
            content_type,
            text: row.text,
            rating: row.rating,
            created_at: row.created_at,
        })
    }
}

/// Turns a violation of the unique email index into a client error
fn map_user_write_error(e: sqlx::Error) -> AppError {
    match &e {
        sqlx::Error::Database(db_err) if db_err.is_unique_violation() => email_taken(),
        _ => AppError::Database(e),
    }
}

const USER_COLUMNS: &str =
    "id, name, email, password_hash, is_admin, watchlist, watch_history, created_at";

const COMMENT_COLUMNS: &str =
    "id, user_id, user_name, content_id, content_type, text, rating, created_at";

/// Store backed by PostgreSQL.
///
/// Watchlist and history are kept as JSONB arrays on the user row so a user
/// is loaded and saved as one unit.
#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl UserStore for PgStore {
    async fn find_by_id(&self, id: Uuid) -> AppResult<Option<User>> {
        let row: Option<UserRow> =
            sqlx::query_as(&format!("SELECT {} FROM users WHERE id = $1", USER_COLUMNS))
                .bind(id)
                .fetch_optional(&self.pool)
                .await?;

        Ok(row.map(User::from))
    }

    async fn find_by_email(&self, email: &str) -> AppResult<Option<User>> {
        let row: Option<UserRow> = sqlx::query_as(&format!(
            "SELECT {} FROM users WHERE email = $1",
            USER_COLUMNS
        ))
        .bind(email)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(User::from))
    }

    async fn insert(&self, user: &User) -> AppResult<()> {
        sqlx::query(
            r#"
            INSERT INTO users
                (id, name, email, password_hash, is_admin, watchlist, watch_history, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            "#,
        )
        .bind(user.id)
        .bind(&user.name)
        .bind(&user.email)
        .bind(&user.password_hash)
        .bind(user.is_admin)
        .bind(Json(&user.watchlist))
        .bind(Json(&user.watch_history))
        .bind(user.created_at)
        .execute(&self.pool)
        .await
        .map_err(map_user_write_error)?;

        tracing::debug!(user_id = %user.id, "Inserted user");
        Ok(())
    }

    async fn save(&self, user: &User) -> AppResult<()> {
        let result = sqlx::query(
            r#"
            UPDATE users
            SET name = $2, email = $3, password_hash = $4, is_admin = $5,
                watchlist = $6, watch_history = $7
            WHERE id = $1
            "#,
        )
        .bind(user.id)
        .bind(&user.name)
        .bind(&user.email)
        .bind(&user.password_hash)
        .bind(user.is_admin)
        .bind(Json(&user.watchlist))
        .bind(Json(&user.watch_history))
        .execute(&self.pool)
        .await
        .map_err(map_user_write_error)?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound("User not found".to_string()));
        }

        Ok(())
    }

    async fn count(&self) -> AppResult<usize> {
        let (count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM users")
            .fetch_one(&self.pool)
            .await?;

        Ok(count as usize)
    }

    async fn delete_all(&self) -> AppResult<()> {
        let result = sqlx::query("DELETE FROM users").execute(&self.pool).await?;
        tracing::info!(deleted = result.rows_affected(), "Deleted all users");
        Ok(())
    }
}

#[async_trait]
impl CommentStore for PgStore {
    async fn insert(&self, comment: &Comment) -> AppResult<()> {
        sqlx::query(
            r#"
            INSERT INTO comments
                (id, user_id, user_name, content_id, content_type, text, rating, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            "#,
        )
        .bind(comment.id)
        .bind(comment.user_id)
        .bind(&comment.user_name)
        .bind(&comment.content_id)
        .bind(comment.content_type.as_str())
        .bind(&comment.text)
        .bind(comment.rating)
        .bind(comment.created_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn find_by_id(&self, id: Uuid) -> AppResult<Option<Comment>> {
        let row: Option<CommentRow> = sqlx::query_as(&format!(
            "SELECT {} FROM comments WHERE id = $1",
            COMMENT_COLUMNS
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        row.map(Comment::try_from).transpose()
    }

    async fn find_by_content(&self, content_id: &str) -> AppResult<Vec<Comment>> {
        let rows: Vec<CommentRow> = sqlx::query_as(&format!(
            "SELECT {} FROM comments WHERE content_id = $1 ORDER BY created_at DESC",
            COMMENT_COLUMNS
        ))
        .bind(content_id)
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(Comment::try_from).collect()
    }

    async fn delete(&self, id: Uuid) -> AppResult<()> {
        sqlx::query("DELETE FROM comments WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(())
    }
}
