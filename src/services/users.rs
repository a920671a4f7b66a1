use std::sync::Arc;

use chrono::Utc;
use uuid::Uuid;

use crate::{
    db::UserStore,
    error::{AppError, AppResult},
    models::{HistoryEntry, HistoryUpdate, User, WatchlistItem},
};

/// Watchlist and watch-history operations on a user's record
#[derive(Clone)]
pub struct UserService {
    users: Arc<dyn UserStore>,
}

impl UserService {
    pub fn new(users: Arc<dyn UserStore>) -> Self {
        Self { users }
    }

    async fn load(&self, user_id: Uuid) -> AppResult<User> {
        self.users
            .find_by_id(user_id)
            .await?
            .ok_or_else(|| AppError::NotFound("User not found".to_string()))
    }

    pub async fn watchlist(&self, user_id: Uuid) -> AppResult<Vec<WatchlistItem>> {
        Ok(self.load(user_id).await?.watchlist)
    }

    pub async fn add_to_watchlist(
        &self,
        user_id: Uuid,
        item: WatchlistItem,
    ) -> AppResult<Vec<WatchlistItem>> {
        let mut user = self.load(user_id).await?;
        let item_id = item.id.clone();
        user.add_to_watchlist(item)?;
        self.users.save(&user).await?;

        tracing::debug!(user_id = %user_id, item_id = %item_id, "Added to watchlist");
        Ok(user.watchlist)
    }

    pub async fn remove_from_watchlist(
        &self,
        user_id: Uuid,
        item_id: &str,
    ) -> AppResult<Vec<WatchlistItem>> {
        let mut user = self.load(user_id).await?;
        user.remove_from_watchlist(item_id);
        self.users.save(&user).await?;
        Ok(user.watchlist)
    }

    pub async fn watch_history(&self, user_id: Uuid) -> AppResult<Vec<HistoryEntry>> {
        Ok(self.load(user_id).await?.watch_history)
    }

    pub async fn record_history(
        &self,
        user_id: Uuid,
        update: HistoryUpdate,
    ) -> AppResult<Vec<HistoryEntry>> {
        let mut user = self.load(user_id).await?;
        let content_id = update.id.clone();
        let last_time = update.last_time;
        user.record_history(update, Utc::now());
        self.users.save(&user).await?;

        tracing::debug!(
            user_id = %user_id,
            content_id = %content_id,
            last_time = last_time,
            history_len = user.watch_history.len(),
            "Recorded watch position"
        );
        Ok(user.watch_history)
    }

    pub async fn remove_from_history(
        &self,
        user_id: Uuid,
        content_id: &str,
    ) -> AppResult<Vec<HistoryEntry>> {
        let mut user = self.load(user_id).await?;
        user.remove_from_history(content_id);
        self.users.save(&user).await?;
        Ok(user.watch_history)
    }
}
