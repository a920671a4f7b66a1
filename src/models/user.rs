use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::{HistoryEntry, HistoryUpdate, WatchlistItem, MAX_HISTORY_ITEMS};
use crate::error::{AppError, AppResult};

/// A registered account together with its watchlist and watch history
#[derive(Debug, Clone, PartialEq)]
pub struct User {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub password_hash: String,
    pub is_admin: bool,
    /// Newest first
    pub watchlist: Vec<WatchlistItem>,
    /// Most recently updated first, at most `MAX_HISTORY_ITEMS` entries
    pub watch_history: Vec<HistoryEntry>,
    pub created_at: DateTime<Utc>,
}

impl User {
    /// Creates a regular (non-admin) user with empty lists
    pub fn new(name: String, email: String, password_hash: String) -> Self {
        Self {
            id: Uuid::new_v4(),
            name,
            email,
            password_hash,
            is_admin: false,
            watchlist: Vec::new(),
            watch_history: Vec::new(),
            created_at: Utc::now(),
        }
    }

    /// Puts an item at the front of the watchlist, rejecting duplicate ids
    pub fn add_to_watchlist(&mut self, item: WatchlistItem) -> AppResult<()> {
        if self.watchlist.iter().any(|existing| existing.id == item.id) {
            return Err(AppError::InvalidInput(
                "Item already in watchlist".to_string(),
            ));
        }

        self.watchlist.insert(0, item);
        Ok(())
    }

    /// Removes the item with the given id; unknown ids are ignored
    pub fn remove_from_watchlist(&mut self, id: &str) {
        self.watchlist.retain(|item| item.id != id);
    }

    /// Records a playback position.
    ///
    /// An existing entry gets its position refreshed and moves to the front,
    /// otherwise a new entry is inserted at the front. When the list grows past
    /// `MAX_HISTORY_ITEMS` the oldest entry is dropped.
    pub fn record_history(&mut self, update: HistoryUpdate, now: DateTime<Utc>) {
        match self
            .watch_history
            .iter()
            .position(|entry| entry.id == update.id)
        {
            Some(index) => {
                let mut entry = self.watch_history.remove(index);
                entry.last_time = update.last_time;
                entry.duration = update.duration;
                entry.updated_at = now;
                self.watch_history.insert(0, entry);
            }
            None => {
                self.watch_history
                    .insert(0, HistoryEntry::from_update(update, now));
            }
        }

        if self.watch_history.len() > MAX_HISTORY_ITEMS {
            self.watch_history.pop();
        }
    }

    /// Removes the history entry with the given id; unknown ids are ignored
    pub fn remove_from_history(&mut self, id: &str) {
        self.watch_history.retain(|entry| entry.id != id);
    }
}

/// Body returned by login, register and profile update
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct AuthResponse {
    #[serde(rename = "_id")]
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub is_admin: bool,
    pub token: String,
}

impl AuthResponse {
    pub fn new(user: &User, token: String) -> Self {
        Self {
            id: user.id,
            name: user.name.clone(),
            email: user.email.clone(),
            is_admin: user.is_admin,
            token,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoginRequest {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RegisterRequest {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
}

/// Profile changes; empty or missing fields keep the current value
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ProfileUpdate {
    pub name: Option<String>,
    pub email: Option<String>,
    pub password: Option<String>,
}
