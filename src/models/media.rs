use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::{fmt::Display, str::FromStr};

/// Maximum number of entries kept in a user's watch history
pub const MAX_HISTORY_ITEMS: usize = 20;

/// Kind of content a comment is attached to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ContentType {
    Movie,
    Tv,
}

impl ContentType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ContentType::Movie => "movie",
            ContentType::Tv => "tv",
        }
    }
}

impl Display for ContentType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ContentType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "movie" => Ok(ContentType::Movie),
            "tv" => Ok(ContentType::Tv),
            other => Err(format!("Unknown content type: {}", other)),
        }
    }
}

/// A title saved to the user's watchlist
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct WatchlistItem {
    /// Opaque content id from the client catalog
    pub id: String,
    #[serde(rename = "type", default)]
    pub kind: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub poster_url: String,
}

/// Playback position report sent by the player
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct HistoryUpdate {
    pub id: String,
    #[serde(rename = "type", default)]
    pub kind: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub poster_url: String,
    /// Position in seconds
    #[serde(default)]
    pub last_time: f64,
    /// Total length in seconds
    #[serde(default)]
    pub duration: f64,
}

/// A recently watched title with its resume position
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct HistoryEntry {
    pub id: String,
    #[serde(rename = "type", default)]
    pub kind: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub poster_url: String,
    pub last_time: f64,
    pub duration: f64,
    pub updated_at: DateTime<Utc>,
}

impl HistoryEntry {
    pub fn from_update(update: HistoryUpdate, now: DateTime<Utc>) -> Self {
        Self {
            id: update.id,
            kind: update.kind,
            title: update.title,
            poster_url: update.poster_url,
            last_time: update.last_time,
            duration: update.duration,
            updated_at: now,
        }
    }
}
