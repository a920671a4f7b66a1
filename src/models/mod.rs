mod comment;
mod media;
mod user;

pub use comment::{Comment, NewComment, DEFAULT_RATING};
pub use media::{ContentType, HistoryEntry, HistoryUpdate, WatchlistItem, MAX_HISTORY_ITEMS};
pub use user::{AuthResponse, LoginRequest, ProfileUpdate, RegisterRequest, User};
