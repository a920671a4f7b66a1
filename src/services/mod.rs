pub mod auth;
pub mod comments;
pub mod playback;
pub mod users;

pub use auth::{AuthService, TokenKeys};
pub use comments::CommentService;
pub use users::UserService;
