mod extract;
mod routes;
mod state;

pub use extract::{ApiJson, AuthUser};
pub use routes::{cors_layer, create_router};
pub use state::AppState;
