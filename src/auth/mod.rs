use axum::Router;

use crate::state::AppState;

pub mod claims;
pub mod dto;
pub(crate) mod extractor;
pub mod handlers;
pub mod password;
pub mod repo;

pub use extractor::AuthUser;
pub use repo::{Identity, Role};

pub fn router() -> Router<AppState> {
    handlers::user_routes()
}
