use crate::state::AppState;
use axum::Router;

mod dto;
pub mod extractors;
pub mod handlers;
pub mod tokens;

pub fn router() -> Router<AppState> {
    handlers::token_routes()
}
