pub mod chat;
mod health;

use axum::routing::{get, post};
use axum::Router;

use crate::state::AppState;

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health::health))
        .route("/chat", post(chat::handle))
        .with_state(state)
}
