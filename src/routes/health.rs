use axum::extract::State;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;

use crate::state::AppState;

#[derive(Serialize)]
struct HealthBody {
    status: &'static str,
    database: &'static str,
}

pub async fn health(State(state): State<AppState>) -> Response {
    let database = match sqlx::query("SELECT 1").execute(state.pool()).await {
        Ok(_) => "ok",
        Err(_) => "unavailable",
    };

    Json(HealthBody {
        status: "ok",
        database,
    })
    .into_response()
}
