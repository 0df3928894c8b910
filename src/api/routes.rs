//! API route handlers.
//!
//! Handlers only read the caches; they never touch the database.

use axum::{extract::State, Json};
use std::sync::Arc;

use crate::cache::{Caches, RefreshStatus};
use crate::types::{Rate, Score};

pub type AppState = Arc<Caches>;

/// Fixed liveness body for `GET /`.
pub const STATUS_BODY: &str = "Status: live";

/// GET /
pub async fn get_status() -> &'static str {
    STATUS_BODY
}

/// GET /rates
pub async fn get_rates(State(state): State<AppState>) -> Json<Arc<Vec<Rate>>> {
    Json(state.rates.snapshot().await)
}

/// GET /leaders
pub async fn get_leaders(State(state): State<AppState>) -> Json<Arc<Vec<Score>>> {
    Json(state.leaders.snapshot().await)
}

/// GET /health
pub async fn get_health(State(state): State<AppState>) -> Json<RefreshStatus> {
    Json(state.status().await)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
