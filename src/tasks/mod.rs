pub mod dto;
pub mod handlers;
pub mod repo;

use crate::state::AppState;
use axum::{
    routing::{get, post},
    Router,
};

pub fn router() -> Router<AppState> {
    Router::new()
        // Report route lives under /users for historical API compatibility.
        .route("/users/tasks", get(handlers::user_worklogs))
        .route("/tasks/start", post(handlers::start_task))
        .route("/tasks/:id/stop", post(handlers::stop_task))
}
