mod dto;
pub mod handlers;
pub mod repo;
pub mod repo_types;
mod services;

pub use dto::NewJob;

use crate::state::AppState;
use axum::Router;

pub fn router() -> Router<AppState> {
    handlers::job_routes()
}
