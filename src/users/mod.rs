use crate::state::AppState;
use axum::Router;

pub mod handlers;
#[cfg(test)]
pub mod memory;
pub mod repo;
pub mod repo_types;

/// Admin-only user management routes.
pub fn router(state: AppState) -> Router<AppState> {
    handlers::admin_routes(state)
}
