use crate::state::AppState;
use axum::Router;

pub mod dto;
pub mod handlers;
pub mod model;
pub mod prompt;
pub mod services;

pub fn router() -> Router<AppState> {
    Router::new().merge(handlers::plan_routes())
}
