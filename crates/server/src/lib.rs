pub mod api;
pub mod bootstrap;
pub mod health;

use axum::Router;
use pizzeria_core::errors::{ApplicationError, MissingResource};
use pizzeria_db::DbPool;
use tower_http::trace::TraceLayer;

use crate::api::error::ApiError;
use crate::api::ApiState;

/// The full HTTP surface: authenticated catalog API plus the health probe.
pub fn app(state: ApiState, db_pool: DbPool) -> Router {
    let api_users = state.authenticator.user_count();
    api::router(state)
        .merge(health::router(db_pool, api_users))
        .fallback(unknown_route)
        .layer(TraceLayer::new_for_http())
}

async fn unknown_route() -> ApiError {
    ApplicationError::not_found(MissingResource::Route).into()
}
