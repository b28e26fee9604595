use axum::{extract::State, http::StatusCode, routing::get, Json, Router};
use chrono::Utc;
use pizzeria_db::{migrations::pending_versions, ping, DbPool};
use serde::Serialize;

#[derive(Clone)]
pub struct HealthState {
    db_pool: DbPool,
    api_users: usize,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct HealthCheck {
    pub status: &'static str,
    pub detail: String,
}

/// Whether the catalog can serve requests: the store answers, its schema is
/// current, and at least one API key can authenticate.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub database: HealthCheck,
    pub schema: HealthCheck,
    pub api_users: usize,
    pub checked_at: String,
}

/// Unauthenticated readiness check.
pub fn router(db_pool: DbPool, api_users: usize) -> Router {
    Router::new().route("/health", get(health)).with_state(HealthState { db_pool, api_users })
}

pub async fn health(State(state): State<HealthState>) -> (StatusCode, Json<HealthResponse>) {
    let database = match ping(&state.db_pool).await {
        Ok(()) => ready("catalog store reachable".to_string()),
        Err(error) => degraded(format!("catalog store unreachable: {error}")),
    };
    let schema = match pending_versions(&state.db_pool).await {
        Ok(pending) if pending.is_empty() => ready("all catalog migrations applied".to_string()),
        Ok(pending) => degraded(format!("pending catalog migrations: {pending:?}")),
        Err(error) => degraded(format!("migration state unavailable: {error}")),
    };

    let ready = database.status == "ready" && schema.status == "ready" && state.api_users > 0;
    let payload = HealthResponse {
        status: if ready { "ready" } else { "degraded" },
        database,
        schema,
        api_users: state.api_users,
        checked_at: Utc::now().to_rfc3339(),
    };

    let status_code = if ready { StatusCode::OK } else { StatusCode::SERVICE_UNAVAILABLE };
    (status_code, Json(payload))
}

fn ready(detail: String) -> HealthCheck {
    HealthCheck { status: "ready", detail }
}

fn degraded(detail: String) -> HealthCheck {
    HealthCheck { status: "degraded", detail }
}
