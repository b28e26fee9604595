use std::sync::Arc;

use axum::Router;
use pizzeria_core::auth::ApiKeyAuthenticator;
use pizzeria_core::catalog::CatalogService;
use pizzeria_core::config::{AppConfig, ConfigError, LoadOptions};
use pizzeria_db::{connect_with_settings, migrations, DbPool, SqlCatalogRepository};
use thiserror::Error;
use tracing::info;

use crate::api::ApiState;

pub struct Application {
    pub config: AppConfig,
    pub db_pool: DbPool,
    pub catalog: CatalogService,
    pub authenticator: ApiKeyAuthenticator,
}

#[derive(Debug, Error)]
pub enum BootstrapError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("database connection failed: {0}")]
    DatabaseConnect(#[source] sqlx::Error),
    #[error("database migration failed: {0}")]
    Migration(#[source] sqlx::migrate::MigrateError),
}

impl Application {
    pub fn router(&self) -> Router {
        crate::app(
            ApiState::new(self.catalog.clone(), self.authenticator.clone()),
            self.db_pool.clone(),
        )
    }
}

pub async fn bootstrap(options: LoadOptions) -> Result<Application, BootstrapError> {
    let config = AppConfig::load(options)?;
    bootstrap_with_config(config).await
}

pub async fn bootstrap_with_config(config: AppConfig) -> Result<Application, BootstrapError> {
    info!(
        event_name = "system.bootstrap.start",
        correlation_id = "bootstrap",
        "starting application bootstrap"
    );

    let db_pool = connect_with_settings(
        &config.database.url,
        config.database.max_connections,
        config.database.timeout_secs,
    )
    .await
    .map_err(BootstrapError::DatabaseConnect)?;
    info!(
        event_name = "system.bootstrap.database_connected",
        correlation_id = "bootstrap",
        "database connection established"
    );

    migrations::run_pending(&db_pool).await.map_err(BootstrapError::Migration)?;
    info!(
        event_name = "system.bootstrap.migrations_applied",
        correlation_id = "bootstrap",
        "database migrations applied"
    );

    let catalog = CatalogService::new(Arc::new(SqlCatalogRepository::new(db_pool.clone())));
    let authenticator = ApiKeyAuthenticator::from_config(&config.auth);
    info!(
        event_name = "system.bootstrap.auth_configured",
        correlation_id = "bootstrap",
        api_users = authenticator.user_count(),
        "api key authentication configured"
    );

    Ok(Application { config, db_pool, catalog, authenticator })
}
