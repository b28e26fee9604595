//! JSON API over the catalog service.

pub mod auth;
pub mod error;
pub mod ingredients;
pub mod pizzas;
pub mod views;

use std::sync::Arc;

use axum::extract::rejection::JsonRejection;
use axum::middleware::from_fn_with_state;
use axum::routing::{get, post, put};
use axum::{Json, Router};
use serde_json::Value;

use pizzeria_core::auth::ApiKeyAuthenticator;
use pizzeria_core::catalog::CatalogService;
use pizzeria_core::domain::ingredient::IngredientId;
use pizzeria_core::domain::pizza::PizzaId;
use pizzeria_core::errors::{ApplicationError, MissingResource};

use self::error::ApiError;

#[derive(Clone)]
pub struct ApiState {
    pub catalog: CatalogService,
    pub authenticator: Arc<ApiKeyAuthenticator>,
}

impl ApiState {
    pub fn new(catalog: CatalogService, authenticator: ApiKeyAuthenticator) -> Self {
        Self { catalog, authenticator: Arc::new(authenticator) }
    }
}

pub fn router(state: ApiState) -> Router {
    Router::new()
        .route("/api/ingredients", get(ingredients::list).post(ingredients::create))
        .route(
            "/api/ingredients/{id}",
            get(ingredients::show).put(ingredients::update).delete(ingredients::delete),
        )
        .route("/api/pizzas", get(pizzas::list).post(pizzas::create))
        .route("/api/pizzas/{id}", get(pizzas::show).put(pizzas::update).delete(pizzas::delete))
        .route("/api/pizzas/{id}/ingredients", post(pizzas::attach_ingredient))
        .route(
            "/api/pizzas/{pizza}/ingredients/{ingredient}",
            put(pizzas::edit_association_order).delete(pizzas::remove_association),
        )
        .route_layer(from_fn_with_state(state.clone(), auth::require_api_key))
        .with_state(state)
}

/// A body that is not JSON at all is reported the same way as a body that is
/// JSON but not an object.
pub(crate) fn json_body(body: Result<Json<Value>, JsonRejection>) -> Result<Value, ApiError> {
    body.map(|Json(value)| value).map_err(|_| ApiError::malformed_body())
}

/// Ids in the path that are not integers name nothing that can exist.
pub(crate) fn ingredient_id(raw: &str) -> Result<IngredientId, ApiError> {
    raw.parse()
        .map(IngredientId)
        .map_err(|_| ApplicationError::not_found(MissingResource::Ingredient(raw.to_owned())).into())
}

pub(crate) fn pizza_id(raw: &str) -> Result<PizzaId, ApiError> {
    raw.parse()
        .map(PizzaId)
        .map_err(|_| ApplicationError::not_found(MissingResource::Pizza(raw.to_owned())).into())
}
