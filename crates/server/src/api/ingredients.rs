use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use serde_json::Value;

use pizzeria_core::catalog::commands::{CreateIngredient, UpdateIngredient};

use super::error::ApiError;
use super::views::{DeletedView, IngredientView};
use super::{ingredient_id, json_body, ApiState};

pub async fn list(State(state): State<ApiState>) -> Result<Json<Vec<IngredientView>>, ApiError> {
    let ingredients = state.catalog.list_ingredients().await?;
    Ok(Json(ingredients.iter().map(IngredientView::from).collect()))
}

pub async fn show(
    State(state): State<ApiState>,
    Path(id): Path<String>,
) -> Result<Json<IngredientView>, ApiError> {
    let ingredient = state.catalog.get_ingredient(ingredient_id(&id)?).await?;
    Ok(Json(IngredientView::from(&ingredient)))
}

pub async fn create(
    State(state): State<ApiState>,
    body: Result<Json<Value>, JsonRejection>,
) -> Result<(StatusCode, Json<IngredientView>), ApiError> {
    let command = CreateIngredient::parse(&json_body(body)?)?;
    let ingredient = state.catalog.create_ingredient(command).await?;
    Ok((StatusCode::CREATED, Json(IngredientView::from(&ingredient))))
}

pub async fn update(
    State(state): State<ApiState>,
    Path(id): Path<String>,
    body: Result<Json<Value>, JsonRejection>,
) -> Result<Json<IngredientView>, ApiError> {
    let id = ingredient_id(&id)?;
    let command = UpdateIngredient::parse(&json_body(body)?)?;
    let ingredient = state.catalog.update_ingredient(id, command).await?;
    Ok(Json(IngredientView::from(&ingredient)))
}

pub async fn delete(
    State(state): State<ApiState>,
    Path(id): Path<String>,
) -> Result<Json<DeletedView>, ApiError> {
    state.catalog.delete_ingredient(ingredient_id(&id)?).await?;
    Ok(Json(DeletedView { deleted: true }))
}
