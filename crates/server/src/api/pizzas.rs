use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use serde_json::Value;

use pizzeria_core::catalog::commands::{
    AttachIngredient, CreatePizza, EditAssociationOrder, UpdatePizza,
};

use super::error::ApiError;
use super::views::{DeletedView, PizzaView};
use super::{ingredient_id, json_body, pizza_id, ApiState};

pub async fn list(State(state): State<ApiState>) -> Result<Json<Vec<PizzaView>>, ApiError> {
    let pizzas = state.catalog.list_pizzas().await?;
    Ok(Json(pizzas.iter().map(PizzaView::from).collect()))
}

pub async fn show(
    State(state): State<ApiState>,
    Path(id): Path<String>,
) -> Result<Json<PizzaView>, ApiError> {
    let pizza = state.catalog.get_pizza(pizza_id(&id)?).await?;
    Ok(Json(PizzaView::from(&pizza)))
}

pub async fn create(
    State(state): State<ApiState>,
    body: Result<Json<Value>, JsonRejection>,
) -> Result<(StatusCode, Json<PizzaView>), ApiError> {
    let command = CreatePizza::parse(&json_body(body)?)?;
    let pizza = state.catalog.create_pizza(command).await?;
    Ok((StatusCode::CREATED, Json(PizzaView::from(&pizza))))
}

pub async fn update(
    State(state): State<ApiState>,
    Path(id): Path<String>,
    body: Result<Json<Value>, JsonRejection>,
) -> Result<Json<PizzaView>, ApiError> {
    let id = pizza_id(&id)?;
    let command = UpdatePizza::parse(&json_body(body)?)?;
    let pizza = state.catalog.update_pizza(id, command).await?;
    Ok(Json(PizzaView::from(&pizza)))
}

pub async fn delete(
    State(state): State<ApiState>,
    Path(id): Path<String>,
) -> Result<Json<DeletedView>, ApiError> {
    state.catalog.delete_pizza(pizza_id(&id)?).await?;
    Ok(Json(DeletedView { deleted: true }))
}

pub async fn attach_ingredient(
    State(state): State<ApiState>,
    Path(id): Path<String>,
    body: Result<Json<Value>, JsonRejection>,
) -> Result<(StatusCode, Json<PizzaView>), ApiError> {
    let id = pizza_id(&id)?;
    let command = AttachIngredient::parse(&json_body(body)?)?;
    let pizza = state.catalog.attach_ingredient(id, command).await?;
    Ok((StatusCode::CREATED, Json(PizzaView::from(&pizza))))
}

pub async fn edit_association_order(
    State(state): State<ApiState>,
    Path((pizza, ingredient)): Path<(String, String)>,
    body: Result<Json<Value>, JsonRejection>,
) -> Result<Json<PizzaView>, ApiError> {
    let (pizza, ingredient) = (pizza_id(&pizza)?, ingredient_id(&ingredient)?);
    let command = EditAssociationOrder::parse(&json_body(body)?)?;
    let pizza = state.catalog.edit_association_order(pizza, ingredient, command).await?;
    Ok(Json(PizzaView::from(&pizza)))
}

pub async fn remove_association(
    State(state): State<ApiState>,
    Path((pizza, ingredient)): Path<(String, String)>,
) -> Result<Json<PizzaView>, ApiError> {
    let (pizza, ingredient) = (pizza_id(&pizza)?, ingredient_id(&ingredient)?);
    let pizza = state.catalog.remove_association(pizza, ingredient).await?;
    Ok(Json(PizzaView::from(&pizza)))
}
