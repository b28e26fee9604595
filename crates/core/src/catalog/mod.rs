//! Catalog operations over ingredients, pizzas and their ordered associations.
//!
//! Every operation loads what it needs from the repository and persists the
//! result before returning. Slug and association checks here are optimistic;
//! the repository's unique constraints remain the backstop and surface as the
//! same validation messages.

pub mod commands;
pub mod repository;

use std::sync::Arc;

use tracing::info;

use crate::catalog::commands::{
    AttachIngredient, CreateIngredient, CreatePizza, EditAssociationOrder, UpdateIngredient,
    UpdatePizza,
};
use crate::catalog::repository::CatalogRepository;
use crate::domain::ingredient::{Ingredient, IngredientId};
use crate::domain::pizza::{Pizza, PizzaId};
use crate::errors::{ApplicationError, MissingResource, ValidationError};
use crate::validation::messages;

#[derive(Clone)]
pub struct CatalogService {
    repository: Arc<dyn CatalogRepository>,
}

impl CatalogService {
    pub fn new(repository: Arc<dyn CatalogRepository>) -> Self {
        Self { repository }
    }

    pub async fn list_ingredients(&self) -> Result<Vec<Ingredient>, ApplicationError> {
        Ok(self.repository.list_ingredients().await?)
    }

    pub async fn get_ingredient(&self, id: IngredientId) -> Result<Ingredient, ApplicationError> {
        self.repository
            .find_ingredient(id)
            .await?
            .ok_or_else(|| ApplicationError::not_found(MissingResource::Ingredient(id.to_string())))
    }

    pub async fn create_ingredient(
        &self,
        command: CreateIngredient,
    ) -> Result<Ingredient, ApplicationError> {
        self.ensure_ingredient_slug_free(&command.slug, None).await?;

        let ingredient =
            Ingredient::new(command.slug, command.cost).with_names(&command.translations);
        let saved = self.repository.save_ingredient(ingredient).await?;

        info!(
            event_name = "catalog.ingredient.created",
            ingredient_id = ?saved.id,
            slug = %saved.slug,
            "ingredient created"
        );
        Ok(saved)
    }

    pub async fn update_ingredient(
        &self,
        id: IngredientId,
        command: UpdateIngredient,
    ) -> Result<Ingredient, ApplicationError> {
        let mut ingredient = self.get_ingredient(id).await?;

        if let Some(slug) = command.slug {
            self.ensure_ingredient_slug_free(&slug, Some(id)).await?;
            ingredient.slug = slug;
        }
        if let Some(cost) = command.cost {
            ingredient.cost = cost;
        }
        ingredient.translations.upsert_names(&command.translations);

        let saved = self.repository.save_ingredient(ingredient).await?;
        info!(event_name = "catalog.ingredient.updated", ingredient_id = %id, "ingredient updated");
        Ok(saved)
    }

    /// Deleting an ingredient also detaches it from every pizza.
    pub async fn delete_ingredient(&self, id: IngredientId) -> Result<(), ApplicationError> {
        if !self.repository.delete_ingredient(id).await? {
            return Err(ApplicationError::not_found(MissingResource::Ingredient(id.to_string())));
        }

        info!(event_name = "catalog.ingredient.deleted", ingredient_id = %id, "ingredient deleted");
        Ok(())
    }

    pub async fn list_pizzas(&self) -> Result<Vec<Pizza>, ApplicationError> {
        Ok(self.repository.list_pizzas().await?)
    }

    pub async fn get_pizza(&self, id: PizzaId) -> Result<Pizza, ApplicationError> {
        self.repository
            .find_pizza(id)
            .await?
            .ok_or_else(|| ApplicationError::not_found(MissingResource::Pizza(id.to_string())))
    }

    pub async fn create_pizza(&self, command: CreatePizza) -> Result<Pizza, ApplicationError> {
        self.ensure_pizza_slug_free(&command.slug, None).await?;
        let ingredients = self.resolve_ingredients(&command.ingredients).await?;

        let mut pizza = Pizza::new(command.slug).with_names(&command.translations);
        pizza.set_ingredients(ingredients);
        let saved = self.repository.save_pizza(pizza).await?;

        info!(
            event_name = "catalog.pizza.created",
            pizza_id = ?saved.id,
            slug = %saved.slug,
            ingredient_count = saved.pizza_ingredients().len(),
            "pizza created"
        );
        Ok(saved)
    }

    pub async fn update_pizza(
        &self,
        id: PizzaId,
        command: UpdatePizza,
    ) -> Result<Pizza, ApplicationError> {
        let mut pizza = self.get_pizza(id).await?;

        if let Some(slug) = command.slug {
            self.ensure_pizza_slug_free(&slug, Some(id)).await?;
            pizza.slug = slug;
        }
        pizza.translations.upsert_names(&command.translations);
        if let Some(ids) = command.ingredients {
            let ingredients = self.resolve_ingredients(&ids).await?;
            pizza.set_ingredients(ingredients);
        }

        let saved = self.repository.save_pizza(pizza).await?;
        info!(event_name = "catalog.pizza.updated", pizza_id = %id, "pizza updated");
        Ok(saved)
    }

    pub async fn delete_pizza(&self, id: PizzaId) -> Result<(), ApplicationError> {
        if !self.repository.delete_pizza(id).await? {
            return Err(ApplicationError::not_found(MissingResource::Pizza(id.to_string())));
        }

        info!(event_name = "catalog.pizza.deleted", pizza_id = %id, "pizza deleted");
        Ok(())
    }

    /// Explicit attach: conflicts are reported instead of being ignored the
    /// way [`Pizza::add_ingredient`] ignores them.
    pub async fn attach_ingredient(
        &self,
        pizza_id: PizzaId,
        command: AttachIngredient,
    ) -> Result<Pizza, ApplicationError> {
        let mut pizza = self.get_pizza(pizza_id).await?;
        let ingredient = self
            .repository
            .find_ingredient(command.ingredient)
            .await?
            .ok_or_else(|| ValidationError::new("ingredient", messages::INGREDIENT_UNKNOWN))?;

        if pizza.has_ingredient(&ingredient) {
            return Err(
                ValidationError::new("ingredient", messages::INGREDIENT_ALREADY_ATTACHED).into()
            );
        }
        if let Some(order) = command.order {
            if pizza.has_order(order) {
                return Err(ValidationError::new("order", messages::ORDER_TAKEN).into());
            }
        }

        pizza.add_ingredient(ingredient, command.order);
        let saved = self.repository.save_pizza(pizza).await?;

        info!(
            event_name = "catalog.pizza.ingredient_attached",
            pizza_id = %pizza_id,
            ingredient_id = %command.ingredient,
            "ingredient attached"
        );
        Ok(saved)
    }

    pub async fn edit_association_order(
        &self,
        pizza_id: PizzaId,
        ingredient_id: IngredientId,
        command: EditAssociationOrder,
    ) -> Result<Pizza, ApplicationError> {
        let mut pizza = self.get_pizza(pizza_id).await?;
        let ingredient = self.get_ingredient(ingredient_id).await?;

        pizza.edit_association_order(&ingredient, command.order)?;
        let saved = self.repository.save_pizza(pizza).await?;

        info!(
            event_name = "catalog.pizza.association_reordered",
            pizza_id = %pizza_id,
            ingredient_id = %ingredient_id,
            order = command.order,
            "association order edited"
        );
        Ok(saved)
    }

    pub async fn remove_association(
        &self,
        pizza_id: PizzaId,
        ingredient_id: IngredientId,
    ) -> Result<Pizza, ApplicationError> {
        let mut pizza = self.get_pizza(pizza_id).await?;
        let ingredient = self.get_ingredient(ingredient_id).await?;

        pizza.remove_association(&ingredient)?;
        let saved = self.repository.save_pizza(pizza).await?;

        info!(
            event_name = "catalog.pizza.association_removed",
            pizza_id = %pizza_id,
            ingredient_id = %ingredient_id,
            "association removed"
        );
        Ok(saved)
    }

    async fn resolve_ingredients(
        &self,
        ids: &[IngredientId],
    ) -> Result<Vec<Ingredient>, ApplicationError> {
        let mut ingredients = Vec::with_capacity(ids.len());
        for id in ids {
            let ingredient = self
                .repository
                .find_ingredient(*id)
                .await?
                .ok_or_else(|| ValidationError::new("ingredients", messages::INGREDIENT_UNKNOWN))?;
            ingredients.push(ingredient);
        }
        Ok(ingredients)
    }

    async fn ensure_ingredient_slug_free(
        &self,
        slug: &str,
        owner: Option<IngredientId>,
    ) -> Result<(), ApplicationError> {
        match self.repository.find_ingredient_by_slug(slug).await? {
            Some(existing) if existing.id != owner => {
                Err(ValidationError::new("slug", messages::INGREDIENT_SLUG_TAKEN).into())
            }
            _ => Ok(()),
        }
    }

    async fn ensure_pizza_slug_free(
        &self,
        slug: &str,
        owner: Option<PizzaId>,
    ) -> Result<(), ApplicationError> {
        match self.repository.find_pizza_by_slug(slug).await? {
            Some(existing) if existing.id != owner => {
                Err(ValidationError::new("slug", messages::PIZZA_SLUG_TAKEN).into())
            }
            _ => Ok(()),
        }
    }
}
