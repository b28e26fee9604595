use async_trait::async_trait;
use thiserror::Error;

use crate::domain::ingredient::{Ingredient, IngredientId};
use crate::domain::pizza::{Pizza, PizzaId};
use crate::validation::messages;

/// Unique indexes the store enforces underneath the catalog's own pre-checks.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum UniqueConstraint {
    IngredientSlug,
    PizzaSlug,
    PizzaIngredient,
    PizzaIngredientOrder,
    TranslationLocale,
}

impl UniqueConstraint {
    pub fn field(&self) -> &'static str {
        match self {
            Self::IngredientSlug | Self::PizzaSlug => "slug",
            Self::PizzaIngredient => "ingredient",
            Self::PizzaIngredientOrder => "order",
            Self::TranslationLocale => "translations",
        }
    }

    pub fn message(&self) -> &'static str {
        match self {
            Self::IngredientSlug => messages::INGREDIENT_SLUG_TAKEN,
            Self::PizzaSlug => messages::PIZZA_SLUG_TAKEN,
            Self::PizzaIngredient => messages::INGREDIENT_ALREADY_ATTACHED,
            Self::PizzaIngredientOrder => messages::ORDER_TAKEN,
            Self::TranslationLocale => messages::LOCALE_INVALID,
        }
    }
}

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum StoreError {
    #[error("unique constraint violated: {0:?}")]
    Conflict(UniqueConstraint),
    #[error("storage backend failure: {0}")]
    Backend(String),
}

/// Persistence port for the catalog. Pizzas are saved and loaded together
/// with their translations and ordered associations; ingredients referenced
/// by a loaded pizza reflect their current stored state.
#[async_trait]
pub trait CatalogRepository: Send + Sync {
    async fn find_ingredient(&self, id: IngredientId) -> Result<Option<Ingredient>, StoreError>;

    async fn find_ingredient_by_slug(&self, slug: &str) -> Result<Option<Ingredient>, StoreError>;

    async fn list_ingredients(&self) -> Result<Vec<Ingredient>, StoreError>;

    /// Inserts when `id` is `None`, otherwise updates. Returns the stored state.
    async fn save_ingredient(&self, ingredient: Ingredient) -> Result<Ingredient, StoreError>;

    /// Removes the ingredient and every association referencing it.
    async fn delete_ingredient(&self, id: IngredientId) -> Result<bool, StoreError>;

    async fn find_pizza(&self, id: PizzaId) -> Result<Option<Pizza>, StoreError>;

    async fn find_pizza_by_slug(&self, slug: &str) -> Result<Option<Pizza>, StoreError>;

    async fn list_pizzas(&self) -> Result<Vec<Pizza>, StoreError>;

    async fn save_pizza(&self, pizza: Pizza) -> Result<Pizza, StoreError>;

    async fn delete_pizza(&self, id: PizzaId) -> Result<bool, StoreError>;
}
