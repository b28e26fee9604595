use thiserror::Error;

use pizzeria_core::catalog::repository::{StoreError, UniqueConstraint};

pub mod catalog;
pub mod memory;

pub use catalog::SqlCatalogRepository;
pub use memory::InMemoryCatalogRepository;

#[derive(Debug, Error)]
pub enum RepositoryError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
    #[error("decode error: {0}")]
    Decode(String),
}

impl RepositoryError {
    /// The unique index a failed write tripped over, if any.
    pub fn unique_constraint(&self) -> Option<UniqueConstraint> {
        let Self::Database(error) = self else {
            return None;
        };
        let database_error = error.as_database_error()?;
        if !database_error.is_unique_violation() {
            return None;
        }
        constraint_from_message(database_error.message())
    }
}

impl From<RepositoryError> for StoreError {
    fn from(error: RepositoryError) -> Self {
        match error.unique_constraint() {
            Some(constraint) => StoreError::Conflict(constraint),
            None => StoreError::Backend(error.to_string()),
        }
    }
}

/// SQLite reports `UNIQUE constraint failed: table.column[, table.column]`.
fn constraint_from_message(message: &str) -> Option<UniqueConstraint> {
    let columns = message.rsplit(": ").next().unwrap_or(message);
    if columns.contains("pizza_ingredient.sort_order") {
        Some(UniqueConstraint::PizzaIngredientOrder)
    } else if columns.contains("pizza_ingredient.ingredient_id") {
        Some(UniqueConstraint::PizzaIngredient)
    } else if columns.contains("_translation.") {
        Some(UniqueConstraint::TranslationLocale)
    } else if columns == "pizza.slug" {
        Some(UniqueConstraint::PizzaSlug)
    } else if columns == "ingredient.slug" {
        Some(UniqueConstraint::IngredientSlug)
    } else {
        None
    }
}
