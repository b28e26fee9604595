pub mod auth;
pub mod catalog;
pub mod config;
pub mod domain;
pub mod errors;
pub mod validation;

pub use auth::{ApiKeyAuthenticator, ApiUser};
pub use catalog::repository::{CatalogRepository, StoreError, UniqueConstraint};
pub use catalog::CatalogService;
pub use domain::ingredient::{Ingredient, IngredientId};
pub use domain::pizza::{Pizza, PizzaId, PizzaIngredient, PizzaIngredientId, PREPARATION_COST_FACTOR};
pub use domain::translation::{Locale, Translatable, Translation, Translations};
pub use errors::{ApplicationError, DomainError, InterfaceError, MissingResource, ValidationError};
