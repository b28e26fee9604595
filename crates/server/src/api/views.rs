//! Response shapes. Pizza ingredients are flattened next to their order.
//! Money is emitted as a JSON number rounded from the exact decimal.

use std::collections::BTreeMap;

use rust_decimal::Decimal;
use serde::Serialize;

use pizzeria_core::domain::ingredient::{Ingredient, IngredientId};
use pizzeria_core::domain::pizza::{Pizza, PizzaId, PizzaIngredient};
use pizzeria_core::domain::translation::Locale;

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct IngredientView {
    pub id: Option<IngredientId>,
    pub slug: String,
    #[serde(with = "rust_decimal::serde::float")]
    pub cost: Decimal,
    pub translations: BTreeMap<Locale, String>,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct PizzaIngredientView {
    pub id: Option<IngredientId>,
    pub slug: String,
    #[serde(with = "rust_decimal::serde::float")]
    pub cost: Decimal,
    pub order: u32,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct PizzaView {
    pub id: Option<PizzaId>,
    pub slug: String,
    #[serde(with = "rust_decimal::serde::float")]
    pub price: Decimal,
    pub translations: BTreeMap<Locale, String>,
    pub ingredients: Vec<PizzaIngredientView>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct DeletedView {
    pub deleted: bool,
}

impl From<&Ingredient> for IngredientView {
    fn from(ingredient: &Ingredient) -> Self {
        Self {
            id: ingredient.id,
            slug: ingredient.slug.clone(),
            cost: ingredient.cost,
            translations: ingredient.translations.names(),
        }
    }
}

impl From<&PizzaIngredient> for PizzaIngredientView {
    fn from(association: &PizzaIngredient) -> Self {
        Self {
            id: association.ingredient.id,
            slug: association.ingredient.slug.clone(),
            cost: association.ingredient.cost,
            order: association.order,
        }
    }
}

impl From<&Pizza> for PizzaView {
    fn from(pizza: &Pizza) -> Self {
        Self {
            id: pizza.id,
            slug: pizza.slug.clone(),
            price: pizza.price(),
            translations: pizza.translations.names(),
            ingredients: pizza.pizza_ingredients().iter().map(PizzaIngredientView::from).collect(),
        }
    }
}
