use std::fmt;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::domain::ingredient::Ingredient;
use crate::domain::translation::{Translatable, Translations};
use crate::errors::{DomainError, MissingResource, ValidationError};
use crate::validation::messages;

/// Multiplier applied to the summed ingredient cost to obtain the sale price.
pub const PREPARATION_COST_FACTOR: Decimal = Decimal::from_parts(15, 0, 0, false, 1); // 1.5

/// Order given to an association when nothing else decides it.
pub const DEFAULT_ORDER: u32 = 1;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct PizzaId(pub i64);

impl fmt::Display for PizzaId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct PizzaIngredientId(pub i64);

/// One ingredient placed on a pizza at a display position. Owned by the pizza.
#[derive(Clone, Debug, PartialEq)]
pub struct PizzaIngredient {
    pub id: Option<PizzaIngredientId>,
    pub ingredient: Ingredient,
    pub order: u32,
}

impl PizzaIngredient {
    pub fn new(ingredient: Ingredient, order: u32) -> Self {
        Self { id: None, ingredient, order }
    }
}

/// A pizza and the ordered ingredients it owns.
///
/// The association list is kept sorted by `order` and never holds the same
/// ingredient or the same order twice. Stored associations dropped since the
/// pizza was loaded are remembered so a save can delete exactly those rows.
#[derive(Clone, Debug, PartialEq)]
pub struct Pizza {
    pub id: Option<PizzaId>,
    pub slug: String,
    pub created_at: DateTime<Utc>,
    pub translations: Translations,
    pizza_ingredients: Vec<PizzaIngredient>,
    removed: Vec<PizzaIngredientId>,
}

impl Pizza {
    pub fn new(slug: impl Into<String>) -> Self {
        Self {
            id: None,
            slug: slug.into(),
            created_at: Utc::now(),
            translations: Translations::default(),
            pizza_ingredients: Vec::new(),
            removed: Vec::new(),
        }
    }

    /// Rebuilds a stored pizza. Storage enforces the uniqueness constraints,
    /// so the rows are only sorted here.
    pub fn restore(
        id: PizzaId,
        slug: String,
        created_at: DateTime<Utc>,
        translations: Translations,
        mut pizza_ingredients: Vec<PizzaIngredient>,
    ) -> Self {
        pizza_ingredients.sort_by_key(|association| association.order);
        Self {
            id: Some(id),
            slug,
            created_at,
            translations,
            pizza_ingredients,
            removed: Vec::new(),
        }
    }

    pub fn with_names<I, L, N>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = (L, N)>,
        L: AsRef<str>,
        N: Into<String>,
    {
        for (locale, name) in names {
            self.translate(locale.as_ref()).set_name(name);
        }
        self.merge_new_translations();
        self
    }

    pub fn pizza_ingredients(&self) -> &[PizzaIngredient] {
        &self.pizza_ingredients
    }

    /// Stored associations removed since load, in removal order.
    pub fn removed_associations(&self) -> &[PizzaIngredientId] {
        &self.removed
    }

    pub fn ingredients(&self) -> impl Iterator<Item = &Ingredient> {
        self.pizza_ingredients.iter().map(|association| &association.ingredient)
    }

    pub fn association(&self, ingredient: &Ingredient) -> Option<&PizzaIngredient> {
        self.pizza_ingredients.iter().find(|association| association.ingredient.is_same(ingredient))
    }

    pub fn has_ingredient(&self, ingredient: &Ingredient) -> bool {
        self.association(ingredient).is_some()
    }

    pub fn has_order(&self, order: u32) -> bool {
        self.pizza_ingredients.iter().any(|association| association.order == order)
    }

    /// Highest current order plus one. Gaps left by removals are not reused.
    pub fn next_order(&self) -> u32 {
        self.pizza_ingredients
            .iter()
            .map(|association| association.order)
            .max()
            .map_or(DEFAULT_ORDER, |max| max.saturating_add(1))
    }

    /// Places `ingredient` at `order`, or after the current last one when no
    /// order is given.
    ///
    /// Adding an ingredient that is already present, or targeting an occupied
    /// order, leaves the pizza untouched and returns `false`.
    pub fn add_ingredient(&mut self, ingredient: Ingredient, order: Option<u32>) -> bool {
        let order = order.unwrap_or_else(|| self.next_order());
        if self.has_ingredient(&ingredient) || self.has_order(order) {
            return false;
        }

        let position =
            self.pizza_ingredients.partition_point(|association| association.order < order);
        self.pizza_ingredients.insert(position, PizzaIngredient::new(ingredient, order));
        true
    }

    /// Replaces every association; the result is numbered `1..=N` in input
    /// order with repeated ingredients collapsed to their first occurrence.
    /// Every stored association is dropped, even for ingredients that stay.
    pub fn set_ingredients<I>(&mut self, ingredients: I)
    where
        I: IntoIterator<Item = Ingredient>,
    {
        for association in self.pizza_ingredients.drain(..) {
            self.removed.extend(association.id);
        }
        for ingredient in ingredients {
            self.add_ingredient(ingredient, None);
        }
    }

    /// Moves an existing association to `order`. Unlike
    /// [`Pizza::add_ingredient`], a collision is reported instead of ignored.
    pub fn edit_association_order(
        &mut self,
        ingredient: &Ingredient,
        order: u32,
    ) -> Result<(), DomainError> {
        let index = self.position_of(ingredient)?;

        let taken = self
            .pizza_ingredients
            .iter()
            .enumerate()
            .any(|(other, association)| other != index && association.order == order);
        if taken {
            return Err(ValidationError::new("order", messages::ORDER_TAKEN).into());
        }

        if let Some(association) = self.pizza_ingredients.get_mut(index) {
            association.order = order;
        }
        self.pizza_ingredients.sort_by_key(|association| association.order);
        Ok(())
    }

    /// Drops the association for `ingredient`. Remaining orders keep their gaps.
    pub fn remove_association(
        &mut self,
        ingredient: &Ingredient,
    ) -> Result<PizzaIngredient, DomainError> {
        let index = self.position_of(ingredient)?;
        let association = self.pizza_ingredients.remove(index);
        self.removed.extend(association.id);
        Ok(association)
    }

    /// Sum of the current ingredient costs times [`PREPARATION_COST_FACTOR`].
    pub fn price(&self) -> Decimal {
        let cost: Decimal =
            self.pizza_ingredients.iter().map(|association| association.ingredient.cost).sum();
        (cost * PREPARATION_COST_FACTOR).normalize()
    }

    fn position_of(&self, ingredient: &Ingredient) -> Result<usize, DomainError> {
        self.pizza_ingredients
            .iter()
            .position(|association| association.ingredient.is_same(ingredient))
            .ok_or_else(|| {
                DomainError::NotFound(MissingResource::Association {
                    pizza: self.slug.clone(),
                    ingredient: ingredient.slug.clone(),
                })
            })
    }
}

impl Translatable for Pizza {
    fn translations(&self) -> &Translations {
        &self.translations
    }

    fn translations_mut(&mut self) -> &mut Translations {
        &mut self.translations
    }
}

impl fmt::Display for Pizza {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.slug)
    }
}
