//! Typed commands parsed from JSON request bodies.
//!
//! Absent fields and explicit `null` are distinguished: on updates an absent
//! field is left untouched while `null` is checked like any other value.

use std::collections::BTreeMap;

use rust_decimal::Decimal;
use serde_json::{Map, Value};

use crate::domain::ingredient::IngredientId;
use crate::domain::translation::Locale;
use crate::errors::ValidationError;
use crate::validation::{
    as_decimal, as_integer, is_locale, messages, FieldRules, COST_RULES, INGREDIENTS_RULES,
    INGREDIENT_RULES, ORDER_RULES, SLUG_RULES, TRANSLATIONS_RULES,
};

pub type Names = BTreeMap<Locale, String>;

#[derive(Clone, Debug, PartialEq)]
pub struct CreateIngredient {
    pub slug: String,
    pub cost: Decimal,
    pub translations: Names,
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct UpdateIngredient {
    pub slug: Option<String>,
    pub cost: Option<Decimal>,
    pub translations: Names,
}

#[derive(Clone, Debug, PartialEq)]
pub struct CreatePizza {
    pub slug: String,
    pub translations: Names,
    pub ingredients: Vec<IngredientId>,
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct UpdatePizza {
    pub slug: Option<String>,
    pub translations: Names,
    pub ingredients: Option<Vec<IngredientId>>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct AttachIngredient {
    pub ingredient: IngredientId,
    pub order: Option<u32>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct EditAssociationOrder {
    pub order: u32,
}

impl CreateIngredient {
    pub fn parse(body: &Value) -> Result<Self, ValidationError> {
        let fields = object(body)?;
        Ok(Self {
            slug: slug(fields.get("slug"))?,
            cost: cost(fields.get("cost"))?,
            translations: optional(fields, "translations", names)?.unwrap_or_default(),
        })
    }
}

impl UpdateIngredient {
    pub fn parse(body: &Value) -> Result<Self, ValidationError> {
        let fields = object(body)?;
        Ok(Self {
            slug: optional(fields, "slug", slug)?,
            cost: optional(fields, "cost", cost)?,
            translations: optional(fields, "translations", names)?.unwrap_or_default(),
        })
    }
}

impl CreatePizza {
    pub fn parse(body: &Value) -> Result<Self, ValidationError> {
        let fields = object(body)?;
        Ok(Self {
            slug: slug(fields.get("slug"))?,
            translations: optional(fields, "translations", names)?.unwrap_or_default(),
            ingredients: optional(fields, "ingredients", ingredient_ids)?.unwrap_or_default(),
        })
    }
}

impl UpdatePizza {
    pub fn parse(body: &Value) -> Result<Self, ValidationError> {
        let fields = object(body)?;
        Ok(Self {
            slug: optional(fields, "slug", slug)?,
            translations: optional(fields, "translations", names)?.unwrap_or_default(),
            ingredients: optional(fields, "ingredients", ingredient_ids)?,
        })
    }
}

impl AttachIngredient {
    pub fn parse(body: &Value) -> Result<Self, ValidationError> {
        let fields = object(body)?;
        INGREDIENT_RULES.check(fields.get("ingredient"))?;
        let ingredient = fields
            .get("ingredient")
            .and_then(as_integer)
            .map(IngredientId)
            .ok_or_else(|| invalid(&INGREDIENT_RULES, messages::INGREDIENT_NOT_INTEGER))?;

        Ok(Self { ingredient, order: optional(fields, "order", order)? })
    }
}

impl EditAssociationOrder {
    pub fn parse(body: &Value) -> Result<Self, ValidationError> {
        let fields = object(body)?;
        Ok(Self { order: order(fields.get("order"))? })
    }
}

fn object(body: &Value) -> Result<&Map<String, Value>, ValidationError> {
    body.as_object().ok_or_else(|| ValidationError::new("body", messages::MALFORMED_BODY))
}

fn optional<T>(
    fields: &Map<String, Value>,
    key: &str,
    parse: fn(Option<&Value>) -> Result<T, ValidationError>,
) -> Result<Option<T>, ValidationError> {
    fields.get(key).map(|value| parse(Some(value))).transpose()
}

fn invalid(rules: &FieldRules, message: &str) -> ValidationError {
    ValidationError::new(rules.field, message)
}

fn slug(value: Option<&Value>) -> Result<String, ValidationError> {
    SLUG_RULES.check(value)?;
    value
        .and_then(Value::as_str)
        .map(str::to_owned)
        .ok_or_else(|| invalid(&SLUG_RULES, messages::SLUG_PATTERN))
}

fn cost(value: Option<&Value>) -> Result<Decimal, ValidationError> {
    COST_RULES.check(value)?;
    value.and_then(as_decimal).ok_or_else(|| invalid(&COST_RULES, messages::COST_NOT_FLOAT))
}

fn order(value: Option<&Value>) -> Result<u32, ValidationError> {
    ORDER_RULES.check(value)?;
    value
        .and_then(as_integer)
        .and_then(|order| u32::try_from(order).ok())
        .ok_or_else(|| invalid(&ORDER_RULES, messages::ORDER_NOT_INTEGER))
}

fn names(value: Option<&Value>) -> Result<Names, ValidationError> {
    TRANSLATIONS_RULES.check(value)?;
    let Some(map) = value.and_then(Value::as_object) else {
        return Err(invalid(&TRANSLATIONS_RULES, messages::TRANSLATIONS_NOT_MAP));
    };

    let mut names = Names::new();
    for (locale, name) in map {
        if !is_locale(locale) {
            return Err(invalid(&TRANSLATIONS_RULES, messages::LOCALE_INVALID));
        }
        let name = name.as_str().unwrap_or_default().trim();
        if name.is_empty() {
            return Err(invalid(&TRANSLATIONS_RULES, messages::TRANSLATION_NAME_BLANK));
        }
        names.insert(locale.clone(), name.to_owned());
    }
    Ok(names)
}

fn ingredient_ids(value: Option<&Value>) -> Result<Vec<IngredientId>, ValidationError> {
    INGREDIENTS_RULES.check(value)?;
    Ok(value
        .and_then(Value::as_array)
        .map(|items| items.iter().filter_map(Value::as_i64).map(IngredientId).collect())
        .unwrap_or_default())
}
