use std::fmt;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::domain::translation::{Translatable, Translations};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct IngredientId(pub i64);

impl fmt::Display for IngredientId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A priced catalog item. `slug` is the technical identifier; display names
/// live in `translations`.
#[derive(Clone, Debug, PartialEq)]
pub struct Ingredient {
    pub id: Option<IngredientId>,
    pub slug: String,
    pub cost: Decimal,
    pub created_at: DateTime<Utc>,
    pub translations: Translations,
}

impl Ingredient {
    pub fn new(slug: impl Into<String>, cost: Decimal) -> Self {
        Self {
            id: None,
            slug: slug.into(),
            cost,
            created_at: Utc::now(),
            translations: Translations::default(),
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

    /// Two ingredients are the same when their stored ids match; unsaved
    /// ingredients fall back to the slug, which is unique in the catalog.
    pub fn is_same(&self, other: &Ingredient) -> bool {
        match (self.id, other.id) {
            (Some(left), Some(right)) => left == right,
            _ => self.slug == other.slug,
        }
    }
}

impl Translatable for Ingredient {
    fn translations(&self) -> &Translations {
        &self.translations
    }

    fn translations_mut(&mut self) -> &mut Translations {
        &mut self.translations
    }
}

impl fmt::Display for Ingredient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.slug)
    }
}
