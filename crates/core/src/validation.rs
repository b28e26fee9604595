//! Field rules applied to request bodies before they become typed commands.
//!
//! Each field carries an ordered table of `(predicate, message)` pairs; the
//! first failing predicate decides the message returned to the client.

use std::str::FromStr;

use rust_decimal::Decimal;
use serde_json::Value;

use crate::errors::ValidationError;

pub mod messages {
    pub const SLUG_BLANK: &str = "Slug cannot be blank";
    pub const SLUG_PATTERN: &str = "Slug must be a lowercase slug";
    pub const COST_BLANK: &str = "Cost cannot be blank";
    pub const COST_NOT_FLOAT: &str = "Cost must be a float";
    pub const COST_NEGATIVE: &str = "Cost cannot be negative";
    pub const ORDER_BLANK: &str = "Order cannot be blank";
    pub const ORDER_NOT_INTEGER: &str = "Order must be an integer";
    pub const ORDER_NOT_POSITIVE: &str = "Order must be a positive integer";
    pub const ORDER_TAKEN: &str = "This order is already set for another ingredient";
    pub const INGREDIENT_ALREADY_ATTACHED: &str = "The pizza has already this ingredient";
    pub const INGREDIENT_BLANK: &str = "Ingredient cannot be blank";
    pub const INGREDIENT_UNKNOWN: &str = "No ingredient found";
    pub const INGREDIENT_NOT_INTEGER: &str = "Ingredient must be an integer id";
    pub const INGREDIENTS_NOT_LIST: &str = "Ingredients must be a list of ingredient ids";
    pub const INGREDIENT_SLUG_TAKEN: &str = "An ingredient with this slug already exists";
    pub const PIZZA_SLUG_TAKEN: &str = "A pizza with this slug already exists";
    pub const LOCALE_INVALID: &str = "Locale must be a short language code";
    pub const TRANSLATION_NAME_BLANK: &str = "Translation name cannot be blank";
    pub const TRANSLATIONS_NOT_MAP: &str = "Translations must map locales to names";
    pub const MALFORMED_BODY: &str = "Malformed JSON body";
}

/// Longest locale code accepted, e.g. `en_GB`.
pub const MAX_LOCALE_LEN: usize = 5;

pub type Predicate = fn(&Value) -> bool;

#[derive(Clone, Copy, Debug)]
pub struct FieldRule {
    pub check: Predicate,
    pub message: &'static str,
}

#[derive(Clone, Copy, Debug)]
pub struct FieldRules {
    pub field: &'static str,
    pub rules: &'static [FieldRule],
}

impl FieldRules {
    /// Runs the table against `value`; an absent field is checked as `null`.
    pub fn check(&self, value: Option<&Value>) -> Result<(), ValidationError> {
        let value = value.unwrap_or(&Value::Null);
        match self.rules.iter().find(|rule| !(rule.check)(value)) {
            Some(rule) => Err(ValidationError::new(self.field, rule.message)),
            None => Ok(()),
        }
    }
}

pub const SLUG_RULES: FieldRules = FieldRules {
    field: "slug",
    rules: &[
        FieldRule { check: is_present, message: messages::SLUG_BLANK },
        FieldRule { check: is_lowercase_slug, message: messages::SLUG_PATTERN },
    ],
};

pub const COST_RULES: FieldRules = FieldRules {
    field: "cost",
    rules: &[
        FieldRule { check: is_present, message: messages::COST_BLANK },
        FieldRule { check: is_float, message: messages::COST_NOT_FLOAT },
        FieldRule { check: is_non_negative, message: messages::COST_NEGATIVE },
    ],
};

pub const ORDER_RULES: FieldRules = FieldRules {
    field: "order",
    rules: &[
        FieldRule { check: is_present, message: messages::ORDER_BLANK },
        FieldRule { check: is_integer, message: messages::ORDER_NOT_INTEGER },
        FieldRule { check: is_positive, message: messages::ORDER_NOT_POSITIVE },
    ],
};

pub const INGREDIENT_RULES: FieldRules = FieldRules {
    field: "ingredient",
    rules: &[
        FieldRule { check: is_present, message: messages::INGREDIENT_BLANK },
        FieldRule { check: is_integer, message: messages::INGREDIENT_NOT_INTEGER },
    ],
};

pub const INGREDIENTS_RULES: FieldRules = FieldRules {
    field: "ingredients",
    rules: &[FieldRule { check: is_id_list, message: messages::INGREDIENTS_NOT_LIST }],
};

pub const TRANSLATIONS_RULES: FieldRules = FieldRules {
    field: "translations",
    rules: &[FieldRule { check: is_name_map, message: messages::TRANSLATIONS_NOT_MAP }],
};

/// Absent, `null` and whitespace-only strings are blank.
pub fn is_present(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::String(text) => !text.trim().is_empty(),
        _ => true,
    }
}

pub fn is_lowercase_slug(value: &Value) -> bool {
    value.as_str().is_some_and(is_slug)
}

/// Lowercase ASCII letters and hyphens, at least one character.
pub fn is_slug(candidate: &str) -> bool {
    !candidate.is_empty() && candidate.chars().all(|c| c.is_ascii_lowercase() || c == '-')
}

pub fn is_float(value: &Value) -> bool {
    as_decimal(value).is_some()
}

pub fn is_non_negative(value: &Value) -> bool {
    as_decimal(value).is_some_and(|number| number >= Decimal::ZERO)
}

pub fn is_integer(value: &Value) -> bool {
    as_integer(value).is_some()
}

pub fn is_positive(value: &Value) -> bool {
    as_integer(value).is_some_and(|number| number >= 1)
}

pub fn is_id_list(value: &Value) -> bool {
    value.as_array().is_some_and(|items| items.iter().all(|item| item.as_i64().is_some()))
}

pub fn is_name_map(value: &Value) -> bool {
    value.as_object().is_some_and(|map| map.values().all(Value::is_string))
}

pub fn is_locale(candidate: &str) -> bool {
    let mut chars = candidate.chars();
    candidate.len() <= MAX_LOCALE_LEN
        && chars.next().is_some_and(|first| first.is_ascii_alphabetic())
        && chars.all(|c| c.is_ascii_alphabetic() || c == '_' || c == '-')
}

/// Numbers and numeric strings, the way a form field would submit them.
/// JSON numbers are read from their literal text so `0.1` stays exact.
pub fn as_decimal(value: &Value) -> Option<Decimal> {
    match value {
        Value::Number(number) => parse_decimal(&number.to_string()),
        Value::String(text) => parse_decimal(text.trim()),
        _ => None,
    }
}

fn parse_decimal(text: &str) -> Option<Decimal> {
    Decimal::from_str(text).or_else(|_| Decimal::from_scientific(text)).ok()
}

pub fn as_integer(value: &Value) -> Option<i64> {
    match value {
        Value::Number(number) => number.as_i64(),
        Value::String(text) => text.trim().parse::<i64>().ok(),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use rust_decimal::Decimal;

    use super::{
        as_decimal, is_locale, messages, COST_RULES, INGREDIENT_RULES, ORDER_RULES, SLUG_RULES,
    };

    fn message_for(result: Result<(), crate::errors::ValidationError>) -> Option<String> {
        result.err().map(|error| error.message)
    }

    #[test]
    fn slug_rules_report_first_failure() {
        assert_eq!(message_for(SLUG_RULES.check(None)).as_deref(), Some(messages::SLUG_BLANK));
        assert_eq!(
            message_for(SLUG_RULES.check(Some(&json!("  ")))).as_deref(),
            Some(messages::SLUG_BLANK)
        );
        assert_eq!(
            message_for(SLUG_RULES.check(Some(&json!("Feta_Cheese")))).as_deref(),
            Some(messages::SLUG_PATTERN)
        );
        assert_eq!(
            message_for(SLUG_RULES.check(Some(&json!(12)))).as_deref(),
            Some(messages::SLUG_PATTERN)
        );
        assert!(SLUG_RULES.check(Some(&json!("super-mushroom"))).is_ok());
    }

    #[test]
    fn cost_accepts_numbers_and_numeric_strings() {
        assert!(COST_RULES.check(Some(&json!(0.5))).is_ok());
        assert!(COST_RULES.check(Some(&json!(1))).is_ok());
        assert!(COST_RULES.check(Some(&json!("1.25"))).is_ok());
        assert_eq!(as_decimal(&json!("1.25")), Some(Decimal::new(125, 2)));
        assert_eq!(as_decimal(&json!(0.1)), Some(Decimal::new(1, 1)));
        assert_eq!(as_decimal(&json!("2.5e-1")), Some(Decimal::new(25, 2)));
    }

    #[test]
    fn cost_rejections_carry_their_messages() {
        assert_eq!(
            message_for(COST_RULES.check(Some(&json!(null)))).as_deref(),
            Some(messages::COST_BLANK)
        );
        assert_eq!(
            message_for(COST_RULES.check(Some(&json!("cheap")))).as_deref(),
            Some(messages::COST_NOT_FLOAT)
        );
        assert_eq!(
            message_for(COST_RULES.check(Some(&json!(-1.0)))).as_deref(),
            Some(messages::COST_NEGATIVE)
        );
    }

    #[test]
    fn order_must_be_positive_integer() {
        assert_eq!(
            message_for(ORDER_RULES.check(Some(&json!("")))).as_deref(),
            Some(messages::ORDER_BLANK)
        );
        assert_eq!(
            message_for(ORDER_RULES.check(Some(&json!(1.5)))).as_deref(),
            Some(messages::ORDER_NOT_INTEGER)
        );
        assert_eq!(
            message_for(ORDER_RULES.check(Some(&json!(0)))).as_deref(),
            Some(messages::ORDER_NOT_POSITIVE)
        );
        assert!(ORDER_RULES.check(Some(&json!("3"))).is_ok());
    }

    #[test]
    fn ingredient_reference_requires_an_id() {
        assert_eq!(
            message_for(INGREDIENT_RULES.check(None)).as_deref(),
            Some(messages::INGREDIENT_BLANK)
        );
        assert_eq!(
            message_for(INGREDIENT_RULES.check(Some(&json!("tomato")))).as_deref(),
            Some(messages::INGREDIENT_NOT_INTEGER)
        );
        assert_eq!(
            message_for(INGREDIENT_RULES.check(Some(&json!(1.5)))).as_deref(),
            Some(messages::INGREDIENT_NOT_INTEGER)
        );
        assert!(INGREDIENT_RULES.check(Some(&json!("7"))).is_ok());
    }

    #[test]
    fn locales_are_short_codes() {
        assert!(is_locale("en"));
        assert!(is_locale("en_GB"));
        assert!(!is_locale("english"));
        assert!(!is_locale(""));
        assert!(!is_locale("1fr"));
    }
}
