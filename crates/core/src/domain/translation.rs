//! Locale-keyed display names shared by every translatable catalog entity.
//!
//! Entities hold a [`Translations`] component rather than inheriting
//! behaviour. `translate` hands out a mutable translation for a locale and
//! `merge_new_translations` promotes the ones created in the meantime.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

pub type Locale = String;

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Translation {
    pub locale: Locale,
    pub name: String,
}

impl Translation {
    pub fn new(locale: impl Into<Locale>, name: impl Into<String>) -> Self {
        Self { locale: locale.into(), name: name.into() }
    }

    pub fn set_name(&mut self, name: impl Into<String>) -> &mut Self {
        self.name = name.into();
        self
    }

    pub fn is_blank(&self) -> bool {
        self.name.trim().is_empty()
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Translations {
    current: BTreeMap<Locale, Translation>,
    pending: BTreeMap<Locale, Translation>,
}

impl Translations {
    /// Builds a merged set from `(locale, name)` pairs; blank names are dropped.
    pub fn from_names<I, L, N>(names: I) -> Self
    where
        I: IntoIterator<Item = (L, N)>,
        L: AsRef<str>,
        N: Into<String>,
    {
        let mut translations = Self::default();
        for (locale, name) in names {
            translations.translate(locale.as_ref()).set_name(name);
        }
        translations.merge_new_translations();
        translations
    }

    /// Returns the translation for `locale`, creating a pending one when the
    /// locale is not known yet. Pending translations are invisible to readers
    /// until [`Translations::merge_new_translations`] runs.
    pub fn translate(&mut self, locale: &str) -> &mut Translation {
        if self.current.contains_key(locale) {
            return self
                .current
                .entry(locale.to_owned())
                .or_insert_with(|| Translation::new(locale, String::new()));
        }

        self.pending
            .entry(locale.to_owned())
            .or_insert_with(|| Translation::new(locale, String::new()))
    }

    pub fn merge_new_translations(&mut self) {
        for (locale, translation) in std::mem::take(&mut self.pending) {
            if !translation.is_blank() {
                self.current.insert(locale, translation);
            }
        }
    }

    /// Upserts every `(locale, name)` pair, leaving other locales untouched.
    pub fn upsert_names<'a, I>(&mut self, names: I)
    where
        I: IntoIterator<Item = (&'a String, &'a String)>,
    {
        for (locale, name) in names {
            self.translate(locale).set_name(name.as_str());
        }
        self.merge_new_translations();
    }

    pub fn get(&self, locale: &str) -> Option<&Translation> {
        self.current.get(locale)
    }

    pub fn name(&self, locale: &str) -> Option<&str> {
        self.current.get(locale).map(|translation| translation.name.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = &Translation> {
        self.current.values()
    }

    pub fn names(&self) -> BTreeMap<Locale, String> {
        self.current
            .iter()
            .map(|(locale, translation)| (locale.clone(), translation.name.clone()))
            .collect()
    }

    pub fn len(&self) -> usize {
        self.current.len()
    }

    pub fn is_empty(&self) -> bool {
        self.current.is_empty()
    }
}

/// Capability shared by entities that carry a [`Translations`] component.
pub trait Translatable {
    fn translations(&self) -> &Translations;

    fn translations_mut(&mut self) -> &mut Translations;

    fn translate(&mut self, locale: &str) -> &mut Translation {
        self.translations_mut().translate(locale)
    }

    fn merge_new_translations(&mut self) {
        self.translations_mut().merge_new_translations();
    }

    fn name_in(&self, locale: &str) -> Option<&str> {
        self.translations().name(locale)
    }
}
