use std::collections::HashMap;

use crate::models::PlaceFilter;

/// Built-in spelling variants mapped to the labels used in the cutoff tables.
const BUILTIN_ALIASES: &[(&str, &str)] = &[
    ("bangalore", "Bengaluru"),
    ("bengaluru", "Bengaluru"),
    ("mysore", "Mysore"),
    ("mandya", "Mandya"),
    ("belagavi", "Belagavi"),
    ("dharwad", "Dharwad"),
    ("hubballi", "Hubballi"),
    ("davanagere", "Davanagere"),
    ("mangaluru", "Mangaluru"),
    ("hassan", "Hassan"),
];

/// Tokens that mean "any location", after trimming and lower-casing
const ANY_TOKENS: &[&str] = &["", "all"];

/// Maps free-text location input to a canonical place label
///
/// Lookup is on the trimmed, lower-cased input. Unknown input is passed
/// through trimmed but with its original casing, so a correctly spelled
/// place that simply isn't in the alias table still reaches the query.
#[derive(Debug, Clone)]
pub struct PlaceNormalizer {
    aliases: HashMap<String, PlaceFilter>,
}

impl PlaceNormalizer {
    pub fn new() -> Self {
        let aliases = BUILTIN_ALIASES
            .iter()
            .map(|(alias, label)| (alias.to_string(), PlaceFilter::Named(label.to_string())))
            .collect();

        Self { aliases }
    }

    /// Add aliases on top of the built-in table; later entries win.
    ///
    /// A label that is itself an "any location" token (`"All"`, `""`)
    /// makes the alias lift the place filter.
    pub fn with_aliases<I, K, V>(mut self, extra: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: Into<String>,
    {
        for (alias, label) in extra {
            let key = alias.as_ref().trim().to_lowercase();
            if ANY_TOKENS.contains(&key.as_str()) {
                continue;
            }
            let label: String = label.into();
            let label = label.trim();
            let target = if ANY_TOKENS.contains(&label.to_lowercase().as_str()) {
                PlaceFilter::Any
            } else {
                PlaceFilter::Named(label.to_string())
            };
            self.aliases.insert(key, target);
        }
        self
    }

    /// Resolve a raw place string. Never fails.
    pub fn normalize(&self, raw_place: &str) -> PlaceFilter {
        let trimmed = raw_place.trim();
        let key = trimmed.to_lowercase();

        if ANY_TOKENS.contains(&key.as_str()) {
            return PlaceFilter::Any;
        }

        self.aliases
            .get(&key)
            .cloned()
            .unwrap_or_else(|| PlaceFilter::Named(trimmed.to_string()))
    }
}

impl Default for PlaceNormalizer {
    fn default() -> Self {
        Self::new()
    }
}
