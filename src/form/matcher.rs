// src/form/matcher.rs
use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Concept key and the substrings that route a field name to it
pub const PATTERN_GROUPS: &[(&str, &[&str])] = &[
    ("name", &["name", "fullname", "full_name", "firstname", "lastname"]),
    ("email", &["email", "e-mail", "mail"]),
    ("phone", &["phone", "telephone", "mobile", "cell"]),
    ("address", &["address", "street", "location"]),
    ("experience", &["experience", "work", "employment", "background"]),
    ("education", &["education", "degree", "school", "university"]),
    ("skills", &["skills", "abilities", "competencies"]),
    ("cover", &["cover", "letter", "message", "additional"]),
    ("resume", &["resume", "cv", "curriculum"]),
];

/// Semantic key to value map produced by the autofill backend.
///
/// Scalars from the wire are stringified, lists of scalars are joined with
/// ", ", and nulls or nested objects are dropped.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(
    from = "BTreeMap<String, Value>",
    into = "BTreeMap<String, String>"
)]
pub struct AutofillData(BTreeMap<String, String>);

impl AutofillData {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.0.insert(key.into(), value.into());
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.0.get(key).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }
}

impl From<BTreeMap<String, Value>> for AutofillData {
    fn from(raw: BTreeMap<String, Value>) -> Self {
        raw.into_iter()
            .filter_map(|(key, value)| stringify(&value).map(|value| (key, value)))
            .collect()
    }
}

impl From<AutofillData> for BTreeMap<String, String> {
    fn from(data: AutofillData) -> Self {
        data.0
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for AutofillData {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self(
            iter.into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        )
    }
}

fn stringify(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        Value::Array(items) => {
            let parts: Vec<String> = items
                .iter()
                .filter(|item| !item.is_array() && !item.is_object())
                .filter_map(stringify)
                .collect();
            (!parts.is_empty()).then(|| parts.join(", "))
        }
        Value::Null | Value::Object(_) => None,
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchTier {
    Exact,
    Fuzzy,
    PatternGroup,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Match<'a> {
    pub key: &'a str,
    pub value: &'a str,
    pub tier: MatchTier,
}

/// Pick the autofill value for a resolved field name.
///
/// 1. exact key
/// 2. a key contained in the field name or containing it; the longest such
///    key wins, ties broken by key order
/// 3. a pattern-group trigger found in the field name, if the group's
///    concept key has a value
pub fn match_value<'a>(field_name: &str, data: &'a AutofillData) -> Option<Match<'a>> {
    if let Some((key, value)) = data.0.get_key_value(field_name) {
        return Some(Match {
            key,
            value,
            tier: MatchTier::Exact,
        });
    }

    if field_name.is_empty() {
        return None;
    }

    fuzzy_match(field_name, data).or_else(|| group_match(field_name, data))
}

fn fuzzy_match<'a>(field_name: &str, data: &'a AutofillData) -> Option<Match<'a>> {
    let field_name = field_name.to_lowercase();
    let mut best: Option<(&'a String, &'a String)> = None;

    for (key, value) in &data.0 {
        if key.is_empty() || value.is_empty() {
            continue;
        }
        let lowered = key.to_lowercase();
        if !(field_name.contains(&lowered) || lowered.contains(&field_name)) {
            continue;
        }
        // BTreeMap order makes the first of equally long keys the smallest
        match best {
            Some((current, _)) if current.chars().count() >= key.chars().count() => {}
            _ => best = Some((key, value)),
        }
    }

    best.map(|(key, value)| Match {
        key,
        value,
        tier: MatchTier::Fuzzy,
    })
}

fn group_match<'a>(field_name: &str, data: &'a AutofillData) -> Option<Match<'a>> {
    let field_name = field_name.to_lowercase();
    PATTERN_GROUPS.iter().find_map(|(concept, triggers)| {
        if !triggers.iter().any(|trigger| field_name.contains(trigger)) {
            return None;
        }
        let (key, value) = data.0.get_key_value(*concept)?;
        (!value.is_empty()).then_some(Match {
            key,
            value,
            tier: MatchTier::PatternGroup,
        })
    })
}
