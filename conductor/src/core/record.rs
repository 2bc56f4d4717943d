//! Line-oriented `key: value` record decoding.

use std::collections::HashMap;

use tracing::debug;

use crate::core::scalar::{decode_list, decode_scalar};

/// A single decoded record value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldValue {
    Null,
    Text(String),
    List(Vec<String>),
}

impl FieldValue {
    fn from_raw(raw: &str) -> Self {
        let value = raw.trim();
        if value.starts_with('[') && value.ends_with(']') {
            return Self::List(decode_list(value));
        }
        match decode_scalar(value) {
            Some(text) => Self::Text(text),
            None => Self::Null,
        }
    }
}

/// Flat mapping from normalized key to decoded value.
///
/// Keys no typed builder asks for are retained so newer directive formats
/// still decode. Every accessor returns a default instead of failing.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Record {
    fields: HashMap<String, FieldValue>,
}

impl Record {
    pub fn contains(&self, key: &str) -> bool {
        self.fields.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Text value for `key`; lists are joined with `", "`, null/absent is `""`.
    pub fn text(&self, key: &str) -> String {
        self.optional_text(key).unwrap_or_default()
    }

    /// Text value for `key`, keeping null/absent as `None`.
    pub fn optional_text(&self, key: &str) -> Option<String> {
        match self.fields.get(key)? {
            FieldValue::Null => None,
            FieldValue::Text(text) => Some(text.clone()),
            FieldValue::List(items) => Some(items.join(", ")),
        }
    }

    /// List value for `key`; a bare scalar becomes a one-item list.
    pub fn list(&self, key: &str) -> Vec<String> {
        match self.fields.get(key) {
            Some(FieldValue::List(items)) => items.clone(),
            Some(FieldValue::Text(text)) => vec![text.clone()],
            Some(FieldValue::Null) | None => Vec::new(),
        }
    }

    /// Text of the first key in `keys` present in the record, even when its
    /// value is empty or null.
    pub fn first_text(&self, keys: &[&str]) -> String {
        keys.iter()
            .find(|key| self.contains(key))
            .map(|key| self.text(key))
            .unwrap_or_default()
    }
}

/// Decode `key: value` lines into a [`Record`].
///
/// Lines without a colon and lines whose key normalizes to nothing are
/// dropped. Duplicate keys keep the last value.
pub fn decode_record<'a, I>(lines: I) -> Record
where
    I: IntoIterator<Item = &'a str>,
{
    let mut fields = HashMap::new();
    for line in lines {
        let line = line.trim_end();
        if line.trim().is_empty() {
            continue;
        }
        let Some((raw_key, raw_value)) = line.split_once(':') else {
            debug!(line, "dropping record line without colon");
            continue;
        };
        let key = normalize_key(raw_key);
        if key.is_empty() {
            debug!(line, "dropping record line with empty key");
            continue;
        }
        fields.insert(key, FieldValue::from_raw(raw_value));
    }
    Record { fields }
}

/// Normalize a record key to `[a-z0-9_]` with single, inner underscores.
pub fn normalize_key(raw: &str) -> String {
    let mut key = String::with_capacity(raw.len());
    for ch in raw.chars().flat_map(char::to_lowercase) {
        let ch = if ch.is_ascii_lowercase() || ch.is_ascii_digit() {
            ch
        } else {
            '_'
        };
        if ch == '_' && key.ends_with('_') {
            continue;
        }
        key.push(ch);
    }
    key.trim_matches('_').to_string()
}
