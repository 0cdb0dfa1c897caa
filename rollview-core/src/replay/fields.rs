//! Field lookup with aliases.
//!
//! Transcripts written by different CLI versions spell the same field in
//! camelCase or snake_case. Every lookup here takes the candidate names in
//! preference order and returns the first one holding a value of the wanted
//! shape; values are never merged across names.

use serde_json::{Map, Value};
use std::str::FromStr;

/// Read-only view over a JSON object (or nothing).
#[derive(Debug, Clone, Copy)]
pub(crate) struct Fields<'a>(Option<&'a Map<String, Value>>);

impl<'a> Fields<'a> {
    pub fn new(value: Option<&'a Value>) -> Self {
        Self(value.and_then(Value::as_object))
    }

    pub fn from_map(map: Option<&'a Map<String, Value>>) -> Self {
        Self(map)
    }

    /// Whether the underlying value was an object at all.
    pub fn is_object(&self) -> bool {
        self.0.is_some()
    }

    fn first<T>(&self, names: &[&str], pick: impl Fn(&'a Value) -> Option<T>) -> Option<T> {
        let map = self.0?;
        names.iter().find_map(|name| map.get(*name).and_then(&pick))
    }

    pub fn str(&self, names: &[&str]) -> Option<&'a str> {
        self.first(names, Value::as_str)
    }

    pub fn string_or(&self, names: &[&str], default: &str) -> String {
        self.str(names).unwrap_or(default).to_string()
    }

    pub fn bool_or(&self, names: &[&str], default: bool) -> bool {
        self.first(names, Value::as_bool).unwrap_or(default)
    }

    pub fn number(&self, names: &[&str]) -> Option<f64> {
        self.first(names, Value::as_f64)
    }

    pub fn array(&self, names: &[&str]) -> Option<&'a Vec<Value>> {
        self.first(names, Value::as_array)
    }

    /// First field holding an object, as the raw value.
    pub fn object(&self, names: &[&str]) -> Option<&'a Value> {
        self.first(names, |v| v.is_object().then_some(v))
    }

    /// Nested view over the first field holding an object.
    pub fn nested(&self, names: &[&str]) -> Fields<'a> {
        Fields::new(self.object(names))
    }

    /// Closed-set membership: the first string field, parsed. A string outside
    /// the set yields `None` rather than falling through to the next alias.
    pub fn parse<T: FromStr>(&self, names: &[&str]) -> Option<T> {
        self.str(names)?.parse().ok()
    }

    /// Raw value of the first present field, whatever its shape.
    pub fn value(&self, names: &[&str]) -> Option<&'a Value> {
        self.first(names, Some)
    }
}
