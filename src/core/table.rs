//! Property tables: custom property names mapped to parsed values.

use std::sync::LazyLock;

use indexmap::IndexMap;
use regex::Regex;

use super::parsers::value::{Value, ValueNode, parse_value};

static CUSTOM_PROPERTY_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^--[A-Za-z_][\w-]*$").unwrap());

/// Custom property values as plain strings, in table order.
///
/// This is the shape handed to export destinations.
pub type PlainProperties = IndexMap<String, String>;

/// Whether a declaration name is a custom property name (`--name`).
pub fn is_custom_property(name: &str) -> bool {
    CUSTOM_PROPERTY_REGEX.is_match(name)
}

/// Ordered mapping from custom property name to its value tokens.
///
/// Inserting an existing name replaces the value and keeps the name's
/// original position (last definition wins).
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PropertyTable {
    entries: IndexMap<String, Vec<ValueNode>>,
}

impl PropertyTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a table from raw value strings, tokenizing each one.
    pub fn from_plain<I, K, V>(entries: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: AsRef<str>,
    {
        let mut table = Self::new();
        for (name, text) in entries {
            table.insert(name, parse_value(text.as_ref()).nodes);
        }
        table
    }

    pub fn insert(&mut self, name: impl Into<String>, value: Vec<ValueNode>) {
        self.entries.insert(name.into(), value);
    }

    pub fn get(&self, name: &str) -> Option<&[ValueNode]> {
        self.entries.get(name).map(Vec::as_slice)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.entries.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    /// Merge `other` into this table; entries of `other` win.
    pub fn extend(&mut self, other: PropertyTable) {
        self.entries.extend(other.entries);
    }

    /// Merge `other` into this table, keeping entries this table already has.
    pub fn fill_from(&mut self, other: &PropertyTable) {
        for (name, value) in &other.entries {
            if !self.entries.contains_key(name) {
                self.entries.insert(name.clone(), value.clone());
            }
        }
    }

    /// Serialized value text of one entry.
    pub fn text(&self, name: &str) -> Option<String> {
        self.get(name).map(plain_text)
    }

    pub fn to_plain(&self) -> PlainProperties {
        self.entries
            .iter()
            .map(|(name, value)| (name.clone(), plain_text(value)))
            .collect()
    }
}

fn plain_text(nodes: &[ValueNode]) -> String {
    Value {
        nodes: nodes.to_vec(),
        after: String::new(),
    }
    .as_plain_text()
}
