//! Export destinations for the final property table.
//!
//! File destinations are written in one of five formats, picked by explicit
//! kind or by file extension:
//!
//! | Kind   | Output |
//! |--------|--------|
//! | `css`  | a `:root` rule with one tab-indented declaration per property |
//! | `scss` | one `$name: value;` variable per property |
//! | `json` | `{ "custom-properties": { ... } }`, pretty printed |
//! | `js`   | a CommonJS module assigning `customProperties` |
//! | `mjs`  | an ES module exporting `customProperties` |
//!
//! Destinations of any other kind are skipped.

use std::{
    fmt,
    path::PathBuf,
    sync::{Arc, Mutex, PoisonError},
};

use anyhow::{Context, Result, anyhow};
use futures::future::try_join_all;
use serde_json::{Map, Value, json};

use super::{
    sources::{DEFINITION_KEYS, kind_of},
    table::{PlainProperties, PropertyTable},
};

/// Converts the final table to the plain map written to a file.
pub type TableTransform = Arc<dyn Fn(&PropertyTable) -> PlainProperties + Send + Sync>;

/// One configured export destination.
pub enum Destination {
    /// A file. `kind` overrides the file extension; `transform` replaces the
    /// default table to plain map conversion.
    Location {
        to: PathBuf,
        kind: Option<String>,
        transform: Option<TableTransform>,
    },
    /// Called with the final plain property map.
    Callable(Arc<dyn Fn(&PlainProperties) -> Result<()> + Send + Sync>),
    /// An object whose `customProperties` (or `custom-properties`) key is set
    /// to the final plain property map.
    Object(Arc<Mutex<Value>>),
}

impl Destination {
    pub fn path(to: impl Into<PathBuf>) -> Self {
        Self::Location {
            to: to.into(),
            kind: None,
            transform: None,
        }
    }

    pub fn typed(to: impl Into<PathBuf>, kind: impl Into<String>) -> Self {
        Self::Location {
            to: to.into(),
            kind: Some(kind.into()),
            transform: None,
        }
    }
}

impl fmt::Debug for Destination {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Destination::Location { to, kind, .. } => f
                .debug_struct("Location")
                .field("to", to)
                .field("kind", kind)
                .finish_non_exhaustive(),
            Destination::Callable(_) => f.write_str("Callable"),
            Destination::Object(value) => f.debug_tuple("Object").field(value).finish(),
        }
    }
}

/// Write the table to every destination concurrently.
///
/// Returns the number of destinations written. The first failure aborts the
/// export.
pub async fn export(table: &PropertyTable, destinations: &[Destination]) -> Result<usize> {
    let plain = table.to_plain();
    let written = try_join_all(
        destinations
            .iter()
            .map(|destination| write_destination(table, &plain, destination)),
    )
    .await?;

    Ok(written.into_iter().filter(|written| *written).count())
}

async fn write_destination(
    table: &PropertyTable,
    plain: &PlainProperties,
    destination: &Destination,
) -> Result<bool> {
    match destination {
        Destination::Callable(callback) => {
            callback(plain)?;
            Ok(true)
        }
        Destination::Object(target) => {
            let mut target = target.lock().unwrap_or_else(PoisonError::into_inner);
            write_object(&mut target, plain)?;
            Ok(true)
        }
        Destination::Location {
            to,
            kind,
            transform,
        } => {
            let kind = kind_of(to, kind.as_deref());
            let transformed;
            let properties = match transform {
                Some(transform) => {
                    transformed = transform(table);
                    &transformed
                }
                None => plain,
            };

            let Some(content) = render(&kind, properties)? else {
                return Ok(false);
            };
            tokio::fs::write(to, content)
                .await
                .with_context(|| format!("Failed to write {:?}", to))?;
            Ok(true)
        }
    }
}

fn write_object(target: &mut Value, plain: &PlainProperties) -> Result<()> {
    let Value::Object(object) = target else {
        return Err(anyhow!("Export target is not an object"));
    };
    let key = DEFINITION_KEYS
        .iter()
        .find(|key| object.contains_key(**key))
        .copied()
        .unwrap_or(DEFINITION_KEYS[0]);

    let properties: Map<String, Value> = plain
        .iter()
        .map(|(name, value)| (name.clone(), Value::String(value.clone())))
        .collect();
    object.insert(key.to_string(), Value::Object(properties));
    Ok(())
}

/// Render a plain property map in the format of `kind`. Returns None for
/// unknown kinds.
pub fn render(kind: &str, properties: &PlainProperties) -> Result<Option<String>> {
    let content = match kind {
        "css" => to_css(properties),
        "scss" => to_scss(properties),
        "json" => to_json(properties)?,
        "js" => to_common_module(properties),
        "mjs" => to_es_module(properties),
        _ => return Ok(None),
    };
    Ok(Some(content))
}

fn to_css(properties: &PlainProperties) -> String {
    let lines: Vec<String> = properties
        .iter()
        .map(|(name, value)| format!("\t{name}: {value};"))
        .collect();
    format!(":root {{\n{}\n}}\n", lines.join("\n"))
}

fn to_scss(properties: &PlainProperties) -> String {
    let lines: Vec<String> = properties
        .iter()
        .map(|(name, value)| format!("{}: {value};", name.replacen("--", "$", 1)))
        .collect();
    format!("{}\n", lines.join("\n"))
}

fn to_json(properties: &PlainProperties) -> Result<String> {
    let content = serde_json::to_string_pretty(&json!({ "custom-properties": properties }))?;
    Ok(format!("{content}\n"))
}

fn to_common_module(properties: &PlainProperties) -> String {
    let lines: Vec<String> = properties
        .iter()
        .map(|(name, value)| format!("\t\t'{}': '{}'", escape_js(name), escape_js(value)))
        .collect();
    format!(
        "module.exports = {{\n\tcustomProperties: {{\n{}\n\t}}\n}};\n",
        lines.join(",\n")
    )
}

fn to_es_module(properties: &PlainProperties) -> String {
    let lines: Vec<String> = properties
        .iter()
        .map(|(name, value)| format!("\t'{}': '{}'", escape_js(name), escape_js(value)))
        .collect();
    format!(
        "export const customProperties = {{\n{}\n}};\n",
        lines.join(",\n")
    )
}

/// Escape text for a single-quoted JavaScript string.
pub fn escape_js(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '\\' => escaped.push_str("\\\\"),
            '\'' => escaped.push_str("\\'"),
            '\n' => escaped.push_str("\\n"),
            '\r' => escaped.push_str("\\r"),
            c => escaped.push(c),
        }
    }
    escaped
}
