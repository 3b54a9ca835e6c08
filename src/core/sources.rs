//! Import sources and their aggregation into one property table.

use std::{
    fmt,
    path::{Path, PathBuf},
    sync::Arc,
};

use anyhow::{Context, Result};
use futures::{
    FutureExt,
    future::{BoxFuture, try_join_all},
};
use serde_json::Value;

use super::{
    collect::collect,
    parsers::{css, js::read_module_file, json::read_json_file},
    table::PropertyTable,
};
use crate::directives::IgnoreSet;

/// Object keys that carry definitions, in merge order.
pub const DEFINITION_KEYS: [&str; 2] = ["customProperties", "custom-properties"];

/// One configured import source.
pub enum Source {
    /// An object carrying a `customProperties` or `custom-properties` map.
    Object(Value),
    /// A definition file. `kind` overrides the file extension.
    Location { from: PathBuf, kind: Option<String> },
    /// Called once; the result is resolved as a source.
    Callable(Arc<dyn Fn() -> Source + Send + Sync>),
    /// Awaited once; the result is resolved as a source.
    Pending(BoxFuture<'static, Result<Source>>),
}

impl Source {
    pub fn path(from: impl Into<PathBuf>) -> Self {
        Self::Location {
            from: from.into(),
            kind: None,
        }
    }

    pub fn typed(from: impl Into<PathBuf>, kind: impl Into<String>) -> Self {
        Self::Location {
            from: from.into(),
            kind: Some(kind.into()),
        }
    }
}

impl fmt::Debug for Source {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Source::Object(value) => f.debug_tuple("Object").field(value).finish(),
            Source::Location { from, kind } => f
                .debug_struct("Location")
                .field("from", from)
                .field("kind", kind)
                .finish(),
            Source::Callable(_) => f.write_str("Callable"),
            Source::Pending(_) => f.write_str("Pending"),
        }
    }
}

/// Lowercase file extension of a path, used when no explicit kind is given.
pub(crate) fn kind_of(path: &Path, kind: Option<&str>) -> String {
    match kind {
        Some(kind) => kind.to_lowercase(),
        None => path
            .extension()
            .map(|ext| ext.to_string_lossy().to_lowercase())
            .unwrap_or_default(),
    }
}

/// Resolve all sources and merge them in declared order; later sources win.
///
/// Sources are resolved concurrently. The first failure aborts the whole
/// aggregation.
pub async fn aggregate(sources: Vec<Source>) -> Result<PropertyTable> {
    let tables = try_join_all(sources.into_iter().map(resolve_source)).await?;

    let mut merged = PropertyTable::new();
    for table in tables {
        merged.extend(table);
    }
    Ok(merged)
}

/// Resolve one source into a property table.
pub fn resolve_source(source: Source) -> BoxFuture<'static, Result<PropertyTable>> {
    async move {
        match source {
            Source::Object(value) => Ok(table_from_object(&value)),
            Source::Callable(produce) => resolve_source(produce()).await,
            Source::Pending(pending) => resolve_source(pending.await?).await,
            Source::Location { from, kind } => {
                match kind_of(&from, kind.as_deref()).as_str() {
                    "css" | "pcss" => read_css_file(from).await,
                    "json" => Ok(table_from_object(&read_json_file(&from).await?)),
                    "js" | "mjs" | "cjs" => Ok(table_from_object(&read_module_file(&from).await?)),
                    _ => Ok(PropertyTable::new()),
                }
            }
        }
    }
    .boxed()
}

async fn read_css_file(path: PathBuf) -> Result<PropertyTable> {
    let text = tokio::fs::read_to_string(&path)
        .await
        .with_context(|| format!("Failed to read stylesheet: {:?}", path))?;

    let mut sheet = css::parse(&text);
    let ignored = IgnoreSet::scan(&sheet);
    Ok(collect(&mut sheet, &ignored, true))
}

/// Definitions carried by an object's `customProperties` and
/// `custom-properties` maps. The latter wins on conflicts.
pub fn table_from_object(value: &Value) -> PropertyTable {
    let mut table = PropertyTable::new();
    for key in DEFINITION_KEYS {
        let Some(Value::Object(map)) = value.get(key) else {
            continue;
        };
        table.extend(PropertyTable::from_plain(
            map.iter().map(|(name, value)| (name.as_str(), plain_value(value))),
        ));
    }
    table
}

fn plain_value(value: &Value) -> String {
    match value {
        Value::String(text) => text.clone(),
        other => other.to_string(),
    }
}
