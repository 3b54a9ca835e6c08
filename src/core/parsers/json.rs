use std::path::Path;

use anyhow::{Context, Result};
use serde_json::Value;

/// Read and parse a JSON definition file.
pub async fn read_json_file(path: &Path) -> Result<Value> {
    let content = tokio::fs::read_to_string(path)
        .await
        .with_context(|| format!("Failed to read JSON file: {:?}", path))?;

    parse_json_source(&content, path)
}

pub fn parse_json_source(content: &str, path: &Path) -> Result<Value> {
    serde_json::from_str(content).with_context(|| format!("Failed to parse JSON file: {:?}", path))
}
