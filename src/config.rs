use std::{
    fs,
    path::{Path, PathBuf},
};

use anyhow::{Context, Result, bail};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::{
    core::{
        exports::Destination,
        sources::{DEFINITION_KEYS, Source},
    },
    pipeline::Options,
};

pub const CONFIG_FILE_NAME: &str = ".unvarrc.json";

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Config {
    #[serde(default = "default_preserve")]
    pub preserve: bool,
    #[serde(default)]
    pub import_from: Vec<ImportEntry>,
    #[serde(default)]
    pub export_to: Vec<ExportEntry>,
}

/// One `importFrom` entry: a path, inline definitions, or a typed location.
///
/// An object carrying definitions is always inline, even when it also names
/// a file.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(untagged)]
pub enum ImportEntry {
    Path(String),
    Inline(InlineDefinitions),
    Location {
        from: String,
        #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
        kind: Option<String>,
    },
}

/// An object with a `customProperties` or `custom-properties` key.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(try_from = "Map<String, Value>", into = "Map<String, Value>")]
pub struct InlineDefinitions(Map<String, Value>);

impl TryFrom<Map<String, Value>> for InlineDefinitions {
    type Error = String;

    fn try_from(map: Map<String, Value>) -> Result<Self, Self::Error> {
        if DEFINITION_KEYS.iter().any(|key| map.contains_key(*key)) {
            Ok(Self(map))
        } else {
            Err("object has no \"customProperties\" or \"custom-properties\" key".to_string())
        }
    }
}

impl From<InlineDefinitions> for Map<String, Value> {
    fn from(definitions: InlineDefinitions) -> Self {
        definitions.0
    }
}

/// One `exportTo` entry: a path or a typed location.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(untagged)]
pub enum ExportEntry {
    Path(String),
    Location {
        to: String,
        #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
        kind: Option<String>,
    },
}

fn default_preserve() -> bool {
    true
}

impl Default for Config {
    fn default() -> Self {
        Self {
            preserve: default_preserve(),
            import_from: Vec::new(),
            export_to: Vec::new(),
        }
    }
}

impl Config {
    /// Validate configuration values.
    ///
    /// Returns an error for empty paths.
    pub fn validate(&self) -> Result<()> {
        for entry in &self.import_from {
            if let ImportEntry::Path(from) | ImportEntry::Location { from, .. } = entry
                && from.is_empty()
            {
                bail!("Empty path in 'importFrom'");
            }
        }

        for entry in &self.export_to {
            let (ExportEntry::Path(to) | ExportEntry::Location { to, .. }) = entry;
            if to.is_empty() {
                bail!("Empty path in 'exportTo'");
            }
        }

        Ok(())
    }

    /// Pipeline options with relative paths resolved against `base_dir`.
    pub fn to_options(&self, base_dir: &Path) -> Options {
        Options {
            preserve: self.preserve,
            import_from: self
                .import_from
                .iter()
                .map(|entry| entry.to_source(base_dir))
                .collect(),
            export_to: self
                .export_to
                .iter()
                .map(|entry| entry.to_destination(base_dir))
                .collect(),
        }
    }
}

impl ImportEntry {
    pub fn to_source(&self, base_dir: &Path) -> Source {
        match self {
            ImportEntry::Path(from) => Source::path(base_dir.join(from)),
            ImportEntry::Location { from, kind } => Source::Location {
                from: base_dir.join(from),
                kind: kind.clone(),
            },
            ImportEntry::Inline(InlineDefinitions(map)) => {
                Source::Object(Value::Object(map.clone()))
            }
        }
    }
}

impl ExportEntry {
    pub fn to_destination(&self, base_dir: &Path) -> Destination {
        match self {
            ExportEntry::Path(to) => Destination::path(base_dir.join(to)),
            ExportEntry::Location { to, kind } => Destination::Location {
                to: base_dir.join(to),
                kind: kind.clone(),
                transform: None,
            },
        }
    }
}

pub fn default_config_json() -> Result<String> {
    let config = Config::default();
    serde_json::to_string_pretty(&config).context("Failed to generate default config.")
}

pub fn find_config_file(start_dir: &Path) -> Option<PathBuf> {
    let mut current = start_dir.to_path_buf();

    loop {
        let config_path = current.join(CONFIG_FILE_NAME);
        if config_path.exists() {
            return Some(config_path);
        }
        if current.join(".git").exists() {
            return None;
        }
        if !current.pop() {
            return None;
        }
    }
}

/// Result of loading configuration.
pub struct ConfigLoadResult {
    pub config: Config,
    /// Directory relative paths in the config resolve against.
    pub base_dir: PathBuf,
    /// The file the config was read from, if any.
    pub path: Option<PathBuf>,
}

pub fn load_config(start_dir: &Path) -> Result<ConfigLoadResult> {
    match find_config_file(start_dir) {
        Some(path) => load_config_file(&path),
        None => Ok(ConfigLoadResult {
            config: Config::default(),
            base_dir: start_dir.to_path_buf(),
            path: None,
        }),
    }
}

pub fn load_config_file(path: &Path) -> Result<ConfigLoadResult> {
    let content = fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {:?}", path))?;
    let config: Config = serde_json::from_str(&content)
        .with_context(|| format!("Failed to parse config file: {:?}", path))?;
    config.validate()?;

    let base_dir = path
        .parent()
        .map(Path::to_path_buf)
        .unwrap_or_else(|| PathBuf::from("."));
    Ok(ConfigLoadResult {
        config,
        base_dir,
        path: Some(path.to_path_buf()),
    })
}

#[cfg(test)]
mod tests {
    use crate::config::*;
    use std::fs::File;
    use tempfile::tempdir;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert!(config.preserve);
        assert!(config.import_from.is_empty());
        assert!(config.export_to.is_empty());
    }

    #[test]
    fn test_parse_config() {
        let json = r#"{
              "preserve": false,
              "importFrom": [
                  "tokens.css",
                  { "from": "tokens.data", "type": "json" },
                  { "customProperties": { "--a": "1px" } }
              ],
              "exportTo": ["out.js", { "to": "out.data", "type": "scss" }]
          }"#;
        let config: Config = serde_json::from_str(json).unwrap();
        assert!(!config.preserve);
        assert_eq!(config.import_from[0], ImportEntry::Path("tokens.css".to_string()));
        assert_eq!(
            config.import_from[1],
            ImportEntry::Location {
                from: "tokens.data".to_string(),
                kind: Some("json".to_string()),
            }
        );
        assert!(matches!(config.import_from[2], ImportEntry::Inline(_)));
        assert_eq!(
            config.export_to[1],
            ExportEntry::Location {
                to: "out.data".to_string(),
                kind: Some("scss".to_string()),
            }
        );
    }

    #[test]
    fn test_find_config_file() {
        let dir = tempdir().unwrap();
        let sub_dir = dir.path().join("src").join("styles");
        fs::create_dir_all(&sub_dir).unwrap();

        let config_path = dir.path().join(CONFIG_FILE_NAME);
        File::create(&config_path).unwrap();

        let found = find_config_file(&sub_dir);
        assert!(found.is_some());
        assert_eq!(found.unwrap(), config_path);
    }

    #[test]
    fn test_find_config_not_found() {
        let dir = tempdir().unwrap();
        fs::create_dir(dir.path().join(".git")).unwrap();

        let found = find_config_file(dir.path());
        assert!(found.is_none());
    }

    #[test]
    fn test_load_config_resolves_paths_against_config_dir() {
        let dir = tempdir().unwrap();
        let sub_dir = dir.path().join("styles");
        fs::create_dir_all(&sub_dir).unwrap();
        fs::write(
            dir.path().join(CONFIG_FILE_NAME),
            r#"{ "importFrom": ["tokens/vars.css"], "exportTo": ["dist/vars.json"] }"#,
        )
        .unwrap();

        let result = load_config(&sub_dir).unwrap();
        assert_eq!(result.base_dir, dir.path());
        assert_eq!(result.path, Some(dir.path().join(CONFIG_FILE_NAME)));

        let options = result.config.to_options(&result.base_dir);
        assert!(options.preserve);
        assert!(matches!(
            &options.import_from[0],
            Source::Location { from, kind: None } if *from == dir.path().join("tokens/vars.css")
        ));
        assert!(matches!(
            &options.export_to[0],
            Destination::Location { to, .. } if *to == dir.path().join("dist/vars.json")
        ));
    }

    #[test]
    fn test_load_config_default_when_not_found() {
        let dir = tempdir().unwrap();
        fs::create_dir(dir.path().join(".git")).unwrap();

        let result = load_config(dir.path()).unwrap();
        assert!(result.path.is_none());
        assert_eq!(result.config, Config::default());
    }

    #[test]
    fn test_validate_rejects_empty_paths() {
        let config = Config {
            import_from: vec![ImportEntry::Path(String::new())],
            ..Default::default()
        };
        assert!(config.validate().unwrap_err().to_string().contains("importFrom"));

        let config = Config {
            export_to: vec![ExportEntry::Location {
                to: String::new(),
                kind: None,
            }],
            ..Default::default()
        };
        assert!(config.validate().unwrap_err().to_string().contains("exportTo"));
    }

    #[test]
    fn test_rejects_object_without_definitions_or_path() {
        let json = r#"{ "importFrom": [{ "colors": { "--a": "red" } }] }"#;
        assert!(serde_json::from_str::<Config>(json).is_err());
    }

    #[test]
    fn test_object_with_definitions_and_path_is_inline() {
        let json = r#"{
              "importFrom": [
                  { "from": "tokens.css", "customProperties": { "--a": "1px" } }
              ]
          }"#;
        let config: Config = serde_json::from_str(json).unwrap();
        assert!(matches!(config.import_from[0], ImportEntry::Inline(_)));

        let options = config.to_options(Path::new("/project"));
        let Source::Object(value) = &options.import_from[0] else {
            panic!("expected an inline source");
        };
        assert_eq!(value["customProperties"]["--a"], "1px");
    }

    #[test]
    fn test_load_config_with_invalid_json_fails() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join(CONFIG_FILE_NAME), r#"{ "preserve": "yes" }"#).unwrap();

        let result = load_config(dir.path());
        assert!(result.is_err());
    }

    #[test]
    fn test_default_config_json_round_trips() {
        let json = default_config_json().unwrap();
        assert!(json.contains("\"preserve\": true"));
        let config: Config = serde_json::from_str(&json).unwrap();
        assert_eq!(config, Config::default());
    }
}
