use anyhow::{Context, Result};
use insta::assert_snapshot;
use serde_json::Value;

use crate::{CliTest, stderr};

/// Validates config file structure and default values.
fn assert_config_content(content: &str) -> Result<()> {
    let parsed: Value = serde_json::from_str(content).context("Config should be valid JSON")?;

    assert_eq!(parsed.get("preserve"), Some(&Value::Bool(true)));
    assert!(
        parsed.get("importFrom").is_some(),
        "Config should have 'importFrom' field"
    );
    assert!(
        parsed.get("exportTo").is_some(),
        "Config should have 'exportTo' field"
    );

    // 2-space indentation
    assert!(
        content.contains("\n  \"preserve\""),
        "Config should use 2-space indentation"
    );

    Ok(())
}

#[test]
fn test_init_creates_config() -> Result<()> {
    let test = CliTest::new()?;

    let output = test.command().arg("init").output()?;
    assert!(output.status.success());
    assert_snapshot!(stderr(&output).trim_end(), @"✓ Created .unvarrc.json");

    assert!(test.root().join(".unvarrc.json").exists());
    let content = test.read_file(".unvarrc.json")?;
    assert_config_content(&content)?;

    Ok(())
}

#[test]
fn test_init_fails_if_exists() -> Result<()> {
    let test = CliTest::with_file(".unvarrc.json", "{}")?;

    let output = test.command().arg("init").output()?;
    assert_eq!(output.status.code(), Some(2));
    assert_snapshot!(stderr(&output).trim_end(), @"Error: .unvarrc.json already exists");
    assert_eq!(test.read_file(".unvarrc.json")?, "{}");

    Ok(())
}

#[test]
fn test_init_config_is_immediately_usable() -> Result<()> {
    let test = CliTest::new()?;

    test.command().arg("init").output()?;
    test.write_file("app.css", ":root { --a: 1px; }\n.x { width: var(--a); }\n")?;

    let output = test.resolve_command().arg("app.css").output()?;
    assert!(
        output.status.success(),
        "Resolve should work with initialized config. stderr: {}",
        stderr(&output)
    );

    Ok(())
}
