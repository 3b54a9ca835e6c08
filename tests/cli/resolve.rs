use anyhow::Result;
use insta::assert_snapshot;
use pretty_assertions::assert_eq;
use serde_json::Value;

use crate::{CliTest, stderr, stdout};

const APP_CSS: &str = ":root {\n  --gap: 4px;\n}\n.card { padding: var(--gap); }\n";

#[test]
fn test_resolve_prints_preserved_output() -> Result<()> {
    let test = CliTest::with_file("app.css", APP_CSS)?;

    let output = test.resolve_command().arg("app.css").output()?;
    assert!(output.status.success());
    assert_eq!(
        stdout(&output),
        ":root {\n  --gap: 4px;\n}\n.card { padding: 4px; padding: var(--gap); }\n"
    );
    assert_snapshot!(stderr(&output).trim_end(), @"✓ Resolved 1 file - 1 declaration rewritten");

    Ok(())
}

#[test]
fn test_resolve_no_preserve_removes_definitions() -> Result<()> {
    let test = CliTest::with_file("app.css", APP_CSS)?;

    let output = test
        .resolve_command()
        .args(["app.css", "--no-preserve"])
        .output()?;
    assert!(output.status.success());
    assert_eq!(stdout(&output), "\n.card { padding: 4px; }\n");

    Ok(())
}

#[test]
fn test_resolve_write_in_place() -> Result<()> {
    let test = CliTest::with_file("app.css", APP_CSS)?;

    let output = test
        .resolve_command()
        .args(["app.css", "--write", "--no-preserve"])
        .output()?;
    assert!(output.status.success());
    assert!(stdout(&output).is_empty());
    assert_eq!(test.read_file("app.css")?, "\n.card { padding: 4px; }\n");

    Ok(())
}

#[test]
fn test_resolve_out_dir() -> Result<()> {
    let test = CliTest::with_file("src/app.css", APP_CSS)?;

    let output = test
        .resolve_command()
        .args(["src/app.css", "--out-dir", "dist"])
        .output()?;
    assert!(output.status.success());
    assert_eq!(test.read_file("src/app.css")?, APP_CSS);
    assert!(test.read_file("dist/app.css")?.contains("padding: 4px; padding: var(--gap);"));

    Ok(())
}

#[test]
fn test_resolve_directory_input() -> Result<()> {
    let test = CliTest::with_file("styles/a.css", APP_CSS)?;
    test.write_file("styles/nested/b.pcss", ":root { --c: red; }\n.b { color: var(--c); }\n")?;
    test.write_file("styles/notes.txt", "var(--c)")?;

    let output = test
        .resolve_command()
        .args(["styles", "--out-dir", "dist"])
        .output()?;
    assert!(output.status.success());
    assert_snapshot!(stderr(&output).trim_end(), @"✓ Resolved 2 files - 2 declarations rewritten");
    assert!(test.read_file("dist/b.pcss")?.contains("color: red; color: var(--c);"));
    assert!(!test.root().join("dist/notes.txt").exists());

    Ok(())
}

#[test]
fn test_resolve_with_config_import_and_export() -> Result<()> {
    let test = CliTest::with_file(
        ".unvarrc.json",
        r#"{
  "preserve": false,
  "importFrom": ["tokens/colors.json"],
  "exportTo": ["vars.json"]
}"#,
    )?;
    test.write_file(
        "tokens/colors.json",
        r##"{ "custom-properties": { "--brand": "#0af" } }"##,
    )?;
    test.write_file(
        "app.css",
        ":root { --size: 2rem; }\n.title { color: var(--brand); font-size: var(--size); }\n",
    )?;

    let output = test.resolve_command().arg("app.css").output()?;
    assert!(output.status.success(), "stderr: {}", stderr(&output));
    assert_eq!(
        stdout(&output),
        "\n.title { color: #0af; font-size: 2rem; }\n"
    );

    let exported: Value = serde_json::from_str(&test.read_file("vars.json")?)?;
    assert_eq!(
        exported,
        serde_json::json!({
            "custom-properties": { "--brand": "#0af", "--size": "2rem" }
        })
    );

    Ok(())
}

#[test]
fn test_resolve_import_from_module() -> Result<()> {
    let test = CliTest::with_file(
        "tokens.js",
        "module.exports = {\n  customProperties: { '--radius': '3px' }\n};\n",
    )?;
    test.write_file("app.css", ".box { border-radius: var(--radius, 0); }\n")?;

    let output = test
        .resolve_command()
        .args(["app.css", "--import-from", "tokens.js", "--no-preserve"])
        .output()?;
    assert!(output.status.success(), "stderr: {}", stderr(&output));
    assert_eq!(stdout(&output), ".box { border-radius: 3px; }\n");

    Ok(())
}

#[test]
fn test_resolve_fallback_without_definition() -> Result<()> {
    let test = CliTest::with_file("app.css", ".box { margin: var(--missing, 1em) auto; }\n")?;

    let output = test
        .resolve_command()
        .args(["app.css", "--no-preserve"])
        .output()?;
    assert!(output.status.success());
    assert_eq!(stdout(&output), ".box { margin: 1em auto; }\n");

    Ok(())
}

#[test]
fn test_resolve_missing_import_fails() -> Result<()> {
    let test = CliTest::with_file("app.css", APP_CSS)?;

    let output = test
        .resolve_command()
        .args(["app.css", "--import-from", "missing.json"])
        .output()?;
    assert_eq!(output.status.code(), Some(2));
    assert!(stdout(&output).is_empty());

    let stderr = stderr(&output);
    assert!(stderr.contains("✘ app.css:"), "stderr: {}", stderr);
    assert!(stderr.contains("missing.json"), "stderr: {}", stderr);
    assert!(stderr.trim_end().ends_with("✘ Failed to resolve 1 of 1 file"));

    Ok(())
}

#[test]
fn test_resolve_missing_input_fails() -> Result<()> {
    let test = CliTest::new()?;

    let output = test.resolve_command().arg("nope.css").output()?;
    assert_eq!(output.status.code(), Some(2));
    assert_snapshot!(stderr(&output).trim_end(), @"Error: Input not found: nope.css");

    Ok(())
}

#[test]
fn test_resolve_respects_ignore_directives() -> Result<()> {
    let test = CliTest::with_file(
        "app.css",
        ":root { --a: 1px; }\n\
         .x {\n  /* custom-properties: ignore next */\n  width: var(--a);\n  height: var(--a);\n}\n\
         .y {\n  /* custom-properties: off */\n  width: var(--a);\n}\n",
    )?;

    let output = test.resolve_command().arg("app.css").output()?;
    assert!(output.status.success());
    let css = stdout(&output);
    assert!(css.contains("  width: var(--a);\n  height: 1px;\n  height: var(--a);"));
    assert!(css.contains("/* custom-properties: off */\n  width: var(--a);\n}"));

    Ok(())
}

#[test]
fn test_resolve_verbose_reports_each_file() -> Result<()> {
    let test = CliTest::with_file("app.css", APP_CSS)?;

    let output = test
        .resolve_command()
        .args(["app.css", "--verbose"])
        .output()?;
    assert!(output.status.success());
    assert!(
        stderr(&output)
            .contains("✓ app.css: 1 property defined, 1 declaration rewritten"),
        "stderr: {}",
        stderr(&output)
    );

    Ok(())
}

#[test]
fn test_no_command_prints_help() -> Result<()> {
    let test = CliTest::new()?;

    let output = test.command().output()?;
    assert!(output.status.success());
    assert!(stdout(&output).contains("resolve"));

    Ok(())
}
