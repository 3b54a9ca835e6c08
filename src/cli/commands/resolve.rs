use std::{
    env, fs,
    path::{Path, PathBuf},
};

use anyhow::{Context, Result, bail};
use rayon::prelude::*;
use walkdir::WalkDir;

use super::super::{args::ResolveCommand, exit_status::ExitStatus, report};
use crate::{
    config::{ConfigLoadResult, load_config, load_config_file},
    core::{exports::Destination, sources::Source},
    pipeline::{Options, PassReport, Pipeline},
};

/// Result of processing one input file.
struct FileOutcome {
    path: PathBuf,
    result: Result<(String, PassReport)>,
}

pub fn resolve(cmd: ResolveCommand) -> Result<ExitStatus> {
    let args = &cmd.args;
    let verbose = args.common.verbose;
    let cwd = env::current_dir().context("Failed to read current directory")?;

    let loaded = match &args.common.config {
        Some(path) => load_config_file(&cwd.join(path))?,
        None => load_config(&cwd)?,
    };
    if verbose && let Some(path) = &loaded.path {
        report::print_info(&format!("Using config {}", path.display()));
    }

    let files = find_stylesheets(&cmd.inputs, verbose)?;
    if files.is_empty() {
        bail!("No .css or .pcss files found in the given inputs");
    }

    let pipeline = Pipeline::new(build_options(&loaded, &cmd, &cwd));
    if verbose {
        report::print_info(&format!(
            "Processing {} file(s) {}",
            files.len(),
            if pipeline.is_sync() { "in parallel" } else { "with imports/exports" }
        ));
    }

    let outcomes = if pipeline.is_sync() {
        files
            .par_iter()
            .map(|path| FileOutcome {
                path: path.clone(),
                result: read_stylesheet(path).and_then(|text| pipeline.process_css_sync(&text)),
            })
            .collect::<Vec<_>>()
    } else {
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .context("Failed to start async runtime")?;
        runtime.block_on(async {
            let mut outcomes = Vec::with_capacity(files.len());
            for path in &files {
                let result = match read_stylesheet(path) {
                    Ok(text) => pipeline.process_css(&text).await,
                    Err(error) => Err(error),
                };
                outcomes.push(FileOutcome {
                    path: path.clone(),
                    result,
                });
            }
            outcomes
        })
    };

    let mut failed = 0;
    let mut rewritten = 0;
    for outcome in outcomes {
        let written = outcome
            .result
            .and_then(|(css, pass)| write_output(&outcome.path, &css, &cmd).map(|()| pass));
        match written {
            Ok(pass) => {
                rewritten += pass.rewritten;
                if verbose {
                    report::print_file_report(&outcome.path, &pass);
                }
            }
            Err(error) => {
                failed += 1;
                report::print_file_error(&outcome.path, &error);
            }
        }
    }

    report::print_summary(files.len(), failed, rewritten);
    Ok(if failed == 0 {
        ExitStatus::Success
    } else {
        ExitStatus::Error
    })
}

/// Config file settings with command line overrides applied.
fn build_options(loaded: &ConfigLoadResult, cmd: &ResolveCommand, cwd: &Path) -> Options {
    let args = &cmd.args;
    let mut options = loaded.config.to_options(&loaded.base_dir);

    if args.no_preserve {
        options.preserve = false;
    }
    if !args.import_from.is_empty() {
        options.import_from = args
            .import_from
            .iter()
            .map(|path| Source::path(cwd.join(path)))
            .collect();
    }
    if !args.export_to.is_empty() {
        options.export_to = args
            .export_to
            .iter()
            .map(|path| Destination::path(cwd.join(path)))
            .collect();
    }
    options
}

/// Expand inputs into stylesheet paths. Directories are searched
/// recursively for `.css` and `.pcss` files; files are taken as given.
fn find_stylesheets(inputs: &[PathBuf], verbose: bool) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();

    for input in inputs {
        if input.is_file() {
            files.push(input.clone());
            continue;
        }
        if !input.is_dir() {
            bail!("Input not found: {}", input.display());
        }

        for entry in WalkDir::new(input).sort_by_file_name() {
            let entry = match entry {
                Ok(e) => e,
                Err(e) => {
                    if verbose {
                        report::print_warning(&format!("Cannot access path: {}", e));
                    }
                    continue;
                }
            };
            let path = entry.path();
            if path.is_file() && is_stylesheet(path) {
                files.push(path.to_path_buf());
            }
        }
    }

    Ok(files)
}

fn is_stylesheet(path: &Path) -> bool {
    matches!(
        path.extension().and_then(|e| e.to_str()),
        Some("css" | "pcss")
    )
}

fn read_stylesheet(path: &Path) -> Result<String> {
    fs::read_to_string(path).with_context(|| format!("Failed to read stylesheet: {:?}", path))
}

fn write_output(path: &Path, css: &str, cmd: &ResolveCommand) -> Result<()> {
    let args = &cmd.args;

    if args.write {
        return fs::write(path, css).with_context(|| format!("Failed to write {:?}", path));
    }

    if let Some(out_dir) = &args.out_dir {
        fs::create_dir_all(out_dir)
            .with_context(|| format!("Failed to create directory: {:?}", out_dir))?;
        let file_name = path
            .file_name()
            .with_context(|| format!("Input has no file name: {:?}", path))?;
        let target = out_dir.join(file_name);
        return fs::write(&target, css).with_context(|| format!("Failed to write {:?}", target));
    }

    print!("{}", css);
    Ok(())
}
