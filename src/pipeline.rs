//! Configured resolution passes.
//!
//! A [`Pipeline`] runs collection, import merging, export and rewriting over
//! one stylesheet at a time. Import sources are aggregated once, on the first
//! pass that needs them, and the result is reused by every later pass of the
//! same instance.

use std::sync::{Mutex, PoisonError};

use anyhow::{Result, anyhow, bail};
use tokio::sync::OnceCell;

use crate::{
    core::{
        collect::collect,
        exports::{Destination, export},
        parsers::css::{self, Stylesheet},
        rewrite::rewrite,
        sources::{Source, aggregate},
        table::PropertyTable,
    },
    directives::IgnoreSet,
};

#[derive(Debug)]
pub struct Options {
    /// Keep custom property definitions and original declarations.
    pub preserve: bool,
    pub import_from: Vec<Source>,
    pub export_to: Vec<Destination>,
}

impl Default for Options {
    fn default() -> Self {
        Self {
            preserve: true,
            import_from: Vec::new(),
            export_to: Vec::new(),
        }
    }
}

/// Counts from one pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PassReport {
    /// Definitions found in the stylesheet itself.
    pub collected: usize,
    /// Definitions taken from import sources.
    pub imported: usize,
    /// Declarations rewritten (or inserted, in preserve mode).
    pub rewritten: usize,
    /// Destinations written.
    pub exported: usize,
}

pub struct Pipeline {
    preserve: bool,
    has_sources: bool,
    pending_sources: Mutex<Vec<Source>>,
    export_to: Vec<Destination>,
    imported: OnceCell<Result<PropertyTable, String>>,
}

impl Pipeline {
    pub fn new(options: Options) -> Self {
        Self {
            preserve: options.preserve,
            has_sources: !options.import_from.is_empty(),
            pending_sources: Mutex::new(options.import_from),
            export_to: options.export_to,
            imported: OnceCell::new(),
        }
    }

    /// Whether passes can run without suspending: nothing to import, nothing
    /// to export.
    pub fn is_sync(&self) -> bool {
        !self.has_sources && self.export_to.is_empty()
    }

    /// Run a pass using only the stylesheet's own definitions.
    pub fn process_sync(&self, sheet: &mut Stylesheet) -> Result<PassReport> {
        if !self.is_sync() {
            bail!("Pipeline has import sources or export destinations and must run asynchronously");
        }

        let ignored = IgnoreSet::scan(sheet);
        let table = collect(sheet, &ignored, self.preserve);
        let rewritten = rewrite(sheet, &table, &ignored, self.preserve);

        Ok(PassReport {
            collected: table.len(),
            rewritten,
            ..PassReport::default()
        })
    }

    /// Run a full pass: collect, merge imports, export, rewrite.
    ///
    /// Definitions in the stylesheet win over imported ones. On error the
    /// stylesheet is left as it was.
    pub async fn process(&self, sheet: &mut Stylesheet) -> Result<PassReport> {
        let imported = self.imported_table().await?;

        let mut working = sheet.clone();
        let ignored = IgnoreSet::scan(&working);
        let mut table = collect(&mut working, &ignored, self.preserve);
        let collected = table.len();
        table.fill_from(imported);

        let exported = export(&table, &self.export_to).await?;
        let rewritten = rewrite(&mut working, &table, &ignored, self.preserve);
        *sheet = working;

        Ok(PassReport {
            collected,
            imported: imported.len(),
            rewritten,
            exported,
        })
    }

    /// Parse, process and serialize stylesheet text.
    pub async fn process_css(&self, text: &str) -> Result<(String, PassReport)> {
        let mut sheet = css::parse(text);
        let report = self.process(&mut sheet).await?;
        Ok((sheet.to_string(), report))
    }

    pub fn process_css_sync(&self, text: &str) -> Result<(String, PassReport)> {
        let mut sheet = css::parse(text);
        let report = self.process_sync(&mut sheet)?;
        Ok((sheet.to_string(), report))
    }

    async fn imported_table(&self) -> Result<&PropertyTable> {
        let imported = self
            .imported
            .get_or_init(|| async {
                let sources = std::mem::take(
                    &mut *self
                        .pending_sources
                        .lock()
                        .unwrap_or_else(PoisonError::into_inner),
                );
                aggregate(sources).await.map_err(|error| format!("{error:#}"))
            })
            .await;

        imported.as_ref().map_err(|error| anyhow!("{error}"))
    }
}
