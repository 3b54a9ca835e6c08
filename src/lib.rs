//! Unvar - static resolver for CSS custom properties
//!
//! Unvar replaces `var(--name)` references in stylesheets with the values
//! their custom properties are given in `:root` or `html` rules, or in
//! imported definition files, so the output works without runtime support
//! for custom properties.
//!
//! ## Module Structure
//!
//! - `cli`: Command-line interface layer (`resolve` and `init` commands)
//! - `config`: Configuration file loading and parsing
//! - `core`: Stylesheet and value trees, collection, resolution, rewriting,
//!   import sources and export destinations
//! - `directives`: `custom-properties: off` / `ignore next` comments
//! - `pipeline`: Configured passes with a cached import table
//!
//! ## Example
//!
//! ```
//! use unvar::pipeline::{Options, Pipeline};
//!
//! let pipeline = Pipeline::new(Options::default());
//! let (css, _) = pipeline
//!     .process_css_sync(":root { --gap: 4px; }\n.card { padding: var(--gap); }")
//!     .unwrap();
//! assert_eq!(css, ":root { --gap: 4px; }\n.card { padding: 4px; padding: var(--gap); }");
//! ```

pub mod cli;
pub mod config;
pub mod core;
pub mod directives;
pub mod pipeline;
