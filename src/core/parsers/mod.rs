//! Parsers for stylesheets, values and definition files.
//!
//! - `css`: stylesheet document trees (raw preserving)
//! - `value`: declaration value token trees
//! - `json`: JSON definition files
//! - `js`: JavaScript definition modules (uses swc for AST generation)

pub mod css;
pub mod js;
pub mod json;
pub mod value;
