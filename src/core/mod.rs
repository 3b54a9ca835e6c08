//! Resolution engine.
//!
//! - `parsers`: stylesheet trees, value token trees, definition file readers
//! - `table`: property tables
//! - `collect`: definitions from `:root` and `html` rules
//! - `resolve`: `var()` substitution
//! - `rewrite`: resolution over every declaration of a stylesheet
//! - `sources`: import sources and their aggregation
//! - `exports`: export destinations

pub mod collect;
pub mod exports;
pub mod parsers;
pub mod resolve;
pub mod rewrite;
pub mod sources;
pub mod table;
