//! # sqlerd: SQL joins as ER diagrams
//!
//! Reads the `FROM` and `JOIN ... ON` clauses of a SQL query and draws them
//! as a Mermaid `erDiagram`.
//!
//! ## Quick Example
//!
//! ```rust
//! let diagram = sqlerd::render(
//!     "SELECT * FROM orders o JOIN customers c ON o.customer_id = c.customer_id",
//! );
//! assert_eq!(diagram, "erDiagram\n    orders ||--o{ customers : customer_id\n");
//! ```
//!
//! ## Pipeline
//!
//! | Stage       | Function                     | Output              |
//! |-------------|------------------------------|---------------------|
//! | Normalize   | [`normalize`]                | [`NormalizedQuery`] |
//! | Extract     | [`extract`]                  | [`Extraction`]      |
//! | Emit        | [`emit`] / [`ToMermaid`]     | `String`            |
//!
//! The SQL is pattern-matched, never parsed or validated. Queries without a
//! `FROM` clause render as an empty string.

pub mod config;
pub mod emitter;
pub mod error;
pub mod extractor;
pub mod graph;
pub mod normalizer;

pub use emitter::{ToMermaid, emit};
pub use extractor::extract;
pub use graph::{Extraction, JoinEdge, JoinGraph};
pub use normalizer::{NormalizedQuery, normalize};

pub mod prelude {
    pub use crate::config::{Config, OutputFormat};
    pub use crate::emitter::{ToMermaid, emit};
    pub use crate::error::*;
    pub use crate::extractor::extract;
    pub use crate::graph::*;
    pub use crate::normalizer::{NormalizedQuery, normalize};
    pub use crate::{analyze, render};
}

/// Normalize and extract the join graph of a SQL string.
///
/// # Example
///
/// ```
/// use sqlerd::analyze;
///
/// let extraction = analyze("SELECT 1");
/// assert!(extraction.is_empty());
/// ```
pub fn analyze(sql: &str) -> Extraction {
    extract(&normalize(sql))
}

/// Render a SQL string as Mermaid `erDiagram` text.
///
/// Returns an empty string when the query has no `FROM` clause.
pub fn render(sql: &str) -> String {
    emit(&analyze(sql))
}
