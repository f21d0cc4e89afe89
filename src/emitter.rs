//! Mermaid emitter for join graphs.
//!
//! Converts an extracted graph into `erDiagram` text, one relationship line
//! per join edge:
//!
//! ```text
//! erDiagram
//!     orders ||--o{ customers : customer_id
//! ```
//!
//! Every edge uses the same one-to-"zero or more" notation; the join kind is
//! not consulted.

use crate::graph::{Extraction, JoinEdge, JoinGraph};

/// Diagram type header, first line of every non-empty diagram.
pub const HEADER: &str = "erDiagram";

/// Relationship notation used for every edge.
pub const RELATIONSHIP: &str = "||--o{";

/// Indentation before each relationship line.
const INDENT: &str = "    ";

/// Trait for rendering graph values as Mermaid text.
pub trait ToMermaid {
    /// Render this value as Mermaid `erDiagram` text.
    fn to_mermaid(&self) -> String;
}

impl ToMermaid for JoinEdge {
    fn to_mermaid(&self) -> String {
        format!("{} {} {} : {}", self.source, RELATIONSHIP, self.target, self.label)
    }
}

impl ToMermaid for JoinGraph {
    fn to_mermaid(&self) -> String {
        let mut out = String::from(HEADER);
        out.push('\n');

        for edge in &self.edges {
            out.push_str(INDENT);
            out.push_str(&edge.to_mermaid());
            out.push('\n');
        }

        out
    }
}

impl ToMermaid for Extraction {
    fn to_mermaid(&self) -> String {
        match self {
            Extraction::Graph(graph) => graph.to_mermaid(),
            Extraction::NoRootClause => String::new(),
        }
    }
}

/// Render an extraction. Empty string means there is nothing to draw.
pub fn emit(extraction: &Extraction) -> String {
    extraction.to_mermaid()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn edge(source: &str, target: &str, label: &str) -> JoinEdge {
        JoinEdge {
            source: source.to_string(),
            target: target.to_string(),
            label: label.to_string(),
            predicate: String::new(),
        }
    }

    #[test]
    fn test_no_root_is_empty() {
        assert_eq!(emit(&Extraction::NoRootClause), "");
    }

    #[test]
    fn test_root_without_edges() {
        let graph = JoinGraph::rooted("orders", Some("o"));
        assert_eq!(emit(&Extraction::Graph(graph)), "erDiagram\n");
    }

    #[test]
    fn test_edge_line() {
        assert_eq!(
            edge("orders", "customers", "customer_id").to_mermaid(),
            "orders ||--o{ customers : customer_id"
        );
    }

    #[test]
    fn test_edges_in_order_without_dedup() {
        let mut graph = JoinGraph::rooted("a", None);
        graph.edges.push(edge("a", "b", "id"));
        graph.edges.push(edge("a", "b", "id"));
        graph.edges.push(edge("b", "c", "b_id"));

        assert_eq!(
            graph.to_mermaid(),
            "erDiagram\n    a ||--o{ b : id\n    a ||--o{ b : id\n    b ||--o{ c : b_id\n"
        );
    }
}
