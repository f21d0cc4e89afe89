//! Join graph types.
//!
//! Everything here is built fresh for one query and thrown away once the
//! diagram has been emitted.

use std::collections::BTreeMap;

use serde::Serialize;

/// Alias to table name bindings for one query.
///
/// Every table is also bound to itself, so resolving a qualifier never needs a
/// separate "no alias" branch. Rebinding an alias overwrites the previous
/// binding (last write wins).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct AliasTable {
    bindings: BTreeMap<String, String>,
}

impl AliasTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Bind `alias` to `table`, and `table` to itself.
    pub fn bind(&mut self, alias: &str, table: &str) {
        self.bindings.insert(alias.to_string(), table.to_string());
        self.bindings.insert(table.to_string(), table.to_string());
    }

    pub fn get(&self, alias: &str) -> Option<&str> {
        self.bindings.get(alias).map(String::as_str)
    }

    /// Table for a qualifier, falling back to the qualifier itself.
    pub fn resolve<'a>(&'a self, qualifier: &'a str) -> &'a str {
        self.get(qualifier).unwrap_or(qualifier)
    }

    pub fn len(&self) -> usize {
        self.bindings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bindings.is_empty()
    }

    /// Bindings in alias order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.bindings.iter().map(|(a, t)| (a.as_str(), t.as_str()))
    }
}

/// One side of an `ON a = b` predicate as written.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Operand {
    pub qualifier: Option<String>,
    pub column: String,
}

impl Operand {
    pub fn bare(column: impl Into<String>) -> Self {
        Self {
            qualifier: None,
            column: column.into(),
        }
    }

    pub fn qualified(qualifier: impl Into<String>, column: impl Into<String>) -> Self {
        Self {
            qualifier: Some(qualifier.into()),
            column: column.into(),
        }
    }

    /// Which table this operand points at.
    ///
    /// A bare column cannot be attributed to any table.
    pub fn resolve(&self, aliases: &AliasTable) -> Endpoint {
        match &self.qualifier {
            Some(q) => Endpoint::Table(aliases.resolve(q).to_string()),
            None => Endpoint::Unresolved,
        }
    }
}

impl std::fmt::Display for Operand {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.qualifier {
            Some(q) => write!(f, "{}.{}", q, self.column),
            None => write!(f, "{}", self.column),
        }
    }
}

/// Resolution of an operand to a table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Endpoint {
    Table(String),
    Unresolved,
}

impl Endpoint {
    /// The resolved table, unless it is `joined` (or nothing resolved).
    pub fn other_than(&self, joined: &str) -> Option<&str> {
        match self {
            Endpoint::Table(t) if t != joined => Some(t.as_str()),
            _ => None,
        }
    }
}

/// A directed relationship from an anchor table to the table a JOIN
/// introduced.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct JoinEdge {
    pub source: String,
    pub target: String,
    /// Column part of the left-hand ON operand.
    pub label: String,
    /// The ON predicate as written, `left = right`.
    pub predicate: String,
}

/// Distinct table names in first-seen order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct TableSet(Vec<String>);

impl TableSet {
    pub fn insert(&mut self, table: &str) -> bool {
        if self.contains(table) {
            return false;
        }
        self.0.push(table.to_string());
        true
    }

    pub fn contains(&self, table: &str) -> bool {
        self.0.iter().any(|t| t == table)
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// Tables, aliases and join edges found in one query.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct JoinGraph {
    pub root_table: String,
    pub root_alias: String,
    pub aliases: AliasTable,
    pub edges: Vec<JoinEdge>,
    pub tables: TableSet,
}

impl JoinGraph {
    /// Start a graph at the table named in the FROM clause.
    pub fn rooted(table: &str, alias: Option<&str>) -> Self {
        let alias = alias.unwrap_or(table);
        let mut aliases = AliasTable::new();
        aliases.bind(alias, table);
        let mut tables = TableSet::default();
        tables.insert(table);

        Self {
            root_table: table.to_string(),
            root_alias: alias.to_string(),
            aliases,
            edges: Vec::new(),
            tables,
        }
    }

    /// Flat table list plus one raw condition per join.
    pub fn summary(&self) -> JoinSummary {
        JoinSummary {
            tables: self.tables.iter().map(str::to_string).collect(),
            relationships: self
                .edges
                .iter()
                .map(|e| Relationship {
                    table: e.target.clone(),
                    condition: e.predicate.clone(),
                })
                .collect(),
        }
    }
}

/// Result of extraction: a graph, or no FROM clause to root one at.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "graph", rename_all = "snake_case")]
pub enum Extraction {
    Graph(JoinGraph),
    NoRootClause,
}

impl Extraction {
    pub fn graph(&self) -> Option<&JoinGraph> {
        match self {
            Extraction::Graph(g) => Some(g),
            Extraction::NoRootClause => None,
        }
    }

    pub fn into_graph(self) -> Option<JoinGraph> {
        match self {
            Extraction::Graph(g) => Some(g),
            Extraction::NoRootClause => None,
        }
    }

    pub fn is_empty(&self) -> bool {
        matches!(self, Extraction::NoRootClause)
    }

    pub fn summary(&self) -> JoinSummary {
        self.graph().map(JoinGraph::summary).unwrap_or_default()
    }
}

/// Table list and raw join conditions.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct JoinSummary {
    pub tables: Vec<String>,
    pub relationships: Vec<Relationship>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Relationship {
    pub table: String,
    pub condition: String,
}
