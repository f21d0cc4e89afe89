//! Join-graph extraction using nom.
//!
//! This is pattern scanning, not SQL parsing. Two clause shapes are looked
//! for in a [`NormalizedQuery`]:
//!
//! ```text
//! FROM orders o
//! ──┬─ ───┬── ┬
//!   │     │   └── Alias (optional, may be preceded by AS)
//!   │     └── Root table
//!   └── First FROM only
//!
//! LEFT JOIN customers c ON o.customer_id = c.customer_id
//! ──┬─      ────┬──── ┬    ──────┬──────   ──────┬──────
//!   │           │     │          │               └── Right operand
//!   │           │     │          └── Left operand (its column labels the edge)
//!   │           │     └── Alias (optional)
//!   │           └── Joined table
//!   └── INNER / LEFT / RIGHT / OUTER (optional, ignored)
//! ```
//!
//! Join clauses are found left to right, each search resuming where the
//! previous match ended. Text between matches is skipped, so a JOIN without
//! `ON a = b` just contributes nothing.

use nom::{
    IResult,
    branch::alt,
    bytes::complete::{tag_no_case, take_while1},
    character::complete::{char, multispace0, multispace1},
    combinator::{map, not, opt},
    sequence::{pair, preceded, terminated, tuple},
};
use tracing::{debug, trace};

use crate::graph::{Extraction, JoinEdge, JoinGraph, Operand};
use crate::normalizer::NormalizedQuery;

/// A matched `FROM table [alias]`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FromClause<'a> {
    pub table: &'a str,
    pub alias: Option<&'a str>,
}

/// A matched `JOIN table [alias] ON left = right`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JoinClause<'a> {
    pub table: &'a str,
    pub alias: Option<&'a str>,
    pub left: Operand,
    pub right: Operand,
}

impl JoinClause<'_> {
    pub fn predicate(&self) -> String {
        format!("{} = {}", self.left, self.right)
    }
}

/// Extract the join graph from a normalized query.
///
/// Returns [`Extraction::NoRootClause`] when no FROM clause matches; every
/// other irregularity just makes the graph smaller.
///
/// ```
/// use sqlerd::{extract, normalize};
///
/// let q = normalize("SELECT * FROM orders o JOIN customers c ON o.customer_id = c.customer_id");
/// let graph = extract(&q).into_graph().unwrap();
/// assert_eq!(graph.root_table, "orders");
/// assert_eq!(graph.edges[0].target, "customers");
/// ```
pub fn extract(normalized: &NormalizedQuery) -> Extraction {
    let text = normalized.as_str();

    let Some((root, _)) = scan(text, 0, from_clause) else {
        debug!("no FROM clause found");
        return Extraction::NoRootClause;
    };
    debug!(table = root.table, alias = ?root.alias, "root table");

    let mut graph = JoinGraph::rooted(root.table, root.alias);

    for join in JoinClauses::new(text) {
        let alias = join.alias.unwrap_or(join.table);
        graph.aliases.bind(alias, join.table);
        graph.tables.insert(join.table);

        let left = join.left.resolve(&graph.aliases);
        let right = join.right.resolve(&graph.aliases);

        // Left side first, then right, then the root.
        let source = match left
            .other_than(join.table)
            .or_else(|| right.other_than(join.table))
        {
            Some(table) => table.to_string(),
            None => {
                debug!(
                    table = join.table,
                    predicate = %join.predicate(),
                    "no other table in join predicate, anchoring at root"
                );
                graph.root_table.clone()
            }
        };

        trace!(%source, target = join.table, "join edge");
        graph.edges.push(JoinEdge {
            source,
            target: join.table.to_string(),
            label: join.left.column.clone(),
            predicate: join.predicate(),
        });
    }

    Extraction::Graph(graph)
}

/// Iterator over the join clauses of a normalized query, in source order.
pub struct JoinClauses<'a> {
    text: &'a str,
    pos: usize,
}

impl<'a> JoinClauses<'a> {
    pub fn new(text: &'a str) -> Self {
        Self { text, pos: 0 }
    }
}

impl<'a> Iterator for JoinClauses<'a> {
    type Item = JoinClause<'a>;

    fn next(&mut self) -> Option<Self::Item> {
        let (clause, end) = scan(self.text, self.pos, join_clause)?;
        self.pos = end;
        Some(clause)
    }
}

/// Find the first position at or after `start` where `parser` matches.
///
/// Only positions not preceded by an identifier character are tried, so a
/// keyword is never matched in the middle of a word. Returns the parsed
/// value and the byte offset just past the match.
fn scan<'a, T>(
    text: &'a str,
    start: usize,
    mut parser: impl FnMut(&'a str) -> IResult<&'a str, T>,
) -> Option<(T, usize)> {
    let tail = text.get(start..)?;

    for (offset, _) in tail.char_indices() {
        let at = start + offset;
        if text[..at].chars().next_back().is_some_and(is_ident_char) {
            continue;
        }
        if let Ok((rest, value)) = parser(&text[at..]) {
            return Some((value, text.len() - rest.len()));
        }
    }

    None
}

fn is_ident_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_'
}

/// Parse an identifier (table, alias or column name).
fn identifier(input: &str) -> IResult<&str, &str> {
    take_while1(is_ident_char)(input)
}

/// Parse `AS alias`.
fn as_alias(input: &str) -> IResult<&str, &str> {
    preceded(pair(tag_no_case("AS"), multispace1), identifier)(input)
}

/// Parse an alias, optionally introduced by `AS`.
fn table_alias(input: &str) -> IResult<&str, &str> {
    alt((as_alias, identifier))(input)
}

/// Parse `FROM table [alias]`.
fn from_clause(input: &str) -> IResult<&str, FromClause<'_>> {
    let (input, _) = tag_no_case("FROM")(input)?;
    let (input, _) = multispace1(input)?;
    let (input, table) = identifier(input)?;
    let (input, alias) = opt(preceded(multispace1, table_alias))(input)?;

    Ok((input, FromClause { table, alias }))
}

/// Parse the optional join kind. Only recognized so it can be skipped.
fn join_kind(input: &str) -> IResult<&str, &str> {
    alt((
        tag_no_case("INNER"),
        tag_no_case("LEFT"),
        tag_no_case("RIGHT"),
        tag_no_case("OUTER"),
    ))(input)
}

/// Parse the ` ON ` between the joined table and its predicate.
fn on_keyword(input: &str) -> IResult<&str, &str> {
    let (input, _) = multispace1(input)?;
    let (input, on) = tag_no_case("ON")(input)?;
    let (input, _) = multispace1(input)?;
    Ok((input, on))
}

/// Parse an ON operand: `column` or `qualifier.column`.
///
/// Anything with more parts (`schema.table.column`) is rejected whole.
fn operand(input: &str) -> IResult<&str, Operand> {
    let (input, first) = identifier(input)?;
    let (input, column) = opt(preceded(char('.'), identifier))(input)?;
    let (input, _) = not(char('.'))(input)?;

    let op = match column {
        Some(column) => Operand::qualified(first, column),
        None => Operand::bare(first),
    };
    Ok((input, op))
}

/// Parse `[kind] JOIN table [alias] ON left = right`.
fn join_clause(input: &str) -> IResult<&str, JoinClause<'_>> {
    let (input, _) = opt(terminated(join_kind, multispace0))(input)?;
    let (input, _) = tag_no_case("JOIN")(input)?;
    let (input, _) = multispace1(input)?;
    let (input, table) = identifier(input)?;
    // An alias is only an alias if ON follows it; `AS` itself may be the alias.
    let (input, alias) = alt((
        map(terminated(preceded(multispace1, as_alias), on_keyword), Some),
        map(terminated(preceded(multispace1, identifier), on_keyword), Some),
        map(on_keyword, |_| None),
    ))(input)?;
    let (input, (left, _, _, _, right)) =
        tuple((operand, multispace0, char('='), multispace0, operand))(input)?;

    Ok((
        input,
        JoinClause {
            table,
            alias,
            left,
            right,
        },
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::normalizer::normalize;

    fn graph(sql: &str) -> JoinGraph {
        extract(&normalize(sql))
            .into_graph()
            .expect("query should have a FROM clause")
    }

    fn edges(sql: &str) -> Vec<(String, String, String)> {
        graph(sql)
            .edges
            .into_iter()
            .map(|e| (e.source, e.target, e.label))
            .collect()
    }

    fn edge(source: &str, target: &str, label: &str) -> (String, String, String) {
        (source.to_string(), target.to_string(), label.to_string())
    }

    #[test]
    fn test_from_clause_with_alias() {
        let (_, clause) = from_clause("FROM orders o WHERE").unwrap();
        assert_eq!(clause.table, "orders");
        assert_eq!(clause.alias, Some("o"));
    }

    #[test]
    fn test_from_clause_with_as() {
        let (_, clause) = from_clause("from orders as o").unwrap();
        assert_eq!(clause.alias, Some("o"));
    }

    #[test]
    fn test_from_clause_alias_starting_with_as() {
        let (_, clause) = from_clause("FROM orders asset").unwrap();
        assert_eq!(clause.alias, Some("asset"));
    }

    #[test]
    fn test_from_clause_without_alias() {
        let (rest, clause) = from_clause("FROM orders").unwrap();
        assert_eq!(rest, "");
        assert_eq!(clause.alias, None);
    }

    #[test]
    fn test_join_clause_without_alias_does_not_bind_on() {
        let (_, clause) = join_clause("JOIN customers ON orders.cid = customers.id").unwrap();
        assert_eq!(clause.table, "customers");
        assert_eq!(clause.alias, None);
        assert_eq!(clause.left, Operand::qualified("orders", "cid"));
        assert_eq!(clause.right, Operand::qualified("customers", "id"));
    }

    #[test]
    fn test_join_clause_with_kind_and_as() {
        let (_, clause) = join_clause("LEFT JOIN customers AS c ON o.cid=c.id").unwrap();
        assert_eq!(clause.alias, Some("c"));
        assert_eq!(clause.predicate(), "o.cid = c.id");
    }

    #[test]
    fn test_join_alias_named_as() {
        let (_, clause) = join_clause("JOIN b AS ON a.id = b.a_id").unwrap();
        assert_eq!(clause.table, "b");
        assert_eq!(clause.alias, Some("AS"));
        assert_eq!(
            edges("FROM a JOIN b AS ON a.id = b.a_id"),
            vec![edge("a", "b", "id")]
        );
    }

    #[test]
    fn test_three_part_operands_rejected_on_either_side() {
        assert!(operand("s.a.id").is_err());
        assert!(join_clause("JOIN b ON s.a.id = b.a_id").is_err());
        assert!(join_clause("JOIN b ON a.id = s.b.a_id").is_err());
        assert!(join_clause("JOIN b ON a. = b.a_id").is_err());
        assert!(graph("FROM a JOIN b ON a.id = s.b.a_id").edges.is_empty());
    }

    #[test]
    fn test_join_clause_keywords_case_insensitive() {
        let (_, clause) = join_clause("inner join Customers c on o.cid = c.id").unwrap();
        assert_eq!(clause.table, "Customers");
    }

    #[test]
    fn test_join_clause_requires_on_and_equals() {
        assert!(join_clause("JOIN customers c USING (id)").is_err());
        assert!(join_clause("JOIN customers c ON o.cid > c.id").is_err());
    }

    #[test]
    fn test_operand_forms() {
        assert_eq!(operand("o.id").unwrap().1, Operand::qualified("o", "id"));
        assert_eq!(operand("id ").unwrap().1, Operand::bare("id"));
    }

    #[test]
    fn test_scan_respects_word_start() {
        assert!(scan("valid_from x", 0, from_clause).is_none());
        assert!(scan("NONJOIN t ON a.x = b.y", 0, join_clause).is_none());
        let (clause, end) = scan("SELECT 1 FROM t", 0, from_clause).unwrap();
        assert_eq!(clause.table, "t");
        assert_eq!(end, 15);
    }

    #[test]
    fn test_no_from_clause() {
        assert_eq!(
            extract(&normalize("UPDATE t SET x = 1")),
            Extraction::NoRootClause
        );
        assert_eq!(extract(&normalize("")), Extraction::NoRootClause);
        assert_eq!(extract(&normalize("  \n\t ")), Extraction::NoRootClause);
    }

    #[test]
    fn test_single_join() {
        let g = graph("SELECT * FROM orders o JOIN customers c ON o.customer_id = c.customer_id");
        assert_eq!(g.root_table, "orders");
        assert_eq!(g.root_alias, "o");
        assert_eq!(g.tables.iter().collect::<Vec<_>>(), vec!["orders", "customers"]);
        assert_eq!(g.edges.len(), 1);
        assert_eq!(g.edges[0].source, "orders");
        assert_eq!(g.edges[0].target, "customers");
        assert_eq!(g.edges[0].label, "customer_id");
        assert_eq!(g.edges[0].predicate, "o.customer_id = c.customer_id");
    }

    #[test]
    fn test_join_chain_keeps_order() {
        assert_eq!(
            edges("FROM a JOIN b ON a.id = b.a_id JOIN c ON b.id = c.b_id"),
            vec![edge("a", "b", "id"), edge("b", "c", "id")]
        );
    }

    #[test]
    fn test_right_operand_used_when_left_is_joined_table() {
        assert_eq!(
            edges("FROM orders o JOIN customers c ON c.id = o.customer_id"),
            vec![edge("orders", "customers", "id")]
        );
    }

    #[test]
    fn test_bare_columns_anchor_at_root() {
        assert_eq!(
            edges("FROM orders JOIN customers ON id = ref_id"),
            vec![edge("orders", "customers", "id")]
        );
    }

    #[test]
    fn test_self_join_anchors_at_root() {
        assert_eq!(
            edges("FROM employees e JOIN managers m ON m.id = m.boss_id"),
            vec![edge("employees", "managers", "id")]
        );
    }

    #[test]
    fn test_unknown_qualifier_used_literally() {
        assert_eq!(
            edges("FROM orders o JOIN customers c ON x.cid = c.id"),
            vec![edge("x", "customers", "cid")]
        );
    }

    #[test]
    fn test_left_wins_over_right() {
        assert_eq!(
            edges("FROM a JOIN b ON a.id = b.a_id JOIN c ON b.x = a.y"),
            vec![edge("a", "b", "id"), edge("b", "c", "x")]
        );
    }

    #[test]
    fn test_malformed_join_is_skipped() {
        let g = graph("FROM a JOIN b USING (id) JOIN c ON a.id = c.a_id");
        assert_eq!(g.edges.len(), 1);
        assert_eq!(g.edges[0].target, "c");
        assert!(!g.tables.contains("b"));
    }

    #[test]
    fn test_duplicate_pairs_not_merged() {
        let g = graph("FROM a JOIN b ON a.id = b.a_id JOIN b ON a.id2 = b.a_id2");
        assert_eq!(g.edges.len(), 2);
        assert_eq!(g.tables.len(), 2);
    }

    #[test]
    fn test_alias_rebinding_last_write_wins() {
        assert_eq!(
            edges("FROM a x JOIN b x ON x.id = a.b_id JOIN c ON x.id = c.x_id"),
            vec![edge("a", "b", "id"), edge("b", "c", "id")]
        );
    }

    #[test]
    fn test_outer_join_kinds() {
        let g = graph("FROM a LEFT OUTER JOIN b ON a.id = b.a_id RIGHT JOIN c ON a.id = c.a_id");
        assert_eq!(g.edges.len(), 2);
    }

    #[test]
    fn test_from_without_joins() {
        let g = graph("SELECT * FROM orders WHERE id = 1");
        assert_eq!(g.root_table, "orders");
        assert_eq!(g.root_alias, "WHERE");
        assert!(g.edges.is_empty());
    }
}
