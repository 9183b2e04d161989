//! The algebraic query graph: the normalized relational-algebra
//! representation one `SELECT` is lowered into (§2, §3).
//!
//! Sources and joins live in two index-keyed arenas owned by the
//! `QueryGraph`; the cross-references between a `DataSource` and the
//! `Join`s it participates in are plain `u32` indices rather than owning or
//! reference-counted edges, which keeps the logically-cyclic relationship
//! between the two arenas lifetime-trivial (§9).

pub mod build;
pub mod output;

pub use build::GraphBuilder;

use crate::catalog::TableRef;
use crate::cnf::Cnf;
use sqlparser::ast::Expr;

/// Index of a [`DataSource`] within its owning [`QueryGraph`]. Dense,
/// `[0, N)`, assigned at insertion time (§3 invariants).
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SourceId(u32);

impl SourceId {
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

/// Index of a [`Join`] within its owning [`QueryGraph`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct JoinId(u32);

impl JoinId {
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

/// One operand of a `FROM` clause.
#[derive(Debug)]
pub enum DataSourceKind {
    BaseTable { table: TableRef },
    SubQuery { nested: Box<QueryGraph> },
}

/// A single `FROM`-clause operand: either a base table or a nested `SELECT`.
#[derive(Debug)]
pub struct DataSource {
    id: SourceId,
    alias: String,
    filter: Cnf,
    joins: Vec<JoinId>,
    kind: DataSourceKind,
}

impl DataSource {
    pub fn id(&self) -> SourceId {
        self.id
    }

    pub fn alias(&self) -> &str {
        &self.alias
    }

    pub fn filter(&self) -> &Cnf {
        &self.filter
    }

    /// The joins this source participates in, in the order they were
    /// discovered during CNF dissection.
    pub fn joins(&self) -> &[JoinId] {
        &self.joins
    }

    pub fn kind(&self) -> &DataSourceKind {
        &self.kind
    }

    pub fn as_base_table(&self) -> Option<&TableRef> {
        match &self.kind {
            DataSourceKind::BaseTable { table } => Some(table),
            DataSourceKind::SubQuery { .. } => None,
        }
    }

    pub fn as_subquery(&self) -> Option<&QueryGraph> {
        match &self.kind {
            DataSourceKind::SubQuery { nested } => Some(nested),
            DataSourceKind::BaseTable { .. } => None,
        }
    }

    fn update_filter(&mut self, clause: crate::cnf::Clause) {
        self.filter.push(clause);
    }
}

/// A hyperedge of ≥2 data sources carrying a CNF condition. Every clause of
/// `condition` references exactly the set of `sources` (§3 invariants).
#[derive(Debug)]
pub struct Join {
    condition: Cnf,
    sources: Vec<SourceId>,
}

impl Join {
    pub fn condition(&self) -> &Cnf {
        &self.condition
    }

    pub fn sources(&self) -> &[SourceId] {
        &self.sources
    }
}

/// `LIMIT`/`OFFSET`. `count == 0` means "unspecified" — it is rendered only
/// when either `count` or `offset` is non-zero (§9 open question).
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Limit {
    pub count: u64,
    pub offset: u64,
}

impl Limit {
    pub fn is_unspecified(self) -> bool {
        self.count == 0 && self.offset == 0
    }
}

/// One `SELECT` (possibly nested), lowered to relational algebra: the set of
/// sources it scans, the joins and per-source filters its `WHERE` clause
/// dissects into, and its grouping/aggregation/projection/ordering/limit
/// clauses.
#[derive(Debug, Default)]
pub struct QueryGraph {
    sources: Vec<DataSource>,
    joins: Vec<Join>,
    group_by: Vec<Expr>,
    aggregates: Vec<Expr>,
    projections: Vec<(Expr, Option<String>)>,
    projection_is_anti: bool,
    order_by: Vec<(Expr, bool)>,
    limit: Limit,
}

impl QueryGraph {
    /// Lowers a parsed statement into a query graph (§4.1). See
    /// [`GraphBuilder::build`] for the algorithm.
    pub fn build(
        stmt: &sqlparser::ast::Statement,
        catalog: &dyn crate::catalog::Catalog,
    ) -> Result<QueryGraph, crate::error::BuildError> {
        GraphBuilder::new(catalog).build_statement(stmt)
    }

    pub fn sources(&self) -> &[DataSource] {
        &self.sources
    }

    pub fn source(&self, id: SourceId) -> &DataSource {
        &self.sources[id.index()]
    }

    /// Looks up a source by dense index, for callers (like CSG consumers)
    /// that only have a bit index from a [`crate::adjacency::Subproblem`]
    /// rather than a [`SourceId`].
    pub fn source_at(&self, index: u32) -> &DataSource {
        &self.sources[index as usize]
    }

    pub fn joins(&self) -> &[Join] {
        &self.joins
    }

    pub fn join(&self, id: JoinId) -> &Join {
        &self.joins[id.index()]
    }

    pub fn group_by(&self) -> &[Expr] {
        &self.group_by
    }

    pub fn aggregates(&self) -> &[Expr] {
        &self.aggregates
    }

    pub fn projections(&self) -> &[(Expr, Option<String>)] {
        &self.projections
    }

    pub fn projection_is_anti(&self) -> bool {
        self.projection_is_anti
    }

    pub fn order_by(&self) -> &[(Expr, bool)] {
        &self.order_by
    }

    pub fn limit(&self) -> Limit {
        self.limit
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::InMemoryCatalog;
    use sqlparser::dialect::GenericDialect;
    use sqlparser::parser::Parser;

    pub(crate) fn parse_select(sql: &str) -> sqlparser::ast::Statement {
        Parser::parse_sql(&GenericDialect {}, sql).unwrap().remove(0)
    }

    pub(crate) fn catalog(tables: &[&str]) -> InMemoryCatalog {
        let mut c = InMemoryCatalog::new();
        for t in tables {
            c.register(*t);
        }
        c
    }

    #[test]
    fn single_base_table_has_dense_id_and_anti_projection() {
        let stmt = parse_select("SELECT * FROM t");
        let g = QueryGraph::build(&stmt, &catalog(&["t"])).unwrap();
        assert_eq!(g.sources().len(), 1);
        assert_eq!(g.sources()[0].id().index(), 0);
        assert_eq!(g.sources()[0].alias(), "t");
        assert!(g.joins().is_empty());
        assert!(g.projection_is_anti());
        assert!(g.projections().is_empty());
    }

    #[test]
    fn two_table_equi_join_creates_one_join_and_no_filters() {
        let stmt = parse_select("SELECT * FROM a, b WHERE a.x = b.x");
        let g = QueryGraph::build(&stmt, &catalog(&["a", "b"])).unwrap();
        assert_eq!(g.sources().len(), 2);
        assert_eq!(g.joins().len(), 1);
        assert_eq!(g.joins()[0].sources().len(), 2);
        for s in g.sources() {
            assert!(s.filter().is_empty());
        }
    }

    #[test]
    fn mixed_filter_and_join_dissects_correctly() {
        let stmt = parse_select("SELECT * FROM a, b WHERE a.k = b.k AND a.x > 5 AND 1 = 1");
        let g = QueryGraph::build(&stmt, &catalog(&["a", "b"])).unwrap();
        assert_eq!(g.joins().len(), 1);
        let a = g.sources().iter().find(|s| s.alias() == "a").unwrap();
        let b = g.sources().iter().find(|s| s.alias() == "b").unwrap();
        // a gets its own predicate plus the broadcast constant clause.
        assert_eq!(a.filter().clauses().len(), 2);
        // b only gets the broadcast constant clause.
        assert_eq!(b.filter().clauses().len(), 1);
    }

    #[test]
    fn nested_subquery_requires_alias() {
        let stmt = parse_select("SELECT * FROM (SELECT * FROM t)");
        let err = QueryGraph::build(&stmt, &catalog(&["t"])).unwrap_err();
        assert!(matches!(err, crate::error::BuildError::MissingAlias));
    }

    #[test]
    fn nested_subquery_builds_inner_graph() {
        let stmt = parse_select("SELECT * FROM (SELECT * FROM t) AS s");
        let g = QueryGraph::build(&stmt, &catalog(&["t"])).unwrap();
        assert_eq!(g.sources().len(), 1);
        assert_eq!(g.sources()[0].alias(), "s");
        let nested = g.sources()[0].as_subquery().unwrap();
        assert_eq!(nested.sources().len(), 1);
        assert_eq!(nested.sources()[0].alias(), "t");
    }

    #[test]
    fn having_wraps_graph_in_outer_subquery() {
        let stmt = parse_select("SELECT COUNT(*) FROM t GROUP BY t.k HAVING COUNT(*) > 1");
        let g = QueryGraph::build(&stmt, &catalog(&["t"])).unwrap();
        assert_eq!(g.sources().len(), 1);
        assert_eq!(g.sources()[0].alias(), "HAVING");
        assert!(!g.sources()[0].filter().is_empty());
        let inner = g.sources()[0].as_subquery().unwrap();
        assert_eq!(inner.group_by().len(), 1);
        assert_eq!(inner.aggregates().len(), 1);
    }

    #[test]
    fn aggregate_dedup_by_textual_form() {
        let stmt = parse_select("SELECT COUNT(*), COUNT(*) AS c2 FROM t");
        let g = QueryGraph::build(&stmt, &catalog(&["t"])).unwrap();
        assert_eq!(g.aggregates().len(), 1);
    }

    #[test]
    fn limit_and_offset_are_parsed() {
        let stmt = parse_select("SELECT * FROM t LIMIT 10 OFFSET 5");
        let g = QueryGraph::build(&stmt, &catalog(&["t"])).unwrap();
        assert_eq!(g.limit().count, 10);
        assert_eq!(g.limit().offset, 5);
    }

    #[test]
    fn unsupported_statement_is_rejected() {
        let stmt = parse_select("CREATE TABLE t (x INT)");
        let err = QueryGraph::build(&stmt, &catalog(&[])).unwrap_err();
        assert!(matches!(err, crate::error::BuildError::UnsupportedStatement));
    }
}
