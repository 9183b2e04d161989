//! Lowers one parsed `SELECT` statement into a [`QueryGraph`] (§4.1).
//!
//! `sqlparser`'s AST is consumed here exactly as the external interface
//! described in §6: the builder never constructs or rewrites AST nodes, it
//! only scans them (via the folds in [`crate::ast`]) and clones the handful
//! it needs to retain (group keys, aggregates, projections, order keys).

use crate::ast::{collect_aggregates, collect_tables};
use crate::catalog::{Catalog, TableRef};
use crate::cnf::{self, Cnf};
use crate::error::BuildError;
use crate::invariant::malformed_ast;
use crate::query_graph::{DataSource, DataSourceKind, Join, JoinId, Limit, QueryGraph, SourceId};
use indexmap::IndexMap;
use sqlparser::ast::{
    BinaryOperator, Expr, GroupByExpr, JoinConstraint, JoinOperator, LimitClause, OrderByKind,
    Query, SelectItem, SetExpr, Statement, TableFactor, Value,
};
use std::collections::BTreeSet;

/// Builds query graphs against a fixed catalog.
pub struct GraphBuilder<'c> {
    catalog: &'c dyn Catalog,
}

impl<'c> GraphBuilder<'c> {
    pub fn new(catalog: &'c dyn Catalog) -> Self {
        Self { catalog }
    }

    /// Lowers `stmt`. Fails with [`BuildError::UnsupportedStatement`] for
    /// anything but a `SELECT` (§4.1).
    pub fn build_statement(&self, stmt: &Statement) -> Result<QueryGraph, BuildError> {
        match stmt {
            Statement::Query(query) => self.build_query(query),
            _ => {
                tracing::debug!("rejecting non-query statement");
                Err(BuildError::UnsupportedStatement)
            }
        }
    }

    fn build_query(&self, query: &Query) -> Result<QueryGraph, BuildError> {
        if query.with.is_some() {
            // Common table expressions introduce sources outside the plain
            // FROM list this core dissects; out of scope here.
            return Err(BuildError::UnsupportedStatement);
        }
        let select = match query.body.as_ref() {
            SetExpr::Select(select) => select.as_ref(),
            _ => return Err(BuildError::UnsupportedStatement),
        };
        tracing::debug!(from_items = select.from.len(), "building query graph");

        let mut graph = QueryGraph::default();
        let mut aliases: IndexMap<String, SourceId> = IndexMap::new();
        let mut join_constraints = Vec::new();

        // 2. Materialize FROM sources, in textual order.
        for table_with_joins in &select.from {
            self.add_table_factor(&mut graph, &mut aliases, &table_with_joins.relation)?;
            for join in &table_with_joins.joins {
                self.add_table_factor(&mut graph, &mut aliases, &join.relation)?;
                if let Some(on) = on_constraint(&join.join_operator) {
                    join_constraints.push(on.clone());
                }
            }
        }

        // 1. CNF of WHERE (folding in any explicit JOIN ... ON constraints,
        // which this core otherwise treats identically to a WHERE predicate).
        let mut condition = select.selection.clone();
        for on in join_constraints {
            condition = Some(match condition {
                Some(existing) => Expr::BinaryOp {
                    left: Box::new(existing),
                    op: BinaryOperator::And,
                    right: Box::new(on),
                },
                None => on,
            });
        }
        let where_cnf = match &condition {
            Some(expr) => cnf::to_cnf(expr),
            None => Cnf::empty(),
        };

        // 3. Dissect the CNF into per-source filters and joins.
        for clause in where_cnf.clauses() {
            let mut tables = BTreeSet::new();
            for literal in clause.literals() {
                collect_tables(literal.expr(), &mut tables);
            }
            match tables.len() {
                0 => {
                    // Constant clause: applies to every source.
                    for &id in aliases.values() {
                        graph.sources[id.index()].update_filter(clause.clone());
                    }
                }
                1 => {
                    let alias = tables.into_iter().next().unwrap();
                    let id = *aliases
                        .get(&alias)
                        .unwrap_or_else(|| malformed_ast("filter references an unknown alias"));
                    graph.sources[id.index()].update_filter(clause.clone());
                }
                _ => {
                    let source_ids: Vec<SourceId> = tables
                        .iter()
                        .map(|alias| {
                            *aliases
                                .get(alias)
                                .unwrap_or_else(|| malformed_ast("join condition references an unknown alias"))
                        })
                        .collect();
                    let join_id = JoinId(graph.joins.len() as u32);
                    tracing::trace!(sources = source_ids.len(), "dissected join clause");
                    graph.joins.push(Join {
                        condition: Cnf::single_clause(clause.clone()),
                        sources: source_ids.clone(),
                    });
                    for id in source_ids {
                        graph.sources[id.index()].joins.push(join_id);
                    }
                }
            }
        }

        // 4. GROUP BY.
        if let GroupByExpr::Expressions(exprs, _) = &select.group_by {
            graph.group_by = exprs.clone();
        }

        // 5. Aggregates: SELECT list, HAVING, ORDER BY — deduplicated by
        // canonical textual form.
        let mut aggregates = Vec::new();
        for item in &select.projection {
            if let Some(expr) = select_item_expr(item) {
                collect_aggregates(expr, &mut aggregates);
            }
        }
        if let Some(having) = &select.having {
            collect_aggregates(having, &mut aggregates);
        }
        if let Some(order_by) = &query.order_by {
            if let OrderByKind::Expressions(items) = &order_by.kind {
                for item in items {
                    collect_aggregates(&item.expr, &mut aggregates);
                }
            }
        }
        graph.aggregates = aggregates;

        // 6. HAVING as a selection on a wrapping sub-query.
        let mut working = if let Some(having) = &select.having {
            let having_cnf = cnf::to_cnf(having);
            let having_source = DataSource {
                id: SourceId(0),
                alias: "HAVING".to_string(),
                filter: having_cnf,
                joins: Vec::new(),
                kind: DataSourceKind::SubQuery {
                    nested: Box::new(graph),
                },
            };
            let mut outer = QueryGraph::default();
            outer.sources.push(having_source);
            outer
        } else {
            graph
        };

        // 7. Projections.
        let mut saw_wildcard = false;
        for item in &select.projection {
            match item {
                SelectItem::Wildcard(_) | SelectItem::QualifiedWildcard(..) => {
                    saw_wildcard = true;
                }
                SelectItem::UnnamedExpr(expr) => working.projections.push((expr.clone(), None)),
                SelectItem::ExprWithAlias { expr, alias } => {
                    working.projections.push((expr.clone(), Some(alias.value.clone())))
                }
            }
        }
        working.projection_is_anti = saw_wildcard;

        // 8. ORDER BY.
        if let Some(order_by) = &query.order_by {
            if let OrderByKind::Expressions(items) = &order_by.kind {
                for item in items {
                    let ascending = item.options.asc.unwrap_or(true);
                    working.order_by.push((item.expr.clone(), ascending));
                }
            }
        }

        // 9. LIMIT / OFFSET.
        if let Some(limit_clause) = &query.limit_clause {
            working.limit = parse_limit_clause(limit_clause)?;
        }

        Ok(working)
    }

    fn add_table_factor(
        &self,
        graph: &mut QueryGraph,
        aliases: &mut IndexMap<String, SourceId>,
        factor: &TableFactor,
    ) -> Result<(), BuildError> {
        let id = SourceId(graph.sources.len() as u32);
        let (alias, kind) = match factor {
            TableFactor::Table { name, alias, .. } => {
                let table_name = name.to_string();
                let alias_str = alias
                    .as_ref()
                    .map(|a| a.name.value.clone())
                    .unwrap_or_else(|| table_name.rsplit('.').next().unwrap().to_string());
                let table = self
                    .catalog
                    .resolve(&table_name)
                    .unwrap_or_else(|| TableRef::new(table_name.clone()));
                (alias_str, DataSourceKind::BaseTable { table })
            }
            TableFactor::Derived { subquery, alias, .. } => {
                let alias = alias.as_ref().ok_or(BuildError::MissingAlias)?;
                let nested = self.build_query(subquery)?;
                (
                    alias.name.value.clone(),
                    DataSourceKind::SubQuery {
                        nested: Box::new(nested),
                    },
                )
            }
            _ => return Err(BuildError::UnsupportedStatement),
        };

        if aliases.contains_key(&alias) {
            malformed_ast("duplicate alias within one FROM clause");
        }
        aliases.insert(alias.clone(), id);
        graph.sources.push(DataSource {
            id,
            alias,
            filter: Cnf::empty(),
            joins: Vec::new(),
            kind,
        });
        Ok(())
    }
}

fn select_item_expr(item: &SelectItem) -> Option<&Expr> {
    match item {
        SelectItem::UnnamedExpr(expr) => Some(expr),
        SelectItem::ExprWithAlias { expr, .. } => Some(expr),
        SelectItem::Wildcard(_) | SelectItem::QualifiedWildcard(..) => None,
    }
}

fn on_constraint(op: &JoinOperator) -> Option<&Expr> {
    let constraint = match op {
        JoinOperator::Join(c)
        | JoinOperator::Inner(c)
        | JoinOperator::Left(c)
        | JoinOperator::LeftOuter(c)
        | JoinOperator::Right(c)
        | JoinOperator::RightOuter(c)
        | JoinOperator::FullOuter(c) => c,
        _ => return None,
    };
    match constraint {
        JoinConstraint::On(expr) => Some(expr),
        _ => None,
    }
}

fn literal_value(expr: &Expr) -> Option<&Value> {
    match expr {
        Expr::Value(v) => Some(&v.value),
        _ => None,
    }
}

fn parse_unsigned(expr: &Expr) -> Result<u64, BuildError> {
    match literal_value(expr) {
        Some(Value::Number(s, _)) => s
            .parse::<u64>()
            .map_err(|_| BuildError::InvalidLimit(s.clone())),
        _ => Err(BuildError::InvalidLimit(expr.to_string())),
    }
}

fn parse_limit_clause(clause: &LimitClause) -> Result<Limit, BuildError> {
    match clause {
        LimitClause::LimitOffset { limit, offset, .. } => {
            let count = limit.as_ref().map(parse_unsigned).transpose()?.unwrap_or(0);
            let offset = offset
                .as_ref()
                .map(|o| parse_unsigned(&o.value))
                .transpose()?
                .unwrap_or(0);
            Ok(Limit { count, offset })
        }
        LimitClause::OffsetCommaLimit { offset, limit } => Ok(Limit {
            count: parse_unsigned(limit)?,
            offset: parse_unsigned(offset)?,
        }),
    }
}
