//! Query-slice rendering: the illustrative consumer from §4.6, turning one
//! CSG `Subproblem` back into a `SELECT COUNT(*)` probe over exactly the
//! sources and conditions contained in it.
//!
//! Grounded on `query_slicer.cpp`'s `emit_query_slice`.

use crate::adjacency::Subproblem;
use crate::ast::canonical_text;
use crate::error::RenderError;
use crate::query_graph::QueryGraph;
use std::fmt::Write;

/// Renders `SELECT COUNT(*) FROM ... WHERE ...;\n\n` for the sub-join
/// described by `slice` within `graph`. Fails if `slice` contains a
/// `SubQuery` source — slices only probe base tables (§4.6).
pub fn render_slice(
    out: &mut impl Write,
    graph: &QueryGraph,
    slice: Subproblem,
) -> Result<(), RenderError> {
    let mut tables = Vec::new();
    for index in slice.iter() {
        let source = graph.source_at(index);
        match source.as_base_table() {
            Some(table) => tables.push((source.alias(), &table.name)),
            None => {
                return Err(RenderError::NestedSubqueryInSlice {
                    alias: source.alias().to_string(),
                })
            }
        }
    }

    let mut predicates = Vec::new();
    for join in graph.joins() {
        let fully_contained = join
            .sources()
            .iter()
            .all(|id| slice.contains(id.index() as u32));
        if fully_contained {
            predicates.push(canonical_text_of(join.condition()));
        }
    }
    for index in slice.iter() {
        let source = graph.source_at(index);
        if !source.filter().is_empty() {
            predicates.push(canonical_text_of(source.filter()));
        }
    }

    write!(out, "SELECT COUNT(*)\nFROM ")?;
    for (i, (alias, table_name)) in tables.iter().enumerate() {
        if i > 0 {
            write!(out, ", ")?;
        }
        if *alias == table_name.as_str() {
            write!(out, "{alias}")?;
        } else {
            write!(out, "{table_name} AS {alias}")?;
        }
    }
    if !predicates.is_empty() {
        write!(out, "\nWHERE ")?;
        for (i, predicate) in predicates.iter().enumerate() {
            if i > 0 {
                write!(out, " AND ")?;
            }
            write!(out, "{predicate}")?;
        }
    }
    write!(out, ";\n\n")?;
    Ok(())
}

fn canonical_text_of(cnf: &crate::cnf::Cnf) -> String {
    cnf.clauses()
        .iter()
        .map(|clause| {
            clause
                .literals()
                .iter()
                .map(|lit| {
                    if lit.is_negated() {
                        format!("NOT ({})", canonical_text(lit.expr()))
                    } else {
                        canonical_text(lit.expr())
                    }
                })
                .collect::<Vec<_>>()
                .join(" OR ")
        })
        .collect::<Vec<_>>()
        .join(" AND ")
}
