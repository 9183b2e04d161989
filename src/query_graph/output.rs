//! Diagnostic renderings of a [`QueryGraph`]: Graphviz `dot` and a plain-text
//! `dump`, both side-effect-free (§4.2).
//!
//! Grounded on `QueryGraph::dot`/`dot_recursive`/`dump` in the original
//! implementation: recurse into `SubQuery` sources first to produce their own
//! `cluster_*` subgraph, then link the outer cluster to it; a trailing HTML
//! table on the cluster label surfaces limit/order-by/projection/group-by
//! information behind stable Greek-letter markers.

use super::{DataSourceKind, QueryGraph};
use crate::ast::canonical_text;
use std::fmt::{self, Write};

/// Renders `graph` as a Graphviz `dot` document.
pub fn render_dot(out: &mut impl Write, graph: &QueryGraph) -> fmt::Result {
    writeln!(out, "digraph QueryGraph {{")?;
    writeln!(out, "  compound=true;")?;
    let mut next_id = 0usize;
    dot_recursive(out, graph, &mut next_id)?;
    writeln!(out, "}}")
}

fn dot_recursive(out: &mut impl Write, graph: &QueryGraph, next_id: &mut usize) -> Result<usize, fmt::Error> {
    let cluster_id = *next_id;
    *next_id += 1;

    writeln!(out, "  subgraph cluster_{cluster_id} {{")?;

    let mut nested_clusters = Vec::new();
    let mut node_ids = Vec::new();
    for source in graph.sources() {
        let node = *next_id;
        *next_id += 1;
        node_ids.push(node);

        match source.kind() {
            DataSourceKind::BaseTable { .. } => {
                if source.filter().is_empty() {
                    writeln!(out, "    n{node} [label=<<B>{}</B>>];", escape(source.alias()))?;
                } else {
                    writeln!(
                        out,
                        "    n{node} [label=<<B>{}</B><BR/><FONT POINT-SIZE=\"10\">{}</FONT>>];",
                        escape(source.alias()),
                        escape(&source.filter().to_string())
                    )?;
                }
            }
            DataSourceKind::SubQuery { nested } => {
                let child_cluster = dot_recursive(out, nested, next_id)?;
                writeln!(out, "    n{node} [label=<<B>{}</B>>];", escape(source.alias()))?;
                nested_clusters.push((node, child_cluster));
            }
        }
    }

    for join in graph.joins() {
        let join_node = *next_id;
        *next_id += 1;
        writeln!(
            out,
            "    n{join_node} [shape=diamond,label=<{}>];",
            escape(&join.condition().to_string())
        )?;
        for source_id in join.sources() {
            let target = node_ids[source_id.index()];
            writeln!(out, "    n{join_node} -> n{target};")?;
        }
    }

    write_annotation_table(out, graph)?;
    writeln!(out, "  }}")?;

    for (node, child_cluster) in nested_clusters {
        writeln!(out, "  n{node} -> cluster_{child_cluster} [lhead=cluster_{child_cluster}];")?;
    }

    Ok(cluster_id)
}

fn write_annotation_table(out: &mut impl Write, graph: &QueryGraph) -> fmt::Result {
    let mut rows = Vec::new();

    let limit = graph.limit();
    if !limit.is_unspecified() {
        rows.push(format!("λ count={} offset={}", limit.count, limit.offset));
    }
    if !graph.order_by().is_empty() {
        let items = graph
            .order_by()
            .iter()
            .map(|(expr, asc)| format!("{} {}", canonical_text(expr), if *asc { "ASC" } else { "DESC" }))
            .collect::<Vec<_>>()
            .join(", ");
        rows.push(format!("ω {items}"));
    }
    if graph.projection_is_anti() || !graph.projections().is_empty() {
        let mut parts = Vec::new();
        if graph.projection_is_anti() {
            parts.push("*".to_string());
        }
        parts.extend(graph.projections().iter().map(|(expr, alias)| match alias {
            Some(alias) => format!("{} AS {}", canonical_text(expr), alias),
            None => canonical_text(expr),
        }));
        rows.push(format!("π {}", parts.join(", ")));
    }
    if !graph.group_by().is_empty() || !graph.aggregates().is_empty() {
        let mut parts: Vec<String> = graph.group_by().iter().map(canonical_text).collect();
        parts.extend(graph.aggregates().iter().map(canonical_text));
        rows.push(format!("γ {}", parts.join(", ")));
    }

    if rows.is_empty() {
        return Ok(());
    }

    writeln!(out, "    label=<<TABLE BORDER=\"0\" CELLBORDER=\"1\">")?;
    for row in rows {
        writeln!(out, "      <TR><TD>{}</TD></TR>", escape(&row))?;
    }
    writeln!(out, "    </TABLE>>;")
}

fn escape(s: &str) -> String {
    s.replace('&', "&amp;").replace('<', "&lt;").replace('>', "&gt;")
}

/// Renders `graph` as an indented, human-readable tree.
pub fn render_dump(out: &mut impl Write, graph: &QueryGraph) -> fmt::Result {
    dump_recursive(out, graph, 0)
}

fn dump_recursive(out: &mut impl Write, graph: &QueryGraph, indent: usize) -> fmt::Result {
    let pad = "  ".repeat(indent);
    for source in graph.sources() {
        match source.kind() {
            DataSourceKind::BaseTable { table } => {
                writeln!(out, "{pad}{} AS {}", table.name, source.alias())?;
            }
            DataSourceKind::SubQuery { nested } => {
                writeln!(out, "{pad}(SUBQUERY AS {}", source.alias())?;
                dump_recursive(out, nested, indent + 1)?;
                writeln!(out, "{pad})")?;
            }
        }
        if !source.filter().is_empty() {
            writeln!(out, "{pad}  FILTER {}", source.filter())?;
        }
    }
    for join in graph.joins() {
        let aliases: Vec<&str> = join.sources().iter().map(|id| graph.source(*id).alias()).collect();
        writeln!(out, "{pad}JOIN({}) {}", aliases.join(", "), join.condition())?;
    }
    if !graph.group_by().is_empty() {
        let keys: Vec<String> = graph.group_by().iter().map(canonical_text).collect();
        writeln!(out, "{pad}GROUP BY {}", keys.join(", "))?;
    }
    if !graph.aggregates().is_empty() {
        let aggs: Vec<String> = graph.aggregates().iter().map(canonical_text).collect();
        writeln!(out, "{pad}AGGREGATES {}", aggs.join(", "))?;
    }
    if graph.projection_is_anti() || !graph.projections().is_empty() {
        let mut parts = Vec::new();
        if graph.projection_is_anti() {
            parts.push("*".to_string());
        }
        parts.extend(graph.projections().iter().map(|(expr, alias)| match alias {
            Some(alias) => format!("{} AS {}", canonical_text(expr), alias),
            None => canonical_text(expr),
        }));
        writeln!(out, "{pad}SELECT {}", parts.join(", "))?;
    }
    if !graph.order_by().is_empty() {
        let items: Vec<String> = graph
            .order_by()
            .iter()
            .map(|(expr, asc)| format!("{} {}", canonical_text(expr), if *asc { "ASC" } else { "DESC" }))
            .collect();
        writeln!(out, "{pad}ORDER BY {}", items.join(", "))?;
    }
    let limit = graph.limit();
    if !limit.is_unspecified() {
        writeln!(out, "{pad}LIMIT {} OFFSET {}", limit.count, limit.offset)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::InMemoryCatalog;
    use sqlparser::dialect::GenericDialect;
    use sqlparser::parser::Parser;

    fn build(sql: &str, tables: &[&str]) -> QueryGraph {
        let stmt = Parser::parse_sql(&GenericDialect {}, sql).unwrap().remove(0);
        let mut catalog = InMemoryCatalog::new();
        for t in tables {
            catalog.register(*t);
        }
        QueryGraph::build(&stmt, &catalog).unwrap()
    }

    #[test]
    fn dot_contains_a_cluster_for_nested_subquery() {
        let graph = build("SELECT * FROM (SELECT * FROM t) AS s", &["t"]);
        let mut out = String::new();
        render_dot(&mut out, &graph).unwrap();
        assert!(out.contains("cluster_0"));
        assert!(out.contains("cluster_1"));
        assert!(out.contains("lhead=cluster_1"));
    }

    #[test]
    fn dot_annotation_table_uses_greek_markers() {
        let graph = build("SELECT * FROM t LIMIT 5", &["t"]);
        let mut out = String::new();
        render_dot(&mut out, &graph).unwrap();
        assert!(out.contains('λ'));
    }

    #[test]
    fn dump_renders_sources_filters_and_joins() {
        let graph = build("SELECT * FROM a, b WHERE a.x = b.x AND a.y > 1", &["a", "b"]);
        let mut out = String::new();
        render_dump(&mut out, &graph).unwrap();
        assert!(out.contains("a AS a"));
        assert!(out.contains("FILTER"));
        assert!(out.contains("JOIN(a, b)"));
    }
}
