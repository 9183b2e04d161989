//! Folds over the consumed SQL AST ([`sqlparser::ast`]).
//!
//! The core treats the parser's AST as an external interface: it never builds
//! or rewrites it, only scans it. Rather than a visitor hierarchy, each fold
//! is a small recursive function over the `Expr` sum type, matching the
//! "pattern-match directly" approach the original C++ visitors are replaced
//! with here.

use sqlparser::ast::{Expr, Function, FunctionArg, FunctionArgExpr, FunctionArguments};
use std::collections::BTreeSet;

/// Names of functions the core treats as aggregates when collecting `GROUP
/// BY` targets (§4.1 step 5). `sqlparser` has no notion of "is this an
/// aggregate" built into `Function` — the catalog would normally carry that —
/// so the core keeps its own small, case-insensitive allowlist of the
/// standard SQL aggregates.
const AGGREGATE_FUNCTIONS: &[&str] = &[
    "count", "sum", "avg", "min", "max", "array_agg", "string_agg", "bool_and", "bool_or",
    "stddev", "variance",
];

/// True if `name` (the last segment of a possibly-qualified function name,
/// e.g. `count` in `schema.count`) names a known aggregate function.
pub fn is_aggregate_function_name(name: &str) -> bool {
    AGGREGATE_FUNCTIONS
        .iter()
        .any(|agg| agg.eq_ignore_ascii_case(name))
}

fn function_name_matches(function: &Function, pred: impl Fn(&str) -> bool) -> bool {
    function
        .name
        .0
        .last()
        .map(|part| pred(part.as_ident().map(|i| i.value.as_str()).unwrap_or("")))
        .unwrap_or(false)
}

/// True if `expr` is a call to a known aggregate function.
pub fn is_aggregate_call(expr: &Expr) -> bool {
    matches!(expr, Expr::Function(f) if function_name_matches(f, is_aggregate_function_name))
}

/// Collects the table aliases referenced by qualified column references
/// (`Designator`s, in spec terms) within `expr`. Bare, unqualified
/// identifiers are not attributed to any source — like a `Constant`, they
/// don't pin the expression to a particular table — matching the convention
/// that this core's clauses always qualify column references.
///
/// Mirrors the C++ `GetTables` visitor: walk unary/binary/function
/// structure, collect at `Designator` leaves.
pub fn collect_tables(expr: &Expr, out: &mut BTreeSet<String>) {
    match expr {
        Expr::CompoundIdentifier(parts) if parts.len() >= 2 => {
            out.insert(parts[0].value.clone());
        }
        Expr::Identifier(_) | Expr::Value(_) => {}
        Expr::UnaryOp { expr, .. } | Expr::Nested(expr) | Expr::Cast { expr, .. } => {
            collect_tables(expr, out)
        }
        Expr::BinaryOp { left, right, .. } => {
            collect_tables(left, out);
            collect_tables(right, out);
        }
        Expr::IsNull(inner) | Expr::IsNotNull(inner) => collect_tables(inner, out),
        Expr::Between {
            expr, low, high, ..
        } => {
            collect_tables(expr, out);
            collect_tables(low, out);
            collect_tables(high, out);
        }
        Expr::InList { expr, list, .. } => {
            collect_tables(expr, out);
            for item in list {
                collect_tables(item, out);
            }
        }
        Expr::Function(function) => collect_function_tables(function, out),
        _ => {
            // Anything else (literals, subqueries, window functions, ...) is
            // outside the fragment of SQL this core dissects; treat it as
            // contributing no table references rather than erroring, since a
            // predicate this exotic has already been typed by the time it
            // reaches the core.
        }
    }
}

fn collect_function_tables(function: &Function, out: &mut BTreeSet<String>) {
    if let FunctionArguments::List(list) = &function.args {
        for arg in &list.args {
            let (FunctionArg::Unnamed(FunctionArgExpr::Expr(expr))
            | FunctionArg::Named {
                arg: FunctionArgExpr::Expr(expr),
                ..
            }) = arg
            else {
                continue;
            };
            collect_tables(expr, out);
        }
    }
}

/// Collects every aggregate-function application within `expr` into `out`,
/// deduplicated by canonical textual form. Mirrors the C++ `GetAggregates`
/// visitor's `FnApplicationExpr` case precisely: once a call is identified as
/// an aggregate (or not), its own arguments are never descended into — an
/// aggregate nested inside another function's arguments, e.g. `abs(count(*))`,
/// is missed by design, the same as the original (§4.1 step 5).
pub fn collect_aggregates(expr: &Expr, out: &mut Vec<Expr>) {
    match expr {
        Expr::Function(_) => {
            if is_aggregate_call(expr) {
                let text = canonical_text(expr);
                if !out.iter().any(|seen| canonical_text(seen) == text) {
                    out.push(expr.clone());
                }
            }
        }
        Expr::UnaryOp { expr, .. } | Expr::Nested(expr) | Expr::Cast { expr, .. } => {
            collect_aggregates(expr, out)
        }
        Expr::BinaryOp { left, right, .. } => {
            collect_aggregates(left, out);
            collect_aggregates(right, out);
        }
        Expr::IsNull(inner) | Expr::IsNotNull(inner) => collect_aggregates(inner, out),
        Expr::Between {
            expr, low, high, ..
        } => {
            collect_aggregates(expr, out);
            collect_aggregates(low, out);
            collect_aggregates(high, out);
        }
        Expr::InList { expr, list, .. } => {
            collect_aggregates(expr, out);
            for item in list {
                collect_aggregates(item, out);
            }
        }
        _ => {}
    }
}

/// Canonical textual form of an expression, used both for SQL rendering and
/// for aggregate/clause identity comparisons. `sqlparser`'s `Display` impl
/// already renders valid SQL, so this is just a named alias for it.
pub fn canonical_text(expr: &Expr) -> String {
    expr.to_string()
}
