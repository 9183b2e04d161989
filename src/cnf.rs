//! Conjunctive-normal-form representation and conversion.
//!
//! The core spec treats CNF construction as an opaque, externally supplied
//! operation (`to_cnf`); in practice something has to produce the `Cnf`
//! values the rest of the crate dissects, so this module implements the
//! textbook construction — push negations to the leaves (De Morgan), then
//! distribute `OR` over `AND` — over [`sqlparser::ast::Expr`] boolean trees.
//! Nothing outside `to_cnf` should need to know how a `Cnf` was produced.

use sqlparser::ast::{BinaryOperator, Expr, UnaryOperator};
use std::fmt;

/// A single literal of a CNF clause: a boolean sub-expression together with
/// whether it is negated.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Literal {
    expr: Expr,
    negated: bool,
}

impl Literal {
    pub fn expr(&self) -> &Expr {
        &self.expr
    }

    pub fn is_negated(&self) -> bool {
        self.negated
    }
}

impl fmt::Display for Literal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.negated {
            write!(f, "NOT ({})", self.expr)
        } else {
            write!(f, "{}", self.expr)
        }
    }
}

/// A disjunction of literals.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Clause {
    literals: Vec<Literal>,
}

impl Clause {
    fn single(literal: Literal) -> Self {
        Self {
            literals: vec![literal],
        }
    }

    pub fn literals(&self) -> &[Literal] {
        &self.literals
    }
}

impl fmt::Display for Clause {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.literals.as_slice() {
            [single] => write!(f, "{single}"),
            many => {
                write!(f, "(")?;
                for (i, lit) in many.iter().enumerate() {
                    if i > 0 {
                        write!(f, " OR ")?;
                    }
                    write!(f, "{lit}")?;
                }
                write!(f, ")")
            }
        }
    }
}

/// A conjunction of clauses, in the order they were derived from the source
/// expression. An empty `Cnf` stands for "no condition" (e.g. a data source
/// with no filter).
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Cnf {
    clauses: Vec<Clause>,
}

impl Cnf {
    pub fn empty() -> Self {
        Self::default()
    }

    /// Wraps a single clause as a one-clause CNF — used when the builder
    /// dissects a multi-clause CNF and re-homes each clause individually
    /// (§4.1 step 3).
    pub fn single_clause(clause: Clause) -> Self {
        Self {
            clauses: vec![clause],
        }
    }

    pub fn clauses(&self) -> &[Clause] {
        &self.clauses
    }

    pub fn is_empty(&self) -> bool {
        self.clauses.is_empty()
    }

    pub fn push(&mut self, clause: Clause) {
        self.clauses.push(clause);
    }
}

impl fmt::Display for Cnf {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, clause) in self.clauses.iter().enumerate() {
            if i > 0 {
                write!(f, " AND ")?;
            }
            write!(f, "{clause}")?;
        }
        Ok(())
    }
}

/// Negation-normal-form intermediate tree, used only inside [`to_cnf`].
enum Nnf {
    Lit(Literal),
    And(Vec<Nnf>),
    Or(Vec<Nnf>),
}

fn to_nnf(expr: &Expr, negate: bool) -> Nnf {
    match expr {
        Expr::UnaryOp {
            op: UnaryOperator::Not,
            expr: inner,
        } => to_nnf(inner, !negate),
        Expr::Nested(inner) => to_nnf(inner, negate),
        Expr::BinaryOp {
            left,
            op: BinaryOperator::And,
            right,
        } => {
            let (l, r) = (to_nnf(left, negate), to_nnf(right, negate));
            if negate {
                Nnf::Or(vec![l, r])
            } else {
                Nnf::And(vec![l, r])
            }
        }
        Expr::BinaryOp {
            left,
            op: BinaryOperator::Or,
            right,
        } => {
            let (l, r) = (to_nnf(left, negate), to_nnf(right, negate));
            if negate {
                Nnf::And(vec![l, r])
            } else {
                Nnf::Or(vec![l, r])
            }
        }
        other => Nnf::Lit(Literal {
            expr: other.clone(),
            negated: negate,
        }),
    }
}

fn combine_or(a: Cnf, b: Cnf) -> Cnf {
    let mut clauses = Vec::with_capacity(a.clauses.len() * b.clauses.len().max(1));
    for ca in &a.clauses {
        for cb in &b.clauses {
            let mut literals = ca.literals.clone();
            literals.extend(cb.literals.iter().cloned());
            clauses.push(Clause { literals });
        }
    }
    Cnf { clauses }
}

fn distribute(nnf: Nnf) -> Cnf {
    match nnf {
        Nnf::Lit(literal) => Cnf::single_clause(Clause::single(literal)),
        Nnf::And(parts) => {
            let mut out = Cnf::empty();
            for part in parts {
                out.clauses.extend(distribute(part).clauses);
            }
            out
        }
        Nnf::Or(parts) => parts
            .into_iter()
            .map(distribute)
            .reduce(combine_or)
            .unwrap_or_else(Cnf::empty),
    }
}

/// Converts a boolean expression tree into conjunctive normal form.
pub fn to_cnf(expr: &Expr) -> Cnf {
    distribute(to_nnf(expr, false))
}

#[cfg(test)]
mod tests {
    use super::*;
    use sqlparser::dialect::GenericDialect;
    use sqlparser::parser::Parser;

    fn parse_expr(sql: &str) -> Expr {
        let full = format!("SELECT 1 WHERE {sql}");
        let stmt = Parser::parse_sql(&GenericDialect {}, &full).unwrap().remove(0);
        let sqlparser::ast::Statement::Query(query) = stmt else {
            panic!("expected query")
        };
        let sqlparser::ast::SetExpr::Select(select) = *query.body else {
            panic!("expected select")
        };
        select.selection.unwrap()
    }

    #[test]
    fn conjunction_produces_one_clause_per_conjunct() {
        let cnf = to_cnf(&parse_expr("a.x = 1 AND b.y = 2"));
        assert_eq!(cnf.clauses().len(), 2);
        assert!(cnf.clauses().iter().all(|c| c.literals().len() == 1));
    }

    #[test]
    fn disjunction_produces_a_single_multi_literal_clause() {
        let cnf = to_cnf(&parse_expr("a.x = 1 OR a.y = 2"));
        assert_eq!(cnf.clauses().len(), 1);
        assert_eq!(cnf.clauses()[0].literals().len(), 2);
    }

    #[test]
    fn distributes_or_over_and() {
        // (a OR b) AND c -> (a OR b), c
        let cnf = to_cnf(&parse_expr("(a.x = 1 OR a.y = 2) AND a.z = 3"));
        assert_eq!(cnf.clauses().len(), 2);
    }

    #[test]
    fn not_over_conjunction_de_morgans_into_disjunction() {
        // NOT (a AND b) -> NOT(a) OR NOT(b), a single clause with 2 negated literals
        let cnf = to_cnf(&parse_expr("NOT (a.x = 1 AND a.y = 2)"));
        assert_eq!(cnf.clauses().len(), 1);
        assert_eq!(cnf.clauses()[0].literals().len(), 2);
        assert!(cnf.clauses()[0].literals().iter().all(|l| l.is_negated()));
    }
}
