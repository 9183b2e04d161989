//! Small panic-on-violation helpers for conditions the core treats as
//! programming errors rather than recoverable failures — chiefly, an
//! `ErrorExpr`/`ErrorClause`/`ErrorStmt` node surviving into input that a
//! well-behaved parser/typer promised was already validated (§7, `MalformedAst`).

/// Panics with a message identifying the invariant that was violated.
///
/// Kept as a function rather than inlined `unreachable!()` calls so every
/// call site reads the same way and is easy to grep for.
#[track_caller]
pub(crate) fn malformed_ast(what: &str) -> ! {
    panic!("malformed AST: {what} (graph must not contain error nodes)");
}

macro_rules! invariant {
    ($cond:expr, $($msg:tt)+) => {
        if !$cond {
            panic!($($msg)+);
        }
    };
}

pub(crate) use invariant;
