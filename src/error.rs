//! Error types surfaced by [`crate::query_graph::GraphBuilder`] and the slice renderer.
//!
//! A `MalformedAst` situation (an error node surviving into an otherwise valid
//! statement) is not represented here: per the core's contract, that is a
//! programming-error invariant violation in the upstream parser/typer, not a
//! condition callers are expected to recover from. It is reported via
//! [`crate::invariant::invariant`], which panics.

use thiserror::Error;

/// Failure modes of [`crate::query_graph::GraphBuilder::build`].
#[derive(Debug, Error)]
pub enum BuildError {
    /// The statement was not a `SELECT` (and not an accepted no-op statement).
    #[error("unsupported statement: query graphs can only be built from SELECT statements")]
    UnsupportedStatement,

    /// A nested `SELECT` appeared in a `FROM` clause without an alias.
    #[error("subquery in FROM clause requires an alias")]
    MissingAlias,

    /// A `LIMIT` or `OFFSET` literal did not parse as an unsigned integer.
    #[error("invalid LIMIT/OFFSET literal: {0}")]
    InvalidLimit(String),
}

/// Failure modes of [`crate::slice::render_slice`].
#[derive(Debug, Error)]
pub enum RenderError {
    /// The requested slice includes a `SubQuery` source; slices can only name
    /// base tables in their `FROM` list.
    #[error("cannot render a query slice that includes a nested subquery source {alias:?}")]
    NestedSubqueryInSlice { alias: String },

    /// Writing the rendered SQL failed.
    #[error("failed to write rendered slice")]
    Write(#[from] std::fmt::Error),
}
