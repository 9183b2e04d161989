//! Query-planning core: lowers a parsed SQL `SELECT` into an algebraic
//! [`query_graph::QueryGraph`], and enumerates the connected induced
//! subgraphs of its join graph ([`csg::CsgEnumerator`]) for cost-based join
//! ordering.
//!
//! The SQL parser, catalog, and optimizer proper are external collaborators:
//! this crate only consumes `sqlparser::ast` shapes and a [`catalog::Catalog`]
//! trait, and only produces the graph and the subproblems over it — it never
//! plans, estimates cost, or executes anything.

pub mod adjacency;
pub mod ast;
pub mod catalog;
pub mod cnf;
pub mod csg;
pub mod error;
pub(crate) mod invariant;
pub mod query_graph;
pub mod slice;

pub use adjacency::{AdjacencyMatrix, Subproblem};
pub use catalog::{Catalog, InMemoryCatalog, TableRef};
pub use csg::CsgEnumerator;
pub use error::{BuildError, RenderError};
pub use query_graph::QueryGraph;
