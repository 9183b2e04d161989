//! Illustrative consumer binary (§6 CLI surface): `<tool> <SCHEMA.sql>
//! [<QUERY.sql>]`. Scans the schema file for `CREATE TABLE` names to build a
//! trivial in-memory catalog, parses the query (from the second argument or
//! stdin), builds its [`query_graph::QueryGraph`], and emits one
//! `SELECT COUNT(*)` probe per connected subgraph of the join graph.
//!
//! Grounded on `query_slicer.cpp`'s `main`/`emit_CSG_queries`.

use clap::Parser as ClapParser;
use query_graph::slice::render_slice;
use query_graph::{AdjacencyMatrix, CsgEnumerator, InMemoryCatalog, QueryGraph};
use sqlparser::dialect::GenericDialect;
use sqlparser::parser::Parser as SqlParser;
use std::io::Read;
use std::path::PathBuf;
use std::process::ExitCode;

/// A tool to generate queries for all connected subgraphs of a query's query graph.
#[derive(ClapParser)]
#[command(name = "query-graph-cli", about, version)]
struct Cli {
    /// SQL file containing CREATE TABLE statements.
    schema: PathBuf,

    /// SQL file containing a single SELECT statement; read from stdin if omitted.
    query: Option<PathBuf>,
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();

    let schema_text = match std::fs::read_to_string(&cli.schema) {
        Ok(text) => text,
        Err(err) => {
            eprintln!("could not open schema file '{}': {err}", cli.schema.display());
            return ExitCode::FAILURE;
        }
    };
    let catalog = catalog_from_schema(&schema_text);

    let query_text = match &cli.query {
        Some(path) => match std::fs::read_to_string(path) {
            Ok(text) => text,
            Err(err) => {
                eprintln!("could not open query file '{}': {err}", path.display());
                return ExitCode::FAILURE;
            }
        },
        None => {
            let mut buf = String::new();
            if let Err(err) = std::io::stdin().read_to_string(&mut buf) {
                eprintln!("could not read query from stdin: {err}");
                return ExitCode::FAILURE;
            }
            buf
        }
    };

    let statements = match SqlParser::parse_sql(&GenericDialect {}, &query_text) {
        Ok(statements) => statements,
        Err(err) => {
            eprintln!("failed to parse query: {err}");
            return ExitCode::FAILURE;
        }
    };
    let Some(statement) = statements.into_iter().next() else {
        eprintln!("expected a SELECT statement, got no input");
        return ExitCode::FAILURE;
    };

    let graph = match QueryGraph::build(&statement, &catalog) {
        Ok(graph) => graph,
        Err(err) => {
            eprintln!("expected a SELECT statement: {err}");
            return ExitCode::FAILURE;
        }
    };

    let matrix = AdjacencyMatrix::from_graph(&graph);
    let mut out = String::new();
    for slice in CsgEnumerator::new(&matrix) {
        if let Err(err) = render_slice(&mut out, &graph, slice) {
            eprintln!("{err}");
            return ExitCode::FAILURE;
        }
    }
    print!("{out}");

    ExitCode::SUCCESS
}

/// Scans `schema_text` for `CREATE TABLE <name>` statements and registers
/// each name in a fresh [`InMemoryCatalog`]. The illustrative CLI has no real
/// schema subsystem behind it, so this is deliberately just enough to
/// resolve the table names a query's FROM clause will reference.
fn catalog_from_schema(schema_text: &str) -> InMemoryCatalog {
    let mut catalog = InMemoryCatalog::new();
    let statements = SqlParser::parse_sql(&GenericDialect {}, schema_text).unwrap_or_default();
    for statement in statements {
        if let sqlparser::ast::Statement::CreateTable(create) = statement {
            catalog.register(create.name.to_string());
        }
    }
    catalog
}
