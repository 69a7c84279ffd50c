//! batisql: minimal MyBatis-style dynamic SQL rendering.
//!
//! This crate does one job: take an already parsed query template (plain
//! text plus conditional directives) and a runtime parameter bag, and
//! produce a single SQL string whose shape depends on what the caller
//! passed in.
//!
//! Supported directives, applied in this order on every render:
//! - `if`: every fragment whose test holds is appended.
//! - `choose` / `when` / `otherwise`: the first matching branch only.
//! - `set`: matching assignments, comma joined, behind ` SET `.
//! - `foreach`: expands `#{item}` once per element of a sequence.
//! - `where`: matching conditions joined by their prefixes, with the first
//!   `AND`/`OR`/`NOT` dropped.
//! - `trim`: strips leading override keywords and wraps in prefix/suffix.
//!
//! Tests are exactly three words, `left operator right`, e.g.
//! `user.age >= 18`. Anything else evaluates to false.
//!
//! Not supported:
//! - Parsing template markup or walking template directories. Trees come in
//!   through [`Registry::register`], built in code or deserialized with serde.
//! - Executing the SQL. The result is a string.
//! - Quoted literals, parentheses or boolean connectives inside tests.

pub mod ast;
pub mod error;
pub mod eval;
pub mod lexer;
pub mod parser;
pub mod registry;
pub mod render;
pub mod value;

use std::sync::Arc;

use tracing::debug;

pub use ast::{Choose, Conditional, Foreach, SetClause, TemplateTree, Trim, WhereClause, WhereFragment};
pub use error::{Anomaly, Error, Result};
pub use eval::evaluate;
pub use registry::Registry;
pub use render::render;
pub use value::Value;

/// Resolve `id` in `registry` and render it against `params`.
pub fn execute_query(registry: &Registry, id: &str, params: &Value) -> Result<String> {
    let tree = registry.get(id)?;
    debug!(id, "rendering template");
    Ok(render(tree, params))
}

/// Entry point for application code: a registry frozen behind an `Arc`.
///
/// Cloning is cheap and every clone renders from the same templates, so a
/// mapper can be handed to as many threads as needed.
#[derive(Debug, Clone)]
pub struct Mapper {
    registry: Arc<Registry>,
}

impl Mapper {
    pub fn new(registry: Registry) -> Self {
        Self {
            registry: Arc::new(registry),
        }
    }

    pub fn from_shared(registry: Arc<Registry>) -> Self {
        Self { registry }
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    pub fn execute_query(&self, id: &str, params: &Value) -> Result<String> {
        execute_query(&self.registry, id, params)
    }
}
