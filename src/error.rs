//! Error types.
//!
//! Only a missing template is ever returned to callers. Everything that can
//! go wrong inside a single directive is an [`Anomaly`]: it is logged and the
//! directive degrades to "no match" or "no contribution".

use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

/// Failures surfaced to callers of the registry and the mapper.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Error {
    #[error("template not found: {key}")]
    NotFound { key: String },
}

/// Per-directive problems absorbed during rendering.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Anomaly {
    #[error("malformed test `{test}`: expected 3 words, got {words}")]
    MalformedTest { test: String, words: usize },

    #[error("unknown operator `{operator}` in test `{test}`")]
    UnknownOperator { test: String, operator: String },

    #[error("foreach collection `{path}` resolved to {found}, not a sequence")]
    NonSequenceCollection { path: String, found: &'static str },
}
