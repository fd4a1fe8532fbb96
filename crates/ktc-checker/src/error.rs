//! Unit-fatal failures.
//!
//! Semantic problems in user code are diagnostics in the trace. A
//! `CheckerError` means the input itself broke an invariant the checker
//! relies on, so the rest of the unit is not analyzed.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum CheckerError {
    #[error("callable reference resolved to an unsupported descriptor `{name}` ({kind})")]
    UnsupportedDescriptor { name: String, kind: &'static str },

    #[error("no class descriptor recorded for class node {node}")]
    MissingClassDescriptor { node: u32 },

    #[error("unknown callable descriptor {0}")]
    UnknownCallable(u32),

    #[error("node {node} is not a valid {expected}")]
    MalformedAst { node: u32, expected: &'static str },

    #[error("malformed unit: {0}")]
    MalformedUnit(String),

    #[error("initialization dataflow did not stabilize after {iterations} iterations")]
    DataflowDiverged { iterations: usize },
}

pub type CheckerResult<T> = Result<T, CheckerError>;
