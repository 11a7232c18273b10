//! Error taxonomy for the search engine.
//!
//! Configuration mistakes surface as [`GpError::InvalidArgument`]. The
//! remaining variants signal a broken structural invariant and are not
//! meant to be recovered from: the driving loop aborts or logs and stops.

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum GpError {
    /// Malformed configuration or input (e.g. `max_nodes_per_output < 2`).
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// A subtree index outside `1..=count` binary-operation nodes.
    #[error("subtree index {index} out of range: tree has {count} binary-operation nodes")]
    IndexOutOfRange { index: usize, count: usize },

    /// An operator was applied to a tree violating its structural precondition.
    #[error("invalid state: {0}")]
    InvalidState(String),

    /// Malformed program source text.
    #[error("parse error on line {line}: {message}")]
    Parse { line: usize, message: String },
}

pub type Result<T> = std::result::Result<T, GpError>;
