//! Crate-level error type
//!
//! Type-level failures inside expressions are never errors: they are values of
//! [`Type::Invalid`](crate::model::Type::Invalid). [`EditorError`] covers the
//! surrounding concerns: loading inputs, configuration, program structure and
//! the evaluation boundary.

use thiserror::Error;

use crate::analyzer::dependencies::CycleError;
use crate::evaluator::RuntimeError;

/// Result type for fallible editor operations
pub type Result<T> = std::result::Result<T, EditorError>;

/// Errors raised outside of type evaluation
#[derive(Error, Debug)]
pub enum EditorError {
    /// Reading an input file failed
    #[error("failed to read {path}: {source}")]
    Io {
        /// Path of the file that could not be read
        path: String,
        /// Underlying I/O error
        #[source]
        source: std::io::Error,
    },

    /// Input was not valid JSON or did not have the expected shape
    #[error("invalid JSON: {0}")]
    Json(#[from] serde_json::Error),

    /// Configuration value out of range
    #[error("invalid configuration: {message}")]
    Config {
        /// What is wrong with the configuration
        message: String,
    },

    /// Bindings reference each other in a cycle
    #[error(transparent)]
    Cycle(#[from] CycleError),

    /// A binding id that is not part of the program
    #[error("unknown binding {id}")]
    UnknownBinding {
        /// The id that was looked up
        id: String,
    },

    /// The evaluation runtime failed
    #[error(transparent)]
    Runtime(#[from] RuntimeError),
}
