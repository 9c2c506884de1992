// Error types for the evaluation boundary

use thiserror::Error;

use crate::model::value::FhirValue;

/// Result type for evaluation runtime calls
pub type RuntimeResult<T> = Result<T, RuntimeError>;

/// Errors raised by an evaluation runtime or by variable lookup
#[derive(Error, Debug, Clone, PartialEq)]
pub enum RuntimeError {
    /// The runtime could not evaluate the expression
    #[error("Evaluation of {expression} failed: {message}")]
    Failed {
        /// Expression text handed to the runtime
        expression: String,
        /// Runtime message
        message: String,
    },

    /// Variable not found
    #[error("Variable {name} not found")]
    VariableNotFound {
        /// Variable name
        name: String,
    },

    /// A referenced binding holds a failed value
    #[error("{0}")]
    Dependency(FhirValue),
}

impl RuntimeError {
    /// Create a [`RuntimeError::Failed`]
    pub fn failed(expression: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Failed {
            expression: expression.into(),
            message: message.into(),
        }
    }
}
