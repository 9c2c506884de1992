//! Values produced by evaluating bindings

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

/// Error stored on a value whose evaluation failed
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValueError {
    /// Failure message reported by the evaluation runtime
    pub message: String,
}

/// Result of evaluating an expression or binding
///
/// A failed evaluation is still a value: it carries the error together with
/// the name of the binding that produced it (its origin), so a dependent
/// binding can tell its own failure from a failure it inherited.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct FhirValue {
    /// JSON payload, `null` when evaluation failed
    pub value: Value,
    /// Name of the binding that produced this value
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub origin: Option<String>,
    /// Failure, if evaluation did not succeed
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<ValueError>,
}

impl FhirValue {
    /// Wrap a successful value without origin
    pub fn new(value: Value) -> Self {
        Self {
            value,
            origin: None,
            error: None,
        }
    }

    /// Wrap a successful value produced by a named binding
    pub fn with_origin(value: Value, origin: Option<String>) -> Self {
        Self {
            value,
            origin,
            error: None,
        }
    }

    /// Create a failed value
    pub fn failed(origin: Option<String>, message: impl Into<String>) -> Self {
        Self {
            value: Value::Null,
            origin,
            error: Some(ValueError {
                message: message.into(),
            }),
        }
    }

    /// Whether evaluation failed
    pub fn is_error(&self) -> bool {
        self.error.is_some()
    }

    /// Failure message, if any
    pub fn error_message(&self) -> Option<&str> {
        self.error.as_ref().map(|error| error.message.as_str())
    }
}

impl fmt::Display for FhirValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (&self.error, &self.origin) {
            (Some(error), Some(origin)) => write!(f, "error in {origin}: {}", error.message),
            (Some(error), None) => write!(f, "error: {}", error.message),
            (None, _) => write!(f, "{}", self.value),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_failed_value_keeps_origin() {
        let failed = FhirValue::failed(Some("weight".to_string()), "boom");
        assert!(failed.is_error());
        assert_eq!(failed.error_message(), Some("boom"));
        assert_eq!(failed.to_string(), "error in weight: boom");
    }

    #[test]
    fn test_successful_value_display() {
        let value = FhirValue::new(json!([1, 2]));
        assert!(!value.is_error());
        assert_eq!(value.to_string(), "[1,2]");
    }
}
