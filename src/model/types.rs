//! Structural type model for visually composed FHIRPath expressions
//!
//! A bare element type (`Integer`, `Complex(["Patient"])`, ...) stands for a
//! collection that may hold any number of such elements. `Single` narrows it to
//! exactly one element. `Invalid` carries a typed error and is absorbing: any
//! composition that consumes it yields it back unchanged.

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Classification of type-level failures
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum TypeErrorKind {
    /// Operator, function or argument applied to an incompatible type
    TypeMismatch,
    /// Variable, field, function or answer link id that does not resolve
    UnknownIdentifier,
    /// Answer token used outside a QuestionnaireResponse context
    StructuralConstraintViolation,
    /// A chain with no tokens
    EmptyExpression,
}

/// Payload of [`Type::Invalid`]
#[derive(Error, Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[error("{message}")]
pub struct TypeError {
    /// What went wrong
    pub kind: TypeErrorKind,
    /// Human readable message
    pub message: String,
    /// Index of the token closest to the failure, when known
    pub position: Option<usize>,
}

impl TypeError {
    /// Create an error without a position
    pub fn new(kind: TypeErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            position: None,
        }
    }
}

/// Type of an expression or of a pattern in an operator/function signature
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(tag = "name", content = "of")]
pub enum Type {
    /// Boolean value
    Boolean,
    /// Integer numeric value
    Integer,
    /// Decimal numeric value
    Decimal,
    /// String value
    String,
    /// Date value
    Date,
    /// DateTime value
    DateTime,
    /// Time value
    Time,
    /// Quantity value with unit
    Quantity,
    /// The empty value
    Null,
    /// Named structural type, e.g. `["Patient"]` or `["QuestionnaireResponse", "item"]`
    Complex(Vec<String>),
    /// Exactly one element of the inner type
    Single(Box<Type>),
    /// One of several possible types, normalized (flat, sorted, deduplicated)
    Choice(Vec<Type>),
    /// Unbound type variable, only meaningful inside a signature pattern
    Generic(String),
    /// A type used as a value (right operand of `is`/`as`, argument of `ofType`)
    TypeType(Box<Type>),
    /// Failed type computation
    Invalid(TypeError),
}

/// System primitive types, in the order they are offered to users
pub const PRIMITIVE_TYPES: [Type; 8] = [
    Type::Boolean,
    Type::Integer,
    Type::Decimal,
    Type::String,
    Type::Date,
    Type::DateTime,
    Type::Time,
    Type::Quantity,
];

impl Type {
    /// Wrap a type as a single element. `Single` never nests and never wraps `Invalid`.
    pub fn single(inner: Type) -> Self {
        match inner {
            Type::Single(_) | Type::Invalid(_) => inner,
            other => Type::Single(Box::new(other)),
        }
    }

    /// Create a complex type from path segments
    pub fn complex<I, S>(path: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Type::Complex(path.into_iter().map(Into::into).collect())
    }

    /// Create a normalized choice
    pub fn choice(alternatives: Vec<Type>) -> Self {
        normalize_choice(alternatives)
    }

    /// Create a generic type variable
    pub fn generic(name: impl Into<String>) -> Self {
        Type::Generic(name.into())
    }

    /// Create a reified type
    pub fn type_of(inner: Type) -> Self {
        Type::TypeType(Box::new(inner))
    }

    /// Create an invalid type without position
    pub fn invalid(kind: TypeErrorKind, message: impl Into<String>) -> Self {
        Type::Invalid(TypeError::new(kind, message))
    }

    /// Create an invalid type at a token position
    pub fn invalid_at(kind: TypeErrorKind, message: impl Into<String>, position: usize) -> Self {
        Type::Invalid(TypeError {
            kind,
            message: message.into(),
            position: Some(position),
        })
    }

    /// Attach a position to an invalid type that has none yet
    pub fn or_position(self, position: usize) -> Self {
        match self {
            Type::Invalid(mut error) => {
                if error.position.is_none() {
                    error.position = Some(position);
                }
                Type::Invalid(error)
            }
            other => other,
        }
    }

    /// Replace the position of an invalid type
    pub fn at_position(self, position: usize) -> Self {
        match self {
            Type::Invalid(mut error) => {
                error.position = Some(position);
                Type::Invalid(error)
            }
            other => other,
        }
    }

    /// Check if this is the invalid type
    pub fn is_invalid(&self) -> bool {
        matches!(self, Type::Invalid(_))
    }

    /// Get the error carried by an invalid type
    pub fn as_error(&self) -> Option<&TypeError> {
        match self {
            Type::Invalid(error) => Some(error),
            _ => None,
        }
    }

    /// Check if this type holds exactly one element
    pub fn is_single(&self) -> bool {
        matches!(self, Type::Single(_))
    }

    /// Check if this is a system primitive type
    pub fn is_primitive(&self) -> bool {
        PRIMITIVE_TYPES.contains(self)
    }

    /// The element type of a collection: strips `Single`, distributes over `Choice`
    pub fn element(&self) -> Type {
        match self {
            Type::Single(inner) => (**inner).clone(),
            Type::Choice(alternatives) => {
                normalize_choice(alternatives.iter().map(Type::element).collect())
            }
            other => other.clone(),
        }
    }

    /// Check if any generic variable occurs in this type
    pub fn contains_generics(&self) -> bool {
        match self {
            Type::Generic(_) => true,
            Type::Single(inner) | Type::TypeType(inner) => inner.contains_generics(),
            Type::Choice(alternatives) => alternatives.iter().any(Type::contains_generics),
            _ => false,
        }
    }

    /// Name of a bare element type as used in FHIRPath source (`String`, `Patient`)
    pub fn element_name(&self) -> String {
        match self {
            Type::Boolean => "Boolean".to_string(),
            Type::Integer => "Integer".to_string(),
            Type::Decimal => "Decimal".to_string(),
            Type::String => "String".to_string(),
            Type::Date => "Date".to_string(),
            Type::DateTime => "DateTime".to_string(),
            Type::Time => "Time".to_string(),
            Type::Quantity => "Quantity".to_string(),
            Type::Null => "null".to_string(),
            Type::Complex(path) => path.join("."),
            Type::Generic(name) => name.clone(),
            Type::Single(inner) | Type::TypeType(inner) => inner.element_name(),
            Type::Choice(alternatives) => alternatives
                .iter()
                .map(Type::element_name)
                .collect::<Vec<_>>()
                .join(" | "),
            Type::Invalid(_) => "Invalid".to_string(),
        }
    }

    /// Human readable description for diagnostics
    pub fn describe(&self) -> String {
        match self {
            Type::Single(inner) => format!("single {}", inner.describe_element()),
            Type::Choice(alternatives) if alternatives.is_empty() => "nothing".to_string(),
            Type::Choice(alternatives) => {
                let described: Vec<String> = alternatives.iter().map(Type::describe).collect();
                format!("one of ({})", described.join(", "))
            }
            Type::Generic(name) => format!("any type {name}"),
            Type::TypeType(inner) => format!("type {}", inner.describe_element()),
            Type::Null => "null".to_string(),
            Type::Invalid(error) => format!("invalid ({})", error.message),
            other => format!("collection of {}", other.describe_element()),
        }
    }

    fn describe_element(&self) -> String {
        match self {
            Type::Single(_) | Type::Choice(_) | Type::Invalid(_) => self.describe(),
            other => other.element_name(),
        }
    }
}

impl fmt::Display for Type {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Type::Single(inner) => match inner.as_ref() {
                Type::Choice(_) => write!(f, "Single<{inner}>"),
                other => write!(f, "{}", other.element_name()),
            },
            Type::Choice(alternatives) => {
                let parts: Vec<String> = alternatives.iter().map(ToString::to_string).collect();
                write!(f, "({})", parts.join(" | "))
            }
            Type::Generic(name) => write!(f, "{name}"),
            Type::TypeType(inner) => write!(f, "Type<{inner}>"),
            Type::Null => write!(f, "null"),
            Type::Invalid(error) => write!(f, "Invalid({})", error.message),
            other => write!(f, "{}[]", other.element_name()),
        }
    }
}

/// Flatten, deduplicate and order the alternatives of a choice.
///
/// An invalid alternative makes the whole choice invalid. A choice with a
/// single remaining alternative collapses to that alternative.
pub fn normalize_choice(alternatives: Vec<Type>) -> Type {
    let mut flattened = Vec::with_capacity(alternatives.len());
    let mut pending = alternatives;
    while let Some(alternative) = pending.pop() {
        match alternative {
            Type::Choice(inner) => pending.extend(inner),
            Type::Invalid(_) => return alternative,
            other => flattened.push(other),
        }
    }
    flattened.sort();
    flattened.dedup();

    if flattened.len() == 1 {
        flattened.pop().unwrap_or(Type::Null)
    } else {
        Type::Choice(flattened)
    }
}

/// Common supertype of two types in a union context, if one exists.
///
/// The result is a bare element type: a union always produces a collection.
pub fn promote(a: &Type, b: &Type) -> Option<Type> {
    let (a, b) = (a.element(), b.element());
    if a == b {
        return Some(a);
    }
    match (&a, &b) {
        (Type::Integer, Type::Decimal) | (Type::Decimal, Type::Integer) => Some(Type::Decimal),
        (Type::Null, other) | (other, Type::Null) => Some(other.clone()),
        _ => None,
    }
}
