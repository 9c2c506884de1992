//! Type analysis core of a visual FHIRPath editor
//!
//! Expressions are composed as flat sequences of [`Token`]s rather than typed
//! as text. This crate computes the static [`Type`] of any token sequence,
//! suggests which tokens may come next, tracks dependencies between named
//! bindings, and renders programs back to FHIRPath text for an external
//! evaluation runtime.
//!
//! ```
//! use std::sync::Arc;
//! use octofhir_fhirpath_editor::{BindingTypes, FhirSchema, Token, Type, TypeAnalyzer};
//!
//! let analyzer = TypeAnalyzer::new(Arc::new(FhirSchema::bundled()));
//! let patient = Type::single(Type::complex(["Patient"]));
//! let ty = analyzer.expression_type(&[Token::field("birthDate")], &BindingTypes::new(), &patient);
//! assert_eq!(ty, Type::single(Type::Date));
//! ```

#![warn(missing_docs)]

pub mod analyzer;
pub mod config;
pub mod error;
pub mod evaluator;
pub mod model;
pub mod parser;
pub mod registry;

// Re-export main types
pub use analyzer::{
    BindingTypes, CompletionProvider, Diagnostic, LiteralDefaults, Program, ProgramTypes,
    SuggestedToken, SuggestionContext, TypeAnalyzer, TypeCache,
};
pub use config::EditorConfig;
pub use error::{EditorError, Result};
pub use evaluator::{BindingValues, EvaluationRuntime, RuntimeError, VariableResolver};
pub use model::{
    FhirSchema, FhirValue, FieldResolver, QuestionnaireItemRegistry, Type, TypeErrorKind,
};
pub use parser::{Binding, FunctionArgument, Token, TokenKind, unparse_expression, unparse_program};
pub use registry::{FunctionRegistry, OperatorName, OperatorRegistry, create_standard_registries};
