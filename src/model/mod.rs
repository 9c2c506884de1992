//! Type model, data-model boundaries and runtime values
//!
//! Everything else in the crate is built on [`Type`] and the pattern matcher
//! in [`type_pattern`].

pub mod provider;
pub mod questionnaire;
pub mod type_pattern;
pub mod types;
pub mod value;

pub use provider::{ElementDefinition, FhirSchema, FieldResolver, TypeDefinition, primitive_type};
pub use questionnaire::{QuestionnaireItem, QuestionnaireItemRegistry};
pub use type_pattern::{
    TypeBindings, match_type_pattern, match_type_pattern_with, substitute_bindings,
};
pub use types::{PRIMITIVE_TYPES, Type, TypeError, TypeErrorKind, normalize_choice, promote};
pub use value::{FhirValue, ValueError};
