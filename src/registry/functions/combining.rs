//! Combining functions

use crate::model::types::{Type, normalize_choice, promote};
use crate::registry::function::{FunctionGroup, FunctionRegistry};
use crate::registry::signature::{CallTypes, FunctionSignature, ParameterInfo};

/// Elements of the input merged with the elements of the argument
fn merged_elements(call: &CallTypes<'_>) -> Type {
    match call.arguments.first() {
        Some(other) => promote(call.input, other)
            .unwrap_or_else(|| normalize_choice(vec![call.input.element(), other.element()])),
        None => call.input.element(),
    }
}

/// Register combining functions
pub fn register_combining_functions(registry: &mut FunctionRegistry) {
    for name in ["union", "combine"] {
        registry.register(
            FunctionGroup::Combining,
            FunctionSignature::computed(
                name,
                Type::generic("T"),
                vec![ParameterInfo::required("other", Type::generic("U"))],
                merged_elements,
            ),
        );
    }
}
