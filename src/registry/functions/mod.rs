//! Built-in function signatures, one module per suggestion group

pub mod aggregate;
pub mod combining;
pub mod conversion;
pub mod existence;
pub mod filtering;
pub mod math;
pub mod string;
pub mod subsetting;
pub mod utility;

use crate::model::types::Type;
use crate::registry::function::FunctionRegistry;
use crate::registry::signature::CallTypes;

/// Register all built-in functions
pub fn register_builtin_functions(registry: &mut FunctionRegistry) {
    existence::register_existence_functions(registry);
    filtering::register_filtering_functions(registry);
    subsetting::register_subsetting_functions(registry);
    combining::register_combining_functions(registry);
    conversion::register_conversion_functions(registry);
    string::register_string_functions(registry);
    math::register_math_functions(registry);
    aggregate::register_aggregate_functions(registry);
    utility::register_utility_functions(registry);
}

/// The input as a plain collection of its elements
pub(crate) fn input_elements(call: &CallTypes<'_>) -> Type {
    call.input.element()
}

/// One element of the input
pub(crate) fn single_input_element(call: &CallTypes<'_>) -> Type {
    Type::single(call.input.element())
}

/// The input unchanged
pub(crate) fn same_as_input(call: &CallTypes<'_>) -> Type {
    call.input.clone()
}

/// Shorthand for a single value of a primitive type
pub(crate) fn single(ty: Type) -> Type {
    Type::single(ty)
}
