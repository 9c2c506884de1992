//! Filtering and projection functions

use crate::model::types::Type;
use crate::registry::function::{FunctionGroup, FunctionRegistry};
use crate::registry::signature::{CallTypes, FunctionSignature, ParameterInfo};

use super::input_elements;

/// Elements produced by the projection argument
fn projected_elements(call: &CallTypes<'_>) -> Type {
    call.arguments
        .first()
        .map(Type::element)
        .unwrap_or(Type::Null)
}

/// Register filtering functions
pub fn register_filtering_functions(registry: &mut FunctionRegistry) {
    let group = FunctionGroup::Filtering;

    registry.register(
        group,
        FunctionSignature::computed(
            "where",
            Type::generic("T"),
            vec![ParameterInfo::lambda("criteria", Type::Boolean)],
            input_elements,
        ),
    );
    for name in ["select", "repeat"] {
        registry.register(
            group,
            FunctionSignature::computed(
                name,
                Type::generic("T"),
                vec![ParameterInfo::lambda("projection", Type::generic("R"))],
                projected_elements,
            ),
        );
    }
    let target = ParameterInfo::required("type", Type::type_of(Type::generic("X")));
    registry.register(
        group,
        FunctionSignature::new(
            "ofType",
            Type::generic("T"),
            vec![target],
            Type::generic("X"),
        ),
    );
}
