//! Aggregate functions over a whole collection

use crate::model::types::Type;
use crate::registry::function::{FunctionGroup, FunctionRegistry};
use crate::registry::signature::{CallTypes, FunctionSignature};

use super::single_input_element;

fn average(call: &CallTypes<'_>) -> Type {
    match call.input.element() {
        Type::Integer => Type::single(Type::Decimal),
        other => Type::single(other),
    }
}

/// Register aggregate functions
pub fn register_aggregate_functions(registry: &mut FunctionRegistry) {
    let group = FunctionGroup::Aggregate;
    let summable = || Type::choice(vec![Type::Integer, Type::Decimal, Type::Quantity]);
    let ordered = Type::choice(vec![
        Type::Integer,
        Type::Decimal,
        Type::Quantity,
        Type::Date,
        Type::DateTime,
        Type::Time,
        Type::String,
    ]);

    registry.register(
        group,
        FunctionSignature::computed("sum", summable(), vec![], single_input_element),
    );
    for name in ["min", "max"] {
        registry.register(
            group,
            FunctionSignature::computed(name, ordered.clone(), vec![], single_input_element),
        );
    }
    registry.register(
        group,
        FunctionSignature::computed("avg", summable(), vec![], average),
    );
}
