//! Conversion functions and the `iif` conditional

use crate::model::types::{Type, normalize_choice, promote};
use crate::registry::function::{FunctionGroup, FunctionRegistry};
use crate::registry::signature::{CallTypes, FunctionSignature, ParameterInfo};

use super::single;

/// Either branch of `iif`
fn conditional_result(call: &CallTypes<'_>) -> Type {
    match call.arguments {
        [_, when_true, otherwise] if when_true == otherwise => when_true.clone(),
        [_, when_true, otherwise] => promote(when_true, otherwise)
            .unwrap_or_else(|| normalize_choice(vec![when_true.clone(), otherwise.clone()])),
        [_, when_true] => when_true.clone(),
        _ => Type::Null,
    }
}

/// Register conversion functions
pub fn register_conversion_functions(registry: &mut FunctionRegistry) {
    let group = FunctionGroup::Conversion;

    registry.register(
        group,
        FunctionSignature::computed(
            "iif",
            Type::generic("T"),
            vec![
                ParameterInfo::lambda("criterion", Type::Boolean),
                ParameterInfo::lambda("true-result", Type::generic("A")),
                ParameterInfo::optional_lambda("otherwise-result", Type::generic("B")),
            ],
            conditional_result,
        ),
    );

    let conversions = [
        ("toBoolean", Type::Boolean),
        ("toInteger", Type::Integer),
        ("toDecimal", Type::Decimal),
        ("toString", Type::String),
        ("toDate", Type::Date),
        ("toDateTime", Type::DateTime),
        ("toTime", Type::Time),
        ("toQuantity", Type::Quantity),
    ];
    for (name, target) in conversions {
        registry.register(
            group,
            FunctionSignature::new(name, Type::generic("T"), vec![], single(target)),
        );
    }

    for name in [
        "convertsToBoolean",
        "convertsToInteger",
        "convertsToDecimal",
        "convertsToString",
    ] {
        registry.register(
            group,
            FunctionSignature::new(name, Type::generic("T"), vec![], single(Type::Boolean)),
        );
    }
}
