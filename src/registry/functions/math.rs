//! Math functions

use crate::model::types::Type;
use crate::registry::function::{FunctionGroup, FunctionRegistry};
use crate::registry::signature::{CallTypes, FunctionSignature, ParameterInfo};

use super::{single, single_input_element};

fn power_result(call: &CallTypes<'_>) -> Type {
    let integral = call.input.element() == Type::Integer
        && call.arguments.first().map(Type::element) == Some(Type::Integer);
    if integral {
        single(Type::Integer)
    } else {
        single(Type::Decimal)
    }
}

/// Register math functions
pub fn register_math_functions(registry: &mut FunctionRegistry) {
    let group = FunctionGroup::Math;
    let number = || Type::choice(vec![Type::Integer, Type::Decimal]);

    registry.register(
        group,
        FunctionSignature::computed(
            "abs",
            Type::choice(vec![Type::Integer, Type::Decimal, Type::Quantity]),
            vec![],
            single_input_element,
        ),
    );
    for name in ["ceiling", "floor", "truncate"] {
        registry.register(
            group,
            FunctionSignature::new(name, Type::Decimal, vec![], single(Type::Integer)),
        );
    }
    registry.register(
        group,
        FunctionSignature::new(
            "round",
            Type::Decimal,
            vec![ParameterInfo::optional("precision", single(Type::Integer))],
            single(Type::Decimal),
        ),
    );
    for name in ["sqrt", "ln", "exp"] {
        registry.register(
            group,
            FunctionSignature::new(name, Type::Decimal, vec![], single(Type::Decimal)),
        );
    }
    registry.register(
        group,
        FunctionSignature::computed(
            "power",
            number(),
            vec![ParameterInfo::required("exponent", number())],
            power_result,
        ),
    );
}
