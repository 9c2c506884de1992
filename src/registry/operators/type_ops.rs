//! Type test and cast operators

use std::sync::LazyLock;

use crate::model::type_pattern::TypeBindings;
use crate::model::types::{Type, normalize_choice};
use crate::registry::operator::{OperatorName, OperatorRegistry};
use crate::registry::signature::OperatorSignature;

fn cast_type(bindings: &TypeBindings, _left: &Type, right: &Type) -> Type {
    match bindings.get("X") {
        Some(target) => normalize_choice(vec![target.clone()]),
        None => right.element(),
    }
}

static TYPE_SIGNATURES: LazyLock<Vec<OperatorSignature>> = LazyLock::new(|| {
    vec![
        OperatorSignature::binary(
            OperatorName::Is,
            Type::generic("T"),
            Type::type_of(Type::generic("X")),
            Type::single(Type::Boolean),
        ),
        OperatorSignature::computed(
            OperatorName::As,
            Type::generic("T"),
            Type::type_of(Type::generic("X")),
            cast_type,
        ),
    ]
});

/// Register type operators
pub fn register_type_operators(registry: &mut OperatorRegistry) {
    for signature in TYPE_SIGNATURES.iter() {
        registry.register(signature.clone());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_as_returns_target_type() {
        let mut registry = OperatorRegistry::new();
        register_type_operators(&mut registry);

        let observation_value = Type::choice(vec![
            Type::single(Type::Quantity),
            Type::single(Type::String),
        ]);
        let target = Type::type_of(Type::Quantity);
        assert_eq!(
            registry.resolve_operator(OperatorName::As, &observation_value, &target),
            Type::Quantity
        );
        assert_eq!(
            registry.resolve_operator(OperatorName::Is, &observation_value, &target),
            Type::single(Type::Boolean)
        );
        let string = Type::single(Type::String);
        assert!(
            registry
                .resolve_operator(OperatorName::Is, &observation_value, &string)
                .is_invalid()
        );
    }
}
