//! Boolean logic operators

use std::sync::LazyLock;

use crate::model::types::Type;
use crate::registry::operator::{OperatorName, OperatorRegistry};
use crate::registry::signature::OperatorSignature;

static LOGICAL_SIGNATURES: LazyLock<Vec<OperatorSignature>> = LazyLock::new(|| {
    [
        OperatorName::And,
        OperatorName::Or,
        OperatorName::Xor,
        OperatorName::Implies,
    ]
    .into_iter()
    .map(|name| {
        OperatorSignature::binary(
            name,
            Type::single(Type::Boolean),
            Type::single(Type::Boolean),
            Type::single(Type::Boolean),
        )
    })
    .collect()
});

/// Register logical operators
pub fn register_logical_operators(registry: &mut OperatorRegistry) {
    for signature in LOGICAL_SIGNATURES.iter() {
        registry.register(signature.clone());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_boolean_collections_are_rejected() {
        let mut registry = OperatorRegistry::new();
        register_logical_operators(&mut registry);
        let boolean = Type::single(Type::Boolean);
        assert_eq!(
            registry.resolve_operator(OperatorName::Implies, &boolean, &boolean),
            boolean
        );
        assert!(
            registry
                .resolve_operator(OperatorName::And, &Type::Boolean, &boolean)
                .is_invalid()
        );
    }
}
