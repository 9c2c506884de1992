//! Membership and union operators

use std::sync::LazyLock;

use crate::model::type_pattern::TypeBindings;
use crate::model::types::{Type, normalize_choice, promote};
use crate::registry::operator::{OperatorName, OperatorRegistry};
use crate::registry::signature::OperatorSignature;

/// `A | B`: the common element type when one exists, otherwise a choice of both
fn union_type(bindings: &TypeBindings, left: &Type, right: &Type) -> Type {
    let a = bindings.get("A").unwrap_or(left);
    let b = bindings.get("B").unwrap_or(right);
    promote(a, b).unwrap_or_else(|| normalize_choice(vec![a.element(), b.element()]))
}

static COLLECTION_SIGNATURES: LazyLock<Vec<OperatorSignature>> = LazyLock::new(|| {
    vec![
        OperatorSignature::binary(
            OperatorName::In,
            Type::single(Type::generic("T")),
            Type::generic("T"),
            Type::single(Type::Boolean),
        ),
        OperatorSignature::binary(
            OperatorName::Contains,
            Type::generic("T"),
            Type::single(Type::generic("T")),
            Type::single(Type::Boolean),
        ),
        OperatorSignature::computed(
            OperatorName::Union,
            Type::generic("A"),
            Type::generic("B"),
            union_type,
        ),
    ]
});

/// Register collection operators
pub fn register_collection_operators(registry: &mut OperatorRegistry) {
    for signature in COLLECTION_SIGNATURES.iter() {
        registry.register(signature.clone());
    }
}
