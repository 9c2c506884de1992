//! Arithmetic operators: `+`, `-`, `*`, `/`, `div`, `mod`

use std::sync::LazyLock;

use crate::model::types::Type;
use crate::registry::operator::{OperatorName, OperatorRegistry};
use crate::registry::signature::OperatorSignature;

/// `(left, right, result)` element types; every operand and result is a single value
type NumericRow = (Type, Type, Type);

fn rows(name: OperatorName, table: Vec<NumericRow>) -> Vec<OperatorSignature> {
    table
        .into_iter()
        .map(|(left, right, result)| {
            OperatorSignature::binary(
                name,
                Type::single(left),
                Type::single(right),
                Type::single(result),
            )
        })
        .collect()
}

/// Numeric combinations shared by `+` and `-`, plus date/time shifting by a quantity
fn additive(name: OperatorName) -> Vec<OperatorSignature> {
    use Type::*;
    rows(
        name,
        vec![
            (Integer, Integer, Integer),
            (Integer, Decimal, Decimal),
            (Integer, Quantity, Quantity),
            (Decimal, Integer, Decimal),
            (Decimal, Decimal, Decimal),
            (Decimal, Quantity, Quantity),
            (Quantity, Integer, Quantity),
            (Quantity, Decimal, Quantity),
            (Quantity, Quantity, Quantity),
            (Date, Quantity, Date),
            (DateTime, Quantity, DateTime),
            (Time, Quantity, Time),
        ],
    )
}

static ARITHMETIC_SIGNATURES: LazyLock<Vec<OperatorSignature>> = LazyLock::new(|| {
    use Type::*;
    let mut signatures = additive(OperatorName::Plus);
    // String concatenation through `+`, listed after the numeric rows
    signatures.insert(
        9,
        OperatorSignature::binary(
            OperatorName::Plus,
            Type::single(String),
            Type::single(String),
            Type::single(String),
        ),
    );
    signatures.extend(additive(OperatorName::Minus));
    signatures.extend(rows(
        OperatorName::Multiply,
        vec![
            (Integer, Integer, Integer),
            (Integer, Decimal, Decimal),
            (Integer, Quantity, Quantity),
            (Decimal, Integer, Decimal),
            (Decimal, Decimal, Decimal),
            (Decimal, Quantity, Quantity),
            (Quantity, Integer, Quantity),
            (Quantity, Decimal, Quantity),
        ],
    ));
    signatures.extend(rows(
        OperatorName::Divide,
        vec![
            (Integer, Integer, Decimal),
            (Integer, Decimal, Decimal),
            (Integer, Quantity, Decimal),
            (Decimal, Integer, Decimal),
            (Decimal, Decimal, Decimal),
            (Decimal, Quantity, Decimal),
            (Quantity, Integer, Quantity),
            (Quantity, Decimal, Quantity),
            (Quantity, Quantity, Decimal),
        ],
    ));
    signatures.extend(rows(
        OperatorName::Mod,
        vec![
            (Integer, Integer, Integer),
            (Integer, Decimal, Decimal),
            (Decimal, Integer, Decimal),
            (Decimal, Decimal, Decimal),
        ],
    ));
    signatures.extend(rows(
        OperatorName::Div,
        vec![
            (Integer, Integer, Integer),
            (Integer, Decimal, Integer),
            (Decimal, Integer, Integer),
            (Decimal, Decimal, Integer),
        ],
    ));
    signatures
});

/// Register arithmetic operators
pub fn register_arithmetic_operators(registry: &mut OperatorRegistry) {
    for signature in ARITHMETIC_SIGNATURES.iter() {
        registry.register(signature.clone());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn registry() -> OperatorRegistry {
        let mut registry = OperatorRegistry::new();
        register_arithmetic_operators(&mut registry);
        registry
    }

    #[test]
    fn test_integer_rows_win_before_widening() {
        let registry = registry();
        let int = Type::single(Type::Integer);
        // Integer also matches Decimal patterns, so Integer,Integer must come first
        let ty = registry.resolve_operator(OperatorName::Minus, &int, &int);
        assert_eq!(ty, int);
        let ty = registry.resolve_operator(OperatorName::Mod, &int, &int);
        assert_eq!(ty, int);
    }

    #[test]
    fn test_date_shift_by_quantity() {
        let registry = registry();
        assert_eq!(
            registry.resolve_operator(
                OperatorName::Plus,
                &Type::single(Type::Date),
                &Type::single(Type::Quantity)
            ),
            Type::single(Type::Date)
        );
        assert!(
            registry
                .resolve_operator(
                    OperatorName::Multiply,
                    &Type::single(Type::Date),
                    &Type::single(Type::Quantity)
                )
                .is_invalid()
        );
    }

    #[test]
    fn test_string_plus() {
        let registry = registry();
        let string = Type::single(Type::String);
        let ty = registry.resolve_operator(OperatorName::Plus, &string, &string);
        assert_eq!(ty, string);
    }

    #[test]
    fn test_collections_are_rejected() {
        let registry = registry();
        let int = Type::single(Type::Integer);
        assert!(
            registry
                .resolve_operator(OperatorName::Plus, &Type::Integer, &int)
                .is_invalid()
        );
    }
}
