//! Operator overload resolution through the standard registry

use octofhir_fhirpath_editor::model::{Type, TypeErrorKind};
use octofhir_fhirpath_editor::registry::{
    OperatorGroup, OperatorName, OperatorRegistry, OperatorReturnType, create_standard_registries,
};
use pretty_assertions::assert_eq;
use rstest::rstest;

fn operators() -> OperatorRegistry {
    create_standard_registries().1
}

fn single(ty: Type) -> Type {
    Type::single(ty)
}

#[rstest]
#[case(OperatorName::Plus, Type::Integer, Type::Integer, Type::Integer)]
#[case(OperatorName::Plus, Type::Integer, Type::Decimal, Type::Decimal)]
#[case(OperatorName::Plus, Type::String, Type::String, Type::String)]
#[case(OperatorName::Plus, Type::Date, Type::Quantity, Type::Date)]
#[case(OperatorName::Minus, Type::DateTime, Type::Quantity, Type::DateTime)]
#[case(OperatorName::Multiply, Type::Decimal, Type::Integer, Type::Decimal)]
#[case(OperatorName::Divide, Type::Integer, Type::Integer, Type::Decimal)]
#[case(OperatorName::Div, Type::Decimal, Type::Decimal, Type::Integer)]
#[case(OperatorName::Mod, Type::Integer, Type::Integer, Type::Integer)]
#[case(OperatorName::Concat, Type::String, Type::String, Type::String)]
#[case(OperatorName::Equals, Type::Decimal, Type::Integer, Type::Boolean)]
#[case(OperatorName::Equals, Type::Integer, Type::Decimal, Type::Boolean)]
#[case(OperatorName::LessThan, Type::Date, Type::Date, Type::Boolean)]
#[case(OperatorName::And, Type::Boolean, Type::Boolean, Type::Boolean)]
#[case(OperatorName::Implies, Type::Boolean, Type::Boolean, Type::Boolean)]
fn test_single_operands(
    #[case] operator: OperatorName,
    #[case] left: Type,
    #[case] right: Type,
    #[case] expected: Type,
) {
    assert_eq!(
        operators().resolve_operator(operator, &single(left), &single(right)),
        single(expected)
    );
}

#[rstest]
#[case(OperatorName::Plus, Type::Date, Type::Boolean, "single Date", "single Boolean")]
#[case(OperatorName::Multiply, Type::String, Type::Integer, "single String", "single Integer")]
#[case(OperatorName::And, Type::Integer, Type::Boolean, "single Integer", "single Boolean")]
#[case(OperatorName::Concat, Type::String, Type::Date, "single String", "single Date")]
fn test_mismatch_names_both_operands(
    #[case] operator: OperatorName,
    #[case] left: Type,
    #[case] right: Type,
    #[case] left_description: &str,
    #[case] right_description: &str,
) {
    let result = operators().resolve_operator(operator, &single(left), &single(right));
    let error = result.as_error().expect("mismatch must be invalid");
    assert_eq!(error.kind, TypeErrorKind::TypeMismatch);
    let message = &error.message;
    assert!(message.contains(left_description), "{message}");
    assert!(message.contains(right_description), "{message}");
    assert_eq!(error.position, None);
}

#[test]
fn test_every_concrete_overload_resolves_to_its_return_type() {
    let registry = operators();
    for signature in registry.signatures() {
        if signature.left.contains_generics() || signature.right.contains_generics() {
            continue;
        }
        let OperatorReturnType::Fixed(expected) = &signature.return_type else {
            continue;
        };
        let result = registry.resolve_operator(signature.name, &signature.left, &signature.right);
        assert!(!result.is_invalid(), "{signature} resolved to {result}");
        assert_eq!(&result, expected, "{signature}");
    }
}

#[test]
fn test_collections_are_not_single_operands() {
    let registry = operators();
    let result = registry.resolve_operator(
        OperatorName::Plus,
        &Type::Integer,
        &single(Type::Integer),
    );
    assert!(result.is_invalid());
}

#[test]
fn test_invalid_operand_is_returned_unchanged() {
    let registry = operators();
    let broken = Type::invalid_at(TypeErrorKind::UnknownIdentifier, "Unknown variable x", 4);
    assert_eq!(
        registry.resolve_operator(OperatorName::Plus, &broken, &single(Type::Integer)),
        broken
    );
    assert_eq!(
        registry.resolve_operator(OperatorName::Plus, &single(Type::Integer), &broken),
        broken
    );
}

#[test]
fn test_membership_and_type_operators() {
    let registry = operators();
    let boolean = single(Type::Boolean);
    assert_eq!(
        registry.resolve_operator(OperatorName::In, &single(Type::String), &Type::String),
        boolean
    );
    assert_eq!(
        registry.resolve_operator(OperatorName::Contains, &Type::String, &single(Type::String)),
        boolean
    );
    assert_eq!(
        registry.resolve_operator(
            OperatorName::Is,
            &single(Type::complex(["Patient"])),
            &Type::type_of(Type::complex(["Patient"]))
        ),
        boolean
    );
}

#[test]
fn test_right_types_follow_left_operand() {
    let registry = operators();
    let right = registry.suggest_right_types_for_operator(OperatorName::Plus, &single(Type::Date));
    assert_eq!(right, single(Type::Quantity));

    let none = registry.suggest_right_types_for_operator(OperatorName::And, &single(Type::Date));
    assert_eq!(none, Type::choice(vec![]));
}

#[test]
fn test_operator_metadata() {
    assert_eq!(OperatorName::Divide.group(), OperatorGroup::Math);
    assert_eq!(OperatorName::Implies.group(), OperatorGroup::Logical);
    assert_eq!(OperatorName::Implies.precedence(), 1);
    assert!(OperatorName::Contains.is_keyword());
    assert_eq!(
        "mod".parse::<OperatorName>().map(OperatorName::symbol),
        Ok("mod")
    );
    assert!("^".parse::<OperatorName>().is_err());
}
