//! Next-token suggestions over realistic editing sessions

use std::sync::Arc;

use chrono::NaiveDate;
use octofhir_fhirpath_editor::analyzer::completion_provider::START_KINDS;
use octofhir_fhirpath_editor::analyzer::{
    BindingTypes, CompletionProvider, LiteralDefaults, SuggestedToken, SuggestionContext,
    TypeAnalyzer, extract_operator_context, operator_context_span,
};
use octofhir_fhirpath_editor::model::{FhirSchema, Type};
use octofhir_fhirpath_editor::parser::{Token, TokenKind, TokenSpan, build_operator_tree};
use octofhir_fhirpath_editor::registry::OperatorName;
use pretty_assertions::assert_eq;

fn analyzer() -> TypeAnalyzer {
    TypeAnalyzer::new(Arc::new(FhirSchema::bundled()))
}

fn defaults() -> LiteralDefaults {
    let now = NaiveDate::from_ymd_opt(2024, 11, 2)
        .and_then(|date| date.and_hms_opt(8, 30, 0))
        .unwrap();
    LiteralDefaults::new(now)
}

fn patient() -> Type {
    Type::single(Type::complex(["Patient"]))
}

fn offers(suggestions: &[SuggestedToken], kind: TokenKind, label: &str) -> bool {
    labels(suggestions, kind).contains(&label.to_string())
}

fn labels(suggestions: &[SuggestedToken], kind: TokenKind) -> Vec<String> {
    suggestions
        .iter()
        .filter(|suggestion| suggestion.token.kind() == kind)
        .map(|suggestion| suggestion.label.clone())
        .collect()
}

fn find<'s>(suggestions: &'s [SuggestedToken], label: &str) -> &'s SuggestedToken {
    suggestions
        .iter()
        .find(|suggestion| suggestion.label == label)
        .unwrap_or_else(|| panic!("no suggestion labelled {label}"))
}

#[test]
fn test_backward_scan_agrees_with_tree_for_every_operator_pair() {
    for &first in &OperatorName::ALL {
        for &second in &OperatorName::ALL {
            let tokens = vec![
                Token::field("a"),
                Token::operator(first),
                Token::field("b"),
                Token::operator(second),
                Token::field("c"),
            ];
            let tree = build_operator_tree(&tokens);
            for position in [1, 3] {
                let node = tree.find_operator(position).unwrap();
                assert_eq!(
                    extract_operator_context(&tokens, position),
                    node.left_span,
                    "{first} then {second}, operator at {position}"
                );
            }

            // the span predicted before the second operator is typed
            assert_eq!(
                operator_context_span(&tokens[..3], 3, second),
                tree.find_operator(3).unwrap().left_span,
                "{first} then {second}"
            );
        }
    }
}

#[test]
fn test_missing_left_operand_has_no_context() {
    let tokens = vec![Token::operator(OperatorName::Plus)];
    assert_eq!(extract_operator_context(&tokens, 0), None);
    assert_eq!(extract_operator_context(&tokens, 5), None);
    assert_eq!(
        operator_context_span(&[Token::field("a")], 1, OperatorName::Or),
        Some(TokenSpan::single(0))
    );
}

#[test]
fn test_session_starting_from_empty_expression() {
    let analyzer = analyzer();
    let provider = CompletionProvider::new(&analyzer);
    let defaults = defaults();
    let mut bindings = BindingTypes::new();
    bindings.insert("resource".to_string(), patient());
    let context = SuggestionContext {
        bindings: &bindings,
        context: &patient(),
        in_lambda: false,
        defaults: &defaults,
    };

    let analysis = provider.analyze_next_token(&[], &context);
    assert_eq!(analysis.kinds, START_KINDS.to_vec());

    let suggestions = provider.suggest_next_tokens(&[], &context);
    assert!(offers(&suggestions, TokenKind::Field, "birthDate"));
    assert_eq!(labels(&suggestions, TokenKind::Variable), vec!["%resource"]);
    assert_eq!(labels(&suggestions, TokenKind::Date), vec!["2024-11-02"]);
    assert!(labels(&suggestions, TokenKind::Answer).is_empty());
    assert!(labels(&suggestions, TokenKind::Operator).is_empty());

    // birthDate
    let mut tokens = vec![Token::field("birthDate")];
    let suggestions = provider.suggest_next_tokens(&tokens, &context);
    assert!(!offers(&suggestions, TokenKind::Field, "birthDate"));
    assert!(!find(&suggestions, "<").incompatible);
    assert!(!find(&suggestions, "+").incompatible);
    assert!(find(&suggestions, "or").incompatible);

    // birthDate +
    tokens.push(Token::operator(OperatorName::Plus));
    let analysis = provider.analyze_next_token(&tokens, &context);
    assert_eq!(analysis.operator, Some(OperatorName::Plus));
    assert_eq!(analysis.context_span, Some(TokenSpan::single(0)));
    assert_eq!(analysis.left_type, Some(Type::single(Type::Date)));
    assert_eq!(analysis.right_types, Some(Type::single(Type::Quantity)));

    // birthDate + 0 seconds
    let suggestions = provider.suggest_next_tokens(&tokens, &context);
    let quantity = &suggestions
        .iter()
        .find(|suggestion| suggestion.token.kind() == TokenKind::Quantity)
        .unwrap()
        .token;
    tokens.push(quantity.clone());
    assert_eq!(
        analyzer.expression_type(&tokens, &bindings, &patient()),
        Type::single(Type::Date)
    );
}

#[test]
fn test_replacing_a_field_offers_siblings() {
    let analyzer = analyzer();
    let provider = CompletionProvider::new(&analyzer);
    let defaults = defaults();
    let bindings = BindingTypes::new();
    let context = SuggestionContext {
        bindings: &bindings,
        context: &patient(),
        in_lambda: false,
        defaults: &defaults,
    };

    let tokens = vec![Token::field("name"), Token::field("given")];
    let replacements = provider.suggest_tokens_at(&tokens, 1, &context);
    assert!(
        replacements
            .iter()
            .all(|suggestion| suggestion.token.kind() == TokenKind::Field)
    );
    let names = labels(&replacements, TokenKind::Field);
    assert!(names.contains(&"family".to_string()));
    assert!(names.contains(&"given".to_string()));

    assert!(provider.suggest_tokens_at(&tokens, 2, &context).is_empty());
}

#[test]
fn test_lambda_body_offers_specials() {
    let analyzer = analyzer();
    let provider = CompletionProvider::new(&analyzer);
    let defaults = defaults();
    let bindings = BindingTypes::new();
    let element = Type::single(Type::complex(["HumanName"]));
    let context = SuggestionContext {
        bindings: &bindings,
        context: &element,
        in_lambda: true,
        defaults: &defaults,
    };

    let suggestions = provider.suggest_next_tokens(&[], &context);
    let specials: Vec<&SuggestedToken> = suggestions
        .iter()
        .filter(|suggestion| suggestion.group.as_deref() == Some("Lambda"))
        .collect();
    assert_eq!(specials.len(), 2);
    assert!(offers(&suggestions, TokenKind::Field, "family"));
}
