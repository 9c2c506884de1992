//! Whole programs: loading, typing, diagnostics, rendering and evaluation

use std::sync::Arc;

use indexmap::IndexMap;
use octofhir_fhirpath_editor::analyzer::{
    BindingTypes, DiagnosticSeverity, Program, TypeAnalyzer, collect_diagnostics,
    transitive_dependents,
};
use octofhir_fhirpath_editor::evaluator::{
    EvaluationRuntime, RuntimeError, RuntimeResult, VariableResolver, evaluate_program,
};
use octofhir_fhirpath_editor::model::{FhirSchema, FhirValue, Type};
use octofhir_fhirpath_editor::parser::{Binding, Token, UnparseOptions, unparse_program};
use pretty_assertions::assert_eq;
use serde_json::{Value, json};

/// `%greeting` built from the patient's first given name, bindings listed out of order
const GREETING_PROGRAM: &str = r#"{
    "bindings": [
        {
            "id": "b-greeting",
            "name": "greeting",
            "expression": [
                {"kind": "string", "value": "Hello "},
                {"kind": "operator", "value": "&"},
                {"kind": "variable", "value": "first"}
            ]
        },
        {
            "id": "b-first",
            "name": "first",
            "expression": [
                {"kind": "variable", "value": "given"},
                {"kind": "function", "value": "first"}
            ]
        },
        {
            "id": "b-given",
            "name": "given",
            "expression": [
                {"kind": "variable", "value": "resource"},
                {"kind": "field", "value": "name"},
                {"kind": "field", "value": "given"}
            ]
        }
    ],
    "expression": [{"kind": "variable", "value": "greeting"}]
}"#;

fn analyzer() -> TypeAnalyzer {
    TypeAnalyzer::new(Arc::new(FhirSchema::bundled()))
}

fn patient_scope() -> BindingTypes {
    let mut external = BindingTypes::new();
    external.insert(
        "resource".to_string(),
        Type::single(Type::complex(["Patient"])),
    );
    external
}

#[test]
fn test_bindings_are_typed_in_dependency_order() {
    let program = Program::from_json(GREETING_PROGRAM).unwrap();
    let order: Vec<String> = program.bindings_order().keys().cloned().collect();
    assert_eq!(order, vec!["b-given", "b-first", "b-greeting"]);

    let types = program
        .type_program(&analyzer(), &patient_scope(), &Type::Null)
        .unwrap();
    assert_eq!(types.bindings.keys().cloned().collect::<Vec<_>>(), order);
    assert_eq!(types.binding("b-given"), Some(&Type::String));
    assert_eq!(types.binding("b-first"), Some(&Type::single(Type::String)));
    assert_eq!(types.expression, Some(Type::single(Type::String)));
    assert!(!types.has_errors());
    assert!(collect_diagnostics(&program, &types).is_empty());
}

#[test]
fn test_broken_binding_propagates_to_dependents() {
    let mut program = Program::from_json(GREETING_PROGRAM).unwrap();
    program.bindings[2].expression[2] = Token::field("nickname");

    let types = program
        .type_program(&analyzer(), &patient_scope(), &Type::Null)
        .unwrap();
    assert!(types.bindings.values().all(Type::is_invalid));

    let diagnostics = collect_diagnostics(&program, &types);
    let summary: Vec<(Option<&str>, Option<usize>)> = diagnostics
        .iter()
        .map(|d| (d.binding.as_deref(), d.position))
        .collect();
    assert_eq!(
        summary,
        vec![
            (Some("greeting"), Some(2)),
            (Some("first"), Some(0)),
            (Some("given"), Some(2)),
            (None, Some(0)),
        ]
    );
    assert!(
        diagnostics
            .iter()
            .all(|d| d.severity == DiagnosticSeverity::Error)
    );

    let dependents = transitive_dependents(&program.dependency_graph(), "b-given");
    assert_eq!(dependents, vec!["b-first", "b-greeting"]);
}

#[test]
fn test_program_renders_in_dependency_order() {
    let program = Program::from_json(GREETING_PROGRAM).unwrap();
    assert_eq!(
        unparse_program(&program, &UnparseOptions::default()),
        "defineVariable('given', %resource.name.given)\
         .defineVariable('first', %given.first())\
         .defineVariable('greeting', 'Hello ' & %first)\
         .select(%greeting)"
    );

    let bindings_only = Program::new(program.bindings.clone(), vec![]);
    assert!(
        !unparse_program(&bindings_only, &UnparseOptions::default()).contains("select")
    );
}

/// Resolves bare `%name` texts, fails anything mentioning `fail`, echoes the rest
struct EchoRuntime;

impl EvaluationRuntime for EchoRuntime {
    fn evaluate(
        &self,
        _root: &Value,
        expression: &str,
        variables: &dyn VariableResolver,
    ) -> RuntimeResult<Value> {
        if let Some(name) = expression.strip_prefix('%') {
            if variables.contains(name) {
                return variables.resolve(name);
            }
        }
        if expression.contains("fail") {
            return Err(RuntimeError::failed(expression, "cannot evaluate"));
        }
        Ok(Value::String(expression.to_string()))
    }
}

#[test]
fn test_failures_keep_their_origin_through_dependents() {
    let program = Program::new(
        vec![
            Binding::with_id("b1", "base", vec![Token::field("fail")]),
            Binding::with_id("b2", "copy", vec![Token::variable("base")]),
            Binding::with_id("b3", "label", vec![Token::string("x")]),
        ],
        vec![Token::variable("label")],
    );
    let patient = FhirValue::new(json!({"resourceType": "Patient"}));
    let mut external = IndexMap::new();
    external.insert("resource".to_string(), patient.clone());

    let values = evaluate_program(
        &EchoRuntime,
        &program,
        &patient,
        &external,
        &UnparseOptions::default(),
    );

    let base = &values.bindings["b1"];
    assert_eq!(base.origin.as_deref(), Some("base"));
    assert_eq!(base.error_message(), Some("cannot evaluate"));

    // the copy reports the failure of the binding it depends on
    assert_eq!(&values.bindings["b2"], base);

    let label = &values.bindings["b3"];
    assert!(!label.is_error());
    assert_eq!(label.origin.as_deref(), Some("label"));
    assert_eq!(label.value, json!("'x'"));

    let expression = values.expression.unwrap();
    assert_eq!(expression.value, json!("'x'"));
    assert_eq!(expression.origin, None);
}
