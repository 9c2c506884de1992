//! Turning token expressions into values through an external runtime
//!
//! The runtime only ever sees FHIRPath text: expressions are unparsed first,
//! with lambda specials rendered as ordinary variables so the resolver can
//! supply them.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::analyzer::program::Program;
use crate::model::value::FhirValue;
use crate::parser::tokens::Token;
use crate::parser::unparse::{UnparseOptions, unparse_expression};

use super::context::{BindingValues, VariableResolver};
use super::error::{RuntimeError, RuntimeResult};

/// A FHIRPath evaluation engine
pub trait EvaluationRuntime {
    /// Evaluate `expression` against `root`, looking variables up in `variables`
    fn evaluate(
        &self,
        root: &Value,
        expression: &str,
        variables: &dyn VariableResolver,
    ) -> RuntimeResult<Value>;
}

/// Values of a whole program
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProgramValues {
    /// Binding id to value, in evaluation order
    pub bindings: IndexMap<String, FhirValue>,
    /// Value of the main expression, `None` when it is empty
    pub expression: Option<FhirValue>,
}

/// Evaluate one expression.
///
/// An empty expression evaluates to the context value. A failure caused by a
/// referenced binding that already failed yields that binding's value, origin
/// included; any other failure yields a failed value whose origin is `name`.
pub fn expression_value(
    runtime: &dyn EvaluationRuntime,
    name: Option<&str>,
    expression: &[Token],
    variables: &BindingValues<'_>,
    context: &FhirValue,
    options: &UnparseOptions<'_>,
) -> FhirValue {
    let options = UnparseOptions {
        mock_specials: variables.in_lambda(),
        ..options.clone()
    };
    let code = unparse_expression(expression, &options);
    if code.is_empty() {
        return context.clone();
    }

    let origin = name.map(str::to_string);
    match runtime.evaluate(&context.value, &code, variables) {
        Ok(value) => FhirValue::with_origin(value, origin),
        Err(RuntimeError::Dependency(value)) => {
            let failed = value.origin.as_deref().unwrap_or("?");
            log::debug!("{code}: dependency {failed} failed");
            value
        }
        Err(RuntimeError::Failed { message, .. }) => {
            log::warn!("error evaluating {code}: {message}");
            FhirValue::failed(origin, message)
        }
        Err(error) => {
            log::warn!("error evaluating {code}: {error}");
            FhirValue::failed(origin, error.to_string())
        }
    }
}

/// Evaluate every binding in dependency order, then the main expression.
///
/// `external` holds host-supplied values such as the resource. As with
/// typing, the first binding carrying a name is the one other bindings see.
pub fn evaluate_program(
    runtime: &dyn EvaluationRuntime,
    program: &Program,
    context: &FhirValue,
    external: &IndexMap<String, FhirValue>,
    options: &UnparseOptions<'_>,
) -> ProgramValues {
    let owners = program.name_owners();
    let mut scope = external.clone();
    let mut values = ProgramValues::default();

    for id in program.bindings_order().keys() {
        let Some(binding) = program.binding(id) else {
            continue;
        };
        let value = expression_value(
            runtime,
            Some(&binding.name),
            &binding.expression,
            &BindingValues::new(&scope),
            context,
            options,
        );
        if owners.get(binding.name.as_str()) == Some(&id.as_str()) {
            scope.insert(binding.name.clone(), value.clone());
        }
        values.bindings.insert(id.clone(), value);
    }

    if !program.expression.is_empty() {
        values.expression = Some(expression_value(
            runtime,
            None,
            &program.expression,
            &BindingValues::new(&scope),
            context,
            options,
        ));
    }
    values
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::tokens::{Binding, FunctionArgument};
    use crate::registry::operator::OperatorName;
    use pretty_assertions::assert_eq;
    use serde_json::json;
    use std::cell::RefCell;

    /// Resolves `%name` texts, fails on anything containing `fail`, echoes the rest
    #[derive(Default)]
    struct ScriptedRuntime {
        seen: RefCell<Vec<String>>,
    }

    impl EvaluationRuntime for ScriptedRuntime {
        fn evaluate(
            &self,
            _root: &Value,
            expression: &str,
            variables: &dyn VariableResolver,
        ) -> RuntimeResult<Value> {
            self.seen.borrow_mut().push(expression.to_string());
            if let Some(name) = expression.strip_prefix('%') {
                if name.chars().all(|c| c.is_alphanumeric() || c == '_') {
                    return variables.resolve(name);
                }
            }
            if expression.contains("fail") {
                return Err(RuntimeError::failed(expression, "unsupported"));
            }
            Ok(Value::String(expression.to_string()))
        }
    }

    fn context() -> FhirValue {
        FhirValue::new(json!({"resourceType": "Patient"}))
    }

    #[test]
    fn test_empty_expression_yields_context() {
        let runtime = ScriptedRuntime::default();
        let values = IndexMap::new();
        let value = expression_value(
            &runtime,
            Some("x"),
            &[],
            &BindingValues::new(&values),
            &context(),
            &UnparseOptions::default(),
        );
        assert_eq!(value, context());
        assert!(runtime.seen.borrow().is_empty());
    }

    #[test]
    fn test_failures_carry_origin() {
        let runtime = ScriptedRuntime::default();
        let values = IndexMap::new();
        let value = expression_value(
            &runtime,
            Some("broken"),
            &[Token::field("fail")],
            &BindingValues::new(&values),
            &context(),
            &UnparseOptions::default(),
        );
        assert_eq!(value.origin.as_deref(), Some("broken"));
        assert_eq!(value.error_message(), Some("unsupported"));
    }

    #[test]
    fn test_specials_are_mocked_inside_lambdas() {
        let runtime = ScriptedRuntime::default();
        let values = IndexMap::new();
        let this = FhirValue::new(json!("item"));
        let variables = BindingValues::new(&values).with_specials(&this, 0);
        let value = expression_value(
            &runtime,
            None,
            &[Token::special("$this")],
            &variables,
            &context(),
            &UnparseOptions::default(),
        );
        assert_eq!(value.value, json!("item"));
        assert_eq!(runtime.seen.borrow().as_slice(), ["%__this"]);
    }

    #[test]
    fn test_program_evaluation_keeps_dependency_origin() {
        let program = Program::new(
            vec![
                Binding::with_id("c", "shown", vec![Token::variable("failing")]),
                Binding::with_id("a", "failing", vec![Token::field("fail")]),
                Binding::with_id("b", "ok", vec![Token::number("1")]),
            ],
            vec![
                Token::variable("ok"),
                Token::operator(OperatorName::Plus),
                Token::function("count", vec![FunctionArgument::default()]),
            ],
        );
        let runtime = ScriptedRuntime::default();
        let values = evaluate_program(
            &runtime,
            &program,
            &context(),
            &IndexMap::new(),
            &UnparseOptions::default(),
        );

        let order: Vec<_> = values.bindings.keys().collect();
        assert_eq!(order, vec!["a", "c", "b"]);
        assert_eq!(values.bindings["a"].origin.as_deref(), Some("failing"));
        // `shown` inherits the failure of `failing`
        assert_eq!(values.bindings["c"], values.bindings["a"]);
        assert_eq!(values.bindings["b"].value, json!("1"));
        assert_eq!(
            values.expression.map(|v| v.value),
            Some(json!("%ok + count()"))
        );
    }
}
