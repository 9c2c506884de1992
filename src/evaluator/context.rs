//! Variable lookup handed to the evaluation runtime

use indexmap::IndexMap;
use serde_json::Value;

use crate::model::value::FhirValue;
use crate::parser::tokens::SPECIAL_VARIABLES;
use crate::parser::unparse::mocked_special_name;

use super::error::{RuntimeError, RuntimeResult};

/// Explicit name to value lookup for variables referenced as `%name`
pub trait VariableResolver {
    /// Whether `name` is bound
    fn contains(&self, name: &str) -> bool;

    /// Value bound to `name`.
    ///
    /// A binding whose evaluation failed resolves to
    /// [`RuntimeError::Dependency`] carrying the failed value.
    fn resolve(&self, name: &str) -> RuntimeResult<Value>;
}

/// Values of evaluated bindings, by name
#[derive(Debug, Clone)]
pub struct BindingValues<'a> {
    values: &'a IndexMap<String, FhirValue>,
    lambda: Option<LambdaValues<'a>>,
}

#[derive(Debug, Clone)]
struct LambdaValues<'a> {
    this: &'a FhirValue,
    index: usize,
}

impl<'a> BindingValues<'a> {
    /// Resolver over stored binding values
    pub fn new(values: &'a IndexMap<String, FhirValue>) -> Self {
        Self {
            values,
            lambda: None,
        }
    }

    /// Also resolve the mocked `$this` and `$index` variables
    pub fn with_specials(mut self, this: &'a FhirValue, index: usize) -> Self {
        self.lambda = Some(LambdaValues { this, index });
        self
    }

    /// Whether lambda specials are resolvable
    pub fn in_lambda(&self) -> bool {
        self.lambda.is_some()
    }

    fn special(&self, name: &str) -> Option<FhirValue> {
        let lambda = self.lambda.as_ref()?;
        let special = SPECIAL_VARIABLES
            .into_iter()
            .find(|special| mocked_special_name(special) == name)?;
        match special {
            "$this" => Some(lambda.this.clone()),
            _ => Some(FhirValue::new(Value::from(lambda.index))),
        }
    }
}

impl VariableResolver for BindingValues<'_> {
    fn contains(&self, name: &str) -> bool {
        self.special(name).is_some() || self.values.contains_key(name)
    }

    fn resolve(&self, name: &str) -> RuntimeResult<Value> {
        let value = match self.special(name) {
            Some(value) => value,
            None => self
                .values
                .get(name)
                .cloned()
                .ok_or_else(|| RuntimeError::VariableNotFound {
                    name: name.to_string(),
                })?,
        };
        if value.is_error() {
            return Err(RuntimeError::Dependency(value));
        }
        Ok(value.value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn test_resolves_stored_values() {
        let mut values = IndexMap::new();
        values.insert("age".to_string(), FhirValue::new(json!(42)));
        values.insert(
            "broken".to_string(),
            FhirValue::failed(Some("broken".to_string()), "boom"),
        );
        let resolver = BindingValues::new(&values);

        assert!(resolver.contains("age"));
        assert_eq!(resolver.resolve("age"), Ok(json!(42)));
        assert_eq!(
            resolver.resolve("nope"),
            Err(RuntimeError::VariableNotFound {
                name: "nope".to_string()
            })
        );
        let Err(RuntimeError::Dependency(failed)) = resolver.resolve("broken") else {
            panic!("expected a dependency failure");
        };
        assert_eq!(failed.origin.as_deref(), Some("broken"));
    }

    #[test]
    fn test_specials_only_inside_lambda() {
        let values = IndexMap::new();
        let this = FhirValue::new(json!({"family": "Doe"}));
        let outside = BindingValues::new(&values);
        assert!(!outside.contains("__this"));

        let inside = BindingValues::new(&values).with_specials(&this, 3);
        assert!(inside.in_lambda());
        assert_eq!(inside.resolve("__this"), Ok(json!({"family": "Doe"})));
        assert_eq!(inside.resolve("__index"), Ok(json!(3)));
    }
}
