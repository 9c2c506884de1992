//! Programs: named bindings plus an optional main expression
//!
//! Bindings are typed once each, in dependency order, so every binding sees
//! the types of the bindings it references.

use indexmap::IndexMap;
use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};

use crate::error::{EditorError, Result};
use crate::model::types::Type;
use crate::parser::tokens::{Binding, Token};

use super::dependencies::{
    DependencyGraph, build_dependency_graph, detect_cycles, transitive_dependents,
    walk_dependency_graph,
};
use super::type_analyzer::{BindingTypes, TypeAnalyzer};

/// A visually composed program
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Program {
    /// Named bindings, in display order
    #[serde(default)]
    pub bindings: Vec<Binding>,
    /// Main expression, empty when the program only defines bindings
    #[serde(default)]
    pub expression: Vec<Token>,
}

/// Types computed for a whole program
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProgramTypes {
    /// Binding id to type, in the order bindings were typed
    pub bindings: IndexMap<String, Type>,
    /// Type of the main expression, `None` when it is empty
    pub expression: Option<Type>,
}

impl ProgramTypes {
    /// Type of one binding
    pub fn binding(&self, id: &str) -> Option<&Type> {
        self.bindings.get(id)
    }

    /// Whether any binding or the main expression failed to type
    pub fn has_errors(&self) -> bool {
        self.bindings.values().any(Type::is_invalid)
            || self.expression.as_ref().is_some_and(Type::is_invalid)
    }
}

impl Program {
    /// Create a program
    pub fn new(bindings: Vec<Binding>, expression: Vec<Token>) -> Self {
        Self {
            bindings,
            expression,
        }
    }

    /// Parse a program from JSON
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Whether the program has neither bindings nor a main expression
    pub fn is_empty(&self) -> bool {
        self.bindings.is_empty() && self.expression.is_empty()
    }

    /// Binding with the given id
    pub fn binding(&self, id: &str) -> Option<&Binding> {
        self.bindings.iter().find(|binding| binding.id == id)
    }

    /// Binding with the given id, or [`EditorError::UnknownBinding`]
    pub fn require_binding(&self, id: &str) -> Result<&Binding> {
        self.binding(id)
            .ok_or_else(|| EditorError::UnknownBinding { id: id.to_string() })
    }

    /// Binding name to the id of the first binding carrying it
    pub fn name_owners(&self) -> FxHashMap<&str, &str> {
        let mut owners: FxHashMap<&str, &str> = FxHashMap::default();
        for binding in &self.bindings {
            owners
                .entry(binding.name.as_str())
                .or_insert(binding.id.as_str());
        }
        owners
    }

    /// Dependencies between the program's bindings
    pub fn dependency_graph(&self) -> DependencyGraph {
        build_dependency_graph(&self.bindings)
    }

    /// Position of each binding id in dependency order
    pub fn bindings_order(&self) -> IndexMap<String, usize> {
        let mut order = IndexMap::with_capacity(self.bindings.len());
        walk_dependency_graph(&self.dependency_graph(), |id| {
            let position = order.len();
            order.insert(id.to_string(), position);
        });
        order
    }

    /// Bindings the binding `id` may reference without creating a cycle:
    /// all of them except `id` itself and the bindings depending on it
    pub fn bindable_bindings(&self, id: &str) -> Vec<&Binding> {
        let dependents = transitive_dependents(&self.dependency_graph(), id);
        self.bindings
            .iter()
            .filter(|b| b.id != id && !dependents.contains(&b.id))
            .collect()
    }

    /// Type every binding in dependency order, then the main expression.
    ///
    /// `external` holds the types of variables supplied by the host, such as
    /// the resource. Program bindings shadow external variables of the same
    /// name; among program bindings the first one with a name wins. Cycles are
    /// tolerated unless the analyzer's configuration asks to detect them, in
    /// which case [`EditorError::Cycle`] is returned.
    pub fn type_program(
        &self,
        analyzer: &TypeAnalyzer,
        external: &BindingTypes,
        context: &Type,
    ) -> Result<ProgramTypes> {
        let graph = self.dependency_graph();
        if analyzer.config().detect_cycles {
            detect_cycles(&graph)?;
        }

        let by_id: FxHashMap<&str, &Binding> = self
            .bindings
            .iter()
            .map(|binding| (binding.id.as_str(), binding))
            .collect();
        let owners = self.name_owners();

        let mut scope = external.clone();
        let mut types = ProgramTypes::default();
        walk_dependency_graph(&graph, |id| {
            let Some(binding) = by_id.get(id) else {
                return;
            };
            let ty = analyzer.expression_type(&binding.expression, &scope, context);
            log::debug!("binding {} ({id}): {ty}", binding.name);
            if owners.get(binding.name.as_str()) == Some(&id) {
                scope.insert(binding.name.clone(), ty.clone());
            }
            types.bindings.insert(id.to_string(), ty);
        });

        if !self.expression.is_empty() {
            types.expression = Some(analyzer.expression_type(&self.expression, &scope, context));
        }
        Ok(types)
    }

    /// Variable types visible while editing binding `id`, or the main
    /// expression when `id` is `None`
    pub fn scope_for(
        &self,
        id: Option<&str>,
        types: &ProgramTypes,
        external: &BindingTypes,
    ) -> BindingTypes {
        let visible: Vec<&Binding> = match id {
            Some(id) => self.bindable_bindings(id),
            None => self.bindings.iter().collect(),
        };
        let mut scope = external.clone();
        let mut named = Vec::new();
        for binding in visible {
            if named.contains(&binding.name.as_str()) {
                continue;
            }
            if let Some(ty) = types.binding(&binding.id) {
                scope.insert(binding.name.clone(), ty.clone());
                named.push(binding.name.as_str());
            }
        }
        scope
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::EditorConfig;
    use crate::model::provider::FhirSchema;
    use crate::model::types::TypeErrorKind;
    use crate::registry::operator::OperatorName;
    use pretty_assertions::assert_eq;
    use std::sync::Arc;

    fn analyzer() -> TypeAnalyzer {
        TypeAnalyzer::new(Arc::new(FhirSchema::bundled()))
    }

    fn program() -> Program {
        Program::new(
            vec![
                Binding::with_id(
                    "total",
                    "total",
                    vec![
                        Token::variable("base"),
                        Token::operator(OperatorName::Plus),
                        Token::number("1.5"),
                    ],
                ),
                Binding::with_id("base", "base", vec![Token::number("41")]),
                Binding::with_id("label", "label", vec![Token::string("x")]),
            ],
            vec![Token::variable("total")],
        )
    }

    #[test]
    fn test_bindings_order_follows_dependencies() {
        let order = program().bindings_order();
        assert_eq!(
            order.into_iter().collect::<Vec<_>>(),
            vec![
                ("base".to_string(), 0),
                ("total".to_string(), 1),
                ("label".to_string(), 2)
            ]
        );
    }

    #[test]
    fn test_bindable_bindings_exclude_dependents() {
        let program = program();
        let ids = |id: &str| -> Vec<String> {
            program
                .bindable_bindings(id)
                .into_iter()
                .map(|binding| binding.id.clone())
                .collect()
        };
        assert_eq!(ids("base"), vec!["label"]);
        assert_eq!(ids("total"), vec!["base", "label"]);
    }

    #[test]
    fn test_type_program() {
        let types = program()
            .type_program(&analyzer(), &BindingTypes::new(), &Type::Null)
            .unwrap();
        assert_eq!(types.binding("base"), Some(&Type::single(Type::Integer)));
        assert_eq!(types.binding("total"), Some(&Type::single(Type::Decimal)));
        assert_eq!(types.expression, Some(Type::single(Type::Decimal)));
        assert!(!types.has_errors());
        assert_eq!(
            types.bindings.keys().collect::<Vec<_>>(),
            vec!["base", "total", "label"]
        );
    }

    #[test]
    fn test_cycles_tolerated_or_rejected() {
        let program = Program::new(
            vec![
                Binding::with_id("a", "a", vec![Token::variable("b")]),
                Binding::with_id("b", "b", vec![Token::variable("a")]),
            ],
            vec![],
        );
        let types = program
            .type_program(&analyzer(), &BindingTypes::new(), &Type::Null)
            .unwrap();
        assert_eq!(types.expression, None);
        let b = types.binding("b").unwrap();
        assert_eq!(
            b.as_error().map(|e| e.kind),
            Some(TypeErrorKind::UnknownIdentifier)
        );

        let config = EditorConfig {
            detect_cycles: true,
            ..EditorConfig::default()
        };
        let strict = analyzer().with_config(config);
        let error = program
            .type_program(&strict, &BindingTypes::new(), &Type::Null)
            .unwrap_err();
        assert!(matches!(error, EditorError::Cycle(_)));
    }

    #[test]
    fn test_first_binding_with_a_name_wins() {
        let program = Program::new(
            vec![
                Binding::with_id("1", "x", vec![Token::string("a")]),
                Binding::with_id("2", "x", vec![Token::number("1")]),
            ],
            vec![Token::variable("x")],
        );
        let types = program
            .type_program(&analyzer(), &BindingTypes::new(), &Type::Null)
            .unwrap();
        assert_eq!(types.expression, Some(Type::single(Type::String)));
    }

    #[test]
    fn test_scope_for_binding() {
        let program = program();
        let mut external = BindingTypes::new();
        external.insert(
            "resource".to_string(),
            Type::single(Type::complex(["Patient"])),
        );
        let types = program
            .type_program(&analyzer(), &external, &Type::Null)
            .unwrap();

        let scope = program.scope_for(Some("base"), &types, &external);
        assert_eq!(scope.keys().collect::<Vec<_>>(), vec!["resource", "label"]);

        let scope = program.scope_for(None, &types, &external);
        assert_eq!(scope.len(), 4);
    }

    #[test]
    fn test_program_from_json() {
        let json = r#"{
            "bindings": [{
                "id": "b1",
                "name": "n",
                "expression": [{"kind": "number", "value": "2"}]
            }],
            "expression": [{"kind": "variable", "value": "n"}]
        }"#;
        let program = Program::from_json(json).unwrap();
        assert_eq!(program.bindings[0].expression, vec![Token::number("2")]);
        assert!(program.require_binding("b1").is_ok());
        assert!(program.require_binding("nope").is_err());
        assert!(Program::default().is_empty());
    }
}
