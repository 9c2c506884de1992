// Copyright 2024 OctoFHIR Team
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Type evaluation of token expressions
//!
//! The analyzer walks the operator tree of an expression post-order. Operator
//! nodes are resolved against the operator registry, chains are typed token by
//! token starting from the context type. Failures are `Invalid` types that
//! short-circuit everything built on top of them, positioned at the token
//! closest to the failure.

use std::borrow::Cow;
use std::sync::Arc;

use indexmap::IndexMap;

use crate::config::EditorConfig;
use crate::model::provider::FieldResolver;
use crate::model::questionnaire::QuestionnaireItemRegistry;
use crate::model::type_pattern::match_type_pattern;
use crate::model::types::{Type, TypeErrorKind};
use crate::parser::operator_tree::{OperatorTree, build_operator_tree};
use crate::parser::tokens::{FunctionArgument, Token, special_name};
use crate::registry::{FunctionRegistry, OperatorRegistry, create_standard_registries};

use super::type_cache::{TypeCache, TypeCacheKey};

/// Variable name to the type of its value
pub type BindingTypes = IndexMap<String, Type>;

/// Type of the resource an answer token reads from
const QUESTIONNAIRE_RESPONSE: &str = "QuestionnaireResponse";

/// Typing environment of one (sub)expression
struct Scope<'s> {
    bindings: &'s BindingTypes,
    context: &'s Type,
    depth: usize,
}

/// Computes the types of token expressions
pub struct TypeAnalyzer {
    functions: Arc<FunctionRegistry>,
    operators: Arc<OperatorRegistry>,
    resolver: Arc<dyn FieldResolver>,
    questionnaire: Arc<QuestionnaireItemRegistry>,
    config: EditorConfig,
    cache: Option<TypeCache>,
}

impl TypeAnalyzer {
    /// Create an analyzer with the built-in registries and no questionnaire
    pub fn new(resolver: Arc<dyn FieldResolver>) -> Self {
        let (functions, operators) = create_standard_registries();
        Self {
            functions: Arc::new(functions),
            operators: Arc::new(operators),
            resolver,
            questionnaire: Arc::new(QuestionnaireItemRegistry::new()),
            config: EditorConfig::default(),
            cache: None,
        }
    }

    /// Use custom registries
    pub fn with_registries(
        mut self,
        functions: Arc<FunctionRegistry>,
        operators: Arc<OperatorRegistry>,
    ) -> Self {
        self.functions = functions;
        self.operators = operators;
        self
    }

    /// Use the items of a questionnaire for answer tokens
    pub fn with_questionnaire(mut self, questionnaire: Arc<QuestionnaireItemRegistry>) -> Self {
        self.questionnaire = questionnaire;
        self
    }

    /// Use a custom configuration
    pub fn with_config(mut self, config: EditorConfig) -> Self {
        self.config = config;
        self
    }

    /// Memoize top-level typing requests
    pub fn with_cache(mut self, cache: TypeCache) -> Self {
        self.cache = Some(cache);
        self
    }

    /// Function registry
    pub fn functions(&self) -> &FunctionRegistry {
        &self.functions
    }

    /// Operator registry
    pub fn operators(&self) -> &OperatorRegistry {
        &self.operators
    }

    /// Field resolver
    pub fn resolver(&self) -> &dyn FieldResolver {
        self.resolver.as_ref()
    }

    /// Questionnaire items available to answer tokens
    pub fn questionnaire(&self) -> &QuestionnaireItemRegistry {
        &self.questionnaire
    }

    /// Configuration
    pub fn config(&self) -> &EditorConfig {
        &self.config
    }

    /// Attached cache, if any
    pub fn cache(&self) -> Option<&TypeCache> {
        self.cache.as_ref()
    }

    /// Type of `tokens` evaluated against `context`.
    ///
    /// Positions of returned errors are indices into `tokens`. An empty
    /// expression is `Invalid` with [`TypeErrorKind::EmptyExpression`].
    pub fn expression_type(
        &self,
        tokens: &[Token],
        bindings: &BindingTypes,
        context: &Type,
    ) -> Type {
        let scope = Scope {
            bindings,
            context,
            depth: 0,
        };
        match &self.cache {
            Some(cache) => {
                let key = TypeCacheKey::new(tokens, bindings, context);
                cache.get_or_insert_with(key, || self.evaluate(tokens, &scope))
            }
            None => self.evaluate(tokens, &scope),
        }
    }

    /// Whether the binding holding the resource is a QuestionnaireResponse
    pub fn is_questionnaire_response(&self, bindings: &BindingTypes) -> bool {
        let response = Type::complex([QUESTIONNAIRE_RESPONSE]);
        bindings
            .get(&self.config.resource_binding)
            .is_some_and(|resource| match_type_pattern(&response, resource).is_some())
    }

    fn evaluate(&self, tokens: &[Token], scope: &Scope<'_>) -> Type {
        let tree = build_operator_tree(tokens);
        let ty = self.tree_type(&tree, scope);
        log::trace!(
            "typed {} tokens at depth {} as {ty}",
            tokens.len(),
            scope.depth
        );
        ty
    }

    fn tree_type(&self, tree: &OperatorTree<'_>, scope: &Scope<'_>) -> Type {
        match tree {
            OperatorTree::Chain(chain) => self.chain_type(chain.tokens, chain.start, scope),
            OperatorTree::Operator(node) => {
                let left = self.tree_type(&node.left, scope);
                if left.is_invalid() {
                    return left;
                }
                let right = self.tree_type(&node.right, scope);
                if right.is_invalid() {
                    return right;
                }

                let result = self
                    .operators
                    .resolve_operator(node.operator, &left, &right);
                if result.is_invalid() {
                    log::debug!("operator at {} rejected: {result}", node.position);
                    return result.or_position(node.position);
                }
                result
            }
        }
    }

    fn chain_type(&self, tokens: &[Token], start: usize, scope: &Scope<'_>) -> Type {
        let Some(first) = tokens.first() else {
            return Type::invalid_at(TypeErrorKind::EmptyExpression, "Empty expression", start);
        };

        let (mut current, skip) = match self.seed_type(first, start, scope) {
            Some(seed) => (seed, 1),
            None => (scope.context.clone(), 0),
        };

        for (offset, token) in tokens.iter().enumerate().skip(skip) {
            if current.is_invalid() {
                break;
            }
            current = self.step_type(&current, token, start + offset, scope);
        }
        current
    }

    /// Type produced by a token that starts a chain, `None` for navigation tokens
    fn seed_type(&self, token: &Token, position: usize, scope: &Scope<'_>) -> Option<Type> {
        let ty = match token {
            Token::String { .. } => Type::single(Type::String),
            Token::Number { value } if value.contains('.') => Type::single(Type::Decimal),
            Token::Number { .. } => Type::single(Type::Integer),
            Token::Boolean { .. } => Type::single(Type::Boolean),
            Token::Date { .. } => Type::single(Type::Date),
            Token::DateTime { .. } => Type::single(Type::DateTime),
            Token::Time { .. } => Type::single(Type::Time),
            Token::Quantity { .. } => Type::single(Type::Quantity),
            Token::Null => Type::single(Type::Null),
            Token::Type { value } => Type::type_of(value.clone()),
            Token::Variable {
                value,
                special: true,
            } => match special_name(value) {
                Some("$this") => Type::single(scope.context.clone()),
                Some("$index") => Type::single(Type::Integer),
                _ => Type::invalid_at(
                    TypeErrorKind::UnknownIdentifier,
                    format!("Unknown keyword {value}"),
                    position,
                ),
            },
            Token::Variable { value, .. } => match scope.bindings.get(value) {
                Some(ty) if ty.is_invalid() => ty.clone().at_position(position),
                Some(ty) => ty.clone(),
                None => Type::invalid_at(
                    TypeErrorKind::UnknownIdentifier,
                    format!("Unknown variable {value}"),
                    position,
                ),
            },
            Token::Field { .. }
            | Token::Index { .. }
            | Token::Answer { .. }
            | Token::Operator { .. }
            | Token::Function { .. } => return None,
        };
        Some(ty)
    }

    /// Type after applying a navigation token to `current`
    fn step_type(&self, current: &Type, token: &Token, position: usize, scope: &Scope<'_>) -> Type {
        match token {
            Token::Index { .. } => Type::single(current.element()),
            Token::Field { value } => match self.resolver.fields(current).shift_remove(value) {
                Some(ty) => ty,
                None => Type::invalid_at(
                    TypeErrorKind::UnknownIdentifier,
                    format!("Unknown field \"{value}\" on {}", current.describe()),
                    position,
                ),
            },
            Token::Function { value, args } => {
                let result = self.function_type(value, args, current, scope);
                if result.is_invalid() {
                    result.at_position(position)
                } else {
                    result
                }
            }
            Token::Answer { value } => self.answer_type(value, scope).or_position(position),
            other => Type::invalid_at(
                TypeErrorKind::TypeMismatch,
                format!("Unexpected {} after {}", other.kind(), current.describe()),
                position,
            ),
        }
    }

    fn function_type(
        &self,
        name: &str,
        args: &[FunctionArgument],
        input: &Type,
        scope: &Scope<'_>,
    ) -> Type {
        let mut argument_type = |index: usize, argument_context: &Type| {
            self.argument_type(args.get(index)?, argument_context, scope)
        };
        self.functions.resolve_function_call(
            name,
            input,
            scope.context,
            args.len(),
            self.resolver.as_ref(),
            &mut argument_type,
        )
    }

    /// Type of one function argument; `None` when the argument is left empty
    fn argument_type(
        &self,
        argument: &FunctionArgument,
        argument_context: &Type,
        scope: &Scope<'_>,
    ) -> Option<Type> {
        if argument.expression.is_empty() {
            return None;
        }
        if scope.depth >= self.config.max_analysis_depth {
            return Some(Type::invalid(
                TypeErrorKind::StructuralConstraintViolation,
                format!(
                    "Expression nesting exceeds {} levels",
                    self.config.max_analysis_depth
                ),
            ));
        }

        let bindings = if argument.bindings.is_empty() {
            Cow::Borrowed(scope.bindings)
        } else {
            let mut overlay = scope.bindings.clone();
            for local in &argument.bindings {
                let local_scope = Scope {
                    bindings: &overlay,
                    context: argument_context,
                    depth: scope.depth + 1,
                };
                let ty = self.evaluate(&local.expression, &local_scope);
                overlay.insert(local.name.clone(), ty);
            }
            Cow::Owned(overlay)
        };

        let nested = Scope {
            bindings: &bindings,
            context: argument_context,
            depth: scope.depth + 1,
        };
        Some(self.evaluate(&argument.expression, &nested))
    }

    fn answer_type(&self, link_id: &str, scope: &Scope<'_>) -> Type {
        if !self.is_questionnaire_response(scope.bindings) {
            return Type::invalid(
                TypeErrorKind::StructuralConstraintViolation,
                format!(
                    "Answers are only available when %{} is a {QUESTIONNAIRE_RESPONSE}",
                    self.config.resource_binding
                ),
            );
        }
        if let Some(item) = self.questionnaire.get(link_id) {
            return item.item_type.clone();
        }

        log::debug!("unregistered item {link_id}, using generic answers");
        self.resolver
            .fields(&Type::complex([QUESTIONNAIRE_RESPONSE, "item", "answer"]))
            .shift_remove("value")
            .unwrap_or_else(|| {
                Type::invalid(
                    TypeErrorKind::UnknownIdentifier,
                    format!("Unknown questionnaire item {link_id}"),
                )
            })
    }
}

impl std::fmt::Debug for TypeAnalyzer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TypeAnalyzer")
            .field("functions", &self.functions.len())
            .field("operators", &self.operators.signatures().len())
            .field("questionnaire", &self.questionnaire.len())
            .field("config", &self.config)
            .field("cache", &self.cache)
            .finish()
    }
}
