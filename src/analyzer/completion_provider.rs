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

//! Next-token suggestions for visually composed expressions
//!
//! Given a prefix of tokens, the provider decides which token kinds may come
//! next, recovers the type the next token applies to, and materializes
//! concrete tokens for each kind. Functions and operators that do not fit the
//! recovered type are still offered, flagged as incompatible.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use crate::config::EditorConfig;
use crate::model::types::{PRIMITIVE_TYPES, Type, TypeErrorKind};
use crate::parser::span::TokenSpan;
use crate::parser::tokens::{FunctionArgument, SPECIAL_VARIABLES, Token, TokenKind};
use crate::registry::operator::{Associativity, OperatorName};

use super::type_analyzer::{BindingTypes, TypeAnalyzer};

/// Kinds that may start an expression or follow an operator
pub const START_KINDS: [TokenKind; 13] = [
    TokenKind::Field,
    TokenKind::Function,
    TokenKind::Variable,
    TokenKind::Type,
    TokenKind::Answer,
    TokenKind::String,
    TokenKind::Number,
    TokenKind::Boolean,
    TokenKind::Date,
    TokenKind::DateTime,
    TokenKind::Quantity,
    TokenKind::Time,
    TokenKind::Null,
];

/// Kinds that may follow a value
pub const CONTINUATION_KINDS: [TokenKind; 4] = [
    TokenKind::Field,
    TokenKind::Function,
    TokenKind::Index,
    TokenKind::Operator,
];

/// Values used for freshly suggested literal tokens
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LiteralDefaults {
    /// Moment used for date, dateTime and time literals
    pub now: NaiveDateTime,
    /// Unit of quantity literals
    pub quantity_unit: String,
}

impl LiteralDefaults {
    /// Defaults at the given moment, quantities in seconds
    pub fn new(now: NaiveDateTime) -> Self {
        Self {
            now,
            quantity_unit: "seconds".to_string(),
        }
    }

    /// Defaults at the given moment, quantity unit taken from `config`
    pub fn from_config(now: NaiveDateTime, config: &EditorConfig) -> Self {
        Self {
            now,
            quantity_unit: config.default_quantity_unit.clone(),
        }
    }
}

/// Where the next token goes
#[derive(Debug, Clone, Copy)]
pub struct SuggestionContext<'a> {
    /// Types of the bindings that may be referenced
    pub bindings: &'a BindingTypes,
    /// Type the expression is evaluated against
    pub context: &'a Type,
    /// Whether the expression is a function argument, making `$this`/`$index` available
    pub in_lambda: bool,
    /// Literal values for new tokens
    pub defaults: &'a LiteralDefaults,
}

/// What may come after a token prefix
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NextTokenAnalysis {
    /// Valid kinds for the next token
    pub kinds: Vec<TokenKind>,
    /// Tokens the next token relates to: the current chain after a value, the
    /// left operand after an operator
    pub context_span: Option<TokenSpan>,
    /// Type fields and functions of the next token apply to
    pub context_type: Type,
    /// Trailing operator of the prefix
    pub operator: Option<OperatorName>,
    /// Type of the trailing operator's left operand
    pub left_type: Option<Type>,
    /// Right operand types the trailing operator accepts
    pub right_types: Option<Type>,
}

/// A concrete token offered to the user
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SuggestedToken {
    /// Token inserted when the suggestion is picked
    pub token: Token,
    /// Text shown in the list
    pub label: String,
    /// Type or signature shown next to the label
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
    /// Heading the suggestion is listed under
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub group: Option<String>,
    /// Offered but not applicable to the current type
    #[serde(default)]
    pub incompatible: bool,
}

impl SuggestedToken {
    fn new(token: Token, label: impl Into<String>) -> Self {
        Self {
            token,
            label: label.into(),
            detail: None,
            group: None,
            incompatible: false,
        }
    }

    fn detail(mut self, detail: impl Into<String>) -> Self {
        self.detail = Some(detail.into());
        self
    }

    fn group(mut self, group: impl Into<String>) -> Self {
        self.group = Some(group.into());
        self
    }

    fn incompatible(mut self, incompatible: bool) -> Self {
        self.incompatible = incompatible;
        self
    }
}

/// Kinds valid after `prefix`
pub fn suggest_next_token_kinds(prefix: &[Token]) -> Vec<TokenKind> {
    match prefix.last() {
        None => START_KINDS.to_vec(),
        Some(token) if token.is_operator() => START_KINDS.to_vec(),
        Some(_) => CONTINUATION_KINDS.to_vec(),
    }
}

/// Left operand `operator` would take if it were inserted at `end`.
///
/// Scans backward from `end - 1` and stops at the first operator that binds
/// looser than `operator`, or equally tight when the two would not group to
/// the left. `None` when the operand is missing.
pub fn operator_context_span(
    tokens: &[Token],
    end: usize,
    operator: OperatorName,
) -> Option<TokenSpan> {
    let end = end.min(tokens.len());
    let precedence = operator.precedence();
    let associativity = operator.associativity();

    let mut start = end;
    while start > 0 {
        if let Some(previous) = tokens[start - 1].as_operator() {
            let previous_precedence = previous.precedence();
            let stops = previous_precedence < precedence
                || (previous_precedence == precedence
                    && (previous.associativity() != associativity
                        || associativity == Associativity::Right));
            if stops {
                break;
            }
        }
        start -= 1;
    }
    TokenSpan::from_len(start, end - start)
}

/// Left operand of the operator token at `operator_index`
pub fn extract_operator_context(tokens: &[Token], operator_index: usize) -> Option<TokenSpan> {
    let operator = tokens.get(operator_index)?.as_operator()?;
    operator_context_span(tokens, operator_index, operator)
}

/// Span of the operator-free run ending the prefix
fn current_chain_span(prefix: &[Token]) -> Option<TokenSpan> {
    let start = prefix
        .iter()
        .rposition(Token::is_operator)
        .map_or(0, |index| index + 1);
    TokenSpan::from_len(start, prefix.len() - start)
}

/// Suggests next tokens against one analyzer
pub struct CompletionProvider<'a> {
    analyzer: &'a TypeAnalyzer,
}

impl<'a> CompletionProvider<'a> {
    /// Create a provider backed by `analyzer`
    pub fn new(analyzer: &'a TypeAnalyzer) -> Self {
        Self { analyzer }
    }

    /// Analyze what may follow `prefix`
    pub fn analyze_next_token(
        &self,
        prefix: &[Token],
        context: &SuggestionContext<'_>,
    ) -> NextTokenAnalysis {
        let kinds = suggest_next_token_kinds(prefix);

        match prefix.last() {
            None => NextTokenAnalysis {
                kinds,
                context_span: None,
                context_type: context.context.clone(),
                operator: None,
                left_type: None,
                right_types: None,
            },
            Some(Token::Operator { value: operator }) => {
                let position = prefix.len() - 1;
                let span = extract_operator_context(prefix, position);
                let left = match span {
                    Some(span) => self.span_type(prefix, span, context),
                    None => Type::invalid_at(
                        TypeErrorKind::EmptyExpression,
                        "Empty expression",
                        position,
                    ),
                };
                let right_types = (!left.is_invalid()).then(|| {
                    self.analyzer
                        .operators()
                        .suggest_right_types_for_operator(*operator, &left)
                });
                NextTokenAnalysis {
                    kinds,
                    context_span: span,
                    context_type: context.context.clone(),
                    operator: Some(*operator),
                    left_type: Some(left),
                    right_types,
                }
            }
            Some(_) => {
                let span = current_chain_span(prefix);
                let context_type = match span {
                    Some(span) => self.span_type(prefix, span, context),
                    None => context.context.clone(),
                };
                NextTokenAnalysis {
                    kinds,
                    context_span: span,
                    context_type,
                    operator: None,
                    left_type: None,
                    right_types: None,
                }
            }
        }
    }

    /// Every suggestion for the token after `prefix`, grouped by kind
    pub fn suggest_next_tokens(
        &self,
        prefix: &[Token],
        context: &SuggestionContext<'_>,
    ) -> Vec<SuggestedToken> {
        let next = self.analyze_next_token(prefix, context);
        log::debug!(
            "suggesting {:?} after {} tokens, context {}",
            next.kinds,
            prefix.len(),
            next.context_type
        );
        next.kinds
            .iter()
            .flat_map(|&kind| self.tokens_of_kind(kind, prefix, &next, context))
            .collect()
    }

    /// Replacements for the token at `index`, restricted to its own kind.
    ///
    /// Empty when there is no token at `index` or its kind is not valid
    /// there any more.
    pub fn suggest_tokens_at(
        &self,
        tokens: &[Token],
        index: usize,
        context: &SuggestionContext<'_>,
    ) -> Vec<SuggestedToken> {
        let Some(token) = tokens.get(index) else {
            return Vec::new();
        };
        let prefix = &tokens[..index];
        let analysis = self.analyze_next_token(prefix, context);
        if !analysis.kinds.contains(&token.kind()) {
            log::debug!("token {index} of kind {} is stale", token.kind());
            return Vec::new();
        }
        self.tokens_of_kind(token.kind(), prefix, &analysis, context)
    }

    /// Concrete tokens of one kind
    pub fn tokens_of_kind(
        &self,
        kind: TokenKind,
        prefix: &[Token],
        analysis: &NextTokenAnalysis,
        context: &SuggestionContext<'_>,
    ) -> Vec<SuggestedToken> {
        let defaults = context.defaults;
        match kind {
            TokenKind::Field => self.field_tokens(&analysis.context_type),
            TokenKind::Function => self.function_tokens(&analysis.context_type),
            TokenKind::Operator => self.operator_tokens(prefix, context),
            TokenKind::Variable => variable_tokens(context),
            TokenKind::Type => self.type_tokens(),
            TokenKind::Answer => self.answer_tokens(context.bindings),
            TokenKind::Index => vec![SuggestedToken::new(Token::index(0), "[0]")],
            TokenKind::String => literal(Token::string(""), "''", "String"),
            TokenKind::Number => literal(Token::number("0"), "0", "Integer"),
            TokenKind::Boolean => literal(Token::boolean(true), "true", "Boolean"),
            TokenKind::Date => {
                let value = defaults.now.format("%Y-%m-%d").to_string();
                literal(Token::date(value.clone()), value, "Date")
            }
            TokenKind::DateTime => {
                let value = defaults.now.format("%Y-%m-%dT%H:%M").to_string();
                literal(Token::datetime(value.clone()), value, "DateTime")
            }
            TokenKind::Time => {
                let value = defaults.now.format("%H:%M").to_string();
                literal(Token::time(value.clone()), value, "Time")
            }
            TokenKind::Quantity => {
                let unit = defaults.quantity_unit.clone();
                let label = format!("0 {unit}");
                literal(Token::quantity("0", unit), label, "Quantity")
            }
            TokenKind::Null => literal(Token::Null, "{}", "empty"),
        }
    }

    fn span_type(
        &self,
        tokens: &[Token],
        span: TokenSpan,
        context: &SuggestionContext<'_>,
    ) -> Type {
        let operand = &tokens[span.start..=span.end];
        self.analyzer
            .expression_type(operand, context.bindings, context.context)
    }

    fn field_tokens(&self, ty: &Type) -> Vec<SuggestedToken> {
        if ty.is_invalid() {
            return Vec::new();
        }
        self.analyzer
            .resolver()
            .fields(ty)
            .into_iter()
            .map(|(name, field_type)| {
                SuggestedToken::new(Token::field(name.clone()), name)
                    .detail(field_type.describe())
            })
            .collect()
    }

    fn function_tokens(&self, input: &Type) -> Vec<SuggestedToken> {
        self.analyzer
            .functions()
            .functions()
            .iter()
            .map(|metadata| {
                let signature = &metadata.signature;
                let args = vec![FunctionArgument::default(); signature.min_arity];
                let token = Token::function(signature.name.clone(), args);
                SuggestedToken::new(token, signature.name.clone())
                    .detail(signature.to_string())
                    .group(metadata.group.label())
                    .incompatible(input.is_invalid() || !metadata.is_compatible(input))
            })
            .collect()
    }

    fn operator_tokens(
        &self,
        prefix: &[Token],
        context: &SuggestionContext<'_>,
    ) -> Vec<SuggestedToken> {
        let operators = self.analyzer.operators();
        let mut left_types: Vec<(Option<TokenSpan>, Type)> = Vec::new();

        operators
            .operator_names()
            .into_iter()
            .map(|operator| {
                let span = operator_context_span(prefix, prefix.len(), operator);
                let left = match left_types.iter().find(|(known, _)| *known == span) {
                    Some((_, ty)) => ty.clone(),
                    None => {
                        let ty = match span {
                            Some(span) => self.span_type(prefix, span, context),
                            None => Type::invalid(
                                TypeErrorKind::EmptyExpression,
                                "Empty expression",
                            ),
                        };
                        left_types.push((span, ty.clone()));
                        ty
                    }
                };
                let compatible = !left.is_invalid()
                    && operators
                        .suggest_operators_for_left_type(&left)
                        .iter()
                        .any(|signature| signature.name == operator);
                SuggestedToken::new(Token::operator(operator), operator.symbol())
                    .detail(operator.human_friendly_name())
                    .group(operator.group().label())
                    .incompatible(!compatible)
            })
            .collect()
    }

    fn type_tokens(&self) -> Vec<SuggestedToken> {
        let primitives = PRIMITIVE_TYPES.iter().cloned();
        let structural = self
            .analyzer
            .resolver()
            .type_names()
            .into_iter()
            .map(|name| Type::complex([name]));
        primitives
            .chain(structural)
            .map(|ty| {
                let label = ty.element_name();
                SuggestedToken::new(Token::type_ref(ty), label).detail("type")
            })
            .collect()
    }

    fn answer_tokens(&self, bindings: &BindingTypes) -> Vec<SuggestedToken> {
        if !self.analyzer.is_questionnaire_response(bindings) {
            return Vec::new();
        }
        self.analyzer
            .questionnaire()
            .iter()
            .map(|(link_id, item)| {
                let label = if item.text.is_empty() {
                    link_id.to_string()
                } else {
                    item.text.clone()
                };
                SuggestedToken::new(Token::answer(link_id), label)
                    .detail(item.item_type.describe())
            })
            .collect()
    }
}

fn literal(token: Token, label: impl Into<String>, detail: &str) -> Vec<SuggestedToken> {
    vec![SuggestedToken::new(token, label).detail(detail)]
}

fn variable_tokens(context: &SuggestionContext<'_>) -> Vec<SuggestedToken> {
    let mut tokens: Vec<SuggestedToken> = context
        .bindings
        .iter()
        .map(|(name, ty)| {
            SuggestedToken::new(Token::variable(name.clone()), format!("%{name}"))
                .detail(ty.describe())
        })
        .collect();
    if context.in_lambda {
        for special in SPECIAL_VARIABLES {
            let token = SuggestedToken::new(Token::special(special), special);
            tokens.push(token.group("Lambda"));
        }
    }
    tokens
}
