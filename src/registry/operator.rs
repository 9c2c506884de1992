//! Operator registry and overload resolution
//!
//! Precedence and associativity live on [`OperatorName`] and are shared by the
//! operator-tree builder and the suggestion engine, so the two can never
//! disagree about how an expression groups.

use std::fmt;
use std::str::FromStr;

use indexmap::IndexSet;
use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};

use crate::model::type_pattern::{match_type_pattern, match_type_pattern_with, substitute_bindings};
use crate::model::types::{Type, TypeErrorKind, normalize_choice};
use crate::registry::operators;
use crate::registry::signature::OperatorSignature;

/// Operator associativity
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Associativity {
    /// Left-associative operator (evaluated left to right)
    Left,
    /// Right-associative operator (evaluated right to left)
    Right,
}

/// Grouping of operators in suggestion lists
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum OperatorGroup {
    /// Arithmetic
    Math,
    /// Equality, equivalence and ordering
    Comparison,
    /// Boolean logic
    Logical,
    /// Membership, concatenation and union
    Collection,
    /// Type tests and casts
    Type,
}

/// Binary operators of the expression language
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum OperatorName {
    /// `*`
    #[serde(rename = "*")]
    Multiply,
    /// `/`
    #[serde(rename = "/")]
    Divide,
    /// `div`
    #[serde(rename = "div")]
    Div,
    /// `mod`
    #[serde(rename = "mod")]
    Mod,
    /// `+`
    #[serde(rename = "+")]
    Plus,
    /// `-`
    #[serde(rename = "-")]
    Minus,
    /// `&`
    #[serde(rename = "&")]
    Concat,
    /// `is`
    #[serde(rename = "is")]
    Is,
    /// `as`
    #[serde(rename = "as")]
    As,
    /// `|`
    #[serde(rename = "|")]
    Union,
    /// `>`
    #[serde(rename = ">")]
    GreaterThan,
    /// `<`
    #[serde(rename = "<")]
    LessThan,
    /// `>=`
    #[serde(rename = ">=")]
    GreaterOrEqual,
    /// `<=`
    #[serde(rename = "<=")]
    LessOrEqual,
    /// `=`
    #[serde(rename = "=")]
    Equals,
    /// `!=`
    #[serde(rename = "!=")]
    NotEquals,
    /// `~`
    #[serde(rename = "~")]
    Equivalent,
    /// `!~`
    #[serde(rename = "!~")]
    NotEquivalent,
    /// `in`
    #[serde(rename = "in")]
    In,
    /// `contains`
    #[serde(rename = "contains")]
    Contains,
    /// `and`
    #[serde(rename = "and")]
    And,
    /// `xor`
    #[serde(rename = "xor")]
    Xor,
    /// `or`
    #[serde(rename = "or")]
    Or,
    /// `implies`
    #[serde(rename = "implies")]
    Implies,
}

/// Error returned when parsing an unknown operator symbol
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown operator '{0}'")]
pub struct UnknownOperator(pub String);

impl OperatorName {
    /// Every operator, tightest binding first
    pub const ALL: [OperatorName; 24] = [
        OperatorName::Multiply,
        OperatorName::Divide,
        OperatorName::Div,
        OperatorName::Mod,
        OperatorName::Plus,
        OperatorName::Minus,
        OperatorName::Concat,
        OperatorName::Is,
        OperatorName::As,
        OperatorName::Union,
        OperatorName::GreaterThan,
        OperatorName::LessThan,
        OperatorName::GreaterOrEqual,
        OperatorName::LessOrEqual,
        OperatorName::Equals,
        OperatorName::NotEquals,
        OperatorName::Equivalent,
        OperatorName::NotEquivalent,
        OperatorName::In,
        OperatorName::Contains,
        OperatorName::And,
        OperatorName::Xor,
        OperatorName::Or,
        OperatorName::Implies,
    ];

    /// Source symbol
    pub fn symbol(self) -> &'static str {
        match self {
            OperatorName::Multiply => "*",
            OperatorName::Divide => "/",
            OperatorName::Div => "div",
            OperatorName::Mod => "mod",
            OperatorName::Plus => "+",
            OperatorName::Minus => "-",
            OperatorName::Concat => "&",
            OperatorName::Is => "is",
            OperatorName::As => "as",
            OperatorName::Union => "|",
            OperatorName::GreaterThan => ">",
            OperatorName::LessThan => "<",
            OperatorName::GreaterOrEqual => ">=",
            OperatorName::LessOrEqual => "<=",
            OperatorName::Equals => "=",
            OperatorName::NotEquals => "!=",
            OperatorName::Equivalent => "~",
            OperatorName::NotEquivalent => "!~",
            OperatorName::In => "in",
            OperatorName::Contains => "contains",
            OperatorName::And => "and",
            OperatorName::Xor => "xor",
            OperatorName::Or => "or",
            OperatorName::Implies => "implies",
        }
    }

    /// Binding strength, higher binds tighter
    pub fn precedence(self) -> u8 {
        match self {
            OperatorName::Multiply
            | OperatorName::Divide
            | OperatorName::Div
            | OperatorName::Mod => 10,
            OperatorName::Plus | OperatorName::Minus | OperatorName::Concat => 9,
            OperatorName::Is | OperatorName::As => 8,
            OperatorName::Union => 7,
            OperatorName::GreaterThan
            | OperatorName::LessThan
            | OperatorName::GreaterOrEqual
            | OperatorName::LessOrEqual => 6,
            OperatorName::Equals
            | OperatorName::NotEquals
            | OperatorName::Equivalent
            | OperatorName::NotEquivalent => 5,
            OperatorName::In | OperatorName::Contains => 4,
            OperatorName::And => 3,
            OperatorName::Xor | OperatorName::Or => 2,
            OperatorName::Implies => 1,
        }
    }

    /// Grouping direction among operators of equal precedence
    pub fn associativity(self) -> Associativity {
        match self {
            OperatorName::Implies => Associativity::Right,
            _ => Associativity::Left,
        }
    }

    /// Label shown to users
    pub fn human_friendly_name(self) -> &'static str {
        match self {
            OperatorName::Plus => "Plus",
            OperatorName::Minus => "Minus",
            OperatorName::Multiply => "Multiply",
            OperatorName::Divide => "Divide",
            OperatorName::Mod => "Modulo",
            OperatorName::Div => "Integer divide",
            OperatorName::Equals => "Equals",
            OperatorName::NotEquals => "Not equals",
            OperatorName::LessThan => "Less than",
            OperatorName::GreaterThan => "Greater than",
            OperatorName::LessOrEqual => "Less than or equal to",
            OperatorName::GreaterOrEqual => "Greater than or equal to",
            OperatorName::Equivalent => "Equivalent",
            OperatorName::NotEquivalent => "Not equivalent",
            OperatorName::And => "And",
            OperatorName::Or => "Or",
            OperatorName::Xor => "Xor",
            OperatorName::Implies => "Implies",
            OperatorName::In => "In",
            OperatorName::Contains => "Contains",
            OperatorName::Concat => "Concatenate",
            OperatorName::Union => "Union",
            OperatorName::Is => "Is type",
            OperatorName::As => "As type",
        }
    }

    /// Suggestion group
    pub fn group(self) -> OperatorGroup {
        match self {
            OperatorName::Plus
            | OperatorName::Minus
            | OperatorName::Multiply
            | OperatorName::Divide
            | OperatorName::Mod
            | OperatorName::Div => OperatorGroup::Math,
            OperatorName::Equals
            | OperatorName::NotEquals
            | OperatorName::LessThan
            | OperatorName::GreaterThan
            | OperatorName::LessOrEqual
            | OperatorName::GreaterOrEqual
            | OperatorName::Equivalent
            | OperatorName::NotEquivalent => OperatorGroup::Comparison,
            OperatorName::And | OperatorName::Or | OperatorName::Xor | OperatorName::Implies => {
                OperatorGroup::Logical
            }
            OperatorName::In
            | OperatorName::Contains
            | OperatorName::Concat
            | OperatorName::Union => OperatorGroup::Collection,
            OperatorName::Is | OperatorName::As => OperatorGroup::Type,
        }
    }

    /// Whether the operator is spelled as a keyword rather than a symbol
    pub fn is_keyword(self) -> bool {
        self.symbol().chars().all(|c| c.is_ascii_alphabetic())
    }
}

impl OperatorGroup {
    /// Heading shown above the group
    pub fn label(self) -> &'static str {
        match self {
            OperatorGroup::Math => "Math Operators",
            OperatorGroup::Comparison => "Comparison Operators",
            OperatorGroup::Logical => "Logical Operators",
            OperatorGroup::Collection => "Collection Operators",
            OperatorGroup::Type => "Type Operators",
        }
    }
}

impl fmt::Display for OperatorName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.symbol())
    }
}

impl FromStr for OperatorName {
    type Err = UnknownOperator;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        OperatorName::ALL
            .into_iter()
            .find(|name| name.symbol() == s)
            .ok_or_else(|| UnknownOperator(s.to_string()))
    }
}

/// Registry of operator overloads
#[derive(Debug, Clone, Default)]
pub struct OperatorRegistry {
    signatures: Vec<OperatorSignature>,
    by_name: FxHashMap<OperatorName, Vec<usize>>,
}

impl OperatorRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a registry holding every built-in overload
    pub fn builtin() -> Self {
        let mut registry = Self::new();
        register_builtin_operators(&mut registry);
        registry
    }

    /// Register an overload. Earlier registrations win during resolution.
    pub fn register(&mut self, signature: OperatorSignature) {
        self.by_name
            .entry(signature.name)
            .or_default()
            .push(self.signatures.len());
        self.signatures.push(signature);
    }

    /// All overloads in registration order
    pub fn signatures(&self) -> &[OperatorSignature] {
        &self.signatures
    }

    /// Overloads of one operator in registration order
    pub fn overloads(&self, name: OperatorName) -> impl Iterator<Item = &OperatorSignature> {
        self.by_name
            .get(&name)
            .into_iter()
            .flatten()
            .map(|&index| &self.signatures[index])
    }

    /// Distinct operator names in registration order
    pub fn operator_names(&self) -> Vec<OperatorName> {
        self.signatures
            .iter()
            .map(|signature| signature.name)
            .collect::<IndexSet<_>>()
            .into_iter()
            .collect()
    }

    /// Result type of applying `name` to operands of the given types.
    ///
    /// The first overload that matches wins. When nothing matches the result is
    /// an unpositioned `Invalid`; callers attach the operator position.
    pub fn resolve_operator(&self, name: OperatorName, left: &Type, right: &Type) -> Type {
        if left.is_invalid() {
            return left.clone();
        }
        if right.is_invalid() {
            return right.clone();
        }

        for signature in self.overloads(name) {
            let mut combinations = vec![(left, right)];
            if signature.is_symmetric() {
                combinations.push((right, left));
            }

            for (left, right) in combinations {
                let Some(left_bindings) = match_type_pattern(&signature.left, left) else {
                    continue;
                };
                let concrete_right = substitute_bindings(&signature.right, &left_bindings);
                let Some(bindings) = match_type_pattern_with(&concrete_right, right, &left_bindings)
                else {
                    continue;
                };
                log::trace!("resolved {name} with overload {signature}");
                return signature.return_type.resolve(&bindings, left, right);
            }
        }

        Type::invalid(
            TypeErrorKind::TypeMismatch,
            format!(
                "Operator {name} cannot be used on {} and {}",
                left.describe(),
                right.describe()
            ),
        )
    }

    /// Overloads whose left pattern accepts `left`
    pub fn suggest_operators_for_left_type(&self, left: &Type) -> Vec<&OperatorSignature> {
        self.signatures
            .iter()
            .filter(|sig| match_type_pattern(&sig.left, left).is_some())
            .collect()
    }

    /// Right operand types admissible for `name` once the left operand is fixed
    pub fn suggest_right_types_for_operator(&self, name: OperatorName, left: &Type) -> Type {
        let candidates = self
            .overloads(name)
            .filter_map(|signature| {
                match_type_pattern(&signature.left, left)
                    .map(|bindings| substitute_bindings(&signature.right, &bindings))
            })
            .collect();
        normalize_choice(candidates)
    }
}

/// Register all built-in operators
pub fn register_builtin_operators(registry: &mut OperatorRegistry) {
    operators::register_builtin_operators(registry);
}
