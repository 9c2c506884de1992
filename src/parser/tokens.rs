//! Token model of visually composed expressions
//!
//! An expression is a flat, position-significant sequence of tokens. The index
//! of a token in its sequence is its identity for error reporting and for
//! "what may go at slot i" queries.

use std::fmt;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::model::types::Type;
use crate::registry::operator::OperatorName;

/// Number and unit of a quantity literal
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct QuantityLiteral {
    /// Numeric part as typed by the user
    pub value: String,
    /// Calendar keyword or UCUM unit
    pub unit: String,
}

/// One argument of a function token
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct FunctionArgument {
    /// Argument expression
    #[serde(default)]
    pub expression: Vec<Token>,
    /// Bindings local to the argument, visible only inside it
    #[serde(default)]
    pub bindings: Vec<LocalBinding>,
}

/// Named expression that other expressions reference as a variable
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Binding {
    /// Stable identifier, unaffected by renames
    pub id: String,
    /// Variable name
    pub name: String,
    /// Defining expression
    #[serde(default)]
    pub expression: Vec<Token>,
}

/// Binding declared inside a function argument
pub type LocalBinding = Binding;

/// Kind of a token, without payload
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TokenKind {
    /// String literal
    String,
    /// Number literal
    Number,
    /// Boolean literal
    Boolean,
    /// Date literal
    Date,
    /// DateTime literal
    DateTime,
    /// Time literal
    Time,
    /// Quantity literal
    Quantity,
    /// Empty collection literal
    Null,
    /// Type reference
    Type,
    /// Field navigation
    Field,
    /// Collection indexing
    Index,
    /// Variable reference
    Variable,
    /// Questionnaire answer reference
    Answer,
    /// Binary operator
    Operator,
    /// Function call
    Function,
}

/// One position of an expression
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum Token {
    /// `'text'`
    String {
        /// Unquoted text
        value: String,
    },
    /// `42`, `3.14`
    Number {
        /// Digits as typed
        value: String,
    },
    /// `true`, `false`
    Boolean {
        /// Literal value
        value: bool,
    },
    /// `@2024-01-31`
    Date {
        /// ISO date
        value: String,
    },
    /// `@2024-01-31T10:30`
    DateTime {
        /// ISO date and time
        value: String,
    },
    /// `@T10:30`
    Time {
        /// ISO time
        value: String,
    },
    /// `10 'mg'`, `3 days`
    Quantity {
        /// Number and unit
        value: QuantityLiteral,
    },
    /// `{}`
    Null,
    /// Type used as a value, e.g. the right operand of `is`
    Type {
        /// Referenced type
        value: Type,
    },
    /// `.name`
    Field {
        /// Field name
        value: String,
    },
    /// `[0]`
    Index {
        /// Zero-based position
        value: usize,
    },
    /// `%name`, `$this`, `$index`
    Variable {
        /// Variable name
        value: String,
        /// Whether this is a lambda special (`$this`, `$index`)
        #[serde(default)]
        special: bool,
    },
    /// Answer to the questionnaire item with this link id
    Answer {
        /// Item link id
        value: String,
    },
    /// Binary operator
    Operator {
        /// Operator
        value: OperatorName,
    },
    /// `.name(args)`
    Function {
        /// Function name
        value: String,
        /// Arguments in order
        #[serde(default)]
        args: Vec<FunctionArgument>,
    },
}

/// The lambda specials, as written in source
pub const SPECIAL_VARIABLES: [&str; 2] = ["$this", "$index"];

/// Canonical spelling of a special variable name (`this` and `$this` are the same)
pub fn special_name(name: &str) -> Option<&'static str> {
    match name.trim_start_matches('$') {
        "this" => Some("$this"),
        "index" => Some("$index"),
        _ => None,
    }
}

impl TokenKind {
    /// Lowercase kind name
    pub fn as_str(self) -> &'static str {
        match self {
            TokenKind::String => "string",
            TokenKind::Number => "number",
            TokenKind::Boolean => "boolean",
            TokenKind::Date => "date",
            TokenKind::DateTime => "datetime",
            TokenKind::Time => "time",
            TokenKind::Quantity => "quantity",
            TokenKind::Null => "null",
            TokenKind::Type => "type",
            TokenKind::Field => "field",
            TokenKind::Index => "index",
            TokenKind::Variable => "variable",
            TokenKind::Answer => "answer",
            TokenKind::Operator => "operator",
            TokenKind::Function => "function",
        }
    }
}

impl fmt::Display for TokenKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Token {
    /// Kind of this token
    pub fn kind(&self) -> TokenKind {
        match self {
            Token::String { .. } => TokenKind::String,
            Token::Number { .. } => TokenKind::Number,
            Token::Boolean { .. } => TokenKind::Boolean,
            Token::Date { .. } => TokenKind::Date,
            Token::DateTime { .. } => TokenKind::DateTime,
            Token::Time { .. } => TokenKind::Time,
            Token::Quantity { .. } => TokenKind::Quantity,
            Token::Null => TokenKind::Null,
            Token::Type { .. } => TokenKind::Type,
            Token::Field { .. } => TokenKind::Field,
            Token::Index { .. } => TokenKind::Index,
            Token::Variable { .. } => TokenKind::Variable,
            Token::Answer { .. } => TokenKind::Answer,
            Token::Operator { .. } => TokenKind::Operator,
            Token::Function { .. } => TokenKind::Function,
        }
    }

    /// The operator of an operator token
    pub fn as_operator(&self) -> Option<OperatorName> {
        match self {
            Token::Operator { value } => Some(*value),
            _ => None,
        }
    }

    /// Whether this is an operator token
    pub fn is_operator(&self) -> bool {
        self.as_operator().is_some()
    }

    /// String literal
    pub fn string(value: impl Into<String>) -> Self {
        Token::String {
            value: value.into(),
        }
    }

    /// Number literal
    pub fn number(value: impl Into<String>) -> Self {
        Token::Number {
            value: value.into(),
        }
    }

    /// Boolean literal
    pub fn boolean(value: bool) -> Self {
        Token::Boolean { value }
    }

    /// Date literal
    pub fn date(value: impl Into<String>) -> Self {
        Token::Date {
            value: value.into(),
        }
    }

    /// DateTime literal
    pub fn datetime(value: impl Into<String>) -> Self {
        Token::DateTime {
            value: value.into(),
        }
    }

    /// Time literal
    pub fn time(value: impl Into<String>) -> Self {
        Token::Time {
            value: value.into(),
        }
    }

    /// Quantity literal
    pub fn quantity(value: impl Into<String>, unit: impl Into<String>) -> Self {
        Token::Quantity {
            value: QuantityLiteral {
                value: value.into(),
                unit: unit.into(),
            },
        }
    }

    /// Type reference
    pub fn type_ref(value: Type) -> Self {
        Token::Type { value }
    }

    /// Field navigation
    pub fn field(name: impl Into<String>) -> Self {
        Token::Field { value: name.into() }
    }

    /// Collection index
    pub fn index(value: usize) -> Self {
        Token::Index { value }
    }

    /// Reference to a binding
    pub fn variable(name: impl Into<String>) -> Self {
        Token::Variable {
            value: name.into(),
            special: false,
        }
    }

    /// Reference to a lambda special such as `$this`
    pub fn special(name: impl Into<String>) -> Self {
        Token::Variable {
            value: name.into(),
            special: true,
        }
    }

    /// Questionnaire answer
    pub fn answer(link_id: impl Into<String>) -> Self {
        Token::Answer {
            value: link_id.into(),
        }
    }

    /// Operator
    pub fn operator(value: OperatorName) -> Self {
        Token::Operator { value }
    }

    /// Function call
    pub fn function(name: impl Into<String>, args: Vec<FunctionArgument>) -> Self {
        Token::Function {
            value: name.into(),
            args,
        }
    }
}

impl FunctionArgument {
    /// Argument without local bindings
    pub fn new(expression: Vec<Token>) -> Self {
        Self {
            expression,
            bindings: Vec::new(),
        }
    }

    /// Argument with local bindings
    pub fn with_bindings(expression: Vec<Token>, bindings: Vec<LocalBinding>) -> Self {
        Self {
            expression,
            bindings,
        }
    }
}

impl Binding {
    /// Create a binding with a freshly generated id
    pub fn new(name: impl Into<String>, expression: Vec<Token>) -> Self {
        Self::with_id(generate_binding_id(), name, expression)
    }

    /// Create a binding with a known id
    pub fn with_id(id: impl Into<String>, name: impl Into<String>, expression: Vec<Token>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            expression,
        }
    }
}

/// A fresh binding id of the form `binding-xxxxxxx`
pub fn generate_binding_id() -> String {
    let uuid = Uuid::new_v4().simple().to_string();
    format!("binding-{}", &uuid[..7])
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn test_token_serde_shape() {
        let token = Token::function(
            "where",
            vec![FunctionArgument::new(vec![
                Token::field("use"),
                Token::operator(OperatorName::Equals),
                Token::string("official"),
            ])],
        );
        let value = serde_json::to_value(&token).unwrap();
        assert_eq!(
            value,
            json!({
                "kind": "function",
                "value": "where",
                "args": [{
                    "expression": [
                        {"kind": "field", "value": "use"},
                        {"kind": "operator", "value": "="},
                        {"kind": "string", "value": "official"}
                    ],
                    "bindings": []
                }]
            })
        );
        let parsed: Token = serde_json::from_value(value).unwrap();
        assert_eq!(parsed, token);
    }

    #[test]
    fn test_variable_defaults_to_non_special() {
        let value = json!({"kind": "variable", "value": "age"});
        let parsed: Token = serde_json::from_value(value).unwrap();
        assert_eq!(parsed, Token::variable("age"));
        let null: Token = serde_json::from_value(json!({"kind": "null"})).unwrap();
        assert_eq!(null.kind(), TokenKind::Null);
    }

    #[test]
    fn test_special_name() {
        assert_eq!(special_name("this"), Some("$this"));
        assert_eq!(special_name("$index"), Some("$index"));
        assert_eq!(special_name("total"), None);
    }

    #[test]
    fn test_binding_ids() {
        let binding = Binding::new("age", vec![]);
        assert!(binding.id.starts_with("binding-"));
        assert_eq!(binding.id.len(), "binding-".len() + 7);
        assert_ne!(binding.id, Binding::new("age", vec![]).id);
    }
}
