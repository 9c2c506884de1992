//! Token model and structural parsing of visual expressions
//!
//! Expressions arrive as flat token sequences. This module turns them into
//! operator trees for typing and renders them back to FHIRPath text.

pub mod operator_tree;
pub mod span;
pub mod tokens;
pub mod unparse;

pub use operator_tree::{Chain, OperatorNode, OperatorTree, build_operator_tree};
pub use span::TokenSpan;
pub use tokens::{
    Binding, FunctionArgument, LocalBinding, QuantityLiteral, SPECIAL_VARIABLES, Token, TokenKind,
    generate_binding_id, special_name,
};
pub use unparse::{
    UnparseOptions, mocked_special_name, unparse_bindings, unparse_expression, unparse_program,
};
