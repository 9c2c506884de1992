//! Precedence climbing over flat token sequences
//!
//! Token sequences coming from the visual editor are often incomplete: an
//! operator may be missing its left or right operand while the user is still
//! composing. The builder never fails; missing operands become empty chains so
//! the evaluator can report them at the right position.

use crate::registry::operator::{Associativity, OperatorName};

use super::span::TokenSpan;
use super::tokens::Token;

/// Binary tree of operators over maximal operator-free runs of tokens
#[derive(Debug, Clone, PartialEq)]
pub enum OperatorTree<'a> {
    /// Operator-free run of tokens
    Chain(Chain<'a>),
    /// Binary operator application
    Operator(Box<OperatorNode<'a>>),
}

/// Maximal run of tokens without operators
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Chain<'a> {
    /// Tokens of the run, possibly empty when an operand is missing
    pub tokens: &'a [Token],
    /// Index of the first token (or of the slot where it is missing)
    pub start: usize,
}

/// Operator with its two operands
#[derive(Debug, Clone, PartialEq)]
pub struct OperatorNode<'a> {
    /// The operator
    pub operator: OperatorName,
    /// Index of the operator token
    pub position: usize,
    /// Left operand
    pub left: OperatorTree<'a>,
    /// Right operand
    pub right: OperatorTree<'a>,
    /// Tokens covered by the left operand, `None` when it is missing
    pub left_span: Option<TokenSpan>,
    /// Tokens covered by the right operand, `None` when it is missing
    pub right_span: Option<TokenSpan>,
}

impl<'a> Chain<'a> {
    /// Whether the run has no tokens
    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }

    /// Tokens covered by the run
    pub fn span(&self) -> Option<TokenSpan> {
        TokenSpan::from_len(self.start, self.tokens.len())
    }
}

impl<'a> OperatorTree<'a> {
    /// Tokens covered by this subtree.
    ///
    /// An operator node always covers at least its own operator token, even
    /// when both operands are missing.
    pub fn bounds(&self) -> Option<TokenSpan> {
        match self {
            OperatorTree::Chain(chain) => chain.span(),
            OperatorTree::Operator(node) => {
                let operator = TokenSpan::single(node.position);
                let span = match node.left_span {
                    Some(left) => left.merge(operator),
                    None => operator,
                };
                Some(match node.right_span {
                    Some(right) => span.merge(right),
                    None => span,
                })
            }
        }
    }

    /// Find the operator node whose operator token is at `position`
    pub fn find_operator(&self, position: usize) -> Option<&OperatorNode<'a>> {
        match self {
            OperatorTree::Chain(_) => None,
            OperatorTree::Operator(node) if node.position == position => Some(node),
            OperatorTree::Operator(node) => node
                .left
                .find_operator(position)
                .or_else(|| node.right.find_operator(position)),
        }
    }

    /// Number of operator nodes in the tree
    pub fn operator_count(&self) -> usize {
        match self {
            OperatorTree::Chain(_) => 0,
            OperatorTree::Operator(node) => {
                1 + node.left.operator_count() + node.right.operator_count()
            }
        }
    }
}

/// Build the operator tree of a token sequence
pub fn build_operator_tree(tokens: &[Token]) -> OperatorTree<'_> {
    TreeBuilder { tokens, pos: 0 }.parse_expression(0)
}

struct TreeBuilder<'a> {
    tokens: &'a [Token],
    pos: usize,
}

impl<'a> TreeBuilder<'a> {
    fn peek_operator(&self) -> Option<OperatorName> {
        self.tokens.get(self.pos).and_then(Token::as_operator)
    }

    fn empty_chain(&self) -> OperatorTree<'a> {
        OperatorTree::Chain(Chain {
            tokens: &[],
            start: self.pos,
        })
    }

    fn parse_chain(&mut self) -> OperatorTree<'a> {
        let start = self.pos;
        while self.pos < self.tokens.len() && !self.tokens[self.pos].is_operator() {
            self.pos += 1;
        }
        OperatorTree::Chain(Chain {
            tokens: &self.tokens[start..self.pos],
            start,
        })
    }

    fn parse_expression(&mut self, min_precedence: u8) -> OperatorTree<'a> {
        let mut left = self.parse_chain();

        while let Some(operator) = self.peek_operator() {
            if operator.precedence() < min_precedence {
                break;
            }
            left = self.fold_operator(left, operator);
        }
        left
    }

    /// Consume the operator at the cursor and its right operand
    fn fold_operator(
        &mut self,
        left: OperatorTree<'a>,
        operator: OperatorName,
    ) -> OperatorTree<'a> {
        let position = self.pos;
        let precedence = operator.precedence();
        self.pos += 1;

        let right = if self.pos >= self.tokens.len() || self.peek_operator().is_some() {
            self.empty_chain()
        } else {
            let next_min = match operator.associativity() {
                Associativity::Left => precedence + 1,
                Associativity::Right => precedence,
            };
            self.parse_expression(next_min)
        };

        OperatorTree::Operator(Box::new(OperatorNode {
            operator,
            position,
            left_span: left.bounds(),
            right_span: right.bounds(),
            left,
            right,
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn op(name: OperatorName) -> Token {
        Token::operator(name)
    }

    fn field(name: &str) -> Token {
        Token::field(name)
    }

    fn root(tree: &OperatorTree<'_>) -> (OperatorName, usize) {
        match tree {
            OperatorTree::Operator(node) => (node.operator, node.position),
            OperatorTree::Chain(_) => panic!("expected an operator at the root"),
        }
    }

    #[test]
    fn test_single_chain() {
        let tokens = vec![field("name"), field("given")];
        let tree = build_operator_tree(&tokens);
        assert_eq!(
            tree,
            OperatorTree::Chain(Chain {
                tokens: &tokens,
                start: 0
            })
        );
        assert_eq!(tree.bounds(), Some(TokenSpan::new(0, 1)));
    }

    #[test]
    fn test_multiplication_binds_tighter() {
        let tokens = vec![
            field("a"),
            op(OperatorName::Plus),
            field("b"),
            op(OperatorName::Multiply),
            field("c"),
        ];
        let tree = build_operator_tree(&tokens);
        assert_eq!(root(&tree), (OperatorName::Plus, 1));
        let OperatorTree::Operator(node) = &tree else {
            unreachable!()
        };
        assert_eq!(node.left_span, Some(TokenSpan::single(0)));
        assert_eq!(node.right_span, Some(TokenSpan::new(2, 4)));
        assert_eq!(root(&node.right), (OperatorName::Multiply, 3));
    }

    #[test]
    fn test_left_associative_subtraction() {
        let tokens = vec![
            field("a"),
            op(OperatorName::Minus),
            field("b"),
            op(OperatorName::Minus),
            field("c"),
        ];
        let tree = build_operator_tree(&tokens);
        assert_eq!(root(&tree), (OperatorName::Minus, 3));
        let node = tree.find_operator(3).unwrap();
        assert_eq!(node.left_span, Some(TokenSpan::new(0, 2)));
        assert_eq!(node.right_span, Some(TokenSpan::single(4)));
    }

    #[test]
    fn test_right_associative_implies() {
        let tokens = vec![
            field("a"),
            op(OperatorName::Implies),
            field("b"),
            op(OperatorName::Implies),
            field("c"),
        ];
        let tree = build_operator_tree(&tokens);
        assert_eq!(root(&tree), (OperatorName::Implies, 1));
        let node = tree.find_operator(1).unwrap();
        assert_eq!(node.right_span, Some(TokenSpan::new(2, 4)));
        let node = tree.find_operator(3).unwrap();
        assert_eq!(node.left_span, Some(TokenSpan::single(2)));
    }

    #[test]
    fn test_missing_operands() {
        let tokens = vec![op(OperatorName::Plus), field("a"), op(OperatorName::Minus)];
        let tree = build_operator_tree(&tokens);
        assert_eq!(root(&tree), (OperatorName::Minus, 2));

        let minus = tree.find_operator(2).unwrap();
        assert_eq!(minus.right_span, None);
        assert_eq!(
            minus.right,
            OperatorTree::Chain(Chain {
                tokens: &[],
                start: 3
            })
        );

        let plus = tree.find_operator(0).unwrap();
        assert_eq!(plus.left_span, None);
        assert_eq!(plus.right_span, Some(TokenSpan::single(1)));
        assert_eq!(tree.bounds(), Some(TokenSpan::new(0, 2)));
    }

    #[test]
    fn test_adjacent_operators() {
        let tokens = vec![
            field("a"),
            op(OperatorName::And),
            op(OperatorName::Or),
            field("b"),
        ];
        let tree = build_operator_tree(&tokens);
        assert_eq!(tree.operator_count(), 2);
        assert_eq!(tree.find_operator(1).unwrap().right_span, None);
        assert_eq!(tree.bounds(), Some(TokenSpan::new(0, 3)));
    }

    #[test]
    fn test_empty_sequence() {
        let tree = build_operator_tree(&[]);
        assert_eq!(tree.bounds(), None);
        assert_eq!(tree.operator_count(), 0);
    }
}
