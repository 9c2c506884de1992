//! Built-in operator overloads, grouped the way they are offered to users

pub mod arithmetic;
mod collection;
mod comparison;
mod logical;
mod string;
mod type_ops;

pub use arithmetic::register_arithmetic_operators;
pub use collection::register_collection_operators;
pub use comparison::register_comparison_operators;
pub use logical::register_logical_operators;
pub use string::register_string_operators;
pub use type_ops::register_type_operators;

use crate::registry::operator::OperatorRegistry;

/// Register all built-in operators
pub fn register_builtin_operators(registry: &mut OperatorRegistry) {
    // Arithmetic operators
    arithmetic::register_arithmetic_operators(registry);

    // String operators
    string::register_string_operators(registry);

    // Comparison operators
    comparison::register_comparison_operators(registry);

    // Collection operators
    collection::register_collection_operators(registry);

    // Logical operators
    logical::register_logical_operators(registry);

    // Type operators
    type_ops::register_type_operators(registry);
}
