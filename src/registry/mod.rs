//! Function and operator registries
//!
//! Both registries are tables of type signatures written as patterns over
//! [`Type`](crate::model::Type). Resolution unifies the patterns with actual
//! operand or argument types and computes the result type.

pub mod function;
pub mod functions;
pub mod operator;
pub mod operators;
pub mod signature;

pub use function::{FunctionGroup, FunctionMetadata, FunctionRegistry};
pub use operator::{Associativity, OperatorGroup, OperatorName, OperatorRegistry, UnknownOperator};
pub use signature::{
    CallTypes, FunctionReturnType, FunctionSignature, OperatorReturnType, OperatorSignature,
    ParameterInfo, ParameterKind,
};

/// Create a standard registry with all built-in functions and operators
pub fn create_standard_registries() -> (FunctionRegistry, OperatorRegistry) {
    let mut functions = FunctionRegistry::new();
    let mut operators = OperatorRegistry::new();

    // Register built-in functions
    function::register_builtin_functions(&mut functions);

    // Register built-in operators
    operator::register_builtin_operators(&mut operators);

    (functions, operators)
}
