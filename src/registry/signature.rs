//! Function and operator signatures for type checking

use std::fmt;

use serde::{Deserialize, Serialize};

use super::operator::OperatorName;
use crate::model::provider::FieldResolver;
use crate::model::type_pattern::{TypeBindings, substitute_bindings};
use crate::model::types::Type;

/// Computes an operator's result from the unified bindings and the actual operand types
pub type OperatorReturnFn = fn(&TypeBindings, &Type, &Type) -> Type;

/// Computes a function's result from a successfully matched call
pub type FunctionReturnFn = fn(&CallTypes<'_>) -> Type;

/// Everything known about a function call once its signature matched
pub struct CallTypes<'a> {
    /// Generic bindings accumulated over input and arguments
    pub bindings: &'a TypeBindings,
    /// Type of the collection the function is applied to
    pub input: &'a Type,
    /// Types of the supplied arguments, in order
    pub arguments: &'a [Type],
    /// Field resolver of the current analysis
    pub resolver: &'a dyn FieldResolver,
}

/// Result type of an operator overload
#[derive(Clone)]
pub enum OperatorReturnType {
    /// Same result for every match, generic variables substituted
    Fixed(Type),
    /// Result computed from the bindings and actual operands
    Computed(OperatorReturnFn),
}

/// Result type of a function signature
#[derive(Clone)]
pub enum FunctionReturnType {
    /// Same result for every match, generic variables substituted
    Fixed(Type),
    /// Result computed from the matched call
    Computed(FunctionReturnFn),
}

/// Operator overload for type checking
#[derive(Debug, Clone)]
pub struct OperatorSignature {
    /// Operator this overload belongs to
    pub name: OperatorName,
    /// Pattern for the left operand
    pub left: Type,
    /// Pattern for the right operand
    pub right: Type,
    /// Result type
    pub return_type: OperatorReturnType,
}

/// How an argument expression is evaluated
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ParameterKind {
    /// Evaluated once against the surrounding context
    Value,
    /// Evaluated per element of the input; `$this` is that element
    Lambda,
}

/// Parameter information for functions
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ParameterInfo {
    /// Parameter name
    pub name: String,
    /// Type pattern the argument must match
    pub param_type: Type,
    /// Evaluation kind
    pub kind: ParameterKind,
    /// Whether this parameter is optional
    pub optional: bool,
}

/// Function signature for call resolution
#[derive(Debug, Clone)]
pub struct FunctionSignature {
    /// Function name
    pub name: String,
    /// Pattern the input collection must match
    pub input: Type,
    /// Parameters, optional ones last
    pub parameters: Vec<ParameterInfo>,
    /// Result type
    pub return_type: FunctionReturnType,
    /// Minimum number of arguments
    pub min_arity: usize,
    /// Maximum number of arguments
    pub max_arity: usize,
}

impl OperatorReturnType {
    /// Compute the result for a matched overload
    pub fn resolve(&self, bindings: &TypeBindings, left: &Type, right: &Type) -> Type {
        match self {
            OperatorReturnType::Fixed(ty) => substitute_bindings(ty, bindings),
            OperatorReturnType::Computed(f) => f(bindings, left, right),
        }
    }
}

impl FunctionReturnType {
    /// Compute the result for a matched call
    pub fn resolve(&self, call: &CallTypes<'_>) -> Type {
        match self {
            FunctionReturnType::Fixed(ty) => substitute_bindings(ty, call.bindings),
            FunctionReturnType::Computed(f) => f(call),
        }
    }
}

impl fmt::Debug for OperatorReturnType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OperatorReturnType::Fixed(ty) => f.debug_tuple("Fixed").field(ty).finish(),
            OperatorReturnType::Computed(_) => f.write_str("Computed"),
        }
    }
}

impl fmt::Debug for FunctionReturnType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FunctionReturnType::Fixed(ty) => f.debug_tuple("Fixed").field(ty).finish(),
            FunctionReturnType::Computed(_) => f.write_str("Computed"),
        }
    }
}

impl OperatorSignature {
    /// Create an overload with a fixed result type
    pub fn binary(name: OperatorName, left: Type, right: Type, result: Type) -> Self {
        Self {
            name,
            left,
            right,
            return_type: OperatorReturnType::Fixed(result),
        }
    }

    /// Create an overload whose result is computed
    pub fn computed(name: OperatorName, left: Type, right: Type, result: OperatorReturnFn) -> Self {
        Self {
            name,
            left,
            right,
            return_type: OperatorReturnType::Computed(result),
        }
    }

    /// Whether operands may be tried in swapped order: both patterns are the same bare generic
    pub fn is_symmetric(&self) -> bool {
        self.left == self.right && matches!(self.left, Type::Generic(_))
    }
}

impl ParameterInfo {
    /// Create a required value parameter
    pub fn required(name: impl Into<String>, param_type: Type) -> Self {
        Self {
            name: name.into(),
            param_type,
            kind: ParameterKind::Value,
            optional: false,
        }
    }

    /// Create an optional value parameter
    pub fn optional(name: impl Into<String>, param_type: Type) -> Self {
        Self {
            optional: true,
            ..Self::required(name, param_type)
        }
    }

    /// Create a required lambda parameter
    pub fn lambda(name: impl Into<String>, param_type: Type) -> Self {
        Self {
            kind: ParameterKind::Lambda,
            ..Self::required(name, param_type)
        }
    }

    /// Create an optional lambda parameter
    pub fn optional_lambda(name: impl Into<String>, param_type: Type) -> Self {
        Self {
            kind: ParameterKind::Lambda,
            ..Self::optional(name, param_type)
        }
    }

    /// Whether the argument is evaluated per input element
    pub fn is_lambda(&self) -> bool {
        self.kind == ParameterKind::Lambda
    }
}

impl FunctionSignature {
    /// Create a signature with a fixed result type
    pub fn new(
        name: impl Into<String>,
        input: Type,
        parameters: Vec<ParameterInfo>,
        result: Type,
    ) -> Self {
        Self::with_return(name, input, parameters, FunctionReturnType::Fixed(result))
    }

    /// Create a signature whose result is computed
    pub fn computed(
        name: impl Into<String>,
        input: Type,
        parameters: Vec<ParameterInfo>,
        result: FunctionReturnFn,
    ) -> Self {
        Self::with_return(
            name,
            input,
            parameters,
            FunctionReturnType::Computed(result),
        )
    }

    fn with_return(
        name: impl Into<String>,
        input: Type,
        parameters: Vec<ParameterInfo>,
        return_type: FunctionReturnType,
    ) -> Self {
        let min_arity = parameters.iter().filter(|p| !p.optional).count();
        let max_arity = parameters.len();
        Self {
            name: name.into(),
            input,
            parameters,
            return_type,
            min_arity,
            max_arity,
        }
    }
}

impl fmt::Display for FunctionSignature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}(", self.name)?;
        for (i, param) in self.parameters.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{}: {}", param.name, param.param_type)?;
            if param.optional {
                write!(f, "?")?;
            }
        }
        write!(f, ")")?;
        if let FunctionReturnType::Fixed(ty) = &self.return_type {
            write!(f, " -> {ty}")?;
        }
        Ok(())
    }
}

impl fmt::Display for OperatorSignature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {} {}", self.left, self.name, self.right)?;
        if let OperatorReturnType::Fixed(ty) = &self.return_type {
            write!(f, " -> {ty}")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_function_arity() {
        let signature = FunctionSignature::new(
            "substring",
            Type::String,
            vec![
                ParameterInfo::required("start", Type::single(Type::Integer)),
                ParameterInfo::optional("length", Type::single(Type::Integer)),
            ],
            Type::single(Type::String),
        );
        assert_eq!(signature.min_arity, 1);
        assert_eq!(signature.max_arity, 2);
        assert_eq!(
            signature.to_string(),
            "substring(start: Integer, length: Integer?) -> String"
        );
    }

    #[test]
    fn test_symmetric_overload() {
        let union = OperatorSignature::binary(
            OperatorName::Union,
            Type::generic("A"),
            Type::generic("A"),
            Type::generic("A"),
        );
        assert!(union.is_symmetric());

        let membership = OperatorSignature::binary(
            OperatorName::In,
            Type::single(Type::generic("T")),
            Type::generic("T"),
            Type::single(Type::Boolean),
        );
        assert!(!membership.is_symmetric());
    }

    #[test]
    fn test_fixed_return_substitutes_bindings() {
        let mut bindings = TypeBindings::default();
        bindings.insert("X".to_string(), Type::Date);
        let fixed = OperatorReturnType::Fixed(Type::generic("X"));
        let ty = fixed.resolve(&bindings, &Type::Null, &Type::Null);
        assert_eq!(ty, Type::Date);
    }

    #[test]
    fn test_lambda_parameter() {
        let param = ParameterInfo::optional_lambda("criteria", Type::Boolean);
        assert!(param.is_lambda());
        assert!(param.optional);
    }
}
