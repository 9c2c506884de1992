//! Function registry and call-type resolution

use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};

use crate::model::provider::FieldResolver;
use crate::model::type_pattern::{match_type_pattern, match_type_pattern_with, substitute_bindings};
use crate::model::types::{Type, TypeErrorKind};
use crate::registry::functions;
use crate::registry::signature::{CallTypes, FunctionSignature};

/// Grouping of functions in suggestion lists
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FunctionGroup {
    /// Existence and counting
    Existence,
    /// Filtering and projection
    Filtering,
    /// Picking elements by position
    Subsetting,
    /// Merging collections
    Combining,
    /// Conversion and conditionals
    Conversion,
    /// String manipulation
    String,
    /// Arithmetic
    Math,
    /// Aggregation over a collection
    Aggregate,
    /// Everything else
    Utility,
}

impl FunctionGroup {
    /// Heading shown above the group
    pub fn label(self) -> &'static str {
        match self {
            FunctionGroup::Existence => "Existence",
            FunctionGroup::Filtering => "Filtering and projection",
            FunctionGroup::Subsetting => "Subsetting",
            FunctionGroup::Combining => "Combining",
            FunctionGroup::Conversion => "Conversion",
            FunctionGroup::String => "String manipulation",
            FunctionGroup::Math => "Math",
            FunctionGroup::Aggregate => "Aggregates",
            FunctionGroup::Utility => "Utility",
        }
    }
}

/// A registered function
#[derive(Debug, Clone)]
pub struct FunctionMetadata {
    /// Call signature
    pub signature: FunctionSignature,
    /// Suggestion group
    pub group: FunctionGroup,
}

impl FunctionMetadata {
    /// Function name
    pub fn name(&self) -> &str {
        &self.signature.name
    }

    /// Whether the function accepts an input of the given type
    pub fn is_compatible(&self, input: &Type) -> bool {
        match_type_pattern(&self.signature.input, input).is_some()
    }
}

/// Registry of callable functions, in registration order
#[derive(Debug, Clone, Default)]
pub struct FunctionRegistry {
    functions: Vec<FunctionMetadata>,
    by_name: FxHashMap<String, usize>,
}

impl FunctionRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a registry holding every built-in function
    pub fn builtin() -> Self {
        let mut registry = Self::new();
        register_builtin_functions(&mut registry);
        registry
    }

    /// Register a function, replacing any earlier function with the same name
    pub fn register(&mut self, group: FunctionGroup, signature: FunctionSignature) {
        let metadata = FunctionMetadata { signature, group };
        match self.by_name.get(metadata.name()) {
            Some(&index) => self.functions[index] = metadata,
            None => {
                self.by_name
                    .insert(metadata.name().to_string(), self.functions.len());
                self.functions.push(metadata);
            }
        }
    }

    /// Look up a function by name
    pub fn get(&self, name: &str) -> Option<&FunctionMetadata> {
        self.by_name.get(name).map(|&index| &self.functions[index])
    }

    /// Check if a function exists
    pub fn contains(&self, name: &str) -> bool {
        self.by_name.contains_key(name)
    }

    /// All functions in registration order
    pub fn functions(&self) -> &[FunctionMetadata] {
        &self.functions
    }

    /// Number of registered functions
    pub fn len(&self) -> usize {
        self.functions.len()
    }

    /// Whether no function is registered
    pub fn is_empty(&self) -> bool {
        self.functions.is_empty()
    }

    /// Functions that accept an input of the given type
    pub fn suggest_functions_for_input_type(&self, input: &Type) -> Vec<&FunctionMetadata> {
        self.functions
            .iter()
            .filter(|metadata| metadata.is_compatible(input))
            .collect()
    }

    /// Result type of calling `name` on `input`.
    ///
    /// `argument_type(i, scope)` types the i-th argument expression against
    /// `scope`, or returns `None` when the argument is absent. Lambda arguments
    /// are scoped to a single element of the input, value arguments to
    /// `context`. Failures are returned as unpositioned `Invalid` types.
    pub fn resolve_function_call(
        &self,
        name: &str,
        input: &Type,
        context: &Type,
        argument_count: usize,
        resolver: &dyn FieldResolver,
        argument_type: &mut dyn FnMut(usize, &Type) -> Option<Type>,
    ) -> Type {
        if input.is_invalid() {
            return input.clone();
        }

        let Some(metadata) = self.get(name) else {
            return Type::invalid(
                TypeErrorKind::UnknownIdentifier,
                format!("Unknown function {name}"),
            );
        };
        let signature = &metadata.signature;

        let Some(mut bindings) = match_type_pattern(&signature.input, input) else {
            return Type::invalid(
                TypeErrorKind::TypeMismatch,
                format!("Function {name} cannot be applied to {}", input.describe()),
            );
        };

        if argument_count > signature.max_arity {
            return Type::invalid(
                TypeErrorKind::TypeMismatch,
                format!(
                    "Function {name} expects at most {} arguments, got {argument_count}",
                    signature.max_arity
                ),
            );
        }

        let lambda_scope = Type::single(input.element());
        let mut arguments = Vec::with_capacity(signature.parameters.len());
        for (index, parameter) in signature.parameters.iter().enumerate() {
            let scope = if parameter.is_lambda() {
                &lambda_scope
            } else {
                context
            };
            let argument = if index < argument_count {
                argument_type(index, scope)
            } else {
                None
            };

            let Some(argument) = argument else {
                if parameter.optional {
                    break;
                }
                return Type::invalid(
                    TypeErrorKind::TypeMismatch,
                    format!("Function {name} requires argument {}", parameter.name),
                );
            };
            if argument.is_invalid() {
                return argument;
            }

            let pattern = substitute_bindings(&parameter.param_type, &bindings);
            match match_type_pattern_with(&pattern, &argument, &bindings) {
                Some(extended) => bindings = extended,
                None => {
                    return Type::invalid(
                        TypeErrorKind::TypeMismatch,
                        format!(
                            "Argument {} of {name} expects {}, got {}",
                            parameter.name,
                            pattern.describe(),
                            argument.describe()
                        ),
                    );
                }
            }
            arguments.push(argument);
        }

        let call = CallTypes {
            bindings: &bindings,
            input,
            arguments: &arguments,
            resolver,
        };
        signature.return_type.resolve(&call)
    }
}

/// Register all built-in functions
pub fn register_builtin_functions(registry: &mut FunctionRegistry) {
    functions::register_builtin_functions(registry);
}
