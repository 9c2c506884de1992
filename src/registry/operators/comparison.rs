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

//! Equality, equivalence and ordering operators
//!
//! All of them take two operands of the same type `T`; operand order does not
//! matter for matching, so `Integer = Decimal` resolves through widening just
//! like `Decimal = Integer`.

use std::sync::LazyLock;

use crate::model::types::Type;
use crate::registry::operator::{OperatorName, OperatorRegistry};
use crate::registry::signature::OperatorSignature;

const COMPARISON_OPERATORS: [OperatorName; 8] = [
    OperatorName::Equals,
    OperatorName::NotEquals,
    OperatorName::Equivalent,
    OperatorName::NotEquivalent,
    OperatorName::LessThan,
    OperatorName::LessOrEqual,
    OperatorName::GreaterThan,
    OperatorName::GreaterOrEqual,
];

static COMPARISON_SIGNATURES: LazyLock<Vec<OperatorSignature>> = LazyLock::new(|| {
    COMPARISON_OPERATORS
        .into_iter()
        .map(|name| {
            OperatorSignature::binary(
                name,
                Type::generic("T"),
                Type::generic("T"),
                Type::single(Type::Boolean),
            )
        })
        .collect()
});

/// Register comparison operators
pub fn register_comparison_operators(registry: &mut OperatorRegistry) {
    for signature in COMPARISON_SIGNATURES.iter() {
        registry.register(signature.clone());
    }
}
