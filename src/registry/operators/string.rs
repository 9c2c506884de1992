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

//! String concatenation operator

use std::sync::LazyLock;

use crate::model::types::Type;
use crate::registry::operator::{OperatorName, OperatorRegistry};
use crate::registry::signature::OperatorSignature;

static STRING_SIGNATURES: LazyLock<Vec<OperatorSignature>> = LazyLock::new(|| {
    vec![OperatorSignature::binary(
        OperatorName::Concat,
        Type::single(Type::String),
        Type::single(Type::String),
        Type::single(Type::String),
    )]
});

/// Register string operators
pub fn register_string_operators(registry: &mut OperatorRegistry) {
    for signature in STRING_SIGNATURES.iter() {
        registry.register(signature.clone());
    }
}
