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

//! Existence functions: emptiness, counting and boolean quantifiers

use crate::model::types::Type;
use crate::registry::function::{FunctionGroup, FunctionRegistry};
use crate::registry::signature::{FunctionSignature, ParameterInfo};

use super::{input_elements, single};

/// Register existence functions
pub fn register_existence_functions(registry: &mut FunctionRegistry) {
    let group = FunctionGroup::Existence;
    let boolean = single(Type::Boolean);
    let any = || Type::generic("T");

    registry.register(
        group,
        FunctionSignature::new("empty", any(), vec![], boolean.clone()),
    );
    registry.register(
        group,
        FunctionSignature::new(
            "exists",
            any(),
            vec![ParameterInfo::optional_lambda("criteria", Type::Boolean)],
            boolean.clone(),
        ),
    );
    registry.register(
        group,
        FunctionSignature::new(
            "all",
            any(),
            vec![ParameterInfo::lambda("criteria", Type::Boolean)],
            boolean.clone(),
        ),
    );
    for name in ["allTrue", "anyTrue", "allFalse", "anyFalse"] {
        registry.register(
            group,
            FunctionSignature::new(name, Type::Boolean, vec![], boolean.clone()),
        );
    }
    registry.register(
        group,
        FunctionSignature::new("count", any(), vec![], single(Type::Integer)),
    );
    registry.register(
        group,
        FunctionSignature::computed("distinct", any(), vec![], input_elements),
    );
    for name in ["isDistinct", "hasValue"] {
        registry.register(
            group,
            FunctionSignature::new(name, any(), vec![], boolean.clone()),
        );
    }
    for name in ["subsetOf", "supersetOf"] {
        registry.register(
            group,
            FunctionSignature::new(
                name,
                any(),
                vec![ParameterInfo::required("other", Type::generic("U"))],
                boolean.clone(),
            ),
        );
    }
}
