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

//! Utility functions: clock, tracing, negation and navigation helpers

use crate::model::types::{Type, normalize_choice};
use crate::registry::function::{FunctionGroup, FunctionRegistry};
use crate::registry::signature::{CallTypes, FunctionSignature, ParameterInfo};

use super::{same_as_input, single};

/// Union of the types of every field of the input elements
fn child_types(call: &CallTypes<'_>) -> Type {
    let children: Vec<Type> = call
        .resolver
        .fields(&call.input.element())
        .into_values()
        .map(|ty| ty.element())
        .collect();
    if children.is_empty() {
        Type::Null
    } else {
        normalize_choice(children)
    }
}

/// Register utility functions
pub fn register_utility_functions(registry: &mut FunctionRegistry) {
    let group = FunctionGroup::Utility;
    let any = || Type::generic("T");

    for (name, ty) in [
        ("now", Type::DateTime),
        ("today", Type::Date),
        ("timeOfDay", Type::Time),
    ] {
        registry.register(
            group,
            FunctionSignature::new(name, any(), vec![], single(ty)),
        );
    }
    registry.register(
        group,
        FunctionSignature::computed(
            "trace",
            any(),
            vec![
                ParameterInfo::required("name", single(Type::String)),
                ParameterInfo::optional_lambda("projection", Type::generic("R")),
            ],
            same_as_input,
        ),
    );
    registry.register(
        group,
        FunctionSignature::new("not", Type::Boolean, vec![], single(Type::Boolean)),
    );
    registry.register(
        group,
        FunctionSignature::computed("children", any(), vec![], child_types),
    );
    registry.register(
        group,
        FunctionSignature::new(
            "extension",
            any(),
            vec![ParameterInfo::required("url", single(Type::String))],
            Type::complex(["Extension"]),
        ),
    );
}
