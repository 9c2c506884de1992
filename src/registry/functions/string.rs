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

//! String manipulation functions

use crate::model::types::Type;
use crate::registry::function::{FunctionGroup, FunctionRegistry};
use crate::registry::signature::{FunctionSignature, ParameterInfo};

use super::single;

/// Register string functions
pub fn register_string_functions(registry: &mut FunctionRegistry) {
    let group = FunctionGroup::String;
    let text = || single(Type::String);
    let string_param = |name: &str| ParameterInfo::required(name, single(Type::String));

    registry.register(
        group,
        FunctionSignature::new(
            "indexOf",
            Type::String,
            vec![string_param("substring")],
            single(Type::Integer),
        ),
    );
    registry.register(
        group,
        FunctionSignature::new(
            "substring",
            Type::String,
            vec![
                ParameterInfo::required("start", single(Type::Integer)),
                ParameterInfo::optional("length", single(Type::Integer)),
            ],
            text(),
        ),
    );
    for (name, param) in [
        ("startsWith", "prefix"),
        ("endsWith", "suffix"),
        ("contains", "substring"),
        ("matches", "regex"),
    ] {
        registry.register(
            group,
            FunctionSignature::new(
                name,
                Type::String,
                vec![string_param(param)],
                single(Type::Boolean),
            ),
        );
    }
    for name in ["upper", "lower", "trim"] {
        registry.register(
            group,
            FunctionSignature::new(name, Type::String, vec![], text()),
        );
    }
    for (name, first) in [("replace", "pattern"), ("replaceMatches", "regex")] {
        registry.register(
            group,
            FunctionSignature::new(
                name,
                Type::String,
                vec![string_param(first), string_param("substitution")],
                text(),
            ),
        );
    }
    registry.register(
        group,
        FunctionSignature::new("length", Type::String, vec![], single(Type::Integer)),
    );
    registry.register(
        group,
        FunctionSignature::new("toChars", Type::String, vec![], Type::String),
    );
    registry.register(
        group,
        FunctionSignature::new(
            "split",
            Type::String,
            vec![string_param("separator")],
            Type::String,
        ),
    );
    registry.register(
        group,
        FunctionSignature::new(
            "join",
            Type::String,
            vec![ParameterInfo::optional("separator", single(Type::String))],
            text(),
        ),
    );
}
