//! Subsetting functions

use crate::model::types::Type;
use crate::registry::function::{FunctionGroup, FunctionRegistry};
use crate::registry::signature::{FunctionSignature, ParameterInfo};

use super::{input_elements, single, single_input_element};

/// Register subsetting functions
pub fn register_subsetting_functions(registry: &mut FunctionRegistry) {
    let group = FunctionGroup::Subsetting;
    let any = || Type::generic("T");

    for name in ["single", "first", "last"] {
        registry.register(
            group,
            FunctionSignature::computed(name, any(), vec![], single_input_element),
        );
    }
    registry.register(
        group,
        FunctionSignature::computed("tail", any(), vec![], input_elements),
    );
    for name in ["skip", "take"] {
        registry.register(
            group,
            FunctionSignature::computed(
                name,
                any(),
                vec![ParameterInfo::required("num", single(Type::Integer))],
                input_elements,
            ),
        );
    }
    for name in ["intersect", "exclude"] {
        registry.register(
            group,
            FunctionSignature::computed(
                name,
                any(),
                vec![ParameterInfo::required("other", Type::generic("U"))],
                input_elements,
            ),
        );
    }
}
