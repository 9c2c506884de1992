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

//! Static analysis of visually composed expressions
//!
//! This module provides:
//! - Type evaluation of token sequences against a context type
//! - Next-token suggestions
//! - Binding dependency graphs and whole-program typing
//! - Diagnostics for typed programs

pub mod completion_provider;
pub mod dependencies;
pub mod diagnostics;
pub mod program;
pub mod type_analyzer;
pub mod type_cache;

pub use completion_provider::{
    CompletionProvider, LiteralDefaults, NextTokenAnalysis, SuggestedToken, SuggestionContext,
    extract_operator_context, operator_context_span, suggest_next_token_kinds,
};
pub use dependencies::{
    CycleError, DependencyGraph, build_dependency_graph, detect_cycles,
    extract_referenced_binding_names, extract_referenced_bindings, transitive_dependencies,
    transitive_dependents, walk_dependency_graph, walk_dependency_graph_checked,
};
pub use diagnostics::{Diagnostic, DiagnosticSeverity, collect_diagnostics};
pub use program::{Program, ProgramTypes};
pub use type_analyzer::{BindingTypes, TypeAnalyzer};
pub use type_cache::{CacheStats, TypeCache, TypeCacheKey};
