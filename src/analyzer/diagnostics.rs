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

//! Diagnostics collected from a typed program
//!
//! Every binding whose type is `Invalid` yields one error carrying the
//! position of the offending token. Structural problems that do not stop
//! typing (duplicate or empty names, dependency cycles) yield warnings.

use std::fmt;

use rustc_hash::FxHashSet;
use serde::{Deserialize, Serialize};

use crate::model::types::{Type, TypeErrorKind};

use super::dependencies::detect_cycles;
use super::program::{Program, ProgramTypes};

/// Diagnostic severity
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DiagnosticSeverity {
    /// Typing failed
    Error,
    /// Program types but looks wrong
    Warning,
}

/// A diagnostic message
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Diagnostic {
    /// Diagnostic severity
    pub severity: DiagnosticSeverity,
    /// Stable code for categorization, e.g. `type-mismatch`
    pub code: String,
    /// Human-readable message
    pub message: String,
    /// Name of the binding the diagnostic applies to, `None` for the main expression
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub binding: Option<String>,
    /// Index of the token the diagnostic points at
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub position: Option<usize>,
}

impl Diagnostic {
    /// Error diagnostic for an `Invalid` type, `None` for any other type
    pub fn from_type(ty: &Type, binding: Option<&str>) -> Option<Self> {
        let error = ty.as_error()?;
        Some(Self {
            severity: DiagnosticSeverity::Error,
            code: error_code(error.kind).to_string(),
            message: error.message.clone(),
            binding: binding.map(str::to_string),
            position: error.position,
        })
    }

    fn warning(code: &str, message: String, binding: Option<&str>) -> Self {
        Self {
            severity: DiagnosticSeverity::Warning,
            code: code.to_string(),
            message,
            binding: binding.map(str::to_string),
            position: None,
        }
    }

    /// Whether this is an error
    pub fn is_error(&self) -> bool {
        self.severity == DiagnosticSeverity::Error
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let severity = match self.severity {
            DiagnosticSeverity::Error => "error",
            DiagnosticSeverity::Warning => "warning",
        };
        write!(f, "{severity}[{}]", self.code)?;
        match &self.binding {
            Some(name) => write!(f, " in %{name}")?,
            None => write!(f, " in expression")?,
        }
        if let Some(position) = self.position {
            write!(f, " at token {position}")?;
        }
        write!(f, ": {}", self.message)
    }
}

/// Code of a type error kind
pub fn error_code(kind: TypeErrorKind) -> &'static str {
    match kind {
        TypeErrorKind::TypeMismatch => "type-mismatch",
        TypeErrorKind::UnknownIdentifier => "unknown-identifier",
        TypeErrorKind::StructuralConstraintViolation => "structural-constraint",
        TypeErrorKind::EmptyExpression => "empty-expression",
    }
}

/// Diagnostics of a typed program: errors in binding order, the main
/// expression last, then warnings
pub fn collect_diagnostics(program: &Program, types: &ProgramTypes) -> Vec<Diagnostic> {
    let mut diagnostics: Vec<Diagnostic> = program
        .bindings
        .iter()
        .filter_map(|binding| {
            types
                .binding(&binding.id)
                .and_then(|ty| Diagnostic::from_type(ty, Some(&binding.name)))
        })
        .collect();
    if let Some(diagnostic) = types
        .expression
        .as_ref()
        .and_then(|ty| Diagnostic::from_type(ty, None))
    {
        diagnostics.push(diagnostic);
    }

    let mut seen: FxHashSet<&str> = FxHashSet::default();
    for binding in &program.bindings {
        if binding.name.trim().is_empty() {
            diagnostics.push(Diagnostic::warning(
                "empty-name",
                format!("Binding {} has no name", binding.id),
                None,
            ));
        } else if !seen.insert(binding.name.as_str()) {
            diagnostics.push(Diagnostic::warning(
                "duplicate-name",
                format!(
                    "Binding name {} is already used by an earlier binding",
                    binding.name
                ),
                Some(&binding.name),
            ));
        }
    }

    if let Err(cycle) = detect_cycles(&program.dependency_graph()) {
        let names: Vec<&str> = cycle
            .path
            .iter()
            .map(|id| match program.binding(id) {
                Some(binding) => binding.name.as_str(),
                None => id.as_str(),
            })
            .collect();
        let first = names.first().copied();
        diagnostics.push(Diagnostic::warning(
            "dependency-cycle",
            format!("Bindings reference each other: {}", names.join(" -> ")),
            first,
        ));
    }

    log::debug!("collected {} diagnostics", diagnostics.len());
    diagnostics
}
