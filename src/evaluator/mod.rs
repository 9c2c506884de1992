//! Evaluation boundary
//!
//! Values are computed by an external FHIRPath runtime. This module renders
//! token expressions to text, supplies binding values through an explicit
//! resolver, and turns runtime failures into values that remember which
//! binding failed.

mod context;
mod engine;
mod error;

pub use context::{BindingValues, VariableResolver};
pub use engine::{EvaluationRuntime, ProgramValues, evaluate_program, expression_value};
pub use error::{RuntimeError, RuntimeResult};
