//! Core error types for naturelang-core.
//!
//! Uses `thiserror` for structured, matchable error variants.

use thiserror::Error;

/// Errors produced by the core data model.
#[derive(Debug, Error)]
pub enum CoreError {
    /// Registering a user function whose name is already taken.
    #[error("duplicate function: '{name}'")]
    DuplicateFunction { name: String },

    /// A referenced user function does not exist in the program.
    #[error("function not found: '{name}'")]
    FunctionNotFound { name: String },
}
