//! Compilation error types covering the pipeline's failure modes.

use naturelang_check::diagnostics::SemanticError;

/// Errors that abort the compilation pipeline.
#[derive(Debug, thiserror::Error)]
pub enum CodegenError {
    /// Semantic analysis found errors; the strict pipeline halts before
    /// lowering.
    #[error("semantic analysis failed with {} error(s)", .0.len())]
    CheckFailed(Vec<SemanticError>),

    /// Filesystem I/O error (writing the generated translation unit).
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
