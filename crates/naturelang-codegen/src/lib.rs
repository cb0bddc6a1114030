//! The NatureLang middle and back end: AST lowering to three-address code,
//! machine-independent optimization, and C code generation.
//!
//! # Modules
//!
//! - [`error`] -- Error types for pipeline failure modes
//! - [`lower`] -- AST to TAC lowering ([`lower::IrBuilder`])
//! - [`optimize`] -- The six-pass fixpoint optimizer
//! - [`types`] -- Concrete type synthesis for emission
//! - [`emit`] -- The C generator ([`emit::CGenerator`])
//! - [`runtime`] -- Names of the runtime symbols the generated C references
//!
//! The [`compile`] function is the main entry point: it runs the semantic
//! analyzer, halts on any semantic error, then lowers, optimizes, and emits.

pub mod emit;
pub mod error;
pub mod lower;
pub mod optimize;
pub mod runtime;
pub mod types;

pub use error::CodegenError;
pub use optimize::OptStats;

use serde::{Deserialize, Serialize};

use naturelang_check::analyzer::SemanticAnalyzer;
use naturelang_check::diagnostics::SemanticWarning;
use naturelang_core::ast::Node;

/// Optimization level for the TAC optimizer.
///
/// Level 1 runs constant folding and dead-code elimination; level 2 adds
/// propagation, algebraic simplification, strength reduction, and redundant
/// load elimination. Default is `O0` (no optimization).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum OptLevel {
    /// No optimization.
    O0,
    /// Constant folding + dead code elimination.
    O1,
    /// All six passes.
    O2,
}

impl Default for OptLevel {
    fn default() -> Self {
        OptLevel::O0
    }
}

/// Options controlling the compilation pipeline.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CompileOptions {
    /// TAC optimization level.
    pub opt_level: OptLevel,

    /// Emit per-transformation optimizer diagnostics.
    pub verbose: bool,

    /// Include a text dump of the optimized TAC in the result.
    pub emit_tac: bool,
}

/// Result of a successful compilation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompileOutput {
    /// The generated C translation unit.
    pub c_source: String,

    /// Soft errors recorded by the C generator (emission still completed).
    pub codegen_errors: Vec<String>,

    /// Optimizer transformation counts.
    pub opt_stats: OptStats,

    /// Warnings from semantic analysis.
    pub warnings: Vec<SemanticWarning>,

    /// Text dump of the optimized TAC, when requested.
    pub tac: Option<String>,
}

/// Compiles an AST to C source.
///
/// Orchestrates the pipeline: semantic analysis (annotating the AST in
/// place), lowering, optimization at the configured level, and C emission.
/// Any semantic error halts the pipeline with [`CodegenError::CheckFailed`];
/// warnings are carried through into the output.
pub fn compile(ast: &mut Node, options: &CompileOptions) -> Result<CompileOutput, CodegenError> {
    let report = SemanticAnalyzer::new().analyze(ast);
    if !report.success {
        return Err(CodegenError::CheckFailed(report.errors));
    }

    let mut program = lower::IrBuilder::new().lower(ast);
    let opt_stats = optimize::optimize_program(&mut program, options.opt_level, options.verbose);
    let output = emit::CGenerator::new().generate(&program);

    Ok(CompileOutput {
        c_source: output.c_source,
        codegen_errors: output.errors,
        opt_stats,
        warnings: report.warnings,
        tac: options.emit_tac.then(|| program.to_string()),
    })
}
