//! Semantic analysis for NatureLang programs.
//!
//! [`analyzer::SemanticAnalyzer`] walks a frontend AST, builds the
//! [`symbols::SymbolTable`], annotates every expression's `data_type` in
//! place, and collects all [`diagnostics`] without ever aborting -- one pass
//! surfaces every error and warning in the program.

pub mod analyzer;
pub mod diagnostics;
pub mod rules;
pub mod symbols;

pub use analyzer::{AnalysisReport, SemanticAnalyzer};
pub use diagnostics::{SemanticError, SemanticWarning};
pub use symbols::{FunctionInfo, Scope, ScopeKind, Symbol, SymbolKind, SymbolTable};
