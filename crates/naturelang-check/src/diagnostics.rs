//! Semantic diagnostics: one error variant per violated rule, each with the
//! source location and enough structured context to render a useful message.
//!
//! Errors are collected, never thrown -- the analyzer keeps walking after
//! every error so a single pass surfaces all of them.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use naturelang_core::loc::SourceLoc;
use naturelang_core::types::DataType;

/// A semantic error detected during analysis.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Error)]
pub enum SemanticError {
    #[error("{loc}: undefined symbol '{name}'")]
    UndefinedSymbol { name: String, loc: SourceLoc },

    #[error("{loc}: call to undefined function '{name}'")]
    UndefinedFunction { name: String, loc: SourceLoc },

    #[error("{loc}: '{name}' is already declared in this scope (first declared at {previous})")]
    Redeclaration {
        name: String,
        loc: SourceLoc,
        previous: SourceLoc,
    },

    #[error("{loc}: cannot initialize '{name}' of type {declared} with a {actual} value")]
    InitializerMismatch {
        name: String,
        declared: DataType,
        actual: DataType,
        loc: SourceLoc,
    },

    #[error("{loc}: cannot assign a {actual} value to '{name}' of type {expected}")]
    AssignMismatch {
        name: String,
        expected: DataType,
        actual: DataType,
        loc: SourceLoc,
    },

    #[error("{loc}: invalid assignment target")]
    InvalidAssignTarget { loc: SourceLoc },

    #[error("{loc}: cannot modify constant '{name}'")]
    ConstantAssignment { name: String, loc: SourceLoc },

    #[error("{loc}: operator '{op}' cannot be applied to {left} and {right}")]
    InvalidOperands {
        op: String,
        left: DataType,
        right: DataType,
        loc: SourceLoc,
    },

    #[error("{loc}: unary '{op}' cannot be applied to {operand}")]
    InvalidUnaryOperand {
        op: String,
        operand: DataType,
        loc: SourceLoc,
    },

    #[error("{loc}: logical '{op}' requires flag operands, got {actual}")]
    LogicalOperandNotFlag {
        op: String,
        actual: DataType,
        loc: SourceLoc,
    },

    #[error("{loc}: 'between' requires numeric value and bounds, got {actual}")]
    NonNumericBetween { actual: DataType, loc: SourceLoc },

    #[error("{loc}: index expression must be numeric, got {actual}")]
    NonNumericIndex { actual: DataType, loc: SourceLoc },

    #[error("{loc}: a {actual} value cannot be indexed")]
    NotIndexable { actual: DataType, loc: SourceLoc },

    #[error("{loc}: 'stop' outside of a loop")]
    BreakOutsideLoop { loc: SourceLoc },

    #[error("{loc}: 'skip' outside of a loop")]
    ContinueOutsideLoop { loc: SourceLoc },

    #[error("{loc}: 'give back' outside of a function")]
    ReturnOutsideFunction { loc: SourceLoc },

    #[error("{loc}: function returns {expected} but 'give back' value is {actual}")]
    ReturnTypeMismatch {
        expected: DataType,
        actual: DataType,
        loc: SourceLoc,
    },

    #[error("{loc}: function returns {expected} but 'give back' has no value")]
    MissingReturnValue { expected: DataType, loc: SourceLoc },

    #[error("{loc}: repeat count must be numeric, got {actual}")]
    NonNumericRepeatCount { actual: DataType, loc: SourceLoc },

    #[error("{loc}: cannot iterate over a {actual} value")]
    NotIterable { actual: DataType, loc: SourceLoc },

    #[error("{loc}: '{name}' is not a function")]
    NotAFunction { name: String, loc: SourceLoc },

    #[error("{loc}: '{name}' expects {expected} argument(s), got {actual}")]
    ArgumentCount {
        name: String,
        expected: usize,
        actual: usize,
        loc: SourceLoc,
    },

    #[error("{loc}: argument {index} of '{name}' expects {expected}, got {actual}")]
    ArgumentType {
        name: String,
        index: usize,
        expected: DataType,
        actual: DataType,
        loc: SourceLoc,
    },
}

impl SemanticError {
    /// Source location the error points at.
    pub fn loc(&self) -> SourceLoc {
        match self {
            SemanticError::UndefinedSymbol { loc, .. }
            | SemanticError::UndefinedFunction { loc, .. }
            | SemanticError::Redeclaration { loc, .. }
            | SemanticError::InitializerMismatch { loc, .. }
            | SemanticError::AssignMismatch { loc, .. }
            | SemanticError::InvalidAssignTarget { loc }
            | SemanticError::ConstantAssignment { loc, .. }
            | SemanticError::InvalidOperands { loc, .. }
            | SemanticError::InvalidUnaryOperand { loc, .. }
            | SemanticError::LogicalOperandNotFlag { loc, .. }
            | SemanticError::NonNumericBetween { loc, .. }
            | SemanticError::NonNumericIndex { loc, .. }
            | SemanticError::NotIndexable { loc, .. }
            | SemanticError::BreakOutsideLoop { loc }
            | SemanticError::ContinueOutsideLoop { loc }
            | SemanticError::ReturnOutsideFunction { loc }
            | SemanticError::ReturnTypeMismatch { loc, .. }
            | SemanticError::MissingReturnValue { loc, .. }
            | SemanticError::NonNumericRepeatCount { loc, .. }
            | SemanticError::NotIterable { loc, .. }
            | SemanticError::NotAFunction { loc, .. }
            | SemanticError::ArgumentCount { loc, .. }
            | SemanticError::ArgumentType { loc, .. } => *loc,
        }
    }
}

/// A semantic warning. Warnings never fail analysis.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Error)]
pub enum SemanticWarning {
    #[error("{loc}: '{name}' may be read before it is set")]
    UninitializedRead { name: String, loc: SourceLoc },

    #[error("{loc}: condition is {actual}, expected flag")]
    NonBooleanCondition { actual: DataType, loc: SourceLoc },
}

impl SemanticWarning {
    pub fn loc(&self) -> SourceLoc {
        match self {
            SemanticWarning::UninitializedRead { loc, .. }
            | SemanticWarning::NonBooleanCondition { loc, .. } => *loc,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn messages_carry_location_and_names() {
        let err = SemanticError::UndefinedSymbol {
            name: "pet count".into(),
            loc: SourceLoc::new(4, 2),
        };
        let msg = err.to_string();
        assert!(msg.contains("4:2"));
        assert!(msg.contains("pet count"));
    }

    #[test]
    fn loc_accessor_matches_payload() {
        let err = SemanticError::BreakOutsideLoop {
            loc: SourceLoc::new(9, 1),
        };
        assert_eq!(err.loc(), SourceLoc::new(9, 1));

        let warn = SemanticWarning::NonBooleanCondition {
            actual: DataType::Text,
            loc: SourceLoc::new(2, 5),
        };
        assert_eq!(warn.loc(), SourceLoc::new(2, 5));
    }

    #[test]
    fn serde_roundtrip() {
        let err = SemanticError::ArgumentCount {
            name: "add".into(),
            expected: 2,
            actual: 3,
            loc: SourceLoc::new(1, 1),
        };
        let json = serde_json::to_string(&err).unwrap();
        let back: SemanticError = serde_json::from_str(&json).unwrap();
        assert_eq!(err, back);
    }
}
