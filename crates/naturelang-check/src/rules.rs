//! Operator typing rules and the compatibility relation.
//!
//! Two types are *compatible* when they are equal, both numeric, or either
//! side is still unresolved (`Unknown`, or `Error` from an already-reported
//! failure -- poisoned types never cascade into fresh diagnostics).

use naturelang_core::ast::{BinaryOp, UnaryOp};
use naturelang_core::loc::SourceLoc;
use naturelang_core::types::DataType;

use crate::diagnostics::SemanticError;

/// The compatibility relation used by declarations, assignments, returns,
/// arguments, and ordering comparisons.
pub fn compatible(a: DataType, b: DataType) -> bool {
    if a == b {
        return true;
    }
    if a.is_numeric() && b.is_numeric() {
        return true;
    }
    is_unresolved(a) || is_unresolved(b)
}

/// `Unknown` before analysis, `Error` after a reported failure.
pub fn is_unresolved(ty: DataType) -> bool {
    matches!(ty, DataType::Unknown | DataType::Error)
}

/// Numeric promotion: `Decimal` wins, otherwise `Number`.
pub fn numeric_result(left: DataType, right: DataType) -> DataType {
    if left == DataType::Decimal || right == DataType::Decimal {
        DataType::Decimal
    } else {
        DataType::Number
    }
}

fn numeric_operand_ok(ty: DataType) -> bool {
    ty.is_numeric() || is_unresolved(ty)
}

fn op_name(op: BinaryOp) -> &'static str {
    match op {
        BinaryOp::Add => "plus",
        BinaryOp::Sub => "minus",
        BinaryOp::Mul => "multiplied by",
        BinaryOp::Div => "divided by",
        BinaryOp::Mod => "modulo",
        BinaryOp::Pow => "to the power of",
        BinaryOp::Eq => "is",
        BinaryOp::Neq => "is not",
        BinaryOp::Lt => "is less than",
        BinaryOp::Gt => "is greater than",
        BinaryOp::Lte => "is at most",
        BinaryOp::Gte => "is at least",
        BinaryOp::And => "and",
        BinaryOp::Or => "or",
    }
}

/// Resolves the result type of a binary operator, or the error to report.
pub fn binary_rule(
    op: BinaryOp,
    left: DataType,
    right: DataType,
    loc: SourceLoc,
) -> Result<DataType, SemanticError> {
    if op.is_logical() {
        for side in [left, right] {
            if side != DataType::Flag && !is_unresolved(side) {
                return Err(SemanticError::LogicalOperandNotFlag {
                    op: op_name(op).into(),
                    actual: side,
                    loc,
                });
            }
        }
        return Ok(DataType::Flag);
    }

    if op.is_comparison() {
        if op.is_ordering() && !compatible(left, right) {
            return Err(SemanticError::InvalidOperands {
                op: op_name(op).into(),
                left,
                right,
                loc,
            });
        }
        return Ok(DataType::Flag);
    }

    // Arithmetic. Text participates only in `+`, which is concatenation.
    if left == DataType::Text || right == DataType::Text {
        if op == BinaryOp::Add {
            return Ok(DataType::Text);
        }
        return Err(SemanticError::InvalidOperands {
            op: op_name(op).into(),
            left,
            right,
            loc,
        });
    }

    if !numeric_operand_ok(left) || !numeric_operand_ok(right) {
        return Err(SemanticError::InvalidOperands {
            op: op_name(op).into(),
            left,
            right,
            loc,
        });
    }

    if op == BinaryOp::Mod {
        return Ok(DataType::Number);
    }
    Ok(numeric_result(left, right))
}

/// Resolves the result type of a unary operator, or the error to report.
pub fn unary_rule(op: UnaryOp, operand: DataType, loc: SourceLoc) -> Result<DataType, SemanticError> {
    match op {
        UnaryOp::Neg | UnaryOp::Pos => {
            if !numeric_operand_ok(operand) {
                return Err(SemanticError::InvalidUnaryOperand {
                    op: if op == UnaryOp::Neg { "minus" } else { "plus" }.into(),
                    operand,
                    loc,
                });
            }
            Ok(if operand.is_numeric() { operand } else { DataType::Unknown })
        }
        UnaryOp::Not => {
            if operand != DataType::Flag && !is_unresolved(operand) {
                return Err(SemanticError::InvalidUnaryOperand {
                    op: "not".into(),
                    operand,
                    loc,
                });
            }
            Ok(DataType::Flag)
        }
    }
}
