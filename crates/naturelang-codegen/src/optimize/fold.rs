//! Pass 1: constant folding.
//!
//! Binary instructions whose sources are both numeric constants are evaluated
//! at compile time; pure-integer arithmetic rewrites to `LoadInt`, anything
//! involving a float rewrites to `LoadFloat`, comparisons to `LoadBool`.
//! Division and modulo by zero are detected and skipped, never evaluated.
//! Integer modulo does not fold when either operand is a decimal.

use naturelang_core::tac::{Instruction, Opcode, Operand, TacFunction};

pub fn run(func: &mut TacFunction, verbose: bool) -> usize {
    let mut count = 0;
    for ins in func.instructions.iter_mut() {
        if ins.is_dead {
            continue;
        }
        if try_fold(ins) {
            count += 1;
            if verbose {
                tracing::debug!(line = ins.line, "folded to {}", ins);
            }
        }
    }
    count
}

fn try_fold(ins: &mut Instruction) -> bool {
    match ins.op {
        op if op.is_binary_arith() || op.is_comparison() => try_fold_binary(ins),
        Opcode::And | Opcode::Or => try_fold_logic(ins),
        Opcode::Not => match ins.arg1 {
            Operand::BoolConst(v) => {
                rewrite_bool(ins, !v);
                true
            }
            _ => false,
        },
        Opcode::Neg => match ins.arg1 {
            Operand::IntConst(v) => {
                rewrite_int(ins, v.wrapping_neg());
                true
            }
            Operand::FloatConst(v) => {
                rewrite_float(ins, -v);
                true
            }
            _ => false,
        },
        _ => false,
    }
}

fn try_fold_binary(ins: &mut Instruction) -> bool {
    match (&ins.arg1, &ins.arg2) {
        (Operand::IntConst(l), Operand::IntConst(r)) => fold_int(ins, *l, *r),
        (Operand::IntConst(l), Operand::FloatConst(r)) => fold_float(ins, *l as f64, *r),
        (Operand::FloatConst(l), Operand::IntConst(r)) => fold_float(ins, *l, *r as f64),
        (Operand::FloatConst(l), Operand::FloatConst(r)) => fold_float(ins, *l, *r),
        _ => false,
    }
}

fn fold_int(ins: &mut Instruction, l: i64, r: i64) -> bool {
    match ins.op {
        Opcode::Add => rewrite_int(ins, l.wrapping_add(r)),
        Opcode::Sub => rewrite_int(ins, l.wrapping_sub(r)),
        Opcode::Mul => rewrite_int(ins, l.wrapping_mul(r)),
        Opcode::Div => match l.checked_div(r) {
            Some(v) => rewrite_int(ins, v),
            None => return false,
        },
        Opcode::Mod => match l.checked_rem(r) {
            Some(v) => rewrite_int(ins, v),
            None => return false,
        },
        Opcode::Pow => {
            // Non-negative integer exponents use integer exponentiation;
            // everything else goes through floating pow.
            if (0..=u32::MAX as i64).contains(&r) {
                rewrite_int(ins, l.wrapping_pow(r as u32))
            } else {
                rewrite_float(ins, (l as f64).powf(r as f64))
            }
        }
        Opcode::Eq => rewrite_bool(ins, l == r),
        Opcode::Neq => rewrite_bool(ins, l != r),
        Opcode::Lt => rewrite_bool(ins, l < r),
        Opcode::Gt => rewrite_bool(ins, l > r),
        Opcode::Lte => rewrite_bool(ins, l <= r),
        Opcode::Gte => rewrite_bool(ins, l >= r),
        _ => return false,
    }
    true
}

fn fold_float(ins: &mut Instruction, l: f64, r: f64) -> bool {
    match ins.op {
        Opcode::Add => rewrite_float(ins, l + r),
        Opcode::Sub => rewrite_float(ins, l - r),
        Opcode::Mul => rewrite_float(ins, l * r),
        Opcode::Div => {
            if r == 0.0 {
                return false;
            }
            rewrite_float(ins, l / r)
        }
        // Integer modulo only; decimal operands are left alone.
        Opcode::Mod => return false,
        Opcode::Pow => rewrite_float(ins, l.powf(r)),
        Opcode::Eq => rewrite_bool(ins, l == r),
        Opcode::Neq => rewrite_bool(ins, l != r),
        Opcode::Lt => rewrite_bool(ins, l < r),
        Opcode::Gt => rewrite_bool(ins, l > r),
        Opcode::Lte => rewrite_bool(ins, l <= r),
        Opcode::Gte => rewrite_bool(ins, l >= r),
        _ => return false,
    }
    true
}

fn try_fold_logic(ins: &mut Instruction) -> bool {
    if let (Operand::BoolConst(l), Operand::BoolConst(r)) = (&ins.arg1, &ins.arg2) {
        let value = match ins.op {
            Opcode::And => *l && *r,
            Opcode::Or => *l || *r,
            _ => return false,
        };
        rewrite_bool(ins, value);
        return true;
    }
    false
}

fn rewrite_int(ins: &mut Instruction, value: i64) {
    ins.op = Opcode::LoadInt;
    ins.arg1 = Operand::IntConst(value);
    ins.arg2 = Operand::None;
    ins.arg3 = Operand::None;
}

fn rewrite_float(ins: &mut Instruction, value: f64) {
    ins.op = Opcode::LoadFloat;
    ins.arg1 = Operand::FloatConst(value);
    ins.arg2 = Operand::None;
    ins.arg3 = Operand::None;
}

fn rewrite_bool(ins: &mut Instruction, value: bool) {
    ins.op = Opcode::LoadBool;
    ins.arg1 = Operand::BoolConst(value);
    ins.arg2 = Operand::None;
    ins.arg3 = Operand::None;
}
