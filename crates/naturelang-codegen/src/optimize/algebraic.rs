//! Pass 3: algebraic simplification.
//!
//! Identity and absorption patterns: `x+0`, `0+x`, `x-0`, `x-x`, `x*0`,
//! `0*x`, `x*1`, `1*x`, `x/1`, `x**0`, `x**1`. Rewrites that keep `x` become
//! `Assign(result, x)`; rewrites to a constant become `LoadInt`.

use naturelang_core::tac::{Instruction, Opcode, Operand, TacFunction};

pub fn run(func: &mut TacFunction, verbose: bool) -> usize {
    let mut count = 0;
    for ins in func.instructions.iter_mut() {
        if ins.is_dead {
            continue;
        }
        if simplify(ins) {
            count += 1;
            if verbose {
                tracing::debug!(line = ins.line, "simplified to {}", ins);
            }
        }
    }
    count
}

fn is_zero(operand: &Operand) -> bool {
    matches!(operand, Operand::IntConst(0)) || matches!(operand, Operand::FloatConst(v) if *v == 0.0)
}

fn is_one(operand: &Operand) -> bool {
    matches!(operand, Operand::IntConst(1)) || matches!(operand, Operand::FloatConst(v) if *v == 1.0)
}

/// Same temp id or same variable name.
fn same_value(a: &Operand, b: &Operand) -> bool {
    match (a, b) {
        (Operand::Temp(x, _), Operand::Temp(y, _)) => x == y,
        (Operand::Var(x, _), Operand::Var(y, _)) => x == y,
        _ => false,
    }
}

fn simplify(ins: &mut Instruction) -> bool {
    match ins.op {
        Opcode::Add => {
            if is_zero(&ins.arg2) {
                to_assign_first(ins);
            } else if is_zero(&ins.arg1) {
                to_assign_second(ins);
            } else {
                return false;
            }
        }
        Opcode::Sub => {
            if is_zero(&ins.arg2) {
                to_assign_first(ins);
            } else if same_value(&ins.arg1, &ins.arg2) {
                to_load_int(ins, 0);
            } else {
                return false;
            }
        }
        Opcode::Mul => {
            if is_zero(&ins.arg1) || is_zero(&ins.arg2) {
                to_load_int(ins, 0);
            } else if is_one(&ins.arg2) {
                to_assign_first(ins);
            } else if is_one(&ins.arg1) {
                to_assign_second(ins);
            } else {
                return false;
            }
        }
        Opcode::Div => {
            if is_one(&ins.arg2) {
                to_assign_first(ins);
            } else {
                return false;
            }
        }
        Opcode::Pow => {
            if is_zero(&ins.arg2) {
                to_load_int(ins, 1);
            } else if is_one(&ins.arg2) {
                to_assign_first(ins);
            } else {
                return false;
            }
        }
        _ => return false,
    }
    true
}

fn to_assign_first(ins: &mut Instruction) {
    ins.op = Opcode::Assign;
    ins.arg2 = Operand::None;
    ins.arg3 = Operand::None;
}

fn to_assign_second(ins: &mut Instruction) {
    ins.op = Opcode::Assign;
    ins.arg1 = std::mem::take(&mut ins.arg2);
    ins.arg3 = Operand::None;
}

fn to_load_int(ins: &mut Instruction, value: i64) {
    ins.op = Opcode::LoadInt;
    ins.arg1 = Operand::IntConst(value);
    ins.arg2 = Operand::None;
    ins.arg3 = Operand::None;
}
