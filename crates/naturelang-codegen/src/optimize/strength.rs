//! Pass 4: strength reduction.
//!
//! `x*2` and `2*x` become `x+x`; `x**2` becomes `x*x`. Higher powers are
//! left alone.

use naturelang_core::tac::{Opcode, Operand, TacFunction};

pub fn run(func: &mut TacFunction, verbose: bool) -> usize {
    let mut count = 0;
    for ins in func.instructions.iter_mut() {
        if ins.is_dead {
            continue;
        }
        let reduced = match ins.op {
            Opcode::Mul => {
                if ins.arg2 == Operand::IntConst(2) {
                    ins.op = Opcode::Add;
                    ins.arg2 = ins.arg1.clone();
                    true
                } else if ins.arg1 == Operand::IntConst(2) {
                    ins.op = Opcode::Add;
                    ins.arg1 = ins.arg2.clone();
                    true
                } else {
                    false
                }
            }
            Opcode::Pow => {
                if ins.arg2 == Operand::IntConst(2) {
                    ins.op = Opcode::Mul;
                    ins.arg2 = ins.arg1.clone();
                    true
                } else {
                    false
                }
            }
            _ => false,
        };
        if reduced {
            count += 1;
            if verbose {
                tracing::debug!(line = ins.line, "strength-reduced to {}", ins);
            }
        }
    }
    count
}

#[cfg(test)]
mod tests {
    use super::*;
    use naturelang_core::tac::Instruction;
    use naturelang_core::types::DataType;

    fn temp(id: u32) -> Operand {
        Operand::Temp(id, DataType::Number)
    }

    fn check(op: Opcode, arg1: Operand, arg2: Operand) -> Instruction {
        let mut func = TacFunction::main();
        func.push(Instruction::new(op, temp(9), arg1, arg2, 1));
        run(&mut func, false);
        func.instructions.pop().unwrap()
    }

    #[test]
    fn times_two_becomes_self_addition() {
        let ins = check(Opcode::Mul, temp(0), Operand::IntConst(2));
        assert_eq!(ins.op, Opcode::Add);
        assert_eq!(ins.arg1, temp(0));
        assert_eq!(ins.arg2, temp(0));
    }

    #[test]
    fn two_times_becomes_self_addition() {
        let ins = check(Opcode::Mul, Operand::IntConst(2), temp(4));
        assert_eq!(ins.op, Opcode::Add);
        assert_eq!(ins.arg1, temp(4));
        assert_eq!(ins.arg2, temp(4));
    }

    #[test]
    fn square_becomes_self_multiplication() {
        let ins = check(Opcode::Pow, temp(0), Operand::IntConst(2));
        assert_eq!(ins.op, Opcode::Mul);
        assert_eq!(ins.arg2, temp(0));
    }

    #[test]
    fn higher_powers_are_left_alone() {
        let ins = check(Opcode::Pow, temp(0), Operand::IntConst(3));
        assert_eq!(ins.op, Opcode::Pow);
    }

    #[test]
    fn times_three_is_left_alone() {
        let ins = check(Opcode::Mul, temp(0), Operand::IntConst(3));
        assert_eq!(ins.op, Opcode::Mul);
    }
}
