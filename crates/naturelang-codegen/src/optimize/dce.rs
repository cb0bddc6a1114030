//! Pass 6: dead code elimination.
//!
//! An instruction with a temp result and no side effects is marked dead when
//! no live instruction anywhere in the function reads that temp. Scanning the
//! whole function (not just forward) keeps uses reached through loop
//! back-edges visible. Results written to named variables are always kept.

use naturelang_core::tac::TacFunction;

pub fn run(func: &mut TacFunction, verbose: bool) -> usize {
    let mut count = 0;
    for index in 0..func.instructions.len() {
        let candidate = {
            let ins = &func.instructions[index];
            if ins.is_dead || ins.op.has_side_effects() {
                None
            } else {
                ins.result.as_temp()
            }
        };
        let Some(id) = candidate else { continue };
        let used = func
            .instructions
            .iter()
            .any(|other| !other.is_dead && other.uses_temp(id));
        if !used {
            func.instructions[index].is_dead = true;
            count += 1;
            if verbose {
                tracing::debug!(temp = id, "marked dead: {}", func.instructions[index]);
            }
        }
    }
    count
}

#[cfg(test)]
mod tests {
    use super::*;
    use naturelang_core::tac::{Instruction, Opcode, Operand};
    use naturelang_core::types::DataType;

    fn temp(id: u32) -> Operand {
        Operand::Temp(id, DataType::Number)
    }

    fn load_int(id: u32, value: i64) -> Instruction {
        Instruction::new(Opcode::LoadInt, temp(id), Operand::IntConst(value), Operand::None, 1)
    }

    #[test]
    fn unused_load_is_marked_dead() {
        let mut func = TacFunction::main();
        func.push(load_int(0, 1));
        assert_eq!(run(&mut func, false), 1);
        assert!(func.instructions[0].is_dead);
    }

    #[test]
    fn displayed_temp_stays_live() {
        let mut func = TacFunction::main();
        func.push(load_int(0, 1));
        func.push(Instruction::new(Opcode::Display, Operand::None, temp(0), Operand::None, 1));
        assert_eq!(run(&mut func, false), 0);
    }

    #[test]
    fn use_before_definition_counts_as_live() {
        // Loop back-edge shape: the increment at the bottom feeds the
        // comparison above it.
        let mut func = TacFunction::main();
        func.push(Instruction::new(
            Opcode::Gte,
            Operand::Temp(1, DataType::Flag),
            temp(0),
            Operand::IntConst(3),
            1,
        ));
        func.push(Instruction::new(
            Opcode::IfGoto,
            Operand::None,
            Operand::Temp(1, DataType::Flag),
            Operand::Label(0),
            1,
        ));
        func.push(Instruction::new(Opcode::Add, temp(0), temp(0), Operand::IntConst(1), 1));
        assert_eq!(run(&mut func, false), 0, "backward use keeps the Add live");
    }

    #[test]
    fn side_effecting_instructions_are_never_marked() {
        let mut func = TacFunction::main();
        // Call result unused, but calls have effects.
        func.push(Instruction::new(
            Opcode::Call,
            temp(0),
            Operand::Func("f".into()),
            Operand::IntConst(0),
            1,
        ));
        assert_eq!(run(&mut func, false), 0);
    }

    #[test]
    fn var_results_are_preserved() {
        let mut func = TacFunction::main();
        func.push(Instruction::new(
            Opcode::Assign,
            Operand::var("x", DataType::Number),
            Operand::IntConst(1),
            Operand::None,
            1,
        ));
        assert_eq!(run(&mut func, false), 0);
    }

    #[test]
    fn chain_dies_over_successive_runs() {
        // t0 feeds t1; t1 is unused. One run kills t1, the next kills t0.
        let mut func = TacFunction::main();
        func.push(load_int(0, 1));
        func.push(Instruction::new(Opcode::Add, temp(1), temp(0), Operand::IntConst(1), 1));
        assert_eq!(run(&mut func, false), 1);
        assert!(func.instructions[1].is_dead);
        assert_eq!(run(&mut func, false), 1);
        assert!(func.instructions[0].is_dead);
        assert_eq!(run(&mut func, false), 0);
    }

    #[test]
    fn dead_uses_do_not_keep_values_alive() {
        let mut func = TacFunction::main();
        func.push(load_int(0, 1));
        let mut dead_user = Instruction::new(Opcode::Add, temp(1), temp(0), Operand::IntConst(1), 1);
        dead_user.is_dead = true;
        func.push(dead_user);
        assert_eq!(run(&mut func, false), 1);
        assert!(func.instructions[0].is_dead);
    }
}
