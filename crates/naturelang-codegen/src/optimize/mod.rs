//! The machine-independent optimizer.
//!
//! Six passes run in a fixed order -- propagate, fold, algebraic, strength,
//! redundant-load, DCE -- and repeat until one full round performs no
//! transformation, capped at [`MAX_ITERATIONS`]. Propagation runs before
//! folding so freshly-substituted constants become foldable in the same
//! round's fold pass. Passes only rewrite in place or mark instructions
//! dead; the sweep after the fixpoint is the only point where instructions
//! are removed.
//!
//! Level 0 runs nothing, level 1 runs folding and DCE, level 2 runs all six.

mod algebraic;
mod dce;
mod fold;
mod propagate;
mod redundant;
mod strength;

use serde::{Deserialize, Serialize};

use naturelang_core::tac::{TacFunction, TacProgram};

use crate::OptLevel;

/// Safety cap on fixpoint iterations per function.
pub const MAX_ITERATIONS: usize = 10;

/// Per-pass transformation counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OptStats {
    pub propagated: usize,
    pub folded: usize,
    pub simplified: usize,
    pub strength_reduced: usize,
    pub loads_eliminated: usize,
    pub dead_marked: usize,
    /// Instructions physically removed by the sweep.
    pub swept: usize,
    /// Fixpoint rounds taken by the slowest function.
    pub iterations: usize,
}

impl OptStats {
    /// Total transformations across all passes (sweep excluded).
    pub fn total(&self) -> usize {
        self.propagated
            + self.folded
            + self.simplified
            + self.strength_reduced
            + self.loads_eliminated
            + self.dead_marked
    }

    fn merge(&mut self, other: OptStats) {
        self.propagated += other.propagated;
        self.folded += other.folded;
        self.simplified += other.simplified;
        self.strength_reduced += other.strength_reduced;
        self.loads_eliminated += other.loads_eliminated;
        self.dead_marked += other.dead_marked;
        self.swept += other.swept;
        self.iterations = self.iterations.max(other.iterations);
    }
}

/// Optimizes one function to a fixpoint, then sweeps dead instructions.
pub fn optimize_function(func: &mut TacFunction, level: OptLevel, verbose: bool) -> OptStats {
    let mut stats = OptStats::default();
    if level == OptLevel::O0 {
        return stats;
    }

    for iteration in 0..MAX_ITERATIONS {
        let mut round = 0;

        if level == OptLevel::O2 {
            let n = propagate::run(func, verbose);
            stats.propagated += n;
            round += n;
        }
        let n = fold::run(func, verbose);
        stats.folded += n;
        round += n;
        if level == OptLevel::O2 {
            let n = algebraic::run(func, verbose);
            stats.simplified += n;
            round += n;
            let n = strength::run(func, verbose);
            stats.strength_reduced += n;
            round += n;
            let n = redundant::run(func, verbose);
            stats.loads_eliminated += n;
            round += n;
        }
        let n = dce::run(func, verbose);
        stats.dead_marked += n;
        round += n;

        stats.iterations = iteration + 1;
        if round == 0 {
            break;
        }
    }

    stats.swept = func.sweep();
    if verbose {
        tracing::debug!(
            iterations = stats.iterations,
            swept = stats.swept,
            "optimization fixpoint reached"
        );
    }
    stats
}

/// Optimizes the main function, then every user function.
pub fn optimize_program(program: &mut TacProgram, level: OptLevel, verbose: bool) -> OptStats {
    let mut stats = optimize_function(&mut program.main, level, verbose);
    for func in program.functions.values_mut() {
        stats.merge(optimize_function(func, level, verbose));
    }
    stats
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

    /// t0 = 3; t1 = 4; t2 = t0 + t1; display t2
    fn add_then_display() -> TacFunction {
        let mut func = TacFunction::main();
        func.push(load_int(0, 3));
        func.push(load_int(1, 4));
        func.push(Instruction::new(Opcode::Add, temp(2), temp(0), temp(1), 1));
        func.push(Instruction::new(Opcode::Display, Operand::None, temp(2), Operand::None, 1));
        func
    }

    #[test]
    fn level_zero_runs_nothing() {
        let mut func = add_then_display();
        let stats = optimize_function(&mut func, OptLevel::O0, false);
        assert_eq!(stats.total(), 0);
        assert_eq!(func.len(), 4);
    }

    #[test]
    fn level_two_reduces_add_to_single_display_of_constant() {
        let mut func = add_then_display();
        let stats = optimize_function(&mut func, OptLevel::O2, false);
        assert!(stats.iterations <= MAX_ITERATIONS);
        // Everything folded away except `Display 7`.
        assert_eq!(func.len(), 1);
        let display = &func.instructions[0];
        assert_eq!(display.op, Opcode::Display);
        assert_eq!(display.arg1, Operand::IntConst(7));
    }

    #[test]
    fn level_one_runs_fold_and_dce_only() {
        let mut func = TacFunction::main();
        // Foldable add with constant sources, plus an unused load.
        func.push(Instruction::new(
            Opcode::Add,
            temp(0),
            Operand::IntConst(2),
            Operand::IntConst(3),
            1,
        ));
        func.push(Instruction::new(Opcode::Display, Operand::None, temp(0), Operand::None, 1));
        func.push(load_int(1, 99));
        let stats = optimize_function(&mut func, OptLevel::O1, false);
        assert_eq!(stats.folded, 1);
        assert_eq!(stats.propagated, 0, "propagation is O2-only");
        assert!(stats.dead_marked >= 1);
        // The folded constant is NOT substituted into Display at O1.
        assert_eq!(func.instructions.last().unwrap().arg1, temp(0));
    }

    #[test]
    fn passes_never_add_instructions() {
        let mut func = add_then_display();
        let before = func.len();
        // Run each pass once and check the live count never grows.
        let passes: [fn(&mut TacFunction, bool) -> usize; 6] = [
            super::propagate::run,
            super::fold::run,
            super::algebraic::run,
            super::strength::run,
            super::redundant::run,
            super::dce::run,
        ];
        for pass in passes {
            pass(&mut func, false);
            assert!(func.live_len() <= before);
            assert_eq!(func.len(), before, "no pass removes instructions");
        }
    }

    #[test]
    fn fixpoint_terminates_within_cap() {
        let mut func = add_then_display();
        let stats = optimize_function(&mut func, OptLevel::O2, false);
        assert!(stats.iterations <= MAX_ITERATIONS);
    }

    #[test]
    fn user_functions_are_optimized_too() {
        let mut program = TacProgram::new();
        let mut user = TacFunction::new("f", DataType::Number, vec![]);
        user.push(Instruction::new(
            Opcode::Add,
            temp(0),
            Operand::IntConst(1),
            Operand::IntConst(1),
            1,
        ));
        user.push(Instruction::new(Opcode::Return, Operand::None, temp(0), Operand::None, 1));
        program.register_function(user).unwrap();
        let stats = optimize_program(&mut program, OptLevel::O2, false);
        assert!(stats.folded >= 1);
        let ret = program.function("f").unwrap().instructions.last().unwrap();
        assert_eq!(ret.arg1, Operand::IntConst(2));
    }

    #[test]
    fn stats_merge_sums_counters() {
        let mut a = OptStats {
            folded: 2,
            iterations: 3,
            ..Default::default()
        };
        a.merge(OptStats {
            folded: 1,
            dead_marked: 4,
            iterations: 5,
            ..Default::default()
        });
        assert_eq!(a.folded, 3);
        assert_eq!(a.dead_marked, 4);
        assert_eq!(a.iterations, 5);
        assert_eq!(a.total(), 7);
    }
}
