//! Pass 2: intra-basic-block constant propagation.
//!
//! Tracks which temps currently hold a known constant (`LoadInt`/`LoadFloat`/
//! `LoadBool`) and substitutes the constant for the temp in later source
//! operands, making the result foldable by pass 1 on the next iteration.
//!
//! The table is local to one pass invocation and clears at every basic-block
//! boundary (`Label`, `FuncBegin`, `Call`). Writing a temp invalidates its
//! entry.

use std::collections::HashMap;

use naturelang_core::tac::{Opcode, Operand, TacFunction};

pub fn run(func: &mut TacFunction, verbose: bool) -> usize {
    let mut known: HashMap<u32, Operand> = HashMap::new();
    let mut count = 0;

    for ins in func.instructions.iter_mut() {
        if ins.is_dead {
            continue;
        }
        if ins.op.is_block_boundary() {
            known.clear();
        }

        match ins.op {
            Opcode::LoadInt | Opcode::LoadFloat | Opcode::LoadBool => {
                if let Some(id) = ins.result.as_temp() {
                    known.insert(id, ins.arg1.clone());
                }
            }
            _ => {
                for arg in [&mut ins.arg1, &mut ins.arg2, &mut ins.arg3] {
                    if let Some(id) = arg.as_temp() {
                        if let Some(constant) = known.get(&id) {
                            *arg = constant.clone();
                            count += 1;
                            if verbose {
                                tracing::debug!(temp = id, "substituted constant for temp");
                            }
                        }
                    }
                }
                // The result temp no longer holds whatever was recorded.
                if let Some(id) = ins.result.as_temp() {
                    known.remove(&id);
                }
            }
        }
    }
    count
}
