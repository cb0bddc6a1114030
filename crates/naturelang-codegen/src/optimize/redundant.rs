//! Pass 5: redundant load elimination.
//!
//! Within a basic block, a `Load*` whose opcode and value match an earlier
//! load is rewritten to `Assign(result, earlier-temp)`. Tracking resets at
//! block boundaries and at every outgoing control transfer.

use naturelang_core::tac::{Opcode, Operand, TacFunction};

pub fn run(func: &mut TacFunction, verbose: bool) -> usize {
    // (opcode, loaded value, temp that holds it)
    let mut recent: Vec<(Opcode, Operand, Operand)> = Vec::new();
    let mut count = 0;

    for ins in func.instructions.iter_mut() {
        if ins.is_dead {
            continue;
        }
        if ins.op.resets_load_tracking() {
            recent.clear();
            continue;
        }
        if !ins.op.is_load() {
            continue;
        }
        if let Some((_, _, earlier)) = recent
            .iter()
            .find(|(op, value, _)| *op == ins.op && *value == ins.arg1)
        {
            let earlier = earlier.clone();
            ins.op = Opcode::Assign;
            ins.arg1 = earlier;
            count += 1;
            if verbose {
                tracing::debug!(line = ins.line, "reused earlier load: {}", ins);
            }
        } else if matches!(ins.result, Operand::Temp(..)) {
            recent.push((ins.op, ins.arg1.clone(), ins.result.clone()));
        }
    }
    count
}
