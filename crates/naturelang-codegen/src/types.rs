//! Concrete type synthesis for C emission.
//!
//! Before emitting a function, two scans infer the concrete type of every
//! temp and variable:
//!
//! 1. Loads record their result type; `Decl` records the variable's type
//!    (declarations are authoritative and are never overwritten); `Concat`/
//!    `Ask`/`Read` results are `Text`; comparison, logical, and `Between`
//!    results are `Flag`; arithmetic results are `Decimal` when either
//!    operand resolves to `Decimal`, else `Number`.
//! 2. `Assign` results inherit the resolved type of `arg1`.
//!
//! When resolving an operand, a recorded type wins over the operand's
//! embedded type -- except that an already-concrete embedded type (string,
//! float, bool) overrides a default `Number` record.

use std::collections::{BTreeMap, HashMap, HashSet};

use naturelang_core::tac::{Opcode, Operand, TacFunction};
use naturelang_core::types::DataType;

/// Resolved temp and variable types for one function.
#[derive(Debug, Default)]
pub struct TypeMap {
    temps: HashMap<u32, DataType>,
    vars: HashMap<String, DataType>,
    declared: HashSet<String>,
}

impl TypeMap {
    /// Runs both synthesis passes over a function.
    pub fn build(func: &TacFunction) -> TypeMap {
        let mut map = TypeMap::default();

        for (name, ty) in &func.params {
            map.vars.insert(name.clone(), *ty);
            map.declared.insert(name.clone());
        }

        for ins in func.instructions.iter().filter(|i| !i.is_dead) {
            match ins.op {
                Opcode::LoadInt => map.record(&ins.result, DataType::Number),
                Opcode::LoadFloat => map.record(&ins.result, DataType::Decimal),
                Opcode::LoadString => map.record(&ins.result, DataType::Text),
                Opcode::LoadBool => map.record(&ins.result, DataType::Flag),

                Opcode::Decl => {
                    if let Operand::Var(name, ty) = &ins.result {
                        map.vars.insert(name.clone(), *ty);
                        map.declared.insert(name.clone());
                    }
                }

                Opcode::Concat | Opcode::Ask | Opcode::Read => map.record(&ins.result, DataType::Text),

                Opcode::ListGet => {
                    // Indexing text yields text; list element types are not
                    // tracked, so those results stay numeric.
                    let ty = if map.resolve(&ins.arg1) == DataType::Text {
                        DataType::Text
                    } else {
                        DataType::Number
                    };
                    map.record(&ins.result, ty);
                }

                op if op.is_comparison() => map.record(&ins.result, DataType::Flag),
                Opcode::And | Opcode::Or | Opcode::Not | Opcode::Between => {
                    map.record(&ins.result, DataType::Flag)
                }

                op if op.is_binary_arith() => {
                    let ty = if map.resolve(&ins.arg1) == DataType::Decimal
                        || map.resolve(&ins.arg2) == DataType::Decimal
                    {
                        DataType::Decimal
                    } else {
                        DataType::Number
                    };
                    map.record(&ins.result, ty);
                }
                Opcode::Neg => {
                    let ty = map.resolve(&ins.arg1);
                    map.record(&ins.result, ty);
                }

                _ => {}
            }
        }

        // Second pass: assignments inherit their source's resolved type.
        for ins in func.instructions.iter().filter(|i| !i.is_dead) {
            if ins.op == Opcode::Assign {
                let ty = map.resolve(&ins.arg1);
                map.record(&ins.result, ty);
            }
        }

        map
    }

    fn record(&mut self, result: &Operand, ty: DataType) {
        match result {
            Operand::Temp(id, _) => {
                self.temps.insert(*id, ty);
            }
            Operand::Var(name, _) => {
                if !self.declared.contains(name) {
                    self.vars.insert(name.clone(), ty);
                }
            }
            _ => {}
        }
    }

    /// Resolves an operand to its concrete emission type.
    pub fn resolve(&self, operand: &Operand) -> DataType {
        match operand {
            Operand::IntConst(_) => DataType::Number,
            Operand::FloatConst(_) => DataType::Decimal,
            Operand::StringConst(_) => DataType::Text,
            Operand::BoolConst(_) => DataType::Flag,
            Operand::Temp(id, embedded) => combine(self.temps.get(id).copied(), *embedded),
            Operand::Var(name, embedded) => combine(self.vars.get(name).copied(), *embedded),
            Operand::Func(_) => DataType::Function,
            Operand::Label(_) | Operand::None => DataType::Nothing,
        }
    }

    /// Every temp used in the function with its resolved type, id-ordered.
    pub fn temps_in(&self, func: &TacFunction) -> BTreeMap<u32, DataType> {
        let mut out = BTreeMap::new();
        for ins in func.instructions.iter().filter(|i| !i.is_dead) {
            for operand in [&ins.result, &ins.arg1, &ins.arg2, &ins.arg3] {
                if let Operand::Temp(id, _) = operand {
                    out.insert(*id, self.resolve(operand));
                }
            }
        }
        out
    }
}

fn combine(recorded: Option<DataType>, embedded: DataType) -> DataType {
    match recorded {
        Some(DataType::Number)
            if matches!(embedded, DataType::Text | DataType::Decimal | DataType::Flag) =>
        {
            embedded
        }
        Some(recorded) => recorded,
        None => match embedded {
            DataType::Unknown | DataType::Error => DataType::Number,
            ty => ty,
        },
    }
}

/// The C spelling of a NatureLang type (pointer types spell the `*` in the
/// declarator, see [`c_decl`]).
pub fn c_type(ty: DataType) -> &'static str {
    match ty {
        DataType::Decimal => "double",
        DataType::Text => "char *",
        DataType::Flag => "bool",
        DataType::List => "NLList *",
        DataType::Nothing => "void",
        _ => "long long",
    }
}

/// A declaration of `name` with type `ty`, without initializer.
pub fn c_decl(ty: DataType, name: &str) -> String {
    match ty {
        DataType::Text => format!("char *{}", name),
        DataType::List => format!("NLList *{}", name),
        other => format!("{} {}", c_type(other), name),
    }
}

/// The default value a `Decl` initializes a variable to.
pub fn c_default(ty: DataType) -> &'static str {
    match ty {
        DataType::Decimal => "0",
        DataType::Text => "\"\"",
        DataType::Flag => "false",
        DataType::List => "NULL",
        _ => "0",
    }
}
