//! Three-address code: the linear IR between the AST and the C backend.
//!
//! A [`TacProgram`] holds the top-level `main` function, a registry of user
//! functions, and the two monotone allocation counters (`next_temp`,
//! `next_label`). Counters are per-program fields, never process-global, and
//! ids are not reused across functions.
//!
//! Instructions live in an ordered `Vec` per function: position is program
//! order, `len()` is the instruction count, and neighbour relationships are
//! positional rather than owned links. Optimization passes rewrite
//! instructions in place and mark them with `is_dead`; only the final sweep
//! removes them.

use std::fmt;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::error::CoreError;
use crate::types::DataType;

/// A TAC opcode. The set is closed; the builder only emits a subset
/// (`Nop`, `Break`, `Continue` are fillers kept for completeness).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Opcode {
    // Arithmetic
    Add,
    Sub,
    Mul,
    Div,
    Mod,
    Pow,
    Neg,
    // Comparison
    Eq,
    Neq,
    Lt,
    Gt,
    Lte,
    Gte,
    // Logical
    And,
    Or,
    Not,
    // Data movement
    Assign,
    LoadInt,
    LoadFloat,
    LoadString,
    LoadBool,
    // Control flow
    Label,
    Goto,
    IfGoto,
    IfFalseGoto,
    // Functions
    FuncBegin,
    FuncEnd,
    Param,
    Call,
    Return,
    // I/O
    Display,
    Read,
    Ask,
    // Declarations and scopes
    Decl,
    ScopeBegin,
    ScopeEnd,
    SecureBegin,
    SecureEnd,
    // Strings
    Concat,
    // Range test
    Between,
    // Lists
    ListCreate,
    ListAppend,
    ListGet,
    ListSet,
    // Loop pseudo-ops (transient during lowering)
    Break,
    Continue,
    // Filler
    Nop,
}

impl Opcode {
    /// Returns `true` for instructions that must never be eliminated.
    pub fn has_side_effects(self) -> bool {
        matches!(
            self,
            Opcode::Display
                | Opcode::Read
                | Opcode::Ask
                | Opcode::Call
                | Opcode::Param
                | Opcode::Return
                | Opcode::Goto
                | Opcode::IfGoto
                | Opcode::IfFalseGoto
                | Opcode::Label
                | Opcode::FuncBegin
                | Opcode::FuncEnd
                | Opcode::ScopeBegin
                | Opcode::ScopeEnd
                | Opcode::SecureBegin
                | Opcode::SecureEnd
                | Opcode::Decl
                | Opcode::Break
                | Opcode::Continue
                | Opcode::ListAppend
                | Opcode::ListSet
        )
    }

    /// Returns `true` at basic-block boundaries where the constant table of
    /// the propagation pass must be cleared.
    pub fn is_block_boundary(self) -> bool {
        matches!(self, Opcode::Label | Opcode::FuncBegin | Opcode::Call)
    }

    /// Returns `true` where redundant-load tracking must be reset: block
    /// boundaries plus outgoing control transfers.
    pub fn resets_load_tracking(self) -> bool {
        self.is_block_boundary()
            || matches!(self, Opcode::Goto | Opcode::IfGoto | Opcode::IfFalseGoto)
    }

    /// Returns `true` for the binary arithmetic group `Add..Pow`.
    pub fn is_binary_arith(self) -> bool {
        matches!(
            self,
            Opcode::Add | Opcode::Sub | Opcode::Mul | Opcode::Div | Opcode::Mod | Opcode::Pow
        )
    }

    /// Returns `true` for the six comparison opcodes.
    pub fn is_comparison(self) -> bool {
        matches!(
            self,
            Opcode::Eq | Opcode::Neq | Opcode::Lt | Opcode::Gt | Opcode::Lte | Opcode::Gte
        )
    }

    /// Returns `true` for `LoadInt`/`LoadFloat`/`LoadString`/`LoadBool`.
    pub fn is_load(self) -> bool {
        matches!(
            self,
            Opcode::LoadInt | Opcode::LoadFloat | Opcode::LoadString | Opcode::LoadBool
        )
    }
}

/// A TAC operand. String payloads are owned; `Clone` is the deep copy the
/// rewrite paths rely on.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub enum Operand {
    #[default]
    None,
    /// Compiler temporary, written once per emission site.
    Temp(u32, DataType),
    /// Named source variable.
    Var(String, DataType),
    IntConst(i64),
    FloatConst(f64),
    StringConst(String),
    BoolConst(bool),
    /// Jump target id.
    Label(u32),
    /// Function name in `Call` / `FuncBegin`.
    Func(String),
}

impl Operand {
    /// Fresh variable operand.
    pub fn var(name: impl Into<String>, ty: DataType) -> Self {
        Operand::Var(name.into(), ty)
    }

    /// Returns the operand's data type. Constants map to their obvious
    /// types; `Label` and `None` have no value type and report `Nothing`.
    pub fn data_type(&self) -> DataType {
        match self {
            Operand::None | Operand::Label(_) => DataType::Nothing,
            Operand::Temp(_, ty) | Operand::Var(_, ty) => *ty,
            Operand::IntConst(_) => DataType::Number,
            Operand::FloatConst(_) => DataType::Decimal,
            Operand::StringConst(_) => DataType::Text,
            Operand::BoolConst(_) => DataType::Flag,
            Operand::Func(_) => DataType::Function,
        }
    }

    /// Returns `true` for the four `*Const` variants.
    pub fn is_const(&self) -> bool {
        matches!(
            self,
            Operand::IntConst(_) | Operand::FloatConst(_) | Operand::StringConst(_) | Operand::BoolConst(_)
        )
    }

    /// Returns `true` for numeric constants.
    pub fn is_numeric_const(&self) -> bool {
        matches!(self, Operand::IntConst(_) | Operand::FloatConst(_))
    }

    /// Temp id, if this operand is a temp.
    pub fn as_temp(&self) -> Option<u32> {
        match self {
            Operand::Temp(id, _) => Some(*id),
            _ => None,
        }
    }

    /// Returns `true` if this is `Operand::None`.
    pub fn is_none(&self) -> bool {
        matches!(self, Operand::None)
    }
}

impl fmt::Display for Operand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Operand::None => write!(f, "_"),
            Operand::Temp(id, _) => write!(f, "t{}", id),
            Operand::Var(name, _) => write!(f, "{}", name),
            Operand::IntConst(v) => write!(f, "{}", v),
            Operand::FloatConst(v) => write!(f, "{}", v),
            Operand::StringConst(s) => write!(f, "{:?}", s),
            Operand::BoolConst(b) => write!(f, "{}", b),
            Operand::Label(id) => write!(f, "L{}", id),
            Operand::Func(name) => write!(f, "@{}", name),
        }
    }
}

/// One three-address instruction: an opcode, a result slot, and up to three
/// source operands (`arg3` is used only by `Between`).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Instruction {
    pub op: Opcode,
    pub result: Operand,
    pub arg1: Operand,
    pub arg2: Operand,
    pub arg3: Operand,
    /// Originating source line (0 when synthesized).
    pub line: u32,
    /// Set by optimization passes; honored by the sweep.
    #[serde(default)]
    pub is_dead: bool,
}

impl Instruction {
    /// Creates an instruction with up to two source operands.
    pub fn new(op: Opcode, result: Operand, arg1: Operand, arg2: Operand, line: u32) -> Self {
        Instruction {
            op,
            result,
            arg1,
            arg2,
            arg3: Operand::None,
            line,
            is_dead: false,
        }
    }

    /// Creates a `Between` instruction (the only three-source opcode).
    pub fn between(result: Operand, value: Operand, lower: Operand, upper: Operand, line: u32) -> Self {
        Instruction {
            op: Opcode::Between,
            result,
            arg1: value,
            arg2: lower,
            arg3: upper,
            line,
            is_dead: false,
        }
    }

    /// Returns `true` if any source operand is the given temp.
    pub fn uses_temp(&self, id: u32) -> bool {
        [&self.arg1, &self.arg2, &self.arg3]
            .into_iter()
            .any(|a| a.as_temp() == Some(id))
    }
}

impl fmt::Display for Instruction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?} {} {} {}", self.op, self.result, self.arg1, self.arg2)?;
        if !self.arg3.is_none() {
            write!(f, " {}", self.arg3)?;
        }
        if self.is_dead {
            write!(f, " ; dead")?;
        }
        Ok(())
    }
}

/// A single TAC function: name (empty for main), signature, and the ordered
/// instruction list.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TacFunction {
    /// Function name; empty string for the program's top level.
    pub name: String,
    pub return_type: DataType,
    pub params: Vec<(String, DataType)>,
    pub instructions: Vec<Instruction>,
}

impl TacFunction {
    /// Creates a named user function with the given signature.
    pub fn new(name: impl Into<String>, return_type: DataType, params: Vec<(String, DataType)>) -> Self {
        TacFunction {
            name: name.into(),
            return_type,
            params,
            instructions: Vec::new(),
        }
    }

    /// Creates the anonymous top-level function.
    pub fn main() -> Self {
        TacFunction::new("", DataType::Nothing, Vec::new())
    }

    /// Appends an instruction.
    pub fn push(&mut self, instruction: Instruction) {
        self.instructions.push(instruction);
    }

    /// Instruction count, including dead-marked instructions.
    pub fn len(&self) -> usize {
        self.instructions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.instructions.is_empty()
    }

    /// Count of instructions not marked dead.
    pub fn live_len(&self) -> usize {
        self.instructions.iter().filter(|i| !i.is_dead).count()
    }

    /// Physically removes every instruction marked dead, in one linear walk.
    /// Returns the number removed.
    pub fn sweep(&mut self) -> usize {
        let before = self.instructions.len();
        self.instructions.retain(|i| !i.is_dead);
        before - self.instructions.len()
    }
}

impl fmt::Display for TacFunction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = if self.name.is_empty() { "<main>" } else { &self.name };
        writeln!(f, "func {} ({} instructions)", name, self.len())?;
        for ins in &self.instructions {
            writeln!(f, "    {}", ins)?;
        }
        Ok(())
    }
}

/// A whole TAC program: top-level code, user functions, and the monotone
/// temp/label counters.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TacProgram {
    pub main: TacFunction,
    /// User functions in registration order.
    pub functions: IndexMap<String, TacFunction>,
    pub next_temp: u32,
    pub next_label: u32,
}

impl TacProgram {
    pub fn new() -> Self {
        TacProgram {
            main: TacFunction::main(),
            functions: IndexMap::new(),
            next_temp: 0,
            next_label: 0,
        }
    }

    /// Allocates a fresh temp operand of the given type.
    pub fn alloc_temp(&mut self, ty: DataType) -> Operand {
        let id = self.next_temp;
        self.next_temp += 1;
        Operand::Temp(id, ty)
    }

    /// Allocates a fresh label id.
    pub fn alloc_label(&mut self) -> u32 {
        let id = self.next_label;
        self.next_label += 1;
        id
    }

    /// Registers a finished user function under its name.
    pub fn register_function(&mut self, function: TacFunction) -> Result<(), CoreError> {
        if self.functions.contains_key(&function.name) {
            return Err(CoreError::DuplicateFunction {
                name: function.name,
            });
        }
        self.functions.insert(function.name.clone(), function);
        Ok(())
    }

    /// Looks up a user function by name.
    pub fn function(&self, name: &str) -> Option<&TacFunction> {
        self.functions.get(name)
    }

    /// Total instruction count across main and all user functions.
    pub fn total_len(&self) -> usize {
        self.main.len() + self.functions.values().map(TacFunction::len).sum::<usize>()
    }
}

impl Default for TacProgram {
    fn default() -> Self {
        TacProgram::new()
    }
}

impl fmt::Display for TacProgram {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.main)?;
        for func in self.functions.values() {
            write!(f, "{}", func)?;
        }
        Ok(())
    }
}
