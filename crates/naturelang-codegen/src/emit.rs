//! C code generation from optimized TAC.
//!
//! One [`CGenerator`] produces a single self-contained translation unit:
//! header block, forward declarations for every user function, the user
//! function bodies, and finally `main` wrapping the program's top-level
//! code. Generation is total -- soft failures (e.g. a call with missing
//! `Param`s) are recorded in [`CodegenOutput::errors`] and emission
//! continues.

use std::collections::HashMap;
use std::fmt::Write;

use naturelang_core::tac::{Instruction, Opcode, Operand, TacFunction, TacProgram};
use naturelang_core::types::DataType;

use crate::runtime;
use crate::types::{c_decl, c_default, c_type, TypeMap};

/// The generated translation unit plus any soft errors hit along the way.
#[derive(Debug, Clone)]
pub struct CodegenOutput {
    pub c_source: String,
    pub errors: Vec<String>,
}

/// Emits C from a [`TacProgram`].
pub struct CGenerator {
    out: String,
    indent: usize,
    errors: Vec<String>,
    /// User function return types, for void-call suppression.
    returns: HashMap<String, DataType>,
}

/// Source names may contain spaces; C identifiers may not.
fn sanitize(name: &str) -> String {
    name.replace(' ', "_")
}

/// Formats a float so it stays a floating literal in C (`2` -> `2.0`).
fn format_float(value: f64) -> String {
    if value.is_finite() && value.fract() == 0.0 && value.abs() < 1e15 {
        format!("{:.1}", value)
    } else {
        format!("{}", value)
    }
}

/// Escapes `"` `\` and the common control characters for a C string literal.
fn escape_string(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for ch in value.chars() {
        match ch {
            '\\' => out.push_str("\\\\"),
            '"' => out.push_str("\\\""),
            '\n' => out.push_str("\\n"),
            '\t' => out.push_str("\\t"),
            '\r' => out.push_str("\\r"),
            other => out.push(other),
        }
    }
    out
}

impl CGenerator {
    pub fn new() -> Self {
        CGenerator {
            out: String::new(),
            indent: 0,
            errors: Vec::new(),
            returns: HashMap::new(),
        }
    }

    /// Generates the full translation unit.
    pub fn generate(mut self, program: &TacProgram) -> CodegenOutput {
        // Pre-scan signatures so calls to Nothing-returning functions drop
        // their result assignment.
        for func in program.functions.values() {
            self.returns.insert(func.name.clone(), func.return_type);
        }

        self.emit_header(program);
        self.emit_forward_decls(program);
        for func in program.functions.values() {
            self.emit_function(func);
        }
        self.emit_main(&program.main);

        CodegenOutput {
            c_source: self.out,
            errors: self.errors,
        }
    }

    fn line(&mut self, text: &str) {
        for _ in 0..self.indent {
            self.out.push_str("    ");
        }
        self.out.push_str(text);
        self.out.push('\n');
    }

    fn blank(&mut self) {
        self.out.push('\n');
    }

    // -----------------------------------------------------------------------
    // File framing
    // -----------------------------------------------------------------------

    fn emit_header(&mut self, program: &TacProgram) {
        let all_functions = std::iter::once(&program.main).chain(program.functions.values());
        let mut uses_pow = false;
        let mut uses_input = false;
        for func in all_functions {
            for ins in func.instructions.iter().filter(|i| !i.is_dead) {
                match ins.op {
                    Opcode::Pow => uses_pow = true,
                    Opcode::Ask | Opcode::Read => uses_input = true,
                    _ => {}
                }
            }
        }

        self.line("#include <stdio.h>");
        self.line("#include <stdlib.h>");
        self.line("#include <string.h>");
        self.line("#include <stdbool.h>");
        if uses_pow {
            self.line("#include <math.h>");
        }
        self.line(&format!("#include \"{}\"", runtime::RUNTIME_HEADER));
        self.blank();
        if uses_input {
            self.line(&format!(
                "static char {}[{}];",
                runtime::INPUT_BUFFER,
                runtime::INPUT_BUFFER_SIZE
            ));
            self.blank();
        }
    }

    fn signature(&self, func: &TacFunction) -> String {
        let params = if func.params.is_empty() {
            "void".to_string()
        } else {
            func.params
                .iter()
                .map(|(name, ty)| c_decl(*ty, &sanitize(name)))
                .collect::<Vec<_>>()
                .join(", ")
        };
        format!("{} {}({})", c_type(func.return_type), sanitize(&func.name), params)
    }

    fn emit_forward_decls(&mut self, program: &TacProgram) {
        if program.functions.is_empty() {
            return;
        }
        for func in program.functions.values() {
            let signature = self.signature(func);
            self.line(&format!("{};", signature));
        }
        self.blank();
    }

    fn emit_function(&mut self, func: &TacFunction) {
        let signature = self.signature(func);
        self.line(&format!("{} {{", signature));
        self.indent += 1;
        self.emit_body(func);
        self.indent -= 1;
        self.line("}");
        self.blank();
    }

    fn emit_main(&mut self, main: &TacFunction) {
        self.line("int main(int argc, char *argv[]) {");
        self.indent += 1;
        self.line("(void)argc;");
        self.line("(void)argv;");
        self.emit_body(main);
        self.line("return 0;");
        self.indent -= 1;
        self.line("}");
    }

    fn emit_body(&mut self, func: &TacFunction) {
        let types = TypeMap::build(func);

        // All temp declarations sit at the top of the body. Results of calls
        // to Nothing-returning functions have no C storage at all.
        for (id, ty) in types.temps_in(func) {
            if ty == DataType::Nothing {
                continue;
            }
            let initial = match ty {
                DataType::Text | DataType::List => "NULL",
                _ => "0",
            };
            self.line(&format!("{} = {};", c_decl(ty, &format!("t{}", id)), initial));
        }

        for index in 0..func.instructions.len() {
            if func.instructions[index].is_dead {
                continue;
            }
            self.emit_instruction(func, index, &types);
        }
    }

    // -----------------------------------------------------------------------
    // Instructions
    // -----------------------------------------------------------------------

    fn render(&self, operand: &Operand) -> String {
        match operand {
            Operand::None => String::new(),
            Operand::Temp(id, _) => format!("t{}", id),
            Operand::Var(name, _) => sanitize(name),
            Operand::IntConst(value) => value.to_string(),
            Operand::FloatConst(value) => format_float(*value),
            Operand::StringConst(value) => format!("\"{}\"", escape_string(value)),
            Operand::BoolConst(value) => if *value { "true" } else { "false" }.to_string(),
            Operand::Label(id) => format!("L{}", id),
            Operand::Func(name) => sanitize(name),
        }
    }

    fn emit_instruction(&mut self, func: &TacFunction, index: usize, types: &TypeMap) {
        let ins = &func.instructions[index];
        match ins.op {
            Opcode::LoadInt | Opcode::LoadFloat | Opcode::LoadBool | Opcode::LoadString
            | Opcode::Assign => {
                let text = format!("{} = {};", self.render(&ins.result), self.render(&ins.arg1));
                self.line(&text);
            }

            Opcode::Add | Opcode::Sub | Opcode::Mul | Opcode::Div | Opcode::Mod
            | Opcode::Eq | Opcode::Neq | Opcode::Lt | Opcode::Gt | Opcode::Lte | Opcode::Gte
            | Opcode::And | Opcode::Or => {
                let symbol = match ins.op {
                    Opcode::Add => "+",
                    Opcode::Sub => "-",
                    Opcode::Mul => "*",
                    Opcode::Div => "/",
                    Opcode::Mod => "%",
                    Opcode::Eq => "==",
                    Opcode::Neq => "!=",
                    Opcode::Lt => "<",
                    Opcode::Gt => ">",
                    Opcode::Lte => "<=",
                    Opcode::Gte => ">=",
                    Opcode::And => "&&",
                    _ => "||",
                };
                let text = format!(
                    "{} = {} {} {};",
                    self.render(&ins.result),
                    self.render(&ins.arg1),
                    symbol,
                    self.render(&ins.arg2)
                );
                self.line(&text);
            }

            Opcode::Pow => {
                let text = format!(
                    "{} = pow({}, {});",
                    self.render(&ins.result),
                    self.render(&ins.arg1),
                    self.render(&ins.arg2)
                );
                self.line(&text);
            }

            Opcode::Neg => {
                let text = format!("{} = -({});", self.render(&ins.result), self.render(&ins.arg1));
                self.line(&text);
            }

            Opcode::Not => {
                let text = format!("{} = !({});", self.render(&ins.result), self.render(&ins.arg1));
                self.line(&text);
            }

            Opcode::Concat => {
                let left = self.render_text(&ins.arg1, types, ins.line);
                let right = self.render_text(&ins.arg2, types, ins.line);
                let text = format!(
                    "{} = {}({}, {});",
                    self.render(&ins.result),
                    runtime::CONCAT,
                    left,
                    right
                );
                self.line(&text);
            }

            Opcode::Between => {
                let value = self.render(&ins.arg1);
                let text = format!(
                    "{} = (({} >= {}) && ({} <= {}));",
                    self.render(&ins.result),
                    value,
                    self.render(&ins.arg2),
                    value,
                    self.render(&ins.arg3)
                );
                self.line(&text);
            }

            Opcode::Decl => {
                if let Operand::Var(name, _) = &ins.result {
                    let ty = types.resolve(&ins.result);
                    let text = format!("{} = {};", c_decl(ty, &sanitize(name)), c_default(ty));
                    self.line(&text);
                }
            }

            Opcode::Display => {
                let value = self.render(&ins.arg1);
                let text = match types.resolve(&ins.arg1) {
                    DataType::Decimal => format!("printf(\"%g\\n\", {});", value),
                    DataType::Text => format!("printf(\"%s\\n\", {});", value),
                    DataType::Flag => format!("printf(\"%s\\n\", {} ? \"yes\" : \"no\");", value),
                    _ => format!("printf(\"%lld\\n\", {});", value),
                };
                self.line(&text);
            }

            Opcode::Ask => {
                if !ins.arg1.is_none() {
                    let prompt = self.render(&ins.arg1);
                    self.line(&format!("printf(\"%s\", {});", prompt));
                }
                self.emit_line_input(&ins.result);
            }

            Opcode::Read => {
                self.emit_line_input(&ins.result);
            }

            Opcode::Call => self.emit_call(func, index),

            Opcode::Param => {} // consumed by the Call that follows

            Opcode::Return => {
                if ins.arg1.is_none() {
                    self.line("return;");
                } else {
                    let text = format!("return {};", self.render(&ins.arg1));
                    self.line(&text);
                }
            }

            Opcode::Goto => {
                let text = format!("goto {};", self.render(&ins.arg1));
                self.line(&text);
            }

            Opcode::IfGoto => {
                let text = format!(
                    "if ({}) goto {};",
                    self.render(&ins.arg1),
                    self.render(&ins.arg2)
                );
                self.line(&text);
            }

            Opcode::IfFalseGoto => {
                let text = format!(
                    "if (!({})) goto {};",
                    self.render(&ins.arg1),
                    self.render(&ins.arg2)
                );
                self.line(&text);
            }

            Opcode::Label => {
                // Labels sit at column zero.
                let text = format!("{}:;", self.render(&ins.arg1));
                self.out.push_str(&text);
                self.out.push('\n');
            }

            Opcode::ScopeBegin => {
                self.line("{");
                self.indent += 1;
            }

            Opcode::ScopeEnd => {
                self.indent = self.indent.saturating_sub(1);
                self.line("}");
            }

            Opcode::SecureBegin => self.line("/* secure zone begin */"),
            Opcode::SecureEnd => self.line("/* secure zone end */"),

            Opcode::ListCreate => {
                let text = format!(
                    "{} = {}({});",
                    self.render(&ins.result),
                    runtime::LIST_CREATE,
                    self.render(&ins.arg1)
                );
                self.line(&text);
            }

            Opcode::ListAppend => {
                let text = format!(
                    "{}({}, {});",
                    runtime::LIST_APPEND,
                    self.render(&ins.arg1),
                    self.render(&ins.arg2)
                );
                self.line(&text);
            }

            Opcode::ListGet => {
                // Indexing dispatches on the container's resolved type.
                let callee = if types.resolve(&ins.arg1) == DataType::Text {
                    runtime::TEXT_AT
                } else {
                    runtime::LIST_GET_NUM
                };
                let text = format!(
                    "{} = {}({}, {});",
                    self.render(&ins.result),
                    callee,
                    self.render(&ins.arg1),
                    self.render(&ins.arg2)
                );
                self.line(&text);
            }

            Opcode::ListSet => {
                if types.resolve(&ins.arg1) == DataType::Text {
                    // The runtime has no in-place text mutation.
                    self.errors.push(format!(
                        "line {}: cannot assign into a text value by index",
                        ins.line
                    ));
                    self.line("/* unsupported indexed assignment into text */");
                } else {
                    let text = format!(
                        "{}({}, {}, {});",
                        runtime::LIST_SET,
                        self.render(&ins.arg1),
                        self.render(&ins.arg2),
                        self.render(&ins.arg3)
                    );
                    self.line(&text);
                }
            }

            // Function framing is handled by emit_function; fillers and the
            // transient loop pseudo-ops emit nothing.
            Opcode::FuncBegin | Opcode::FuncEnd | Opcode::Nop => {}
            Opcode::Break | Opcode::Continue => {
                self.line(&format!("/* unexpected {:?} */", ins.op));
            }
        }
    }

    /// Renders an operand as a `char *` expression for the concat runtime
    /// call, converting numeric and flag operands through the to-text
    /// helpers.
    fn render_text(&mut self, operand: &Operand, types: &TypeMap, line: u32) -> String {
        let rendered = self.render(operand);
        match types.resolve(operand) {
            DataType::Text => rendered,
            DataType::Decimal => format!("{}({})", runtime::DEC_TO_TEXT, rendered),
            DataType::Flag => format!("({} ? \"yes\" : \"no\")", rendered),
            DataType::List => {
                self.errors
                    .push(format!("line {}: cannot concatenate a list into text", line));
                rendered
            }
            _ => format!("{}({})", runtime::NUM_TO_TEXT, rendered),
        }
    }

    /// The fgets/strcspn/strdup sequence shared by `ask` and `read`.
    fn emit_line_input(&mut self, target: &Operand) {
        let target = self.render(target);
        self.line(&format!(
            "if (fgets({buf}, sizeof {buf}, stdin)) {{",
            buf = runtime::INPUT_BUFFER
        ));
        self.indent += 1;
        self.line(&format!(
            "{buf}[strcspn({buf}, \"\\n\")] = '\\0';",
            buf = runtime::INPUT_BUFFER
        ));
        self.line(&format!("{} = strdup({});", target, runtime::INPUT_BUFFER));
        self.indent -= 1;
        self.line("}");
    }

    /// Gathers the argument list for a `Call` from the `Param` instructions
    /// immediately preceding it (reverse walk over non-dead instructions,
    /// emitted in original order).
    fn emit_call(&mut self, func: &TacFunction, index: usize) {
        let ins = &func.instructions[index];
        let count = match ins.arg2 {
            Operand::IntConst(count) if count >= 0 => count as usize,
            _ => {
                self.errors
                    .push(format!("call at line {} has no argument count", ins.line));
                0
            }
        };

        let mut args: Vec<String> = Vec::with_capacity(count);
        let mut cursor = index;
        while args.len() < count && cursor > 0 {
            cursor -= 1;
            let prior = &func.instructions[cursor];
            if prior.is_dead {
                continue;
            }
            if prior.op == Opcode::Param {
                args.push(self.render(&prior.arg1));
            }
        }
        if args.len() < count {
            self.errors.push(format!(
                "call at line {} expected {} argument(s), found {}",
                ins.line,
                count,
                args.len()
            ));
        }
        args.reverse();

        let callee = match &ins.arg1 {
            Operand::Func(name) => name.clone(),
            other => {
                self.errors
                    .push(format!("call at line {} has invalid callee {:?}", ins.line, other));
                return;
            }
        };
        let returns_nothing = self.returns.get(&callee).copied() == Some(DataType::Nothing);

        let mut text = String::new();
        if !returns_nothing && !ins.result.is_none() {
            let _ = write!(text, "{} = ", self.render(&ins.result));
        }
        let _ = write!(text, "{}({});", sanitize(&callee), args.join(", "));
        self.line(&text);
    }
}

impl Default for CGenerator {
    fn default() -> Self {
        CGenerator::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn temp(id: u32, ty: DataType) -> Operand {
        Operand::Temp(id, ty)
    }

    fn generate(program: &TacProgram) -> CodegenOutput {
        CGenerator::new().generate(program)
    }

    fn push(program: &mut TacProgram, ins: Instruction) {
        program.main.push(ins);
    }

    #[test]
    fn hello_world_shape() {
        let mut program = TacProgram::new();
        let t = program.alloc_temp(DataType::Text);
        push(&mut program, Instruction::new(
            Opcode::LoadString,
            t.clone(),
            Operand::StringConst("Hello, World!".into()),
            Operand::None,
            1,
        ));
        push(&mut program, Instruction::new(Opcode::Display, Operand::None, t, Operand::None, 1));
        let out = generate(&program);
        assert!(out.errors.is_empty());
        assert!(out.c_source.contains("#include <stdio.h>"));
        assert!(out.c_source.contains("#include \"naturelang_runtime.h\""));
        assert!(out.c_source.contains("char *t0 = NULL;"));
        assert!(out.c_source.contains("t0 = \"Hello, World!\";"));
        assert!(out.c_source.contains("printf(\"%s\\n\", t0);"));
        assert!(out.c_source.contains("int main(int argc, char *argv[]) {"));
        assert!(out.c_source.contains("return 0;"));
    }

    #[test]
    fn math_header_only_when_pow_survives() {
        let mut program = TacProgram::new();
        push(&mut program, Instruction::new(
            Opcode::Pow,
            temp(0, DataType::Number),
            Operand::IntConst(2),
            Operand::var("n", DataType::Number),
            1,
        ));
        let out = generate(&program);
        assert!(out.c_source.contains("#include <math.h>"));
        assert!(out.c_source.contains("t0 = pow(2, n);"));

        let plain = generate(&TacProgram::new());
        assert!(!plain.c_source.contains("math.h"));
    }

    #[test]
    fn input_buffer_only_with_ask_or_read() {
        let mut program = TacProgram::new();
        push(&mut program, Instruction::new(
            Opcode::Decl,
            Operand::var("name", DataType::Text),
            Operand::None,
            Operand::None,
            1,
        ));
        push(&mut program, Instruction::new(
            Opcode::Read,
            Operand::var("name", DataType::Text),
            Operand::None,
            Operand::None,
            2,
        ));
        let out = generate(&program);
        assert!(out.c_source.contains("static char nl_input_buffer[4096];"));
        assert!(out.c_source.contains("fgets(nl_input_buffer"));
        assert!(out.c_source.contains("strcspn(nl_input_buffer"));
        assert!(out.c_source.contains("name = strdup(nl_input_buffer);"));

        let plain = generate(&TacProgram::new());
        assert!(!plain.c_source.contains("nl_input_buffer"));
    }

    #[test]
    fn ask_prints_prompt_first() {
        let mut program = TacProgram::new();
        let prompt = program.alloc_temp(DataType::Text);
        push(&mut program, Instruction::new(
            Opcode::LoadString,
            prompt.clone(),
            Operand::StringConst("name? ".into()),
            Operand::None,
            1,
        ));
        push(&mut program, Instruction::new(
            Opcode::Ask,
            Operand::var("who", DataType::Text),
            prompt,
            Operand::None,
            1,
        ));
        let out = generate(&program);
        let prompt_at = out.c_source.find("printf(\"%s\", t0);").unwrap();
        let read_at = out.c_source.find("fgets").unwrap();
        assert!(prompt_at < read_at);
    }

    #[test]
    fn display_formats_follow_resolved_types() {
        let mut program = TacProgram::new();
        let n = program.alloc_temp(DataType::Number);
        let d = program.alloc_temp(DataType::Decimal);
        let f = program.alloc_temp(DataType::Flag);
        push(&mut program, Instruction::new(Opcode::LoadInt, n.clone(), Operand::IntConst(1), Operand::None, 1));
        push(&mut program, Instruction::new(Opcode::LoadFloat, d.clone(), Operand::FloatConst(1.5), Operand::None, 1));
        push(&mut program, Instruction::new(Opcode::LoadBool, f.clone(), Operand::BoolConst(true), Operand::None, 1));
        for operand in [n, d, f] {
            push(&mut program, Instruction::new(Opcode::Display, Operand::None, operand, Operand::None, 1));
        }
        let out = generate(&program);
        assert!(out.c_source.contains("printf(\"%lld\\n\", t0);"));
        assert!(out.c_source.contains("printf(\"%g\\n\", t1);"));
        assert!(out.c_source.contains("printf(\"%s\\n\", t2 ? \"yes\" : \"no\");"));
    }

    #[test]
    fn call_gathers_params_in_original_order() {
        let mut program = TacProgram::new();
        let mut add = TacFunction::new("add", DataType::Number, vec![
            ("a".into(), DataType::Number),
            ("b".into(), DataType::Number),
        ]);
        add.push(Instruction::new(Opcode::Return, Operand::None, Operand::var("a", DataType::Number), Operand::None, 1));
        program.register_function(add).unwrap();

        push(&mut program, Instruction::new(Opcode::Param, Operand::None, Operand::IntConst(5), Operand::None, 2));
        push(&mut program, Instruction::new(Opcode::Param, Operand::None, Operand::IntConst(3), Operand::None, 2));
        push(&mut program, Instruction::new(
            Opcode::Call,
            temp(0, DataType::Number),
            Operand::Func("add".into()),
            Operand::IntConst(2),
            2,
        ));
        let out = generate(&program);
        assert!(out.errors.is_empty(), "{:?}", out.errors);
        assert!(out.c_source.contains("t0 = add(5, 3);"));
        // Forward declaration and definition both present.
        assert!(out.c_source.contains("long long add(long long a, long long b);"));
        assert!(out.c_source.contains("long long add(long long a, long long b) {"));
    }

    #[test]
    fn nothing_returning_call_drops_assignment() {
        let mut program = TacProgram::new();
        program
            .register_function(TacFunction::new("log_it", DataType::Nothing, vec![]))
            .unwrap();
        push(&mut program, Instruction::new(
            Opcode::Call,
            temp(0, DataType::Nothing),
            Operand::Func("log_it".into()),
            Operand::IntConst(0),
            1,
        ));
        let out = generate(&program);
        assert!(out.c_source.contains("log_it();"));
        assert!(!out.c_source.contains("t0 = log_it"));
    }

    #[test]
    fn missing_params_record_soft_error() {
        let mut program = TacProgram::new();
        push(&mut program, Instruction::new(
            Opcode::Call,
            temp(0, DataType::Number),
            Operand::Func("f".into()),
            Operand::IntConst(2),
            7,
        ));
        let out = generate(&program);
        assert_eq!(out.errors.len(), 1);
        assert!(out.errors[0].contains("line 7"));
        // Emission continued regardless.
        assert!(out.c_source.contains("t0 = f();"));
    }

    #[test]
    fn labels_are_unindented_and_jumps_render() {
        let mut program = TacProgram::new();
        let label = program.alloc_label();
        push(&mut program, Instruction::new(Opcode::Label, Operand::None, Operand::Label(label), Operand::None, 1));
        push(&mut program, Instruction::new(
            Opcode::IfFalseGoto,
            Operand::None,
            Operand::var("keep going", DataType::Flag),
            Operand::Label(label),
            1,
        ));
        push(&mut program, Instruction::new(Opcode::Goto, Operand::None, Operand::Label(label), Operand::None, 1));
        let out = generate(&program);
        assert!(out.c_source.contains("\nL0:;\n"));
        assert!(out.c_source.contains("if (!(keep_going)) goto L0;"));
        assert!(out.c_source.contains("goto L0;"));
    }

    #[test]
    fn identifiers_with_spaces_are_sanitized() {
        let mut program = TacProgram::new();
        push(&mut program, Instruction::new(
            Opcode::Decl,
            Operand::var("pet count", DataType::Number),
            Operand::None,
            Operand::None,
            1,
        ));
        let out = generate(&program);
        assert!(out.c_source.contains("long long pet_count = 0;"));
        assert!(!out.c_source.contains("pet count"));
    }

    #[test]
    fn string_escapes() {
        let mut program = TacProgram::new();
        let t = program.alloc_temp(DataType::Text);
        push(&mut program, Instruction::new(
            Opcode::LoadString,
            t,
            Operand::StringConst("a\"b\\c\nd\te\r".into()),
            Operand::None,
            1,
        ));
        let out = generate(&program);
        assert!(out.c_source.contains(r#"t0 = "a\"b\\c\nd\te\r";"#));
    }

    #[test]
    fn between_renders_as_double_comparison() {
        let mut program = TacProgram::new();
        push(&mut program, Instruction::between(
            temp(0, DataType::Flag),
            Operand::var("t", DataType::Number),
            Operand::IntConst(65),
            Operand::IntConst(75),
            1,
        ));
        let out = generate(&program);
        assert!(out.c_source.contains("t0 = ((t >= 65) && (t <= 75));"));
    }

    #[test]
    fn scopes_become_braces_and_secure_zones_comments() {
        let mut program = TacProgram::new();
        for op in [Opcode::SecureBegin, Opcode::ScopeBegin, Opcode::ScopeEnd, Opcode::SecureEnd] {
            push(&mut program, Instruction::new(op, Operand::None, Operand::None, Operand::None, 1));
        }
        let out = generate(&program);
        assert!(out.c_source.contains("/* secure zone begin */"));
        assert!(out.c_source.contains("/* secure zone end */"));
        let begin = out.c_source.find("/* secure zone begin */").unwrap();
        let brace = out.c_source[begin..].find("{").unwrap();
        assert!(brace > 0);
    }

    #[test]
    fn float_literals_keep_a_decimal_point() {
        assert_eq!(format_float(2.0), "2.0");
        assert_eq!(format_float(2.5), "2.5");
        assert_eq!(format_float(-1.0), "-1.0");
    }

    #[test]
    fn decl_defaults_by_type() {
        let mut program = TacProgram::new();
        for (name, ty) in [
            ("n", DataType::Number),
            ("d", DataType::Decimal),
            ("s", DataType::Text),
            ("b", DataType::Flag),
            ("xs", DataType::List),
        ] {
            push(&mut program, Instruction::new(
                Opcode::Decl,
                Operand::var(name, ty),
                Operand::None,
                Operand::None,
                1,
            ));
        }
        let out = generate(&program);
        assert!(out.c_source.contains("long long n = 0;"));
        assert!(out.c_source.contains("double d = 0;"));
        assert!(out.c_source.contains("char *s = \"\";"));
        assert!(out.c_source.contains("bool b = false;"));
        assert!(out.c_source.contains("NLList *xs = NULL;"));
    }

    #[test]
    fn list_operations_call_the_runtime() {
        let mut program = TacProgram::new();
        let xs = program.alloc_temp(DataType::List);
        push(&mut program, Instruction::new(Opcode::ListCreate, xs.clone(), Operand::IntConst(2), Operand::None, 1));
        push(&mut program, Instruction::new(Opcode::ListAppend, Operand::None, xs.clone(), Operand::IntConst(4), 1));
        push(&mut program, Instruction::new(
            Opcode::ListGet,
            temp(1, DataType::Number),
            xs.clone(),
            Operand::IntConst(0),
            1,
        ));
        push(&mut program, Instruction {
            op: Opcode::ListSet,
            result: Operand::None,
            arg1: xs,
            arg2: Operand::IntConst(0),
            arg3: Operand::IntConst(9),
            line: 1,
            is_dead: false,
        });
        let out = generate(&program);
        assert!(out.c_source.contains("t0 = nl_list_create(2);"));
        assert!(out.c_source.contains("nl_list_append(t0, 4);"));
        assert!(out.c_source.contains("t1 = nl_list_get_num(t0, 0);"));
        assert!(out.c_source.contains("nl_list_set(t0, 0, 9);"));
        assert!(out.c_source.contains("NLList *t0 = NULL;"));
    }

    #[test]
    fn text_indexing_calls_text_at() {
        let mut program = TacProgram::new();
        push(&mut program, Instruction::new(
            Opcode::Decl,
            Operand::var("s", DataType::Text),
            Operand::None,
            Operand::None,
            1,
        ));
        let item = program.alloc_temp(DataType::Text);
        push(&mut program, Instruction::new(
            Opcode::ListGet,
            item.clone(),
            Operand::var("s", DataType::Text),
            Operand::IntConst(0),
            2,
        ));
        push(&mut program, Instruction::new(Opcode::Display, Operand::None, item, Operand::None, 2));
        let out = generate(&program);
        assert!(out.errors.is_empty());
        assert!(out.c_source.contains("t0 = nl_text_at(s, 0);"));
        assert!(!out.c_source.contains("nl_list_get_num(s"));
        // The fetched character is text all the way to the display.
        assert!(out.c_source.contains("char *t0 = NULL;"));
        assert!(out.c_source.contains("printf(\"%s\\n\", t0);"));
    }

    #[test]
    fn concat_converts_non_text_operands() {
        let mut program = TacProgram::new();
        let prefix = program.alloc_temp(DataType::Text);
        push(&mut program, Instruction::new(
            Opcode::LoadString,
            prefix.clone(),
            Operand::StringConst("count: ".into()),
            Operand::None,
            1,
        ));
        push(&mut program, Instruction::new(
            Opcode::Concat,
            temp(1, DataType::Text),
            prefix,
            Operand::IntConst(5),
            1,
        ));
        push(&mut program, Instruction::new(
            Opcode::Concat,
            temp(2, DataType::Text),
            Operand::Temp(1, DataType::Text),
            Operand::FloatConst(1.5),
            2,
        ));
        push(&mut program, Instruction::new(
            Opcode::Concat,
            temp(3, DataType::Text),
            Operand::Temp(2, DataType::Text),
            Operand::BoolConst(true),
            3,
        ));
        let out = generate(&program);
        assert!(out.errors.is_empty(), "{:?}", out.errors);
        assert!(out.c_source.contains("t1 = nl_concat(t0, nl_num_to_text(5));"));
        assert!(out.c_source.contains("t2 = nl_concat(t1, nl_dec_to_text(1.5));"));
        assert!(out.c_source.contains("t3 = nl_concat(t2, (true ? \"yes\" : \"no\"));"));
    }

    #[test]
    fn concat_of_two_texts_stays_plain() {
        let mut program = TacProgram::new();
        let left = program.alloc_temp(DataType::Text);
        let right = program.alloc_temp(DataType::Text);
        push(&mut program, Instruction::new(
            Opcode::LoadString,
            left.clone(),
            Operand::StringConst("a".into()),
            Operand::None,
            1,
        ));
        push(&mut program, Instruction::new(
            Opcode::LoadString,
            right.clone(),
            Operand::StringConst("b".into()),
            Operand::None,
            1,
        ));
        push(&mut program, Instruction::new(Opcode::Concat, temp(2, DataType::Text), left, right, 1));
        let out = generate(&program);
        assert!(out.c_source.contains("t2 = nl_concat(t0, t1);"));
        assert!(!out.c_source.contains("nl_num_to_text"));
    }

    #[test]
    fn indexed_assignment_into_text_records_error() {
        let mut program = TacProgram::new();
        push(&mut program, Instruction::new(
            Opcode::Decl,
            Operand::var("s", DataType::Text),
            Operand::None,
            Operand::None,
            1,
        ));
        push(&mut program, Instruction {
            op: Opcode::ListSet,
            result: Operand::None,
            arg1: Operand::var("s", DataType::Text),
            arg2: Operand::IntConst(0),
            arg3: Operand::IntConst(9),
            line: 4,
            is_dead: false,
        });
        let out = generate(&program);
        assert_eq!(out.errors.len(), 1);
        assert!(out.errors[0].contains("line 4"));
        assert!(out.c_source.contains("/* unsupported indexed assignment into text */"));
        assert!(!out.c_source.contains("nl_list_set(s"));
    }

    #[test]
    fn list_in_concat_records_error() {
        let mut program = TacProgram::new();
        let xs = program.alloc_temp(DataType::List);
        push(&mut program, Instruction::new(Opcode::ListCreate, xs.clone(), Operand::IntConst(0), Operand::None, 1));
        let s = program.alloc_temp(DataType::Text);
        push(&mut program, Instruction::new(
            Opcode::LoadString,
            s.clone(),
            Operand::StringConst("xs: ".into()),
            Operand::None,
            1,
        ));
        push(&mut program, Instruction::new(Opcode::Concat, temp(2, DataType::Text), s, xs, 6));
        let out = generate(&program);
        assert_eq!(out.errors.len(), 1);
        assert!(out.errors[0].contains("line 6"));
    }

    #[test]
    fn dead_instructions_are_not_emitted() {
        let mut program = TacProgram::new();
        let mut dead = Instruction::new(
            Opcode::LoadInt,
            temp(0, DataType::Number),
            Operand::IntConst(42),
            Operand::None,
            1,
        );
        dead.is_dead = true;
        push(&mut program, dead);
        let out = generate(&program);
        assert!(!out.c_source.contains("42"));
        assert!(!out.c_source.contains("t0"));
    }
}
