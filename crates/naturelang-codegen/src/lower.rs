//! Lowering from the annotated AST to three-address code.
//!
//! Expressions lower to an [`Operand`]; statements append instructions to the
//! function under construction. The builder keeps a small context: the stack
//! of functions being emitted (nested declarations), and the current loop's
//! break/continue label ids, saved and restored around every loop.
//!
//! Temp and label ids come from the program's monotone counters and are never
//! reused across functions.

use naturelang_core::ast::{BinaryOp, Node, NodeKind, UnaryOp};
use naturelang_core::tac::{Instruction, Opcode, Operand, TacFunction, TacProgram};
use naturelang_core::types::DataType;

use crate::runtime;

/// Builds one [`TacProgram`] from an analyzed AST.
pub struct IrBuilder {
    program: TacProgram,
    /// Innermost entry is the function currently being emitted into;
    /// empty means top-level code goes to `main`.
    func_stack: Vec<TacFunction>,
    break_label: Option<u32>,
    continue_label: Option<u32>,
}

/// The IR-time view of an annotated type: `Unknown` (and poisoned `Error`)
/// default to `Number`.
fn value_type(node: &Node) -> DataType {
    match node.data_type {
        DataType::Unknown | DataType::Error => DataType::Number,
        ty => ty,
    }
}

fn binary_opcode(op: BinaryOp) -> Opcode {
    match op {
        BinaryOp::Add => Opcode::Add,
        BinaryOp::Sub => Opcode::Sub,
        BinaryOp::Mul => Opcode::Mul,
        BinaryOp::Div => Opcode::Div,
        BinaryOp::Mod => Opcode::Mod,
        BinaryOp::Pow => Opcode::Pow,
        BinaryOp::Eq => Opcode::Eq,
        BinaryOp::Neq => Opcode::Neq,
        BinaryOp::Lt => Opcode::Lt,
        BinaryOp::Gt => Opcode::Gt,
        BinaryOp::Lte => Opcode::Lte,
        BinaryOp::Gte => Opcode::Gte,
        BinaryOp::And => Opcode::And,
        BinaryOp::Or => Opcode::Or,
    }
}

impl IrBuilder {
    pub fn new() -> Self {
        IrBuilder {
            program: TacProgram::new(),
            func_stack: Vec::new(),
            break_label: None,
            continue_label: None,
        }
    }

    /// Lowers the program rooted at `root`.
    pub fn lower(mut self, root: &Node) -> TacProgram {
        self.lower_stmt(root);
        self.program
    }

    fn current(&mut self) -> &mut TacFunction {
        match self.func_stack.last_mut() {
            Some(func) => func,
            None => &mut self.program.main,
        }
    }

    fn emit(&mut self, instruction: Instruction) {
        self.current().push(instruction);
    }

    fn emit_simple(&mut self, op: Opcode, result: Operand, arg1: Operand, arg2: Operand, line: u32) {
        self.emit(Instruction::new(op, result, arg1, arg2, line));
    }

    // -----------------------------------------------------------------------
    // Statements
    // -----------------------------------------------------------------------

    fn lower_stmt(&mut self, node: &Node) {
        let line = node.loc.line;
        match &node.kind {
            NodeKind::Program { statements } => {
                for stmt in statements {
                    self.lower_stmt(stmt);
                }
            }

            NodeKind::Block { statements } => {
                self.emit_simple(Opcode::ScopeBegin, Operand::None, Operand::None, Operand::None, line);
                for stmt in statements {
                    self.lower_stmt(stmt);
                }
                self.emit_simple(Opcode::ScopeEnd, Operand::None, Operand::None, Operand::None, line);
            }

            NodeKind::VarDecl {
                name,
                declared_type,
                initializer,
                ..
            } => {
                let var = Operand::var(name.clone(), *declared_type);
                self.emit_simple(Opcode::Decl, var.clone(), Operand::None, Operand::None, line);
                if let Some(init) = initializer {
                    let value = self.lower_expr(init);
                    self.emit_simple(Opcode::Assign, var, value, Operand::None, line);
                }
            }

            NodeKind::FuncDecl {
                name,
                params,
                return_type,
                body,
            } => {
                let func = TacFunction::new(
                    name.clone(),
                    *return_type,
                    params.iter().map(|p| (p.name.clone(), p.declared_type)).collect(),
                );
                self.func_stack.push(func);
                self.emit_simple(
                    Opcode::FuncBegin,
                    Operand::None,
                    Operand::Func(name.clone()),
                    Operand::None,
                    line,
                );
                // Loop context does not cross the function boundary.
                let saved_break = self.break_label.take();
                let saved_continue = self.continue_label.take();
                self.lower_stmt(body);
                self.break_label = saved_break;
                self.continue_label = saved_continue;
                self.emit_simple(
                    Opcode::FuncEnd,
                    Operand::None,
                    Operand::Func(name.clone()),
                    Operand::None,
                    line,
                );
                let func = self.func_stack.pop().expect("function stack underflow");
                if let Err(error) = self.program.register_function(func) {
                    // The analyzer already reported the redeclaration.
                    tracing::warn!("dropping duplicate function body: {error}");
                }
            }

            NodeKind::Assign { target, value } => {
                let value_op = self.lower_expr(value);
                match &target.kind {
                    NodeKind::Index { array, index } => {
                        let list = self.lower_expr(array);
                        let idx = self.lower_expr(index);
                        self.emit(Instruction {
                            op: Opcode::ListSet,
                            result: Operand::None,
                            arg1: list,
                            arg2: idx,
                            arg3: value_op,
                            line,
                            is_dead: false,
                        });
                    }
                    NodeKind::Identifier { name } => {
                        let var = Operand::var(name.clone(), value_type(target));
                        self.emit_simple(Opcode::Assign, var, value_op, Operand::None, line);
                    }
                    other => {
                        tracing::warn!("skipping assignment to unsupported target: {other:?}");
                    }
                }
            }

            NodeKind::Display { value } => {
                let value_op = self.lower_expr(value);
                self.emit_simple(Opcode::Display, Operand::None, value_op, Operand::None, line);
            }

            NodeKind::Ask { prompt, target } => {
                let prompt_op = match prompt {
                    Some(prompt) => self.lower_expr(prompt),
                    None => Operand::None,
                };
                self.emit_simple(
                    Opcode::Ask,
                    Operand::var(target.clone(), DataType::Text),
                    prompt_op,
                    Operand::None,
                    line,
                );
            }

            NodeKind::Read { target } => {
                self.emit_simple(
                    Opcode::Read,
                    Operand::var(target.clone(), DataType::Text),
                    Operand::None,
                    Operand::None,
                    line,
                );
            }

            NodeKind::If {
                condition,
                then_block,
                else_block,
            } => {
                let cond = self.lower_expr(condition);
                match else_block {
                    Some(else_block) => {
                        let else_label = self.program.alloc_label();
                        let end_label = self.program.alloc_label();
                        self.emit_simple(
                            Opcode::IfFalseGoto,
                            Operand::None,
                            cond,
                            Operand::Label(else_label),
                            line,
                        );
                        self.lower_stmt(then_block);
                        self.emit_simple(Opcode::Goto, Operand::None, Operand::Label(end_label), Operand::None, line);
                        self.emit_simple(Opcode::Label, Operand::None, Operand::Label(else_label), Operand::None, line);
                        self.lower_stmt(else_block);
                        self.emit_simple(Opcode::Label, Operand::None, Operand::Label(end_label), Operand::None, line);
                    }
                    None => {
                        let end_label = self.program.alloc_label();
                        self.emit_simple(
                            Opcode::IfFalseGoto,
                            Operand::None,
                            cond,
                            Operand::Label(end_label),
                            line,
                        );
                        self.lower_stmt(then_block);
                        self.emit_simple(Opcode::Label, Operand::None, Operand::Label(end_label), Operand::None, line);
                    }
                }
            }

            NodeKind::While { condition, body } => {
                let start_label = self.program.alloc_label();
                let end_label = self.program.alloc_label();
                let saved_break = self.break_label.replace(end_label);
                let saved_continue = self.continue_label.replace(start_label);

                self.emit_simple(Opcode::Label, Operand::None, Operand::Label(start_label), Operand::None, line);
                let cond = self.lower_expr(condition);
                self.emit_simple(
                    Opcode::IfFalseGoto,
                    Operand::None,
                    cond,
                    Operand::Label(end_label),
                    line,
                );
                self.lower_stmt(body);
                self.emit_simple(Opcode::Goto, Operand::None, Operand::Label(start_label), Operand::None, line);
                self.emit_simple(Opcode::Label, Operand::None, Operand::Label(end_label), Operand::None, line);

                self.break_label = saved_break;
                self.continue_label = saved_continue;
            }

            NodeKind::Repeat { count, body } => {
                let limit = self.lower_expr(count);
                let iter = self.program.alloc_temp(DataType::Number);
                let start_label = self.program.alloc_label();
                let end_label = self.program.alloc_label();
                let inc_label = self.program.alloc_label();
                let saved_break = self.break_label.replace(end_label);
                let saved_continue = self.continue_label.replace(inc_label);

                self.emit_simple(Opcode::LoadInt, iter.clone(), Operand::IntConst(0), Operand::None, line);
                self.emit_simple(Opcode::Label, Operand::None, Operand::Label(start_label), Operand::None, line);
                let done = self.program.alloc_temp(DataType::Flag);
                self.emit_simple(Opcode::Gte, done.clone(), iter.clone(), limit, line);
                self.emit_simple(Opcode::IfGoto, Operand::None, done, Operand::Label(end_label), line);
                self.lower_stmt(body);
                self.emit_simple(Opcode::Label, Operand::None, Operand::Label(inc_label), Operand::None, line);
                self.emit_simple(Opcode::Add, iter.clone(), iter, Operand::IntConst(1), line);
                self.emit_simple(Opcode::Goto, Operand::None, Operand::Label(start_label), Operand::None, line);
                self.emit_simple(Opcode::Label, Operand::None, Operand::Label(end_label), Operand::None, line);

                self.break_label = saved_break;
                self.continue_label = saved_continue;
            }

            NodeKind::ForEach {
                iterator,
                iterable,
                body,
            } => {
                let list = self.lower_expr(iterable);
                let element_type = if list.data_type() == DataType::Text {
                    DataType::Text
                } else {
                    DataType::Number
                };
                let iter_var = Operand::var(iterator.clone(), element_type);
                self.emit_simple(Opcode::Decl, iter_var.clone(), Operand::None, Operand::None, line);

                let idx = self.program.alloc_temp(DataType::Number);
                self.emit_simple(Opcode::LoadInt, idx.clone(), Operand::IntConst(0), Operand::None, line);

                // Length comes from the runtime: one Param/Call pair.
                let len = self.program.alloc_temp(DataType::Number);
                self.emit_simple(Opcode::Param, Operand::None, list.clone(), Operand::None, line);
                self.emit_simple(
                    Opcode::Call,
                    len.clone(),
                    Operand::Func(runtime::LIST_LENGTH.into()),
                    Operand::IntConst(1),
                    line,
                );

                let start_label = self.program.alloc_label();
                let end_label = self.program.alloc_label();
                let inc_label = self.program.alloc_label();
                let saved_break = self.break_label.replace(end_label);
                let saved_continue = self.continue_label.replace(inc_label);

                self.emit_simple(Opcode::Label, Operand::None, Operand::Label(start_label), Operand::None, line);
                let more = self.program.alloc_temp(DataType::Flag);
                self.emit_simple(Opcode::Lt, more.clone(), idx.clone(), len, line);
                self.emit_simple(Opcode::IfFalseGoto, Operand::None, more, Operand::Label(end_label), line);
                let item = self.program.alloc_temp(element_type);
                self.emit_simple(Opcode::ListGet, item.clone(), list, idx.clone(), line);
                self.emit_simple(Opcode::Assign, iter_var, item, Operand::None, line);
                self.lower_stmt(body);
                self.emit_simple(Opcode::Label, Operand::None, Operand::Label(inc_label), Operand::None, line);
                self.emit_simple(Opcode::Add, idx.clone(), idx, Operand::IntConst(1), line);
                self.emit_simple(Opcode::Goto, Operand::None, Operand::Label(start_label), Operand::None, line);
                self.emit_simple(Opcode::Label, Operand::None, Operand::Label(end_label), Operand::None, line);

                self.break_label = saved_break;
                self.continue_label = saved_continue;
            }

            NodeKind::Return { value } => {
                let value_op = match value {
                    Some(value) => self.lower_expr(value),
                    None => Operand::None,
                };
                self.emit_simple(Opcode::Return, Operand::None, value_op, Operand::None, line);
            }

            NodeKind::Break => {
                if let Some(label) = self.break_label {
                    self.emit_simple(Opcode::Goto, Operand::None, Operand::Label(label), Operand::None, line);
                }
            }

            NodeKind::Continue => {
                if let Some(label) = self.continue_label {
                    self.emit_simple(Opcode::Goto, Operand::None, Operand::Label(label), Operand::None, line);
                }
            }

            NodeKind::SecureZone { body, .. } => {
                self.emit_simple(Opcode::SecureBegin, Operand::None, Operand::None, Operand::None, line);
                self.lower_stmt(body);
                self.emit_simple(Opcode::SecureEnd, Operand::None, Operand::None, Operand::None, line);
            }

            // An expression in statement position is lowered for its effects.
            _ => {
                let _ = self.lower_expr(node);
            }
        }
    }

    // -----------------------------------------------------------------------
    // Expressions
    // -----------------------------------------------------------------------

    fn lower_expr(&mut self, node: &Node) -> Operand {
        let line = node.loc.line;
        match &node.kind {
            NodeKind::LiteralInt { value } => {
                let temp = self.program.alloc_temp(DataType::Number);
                self.emit_simple(Opcode::LoadInt, temp.clone(), Operand::IntConst(*value), Operand::None, line);
                temp
            }
            NodeKind::LiteralFloat { value } => {
                let temp = self.program.alloc_temp(DataType::Decimal);
                self.emit_simple(Opcode::LoadFloat, temp.clone(), Operand::FloatConst(*value), Operand::None, line);
                temp
            }
            NodeKind::LiteralString { value } => {
                let temp = self.program.alloc_temp(DataType::Text);
                self.emit_simple(
                    Opcode::LoadString,
                    temp.clone(),
                    Operand::StringConst(value.clone()),
                    Operand::None,
                    line,
                );
                temp
            }
            NodeKind::LiteralBool { value } => {
                let temp = self.program.alloc_temp(DataType::Flag);
                self.emit_simple(Opcode::LoadBool, temp.clone(), Operand::BoolConst(*value), Operand::None, line);
                temp
            }

            NodeKind::Identifier { name } => Operand::var(name.clone(), value_type(node)),

            NodeKind::BinaryOp { op, left, right } => {
                let left_op = self.lower_expr(left);
                let right_op = self.lower_expr(right);
                if *op == BinaryOp::Add
                    && (left_op.data_type() == DataType::Text || right_op.data_type() == DataType::Text)
                {
                    let temp = self.program.alloc_temp(DataType::Text);
                    self.emit_simple(Opcode::Concat, temp.clone(), left_op, right_op, line);
                    return temp;
                }
                let result_type = if op.is_comparison() || op.is_logical() {
                    DataType::Flag
                } else if *op == BinaryOp::Mod {
                    DataType::Number
                } else if left_op.data_type() == DataType::Decimal
                    || right_op.data_type() == DataType::Decimal
                {
                    DataType::Decimal
                } else {
                    DataType::Number
                };
                let temp = self.program.alloc_temp(result_type);
                self.emit_simple(binary_opcode(*op), temp.clone(), left_op, right_op, line);
                temp
            }

            NodeKind::UnaryOp { op, operand } => {
                let operand_op = self.lower_expr(operand);
                match op {
                    UnaryOp::Pos => operand_op,
                    UnaryOp::Neg => {
                        let temp = self.program.alloc_temp(operand_op.data_type());
                        self.emit_simple(Opcode::Neg, temp.clone(), operand_op, Operand::None, line);
                        temp
                    }
                    UnaryOp::Not => {
                        let temp = self.program.alloc_temp(DataType::Flag);
                        self.emit_simple(Opcode::Not, temp.clone(), operand_op, Operand::None, line);
                        temp
                    }
                }
            }

            NodeKind::Between { value, lower, upper } => {
                let value_op = self.lower_expr(value);
                let lower_op = self.lower_expr(lower);
                let upper_op = self.lower_expr(upper);
                let temp = self.program.alloc_temp(DataType::Flag);
                self.emit(Instruction::between(temp.clone(), value_op, lower_op, upper_op, line));
                temp
            }

            NodeKind::FuncCall { name, args } => {
                let arg_ops: Vec<Operand> = args.iter().map(|arg| self.lower_expr(arg)).collect();
                let count = arg_ops.len();
                for arg in arg_ops {
                    self.emit_simple(Opcode::Param, Operand::None, arg, Operand::None, line);
                }
                let result_type = match node.data_type {
                    DataType::Unknown | DataType::Error => DataType::Number,
                    ty => ty,
                };
                let temp = self.program.alloc_temp(result_type);
                self.emit_simple(
                    Opcode::Call,
                    temp.clone(),
                    Operand::Func(name.clone()),
                    Operand::IntConst(count as i64),
                    line,
                );
                temp
            }

            NodeKind::List { elements } => {
                let list = self.program.alloc_temp(DataType::List);
                self.emit_simple(
                    Opcode::ListCreate,
                    list.clone(),
                    Operand::IntConst(elements.len() as i64),
                    Operand::None,
                    line,
                );
                for element in elements {
                    let element_op = self.lower_expr(element);
                    self.emit_simple(Opcode::ListAppend, Operand::None, list.clone(), element_op, line);
                }
                list
            }

            NodeKind::Index { array, index } => {
                let array_op = self.lower_expr(array);
                let index_op = self.lower_expr(index);
                let temp = self.program.alloc_temp(value_type(node));
                self.emit_simple(Opcode::ListGet, temp.clone(), array_op, index_op, line);
                temp
            }

            other => {
                tracing::warn!("skipping non-expression node in expression position: {other:?}");
                Operand::None
            }
        }
    }
}

impl Default for IrBuilder {
    fn default() -> Self {
        IrBuilder::new()
    }
}
