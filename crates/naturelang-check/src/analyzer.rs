//! The semantic analyzer: a single AST walk that builds the symbol table,
//! annotates every expression node's `data_type` in place, and collects all
//! errors and warnings.
//!
//! Analysis never aborts: each violation is recorded and the walk continues,
//! so one pass surfaces every diagnostic in the program.

use naturelang_core::ast::{Node, NodeKind};
use naturelang_core::loc::SourceLoc;
use naturelang_core::types::DataType;

use crate::diagnostics::{SemanticError, SemanticWarning};
use crate::rules;
use crate::symbols::{FunctionInfo, ScopeKind, Symbol, SymbolKind, SymbolTable};

/// The outcome of analyzing a program.
#[derive(Debug)]
pub struct AnalysisReport {
    /// `true` iff no errors were recorded.
    pub success: bool,
    pub error_count: usize,
    pub warning_count: usize,
    pub errors: Vec<SemanticError>,
    pub warnings: Vec<SemanticWarning>,
    /// The finished table, retained for downstream consumers.
    pub symbols: SymbolTable,
}

/// Walks one AST and produces an [`AnalysisReport`].
pub struct SemanticAnalyzer {
    table: SymbolTable,
    errors: Vec<SemanticError>,
    warnings: Vec<SemanticWarning>,
}

impl SemanticAnalyzer {
    pub fn new() -> Self {
        SemanticAnalyzer {
            table: SymbolTable::new(),
            errors: Vec::new(),
            warnings: Vec::new(),
        }
    }

    /// Analyzes the program rooted at `root`, annotating `data_type` fields.
    pub fn analyze(mut self, root: &mut Node) -> AnalysisReport {
        self.visit_stmt(root);
        AnalysisReport {
            success: self.errors.is_empty(),
            error_count: self.errors.len(),
            warning_count: self.warnings.len(),
            errors: self.errors,
            warnings: self.warnings,
            symbols: self.table,
        }
    }

    fn error(&mut self, error: SemanticError) {
        self.errors.push(error);
    }

    fn warn(&mut self, warning: SemanticWarning) {
        self.warnings.push(warning);
    }

    // -----------------------------------------------------------------------
    // Statements
    // -----------------------------------------------------------------------

    fn visit_stmt(&mut self, node: &mut Node) {
        let loc = node.loc;
        match &mut node.kind {
            NodeKind::Program { statements } => {
                for stmt in statements {
                    self.visit_stmt(stmt);
                }
            }

            NodeKind::Block { statements } => {
                self.table.enter(ScopeKind::Block);
                for stmt in statements {
                    self.visit_stmt(stmt);
                }
                self.table.exit();
            }

            NodeKind::VarDecl {
                name,
                declared_type,
                initializer,
                is_constant,
            } => {
                let init_type = initializer.as_deref_mut().map(|init| self.visit_expr(init));
                if let Some(actual) = init_type {
                    if !rules::compatible(*declared_type, actual) {
                        self.error(SemanticError::InitializerMismatch {
                            name: name.clone(),
                            declared: *declared_type,
                            actual,
                            loc,
                        });
                    }
                }
                let mut symbol = Symbol::variable(name.clone(), *declared_type, loc, *is_constant);
                symbol.initialized = init_type.is_some();
                if let Err(previous) = self.table.declare(symbol) {
                    self.error(SemanticError::Redeclaration {
                        name: name.clone(),
                        loc,
                        previous,
                    });
                }
            }

            NodeKind::FuncDecl {
                name,
                params,
                return_type,
                body,
            } => {
                let info = FunctionInfo {
                    params: params.iter().map(|p| (p.name.clone(), p.declared_type)).collect(),
                    return_type: *return_type,
                };
                if let Err(previous) = self.table.declare(Symbol::function(name.clone(), info, loc)) {
                    self.error(SemanticError::Redeclaration {
                        name: name.clone(),
                        loc,
                        previous,
                    });
                }
                self.table.enter(ScopeKind::Function(*return_type));
                for param in params.iter() {
                    if let Err(previous) = self
                        .table
                        .declare(Symbol::parameter(param.name.clone(), param.declared_type, param.loc))
                    {
                        self.error(SemanticError::Redeclaration {
                            name: param.name.clone(),
                            loc: param.loc,
                            previous,
                        });
                    }
                }
                // The body block's statements live directly in the function
                // scope, beside the parameters.
                self.visit_stmts_in_current_scope(body);
                self.table.exit();
            }

            NodeKind::Assign { target, value } => {
                let value_type = self.visit_expr(value);
                match &mut target.kind {
                    NodeKind::Identifier { name } => {
                        let name = name.clone();
                        match self.table.lookup(&name) {
                            None => {
                                self.error(SemanticError::UndefinedSymbol { name, loc });
                            }
                            Some(symbol) => {
                                let kind = symbol.kind;
                                let target_type = symbol.data_type;
                                target.data_type = target_type;
                                match kind {
                                    SymbolKind::Constant => {
                                        self.error(SemanticError::ConstantAssignment { name, loc });
                                    }
                                    SymbolKind::Function => {
                                        self.error(SemanticError::InvalidAssignTarget { loc });
                                    }
                                    SymbolKind::Variable | SymbolKind::Parameter => {
                                        if !rules::compatible(target_type, value_type) {
                                            self.error(SemanticError::AssignMismatch {
                                                name: name.clone(),
                                                expected: target_type,
                                                actual: value_type,
                                                loc,
                                            });
                                        }
                                        self.table.mark_initialized(&name);
                                    }
                                }
                            }
                        }
                    }
                    NodeKind::Index { .. } => {
                        let element_type = self.visit_expr(target);
                        if !rules::compatible(element_type, value_type) {
                            self.error(SemanticError::AssignMismatch {
                                name: "indexed element".into(),
                                expected: element_type,
                                actual: value_type,
                                loc,
                            });
                        }
                    }
                    _ => {
                        self.error(SemanticError::InvalidAssignTarget { loc });
                    }
                }
            }

            NodeKind::If {
                condition,
                then_block,
                else_block,
            } => {
                self.check_condition(condition);
                self.table.enter(ScopeKind::Block);
                self.visit_stmts_in_current_scope(then_block);
                self.table.exit();
                if let Some(else_block) = else_block {
                    self.table.enter(ScopeKind::Block);
                    self.visit_stmts_in_current_scope(else_block);
                    self.table.exit();
                }
            }

            NodeKind::While { condition, body } => {
                self.check_condition(condition);
                self.table.enter(ScopeKind::Loop);
                self.visit_stmts_in_current_scope(body);
                self.table.exit();
            }

            NodeKind::Repeat { count, body } => {
                let count_type = self.visit_expr(count);
                if !count_type.is_numeric() && !rules::is_unresolved(count_type) {
                    self.error(SemanticError::NonNumericRepeatCount {
                        actual: count_type,
                        loc,
                    });
                }
                self.table.enter(ScopeKind::Loop);
                self.visit_stmts_in_current_scope(body);
                self.table.exit();
            }

            NodeKind::ForEach {
                iterator,
                iterable,
                body,
            } => {
                let iterable_type = self.visit_expr(iterable);
                if !matches!(iterable_type, DataType::List | DataType::Text)
                    && !rules::is_unresolved(iterable_type)
                {
                    self.error(SemanticError::NotIterable {
                        actual: iterable_type,
                        loc,
                    });
                }
                self.table.enter(ScopeKind::Loop);
                // Element types are not tracked for lists, so the iterator is
                // Text when walking text and Unknown otherwise.
                let element_type = if iterable_type == DataType::Text {
                    DataType::Text
                } else {
                    DataType::Unknown
                };
                let mut symbol = Symbol::variable(iterator.clone(), element_type, loc, false);
                symbol.initialized = true;
                // A fresh loop scope cannot already hold the iterator name.
                let _ = self.table.declare(symbol);
                self.visit_stmts_in_current_scope(body);
                self.table.exit();
            }

            NodeKind::Return { value } => {
                if !self.table.in_function() {
                    self.error(SemanticError::ReturnOutsideFunction { loc });
                }
                let expected = self.table.expected_return();
                match value.as_deref_mut() {
                    Some(value) => {
                        let actual = self.visit_expr(value);
                        if !rules::compatible(expected, actual) {
                            self.error(SemanticError::ReturnTypeMismatch { expected, actual, loc });
                        }
                    }
                    None => {
                        if expected != DataType::Nothing && expected != DataType::Unknown {
                            self.error(SemanticError::MissingReturnValue { expected, loc });
                        }
                    }
                }
            }

            NodeKind::Break => {
                if !self.table.in_loop() {
                    self.error(SemanticError::BreakOutsideLoop { loc });
                }
            }

            NodeKind::Continue => {
                if !self.table.in_loop() {
                    self.error(SemanticError::ContinueOutsideLoop { loc });
                }
            }

            NodeKind::Display { value } => {
                self.visit_expr(value);
            }

            NodeKind::Ask { prompt, target } => {
                if let Some(prompt) = prompt.as_deref_mut() {
                    self.visit_expr(prompt);
                }
                let target = target.clone();
                self.check_io_target(&target, loc);
            }

            NodeKind::Read { target } => {
                let target = target.clone();
                self.check_io_target(&target, loc);
            }

            NodeKind::SecureZone { body, .. } => {
                self.table.enter(ScopeKind::Secure);
                self.visit_stmts_in_current_scope(body);
                self.table.exit();
            }

            // A bare expression in statement position is analyzed for its
            // side conditions; the value is discarded.
            _ => {
                if node.is_expression() {
                    self.visit_expr(node);
                }
            }
        }
    }

    /// Analyzes a body node without opening another scope: used for function
    /// bodies and for blocks whose construct already opened the scope.
    fn visit_stmts_in_current_scope(&mut self, body: &mut Node) {
        match &mut body.kind {
            NodeKind::Block { statements } => {
                for stmt in statements {
                    self.visit_stmt(stmt);
                }
            }
            _ => self.visit_stmt(body),
        }
    }

    /// Conditions must be flags; numeric conditions are accepted silently,
    /// anything else warns but does not fail.
    fn check_condition(&mut self, condition: &mut Node) {
        let loc = condition.loc;
        let ty = self.visit_expr(condition);
        if ty != DataType::Flag && !ty.is_numeric() && !rules::is_unresolved(ty) {
            self.warn(SemanticWarning::NonBooleanCondition { actual: ty, loc });
        }
    }

    /// `ask`/`read` targets must exist and be writable; a successful check
    /// marks the target initialized.
    fn check_io_target(&mut self, name: &str, loc: SourceLoc) {
        match self.table.lookup(name) {
            None => self.error(SemanticError::UndefinedSymbol {
                name: name.to_string(),
                loc,
            }),
            Some(symbol) => match symbol.kind {
                SymbolKind::Constant => self.error(SemanticError::ConstantAssignment {
                    name: name.to_string(),
                    loc,
                }),
                SymbolKind::Function => self.error(SemanticError::InvalidAssignTarget { loc }),
                SymbolKind::Variable | SymbolKind::Parameter => {
                    self.table.mark_initialized(name);
                }
            },
        }
    }

    // -----------------------------------------------------------------------
    // Expressions
    // -----------------------------------------------------------------------

    fn visit_expr(&mut self, node: &mut Node) -> DataType {
        let loc = node.loc;
        let ty = match &mut node.kind {
            NodeKind::LiteralInt { .. } => DataType::Number,
            NodeKind::LiteralFloat { .. } => DataType::Decimal,
            NodeKind::LiteralString { .. } => DataType::Text,
            NodeKind::LiteralBool { .. } => DataType::Flag,

            NodeKind::Identifier { name } => {
                let name = name.clone();
                match self.table.lookup(&name) {
                    None => {
                        self.error(SemanticError::UndefinedSymbol { name, loc });
                        DataType::Unknown
                    }
                    Some(symbol) => {
                        let ty = symbol.data_type;
                        if matches!(symbol.kind, SymbolKind::Variable | SymbolKind::Constant)
                            && !symbol.initialized
                        {
                            self.warn(SemanticWarning::UninitializedRead { name, loc });
                        }
                        ty
                    }
                }
            }

            NodeKind::BinaryOp { op, left, right } => {
                let op = *op;
                let left_type = self.visit_expr(left);
                let right_type = self.visit_expr(right);
                match rules::binary_rule(op, left_type, right_type, loc) {
                    Ok(ty) => ty,
                    Err(error) => {
                        self.error(error);
                        DataType::Error
                    }
                }
            }

            NodeKind::UnaryOp { op, operand } => {
                let op = *op;
                let operand_type = self.visit_expr(operand);
                match rules::unary_rule(op, operand_type, loc) {
                    Ok(ty) => ty,
                    Err(error) => {
                        self.error(error);
                        DataType::Error
                    }
                }
            }

            NodeKind::Between { value, lower, upper } => {
                let value_type = self.visit_expr(value);
                let lower_type = self.visit_expr(lower);
                let upper_type = self.visit_expr(upper);
                for ty in [value_type, lower_type, upper_type] {
                    if !ty.is_numeric() && !rules::is_unresolved(ty) {
                        self.error(SemanticError::NonNumericBetween { actual: ty, loc });
                        break;
                    }
                }
                DataType::Flag
            }

            NodeKind::Index { array, index } => {
                let array_type = self.visit_expr(array);
                let index_type = self.visit_expr(index);
                if !index_type.is_numeric() && !rules::is_unresolved(index_type) {
                    self.error(SemanticError::NonNumericIndex {
                        actual: index_type,
                        loc,
                    });
                }
                match array_type {
                    DataType::Text => DataType::Text,
                    // List element types are not tracked.
                    DataType::List => DataType::Unknown,
                    ty if rules::is_unresolved(ty) => DataType::Unknown,
                    other => {
                        self.error(SemanticError::NotIndexable { actual: other, loc });
                        DataType::Error
                    }
                }
            }

            NodeKind::List { elements } => {
                for element in elements {
                    self.visit_expr(element);
                }
                DataType::List
            }

            NodeKind::FuncCall { name, args } => {
                let name = name.clone();
                // Argument expressions are analyzed regardless of whether the
                // callee resolves, so their diagnostics still surface.
                let arg_types: Vec<DataType> =
                    args.iter_mut().map(|arg| self.visit_expr(arg)).collect();
                match self.table.lookup(&name) {
                    None => {
                        self.error(SemanticError::UndefinedFunction { name, loc });
                        DataType::Unknown
                    }
                    Some(symbol) => {
                        if symbol.kind != SymbolKind::Function {
                            self.error(SemanticError::NotAFunction { name, loc });
                            DataType::Unknown
                        } else {
                            let info = symbol.function.clone().expect("function symbol has info");
                            if info.params.len() != arg_types.len() {
                                self.error(SemanticError::ArgumentCount {
                                    name: name.clone(),
                                    expected: info.params.len(),
                                    actual: arg_types.len(),
                                    loc,
                                });
                            } else {
                                for (index, ((_, expected), actual)) in
                                    info.params.iter().zip(arg_types.iter()).enumerate()
                                {
                                    if !rules::compatible(*expected, *actual) {
                                        self.error(SemanticError::ArgumentType {
                                            name: name.clone(),
                                            index: index + 1,
                                            expected: *expected,
                                            actual: *actual,
                                            loc,
                                        });
                                    }
                                }
                            }
                            info.return_type
                        }
                    }
                }
            }

            // Statement shapes in expression position have no value.
            _ => DataType::Nothing,
        };
        node.data_type = ty;
        ty
    }
}

impl Default for SemanticAnalyzer {
    fn default() -> Self {
        SemanticAnalyzer::new()
    }
}
