//! Lexical scopes and the symbol table.
//!
//! Scopes form a parent-linked chain. The analyzer pushes a scope on entry
//! and pops it on exit; exited scopes stay in the arena so the finished table
//! can still be inspected by downstream consumers, while lookups only ever
//! walk the live child-to-parent chain.
//!
//! Flag inheritance: `is_loop` and `is_secure` propagate to child scopes.
//! `is_function` does not -- entering a function scope resets the loop flag.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use naturelang_core::loc::SourceLoc;
use naturelang_core::types::DataType;

/// What kind of entity a symbol names.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SymbolKind {
    Variable,
    Constant,
    Function,
    Parameter,
}

/// Signature of a declared function, attached to `Function` symbols.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FunctionInfo {
    pub params: Vec<(String, DataType)>,
    pub return_type: DataType,
}

/// One declared name.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Symbol {
    pub name: String,
    pub kind: SymbolKind,
    pub data_type: DataType,
    pub loc: SourceLoc,
    pub initialized: bool,
    /// Present iff `kind` is `Function`.
    pub function: Option<FunctionInfo>,
}

impl Symbol {
    /// Creates a variable or constant symbol.
    pub fn variable(name: impl Into<String>, data_type: DataType, loc: SourceLoc, constant: bool) -> Self {
        Symbol {
            name: name.into(),
            kind: if constant { SymbolKind::Constant } else { SymbolKind::Variable },
            data_type,
            loc,
            initialized: false,
            function: None,
        }
    }

    /// Creates a parameter symbol (always initialized).
    pub fn parameter(name: impl Into<String>, data_type: DataType, loc: SourceLoc) -> Self {
        Symbol {
            name: name.into(),
            kind: SymbolKind::Parameter,
            data_type,
            loc,
            initialized: true,
            function: None,
        }
    }

    /// Creates a function symbol carrying its signature.
    pub fn function(name: impl Into<String>, info: FunctionInfo, loc: SourceLoc) -> Self {
        Symbol {
            name: name.into(),
            kind: SymbolKind::Function,
            data_type: DataType::Function,
            loc,
            initialized: true,
            function: Some(info),
        }
    }
}

/// The reason a scope was opened; selects its flags.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScopeKind {
    /// Plain block (if/else arms, bare blocks).
    Block,
    /// Loop body: sets `is_loop`.
    Loop,
    /// Function body: sets `is_function`, resets `is_loop`, records the
    /// expected return type.
    Function(DataType),
    /// Secure zone: sets `is_secure`.
    Secure,
}

/// A single lexical scope.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Scope {
    pub depth: u32,
    symbols: IndexMap<String, Symbol>,
    parent: Option<usize>,
    pub is_function: bool,
    pub is_loop: bool,
    pub is_secure: bool,
    /// Set on function scopes only.
    pub expected_return: Option<DataType>,
}

impl Scope {
    /// Symbols declared directly in this scope, in declaration order.
    pub fn symbols(&self) -> impl Iterator<Item = &Symbol> {
        self.symbols.values()
    }
}

/// Stack of scopes with an arena that outlives scope exit.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SymbolTable {
    scopes: Vec<Scope>,
    stack: Vec<usize>,
}

impl SymbolTable {
    /// Creates a table with the global scope already open.
    pub fn new() -> Self {
        SymbolTable {
            scopes: vec![Scope {
                depth: 0,
                symbols: IndexMap::new(),
                parent: None,
                is_function: false,
                is_loop: false,
                is_secure: false,
                expected_return: None,
            }],
            stack: vec![0],
        }
    }

    fn current(&self) -> &Scope {
        &self.scopes[*self.stack.last().expect("global scope never exits")]
    }

    fn current_mut(&mut self) -> &mut Scope {
        let idx = *self.stack.last().expect("global scope never exits");
        &mut self.scopes[idx]
    }

    /// Opens a child scope of the current one.
    pub fn enter(&mut self, kind: ScopeKind) {
        let parent_idx = *self.stack.last().expect("global scope never exits");
        let parent = &self.scopes[parent_idx];
        let mut scope = Scope {
            depth: parent.depth + 1,
            symbols: IndexMap::new(),
            parent: Some(parent_idx),
            is_function: false,
            // Loop and secure-zone flags are inherited.
            is_loop: parent.is_loop,
            is_secure: parent.is_secure,
            expected_return: None,
        };
        match kind {
            ScopeKind::Block => {}
            ScopeKind::Loop => scope.is_loop = true,
            ScopeKind::Function(return_type) => {
                scope.is_function = true;
                scope.is_loop = false;
                scope.expected_return = Some(return_type);
            }
            ScopeKind::Secure => scope.is_secure = true,
        }
        let idx = self.scopes.len();
        self.scopes.push(scope);
        self.stack.push(idx);
    }

    /// Closes the current scope. The global scope is never popped.
    pub fn exit(&mut self) {
        if self.stack.len() > 1 {
            self.stack.pop();
        }
    }

    /// Depth of the scope lookups currently start from.
    pub fn current_depth(&self) -> u32 {
        self.current().depth
    }

    /// Declares a symbol in the current scope. On a name clash, returns the
    /// declaration location of the existing symbol and leaves it in place.
    pub fn declare(&mut self, symbol: Symbol) -> Result<(), SourceLoc> {
        let scope = self.current_mut();
        if let Some(existing) = scope.symbols.get(&symbol.name) {
            return Err(existing.loc);
        }
        scope.symbols.insert(symbol.name.clone(), symbol);
        Ok(())
    }

    /// Looks a name up along the live chain; the innermost hit wins.
    pub fn lookup(&self, name: &str) -> Option<&Symbol> {
        self.lookup_with_depth(name).map(|(symbol, _)| symbol)
    }

    /// Like [`lookup`](Self::lookup) but also reports the depth of the scope
    /// the symbol was declared in.
    pub fn lookup_with_depth(&self, name: &str) -> Option<(&Symbol, u32)> {
        let mut idx = Some(*self.stack.last().expect("global scope never exits"));
        while let Some(i) = idx {
            let scope = &self.scopes[i];
            if let Some(symbol) = scope.symbols.get(name) {
                return Some((symbol, scope.depth));
            }
            idx = scope.parent;
        }
        None
    }

    /// Marks the innermost symbol with this name as initialized.
    /// Returns `false` if the name is not in scope.
    pub fn mark_initialized(&mut self, name: &str) -> bool {
        let mut idx = Some(*self.stack.last().expect("global scope never exits"));
        while let Some(i) = idx {
            if self.scopes[i].symbols.contains_key(name) {
                self.scopes[i].symbols.get_mut(name).unwrap().initialized = true;
                return true;
            }
            idx = self.scopes[i].parent;
        }
        false
    }

    /// Returns `true` inside a loop body (inherited through child scopes).
    pub fn in_loop(&self) -> bool {
        self.current().is_loop
    }

    /// Returns `true` inside a secure zone (inherited through child scopes).
    pub fn in_secure_zone(&self) -> bool {
        self.current().is_secure
    }

    /// Returns `true` if some enclosing scope is a function scope.
    pub fn in_function(&self) -> bool {
        let mut idx = Some(*self.stack.last().expect("global scope never exits"));
        while let Some(i) = idx {
            if self.scopes[i].is_function {
                return true;
            }
            idx = self.scopes[i].parent;
        }
        false
    }

    /// The `expected_return` of the nearest enclosing function scope,
    /// `Nothing` when outside any function.
    pub fn expected_return(&self) -> DataType {
        let mut idx = Some(*self.stack.last().expect("global scope never exits"));
        while let Some(i) = idx {
            let scope = &self.scopes[i];
            if scope.is_function {
                return scope.expected_return.unwrap_or(DataType::Nothing);
            }
            idx = scope.parent;
        }
        DataType::Nothing
    }

    /// All scopes ever created, for downstream inspection.
    pub fn scopes(&self) -> &[Scope] {
        &self.scopes
    }
}

impl Default for SymbolTable {
    fn default() -> Self {
        SymbolTable::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sym(name: &str) -> Symbol {
        Symbol::variable(name, DataType::Number, SourceLoc::default(), false)
    }

    #[test]
    fn declare_and_lookup_in_same_scope() {
        let mut table = SymbolTable::new();
        table.declare(sym("x")).unwrap();
        let found = table.lookup("x").unwrap();
        assert_eq!(found.kind, SymbolKind::Variable);
        assert_eq!(found.data_type, DataType::Number);
    }

    #[test]
    fn duplicate_in_same_scope_is_rejected() {
        let mut table = SymbolTable::new();
        let mut first = sym("x");
        first.loc = SourceLoc::new(3, 1);
        table.declare(first).unwrap();
        let err = table.declare(sym("x")).unwrap_err();
        assert_eq!(err, SourceLoc::new(3, 1));
    }

    #[test]
    fn inner_scope_shadows_outer() {
        let mut table = SymbolTable::new();
        table.declare(sym("x")).unwrap();
        table.enter(ScopeKind::Block);
        let mut inner = Symbol::variable("x", DataType::Text, SourceLoc::default(), false);
        inner.initialized = true;
        table.declare(inner).unwrap();
        assert_eq!(table.lookup("x").unwrap().data_type, DataType::Text);
        table.exit();
        assert_eq!(table.lookup("x").unwrap().data_type, DataType::Number);
    }

    #[test]
    fn lookup_walks_to_parent() {
        let mut table = SymbolTable::new();
        table.declare(sym("outer")).unwrap();
        table.enter(ScopeKind::Block);
        table.enter(ScopeKind::Block);
        let (_, depth) = table.lookup_with_depth("outer").unwrap();
        assert_eq!(depth, 0);
        assert_eq!(table.current_depth(), 2);
    }

    #[test]
    fn lookup_depth_never_exceeds_current_depth() {
        let mut table = SymbolTable::new();
        table.declare(sym("a")).unwrap();
        table.enter(ScopeKind::Block);
        table.declare(sym("b")).unwrap();
        for name in ["a", "b"] {
            let (_, depth) = table.lookup_with_depth(name).unwrap();
            assert!(depth <= table.current_depth());
        }
    }

    #[test]
    fn loop_flag_is_inherited() {
        let mut table = SymbolTable::new();
        assert!(!table.in_loop());
        table.enter(ScopeKind::Loop);
        assert!(table.in_loop());
        table.enter(ScopeKind::Block);
        assert!(table.in_loop(), "child of a loop scope sees the loop");
        table.exit();
        table.exit();
        assert!(!table.in_loop());
    }

    #[test]
    fn function_scope_resets_loop_flag() {
        let mut table = SymbolTable::new();
        table.enter(ScopeKind::Loop);
        table.enter(ScopeKind::Function(DataType::Number));
        assert!(!table.in_loop(), "function entry resets the loop flag");
        assert!(table.in_function());
        assert_eq!(table.expected_return(), DataType::Number);
    }

    #[test]
    fn secure_flag_is_inherited() {
        let mut table = SymbolTable::new();
        table.enter(ScopeKind::Secure);
        table.enter(ScopeKind::Block);
        assert!(table.in_secure_zone());
    }

    #[test]
    fn expected_return_defaults_to_nothing() {
        let table = SymbolTable::new();
        assert_eq!(table.expected_return(), DataType::Nothing);
        assert!(!table.in_function());
    }

    #[test]
    fn expected_return_finds_nearest_function() {
        let mut table = SymbolTable::new();
        table.enter(ScopeKind::Function(DataType::Text));
        table.enter(ScopeKind::Function(DataType::Decimal));
        table.enter(ScopeKind::Block);
        assert_eq!(table.expected_return(), DataType::Decimal);
    }

    #[test]
    fn mark_initialized_walks_chain() {
        let mut table = SymbolTable::new();
        table.declare(sym("x")).unwrap();
        table.enter(ScopeKind::Block);
        assert!(table.mark_initialized("x"));
        table.exit();
        assert!(table.lookup("x").unwrap().initialized);
        assert!(!table.mark_initialized("missing"));
    }

    #[test]
    fn exited_scopes_remain_inspectable() {
        let mut table = SymbolTable::new();
        table.enter(ScopeKind::Block);
        table.declare(sym("inner")).unwrap();
        table.exit();
        assert!(table.lookup("inner").is_none(), "not visible after exit");
        assert_eq!(table.scopes().len(), 2, "but the scope is retained");
        assert_eq!(table.scopes()[1].symbols().count(), 1);
    }

    #[test]
    fn global_scope_cannot_be_popped() {
        let mut table = SymbolTable::new();
        table.exit();
        table.exit();
        assert_eq!(table.current_depth(), 0);
        table.declare(sym("still works")).unwrap();
    }
}
