//! The NatureLang abstract syntax tree.
//!
//! The frontend delivers a fully-built [`Node`] tree (as a JSON document that
//! deserializes into this model). Every node carries a source location and a
//! `data_type` slot that defaults to [`DataType::Unknown`]; the semantic
//! analyzer fills the slot in place and downstream stages read it.
//!
//! Nodes are owned: children are `Box<Node>` / `Vec<Node>` and the tree has a
//! single ownership chain from the root `Program` node.

use serde::{Deserialize, Serialize};

use crate::loc::SourceLoc;
use crate::types::DataType;

/// Binary operators of the surface language.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BinaryOp {
    Add,
    Sub,
    Mul,
    Div,
    Mod,
    Pow,
    Eq,
    Neq,
    Lt,
    Gt,
    Lte,
    Gte,
    And,
    Or,
}

impl BinaryOp {
    /// Returns `true` for `== != < > <= >=`.
    pub fn is_comparison(self) -> bool {
        matches!(
            self,
            BinaryOp::Eq | BinaryOp::Neq | BinaryOp::Lt | BinaryOp::Gt | BinaryOp::Lte | BinaryOp::Gte
        )
    }

    /// Returns `true` for the ordering comparisons `< > <= >=`.
    pub fn is_ordering(self) -> bool {
        matches!(self, BinaryOp::Lt | BinaryOp::Gt | BinaryOp::Lte | BinaryOp::Gte)
    }

    /// Returns `true` for `and` / `or`.
    pub fn is_logical(self) -> bool {
        matches!(self, BinaryOp::And | BinaryOp::Or)
    }

    /// Returns `true` for `+ - * / % ^`.
    pub fn is_arithmetic(self) -> bool {
        !self.is_comparison() && !self.is_logical()
    }
}

/// Unary operators of the surface language.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum UnaryOp {
    /// Arithmetic negation.
    Neg,
    /// Arithmetic identity (`+x`).
    Pos,
    /// Boolean negation.
    Not,
}

/// A function parameter as written in the source.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Param {
    pub name: String,
    pub declared_type: DataType,
    pub loc: SourceLoc,
}

/// The payload of an AST node.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum NodeKind {
    /// Top-level program: a statement list.
    Program { statements: Vec<Node> },

    /// `create a <type> called <name> [and set it to <init>]`.
    VarDecl {
        name: String,
        declared_type: DataType,
        initializer: Option<Box<Node>>,
        is_constant: bool,
    },

    /// `to <name> with <params> giving <type>: <body>`.
    FuncDecl {
        name: String,
        params: Vec<Param>,
        return_type: DataType,
        body: Box<Node>,
    },

    /// Statement sequence with its own scope.
    Block { statements: Vec<Node> },

    /// `<target> becomes <value>`. Target is an identifier or an index.
    Assign { target: Box<Node>, value: Box<Node> },

    /// `if <cond> then ... [otherwise ...] end if`.
    If {
        condition: Box<Node>,
        then_block: Box<Node>,
        else_block: Option<Box<Node>>,
    },

    /// `while <cond> do ... end while`.
    While { condition: Box<Node>, body: Box<Node> },

    /// `repeat <count> times ... end repeat`.
    Repeat { count: Box<Node>, body: Box<Node> },

    /// `for each <iterator> in <iterable> ... end for`.
    ForEach {
        iterator: String,
        iterable: Box<Node>,
        body: Box<Node>,
    },

    /// `give back [<value>]`.
    Return { value: Option<Box<Node>> },

    /// `stop`.
    Break,

    /// `skip`.
    Continue,

    /// `display <value>`.
    Display { value: Box<Node> },

    /// `ask [<prompt>] and store in <target>`.
    Ask { prompt: Option<Box<Node>>, target: String },

    /// `read into <target>`.
    Read { target: String },

    /// `secure zone: ... end zone`.
    SecureZone { body: Box<Node>, is_safe: bool },

    /// Binary operation.
    BinaryOp {
        op: BinaryOp,
        left: Box<Node>,
        right: Box<Node>,
    },

    /// Unary operation.
    UnaryOp { op: UnaryOp, operand: Box<Node> },

    /// `<value> is between <lower> and <upper>`.
    Between {
        value: Box<Node>,
        lower: Box<Node>,
        upper: Box<Node>,
    },

    LiteralInt { value: i64 },
    LiteralFloat { value: f64 },
    LiteralString { value: String },
    LiteralBool { value: bool },

    /// A name reference.
    Identifier { name: String },

    /// `<name> of <args>` / `call <name> with <args>`.
    FuncCall { name: String, args: Vec<Node> },

    /// `item <index> of <array>`.
    Index { array: Box<Node>, index: Box<Node> },

    /// `a list of <elements>`.
    List { elements: Vec<Node> },
}

/// An AST node: location, analyzer-resolved type, and tagged payload.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Node {
    pub loc: SourceLoc,
    /// Filled by the semantic analyzer; `Unknown` until then.
    #[serde(default)]
    pub data_type: DataType,
    pub kind: NodeKind,
}

impl Node {
    /// Creates a node with the given kind at a location, type `Unknown`.
    pub fn new(kind: NodeKind, loc: SourceLoc) -> Self {
        Node {
            loc,
            data_type: DataType::Unknown,
            kind,
        }
    }

    /// Creates a node with no source location (synthesized / test trees).
    pub fn synthetic(kind: NodeKind) -> Self {
        Node::new(kind, SourceLoc::default())
    }

    pub fn program(statements: Vec<Node>) -> Self {
        Node::synthetic(NodeKind::Program { statements })
    }

    pub fn block(statements: Vec<Node>) -> Self {
        Node::synthetic(NodeKind::Block { statements })
    }

    pub fn literal_int(value: i64) -> Self {
        Node::synthetic(NodeKind::LiteralInt { value })
    }

    pub fn literal_float(value: f64) -> Self {
        Node::synthetic(NodeKind::LiteralFloat { value })
    }

    pub fn literal_string(value: impl Into<String>) -> Self {
        Node::synthetic(NodeKind::LiteralString { value: value.into() })
    }

    pub fn literal_bool(value: bool) -> Self {
        Node::synthetic(NodeKind::LiteralBool { value })
    }

    pub fn identifier(name: impl Into<String>) -> Self {
        Node::synthetic(NodeKind::Identifier { name: name.into() })
    }

    pub fn binary(op: BinaryOp, left: Node, right: Node) -> Self {
        Node::synthetic(NodeKind::BinaryOp {
            op,
            left: Box::new(left),
            right: Box::new(right),
        })
    }

    pub fn unary(op: UnaryOp, operand: Node) -> Self {
        Node::synthetic(NodeKind::UnaryOp {
            op,
            operand: Box::new(operand),
        })
    }

    pub fn var_decl(name: impl Into<String>, declared_type: DataType, initializer: Option<Node>) -> Self {
        Node::synthetic(NodeKind::VarDecl {
            name: name.into(),
            declared_type,
            initializer: initializer.map(Box::new),
            is_constant: false,
        })
    }

    pub fn assign(target: Node, value: Node) -> Self {
        Node::synthetic(NodeKind::Assign {
            target: Box::new(target),
            value: Box::new(value),
        })
    }

    pub fn display(value: Node) -> Self {
        Node::synthetic(NodeKind::Display {
            value: Box::new(value),
        })
    }

    pub fn func_call(name: impl Into<String>, args: Vec<Node>) -> Self {
        Node::synthetic(NodeKind::FuncCall {
            name: name.into(),
            args,
        })
    }

    /// Returns `true` for payloads that are expressions (produce a value).
    pub fn is_expression(&self) -> bool {
        matches!(
            self.kind,
            NodeKind::BinaryOp { .. }
                | NodeKind::UnaryOp { .. }
                | NodeKind::Between { .. }
                | NodeKind::LiteralInt { .. }
                | NodeKind::LiteralFloat { .. }
                | NodeKind::LiteralString { .. }
                | NodeKind::LiteralBool { .. }
                | NodeKind::Identifier { .. }
                | NodeKind::FuncCall { .. }
                | NodeKind::Index { .. }
                | NodeKind::List { .. }
        )
    }
}
