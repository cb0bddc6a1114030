pub mod ast;
pub mod error;
pub mod loc;
pub mod tac;
pub mod types;

// Re-export commonly used types
pub use ast::{BinaryOp, Node, NodeKind, Param, UnaryOp};
pub use error::CoreError;
pub use loc::SourceLoc;
pub use tac::{Instruction, Opcode, Operand, TacFunction, TacProgram};
pub use types::DataType;
