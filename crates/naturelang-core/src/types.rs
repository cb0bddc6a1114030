//! The NatureLang type lattice.
//!
//! Every expression resolves to one of these types during semantic analysis.
//! `Unknown` is the pre-analysis default and also the element type of lists
//! (element types are not tracked). `Error` marks nodes whose type could not
//! be established; it never propagates past the analyzer.

use std::fmt;

use serde::{Deserialize, Serialize};

/// A NatureLang data type.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DataType {
    /// Not yet resolved (analyzer default, list elements).
    #[default]
    Unknown,
    /// 64-bit signed integer (`number`).
    Number,
    /// 64-bit float (`decimal`).
    Decimal,
    /// String (`text`).
    Text,
    /// Boolean (`flag`).
    Flag,
    /// Heterogeneous list.
    List,
    /// Absence of a value (void functions).
    Nothing,
    /// A function symbol used as a value.
    Function,
    /// Analysis failure marker.
    Error,
}

impl DataType {
    /// Returns `true` for `Number` and `Decimal`.
    pub fn is_numeric(self) -> bool {
        matches!(self, DataType::Number | DataType::Decimal)
    }

    /// Surface-language name, used in diagnostics.
    pub fn name(self) -> &'static str {
        match self {
            DataType::Unknown => "unknown",
            DataType::Number => "number",
            DataType::Decimal => "decimal",
            DataType::Text => "text",
            DataType::Flag => "flag",
            DataType::List => "list",
            DataType::Nothing => "nothing",
            DataType::Function => "function",
            DataType::Error => "error",
        }
    }
}

impl fmt::Display for DataType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
