//! Source locations attached to AST nodes and TAC instructions.

use std::fmt;

use serde::{Deserialize, Serialize};

/// A position in the original NatureLang source, as reported by the frontend.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceLoc {
    /// 1-based line number. Line 0 means "no location" (synthesized nodes).
    pub line: u32,
    /// 1-based column number.
    pub column: u32,
}

impl SourceLoc {
    /// Creates a location at the given line and column.
    pub fn new(line: u32, column: u32) -> Self {
        SourceLoc { line, column }
    }
}

impl fmt::Display for SourceLoc {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.line, self.column)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_is_line_colon_column() {
        assert_eq!(format!("{}", SourceLoc::new(3, 14)), "3:14");
    }

    #[test]
    fn default_is_zero_zero() {
        let loc = SourceLoc::default();
        assert_eq!(loc.line, 0);
        assert_eq!(loc.column, 0);
    }

    #[test]
    fn serde_roundtrip() {
        let loc = SourceLoc::new(12, 7);
        let json = serde_json::to_string(&loc).unwrap();
        let back: SourceLoc = serde_json::from_str(&json).unwrap();
        assert_eq!(loc, back);
    }
}
