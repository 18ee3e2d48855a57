use serde::{Deserialize, Serialize};
use std::fmt;

/// Position of a node in the source file (1-based; line 0 marks builtins)
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Location {
    pub line: usize,
    pub column: usize,
}

impl Location {
    /// Location of compiler-provided definitions such as `Object`
    pub const BUILTIN: Location = Location { line: 0, column: 0 };

    pub const fn new(line: usize, column: usize) -> Self {
        Location { line, column }
    }

    pub fn is_builtin(&self) -> bool {
        self.line == 0
    }
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_builtin() {
            f.write_str("<builtin>")
        } else {
            write!(f, "{}:{}", self.line, self.column)
        }
    }
}
