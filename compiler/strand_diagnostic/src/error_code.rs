use std::fmt;

/// Error codes for lowering diagnostics.
///
/// Format: E#### where the first digit names the family:
/// - E1xxx: name and scope errors
/// - E2xxx: type errors
/// - E3xxx: call resolution errors
/// - E4xxx: constructs without a lowering
/// - E9xxx: internal compiler errors
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
pub enum ErrorCode {
    // Scope (E1xxx)
    /// Name is not bound anywhere
    E1001,
    /// Rebinding of a name from an enclosing scope is not allowed
    E1002,

    // Types (E2xxx)
    /// Type mismatch
    E2001,
    /// Tuple/list unpack arity mismatch
    E2002,
    /// Constant index out of range
    E2003,

    // Calls (E3xxx)
    /// No overload accepts the arguments
    E3001,

    // Constructs (E4xxx)
    /// Syntax accepted by the parser that has no lowering
    E4001,

    // Internal (E9xxx)
    /// Internal invariant violated
    E9001,
}

impl ErrorCode {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorCode::E1001 => "E1001",
            ErrorCode::E1002 => "E1002",
            ErrorCode::E2001 => "E2001",
            ErrorCode::E2002 => "E2002",
            ErrorCode::E2003 => "E2003",
            ErrorCode::E3001 => "E3001",
            ErrorCode::E4001 => "E4001",
            ErrorCode::E9001 => "E9001",
        }
    }

    /// One-line summary of what the code means.
    pub fn description(&self) -> &'static str {
        match self {
            ErrorCode::E1001 => "undefined name",
            ErrorCode::E1002 => "invalid reassignment",
            ErrorCode::E2001 => "type mismatch",
            ErrorCode::E2002 => "unpack arity mismatch",
            ErrorCode::E2003 => "index out of range",
            ErrorCode::E3001 => "unresolved overload",
            ErrorCode::E4001 => "unsupported construct",
            ErrorCode::E9001 => "internal compiler error",
        }
    }

    pub fn is_internal(&self) -> bool {
        matches!(self, ErrorCode::E9001)
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
