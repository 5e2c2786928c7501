//! Lowering failures.
//!
//! Compilation of a function stops at the first error; there is no local
//! recovery. Every variant carries the span it was raised at.

use strand_diagnostic::{Diagnostic, ErrorCode};
use strand_ir::Span;

/// Why a rebind of an enclosing-scope name was rejected.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ReassignReason {
    /// One side is a compiler concept (callable, module, ...), not a value.
    NotFirstClass { kind: String },
    /// The new value's type does not fit the old binding.
    IncompatibleType { previous: String, found: String },
}

impl ReassignReason {
    fn message(&self, name: &str) -> String {
        match self {
            ReassignReason::NotFirstClass { kind } => format!(
                "cannot re-assign '{name}' because it is a {kind}, not a first-class value; \
                 only first-class values can be reassigned"
            ),
            ReassignReason::IncompatibleType { previous, found } => format!(
                "variable '{name}' previously had type {previous} but is now being assigned \
                 to a value of type {found}"
            ),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum LowerError {
    #[error("undefined value {name}")]
    UndefinedName { name: String, span: Span },

    #[error("{}", .reason.message(.name))]
    Reassignment {
        name: String,
        reason: ReassignReason,
        span: Span,
    },

    #[error("{message}")]
    TypeMismatch {
        message: String,
        span: Span,
        /// Earlier location the mismatch originates from, if any.
        related: Option<Span>,
    },

    #[error("{}", overload_message(.name, .failures))]
    UnresolvedOverload {
        name: String,
        /// One entry per rejected candidate; empty when nothing is registered.
        failures: Vec<String>,
        span: Span,
    },

    #[error("{message}")]
    Unpack { message: String, span: Span },

    #[error("tuple index out of range: tuple has length {len} and index is {index}")]
    IndexOutOfRange { len: usize, index: i64, span: Span },

    #[error("{message}")]
    Unsupported { message: String, span: Span },

    #[error("internal error: {message}")]
    Internal { message: String, span: Span },
}

fn overload_message(name: &str, failures: &[String]) -> String {
    if failures.is_empty() {
        format!("unknown builtin op {name}")
    } else {
        format!(
            "arguments for call to {name} are not valid:\n{}",
            failures.join("\n")
        )
    }
}

impl LowerError {
    pub fn type_mismatch(span: Span, message: impl Into<String>) -> Self {
        LowerError::TypeMismatch {
            message: message.into(),
            span,
            related: None,
        }
    }

    pub fn unsupported(span: Span, message: impl Into<String>) -> Self {
        LowerError::Unsupported {
            message: message.into(),
            span,
        }
    }

    pub fn unpack(span: Span, message: impl Into<String>) -> Self {
        LowerError::Unpack {
            message: message.into(),
            span,
        }
    }

    pub fn internal(span: Span, message: impl Into<String>) -> Self {
        LowerError::Internal {
            message: message.into(),
            span,
        }
    }

    pub fn span(&self) -> Span {
        match self {
            LowerError::UndefinedName { span, .. }
            | LowerError::Reassignment { span, .. }
            | LowerError::TypeMismatch { span, .. }
            | LowerError::UnresolvedOverload { span, .. }
            | LowerError::Unpack { span, .. }
            | LowerError::IndexOutOfRange { span, .. }
            | LowerError::Unsupported { span, .. }
            | LowerError::Internal { span, .. } => *span,
        }
    }

    pub fn code(&self) -> ErrorCode {
        match self {
            LowerError::UndefinedName { .. } => ErrorCode::E1001,
            LowerError::Reassignment { .. } => ErrorCode::E1002,
            LowerError::TypeMismatch { .. } => ErrorCode::E2001,
            LowerError::Unpack { .. } => ErrorCode::E2002,
            LowerError::IndexOutOfRange { .. } => ErrorCode::E2003,
            LowerError::UnresolvedOverload { .. } => ErrorCode::E3001,
            LowerError::Unsupported { .. } => ErrorCode::E4001,
            LowerError::Internal { .. } => ErrorCode::E9001,
        }
    }

    pub fn to_diagnostic(&self) -> Diagnostic {
        let diag = Diagnostic::error(self.code()).with_message(self.to_string());
        match self {
            LowerError::UndefinedName { span, .. } => {
                diag.with_label(*span, "not found in this scope")
            }
            LowerError::Reassignment { span, reason, .. } => {
                let diag = diag.with_label(*span, "reassigned here");
                match reason {
                    ReassignReason::IncompatibleType { previous, .. }
                        if previous.starts_with("List[") =>
                    {
                        diag.with_note(
                            "empty lists default to List[Tensor]; use annotate(List[T], []) \
                             to create an empty list of another type",
                        )
                    }
                    _ => diag,
                }
            }
            LowerError::TypeMismatch { span, related, .. } => {
                let diag = diag.with_label(*span, "type mismatch here");
                match related {
                    Some(origin) => diag.with_secondary_label(*origin, "types diverge here"),
                    None => diag,
                }
            }
            LowerError::UnresolvedOverload { span, .. } => {
                diag.with_label(*span, "no matching overload")
            }
            LowerError::Unpack { span, .. } => diag.with_label(*span, "cannot unpack"),
            LowerError::IndexOutOfRange { span, .. } => diag.with_label(*span, "out of range"),
            LowerError::Unsupported { span, .. } => diag.with_label(*span, "not supported"),
            LowerError::Internal { span, .. } => diag
                .with_label(*span, "while lowering this")
                .with_note("this is a compiler bug"),
        }
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn messages() {
        let err = LowerError::Reassignment {
            name: "x".into(),
            reason: ReassignReason::IncompatibleType {
                previous: "int".into(),
                found: "float".into(),
            },
            span: Span::new(3, 4),
        };
        assert_eq!(
            err.to_string(),
            "variable 'x' previously had type int but is now being assigned to a value of type float"
        );
        assert_eq!(err.code(), ErrorCode::E1002);

        let unknown = LowerError::UnresolvedOverload {
            name: "frob".into(),
            failures: vec![],
            span: Span::DUMMY,
        };
        assert_eq!(unknown.to_string(), "unknown builtin op frob");
    }

    #[test]
    fn diagnostic_carries_related_span() {
        let err = LowerError::TypeMismatch {
            message: "bad".into(),
            span: Span::new(10, 12),
            related: Some(Span::new(0, 5)),
        };
        let diag = err.to_diagnostic();
        assert_eq!(diag.code, ErrorCode::E2001);
        assert_eq!(diag.primary_span(), Some(Span::new(10, 12)));
        assert_eq!(diag.labels.len(), 2);
        assert!(!diag.labels[1].is_primary);
    }

    #[test]
    fn list_reassignment_gets_annotate_hint() {
        let err = LowerError::Reassignment {
            name: "xs".into(),
            reason: ReassignReason::IncompatibleType {
                previous: "List[Tensor]".into(),
                found: "List[int]".into(),
            },
            span: Span::DUMMY,
        };
        assert_eq!(err.to_diagnostic().notes.len(), 1);
    }
}
