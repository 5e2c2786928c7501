//! Strand IR - source-facing data structures.
//!
//! This crate holds what the lowering consumes from the outside world:
//! - Spans for source locations
//! - Names for interned identifiers
//! - Literal constants
//! - The annotated script tree produced by an external parser
//!
//! # Design Philosophy
//!
//! - **Intern Everything**: Strings → Name(u32)
//! - **Flatten Everything**: No `Box<Expr>`, use `ExprId(u32)` / `StmtId(u32)` indices
//!
//! Constants that contain floats store them as u64 bits so they stay `Eq + Hash`.

/// Compile-time assertion that a type has a specific size.
///
/// Used to prevent accidental size regressions in frequently-allocated types.
#[macro_export]
macro_rules! static_assert_size {
    ($ty:ty, $size:expr) => {
        const _: [(); $size] = [(); ::std::mem::size_of::<$ty>()];
    };
}

pub mod ast;
mod constant;
mod interner;
mod name;
mod span;

pub use ast::{
    BinaryOp, Def, Expr, ExprId, ExprKind, KeywordArg, Param, ScriptArena, Stmt, StmtId, StmtKind,
    UnaryOp,
};
pub use constant::{Constant, ConstantDisplay};
pub use interner::StringInterner;
pub use name::Name;
pub use span::{Span, SpanError};

static_assert_size!(Span, 8);
static_assert_size!(Name, 4);
static_assert_size!(ExprId, 4);
