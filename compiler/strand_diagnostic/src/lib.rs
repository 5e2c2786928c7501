//! Strand diagnostics.
//!
//! Every lowering failure is converted into a [`Diagnostic`] carrying a
//! stable [`ErrorCode`], labelled source spans and free-form notes.
//! [`render`] turns one into plain text with `line:col` positions.

mod diagnostic;
mod error_code;
mod render;

pub use diagnostic::{Diagnostic, Label, Severity};
pub use error_code::ErrorCode;
pub use render::{render, LineOffsetTable};
