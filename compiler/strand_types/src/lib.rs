//! Strand type system.
//!
//! Types are interned in a [`Pool`] and referenced by [`Idx`]; structural
//! equality is index equality. On top of the pool this crate provides:
//! - subtyping, shape erasure and exact unification ([`Pool::is_subtype`],
//!   [`Pool::unshaped`], [`Pool::unify_types`])
//! - type-variable matching for generic signatures ([`TypeEnv`],
//!   [`match_type_variables`], [`eval_type_variables`])
//! - the rebind predicate used by the scope stack ([`RebindPolicy`])
//! - callable signatures ([`FunctionSignature`], [`Argument`])

mod flags;
mod idx;
mod pool;
mod rebind;
mod signature;
mod subtype;
mod tag;
mod unify;

pub use flags::TypeFlags;
pub use idx::Idx;
pub use pool::Pool;
pub use rebind::{RebindPolicy, ShapeErased};
pub use signature::{Argument, FunctionSignature};
pub use tag::Tag;
pub use unify::{eval_type_variables, match_type_variables, MatchError, TypeEnv};
