//! Strand graph IR.
//!
//! A compiled function is a [`Graph`]: one root block whose inputs are the
//! function parameters and whose outputs are its results. Control constructs
//! are nodes owning nested blocks:
//!
//! - **If**: input is the condition; two blocks (then, else) with no inputs;
//!   each block's outputs line up with the node's outputs.
//! - **Loop**: inputs are `(max_trip_count, initial_condition, carried...)`;
//!   one body block whose inputs are `(trip_counter, carried...)` and whose
//!   outputs are `(continue_condition, carried...)`; node outputs are the
//!   final carried values.
//! - **Fork**: inputs are captured outer values; the body lives in a
//!   detached sub-graph whose inputs line up with the node's inputs.
//!
//! Storage is arena-based: values, nodes and blocks are addressed by
//! [`ValueId`], [`NodeId`] and [`BlockId`]. Every value has exactly one
//! definition and an immutable type.

mod builder;
mod clone;
mod graph;
mod ids;
mod kind;
mod print;

pub use builder::GraphBuilder;
pub use clone::{clone_block_body, map_value, OuterValues};
pub use graph::{BlockData, Graph, NodeData, ValueData, ValueDef};
pub use ids::{BlockId, NodeId, ValueId};
pub use kind::NodeKind;
pub use print::GraphDisplay;
