//! Node operation kinds.

use strand_ir::{Constant, Name, StringInterner};

/// What a node computes.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum NodeKind {
    /// Literal; no inputs, one output.
    Constant(Constant),
    /// A resolved operator call. Inputs are in signature order.
    Call(Name),
    If,
    Loop,
    Fork,
    TupleConstruct,
    /// One output per tuple element.
    TupleUnpack,
    TupleIndex(u32),
    /// Elements `start..end`, already clamped to the tuple length.
    TupleSlice {
        start: u32,
        end: u32,
    },
    ListConstruct,
    /// One output per element; the element count was fixed at compile time.
    ListUnpack,
    /// Placeholder for an absent tensor argument or index slot.
    Undefined,
    /// Zero-dimensional tensor read as a number.
    ImplicitTensorToNum,
    Print,
    /// Aborts execution; input is the message string.
    RaiseException,
}

impl NodeKind {
    /// Render the kind and its attributes, e.g. `TupleIndex[index=1]`.
    pub fn describe(&self, interner: &StringInterner) -> String {
        match self {
            NodeKind::Constant(c) => format!("Constant[value={}]", c.display(interner)),
            NodeKind::Call(name) => interner.lookup(*name).to_owned(),
            NodeKind::If => "If".to_owned(),
            NodeKind::Loop => "Loop".to_owned(),
            NodeKind::Fork => "Fork".to_owned(),
            NodeKind::TupleConstruct => "TupleConstruct".to_owned(),
            NodeKind::TupleUnpack => "TupleUnpack".to_owned(),
            NodeKind::TupleIndex(i) => format!("TupleIndex[index={i}]"),
            NodeKind::TupleSlice { start, end } => format!("TupleSlice[beg={start}, end={end}]"),
            NodeKind::ListConstruct => "ListConstruct".to_owned(),
            NodeKind::ListUnpack => "ListUnpack".to_owned(),
            NodeKind::Undefined => "Undefined".to_owned(),
            NodeKind::ImplicitTensorToNum => "ImplicitTensorToNum".to_owned(),
            NodeKind::Print => "Print".to_owned(),
            NodeKind::RaiseException => "RaiseException".to_owned(),
        }
    }
}
