//! Compile-time values bound to names.
//!
//! Not everything a name can refer to is a graph value: builtins, methods
//! bound to a receiver and host-provided objects only exist while lowering.
//! [`SugaredValue`] is the closed set of such things.

use strand_graph::{Graph, ValueId};
use strand_ir::Name;
use strand_types::{Idx, Pool};

use crate::resolver::ObjectHandle;

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SugaredValue {
    /// A graph value.
    Plain(ValueId),
    /// The value of a call that returns nothing, e.g. `print(...)`.
    NoneMarker,
    Callable(Callable),
    /// A host object whose attributes are resolved through the resolver.
    Projection(ObjectHandle),
}

/// Something that can appear in call position.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Callable {
    /// Every operator overload and library function registered under `name`.
    /// `receiver` is bound to the `self` parameter when present.
    Function {
        name: Name,
        receiver: Option<ValueId>,
    },
    /// `int(x)`, `float(x)` or `bool(x)`.
    Cast(CastKind),
    Special(SpecialForm),
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum CastKind {
    Int,
    Float,
    Bool,
}

impl CastKind {
    pub fn target(self) -> Idx {
        match self {
            CastKind::Int => Idx::INT,
            CastKind::Float => Idx::FLOAT,
            CastKind::Bool => Idx::BOOL,
        }
    }

    /// Operator that performs the conversion.
    pub fn op_name(self) -> &'static str {
        match self {
            CastKind::Int => "Int",
            CastKind::Float => "Float",
            CastKind::Bool => "Bool",
        }
    }
}

/// Builtins whose arguments are not ordinary values.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum SpecialForm {
    Print,
    GetAttr,
    IsInstance,
    Fork,
    Annotate,
    Range,
}

/// Whether an expression statically evaluates to `None`.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum NoneStatus {
    Always,
    Maybe,
    Never,
}

impl SugaredValue {
    pub fn function(name: Name) -> Self {
        SugaredValue::Callable(Callable::Function {
            name,
            receiver: None,
        })
    }

    pub fn as_plain(&self) -> Option<ValueId> {
        match self {
            SugaredValue::Plain(v) => Some(*v),
            _ => None,
        }
    }

    /// Description used when something that is not a value is used as one.
    pub fn kind_name(&self) -> &'static str {
        match self {
            SugaredValue::Plain(_) => "value",
            SugaredValue::NoneMarker => "None",
            SugaredValue::Callable(Callable::Function { .. }) => "function",
            SugaredValue::Callable(Callable::Cast(_)) => "cast",
            SugaredValue::Callable(Callable::Special(form)) => match form {
                SpecialForm::Print => "builtin print",
                SpecialForm::GetAttr => "builtin getattr",
                SpecialForm::IsInstance => "builtin isinstance",
                SpecialForm::Fork => "builtin fork",
                SpecialForm::Annotate => "builtin annotate",
                SpecialForm::Range => "builtin range",
            },
            SugaredValue::Projection(_) => "host object",
        }
    }

    pub fn none_status(&self, graph: &Graph, pool: &Pool) -> NoneStatus {
        match self {
            SugaredValue::NoneMarker => NoneStatus::Always,
            SugaredValue::Plain(v) => {
                let ty = graph.value_type(*v);
                if ty == Idx::NONE {
                    NoneStatus::Always
                } else if pool.optional_inner(ty).is_some() {
                    NoneStatus::Maybe
                } else {
                    NoneStatus::Never
                }
            }
            SugaredValue::Callable(_) | SugaredValue::Projection(_) => NoneStatus::Never,
        }
    }
}

/// Builtins visible in every function unless shadowed by a local binding.
pub fn builtin(name: &str) -> Option<SugaredValue> {
    let callable = match name {
        "print" => Callable::Special(SpecialForm::Print),
        "getattr" => Callable::Special(SpecialForm::GetAttr),
        "isinstance" => Callable::Special(SpecialForm::IsInstance),
        "fork" => Callable::Special(SpecialForm::Fork),
        "annotate" => Callable::Special(SpecialForm::Annotate),
        "range" => Callable::Special(SpecialForm::Range),
        "int" => Callable::Cast(CastKind::Int),
        "float" => Callable::Cast(CastKind::Float),
        "bool" => Callable::Cast(CastKind::Bool),
        _ => return None,
    };
    Some(SugaredValue::Callable(callable))
}
