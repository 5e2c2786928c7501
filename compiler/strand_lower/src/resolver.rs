//! Host hooks for names the function does not define itself.

use strand_ir::{Name, Span};

use crate::SugaredValue;

/// Opaque reference to a host object (a module, a namespace, ...).
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct ObjectHandle(pub u32);

/// Resolves free names and attributes of host objects.
///
/// Consulted after local bindings and builtins. Values handed back must be
/// compile-time entities (callables, projections, the none marker); graph
/// values only exist inside the function being compiled.
pub trait NameResolver {
    fn resolve(&self, name: Name, span: Span) -> Option<SugaredValue>;

    /// `object.field`
    fn attr(&self, object: ObjectHandle, field: Name, span: Span) -> Option<SugaredValue> {
        let _ = (object, field, span);
        None
    }

    /// Elements of a host object that can be iterated at compile time, for
    /// unrolled `for` loops.
    fn as_sequence(&self, object: ObjectHandle) -> Option<Vec<SugaredValue>> {
        let _ = object;
        None
    }

    /// Human-readable kind, used in diagnostics.
    fn describe(&self, object: ObjectHandle) -> String {
        let _ = object;
        "host object".to_owned()
    }
}

/// Resolves nothing.
#[derive(Copy, Clone, Debug, Default)]
pub struct NoResolver;

impl NameResolver for NoResolver {
    fn resolve(&self, _name: Name, _span: Span) -> Option<SugaredValue> {
        None
    }
}
