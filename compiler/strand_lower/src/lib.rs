//! Lowering of annotated script functions into strand graph IR.
//!
//! [`compile_function`] walks one [`Def`] and builds a [`Graph`]:
//!
//! - names are tracked by a stack of lexical frames; loop bodies turn reads
//!   of outer values into loop-carried block inputs
//! - calls are resolved against an [`OperatorRegistry`] in two passes, the
//!   second allowing implicit conversions; library functions are inlined
//! - `if`/`while`/`for` become `If` and `Loop` nodes; `for` over a tuple is
//!   unrolled; `fork(f, ...)` becomes a `Fork` node with a lifted sub-graph
//!
//! Compilation stops at the first error.

mod annotations;
mod error;
mod lower;
mod options;
mod registry;
mod resolver;
mod scope;
mod stack;
mod sugared;

#[cfg(test)]
mod test_helpers;

use std::sync::Once;

use strand_graph::Graph;
use strand_ir::{Def, ScriptArena, StringInterner};
use strand_types::{FunctionSignature, Pool, RebindPolicy, ShapeErased};

pub use error::{LowerError, ReassignReason};
pub use options::LowerOptions;
pub use registry::{
    parse_declaration, DeclarationError, LibraryFunction, OperatorRegistry, Registry,
    STANDARD_DECLARATIONS,
};
pub use resolver::{NameResolver, NoResolver, ObjectHandle};
pub use stack::ensure_sufficient_stack;
pub use sugared::{builtin, Callable, CastKind, NoneStatus, SpecialForm, SugaredValue};

/// Shared, read-only inputs to compilation.
#[derive(Clone, Copy)]
pub struct Session<'a> {
    pub interner: &'a StringInterner,
    pub registry: &'a dyn OperatorRegistry,
    pub resolver: &'a dyn NameResolver,
    pub rebind: &'a dyn RebindPolicy,
    pub options: &'a LowerOptions,
}

static DEFAULT_OPTIONS: LowerOptions = LowerOptions {
    implicit_conversions: true,
    intern_constants: true,
    max_unroll: 1024,
};

impl<'a> Session<'a> {
    pub fn new(interner: &'a StringInterner, registry: &'a dyn OperatorRegistry) -> Self {
        Session {
            interner,
            registry,
            resolver: &NoResolver,
            rebind: &ShapeErased,
            options: &DEFAULT_OPTIONS,
        }
    }

    #[must_use]
    pub fn with_resolver(mut self, resolver: &'a dyn NameResolver) -> Self {
        self.resolver = resolver;
        self
    }

    #[must_use]
    pub fn with_rebind_policy(mut self, rebind: &'a dyn RebindPolicy) -> Self {
        self.rebind = rebind;
        self
    }

    #[must_use]
    pub fn with_options(mut self, options: &'a LowerOptions) -> Self {
        self.options = options;
        self
    }
}

/// Result of compiling one function.
#[derive(Clone, Debug)]
pub struct CompiledFunction {
    pub graph: Graph,
    /// Parameters as declared (minus a bound receiver) and the result types.
    pub signature: FunctionSignature,
}

/// Compile `def` into a graph.
///
/// `receiver`, when given, is bound to the first parameter, which then does
/// not become a graph input. It must be a compile-time value such as a
/// [`SugaredValue::Projection`].
///
/// # Errors
///
/// Returns the first [`LowerError`] encountered.
pub fn compile_function(
    session: &Session<'_>,
    pool: &mut Pool,
    arena: &ScriptArena,
    def: &Def,
    receiver: Option<SugaredValue>,
) -> Result<CompiledFunction, LowerError> {
    lower::Lowerer::new(session, pool, arena).compile(def, receiver)
}

static TRACING_INIT: Once = Once::new();

/// Initialize tracing for debug output.
///
/// Safe to call multiple times. Enable with `RUST_LOG=strand_lower=debug`
/// or `RUST_LOG=strand_lower=trace`.
pub fn init_tracing() {
    TRACING_INIT.call_once(|| {
        use tracing_subscriber::{fmt, prelude::*, EnvFilter};

        // Only initialize if RUST_LOG is set
        if std::env::var("RUST_LOG").is_ok() {
            let filter = EnvFilter::from_default_env();
            let _ = tracing_subscriber::registry()
                .with(fmt::layer().with_target(true).with_level(true))
                .with(filter)
                .try_init();
        }
    });
}
