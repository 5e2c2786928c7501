//! Operator and library-function tables consulted by call resolution.

mod parse;
mod standard;

use rustc_hash::{FxHashMap, FxHashSet};
use strand_graph::Graph;
use strand_ir::{Name, StringInterner};
use strand_types::{FunctionSignature, Pool};

pub use parse::{parse_declaration, DeclarationError};
pub use standard::STANDARD_DECLARATIONS;

/// Source of candidate callees for a name.
pub trait OperatorRegistry {
    /// Builtin overloads for `name`, in priority order.
    fn overloads(&self, name: Name) -> &[FunctionSignature];

    /// Script-defined functions for `name`, tried after builtins.
    fn library_functions(&self, name: Name) -> &[LibraryFunction];

    /// Whether overload `index` of `name` has a runtime implementation.
    fn has_implementation(&self, name: Name, index: usize) -> bool;
}

/// A previously compiled function that is inlined at each call site.
///
/// `body` inputs line up with `signature.arguments`.
#[derive(Clone, Debug)]
pub struct LibraryFunction {
    pub signature: FunctionSignature,
    pub body: Graph,
}

/// In-memory [`OperatorRegistry`].
#[derive(Clone, Debug, Default)]
pub struct Registry {
    operators: FxHashMap<Name, Vec<FunctionSignature>>,
    unimplemented: FxHashSet<(Name, usize)>,
    library: FxHashMap<Name, Vec<LibraryFunction>>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    /// A registry holding every entry of [`STANDARD_DECLARATIONS`].
    pub fn standard(pool: &mut Pool, interner: &StringInterner) -> Self {
        let mut registry = Registry::new();
        for decl in STANDARD_DECLARATIONS {
            // The standard table is fixed; a parse failure is a bug in it.
            registry
                .declare(decl, pool, interner)
                .unwrap_or_else(|e| panic!("bad standard declaration `{decl}`: {e}"));
        }
        registry
    }

    pub fn register(&mut self, signature: FunctionSignature) {
        self.operators
            .entry(signature.name)
            .or_default()
            .push(signature);
    }

    /// Register a signature that call resolution may select but that has no
    /// runtime implementation behind it.
    pub fn register_schema_only(&mut self, signature: FunctionSignature) {
        let name = signature.name;
        self.register(signature);
        let index = self.operators[&name].len() - 1;
        self.unimplemented.insert((name, index));
    }

    /// Parse and register a declaration such as
    /// `select(t[] list, int idx) -> t`.
    pub fn declare(
        &mut self,
        decl: &str,
        pool: &mut Pool,
        interner: &StringInterner,
    ) -> Result<(), DeclarationError> {
        let signature = parse_declaration(decl, pool, interner)?;
        self.register(signature);
        Ok(())
    }

    pub fn register_library(&mut self, function: LibraryFunction) {
        self.library
            .entry(function.signature.name)
            .or_default()
            .push(function);
    }
}

impl OperatorRegistry for Registry {
    fn overloads(&self, name: Name) -> &[FunctionSignature] {
        self.operators.get(&name).map_or(&[], Vec::as_slice)
    }

    fn library_functions(&self, name: Name) -> &[LibraryFunction] {
        self.library.get(&name).map_or(&[], Vec::as_slice)
    }

    fn has_implementation(&self, name: Name, index: usize) -> bool {
        !self.unimplemented.contains(&(name, index))
    }
}

#[cfg(test)]
mod tests;
