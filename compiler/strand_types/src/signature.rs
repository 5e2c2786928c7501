//! Callable signatures used for overload matching.

use std::fmt::Write;

use strand_ir::{Constant, Name, StringInterner};

use crate::{Idx, Pool};

/// One formal parameter.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Argument {
    pub name: Name,
    pub ty: Idx,
    /// Fixed length of a broadcastable list parameter (`int[2]`). A scalar
    /// passed for such a parameter is repeated this many times.
    pub arity: Option<u32>,
    pub default: Option<Constant>,
    pub kwarg_only: bool,
}

impl Argument {
    pub fn new(name: Name, ty: Idx) -> Self {
        Argument {
            name,
            ty,
            arity: None,
            default: None,
            kwarg_only: false,
        }
    }

    #[must_use]
    pub fn with_arity(mut self, arity: u32) -> Self {
        self.arity = Some(arity);
        self
    }

    #[must_use]
    pub fn with_default(mut self, default: Constant) -> Self {
        self.default = Some(default);
        self
    }

    #[must_use]
    pub fn keyword_only(mut self) -> Self {
        self.kwarg_only = true;
        self
    }
}

/// Ordered parameters and results of an operator or compiled function.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FunctionSignature {
    pub name: Name,
    pub arguments: Vec<Argument>,
    pub returns: Vec<Idx>,
    /// Extra positional arguments are accepted and passed through.
    pub is_vararg: bool,
}

impl FunctionSignature {
    pub fn new(name: Name) -> Self {
        FunctionSignature {
            name,
            arguments: Vec::new(),
            returns: Vec::new(),
            is_vararg: false,
        }
    }

    #[must_use]
    pub fn with_argument(mut self, argument: Argument) -> Self {
        self.arguments.push(argument);
        self
    }

    #[must_use]
    pub fn with_return(mut self, ty: Idx) -> Self {
        self.returns.push(ty);
        self
    }

    #[must_use]
    pub fn vararg(mut self) -> Self {
        self.is_vararg = true;
        self
    }

    pub fn argument_index(&self, name: Name) -> Option<usize> {
        self.arguments.iter().position(|a| a.name == name)
    }

    /// Render as `name(int self, int[2] stride=1, *, bool flag=False) -> int`.
    pub fn display(&self, pool: &Pool, interner: &StringInterner) -> String {
        let mut out = String::new();
        out.push_str(interner.lookup(self.name));
        out.push('(');
        let mut seen_kwarg_only = false;
        for (i, arg) in self.arguments.iter().enumerate() {
            if i > 0 {
                out.push_str(", ");
            }
            if arg.kwarg_only && !seen_kwarg_only {
                seen_kwarg_only = true;
                out.push_str("*, ");
            }
            match (arg.arity, pool.list_elem(arg.ty)) {
                (Some(n), Some(elem)) => {
                    let _ = write!(out, "{}[{n}]", pool.format_type(elem));
                }
                _ => out.push_str(&pool.format_type(arg.ty)),
            }
            let _ = write!(out, " {}", interner.lookup(arg.name));
            if let Some(default) = arg.default {
                let _ = write!(out, "={}", default.display(interner));
            }
        }
        if self.is_vararg {
            if !self.arguments.is_empty() {
                out.push_str(", ");
            }
            out.push_str("...");
        }
        out.push_str(") -> ");
        match self.returns.as_slice() {
            [single] => out.push_str(&pool.format_type(*single)),
            many => {
                out.push('(');
                for (i, &ty) in many.iter().enumerate() {
                    if i > 0 {
                        out.push_str(", ");
                    }
                    out.push_str(&pool.format_type(ty));
                }
                out.push(')');
            }
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn display_covers_every_argument_form() {
        let interner = StringInterner::new();
        let mut pool = Pool::new();
        let list_int = pool.list(Idx::INT);
        let sig = FunctionSignature::new(interner.intern("pool2d"))
            .with_argument(Argument::new(interner.intern("self"), Idx::TENSOR))
            .with_argument(
                Argument::new(interner.intern("stride"), list_int)
                    .with_arity(2)
                    .with_default(Constant::Int(1)),
            )
            .with_argument(
                Argument::new(interner.intern("ceil"), Idx::BOOL)
                    .with_default(Constant::Bool(false))
                    .keyword_only(),
            )
            .with_return(Idx::TENSOR);
        assert_eq!(
            sig.display(&pool, &interner),
            "pool2d(Tensor self, int[2] stride=1, *, bool ceil=False) -> Tensor"
        );
        assert_eq!(sig.argument_index(interner.intern("ceil")), Some(2));
        assert_eq!(sig.argument_index(interner.intern("missing")), None);
    }

    #[test]
    fn display_vararg_and_multiple_returns() {
        let interner = StringInterner::new();
        let pool = Pool::new();
        let sig = FunctionSignature::new(interner.intern("format"))
            .with_argument(Argument::new(interner.intern("self"), Idx::STR))
            .vararg()
            .with_return(Idx::STR)
            .with_return(Idx::INT);
        assert_eq!(
            sig.display(&pool, &interner),
            "format(str self, ...) -> (str, int)"
        );
    }
}
