//! Compound type constructors.

use crate::{Idx, Pool, Tag};

impl Pool {
    /// `List[elem]`
    pub fn list(&mut self, elem: Idx) -> Idx {
        self.intern(Tag::List, elem.raw())
    }

    /// `Optional[inner]`
    pub fn optional(&mut self, inner: Idx) -> Idx {
        self.intern(Tag::Optional, inner.raw())
    }

    /// `Future[inner]`
    pub fn future(&mut self, inner: Idx) -> Idx {
        self.intern(Tag::Future, inner.raw())
    }

    /// `Tuple[elems...]`; the empty tuple is a valid type.
    pub fn tuple(&mut self, elems: &[Idx]) -> Idx {
        self.intern_tuple(elems)
    }

    /// Tensor whose rank is known.
    pub fn shaped_tensor(&mut self, rank: u32) -> Idx {
        self.intern(Tag::ShapedTensor, rank)
    }

    /// Type variable named `name`. Same name, same variable.
    pub fn var(&mut self, name: &str) -> Idx {
        self.intern_var(name)
    }
}
