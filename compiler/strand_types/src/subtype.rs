//! Subtyping, shape erasure and exact unification.

use smallvec::SmallVec;

use crate::{Idx, Pool, Tag, TypeFlags};

impl Pool {
    /// Whether a value of type `sub` may be used where `sup` is expected.
    ///
    /// Rules: reflexive; `int` and `float` are `number`; a shaped tensor is
    /// a `Tensor`; `None` and `T` are `Optional[T]`; tuples and futures are
    /// covariant; lists are invariant except for tensor shape erasure.
    pub fn is_subtype(&self, sub: Idx, sup: Idx) -> bool {
        if sub == sup {
            return true;
        }
        match (self.tag(sub), self.tag(sup)) {
            (Tag::Int | Tag::Float, Tag::Number) | (Tag::ShapedTensor, Tag::Tensor) => true,
            (_, Tag::Optional) => {
                let Some(inner) = self.optional_inner(sup) else {
                    return false;
                };
                if sub == Idx::NONE {
                    return true;
                }
                match self.optional_inner(sub) {
                    Some(sub_inner) => self.is_subtype(sub_inner, inner),
                    None => self.is_subtype(sub, inner),
                }
            }
            (Tag::Tuple, Tag::Tuple) => {
                let (Some(a), Some(b)) = (self.tuple_elems(sub), self.tuple_elems(sup)) else {
                    return false;
                };
                a.len() == b.len() && a.iter().zip(b).all(|(&x, &y)| self.is_subtype(x, y))
            }
            (Tag::Future, Tag::Future) => match (self.future_inner(sub), self.future_inner(sup)) {
                (Some(a), Some(b)) => self.is_subtype(a, b),
                _ => false,
            },
            (Tag::List, Tag::List) => match (self.list_elem(sub), self.list_elem(sup)) {
                (Some(a), Some(b)) => self.is_tensor(a) && b == Idx::TENSOR,
                _ => false,
            },
            _ => false,
        }
    }

    /// `ty` with every known tensor rank forgotten.
    pub fn unshaped(&mut self, ty: Idx) -> Idx {
        if !self.flags(ty).contains(TypeFlags::HAS_SHAPE) {
            return ty;
        }
        match self.tag(ty) {
            Tag::ShapedTensor => Idx::TENSOR,
            Tag::List => {
                let elem = self.list_elem(ty).unwrap_or(Idx::TENSOR);
                let elem = self.unshaped(elem);
                self.list(elem)
            }
            Tag::Optional => {
                let inner = self.optional_inner(ty).unwrap_or(Idx::TENSOR);
                let inner = self.unshaped(inner);
                self.optional(inner)
            }
            Tag::Future => {
                let inner = self.future_inner(ty).unwrap_or(Idx::TENSOR);
                let inner = self.unshaped(inner);
                self.future(inner)
            }
            Tag::Tuple => {
                let elems: SmallVec<[Idx; 8]> =
                    self.tuple_elems(ty).unwrap_or(&[]).iter().copied().collect();
                let erased: SmallVec<[Idx; 8]> =
                    elems.into_iter().map(|e| self.unshaped(e)).collect();
                self.tuple(&erased)
            }
            _ => ty,
        }
    }

    /// Exact unification of two types, as used when merging branch results.
    ///
    /// Identical types unify to themselves. Types that differ only in tensor
    /// ranks unify to their shape-erased form. Nothing else unifies: there
    /// is no widening to `number` or `Optional`.
    pub fn unify_types(&mut self, a: Idx, b: Idx) -> Option<Idx> {
        if a == b {
            return Some(a);
        }
        let ua = self.unshaped(a);
        let ub = self.unshaped(b);
        (ua == ub).then_some(ua)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn numbers_and_tensors() {
        let mut pool = Pool::new();
        let shaped = pool.shaped_tensor(2);
        assert!(pool.is_subtype(Idx::INT, Idx::NUMBER));
        assert!(pool.is_subtype(Idx::FLOAT, Idx::NUMBER));
        assert!(!pool.is_subtype(Idx::NUMBER, Idx::INT));
        assert!(pool.is_subtype(shaped, Idx::TENSOR));
        assert!(!pool.is_subtype(Idx::TENSOR, shaped));
        assert!(!pool.is_subtype(Idx::INT, Idx::FLOAT));
    }

    #[test]
    fn optional_accepts_none_and_inner() {
        let mut pool = Pool::new();
        let opt = pool.optional(Idx::INT);
        let opt_num = pool.optional(Idx::NUMBER);
        assert!(pool.is_subtype(Idx::NONE, opt));
        assert!(pool.is_subtype(Idx::INT, opt));
        assert!(pool.is_subtype(opt, opt_num));
        assert!(!pool.is_subtype(opt, Idx::INT));
        assert!(!pool.is_subtype(Idx::STR, opt));
    }

    #[test]
    fn containers() {
        let mut pool = Pool::new();
        let shaped = pool.shaped_tensor(1);
        let t_sub = pool.tuple(&[Idx::INT, shaped]);
        let t_sup = pool.tuple(&[Idx::NUMBER, Idx::TENSOR]);
        let t_short = pool.tuple(&[Idx::NUMBER]);
        assert!(pool.is_subtype(t_sub, t_sup));
        assert!(!pool.is_subtype(t_sub, t_short));

        let list_int = pool.list(Idx::INT);
        let list_num = pool.list(Idx::NUMBER);
        assert!(!pool.is_subtype(list_int, list_num));
        let list_shaped = pool.list(shaped);
        let list_tensor = pool.list(Idx::TENSOR);
        assert!(pool.is_subtype(list_shaped, list_tensor));
    }

    #[test]
    fn unshaped_erases_nested_ranks() {
        let mut pool = Pool::new();
        let shaped = pool.shaped_tensor(4);
        let list = pool.list(shaped);
        let tup = pool.tuple(&[Idx::INT, list]);
        let list_tensor = pool.list(Idx::TENSOR);
        let expected = pool.tuple(&[Idx::INT, list_tensor]);
        assert_eq!(pool.unshaped(tup), expected);
        assert_eq!(pool.unshaped(Idx::FLOAT), Idx::FLOAT);
    }

    #[test]
    fn unify_is_exact_modulo_shapes() {
        let mut pool = Pool::new();
        let r2 = pool.shaped_tensor(2);
        let r3 = pool.shaped_tensor(3);
        assert_eq!(pool.unify_types(Idx::INT, Idx::INT), Some(Idx::INT));
        assert_eq!(pool.unify_types(r2, r3), Some(Idx::TENSOR));
        assert_eq!(pool.unify_types(r2, Idx::TENSOR), Some(Idx::TENSOR));
        assert_eq!(pool.unify_types(Idx::INT, Idx::FLOAT), None);
        assert_eq!(pool.unify_types(Idx::NONE, Idx::INT), None);
    }
}
