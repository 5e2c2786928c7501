//! Interned type storage.
//!
//! Every distinct type is stored once; constructing the same type twice
//! returns the same [`Idx`]. Primitive types occupy the fixed indices
//! declared on [`Idx`].

mod construct;
mod format;

use rustc_hash::FxHashMap;

use crate::{Idx, Tag, TypeFlags};

#[derive(Copy, Clone, Debug)]
struct Item {
    tag: Tag,
    data: u32,
    flags: TypeFlags,
}

/// Structural key used to deduplicate types.
#[derive(Clone, PartialEq, Eq, Hash)]
enum Key {
    Simple(Tag, u32),
    Tuple(Box<[Idx]>),
    Var(Box<str>),
}

pub struct Pool {
    items: Vec<Item>,
    dedup: FxHashMap<Key, Idx>,
    tuples: Vec<Box<[Idx]>>,
    var_names: Vec<Box<str>>,
}

impl Pool {
    pub fn new() -> Self {
        let mut pool = Pool {
            items: Vec::with_capacity(64),
            dedup: FxHashMap::default(),
            tuples: Vec::new(),
            var_names: Vec::new(),
        };
        // Order must match the constants on `Idx`.
        for tag in [
            Tag::Int,
            Tag::Float,
            Tag::Bool,
            Tag::Str,
            Tag::NoneType,
            Tag::Tensor,
            Tag::Number,
            Tag::Device,
        ] {
            pool.intern(tag, 0);
        }
        debug_assert_eq!(pool.items.len(), Idx::PRIMITIVE_COUNT as usize);
        pool
    }

    pub(crate) fn intern(&mut self, tag: Tag, data: u32) -> Idx {
        let key = Key::Simple(tag, data);
        if let Some(&idx) = self.dedup.get(&key) {
            return idx;
        }
        let flags = match tag {
            Tag::Tensor => TypeFlags::HAS_TENSOR,
            Tag::ShapedTensor => TypeFlags::HAS_TENSOR | TypeFlags::HAS_SHAPE,
            Tag::List | Tag::Optional | Tag::Future => {
                self.flags(Idx::from_raw(data)).propagated()
            }
            _ => TypeFlags::empty(),
        };
        self.push(key, Item { tag, data, flags })
    }

    pub(crate) fn intern_tuple(&mut self, elems: &[Idx]) -> Idx {
        let key = Key::Tuple(elems.into());
        if let Some(&idx) = self.dedup.get(&key) {
            return idx;
        }
        let flags = elems
            .iter()
            .fold(TypeFlags::empty(), |acc, &e| acc | self.flags(e).propagated());
        let data = Self::next_u32(self.tuples.len());
        self.tuples.push(elems.into());
        self.push(
            key,
            Item {
                tag: Tag::Tuple,
                data,
                flags,
            },
        )
    }

    pub(crate) fn intern_var(&mut self, name: &str) -> Idx {
        let key = Key::Var(name.into());
        if let Some(&idx) = self.dedup.get(&key) {
            return idx;
        }
        let data = Self::next_u32(self.var_names.len());
        self.var_names.push(name.into());
        self.push(
            key,
            Item {
                tag: Tag::Var,
                data,
                flags: TypeFlags::HAS_VAR,
            },
        )
    }

    fn push(&mut self, key: Key, item: Item) -> Idx {
        let idx = Idx::from_raw(Self::next_u32(self.items.len()));
        self.items.push(item);
        self.dedup.insert(key, idx);
        idx
    }

    fn next_u32(len: usize) -> u32 {
        u32::try_from(len).unwrap_or_else(|_| panic!("type pool exceeded u32::MAX entries"))
    }

    // === Queries ===

    #[inline]
    pub fn tag(&self, idx: Idx) -> Tag {
        self.items[idx.index()].tag
    }

    #[inline]
    pub fn flags(&self, idx: Idx) -> TypeFlags {
        self.items[idx.index()].flags
    }

    #[inline]
    pub fn has_vars(&self, idx: Idx) -> bool {
        self.flags(idx).contains(TypeFlags::HAS_VAR)
    }

    /// Whether `idx` is a tensor, with or without a known rank.
    #[inline]
    pub fn is_tensor(&self, idx: Idx) -> bool {
        self.tag(idx).is_tensor()
    }

    /// Single child of a list, optional or future type.
    #[inline]
    pub fn child(&self, idx: Idx) -> Option<Idx> {
        let item = self.items[idx.index()];
        item.tag
            .has_single_child()
            .then(|| Idx::from_raw(item.data))
    }

    pub fn list_elem(&self, idx: Idx) -> Option<Idx> {
        (self.tag(idx) == Tag::List).then(|| Idx::from_raw(self.items[idx.index()].data))
    }

    pub fn optional_inner(&self, idx: Idx) -> Option<Idx> {
        (self.tag(idx) == Tag::Optional).then(|| Idx::from_raw(self.items[idx.index()].data))
    }

    pub fn future_inner(&self, idx: Idx) -> Option<Idx> {
        (self.tag(idx) == Tag::Future).then(|| Idx::from_raw(self.items[idx.index()].data))
    }

    /// Element types of a tuple type; `None` for non-tuples.
    pub fn tuple_elems(&self, idx: Idx) -> Option<&[Idx]> {
        let item = self.items[idx.index()];
        (item.tag == Tag::Tuple).then(|| &*self.tuples[item.data as usize])
    }

    pub fn shaped_rank(&self, idx: Idx) -> Option<u32> {
        let item = self.items[idx.index()];
        (item.tag == Tag::ShapedTensor).then_some(item.data)
    }

    /// Name of a type variable.
    pub fn var_name(&self, idx: Idx) -> Option<&str> {
        let item = self.items[idx.index()];
        (item.tag == Tag::Var).then(|| &*self.var_names[item.data as usize])
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

impl Default for Pool {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests;
