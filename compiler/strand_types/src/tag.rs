//! Type kind discriminant.

/// Kind of an interned type. The meaning of an item's `data` word depends
/// on the tag.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
#[repr(u8)]
pub enum Tag {
    Int,
    Float,
    Bool,
    Str,
    NoneType,
    /// Tensor of unknown rank.
    Tensor,
    Number,
    Device,
    /// Tensor with known rank; `data` is the rank. Subtype of `Tensor`.
    ShapedTensor,
    /// `data` is the element `Idx`.
    List,
    /// `data` is the inner `Idx`.
    Optional,
    /// `data` is the result `Idx`.
    Future,
    /// `data` indexes the pool's tuple element table.
    Tuple,
    /// Type variable; `data` indexes the pool's variable name table.
    Var,
}

impl Tag {
    /// Tags whose single child is stored in `data`.
    #[inline]
    pub const fn has_single_child(self) -> bool {
        matches!(self, Tag::List | Tag::Optional | Tag::Future)
    }

    #[inline]
    pub const fn is_tensor(self) -> bool {
        matches!(self, Tag::Tensor | Tag::ShapedTensor)
    }
}
