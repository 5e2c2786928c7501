//! Cached per-type properties.

use bitflags::bitflags;

bitflags! {
    /// Computed once when a type is interned so hot checks skip traversal.
    #[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
    pub struct TypeFlags: u8 {
        /// Contains a type variable somewhere.
        const HAS_VAR = 1 << 0;
        /// Contains a tensor type somewhere.
        const HAS_TENSOR = 1 << 1;
        /// Contains a tensor with a known rank somewhere.
        const HAS_SHAPE = 1 << 2;
    }
}

impl TypeFlags {
    /// Flags a container inherits from its children.
    #[inline]
    pub fn propagated(self) -> TypeFlags {
        self & (TypeFlags::HAS_VAR | TypeFlags::HAS_TENSOR | TypeFlags::HAS_SHAPE)
    }
}
