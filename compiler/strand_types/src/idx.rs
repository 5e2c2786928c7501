//! Type index handle.

use std::fmt;

/// A 32-bit index into the type [`Pool`](crate::Pool).
///
/// Primitive types have fixed indices so they can be named without a pool.
#[derive(Copy, Clone, Eq, PartialEq, Hash, PartialOrd, Ord)]
#[repr(transparent)]
pub struct Idx(u32);

impl Idx {
    pub const INT: Self = Self(0);
    pub const FLOAT: Self = Self(1);
    pub const BOOL: Self = Self(2);
    pub const STR: Self = Self(3);
    /// The type of the `None` literal.
    pub const NONE: Self = Self(4);
    /// Tensor of unknown rank.
    pub const TENSOR: Self = Self(5);
    /// Either `int` or `float`.
    pub const NUMBER: Self = Self(6);
    pub const DEVICE: Self = Self(7);

    /// Number of pre-interned primitive types.
    pub const PRIMITIVE_COUNT: u32 = 8;

    #[inline]
    pub const fn from_raw(raw: u32) -> Self {
        Self(raw)
    }

    #[inline]
    pub const fn raw(self) -> u32 {
        self.0
    }

    #[inline]
    pub const fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Debug for Idx {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {
            Idx::INT => write!(f, "Idx::INT"),
            Idx::FLOAT => write!(f, "Idx::FLOAT"),
            Idx::BOOL => write!(f, "Idx::BOOL"),
            Idx::STR => write!(f, "Idx::STR"),
            Idx::NONE => write!(f, "Idx::NONE"),
            Idx::TENSOR => write!(f, "Idx::TENSOR"),
            Idx::NUMBER => write!(f, "Idx::NUMBER"),
            Idx::DEVICE => write!(f, "Idx::DEVICE"),
            Idx(raw) => write!(f, "Idx({raw})"),
        }
    }
}
