//! When may a name from an enclosing scope be rebound to a new value?

use crate::{Idx, Pool};

/// Decides whether a name whose current value has type `old` may be
/// rebound to a value of type `new` from a nested block.
///
/// Loop-carried and branch-merged values keep one type for their whole
/// lifetime, so the scope stack asks this before every such rebind.
pub trait RebindPolicy {
    fn is_rebind_compatible(&self, pool: &mut Pool, old: Idx, new: Idx) -> bool;
}

/// The new type must be a subtype of the old type with tensor ranks erased.
#[derive(Copy, Clone, Debug, Default)]
pub struct ShapeErased;

impl RebindPolicy for ShapeErased {
    fn is_rebind_compatible(&self, pool: &mut Pool, old: Idx, new: Idx) -> bool {
        let old = pool.unshaped(old);
        pool.is_subtype(new, old)
    }
}
