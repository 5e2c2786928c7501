//! Type-variable matching for generic signatures.
//!
//! A signature like `select(t[] list, int idx) -> t` is matched one
//! argument at a time. The first sighting of `t` binds it in a [`TypeEnv`];
//! later sightings must unify with that binding. A fresh environment is
//! used per candidate signature and discarded when the candidate fails.

use rustc_hash::FxHashMap;
use smallvec::SmallVec;

use crate::{Idx, Pool, Tag};

/// Bindings from type variable to concrete type for one match attempt.
#[derive(Clone, Debug, Default)]
pub struct TypeEnv {
    bindings: FxHashMap<Idx, Idx>,
}

impl TypeEnv {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, var: Idx) -> Option<Idx> {
        self.bindings.get(&var).copied()
    }

    pub fn len(&self) -> usize {
        self.bindings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bindings.is_empty()
    }
}

/// Why an actual type could not be matched against a formal one.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum MatchError {
    /// The variable was bound earlier to a type that does not unify.
    Conflict { var: Idx, bound: Idx, found: Idx },
    /// The actual type does not have the formal's shape (list, tuple, ...).
    Shape { formal: Idx, actual: Idx },
    /// `Optional[t]` against `None` leaves `t` undetermined.
    NoneForOptional { formal: Idx },
    /// A return type mentions a variable no argument bound.
    Unbound { var: Idx },
}

impl MatchError {
    pub fn describe(&self, pool: &Pool) -> String {
        match *self {
            MatchError::Conflict { var, bound, found } => format!(
                "type variable '{}' previously matched to type {} is matched to type {}",
                pool.format_type(var),
                pool.format_type(bound),
                pool.format_type(found)
            ),
            MatchError::Shape { formal, actual } => format!(
                "cannot match {} to {}",
                pool.format_type(formal),
                pool.format_type(actual)
            ),
            MatchError::NoneForOptional { formal } => format!(
                "cannot match {} to None, because there is no way to determine the element type from None",
                pool.format_type(formal)
            ),
            MatchError::Unbound { var } => format!(
                "type variable '{}' is not bound by any argument",
                pool.format_type(var)
            ),
        }
    }
}

/// Match `actual` against `formal`, extending `env`.
///
/// Returns `formal` with every variable replaced by its binding. The result
/// is not checked for subtyping here; callers decide whether a conversion
/// applies first.
pub fn match_type_variables(
    pool: &mut Pool,
    formal: Idx,
    actual: Idx,
    env: &mut TypeEnv,
) -> Result<Idx, MatchError> {
    if !pool.has_vars(formal) {
        return Ok(formal);
    }
    match pool.tag(formal) {
        Tag::Var => match env.get(formal) {
            None => {
                env.bindings.insert(formal, actual);
                Ok(actual)
            }
            Some(bound) => {
                let unified = pool.unify_types(bound, actual).ok_or(MatchError::Conflict {
                    var: formal,
                    bound,
                    found: actual,
                })?;
                env.bindings.insert(formal, unified);
                Ok(unified)
            }
        },
        Tag::List => {
            let formal_elem = pool.list_elem(formal).unwrap_or(Idx::TENSOR);
            if let Some(actual_elem) = pool.list_elem(actual) {
                let elem = match_type_variables(pool, formal_elem, actual_elem, env)?;
                return Ok(pool.list(elem));
            }
            // A homogeneous tuple may stand in for a list of its element type.
            if let Some(elem) = homogeneous_tuple_elem(pool, actual) {
                let as_list = pool.list(elem);
                return match_type_variables(pool, formal, as_list, env);
            }
            Err(MatchError::Shape { formal, actual })
        }
        Tag::Tuple => {
            let formal_elems: SmallVec<[Idx; 8]> =
                pool.tuple_elems(formal).unwrap_or(&[]).iter().copied().collect();
            let actual_elems: SmallVec<[Idx; 8]> = match pool.tuple_elems(actual) {
                Some(elems) if elems.len() == formal_elems.len() => elems.iter().copied().collect(),
                _ => return Err(MatchError::Shape { formal, actual }),
            };
            let mut matched = SmallVec::<[Idx; 8]>::new();
            for (f, a) in formal_elems.into_iter().zip(actual_elems) {
                matched.push(match_type_variables(pool, f, a, env)?);
            }
            Ok(pool.tuple(&matched))
        }
        Tag::Future => {
            let formal_inner = pool.future_inner(formal).unwrap_or(Idx::TENSOR);
            let Some(actual_inner) = pool.future_inner(actual) else {
                return Err(MatchError::Shape { formal, actual });
            };
            let inner = match_type_variables(pool, formal_inner, actual_inner, env)?;
            Ok(pool.future(inner))
        }
        Tag::Optional => {
            let formal_inner = pool.optional_inner(formal).unwrap_or(Idx::TENSOR);
            if let Some(actual_inner) = pool.optional_inner(actual) {
                let inner = match_type_variables(pool, formal_inner, actual_inner, env)?;
                return Ok(pool.optional(inner));
            }
            if actual == Idx::NONE {
                return Err(MatchError::NoneForOptional { formal });
            }
            // A plain `T` matches `Optional[t]` by matching its element.
            match_type_variables(pool, formal_inner, actual, env)
        }
        _ => Err(MatchError::Shape { formal, actual }),
    }
}

/// Substitute bound variables into `ty`. Fails on unbound variables.
pub fn eval_type_variables(pool: &mut Pool, ty: Idx, env: &TypeEnv) -> Result<Idx, MatchError> {
    if !pool.has_vars(ty) {
        return Ok(ty);
    }
    match pool.tag(ty) {
        Tag::Var => env.get(ty).ok_or(MatchError::Unbound { var: ty }),
        Tag::List | Tag::Optional | Tag::Future => {
            let child = pool.child(ty).unwrap_or(Idx::TENSOR);
            let child = eval_type_variables(pool, child, env)?;
            Ok(match pool.tag(ty) {
                Tag::List => pool.list(child),
                Tag::Optional => pool.optional(child),
                _ => pool.future(child),
            })
        }
        Tag::Tuple => {
            let elems: SmallVec<[Idx; 8]> =
                pool.tuple_elems(ty).unwrap_or(&[]).iter().copied().collect();
            let mut evaluated = SmallVec::<[Idx; 8]>::new();
            for elem in elems {
                evaluated.push(eval_type_variables(pool, elem, env)?);
            }
            Ok(pool.tuple(&evaluated))
        }
        _ => Ok(ty),
    }
}

/// The common element type of a non-empty tuple whose elements unify.
fn homogeneous_tuple_elem(pool: &mut Pool, ty: Idx) -> Option<Idx> {
    let elems: SmallVec<[Idx; 8]> = pool.tuple_elems(ty)?.iter().copied().collect();
    let (&first, rest) = elems.split_first()?;
    rest.iter()
        .try_fold(first, |acc, &elem| pool.unify_types(acc, elem))
}

#[cfg(test)]
mod tests;
