//! Type annotations and parameter defaults written in the script.

use strand_ir::{Constant, ExprId, ExprKind, ScriptArena, Span, StringInterner, UnaryOp};
use strand_types::{Idx, Pool};

use crate::LowerError;

/// Reads type expressions such as `Tuple[int, List[Tensor]]`.
pub(crate) struct TypeParser<'a> {
    pub arena: &'a ScriptArena,
    pub interner: &'a StringInterner,
    pub pool: &'a mut Pool,
}

impl TypeParser<'_> {
    /// A type in an ordinary position (return annotation, `annotate`, ...).
    pub fn parse(&mut self, expr: ExprId) -> Result<Idx, LowerError> {
        if let Some((_, span)) = self.broadcasting_list(expr) {
            return Err(LowerError::unsupported(
                span,
                "broadcastable lists are only supported for function parameters",
            ));
        }
        let e = self.arena.expr(expr);
        match &e.kind {
            ExprKind::None => Ok(Idx::NONE),
            ExprKind::Ident(name) => self.base_type(self.interner.lookup(*name), e.span),
            // `torch.Tensor` and friends: only the last component matters.
            ExprKind::Attribute { field, .. } => {
                self.base_type(self.interner.lookup(*field), e.span)
            }
            ExprKind::Subscript { value, indices } => {
                let ExprKind::Ident(ctor) = self.arena.expr(*value).kind else {
                    return Err(unknown_type(e.span, e.kind.describe()));
                };
                let ctor = self.interner.lookup(ctor);
                let indices = self.flatten_indices(indices);
                match ctor {
                    "Tuple" => {
                        let mut elems = Vec::with_capacity(indices.len());
                        for index in indices {
                            elems.push(self.parse(index)?);
                        }
                        Ok(self.pool.tuple(&elems))
                    }
                    "List" | "Optional" | "Future" => {
                        let [inner] = indices[..] else {
                            return Err(LowerError::unsupported(
                                e.span,
                                format!("{ctor} expects exactly one type argument"),
                            ));
                        };
                        let inner = self.parse(inner)?;
                        Ok(match ctor {
                            "List" => self.pool.list(inner),
                            "Optional" => self.pool.optional(inner),
                            _ => self.pool.future(inner),
                        })
                    }
                    other => Err(unknown_type(e.span, other)),
                }
            }
            other => Err(unknown_type(e.span, other.describe())),
        }
    }

    /// A parameter type. Broadcastable lists (`BroadcastingList2[int]`,
    /// optionally wrapped in `Optional`) are allowed here and yield their
    /// arity.
    pub fn parse_param(&mut self, expr: ExprId) -> Result<(Idx, Option<u32>), LowerError> {
        if let Some((list, arity)) = self.param_broadcast(expr)? {
            return Ok((list, Some(arity)));
        }
        if let ExprKind::Subscript { value, indices } = &self.arena.expr(expr).kind {
            if let (ExprKind::Ident(ctor), [inner]) = (&self.arena.expr(*value).kind, &indices[..])
            {
                if self.interner.lookup(*ctor) == "Optional" {
                    if let Some((list, arity)) = self.param_broadcast(*inner)? {
                        return Ok((self.pool.optional(list), Some(arity)));
                    }
                }
            }
        }
        Ok((self.parse(expr)?, None))
    }

    fn param_broadcast(&mut self, expr: ExprId) -> Result<Option<(Idx, u32)>, LowerError> {
        let Some((arity, span)) = self.broadcasting_list(expr) else {
            return Ok(None);
        };
        let ExprKind::Subscript { indices, .. } = &self.arena.expr(expr).kind else {
            return Ok(None);
        };
        let elem = match indices[..] {
            [elem] => self.parse(elem)?,
            _ => {
                return Err(LowerError::unsupported(
                    span,
                    "broadcastable list expects exactly one element type",
                ))
            }
        };
        if elem != Idx::INT && elem != Idx::FLOAT {
            return Err(LowerError::unsupported(
                span,
                "broadcastable lists are only supported for int or float",
            ));
        }
        Ok(Some((self.pool.list(elem), arity)))
    }

    /// `BroadcastingListN[...]` → `N`.
    fn broadcasting_list(&self, expr: ExprId) -> Option<(u32, Span)> {
        let e = self.arena.expr(expr);
        let ExprKind::Subscript { value, .. } = &e.kind else {
            return None;
        };
        let ExprKind::Ident(ctor) = self.arena.expr(*value).kind else {
            return None;
        };
        let digits = self.interner.lookup(ctor).strip_prefix("BroadcastingList")?;
        digits.parse().ok().map(|n| (n, e.span))
    }

    /// `Tuple[(a, b)]` is written the same as `Tuple[a, b]`.
    fn flatten_indices(&self, indices: &[ExprId]) -> Vec<ExprId> {
        match indices {
            [single] => match &self.arena.expr(*single).kind {
                ExprKind::Tuple(elems) => elems.clone(),
                _ => vec![*single],
            },
            _ => indices.to_vec(),
        }
    }

    fn base_type(&self, name: &str, span: Span) -> Result<Idx, LowerError> {
        Ok(match name {
            "Tensor" => Idx::TENSOR,
            "int" => Idx::INT,
            "float" => Idx::FLOAT,
            "bool" => Idx::BOOL,
            "str" => Idx::STR,
            "None" => Idx::NONE,
            "Device" => Idx::DEVICE,
            "number" => Idx::NUMBER,
            other => return Err(unknown_type(span, other)),
        })
    }
}

fn unknown_type(span: Span, what: &str) -> LowerError {
    LowerError::unsupported(span, format!("unknown type annotation '{what}'"))
}

/// Evaluate a parameter default, which must be a literal.
pub(crate) fn default_constant(arena: &ScriptArena, expr: ExprId) -> Result<Constant, LowerError> {
    let e = arena.expr(expr);
    let constant = match &e.kind {
        ExprKind::Int(i) => Some(Constant::Int(*i)),
        ExprKind::Float(bits) => Some(Constant::Float(*bits)),
        ExprKind::Bool(b) => Some(Constant::Bool(*b)),
        ExprKind::Str(s) => Some(Constant::Str(*s)),
        ExprKind::None => Some(Constant::None),
        ExprKind::Unary {
            op: UnaryOp::Neg,
            operand,
        } => match arena.expr(*operand).kind {
            ExprKind::Int(i) => Constant::Int(i).negate(),
            ExprKind::Float(bits) => Constant::Float(bits).negate(),
            _ => None,
        },
        _ => None,
    };
    constant.ok_or_else(|| {
        LowerError::unsupported(e.span, "default values must be literal constants")
    })
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use strand_ir::{ExprKind, ScriptArena, Span, StringInterner};

    use super::*;

    fn ident(arena: &mut ScriptArena, interner: &StringInterner, s: &str) -> ExprId {
        arena.push_expr(ExprKind::Ident(interner.intern(s)), Span::DUMMY)
    }

    fn subscript(arena: &mut ScriptArena, ctor: ExprId, indices: Vec<ExprId>) -> ExprId {
        arena.push_expr(
            ExprKind::Subscript {
                value: ctor,
                indices,
            },
            Span::new(3, 9),
        )
    }

    #[test]
    fn nested_annotations() {
        let mut arena = ScriptArena::new();
        let interner = StringInterner::new();
        let mut pool = Pool::new();
        let tuple = ident(&mut arena, &interner, "Tuple");
        let list = ident(&mut arena, &interner, "List");
        let int = ident(&mut arena, &interner, "int");
        let tensor = ident(&mut arena, &interner, "Tensor");
        let list_tensor = subscript(&mut arena, list, vec![tensor]);
        let ann = subscript(&mut arena, tuple, vec![int, list_tensor]);

        let ty = TypeParser {
            arena: &arena,
            interner: &interner,
            pool: &mut pool,
        }
        .parse(ann)
        .unwrap();
        let expected_list = pool.list(Idx::TENSOR);
        let expected = pool.tuple(&[Idx::INT, expected_list]);
        assert_eq!(ty, expected);
    }

    #[test]
    fn broadcasting_lists_only_in_params() {
        let mut arena = ScriptArena::new();
        let interner = StringInterner::new();
        let mut pool = Pool::new();
        let ctor = ident(&mut arena, &interner, "BroadcastingList2");
        let int = ident(&mut arena, &interner, "int");
        let ann = subscript(&mut arena, ctor, vec![int]);
        let optional = ident(&mut arena, &interner, "Optional");
        let opt_ann = subscript(&mut arena, optional, vec![ann]);

        let mut parser = TypeParser {
            arena: &arena,
            interner: &interner,
            pool: &mut pool,
        };
        let (ty, arity) = parser.parse_param(ann).unwrap();
        assert_eq!(arity, Some(2));
        let err = parser.parse(ann).unwrap_err();
        assert_eq!(err.span(), Span::new(3, 9));
        let (opt_ty, opt_arity) = parser.parse_param(opt_ann).unwrap();
        assert_eq!(opt_arity, Some(2));
        assert_eq!(pool.list_elem(ty), Some(Idx::INT));
        assert_eq!(pool.optional_inner(opt_ty), Some(ty));
    }

    #[test]
    fn unknown_names_are_rejected() {
        let mut arena = ScriptArena::new();
        let interner = StringInterner::new();
        let mut pool = Pool::new();
        let ann = ident(&mut arena, &interner, "Matrix");
        let err = TypeParser {
            arena: &arena,
            interner: &interner,
            pool: &mut pool,
        }
        .parse(ann)
        .unwrap_err();
        assert_eq!(err.to_string(), "unknown type annotation 'Matrix'");
    }

    #[test]
    fn negative_defaults_fold() {
        let mut arena = ScriptArena::new();
        let one = arena.push_expr(ExprKind::Int(1), Span::DUMMY);
        let neg = arena.push_expr(
            ExprKind::Unary {
                op: UnaryOp::Neg,
                operand: one,
            },
            Span::DUMMY,
        );
        assert_eq!(default_constant(&arena, neg).unwrap(), Constant::Int(-1));
        let list = arena.push_expr(ExprKind::List(vec![one]), Span::DUMMY);
        assert!(default_constant(&arena, list).is_err());
    }
}
