//! Plain, tuple, subscript and augmented assignment.

use strand_graph::{NodeKind, ValueId};
use strand_ir::{BinaryOp, ExprId, ExprKind, Span};
use strand_types::{Idx, Tag};

use super::expr::binary_op_name;
use super::{Lowerer, NamedValue};
use crate::{LowerError, SugaredValue};

/// In-place and out-of-place operators for an augmented assignment.
fn aug_op(op: BinaryOp, in_place: bool) -> Option<&'static str> {
    Some(match (op, in_place) {
        (BinaryOp::Add, true) => "add_",
        (BinaryOp::Sub, true) => "sub_",
        (BinaryOp::Mul, true) => "mul_",
        (BinaryOp::Div, true) => "div_",
        (BinaryOp::Add | BinaryOp::Sub | BinaryOp::Mul | BinaryOp::Div, false) => {
            return binary_op_name(op)
        }
        _ => return None,
    })
}

impl Lowerer<'_> {
    pub(crate) fn emit_assignment(
        &mut self,
        target: ExprId,
        value: ExprId,
        span: Span,
    ) -> Result<(), LowerError> {
        let target_expr = self.arena.expr(target);
        match &target_expr.kind {
            ExprKind::Ident(name) => {
                let rhs = self.emit_sugared_expr(value)?;
                self.bind(*name, rhs, target_expr.span)
            }
            ExprKind::Tuple(targets) | ExprKind::List(targets) => {
                self.emit_tuple_assign(targets, value, target_expr.span)
            }
            ExprKind::Subscript {
                value: base,
                indices,
            } => self.emit_subscript_assign(*base, indices, value, span),
            ExprKind::Starred(_) => Err(LowerError::unsupported(
                target_expr.span,
                "starred assignment target must be in a list or tuple",
            )),
            other => Err(LowerError::unsupported(
                target_expr.span,
                format!("cannot assign to a {}", other.describe()),
            )),
        }
    }

    /// `a, *rest, b = value`
    fn emit_tuple_assign(
        &mut self,
        targets: &[ExprId],
        value: ExprId,
        span: Span,
    ) -> Result<(), LowerError> {
        let starred = targets
            .iter()
            .filter(|&&t| matches!(self.arena.expr(t).kind, ExprKind::Starred(_)))
            .count();
        if starred > 1 {
            return Err(LowerError::unsupported(
                span,
                "only one starred expression is allowed on the left-hand side",
            ));
        }
        let starred = starred == 1;
        let binders = targets.len() - usize::from(starred);

        let rhs = self.emit_sugared_expr(value)?;
        let outputs = self.as_tuple(rhs, (!starred).then_some(binders), self.arena.span(value))?;
        if outputs.len() < binders {
            return Err(LowerError::unpack(
                span,
                format!(
                    "need {}{binders} values to unpack but found only {}",
                    if starred { "at least " } else { "" },
                    outputs.len()
                ),
            ));
        }
        if outputs.len() > binders && !starred {
            return Err(LowerError::unpack(
                span,
                format!(
                    "too many values to unpack: need {binders} but found {}",
                    outputs.len()
                ),
            ));
        }

        let extra = outputs.len() - binders;
        let mut outputs = outputs.into_iter();
        for &target in targets {
            let target_expr = self.arena.expr(target);
            match &target_expr.kind {
                ExprKind::Ident(name) => {
                    let Some(value) = outputs.next() else { break };
                    self.bind(*name, value, target_expr.span)?;
                }
                ExprKind::Starred(inner) => {
                    let ExprKind::Ident(name) = self.arena.expr(*inner).kind else {
                        return Err(LowerError::unsupported(
                            target_expr.span,
                            "cannot pack a tuple into a non-variable",
                        ));
                    };
                    let mut values = Vec::with_capacity(extra);
                    for sv in outputs.by_ref().take(extra) {
                        values.push(self.as_value(sv, target_expr.span)?);
                    }
                    let tuple = self.emit_tuple(&values, target_expr.span);
                    self.bind(name, SugaredValue::Plain(tuple), target_expr.span)?;
                }
                other => {
                    return Err(LowerError::unsupported(
                        target_expr.span,
                        format!(
                            "unexpected {} on the left-hand side of a tuple assignment",
                            other.describe()
                        ),
                    ))
                }
            }
        }
        Ok(())
    }

    /// The elements of a value usable as a fixed-size sequence. Lists need
    /// `size_hint`, since their length is only known at runtime.
    pub(crate) fn as_tuple(
        &mut self,
        value: SugaredValue,
        size_hint: Option<usize>,
        span: Span,
    ) -> Result<Vec<SugaredValue>, LowerError> {
        match value {
            SugaredValue::Plain(v) => {
                let ty = self.value_type(v);
                if self.pool.tag(ty) == Tag::Tuple {
                    let elems = self.unpack_tuple(v, span);
                    return Ok(elems.into_iter().map(SugaredValue::Plain).collect());
                }
                if let Some(elem) = self.pool.list_elem(ty) {
                    let Some(n) = size_hint else {
                        return Err(LowerError::unpack(
                            span,
                            "cannot statically infer the expected size of a list in this context",
                        ));
                    };
                    let types = vec![elem; n];
                    let node = self.builder.emit(NodeKind::ListUnpack, &[v], &types, span);
                    let outputs = self.builder.graph().node(node).outputs.to_vec();
                    return Ok(outputs.into_iter().map(SugaredValue::Plain).collect());
                }
                Err(LowerError::type_mismatch(
                    span,
                    format!("{} cannot be used as a tuple", self.format_type(ty)),
                ))
            }
            SugaredValue::Projection(object) => {
                let resolver = self.session.resolver;
                resolver.as_sequence(object).ok_or_else(|| {
                    LowerError::type_mismatch(
                        span,
                        format!("{} cannot be used as a tuple", resolver.describe(object)),
                    )
                })
            }
            other => Err(LowerError::type_mismatch(
                span,
                format!("{} cannot be used as a tuple", other.kind_name()),
            )),
        }
    }

    /// `base[indices] = value`. Tensors are written in place; list elements
    /// are replaced through `_set_item`.
    fn emit_subscript_assign(
        &mut self,
        base: ExprId,
        indices: &[ExprId],
        value: ExprId,
        span: Span,
    ) -> Result<(), LowerError> {
        let sliceable = self.emit_expr(base)?;
        let ty = self.value_type(sliceable);
        if self.pool.is_tensor(ty) {
            let (sliced, tensor_indices) = self.int_and_slice_indexing(sliceable, indices, span)?;
            let target = NamedValue::new(span, sliced);
            let rhs = NamedValue::new(self.arena.span(value), self.emit_expr(value)?);
            if tensor_indices.is_empty() {
                self.call_method("copy_", target, &[rhs], span)?;
            } else {
                let holes = self.fill_index_holes(&tensor_indices, span);
                let list = self.emit_list(Idx::TENSOR, &holes, span);
                self.call_method("index_put_", target, &[NamedValue::new(span, list), rhs], span)?;
            }
            return Ok(());
        }

        let [index] = indices else {
            return Err(LowerError::unsupported(
                span,
                "sliced assignment is not supported for lists",
            ));
        };
        if matches!(self.arena.expr(*index).kind, ExprKind::Slice { .. }) {
            return Err(LowerError::unsupported(
                span,
                "sliced assignment is not supported for lists",
            ));
        }
        let idx = self.emit_expr(*index)?;
        let rhs = self.emit_expr(value)?;
        let args = [
            NamedValue::new(self.arena.span(base), sliceable),
            NamedValue::new(self.arena.span(*index), idx),
            NamedValue::new(self.arena.span(value), rhs),
        ];
        self.call_operator("_set_item", &args, span)?;
        Ok(())
    }

    pub(crate) fn emit_aug_assignment(
        &mut self,
        target: ExprId,
        op: BinaryOp,
        value: ExprId,
        span: Span,
    ) -> Result<(), LowerError> {
        if aug_op(op, true).is_none() {
            return Err(LowerError::unsupported(
                span,
                format!("unknown augmented assignment: {}=", op.as_symbol()),
            ));
        }
        let target_expr = self.arena.expr(target);
        match &target_expr.kind {
            ExprKind::Ident(name) => {
                let lhs = self.lookup_name(*name, target_expr.span)?;
                let lhs = self.as_value(lhs, target_expr.span)?;
                let rhs = NamedValue::new(self.arena.span(value), self.emit_expr(value)?);
                let lhs = NamedValue::new(target_expr.span, lhs);
                let result = self.emit_aug_op(op, lhs, rhs, span)?;
                self.bind(*name, SugaredValue::Plain(result), target_expr.span)
            }
            ExprKind::Attribute { .. } => {
                let lhs = self.emit_sugared_expr(target)?;
                let lhs = self.as_value(lhs, target_expr.span)?;
                if !self.pool.is_tensor(self.value_type(lhs)) {
                    return Err(LowerError::type_mismatch(
                        target_expr.span,
                        "left-hand side of augmented assignment to an attribute can only be a tensor",
                    ));
                }
                let rhs = NamedValue::new(self.arena.span(value), self.emit_expr(value)?);
                self.emit_aug_op(op, NamedValue::new(target_expr.span, lhs), rhs, span)?;
                Ok(())
            }
            ExprKind::Subscript {
                value: base,
                indices,
            } => self.emit_aug_subscript(op, *base, indices, value, span),
            other => Err(LowerError::unsupported(
                target_expr.span,
                format!(
                    "unexpected {} on the left-hand side of an augmented assignment",
                    other.describe()
                ),
            )),
        }
    }

    /// Tensors update in place through `op_`; everything else becomes
    /// `lhs = lhs op rhs`.
    fn emit_aug_op(
        &mut self,
        op: BinaryOp,
        lhs: NamedValue,
        rhs: NamedValue,
        span: Span,
    ) -> Result<ValueId, LowerError> {
        let in_place = self.pool.is_tensor(self.value_type(lhs.value));
        let Some(name) = aug_op(op, in_place) else {
            return Err(LowerError::unsupported(
                span,
                format!("unknown augmented assignment: {}=", op.as_symbol()),
            ));
        };
        if in_place {
            self.call_method(name, lhs, &[rhs], span)
        } else {
            self.call_operator(name, &[lhs, rhs], span)
        }
    }

    fn emit_aug_subscript(
        &mut self,
        op: BinaryOp,
        base: ExprId,
        indices: &[ExprId],
        value: ExprId,
        span: Span,
    ) -> Result<(), LowerError> {
        let sliceable = self.emit_expr(base)?;
        let ty = self.value_type(sliceable);
        if self.pool.is_tensor(ty) {
            let (sliced, tensor_indices) = self.int_and_slice_indexing(sliceable, indices, span)?;
            let target = NamedValue::new(span, sliced);
            let rhs = NamedValue::new(self.arena.span(value), self.emit_expr(value)?);
            if tensor_indices.is_empty() {
                self.emit_aug_op(op, target, rhs, span)?;
            } else {
                let holes = self.fill_index_holes(&tensor_indices, span);
                let list = NamedValue::new(span, self.emit_list(Idx::TENSOR, &holes, span));
                let indexed = self.call_operator("index", &[target, list], span)?;
                let updated = self.emit_aug_op(op, NamedValue::new(span, indexed), rhs, span)?;
                self.call_method(
                    "index_put_",
                    target,
                    &[list, NamedValue::new(span, updated)],
                    span,
                )?;
            }
            return Ok(());
        }

        if self.pool.list_elem(ty).is_none() {
            return Err(LowerError::type_mismatch(
                span,
                format!(
                    "augmented assignment to a subscript is only supported on tensors and lists, not {}",
                    self.format_type(ty)
                ),
            ));
        }
        let [index] = indices else {
            return Err(LowerError::unsupported(
                span,
                "sliced expressions are not supported for subscripted list augmented assignment",
            ));
        };
        let list = NamedValue::new(self.arena.span(base), sliceable);
        let idx = NamedValue::new(self.arena.span(*index), self.emit_expr(*index)?);
        let rhs = NamedValue::new(self.arena.span(value), self.emit_expr(value)?);
        let item = self.call_operator("select", &[list, idx], span)?;
        let updated = self.emit_aug_op(op, NamedValue::new(span, item), rhs, span)?;
        self.call_operator("_set_item", &[list, idx, NamedValue::new(span, updated)], span)?;
        Ok(())
    }
}
