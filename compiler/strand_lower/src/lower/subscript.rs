//! `value[...]` on tensors, lists and tuples.

use strand_graph::{NodeKind, ValueId};
use strand_ir::{Constant, ExprId, ExprKind, Span};
use strand_types::{Idx, Tag};

use super::{Lowerer, NamedValue};
use crate::LowerError;

impl Lowerer<'_> {
    pub(crate) fn emit_subscript(
        &mut self,
        value: ExprId,
        indices: &[ExprId],
        span: Span,
    ) -> Result<ValueId, LowerError> {
        let base = self.emit_expr(value)?;
        self.emit_subscript_of(base, indices, span)
    }

    pub(crate) fn emit_subscript_of(
        &mut self,
        base: ValueId,
        indices: &[ExprId],
        span: Span,
    ) -> Result<ValueId, LowerError> {
        match indices {
            [index] => match self.arena.expr(*index).kind {
                ExprKind::Slice { start, end } => self.emit_basic_slice(base, start, end, span),
                _ => self.emit_basic_gather(base, *index, span),
            },
            _ => self.emit_multidim_slicing(base, indices, span),
        }
    }

    /// `value[start:end]`. Tensors are sliced along dimension 0.
    fn emit_basic_slice(
        &mut self,
        base: ValueId,
        start: Option<ExprId>,
        end: Option<ExprId>,
        span: Span,
    ) -> Result<ValueId, LowerError> {
        let ty = self.value_type(base);
        if let Some(len) = self.pool.tuple_elems(ty).map(<[Idx]>::len) {
            return self.emit_tuple_slice(base, len, start, end, span);
        }
        let dim = if self.pool.is_tensor(ty) {
            Some(self.dim_constant(0, span))
        } else {
            None
        };
        self.emit_slice(base, dim, start, end, span)
    }

    /// A `slice` call. `dim` is present for tensors only.
    pub(crate) fn emit_slice(
        &mut self,
        base: ValueId,
        dim: Option<ValueId>,
        start: Option<ExprId>,
        end: Option<ExprId>,
        span: Span,
    ) -> Result<ValueId, LowerError> {
        let mut args = vec![NamedValue::new(span, base)];
        if let Some(dim) = dim {
            args.push(NamedValue::new(span, dim));
        }
        let start = match start {
            Some(expr) => NamedValue::new(self.arena.span(expr), self.emit_expr(expr)?),
            None => NamedValue::new(span, self.constant(Constant::Int(0), span)),
        };
        args.push(start);
        if let Some(expr) = end {
            args.push(NamedValue::new(self.arena.span(expr), self.emit_expr(expr)?));
        }
        let step = NamedValue::new(span, self.constant(Constant::Int(1), span)).named(self.sym("step"));
        let name = self.sym("slice");
        let outputs = self.emit_builtin_call(name, None, &args, &[step], span)?;
        Ok(self.pack_outputs(&outputs, span))
    }

    /// Tuple slices never fail: both bounds are clamped to the length.
    fn emit_tuple_slice(
        &mut self,
        base: ValueId,
        len: usize,
        start: Option<ExprId>,
        end: Option<ExprId>,
        span: Span,
    ) -> Result<ValueId, LowerError> {
        let signed_len = i64::try_from(len).unwrap_or(i64::MAX);
        let begin = match start {
            Some(expr) => self.tuple_index(expr, len, true)?,
            None => 0,
        };
        let finish = match end {
            Some(expr) => self.tuple_index(expr, len, true)?,
            None => signed_len,
        };
        let clamp = |i: i64| usize::try_from(i.clamp(0, signed_len)).unwrap_or(len);
        let begin = clamp(begin);
        let finish = clamp(finish).max(begin);

        let ty = self.value_type(base);
        let elems: Vec<Idx> = self.pool.tuple_elems(ty).unwrap_or(&[])[begin..finish].to_vec();
        let out = self.pool.tuple(&elems);
        let kind = NodeKind::TupleSlice {
            start: u32::try_from(begin).unwrap_or(u32::MAX),
            end: u32::try_from(finish).unwrap_or(u32::MAX),
        };
        Ok(self.builder.emit_value(kind, &[base], out, span))
    }

    /// A constant tuple index, with negative values counted from the end.
    fn tuple_index(
        &mut self,
        expr: ExprId,
        len: usize,
        allow_out_of_bounds: bool,
    ) -> Result<i64, LowerError> {
        let span = self.arena.span(expr);
        let value = self.emit_expr(expr)?;
        let Some(Constant::Int(index)) = self.builder.graph().constant_value(value) else {
            return Err(LowerError::type_mismatch(
                span,
                "tuple indices must be integer constants",
            ));
        };
        let signed_len = i64::try_from(len).unwrap_or(i64::MAX);
        let adjusted = if index < 0 { signed_len + index } else { index };
        if !allow_out_of_bounds && !(0..signed_len).contains(&adjusted) {
            return Err(LowerError::IndexOutOfRange { len, index, span });
        }
        Ok(adjusted)
    }

    /// `value[i]` for a single non-slice index.
    fn emit_basic_gather(
        &mut self,
        base: ValueId,
        index: ExprId,
        span: Span,
    ) -> Result<ValueId, LowerError> {
        let ty = self.value_type(base);
        if self.pool.tag(ty) == Tag::List {
            let idx = self.emit_expr(index)?;
            let args = [
                NamedValue::new(span, base),
                NamedValue::new(self.arena.span(index), idx),
            ];
            return self.call_operator("select", &args, span);
        }
        if self.pool.is_tensor(ty) {
            return self.emit_multidim_slicing(base, &[index], span);
        }
        if let Some(len) = self.pool.tuple_elems(ty).map(<[Idx]>::len) {
            let position = self.tuple_index(index, len, false)?;
            let slot = usize::try_from(position).unwrap_or_default();
            let elem = self.pool.tuple_elems(ty).map_or(Idx::TENSOR, |elems| elems[slot]);
            let kind = NodeKind::TupleIndex(u32::try_from(slot).unwrap_or(u32::MAX));
            return Ok(self.builder.emit_value(kind, &[base], elem, span));
        }
        Err(LowerError::type_mismatch(
            span,
            format!(
                "indexing is only supported on lists, tensors and tuples, not {}",
                self.format_type(ty)
            ),
        ))
    }

    fn emit_multidim_slicing(
        &mut self,
        base: ValueId,
        indices: &[ExprId],
        span: Span,
    ) -> Result<ValueId, LowerError> {
        let ty = self.value_type(base);
        if !self.pool.is_tensor(ty) {
            return Err(LowerError::type_mismatch(
                span,
                format!(
                    "multidimensional indexing is only supported on tensors, not {}",
                    self.format_type(ty)
                ),
            ));
        }
        let (sliced, tensor_indices) = self.int_and_slice_indexing(base, indices, span)?;
        if tensor_indices.is_empty() {
            return Ok(sliced);
        }
        let tensor_indices = self.fill_index_holes(&tensor_indices, span);
        self.emit_index(sliced, &tensor_indices, span)
    }

    /// Apply int and slice components dimension by dimension. Tensor
    /// components are returned by dimension for one combined `index` call;
    /// dimensions without one are `None`.
    pub(crate) fn int_and_slice_indexing(
        &mut self,
        base: ValueId,
        indices: &[ExprId],
        span: Span,
    ) -> Result<(ValueId, Vec<Option<ValueId>>), LowerError> {
        let mut sliceable = base;
        let mut tensor_indices: Vec<Option<ValueId>> = Vec::new();
        let mut dim = 0;
        for &index in indices {
            if let ExprKind::Slice { start, end } = self.arena.expr(index).kind {
                let dim_value = self.dim_constant(dim, span);
                sliceable = self.emit_slice(sliceable, Some(dim_value), start, end, span)?;
                dim += 1;
                continue;
            }

            let hint = self.pool.optional(Idx::TENSOR);
            let value = self.emit_expr_hinted(index, Some(hint))?;
            let ty = self.value_type(value);
            if ty == Idx::INT {
                let dim_value = self.dim_constant(dim, span);
                let args = [
                    NamedValue::new(span, sliceable),
                    NamedValue::new(span, dim_value),
                    NamedValue::new(self.arena.span(index), value),
                ];
                sliceable = self.call_operator("select", &args, span)?;
            } else if ty == Idx::NONE {
                let dim_value = self.dim_constant(dim, span);
                let args = [
                    NamedValue::new(span, sliceable),
                    NamedValue::new(span, dim_value),
                ];
                sliceable = self.call_operator("unsqueeze", &args, span)?;
                dim += 1;
            } else if self.pool.is_tensor(ty) {
                tensor_indices.resize(dim + 1, None);
                tensor_indices[dim] = Some(value);
                dim += 1;
            } else {
                return Err(LowerError::type_mismatch(
                    self.arena.span(index),
                    format!(
                        "unsupported operation: indexing tensor with unsupported index type '{}'; \
                         only ints, slices, and tensors are supported",
                        self.format_type(ty)
                    ),
                ));
            }
        }
        Ok((sliceable, tensor_indices))
    }

    /// `Undefined` placeholders for dimensions without a tensor index.
    pub(crate) fn fill_index_holes(
        &mut self,
        indices: &[Option<ValueId>],
        span: Span,
    ) -> Vec<ValueId> {
        let mut out = Vec::with_capacity(indices.len());
        for slot in indices {
            out.push(match slot {
                Some(v) => *v,
                None => self
                    .builder
                    .emit_value(NodeKind::Undefined, &[], Idx::TENSOR, span),
            });
        }
        out
    }

    fn emit_index(
        &mut self,
        base: ValueId,
        indices: &[ValueId],
        span: Span,
    ) -> Result<ValueId, LowerError> {
        let list = self.emit_list(Idx::TENSOR, indices, span);
        let args = [NamedValue::new(span, base), NamedValue::new(span, list)];
        self.call_operator("index", &args, span)
    }

    pub(crate) fn dim_constant(&mut self, dim: usize, span: Span) -> ValueId {
        let dim = i64::try_from(dim).unwrap_or(i64::MAX);
        self.constant(Constant::Int(dim), span)
    }
}
