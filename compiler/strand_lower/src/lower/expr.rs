//! Expression lowering.

use strand_graph::ValueId;
use strand_ir::{BinaryOp, Constant, ExprId, ExprKind, Span, UnaryOp};
use strand_types::Idx;

use super::{Lowerer, NamedValue};
use crate::stack::ensure_sufficient_stack;
use crate::{LowerError, SugaredValue};

/// Operator implementing a binary expression. `and`/`or` short-circuit and
/// have none.
pub(crate) fn binary_op_name(op: BinaryOp) -> Option<&'static str> {
    Some(match op {
        BinaryOp::Add => "add",
        BinaryOp::Sub => "sub",
        BinaryOp::Mul => "mul",
        BinaryOp::Div => "div",
        BinaryOp::FloorDiv => "floordiv",
        BinaryOp::Mod => "remainder",
        BinaryOp::Pow => "pow",
        BinaryOp::MatMul => "matmul",
        BinaryOp::BitAnd => "__and__",
        BinaryOp::BitOr => "__or__",
        BinaryOp::BitXor => "__xor__",
        BinaryOp::Eq => "eq",
        BinaryOp::NotEq => "ne",
        BinaryOp::Lt => "lt",
        BinaryOp::Gt => "gt",
        BinaryOp::LtEq => "le",
        BinaryOp::GtEq => "ge",
        BinaryOp::Is => "__is__",
        BinaryOp::IsNot => "__isnot__",
        BinaryOp::And | BinaryOp::Or => return None,
    })
}

impl Lowerer<'_> {
    pub(crate) fn emit_expr(&mut self, id: ExprId) -> Result<ValueId, LowerError> {
        self.emit_expr_hinted(id, None)
    }

    /// Lower an expression to a graph value. `hint` is the type the context
    /// expects; it decides the element type of list literals.
    pub(crate) fn emit_expr_hinted(
        &mut self,
        id: ExprId,
        hint: Option<Idx>,
    ) -> Result<ValueId, LowerError> {
        let expr = self.arena.expr(id);
        match expr.kind {
            ExprKind::Ident(_) | ExprKind::Attribute { .. } | ExprKind::Call { .. } => {
                let value = self.emit_sugared_expr(id)?;
                self.as_value(value, expr.span)
            }
            _ => ensure_sufficient_stack(|| self.emit_simple_expr(id, hint)),
        }
    }

    /// Lower an expression that may denote a compile-time value.
    pub(crate) fn emit_sugared_expr(&mut self, id: ExprId) -> Result<SugaredValue, LowerError> {
        let expr = self.arena.expr(id);
        let span = expr.span;
        ensure_sufficient_stack(|| match &expr.kind {
            ExprKind::Ident(name) => self.lookup_name(*name, span),
            ExprKind::Attribute { value, field } => {
                let base = self.emit_sugared_expr(*value)?;
                self.attr(base, *field, span)
            }
            ExprKind::Call {
                callee,
                args,
                kwargs,
            } => self.emit_apply(*callee, args, kwargs, span),
            _ => self.emit_simple_expr(id, None).map(SugaredValue::Plain),
        })
    }

    fn emit_simple_expr(&mut self, id: ExprId, hint: Option<Idx>) -> Result<ValueId, LowerError> {
        let expr = self.arena.expr(id);
        let span = expr.span;
        match &expr.kind {
            ExprKind::Int(i) => Ok(self.constant(Constant::Int(*i), span)),
            ExprKind::Float(bits) => Ok(self.constant(Constant::Float(*bits), span)),
            ExprKind::Bool(b) => Ok(self.constant(Constant::Bool(*b), span)),
            ExprKind::Str(s) => Ok(self.constant(Constant::Str(*s), span)),
            ExprKind::None => Ok(self.constant(Constant::None, span)),
            ExprKind::Ident(_) | ExprKind::Attribute { .. } | ExprKind::Call { .. } => {
                self.emit_expr_hinted(id, hint)
            }
            ExprKind::Binary { op, left, right } => self.emit_binary(*op, *left, *right, span),
            ExprKind::Unary { op, operand } => self.emit_unary(*op, *operand, span),
            ExprKind::Ternary {
                cond,
                then_expr,
                else_expr,
            } => {
                let cond = self.emit_cond(*cond)?;
                let (then_expr, else_expr) = (*then_expr, *else_expr);
                self.emit_if_expr(
                    cond,
                    span,
                    |this| this.emit_expr(then_expr),
                    |this| this.emit_expr(else_expr),
                )
            }
            ExprKind::Subscript { value, indices } => self.emit_subscript(*value, indices, span),
            ExprKind::Tuple(elems) => {
                let values = self.emit_values(elems)?;
                Ok(self.emit_tuple(&values, span))
            }
            ExprKind::List(elems) => self.emit_list_literal(elems, hint, span),
            ExprKind::Starred(_) => Err(LowerError::unsupported(
                span,
                "starred expressions are only allowed in calls, tuple and list literals, \
                 or on the left-hand side of an assignment",
            )),
            ExprKind::Slice { .. } => Err(LowerError::unsupported(
                span,
                "slices are only allowed inside a subscript",
            )),
        }
    }

    fn emit_binary(
        &mut self,
        op: BinaryOp,
        left: ExprId,
        right: ExprId,
        span: Span,
    ) -> Result<ValueId, LowerError> {
        let Some(name) = binary_op_name(op) else {
            return self.emit_short_circuit(op == BinaryOp::Or, left, right, span);
        };
        let lhs = self.emit_expr(left)?;
        let rhs = self.emit_expr(right)?;
        let args = [
            NamedValue::new(self.arena.span(left), lhs),
            NamedValue::new(self.arena.span(right), rhs),
        ];
        self.call_operator(name, &args, span)
    }

    /// `a or b` is `b` evaluated only when `a` is false; `a and b` only
    /// when `a` is true.
    fn emit_short_circuit(
        &mut self,
        is_or: bool,
        first: ExprId,
        second: ExprId,
        span: Span,
    ) -> Result<ValueId, LowerError> {
        let first_value = self.emit_cond(first)?;
        let get_first = move |_: &mut Self| Ok(first_value);
        let get_second = move |this: &mut Self| this.emit_cond(second);
        if is_or {
            self.emit_if_expr(first_value, span, get_first, get_second)
        } else {
            self.emit_if_expr(first_value, span, get_second, get_first)
        }
    }

    fn emit_unary(&mut self, op: UnaryOp, operand: ExprId, span: Span) -> Result<ValueId, LowerError> {
        match op {
            UnaryOp::Neg => {
                // `-1` is a literal, not a call.
                let folded = match self.arena.expr(operand).kind {
                    ExprKind::Int(i) => Constant::Int(i).negate(),
                    ExprKind::Float(bits) => Constant::Float(bits).negate(),
                    _ => None,
                };
                if let Some(c) = folded {
                    return Ok(self.constant(c, span));
                }
                let value = self.emit_expr(operand)?;
                self.call_operator("neg", &[NamedValue::new(self.arena.span(operand), value)], span)
            }
            UnaryOp::Not => {
                let value = self.emit_expr(operand)?;
                self.call_operator(
                    "__not__",
                    &[NamedValue::new(self.arena.span(operand), value)],
                    span,
                )
            }
        }
    }

    /// An `If` node yielding one value. Both arms must have the same type
    /// once tensor ranks are erased.
    pub(crate) fn emit_if_expr(
        &mut self,
        cond: ValueId,
        span: Span,
        then_arm: impl FnOnce(&mut Self) -> Result<ValueId, LowerError>,
        else_arm: impl FnOnce(&mut Self) -> Result<ValueId, LowerError>,
    ) -> Result<ValueId, LowerError> {
        let node = self.builder.emit(strand_graph::NodeKind::If, &[cond], &[], span);
        let then_block = self.builder.graph_mut().add_node_block(node);
        let else_block = self.builder.graph_mut().add_node_block(node);
        let saved = self.builder.insertion_block();

        self.builder.position_at(then_block);
        let then_value = then_arm(self)?;
        self.builder.graph_mut().add_block_output(then_block, then_value);

        self.builder.position_at(else_block);
        let else_value = else_arm(self)?;
        self.builder.graph_mut().add_block_output(else_block, else_value);
        self.builder.position_at(saved);

        let then_ty = self.value_type(then_value);
        let else_ty = self.value_type(else_value);
        let then_ty = self.pool.unshaped(then_ty);
        let else_ty = self.pool.unshaped(else_ty);
        if then_ty != else_ty {
            return Err(LowerError::type_mismatch(
                span,
                format!(
                    "if-expression's true branch has type {} but false branch has type {}",
                    self.format_type(then_ty),
                    self.format_type(else_ty)
                ),
            ));
        }
        Ok(self.builder.graph_mut().add_node_output(node, then_ty))
    }

    fn emit_list_literal(
        &mut self,
        elems: &[ExprId],
        hint: Option<Idx>,
        span: Span,
    ) -> Result<ValueId, LowerError> {
        let values = self.emit_values(elems)?;
        let elem_ty = match hint.and_then(|h| self.pool.list_elem(h)) {
            Some(elem) => elem,
            None => match values.first() {
                Some(&first) => {
                    let ty = self.value_type(first);
                    self.pool.unshaped(ty)
                }
                None => Idx::TENSOR,
            },
        };
        for &v in &values {
            let ty = self.value_type(v);
            if !self.pool.is_subtype(ty, elem_ty) {
                return Err(LowerError::type_mismatch(
                    span,
                    format!(
                        "lists must contain only a single type, expected {} but found {} instead",
                        self.format_type(elem_ty),
                        self.format_type(ty)
                    ),
                ));
            }
        }
        Ok(self.emit_list(elem_ty, &values, span))
    }

    /// Lower literal elements, expanding `*tuple` in place.
    pub(crate) fn emit_values(&mut self, exprs: &[ExprId]) -> Result<Vec<ValueId>, LowerError> {
        Ok(self
            .emit_named_values(exprs)?
            .into_iter()
            .map(|nv| nv.value)
            .collect())
    }

    /// Lower call arguments, expanding `*tuple` in place.
    pub(crate) fn emit_named_values(
        &mut self,
        exprs: &[ExprId],
    ) -> Result<Vec<NamedValue>, LowerError> {
        let mut out = Vec::with_capacity(exprs.len());
        for &id in exprs {
            let expr = self.arena.expr(id);
            if let ExprKind::Starred(inner) = expr.kind {
                let tuple = self.emit_expr(inner)?;
                let ty = self.value_type(tuple);
                if self.pool.tuple_elems(ty).is_none() {
                    return Err(LowerError::type_mismatch(
                        expr.span,
                        format!(
                            "starred expression must be a tuple, found {}",
                            self.format_type(ty)
                        ),
                    ));
                }
                for value in self.unpack_tuple(tuple, expr.span) {
                    out.push(NamedValue::new(expr.span, value));
                }
            } else {
                out.push(NamedValue::new(expr.span, self.emit_expr(id)?));
            }
        }
        Ok(out)
    }
}
