//! `if`, `while`, `for`, `assert` and `raise`.

use strand_graph::{BlockId, NodeId, NodeKind, ValueId};
use strand_ir::{BinaryOp, Constant, ExprId, ExprKind, Name, Span, StmtId};
use strand_types::Idx;
use tracing::debug;

use super::{scope_cx, Lowerer, NamedValue};
use crate::scope::{DeferredTypeError, Frame, FrameKind, ScopeCx};
use crate::sugared::{Callable, NoneStatus, SpecialForm};
use crate::{LowerError, SugaredValue};

impl Lowerer<'_> {
    pub(crate) fn emit_if(
        &mut self,
        cond: ExprId,
        then_body: &[StmtId],
        else_body: &[StmtId],
        span: Span,
    ) -> Result<(), LowerError> {
        let cond_expr = self.arena.expr(cond);
        let ExprKind::Binary {
            op: op @ (BinaryOp::Is | BinaryOp::IsNot),
            left,
            right,
        } = cond_expr.kind
        else {
            let cond_value = self.emit_cond(cond)?;
            return self.emit_if_else_blocks(cond_value, then_body, else_body, span);
        };

        // `x is None` is often decidable from types alone; only the branch
        // that can run is emitted.
        let lhs = self.emit_sugared_expr(left)?;
        let rhs = self.emit_sugared_expr(right)?;
        let (always_none, never_none) = if op == BinaryOp::Is {
            (then_body, else_body)
        } else {
            (else_body, then_body)
        };
        let graph = self.builder.graph();
        match (lhs.none_status(graph, self.pool), rhs.none_status(graph, self.pool)) {
            (NoneStatus::Always, NoneStatus::Always) => self.emit_statements(always_none),
            (NoneStatus::Always, NoneStatus::Never) | (NoneStatus::Never, NoneStatus::Always) => {
                self.emit_statements(never_none)
            }
            _ => {
                let args = [
                    NamedValue::new(self.arena.span(left), self.as_value(lhs, self.arena.span(left))?),
                    NamedValue::new(self.arena.span(right), self.as_value(rhs, self.arena.span(right))?),
                ];
                let name = if op == BinaryOp::Is { "__is__" } else { "__isnot__" };
                let cond_value = self.call_operator(name, &args, cond_expr.span)?;
                self.emit_if_else_blocks(cond_value, then_body, else_body, span)
            }
        }
    }

    fn emit_if_else_blocks(
        &mut self,
        cond: ValueId,
        then_body: &[StmtId],
        else_body: &[StmtId],
        span: Span,
    ) -> Result<(), LowerError> {
        let node = self.builder.emit(NodeKind::If, &[cond], &[], span);
        let then_block = self.builder.graph_mut().add_node_block(node);
        let else_block = self.builder.graph_mut().add_node_block(node);
        let then_frame = self.emit_branch(then_block, then_body, span)?;
        let else_frame = self.emit_branch(else_block, else_body, span)?;

        // A name leaves the `if` only when it is defined on both paths.
        let mut mutated: Vec<Name> = Vec::new();
        for name in then_frame.defined_names(self.interner) {
            if self.scope.visible_through(&else_frame, name) {
                mutated.push(name);
            }
        }
        for name in else_frame.defined_names(self.interner) {
            if self.scope.visible_through(&then_frame, name) {
                mutated.push(name);
            }
        }
        mutated.sort_by(|a, b| self.interner.lookup(*a).cmp(self.interner.lookup(*b)));
        mutated.dedup();

        for name in mutated {
            let then_value = self.branch_value(&then_frame, name, span)?;
            let else_value = self.branch_value(&else_frame, name, span)?;
            let then_ty = self.value_type(then_value);
            let else_ty = self.value_type(else_value);
            let Some(unified) = self.pool.unify_types(then_ty, else_ty) else {
                let message = format!(
                    "type mismatch: {} is set to type {} in the true branch and type {} in the false branch",
                    self.interner.lookup(name),
                    self.format_type(then_ty),
                    self.format_type(else_ty)
                );
                if self.scope.find_in_any_frame(name).is_some() {
                    return Err(LowerError::type_mismatch(span, message));
                }
                debug!(name = self.interner.lookup(name), "deferring branch type mismatch");
                self.scope
                    .defer_type_error(name, DeferredTypeError { message, span });
                continue;
            };
            let graph = self.builder.graph_mut();
            graph.add_block_output(then_block, then_value);
            graph.add_block_output(else_block, else_value);
            let output = graph.add_node_output(node, unified);
            self.bind(name, SugaredValue::Plain(output), span)?;
        }
        Ok(())
    }

    /// Emit one arm in its own frame and hand back that frame.
    fn emit_branch(
        &mut self,
        block: BlockId,
        body: &[StmtId],
        span: Span,
    ) -> Result<Frame, LowerError> {
        let saved = self.builder.insertion_block();
        self.push_frame(block, FrameKind::Branch);
        self.builder.position_at(block);
        self.emit_statements(body)?;
        self.builder.position_at(saved);
        self.pop_frame(span)
    }

    /// The value `name` has at the end of a popped branch.
    fn branch_value(&mut self, frame: &Frame, name: Name, span: Span) -> Result<ValueId, LowerError> {
        let mut cx = scope_cx!(self);
        let value = self.scope.lookup_through(&mut cx, frame, name).ok_or_else(|| {
            LowerError::internal(
                span,
                format!("'{}' vanished while merging branches", self.interner.lookup(name)),
            )
        })?;
        self.as_value(value, span)
    }

    pub(crate) fn emit_while(
        &mut self,
        cond: ExprId,
        body: &[StmtId],
        span: Span,
    ) -> Result<(), LowerError> {
        self.emit_loop(None, Some(cond), body, None, span)
    }

    pub(crate) fn emit_for(
        &mut self,
        targets: &[ExprId],
        iters: &[ExprId],
        body: &[StmtId],
        span: Span,
    ) -> Result<(), LowerError> {
        let [iter] = iters else {
            return Err(LowerError::unsupported(
                span,
                "list of iterables is not supported currently",
            ));
        };
        let [target] = targets else {
            return Err(LowerError::unsupported(
                span,
                "iteration variable unpacking is not supported",
            ));
        };
        let ExprKind::Ident(target) = self.arena.expr(*target).kind else {
            return Err(LowerError::unsupported(
                self.arena.span(*target),
                "unexpected expression in variable initialization of for loop",
            ));
        };

        if let ExprKind::Call { callee, args, .. } = &self.arena.expr(*iter).kind {
            if self.is_range_builtin(*callee) {
                let [count] = args[..] else {
                    return Err(LowerError::unsupported(
                        self.arena.span(*iter),
                        format!("range() expects 1 argument but got {}", args.len()),
                    ));
                };
                return self.emit_loop(Some(count), None, body, Some(target), span);
            }
        }

        let sequence = self.emit_sugared_expr(*iter)?;
        let instances = self.as_tuple(sequence, None, self.arena.span(*iter))?;
        self.emit_unrolled_for(target, instances, body, span)
    }

    /// `range` written directly and not shadowed by a local binding.
    fn is_range_builtin(&self, callee: ExprId) -> bool {
        let ExprKind::Ident(name) = self.arena.expr(callee).kind else {
            return false;
        };
        self.scope.find_in_any_frame(name).is_none()
            && matches!(
                crate::sugared::builtin(self.interner.lookup(name)),
                Some(SugaredValue::Callable(Callable::Special(SpecialForm::Range)))
            )
    }

    /// Re-emit `body` once per element. Names that exist outside the loop
    /// take the value bound by the last iteration.
    fn emit_unrolled_for(
        &mut self,
        target: Name,
        instances: Vec<SugaredValue>,
        body: &[StmtId],
        span: Span,
    ) -> Result<(), LowerError> {
        let limit = self.session.options.max_unroll;
        if instances.len() > limit {
            return Err(LowerError::unsupported(
                span,
                format!(
                    "cannot unroll a for loop over {} elements; the limit is {limit}",
                    instances.len()
                ),
            ));
        }
        let block = self.builder.insertion_block();
        self.push_frame(block, FrameKind::Unrolled);
        for instance in instances {
            self.bind(target, instance, span)?;
            self.emit_statements(body)?;
        }

        let mut escaping = Vec::new();
        for name in self.scope.top().defined_names(self.interner) {
            if self.scope.find_in_parent_frames(name).is_none() {
                continue;
            }
            let value = self.lookup_name(name, span)?;
            escaping.push((name, self.as_value(value, span)?));
        }
        self.pop_frame(span)?;
        for (name, value) in escaping {
            self.bind(name, SugaredValue::Plain(value), span)?;
        }
        Ok(())
    }

    /// A `Loop` node. `max_trip` absent means unbounded; `cond` absent
    /// means always continue. When `counter` is given it is bound to the
    /// iteration number inside the body.
    fn emit_loop(
        &mut self,
        max_trip: Option<ExprId>,
        cond: Option<ExprId>,
        body: &[StmtId],
        counter: Option<Name>,
        span: Span,
    ) -> Result<(), LowerError> {
        let max_trip_value = match max_trip {
            Some(expr) => {
                let value = self.emit_expr(expr)?;
                self.ensure_int(value, self.arena.span(expr))?
            }
            None => self.constant(Constant::Int(i64::MAX), span),
        };
        let cond_value = match cond {
            Some(expr) => self.emit_cond(expr)?,
            None => self.constant(Constant::Bool(true), span),
        };
        let node = self
            .builder
            .emit(NodeKind::Loop, &[max_trip_value, cond_value], &[], span);
        let body_block = self.builder.graph_mut().add_node_block(node);
        let trip_count = self.builder.graph_mut().add_block_input(body_block, Idx::INT);

        let saved = self.builder.insertion_block();
        self.push_frame(body_block, FrameKind::LoopBody);
        self.builder.position_at(body_block);
        if let Some(name) = counter {
            self.bind(name, SugaredValue::Plain(trip_count), span)?;
        }
        self.emit_statements(body)?;
        let next_cond = match cond {
            Some(expr) => self.emit_cond(expr)?,
            None => self.constant(Constant::Bool(true), span),
        };
        self.builder.graph_mut().add_block_output(body_block, next_cond);
        let mut body_frame = self.pop_frame(span)?;
        self.builder.position_at(saved);

        self.thread_loop_carried(node, body_block, &mut body_frame, span)
    }

    /// Wire the captured names of a finished loop body through the node.
    fn thread_loop_carried(
        &mut self,
        node: NodeId,
        body_block: BlockId,
        body_frame: &mut Frame,
        span: Span,
    ) -> Result<(), LowerError> {
        for &name in body_frame.captured() {
            let Some(value) = body_frame.local(name).and_then(SugaredValue::as_plain) else {
                return Err(LowerError::internal(
                    span,
                    format!(
                        "loop-carried name '{}' is not a value",
                        self.interner.lookup(name)
                    ),
                ));
            };
            self.builder.graph_mut().add_block_output(body_block, value);
        }
        {
            let mut cx: ScopeCx<'_> = scope_cx!(self);
            self.scope.delete_extra_inputs(&mut cx, body_frame, span)?;
        }

        for (i, &name) in body_frame.captured().iter().enumerate() {
            let outer = self.lookup_name(name, span)?;
            let outer = self.as_value(outer, span)?;
            let graph = self.builder.graph_mut();
            graph.add_node_input(node, outer);
            let ty = graph.value_type(graph.block(body_block).inputs[i + 1]);
            let output = graph.add_node_output(node, ty);
            self.bind(name, SugaredValue::Plain(output), span)?;
        }
        Ok(())
    }

    pub(crate) fn emit_assert(
        &mut self,
        test: ExprId,
        msg: Option<ExprId>,
        span: Span,
    ) -> Result<(), LowerError> {
        let cond = self.emit_cond(test)?;
        let node = self.builder.emit(NodeKind::If, &[cond], &[], span);
        self.builder.graph_mut().add_node_block(node);
        let else_block = self.builder.graph_mut().add_node_block(node);

        let message = msg
            .and_then(|m| self.string_literal(m))
            .unwrap_or("AssertionError");
        let saved = self.builder.insertion_block();
        self.push_frame(else_block, FrameKind::Branch);
        self.builder.position_at(else_block);
        self.emit_raise_message(message, span);
        self.pop_frame(span)?;
        self.builder.position_at(saved);
        Ok(())
    }

    /// `raise E("message")`: only the literal message survives.
    pub(crate) fn emit_raise(&mut self, expr: Option<ExprId>, span: Span) {
        let message = expr
            .and_then(|e| match &self.arena.expr(e).kind {
                ExprKind::Call { args, .. } => args.first().and_then(|&a| self.string_literal(a)),
                _ => self.string_literal(e),
            })
            .unwrap_or("Exception");
        self.emit_raise_message(message, span);
    }

    fn emit_raise_message(&mut self, message: &str, span: Span) {
        let text = self.constant(Constant::Str(self.sym(message)), span);
        self.builder
            .emit(NodeKind::RaiseException, &[text], &[], span);
    }

    fn string_literal(&self, expr: ExprId) -> Option<&'static str> {
        match self.arena.expr(expr).kind {
            ExprKind::Str(s) => Some(self.interner.lookup(s)),
            _ => None,
        }
    }
}
