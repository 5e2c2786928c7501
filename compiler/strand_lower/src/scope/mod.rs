//! Lexical environments for one function body.
//!
//! Each nested block gets a [`Frame`]. A name read inside a loop body that
//! was bound outside it becomes a loop-carried block input on first use;
//! after the body is emitted, [`ScopeStack::delete_extra_inputs`] drops the
//! inputs the body never rebinds.
//!
//! Captured names are kept in alphabetical order, so the carried-value
//! layout of a loop depends only on which names it touches, not on the
//! order they were first read.

use rustc_hash::FxHashMap;
use strand_graph::{BlockId, Graph, ValueId};
use strand_ir::{Name, Span, StringInterner};
use strand_types::{Pool, RebindPolicy};
use tracing::trace;

use crate::error::ReassignReason;
use crate::{LowerError, SugaredValue};

/// Everything scope operations need besides the stack itself.
pub struct ScopeCx<'a> {
    pub graph: &'a mut Graph,
    pub pool: &'a mut Pool,
    pub interner: &'a StringInterner,
    pub rebind: &'a dyn RebindPolicy,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum FrameKind {
    /// The function body.
    Function,
    /// One arm of an `if` or `assert`.
    Branch,
    /// A `while` or `for range` body; reads of outer values become block
    /// inputs.
    LoopBody,
    /// A statically unrolled `for`; shares its parent's block.
    Unrolled,
}

/// A branch type conflict that only becomes an error if the name is read.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DeferredTypeError {
    pub message: String,
    pub span: Span,
}

#[derive(Debug)]
pub struct Frame {
    block: BlockId,
    kind: FrameKind,
    bindings: FxHashMap<Name, SugaredValue>,
    /// Names materialized as loop-carried inputs, sorted by text.
    captured: Vec<Name>,
    /// Only populated on the function frame.
    deferred: FxHashMap<Name, DeferredTypeError>,
}

impl Frame {
    fn new(block: BlockId, kind: FrameKind) -> Self {
        Frame {
            block,
            kind,
            bindings: FxHashMap::default(),
            captured: Vec::new(),
            deferred: FxHashMap::default(),
        }
    }

    #[allow(dead_code)]
    pub fn block(&self) -> BlockId {
        self.block
    }

    #[allow(dead_code)]
    pub fn kind(&self) -> FrameKind {
        self.kind
    }

    pub fn captured(&self) -> &[Name] {
        &self.captured
    }

    /// Binding made in this frame, without consulting parents.
    pub fn local(&self, name: Name) -> Option<&SugaredValue> {
        self.bindings.get(&name)
    }

    /// Names bound in this frame, in alphabetical order.
    pub fn defined_names(&self, interner: &StringInterner) -> Vec<Name> {
        let mut names: Vec<Name> = self.bindings.keys().copied().collect();
        names.sort_by(|a, b| interner.lookup(*a).cmp(interner.lookup(*b)));
        names
    }
}

/// Whether a binding name should become a value's debug name.
///
/// Compiler temporaries (`_1`, `$x`) and a bare `_` are not.
pub fn is_meaningful_name(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        None | Some('$') => false,
        Some('_') => chars.any(|c| !c.is_ascii_digit()),
        Some(_) => true,
    }
}

#[derive(Debug)]
pub struct ScopeStack {
    frames: Vec<Frame>,
}

impl ScopeStack {
    pub fn new(root: BlockId) -> Self {
        ScopeStack {
            frames: vec![Frame::new(root, FrameKind::Function)],
        }
    }

    pub fn push(&mut self, block: BlockId, kind: FrameKind) {
        trace!(?block, ?kind, depth = self.frames.len(), "push frame");
        self.frames.push(Frame::new(block, kind));
    }

    /// Remove the innermost frame. `None` once only the function frame is
    /// left; it is never popped.
    pub fn pop(&mut self) -> Option<Frame> {
        if self.frames.len() == 1 {
            return None;
        }
        let frame = self.frames.pop()?;
        trace!(block = ?frame.block, kind = ?frame.kind, "pop frame");
        Some(frame)
    }

    #[allow(dead_code)]
    pub fn depth(&self) -> usize {
        self.frames.len()
    }

    pub fn top(&self) -> &Frame {
        &self.frames[self.frames.len() - 1]
    }

    /// Find `name`, innermost frame first, creating loop-carried inputs in
    /// every loop body it crosses.
    pub fn lookup(&mut self, cx: &mut ScopeCx<'_>, name: Name) -> Option<SugaredValue> {
        let top = self.frames.len() - 1;
        self.lookup_from(cx, top, name)
    }

    fn lookup_from(
        &mut self,
        cx: &mut ScopeCx<'_>,
        level: usize,
        name: Name,
    ) -> Option<SugaredValue> {
        if let Some(value) = self.frames[level].bindings.get(&name) {
            return Some(value.clone());
        }
        if level == 0 {
            return None;
        }
        let found = self.lookup_from(cx, level - 1, name)?;
        let frame = &mut self.frames[level];
        match found {
            SugaredValue::Plain(outer) if frame.kind == FrameKind::LoopBody => {
                Some(SugaredValue::Plain(capture(cx, frame, name, outer)))
            }
            other => Some(other),
        }
    }

    /// Resolve `name` for a read: local bindings, then `fallback` (builtins
    /// and the host resolver), then a deferred branch type error, then
    /// undefined.
    pub fn get(
        &mut self,
        cx: &mut ScopeCx<'_>,
        name: Name,
        span: Span,
        fallback: impl FnOnce(Name) -> Option<SugaredValue>,
    ) -> Result<SugaredValue, LowerError> {
        if let Some(value) = self.lookup(cx, name) {
            return Ok(value);
        }
        if let Some(value) = fallback(name) {
            return Ok(value);
        }
        if let Some(err) = self.frames[0].deferred.get(&name) {
            return Err(LowerError::TypeMismatch {
                message: format!("{}, and was used here", err.message),
                span,
                related: Some(err.span),
            });
        }
        Err(LowerError::UndefinedName {
            name: cx.interner.lookup(name).to_owned(),
            span,
        })
    }

    /// Bind `name` in the innermost frame.
    ///
    /// Rebinding a name that lives in an enclosing frame requires both the
    /// old and new values to be graph values, and the new type to satisfy
    /// the rebind policy. Inside a loop body such a rebind also creates the
    /// loop-carried input, so the new value can flow out of the loop.
    pub fn set(
        &mut self,
        cx: &mut ScopeCx<'_>,
        name: Name,
        value: SugaredValue,
        span: Span,
    ) -> Result<(), LowerError> {
        let top = self.frames.len() - 1;
        if let SugaredValue::Plain(v) = value {
            if cx.graph.debug_name(v).is_none()
                && is_meaningful_name(cx.interner.lookup(name))
                && cx.graph.defining_block(v) == self.frames[top].block
            {
                cx.graph.set_debug_name(v, name);
            }
        }

        if let Some(parent) = self.find_in_parent_frames(name) {
            let reason = match (parent, &value) {
                (SugaredValue::Plain(old), SugaredValue::Plain(new)) => {
                    let old_ty = cx.graph.value_type(*old);
                    let new_ty = cx.graph.value_type(*new);
                    if cx.rebind.is_rebind_compatible(cx.pool, old_ty, new_ty) {
                        None
                    } else {
                        Some(ReassignReason::IncompatibleType {
                            previous: cx.pool.format_type(old_ty),
                            found: cx.pool.format_type(new_ty),
                        })
                    }
                }
                (SugaredValue::Plain(_), other) | (other, _) => {
                    Some(ReassignReason::NotFirstClass {
                        kind: other.kind_name().to_owned(),
                    })
                }
            };
            if let Some(reason) = reason {
                return Err(LowerError::Reassignment {
                    name: cx.interner.lookup(name).to_owned(),
                    reason,
                    span,
                });
            }
        }

        if matches!(value, SugaredValue::Plain(_)) {
            // Writing an outer name inside a loop body carries it.
            self.lookup(cx, name);
        }
        self.frames[top].bindings.insert(name, value);
        Ok(())
    }

    /// Binding visible from an enclosing frame of the innermost one, without
    /// creating captures.
    pub fn find_in_parent_frames(&self, name: Name) -> Option<&SugaredValue> {
        let top = self.frames.len() - 1;
        self.frames[..top]
            .iter()
            .rev()
            .find_map(|f| f.bindings.get(&name))
    }

    /// Binding visible from any frame, without creating captures.
    pub fn find_in_any_frame(&self, name: Name) -> Option<&SugaredValue> {
        self.frames.iter().rev().find_map(|f| f.bindings.get(&name))
    }

    /// Read `name` as seen from a frame that was just popped: its own
    /// bindings first, then the live stack.
    pub fn lookup_through(
        &mut self,
        cx: &mut ScopeCx<'_>,
        popped: &Frame,
        name: Name,
    ) -> Option<SugaredValue> {
        match popped.bindings.get(&name) {
            Some(value) => Some(value.clone()),
            None => self.lookup(cx, name),
        }
    }

    /// Whether `name` is visible from a popped frame.
    pub fn visible_through(&self, popped: &Frame, name: Name) -> bool {
        popped.bindings.contains_key(&name) || self.find_in_any_frame(name).is_some()
    }

    /// Record a branch type conflict on the function frame.
    pub fn defer_type_error(&mut self, name: Name, error: DeferredTypeError) {
        self.frames[0].deferred.insert(name, error);
    }

    /// Drop loop-carried inputs of a popped loop body that the body passes
    /// through unchanged, redirecting their uses to the outer value.
    ///
    /// Expects the body block's outputs to be `(condition, carried...)`
    /// lined up with its inputs `(counter, carried...)`.
    pub fn delete_extra_inputs(
        &self,
        cx: &mut ScopeCx<'_>,
        body: &mut Frame,
        span: Span,
    ) -> Result<(), LowerError> {
        let block = body.block;
        let inputs = cx.graph.block(block).inputs.len();
        if inputs != cx.graph.block(block).outputs.len() || inputs != body.captured.len() + 1 {
            return Err(LowerError::internal(
                span,
                "loop body inputs and outputs are out of step",
            ));
        }
        for i in (1..inputs).rev() {
            let input = cx.graph.block(block).inputs[i];
            if input != cx.graph.block(block).outputs[i] {
                continue;
            }
            let name = body.captured[i - 1];
            let Some(outer) = self.find_in_any_frame(name).and_then(SugaredValue::as_plain) else {
                return Err(LowerError::internal(
                    span,
                    format!(
                        "captured name '{}' has no outer value",
                        cx.interner.lookup(name)
                    ),
                ));
            };
            cx.graph.replace_all_uses_with(input, outer);
            cx.graph.erase_block_input(block, i);
            cx.graph.erase_block_output(block, i);
            body.captured.remove(i - 1);
        }
        Ok(())
    }
}

/// Add a loop-carried input for `name` to `frame` and bind it there.
fn capture(
    cx: &mut ScopeCx<'_>,
    frame: &mut Frame,
    name: Name,
    outer: ValueId,
) -> ValueId {
    let text = cx.interner.lookup(name);
    let rank = frame
        .captured
        .partition_point(|n| cx.interner.lookup(*n) < text);
    frame.captured.insert(rank, name);
    let ty = cx.graph.value_type(outer);
    let input = cx.graph.insert_block_input(frame.block, rank + 1, ty);
    if is_meaningful_name(text) {
        cx.graph.set_debug_name(input, name);
    }
    trace!(name = text, ?input, block = ?frame.block, "captured loop-carried value");
    frame.bindings.insert(name, SugaredValue::Plain(input));
    input
}

#[cfg(test)]
mod tests;
