use pretty_assertions::assert_eq;
use strand_graph::{Graph, GraphBuilder, NodeKind};
use strand_ir::{Span, StringInterner};
use strand_types::{Idx, Pool, ShapeErased};

use super::*;

struct Fixture {
    graph: Graph,
    pool: Pool,
    interner: StringInterner,
}

impl Fixture {
    fn new() -> Self {
        Fixture {
            graph: GraphBuilder::new().finish(),
            pool: Pool::new(),
            interner: StringInterner::new(),
        }
    }

    fn cx(&mut self) -> ScopeCx<'_> {
        ScopeCx {
            graph: &mut self.graph,
            pool: &mut self.pool,
            interner: &self.interner,
            rebind: &ShapeErased,
        }
    }

    /// A loop node in `parent` with a body block holding only the counter.
    fn loop_body(&mut self, parent: BlockId) -> BlockId {
        let mut builder = GraphBuilder::new();
        std::mem::swap(builder.graph_mut(), &mut self.graph);
        builder.position_at(parent);
        let node = builder.emit(NodeKind::Loop, &[], &[], Span::DUMMY);
        let body = builder.graph_mut().add_node_block(node);
        builder.graph_mut().add_block_input(body, Idx::INT);
        self.graph = builder.finish();
        body
    }

    fn branch_block(&mut self, parent: BlockId) -> BlockId {
        let mut builder = GraphBuilder::new();
        std::mem::swap(builder.graph_mut(), &mut self.graph);
        builder.position_at(parent);
        let node = builder.emit(NodeKind::If, &[], &[], Span::DUMMY);
        let block = builder.graph_mut().add_node_block(node);
        self.graph = builder.finish();
        block
    }
}

fn bind_input(fx: &mut Fixture, scope: &mut ScopeStack, name: &str, ty: Idx) -> ValueId {
    let v = fx.graph.add_input(ty);
    let name = fx.interner.intern(name);
    scope.set(&mut fx.cx(), name, SugaredValue::Plain(v), Span::DUMMY).unwrap();
    v
}

#[test]
fn meaningful_names() {
    assert!(is_meaningful_name("x"));
    assert!(is_meaningful_name("_x"));
    assert!(is_meaningful_name("_1a"));
    assert!(!is_meaningful_name("_"));
    assert!(!is_meaningful_name("_12"));
    assert!(!is_meaningful_name("$tmp"));
    assert!(!is_meaningful_name(""));
}

#[test]
fn set_names_values_defined_in_current_block() {
    let mut fx = Fixture::new();
    let mut scope = ScopeStack::new(fx.graph.root());
    let x = bind_input(&mut fx, &mut scope, "x", Idx::INT);
    assert_eq!(fx.graph.debug_name(x), Some(fx.interner.intern("x")));

    // Already named: keeps the first name.
    let y = fx.interner.intern("y");
    scope.set(&mut fx.cx(), y, SugaredValue::Plain(x), Span::DUMMY).unwrap();
    assert_eq!(fx.graph.debug_name(x), Some(fx.interner.intern("x")));

    let tmp = fx.graph.add_input(Idx::INT);
    let hidden = fx.interner.intern("_0");
    scope.set(&mut fx.cx(), hidden, SugaredValue::Plain(tmp), Span::DUMMY).unwrap();
    assert_eq!(fx.graph.debug_name(tmp), None);
}

#[test]
fn loop_body_captures_in_alphabetical_order() {
    let mut fx = Fixture::new();
    let root = fx.graph.root();
    let mut scope = ScopeStack::new(root);
    let a = bind_input(&mut fx, &mut scope, "a", Idx::INT);
    let b = bind_input(&mut fx, &mut scope, "b", Idx::FLOAT);

    let body = fx.loop_body(root);
    scope.push(body, FrameKind::LoopBody);
    let name_a = fx.interner.intern("a");
    let name_b = fx.interner.intern("b");

    let seen_b = scope.lookup(&mut fx.cx(), name_b).unwrap();
    let seen_a = scope.lookup(&mut fx.cx(), name_a).unwrap();
    assert_ne!(seen_a, SugaredValue::Plain(a));
    assert_ne!(seen_b, SugaredValue::Plain(b));

    let inputs = &fx.graph.block(body).inputs;
    assert_eq!(inputs.len(), 3);
    assert_eq!(seen_a, SugaredValue::Plain(inputs[1]));
    assert_eq!(seen_b, SugaredValue::Plain(inputs[2]));
    assert_eq!(fx.graph.value_type(inputs[2]), Idx::FLOAT);
    assert_eq!(scope.top().captured(), &[name_a, name_b]);

    // A second read reuses the capture.
    assert_eq!(scope.lookup(&mut fx.cx(), name_a).unwrap(), seen_a);
    assert_eq!(fx.graph.block(body).inputs.len(), 3);
}

#[test]
fn nested_loops_capture_at_every_level() {
    let mut fx = Fixture::new();
    let root = fx.graph.root();
    let mut scope = ScopeStack::new(root);
    bind_input(&mut fx, &mut scope, "x", Idx::INT);
    let outer = fx.loop_body(root);
    scope.push(outer, FrameKind::LoopBody);
    let inner = fx.loop_body(outer);
    scope.push(inner, FrameKind::LoopBody);

    let x = fx.interner.intern("x");
    let seen = scope.lookup(&mut fx.cx(), x).unwrap();
    assert_eq!(fx.graph.block(outer).inputs.len(), 2);
    assert_eq!(fx.graph.block(inner).inputs.len(), 2);
    assert_eq!(seen, SugaredValue::Plain(fx.graph.block(inner).inputs[1]));
}

#[test]
fn branch_frames_do_not_capture() {
    let mut fx = Fixture::new();
    let root = fx.graph.root();
    let mut scope = ScopeStack::new(root);
    let x = bind_input(&mut fx, &mut scope, "x", Idx::INT);
    let then_block = fx.branch_block(root);
    scope.push(then_block, FrameKind::Branch);
    let name = fx.interner.intern("x");
    assert_eq!(scope.lookup(&mut fx.cx(), name), Some(SugaredValue::Plain(x)));
    assert!(fx.graph.block(then_block).inputs.is_empty());
    assert!(scope.top().local(name).is_none());
}

#[test]
fn rebind_in_nested_frame_checks_type() {
    let mut fx = Fixture::new();
    let root = fx.graph.root();
    let mut scope = ScopeStack::new(root);
    bind_input(&mut fx, &mut scope, "x", Idx::INT);
    let block = fx.branch_block(root);
    scope.push(block, FrameKind::Branch);

    let name = fx.interner.intern("x");
    let float = fx.graph.add_input(Idx::FLOAT);
    let err = scope
        .set(&mut fx.cx(), name, SugaredValue::Plain(float), Span::new(4, 5))
        .unwrap_err();
    assert_eq!(
        err,
        LowerError::Reassignment {
            name: "x".into(),
            reason: ReassignReason::IncompatibleType {
                previous: "int".into(),
                found: "float".into(),
            },
            span: Span::new(4, 5),
        }
    );

    let int = fx.graph.add_input(Idx::INT);
    scope.set(&mut fx.cx(), name, SugaredValue::Plain(int), Span::DUMMY).unwrap();
}

#[test]
fn shaped_tensors_rebind_across_ranks() {
    let mut fx = Fixture::new();
    let root = fx.graph.root();
    let mut scope = ScopeStack::new(root);
    let rank1 = fx.pool.shaped_tensor(1);
    let rank3 = fx.pool.shaped_tensor(3);
    bind_input(&mut fx, &mut scope, "t", rank1);
    let block = fx.branch_block(root);
    scope.push(block, FrameKind::Branch);
    let t = fx.interner.intern("t");
    let new = fx.graph.add_input(rank3);
    scope.set(&mut fx.cx(), t, SugaredValue::Plain(new), Span::DUMMY).unwrap();
}

#[test]
fn rebinding_a_non_value_is_rejected() {
    let mut fx = Fixture::new();
    let root = fx.graph.root();
    let mut scope = ScopeStack::new(root);
    let f = fx.interner.intern("f");
    let callee = SugaredValue::function(fx.interner.intern("relu"));
    scope.set(&mut fx.cx(), f, callee, Span::DUMMY).unwrap();
    let block = fx.branch_block(root);
    scope.push(block, FrameKind::Branch);
    let v = fx.graph.add_input(Idx::INT);
    let err = scope
        .set(&mut fx.cx(), f, SugaredValue::Plain(v), Span::DUMMY)
        .unwrap_err();
    assert!(matches!(
        err,
        LowerError::Reassignment {
            reason: ReassignReason::NotFirstClass { .. },
            ..
        }
    ));

    // Rebinding within the same frame is unrestricted.
    scope.pop().unwrap();
    scope.set(&mut fx.cx(), f, SugaredValue::Plain(v), Span::DUMMY).unwrap();
}

#[test]
fn delete_extra_inputs_drops_pass_through_values() {
    let mut fx = Fixture::new();
    let root = fx.graph.root();
    let mut scope = ScopeStack::new(root);
    bind_input(&mut fx, &mut scope, "a", Idx::INT);
    bind_input(&mut fx, &mut scope, "b", Idx::INT);
    let body = fx.loop_body(root);
    scope.push(body, FrameKind::LoopBody);
    let name_a = fx.interner.intern("a");
    let name_b = fx.interner.intern("b");
    scope.lookup(&mut fx.cx(), name_a).unwrap();
    scope.lookup(&mut fx.cx(), name_b).unwrap();
    let new_b = fx.graph.add_input(Idx::INT);
    scope.set(&mut fx.cx(), name_b, SugaredValue::Plain(new_b), Span::DUMMY).unwrap();

    let mut frame = scope.pop().unwrap();
    let cond = fx.graph.add_input(Idx::BOOL);
    fx.graph.add_block_output(body, cond);
    for name in frame.captured().to_vec() {
        let value = frame.local(name).and_then(SugaredValue::as_plain).unwrap();
        fx.graph.add_block_output(body, value);
    }
    let a_in = fx.graph.block(body).inputs[1];
    scope.delete_extra_inputs(&mut fx.cx(), &mut frame, Span::DUMMY).unwrap();

    assert_eq!(frame.captured(), &[name_b]);
    assert_eq!(fx.graph.block(body).inputs.len(), 2);
    assert_eq!(fx.graph.block(body).outputs, vec![cond, new_b]);
    assert!(!fx.graph.block(body).inputs.contains(&a_in));
}

#[test]
fn deferred_error_surfaces_on_read() {
    let mut fx = Fixture::new();
    let mut scope = ScopeStack::new(fx.graph.root());
    let a = fx.interner.intern("a");
    scope.defer_type_error(
        a,
        DeferredTypeError {
            message: "type mismatch: a is int in the true branch and Tensor in the false branch"
                .into(),
            span: Span::new(0, 10),
        },
    );
    let err = scope
        .get(&mut fx.cx(), a, Span::new(20, 21), |_| None)
        .unwrap_err();
    assert_eq!(
        err,
        LowerError::TypeMismatch {
            message: "type mismatch: a is int in the true branch and Tensor in the false branch, \
                      and was used here"
                .into(),
            span: Span::new(20, 21),
            related: Some(Span::new(0, 10)),
        }
    );

    let missing = fx.interner.intern("missing");
    let err = scope
        .get(&mut fx.cx(), missing, Span::DUMMY, |_| None)
        .unwrap_err();
    assert_eq!(err.to_string(), "undefined value missing");
}

#[test]
fn fallback_consulted_after_bindings() {
    let mut fx = Fixture::new();
    let mut scope = ScopeStack::new(fx.graph.root());
    let print = fx.interner.intern("print");
    let got = scope
        .get(&mut fx.cx(), print, Span::DUMMY, |_| Some(SugaredValue::NoneMarker))
        .unwrap();
    assert_eq!(got, SugaredValue::NoneMarker);
}

#[test]
fn loop_body_write_creates_carried_input() {
    let mut fx = Fixture::new();
    let root = fx.graph.root();
    let mut scope = ScopeStack::new(root);
    bind_input(&mut fx, &mut scope, "acc", Idx::INT);
    let body = fx.loop_body(root);
    scope.push(body, FrameKind::LoopBody);

    let acc = fx.interner.intern("acc");
    let fresh = fx.graph.add_input(Idx::INT);
    scope.set(&mut fx.cx(), acc, SugaredValue::Plain(fresh), Span::DUMMY).unwrap();

    assert_eq!(scope.top().captured(), &[acc]);
    assert_eq!(fx.graph.block(body).inputs.len(), 2);
    assert_eq!(scope.top().local(acc), Some(&SugaredValue::Plain(fresh)));
}

#[test]
fn function_frame_is_never_popped() {
    let mut fx = Fixture::new();
    let root = fx.graph.root();
    let mut scope = ScopeStack::new(root);
    let block = fx.branch_block(root);
    scope.push(block, FrameKind::Branch);
    assert_eq!(scope.pop().map(|frame| frame.block), Some(block));
    assert!(scope.pop().is_none());
    assert_eq!(scope.depth(), 1);
}
