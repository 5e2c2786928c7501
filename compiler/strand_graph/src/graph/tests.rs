use pretty_assertions::assert_eq;
use strand_ir::{Constant, Span};
use strand_types::Idx;

use super::*;

#[test]
fn block_inputs_insert_and_erase() {
    let mut g = Graph::new();
    let root = g.root();
    let a = g.add_block_input(root, Idx::INT);
    let c = g.add_block_input(root, Idx::FLOAT);
    let b = g.insert_block_input(root, 1, Idx::BOOL);
    assert_eq!(g.inputs(), &[a, b, c]);
    g.erase_block_input(root, 0);
    assert_eq!(g.inputs(), &[b, c]);
    assert_eq!(g.defining_block(b), root);
    assert_eq!(g.value_type(b), Idx::BOOL);
}

#[test]
fn replace_all_uses_reaches_nested_blocks() {
    let mut g = Graph::new();
    let root = g.root();
    let x = g.add_input(Idx::INT);
    let y = g.add_input(Idx::INT);

    let loop_node = g.create_node(NodeKind::Loop, &[x], root, Span::DUMMY);
    g.append_node(root, loop_node);
    let body = g.add_node_block(loop_node);
    g.add_block_output(body, x);
    g.register_output(x);

    g.replace_all_uses_with(x, y);
    assert_eq!(g.node(loop_node).inputs.as_slice(), &[y]);
    assert_eq!(g.block(body).outputs, vec![y]);
    assert_eq!(g.outputs(), &[y]);
    assert_eq!(g.owning_kind(body), Some(&NodeKind::Loop));
}

#[test]
fn constant_value_and_producer() {
    let mut g = Graph::new();
    let root = g.root();
    let node = g.create_node(NodeKind::Constant(Constant::Int(7)), &[], root, Span::DUMMY);
    g.append_node(root, node);
    let out = g.add_node_output(node, Idx::INT);
    assert_eq!(g.producer(out), Some(node));
    assert_eq!(g.constant_value(out), Some(Constant::Int(7)));

    let param = g.add_input(Idx::INT);
    assert_eq!(g.producer(param), None);
    assert_eq!(g.constant_value(param), None);
}

#[test]
fn walk_visits_nested_blocks_in_order() {
    let mut g = Graph::new();
    let root = g.root();
    let cond = g.add_input(Idx::BOOL);
    let if_node = g.create_node(NodeKind::If, &[cond], root, Span::DUMMY);
    g.append_node(root, if_node);
    let then_block = g.add_node_block(if_node);
    let inner = g.create_node(NodeKind::Print, &[], then_block, Span::DUMMY);
    g.append_node(then_block, inner);
    let after = g.create_node(NodeKind::Undefined, &[], root, Span::DUMMY);
    g.append_node(root, after);

    assert_eq!(g.walk_nodes(), vec![if_node, inner, after]);
    assert_eq!(g.count_nodes(|k| matches!(k, NodeKind::If)), 1);

    let detached = g.detach_blocks(if_node);
    assert_eq!(detached.as_slice(), &[then_block]);
    assert_eq!(g.walk_nodes(), vec![if_node, after]);
    assert_eq!(g.block(then_block).owner, None);
}
