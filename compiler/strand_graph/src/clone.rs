//! Copying block contents between graphs.
//!
//! Used to inline library function bodies into a caller and to move a
//! fork body into its own sub-graph.

use rustc_hash::FxHashMap;
use smallvec::SmallVec;

use crate::{BlockId, Graph, ValueId};

/// Resolves a source value that is not defined inside the cloned region.
///
/// Returning `None` aborts the clone.
pub type OuterValues<'a> = dyn FnMut(&mut Graph, ValueId) -> Option<ValueId> + 'a;

/// Append copies of every node in `src_block` to `dst_block`.
///
/// `map` translates source values to destination values. It may be
/// pre-seeded (for example with callee inputs mapped to call arguments)
/// and is extended with every value the clone defines. A source value
/// missing from `map` is passed to `outer` once; its answer is memoized.
///
/// Returns the first source value `outer` could not resolve.
pub fn clone_block_body(
    src: &Graph,
    src_block: BlockId,
    dst: &mut Graph,
    dst_block: BlockId,
    map: &mut FxHashMap<ValueId, ValueId>,
    outer: &mut OuterValues<'_>,
) -> Result<(), ValueId> {
    for &node_id in &src.block(src_block).nodes {
        let node = src.node(node_id);
        let mut inputs = SmallVec::<[ValueId; 4]>::with_capacity(node.inputs.len());
        for &input in &node.inputs {
            inputs.push(map_value(dst, map, outer, input)?);
        }

        let copy = dst.create_node(node.kind.clone(), &inputs, dst_block, node.span);
        dst.append_node(dst_block, copy);
        for &output in &node.outputs {
            let value = src.value(output);
            let new = dst.add_node_output(copy, value.ty);
            if let Some(name) = value.debug_name {
                dst.set_debug_name(new, name);
            }
            map.insert(output, new);
        }
        if let Some(subgraph) = &node.subgraph {
            dst.set_subgraph(copy, (**subgraph).clone());
        }

        for &nested in &node.blocks {
            let new_block = dst.add_node_block(copy);
            for &input in &src.block(nested).inputs {
                let value = src.value(input);
                let new = dst.add_block_input(new_block, value.ty);
                if let Some(name) = value.debug_name {
                    dst.set_debug_name(new, name);
                }
                map.insert(input, new);
            }
            clone_block_body(src, nested, dst, new_block, map, outer)?;
            for &output in &src.block(nested).outputs {
                let new = map_value(dst, map, outer, output)?;
                dst.add_block_output(new_block, new);
            }
        }
    }
    Ok(())
}

/// Translate one source value through `map`, falling back to `outer`.
pub fn map_value(
    dst: &mut Graph,
    map: &mut FxHashMap<ValueId, ValueId>,
    outer: &mut OuterValues<'_>,
    value: ValueId,
) -> Result<ValueId, ValueId> {
    if let Some(&mapped) = map.get(&value) {
        return Ok(mapped);
    }
    let mapped = outer(dst, value).ok_or(value)?;
    map.insert(value, mapped);
    Ok(mapped)
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use strand_ir::{Constant, Span, StringInterner};
    use strand_types::Idx;

    use super::*;
    use crate::{GraphBuilder, NodeKind};

    #[test]
    fn clone_captures_outer_values_in_first_use_order() {
        let interner = StringInterner::new();
        let add = interner.intern("add");

        // Source: a Fork-like node whose block reads two root values.
        let mut b = GraphBuilder::new();
        let x = b.graph_mut().add_input(Idx::INT);
        let y = b.graph_mut().add_input(Idx::INT);
        let holder = b.emit(NodeKind::Fork, &[], &[], Span::DUMMY);
        let body = b.graph_mut().add_node_block(holder);
        b.position_at(body);
        let sum = b.emit_value(NodeKind::Call(add), &[y, x], Idx::INT, Span::DUMMY);
        let again = b.emit_value(NodeKind::Call(add), &[sum, y], Idx::INT, Span::DUMMY);
        b.graph_mut().add_block_output(body, again);
        let src = b.finish();

        let mut dst = Graph::new();
        let dst_root = dst.root();
        let mut captured = Vec::new();
        let mut map = FxHashMap::default();
        let mut outer = |g: &mut Graph, v: ValueId| {
            captured.push(v);
            Some(g.add_input(Idx::INT))
        };
        clone_block_body(&src, body, &mut dst, dst_root, &mut map, &mut outer).unwrap();
        let out = map_value(&mut dst, &mut map, &mut outer, again).unwrap();
        dst.register_output(out);

        assert_eq!(captured, vec![y, x]);
        assert_eq!(dst.inputs().len(), 2);
        assert_eq!(dst.block(dst_root).nodes.len(), 2);
        let first = dst.node(dst.block(dst_root).nodes[0]);
        assert_eq!(first.inputs.as_slice(), &[dst.inputs()[0], dst.inputs()[1]]);
    }

    #[test]
    fn clone_reports_unresolved_values() {
        let mut b = GraphBuilder::new();
        let x = b.graph_mut().add_input(Idx::INT);
        let one = b.emit_value(
            NodeKind::Constant(Constant::Int(1)),
            &[],
            Idx::INT,
            Span::DUMMY,
        );
        b.emit(NodeKind::TupleConstruct, &[x, one], &[Idx::INT], Span::DUMMY);
        let src = b.finish();

        let mut dst = Graph::new();
        let dst_root = dst.root();
        let mut map = FxHashMap::default();
        let result = clone_block_body(&src, src.root(), &mut dst, dst_root, &mut map, &mut |_, _| {
            None
        });
        assert_eq!(result, Err(x));
    }
}
