//! `fork(fn, args...)`: a call recorded as a detached sub-graph.

use rustc_hash::FxHashMap;
use strand_graph::{clone_block_body, map_value, BlockId, Graph, NodeId, NodeKind, ValueId};
use strand_ir::Span;
use tracing::debug;

use super::{Lowerer, NamedValue};
use crate::{LowerError, SugaredValue};

impl Lowerer<'_> {
    /// Emit the call inside a `Fork` node's block, then lift that block into
    /// a sub-graph. The node yields `Future[T]` of the call's result.
    pub(crate) fn emit_fork(
        &mut self,
        callee: SugaredValue,
        args: &[NamedValue],
        kwargs: &[NamedValue],
        span: Span,
    ) -> Result<ValueId, LowerError> {
        let node = self.builder.emit(NodeKind::Fork, &[], &[], span);
        let body = self.builder.graph_mut().add_node_block(node);
        let saved = self.builder.insertion_block();
        self.builder.position_at(body);
        let result = self.emit_call(callee, args, kwargs, span)?;
        let result = self.as_value(result, span)?;
        self.builder.graph_mut().add_block_output(body, result);
        self.builder.position_at(saved);

        let ty = self.value_type(result);
        let future = self.pool.future(ty);
        let output = self.builder.graph_mut().add_node_output(node, future);
        self.lift_fork(node, body, span)?;
        Ok(output)
    }

    /// Move `body` into its own graph. Every outer value it reads becomes a
    /// sub-graph input and a matching node input, in order of first use.
    fn lift_fork(&mut self, node: NodeId, body: BlockId, span: Span) -> Result<(), LowerError> {
        let mut subgraph = Graph::new();
        let root = subgraph.root();
        let mut map = FxHashMap::default();
        let mut captured = Vec::new();
        {
            let outer = self.builder.graph();
            let mut capture = |sub: &mut Graph, value: ValueId| -> Option<ValueId> {
                let input = sub.add_input(outer.value_type(value));
                if let Some(name) = outer.debug_name(value) {
                    sub.set_debug_name(input, name);
                }
                captured.push(value);
                Some(input)
            };
            let unresolved = |value: ValueId| {
                LowerError::internal(span, format!("fork body value {value:?} could not be captured"))
            };
            clone_block_body(outer, body, &mut subgraph, root, &mut map, &mut capture)
                .map_err(unresolved)?;
            for &result in &outer.block(body).outputs {
                let mapped = map_value(&mut subgraph, &mut map, &mut capture, result)
                    .map_err(unresolved)?;
                subgraph.register_output(mapped);
            }
        }

        debug!(captured = captured.len(), "lifted fork body");
        let graph = self.builder.graph_mut();
        for value in captured {
            graph.add_node_input(node, value);
        }
        graph.detach_blocks(node);
        graph.set_subgraph(node, subgraph);
        Ok(())
    }
}
