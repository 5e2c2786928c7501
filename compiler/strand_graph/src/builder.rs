//! Graph construction with a movable insertion point.

use strand_ir::Span;
use strand_types::Idx;

use crate::{BlockId, Graph, NodeId, NodeKind, ValueId};

/// Appends nodes to the end of the current insertion block.
///
/// Lowering moves the insertion point into nested blocks while emitting a
/// control construct and back out afterwards.
pub struct GraphBuilder {
    graph: Graph,
    insert: BlockId,
}

impl GraphBuilder {
    pub fn new() -> Self {
        let graph = Graph::new();
        let insert = graph.root();
        GraphBuilder { graph, insert }
    }

    #[inline]
    pub fn graph(&self) -> &Graph {
        &self.graph
    }

    #[inline]
    pub fn graph_mut(&mut self) -> &mut Graph {
        &mut self.graph
    }

    /// Block that new nodes are appended to.
    #[inline]
    pub fn insertion_block(&self) -> BlockId {
        self.insert
    }

    #[inline]
    pub fn position_at(&mut self, block: BlockId) {
        self.insert = block;
    }

    /// Append a node with one output per entry of `output_types`.
    pub fn emit(
        &mut self,
        kind: NodeKind,
        inputs: &[ValueId],
        output_types: &[Idx],
        span: Span,
    ) -> NodeId {
        let node = self.graph.create_node(kind, inputs, self.insert, span);
        self.graph.append_node(self.insert, node);
        for &ty in output_types {
            self.graph.add_node_output(node, ty);
        }
        node
    }

    /// Append a single-output node and return its output.
    pub fn emit_value(
        &mut self,
        kind: NodeKind,
        inputs: &[ValueId],
        ty: Idx,
        span: Span,
    ) -> ValueId {
        let node = self.emit(kind, inputs, &[ty], span);
        self.graph.node(node).outputs[0]
    }

    /// Place a single-output, input-free node at the very start of the root
    /// block, where every later block can see it.
    pub fn emit_at_entry(&mut self, kind: NodeKind, ty: Idx, span: Span) -> ValueId {
        let root = self.graph.root();
        let node = self.graph.create_node(kind, &[], root, span);
        self.graph.prepend_node(root, node);
        self.graph.add_node_output(node, ty)
    }

    pub fn finish(self) -> Graph {
        self.graph
    }
}

impl Default for GraphBuilder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use strand_ir::Constant;

    use super::*;

    #[test]
    fn emit_follows_insertion_point() {
        let mut b = GraphBuilder::new();
        let root = b.graph().root();
        let cond = b.graph_mut().add_input(Idx::BOOL);
        let if_node = b.emit(NodeKind::If, &[cond], &[Idx::INT], Span::new(0, 4));
        let then_block = b.graph_mut().add_node_block(if_node);

        b.position_at(then_block);
        let one = b.emit_value(
            NodeKind::Constant(Constant::Int(1)),
            &[],
            Idx::INT,
            Span::DUMMY,
        );
        assert_eq!(b.graph().defining_block(one), then_block);

        b.position_at(root);
        let entry = b.emit_at_entry(NodeKind::Constant(Constant::Int(2)), Idx::INT, Span::DUMMY);
        let graph = b.finish();
        let root_nodes = &graph.block(root).nodes;
        assert_eq!(root_nodes.len(), 2);
        assert_eq!(graph.producer(entry), Some(root_nodes[0]));
        assert_eq!(root_nodes[1], if_node);
    }
}
