//! Arena storage for values, nodes and blocks.

use smallvec::SmallVec;
use strand_ir::{Constant, Name, Span};
use strand_types::Idx;

use crate::{BlockId, NodeId, NodeKind, ValueId};

/// Where a value comes from.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ValueDef {
    /// Output of a node.
    Node(NodeId),
    /// Input of a block.
    Param(BlockId),
}

#[derive(Clone, Debug)]
pub struct ValueData {
    pub ty: Idx,
    pub def: ValueDef,
    /// Source-level name, for debug output only.
    pub debug_name: Option<Name>,
}

#[derive(Clone, Debug)]
pub struct NodeData {
    pub kind: NodeKind,
    pub inputs: SmallVec<[ValueId; 4]>,
    pub outputs: SmallVec<[ValueId; 2]>,
    pub blocks: SmallVec<[BlockId; 2]>,
    /// Block this node is placed in.
    pub owner: BlockId,
    pub span: Span,
    /// Detached body of a `Fork`.
    pub subgraph: Option<Box<Graph>>,
}

#[derive(Clone, Debug, Default)]
pub struct BlockData {
    pub inputs: Vec<ValueId>,
    pub nodes: Vec<NodeId>,
    pub outputs: Vec<ValueId>,
    /// Control node owning this block; `None` for the root block and for
    /// blocks detached from their node.
    pub owner: Option<NodeId>,
}

/// A function body in graph form.
#[derive(Clone, Debug)]
pub struct Graph {
    values: Vec<ValueData>,
    nodes: Vec<NodeData>,
    blocks: Vec<BlockData>,
    root: BlockId,
}

fn next_id(len: usize) -> u32 {
    u32::try_from(len).unwrap_or_else(|_| panic!("graph arena exceeded u32::MAX entries"))
}

impl Graph {
    pub fn new() -> Self {
        Graph {
            values: Vec::new(),
            nodes: Vec::new(),
            blocks: vec![BlockData::default()],
            root: BlockId::new(0),
        }
    }

    #[inline]
    pub fn root(&self) -> BlockId {
        self.root
    }

    // ── Accessors ───────────────────────────────────────────────────

    #[inline]
    pub fn value(&self, id: ValueId) -> &ValueData {
        &self.values[id.index()]
    }

    #[inline]
    pub fn value_type(&self, id: ValueId) -> Idx {
        self.values[id.index()].ty
    }

    #[inline]
    pub fn node(&self, id: NodeId) -> &NodeData {
        &self.nodes[id.index()]
    }

    #[inline]
    pub fn block(&self, id: BlockId) -> &BlockData {
        &self.blocks[id.index()]
    }

    /// The node that defines `value`, if it is a node output.
    pub fn producer(&self, value: ValueId) -> Option<NodeId> {
        match self.value(value).def {
            ValueDef::Node(node) => Some(node),
            ValueDef::Param(_) => None,
        }
    }

    /// The block a value is defined in.
    pub fn defining_block(&self, value: ValueId) -> BlockId {
        match self.value(value).def {
            ValueDef::Node(node) => self.node(node).owner,
            ValueDef::Param(block) => block,
        }
    }

    /// The literal behind `value`, when it is the output of a constant node.
    pub fn constant_value(&self, value: ValueId) -> Option<Constant> {
        let node = self.producer(value)?;
        match self.node(node).kind {
            NodeKind::Constant(c) => Some(c),
            _ => None,
        }
    }

    /// Kind of the control node owning `block`, if any.
    pub fn owning_kind(&self, block: BlockId) -> Option<&NodeKind> {
        self.block(block).owner.map(|n| &self.node(n).kind)
    }

    pub fn debug_name(&self, value: ValueId) -> Option<Name> {
        self.value(value).debug_name
    }

    pub fn set_debug_name(&mut self, value: ValueId, name: Name) {
        self.values[value.index()].debug_name = Some(name);
    }

    pub fn inputs(&self) -> &[ValueId] {
        &self.block(self.root).inputs
    }

    pub fn outputs(&self) -> &[ValueId] {
        &self.block(self.root).outputs
    }

    // ── Construction ────────────────────────────────────────────────

    fn new_value(&mut self, ty: Idx, def: ValueDef) -> ValueId {
        let id = ValueId::new(next_id(self.values.len()));
        self.values.push(ValueData {
            ty,
            def,
            debug_name: None,
        });
        id
    }

    /// Create a node that is not yet placed in any block's node list.
    pub(crate) fn create_node(
        &mut self,
        kind: NodeKind,
        inputs: &[ValueId],
        owner: BlockId,
        span: Span,
    ) -> NodeId {
        let id = NodeId::new(next_id(self.nodes.len()));
        self.nodes.push(NodeData {
            kind,
            inputs: inputs.iter().copied().collect(),
            outputs: SmallVec::new(),
            blocks: SmallVec::new(),
            owner,
            span,
            subgraph: None,
        });
        id
    }

    pub(crate) fn append_node(&mut self, block: BlockId, node: NodeId) {
        self.blocks[block.index()].nodes.push(node);
    }

    pub(crate) fn prepend_node(&mut self, block: BlockId, node: NodeId) {
        self.blocks[block.index()].nodes.insert(0, node);
    }

    pub fn add_node_output(&mut self, node: NodeId, ty: Idx) -> ValueId {
        let value = self.new_value(ty, ValueDef::Node(node));
        self.nodes[node.index()].outputs.push(value);
        value
    }

    pub fn add_node_input(&mut self, node: NodeId, value: ValueId) {
        self.nodes[node.index()].inputs.push(value);
    }

    /// Create a new empty block owned by `node`.
    pub fn add_node_block(&mut self, node: NodeId) -> BlockId {
        let block = BlockId::new(next_id(self.blocks.len()));
        self.blocks.push(BlockData {
            owner: Some(node),
            ..BlockData::default()
        });
        self.nodes[node.index()].blocks.push(block);
        block
    }

    /// Detach every block from `node`; the blocks stay in the arena but
    /// are no longer reachable from the root.
    pub fn detach_blocks(&mut self, node: NodeId) -> SmallVec<[BlockId; 2]> {
        let blocks = std::mem::take(&mut self.nodes[node.index()].blocks);
        for &b in &blocks {
            self.blocks[b.index()].owner = None;
        }
        blocks
    }

    pub fn set_subgraph(&mut self, node: NodeId, subgraph: Graph) {
        self.nodes[node.index()].subgraph = Some(Box::new(subgraph));
    }

    pub fn add_block_input(&mut self, block: BlockId, ty: Idx) -> ValueId {
        let value = self.new_value(ty, ValueDef::Param(block));
        self.blocks[block.index()].inputs.push(value);
        value
    }

    /// Insert a block input at `index`, shifting later inputs right.
    pub fn insert_block_input(&mut self, block: BlockId, index: usize, ty: Idx) -> ValueId {
        let value = self.new_value(ty, ValueDef::Param(block));
        self.blocks[block.index()].inputs.insert(index, value);
        value
    }

    pub fn erase_block_input(&mut self, block: BlockId, index: usize) {
        self.blocks[block.index()].inputs.remove(index);
    }

    pub fn add_block_output(&mut self, block: BlockId, value: ValueId) {
        self.blocks[block.index()].outputs.push(value);
    }

    pub fn erase_block_output(&mut self, block: BlockId, index: usize) {
        self.blocks[block.index()].outputs.remove(index);
    }

    /// Add a function parameter.
    pub fn add_input(&mut self, ty: Idx) -> ValueId {
        self.add_block_input(self.root, ty)
    }

    /// Add a function result.
    pub fn register_output(&mut self, value: ValueId) {
        self.add_block_output(self.root, value);
    }

    /// Redirect every use of `old` to `new`: node inputs and block outputs
    /// anywhere in this graph.
    pub fn replace_all_uses_with(&mut self, old: ValueId, new: ValueId) {
        for node in &mut self.nodes {
            for input in &mut node.inputs {
                if *input == old {
                    *input = new;
                }
            }
        }
        for block in &mut self.blocks {
            for output in &mut block.outputs {
                if *output == old {
                    *output = new;
                }
            }
        }
    }

    // ── Traversal ───────────────────────────────────────────────────

    /// Every node reachable from the root, in program order, nested block
    /// contents following their owner. Sub-graphs are not entered.
    pub fn walk_nodes(&self) -> Vec<NodeId> {
        let mut out = Vec::with_capacity(self.nodes.len());
        self.walk_block(self.root, &mut out);
        out
    }

    fn walk_block(&self, block: BlockId, out: &mut Vec<NodeId>) {
        for &node in &self.block(block).nodes {
            out.push(node);
            for &nested in &self.node(node).blocks {
                self.walk_block(nested, out);
            }
        }
    }

    /// Number of reachable nodes matching `pred`.
    pub fn count_nodes(&self, pred: impl Fn(&NodeKind) -> bool) -> usize {
        self.walk_nodes()
            .into_iter()
            .filter(|&n| pred(&self.node(n).kind))
            .count()
    }
}

impl Default for Graph {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests;
