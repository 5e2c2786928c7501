//! Textual graph dump.

use std::fmt::{self, Write};

use strand_ir::StringInterner;
use strand_types::Pool;

use crate::{BlockId, Graph, NodeId, ValueId};

/// Display adapter returned by [`Graph::display`].
pub struct GraphDisplay<'a> {
    graph: &'a Graph,
    pool: &'a Pool,
    interner: &'a StringInterner,
}

impl Graph {
    /// Deterministic text form, one node per line, nested blocks indented.
    pub fn display<'a>(&'a self, pool: &'a Pool, interner: &'a StringInterner) -> GraphDisplay<'a> {
        GraphDisplay {
            graph: self,
            pool,
            interner,
        }
    }
}

impl GraphDisplay<'_> {
    fn value(&self, out: &mut String, value: ValueId) {
        match self.graph.debug_name(value) {
            Some(name) => {
                let _ = write!(out, "%{}.{}", self.interner.lookup(name), value.raw());
            }
            None => {
                let _ = write!(out, "%{}", value.raw());
            }
        }
    }

    fn typed_list(&self, out: &mut String, graph: &Graph, values: &[ValueId]) {
        for (i, &v) in values.iter().enumerate() {
            if i > 0 {
                out.push_str(", ");
            }
            GraphDisplay { graph, ..*self }.value(out, v);
            let _ = write!(out, " : {}", self.pool.format_type(graph.value_type(v)));
        }
    }

    fn plain_list(&self, out: &mut String, values: &[ValueId]) {
        for (i, &v) in values.iter().enumerate() {
            if i > 0 {
                out.push_str(", ");
            }
            self.value(out, v);
        }
    }

    fn block_body(&self, out: &mut String, block: BlockId, depth: usize) {
        for &node in &self.graph.block(block).nodes {
            self.node(out, node, depth);
        }
    }

    fn node(&self, out: &mut String, id: NodeId, depth: usize) {
        let node = self.graph.node(id);
        indent(out, depth);
        if !node.outputs.is_empty() {
            self.typed_list(out, self.graph, &node.outputs);
            out.push(' ');
        }
        let _ = write!(out, "= {}(", node.kind.describe(self.interner));
        self.plain_list(out, &node.inputs);
        out.push_str(")\n");

        for (i, &block) in node.blocks.iter().enumerate() {
            indent(out, depth + 1);
            let _ = write!(out, "block{i}(");
            self.typed_list(out, self.graph, &self.graph.block(block).inputs);
            out.push_str("):\n");
            self.block_body(out, block, depth + 2);
            indent(out, depth + 2);
            out.push_str("-> (");
            self.plain_list(out, &self.graph.block(block).outputs);
            out.push_str(")\n");
        }

        if let Some(sub) = &node.subgraph {
            let nested = GraphDisplay {
                graph: sub,
                pool: self.pool,
                interner: self.interner,
            };
            indent(out, depth + 1);
            out.push_str("subgraph(");
            nested.typed_list(out, sub, sub.inputs());
            out.push_str("):\n");
            nested.block_body(out, sub.root(), depth + 2);
            indent(out, depth + 2);
            out.push_str("-> (");
            nested.plain_list(out, sub.outputs());
            out.push_str(")\n");
        }
    }
}

fn indent(out: &mut String, depth: usize) {
    for _ in 0..depth {
        out.push_str("  ");
    }
}

impl fmt::Display for GraphDisplay<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut out = String::new();
        out.push_str("graph(");
        self.typed_list(&mut out, self.graph, self.graph.inputs());
        out.push_str("):\n");
        self.block_body(&mut out, self.graph.root(), 1);
        out.push_str("  return (");
        self.plain_list(&mut out, self.graph.outputs());
        out.push_str(")\n");
        f.write_str(&out)
    }
}
