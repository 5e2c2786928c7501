//! Human-readable type rendering.

use std::fmt::Write;

use crate::{Idx, Pool, Tag};

impl Pool {
    /// Render a type the way annotations spell it, e.g. `List[Optional[int]]`.
    pub fn format_type(&self, idx: Idx) -> String {
        let mut out = String::new();
        self.format_into(idx, &mut out);
        out
    }

    fn format_into(&self, idx: Idx, out: &mut String) {
        match self.tag(idx) {
            Tag::Int => out.push_str("int"),
            Tag::Float => out.push_str("float"),
            Tag::Bool => out.push_str("bool"),
            Tag::Str => out.push_str("str"),
            Tag::NoneType => out.push_str("None"),
            Tag::Tensor => out.push_str("Tensor"),
            Tag::Number => out.push_str("number"),
            Tag::Device => out.push_str("Device"),
            Tag::ShapedTensor => {
                let rank = self.shaped_rank(idx).unwrap_or(0);
                let _ = write!(out, "Tensor(dims={rank})");
            }
            Tag::List | Tag::Optional | Tag::Future => {
                let ctor = match self.tag(idx) {
                    Tag::List => "List",
                    Tag::Optional => "Optional",
                    _ => "Future",
                };
                out.push_str(ctor);
                out.push('[');
                if let Some(child) = self.child(idx) {
                    self.format_into(child, out);
                }
                out.push(']');
            }
            Tag::Tuple => {
                out.push_str("Tuple[");
                for (i, &elem) in self.tuple_elems(idx).unwrap_or(&[]).iter().enumerate() {
                    if i > 0 {
                        out.push_str(", ");
                    }
                    self.format_into(elem, out);
                }
                out.push(']');
            }
            Tag::Var => out.push_str(self.var_name(idx).unwrap_or("?")),
        }
    }
}
