//! Annotated script tree.
//!
//! The external parser produces this flattened form: every expression and
//! statement lives in a [`ScriptArena`] and children are referenced by
//! index. Nodes carry the span they were parsed from.

use std::fmt;

use crate::{Name, Span};

/// Index of an expression in a [`ScriptArena`].
#[derive(Copy, Clone, Eq, PartialEq, Hash)]
#[repr(transparent)]
pub struct ExprId(u32);

impl ExprId {
    #[inline]
    pub const fn new(raw: u32) -> Self {
        ExprId(raw)
    }

    #[inline]
    pub const fn raw(self) -> u32 {
        self.0
    }

    #[inline]
    pub const fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Debug for ExprId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "e{}", self.0)
    }
}

/// Index of a statement in a [`ScriptArena`].
#[derive(Copy, Clone, Eq, PartialEq, Hash)]
#[repr(transparent)]
pub struct StmtId(u32);

impl StmtId {
    #[inline]
    pub const fn new(raw: u32) -> Self {
        StmtId(raw)
    }

    #[inline]
    pub const fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Debug for StmtId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "s{}", self.0)
    }
}

/// Binary, comparison and boolean operators.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum BinaryOp {
    Add,
    Sub,
    Mul,
    Div,
    FloorDiv,
    Mod,
    Pow,
    MatMul,
    BitAnd,
    BitOr,
    BitXor,
    /// Short-circuiting `and`.
    And,
    /// Short-circuiting `or`.
    Or,
    Eq,
    NotEq,
    Lt,
    Gt,
    LtEq,
    GtEq,
    Is,
    IsNot,
}

impl BinaryOp {
    /// Surface spelling, used in diagnostics.
    pub fn as_symbol(self) -> &'static str {
        match self {
            BinaryOp::Add => "+",
            BinaryOp::Sub => "-",
            BinaryOp::Mul => "*",
            BinaryOp::Div => "/",
            BinaryOp::FloorDiv => "//",
            BinaryOp::Mod => "%",
            BinaryOp::Pow => "**",
            BinaryOp::MatMul => "@",
            BinaryOp::BitAnd => "&",
            BinaryOp::BitOr => "|",
            BinaryOp::BitXor => "^",
            BinaryOp::And => "and",
            BinaryOp::Or => "or",
            BinaryOp::Eq => "==",
            BinaryOp::NotEq => "!=",
            BinaryOp::Lt => "<",
            BinaryOp::Gt => ">",
            BinaryOp::LtEq => "<=",
            BinaryOp::GtEq => ">=",
            BinaryOp::Is => "is",
            BinaryOp::IsNot => "is not",
        }
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum UnaryOp {
    Neg,
    Not,
}

/// `name=value` in a call.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct KeywordArg {
    pub name: Name,
    pub value: ExprId,
    pub span: Span,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ExprKind {
    Int(i64),
    /// Float literal stored as bits.
    Float(u64),
    Bool(bool),
    Str(Name),
    None,
    Ident(Name),
    Binary {
        op: BinaryOp,
        left: ExprId,
        right: ExprId,
    },
    Unary {
        op: UnaryOp,
        operand: ExprId,
    },
    /// `then_expr if cond else else_expr`
    Ternary {
        cond: ExprId,
        then_expr: ExprId,
        else_expr: ExprId,
    },
    Call {
        callee: ExprId,
        args: Vec<ExprId>,
        kwargs: Vec<KeywordArg>,
    },
    /// `value.field`
    Attribute {
        value: ExprId,
        field: Name,
    },
    /// `value[i, j, ...]`
    Subscript {
        value: ExprId,
        indices: Vec<ExprId>,
    },
    /// `start:end`, only meaningful inside a subscript.
    Slice {
        start: Option<ExprId>,
        end: Option<ExprId>,
    },
    Tuple(Vec<ExprId>),
    List(Vec<ExprId>),
    /// `*value`
    Starred(ExprId),
}

impl ExprKind {
    /// Short description for diagnostics.
    pub fn describe(&self) -> &'static str {
        match self {
            ExprKind::Int(_) => "integer literal",
            ExprKind::Float(_) => "float literal",
            ExprKind::Bool(_) => "boolean literal",
            ExprKind::Str(_) => "string literal",
            ExprKind::None => "None",
            ExprKind::Ident(_) => "identifier",
            ExprKind::Binary { .. } => "binary expression",
            ExprKind::Unary { .. } => "unary expression",
            ExprKind::Ternary { .. } => "conditional expression",
            ExprKind::Call { .. } => "call",
            ExprKind::Attribute { .. } => "attribute access",
            ExprKind::Subscript { .. } => "subscript",
            ExprKind::Slice { .. } => "slice",
            ExprKind::Tuple(_) => "tuple literal",
            ExprKind::List(_) => "list literal",
            ExprKind::Starred(_) => "starred expression",
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Expr {
    pub kind: ExprKind,
    pub span: Span,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum StmtKind {
    /// Expression evaluated for effect.
    Expr(ExprId),
    Assign {
        target: ExprId,
        value: ExprId,
    },
    AugAssign {
        target: ExprId,
        op: BinaryOp,
        value: ExprId,
    },
    If {
        cond: ExprId,
        then_body: Vec<StmtId>,
        else_body: Vec<StmtId>,
    },
    While {
        cond: ExprId,
        body: Vec<StmtId>,
    },
    For {
        targets: Vec<ExprId>,
        iters: Vec<ExprId>,
        body: Vec<StmtId>,
    },
    Return(Option<ExprId>),
    Raise(Option<ExprId>),
    Assert {
        test: ExprId,
        msg: Option<ExprId>,
    },
    Pass,
    Global(Vec<Name>),
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Stmt {
    pub kind: StmtKind,
    pub span: Span,
}

/// Function parameter declaration.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Param {
    pub name: Name,
    /// Type annotation expression, if written.
    pub annotation: Option<ExprId>,
    pub default: Option<ExprId>,
    pub span: Span,
}

/// A function definition: the unit of compilation.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Def {
    pub name: Name,
    pub params: Vec<Param>,
    pub returns: Option<ExprId>,
    pub body: Vec<StmtId>,
    pub span: Span,
}

/// Flat storage for the script tree.
#[derive(Clone, Debug, Default)]
pub struct ScriptArena {
    exprs: Vec<Expr>,
    stmts: Vec<Stmt>,
}

impl ScriptArena {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push_expr(&mut self, kind: ExprKind, span: Span) -> ExprId {
        let id = ExprId(u32::try_from(self.exprs.len()).unwrap_or_else(|_| {
            panic!("script arena exceeded u32::MAX expressions");
        }));
        self.exprs.push(Expr { kind, span });
        id
    }

    pub fn push_stmt(&mut self, kind: StmtKind, span: Span) -> StmtId {
        let id = StmtId(u32::try_from(self.stmts.len()).unwrap_or_else(|_| {
            panic!("script arena exceeded u32::MAX statements");
        }));
        self.stmts.push(Stmt { kind, span });
        id
    }

    #[inline]
    pub fn expr(&self, id: ExprId) -> &Expr {
        &self.exprs[id.index()]
    }

    #[inline]
    pub fn stmt(&self, id: StmtId) -> &Stmt {
        &self.stmts[id.index()]
    }

    #[inline]
    pub fn span(&self, id: ExprId) -> Span {
        self.exprs[id.index()].span
    }

    pub fn expr_count(&self) -> usize {
        self.exprs.len()
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn arena_indices_are_sequential() {
        let mut arena = ScriptArena::new();
        let a = arena.push_expr(ExprKind::Int(1), Span::new(0, 1));
        let b = arena.push_expr(ExprKind::Int(2), Span::new(4, 5));
        let sum = arena.push_expr(
            ExprKind::Binary {
                op: BinaryOp::Add,
                left: a,
                right: b,
            },
            Span::new(0, 5),
        );
        assert_eq!(sum.raw(), 2);
        assert_eq!(arena.span(b), Span::new(4, 5));
        assert_eq!(arena.expr(sum).kind.describe(), "binary expression");
        assert_eq!(arena.expr_count(), 3);
    }

    #[test]
    fn operator_symbols() {
        assert_eq!(BinaryOp::IsNot.as_symbol(), "is not");
        assert_eq!(BinaryOp::FloorDiv.as_symbol(), "//");
    }
}
