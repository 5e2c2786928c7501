//! Script-tree builders shared by lowering tests.

use strand_graph::Graph;
use strand_ir::{
    BinaryOp, Def, ExprId, ExprKind, KeywordArg, Name, Param, ScriptArena, Span, StmtId,
    StmtKind, StringInterner, UnaryOp,
};
use strand_types::Pool;

use crate::{
    compile_function, CompiledFunction, LowerError, LowerOptions, NameResolver, Registry, Session,
};

/// Builds a [`ScriptArena`]. Every node gets its own span so diagnostics
/// can be told apart.
pub(crate) struct Script {
    pub arena: ScriptArena,
    pub interner: StringInterner,
    offset: u32,
}

impl Script {
    pub fn new() -> Self {
        Script {
            arena: ScriptArena::new(),
            interner: StringInterner::new(),
            offset: 0,
        }
    }

    fn span(&mut self) -> Span {
        let span = Span::new(self.offset, self.offset + 1);
        self.offset += 2;
        span
    }

    pub fn name(&self, text: &str) -> Name {
        self.interner.intern(text)
    }

    fn expr(&mut self, kind: ExprKind) -> ExprId {
        let span = self.span();
        self.arena.push_expr(kind, span)
    }

    fn stmt(&mut self, kind: StmtKind) -> StmtId {
        let span = self.span();
        self.arena.push_stmt(kind, span)
    }

    // ── Expressions ─────────────────────────────────────────────────

    pub fn int(&mut self, value: i64) -> ExprId {
        self.expr(ExprKind::Int(value))
    }

    pub fn float(&mut self, value: f64) -> ExprId {
        self.expr(ExprKind::Float(value.to_bits()))
    }

    pub fn boolean(&mut self, value: bool) -> ExprId {
        self.expr(ExprKind::Bool(value))
    }

    pub fn string(&mut self, text: &str) -> ExprId {
        let name = self.name(text);
        self.expr(ExprKind::Str(name))
    }

    pub fn none(&mut self) -> ExprId {
        self.expr(ExprKind::None)
    }

    pub fn ident(&mut self, text: &str) -> ExprId {
        let name = self.name(text);
        self.expr(ExprKind::Ident(name))
    }

    pub fn binary(&mut self, op: BinaryOp, left: ExprId, right: ExprId) -> ExprId {
        self.expr(ExprKind::Binary { op, left, right })
    }

    pub fn unary(&mut self, op: UnaryOp, operand: ExprId) -> ExprId {
        self.expr(ExprKind::Unary { op, operand })
    }

    pub fn ternary(&mut self, cond: ExprId, then_expr: ExprId, else_expr: ExprId) -> ExprId {
        self.expr(ExprKind::Ternary {
            cond,
            then_expr,
            else_expr,
        })
    }

    pub fn call(&mut self, callee: ExprId, args: Vec<ExprId>) -> ExprId {
        self.call_kw(callee, args, Vec::new())
    }

    pub fn call_kw(
        &mut self,
        callee: ExprId,
        args: Vec<ExprId>,
        kwargs: Vec<(&str, ExprId)>,
    ) -> ExprId {
        let kwargs = kwargs
            .into_iter()
            .map(|(name, value)| KeywordArg {
                name: self.name(name),
                value,
                span: self.arena.span(value),
            })
            .collect();
        self.expr(ExprKind::Call {
            callee,
            args,
            kwargs,
        })
    }

    /// `name(args...)`
    pub fn call_name(&mut self, name: &str, args: Vec<ExprId>) -> ExprId {
        let callee = self.ident(name);
        self.call(callee, args)
    }

    pub fn attr(&mut self, value: ExprId, field: &str) -> ExprId {
        let field = self.name(field);
        self.expr(ExprKind::Attribute { value, field })
    }

    /// `value.method(args...)`
    pub fn method(&mut self, value: ExprId, method: &str, args: Vec<ExprId>) -> ExprId {
        let callee = self.attr(value, method);
        self.call(callee, args)
    }

    pub fn subscript(&mut self, value: ExprId, indices: Vec<ExprId>) -> ExprId {
        self.expr(ExprKind::Subscript { value, indices })
    }

    pub fn slice(&mut self, start: Option<ExprId>, end: Option<ExprId>) -> ExprId {
        self.expr(ExprKind::Slice { start, end })
    }

    pub fn tuple(&mut self, elems: Vec<ExprId>) -> ExprId {
        self.expr(ExprKind::Tuple(elems))
    }

    pub fn list(&mut self, elems: Vec<ExprId>) -> ExprId {
        self.expr(ExprKind::List(elems))
    }

    pub fn starred(&mut self, value: ExprId) -> ExprId {
        self.expr(ExprKind::Starred(value))
    }

    /// `Ctor[args...]` in a type annotation.
    pub fn generic(&mut self, ctor: &str, args: Vec<ExprId>) -> ExprId {
        let ctor = self.ident(ctor);
        self.subscript(ctor, args)
    }

    // ── Statements ──────────────────────────────────────────────────

    pub fn expr_stmt(&mut self, expr: ExprId) -> StmtId {
        self.stmt(StmtKind::Expr(expr))
    }

    pub fn assign(&mut self, target: ExprId, value: ExprId) -> StmtId {
        self.stmt(StmtKind::Assign { target, value })
    }

    /// `name = value`
    pub fn set(&mut self, name: &str, value: ExprId) -> StmtId {
        let target = self.ident(name);
        self.assign(target, value)
    }

    pub fn aug_assign(&mut self, target: ExprId, op: BinaryOp, value: ExprId) -> StmtId {
        self.stmt(StmtKind::AugAssign { target, op, value })
    }

    pub fn if_else(&mut self, cond: ExprId, then_body: Vec<StmtId>, else_body: Vec<StmtId>) -> StmtId {
        self.stmt(StmtKind::If {
            cond,
            then_body,
            else_body,
        })
    }

    pub fn while_loop(&mut self, cond: ExprId, body: Vec<StmtId>) -> StmtId {
        self.stmt(StmtKind::While { cond, body })
    }

    pub fn for_loop(&mut self, target: &str, iter: ExprId, body: Vec<StmtId>) -> StmtId {
        let target = self.ident(target);
        self.stmt(StmtKind::For {
            targets: vec![target],
            iters: vec![iter],
            body,
        })
    }

    pub fn ret(&mut self, value: Option<ExprId>) -> StmtId {
        self.stmt(StmtKind::Return(value))
    }

    pub fn raise(&mut self, value: Option<ExprId>) -> StmtId {
        self.stmt(StmtKind::Raise(value))
    }

    pub fn assert(&mut self, test: ExprId, msg: Option<ExprId>) -> StmtId {
        self.stmt(StmtKind::Assert { test, msg })
    }

    pub fn pass(&mut self) -> StmtId {
        self.stmt(StmtKind::Pass)
    }

    pub fn global(&mut self, names: &[&str]) -> StmtId {
        let names = names.iter().map(|n| self.name(n)).collect();
        self.stmt(StmtKind::Global(names))
    }

    // ── Definitions ─────────────────────────────────────────────────

    /// A parameter annotated with a plain type name, or unannotated.
    pub fn param(&mut self, name: &str, annotation: Option<&str>) -> Param {
        let annotation = annotation.map(|ty| self.ident(ty));
        self.param_with(name, annotation, None)
    }

    pub fn param_with(
        &mut self,
        name: &str,
        annotation: Option<ExprId>,
        default: Option<ExprId>,
    ) -> Param {
        Param {
            name: self.name(name),
            annotation,
            default,
            span: self.span(),
        }
    }

    pub fn def(
        &mut self,
        name: &str,
        params: Vec<Param>,
        returns: Option<ExprId>,
        body: Vec<StmtId>,
    ) -> Def {
        Def {
            name: self.name(name),
            params,
            returns,
            body,
            span: self.span(),
        }
    }
}

/// A script plus everything needed to compile functions from it.
pub(crate) struct Harness {
    pub script: Script,
    pub pool: Pool,
    pub registry: Registry,
    pub options: LowerOptions,
}

impl Harness {
    /// Standard operator table, default options.
    pub fn new() -> Self {
        let script = Script::new();
        let mut pool = Pool::new();
        let registry = Registry::standard(&mut pool, &script.interner);
        Harness {
            script,
            pool,
            registry,
            options: LowerOptions::default(),
        }
    }

    /// Register extra operator declarations.
    pub fn declare(&mut self, decls: &[&str]) {
        for decl in decls {
            self.registry
                .declare(decl, &mut self.pool, &self.script.interner)
                .unwrap();
        }
    }

    pub fn compile(&mut self, def: &Def) -> Result<CompiledFunction, LowerError> {
        let session = Session::new(&self.script.interner, &self.registry).with_options(&self.options);
        compile_function(&session, &mut self.pool, &self.script.arena, def, None)
    }

    pub fn compile_with(
        &mut self,
        def: &Def,
        resolver: &dyn NameResolver,
    ) -> Result<CompiledFunction, LowerError> {
        let session = Session::new(&self.script.interner, &self.registry)
            .with_options(&self.options)
            .with_resolver(resolver);
        compile_function(&session, &mut self.pool, &self.script.arena, def, None)
    }

    pub fn print(&self, graph: &Graph) -> String {
        graph.display(&self.pool, &self.script.interner).to_string()
    }

    pub fn format_type(&self, ty: strand_types::Idx) -> String {
        self.pool.format_type(ty)
    }
}
