//! The function-body lowering pass.
//!
//! One [`Lowerer`] compiles one [`Def`]. Work is split by concern:
//! expressions (`expr`), call resolution (`call`, `schema`), subscripts
//! (`subscript`), assignment forms (`assign`), structured control flow
//! (`control_flow`) and `fork` (`fork`).

mod assign;
mod call;
mod control_flow;
mod expr;
mod fork;
mod schema;
mod subscript;


use rustc_hash::FxHashMap;
use strand_graph::{GraphBuilder, NodeKind, ValueId};
use strand_ir::{Constant, Def, ExprId, Name, ScriptArena, Span, StmtId, StmtKind, StringInterner};
use strand_types::{Argument, FunctionSignature, Idx, Pool};
use tracing::{debug, debug_span};

use crate::annotations::{default_constant, TypeParser};
use crate::scope::{Frame, FrameKind, ScopeCx, ScopeStack};
use crate::stack::ensure_sufficient_stack;
use crate::sugared::builtin;
use crate::{CompiledFunction, LowerError, Session, SugaredValue};

pub(crate) use schema::NamedValue;

/// Build a [`ScopeCx`] from disjoint fields of a [`Lowerer`].
macro_rules! scope_cx {
    ($this:ident) => {
        ScopeCx {
            graph: $this.builder.graph_mut(),
            pool: &mut *$this.pool,
            interner: $this.interner,
            rebind: $this.session.rebind,
        }
    };
}
pub(crate) use scope_cx;

pub(crate) struct Lowerer<'a> {
    session: &'a Session<'a>,
    interner: &'a StringInterner,
    pool: &'a mut Pool,
    arena: &'a ScriptArena,
    builder: GraphBuilder,
    scope: ScopeStack,
    /// Entry-block constants, one per distinct int or float literal.
    constants: FxHashMap<Constant, ValueId>,
}

/// Type of a literal.
pub(crate) fn constant_type(c: Constant) -> Idx {
    match c {
        Constant::Int(_) => Idx::INT,
        Constant::Float(_) => Idx::FLOAT,
        Constant::Bool(_) => Idx::BOOL,
        Constant::Str(_) => Idx::STR,
        Constant::None => Idx::NONE,
    }
}

impl<'a> Lowerer<'a> {
    pub(crate) fn new(session: &'a Session<'a>, pool: &'a mut Pool, arena: &'a ScriptArena) -> Self {
        let builder = GraphBuilder::new();
        let scope = ScopeStack::new(builder.graph().root());
        Lowerer {
            session,
            interner: session.interner,
            pool,
            arena,
            builder,
            scope,
            constants: FxHashMap::default(),
        }
    }

    pub(crate) fn compile(
        mut self,
        def: &Def,
        receiver: Option<SugaredValue>,
    ) -> Result<CompiledFunction, LowerError> {
        let fn_name = self.interner.lookup(def.name);
        let _span = debug_span!("compile_function", name = fn_name).entered();

        let mut signature = FunctionSignature::new(def.name);
        let mut params = def.params.iter();
        if let Some(receiver) = receiver {
            let Some(self_param) = params.next() else {
                return Err(LowerError::unsupported(
                    def.span,
                    "methods must have a self argument",
                ));
            };
            self.bind(self_param.name, receiver, self_param.span)?;
        }
        for param in params {
            let (ty, arity) = match param.annotation {
                Some(ann) => self.type_parser().parse_param(ann)?,
                None => (Idx::TENSOR, None),
            };
            let mut arg = Argument::new(param.name, ty);
            if let Some(n) = arity {
                arg = arg.with_arity(n);
            }
            if let Some(default) = param.default {
                arg = arg.with_default(default_constant(self.arena, default)?);
            }
            signature.arguments.push(arg);
            let input = self.builder.graph_mut().add_input(ty);
            self.bind(param.name, SugaredValue::Plain(input), param.span)?;
        }
        let declared = match def.returns {
            Some(ann) => Some(self.type_parser().parse(ann)?),
            None => None,
        };

        let arena = self.arena;
        let (body, ret) = match def.body.split_last() {
            Some((&last, rest)) if matches!(arena.stmt(last).kind, StmtKind::Return(_)) => {
                (rest, Some(last))
            }
            _ => (&def.body[..], None),
        };
        self.emit_statements(body)?;

        let returned = match ret.map(|s| (&arena.stmt(s).kind, arena.stmt(s).span)) {
            Some((StmtKind::Return(Some(expr)), span)) => Some(self.emit_return(*expr, declared, span)?),
            _ => None,
        };
        match (returned, declared) {
            (Some(value), _) => {
                let ty = self.builder.graph().value_type(value);
                self.builder.graph_mut().register_output(value);
                signature.returns.push(ty);
            }
            (None, Some(ty)) if ty != Idx::NONE => {
                return Err(LowerError::type_mismatch(
                    def.span,
                    format!(
                        "function was annotated as returning {} but does not return a value",
                        self.pool.format_type(ty)
                    ),
                ));
            }
            (None, _) => {}
        }

        let graph = self.builder.finish();
        debug!(
            name = fn_name,
            nodes = graph.walk_nodes().len(),
            inputs = graph.inputs().len(),
            "compiled function"
        );
        Ok(CompiledFunction { graph, signature })
    }

    fn emit_return(
        &mut self,
        expr: ExprId,
        declared: Option<Idx>,
        span: Span,
    ) -> Result<ValueId, LowerError> {
        let value = self.emit_expr_hinted(expr, declared)?;
        let Some(ty) = declared else {
            return Ok(value);
        };
        let value = self.convert_value(value, ty, true, span)?;
        let actual = self.builder.graph().value_type(value);
        if !self.pool.is_subtype(actual, ty) {
            return Err(LowerError::type_mismatch(
                self.arena.span(expr),
                format!(
                    "return value was annotated as having type {} but is actually of type {}",
                    self.pool.format_type(ty),
                    self.pool.format_type(actual)
                ),
            ));
        }
        Ok(value)
    }

    // ── Statements ──────────────────────────────────────────────────

    pub(crate) fn emit_statements(&mut self, stmts: &[StmtId]) -> Result<(), LowerError> {
        for &stmt in stmts {
            ensure_sufficient_stack(|| self.emit_statement(stmt))?;
        }
        Ok(())
    }

    fn emit_statement(&mut self, id: StmtId) -> Result<(), LowerError> {
        let stmt = self.arena.stmt(id);
        let span = stmt.span;
        match &stmt.kind {
            StmtKind::Expr(expr) => {
                self.emit_sugared_expr(*expr)?;
                Ok(())
            }
            StmtKind::Assign { target, value } => self.emit_assignment(*target, *value, span),
            StmtKind::AugAssign { target, op, value } => {
                self.emit_aug_assignment(*target, *op, *value, span)
            }
            StmtKind::If {
                cond,
                then_body,
                else_body,
            } => self.emit_if(*cond, then_body, else_body, span),
            StmtKind::While { cond, body } => self.emit_while(*cond, body, span),
            StmtKind::For {
                targets,
                iters,
                body,
            } => self.emit_for(targets, iters, body, span),
            StmtKind::Return(_) => Err(LowerError::unsupported(
                span,
                "return statements can appear only at the end of the function body",
            )),
            StmtKind::Raise(expr) => {
                self.emit_raise(*expr, span);
                Ok(())
            }
            StmtKind::Assert { test, msg } => self.emit_assert(*test, *msg, span),
            StmtKind::Pass => Ok(()),
            StmtKind::Global(_) => Err(LowerError::unsupported(
                span,
                "global statements are not supported",
            )),
        }
    }

    // ── Names ───────────────────────────────────────────────────────

    /// Read a name: locals, builtins, the host resolver, then registered
    /// operators and library functions.
    pub(crate) fn lookup_name(&mut self, name: Name, span: Span) -> Result<SugaredValue, LowerError> {
        let session = self.session;
        let interner = self.interner;
        let mut cx = scope_cx!(self);
        self.scope.get(&mut cx, name, span, |name| {
            builtin(interner.lookup(name))
                .or_else(|| session.resolver.resolve(name, span))
                .or_else(|| {
                    let registered = !session.registry.overloads(name).is_empty()
                        || !session.registry.library_functions(name).is_empty();
                    registered.then(|| SugaredValue::function(name))
                })
        })
    }

    pub(crate) fn bind(&mut self, name: Name, value: SugaredValue, span: Span) -> Result<(), LowerError> {
        let mut cx = scope_cx!(self);
        self.scope.set(&mut cx, name, value, span)
    }

    pub(crate) fn push_frame(&mut self, block: strand_graph::BlockId, kind: FrameKind) {
        self.scope.push(block, kind);
    }

    pub(crate) fn pop_frame(&mut self, span: Span) -> Result<Frame, LowerError> {
        self.scope
            .pop()
            .ok_or_else(|| LowerError::internal(span, "scope stack underflow"))
    }

    // ── Values ──────────────────────────────────────────────────────

    pub(crate) fn value_type(&self, value: ValueId) -> Idx {
        self.builder.graph().value_type(value)
    }

    pub(crate) fn format_type(&self, ty: Idx) -> String {
        self.pool.format_type(ty)
    }

    pub(crate) fn sym(&self, text: &str) -> Name {
        self.interner.intern(text)
    }

    pub(crate) fn type_parser(&mut self) -> TypeParser<'_> {
        TypeParser {
            arena: self.arena,
            interner: self.interner,
            pool: &mut *self.pool,
        }
    }

    /// Require a graph value.
    pub(crate) fn as_value(&self, value: SugaredValue, span: Span) -> Result<ValueId, LowerError> {
        match value {
            SugaredValue::Plain(v) => Ok(v),
            SugaredValue::Projection(obj) => Err(LowerError::type_mismatch(
                span,
                format!(
                    "{} cannot be used as a value",
                    self.session.resolver.describe(obj)
                ),
            )),
            other => Err(LowerError::type_mismatch(
                span,
                format!("{} cannot be used as a value", other.kind_name()),
            )),
        }
    }

    /// Materialize a literal. Ints and floats are shared from the entry
    /// block when interning is on; other literals are placed at the
    /// insertion point.
    pub(crate) fn constant(&mut self, c: Constant, span: Span) -> ValueId {
        let ty = constant_type(c);
        match c {
            Constant::Int(_) | Constant::Float(_) if self.session.options.intern_constants => {
                if let Some(&v) = self.constants.get(&c) {
                    return v;
                }
                let v = self.builder.emit_at_entry(NodeKind::Constant(c), ty, span);
                self.constants.insert(c, v);
                v
            }
            _ => self.builder.emit_value(NodeKind::Constant(c), &[], ty, span),
        }
    }

    /// A boolean condition; anything else is a type error.
    pub(crate) fn emit_cond(&mut self, expr: ExprId) -> Result<ValueId, LowerError> {
        let value = self.emit_expr(expr)?;
        let ty = self.value_type(value);
        if ty == Idx::BOOL {
            return Ok(value);
        }
        let mut message = format!(
            "expected a boolean expression for condition but found {}",
            self.format_type(ty)
        );
        if self.pool.is_tensor(ty) {
            message.push_str(", to use a tensor in a boolean expression, explicitly cast it with `bool()`");
        }
        Err(LowerError::type_mismatch(self.arena.span(expr), message))
    }

    pub(crate) fn ensure_int(&self, value: ValueId, span: Span) -> Result<ValueId, LowerError> {
        let ty = self.value_type(value);
        if ty == Idx::INT {
            Ok(value)
        } else {
            Err(LowerError::type_mismatch(
                span,
                format!("expected an int but found a {}", self.format_type(ty)),
            ))
        }
    }

    /// The elements of a tuple value, reusing the operands of a
    /// `TupleConstruct` instead of unpacking it again.
    pub(crate) fn unpack_tuple(&mut self, tuple: ValueId, span: Span) -> Vec<ValueId> {
        let graph = self.builder.graph();
        if let Some(node) = graph.producer(tuple) {
            if graph.node(node).kind == NodeKind::TupleConstruct {
                return graph.node(node).inputs.to_vec();
            }
        }
        let elems: Vec<Idx> = self
            .pool
            .tuple_elems(self.value_type(tuple))
            .map(<[Idx]>::to_vec)
            .unwrap_or_default();
        let node = self.builder.emit(NodeKind::TupleUnpack, &[tuple], &elems, span);
        self.builder.graph().node(node).outputs.to_vec()
    }

    pub(crate) fn emit_tuple(&mut self, values: &[ValueId], span: Span) -> ValueId {
        let elems: Vec<Idx> = values.iter().map(|&v| self.value_type(v)).collect();
        let ty = self.pool.tuple(&elems);
        self.builder.emit_value(NodeKind::TupleConstruct, values, ty, span)
    }

    pub(crate) fn emit_list(&mut self, elem: Idx, values: &[ValueId], span: Span) -> ValueId {
        let ty = self.pool.list(elem);
        self.builder.emit_value(NodeKind::ListConstruct, values, ty, span)
    }

    /// A call result as one value: single outputs pass through, anything
    /// else is packed into a tuple.
    pub(crate) fn pack_outputs(&mut self, outputs: &[ValueId], span: Span) -> ValueId {
        match outputs {
            [single] => *single,
            _ => self.emit_tuple(outputs, span),
        }
    }
}
