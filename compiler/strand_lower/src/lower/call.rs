//! Call sites, builtins and attribute access.

use strand_graph::{NodeKind, ValueId};
use strand_ir::{Constant, ExprId, ExprKind, KeywordArg, Name, Span};
use strand_types::{Idx, Tag};

use super::{Lowerer, NamedValue};
use crate::sugared::{Callable, CastKind, SpecialForm};
use crate::{LowerError, SugaredValue};

/// Tensor attributes that read a property instead of naming a method.
const TENSOR_PROPERTIES: &[&str] = &["dtype", "device", "shape", "is_cuda", "requires_grad"];

/// Method-style tensor casts: `x.float()` calls `_cast_Float`.
fn cast_method(field: &str) -> Option<&'static str> {
    Some(match field {
        "byte" => "_cast_Byte",
        "char" => "_cast_Char",
        "double" => "_cast_Double",
        "float" => "_cast_Float",
        "half" => "_cast_Half",
        "int" => "_cast_Int",
        "long" => "_cast_Long",
        "short" => "_cast_Short",
        _ => return None,
    })
}

impl Lowerer<'_> {
    /// `callee(args..., name=value...)`
    pub(crate) fn emit_apply(
        &mut self,
        callee: ExprId,
        args: &[ExprId],
        kwargs: &[KeywordArg],
        span: Span,
    ) -> Result<SugaredValue, LowerError> {
        let callee = self.emit_sugared_expr(callee)?;
        if let SugaredValue::Callable(Callable::Special(form)) = callee {
            if form != SpecialForm::Print {
                return self.emit_special_form(form, args, kwargs, span);
            }
        }
        let positional = self.emit_named_values(args)?;
        let keywords = self.emit_keyword_values(kwargs)?;
        self.emit_call(callee, &positional, &keywords, span)
    }

    fn emit_keyword_values(&mut self, kwargs: &[KeywordArg]) -> Result<Vec<NamedValue>, LowerError> {
        let mut out = Vec::with_capacity(kwargs.len());
        for kw in kwargs {
            let value = self.emit_expr(kw.value)?;
            out.push(NamedValue::new(kw.span, value).named(kw.name));
        }
        Ok(out)
    }

    /// Call a compile-time value with already lowered arguments.
    pub(crate) fn emit_call(
        &mut self,
        callee: SugaredValue,
        args: &[NamedValue],
        kwargs: &[NamedValue],
        span: Span,
    ) -> Result<SugaredValue, LowerError> {
        match callee {
            SugaredValue::Callable(Callable::Function { name, receiver }) => {
                let receiver =
                    receiver.map(|v| NamedValue::new(span, v).named(self.sym("self")));
                let outputs = self.emit_builtin_call(name, receiver, args, kwargs, span)?;
                Ok(SugaredValue::Plain(self.pack_outputs(&outputs, span)))
            }
            SugaredValue::Callable(Callable::Cast(kind)) => {
                self.emit_cast(kind, args, kwargs, span).map(SugaredValue::Plain)
            }
            SugaredValue::Callable(Callable::Special(SpecialForm::Print)) => {
                if !kwargs.is_empty() {
                    return Err(LowerError::unsupported(
                        span,
                        "print doesn't accept any keyword arguments",
                    ));
                }
                let inputs: Vec<ValueId> = args.iter().map(|a| a.value).collect();
                self.builder.emit(NodeKind::Print, &inputs, &[], span);
                Ok(SugaredValue::NoneMarker)
            }
            SugaredValue::Callable(Callable::Special(form)) => Err(LowerError::unsupported(
                span,
                format!(
                    "{} cannot be called indirectly",
                    SugaredValue::Callable(Callable::Special(form)).kind_name()
                ),
            )),
            SugaredValue::Plain(v) => Err(LowerError::type_mismatch(
                span,
                format!(
                    "cannot call a value of type {}",
                    self.format_type(self.value_type(v))
                ),
            )),
            SugaredValue::NoneMarker => {
                Err(LowerError::type_mismatch(span, "None is not callable"))
            }
            SugaredValue::Projection(obj) => Err(LowerError::type_mismatch(
                span,
                format!("{} is not callable", self.session.resolver.describe(obj)),
            )),
        }
    }

    /// Resolve and emit an operator by name, returning its single value.
    pub(crate) fn call_operator(
        &mut self,
        name: &str,
        args: &[NamedValue],
        span: Span,
    ) -> Result<ValueId, LowerError> {
        let name = self.sym(name);
        let outputs = self.emit_builtin_call(name, None, args, &[], span)?;
        Ok(self.pack_outputs(&outputs, span))
    }

    /// Same as [`Self::call_operator`] with a receiver bound to `self`.
    pub(crate) fn call_method(
        &mut self,
        name: &str,
        receiver: NamedValue,
        args: &[NamedValue],
        span: Span,
    ) -> Result<ValueId, LowerError> {
        let name = self.sym(name);
        let receiver = receiver.named(self.sym("self"));
        let outputs = self.emit_builtin_call(name, Some(receiver), args, &[], span)?;
        Ok(self.pack_outputs(&outputs, span))
    }

    /// `int(x)` on something that already is an int is `x` itself.
    fn emit_cast(
        &mut self,
        kind: CastKind,
        args: &[NamedValue],
        kwargs: &[NamedValue],
        span: Span,
    ) -> Result<ValueId, LowerError> {
        if let ([arg], []) = (args, kwargs) {
            let ty = self.value_type(arg.value);
            if self.pool.is_subtype(ty, kind.target()) {
                return Ok(arg.value);
            }
        }
        let name = self.sym(kind.op_name());
        let outputs = self.emit_builtin_call(name, None, args, kwargs, span)?;
        Ok(self.pack_outputs(&outputs, span))
    }

    fn emit_special_form(
        &mut self,
        form: SpecialForm,
        args: &[ExprId],
        kwargs: &[KeywordArg],
        span: Span,
    ) -> Result<SugaredValue, LowerError> {
        let name = match form {
            SpecialForm::GetAttr => "getattr",
            SpecialForm::IsInstance => "isinstance",
            SpecialForm::Annotate => "annotate",
            SpecialForm::Fork => "fork",
            SpecialForm::Range => {
                return Err(LowerError::unsupported(
                    span,
                    "range is only supported as the iterable of a for loop",
                ))
            }
            SpecialForm::Print => "print",
        };
        if form == SpecialForm::Fork {
            let Some((&callee, rest)) = args.split_first() else {
                return Err(LowerError::unsupported(
                    span,
                    "fork expects a callable as its first argument",
                ));
            };
            let callee = self.emit_sugared_expr(callee)?;
            let positional = self.emit_named_values(rest)?;
            let keywords = self.emit_keyword_values(kwargs)?;
            return self
                .emit_fork(callee, &positional, &keywords, span)
                .map(SugaredValue::Plain);
        }

        let [first, second] = args[..] else {
            return Err(LowerError::unsupported(
                span,
                format!("{name} expects exactly two arguments"),
            ));
        };
        if !kwargs.is_empty() {
            return Err(LowerError::unsupported(
                span,
                format!("{name} doesn't accept any keyword arguments"),
            ));
        }
        match form {
            SpecialForm::GetAttr => {
                let ExprKind::Str(field) = self.arena.expr(second).kind else {
                    return Err(LowerError::type_mismatch(
                        self.arena.span(second),
                        "getattr's second argument must be a string literal",
                    ));
                };
                let object = self.emit_sugared_expr(first)?;
                self.attr(object, field, span)
            }
            SpecialForm::IsInstance => {
                let value = self.emit_expr(first)?;
                let ty = self.value_type(value);
                let result = self.isinstance_check(ty, second)?;
                Ok(SugaredValue::Plain(self.constant(Constant::Bool(result), span)))
            }
            _ => {
                let ty = self.type_parser().parse(first)?;
                let value = self.emit_expr_hinted(second, Some(ty))?;
                let value = self.convert_value(value, ty, true, span)?;
                let actual = self.value_type(value);
                if !self.pool.is_subtype(actual, ty) {
                    return Err(LowerError::type_mismatch(
                        span,
                        format!(
                            "expected an expression of type {} but found {}",
                            self.format_type(ty),
                            self.format_type(actual)
                        ),
                    ));
                }
                Ok(SugaredValue::Plain(value))
            }
        }
    }

    /// Static `isinstance`; the answer becomes a boolean constant.
    fn isinstance_check(&mut self, ty: Idx, classinfo: ExprId) -> Result<bool, LowerError> {
        match &self.arena.expr(classinfo).kind {
            ExprKind::Tuple(options) => {
                for &option in options {
                    if self.isinstance_check(ty, option)? {
                        return Ok(true);
                    }
                }
                Ok(false)
            }
            ExprKind::Ident(name) if self.interner.lookup(*name) == "tuple" => {
                Ok(self.pool.tag(ty) == Tag::Tuple)
            }
            ExprKind::Ident(name) if self.interner.lookup(*name) == "list" => {
                Ok(self.pool.tag(ty) == Tag::List)
            }
            _ => {
                let expected = self.type_parser().parse(classinfo)?;
                Ok(self.pool.is_subtype(ty, expected))
            }
        }
    }

    /// `base.field`
    pub(crate) fn attr(
        &mut self,
        base: SugaredValue,
        field: Name,
        span: Span,
    ) -> Result<SugaredValue, LowerError> {
        match base {
            SugaredValue::Plain(value) => {
                let ty = self.value_type(value);
                let field_text = self.interner.lookup(field);
                if self.pool.is_tensor(ty) {
                    if let Some(cast) = cast_method(field_text) {
                        return Ok(SugaredValue::Callable(Callable::Function {
                            name: self.sym(cast),
                            receiver: Some(value),
                        }));
                    }
                    if TENSOR_PROPERTIES.contains(&field_text) {
                        let result =
                            self.call_method(field_text, NamedValue::new(span, value), &[], span)?;
                        return Ok(SugaredValue::Plain(result));
                    }
                }
                if self.pool.is_subtype(ty, Idx::NUMBER) {
                    return Err(LowerError::type_mismatch(span, "cannot call methods on numbers"));
                }
                Ok(SugaredValue::Callable(Callable::Function {
                    name: field,
                    receiver: Some(value),
                }))
            }
            SugaredValue::Projection(object) => {
                let resolver = self.session.resolver;
                resolver.attr(object, field, span).ok_or_else(|| {
                    LowerError::type_mismatch(
                        span,
                        format!(
                            "{} has no attribute '{}'",
                            resolver.describe(object),
                            self.interner.lookup(field)
                        ),
                    )
                })
            }
            other => Err(LowerError::type_mismatch(
                span,
                format!("attribute lookup is not defined on {}", other.kind_name()),
            )),
        }
    }
}
