//! Overload resolution against operator signatures.
//!
//! A call is matched against every candidate twice: first with implicit
//! conversions disabled, then enabled. Matching only plans the work; graph
//! nodes for conversions and the call itself are emitted once a candidate
//! matches completely, so rejected candidates leave nothing behind.

use rustc_hash::FxHashMap;
use smallvec::{smallvec, SmallVec};
use strand_graph::{clone_block_body, Graph, NodeKind, ValueId};
use strand_ir::{Constant, Name, Span};
use strand_types::{
    eval_type_variables, match_type_variables, Argument, FunctionSignature, Idx, Tag, TypeEnv,
};
use tracing::trace;

use super::{constant_type, Lowerer};
use crate::registry::LibraryFunction;
use crate::LowerError;

/// An argument at a call site. Keyword arguments carry their name.
#[derive(Copy, Clone, Debug)]
pub(crate) struct NamedValue {
    #[allow(dead_code)]
    pub(crate) span: Span,
    pub(crate) name: Option<Name>,
    pub(crate) value: ValueId,
}

impl NamedValue {
    pub(crate) fn new(span: Span, value: ValueId) -> Self {
        NamedValue {
            span,
            name: None,
            value,
        }
    }

    #[must_use]
    pub(crate) fn named(mut self, name: Name) -> Self {
        self.name = Some(name);
        self
    }
}

/// What fills a parameter before any conversion.
#[derive(Copy, Clone, Debug)]
enum Actual {
    Value(ValueId),
    /// A parameter default, materialized only if the candidate wins.
    Constant(Constant),
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
enum Conversion {
    /// `(1, 2)` passed for `int[]`.
    TupleToList { elem: Idx },
    /// `None` passed for a tensor.
    NoneToUndefined,
    /// A zero-dimensional tensor read as a number.
    TensorToNumber { target: Idx },
    /// `"cuda"` passed for a `Device`.
    StrToDevice,
}

#[derive(Clone, Debug)]
enum BoundInput {
    Direct(Actual),
    Converted(Actual, Conversion),
    /// A scalar repeated to fill a fixed-arity list parameter.
    Repeat { value: Actual, elem: Idx, count: u32 },
    /// Trailing positional arguments gathered into one list parameter.
    List { elem: Idx, items: Vec<BoundInput> },
}

struct MatchedSchema {
    inputs: SmallVec<[BoundInput; 4]>,
    returns: SmallVec<[Idx; 2]>,
}

impl Lowerer<'_> {
    /// Resolve `name` against registered overloads, then library functions,
    /// and emit the first full match.
    pub(crate) fn emit_builtin_call(
        &mut self,
        name: Name,
        receiver: Option<NamedValue>,
        args: &[NamedValue],
        kwargs: &[NamedValue],
        span: Span,
    ) -> Result<Vec<ValueId>, LowerError> {
        let registry = self.session.registry;
        let overloads = registry.overloads(name);
        let library = registry.library_functions(name);
        let passes: &[bool] = if self.session.options.implicit_conversions {
            &[false, true]
        } else {
            &[false]
        };

        let mut failures = Vec::new();
        for &allow_conversions in passes {
            failures.clear();
            for (index, signature) in overloads.iter().enumerate() {
                match self.try_match(signature, receiver, args, kwargs, allow_conversions) {
                    Ok(matched) => return self.commit_call(name, index, &matched, span),
                    Err(reason) => failures.push(self.rejection(signature, &reason)),
                }
            }
            for function in library {
                match self.try_match(&function.signature, receiver, args, kwargs, allow_conversions)
                {
                    Ok(matched) => return self.inline_library(function, &matched, span),
                    Err(reason) => failures.push(self.rejection(&function.signature, &reason)),
                }
            }
        }
        Err(LowerError::UnresolvedOverload {
            name: self.interner.lookup(name).to_owned(),
            failures,
            span,
        })
    }

    fn rejection(&self, signature: &FunctionSignature, reason: &str) -> String {
        let shown = signature.display(self.pool, self.interner);
        trace!(candidate = %shown, reason, "rejected overload");
        format!("for operator {shown}:\n{reason}")
    }

    /// Bind arguments to `signature`'s parameters. Errors are plain text,
    /// collected into the final diagnostic.
    fn try_match(
        &mut self,
        signature: &FunctionSignature,
        receiver: Option<NamedValue>,
        args: &[NamedValue],
        kwargs: &[NamedValue],
        allow_conversions: bool,
    ) -> Result<MatchedSchema, String> {
        let self_name = self.sym("self");
        let mut env = TypeEnv::new();
        let mut receiver = receiver;
        let mut used_args = 0;
        let mut used_kwargs: SmallVec<[bool; 4]> = smallvec![false; kwargs.len()];
        let mut inputs = SmallVec::new();

        for (index, arg) in signature.arguments.iter().enumerate() {
            let actual = if let Some(recv) = receiver.filter(|_| arg.name == self_name) {
                receiver = None;
                Actual::Value(recv.value)
            } else if !arg.kwarg_only && used_args < args.len() {
                if self.takes_trailing_positionals(signature, index) {
                    let formal = self.unwrap_optional(arg.ty);
                    let first = self.value_type(args[used_args].value);
                    if self.pool.tag(first) != Tag::List && !self.convertible_to_list(first, formal) {
                        let elem = self.pool.list_elem(formal).unwrap_or(Idx::TENSOR);
                        inputs.push(self.try_create_list(
                            elem,
                            &args[used_args..],
                            allow_conversions,
                            &mut env,
                        )?);
                        used_args = args.len();
                        continue;
                    }
                }
                used_args += 1;
                Actual::Value(args[used_args - 1].value)
            } else if let Some(k) = kwargs.iter().position(|kw| kw.name == Some(arg.name)) {
                used_kwargs[k] = true;
                Actual::Value(kwargs[k].value)
            } else if let Some(default) = arg.default {
                Actual::Constant(default)
            } else {
                return Err(format!(
                    "argument {} not provided.",
                    self.interner.lookup(arg.name)
                ));
            };
            inputs.push(self.match_argument(arg, actual, allow_conversions, &mut env)?);
        }

        if receiver.is_some() {
            return Err("provided self argument not used in schema".to_owned());
        }
        if signature.is_vararg {
            for extra in &args[used_args..] {
                inputs.push(BoundInput::Direct(Actual::Value(extra.value)));
            }
            used_args = args.len();
        }
        if used_args < args.len() {
            return Err(format!(
                "expected at most {used_args} arguments but found {} positional arguments.",
                args.len()
            ));
        }
        for (kw, used) in kwargs.iter().zip(&used_kwargs) {
            if *used {
                continue;
            }
            let name = kw.name.map_or("", |n| self.interner.lookup(n));
            let known = kw.name.and_then(|n| signature.argument_index(n)).is_some();
            return Err(if known {
                format!("keyword argument {name} specified twice.")
            } else {
                format!("keyword argument {name} unknown.")
            });
        }

        let mut returns = SmallVec::new();
        for &ret in &signature.returns {
            let ty = eval_type_variables(self.pool, ret, &env)
                .map_err(|e| format!("could not resolve return type: {}", e.describe(self.pool)))?;
            returns.push(ty);
        }
        Ok(MatchedSchema { inputs, returns })
    }

    /// Check one actual against a parameter, planning at most one
    /// conversion.
    fn match_argument(
        &mut self,
        arg: &Argument,
        actual: Actual,
        allow_conversions: bool,
        env: &mut TypeEnv,
    ) -> Result<BoundInput, String> {
        let mut ty = self.actual_type(actual);
        let mut bound = BoundInput::Direct(actual);

        // `int[2]` also accepts a single int, repeated.
        if let Some(count) = arg.arity {
            let formal = self.unwrap_optional(arg.ty);
            if (ty == Idx::INT || ty == Idx::FLOAT) && self.pool.list_elem(formal) == Some(ty) {
                bound = BoundInput::Repeat {
                    value: actual,
                    elem: ty,
                    count,
                };
                ty = self.pool.list(ty);
            }
        }

        if let Err(e) = match_type_variables(self.pool, arg.ty, ty, env) {
            return Err(format!(
                "could not match type {} to {} in argument '{}': {}.",
                self.format_type(ty),
                self.format_type(arg.ty),
                self.interner.lookup(arg.name),
                e.describe(self.pool)
            ));
        }
        let concrete = eval_type_variables(self.pool, arg.ty, env).map_err(|e| {
            format!(
                "could not resolve type of argument '{}': {}",
                self.interner.lookup(arg.name),
                e.describe(self.pool)
            )
        })?;

        let mut final_ty = ty;
        if let BoundInput::Direct(actual) = bound {
            if let Some(conversion) = self.plan_conversion(ty, concrete, allow_conversions) {
                final_ty = self.conversion_type(conversion);
                bound = BoundInput::Converted(actual, conversion);
            }
        }
        if !self.pool.is_subtype(final_ty, concrete) {
            return Err(format!(
                "expected a value of type {} for argument '{}' but found {}",
                self.format_type(concrete),
                self.interner.lookup(arg.name),
                self.format_type(ty)
            ));
        }
        Ok(bound)
    }

    /// The list parameter absorbs every remaining positional argument when
    /// it is the last positional slot and not a broadcasting list.
    fn takes_trailing_positionals(&self, signature: &FunctionSignature, index: usize) -> bool {
        let arg = &signature.arguments[index];
        let is_last = signature
            .arguments
            .get(index + 1)
            .map_or(true, |next| next.kwarg_only);
        let formal = self.unwrap_optional(arg.ty);
        is_last && arg.arity.is_none() && self.pool.list_elem(formal).is_some()
    }

    fn try_create_list(
        &mut self,
        elem: Idx,
        args: &[NamedValue],
        allow_conversions: bool,
        env: &mut TypeEnv,
    ) -> Result<BoundInput, String> {
        let elem_arg = Argument::new(self.sym("<varargs>"), elem);
        let mut items = Vec::with_capacity(args.len());
        for arg in args {
            items.push(self.match_argument(
                &elem_arg,
                Actual::Value(arg.value),
                allow_conversions,
                env,
            )?);
        }
        // A `t[]` parameter takes its element type from the first binding.
        let elem = eval_type_variables(self.pool, elem, env)
            .map_err(|e| format!("could not resolve list element type: {}", e.describe(self.pool)))?;
        Ok(BoundInput::List { elem, items })
    }

    fn convertible_to_list(&self, ty: Idx, formal: Idx) -> bool {
        let Some(elem) = self.pool.list_elem(formal) else {
            return false;
        };
        if self.pool.is_subtype(ty, formal) {
            return true;
        }
        self.pool
            .tuple_elems(ty)
            .is_some_and(|elems| elems.iter().all(|&e| self.pool.is_subtype(e, elem)))
    }

    fn unwrap_optional(&self, ty: Idx) -> Idx {
        self.pool.optional_inner(ty).unwrap_or(ty)
    }

    fn actual_type(&self, actual: Actual) -> Idx {
        match actual {
            Actual::Value(v) => self.value_type(v),
            Actual::Constant(c) => constant_type(c),
        }
    }

    /// The conversion that makes `ty` usable as `concrete`, if one applies.
    fn plan_conversion(&self, ty: Idx, concrete: Idx, allow_conversions: bool) -> Option<Conversion> {
        // `None` for a `Tensor` or `Tensor?` parameter is the undefined tensor.
        if ty == Idx::NONE && concrete != Idx::NONE && self.pool.is_tensor(self.unwrap_optional(concrete)) {
            return Some(Conversion::NoneToUndefined);
        }
        if self.pool.is_subtype(ty, concrete) {
            return None;
        }
        // Converting to `Optional[T]` is converting to `T`.
        if let Some(inner) = self.pool.optional_inner(concrete) {
            if self.pool.optional_inner(ty).is_none() && ty != Idx::NONE {
                return self.plan_conversion(ty, inner, allow_conversions);
            }
        }
        if let Some(elem) = self.pool.list_elem(concrete) {
            let homogeneous = self.pool.tuple_elems(ty).is_some_and(|elems| {
                !elems.is_empty() && elems.iter().all(|&e| self.pool.is_subtype(e, elem))
            });
            if homogeneous {
                return Some(Conversion::TupleToList { elem });
            }
        }
        if allow_conversions {
            if self.pool.is_subtype(concrete, Idx::NUMBER) && self.pool.is_tensor(ty) {
                return Some(Conversion::TensorToNumber { target: concrete });
            }
            if ty == Idx::STR && self.pool.is_subtype(Idx::DEVICE, concrete) {
                return Some(Conversion::StrToDevice);
            }
        }
        None
    }

    fn conversion_type(&mut self, conversion: Conversion) -> Idx {
        match conversion {
            Conversion::TupleToList { elem } => self.pool.list(elem),
            Conversion::NoneToUndefined => Idx::TENSOR,
            Conversion::TensorToNumber { target } => target,
            Conversion::StrToDevice => Idx::DEVICE,
        }
    }

    /// Convert a value outside of call matching, e.g. for `return` or
    /// `annotate`. Values that need no conversion are returned as is.
    pub(crate) fn convert_value(
        &mut self,
        value: ValueId,
        concrete: Idx,
        allow_conversions: bool,
        span: Span,
    ) -> Result<ValueId, LowerError> {
        let ty = self.value_type(value);
        match self.plan_conversion(ty, concrete, allow_conversions) {
            Some(conversion) => self.apply_conversion(Actual::Value(value), conversion, span),
            None => Ok(value),
        }
    }

    // ── Emission ────────────────────────────────────────────────────

    fn commit_call(
        &mut self,
        name: Name,
        index: usize,
        matched: &MatchedSchema,
        span: Span,
    ) -> Result<Vec<ValueId>, LowerError> {
        if !self.session.registry.has_implementation(name, index) {
            return Err(LowerError::internal(
                span,
                format!(
                    "overload {index} of {} was selected but has no registered implementation",
                    self.interner.lookup(name)
                ),
            ));
        }
        let inputs = self.materialize_all(&matched.inputs, span)?;
        let node = self
            .builder
            .emit(NodeKind::Call(name), &inputs, &matched.returns, span);
        Ok(self.builder.graph().node(node).outputs.to_vec())
    }

    /// Splice a library function body into the current block.
    fn inline_library(
        &mut self,
        function: &LibraryFunction,
        matched: &MatchedSchema,
        span: Span,
    ) -> Result<Vec<ValueId>, LowerError> {
        let inputs = self.materialize_all(&matched.inputs, span)?;
        let body = &function.body;
        if body.inputs().len() != inputs.len() {
            return Err(LowerError::internal(
                span,
                format!(
                    "library function {} takes {} inputs but was bound to {}",
                    self.interner.lookup(function.signature.name),
                    body.inputs().len(),
                    inputs.len()
                ),
            ));
        }
        let mut map: FxHashMap<ValueId, ValueId> =
            body.inputs().iter().copied().zip(inputs).collect();
        let block = self.builder.insertion_block();
        let mut no_outer = |_: &mut Graph, _: ValueId| -> Option<ValueId> { None };
        let missing = |value: ValueId| {
            LowerError::internal(
                span,
                format!("library function body refers to undefined value {value:?}"),
            )
        };
        clone_block_body(
            body,
            body.root(),
            self.builder.graph_mut(),
            block,
            &mut map,
            &mut no_outer,
        )
        .map_err(missing)?;
        body.outputs()
            .iter()
            .map(|out| map.get(out).copied().ok_or_else(|| missing(*out)))
            .collect()
    }

    fn materialize_all(
        &mut self,
        inputs: &[BoundInput],
        span: Span,
    ) -> Result<Vec<ValueId>, LowerError> {
        let mut values = Vec::with_capacity(inputs.len());
        for input in inputs {
            values.push(self.materialize(input, span)?);
        }
        Ok(values)
    }

    fn materialize(&mut self, input: &BoundInput, span: Span) -> Result<ValueId, LowerError> {
        match input {
            BoundInput::Direct(actual) => Ok(self.actual_value(*actual, span)),
            BoundInput::Converted(actual, conversion) => {
                self.apply_conversion(*actual, *conversion, span)
            }
            BoundInput::Repeat { value, elem, count } => {
                let value = self.actual_value(*value, span);
                let items = vec![value; *count as usize];
                Ok(self.emit_list(*elem, &items, span))
            }
            BoundInput::List { elem, items } => {
                let values = self.materialize_all(items, span)?;
                Ok(self.emit_list(*elem, &values, span))
            }
        }
    }

    fn actual_value(&mut self, actual: Actual, span: Span) -> ValueId {
        match actual {
            Actual::Value(v) => v,
            Actual::Constant(c) => self.constant(c, span),
        }
    }

    fn apply_conversion(
        &mut self,
        actual: Actual,
        conversion: Conversion,
        span: Span,
    ) -> Result<ValueId, LowerError> {
        match conversion {
            // The `None` being replaced is never materialized.
            Conversion::NoneToUndefined => Ok(self
                .builder
                .emit_value(NodeKind::Undefined, &[], Idx::TENSOR, span)),
            Conversion::TupleToList { elem } => {
                let value = self.actual_value(actual, span);
                let items = self.unpack_tuple(value, span);
                Ok(self.emit_list(elem, &items, span))
            }
            Conversion::TensorToNumber { target } => {
                let value = self.actual_value(actual, span);
                Ok(self
                    .builder
                    .emit_value(NodeKind::ImplicitTensorToNum, &[value], target, span))
            }
            Conversion::StrToDevice => {
                let value = self.actual_value(actual, span);
                self.call_operator("device", &[NamedValue::new(span, value)], span)
            }
        }
    }
}
