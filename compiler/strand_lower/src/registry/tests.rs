use pretty_assertions::assert_eq;
use strand_ir::{Constant, StringInterner};
use strand_types::{Idx, Pool};

use super::*;

fn parse(decl: &str, pool: &mut Pool, interner: &StringInterner) -> FunctionSignature {
    parse_declaration(decl, pool, interner).unwrap()
}

#[test]
fn parses_generic_list_select() {
    let mut pool = Pool::new();
    let interner = StringInterner::new();
    let sig = parse("select(t[] list, int idx) -> t", &mut pool, &interner);
    let t = pool.var("t");
    let list_t = pool.list(t);
    assert_eq!(interner.lookup(sig.name), "select");
    assert_eq!(sig.arguments.len(), 2);
    assert_eq!(sig.arguments[0].ty, list_t);
    assert_eq!(sig.arguments[1].ty, Idx::INT);
    assert_eq!(sig.returns, vec![t]);
}

#[test]
fn parses_defaults_arity_and_kwarg_only() {
    let mut pool = Pool::new();
    let interner = StringInterner::new();
    let sig = parse(
        "pool(Tensor self, int[2] stride=1, *, float eps=-1.5, Device? device=None, str mode=\"same\")",
        &mut pool,
        &interner,
    );
    assert_eq!(sig.arguments[1].arity, Some(2));
    assert_eq!(sig.arguments[1].default, Some(Constant::Int(1)));
    assert!(!sig.arguments[1].kwarg_only);
    assert_eq!(sig.arguments[2].default, Some(Constant::float(-1.5)));
    assert!(sig.arguments[2].kwarg_only);
    let opt_device = pool.optional(Idx::DEVICE);
    assert_eq!(sig.arguments[3].ty, opt_device);
    assert_eq!(
        sig.arguments[4].default,
        Some(Constant::Str(interner.intern("same")))
    );
    assert!(sig.returns.is_empty());
}

#[test]
fn parses_multiple_returns_tuples_and_futures() {
    let mut pool = Pool::new();
    let interner = StringInterner::new();
    let sig = parse(
        "split(Future(int) f, (int, float) pair, ...) -> (str, int)",
        &mut pool,
        &interner,
    );
    let fut = pool.future(Idx::INT);
    let pair = pool.tuple(&[Idx::INT, Idx::FLOAT]);
    assert_eq!(sig.arguments[0].ty, fut);
    assert_eq!(sig.arguments[1].ty, pair);
    assert!(sig.is_vararg);
    assert_eq!(sig.returns, vec![Idx::STR, Idx::INT]);
}

#[test]
fn rejects_malformed_declarations() {
    let mut pool = Pool::new();
    let interner = StringInterner::new();
    let err = parse_declaration("add(int a int b)", &mut pool, &interner).unwrap_err();
    assert_eq!(err.message, "expected `,`");
    assert!(parse_declaration("add(int a) -> int junk", &mut pool, &interner).is_err());
    assert!(parse_declaration("add(int a=\"x)", &mut pool, &interner).is_err());
}

#[test]
fn standard_table_parses() {
    let mut pool = Pool::new();
    let interner = StringInterner::new();
    let registry = Registry::standard(&mut pool, &interner);
    let add = interner.intern("add");
    assert!(registry.overloads(add).len() >= 4);
    assert!(registry.has_implementation(add, 0));
    assert!(registry.library_functions(add).is_empty());
    assert!(registry.overloads(interner.intern("nope")).is_empty());
}

#[test]
fn schema_only_overloads_lack_implementation() {
    let mut pool = Pool::new();
    let interner = StringInterner::new();
    let mut registry = Registry::new();
    registry.declare("ghost(int a) -> int", &mut pool, &interner).unwrap();
    let sig = parse("ghost(float a) -> float", &mut pool, &interner);
    registry.register_schema_only(sig);
    let ghost = interner.intern("ghost");
    assert!(registry.has_implementation(ghost, 0));
    assert!(!registry.has_implementation(ghost, 1));
}
