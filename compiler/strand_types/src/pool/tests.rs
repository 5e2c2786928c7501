use pretty_assertions::assert_eq;

use super::*;

#[test]
fn primitives_have_fixed_indices() {
    let pool = Pool::new();
    assert_eq!(pool.tag(Idx::INT), Tag::Int);
    assert_eq!(pool.tag(Idx::NONE), Tag::NoneType);
    assert_eq!(pool.tag(Idx::TENSOR), Tag::Tensor);
    assert_eq!(pool.tag(Idx::DEVICE), Tag::Device);
    assert_eq!(pool.len(), Idx::PRIMITIVE_COUNT as usize);
}

#[test]
fn constructors_deduplicate() {
    let mut pool = Pool::new();
    let a = pool.list(Idx::INT);
    let b = pool.list(Idx::INT);
    let c = pool.list(Idx::FLOAT);
    assert_eq!(a, b);
    assert_ne!(a, c);

    let t1 = pool.tuple(&[Idx::INT, a]);
    let t2 = pool.tuple(&[Idx::INT, b]);
    assert_eq!(t1, t2);
    assert_eq!(pool.tuple_elems(t1), Some(&[Idx::INT, a][..]));

    let v1 = pool.var("t");
    let v2 = pool.var("t");
    assert_eq!(v1, v2);
    assert_eq!(pool.var_name(v1), Some("t"));
}

#[test]
fn flags_propagate_through_containers() {
    let mut pool = Pool::new();
    let t = pool.var("t");
    let list_t = pool.list(t);
    let opt = pool.optional(list_t);
    assert!(pool.has_vars(opt));
    assert!(!pool.has_vars(Idx::TENSOR));

    let shaped = pool.shaped_tensor(2);
    let tup = pool.tuple(&[Idx::INT, shaped]);
    assert!(pool.flags(tup).contains(TypeFlags::HAS_SHAPE));
    assert!(pool.flags(tup).contains(TypeFlags::HAS_TENSOR));
}

#[test]
fn accessors_reject_wrong_tags() {
    let mut pool = Pool::new();
    let list = pool.list(Idx::STR);
    assert_eq!(pool.list_elem(list), Some(Idx::STR));
    assert_eq!(pool.optional_inner(list), None);
    assert_eq!(pool.tuple_elems(list), None);
    assert_eq!(pool.child(Idx::INT), None);
}

#[test]
fn format_nested_types() {
    let mut pool = Pool::new();
    let opt_int = pool.optional(Idx::INT);
    let list = pool.list(opt_int);
    let shaped = pool.shaped_tensor(3);
    let fut = pool.future(shaped);
    let tup = pool.tuple(&[list, fut, Idx::NUMBER]);
    assert_eq!(
        pool.format_type(tup),
        "Tuple[List[Optional[int]], Future[Tensor(dims=3)], number]"
    );
    let empty = pool.tuple(&[]);
    assert_eq!(pool.format_type(empty), "Tuple[]");
}
