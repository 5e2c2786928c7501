use pretty_assertions::assert_eq;

use super::*;

#[test]
fn concrete_formal_is_returned_unchanged() {
    let mut pool = Pool::new();
    let mut env = TypeEnv::new();
    let list_int = pool.list(Idx::INT);
    assert_eq!(
        match_type_variables(&mut pool, list_int, Idx::STR, &mut env),
        Ok(list_int)
    );
    assert!(env.is_empty());
}

#[test]
fn first_sighting_binds_later_sightings_must_agree() {
    let mut pool = Pool::new();
    let t = pool.var("t");
    let list_t = pool.list(t);
    let list_float = pool.list(Idx::FLOAT);
    let mut env = TypeEnv::new();

    assert_eq!(
        match_type_variables(&mut pool, list_t, list_float, &mut env),
        Ok(list_float)
    );
    assert_eq!(env.get(t), Some(Idx::FLOAT));
    assert_eq!(
        match_type_variables(&mut pool, t, Idx::FLOAT, &mut env),
        Ok(Idx::FLOAT)
    );
    assert_eq!(
        match_type_variables(&mut pool, t, Idx::INT, &mut env),
        Err(MatchError::Conflict {
            var: t,
            bound: Idx::FLOAT,
            found: Idx::INT,
        })
    );
}

#[test]
fn later_sighting_may_erase_shapes() {
    let mut pool = Pool::new();
    let t = pool.var("t");
    let r1 = pool.shaped_tensor(1);
    let r2 = pool.shaped_tensor(2);
    let mut env = TypeEnv::new();
    match_type_variables(&mut pool, t, r1, &mut env).unwrap();
    assert_eq!(
        match_type_variables(&mut pool, t, r2, &mut env),
        Ok(Idx::TENSOR)
    );
    assert_eq!(env.get(t), Some(Idx::TENSOR));
}

#[test]
fn homogeneous_tuple_matches_generic_list() {
    let mut pool = Pool::new();
    let t = pool.var("t");
    let list_t = pool.list(t);
    let tup = pool.tuple(&[Idx::INT, Idx::INT]);
    let mixed = pool.tuple(&[Idx::INT, Idx::STR]);
    let mut env = TypeEnv::new();
    let list_int = pool.list(Idx::INT);
    assert_eq!(
        match_type_variables(&mut pool, list_t, tup, &mut env),
        Ok(list_int)
    );
    let mut env = TypeEnv::new();
    assert_eq!(
        match_type_variables(&mut pool, list_t, mixed, &mut env),
        Err(MatchError::Shape {
            formal: list_t,
            actual: mixed,
        })
    );
}

#[test]
fn optional_formal() {
    let mut pool = Pool::new();
    let t = pool.var("t");
    let opt_t = pool.optional(t);

    let mut env = TypeEnv::new();
    assert_eq!(
        match_type_variables(&mut pool, opt_t, Idx::STR, &mut env),
        Ok(Idx::STR)
    );
    assert_eq!(env.get(t), Some(Idx::STR));

    let mut env = TypeEnv::new();
    assert_eq!(
        match_type_variables(&mut pool, opt_t, Idx::NONE, &mut env),
        Err(MatchError::NoneForOptional { formal: opt_t })
    );

    let mut env = TypeEnv::new();
    let opt_int = pool.optional(Idx::INT);
    assert_eq!(
        match_type_variables(&mut pool, opt_t, opt_int, &mut env),
        Ok(opt_int)
    );
}

#[test]
fn tuple_and_future_formals() {
    let mut pool = Pool::new();
    let t = pool.var("t");
    let u = pool.var("u");
    let formal = pool.tuple(&[t, u]);
    let actual = pool.tuple(&[Idx::INT, Idx::TENSOR]);
    let short = pool.tuple(&[Idx::INT]);
    let mut env = TypeEnv::new();
    assert_eq!(
        match_type_variables(&mut pool, formal, actual, &mut env),
        Ok(actual)
    );
    let mut env = TypeEnv::new();
    assert!(match_type_variables(&mut pool, formal, short, &mut env).is_err());

    let fut_t = pool.future(t);
    let fut_int = pool.future(Idx::INT);
    let mut env = TypeEnv::new();
    assert_eq!(
        match_type_variables(&mut pool, fut_t, fut_int, &mut env),
        Ok(fut_int)
    );
    let mut env = TypeEnv::new();
    assert!(match_type_variables(&mut pool, fut_t, Idx::INT, &mut env).is_err());
}

#[test]
fn eval_substitutes_or_reports_unbound() {
    let mut pool = Pool::new();
    let t = pool.var("t");
    let u = pool.var("u");
    let list_t = pool.list(t);
    let mut env = TypeEnv::new();
    match_type_variables(&mut pool, t, Idx::BOOL, &mut env).unwrap();

    let list_bool = pool.list(Idx::BOOL);
    assert_eq!(eval_type_variables(&mut pool, list_t, &env), Ok(list_bool));
    assert_eq!(
        eval_type_variables(&mut pool, u, &env),
        Err(MatchError::Unbound { var: u })
    );
    assert_eq!(eval_type_variables(&mut pool, Idx::INT, &env), Ok(Idx::INT));
}

#[test]
fn error_descriptions_name_types() {
    let mut pool = Pool::new();
    let t = pool.var("t");
    let err = MatchError::Conflict {
        var: t,
        bound: Idx::INT,
        found: Idx::STR,
    };
    assert_eq!(
        err.describe(&pool),
        "type variable 't' previously matched to type int is matched to type str"
    );
}
