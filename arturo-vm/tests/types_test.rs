// arturo-vm - User-defined type integration tests
// Copyright (c) 2026 The Arturo Project Contributors. MIT licensed.

//! Integration tests for `define`, construction, magic methods and
//! inheritance.

mod common;

use common::*;

macro_rules! assert_eval {
    ($input:expr, $expected:expr) => {
        let result = eval_str($input);
        assert!(
            result.is_ok(),
            "failed to evaluate '{}': {:?}",
            $input,
            result.err()
        );
        assert_eq!(
            result.unwrap(),
            $expected,
            "evaluation of '{}' did not match",
            $input
        );
    };
}

#[test]
fn test_default_constructor_pairs_fields() {
    assert_eval!(
        "define :point [x y][] p: to :point [3 4] p\\x + p\\y",
        ArturoVal::Integer(7)
    );
}

#[test]
fn test_missing_fields_error() {
    let err = eval_err("define :point [x y][] to :point [3]");
    assert!(matches!(
        err.kind,
        arturo_core::ErrorKind::ArityMismatch { .. }
    ));
}

#[test]
fn test_unknown_type_errors() {
    let err = eval_err("to :ghost [1]");
    assert!(matches!(
        err.kind,
        arturo_core::ErrorKind::SymbolNotFound { .. }
    ));
}

#[test]
fn test_field_mutation() {
    assert_eval!(
        "define :point [x y][] p: to :point [3 4] p\\x: 10 p\\x",
        ArturoVal::Integer(10)
    );
}

#[test]
fn test_init_magic_method() {
    // init receives `this` implicitly and the constructor arguments.
    assert_eval!(
        "define :box [w h][init: $[w h][this\\area: w * h]] b: to :box [3 4] b\\area",
        ArturoVal::Integer(12)
    );
}

#[test]
fn test_print_magic_method() {
    let out = run_captured(
        "define :tag [v][print: $[][append \"tag=\" to :string this\\v]] print to :tag [7]",
    )
    .unwrap();
    assert_eq!(out, "tag=7\n");
}

#[test]
fn test_compare_magic_method() {
    let src = "define :money [amount][compare: $[that][this\\amount - that\\amount]] \
               a: to :money [10] b: to :money [20]";
    assert_eval!(
        &format!("{} compare a b", src),
        ArturoVal::Integer(-1)
    );
    assert_eval!(
        &format!("{} less? a b", src),
        ArturoVal::Logical(true)
    );
    assert_eval!(
        &format!("{} equal? a to :money [10]", src),
        ArturoVal::Logical(true)
    );
}

#[test]
fn test_objects_without_compare_are_incomparable() {
    assert_eval!(
        "define :opq [v][] compare to :opq [1] to :opq [2]",
        ArturoVal::Null
    );
}

#[test]
fn test_methods_receive_this() {
    assert_eval!(
        "define :counter [n][bump: $[by][this\\n: this\\n + by]] \
         c: to :counter [0] call c\\bump [5] call c\\bump [2] c\\n",
        ArturoVal::Integer(7)
    );
}

#[test]
fn test_inheritance() {
    let src = "define :animal [name][speak: $[][\"...\"]] \
               define :dog .as: :animal [name][speak: $[][\"woof\"]]";
    assert_eval!(
        &format!("{} d: to :dog [\"rex\"] call d\\speak []", src),
        ArturoVal::string("woof")
    );
    assert_eval!(
        &format!("{} d: to :dog [\"rex\"] is? :animal d", src),
        ArturoVal::Logical(true)
    );
    assert_eval!(
        &format!("{} a: to :animal [\"generic\"] call a\\speak []", src),
        ArturoVal::string("...")
    );
}

#[test]
fn test_is_predicate() {
    assert_eval!("is? :integer 5", ArturoVal::Logical(true));
    assert_eval!("is? :string 5", ArturoVal::Logical(false));
    assert_eval!(
        "define :pt [x][] is? :pt to :pt [1]",
        ArturoVal::Logical(true)
    );
}

#[test]
fn test_type_builtin() {
    assert_eval!("to :string type 5", ArturoVal::string(":integer"));
    assert_eval!(
        "define :pt [x][] to :string type to :pt [1]",
        ArturoVal::string(":pt")
    );
}

#[test]
fn test_having_attribute_extends_fields() {
    assert_eval!(
        "define :rec [a] .having:[b] [] r: to :rec [1 2] r\\a + r\\b",
        ArturoVal::Integer(3)
    );
}

#[test]
fn test_object_to_dictionary() {
    assert_eval!(
        "define :pt [x y][] d: to :dictionary to :pt [1 2] d\\y",
        ArturoVal::Integer(2)
    );
}
