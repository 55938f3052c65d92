// arturo-vm - Conversion matrix integration tests
// Copyright (c) 2026 The Arturo Project Contributors. MIT licensed.

//! Integration tests for the `to` conversion matrix driven from source.

mod common;

use arturo_core::ErrorKind;
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
fn test_scalar_conversions() {
    assert_eval!("to :integer \"42\"", ArturoVal::Integer(42));
    assert_eval!("to :integer 3.9", ArturoVal::Integer(3));
    assert_eval!("to :integer true", ArturoVal::Integer(1));
    assert_eval!("to :floating \"2.5\"", ArturoVal::Floating(2.5));
    assert_eval!("to :floating 2", ArturoVal::Floating(2.0));
    assert_eval!("to :string 42", ArturoVal::string("42"));
    assert_eval!("to :string true", ArturoVal::string("true"));
    assert_eval!("to :logical 0", ArturoVal::Logical(false));
    assert_eval!("to :logical \"true\"", ArturoVal::Logical(true));
}

#[test]
fn test_null_conversions() {
    assert_eval!("to :logical null", ArturoVal::Logical(false));
    assert_eval!("to :integer null", ArturoVal::Integer(0));
}

#[test]
fn test_char_conversions() {
    assert_eval!("to :char 97", ArturoVal::Char('a'));
    assert_eval!("to :integer `a`", ArturoVal::Integer(97));
    assert_eval!("to :char \"z\"", ArturoVal::Char('z'));
}

#[test]
fn test_word_family_retagging() {
    assert_eval!("to :word \"hello\"", ArturoVal::word("hello"));
    assert_eval!("to :literal \"hello\"", ArturoVal::literal("hello"));
    assert_eval!("to :string 'hello", ArturoVal::string("hello"));
}

#[test]
fn test_string_to_block_reparses() {
    assert_eval!("size to :block \"print 2\"", ArturoVal::Integer(2));
    assert_eval!("first to :block \"add 1 2\"", ArturoVal::word("add"));
}

#[test]
fn test_block_to_string_is_source() {
    assert_eval!("to :string [add 1 2]", ArturoVal::string("[add 1 2]"));
}

#[test]
fn test_block_to_dictionary_pairs_values() {
    assert_eval!("size to :dictionary [\"a\" 1 \"b\" 2]", ArturoVal::Integer(2));
    assert_eval!("d: to :dictionary [\"a\" 1] d\\a", ArturoVal::Integer(1));
    // Labelled definitions work too.
    assert_eval!("d: to :dictionary [a: 5] d\\a", ArturoVal::Integer(5));
}

#[test]
fn test_dictionary_to_block_flattens() {
    assert_eval!("size to :block #[a: 1 b: 2]", ArturoVal::Integer(4));
}

#[test]
fn test_range_to_block() {
    assert_eval!("size to :block range 1 4", ArturoVal::Integer(4));
}

#[test]
fn test_version_conversion() {
    let v = eval_str("to :version \"1.2.3\"").unwrap();
    assert_eq!(v.to_string(), "1.2.3");
}

#[test]
fn test_color_conversions() {
    assert_eval!("to :string to :color \"#ff0000\"", ArturoVal::string("#FF0000"));
    assert_eval!("to :string to :color [255 0 0]", ArturoVal::string("#FF0000"));
    assert_eval!(
        "to :string to :color .hsl [0 1.0 0.5]",
        ArturoVal::string("#FF0000")
    );
}

#[test]
fn test_binary_conversions() {
    assert_eval!("size to :binary \"abc\"", ArturoVal::Integer(3));
    assert_eval!("get to :binary \"abc\" 0", ArturoVal::Integer(97));
    assert_eval!("size to :binary [1 2 255]", ArturoVal::Integer(3));
}

#[test]
fn test_date_conversions() {
    // 2020-06-01T00:00:00Z is 1590969600 Unix seconds.
    assert_eval!(
        "to :integer to :date \"2020-06-01\"",
        ArturoVal::Integer(1_590_969_600)
    );
    assert_eval!(
        "to :integer to :date .format:\"%d/%m/%Y\" \"01/06/2020\"",
        ArturoVal::Integer(1_590_969_600)
    );
    let date = eval_str("to :date 1590969600").unwrap();
    assert_eq!(date, eval_str("to :date \"2020-06-01\"").unwrap());
}

#[test]
fn test_rational_and_complex_from_blocks() {
    assert_eval!("equal? to :rational [1 2] 0.5", ArturoVal::Logical(true));
    let c = eval_str("to :complex [1 2]").unwrap();
    assert_eq!(c.to_string(), "1.0+2.0i");
}

#[test]
fn test_bytecode_round_trip() {
    assert_eval!(
        "bc: to :bytecode [2 + 3] d: to :dictionary bc bc2: to :bytecode d do bc2",
        ArturoVal::Integer(5)
    );
}

#[test]
fn test_cannot_convert() {
    let err = eval_err("to :socket 5");
    assert!(matches!(err.kind, ErrorKind::CannotConvert { .. }));
}

#[test]
fn test_conversion_failed() {
    let err = eval_err("to :floating \"abc\"");
    assert!(matches!(err.kind, ErrorKind::ConversionFailed { .. }));
    let err = eval_err("to :char \"too long\"");
    assert!(matches!(err.kind, ErrorKind::ConversionFailed { .. }));
    let err = eval_err("to :version \"not.a.version.at.all\"");
    assert!(matches!(err.kind, ErrorKind::ConversionFailed { .. }));
}

#[test]
fn test_identity_conversions() {
    assert_eval!("to :integer 7", ArturoVal::Integer(7));
    assert_eval!("to :string \"already\"", ArturoVal::string("already"));
}
