// arturo-vm - End-to-end scenario tests
// Copyright (c) 2026 The Arturo Project Contributors. MIT licensed.

//! Literal input/output scenarios, run end to end through the parser, the
//! translator and the VM.

mod common;

use arturo_core::ErrorKind;
use common::*;

#[test]
fn test_hello_world() {
    let out = run_captured("print \"Hello world!\"").unwrap();
    assert_eq!(out, "Hello world!\n");
}

#[test]
fn test_loop_over_range() {
    let out = run_captured("loop 1..3 'x [print x]").unwrap();
    assert_eq!(out, "1\n2\n3\n");
}

#[test]
fn test_recursive_fibonacci() {
    let src = "fib: $[x][if? x<2 [1] else [(fib x-1)+(fib x-2)]]\nprint fib 10";
    let out = run_captured(src).unwrap();
    assert_eq!(out, "89\n");
}

#[test]
fn test_to_integer_leaves_stack_top() {
    let result = eval_str("to :integer \"2020\"").unwrap();
    assert_eq!(result, ArturoVal::Integer(2020));
}

#[test]
fn test_define_and_construct() {
    let src = "define :p [name age][]\nprint to :p [\"John\" 35]";
    let out = run_captured(src).unwrap();
    assert!(out.contains("name:"), "output was: {}", out);
    assert!(out.contains("John"), "output was: {}", out);
    assert!(out.contains("age:"), "output was: {}", out);
    assert!(out.contains("35"), "output was: {}", out);
}

#[test]
fn test_failed_integer_conversion() {
    let err = eval_err("to :integer \"nope\"");
    assert!(
        matches!(err.kind, ErrorKind::ConversionFailed { .. }),
        "unexpected error: {}",
        err
    );
}

#[test]
fn test_range_with_zero_step() {
    let err = eval_err("range 1 10 .step:0");
    assert!(
        matches!(err.kind, ErrorKind::RangeWithZeroStep),
        "unexpected error: {}",
        err
    );
}

#[test]
fn test_as_binary() {
    let result = eval_str("as.binary 11").unwrap();
    assert_eq!(result, ArturoVal::string("1011"));
}
