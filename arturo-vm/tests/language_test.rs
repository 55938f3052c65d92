// arturo-vm - Core language integration tests
// Copyright (c) 2026 The Arturo Project Contributors. MIT licensed.

//! Integration tests for the language core: literals, labels, infix sugar,
//! control flow, collections and iteration.

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

macro_rules! assert_eval_err {
    ($input:expr) => {
        let result = eval_str($input);
        assert!(
            result.is_err(),
            "expected an error for '{}' but got {:?}",
            $input,
            result.ok()
        );
    };
}

// =============================================================================
// Literals and arithmetic
// =============================================================================

#[test]
fn test_literals() {
    assert_eval!("42", ArturoVal::Integer(42));
    assert_eval!("3.14", ArturoVal::Floating(3.14));
    assert_eval!("true", ArturoVal::Logical(true));
    assert_eval!("null", ArturoVal::Null);
    assert_eval!("\"hi\"", ArturoVal::string("hi"));
    assert_eval!("`x`", ArturoVal::Char('x'));
}

#[test]
fn test_prefix_arithmetic() {
    assert_eval!("add 2 3", ArturoVal::Integer(5));
    assert_eval!("sub 5 3", ArturoVal::Integer(2));
    assert_eval!("mul 4 5", ArturoVal::Integer(20));
    assert_eval!("div 7 2", ArturoVal::Integer(3));
    assert_eval!("fdiv 7 2", ArturoVal::Floating(3.5));
    assert_eval!("mod 7 2", ArturoVal::Integer(1));
    assert_eval!("pow 2 10", ArturoVal::Integer(1024));
    assert_eval!("neg 5", ArturoVal::Integer(-5));
    assert_eval!("inc 41", ArturoVal::Integer(42));
}

#[test]
fn test_infix_sugar() {
    assert_eval!("2 + 3", ArturoVal::Integer(5));
    assert_eval!("10 - 4 - 3", ArturoVal::Integer(3));
    // No precedence: strictly left to right.
    assert_eval!("2 + 3 * 4", ArturoVal::Integer(20));
    assert_eval!("1 < 2", ArturoVal::Logical(true));
    assert_eval!("2 = 2", ArturoVal::Logical(true));
    assert_eval!("2 <> 3", ArturoVal::Logical(true));
}

#[test]
fn test_mixed_numeric_kinds() {
    assert_eval!("1 + 0.5", ArturoVal::Floating(1.5));
    assert_eval!("to :string pow 2 70", ArturoVal::string("1180591620717411303424"));
}

#[test]
fn test_division_by_zero() {
    assert_eval_err!("div 1 0");
    assert_eval_err!("mod 1 0");
}

// =============================================================================
// Symbols and labels
// =============================================================================

#[test]
fn test_labels_bind_symbols() {
    assert_eval!("x: 10 x + 1", ArturoVal::Integer(11));
    assert_eval!("x: 10 x: x + 5 x", ArturoVal::Integer(15));
}

#[test]
fn test_chained_labels() {
    assert_eval!("a: b: 5 a + b", ArturoVal::Integer(10));
}

#[test]
fn test_negative_literal_after_label() {
    assert_eval!("x: -3 x", ArturoVal::Integer(-3));
    assert_eval!("x: 5 x - 3", ArturoVal::Integer(2));
}

#[test]
fn test_unknown_symbol_errors() {
    let err = eval_err("print nonexistent");
    assert!(matches!(
        err.kind,
        arturo_core::ErrorKind::SymbolNotFound { .. }
    ));
}

// =============================================================================
// Control flow
// =============================================================================

#[test]
fn test_if_and_unless() {
    let out = run_captured("if 1 < 2 [print \"yes\"]").unwrap();
    assert_eq!(out, "yes\n");
    let out = run_captured("if 2 < 1 [print \"yes\"]").unwrap();
    assert_eq!(out, "");
    let out = run_captured("unless 2 < 1 [print \"indeed\"]").unwrap();
    assert_eq!(out, "indeed\n");
}

#[test]
fn test_if_else_ternary() {
    assert_eval!("if? 1 < 2 [\"a\"] else [\"b\"]", ArturoVal::string("a"));
    assert_eval!("if? 2 < 1 [\"a\"] else [\"b\"]", ArturoVal::string("b"));
    assert_eval!("unless? 2 < 1 [\"a\"] else [\"b\"]", ArturoVal::string("a"));
}

#[test]
fn test_if_with_dynamic_block() {
    let out = run_captured("b: [print \"dyn\"] if true b").unwrap();
    assert_eq!(out, "dyn\n");
}

#[test]
fn test_switch() {
    assert_eval!("switch 2 > 1 [\"big\"] [\"small\"]", ArturoVal::string("big"));
    assert_eval!("switch 1 > 2 [\"big\"] [\"small\"]", ArturoVal::string("small"));
}

#[test]
fn test_while() {
    let out = run_captured("i: 0 while [i < 3] [print i i: i + 1]").unwrap();
    assert_eq!(out, "0\n1\n2\n");
}

#[test]
fn test_break_and_continue() {
    let out = run_captured("loop 1..10 'i [if i = 4 [break] print i]").unwrap();
    assert_eq!(out, "1\n2\n3\n");
    let out = run_captured("loop 1..5 'i [if even? i [continue] print i]").unwrap();
    assert_eq!(out, "1\n3\n5\n");
}

#[test]
fn test_break_inside_while() {
    let out = run_captured("i: 0 while [true] [i: i + 1 if i = 3 [break]] print i").unwrap();
    assert_eq!(out, "3\n");
}

#[test]
fn test_try_else() {
    let out = run_captured("try? [to :integer \"nope\"] else [print \"caught\"]").unwrap();
    assert_eq!(out, "caught\n");
    let out = run_captured("try? [to :integer \"12\"] else [print \"caught\"]").unwrap();
    assert_eq!(out, "");
}

#[test]
fn test_do_and_scoped_do() {
    assert_eval!("do [1 + 1]", ArturoVal::Integer(2));
    // Scoped execution keeps changes to existing symbols, drops new ones.
    assert_eval!("a: 1 do.scoped [a: 2 tmp: 9] a", ArturoVal::Integer(2));
    let err = eval_err("do.scoped [tmp: 9] tmp");
    assert!(matches!(
        err.kind,
        arturo_core::ErrorKind::SymbolNotFound { .. }
    ));
}

#[test]
fn test_throw_is_catchable() {
    let out = run_captured("try? [throw \"boom\"] else [print \"handled\"]").unwrap();
    assert_eq!(out, "handled\n");
    assert_eval_err!("throw \"unhandled\"");
}

// =============================================================================
// Logic
// =============================================================================

#[test]
fn test_logic() {
    assert_eval!("not? false", ArturoVal::Logical(true));
    assert_eval!("and? true false", ArturoVal::Logical(false));
    assert_eval!("or? false true", ArturoVal::Logical(true));
    // Lazy block operand: the failing branch never runs.
    assert_eval!("and? false [to :integer \"nope\"]", ArturoVal::Logical(false));
}

// =============================================================================
// Collections
// =============================================================================

#[test]
fn test_array_sugar_evaluates_contents() {
    assert_eval!("size @[1 2 3]", ArturoVal::Integer(3));
    assert_eval!("first @[10 + 5 2]", ArturoVal::Integer(15));
}

#[test]
fn test_block_operations() {
    assert_eval!("size [1 2 3]", ArturoVal::Integer(3));
    assert_eval!("first [1 2 3]", ArturoVal::Integer(1));
    assert_eval!("last [1 2 3]", ArturoVal::Integer(3));
    assert_eval!("get [10 20 30] 1", ArturoVal::Integer(20));
    assert_eval!("contains? [1 2 3] 2", ArturoVal::Logical(true));
    assert_eval!("size append [1 2] 3", ArturoVal::Integer(3));
}

#[test]
fn test_sort_and_reverse() {
    let sorted = eval_str("sort [3 1 2]").unwrap();
    assert_eq!(
        sorted,
        ArturoVal::block(vec![
            ArturoVal::Integer(1),
            ArturoVal::Integer(2),
            ArturoVal::Integer(3)
        ])
    );
    let reversed = eval_str("reverse [1 2 3]").unwrap();
    assert_eq!(
        reversed,
        ArturoVal::block(vec![
            ArturoVal::Integer(3),
            ArturoVal::Integer(2),
            ArturoVal::Integer(1)
        ])
    );
}

#[test]
fn test_index_out_of_bounds() {
    let err = eval_err("get [1 2 3] 9");
    assert!(matches!(
        err.kind,
        arturo_core::ErrorKind::IndexOutOfBounds { .. }
    ));
}

#[test]
fn test_strings() {
    assert_eval!("upper \"hi\"", ArturoVal::string("HI"));
    assert_eval!("size \"hello\"", ArturoVal::Integer(5));
    assert_eval!("join.with: \"-\" [\"a\" \"b\"]", ArturoVal::string("a-b"));
    assert_eval!("size split.words \"a b c\"", ArturoVal::Integer(3));
    assert_eval!("replace \"hello\" \"l\" \"L\"", ArturoVal::string("heLLo"));
}

#[test]
fn test_regex_match() {
    assert_eval!("size match \"hello world\" {/o/}", ArturoVal::Integer(2));
    assert_eval!("match? \"hello\" {/^h/}", ArturoVal::Logical(true));
}

#[test]
fn test_dictionaries() {
    assert_eval!("size #[a: 1 b: 2]", ArturoVal::Integer(2));
    assert_eval!("d: #[a: 1 b: 2] d\\a", ArturoVal::Integer(1));
    assert_eval!("d: #[a: 1] d\\a: 9 d\\a", ArturoVal::Integer(9));
    assert_eval!("get #[a: 1] \"missing\"", ArturoVal::Null);
    // Insertion order survives.
    let keys = eval_str("keys #[z: 1 a: 2 m: 3]").unwrap();
    assert_eq!(
        keys,
        ArturoVal::block(vec![
            ArturoVal::string("z"),
            ArturoVal::string("a"),
            ArturoVal::string("m")
        ])
    );
}

#[test]
fn test_paths_on_blocks() {
    assert_eval!("b: @[10 20 30] b\\1", ArturoVal::Integer(20));
    assert_eval!("b: @[10 20 30] i: 2 b\\(i)", ArturoVal::Integer(30));
}

// =============================================================================
// Iteration
// =============================================================================

#[test]
fn test_map_and_select() {
    let doubled = eval_str("map 1..3 'x [x * 2]").unwrap();
    assert_eq!(
        doubled,
        ArturoVal::block(vec![
            ArturoVal::Integer(2),
            ArturoVal::Integer(4),
            ArturoVal::Integer(6)
        ])
    );
    let evens = eval_str("select 1..6 'x [even? x]").unwrap();
    assert_eq!(
        evens,
        ArturoVal::block(vec![
            ArturoVal::Integer(2),
            ArturoVal::Integer(4),
            ArturoVal::Integer(6)
        ])
    );
}

#[test]
fn test_loop_discards_body_values() {
    assert_eval!("loop 1..3 'x [x]", ArturoVal::Null);
}

#[test]
fn test_loop_over_string_and_dictionary() {
    let out = run_captured("loop \"ab\" 'c [print c]").unwrap();
    assert_eq!(out, "a\nb\n");
    let out = run_captured("loop #[a: 1 b: 2] [k v] [print k print v]").unwrap();
    assert_eq!(out, "a\n1\nb\n2\n");
}

#[test]
fn test_loop_binding_restored() {
    assert_eval!("x: 99 loop 1..3 'x [] x", ArturoVal::Integer(99));
}

#[test]
fn test_char_range() {
    let out = run_captured("loop `a`..`c` 'c [print c]").unwrap();
    assert_eq!(out, "a\nb\nc\n");
}

#[test]
fn test_range_with_step() {
    let out = run_captured("loop range 1 7 .step:2 'x [print x]").unwrap();
    assert_eq!(out, "1\n3\n5\n7\n");
}

// =============================================================================
// Functions
// =============================================================================

#[test]
fn test_function_definition_and_call() {
    assert_eval!("double: $[x][x * 2] double 21", ArturoVal::Integer(42));
    assert_eval!("addmul: $[a b][(a + b) * a] addmul 2 3", ArturoVal::Integer(10));
}

#[test]
fn test_function_return() {
    assert_eval!(
        "f: $[x][if x > 0 [return \"pos\"] \"nonpos\"] f 5",
        ArturoVal::string("pos")
    );
    assert_eval!(
        "f: $[x][if x > 0 [return \"pos\"] \"nonpos\"] f 0",
        ArturoVal::string("nonpos")
    );
}

#[test]
fn test_function_scope_is_isolated() {
    assert_eval!("x: 1 f: $[y][x: y] f 99 x", ArturoVal::Integer(1));
}

#[test]
fn test_inline_function_shares_scope() {
    assert_eval!(
        "x: 1 setx: function .inline [][x: 99] setx x",
        ArturoVal::Integer(99)
    );
}

#[test]
fn test_function_exports() {
    assert_eval!(
        "total: 0 bump: function .export:[total] [][total: 10] bump total",
        ArturoVal::Integer(10)
    );
}

#[test]
fn test_function_imports() {
    assert_eval!(
        "f: function .import: #[k: 5] [x][x + k] f 1",
        ArturoVal::Integer(6)
    );
}

#[test]
fn test_memoized_function_runs_once() {
    let src = "counter: @[0] \
               slow: function .memoize [x][set counter 0 (get counter 0) + 1 x * 2] \
               r1: slow 5 r2: slow 5 \
               @[r1 r2 get counter 0]";
    let result = eval_str(src).unwrap();
    assert_eq!(
        result,
        ArturoVal::block(vec![
            ArturoVal::Integer(10),
            ArturoVal::Integer(10),
            ArturoVal::Integer(1)
        ])
    );
}

#[test]
fn test_arity_mismatch() {
    let err = eval_err("f: $[a b][a + b] x: f 1");
    assert!(matches!(
        err.kind,
        arturo_core::ErrorKind::ArityMismatch { .. }
    ));
}

#[test]
fn test_parameter_type_constraints() {
    assert_eval!("f: $[x :integer][x + 1] f 1", ArturoVal::Integer(2));
    let err = eval_err("f: $[x :integer][x + 1] f \"oops\"");
    assert!(matches!(
        err.kind,
        arturo_core::ErrorKind::TypeMismatch { .. }
    ));
}

#[test]
fn test_call_attributes() {
    let out = run_captured("greet: $[name][if attr? 'loud [prints \"!\"] print name] greet .loud \"hi\"")
        .unwrap();
    assert_eq!(out, "!hi\n");
    let out = run_captured("greet: $[name][if attr? 'loud [prints \"!\"] print name] greet \"hi\"")
        .unwrap();
    assert_eq!(out, "hi\n");
}

#[test]
fn test_attr_value() {
    assert_eval!(
        "f: $[x][x + attr 'extra] f .extra: 10 5",
        ArturoVal::Integer(15)
    );
}

#[test]
fn test_functions_are_values() {
    assert_eval!("f: $[x][x + 1] g: f g 41", ArturoVal::Integer(42));
}

// =============================================================================
// Builtin error discipline
// =============================================================================

#[test]
fn test_builtin_error_restores_stack() {
    let mut vm = Vm::new();
    let _ = vm.capture_output();
    vm.run_source("x: 7").unwrap();
    let depth = vm.stack.len();
    let err = vm.run_source("add 1 \"not a number\"");
    assert!(err.is_err());
    assert_eq!(vm.stack.len(), depth + 2, "arguments restored on error");
}
