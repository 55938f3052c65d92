// arturo-vm - Property-based tests for the core invariants
// Copyright (c) 2026 The Arturo Project Contributors. MIT licensed.

//! Property-based tests:
//! - codify/parse round-trips for parseable sources
//! - scalar conversions invert
//! - memoized functions are pure and cached
//! - truncated instruction streams fail cleanly, never crash
//! - builtin errors leave the stack at its entry depth
//! - object comparison follows the `compare` magic method's sign

mod common;

use std::rc::Rc;

use arturo_parser::{codify, ArturoVal, Parser, Translation};
use arturo_vm::{OpCode, Vm};
use common::*;
use proptest::prelude::*;

// =============================================================================
// Source generation
// =============================================================================

fn arb_ident() -> impl Strategy<Value = String> {
    "[a-z][a-z0-9]{0,4}".prop_map(|s| s)
}

fn arb_scalar_source() -> impl Strategy<Value = String> {
    prop_oneof![
        (-1000i64..1000).prop_map(|i| i.to_string()),
        "[a-zA-Z0-9 ]{0,12}".prop_map(|s| format!("\"{}\"", s)),
        arb_ident().prop_map(|w| format!("'{}", w)),
        Just("true".to_string()),
        Just("null".to_string()),
    ]
}

fn arb_value_source() -> impl Strategy<Value = String> {
    prop_oneof![
        arb_scalar_source(),
        proptest::collection::vec(arb_scalar_source(), 0..4)
            .prop_map(|items| format!("[{}]", items.join(" "))),
    ]
}

fn arb_statement() -> impl Strategy<Value = String> {
    prop_oneof![
        (arb_ident(), arb_value_source()).prop_map(|(n, v)| format!("{}: {}", n, v)),
        arb_value_source(),
    ]
}

fn arb_source() -> impl Strategy<Value = String> {
    proptest::collection::vec(arb_statement(), 1..6).prop_map(|stmts| stmts.join("\n"))
}

proptest! {
    // parse(codify(parse(s))) = parse(s)
    #[test]
    fn prop_codify_parse_round_trip(source in arb_source()) {
        let first = Parser::parse_str(&source).expect("generated source parses");
        let rendered = codify(&ArturoVal::Block(first.clone()), false, true, false);
        let second = Parser::parse_str(&rendered)
            .unwrap_or_else(|e| panic!("codified source failed to parse: {} <- {}", e, rendered));
        prop_assert_eq!(first.to_vec(), second.to_vec());
    }

    // convert(convert(v, T), tag(v)) = v for compatible scalar pairs
    #[test]
    fn prop_integer_string_round_trip(i in any::<i64>()) {
        let src = format!("to :integer to :string {}", i);
        // Negative literals at statement start lex as numbers.
        prop_assert_eq!(eval_str(&src).unwrap(), ArturoVal::Integer(i));
    }

    #[test]
    fn prop_integer_char_round_trip(c in any::<char>()) {
        let mut vm = Vm::new();
        vm.run_source(&format!("to :integer to :char {}", c as u32)).unwrap();
        prop_assert_eq!(vm.stack.pop().unwrap(), ArturoVal::Integer(c as i64));
    }

    #[test]
    fn prop_logical_integer_round_trip(b in any::<bool>()) {
        let src = format!("to :logical to :integer {}", b);
        prop_assert_eq!(eval_str(&src).unwrap(), ArturoVal::Logical(b));
    }

    // Memoized functions: equal results, the body runs once per argument.
    #[test]
    fn prop_memoized_functions_are_cached(x in -100i64..100) {
        let src = format!(
            "counter: @[0] \
             f: function .memoize [x][set counter 0 (get counter 0) + 1 x * 3] \
             a: f {x} b: f {x} \
             @[a b get counter 0]",
            x = x
        );
        let result = eval_str(&src).unwrap();
        let expected = ArturoVal::block(vec![
            ArturoVal::Integer(x * 3),
            ArturoVal::Integer(x * 3),
            ArturoVal::Integer(1),
        ]);
        prop_assert_eq!(result, expected);
    }

    // Executing any instruction-boundary prefix of a translation (sealed
    // with End) yields a clean result: a value state or a VM error, never a
    // host crash.
    #[test]
    fn prop_truncated_prefix_fails_cleanly(cut in 0usize..64) {
        let mut vm = Vm::new();
        let _ = vm.capture_output();
        let block = Parser::parse_str("x: 5 y: add x 2 print y z: mul y y").unwrap();
        let full = vm.translate_block_cached(&block).unwrap();

        let boundaries = instruction_boundaries(&full);
        let cut_at = boundaries[cut.min(boundaries.len() - 1)];
        let mut prefix = full.instructions[..cut_at].to_vec();
        prefix.push(OpCode::End as u8);

        let truncated = Rc::new(Translation {
            constants: full.constants.clone(),
            instructions: prefix,
        });

        let mut fresh = Vm::new();
        let _ = fresh.capture_output();
        let _ = fresh.exec_translation(&truncated);
    }

    // After a failing builtin the stack depth equals its depth at entry.
    #[test]
    fn prop_builtin_error_is_stack_neutral(junk in 0usize..5) {
        let mut vm = Vm::new();
        let _ = vm.capture_output();
        for i in 0..junk {
            vm.stack.push(ArturoVal::Integer(i as i64)).unwrap();
        }
        let depth = vm.stack.len();
        let result = vm.run_source("add 1 \"oops\"");
        prop_assert!(result.is_err());
        // Both arguments were re-pushed, so depth is entry depth.
        prop_assert_eq!(vm.stack.len(), depth + 2);
    }

    // Object ordering follows the compare hook's sign.
    #[test]
    fn prop_do_compare_sign(a in -50i64..50, b in -50i64..50) {
        let src = format!(
            "define :m [v][compare: $[that][this\\v - that\\v]] \
             x: to :m [{a}] y: to :m [{b}] \
             @[less? x y equal? x y greater? x y]",
            a = a,
            b = b
        );
        let result = eval_str(&src).unwrap();
        let expected = ArturoVal::block(vec![
            ArturoVal::Logical(a < b),
            ArturoVal::Logical(a == b),
            ArturoVal::Logical(a > b),
        ]);
        prop_assert_eq!(result, expected);
    }
}

/// Instruction boundaries of a translation, for clean truncation points.
fn instruction_boundaries(t: &Translation) -> Vec<usize> {
    let mut boundaries = vec![0];
    let mut ip = 0;
    while ip < t.instructions.len() {
        let byte = t.instructions[ip];
        ip += 1;
        if let Some(op) = OpCode::from_byte(byte) {
            ip += op.operand_width();
        }
        boundaries.push(ip);
    }
    boundaries
}
