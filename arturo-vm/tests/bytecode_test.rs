// arturo-vm - Bytecode-level tests
// Copyright (c) 2026 The Arturo Project Contributors. MIT licensed.

//! Tests that drive the VM with hand-assembled bytecode: jump opcodes in
//! both widths, truncated streams, the exchange format and host stop
//! requests.

mod common;

use std::rc::Rc;

use arturo_core::ErrorKind;
use arturo_vm::{disassemble, Emitter, OpCode, Vm};
use common::*;

fn run_bytecode(emit: impl FnOnce(&mut Emitter)) -> Result<Vm, arturo_core::Error> {
    let mut e = Emitter::new();
    emit(&mut e);
    let t = Rc::new(e.finish());
    let mut vm = Vm::new();
    vm.exec_translation(&t)?;
    Ok(vm)
}

#[test]
fn test_short_conditional_jump() {
    // true ? skip the push of 5, then push 7.
    let mut vm = run_bytecode(|e| {
        e.emit_op(OpCode::ConstTrue);
        e.emit_op(OpCode::JmpIf);
        e.emit_u8(1); // over the one-byte ConstI5
        e.emit_push_value(ArturoVal::Integer(5)).unwrap();
        e.emit_push_value(ArturoVal::Integer(7)).unwrap();
    })
    .unwrap();
    assert_eq!(vm.stack.len(), 1);
    assert_eq!(vm.stack.pop().unwrap(), ArturoVal::Integer(7));
}

#[test]
fn test_short_jump_not_taken() {
    let mut vm = run_bytecode(|e| {
        e.emit_op(OpCode::ConstFalse);
        e.emit_op(OpCode::JmpIf);
        e.emit_u8(1);
        e.emit_push_value(ArturoVal::Integer(5)).unwrap();
    })
    .unwrap();
    assert_eq!(vm.stack.pop().unwrap(), ArturoVal::Integer(5));
}

#[test]
fn test_comparison_jump() {
    // 1 < 2, so JmpIfLt skips the first push.
    let mut vm = run_bytecode(|e| {
        e.emit_push_value(ArturoVal::Integer(2)).unwrap();
        e.emit_push_value(ArturoVal::Integer(1)).unwrap();
        e.emit_op(OpCode::JmpIfLt);
        e.emit_u8(1);
        e.emit_push_value(ArturoVal::Integer(9)).unwrap();
        e.emit_push_value(ArturoVal::Integer(3)).unwrap();
    })
    .unwrap();
    assert_eq!(vm.stack.len(), 1);
    assert_eq!(vm.stack.pop().unwrap(), ArturoVal::Integer(3));
}

#[test]
fn test_goto_and_goup() {
    // A counted loop written directly with a back-edge:
    //   i: 3
    //   top: i  dec  storn i       (store, keep on stack)
    //   jmp-if-not-zero back to top
    let mut vm = run_bytecode(|e| {
        e.emit_push_value(ArturoVal::Integer(3)).unwrap();
        e.emit_store("i").unwrap();
        let top = e.current_offset();
        e.emit_load("i").unwrap();
        e.emit_op(OpCode::Dec);
        e.emit_store_keep("i").unwrap();
        e.emit_push_value(ArturoVal::Integer(0)).unwrap();
        e.emit_op(OpCode::Swap);
        // Leave the loop once the counter reaches zero; the offset skips
        // the three-byte Goup.
        e.emit_op(OpCode::JmpIfLe);
        e.emit_u8(3);
        e.emit_goup(top);
    })
    .unwrap();
    // The loop ran i down to zero.
    assert_eq!(vm.syms.get("i"), Some(&ArturoVal::Integer(0)));
}

#[test]
fn test_truncated_arithmetic_underflows() {
    let err = run_bytecode(|e| {
        e.emit_op(OpCode::Add);
    })
    .unwrap_err();
    assert!(matches!(err.kind, ErrorKind::StackUnderflow));
}

#[test]
fn test_unknown_symbol_via_bytecode() {
    let err = run_bytecode(|e| {
        e.emit_load("no_such_thing").unwrap();
    })
    .unwrap_err();
    assert!(matches!(err.kind, ErrorKind::SymbolNotFound { .. }));
}

#[test]
fn test_stack_ops() {
    let mut vm = run_bytecode(|e| {
        e.emit_push_value(ArturoVal::Integer(1)).unwrap();
        e.emit_push_value(ArturoVal::Integer(2)).unwrap();
        e.emit_op(OpCode::Over); // 1 2 1
        e.emit_op(OpCode::Dup); // 1 2 1 1
        e.emit_op(OpCode::Pop); // 1 2 1
        e.emit_op(OpCode::Swap); // 1 1 2
        e.emit_op(OpCode::Nop);
    })
    .unwrap();
    assert_eq!(vm.stack.pop().unwrap(), ArturoVal::Integer(2));
    assert_eq!(vm.stack.pop().unwrap(), ArturoVal::Integer(1));
    assert_eq!(vm.stack.pop().unwrap(), ArturoVal::Integer(1));
    assert!(vm.stack.is_empty());
}

#[test]
fn test_stop_request_unwinds_cleanly() {
    let mut vm = Vm::new();
    let _ = vm.capture_output();
    vm.request_stop();
    // Without the stop this would iterate for a very long time.
    let result = vm.run_source("loop 1..100000000 'x [x]");
    assert!(result.is_ok());
}

#[test]
fn test_eol_markers_track_lines() {
    let mut vm = Vm::new();
    let _ = vm.capture_output();
    let err = vm.run_source("x: 1\ny: 2\nprint missing").unwrap_err();
    assert_eq!(err.line, Some(3));
}

#[test]
fn test_disassembly_of_translated_source() {
    let mut vm = Vm::new();
    let block = arturo_parser::Parser::parse_str("print 40 + 2").unwrap();
    let t = vm.translate_block_cached(&block).unwrap();
    let text = disassemble(&t);
    assert!(text.contains("Add"));
    assert!(text.contains("print"));
    assert!(text.contains("End"));
}

#[test]
fn test_exchange_format_shape() {
    let mut vm = Vm::new();
    let _ = vm.capture_output();
    vm.run_source("d: to :dictionary to :bytecode [1 + 2]").unwrap();
    let d = vm.syms.get("d").cloned().unwrap();
    let ArturoVal::Dictionary(dict) = d else {
        panic!("expected dictionary");
    };
    assert!(matches!(dict.get("data"), Some(ArturoVal::Block(_))));
    let Some(ArturoVal::Block(code)) = dict.get("code") else {
        panic!("expected code block");
    };
    // Every code entry is a byte.
    for item in code.items().iter() {
        let byte = item.exact_i64().unwrap();
        assert!((0..=255).contains(&byte));
    }
}
