// arturo-vm - Common test utilities
// Copyright (c) 2026 The Arturo Project Contributors. MIT licensed.

//! Shared helpers for the integration tests.
//!
//! In a test file, add:
//! ```ignore
//! mod common;
//! use common::*;
//! ```

#![allow(dead_code)]

pub use arturo_parser::ArturoVal;
pub use arturo_vm::Vm;

/// Run source on a fresh VM and return the value left on top of the stack,
/// or null when the program leaves nothing.
pub fn eval_str(source: &str) -> Result<ArturoVal, String> {
    let mut vm = Vm::new();
    eval_str_with_vm(source, &mut vm)
}

/// Run source on an existing VM.
pub fn eval_str_with_vm(source: &str, vm: &mut Vm) -> Result<ArturoVal, String> {
    let depth = vm.stack.len();
    vm.run_source(source).map_err(|e| e.to_string())?;
    if vm.stack.len() > depth {
        vm.stack.pop().map_err(|e| e.to_string())
    } else {
        Ok(ArturoVal::Null)
    }
}

/// Run source on a fresh VM with captured output; returns what it printed.
pub fn run_captured(source: &str) -> Result<String, String> {
    let mut vm = Vm::new();
    let buffer = vm.capture_output();
    vm.run_source(source).map_err(|e| e.to_string())?;
    let out = buffer.borrow().clone();
    Ok(out)
}

/// Run source expecting an error; returns the structured error.
pub fn eval_err(source: &str) -> arturo_core::Error {
    let mut vm = Vm::new();
    let _ = vm.capture_output();
    match vm.run_source(source) {
        Ok(()) => panic!("expected an error for: {}", source),
        Err(e) => e,
    }
}
