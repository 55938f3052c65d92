// arturo-vm - Bytecode translator and virtual machine for the Arturo programming language
// Copyright (c) 2026 The Arturo Project Contributors. MIT licensed.

//! Comparison predicates.
//!
//! Equality and ordering route through the VM so objects with a `compare`
//! magic method get their own say.

use arturo_core::{Error, Result};
use arturo_parser::ArturoVal;
use std::cmp::Ordering;

use crate::builtins::{any, builtin, logical, Attrs, Registry};
use crate::opcode::OpCode;
use crate::vm::Vm;

fn builtin_equal(vm: &mut Vm, args: &[ArturoVal], _attrs: &Attrs) -> Result<()> {
    let eq = vm.values_equal(&args[0], &args[1])?;
    vm.stack.push(ArturoVal::Logical(eq))
}

fn builtin_not_equal(vm: &mut Vm, args: &[ArturoVal], _attrs: &Attrs) -> Result<()> {
    let eq = vm.values_equal(&args[0], &args[1])?;
    vm.stack.push(ArturoVal::Logical(!eq))
}

fn ordered(vm: &mut Vm, name: &'static str, a: &ArturoVal, b: &ArturoVal) -> Result<Ordering> {
    vm.compare_values(a, b)?.ok_or_else(|| {
        Error::type_mismatch(name, "value", "comparable values", a.type_name())
    })
}

fn builtin_greater(vm: &mut Vm, args: &[ArturoVal], _attrs: &Attrs) -> Result<()> {
    let ord = ordered(vm, "greater?", &args[0], &args[1])?;
    vm.stack.push(ArturoVal::Logical(ord == Ordering::Greater))
}

fn builtin_greater_or_equal(vm: &mut Vm, args: &[ArturoVal], _attrs: &Attrs) -> Result<()> {
    let ord = ordered(vm, "greaterOrEqual?", &args[0], &args[1])?;
    vm.stack.push(ArturoVal::Logical(ord != Ordering::Less))
}

fn builtin_less(vm: &mut Vm, args: &[ArturoVal], _attrs: &Attrs) -> Result<()> {
    let ord = ordered(vm, "less?", &args[0], &args[1])?;
    vm.stack.push(ArturoVal::Logical(ord == Ordering::Less))
}

fn builtin_less_or_equal(vm: &mut Vm, args: &[ArturoVal], _attrs: &Attrs) -> Result<()> {
    let ord = ordered(vm, "lessOrEqual?", &args[0], &args[1])?;
    vm.stack.push(ArturoVal::Logical(ord != Ordering::Greater))
}

/// Signed comparison: -1, 0 or 1, null when incomparable.
fn builtin_compare(vm: &mut Vm, args: &[ArturoVal], _attrs: &Attrs) -> Result<()> {
    let result = match vm.compare_values(&args[0], &args[1])? {
        Some(Ordering::Less) => ArturoVal::Integer(-1),
        Some(Ordering::Equal) => ArturoVal::Integer(0),
        Some(Ordering::Greater) => ArturoVal::Integer(1),
        None => ArturoVal::Null,
    };
    vm.stack.push(result)
}

pub(crate) fn register(reg: &mut Registry) {
    reg.add(builtin(
        "equal?",
        "whether the two values are equal",
        &[("value", any()), ("other", any())],
        &[],
        logical(),
        "equal? 2 2",
        Some(OpCode::Eq),
        builtin_equal,
    ));
    reg.add(builtin(
        "notEqual?",
        "whether the two values differ",
        &[("value", any()), ("other", any())],
        &[],
        logical(),
        "notEqual? 2 3",
        Some(OpCode::Ne),
        builtin_not_equal,
    ));
    reg.add(builtin(
        "greater?",
        "whether the first value is greater than the second",
        &[("value", any()), ("other", any())],
        &[],
        logical(),
        "greater? 3 2",
        Some(OpCode::Gt),
        builtin_greater,
    ));
    reg.add(builtin(
        "greaterOrEqual?",
        "whether the first value is greater than or equal to the second",
        &[("value", any()), ("other", any())],
        &[],
        logical(),
        "greaterOrEqual? 3 3",
        Some(OpCode::Ge),
        builtin_greater_or_equal,
    ));
    reg.add(builtin(
        "less?",
        "whether the first value is less than the second",
        &[("value", any()), ("other", any())],
        &[],
        logical(),
        "less? 2 3",
        Some(OpCode::Lt),
        builtin_less,
    ));
    reg.add(builtin(
        "lessOrEqual?",
        "whether the first value is less than or equal to the second",
        &[("value", any()), ("other", any())],
        &[],
        logical(),
        "lessOrEqual? 2 2",
        Some(OpCode::Le),
        builtin_less_or_equal,
    ));
    reg.add(builtin(
        "compare",
        "signed comparison of two values: -1, 0 or 1, null when incomparable",
        &[("value", any()), ("other", any())],
        &[],
        any(),
        "compare 1 2",
        None,
        builtin_compare,
    ));
}
