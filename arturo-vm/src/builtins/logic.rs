// arturo-vm - Bytecode translator and virtual machine for the Arturo programming language
// Copyright (c) 2026 The Arturo Project Contributors. MIT licensed.

//! Logical operations over truthiness.

use arturo_core::Result;
use arturo_parser::ArturoVal;

use crate::builtins::{any, builtin, logical, Attrs, Registry};
use crate::opcode::OpCode;
use crate::vm::Vm;

fn builtin_not(vm: &mut Vm, args: &[ArturoVal], _attrs: &Attrs) -> Result<()> {
    vm.stack.push(ArturoVal::Logical(!args[0].is_truthy()))
}

fn builtin_and(vm: &mut Vm, args: &[ArturoVal], _attrs: &Attrs) -> Result<()> {
    let result = args[0].is_truthy() && truthy_operand(vm, &args[1])?;
    vm.stack.push(ArturoVal::Logical(result))
}

fn builtin_or(vm: &mut Vm, args: &[ArturoVal], _attrs: &Attrs) -> Result<()> {
    let result = args[0].is_truthy() || truthy_operand(vm, &args[1])?;
    vm.stack.push(ArturoVal::Logical(result))
}

/// Block operands evaluate lazily, which is what makes the short circuit
/// above observable.
fn truthy_operand(vm: &mut Vm, value: &ArturoVal) -> Result<bool> {
    match value {
        ArturoVal::Block(_) | ArturoVal::Inline(_) => {
            let depth = vm.stack.len();
            vm.exec_block_value(value)?;
            let result = if vm.stack.len() > depth {
                vm.stack.pop()?.is_truthy()
            } else {
                false
            };
            vm.stack.truncate(depth);
            Ok(result)
        }
        other => Ok(other.is_truthy()),
    }
}

pub(crate) fn register(reg: &mut Registry) {
    reg.add(builtin(
        "not?",
        "the logical complement of a value's truthiness",
        &[("value", any())],
        &[],
        logical(),
        "not? false",
        Some(OpCode::Not),
        builtin_not,
    ));
    reg.add(builtin(
        "and?",
        "whether both values hold; block operands evaluate lazily",
        &[("value", any()), ("other", any())],
        &[],
        logical(),
        "and? true [greater? 2 1]",
        Some(OpCode::And),
        builtin_and,
    ));
    reg.add(builtin(
        "or?",
        "whether either value holds; block operands evaluate lazily",
        &[("value", any()), ("other", any())],
        &[],
        logical(),
        "or? false [less? 1 2]",
        Some(OpCode::Or),
        builtin_or,
    ));
}
