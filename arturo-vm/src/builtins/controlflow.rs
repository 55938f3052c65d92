// arturo-vm - Bytecode translator and virtual machine for the Arturo programming language
// Copyright (c) 2026 The Arturo Project Contributors. MIT licensed.

//! Control-flow builtins.
//!
//! The translator compiles the literal-block forms of `if` and `unless`
//! into jumps; these builtins are the dynamic path, reached when a block
//! arrives as a runtime value. `while` always runs here so its body has an
//! iteration frame to absorb `break` and `continue`. `return`, `break` and
//! `continue` only flip the VM's execution state.

use arturo_core::{Error, Result};
use arturo_parser::{ArturoVal, ValueKind};

use crate::builtins::{any, blockish, builtin, logical, Attrs, Registry};
use crate::opcode::OpCode;
use crate::vm::frame::ExecState;
use crate::vm::Vm;
use arturo_parser::KindSet;

fn exec_kinds() -> KindSet {
    blockish().or(KindSet::only(ValueKind::Bytecode))
}

fn builtin_if(vm: &mut Vm, args: &[ArturoVal], _attrs: &Attrs) -> Result<()> {
    if args[0].is_truthy() {
        vm.exec_block_value(&args[1])?;
    }
    Ok(())
}

fn builtin_if_returning(vm: &mut Vm, args: &[ArturoVal], _attrs: &Attrs) -> Result<()> {
    let holds = args[0].is_truthy();
    if holds {
        vm.exec_block_value(&args[1])?;
    }
    vm.stack.push(ArturoVal::Logical(holds))
}

fn builtin_unless(vm: &mut Vm, args: &[ArturoVal], _attrs: &Attrs) -> Result<()> {
    if !args[0].is_truthy() {
        vm.exec_block_value(&args[1])?;
    }
    Ok(())
}

fn builtin_unless_returning(vm: &mut Vm, args: &[ArturoVal], _attrs: &Attrs) -> Result<()> {
    let holds = !args[0].is_truthy();
    if holds {
        vm.exec_block_value(&args[1])?;
    }
    vm.stack.push(ArturoVal::Logical(holds))
}

/// Runs its block when the logical left behind by `if?`/`unless?` is false.
fn builtin_else(vm: &mut Vm, args: &[ArturoVal], _attrs: &Attrs) -> Result<()> {
    let flag = vm.stack.pop()?;
    let ArturoVal::Logical(done) = flag else {
        return Err(Error::type_mismatch(
            "else",
            "condition",
            ":logical",
            flag.type_name(),
        ));
    };
    if !done {
        vm.exec_block_value(&args[0])?;
    }
    Ok(())
}

fn builtin_switch(vm: &mut Vm, args: &[ArturoVal], _attrs: &Attrs) -> Result<()> {
    if args[0].is_truthy() {
        vm.exec_block_value(&args[1])
    } else {
        vm.exec_block_value(&args[2])
    }
}

fn builtin_while(vm: &mut Vm, args: &[ArturoVal], _attrs: &Attrs) -> Result<()> {
    loop {
        if vm.stop_was_requested() {
            return Ok(());
        }
        let depth = vm.stack.len();
        vm.exec_block_value(&args[0])?;
        let holds = if vm.stack.len() > depth {
            vm.stack.pop()?.is_truthy()
        } else {
            false
        };
        vm.stack.truncate(depth);
        if !holds {
            return Ok(());
        }

        vm.exec_block_value(&args[1])?;
        match vm.state {
            ExecState::Breaking => {
                vm.state = ExecState::Running;
                return Ok(());
            }
            ExecState::Continuing => {
                vm.state = ExecState::Running;
            }
            ExecState::AwaitingReturn => return Ok(()),
            ExecState::Running => {}
        }
    }
}

fn builtin_do(vm: &mut Vm, args: &[ArturoVal], attrs: &Attrs) -> Result<()> {
    if attrs.get("scoped").map(|v| v.is_truthy()).unwrap_or(false) {
        // Scoped execution merges back only symbols that already existed;
        // new bindings die with the block.
        let snapshot = vm.syms.snapshot();
        let result = vm.exec_block_value(&args[0]);
        vm.syms.retain_existing(&snapshot);
        return result;
    }
    vm.exec_block_value(&args[0])
}

/// Runs a block, absorbing any error it raises; leaves a logical telling
/// whether it completed, ready for a trailing `else`.
fn builtin_try(vm: &mut Vm, args: &[ArturoVal], _attrs: &Attrs) -> Result<()> {
    let depth = vm.stack.len();
    match vm.exec_block_value(&args[0]) {
        Ok(()) => vm.stack.push(ArturoVal::Logical(true)),
        Err(_) => {
            vm.stack.truncate(depth);
            vm.state = ExecState::Running;
            vm.stack.push(ArturoVal::Logical(false))
        }
    }
}

/// Invoke a function value (or the function a name resolves to) with an
/// argument block.
fn builtin_call(vm: &mut Vm, args: &[ArturoVal], _attrs: &Attrs) -> Result<()> {
    let fval = match &args[0] {
        ArturoVal::Function(_) => args[0].clone(),
        ArturoVal::Literal(n) | ArturoVal::String(n) | ArturoVal::Word(n) => vm
            .syms
            .get(n)
            .cloned()
            .ok_or_else(|| Error::symbol_not_found(&**n))?,
        other => {
            return Err(Error::type_mismatch(
                "call",
                "function",
                ":function :literal :string",
                other.type_name(),
            ));
        }
    };
    let call_args = vm.exec_collect(&args[1])?;
    if let Some(result) = vm.call_value(&fval, call_args, "call")? {
        vm.stack.push(result)?;
    }
    Ok(())
}

fn builtin_return(vm: &mut Vm, args: &[ArturoVal], _attrs: &Attrs) -> Result<()> {
    vm.stack.push(args[0].clone())?;
    vm.state = ExecState::AwaitingReturn;
    Ok(())
}

fn builtin_break(vm: &mut Vm, _args: &[ArturoVal], _attrs: &Attrs) -> Result<()> {
    vm.state = ExecState::Breaking;
    Ok(())
}

fn builtin_continue(vm: &mut Vm, _args: &[ArturoVal], _attrs: &Attrs) -> Result<()> {
    vm.state = ExecState::Continuing;
    Ok(())
}

pub(crate) fn register(reg: &mut Registry) {
    reg.add(builtin(
        "if",
        "execute the block when the condition holds",
        &[("condition", any()), ("block", exec_kinds())],
        &[],
        KindSet::NONE,
        "if 2 > 1 [print \"yes\"]",
        Some(OpCode::If),
        builtin_if,
    ));
    reg.add(builtin(
        "if?",
        "execute the block when the condition holds, leaving the condition for else",
        &[("condition", any()), ("block", exec_kinds())],
        &[],
        logical(),
        "if? 1 > 2 [print \"yes\"] else [print \"no\"]",
        Some(OpCode::IfE),
        builtin_if_returning,
    ));
    reg.add(builtin(
        "unless",
        "execute the block when the condition does not hold",
        &[("condition", any()), ("block", exec_kinds())],
        &[],
        KindSet::NONE,
        "unless 1 > 2 [print \"indeed\"]",
        Some(OpCode::Unless),
        builtin_unless,
    ));
    reg.add(builtin(
        "unless?",
        "execute the block when the condition does not hold, leaving a logical for else",
        &[("condition", any()), ("block", exec_kinds())],
        &[],
        logical(),
        "unless? 1 > 2 [print \"indeed\"] else [print \"not\"]",
        Some(OpCode::UnlessE),
        builtin_unless_returning,
    ));
    reg.add(builtin(
        "else",
        "execute the block when the preceding if? or unless? did not",
        &[("block", exec_kinds())],
        &[],
        KindSet::NONE,
        "if? 1 > 2 [print \"yes\"] else [print \"no\"]",
        Some(OpCode::Else),
        builtin_else,
    ));
    reg.add(builtin(
        "switch",
        "execute the first block when the condition holds, the second otherwise",
        &[
            ("condition", any()),
            ("then", exec_kinds()),
            ("otherwise", exec_kinds()),
        ],
        &[],
        KindSet::NONE,
        "switch 2 > 1 [print \"bigger\"] [print \"smaller\"]",
        Some(OpCode::Switch),
        builtin_switch,
    ));
    reg.add(builtin(
        "while",
        "keep executing the body while the condition block yields truth",
        &[("condition", exec_kinds()), ("body", exec_kinds())],
        &[],
        KindSet::NONE,
        "i: 0 while [i < 3] [print i  i: i + 1]",
        Some(OpCode::While),
        builtin_while,
    ));
    reg.add(builtin(
        "do",
        "execute a block, inline block, bytecode value or code string in the current scope",
        &[("code", exec_kinds().or(KindSet::only(ValueKind::String)))],
        &[(
            "scoped",
            logical(),
            "discard bindings the block introduces, keep changes to existing ones",
        )],
        any(),
        "do [print \"hello\"]",
        None,
        builtin_do,
    ));
    reg.add(builtin(
        "try?",
        "execute a block, swallowing errors; leaves a logical for else",
        &[("block", exec_kinds())],
        &[],
        logical(),
        "try? [to :integer \"nope\"] else [print \"failed\"]",
        None,
        builtin_try,
    ));
    reg.add(builtin(
        "call",
        "invoke a function value with an argument block",
        &[
            ("function", KindSet::of(&[ValueKind::Function, ValueKind::Literal, ValueKind::String, ValueKind::Word])),
            ("arguments", blockish()),
        ],
        &[],
        any(),
        "call 'add [1 2]",
        None,
        builtin_call,
    ));
    reg.add(builtin(
        "return",
        "leave the current function with the given result",
        &[("value", any())],
        &[],
        KindSet::NONE,
        "f: $[x][return x + 1]",
        Some(OpCode::Return),
        builtin_return,
    ));
    reg.add(builtin(
        "break",
        "leave the nearest enclosing iteration",
        &[],
        &[],
        KindSet::NONE,
        "loop 1..10 'i [if i = 5 [break]]",
        Some(OpCode::Break),
        builtin_break,
    ));
    reg.add(builtin(
        "continue",
        "skip to the next round of the nearest enclosing iteration",
        &[],
        &[],
        KindSet::NONE,
        "loop 1..10 'i [if even? i [continue] print i]",
        Some(OpCode::Continue),
        builtin_continue,
    ));
}
