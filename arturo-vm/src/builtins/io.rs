// arturo-vm - Bytecode translator and virtual machine for the Arturo programming language
// Copyright (c) 2026 The Arturo Project Contributors. MIT licensed.

//! Console output builtins.
//!
//! Printing goes through the VM's output sink so embedders and tests can
//! capture it. A block argument prints its elements joined by single
//! spaces, the way the language has always done.

use arturo_core::Result;
use arturo_parser::ArturoVal;

use crate::builtins::{any, builtin, Attrs, Registry};
use crate::vm::Vm;

fn builtin_print(vm: &mut Vm, args: &[ArturoVal], _attrs: &Attrs) -> Result<()> {
    let text = vm.print_form(&args[0])?;
    vm.write_line(&text);
    Ok(())
}

fn builtin_prints(vm: &mut Vm, args: &[ArturoVal], _attrs: &Attrs) -> Result<()> {
    let text = vm.print_form(&args[0])?;
    vm.write_out(&text);
    Ok(())
}

pub(crate) fn register(reg: &mut Registry) {
    reg.add(builtin(
        "print",
        "print a value followed by a newline",
        &[("value", any())],
        &[],
        arturo_parser::KindSet::NONE,
        "print \"Hello world!\"",
        None,
        builtin_print,
    ));
    reg.add(builtin(
        "prints",
        "print a value without a trailing newline",
        &[("value", any())],
        &[],
        arturo_parser::KindSet::NONE,
        "prints \"> \"",
        None,
        builtin_prints,
    ));
}
