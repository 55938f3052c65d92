// arturo-vm - Bytecode translator and virtual machine for the Arturo programming language
// Copyright (c) 2026 The Arturo Project Contributors. MIT licensed.

//! Date builtins. Dates are UTC throughout.

use arturo_core::Result;
use arturo_parser::{ArturoVal, KindSet, ValueKind};
use chrono::Utc;

use crate::builtins::{builtin, Attrs, Registry};
use crate::vm::Vm;

fn builtin_now(vm: &mut Vm, _args: &[ArturoVal], _attrs: &Attrs) -> Result<()> {
    vm.stack.push(ArturoVal::Date(Utc::now()))
}

pub(crate) fn register(reg: &mut Registry) {
    reg.add(builtin(
        "now",
        "the current date and time",
        &[],
        &[],
        KindSet::only(ValueKind::Date),
        "print now",
        None,
        builtin_now,
    ));
}
