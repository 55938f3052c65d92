// arturo-vm - Bytecode translator and virtual machine for the Arturo programming language
// Copyright (c) 2026 The Arturo Project Contributors. MIT licensed.

//! The conversion builtins: `to` drives the conversion matrix, `as` exposes
//! formatting shortcuts through attributes.

use arturo_core::{Error, Result};
use arturo_parser::{ArturoVal, KindSet, TypeVal, ValueKind};

use crate::builtins::{any, builtin, Attrs, Registry};
use crate::conversion;
use crate::opcode::OpCode;
use crate::vm::Vm;

fn builtin_to(vm: &mut Vm, args: &[ArturoVal], attrs: &Attrs) -> Result<()> {
    let ArturoVal::Type(target) = &args[0] else {
        return Err(Error::type_mismatch(
            "to",
            "type",
            ":type",
            args[0].type_name(),
        ));
    };
    let converted = conversion::convert(vm, &args[1], target, attrs)?;
    vm.stack.push(converted)
}

/// Base-formatting shortcuts: `.binary`, `.octal` and `.hex` render an
/// integer in the corresponding base; without an attribute the value passes
/// through unchanged.
fn builtin_as(vm: &mut Vm, args: &[ArturoVal], attrs: &Attrs) -> Result<()> {
    let truthy = |name: &str| attrs.get(name).map(|v| v.is_truthy()).unwrap_or(false);
    let base = if truthy("binary") {
        Some(2)
    } else if truthy("octal") {
        Some(8)
    } else if truthy("hex") {
        Some(16)
    } else {
        None
    };

    let result = match base {
        Some(base) => {
            let value = args[0].exact_i64().ok_or_else(|| {
                Error::type_mismatch("as", "value", ":integer", args[0].type_name())
            })?;
            let rendered = match base {
                2 => format!("{:b}", value),
                8 => format!("{:o}", value),
                _ => format!("{:x}", value),
            };
            ArturoVal::string(rendered)
        }
        None => args[0].clone(),
    };
    vm.stack.push(result)
}

pub(crate) fn register(reg: &mut Registry) {
    reg.add(builtin(
        "to",
        "convert a value to the given type",
        &[("type", KindSet::only(ValueKind::Type)), ("value", any())],
        &[("format", KindSet::only(ValueKind::String), "format string for date parsing and rendering")],
        any(),
        "to :integer \"2020\"",
        Some(OpCode::To),
        builtin_to,
    ));
    reg.add(builtin(
        "as",
        "format a value; the base attributes render integers as strings",
        &[("value", any())],
        &[
            ("binary", KindSet::only(ValueKind::Logical), "render in base 2"),
            ("octal", KindSet::only(ValueKind::Logical), "render in base 8"),
            ("hex", KindSet::only(ValueKind::Logical), "render in base 16"),
        ],
        any(),
        "as.binary 11",
        None,
        builtin_as,
    ));
}

/// Shared entry for the dedicated `toS`/`toI` fast-path opcodes. On failure
/// the operand goes back, leaving the stack at its prior depth.
pub(crate) fn convert_shorthand(vm: &mut Vm, target: ValueKind) -> Result<()> {
    let value = vm.stack.pop()?;
    match conversion::convert(vm, &value, &TypeVal::Builtin(target), &Attrs::new()) {
        Ok(converted) => vm.stack.push(converted),
        Err(e) => {
            vm.stack.push(value)?;
            Err(e)
        }
    }
}
