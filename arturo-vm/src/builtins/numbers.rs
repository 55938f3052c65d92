// arturo-vm - Bytecode translator and virtual machine for the Arturo programming language
// Copyright (c) 2026 The Arturo Project Contributors. MIT licensed.

//! Numeric helpers, predicates, bitwise operations and randomness.
//!
//! Randomness uses a per-VM xorshift generator, seeded at startup and
//! reseedable by the host, which keeps runs reproducible under a fixed
//! seed.

use arturo_core::{Error, Result};
use arturo_parser::{ArturoVal, KindSet, ValueKind};

use crate::builtins::arithmetic::num_abs;
use crate::builtins::{builtin, integer, logical, numeric, Attrs, Registry};
use crate::opcode::OpCode;
use crate::vm::Vm;

fn builtin_abs(vm: &mut Vm, args: &[ArturoVal], _attrs: &Attrs) -> Result<()> {
    vm.stack.push(num_abs(&args[0])?)
}

fn rounding(
    name: &'static str,
    v: &ArturoVal,
    f: fn(f64) -> f64,
) -> Result<ArturoVal> {
    match v {
        ArturoVal::Integer(_) | ArturoVal::BigInteger(_) => Ok(v.clone()),
        other => {
            let x = other.as_f64().ok_or_else(|| {
                Error::type_mismatch(name, "value", ":integer :floating :rational", other.type_name())
            })?;
            Ok(ArturoVal::Integer(f(x) as i64))
        }
    }
}

fn builtin_floor(vm: &mut Vm, args: &[ArturoVal], _attrs: &Attrs) -> Result<()> {
    vm.stack.push(rounding("floor", &args[0], f64::floor)?)
}

fn builtin_ceil(vm: &mut Vm, args: &[ArturoVal], _attrs: &Attrs) -> Result<()> {
    vm.stack.push(rounding("ceil", &args[0], f64::ceil)?)
}

fn builtin_round(vm: &mut Vm, args: &[ArturoVal], _attrs: &Attrs) -> Result<()> {
    vm.stack.push(rounding("round", &args[0], f64::round)?)
}

fn builtin_sqrt(vm: &mut Vm, args: &[ArturoVal], _attrs: &Attrs) -> Result<()> {
    let x = args[0].as_f64().ok_or_else(|| {
        Error::type_mismatch("sqrt", "value", ":integer :floating :rational", args[0].type_name())
    })?;
    vm.stack.push(ArturoVal::Floating(x.sqrt()))
}

fn parity(name: &'static str, v: &ArturoVal) -> Result<bool> {
    match v.exact_i64() {
        Some(i) => Ok(i % 2 == 0),
        None => Err(Error::type_mismatch(
            name,
            "value",
            ":integer",
            v.type_name(),
        )),
    }
}

fn builtin_even(vm: &mut Vm, args: &[ArturoVal], _attrs: &Attrs) -> Result<()> {
    let even = parity("even?", &args[0])?;
    vm.stack.push(ArturoVal::Logical(even))
}

fn builtin_odd(vm: &mut Vm, args: &[ArturoVal], _attrs: &Attrs) -> Result<()> {
    let even = parity("odd?", &args[0])?;
    vm.stack.push(ArturoVal::Logical(!even))
}

/// Random integer in the inclusive range between the two arguments.
fn builtin_random(vm: &mut Vm, args: &[ArturoVal], _attrs: &Attrs) -> Result<()> {
    let lo = args[0]
        .exact_i64()
        .ok_or_else(|| Error::type_mismatch("random", "from", ":integer", args[0].type_name()))?;
    let hi = args[1]
        .exact_i64()
        .ok_or_else(|| Error::type_mismatch("random", "to", ":integer", args[1].type_name()))?;
    let (lo, hi) = if lo <= hi { (lo, hi) } else { (hi, lo) };
    let span = (hi - lo) as u64 + 1;
    let value = lo + (vm.next_random() % span) as i64;
    vm.stack.push(ArturoVal::Integer(value))
}

// ============================================================================
// Bitwise
// ============================================================================

fn want_int(name: &'static str, v: &ArturoVal) -> Result<i64> {
    v.exact_i64()
        .ok_or_else(|| Error::type_mismatch(name, "value", ":integer", v.type_name()))
}

fn builtin_bnot(vm: &mut Vm, args: &[ArturoVal], _attrs: &Attrs) -> Result<()> {
    let x = want_int("bnot", &args[0])?;
    vm.stack.push(ArturoVal::Integer(!x))
}

fn builtin_band(vm: &mut Vm, args: &[ArturoVal], _attrs: &Attrs) -> Result<()> {
    let a = want_int("band", &args[0])?;
    let b = want_int("band", &args[1])?;
    vm.stack.push(ArturoVal::Integer(a & b))
}

fn builtin_bor(vm: &mut Vm, args: &[ArturoVal], _attrs: &Attrs) -> Result<()> {
    let a = want_int("bor", &args[0])?;
    let b = want_int("bor", &args[1])?;
    vm.stack.push(ArturoVal::Integer(a | b))
}

fn builtin_shl(vm: &mut Vm, args: &[ArturoVal], _attrs: &Attrs) -> Result<()> {
    let a = want_int("shl", &args[0])?;
    let b = want_int("shl", &args[1])?;
    vm.stack
        .push(ArturoVal::Integer(a.checked_shl(b as u32).unwrap_or(0)))
}

fn builtin_shr(vm: &mut Vm, args: &[ArturoVal], _attrs: &Attrs) -> Result<()> {
    let a = want_int("shr", &args[0])?;
    let b = want_int("shr", &args[1])?;
    vm.stack
        .push(ArturoVal::Integer(a.checked_shr(b as u32).unwrap_or(0)))
}

pub(crate) fn register(reg: &mut Registry) {
    reg.add(builtin(
        "abs",
        "the absolute value of a number",
        &[("value", numeric())],
        &[],
        numeric(),
        "abs neg 5",
        None,
        builtin_abs,
    ));
    reg.add(builtin(
        "floor",
        "the largest integer not above the value",
        &[("value", numeric())],
        &[],
        integer(),
        "floor 2.7",
        None,
        builtin_floor,
    ));
    reg.add(builtin(
        "ceil",
        "the smallest integer not below the value",
        &[("value", numeric())],
        &[],
        integer(),
        "ceil 2.1",
        None,
        builtin_ceil,
    ));
    reg.add(builtin(
        "round",
        "the value rounded to the nearest integer",
        &[("value", numeric())],
        &[],
        integer(),
        "round 2.5",
        None,
        builtin_round,
    ));
    reg.add(builtin(
        "sqrt",
        "the square root of a number",
        &[("value", numeric())],
        &[],
        KindSet::only(ValueKind::Floating),
        "sqrt 9",
        None,
        builtin_sqrt,
    ));
    reg.add(builtin(
        "even?",
        "whether an integer is even",
        &[("value", integer())],
        &[],
        logical(),
        "even? 4",
        None,
        builtin_even,
    ));
    reg.add(builtin(
        "odd?",
        "whether an integer is odd",
        &[("value", integer())],
        &[],
        logical(),
        "odd? 3",
        None,
        builtin_odd,
    ));
    reg.add(builtin(
        "random",
        "a random integer between the two bounds, inclusive",
        &[("from", integer()), ("to", integer())],
        &[],
        integer(),
        "random 1 6",
        None,
        builtin_random,
    ));
    reg.add(builtin(
        "bnot",
        "bitwise complement of an integer",
        &[("value", integer())],
        &[],
        integer(),
        "bnot 0",
        Some(OpCode::Bnot),
        builtin_bnot,
    ));
    reg.add(builtin(
        "band",
        "bitwise and of two integers",
        &[("value", integer()), ("mask", integer())],
        &[],
        integer(),
        "band 12 10",
        Some(OpCode::Band),
        builtin_band,
    ));
    reg.add(builtin(
        "bor",
        "bitwise or of two integers",
        &[("value", integer()), ("mask", integer())],
        &[],
        integer(),
        "bor 12 10",
        Some(OpCode::Bor),
        builtin_bor,
    ));
    reg.add(builtin(
        "shl",
        "an integer shifted left",
        &[("value", integer()), ("by", integer())],
        &[],
        integer(),
        "shl 1 4",
        Some(OpCode::Shl),
        builtin_shl,
    ));
    reg.add(builtin(
        "shr",
        "an integer shifted right",
        &[("value", integer()), ("by", integer())],
        &[],
        integer(),
        "shr 16 4",
        Some(OpCode::Shr),
        builtin_shr,
    ));
}
