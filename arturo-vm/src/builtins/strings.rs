// arturo-vm - Bytecode translator and virtual machine for the Arturo programming language
// Copyright (c) 2026 The Arturo Project Contributors. MIT licensed.

//! String operations.

use arturo_core::{Error, Result};
use arturo_parser::{ArturoVal, KindSet, ValueKind};

use crate::builtins::{builtin, string, Attrs, Registry};
use crate::vm::Vm;

fn want_text(name: &'static str, v: &ArturoVal) -> Result<String> {
    match v {
        ArturoVal::String(s) => Ok(s.to_string()),
        ArturoVal::Char(c) => Ok(c.to_string()),
        other => Err(Error::type_mismatch(
            name,
            "value",
            ":string :char",
            other.type_name(),
        )),
    }
}

fn builtin_upper(vm: &mut Vm, args: &[ArturoVal], _attrs: &Attrs) -> Result<()> {
    match &args[0] {
        ArturoVal::Char(c) => {
            let mut upper = c.to_uppercase();
            let first = upper.next().unwrap_or(*c);
            vm.stack.push(ArturoVal::Char(first))
        }
        other => {
            let text = want_text("upper", other)?;
            vm.stack.push(ArturoVal::string(text.to_uppercase()))
        }
    }
}

fn builtin_lower(vm: &mut Vm, args: &[ArturoVal], _attrs: &Attrs) -> Result<()> {
    match &args[0] {
        ArturoVal::Char(c) => {
            let mut lower = c.to_lowercase();
            let first = lower.next().unwrap_or(*c);
            vm.stack.push(ArturoVal::Char(first))
        }
        other => {
            let text = want_text("lower", other)?;
            vm.stack.push(ArturoVal::string(text.to_lowercase()))
        }
    }
}

fn builtin_capitalize(vm: &mut Vm, args: &[ArturoVal], _attrs: &Attrs) -> Result<()> {
    let text = want_text("capitalize", &args[0])?;
    let mut chars = text.chars();
    let result = match chars.next() {
        Some(first) => first.to_uppercase().collect::<String>() + chars.as_str(),
        None => String::new(),
    };
    vm.stack.push(ArturoVal::string(result))
}

fn builtin_trim(vm: &mut Vm, args: &[ArturoVal], _attrs: &Attrs) -> Result<()> {
    let text = want_text("trim", &args[0])?;
    vm.stack.push(ArturoVal::string(text.trim()))
}

/// All regex matches inside a string, as a block of strings.
fn builtin_match(vm: &mut Vm, args: &[ArturoVal], _attrs: &Attrs) -> Result<()> {
    let text = want_text("match", &args[0])?;
    let ArturoVal::Regex(re) = &args[1] else {
        return Err(Error::type_mismatch(
            "match",
            "pattern",
            ":regex",
            args[1].type_name(),
        ));
    };
    let matches: Vec<ArturoVal> = re
        .compiled
        .find_iter(&text)
        .map(|m| ArturoVal::string(m.as_str()))
        .collect();
    vm.stack.push(ArturoVal::block(matches))
}

fn builtin_match_p(vm: &mut Vm, args: &[ArturoVal], _attrs: &Attrs) -> Result<()> {
    let text = want_text("match?", &args[0])?;
    let ArturoVal::Regex(re) = &args[1] else {
        return Err(Error::type_mismatch(
            "match?",
            "pattern",
            ":regex",
            args[1].type_name(),
        ));
    };
    vm.stack
        .push(ArturoVal::Logical(re.compiled.is_match(&text)))
}

pub(crate) fn register(reg: &mut Registry) {
    let stringy = KindSet::of(&[ValueKind::String, ValueKind::Char]);
    reg.add(builtin(
        "upper",
        "an uppercased copy of a string or char",
        &[("value", stringy)],
        &[],
        string(),
        "upper \"hello\"",
        None,
        builtin_upper,
    ));
    reg.add(builtin(
        "lower",
        "a lowercased copy of a string or char",
        &[("value", stringy)],
        &[],
        string(),
        "lower \"HELLO\"",
        None,
        builtin_lower,
    ));
    reg.add(builtin(
        "capitalize",
        "a copy of the string with its first letter uppercased",
        &[("value", stringy)],
        &[],
        string(),
        "capitalize \"hello\"",
        None,
        builtin_capitalize,
    ));
    reg.add(builtin(
        "trim",
        "a copy of the string without surrounding whitespace",
        &[("value", stringy)],
        &[],
        string(),
        "trim \"  hi  \"",
        None,
        builtin_trim,
    ));
    reg.add(builtin(
        "match",
        "all regex matches inside a string, as a block",
        &[("value", stringy), ("pattern", KindSet::only(ValueKind::Regex))],
        &[],
        KindSet::only(ValueKind::Block),
        "match \"hello world\" {/l+/}",
        None,
        builtin_match,
    ));
    reg.add(builtin(
        "match?",
        "whether the regex matches anywhere in the string",
        &[("value", stringy), ("pattern", KindSet::only(ValueKind::Regex))],
        &[],
        KindSet::only(ValueKind::Logical),
        "match? \"hello\" {/^h/}",
        None,
        builtin_match_p,
    ));
}
