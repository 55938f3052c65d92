// arturo-vm - Bytecode translator and virtual machine for the Arturo programming language
// Copyright (c) 2026 The Arturo Project Contributors. MIT licensed.

//! Iteration builtins: `loop`, `map`, `select`.
//!
//! All three share one driver: bind the iteration variables, execute the
//! body, then watch the VM state. `Breaking` and `Continuing` are absorbed
//! here; `AwaitingReturn` passes through to the enclosing function.

use arturo_core::{Error, Result};
use arturo_parser::{ArturoVal, KindSet, ValueKind};

use crate::builtins::{builtin, Attrs, Registry};
use crate::opcode::OpCode;
use crate::vm::frame::ExecState;
use crate::vm::Vm;

enum Mode {
    Discard,
    Collect,
    Filter,
}

fn iterable_kinds() -> KindSet {
    KindSet::of(&[
        ValueKind::Block,
        ValueKind::Inline,
        ValueKind::Range,
        ValueKind::String,
        ValueKind::Dictionary,
        ValueKind::Integer,
    ])
}

fn params_kinds() -> KindSet {
    KindSet::of(&[
        ValueKind::Literal,
        ValueKind::Word,
        ValueKind::Block,
        ValueKind::Null,
    ])
}

/// The values an iteration walks over, flattened. Dictionaries yield
/// key/value pairs, an integer n yields 1 through n.
fn items_of(collection: &ArturoVal) -> Result<Box<dyn Iterator<Item = ArturoVal>>> {
    match collection {
        ArturoVal::Block(b) | ArturoVal::Inline(b) => Ok(Box::new(b.to_vec().into_iter())),
        ArturoVal::Range(r) => {
            if r.step == 0 {
                return Err(Error::range_zero_step());
            }
            Ok(Box::new(r.iter()))
        }
        ArturoVal::String(s) => {
            let chars: Vec<ArturoVal> = s.chars().map(ArturoVal::Char).collect();
            Ok(Box::new(chars.into_iter()))
        }
        ArturoVal::Dictionary(d) => {
            let pairs: Vec<ArturoVal> = d
                .borrow()
                .iter()
                .flat_map(|(k, v)| [ArturoVal::string(k), v.clone()])
                .collect();
            Ok(Box::new(pairs.into_iter()))
        }
        ArturoVal::Integer(n) => {
            let n = *n;
            Ok(Box::new((1..=n).map(ArturoVal::Integer)))
        }
        other => Err(Error::type_mismatch(
            "loop",
            "collection",
            ":block :range :string :dictionary",
            other.type_name(),
        )),
    }
}

/// Names bound on each round.
fn binding_names(params: &ArturoVal) -> Vec<String> {
    match params {
        ArturoVal::Word(n) | ArturoVal::Literal(n) => vec![n.to_string()],
        ArturoVal::Block(b) => b
            .items()
            .iter()
            .filter_map(|item| match item {
                ArturoVal::Word(n) | ArturoVal::Literal(n) => Some(n.to_string()),
                _ => None,
            })
            .collect(),
        _ => Vec::new(),
    }
}

fn iterate(vm: &mut Vm, args: &[ArturoVal], mode: Mode) -> Result<()> {
    let names = binding_names(&args[1]);
    let chunk = names.len().max(1);
    let body = &args[2];

    let name_refs: Vec<&str> = names.iter().map(|n| n.as_str()).collect();
    let saved = vm.syms.save_bindings(&name_refs);

    let result = drive(vm, &args[0], &names, chunk, body, mode);

    vm.syms.restore_bindings(saved);
    result
}

fn drive(
    vm: &mut Vm,
    collection: &ArturoVal,
    names: &[String],
    chunk: usize,
    body: &ArturoVal,
    mode: Mode,
) -> Result<()> {
    let mut items = items_of(collection)?;
    let mut produced: Vec<ArturoVal> = Vec::new();

    'rounds: loop {
        if vm.stop_was_requested() {
            break;
        }
        let mut bound: Vec<ArturoVal> = Vec::with_capacity(chunk);
        for _ in 0..chunk {
            match items.next() {
                Some(item) => bound.push(item),
                None => break,
            }
        }
        if bound.is_empty() {
            break;
        }
        for (i, name) in names.iter().enumerate() {
            let value = bound.get(i).cloned().unwrap_or(ArturoVal::Null);
            vm.syms.set(name, value);
        }

        let depth = vm.stack.len();
        vm.exec_block_value(body)?;
        let top = if vm.stack.len() > depth {
            Some(vm.stack.pop()?)
        } else {
            None
        };
        vm.stack.truncate(depth);

        match vm.state {
            ExecState::Breaking => {
                vm.state = ExecState::Running;
                break 'rounds;
            }
            ExecState::Continuing => {
                vm.state = ExecState::Running;
                continue 'rounds;
            }
            ExecState::AwaitingReturn => break 'rounds,
            ExecState::Running => {}
        }

        match mode {
            Mode::Discard => {}
            Mode::Collect => produced.push(top.unwrap_or(ArturoVal::Null)),
            Mode::Filter => {
                if top.map(|v| v.is_truthy()).unwrap_or(false) {
                    produced.extend(bound.iter().cloned());
                }
            }
        }
    }

    match mode {
        Mode::Discard => Ok(()),
        Mode::Collect | Mode::Filter => vm.stack.push(ArturoVal::block(produced)),
    }
}

fn builtin_loop(vm: &mut Vm, args: &[ArturoVal], _attrs: &Attrs) -> Result<()> {
    iterate(vm, args, Mode::Discard)
}

fn builtin_map(vm: &mut Vm, args: &[ArturoVal], _attrs: &Attrs) -> Result<()> {
    iterate(vm, args, Mode::Collect)
}

fn builtin_select(vm: &mut Vm, args: &[ArturoVal], _attrs: &Attrs) -> Result<()> {
    iterate(vm, args, Mode::Filter)
}

pub(crate) fn register(reg: &mut Registry) {
    reg.add(builtin(
        "loop",
        "execute the body once per element, binding the iteration variables",
        &[
            ("collection", iterable_kinds()),
            ("params", params_kinds()),
            ("body", KindSet::only(ValueKind::Block)),
        ],
        &[],
        KindSet::NONE,
        "loop 1..3 'x [print x]",
        Some(OpCode::Loop),
        builtin_loop,
    ));
    reg.add(builtin(
        "map",
        "collect the body's result for every element into a new block",
        &[
            ("collection", iterable_kinds()),
            ("params", params_kinds()),
            ("body", KindSet::only(ValueKind::Block)),
        ],
        &[],
        KindSet::only(ValueKind::Block),
        "map 1..3 'x [x * 2]",
        Some(OpCode::Map),
        builtin_map,
    ));
    reg.add(builtin(
        "select",
        "keep the elements for which the body yields truth",
        &[
            ("collection", iterable_kinds()),
            ("params", params_kinds()),
            ("body", KindSet::only(ValueKind::Block)),
        ],
        &[],
        KindSet::only(ValueKind::Block),
        "select 1..10 'x [even? x]",
        Some(OpCode::Select),
        builtin_select,
    ));
}
