// arturo-vm - Bytecode translator and virtual machine for the Arturo programming language
// Copyright (c) 2026 The Arturo Project Contributors. MIT licensed.

//! Built-in native operations and their registry.
//!
//! The registry is an insertion-ordered map built once at VM startup and
//! immutable afterwards. Every entry carries its declaration (parameters,
//! attribute schema, return kinds, example) plus the native routine; entries
//! with a dedicated opcode are additionally reachable through the opcode
//! fast path.

pub mod arithmetic;
pub mod collections;
pub mod comparison;
pub mod controlflow;
pub mod converting;
pub mod dates;
pub mod io;
pub mod iterators;
pub mod logic;
pub mod numbers;
pub mod strings;
pub mod types;

use std::rc::Rc;

use arturo_core::{BuiltinDecl, ParamSpec, Result};
use arturo_core::builtin::AttrSpec;
use arturo_parser::{ArturoVal, IndexMap, KindSet, ValueKind};

use crate::opcode::OpCode;
use crate::vm::Vm;

/// The attribute table handed to a native call.
pub type Attrs = IndexMap<String, ArturoVal>;

/// A native operation. Arguments arrive popped and type-checked; the
/// routine pushes its result, if it has one.
pub type NativeFn = fn(&mut Vm, &[ArturoVal], &Attrs) -> Result<()>;

/// A registered builtin.
#[derive(Debug)]
pub struct Builtin {
    pub decl: BuiltinDecl,
    pub op: Option<OpCode>,
    pub func: NativeFn,
}

/// The immutable builtin registry.
#[derive(Debug)]
pub struct Registry {
    entries: IndexMap<&'static str, Builtin>,
    op_table: [Option<u16>; 256],
}

impl Registry {
    /// Build the standard registry: every core module registers its
    /// builtins, in a stable order.
    pub fn standard() -> Rc<Registry> {
        let mut reg = Registry {
            entries: IndexMap::new(),
            op_table: [None; 256],
        };
        arithmetic::register(&mut reg);
        numbers::register(&mut reg);
        comparison::register(&mut reg);
        logic::register(&mut reg);
        controlflow::register(&mut reg);
        iterators::register(&mut reg);
        collections::register(&mut reg);
        strings::register(&mut reg);
        converting::register(&mut reg);
        types::register(&mut reg);
        io::register(&mut reg);
        dates::register(&mut reg);
        Rc::new(reg)
    }

    pub(crate) fn add(&mut self, builtin: Builtin) {
        debug_assert!(
            !self.entries.contains_key(builtin.decl.name),
            "duplicate builtin: {}",
            builtin.decl.name
        );
        let index = self.entries.len() as u16;
        if let Some(op) = builtin.op {
            self.op_table[op as u8 as usize] = Some(index);
        }
        self.entries.insert(builtin.decl.name, builtin);
    }

    pub fn get(&self, name: &str) -> Option<&Builtin> {
        self.entries.get(name)
    }

    pub fn by_op(&self, op: OpCode) -> Option<&Builtin> {
        let index = self.op_table[op as u8 as usize]?;
        self.entries
            .get_index(index as usize)
            .map(|(_, builtin)| builtin)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&'static str, &Builtin)> {
        self.entries.iter().map(|(name, builtin)| (*name, builtin))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Declaration-plus-routine constructor used by the registering modules.
#[allow(clippy::too_many_arguments)]
pub(crate) fn builtin(
    name: &'static str,
    description: &'static str,
    params: &[(&'static str, KindSet)],
    attrs: &[(&'static str, KindSet, &'static str)],
    returns: KindSet,
    example: &'static str,
    op: Option<OpCode>,
    func: NativeFn,
) -> Builtin {
    Builtin {
        decl: BuiltinDecl {
            name,
            description,
            params: params
                .iter()
                .map(|(pname, kinds)| ParamSpec {
                    name: pname,
                    kinds: *kinds,
                })
                .collect(),
            attrs: attrs
                .iter()
                .map(|(aname, kinds, adesc)| AttrSpec {
                    name: aname,
                    kinds: *kinds,
                    description: adesc,
                })
                .collect(),
            returns,
            example,
        },
        op,
        func,
    }
}

// ============================================================================
// Shared kind sets
// ============================================================================

pub(crate) fn any() -> KindSet {
    KindSet::ANY
}

pub(crate) fn numeric() -> KindSet {
    KindSet::of(&[
        ValueKind::Integer,
        ValueKind::Floating,
        ValueKind::Rational,
        ValueKind::Complex,
    ])
}

pub(crate) fn textual() -> KindSet {
    KindSet::of(&[
        ValueKind::String,
        ValueKind::Word,
        ValueKind::Literal,
        ValueKind::Char,
    ])
}

pub(crate) fn blockish() -> KindSet {
    KindSet::of(&[ValueKind::Block, ValueKind::Inline])
}

pub(crate) fn logical() -> KindSet {
    KindSet::only(ValueKind::Logical)
}

pub(crate) fn integer() -> KindSet {
    KindSet::only(ValueKind::Integer)
}

pub(crate) fn string() -> KindSet {
    KindSet::only(ValueKind::String)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_registry_is_populated() {
        let reg = Registry::standard();
        assert!(reg.len() > 60);
        assert!(reg.get("add").is_some());
        assert!(reg.get("print").is_some());
        assert!(reg.get("no-such-builtin").is_none());
    }

    #[test]
    fn test_op_fast_path() {
        let reg = Registry::standard();
        let add = reg.by_op(OpCode::Add).unwrap();
        assert_eq!(add.decl.name, "add");
        let lp = reg.by_op(OpCode::Loop).unwrap();
        assert_eq!(lp.decl.name, "loop");
        assert!(reg.by_op(OpCode::Nop).is_none());
    }

    #[test]
    fn test_declarations_carry_examples() {
        let reg = Registry::standard();
        for (name, builtin) in reg.iter() {
            assert!(
                !builtin.decl.example.is_empty(),
                "builtin '{}' lacks an example",
                name
            );
        }
    }
}
