// arturo-core - Builtin declarations
// Copyright (c) 2026 The Arturo Project Contributors. MIT licensed.

//! Declarations for native operations.
//!
//! Every builtin registers with a declaration: positional parameters with
//! their accepted kind sets, an attribute schema, return kinds and an
//! example snippet. The VM checks arguments against the declaration before
//! the native routine runs.

use arturo_parser::{ArturoVal, KindSet};

use crate::error::{Error, Result};

/// A positional parameter of a builtin.
#[derive(Debug, Clone)]
pub struct ParamSpec {
    pub name: &'static str,
    pub kinds: KindSet,
}

/// An attribute accepted by a builtin.
#[derive(Debug, Clone)]
pub struct AttrSpec {
    pub name: &'static str,
    pub kinds: KindSet,
    pub description: &'static str,
}

/// The full declaration of a builtin.
#[derive(Debug, Clone)]
pub struct BuiltinDecl {
    pub name: &'static str,
    pub description: &'static str,
    pub params: Vec<ParamSpec>,
    pub attrs: Vec<AttrSpec>,
    pub returns: KindSet,
    pub example: &'static str,
}

impl BuiltinDecl {
    pub fn arity(&self) -> usize {
        self.params.len()
    }

    /// Validate popped arguments against the declared kind sets.
    pub fn check_args(&self, args: &[ArturoVal]) -> Result<()> {
        for (param, arg) in self.params.iter().zip(args.iter()) {
            if !param.kinds.contains(arg.kind()) {
                return Err(Error::type_mismatch(
                    self.name,
                    param.name,
                    param.kinds.describe(),
                    arg.type_name(),
                ));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use arturo_parser::ValueKind;

    #[test]
    fn test_check_args() {
        let decl = BuiltinDecl {
            name: "size",
            description: "get the size of a collection",
            params: vec![ParamSpec {
                name: "collection",
                kinds: KindSet::of(&[ValueKind::Block, ValueKind::String]),
            }],
            attrs: vec![],
            returns: KindSet::only(ValueKind::Integer),
            example: "size [1 2 3]",
        };
        assert!(decl.check_args(&[ArturoVal::block(vec![])]).is_ok());
        assert!(decl.check_args(&[ArturoVal::Integer(1)]).is_err());
    }
}
