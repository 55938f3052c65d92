// arturo-core - Runtime infrastructure for the Arturo programming language
// Copyright (c) 2026 The Arturo Project Contributors. MIT licensed.

//! # arturo-core
//!
//! Shared runtime infrastructure for Arturo: the error taxonomy, the symbol
//! table and scoping discipline, user-type prototypes and builtin
//! declarations. The VM in `arturo-vm` builds on these.

pub mod builtin;
pub mod error;
pub mod paths;
pub mod prototype;
pub mod symtable;

pub use builtin::{AttrSpec, BuiltinDecl, ParamSpec};
pub use error::{Error, ErrorKind, Result};
pub use prototype::{bind_this, Prototype, TypeRegistry};
pub use symtable::{Scope, SymTable};
