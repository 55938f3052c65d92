// arturo-vm - Bytecode translator and virtual machine for the Arturo programming language
// Copyright (c) 2026 The Arturo Project Contributors. MIT licensed.

//! # arturo-vm
//!
//! The execution engine of Arturo: opcodes, the translator that turns block
//! values into `Translation`s, the stack-based virtual machine, the builtin
//! registry and the conversion engine.
//!
//! ```
//! use arturo_vm::Vm;
//!
//! let mut vm = Vm::new();
//! vm.run_source("x: 40 + 2").unwrap();
//! assert_eq!(vm.syms.get("x"), Some(&arturo_parser::ArturoVal::Integer(42)));
//! ```

pub mod builtins;
pub mod conversion;
pub mod opcode;
pub mod translation;
pub mod translator;
pub mod vm;

pub use builtins::{Attrs, Builtin, Registry};
pub use opcode::OpCode;
pub use translation::{disassemble, translation_from_dict, translation_to_dict, Emitter};
pub use translator::{translate, translate_dictionary, ArityLookup, FnHint};
pub use vm::{ExecState, Vm};
