// arturo-vm - Bytecode translator and virtual machine for the Arturo programming language
// Copyright (c) 2026 The Arturo Project Contributors. MIT licensed.

//! The translator: block values in, `Translation`s out.
//!
//! Runs in two passes. The analysis pass folds the flat block into an
//! arity-driven expression tree; the emission pass writes bytecode from the
//! tree, interning constants and compiling literal-block control flow into
//! jumps.

pub mod ast;
pub mod codegen;

use arturo_core::Result;
use arturo_parser::{ArturoBlock, Translation};

pub use ast::{count_params, ArityLookup, AstBuilder, FnHint};
pub use codegen::Codegen;

/// Translate a block into bytecode.
pub fn translate(block: &ArturoBlock, lookup: &dyn ArityLookup) -> Result<Translation> {
    let nodes = AstBuilder::build(block, lookup)?;
    Codegen::new().generate(&nodes)
}

/// Translate a block destined for dictionary execution: stores record their
/// keys with `Dkey` markers so the collected dictionary keeps source order.
pub fn translate_dictionary(
    block: &ArturoBlock,
    lookup: &dyn ArityLookup,
) -> Result<Translation> {
    let nodes = AstBuilder::build(block, lookup)?;
    Codegen::new_dictionary().generate(&nodes)
}
