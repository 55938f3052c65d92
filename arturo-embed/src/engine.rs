// arturo-embed - Engine implementation
// Copyright (c) 2026 The Arturo Project Contributors. MIT licensed.

//! The `Engine` struct: the high-level entry point for embedding Arturo.

use std::cell::RefCell;
use std::rc::Rc;

use arturo_core::{Error, Result};
use arturo_parser::ArturoVal;
use arturo_vm::Vm;

use crate::convert::IntoArturoVal;

/// The Arturo scripting engine.
///
/// Wraps a parser/translator/VM pipeline behind one call. Evaluation state
/// (symbols, user types, memoized results) persists across `eval` calls.
///
/// `Engine` is not thread-safe: the VM uses `Rc` and `RefCell` internally.
/// Use one engine per thread.
///
/// # Example
///
/// ```
/// use arturo_embed::Engine;
///
/// let mut engine = Engine::new();
/// let result = engine.eval("add 1 2").unwrap();
/// assert_eq!(result.to_string(), "3");
/// ```
pub struct Engine {
    vm: Vm,
}

impl Engine {
    /// Create an engine with the standard builtins registered.
    pub fn new() -> Engine {
        Engine { vm: Vm::new() }
    }

    /// Evaluate a string of Arturo code, returning the value left on top of
    /// the evaluation stack, or `null` when the code leaves nothing.
    pub fn eval(&mut self, code: &str) -> Result<ArturoVal> {
        let depth = self.vm.stack.len();
        self.vm.run_source(code)?;
        let result = if self.vm.stack.len() > depth {
            self.vm.stack.pop()?
        } else {
            ArturoVal::Null
        };
        self.vm.stack.truncate(depth);
        Ok(result)
    }

    /// Evaluate a source file.
    pub fn eval_file(&mut self, path: &std::path::Path) -> Result<ArturoVal> {
        let source = std::fs::read_to_string(path).map_err(|e| {
            Error::internal(format!("Cannot read '{}': {}", path.display(), e))
        })?;
        self.eval(&source)
    }

    /// Bind a global symbol to a Rust value.
    ///
    /// ```
    /// use arturo_embed::Engine;
    ///
    /// let mut engine = Engine::new();
    /// engine.set("answer", 42i64);
    /// assert_eq!(engine.eval("answer + 1").unwrap().to_string(), "43");
    /// ```
    pub fn set(&mut self, name: &str, value: impl IntoArturoVal) {
        self.vm.syms.set_global(name, value.into_arturo());
    }

    /// Read a global symbol.
    pub fn get(&self, name: &str) -> Option<ArturoVal> {
        self.vm.syms.get(name).cloned()
    }

    /// Capture printed output into a buffer instead of stdout.
    pub fn capture_output(&mut self) -> Rc<RefCell<String>> {
        self.vm.capture_output()
    }

    /// Reseed the VM's random generator for reproducible runs.
    pub fn seed_random(&mut self, seed: u64) {
        self.vm.seed_random(seed);
    }

    /// Direct access to the underlying VM.
    pub fn vm(&mut self) -> &mut Vm {
        &mut self.vm
    }
}

impl Default for Engine {
    fn default() -> Self {
        Self::new()
    }
}
