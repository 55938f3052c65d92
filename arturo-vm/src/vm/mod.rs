// arturo-vm - Bytecode translator and virtual machine for the Arturo programming language
// Copyright (c) 2026 The Arturo Project Contributors. MIT licensed.

//! The stack-based virtual machine.
//!
//! A `Vm` owns all interpreter state: the evaluation stack, the symbol
//! table, the attribute table for the pending call, the type registry, the
//! memoization cache and the execution state machine. The builtin registry
//! is built once at startup and shared immutably.
//!
//! `return`, `break` and `continue` are never host exceptions: they flip
//! `ExecState`, the dispatch loop stops, and the nearest function call or
//! iteration builtin absorbs the state.

pub mod frame;
pub mod stack;

use std::cell::Cell;
use std::cmp::Ordering;
use std::collections::HashMap;
use std::rc::Rc;
use std::time::{SystemTime, UNIX_EPOCH};

use arturo_core::{Error, Result, Scope, SymTable, TypeRegistry};
use arturo_parser::{
    ArturoBlock, ArturoVal, BuiltinRef, FunctionVal, IndexMap, Parser, Translation, ValueKind,
};

use crate::builtins::{converting, Attrs, Builtin, Registry};
use crate::opcode::{OpCode, CALL_BASE, LOAD_BASE, PUSH_BASE, STORE_BASE};
use crate::translation::read_u16;
use crate::translator::{self, ArityLookup, FnHint};

pub use frame::{ExecState, Frame, MAX_FRAMES};
pub use stack::{ValueStack, MAX_STACK};

/// Where printed output goes.
#[derive(Debug)]
enum OutputSink {
    Stdout,
    Buffer(Rc<std::cell::RefCell<String>>),
}

/// The Arturo virtual machine.
#[derive(Debug)]
pub struct Vm {
    /// The evaluation stack.
    pub stack: ValueStack,
    /// The symbol table: globals plus one scope per user-function frame.
    pub syms: SymTable,
    /// Owner of the user-defined type prototypes.
    pub types: TypeRegistry,
    registry: Rc<Registry>,
    /// Attribute table for the pending call.
    attrs: Attrs,
    /// Attribute tables of the user-function calls currently on the stack.
    fn_attrs: Vec<Attrs>,
    frames: Vec<Frame>,
    /// Execution state observed at the top of the dispatch loop.
    pub state: ExecState,
    current_line: u32,
    /// Key log appended by `Dkey`, consumed by dictionary execution.
    dict_keys: Vec<String>,
    /// Memoized call results, keyed by function identity and argument tuple.
    memo: HashMap<(usize, Vec<ArturoVal>), ArturoVal>,
    stop_requested: Cell<bool>,
    rng_state: Cell<u64>,
    output: OutputSink,
}

/// Name resolution for the translator: the live symbol table first, the
/// registry as fallback.
struct VmLookup<'a> {
    registry: &'a Registry,
    syms: &'a SymTable,
}

impl ArityLookup for VmLookup<'_> {
    fn hint(&self, name: &str) -> Option<FnHint> {
        if let Some(ArturoVal::Function(f)) = self.syms.get(name) {
            return Some(match &**f {
                FunctionVal::User(u) => FnHint {
                    arity: u.params.len(),
                    op: None,
                },
                FunctionVal::Builtin(b) => FnHint {
                    arity: b.arity,
                    op: b.op.and_then(OpCode::from_byte),
                },
            });
        }
        if self.syms.is_defined(name) {
            // A non-function value: the word is a plain load.
            return None;
        }
        self.registry.get(name).map(|b| FnHint {
            arity: b.decl.arity(),
            op: b.op,
        })
    }
}

impl Vm {
    /// Create a VM with the standard builtin registry. Every builtin is
    /// also bound as a global symbol, so functions are ordinary values.
    pub fn new() -> Vm {
        let registry = Registry::standard();
        let mut syms = SymTable::new();
        for (name, b) in registry.iter() {
            let fref = BuiltinRef {
                name: Rc::from(name),
                arity: b.decl.arity(),
                op: b.op.map(|o| o as u8),
            };
            syms.set_global(name, ArturoVal::Function(Rc::new(FunctionVal::Builtin(fref))));
        }
        let seed = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_nanos() as u64)
            .unwrap_or(0x5DEECE66D)
            | 1;
        Vm {
            stack: ValueStack::new(),
            syms,
            types: TypeRegistry::new(),
            registry,
            attrs: Attrs::new(),
            fn_attrs: Vec::new(),
            frames: Vec::new(),
            state: ExecState::Running,
            current_line: 0,
            dict_keys: Vec::new(),
            memo: HashMap::new(),
            stop_requested: Cell::new(false),
            rng_state: Cell::new(seed),
            output: OutputSink::Stdout,
        }
    }

    /// The shared builtin registry.
    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    // ========================================================================
    // Host controls
    // ========================================================================

    /// Redirect printed output into a buffer and return it.
    pub fn capture_output(&mut self) -> Rc<std::cell::RefCell<String>> {
        let buffer = Rc::new(std::cell::RefCell::new(String::new()));
        self.output = OutputSink::Buffer(buffer.clone());
        buffer
    }

    pub fn write_out(&mut self, text: &str) {
        match &self.output {
            OutputSink::Stdout => {
                use std::io::Write;
                let mut out = std::io::stdout();
                let _ = out.write_all(text.as_bytes());
                let _ = out.flush();
            }
            OutputSink::Buffer(buffer) => buffer.borrow_mut().push_str(text),
        }
    }

    pub fn write_line(&mut self, text: &str) {
        self.write_out(text);
        self.write_out("\n");
    }

    /// Ask the VM to stop; observed at the top of the dispatch loop, which
    /// then unwinds as if it had hit `end`.
    pub fn request_stop(&self) {
        self.stop_requested.set(true);
    }

    /// Whether a stop was requested. Iteration builtins check this between
    /// rounds so long-running loops unwind too.
    pub fn stop_was_requested(&self) -> bool {
        self.stop_requested.get()
    }

    /// Reseed the random generator, for reproducible runs.
    pub fn seed_random(&mut self, seed: u64) {
        self.rng_state.set(seed | 1);
    }

    /// Next value of the per-VM xorshift generator.
    pub fn next_random(&mut self) -> u64 {
        let mut x = self.rng_state.get();
        x ^= x << 13;
        x ^= x >> 7;
        x ^= x << 17;
        self.rng_state.set(x);
        x
    }

    /// The source line most recently recorded by an `eol` marker.
    pub fn line(&self) -> u32 {
        self.current_line
    }

    // ========================================================================
    // Entry points
    // ========================================================================

    /// Parse and run a source string against this VM.
    pub fn run_source(&mut self, source: &str) -> Result<()> {
        let block = Parser::parse_str(source)
            .map_err(|e| Error::parse(e.to_string()).with_line(e.line as u32))?;
        self.run_block(&block)
    }

    /// Translate (with caching) and run a block. The top level absorbs any
    /// leftover control-flow state, so a stray `break` cannot poison the
    /// next run.
    pub fn run_block(&mut self, block: &ArturoBlock) -> Result<()> {
        let t = self.translate_block_cached(block)?;
        let result = self.exec_translation(&t);
        self.state = ExecState::Running;
        result
    }

    /// Translate a block against the current symbols, caching the result on
    /// the block.
    pub fn translate_block_cached(&mut self, block: &ArturoBlock) -> Result<Rc<Translation>> {
        if let Some(t) = block.cached_translation() {
            return Ok(t);
        }
        let t = {
            let lookup = VmLookup {
                registry: &self.registry,
                syms: &self.syms,
            };
            translator::translate(block, &lookup)?
        };
        let rc = Rc::new(t);
        block.cache_translation(rc.clone());
        Ok(rc)
    }

    /// Execute a translation in a fresh frame.
    pub fn exec_translation(&mut self, t: &Rc<Translation>) -> Result<()> {
        self.exec_named(t, None)
    }

    fn exec_named(&mut self, t: &Rc<Translation>, name: Option<Rc<str>>) -> Result<()> {
        if self.frames.len() >= MAX_FRAMES {
            return Err(Error::stack_overflow());
        }
        self.frames.push(Frame::new(t.clone(), name, self.current_line));
        let result = self.dispatch(t);
        self.frames.pop();
        result.map_err(|e| e.with_line(self.current_line))
    }

    // ========================================================================
    // The dispatch loop
    // ========================================================================

    fn dispatch(&mut self, t: &Translation) -> Result<()> {
        let code = &t.instructions;
        let mut ip = 0usize;

        while ip < code.len() {
            if self.state != ExecState::Running {
                break;
            }
            if self.stop_requested.get() {
                // A synthetic `end`: finish this opcode boundary cleanly.
                break;
            }

            let byte = code[ip];
            ip += 1;

            // Small integer constants: the code byte is the value plus one.
            if byte <= 0x10 {
                self.stack.push(ArturoVal::Integer(byte as i64 - 1))?;
                continue;
            }

            // Short-form indexed families.
            match byte {
                0x11 => {
                    self.stack.push(ArturoVal::Floating(-1.0))?;
                    continue;
                }
                0x12 => {
                    self.stack.push(ArturoVal::Floating(0.0))?;
                    continue;
                }
                0x13 => {
                    self.stack.push(ArturoVal::Floating(1.0))?;
                    continue;
                }
                0x14 => {
                    self.stack.push(ArturoVal::Floating(2.0))?;
                    continue;
                }
                0x15 => {
                    self.stack.push(ArturoVal::Null)?;
                    continue;
                }
                0x16 => {
                    self.stack.push(ArturoVal::Logical(true))?;
                    continue;
                }
                0x17 => {
                    self.stack.push(ArturoVal::Logical(false))?;
                    continue;
                }
                0x18..=0x25 => {
                    self.push_constant(t, (byte - PUSH_BASE) as u16)?;
                    continue;
                }
                0x26..=0x33 => {
                    self.op_store(t, (byte - STORE_BASE) as u16, false)?;
                    continue;
                }
                0x34..=0x41 => {
                    self.op_load(t, (byte - LOAD_BASE) as u16)?;
                    continue;
                }
                0x42..=0x4F => {
                    self.op_call(t, (byte - CALL_BASE) as u16)?;
                    continue;
                }
                _ => {}
            }

            let op = OpCode::from_byte(byte)
                .ok_or_else(|| Error::internal(format!("Invalid opcode byte 0x{:02X}", byte)))?;

            match op {
                // Wide indexed operations
                OpCode::Push | OpCode::PushX => {
                    let idx = self.read_operand(code, &mut ip, op)?;
                    self.push_constant(t, idx)?;
                }
                OpCode::Store | OpCode::StoreX => {
                    let idx = self.read_operand(code, &mut ip, op)?;
                    self.op_store(t, idx, false)?;
                }
                OpCode::Storn | OpCode::StornX => {
                    let idx = self.read_operand(code, &mut ip, op)?;
                    self.op_store(t, idx, true)?;
                }
                OpCode::Load | OpCode::LoadX => {
                    let idx = self.read_operand(code, &mut ip, op)?;
                    self.op_load(t, idx)?;
                }
                OpCode::Call | OpCode::CallX => {
                    let idx = self.read_operand(code, &mut ip, op)?;
                    self.op_call(t, idx)?;
                }
                OpCode::Attr | OpCode::AttrX => {
                    let idx = self.read_operand(code, &mut ip, op)?;
                    let name = self.constant_text(t, idx)?;
                    let value = self.stack.pop()?;
                    self.attrs.insert(name.to_string(), value);
                }
                OpCode::Dkey | OpCode::DkeyX => {
                    let idx = self.read_operand(code, &mut ip, op)?;
                    let name = self.constant_text(t, idx)?;
                    self.dict_keys.push(name.to_string());
                }

                // Stack operations
                OpCode::Pop => {
                    self.stack.pop()?;
                }
                OpCode::Dup => {
                    let top = self.stack.peek(0)?.clone();
                    self.stack.push(top)?;
                }
                OpCode::Over => {
                    let second = self.stack.peek(1)?.clone();
                    self.stack.push(second)?;
                }
                OpCode::Swap => {
                    let a = self.stack.pop()?;
                    let b = self.stack.pop()?;
                    self.stack.push(a)?;
                    self.stack.push(b)?;
                }
                OpCode::Nop => {}

                // Converter fast paths
                OpCode::ToS => converting::convert_shorthand(self, ValueKind::String)?,
                OpCode::ToI => converting::convert_shorthand(self, ValueKind::Integer)?,

                // Jumps
                OpCode::JmpIf
                | OpCode::JmpIfX
                | OpCode::JmpIfNot
                | OpCode::JmpIfNotX
                | OpCode::JmpIfEq
                | OpCode::JmpIfEqX
                | OpCode::JmpIfNe
                | OpCode::JmpIfNeX
                | OpCode::JmpIfGt
                | OpCode::JmpIfGtX
                | OpCode::JmpIfGe
                | OpCode::JmpIfGeX
                | OpCode::JmpIfLt
                | OpCode::JmpIfLtX
                | OpCode::JmpIfLe
                | OpCode::JmpIfLeX => {
                    let offset = self.read_operand(code, &mut ip, op)? as usize;
                    if self.jump_condition(op)? {
                        ip += offset;
                    }
                }
                OpCode::Goto => {
                    let offset = self.read_operand(code, &mut ip, op)? as usize;
                    ip += offset;
                }
                OpCode::Goup => {
                    let offset = self.read_operand(code, &mut ip, op)? as usize;
                    ip = ip
                        .checked_sub(offset)
                        .ok_or_else(|| Error::internal("Backward jump before translation start"))?;
                }

                // Terminators
                OpCode::Ret | OpCode::End => break,
                OpCode::Eol => {
                    let line = self.read_operand(code, &mut ip, op)? as u32;
                    self.current_line = line;
                    if let Some(frame) = self.frames.last_mut() {
                        frame.line = line;
                    }
                }

                // Everything else is a builtin-backed opcode.
                other => self.invoke_by_op(other)?,
            }
        }

        Ok(())
    }

    fn read_operand(&self, code: &[u8], ip: &mut usize, op: OpCode) -> Result<u16> {
        match op.operand_width() {
            1 => {
                let v = *code
                    .get(*ip)
                    .ok_or_else(|| Error::internal("Truncated operand"))?;
                *ip += 1;
                Ok(v as u16)
            }
            2 => {
                let v = read_u16(code, *ip)
                    .ok_or_else(|| Error::internal("Truncated operand"))?;
                *ip += 2;
                Ok(v)
            }
            _ => Err(Error::internal("Opcode has no operand")),
        }
    }

    fn jump_condition(&mut self, op: OpCode) -> Result<bool> {
        use OpCode::*;
        match op {
            JmpIf | JmpIfX => Ok(self.stack.pop()?.is_truthy()),
            JmpIfNot | JmpIfNotX => Ok(!self.stack.pop()?.is_truthy()),
            _ => {
                let a = self.stack.pop()?;
                let b = self.stack.pop()?;
                let result = match op {
                    JmpIfEq | JmpIfEqX => self.values_equal(&a, &b)?,
                    JmpIfNe | JmpIfNeX => !self.values_equal(&a, &b)?,
                    JmpIfGt | JmpIfGtX => self.require_ord(&a, &b)? == Ordering::Greater,
                    JmpIfGe | JmpIfGeX => self.require_ord(&a, &b)? != Ordering::Less,
                    JmpIfLt | JmpIfLtX => self.require_ord(&a, &b)? == Ordering::Less,
                    JmpIfLe | JmpIfLeX => self.require_ord(&a, &b)? != Ordering::Greater,
                    _ => unreachable!("conditional jump decoded above"),
                };
                Ok(result)
            }
        }
    }

    fn require_ord(&mut self, a: &ArturoVal, b: &ArturoVal) -> Result<Ordering> {
        self.compare_values(a, b)?.ok_or_else(|| {
            Error::type_mismatch("jump", "value", "comparable values", a.type_name())
        })
    }

    // ========================================================================
    // Indexed operations
    // ========================================================================

    fn constant(&self, t: &Translation, idx: u16) -> Result<ArturoVal> {
        t.constants
            .get(idx as usize)
            .cloned()
            .ok_or_else(|| Error::internal(format!("Constant index {} out of range", idx)))
    }

    fn constant_text(&self, t: &Translation, idx: u16) -> Result<Rc<str>> {
        match self.constant(t, idx)? {
            ArturoVal::Word(s)
            | ArturoVal::Label(s)
            | ArturoVal::Attribute(s)
            | ArturoVal::Literal(s)
            | ArturoVal::String(s) => Ok(s),
            other => Err(Error::internal(format!(
                "Expected a name constant, found :{}",
                other.type_name()
            ))),
        }
    }

    fn push_constant(&mut self, t: &Translation, idx: u16) -> Result<()> {
        let value = self.constant(t, idx)?;
        self.stack.push(value)
    }

    fn op_store(&mut self, t: &Translation, idx: u16, keep: bool) -> Result<()> {
        let name = self.constant_text(t, idx)?;
        let value = if keep {
            self.stack.peek(0)?.clone()
        } else {
            self.stack.pop()?
        };
        self.syms.set(&name, value);
        Ok(())
    }

    fn op_load(&mut self, t: &Translation, idx: u16) -> Result<()> {
        let name = self.constant_text(t, idx)?;
        let value = self
            .syms
            .get(&name)
            .cloned()
            .ok_or_else(|| Error::symbol_not_found(&*name))?;
        self.stack.push(value)
    }

    /// The call opcode: what the symbol is now decides what happens. A
    /// function gets called, any other value gets pushed. Builtins need no
    /// registry fallback here: startup binds every one of them as a global
    /// symbol.
    fn op_call(&mut self, t: &Translation, idx: u16) -> Result<()> {
        let name = self.constant_text(t, idx)?;
        match self.syms.get(&name).cloned() {
            Some(ArturoVal::Function(f)) => self.call_function(f, &name),
            Some(value) => self.stack.push(value),
            None => Err(Error::symbol_not_found(&*name)),
        }
    }

    // ========================================================================
    // Builtin invocation
    // ========================================================================

    fn invoke_by_op(&mut self, op: OpCode) -> Result<()> {
        let registry = self.registry.clone();
        let b = registry
            .by_op(op)
            .ok_or_else(|| Error::internal(format!("No builtin backs opcode {:?}", op)))?;
        self.invoke(b)
    }

    pub(crate) fn invoke_named(&mut self, name: &str) -> Result<()> {
        let registry = self.registry.clone();
        match registry.get(name) {
            Some(b) => self.invoke(b),
            None => Err(Error::symbol_not_found(name)),
        }
    }

    /// Pop and type-check arguments, hand off to the native routine, and on
    /// error restore the stack to its depth at entry.
    fn invoke(&mut self, b: &Builtin) -> Result<()> {
        let arity = b.decl.arity();
        let depth_entry = self.stack.len();
        if depth_entry < arity {
            return Err(Error::stack_underflow());
        }

        let mut args = Vec::with_capacity(arity);
        for _ in 0..arity {
            args.push(self.stack.pop()?);
        }

        let run = b.decl.check_args(&args).and_then(|_| {
            let attrs = std::mem::take(&mut self.attrs);
            (b.func)(self, &args, &attrs)
        });

        if let Err(e) = run {
            self.stack.truncate(depth_entry - arity);
            for arg in args.into_iter().rev() {
                let _ = self.stack.push(arg);
            }
            return Err(e);
        }
        Ok(())
    }

    // ========================================================================
    // Function calls
    // ========================================================================

    /// The full call sequence for a function value.
    pub fn call_function(&mut self, f: Rc<FunctionVal>, name: &str) -> Result<()> {
        match &*f {
            FunctionVal::Builtin(b) => {
                let builtin_name = b.name.clone();
                self.invoke_named(&builtin_name)
            }
            FunctionVal::User(_) => self.call_user(f.clone(), name),
        }
    }

    fn call_user(&mut self, f: Rc<FunctionVal>, name: &str) -> Result<()> {
        let FunctionVal::User(u) = &*f else {
            return Err(Error::internal("call_user on a builtin"));
        };

        let arity = u.params.len();
        if self.stack.len() < arity {
            return Err(Error::arity_mismatch(name, arity, self.stack.len()));
        }
        let mut args = Vec::with_capacity(arity);
        for _ in 0..arity {
            args.push(self.stack.pop()?);
        }
        for (i, arg) in args.iter().enumerate() {
            if let Some(Some(kinds)) = u.param_kinds.get(i) {
                if !kinds.contains(arg.kind()) {
                    return Err(Error::type_mismatch(
                        name,
                        u.params[i].to_string(),
                        kinds.describe(),
                        arg.type_name(),
                    ));
                }
            }
        }

        // Memoized functions are pure: a cache hit replays the result.
        let memo_key = if u.memoize {
            let key = (Rc::as_ptr(&f) as *const () as usize, args.clone());
            if let Some(hit) = self.memo.get(&key) {
                let hit = hit.clone();
                return self.stack.push(hit);
            }
            Some(key)
        } else {
            None
        };

        let t = self.body_translation(u)?;

        let call_attrs = std::mem::take(&mut self.attrs);
        self.fn_attrs.push(call_attrs);
        let base = self.stack.len();
        let fname: Rc<str> = Rc::from(name);

        let result = if u.inline {
            // Inline functions skip the child scope: bind over the caller's
            // symbols and put them back afterwards.
            let names: Vec<&str> = u.params.iter().map(|p| &**p).collect();
            let saved = self.syms.save_bindings(&names);
            for (i, param) in u.params.iter().enumerate() {
                self.syms.set(param, args[i].clone());
            }
            let r = self.exec_named(&t, Some(fname));
            self.syms.restore_bindings(saved);
            r
        } else {
            let mut scope = Scope::new();
            for (i, param) in u.params.iter().enumerate() {
                scope.insert(param.to_string(), args[i].clone());
            }
            if let Some(imports) = &u.imports {
                for (k, v) in imports.borrow().iter() {
                    scope.entry(k.clone()).or_insert_with(|| v.clone());
                }
            }
            self.syms.push_scope(scope);
            let r = self.exec_named(&t, Some(fname));
            let finished = self.syms.pop_scope();
            if r.is_ok() {
                for export in &u.exports {
                    if let Some(v) = finished.get(&**export) {
                        self.syms.set(export, v.clone());
                    }
                }
            }
            r
        };

        self.fn_attrs.pop();
        result?;

        // The function frame absorbs a pending return.
        if self.state == ExecState::AwaitingReturn {
            self.state = ExecState::Running;
        }

        if let Some(key) = memo_key {
            if self.stack.len() > base {
                let value = self.stack.peek(0)?.clone();
                self.memo.insert(key, value);
            }
        }
        Ok(())
    }

    fn body_translation(&mut self, u: &arturo_parser::UserFunction) -> Result<Rc<Translation>> {
        if let Some(t) = u.translation.borrow().as_ref() {
            return Ok(t.clone());
        }
        let t = {
            let lookup = VmLookup {
                registry: &self.registry,
                syms: &self.syms,
            };
            Rc::new(translator::translate(&u.body, &lookup)?)
        };
        *u.translation.borrow_mut() = Some(t.clone());
        Ok(t)
    }

    /// Call a function value with prepared arguments and take back its
    /// result. The stack is left at its prior depth.
    pub fn call_value(
        &mut self,
        fval: &ArturoVal,
        args: Vec<ArturoVal>,
        name: &str,
    ) -> Result<Option<ArturoVal>> {
        let ArturoVal::Function(f) = fval else {
            return Err(Error::type_mismatch(
                name,
                "function",
                ":function",
                fval.type_name(),
            ));
        };
        let base = self.stack.len();
        for arg in args.into_iter().rev() {
            self.stack.push(arg)?;
        }
        self.call_function(f.clone(), name)?;
        let result = if self.stack.len() > base {
            Some(self.stack.pop()?)
        } else {
            None
        };
        self.stack.truncate(base);
        Ok(result)
    }

    // ========================================================================
    // Block execution
    // ========================================================================

    /// Execute a block-like value in the current scope.
    pub fn exec_block_value(&mut self, value: &ArturoVal) -> Result<()> {
        match value {
            ArturoVal::Block(b) | ArturoVal::Inline(b) => {
                let t = self.translate_block_cached(b)?;
                self.exec_translation(&t)
            }
            ArturoVal::Bytecode(t) => {
                let t = t.clone();
                self.exec_translation(&t)
            }
            ArturoVal::String(s) => {
                let source = s.to_string();
                self.run_source(&source)
            }
            other => Err(Error::type_mismatch(
                "do",
                "code",
                ":block :inline :bytecode :string",
                other.type_name(),
            )),
        }
    }

    /// Execute a block-like value and return everything it pushed.
    pub fn exec_collect(&mut self, value: &ArturoVal) -> Result<Vec<ArturoVal>> {
        let depth = self.stack.len();
        self.exec_block_value(value)?;
        Ok(self.stack.drain_above(depth))
    }

    /// Execute a block as a dictionary: symbols it introduces or changes
    /// become the entries, ordered by the `Dkey` log, and leftover stack
    /// values pair up as key/value. The scope comes back untouched.
    pub fn exec_dictionary_block(
        &mut self,
        block: &ArturoBlock,
    ) -> Result<IndexMap<String, ArturoVal>> {
        let t = {
            let lookup = VmLookup {
                registry: &self.registry,
                syms: &self.syms,
            };
            Rc::new(translator::translate_dictionary(block, &lookup)?)
        };

        let snapshot = self.syms.snapshot();
        let keys_start = self.dict_keys.len();
        let depth = self.stack.len();

        if let Err(e) = self.exec_translation(&t) {
            self.syms.restore(snapshot);
            self.dict_keys.truncate(keys_start);
            self.stack.truncate(depth);
            return Err(e);
        }

        let post = self.syms.snapshot();
        let mut changed = self.syms.diff_since(&snapshot);
        self.syms.restore(snapshot);

        // Keys the block stored come first, in source order, whether or not
        // the stored value differed; other changed symbols follow.
        let mut map = IndexMap::new();
        let logged: Vec<String> = self.dict_keys.drain(keys_start..).collect();
        for key in logged {
            if let Some(v) = post.get(&key) {
                changed.shift_remove(&key);
                map.insert(key, v.clone());
            }
        }
        for (k, v) in changed {
            map.insert(k, v);
        }

        let extras = self.stack.drain_above(depth);
        let mut it = extras.into_iter();
        while let Some(key) = it.next() {
            let value = it.next().unwrap_or(ArturoVal::Null);
            let key = match key.text() {
                Some(text) => text.to_string(),
                None => key.to_string(),
            };
            map.insert(key, value);
        }

        Ok(map)
    }

    // ========================================================================
    // Value behavior that needs execution
    // ========================================================================

    /// Printable form: objects with a `print` magic method render through
    /// it, everything else through its display form.
    pub fn printable(&mut self, value: &ArturoVal) -> Result<String> {
        if let ArturoVal::Object(obj) = value {
            let hook = self
                .types
                .get(obj.proto())
                .and_then(|p| p.borrow().do_print.clone());
            if let Some(hook) = hook {
                if let Some(rendered) = self.call_value(&hook, vec![value.clone()], "print")? {
                    return Ok(match rendered {
                        ArturoVal::String(s) => s.to_string(),
                        other => other.to_string(),
                    });
                }
            }
        }
        Ok(value.to_string())
    }

    /// What `print` shows: blocks join their elements with single spaces.
    pub fn print_form(&mut self, value: &ArturoVal) -> Result<String> {
        match value {
            ArturoVal::Block(b) | ArturoVal::Inline(b) => {
                let items = b.to_vec();
                let mut parts = Vec::with_capacity(items.len());
                for item in &items {
                    parts.push(self.printable(item)?);
                }
                Ok(parts.join(" "))
            }
            other => self.printable(other),
        }
    }

    /// Equality that honors `compare` magic methods on objects.
    pub fn values_equal(&mut self, a: &ArturoVal, b: &ArturoVal) -> Result<bool> {
        if let (ArturoVal::Object(x), ArturoVal::Object(_)) = (a, b) {
            let hook = self
                .types
                .get(x.proto())
                .and_then(|p| p.borrow().do_compare.clone());
            if let Some(hook) = hook {
                let sign = self
                    .call_value(&hook, vec![a.clone(), b.clone()], "compare")?
                    .and_then(|v| v.exact_i64());
                return Ok(sign == Some(0));
            }
        }
        Ok(a == b)
    }

    /// Ordering that honors `compare` magic methods on objects. Objects
    /// without one are incomparable.
    pub fn compare_values(&mut self, a: &ArturoVal, b: &ArturoVal) -> Result<Option<Ordering>> {
        if let (ArturoVal::Object(x), ArturoVal::Object(_)) = (a, b) {
            let hook = self
                .types
                .get(x.proto())
                .and_then(|p| p.borrow().do_compare.clone());
            if let Some(hook) = hook {
                let sign = self
                    .call_value(&hook, vec![a.clone(), b.clone()], "compare")?
                    .and_then(|v| v.exact_i64());
                return Ok(sign.map(|s| s.cmp(&0)));
            }
            return Ok(None);
        }
        Ok(a.compare(b))
    }

    /// Attribute of the innermost user-function call.
    pub fn fn_attr(&self, name: &str) -> Option<ArturoVal> {
        self.fn_attrs.last().and_then(|attrs| attrs.get(name).cloned())
    }
}

impl Default for Vm {
    fn default() -> Self {
        Self::new()
    }
}
