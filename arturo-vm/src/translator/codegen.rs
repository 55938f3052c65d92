// arturo-vm - Bytecode translator and virtual machine for the Arturo programming language
// Copyright (c) 2026 The Arturo Project Contributors. MIT licensed.

//! Emission pass of the translator.
//!
//! Walks the analyzed tree and writes bytecode. Arguments emit right to
//! left so the first argument ends up on top of the stack; buffered
//! attributes emit after the argument code, immediately before their call.

use arturo_core::Result;
use arturo_parser::Translation;

use crate::opcode::OpCode;
use crate::translation::Emitter;
use crate::translator::ast::Node;

/// Walks nodes and emits a translation.
pub struct Codegen {
    e: Emitter,
    /// Emit `Dkey` markers after top-level stores (dictionary blocks).
    dict_mode: bool,
}

impl Codegen {
    pub fn new() -> Codegen {
        Codegen {
            e: Emitter::new(),
            dict_mode: false,
        }
    }

    pub fn new_dictionary() -> Codegen {
        Codegen {
            e: Emitter::new(),
            dict_mode: true,
        }
    }

    /// Emit all statement nodes and seal the translation with `End`.
    pub fn generate(mut self, nodes: &[Node]) -> Result<Translation> {
        for node in nodes {
            self.emit_statement(node)?;
        }
        Ok(self.e.finish())
    }

    fn emit_statement(&mut self, node: &Node) -> Result<()> {
        self.emit_node(node)?;
        if self.dict_mode {
            if let Node::Store { name, .. } = node {
                self.e.emit_dkey(name)?;
            }
        }
        Ok(())
    }

    fn emit_node(&mut self, node: &Node) -> Result<()> {
        match node {
            Node::Push(value) => self.e.emit_push_value(value.clone())?,
            Node::Eol(line) => self.e.emit_eol(*line),
            Node::Seq(nodes) => {
                for n in nodes {
                    self.emit_node(n)?;
                }
            }
            Node::Call {
                name,
                op,
                args,
                attrs,
            } => {
                for arg in args.iter().rev() {
                    self.emit_node(arg)?;
                }
                for (attr_name, attr_value) in attrs {
                    self.emit_node(attr_value)?;
                    self.e.emit_attr(attr_name)?;
                }
                match op {
                    Some(op) => self.e.emit_op(*op),
                    None => self.e.emit_call(name)?,
                }
            }
            Node::CallUnknown { name } => self.e.emit_call(name)?,
            Node::Store { name, value, keep } => {
                self.emit_node(value)?;
                if *keep {
                    self.e.emit_store_keep(name)?;
                } else {
                    self.e.emit_store(name)?;
                }
            }
            // `get` pops the collection first, then the key, so keys emit
            // deepest-last and the base lands on top.
            Node::PathGet { base, keys } => {
                for key in keys.iter().rev() {
                    self.emit_node(key)?;
                }
                self.emit_node(base)?;
                for _ in keys {
                    self.e.emit_op(OpCode::Get);
                }
            }
            Node::PathSet { base, keys, value } => {
                self.emit_node(value)?;
                if let Some(last) = keys.last() {
                    self.emit_node(last)?;
                }
                // Walk down to the container holding the final key.
                for key in keys[..keys.len() - 1].iter().rev() {
                    self.emit_node(key)?;
                }
                self.emit_node(base)?;
                for _ in 0..keys.len() - 1 {
                    self.e.emit_op(OpCode::Get);
                }
                self.e.emit_op(OpCode::Set);
            }
            Node::IfInline {
                cond,
                negated,
                body,
            } => {
                self.emit_node(cond)?;
                let jump = self.e.emit_jump(if *negated {
                    OpCode::JmpIfX
                } else {
                    OpCode::JmpIfNotX
                });
                for n in body {
                    self.emit_node(n)?;
                }
                self.e.patch_jump(jump);
            }
            Node::Ternary {
                cond,
                negated,
                then_body,
                else_body,
            } => {
                self.emit_node(cond)?;
                let to_else = self.e.emit_jump(if *negated {
                    OpCode::JmpIfX
                } else {
                    OpCode::JmpIfNotX
                });
                for n in then_body {
                    self.emit_node(n)?;
                }
                let to_end = self.e.emit_jump(OpCode::Goto);
                self.e.patch_jump(to_else);
                for n in else_body {
                    self.emit_node(n)?;
                }
                self.e.patch_jump(to_end);
            }
        }
        Ok(())
    }
}

impl Default for Codegen {
    fn default() -> Self {
        Self::new()
    }
}
