// arturo-vm - Bytecode translator and virtual machine for the Arturo programming language
// Copyright (c) 2026 The Arturo Project Contributors. MIT licensed.

//! Analysis pass of the translator.
//!
//! A block is a flat sequence of values; this pass folds it into an
//! expression tree driven by arities. Words that resolve to functions
//! consume the following expressions as arguments, labels bind the next
//! expression, operator glyphs work as infix sugar, and attributes buffer
//! onto the call they belong to. Codegen then walks the tree.

use std::collections::HashMap;
use std::rc::Rc;

use arturo_core::{Error, Result};
use arturo_parser::{ArturoBlock, ArturoSymbol, ArturoVal, FunctionVal};

use crate::opcode::OpCode;

/// What the translator knows about a name at a call site.
#[derive(Debug, Clone, Copy)]
pub struct FnHint {
    pub arity: usize,
    /// Dedicated opcode for the fast path, when one exists.
    pub op: Option<OpCode>,
}

/// Resolves names to call hints: the builtin registry always, plus the live
/// symbol table when a function body translates at first invocation.
pub trait ArityLookup {
    fn hint(&self, name: &str) -> Option<FnHint>;
}

/// A node of the analyzed expression tree.
#[derive(Debug)]
pub enum Node {
    /// Push a literal value.
    Push(ArturoVal),
    /// Statements of a parenthesized inline block, run in the current scope.
    Seq(Vec<Node>),
    /// Call with translation-time known arity.
    Call {
        name: Rc<str>,
        op: Option<OpCode>,
        args: Vec<Node>,
        attrs: Vec<(Rc<str>, Node)>,
    },
    /// A bare word of unknown arity; the VM decides call versus load.
    CallUnknown { name: Rc<str> },
    /// Bind the next value to a name.
    Store {
        name: Rc<str>,
        value: Box<Node>,
        keep: bool,
    },
    /// Chained element access through a path.
    PathGet { base: Box<Node>, keys: Vec<Node> },
    /// Assignment through a path.
    PathSet {
        base: Box<Node>,
        keys: Vec<Node>,
        value: Box<Node>,
    },
    /// `if`/`unless` over a literal block, compiled to a conditional jump.
    IfInline {
        cond: Box<Node>,
        negated: bool,
        body: Vec<Node>,
    },
    /// Fused `if?`/`unless?` with `else` over literal blocks.
    Ternary {
        cond: Box<Node>,
        negated: bool,
        then_body: Vec<Node>,
        else_body: Vec<Node>,
    },
    /// Source line marker.
    Eol(u32),
}

/// Builds the expression tree for one block.
pub struct AstBuilder<'a> {
    items: Vec<ArturoVal>,
    lines: Vec<u32>,
    pos: usize,
    lookup: &'a dyn ArityLookup,
    /// Arities of functions defined by labels seen in this translation.
    local_arities: HashMap<String, usize>,
}

impl<'a> AstBuilder<'a> {
    /// Analyze a whole block into statement nodes.
    pub fn build(block: &ArturoBlock, lookup: &'a dyn ArityLookup) -> Result<Vec<Node>> {
        let mut builder = AstBuilder {
            items: block.to_vec(),
            lines: block.inner().lines.borrow().clone(),
            pos: 0,
            lookup,
            local_arities: HashMap::new(),
        };
        builder.build_all()
    }

    fn build_all(&mut self) -> Result<Vec<Node>> {
        let mut nodes = Vec::new();
        let mut last_line = 0u32;
        while self.pos < self.items.len() {
            if let Some(line) = self.lines.get(self.pos).copied() {
                if line != last_line {
                    nodes.push(Node::Eol(line));
                    last_line = line;
                }
            }
            let node = self.expression()?;
            nodes.push(node);
        }
        Ok(nodes)
    }

    /// Analyze a nested literal block with the same arity knowledge.
    fn sub_block(&mut self, block: &ArturoBlock) -> Result<Vec<Node>> {
        let mut builder = AstBuilder {
            items: block.to_vec(),
            lines: block.inner().lines.borrow().clone(),
            pos: 0,
            lookup: self.lookup,
            local_arities: self.local_arities.clone(),
        };
        let nodes = builder.build_all()?;
        // Definitions made inside the block stay visible afterwards.
        self.local_arities.extend(builder.local_arities);
        Ok(nodes)
    }

    fn peek(&self) -> Option<&ArturoVal> {
        self.items.get(self.pos)
    }

    fn advance(&mut self) -> Option<ArturoVal> {
        let item = self.items.get(self.pos).cloned();
        if item.is_some() {
            self.pos += 1;
        }
        item
    }

    fn line_here(&self) -> u32 {
        self.lines
            .get(self.pos.saturating_sub(1))
            .copied()
            .unwrap_or(0)
    }

    // ========================================================================
    // Expressions
    // ========================================================================

    fn expression(&mut self) -> Result<Node> {
        let first = self.primary()?;
        self.infix_chain(first)
    }

    /// Fold trailing infix glyphs onto a completed expression,
    /// left-associatively and without precedence.
    fn infix_chain(&mut self, mut lhs: Node) -> Result<Node> {
        loop {
            let Some(ArturoVal::Symbol(sym)) = self.peek() else {
                return Ok(lhs);
            };
            let sym = *sym;
            if !sym.is_infix() {
                return Ok(lhs);
            }
            self.advance();
            let rhs = self.primary()?;
            let name = sym
                .aliased_builtin()
                .ok_or_else(|| {
                    Error::parse(format!("Symbol '{}' cannot be used as an operator", sym))
                        .with_line(self.line_here())
                })?;
            let op = self.lookup.hint(name).and_then(|h| h.op);
            lhs = Node::Call {
                name: Rc::from(name),
                op,
                args: vec![lhs, rhs],
                attrs: Vec::new(),
            };
        }
    }

    fn primary(&mut self) -> Result<Node> {
        let item = self.advance().ok_or_else(|| {
            Error::parse("Unexpected end of block while reading an expression")
                .with_line(self.line_here())
        })?;

        match item {
            ArturoVal::Word(name) => self.word(name),
            ArturoVal::Label(name) => self.label(name),
            ArturoVal::Symbol(sym) => self.symbol_head(sym),
            ArturoVal::Inline(block) => Ok(Node::Seq(self.sub_block(&block)?)),
            ArturoVal::Path(segments) => self.path_get(&segments),
            ArturoVal::PathLabel(segments) => self.path_set(&segments),
            ArturoVal::Attribute(name) | ArturoVal::AttributeLabel(name) => Err(Error::parse(
                format!("Attribute '.{}' does not follow a call", name),
            )
            .with_line(self.line_here())),
            other => Ok(Node::Push(other)),
        }
    }

    fn word(&mut self, name: Rc<str>) -> Result<Node> {
        // Constant words resolve at translation time.
        match &*name {
            "true" => return Ok(Node::Push(ArturoVal::Logical(true))),
            "false" => return Ok(Node::Push(ArturoVal::Logical(false))),
            "null" => return Ok(Node::Push(ArturoVal::Null)),
            _ => {}
        }

        if let Some(&arity) = self.local_arities.get(&*name) {
            let node = self.collect_call(name.clone(), arity, None)?;
            return self.maybe_fuse(node);
        }
        if let Some(hint) = self.lookup.hint(&name) {
            let node = self.collect_call(name.clone(), hint.arity, hint.op)?;
            return self.maybe_fuse(node);
        }
        Ok(Node::CallUnknown { name })
    }

    fn label(&mut self, name: Rc<str>) -> Result<Node> {
        if self.peek().is_none() {
            return Err(
                Error::parse(format!("Label '{}:' has no value to bind", name))
                    .with_line(self.line_here()),
            );
        }
        let mut value = self.expression()?;

        // Chained labels keep intermediate values on the stack.
        if let Node::Store { keep, .. } = &mut value {
            *keep = true;
        }

        if let Some(arity) = function_literal_arity(&value) {
            self.local_arities.insert(name.to_string(), arity);
        } else {
            self.local_arities.remove(&*name);
        }

        Ok(Node::Store {
            name,
            value: Box::new(value),
            keep: false,
        })
    }

    fn symbol_head(&mut self, sym: ArturoSymbol) -> Result<Node> {
        match sym.aliased_builtin() {
            Some(name) => {
                let hint = self.lookup.hint(name);
                let arity = hint.map(|h| h.arity).unwrap_or(2);
                let op = hint.and_then(|h| h.op);
                self.collect_call(Rc::from(name), arity, op)
            }
            None => Ok(Node::Push(ArturoVal::Symbol(sym))),
        }
    }

    fn collect_call(
        &mut self,
        name: Rc<str>,
        arity: usize,
        op: Option<OpCode>,
    ) -> Result<Node> {
        let mut attrs = Vec::new();
        let mut args = Vec::with_capacity(arity);
        for _ in 0..arity {
            self.consume_attrs(&mut attrs)?;
            if self.peek().is_none() {
                return Err(Error::arity_mismatch(&*name, arity, args.len())
                    .with_line(self.line_here()));
            }
            args.push(self.expression()?);
        }
        self.consume_attrs(&mut attrs)?;
        Ok(Node::Call {
            name,
            op,
            args,
            attrs,
        })
    }

    fn consume_attrs(&mut self, attrs: &mut Vec<(Rc<str>, Node)>) -> Result<()> {
        loop {
            match self.peek() {
                Some(ArturoVal::Attribute(name)) => {
                    let name = name.clone();
                    self.advance();
                    attrs.push((name, Node::Push(ArturoVal::Logical(true))));
                }
                Some(ArturoVal::AttributeLabel(name)) => {
                    let name = name.clone();
                    self.advance();
                    let value = self.expression()?;
                    attrs.push((name, value));
                }
                _ => return Ok(()),
            }
        }
    }

    // ========================================================================
    // Paths
    // ========================================================================

    fn path_get(&mut self, segments: &[ArturoVal]) -> Result<Node> {
        let (base, keys) = self.path_parts(segments)?;
        Ok(Node::PathGet {
            base: Box::new(base),
            keys,
        })
    }

    fn path_set(&mut self, segments: &[ArturoVal]) -> Result<Node> {
        if self.peek().is_none() {
            return Err(Error::parse("Path label has no value to bind")
                .with_line(self.line_here()));
        }
        let value = self.expression()?;
        let (base, keys) = self.path_parts(segments)?;
        Ok(Node::PathSet {
            base: Box::new(base),
            keys,
            value: Box::new(value),
        })
    }

    fn path_parts(&mut self, segments: &[ArturoVal]) -> Result<(Node, Vec<Node>)> {
        let first = segments.first().ok_or_else(|| {
            Error::internal("Empty path produced by the parser")
        })?;
        let base = match first {
            ArturoVal::Word(name) => Node::CallUnknown { name: name.clone() },
            other => Node::Push(other.clone()),
        };
        let mut keys = Vec::new();
        for seg in &segments[1..] {
            keys.push(match seg {
                ArturoVal::Word(name) => Node::Push(ArturoVal::string(name)),
                ArturoVal::Integer(i) => Node::Push(ArturoVal::Integer(*i)),
                ArturoVal::Inline(block) => Node::Seq(self.sub_block(block)?),
                other => Node::Push(other.clone()),
            });
        }
        Ok((base, keys))
    }

    // ========================================================================
    // Control-flow fusion
    // ========================================================================

    /// Compile `if` and `unless` over literal blocks into jumps, fuse
    /// `if?`/`unless?` with a trailing `else`, and shorten the common
    /// conversions.
    fn maybe_fuse(&mut self, node: Node) -> Result<Node> {
        let Node::Call {
            name,
            op,
            mut args,
            attrs,
        } = node
        else {
            return Ok(node);
        };

        if attrs.is_empty() {
            match (&*name, args.len()) {
                ("if", 2) | ("unless", 2) => {
                    if let Node::Push(ArturoVal::Block(block)) = &args[1] {
                        let body = self.sub_block(&block.clone())?;
                        let cond = args.remove(0);
                        return Ok(Node::IfInline {
                            cond: Box::new(cond),
                            negated: &*name == "unless",
                            body,
                        });
                    }
                }
                ("if?", 2) | ("unless?", 2) => {
                    if matches!(args[1], Node::Push(ArturoVal::Block(_)))
                        && matches!(self.peek(), Some(ArturoVal::Word(w)) if &**w == "else")
                    {
                        // Look ahead past `else` for a literal block.
                        if let Some(ArturoVal::Block(else_block)) =
                            self.items.get(self.pos + 1).cloned()
                        {
                            self.advance(); // else
                            self.advance(); // the block
                            let Node::Push(ArturoVal::Block(then_block)) = args.remove(1) else {
                                unreachable!("checked above");
                            };
                            let cond = args.remove(0);
                            let then_body = self.sub_block(&then_block)?;
                            let else_body = self.sub_block(&else_block)?;
                            return Ok(Node::Ternary {
                                cond: Box::new(cond),
                                negated: &*name == "unless?",
                                then_body,
                                else_body,
                            });
                        }
                    }
                }
                ("to", 2) => {
                    // The common string/integer conversions get their
                    // dedicated single-operand opcodes.
                    use arturo_parser::{TypeVal, ValueKind};
                    if let Node::Push(ArturoVal::Type(TypeVal::Builtin(kind))) = &args[0] {
                        let short = match kind {
                            ValueKind::String => Some(OpCode::ToS),
                            ValueKind::Integer => Some(OpCode::ToI),
                            _ => None,
                        };
                        if let Some(short_op) = short {
                            let value = args.remove(1);
                            return Ok(Node::Call {
                                name,
                                op: Some(short_op),
                                args: vec![value],
                                attrs,
                            });
                        }
                    }
                }
                // `while` stays on its opcode: its body must run under an
                // iteration frame so `break` and `continue` find it.
                _ => {}
            }
        }

        Ok(Node::Call {
            name,
            op,
            args,
            attrs,
        })
    }
}

/// Parameter count of a `function` construction node, for arity tracking.
fn function_literal_arity(node: &Node) -> Option<usize> {
    match node {
        Node::Call { name, args, .. } if &**name == "function" => match args.first() {
            Some(Node::Push(ArturoVal::Block(params))) => Some(count_params(params)),
            _ => None,
        },
        Node::Push(ArturoVal::Function(f)) => match &**f {
            FunctionVal::User(u) => Some(u.params.len()),
            FunctionVal::Builtin(b) => Some(b.arity),
        },
        Node::Store { value, .. } => function_literal_arity(value),
        _ => None,
    }
}

/// Count the parameter words of a params block, skipping type annotations.
pub fn count_params(params: &ArturoBlock) -> usize {
    params
        .items()
        .iter()
        .filter(|item| matches!(item, ArturoVal::Word(_) | ArturoVal::Literal(_)))
        .count()
}
