// arturo-vm - Bytecode translator and virtual machine for the Arturo programming language
// Copyright (c) 2026 The Arturo Project Contributors. MIT licensed.

//! Emission helpers over `Translation`, the bytecode exchange form, and a
//! small disassembler.
//!
//! `Translation` itself (constants plus instruction bytes) lives in the
//! value model, because `:bytecode` is a first-class value. Everything that
//! writes one lives here.

use arturo_core::{Error, Result};
use arturo_parser::{ArturoVal, IndexMap, Translation};

use crate::opcode::{OpCode, CALL_BASE, LOAD_BASE, PUSH_BASE, SHORT_MAX, STORE_BASE};

/// Incrementally builds a `Translation`.
#[derive(Debug, Default)]
pub struct Emitter {
    pub translation: Translation,
    last_line: u16,
}

impl Emitter {
    pub fn new() -> Emitter {
        Emitter {
            translation: Translation::new(),
            last_line: 0,
        }
    }

    pub fn finish(mut self) -> Translation {
        self.emit_op(OpCode::End);
        self.translation
    }

    pub fn current_offset(&self) -> usize {
        self.translation.instructions.len()
    }

    pub fn emit_op(&mut self, op: OpCode) {
        self.translation.instructions.push(op as u8);
    }

    pub fn emit_u8(&mut self, value: u8) {
        self.translation.instructions.push(value);
    }

    pub fn emit_u16(&mut self, value: u16) {
        self.translation.instructions.extend_from_slice(&value.to_le_bytes());
    }

    /// Intern a constant into the pool.
    pub fn intern(&mut self, value: ArturoVal) -> Result<u16> {
        self.translation
            .add_constant(value)
            .ok_or_else(|| Error::internal("Constant pool limit exceeded"))
    }

    /// Emit a source line marker when the line changed.
    pub fn emit_eol(&mut self, line: u32) {
        let line = line.min(u16::MAX as u32) as u16;
        if line != 0 && line != self.last_line {
            self.emit_op(OpCode::Eol);
            self.emit_u16(line);
            self.last_line = line;
        }
    }

    /// Emit the shortest encoding of an indexed operation, given its
    /// short-form base and its wide forms.
    fn emit_indexed(&mut self, idx: u16, base: u8, narrow: OpCode, wide: OpCode) {
        if idx <= SHORT_MAX {
            self.emit_u8(base + idx as u8);
        } else if idx <= u8::MAX as u16 {
            self.emit_op(narrow);
            self.emit_u8(idx as u8);
        } else {
            self.emit_op(wide);
            self.emit_u16(idx);
        }
    }

    /// Push a constant, using the dedicated small-value opcodes when the
    /// value has one.
    pub fn emit_push_value(&mut self, value: ArturoVal) -> Result<()> {
        match &value {
            ArturoVal::Null => {
                self.emit_op(OpCode::ConstNull);
                return Ok(());
            }
            ArturoVal::Logical(true) => {
                self.emit_op(OpCode::ConstTrue);
                return Ok(());
            }
            ArturoVal::Logical(false) => {
                self.emit_op(OpCode::ConstFalse);
                return Ok(());
            }
            ArturoVal::Integer(i) if (-1..=15).contains(i) => {
                let byte = if *i == -1 {
                    OpCode::ConstIM1 as u8
                } else {
                    OpCode::ConstI0 as u8 + *i as u8
                };
                self.emit_u8(byte);
                return Ok(());
            }
            ArturoVal::Floating(f) => {
                let dedicated = match *f {
                    f if f == -1.0 => Some(OpCode::ConstFM1),
                    f if f == 0.0 => Some(OpCode::ConstF0),
                    f if f == 1.0 => Some(OpCode::ConstF1),
                    f if f == 2.0 => Some(OpCode::ConstF2),
                    _ => None,
                };
                if let Some(op) = dedicated {
                    self.emit_op(op);
                    return Ok(());
                }
            }
            _ => {}
        }
        let idx = self.intern(value)?;
        self.emit_indexed(idx, PUSH_BASE, OpCode::Push, OpCode::PushX);
        Ok(())
    }

    pub fn emit_store(&mut self, name: &str) -> Result<()> {
        let idx = self.intern(ArturoVal::label(name))?;
        self.emit_indexed(idx, STORE_BASE, OpCode::Store, OpCode::StoreX);
        Ok(())
    }

    /// Store that keeps the value on the stack, for chained labels.
    pub fn emit_store_keep(&mut self, name: &str) -> Result<()> {
        let idx = self.intern(ArturoVal::label(name))?;
        if idx <= u8::MAX as u16 {
            self.emit_op(OpCode::Storn);
            self.emit_u8(idx as u8);
        } else {
            self.emit_op(OpCode::StornX);
            self.emit_u16(idx);
        }
        Ok(())
    }

    pub fn emit_load(&mut self, name: &str) -> Result<()> {
        let idx = self.intern(ArturoVal::word(name))?;
        self.emit_indexed(idx, LOAD_BASE, OpCode::Load, OpCode::LoadX);
        Ok(())
    }

    pub fn emit_call(&mut self, name: &str) -> Result<()> {
        let idx = self.intern(ArturoVal::word(name))?;
        self.emit_indexed(idx, CALL_BASE, OpCode::Call, OpCode::CallX);
        Ok(())
    }

    pub fn emit_attr(&mut self, name: &str) -> Result<()> {
        let idx = self.intern(ArturoVal::attribute(name))?;
        if idx <= u8::MAX as u16 {
            self.emit_op(OpCode::Attr);
            self.emit_u8(idx as u8);
        } else {
            self.emit_op(OpCode::AttrX);
            self.emit_u16(idx);
        }
        Ok(())
    }

    pub fn emit_dkey(&mut self, name: &str) -> Result<()> {
        let idx = self.intern(ArturoVal::string(name))?;
        if idx <= u8::MAX as u16 {
            self.emit_op(OpCode::Dkey);
            self.emit_u8(idx as u8);
        } else {
            self.emit_op(OpCode::DkeyX);
            self.emit_u16(idx);
        }
        Ok(())
    }

    /// Emit a forward jump with a placeholder offset; returns the operand
    /// position for `patch_jump`.
    pub fn emit_jump(&mut self, op: OpCode) -> usize {
        self.emit_op(op);
        let at = self.current_offset();
        self.emit_u16(0);
        at
    }

    /// Point a previously emitted forward jump at the current offset.
    pub fn patch_jump(&mut self, operand_at: usize) {
        let distance = self.current_offset() - (operand_at + 2);
        let bytes = (distance as u16).to_le_bytes();
        self.translation.instructions[operand_at] = bytes[0];
        self.translation.instructions[operand_at + 1] = bytes[1];
    }

    /// Emit a backward jump to an earlier offset.
    pub fn emit_goup(&mut self, target: usize) {
        self.emit_op(OpCode::Goup);
        // ip sits after the operand when the jump executes.
        let distance = (self.current_offset() + 2) - target;
        self.emit_u16(distance as u16);
    }
}

/// Read a little-endian two-byte operand.
pub fn read_u16(code: &[u8], at: usize) -> Option<u16> {
    Some(u16::from_le_bytes([*code.get(at)?, *code.get(at + 1)?]))
}

// ============================================================================
// Exchange format
// ============================================================================

/// Serialize a translation to its exchange dictionary:
/// `#[data: [...constants] code: [...opcode bytes]]`.
pub fn translation_to_dict(translation: &Translation) -> ArturoVal {
    let mut map = IndexMap::new();
    map.insert(
        "data".to_string(),
        ArturoVal::block(translation.constants.clone()),
    );
    map.insert(
        "code".to_string(),
        ArturoVal::block(
            translation
                .instructions
                .iter()
                .map(|b| ArturoVal::Integer(*b as i64))
                .collect(),
        ),
    );
    ArturoVal::dictionary(map)
}

/// Rebuild a translation from its exchange dictionary.
pub fn translation_from_dict(dict: &arturo_parser::ArturoDict) -> Result<Translation> {
    let data = dict
        .get("data")
        .ok_or_else(|| Error::conversion_failed("dictionary", ":bytecode", "missing 'data' key"))?;
    let code = dict
        .get("code")
        .ok_or_else(|| Error::conversion_failed("dictionary", ":bytecode", "missing 'code' key"))?;

    let constants = match data {
        ArturoVal::Block(b) => b.to_vec(),
        other => {
            return Err(Error::conversion_failed(
                "dictionary",
                ":bytecode",
                format!("'data' must be a block, found :{}", other.type_name()),
            ));
        }
    };
    let code_block = match code {
        ArturoVal::Block(b) => b,
        other => {
            return Err(Error::conversion_failed(
                "dictionary",
                ":bytecode",
                format!("'code' must be a block, found :{}", other.type_name()),
            ));
        }
    };

    let mut instructions = Vec::with_capacity(code_block.len());
    for item in code_block.items().iter() {
        match item.exact_i64() {
            Some(b) if (0..=255).contains(&b) => instructions.push(b as u8),
            _ => {
                return Err(Error::conversion_failed(
                    "dictionary",
                    ":bytecode",
                    format!("invalid opcode byte: {}", item),
                ));
            }
        }
    }

    Ok(Translation {
        constants,
        instructions,
    })
}

// ============================================================================
// Disassembly
// ============================================================================

/// Render a translation as one instruction per line, for inspection and
/// tests.
pub fn disassemble(translation: &Translation) -> String {
    let code = &translation.instructions;
    let mut out = String::new();
    let mut ip = 0;
    while ip < code.len() {
        let byte = code[ip];
        let Some(op) = OpCode::from_byte(byte) else {
            out.push_str(&format!("{:04} ?? 0x{:02X}\n", ip, byte));
            ip += 1;
            continue;
        };
        out.push_str(&format!("{:04} {:?}", ip, op));
        ip += 1;
        match op.operand_width() {
            1 => {
                if let Some(operand) = code.get(ip) {
                    out.push_str(&format!(" {}", operand));
                    append_constant(&mut out, translation, *operand as u16);
                }
                ip += 1;
            }
            2 => {
                if let Some(operand) = read_u16(code, ip) {
                    out.push_str(&format!(" {}", operand));
                    if matches!(op, OpCode::PushX | OpCode::StoreX | OpCode::LoadX | OpCode::CallX)
                    {
                        append_constant(&mut out, translation, operand);
                    }
                }
                ip += 2;
            }
            _ => {
                if let Some(short) = op.short_operand() {
                    append_constant(&mut out, translation, short);
                }
            }
        }
        out.push('\n');
    }
    out
}

fn append_constant(out: &mut String, translation: &Translation, idx: u16) {
    if let Some(value) = translation.constants.get(idx as usize) {
        out.push_str(&format!(" ; {}", value));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_short_and_wide_encodings() {
        let mut e = Emitter::new();
        for i in 0..20 {
            e.emit_push_value(ArturoVal::string(format!("s{}", i))).unwrap();
        }
        let t = e.finish();
        // First fourteen pushes use the embedded form, the rest the
        // one-byte form.
        assert_eq!(t.instructions[0], PUSH_BASE);
        assert_eq!(t.instructions[13], PUSH_BASE + 13);
        assert_eq!(t.instructions[14], OpCode::Push as u8);
        assert_eq!(t.instructions[15], 14);
    }

    #[test]
    fn test_small_constant_opcodes() {
        let mut e = Emitter::new();
        e.emit_push_value(ArturoVal::Integer(-1)).unwrap();
        e.emit_push_value(ArturoVal::Integer(10)).unwrap();
        e.emit_push_value(ArturoVal::Floating(1.0)).unwrap();
        e.emit_push_value(ArturoVal::Logical(true)).unwrap();
        let t = e.finish();
        assert_eq!(
            t.instructions,
            vec![
                OpCode::ConstIM1 as u8,
                OpCode::ConstI10 as u8,
                OpCode::ConstF1 as u8,
                OpCode::ConstTrue as u8,
                OpCode::End as u8,
            ]
        );
        assert!(t.constants.is_empty());
    }

    #[test]
    fn test_jump_patching() {
        let mut e = Emitter::new();
        let jump = e.emit_jump(OpCode::JmpIfNotX);
        e.emit_push_value(ArturoVal::Integer(5)).unwrap();
        e.patch_jump(jump);
        let t = e.finish();
        // Offset skips exactly the one-byte small-constant push.
        assert_eq!(read_u16(&t.instructions, jump), Some(1));
    }

    #[test]
    fn test_exchange_round_trip() {
        let mut e = Emitter::new();
        e.emit_push_value(ArturoVal::string("hello")).unwrap();
        e.emit_call("print").unwrap();
        let t = e.finish();

        let dict_val = translation_to_dict(&t);
        let ArturoVal::Dictionary(dict) = dict_val else {
            panic!("expected dictionary");
        };
        let back = translation_from_dict(&dict).unwrap();
        assert_eq!(back, t);
    }

    #[test]
    fn test_disassembly_mentions_constants() {
        let mut e = Emitter::new();
        e.emit_push_value(ArturoVal::string("hi")).unwrap();
        e.emit_call("print").unwrap();
        let t = e.finish();
        let text = disassemble(&t);
        assert!(text.contains("Push0"));
        assert!(text.contains("print"));
        assert!(text.contains("End"));
    }
}
