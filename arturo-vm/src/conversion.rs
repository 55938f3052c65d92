// arturo-vm - Bytecode translator and virtual machine for the Arturo programming language
// Copyright (c) 2026 The Arturo Project Contributors. MIT licensed.

//! The conversion engine behind `to`.
//!
//! `convert` is total over the enumerated matrix: pairs without a rule
//! raise `CannotConvert`, rules whose input fails validation raise
//! `ConversionFailed`. Conversions that need execution (blocks into
//! dictionaries, objects or bytecode) call back into the VM.

use std::rc::Rc;

use arturo_core::{Error, Result};
use arturo_parser::{
    ArturoBlock, ArturoRegex, ArturoVal, Color, IndexMap, Parser, RangeVal, TypeVal, ValueKind,
    VersionVal,
};
use chrono::{DateTime, NaiveDate, NaiveDateTime, TimeZone, Utc};
use num_complex::Complex64;

use crate::builtins::Attrs;
use crate::translation::translation_from_dict;
use crate::vm::Vm;

/// Convert a value to the given target type.
pub fn convert(
    vm: &mut Vm,
    value: &ArturoVal,
    target: &TypeVal,
    attrs: &Attrs,
) -> Result<ArturoVal> {
    match target {
        TypeVal::User(name) => construct_object(vm, name, value),
        TypeVal::Builtin(kind) => convert_builtin(vm, value, *kind, attrs),
    }
}

fn cannot(value: &ArturoVal, target: ValueKind) -> Error {
    Error::cannot_convert(value.type_name(), format!(":{}", target.name()))
}

fn failed(value: &ArturoVal, target: ValueKind, message: impl Into<String>) -> Error {
    Error::conversion_failed(value.type_name(), format!(":{}", target.name()), message)
}

fn convert_builtin(
    vm: &mut Vm,
    value: &ArturoVal,
    target: ValueKind,
    attrs: &Attrs,
) -> Result<ArturoVal> {
    // Identity conversions are free.
    if value.kind() == target {
        return Ok(value.clone());
    }

    match target {
        ValueKind::String => to_string_kind(vm, value),
        ValueKind::Logical => to_logical(value),
        ValueKind::Integer => to_integer(value),
        ValueKind::Floating => to_floating(value),
        ValueKind::Rational => to_rational(value),
        ValueKind::Complex => to_complex(value),
        ValueKind::Char => to_char(value),
        ValueKind::Word => retag_text(value, target),
        ValueKind::Literal => retag_text(value, target),
        ValueKind::Label => retag_text(value, target),
        ValueKind::Attribute => retag_text(value, target),
        ValueKind::Type => to_type(value),
        ValueKind::Version => to_version(value),
        ValueKind::Color => to_color(value, attrs),
        ValueKind::Regex => to_regex(value),
        ValueKind::Date => to_date(value, attrs),
        ValueKind::Block => to_block(value),
        ValueKind::Inline => to_inline(value),
        ValueKind::Range => to_range(value),
        ValueKind::Dictionary => to_dictionary(vm, value),
        ValueKind::Binary => to_binary(value),
        ValueKind::Bytecode => to_bytecode(vm, value),
        ValueKind::Null => Ok(ArturoVal::Null),
        _ => Err(cannot(value, target)),
    }
}

// ============================================================================
// Scalar targets
// ============================================================================

fn to_string_kind(vm: &mut Vm, value: &ArturoVal) -> Result<ArturoVal> {
    // Blocks render as round-trippable source, everything else through its
    // printable form.
    match value {
        ArturoVal::Block(_) | ArturoVal::Inline(_) => Ok(ArturoVal::string(
            arturo_parser::codify(value, false, false, false),
        )),
        other => {
            let text = vm.printable(other)?;
            Ok(ArturoVal::string(text))
        }
    }
}

fn to_logical(value: &ArturoVal) -> Result<ArturoVal> {
    let result = match value {
        ArturoVal::Null | ArturoVal::Nothing => false,
        ArturoVal::Integer(i) => *i != 0,
        ArturoVal::BigInteger(_) => true,
        ArturoVal::Floating(f) => *f != 0.0,
        ArturoVal::String(s) => match s.trim() {
            "true" => true,
            "false" => false,
            other => {
                return Err(failed(
                    value,
                    ValueKind::Logical,
                    format!("not a logical: {:?}", other),
                ));
            }
        },
        _ => return Err(cannot(value, ValueKind::Logical)),
    };
    Ok(ArturoVal::Logical(result))
}

fn to_integer(value: &ArturoVal) -> Result<ArturoVal> {
    let result = match value {
        ArturoVal::Null => ArturoVal::Integer(0),
        ArturoVal::Logical(b) => ArturoVal::Integer(*b as i64),
        ArturoVal::Floating(f) => {
            if f.is_finite() {
                ArturoVal::Integer(*f as i64)
            } else {
                return Err(failed(value, ValueKind::Integer, "not a finite number"));
            }
        }
        ArturoVal::Rational(r) => ArturoVal::Integer(*r.trunc().numer()),
        ArturoVal::BigRational(r) => ArturoVal::big_integer(r.trunc().to_integer()),
        ArturoVal::Char(c) => ArturoVal::Integer(*c as i64),
        ArturoVal::String(s) => {
            let trimmed = s.trim();
            match trimmed.parse::<i64>() {
                Ok(i) => ArturoVal::Integer(i),
                Err(_) => match trimmed.parse::<num_bigint::BigInt>() {
                    Ok(b) => ArturoVal::big_integer(b),
                    Err(_) => {
                        return Err(failed(
                            value,
                            ValueKind::Integer,
                            format!("not a numeric string: {:?}", trimmed),
                        ));
                    }
                },
            }
        }
        ArturoVal::Date(d) => ArturoVal::Integer(d.timestamp()),
        _ => return Err(cannot(value, ValueKind::Integer)),
    };
    Ok(result)
}

fn to_floating(value: &ArturoVal) -> Result<ArturoVal> {
    let result = match value {
        ArturoVal::Null => 0.0,
        ArturoVal::Logical(b) => *b as i64 as f64,
        ArturoVal::Integer(_)
        | ArturoVal::BigInteger(_)
        | ArturoVal::Rational(_)
        | ArturoVal::BigRational(_) => value
            .as_f64()
            .ok_or_else(|| failed(value, ValueKind::Floating, "out of range"))?,
        ArturoVal::String(s) => s
            .trim()
            .parse::<f64>()
            .map_err(|_| {
                failed(
                    value,
                    ValueKind::Floating,
                    format!("not a numeric string: {:?}", s.trim()),
                )
            })?,
        _ => return Err(cannot(value, ValueKind::Floating)),
    };
    Ok(ArturoVal::Floating(result))
}

fn to_rational(value: &ArturoVal) -> Result<ArturoVal> {
    match value {
        ArturoVal::Integer(i) => Ok(ArturoVal::rational(*i, 1)),
        ArturoVal::BigInteger(b) => Ok(ArturoVal::big_rational(
            num_rational::BigRational::from_integer((**b).clone()),
        )),
        ArturoVal::Floating(f) => num_rational::BigRational::from_float(*f)
            .map(ArturoVal::big_rational)
            .ok_or_else(|| failed(value, ValueKind::Rational, "not a finite number")),
        ArturoVal::Block(b) => {
            let items = b.to_vec();
            if items.len() != 2 {
                return Err(failed(value, ValueKind::Rational, "expected two elements"));
            }
            let numer = items[0]
                .exact_i64()
                .ok_or_else(|| failed(value, ValueKind::Rational, "non-integer numerator"))?;
            let denom = items[1]
                .exact_i64()
                .ok_or_else(|| failed(value, ValueKind::Rational, "non-integer denominator"))?;
            if denom == 0 {
                return Err(Error::division_by_zero());
            }
            Ok(ArturoVal::rational(numer, denom))
        }
        _ => Err(cannot(value, ValueKind::Rational)),
    }
}

fn to_complex(value: &ArturoVal) -> Result<ArturoVal> {
    match value {
        _ if value.is_numeric() => {
            let re = value
                .as_f64()
                .ok_or_else(|| failed(value, ValueKind::Complex, "out of range"))?;
            Ok(ArturoVal::Complex(Complex64::new(re, 0.0)))
        }
        ArturoVal::Block(b) => {
            let items = b.to_vec();
            if items.len() != 2 {
                return Err(failed(value, ValueKind::Complex, "expected two elements"));
            }
            let re = items[0]
                .as_f64()
                .ok_or_else(|| failed(value, ValueKind::Complex, "non-numeric real part"))?;
            let im = items[1]
                .as_f64()
                .ok_or_else(|| failed(value, ValueKind::Complex, "non-numeric imaginary part"))?;
            Ok(ArturoVal::Complex(Complex64::new(re, im)))
        }
        _ => Err(cannot(value, ValueKind::Complex)),
    }
}

fn to_char(value: &ArturoVal) -> Result<ArturoVal> {
    match value {
        ArturoVal::Integer(i) => u32::try_from(*i)
            .ok()
            .and_then(char::from_u32)
            .map(ArturoVal::Char)
            .ok_or_else(|| failed(value, ValueKind::Char, "not a Unicode code point")),
        ArturoVal::String(s) => {
            let mut chars = s.chars();
            match (chars.next(), chars.next()) {
                (Some(c), None) => Ok(ArturoVal::Char(c)),
                _ => Err(failed(value, ValueKind::Char, "expected a single character")),
            }
        }
        _ => Err(cannot(value, ValueKind::Char)),
    }
}

fn retag_text(value: &ArturoVal, target: ValueKind) -> Result<ArturoVal> {
    let text = match value {
        ArturoVal::String(s)
        | ArturoVal::Word(s)
        | ArturoVal::Literal(s)
        | ArturoVal::Label(s)
        | ArturoVal::Attribute(s) => s.clone(),
        ArturoVal::Type(t) => Rc::from(t.name()),
        _ => return Err(cannot(value, target)),
    };
    Ok(match target {
        ValueKind::Word => ArturoVal::Word(text),
        ValueKind::Literal => ArturoVal::Literal(text),
        ValueKind::Label => ArturoVal::Label(text),
        ValueKind::Attribute => ArturoVal::Attribute(text),
        _ => unreachable!("retag targets are word-like"),
    })
}

fn to_type(value: &ArturoVal) -> Result<ArturoVal> {
    match value {
        ArturoVal::String(s) | ArturoVal::Word(s) | ArturoVal::Literal(s) => {
            Ok(ArturoVal::Type(TypeVal::from_name(s)))
        }
        _ => Err(cannot(value, ValueKind::Type)),
    }
}

fn to_version(value: &ArturoVal) -> Result<ArturoVal> {
    match value {
        ArturoVal::String(s) => VersionVal::parse(s.trim())
            .map(|v| ArturoVal::Version(Rc::new(v)))
            .ok_or_else(|| {
                failed(value, ValueKind::Version, format!("not a version: {:?}", s))
            }),
        _ => Err(cannot(value, ValueKind::Version)),
    }
}

fn to_regex(value: &ArturoVal) -> Result<ArturoVal> {
    match value {
        ArturoVal::String(s) => ArturoRegex::new(s)
            .map(ArturoVal::Regex)
            .map_err(|e| failed(value, ValueKind::Regex, e.to_string())),
        _ => Err(cannot(value, ValueKind::Regex)),
    }
}

// ============================================================================
// Colors
// ============================================================================

fn to_color(value: &ArturoVal, attrs: &Attrs) -> Result<ArturoVal> {
    match value {
        ArturoVal::String(s) => {
            let hex = s.trim().trim_start_matches('#');
            Color::from_hex(hex)
                .map(ArturoVal::Color)
                .ok_or_else(|| failed(value, ValueKind::Color, format!("not a color: {:?}", s)))
        }
        ArturoVal::Block(b) => {
            let items = b.to_vec();
            if items.len() != 3 && items.len() != 4 {
                return Err(failed(
                    value,
                    ValueKind::Color,
                    "expected three or four components",
                ));
            }
            let nums: Vec<f64> = items
                .iter()
                .map(|v| v.as_f64())
                .collect::<Option<Vec<f64>>>()
                .ok_or_else(|| failed(value, ValueKind::Color, "non-numeric component"))?;

            let truthy = |name: &str| attrs.get(name).map(|v| v.is_truthy()).unwrap_or(false);
            let color = if truthy("hsl") {
                Color::from_hsl(nums[0], nums[1], nums[2])
            } else if truthy("hsv") {
                Color::from_hsv(nums[0], nums[1], nums[2])
            } else {
                let chan = |x: f64| x.round().clamp(0.0, 255.0) as u8;
                if nums.len() == 4 {
                    Color::rgba(chan(nums[0]), chan(nums[1]), chan(nums[2]), chan(nums[3]))
                } else {
                    Color::rgb(chan(nums[0]), chan(nums[1]), chan(nums[2]))
                }
            };
            Ok(ArturoVal::Color(color))
        }
        _ => Err(cannot(value, ValueKind::Color)),
    }
}

// ============================================================================
// Dates
// ============================================================================

fn to_date(value: &ArturoVal, attrs: &Attrs) -> Result<ArturoVal> {
    match value {
        ArturoVal::Integer(secs) => Utc
            .timestamp_opt(*secs, 0)
            .single()
            .map(ArturoVal::Date)
            .ok_or_else(|| failed(value, ValueKind::Date, "timestamp out of range")),
        ArturoVal::String(s) => {
            let text = s.trim();
            let format = attrs.get("format").and_then(|v| v.text().map(String::from));
            parse_date(text, format.as_deref())
                .map(ArturoVal::Date)
                .ok_or_else(|| failed(value, ValueKind::Date, format!("not a date: {:?}", text)))
        }
        _ => Err(cannot(value, ValueKind::Date)),
    }
}

fn parse_date(text: &str, format: Option<&str>) -> Option<DateTime<Utc>> {
    if let Some(fmt) = format {
        if let Ok(naive) = NaiveDateTime::parse_from_str(text, fmt) {
            return Some(Utc.from_utc_datetime(&naive));
        }
        if let Ok(date) = NaiveDate::parse_from_str(text, fmt) {
            return Some(Utc.from_utc_datetime(&date.and_hms_opt(0, 0, 0)?));
        }
        return None;
    }
    if let Ok(parsed) = DateTime::parse_from_rfc3339(text) {
        return Some(parsed.with_timezone(&Utc));
    }
    if let Ok(naive) = NaiveDateTime::parse_from_str(text, "%Y-%m-%dT%H:%M:%S") {
        return Some(Utc.from_utc_datetime(&naive));
    }
    if let Ok(date) = NaiveDate::parse_from_str(text, "%Y-%m-%d") {
        return Some(Utc.from_utc_datetime(&date.and_hms_opt(0, 0, 0)?));
    }
    None
}

// ============================================================================
// Containers
// ============================================================================

fn to_block(value: &ArturoVal) -> Result<ArturoVal> {
    match value {
        ArturoVal::Inline(b) => Ok(ArturoVal::Block(ArturoBlock::new(b.to_vec()))),
        // A string reparses as source, yielding its root block.
        ArturoVal::String(s) => {
            let block = Parser::parse_str(s)
                .map_err(|e| failed(value, ValueKind::Block, e.to_string()))?;
            Ok(ArturoVal::Block(block))
        }
        ArturoVal::Range(r) => {
            if r.infinite {
                return Err(failed(value, ValueKind::Block, "range is infinite"));
            }
            Ok(ArturoVal::block(r.iter().collect()))
        }
        ArturoVal::Dictionary(d) => {
            let mut items = Vec::with_capacity(d.len() * 2);
            for (k, v) in d.borrow().iter() {
                items.push(ArturoVal::string(k));
                items.push(v.clone());
            }
            Ok(ArturoVal::block(items))
        }
        ArturoVal::Binary(bytes) => Ok(ArturoVal::block(
            bytes.iter().map(|b| ArturoVal::Integer(*b as i64)).collect(),
        )),
        ArturoVal::Color(c) => Ok(ArturoVal::block(vec![
            ArturoVal::Integer(c.r as i64),
            ArturoVal::Integer(c.g as i64),
            ArturoVal::Integer(c.b as i64),
        ])),
        other => Ok(ArturoVal::block(vec![other.clone()])),
    }
}

fn to_inline(value: &ArturoVal) -> Result<ArturoVal> {
    match value {
        ArturoVal::Block(b) => Ok(ArturoVal::Inline(ArturoBlock::new(b.to_vec()))),
        _ => Err(cannot(value, ValueKind::Inline)),
    }
}

fn to_range(value: &ArturoVal) -> Result<ArturoVal> {
    match value {
        ArturoVal::Block(b) => {
            let items = b.to_vec();
            if items.len() != 2 {
                return Err(failed(value, ValueKind::Range, "expected two bounds"));
            }
            let start = items[0]
                .exact_i64()
                .ok_or_else(|| failed(value, ValueKind::Range, "non-integer bound"))?;
            let stop = items[1]
                .exact_i64()
                .ok_or_else(|| failed(value, ValueKind::Range, "non-integer bound"))?;
            Ok(ArturoVal::Range(Rc::new(RangeVal::new(start, stop, 1))))
        }
        _ => Err(cannot(value, ValueKind::Range)),
    }
}

fn to_dictionary(vm: &mut Vm, value: &ArturoVal) -> Result<ArturoVal> {
    match value {
        // Execute unscoped; definitions and paired leftovers become entries.
        ArturoVal::Block(b) => {
            let map = vm.exec_dictionary_block(b)?;
            Ok(ArturoVal::dictionary(map))
        }
        // The exchange form: bytecode serializes to its data/code pair.
        ArturoVal::Bytecode(t) => Ok(crate::translation::translation_to_dict(t)),
        ArturoVal::Object(o) => {
            let mut map = IndexMap::new();
            for (k, v) in o.fields().iter() {
                map.insert(k.clone(), v.clone());
            }
            Ok(ArturoVal::dictionary(map))
        }
        _ => Err(cannot(value, ValueKind::Dictionary)),
    }
}

fn to_binary(value: &ArturoVal) -> Result<ArturoVal> {
    match value {
        ArturoVal::String(s) => Ok(ArturoVal::Binary(Rc::new(s.as_bytes().to_vec()))),
        ArturoVal::Integer(i) => {
            let mut bytes: Vec<u8> = i.to_be_bytes().into_iter().skip_while(|b| *b == 0).collect();
            if bytes.is_empty() {
                bytes.push(0);
            }
            Ok(ArturoVal::Binary(Rc::new(bytes)))
        }
        ArturoVal::Block(b) => {
            let mut bytes = Vec::with_capacity(b.len());
            for item in b.items().iter() {
                match item.exact_i64() {
                    Some(v) if (0..=255).contains(&v) => bytes.push(v as u8),
                    _ => {
                        return Err(failed(
                            value,
                            ValueKind::Binary,
                            format!("not a byte: {}", item),
                        ));
                    }
                }
            }
            Ok(ArturoVal::Binary(Rc::new(bytes)))
        }
        _ => Err(cannot(value, ValueKind::Binary)),
    }
}

fn to_bytecode(vm: &mut Vm, value: &ArturoVal) -> Result<ArturoVal> {
    match value {
        ArturoVal::Block(b) => {
            let t = vm.translate_block_cached(b)?;
            Ok(ArturoVal::Bytecode(t))
        }
        ArturoVal::Dictionary(d) => {
            let t = translation_from_dict(d)?;
            Ok(ArturoVal::Bytecode(Rc::new(t)))
        }
        _ => Err(cannot(value, ValueKind::Bytecode)),
    }
}

// ============================================================================
// User-type construction
// ============================================================================

/// `to :type [args]`: execute the argument block, pair values with the
/// prototype's fields, copy the methods in, and run `doInit` when defined.
fn construct_object(vm: &mut Vm, type_name: &str, value: &ArturoVal) -> Result<ArturoVal> {
    let proto_rc = vm
        .types
        .get(type_name)
        .ok_or_else(|| Error::symbol_not_found(format!(":{}", type_name)))?;

    let values: Vec<ArturoVal> = match value {
        ArturoVal::Block(_) | ArturoVal::Inline(_) => vm.exec_collect(value)?,
        other => vec![other.clone()],
    };

    let (fields, methods, do_init) = {
        let proto = proto_rc.borrow();
        (
            proto.fields.clone(),
            proto.methods.clone(),
            proto.do_init.clone(),
        )
    };

    if values.len() < fields.len() {
        return Err(Error::arity_mismatch(
            format!(":{}", type_name),
            fields.len(),
            values.len(),
        ));
    }

    let mut field_map = IndexMap::new();
    for (i, field) in fields.iter().enumerate() {
        field_map.insert(field.to_string(), values[i].clone());
    }
    for (name, method) in methods {
        field_map.insert(name, method);
    }

    let object = arturo_parser::ArturoObject::new(Rc::from(type_name), field_map);
    let object_val = ArturoVal::Object(object);

    if let Some(init) = do_init {
        let init_arity = match &init {
            ArturoVal::Function(f) => f.arity(),
            _ => 0,
        };
        // `this` plus the constructor arguments the init declares.
        let mut init_args = Vec::with_capacity(init_arity);
        init_args.push(object_val.clone());
        for i in 0..init_arity.saturating_sub(1) {
            init_args.push(values.get(i).cloned().unwrap_or(ArturoVal::Null));
        }
        vm.call_value(&init, init_args, "init")?;
    }

    Ok(object_val)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn convert_simple(value: ArturoVal, target: ValueKind) -> Result<ArturoVal> {
        let mut vm = Vm::new();
        convert(&mut vm, &value, &TypeVal::Builtin(target), &Attrs::new())
    }

    #[test]
    fn test_string_to_integer() {
        assert_eq!(
            convert_simple(ArturoVal::string("2020"), ValueKind::Integer).unwrap(),
            ArturoVal::Integer(2020)
        );
        let err = convert_simple(ArturoVal::string("nope"), ValueKind::Integer).unwrap_err();
        assert!(matches!(
            err.kind,
            arturo_core::ErrorKind::ConversionFailed { .. }
        ));
    }

    #[test]
    fn test_unreachable_pair_cannot_convert() {
        let err = convert_simple(ArturoVal::Logical(true), ValueKind::Socket).unwrap_err();
        assert!(matches!(
            err.kind,
            arturo_core::ErrorKind::CannotConvert { .. }
        ));
    }

    #[test]
    fn test_null_rules() {
        assert_eq!(
            convert_simple(ArturoVal::Null, ValueKind::Logical).unwrap(),
            ArturoVal::Logical(false)
        );
        assert_eq!(
            convert_simple(ArturoVal::Null, ValueKind::Integer).unwrap(),
            ArturoVal::Integer(0)
        );
    }

    #[test]
    fn test_integer_char_round_trip() {
        let c = convert_simple(ArturoVal::Integer(945), ValueKind::Char).unwrap();
        assert_eq!(c, ArturoVal::Char('α'));
        let back = convert_simple(c, ValueKind::Integer).unwrap();
        assert_eq!(back, ArturoVal::Integer(945));
    }

    #[test]
    fn test_string_to_block_reparses() {
        let b = convert_simple(ArturoVal::string("print 2"), ValueKind::Block).unwrap();
        match b {
            ArturoVal::Block(block) => {
                assert_eq!(block.len(), 2);
                assert_eq!(block.get(0).unwrap(), ArturoVal::word("print"));
            }
            other => panic!("expected block, got {:?}", other),
        }
    }

    #[test]
    fn test_block_to_color_spaces() {
        let rgb = convert_simple(
            ArturoVal::block(vec![
                ArturoVal::Integer(255),
                ArturoVal::Integer(0),
                ArturoVal::Integer(0),
            ]),
            ValueKind::Color,
        )
        .unwrap();
        assert_eq!(rgb, ArturoVal::Color(Color::rgb(255, 0, 0)));

        let mut vm = Vm::new();
        let mut attrs = Attrs::new();
        attrs.insert("hsl".to_string(), ArturoVal::Logical(true));
        let hsl = convert(
            &mut vm,
            &ArturoVal::block(vec![
                ArturoVal::Integer(0),
                ArturoVal::Floating(1.0),
                ArturoVal::Floating(0.5),
            ]),
            &TypeVal::Builtin(ValueKind::Color),
            &attrs,
        )
        .unwrap();
        assert_eq!(hsl, ArturoVal::Color(Color::rgb(255, 0, 0)));
    }

    #[test]
    fn test_date_integer_round_trip() {
        let date = convert_simple(ArturoVal::string("2020-06-01"), ValueKind::Date).unwrap();
        let secs = convert_simple(date.clone(), ValueKind::Integer).unwrap();
        let back = convert_simple(secs, ValueKind::Date).unwrap();
        assert_eq!(date, back);
    }
}
