// arturo-vm - Bytecode translator and virtual machine for the Arturo programming language
// Copyright (c) 2026 The Arturo Project Contributors. MIT licensed.

//! Arithmetic over the numeric tower.
//!
//! Promotion ladder: integer < rational < floating < complex. Machine-word
//! integers that overflow promote to big integers instead of erroring, and
//! exact kinds stay exact as long as both operands are exact.

use arturo_core::{Error, Result};
use arturo_parser::ArturoVal;
use num_bigint::BigInt;
use num_complex::Complex64;
use num_rational::BigRational;
use num_traits::{Signed, ToPrimitive, Zero};

use crate::builtins::{builtin, numeric, Attrs, Registry};
use crate::opcode::OpCode;
use crate::vm::Vm;

/// Both operands promoted to their common kind.
enum NumPair {
    Int(i64, i64),
    Big(BigInt, BigInt),
    Rat(BigRational, BigRational),
    Float(f64, f64),
    Cpx(Complex64, Complex64),
}

fn as_big(v: &ArturoVal) -> Option<BigInt> {
    match v {
        ArturoVal::Integer(i) => Some(BigInt::from(*i)),
        ArturoVal::BigInteger(b) => Some((**b).clone()),
        _ => None,
    }
}

fn as_rat(v: &ArturoVal) -> Option<BigRational> {
    match v {
        ArturoVal::Integer(i) => Some(BigRational::from_integer(BigInt::from(*i))),
        ArturoVal::BigInteger(b) => Some(BigRational::from_integer((**b).clone())),
        ArturoVal::Rational(r) => Some(BigRational::new(
            BigInt::from(*r.numer()),
            BigInt::from(*r.denom()),
        )),
        ArturoVal::BigRational(r) => Some((**r).clone()),
        _ => None,
    }
}

fn as_complex(v: &ArturoVal) -> Option<Complex64> {
    match v {
        ArturoVal::Complex(c) => Some(*c),
        other => other.as_f64().map(|f| Complex64::new(f, 0.0)),
    }
}

fn promote(a: &ArturoVal, b: &ArturoVal) -> Result<NumPair> {
    use ArturoVal::*;
    let pair = match (a, b) {
        (Complex(_), _) | (_, Complex(_)) => NumPair::Cpx(
            as_complex(a).ok_or_else(|| non_numeric(a))?,
            as_complex(b).ok_or_else(|| non_numeric(b))?,
        ),
        (Floating(_), _) | (_, Floating(_)) => NumPair::Float(
            a.as_f64().ok_or_else(|| non_numeric(a))?,
            b.as_f64().ok_or_else(|| non_numeric(b))?,
        ),
        (Rational(_) | BigRational(_), _) | (_, Rational(_) | BigRational(_)) => NumPair::Rat(
            as_rat(a).ok_or_else(|| non_numeric(a))?,
            as_rat(b).ok_or_else(|| non_numeric(b))?,
        ),
        (BigInteger(_), _) | (_, BigInteger(_)) => NumPair::Big(
            as_big(a).ok_or_else(|| non_numeric(a))?,
            as_big(b).ok_or_else(|| non_numeric(b))?,
        ),
        (Integer(x), Integer(y)) => NumPair::Int(*x, *y),
        _ => return Err(non_numeric(if a.is_numeric() { b } else { a })),
    };
    Ok(pair)
}

fn non_numeric(v: &ArturoVal) -> Error {
    Error::type_mismatch("arithmetic", "value", ":integer :floating :rational :complex", v.type_name())
}

pub fn num_add(a: &ArturoVal, b: &ArturoVal) -> Result<ArturoVal> {
    Ok(match promote(a, b)? {
        NumPair::Int(x, y) => match x.checked_add(y) {
            Some(v) => ArturoVal::Integer(v),
            None => ArturoVal::big_integer(BigInt::from(x) + BigInt::from(y)),
        },
        NumPair::Big(x, y) => ArturoVal::big_integer(x + y),
        NumPair::Rat(x, y) => ArturoVal::big_rational(x + y),
        NumPair::Float(x, y) => ArturoVal::Floating(x + y),
        NumPair::Cpx(x, y) => ArturoVal::Complex(x + y),
    })
}

pub fn num_sub(a: &ArturoVal, b: &ArturoVal) -> Result<ArturoVal> {
    Ok(match promote(a, b)? {
        NumPair::Int(x, y) => match x.checked_sub(y) {
            Some(v) => ArturoVal::Integer(v),
            None => ArturoVal::big_integer(BigInt::from(x) - BigInt::from(y)),
        },
        NumPair::Big(x, y) => ArturoVal::big_integer(x - y),
        NumPair::Rat(x, y) => ArturoVal::big_rational(x - y),
        NumPair::Float(x, y) => ArturoVal::Floating(x - y),
        NumPair::Cpx(x, y) => ArturoVal::Complex(x - y),
    })
}

pub fn num_mul(a: &ArturoVal, b: &ArturoVal) -> Result<ArturoVal> {
    Ok(match promote(a, b)? {
        NumPair::Int(x, y) => match x.checked_mul(y) {
            Some(v) => ArturoVal::Integer(v),
            None => ArturoVal::big_integer(BigInt::from(x) * BigInt::from(y)),
        },
        NumPair::Big(x, y) => ArturoVal::big_integer(x * y),
        NumPair::Rat(x, y) => ArturoVal::big_rational(x * y),
        NumPair::Float(x, y) => ArturoVal::Floating(x * y),
        NumPair::Cpx(x, y) => ArturoVal::Complex(x * y),
    })
}

/// Integer division on exact integers, exact division on rationals.
pub fn num_div(a: &ArturoVal, b: &ArturoVal) -> Result<ArturoVal> {
    Ok(match promote(a, b)? {
        NumPair::Int(_, 0) => return Err(Error::division_by_zero()),
        NumPair::Int(x, y) => ArturoVal::Integer(x.wrapping_div(y)),
        NumPair::Big(x, y) => {
            if y.is_zero() {
                return Err(Error::division_by_zero());
            }
            ArturoVal::big_integer(x / y)
        }
        NumPair::Rat(x, y) => {
            if y.is_zero() {
                return Err(Error::division_by_zero());
            }
            ArturoVal::big_rational(x / y)
        }
        NumPair::Float(x, y) => ArturoVal::Floating(x / y),
        NumPair::Cpx(x, y) => ArturoVal::Complex(x / y),
    })
}

/// Floating division regardless of operand kinds.
pub fn num_fdiv(a: &ArturoVal, b: &ArturoVal) -> Result<ArturoVal> {
    match promote(a, b)? {
        NumPair::Cpx(x, y) => Ok(ArturoVal::Complex(x / y)),
        _ => {
            let x = a.as_f64().ok_or_else(|| non_numeric(a))?;
            let y = b.as_f64().ok_or_else(|| non_numeric(b))?;
            Ok(ArturoVal::Floating(x / y))
        }
    }
}

pub fn num_mod(a: &ArturoVal, b: &ArturoVal) -> Result<ArturoVal> {
    Ok(match promote(a, b)? {
        NumPair::Int(_, 0) => return Err(Error::division_by_zero()),
        NumPair::Int(x, y) => ArturoVal::Integer(x.wrapping_rem(y)),
        NumPair::Big(x, y) => {
            if y.is_zero() {
                return Err(Error::division_by_zero());
            }
            ArturoVal::big_integer(x % y)
        }
        NumPair::Float(x, y) => ArturoVal::Floating(x % y),
        _ => {
            return Err(Error::type_mismatch(
                "mod",
                "value",
                ":integer :floating",
                a.type_name(),
            ));
        }
    })
}

pub fn num_pow(a: &ArturoVal, b: &ArturoVal) -> Result<ArturoVal> {
    Ok(match promote(a, b)? {
        NumPair::Int(x, y) => {
            if y >= 0 {
                match y.to_u32().and_then(|e| x.checked_pow(e)) {
                    Some(v) => ArturoVal::Integer(v),
                    None => {
                        let exp = y.to_u32().unwrap_or(u32::MAX);
                        ArturoVal::big_integer(BigInt::from(x).pow(exp))
                    }
                }
            } else {
                ArturoVal::Floating((x as f64).powf(y as f64))
            }
        }
        NumPair::Big(x, y) => match y.to_u32() {
            Some(exp) => ArturoVal::big_integer(x.pow(exp)),
            None => ArturoVal::Floating(f64::INFINITY),
        },
        NumPair::Rat(x, y) => match y.to_i32() {
            Some(exp) if exp >= 0 => {
                let mut result = BigRational::from_integer(BigInt::from(1));
                for _ in 0..exp {
                    result *= x.clone();
                }
                ArturoVal::big_rational(result)
            }
            _ => ArturoVal::Floating(
                x.to_f64().unwrap_or(f64::NAN).powf(y.to_f64().unwrap_or(f64::NAN)),
            ),
        },
        NumPair::Float(x, y) => ArturoVal::Floating(x.powf(y)),
        NumPair::Cpx(x, y) => ArturoVal::Complex(x.powc(y)),
    })
}

pub fn num_neg(a: &ArturoVal) -> Result<ArturoVal> {
    Ok(match a {
        ArturoVal::Integer(i) => match i.checked_neg() {
            Some(v) => ArturoVal::Integer(v),
            None => ArturoVal::big_integer(-BigInt::from(*i)),
        },
        ArturoVal::BigInteger(b) => ArturoVal::big_integer(-(**b).clone()),
        ArturoVal::Floating(f) => ArturoVal::Floating(-f),
        ArturoVal::Rational(r) => ArturoVal::Rational(-*r),
        ArturoVal::BigRational(r) => ArturoVal::big_rational(-(**r).clone()),
        ArturoVal::Complex(c) => ArturoVal::Complex(-c),
        other => return Err(non_numeric(other)),
    })
}

/// Absolute value, shared with the number predicates module.
pub fn num_abs(a: &ArturoVal) -> Result<ArturoVal> {
    Ok(match a {
        ArturoVal::Integer(i) => match i.checked_abs() {
            Some(v) => ArturoVal::Integer(v),
            None => ArturoVal::big_integer(BigInt::from(*i).abs()),
        },
        ArturoVal::BigInteger(b) => ArturoVal::big_integer((**b).abs()),
        ArturoVal::Floating(f) => ArturoVal::Floating(f.abs()),
        ArturoVal::Rational(r) => ArturoVal::Rational(r.abs()),
        ArturoVal::BigRational(r) => ArturoVal::big_rational((**r).abs()),
        ArturoVal::Complex(c) => ArturoVal::Floating(c.norm()),
        other => return Err(non_numeric(other)),
    })
}

// ============================================================================
// Registered builtins
// ============================================================================

macro_rules! binary_builtin {
    ($fname:ident, $core:ident) => {
        fn $fname(vm: &mut Vm, args: &[ArturoVal], _attrs: &Attrs) -> Result<()> {
            let result = $core(&args[0], &args[1])?;
            vm.stack.push(result)
        }
    };
}

binary_builtin!(builtin_add, num_add);
binary_builtin!(builtin_sub, num_sub);
binary_builtin!(builtin_mul, num_mul);
binary_builtin!(builtin_div, num_div);
binary_builtin!(builtin_fdiv, num_fdiv);
binary_builtin!(builtin_mod, num_mod);
binary_builtin!(builtin_pow, num_pow);

fn builtin_neg(vm: &mut Vm, args: &[ArturoVal], _attrs: &Attrs) -> Result<()> {
    vm.stack.push(num_neg(&args[0])?)
}

fn builtin_inc(vm: &mut Vm, args: &[ArturoVal], _attrs: &Attrs) -> Result<()> {
    vm.stack.push(num_add(&args[0], &ArturoVal::Integer(1))?)
}

fn builtin_dec(vm: &mut Vm, args: &[ArturoVal], _attrs: &Attrs) -> Result<()> {
    vm.stack.push(num_sub(&args[0], &ArturoVal::Integer(1))?)
}

pub(crate) fn register(reg: &mut Registry) {
    reg.add(builtin(
        "add",
        "add two numbers",
        &[("value", numeric()), ("addend", numeric())],
        &[],
        numeric(),
        "add 2 3",
        Some(OpCode::Add),
        builtin_add,
    ));
    reg.add(builtin(
        "sub",
        "subtract the second number from the first",
        &[("value", numeric()), ("subtrahend", numeric())],
        &[],
        numeric(),
        "sub 5 3",
        Some(OpCode::Sub),
        builtin_sub,
    ));
    reg.add(builtin(
        "mul",
        "multiply two numbers",
        &[("value", numeric()), ("factor", numeric())],
        &[],
        numeric(),
        "mul 4 5",
        Some(OpCode::Mul),
        builtin_mul,
    ));
    reg.add(builtin(
        "div",
        "divide the first number by the second",
        &[("value", numeric()), ("divisor", numeric())],
        &[],
        numeric(),
        "div 7 2",
        Some(OpCode::Div),
        builtin_div,
    ));
    reg.add(builtin(
        "fdiv",
        "divide the first number by the second, as floating point",
        &[("value", numeric()), ("divisor", numeric())],
        &[],
        numeric(),
        "fdiv 7 2",
        Some(OpCode::Fdiv),
        builtin_fdiv,
    ));
    reg.add(builtin(
        "mod",
        "remainder of dividing the first number by the second",
        &[("value", numeric()), ("divisor", numeric())],
        &[],
        numeric(),
        "mod 7 2",
        Some(OpCode::Mod),
        builtin_mod,
    ));
    reg.add(builtin(
        "pow",
        "raise the first number to the given power",
        &[("value", numeric()), ("exponent", numeric())],
        &[],
        numeric(),
        "pow 2 10",
        Some(OpCode::Pow),
        builtin_pow,
    ));
    reg.add(builtin(
        "neg",
        "the additive inverse of a number",
        &[("value", numeric())],
        &[],
        numeric(),
        "neg 5",
        Some(OpCode::Neg),
        builtin_neg,
    ));
    reg.add(builtin(
        "inc",
        "a number increased by one",
        &[("value", numeric())],
        &[],
        numeric(),
        "inc 41",
        Some(OpCode::Inc),
        builtin_inc,
    ));
    reg.add(builtin(
        "dec",
        "a number decreased by one",
        &[("value", numeric())],
        &[],
        numeric(),
        "dec 43",
        Some(OpCode::Dec),
        builtin_dec,
    ));
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_integer_overflow_promotes() {
        let r = num_add(&ArturoVal::Integer(i64::MAX), &ArturoVal::Integer(1)).unwrap();
        assert!(matches!(r, ArturoVal::BigInteger(_)));
    }

    #[test]
    fn test_mixed_kind_promotion() {
        assert_eq!(
            num_add(&ArturoVal::Integer(1), &ArturoVal::Floating(0.5)).unwrap(),
            ArturoVal::Floating(1.5)
        );
        assert_eq!(
            num_add(&ArturoVal::rational(1, 2), &ArturoVal::rational(1, 2)).unwrap(),
            ArturoVal::Integer(1)
        );
    }

    #[test]
    fn test_division() {
        assert_eq!(
            num_div(&ArturoVal::Integer(7), &ArturoVal::Integer(2)).unwrap(),
            ArturoVal::Integer(3)
        );
        assert_eq!(
            num_fdiv(&ArturoVal::Integer(7), &ArturoVal::Integer(2)).unwrap(),
            ArturoVal::Floating(3.5)
        );
        assert!(num_div(&ArturoVal::Integer(1), &ArturoVal::Integer(0)).is_err());
    }

    #[test]
    fn test_pow() {
        assert_eq!(
            num_pow(&ArturoVal::Integer(2), &ArturoVal::Integer(10)).unwrap(),
            ArturoVal::Integer(1024)
        );
        let big = num_pow(&ArturoVal::Integer(2), &ArturoVal::Integer(100)).unwrap();
        assert!(matches!(big, ArturoVal::BigInteger(_)));
    }
}
