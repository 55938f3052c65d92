// arturo-parser - Value types for Arturo
// Copyright (c) 2026 The Arturo Project Contributors. MIT licensed.

//! Core value type for Arturo.
//!
//! `ArturoVal` is the central enum representing all Arturo values: everything
//! the parser produces, everything the VM pushes on its stack, and everything
//! user code can store in a symbol. Values with large payloads (blocks,
//! dictionaries, objects, functions) are shared by reference through `Rc`;
//! small values (integers, logicals, chars) are copied.

use std::cell::RefCell;
use std::cmp::Ordering;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::rc::Rc;

use chrono::{DateTime, TimeZone, Utc};
use indexmap::IndexMap;
use num_bigint::BigInt;
use num_complex::Complex64;
use num_rational::{BigRational, Rational64};
use num_traits::ToPrimitive;
use regex::Regex;

// ============================================================================
// Value Kinds
// ============================================================================

/// The tag of a value, without its payload.
///
/// `Any` never tags a concrete value; it only appears in kind sets used by
/// builtin declarations and per-parameter type constraints.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum ValueKind {
    Null = 0,
    Logical,
    Integer,
    Floating,
    Complex,
    Rational,
    Version,
    Type,
    Char,
    String,
    Word,
    Literal,
    Label,
    Attribute,
    AttributeLabel,
    Path,
    PathLabel,
    PathLiteral,
    Symbol,
    SymbolLiteral,
    Regex,
    Color,
    Date,
    Quantity,
    Unit,
    Binary,
    Inline,
    Block,
    Range,
    Dictionary,
    Object,
    Store,
    Function,
    Bytecode,
    Database,
    Socket,
    Nothing,
    Any,
}

impl ValueKind {
    /// The lowercase name used by `:type` literals and error messages.
    pub fn name(&self) -> &'static str {
        match self {
            ValueKind::Null => "null",
            ValueKind::Logical => "logical",
            ValueKind::Integer => "integer",
            ValueKind::Floating => "floating",
            ValueKind::Complex => "complex",
            ValueKind::Rational => "rational",
            ValueKind::Version => "version",
            ValueKind::Type => "type",
            ValueKind::Char => "char",
            ValueKind::String => "string",
            ValueKind::Word => "word",
            ValueKind::Literal => "literal",
            ValueKind::Label => "label",
            ValueKind::Attribute => "attribute",
            ValueKind::AttributeLabel => "attributeLabel",
            ValueKind::Path => "path",
            ValueKind::PathLabel => "pathLabel",
            ValueKind::PathLiteral => "pathLiteral",
            ValueKind::Symbol => "symbol",
            ValueKind::SymbolLiteral => "symbolLiteral",
            ValueKind::Regex => "regex",
            ValueKind::Color => "color",
            ValueKind::Date => "date",
            ValueKind::Quantity => "quantity",
            ValueKind::Unit => "unit",
            ValueKind::Binary => "binary",
            ValueKind::Inline => "inline",
            ValueKind::Block => "block",
            ValueKind::Range => "range",
            ValueKind::Dictionary => "dictionary",
            ValueKind::Object => "object",
            ValueKind::Store => "store",
            ValueKind::Function => "function",
            ValueKind::Bytecode => "bytecode",
            ValueKind::Database => "database",
            ValueKind::Socket => "socket",
            ValueKind::Nothing => "nothing",
            ValueKind::Any => "any",
        }
    }

    /// Every kind, in declaration order.
    pub fn all() -> &'static [ValueKind] {
        use ValueKind::*;
        &[
            Null, Logical, Integer, Floating, Complex, Rational, Version, Type, Char, String,
            Word, Literal, Label, Attribute, AttributeLabel, Path, PathLabel, PathLiteral, Symbol,
            SymbolLiteral, Regex, Color, Date, Quantity, Unit, Binary, Inline, Block, Range,
            Dictionary, Object, Store, Function, Bytecode, Database, Socket, Nothing, Any,
        ]
    }

    /// Resolve a kind from its lowercase name.
    pub fn from_name(name: &str) -> Option<ValueKind> {
        ValueKind::all().iter().copied().find(|k| k.name() == name)
    }
}

impl fmt::Display for ValueKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, ":{}", self.name())
    }
}

/// A set of value kinds, used for builtin parameter declarations and
/// function type constraints.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct KindSet(u64);

impl KindSet {
    /// The empty set.
    pub const NONE: KindSet = KindSet(0);

    /// The set matching every kind.
    pub const ANY: KindSet = KindSet(u64::MAX);

    /// A set with a single kind.
    pub const fn only(kind: ValueKind) -> KindSet {
        KindSet(1u64 << (kind as u64))
    }

    /// Build a set from a slice of kinds.
    pub fn of(kinds: &[ValueKind]) -> KindSet {
        let mut bits = 0u64;
        for k in kinds {
            bits |= 1u64 << (*k as u64);
        }
        KindSet(bits)
    }

    /// Union with another set.
    pub const fn or(self, other: KindSet) -> KindSet {
        KindSet(self.0 | other.0)
    }

    /// Whether the set accepts the given kind. `Any` membership accepts all.
    pub fn contains(&self, kind: ValueKind) -> bool {
        if self.0 & (1u64 << (ValueKind::Any as u64)) != 0 {
            return true;
        }
        self.0 & (1u64 << (kind as u64)) != 0
    }

    /// Human-readable listing of the accepted kinds.
    pub fn describe(&self) -> String {
        if self.0 == u64::MAX || self.contains(ValueKind::Any) {
            return ":any".to_string();
        }
        let mut parts = Vec::new();
        for kind in ValueKind::all() {
            if self.0 & (1u64 << (*kind as u64)) != 0 {
                parts.push(format!(":{}", kind.name()));
            }
        }
        parts.join(" ")
    }
}

// ============================================================================
// Operator Symbols
// ============================================================================

/// The closed set of operator glyphs the lexer recognizes.
///
/// Each glyph is an alias for a builtin: `+` for `add`, `..` for `range`,
/// `$` for `function`, and so on. The translator resolves the aliasing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ArturoSymbol {
    Plus,         // +
    Minus,        // -
    Asterisk,     // *
    Slash,        // /
    DoubleSlash,  // //
    Percent,      // %
    Caret,        // ^
    Equal,        // =
    NotEqual,     // <>
    LessThan,     // <
    GreaterThan,  // >
    LessEqual,    // =<
    GreaterEqual, // >=
    DotDot,       // ..
    ArrowRight,   // ->
    FatArrow,     // =>
    Pipe,         // |
    Ampersand,    // &
    Dollar,       // $
}

impl ArturoSymbol {
    /// Canonical source spelling of the glyph.
    pub fn as_str(&self) -> &'static str {
        match self {
            ArturoSymbol::Plus => "+",
            ArturoSymbol::Minus => "-",
            ArturoSymbol::Asterisk => "*",
            ArturoSymbol::Slash => "/",
            ArturoSymbol::DoubleSlash => "//",
            ArturoSymbol::Percent => "%",
            ArturoSymbol::Caret => "^",
            ArturoSymbol::Equal => "=",
            ArturoSymbol::NotEqual => "<>",
            ArturoSymbol::LessThan => "<",
            ArturoSymbol::GreaterThan => ">",
            ArturoSymbol::LessEqual => "=<",
            ArturoSymbol::GreaterEqual => ">=",
            ArturoSymbol::DotDot => "..",
            ArturoSymbol::ArrowRight => "->",
            ArturoSymbol::FatArrow => "=>",
            ArturoSymbol::Pipe => "|",
            ArturoSymbol::Ampersand => "&",
            ArturoSymbol::Dollar => "$",
        }
    }

    /// The builtin this glyph aliases, if it aliases one.
    pub fn aliased_builtin(&self) -> Option<&'static str> {
        match self {
            ArturoSymbol::Plus => Some("add"),
            ArturoSymbol::Minus => Some("sub"),
            ArturoSymbol::Asterisk => Some("mul"),
            ArturoSymbol::Slash => Some("div"),
            ArturoSymbol::DoubleSlash => Some("fdiv"),
            ArturoSymbol::Percent => Some("mod"),
            ArturoSymbol::Caret => Some("pow"),
            ArturoSymbol::Equal => Some("equal?"),
            ArturoSymbol::NotEqual => Some("notEqual?"),
            ArturoSymbol::LessThan => Some("less?"),
            ArturoSymbol::GreaterThan => Some("greater?"),
            ArturoSymbol::LessEqual => Some("lessOrEqual?"),
            ArturoSymbol::GreaterEqual => Some("greaterOrEqual?"),
            ArturoSymbol::DotDot => Some("range"),
            ArturoSymbol::Dollar => Some("function"),
            ArturoSymbol::Pipe => None,
            ArturoSymbol::Ampersand => None,
            ArturoSymbol::ArrowRight => None,
            ArturoSymbol::FatArrow => None,
        }
    }

    /// Whether the glyph can appear between two expressions as sugar for a
    /// two-argument call.
    pub fn is_infix(&self) -> bool {
        matches!(
            self,
            ArturoSymbol::Plus
                | ArturoSymbol::Minus
                | ArturoSymbol::Asterisk
                | ArturoSymbol::Slash
                | ArturoSymbol::DoubleSlash
                | ArturoSymbol::Percent
                | ArturoSymbol::Caret
                | ArturoSymbol::Equal
                | ArturoSymbol::NotEqual
                | ArturoSymbol::LessThan
                | ArturoSymbol::GreaterThan
                | ArturoSymbol::LessEqual
                | ArturoSymbol::GreaterEqual
                | ArturoSymbol::DotDot
        )
    }
}

impl fmt::Display for ArturoSymbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

// ============================================================================
// Type Values
// ============================================================================

/// A `:type` literal: either a builtin kind or a user-defined type name.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum TypeVal {
    Builtin(ValueKind),
    User(Rc<str>),
}

impl TypeVal {
    /// Parse a type name. Names that are not builtin kinds are user types.
    pub fn from_name(name: &str) -> TypeVal {
        match ValueKind::from_name(name) {
            Some(kind) => TypeVal::Builtin(kind),
            None => TypeVal::User(Rc::from(name)),
        }
    }

    pub fn name(&self) -> &str {
        match self {
            TypeVal::Builtin(kind) => kind.name(),
            TypeVal::User(name) => name,
        }
    }
}

impl fmt::Display for TypeVal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, ":{}", self.name())
    }
}

// ============================================================================
// Versions, Colors, Regexes
// ============================================================================

/// A semantic version literal such as `1.0.2` or `2.1.0-rc1`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct VersionVal {
    pub major: u64,
    pub minor: u64,
    pub patch: u64,
    pub prerelease: Option<Rc<str>>,
}

impl VersionVal {
    pub fn new(major: u64, minor: u64, patch: u64) -> Self {
        VersionVal {
            major,
            minor,
            patch,
            prerelease: None,
        }
    }

    /// Parse `major.minor.patch` with an optional `-tag` suffix.
    pub fn parse(text: &str) -> Option<VersionVal> {
        let (core, pre) = match text.split_once('-') {
            Some((c, p)) if !p.is_empty() => (c, Some(p)),
            Some(_) => return None,
            None => (text, None),
        };
        let mut parts = core.split('.');
        let major = parts.next()?.parse().ok()?;
        let minor = parts.next()?.parse().ok()?;
        let patch = parts.next()?.parse().ok()?;
        if parts.next().is_some() {
            return None;
        }
        Some(VersionVal {
            major,
            minor,
            patch,
            prerelease: pre.map(Rc::from),
        })
    }
}

impl PartialOrd for VersionVal {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for VersionVal {
    fn cmp(&self, other: &Self) -> Ordering {
        (self.major, self.minor, self.patch)
            .cmp(&(other.major, other.minor, other.patch))
            .then_with(|| match (&self.prerelease, &other.prerelease) {
                // A prerelease sorts before the corresponding release.
                (None, None) => Ordering::Equal,
                (Some(_), None) => Ordering::Less,
                (None, Some(_)) => Ordering::Greater,
                (Some(a), Some(b)) => a.cmp(b),
            })
    }
}

impl fmt::Display for VersionVal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}.{}", self.major, self.minor, self.patch)?;
        if let Some(pre) = &self.prerelease {
            write!(f, "-{}", pre)?;
        }
        Ok(())
    }
}

/// An RGBA color. Literals like `#FF0000` parse with full alpha.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Color {
    pub fn rgb(r: u8, g: u8, b: u8) -> Color {
        Color { r, g, b, a: 255 }
    }

    pub fn rgba(r: u8, g: u8, b: u8, a: u8) -> Color {
        Color { r, g, b, a }
    }

    /// Parse `RGB`, `RRGGBB` or `RRGGBBAA` hex digits (no leading `#`).
    pub fn from_hex(hex: &str) -> Option<Color> {
        let expand = |c: u8| c * 16 + c;
        match hex.len() {
            3 => {
                let v = u32::from_str_radix(hex, 16).ok()?;
                Some(Color::rgb(
                    expand(((v >> 8) & 0xF) as u8),
                    expand(((v >> 4) & 0xF) as u8),
                    expand((v & 0xF) as u8),
                ))
            }
            6 => {
                let v = u32::from_str_radix(hex, 16).ok()?;
                Some(Color::rgb((v >> 16) as u8, (v >> 8) as u8, v as u8))
            }
            8 => {
                let v = u32::from_str_radix(hex, 16).ok()?;
                Some(Color::rgba(
                    (v >> 24) as u8,
                    (v >> 16) as u8,
                    (v >> 8) as u8,
                    v as u8,
                ))
            }
            _ => None,
        }
    }

    /// Build a color from hue (0..360), saturation and lightness (0..1).
    pub fn from_hsl(h: f64, s: f64, l: f64) -> Color {
        let c = (1.0 - (2.0 * l - 1.0).abs()) * s;
        let (r1, g1, b1) = hue_to_rgb(h, c);
        let m = l - c / 2.0;
        Color::rgb(
            ((r1 + m) * 255.0).round().clamp(0.0, 255.0) as u8,
            ((g1 + m) * 255.0).round().clamp(0.0, 255.0) as u8,
            ((b1 + m) * 255.0).round().clamp(0.0, 255.0) as u8,
        )
    }

    /// Build a color from hue (0..360), saturation and value (0..1).
    pub fn from_hsv(h: f64, s: f64, v: f64) -> Color {
        let c = v * s;
        let (r1, g1, b1) = hue_to_rgb(h, c);
        let m = v - c;
        Color::rgb(
            ((r1 + m) * 255.0).round().clamp(0.0, 255.0) as u8,
            ((g1 + m) * 255.0).round().clamp(0.0, 255.0) as u8,
            ((b1 + m) * 255.0).round().clamp(0.0, 255.0) as u8,
        )
    }
}

fn hue_to_rgb(h: f64, c: f64) -> (f64, f64, f64) {
    let h = h.rem_euclid(360.0) / 60.0;
    let x = c * (1.0 - (h % 2.0 - 1.0).abs());
    match h as u32 {
        0 => (c, x, 0.0),
        1 => (x, c, 0.0),
        2 => (0.0, c, x),
        3 => (0.0, x, c),
        4 => (x, 0.0, c),
        _ => (c, 0.0, x),
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.a == 255 {
            write!(f, "#{:02X}{:02X}{:02X}", self.r, self.g, self.b)
        } else {
            write!(
                f,
                "#{:02X}{:02X}{:02X}{:02X}",
                self.r, self.g, self.b, self.a
            )
        }
    }
}

/// A compiled regular expression, keeping its original pattern for display
/// and equality.
#[derive(Debug, Clone)]
pub struct ArturoRegex {
    pub pattern: Rc<str>,
    pub compiled: Rc<Regex>,
}

impl ArturoRegex {
    pub fn new(pattern: &str) -> Result<ArturoRegex, regex::Error> {
        Ok(ArturoRegex {
            pattern: Rc::from(pattern),
            compiled: Rc::new(Regex::new(pattern)?),
        })
    }
}

impl PartialEq for ArturoRegex {
    fn eq(&self, other: &Self) -> bool {
        self.pattern == other.pattern
    }
}

impl Eq for ArturoRegex {}

impl fmt::Display for ArturoRegex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{{/{}/}}", self.pattern)
    }
}

// ============================================================================
// Ranges
// ============================================================================

/// An integer or character range with a step.
///
/// Ranges are lazy; `iter()` produces values on demand, which keeps infinite
/// ranges usable with early-terminating consumers.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RangeVal {
    pub start: i64,
    pub stop: i64,
    pub step: i64,
    pub infinite: bool,
    /// False when the range spans code points rather than integers.
    pub numeric: bool,
    pub forward: bool,
}

impl RangeVal {
    pub fn new(start: i64, stop: i64, step: i64) -> RangeVal {
        RangeVal {
            start,
            stop,
            step,
            infinite: false,
            numeric: true,
            forward: start <= stop,
        }
    }

    pub fn chars(start: char, stop: char, step: i64) -> RangeVal {
        RangeVal {
            start: start as i64,
            stop: stop as i64,
            step,
            infinite: false,
            numeric: false,
            forward: start <= stop,
        }
    }

    /// Number of elements, or `None` for infinite ranges.
    pub fn len(&self) -> Option<usize> {
        if self.infinite {
            return None;
        }
        let span = (self.stop - self.start).abs();
        Some((span / self.step.abs()) as usize + 1)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == Some(0)
    }

    pub fn iter(&self) -> RangeIter {
        RangeIter {
            range: self.clone(),
            current: self.start,
            done: false,
        }
    }
}

impl fmt::Display for RangeVal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let show = |v: i64| -> String {
            if self.numeric {
                v.to_string()
            } else {
                char::from_u32(v as u32).map(String::from).unwrap_or_default()
            }
        };
        if self.infinite {
            write!(f, "{}..∞", show(self.start))
        } else {
            write!(f, "{}..{}", show(self.start), show(self.stop))
        }
    }
}

/// Lazy iterator over a range's values.
pub struct RangeIter {
    range: RangeVal,
    current: i64,
    done: bool,
}

impl Iterator for RangeIter {
    type Item = ArturoVal;

    fn next(&mut self) -> Option<ArturoVal> {
        if self.done {
            return None;
        }
        if !self.range.infinite {
            let past = if self.range.forward {
                self.current > self.range.stop
            } else {
                self.current < self.range.stop
            };
            if past {
                self.done = true;
                return None;
            }
        }
        let value = if self.range.numeric {
            ArturoVal::Integer(self.current)
        } else {
            match char::from_u32(self.current as u32) {
                Some(c) => ArturoVal::Char(c),
                None => {
                    self.done = true;
                    return None;
                }
            }
        };
        let delta = if self.range.forward {
            self.range.step.abs()
        } else {
            -self.range.step.abs()
        };
        self.current += delta;
        Some(value)
    }
}

// ============================================================================
// Blocks, Dictionaries, Objects
// ============================================================================

/// A block of values: both the AST produced by the parser and a first-class
/// runtime sequence. Shared by reference.
#[derive(Debug, Clone)]
pub struct ArturoBlock(Rc<BlockInner>);

#[derive(Debug)]
pub struct BlockInner {
    pub items: RefCell<Vec<ArturoVal>>,
    /// Source line per item, filled by the parser. Empty for runtime blocks.
    pub lines: RefCell<Vec<u32>>,
    /// Attached data dictionary (docstrings).
    pub data: RefCell<Option<ArturoDict>>,
    /// Cached compiled form, populated on first execution.
    pub translation: RefCell<Option<Rc<Translation>>>,
}

impl ArturoBlock {
    pub fn new(items: Vec<ArturoVal>) -> ArturoBlock {
        ArturoBlock(Rc::new(BlockInner {
            items: RefCell::new(items),
            lines: RefCell::new(Vec::new()),
            data: RefCell::new(None),
            translation: RefCell::new(None),
        }))
    }

    pub fn with_lines(items: Vec<ArturoVal>, lines: Vec<u32>) -> ArturoBlock {
        ArturoBlock(Rc::new(BlockInner {
            items: RefCell::new(items),
            lines: RefCell::new(lines),
            data: RefCell::new(None),
            translation: RefCell::new(None),
        }))
    }

    pub fn inner(&self) -> &BlockInner {
        &self.0
    }

    pub fn items(&self) -> std::cell::Ref<'_, Vec<ArturoVal>> {
        self.0.items.borrow()
    }

    pub fn len(&self) -> usize {
        self.0.items.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.items.borrow().is_empty()
    }

    pub fn get(&self, index: usize) -> Option<ArturoVal> {
        self.0.items.borrow().get(index).cloned()
    }

    pub fn push(&self, value: ArturoVal) {
        self.0.items.borrow_mut().push(value);
    }

    /// Copy of the item vector.
    pub fn to_vec(&self) -> Vec<ArturoVal> {
        self.0.items.borrow().clone()
    }

    pub fn cached_translation(&self) -> Option<Rc<Translation>> {
        self.0.translation.borrow().clone()
    }

    pub fn cache_translation(&self, translation: Rc<Translation>) {
        *self.0.translation.borrow_mut() = Some(translation);
    }

    pub fn ptr_eq(&self, other: &ArturoBlock) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }
}

impl PartialEq for ArturoBlock {
    fn eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.0, &other.0) || *self.items() == *other.items()
    }
}

impl Eq for ArturoBlock {}

/// An insertion-ordered mapping from string keys to values. Shared by
/// reference; mutating one handle is visible through all of them.
#[derive(Debug, Clone)]
pub struct ArturoDict(Rc<RefCell<IndexMap<String, ArturoVal>>>);

impl ArturoDict {
    pub fn new() -> ArturoDict {
        ArturoDict(Rc::new(RefCell::new(IndexMap::new())))
    }

    pub fn from_map(map: IndexMap<String, ArturoVal>) -> ArturoDict {
        ArturoDict(Rc::new(RefCell::new(map)))
    }

    pub fn borrow(&self) -> std::cell::Ref<'_, IndexMap<String, ArturoVal>> {
        self.0.borrow()
    }

    pub fn borrow_mut(&self) -> std::cell::RefMut<'_, IndexMap<String, ArturoVal>> {
        self.0.borrow_mut()
    }

    pub fn get(&self, key: &str) -> Option<ArturoVal> {
        self.0.borrow().get(key).cloned()
    }

    pub fn set(&self, key: &str, value: ArturoVal) {
        self.0.borrow_mut().insert(key.to_string(), value);
    }

    pub fn len(&self) -> usize {
        self.0.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.borrow().is_empty()
    }

    pub fn keys(&self) -> Vec<String> {
        self.0.borrow().keys().cloned().collect()
    }

    pub fn ptr_eq(&self, other: &ArturoDict) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }
}

impl Default for ArturoDict {
    fn default() -> Self {
        Self::new()
    }
}

impl PartialEq for ArturoDict {
    fn eq(&self, other: &Self) -> bool {
        if Rc::ptr_eq(&self.0, &other.0) {
            return true;
        }
        let a = self.0.borrow();
        let b = other.0.borrow();
        if a.len() != b.len() {
            return false;
        }
        a.iter().all(|(k, v)| b.get(k) == Some(v))
    }
}

impl Eq for ArturoDict {}

/// An instance of a user-defined type: named fields plus the prototype name
/// it was constructed from. Methods are copied into the fields at
/// construction time, bound to receive the object as `this`.
#[derive(Debug, Clone)]
pub struct ArturoObject(Rc<ObjectInner>);

#[derive(Debug)]
pub struct ObjectInner {
    pub proto: Rc<str>,
    pub fields: RefCell<IndexMap<String, ArturoVal>>,
}

impl ArturoObject {
    pub fn new(proto: Rc<str>, fields: IndexMap<String, ArturoVal>) -> ArturoObject {
        ArturoObject(Rc::new(ObjectInner {
            proto,
            fields: RefCell::new(fields),
        }))
    }

    pub fn proto(&self) -> &str {
        &self.0.proto
    }

    pub fn fields(&self) -> std::cell::Ref<'_, IndexMap<String, ArturoVal>> {
        self.0.fields.borrow()
    }

    pub fn get(&self, key: &str) -> Option<ArturoVal> {
        self.0.fields.borrow().get(key).cloned()
    }

    pub fn set(&self, key: &str, value: ArturoVal) {
        self.0.fields.borrow_mut().insert(key.to_string(), value);
    }

    pub fn ptr_eq(&self, other: &ArturoObject) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }
}

impl PartialEq for ArturoObject {
    fn eq(&self, other: &Self) -> bool {
        if Rc::ptr_eq(&self.0, &other.0) {
            return true;
        }
        if self.0.proto != other.0.proto {
            return false;
        }
        let a = self.0.fields.borrow();
        let b = other.0.fields.borrow();
        // Methods are function values and compare by identity; data fields
        // compare structurally.
        if a.len() != b.len() {
            return false;
        }
        a.iter().all(|(k, v)| b.get(k) == Some(v))
    }
}

impl Eq for ArturoObject {}

// ============================================================================
// Opaque Capability Handles
// ============================================================================

/// Handle to a persistent store, owned by an external capability.
#[derive(Debug)]
pub struct StoreHandle {
    pub path: Rc<str>,
    pub kind: Rc<str>,
}

/// Handle to a database connection, owned by an external capability.
#[derive(Debug)]
pub struct DatabaseHandle {
    pub descriptor: Rc<str>,
}

/// Handle to an open socket, owned by an external capability.
#[derive(Debug)]
pub struct SocketHandle {
    pub descriptor: Rc<str>,
}

// ============================================================================
// Functions
// ============================================================================

/// Declared metadata for a function: description, attribute schema, return
/// kinds and an example snippet.
#[derive(Debug, Clone)]
pub struct FunctionInfo {
    pub description: String,
    pub attributes: Vec<(String, KindSet, String)>,
    pub returns: KindSet,
    pub example: String,
}

/// A user-defined function.
#[derive(Debug)]
pub struct UserFunction {
    pub params: Vec<Rc<str>>,
    /// Optional per-parameter kind constraint, parallel to `params`.
    pub param_kinds: Vec<Option<KindSet>>,
    pub body: ArturoBlock,
    /// Symbols captured at definition time and merged into the call scope.
    pub imports: Option<ArturoDict>,
    /// Symbols propagated back to the caller's scope on return.
    pub exports: Vec<Rc<str>>,
    pub memoize: bool,
    pub inline: bool,
    pub info: Option<FunctionInfo>,
    /// Compiled body, populated on first invocation.
    pub translation: RefCell<Option<Rc<Translation>>>,
}

impl UserFunction {
    pub fn new(params: Vec<Rc<str>>, body: ArturoBlock) -> UserFunction {
        let count = params.len();
        UserFunction {
            params,
            param_kinds: vec![None; count],
            body,
            imports: None,
            exports: Vec::new(),
            memoize: false,
            inline: false,
            info: None,
            translation: RefCell::new(None),
        }
    }
}

/// Reference to a registered builtin. The native routine itself lives in the
/// VM's registry; the value only carries what symbol resolution needs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuiltinRef {
    pub name: Rc<str>,
    pub arity: usize,
    /// Fast-path opcode, when the instruction set has a dedicated one.
    pub op: Option<u8>,
}

/// A callable value: a user function or a builtin reference.
#[derive(Debug)]
pub enum FunctionVal {
    User(UserFunction),
    Builtin(BuiltinRef),
}

impl FunctionVal {
    pub fn arity(&self) -> usize {
        match self {
            FunctionVal::User(f) => f.params.len(),
            FunctionVal::Builtin(b) => b.arity,
        }
    }
}

// ============================================================================
// Translations
// ============================================================================

/// Maximum number of entries in a translation's constant pool; indices must
/// fit in two bytes.
pub const MAX_CONSTANTS: usize = u16::MAX as usize + 1;

/// The compiled form of a block: a constant pool plus a byte-encoded
/// instruction stream.
#[derive(Debug, Default)]
pub struct Translation {
    pub constants: Vec<ArturoVal>,
    pub instructions: Vec<u8>,
}

impl Translation {
    pub fn new() -> Translation {
        Translation {
            constants: Vec::new(),
            instructions: Vec::new(),
        }
    }

    /// Intern a constant, deduplicating scalar values, and return its index.
    ///
    /// Returns `None` when the pool is full.
    pub fn add_constant(&mut self, value: ArturoVal) -> Option<u16> {
        if value.is_interned_scalar() {
            for (i, existing) in self.constants.iter().enumerate() {
                if existing.kind() == value.kind() && *existing == value {
                    return Some(i as u16);
                }
            }
        }
        if self.constants.len() >= MAX_CONSTANTS {
            return None;
        }
        let idx = self.constants.len() as u16;
        self.constants.push(value);
        Some(idx)
    }
}

impl PartialEq for Translation {
    fn eq(&self, other: &Self) -> bool {
        self.instructions == other.instructions && self.constants == other.constants
    }
}

impl Eq for Translation {}

// ============================================================================
// The Value Type
// ============================================================================

/// The core value type for Arturo.
///
/// Every tag the language knows is a variant here; dispatch over values is a
/// plain `match`, which the compiler turns into a jump table.
#[derive(Debug, Clone)]
pub enum ArturoVal {
    Null,
    Logical(bool),
    /// Machine-word integer. Arithmetic that overflows promotes to
    /// `BigInteger`.
    Integer(i64),
    /// Arbitrary-precision integer, the big sub-kind of `:integer`.
    BigInteger(Rc<BigInt>),
    Floating(f64),
    Complex(Complex64),
    /// Machine-word rational, the normal sub-kind of `:rational`.
    Rational(Rational64),
    /// Arbitrary-precision rational, the big sub-kind of `:rational`.
    BigRational(Rc<BigRational>),
    Version(Rc<VersionVal>),
    Type(TypeVal),
    Char(char),
    String(Rc<str>),
    Word(Rc<str>),
    Literal(Rc<str>),
    Label(Rc<str>),
    Attribute(Rc<str>),
    AttributeLabel(Rc<str>),
    Path(Rc<Vec<ArturoVal>>),
    PathLabel(Rc<Vec<ArturoVal>>),
    PathLiteral(Rc<Vec<ArturoVal>>),
    Symbol(ArturoSymbol),
    SymbolLiteral(ArturoSymbol),
    Regex(ArturoRegex),
    Color(Color),
    Date(DateTime<Utc>),
    Quantity(Box<ArturoVal>, Rc<str>),
    Unit(Rc<str>),
    Binary(Rc<Vec<u8>>),
    /// A parenthesized block, executed in the enclosing scope to produce a
    /// single value.
    Inline(ArturoBlock),
    Block(ArturoBlock),
    Range(Rc<RangeVal>),
    Dictionary(ArturoDict),
    Object(ArturoObject),
    Store(Rc<StoreHandle>),
    Function(Rc<FunctionVal>),
    Bytecode(Rc<Translation>),
    Database(Rc<DatabaseHandle>),
    Socket(Rc<SocketHandle>),
    /// The no-value, distinct from `Null`: what effect-only builtins leave
    /// behind, which is nothing at all.
    Nothing,
}

impl ArturoVal {
    // ------------------------------------------------------------------
    // Constructors
    // ------------------------------------------------------------------

    pub fn integer(value: i64) -> ArturoVal {
        ArturoVal::Integer(value)
    }

    /// Build an integer from a big value, normalizing to the machine-word
    /// sub-kind when it fits.
    pub fn big_integer(value: BigInt) -> ArturoVal {
        match value.to_i64() {
            Some(small) => ArturoVal::Integer(small),
            None => ArturoVal::BigInteger(Rc::new(value)),
        }
    }

    pub fn floating(value: f64) -> ArturoVal {
        ArturoVal::Floating(value)
    }

    /// Build a rational, normalizing integral ratios down to integers.
    pub fn rational(numer: i64, denom: i64) -> ArturoVal {
        let r = Rational64::new(numer, denom);
        if r.is_integer() {
            ArturoVal::Integer(*r.numer())
        } else {
            ArturoVal::Rational(r)
        }
    }

    pub fn big_rational(value: BigRational) -> ArturoVal {
        if value.is_integer() {
            ArturoVal::big_integer(value.to_integer())
        } else {
            ArturoVal::BigRational(Rc::new(value))
        }
    }

    pub fn string(value: impl AsRef<str>) -> ArturoVal {
        ArturoVal::String(Rc::from(value.as_ref()))
    }

    pub fn word(value: impl AsRef<str>) -> ArturoVal {
        ArturoVal::Word(Rc::from(value.as_ref()))
    }

    pub fn literal(value: impl AsRef<str>) -> ArturoVal {
        ArturoVal::Literal(Rc::from(value.as_ref()))
    }

    pub fn label(value: impl AsRef<str>) -> ArturoVal {
        ArturoVal::Label(Rc::from(value.as_ref()))
    }

    pub fn attribute(value: impl AsRef<str>) -> ArturoVal {
        ArturoVal::Attribute(Rc::from(value.as_ref()))
    }

    pub fn block(items: Vec<ArturoVal>) -> ArturoVal {
        ArturoVal::Block(ArturoBlock::new(items))
    }

    pub fn inline(items: Vec<ArturoVal>) -> ArturoVal {
        ArturoVal::Inline(ArturoBlock::new(items))
    }

    pub fn dictionary(map: IndexMap<String, ArturoVal>) -> ArturoVal {
        ArturoVal::Dictionary(ArturoDict::from_map(map))
    }

    pub fn date_from_timestamp(secs: i64) -> Option<ArturoVal> {
        Utc.timestamp_opt(secs, 0).single().map(ArturoVal::Date)
    }

    // ------------------------------------------------------------------
    // Inspection
    // ------------------------------------------------------------------

    /// The tag of this value.
    pub fn kind(&self) -> ValueKind {
        match self {
            ArturoVal::Null => ValueKind::Null,
            ArturoVal::Logical(_) => ValueKind::Logical,
            ArturoVal::Integer(_) | ArturoVal::BigInteger(_) => ValueKind::Integer,
            ArturoVal::Floating(_) => ValueKind::Floating,
            ArturoVal::Complex(_) => ValueKind::Complex,
            ArturoVal::Rational(_) | ArturoVal::BigRational(_) => ValueKind::Rational,
            ArturoVal::Version(_) => ValueKind::Version,
            ArturoVal::Type(_) => ValueKind::Type,
            ArturoVal::Char(_) => ValueKind::Char,
            ArturoVal::String(_) => ValueKind::String,
            ArturoVal::Word(_) => ValueKind::Word,
            ArturoVal::Literal(_) => ValueKind::Literal,
            ArturoVal::Label(_) => ValueKind::Label,
            ArturoVal::Attribute(_) => ValueKind::Attribute,
            ArturoVal::AttributeLabel(_) => ValueKind::AttributeLabel,
            ArturoVal::Path(_) => ValueKind::Path,
            ArturoVal::PathLabel(_) => ValueKind::PathLabel,
            ArturoVal::PathLiteral(_) => ValueKind::PathLiteral,
            ArturoVal::Symbol(_) => ValueKind::Symbol,
            ArturoVal::SymbolLiteral(_) => ValueKind::SymbolLiteral,
            ArturoVal::Regex(_) => ValueKind::Regex,
            ArturoVal::Color(_) => ValueKind::Color,
            ArturoVal::Date(_) => ValueKind::Date,
            ArturoVal::Quantity(..) => ValueKind::Quantity,
            ArturoVal::Unit(_) => ValueKind::Unit,
            ArturoVal::Binary(_) => ValueKind::Binary,
            ArturoVal::Inline(_) => ValueKind::Inline,
            ArturoVal::Block(_) => ValueKind::Block,
            ArturoVal::Range(_) => ValueKind::Range,
            ArturoVal::Dictionary(_) => ValueKind::Dictionary,
            ArturoVal::Object(_) => ValueKind::Object,
            ArturoVal::Store(_) => ValueKind::Store,
            ArturoVal::Function(_) => ValueKind::Function,
            ArturoVal::Bytecode(_) => ValueKind::Bytecode,
            ArturoVal::Database(_) => ValueKind::Database,
            ArturoVal::Socket(_) => ValueKind::Socket,
            ArturoVal::Nothing => ValueKind::Nothing,
        }
    }

    /// Lowercase kind name, for error messages.
    pub fn type_name(&self) -> &'static str {
        self.kind().name()
    }

    /// Everything is truthy except `false`, `null` and the no-value.
    pub fn is_truthy(&self) -> bool {
        !matches!(
            self,
            ArturoVal::Logical(false) | ArturoVal::Null | ArturoVal::Nothing
        )
    }

    pub fn is_numeric(&self) -> bool {
        matches!(
            self,
            ArturoVal::Integer(_)
                | ArturoVal::BigInteger(_)
                | ArturoVal::Floating(_)
                | ArturoVal::Rational(_)
                | ArturoVal::BigRational(_)
                | ArturoVal::Complex(_)
        )
    }

    /// Whether `add_constant` should deduplicate this value in constant
    /// pools. Containers and functions are interned verbatim.
    pub fn is_interned_scalar(&self) -> bool {
        matches!(
            self,
            ArturoVal::Null
                | ArturoVal::Logical(_)
                | ArturoVal::Integer(_)
                | ArturoVal::BigInteger(_)
                | ArturoVal::Floating(_)
                | ArturoVal::Char(_)
                | ArturoVal::String(_)
                | ArturoVal::Word(_)
                | ArturoVal::Literal(_)
                | ArturoVal::Label(_)
                | ArturoVal::Attribute(_)
                | ArturoVal::AttributeLabel(_)
                | ArturoVal::Type(_)
                | ArturoVal::Symbol(_)
                | ArturoVal::SymbolLiteral(_)
        )
    }

    /// The exact machine integer this value represents, if it represents one.
    pub fn exact_i64(&self) -> Option<i64> {
        match self {
            ArturoVal::Integer(i) => Some(*i),
            ArturoVal::BigInteger(b) => b.to_i64(),
            ArturoVal::Floating(f) => {
                if f.fract() == 0.0 && f.is_finite() && *f >= i64::MIN as f64 && *f <= i64::MAX as f64
                {
                    Some(*f as i64)
                } else {
                    None
                }
            }
            ArturoVal::Rational(r) => {
                if r.is_integer() {
                    Some(*r.numer())
                } else {
                    None
                }
            }
            ArturoVal::BigRational(r) => {
                if r.is_integer() {
                    r.to_integer().to_i64()
                } else {
                    None
                }
            }
            _ => None,
        }
    }

    /// Approximate this numeric value as a float. Non-numeric values yield
    /// `None`.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            ArturoVal::Integer(i) => Some(*i as f64),
            ArturoVal::BigInteger(b) => b.to_f64(),
            ArturoVal::Floating(f) => Some(*f),
            ArturoVal::Rational(r) => Some(*r.numer() as f64 / *r.denom() as f64),
            ArturoVal::BigRational(r) => r.to_f64(),
            _ => None,
        }
    }

    /// Text payload of the word-like and string variants.
    pub fn text(&self) -> Option<&str> {
        match self {
            ArturoVal::String(s)
            | ArturoVal::Word(s)
            | ArturoVal::Literal(s)
            | ArturoVal::Label(s)
            | ArturoVal::Attribute(s)
            | ArturoVal::AttributeLabel(s)
            | ArturoVal::Unit(s) => Some(s),
            _ => None,
        }
    }

    // ------------------------------------------------------------------
    // Comparison
    // ------------------------------------------------------------------

    /// Partial ordering across values.
    ///
    /// Numeric values compare across sub-kinds; other values compare only
    /// within their own variant. `None` means incomparable.
    pub fn compare(&self, other: &ArturoVal) -> Option<Ordering> {
        if self.is_numeric() && other.is_numeric() {
            return numeric_cmp(self, other);
        }
        match (self, other) {
            (ArturoVal::Logical(a), ArturoVal::Logical(b)) => Some(a.cmp(b)),
            (ArturoVal::Char(a), ArturoVal::Char(b)) => Some(a.cmp(b)),
            (ArturoVal::String(a), ArturoVal::String(b)) => Some(a.cmp(b)),
            (ArturoVal::Word(a), ArturoVal::Word(b)) => Some(a.cmp(b)),
            (ArturoVal::Literal(a), ArturoVal::Literal(b)) => Some(a.cmp(b)),
            (ArturoVal::Version(a), ArturoVal::Version(b)) => Some(a.cmp(b)),
            (ArturoVal::Date(a), ArturoVal::Date(b)) => Some(a.cmp(b)),
            (ArturoVal::Block(a), ArturoVal::Block(b)) => {
                let av = a.items();
                let bv = b.items();
                for (x, y) in av.iter().zip(bv.iter()) {
                    match x.compare(y) {
                        Some(Ordering::Equal) => continue,
                        other => return other,
                    }
                }
                Some(av.len().cmp(&bv.len()))
            }
            _ => None,
        }
    }
}

// ============================================================================
// Numeric promotion helpers
// ============================================================================

fn as_big_rational(v: &ArturoVal) -> Option<BigRational> {
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

fn is_exact(v: &ArturoVal) -> bool {
    matches!(
        v,
        ArturoVal::Integer(_)
            | ArturoVal::BigInteger(_)
            | ArturoVal::Rational(_)
            | ArturoVal::BigRational(_)
    )
}

/// Numeric equality with promotion across sub-kinds.
pub fn numeric_eq(a: &ArturoVal, b: &ArturoVal) -> bool {
    match (a, b) {
        (ArturoVal::Complex(x), ArturoVal::Complex(y)) => x == y,
        (ArturoVal::Complex(x), other) | (other, ArturoVal::Complex(x)) => {
            match other.as_f64() {
                Some(f) => x.im == 0.0 && x.re == f,
                None => false,
            }
        }
        _ if is_exact(a) && is_exact(b) => match (as_big_rational(a), as_big_rational(b)) {
            (Some(x), Some(y)) => x == y,
            _ => false,
        },
        _ => match (a.as_f64(), b.as_f64()) {
            (Some(x), Some(y)) => x == y,
            _ => false,
        },
    }
}

/// Numeric ordering with promotion across sub-kinds. Complex values are
/// incomparable unless equal.
pub fn numeric_cmp(a: &ArturoVal, b: &ArturoVal) -> Option<Ordering> {
    match (a, b) {
        (ArturoVal::Complex(_), _) | (_, ArturoVal::Complex(_)) => {
            if numeric_eq(a, b) {
                Some(Ordering::Equal)
            } else {
                None
            }
        }
        _ if is_exact(a) && is_exact(b) => {
            Some(as_big_rational(a)?.cmp(&as_big_rational(b)?))
        }
        _ => a.as_f64()?.partial_cmp(&b.as_f64()?),
    }
}

// ============================================================================
// Equality
// ============================================================================

impl PartialEq for ArturoVal {
    fn eq(&self, other: &Self) -> bool {
        if self.is_numeric() && other.is_numeric() {
            return numeric_eq(self, other);
        }
        match (self, other) {
            (ArturoVal::Null, ArturoVal::Null) => true,
            (ArturoVal::Nothing, ArturoVal::Nothing) => true,
            (ArturoVal::Logical(a), ArturoVal::Logical(b)) => a == b,
            (ArturoVal::Version(a), ArturoVal::Version(b)) => a == b,
            (ArturoVal::Type(a), ArturoVal::Type(b)) => a == b,
            (ArturoVal::Char(a), ArturoVal::Char(b)) => a == b,
            (ArturoVal::String(a), ArturoVal::String(b)) => a == b,
            (ArturoVal::Word(a), ArturoVal::Word(b)) => a == b,
            (ArturoVal::Literal(a), ArturoVal::Literal(b)) => a == b,
            (ArturoVal::Label(a), ArturoVal::Label(b)) => a == b,
            (ArturoVal::Attribute(a), ArturoVal::Attribute(b)) => a == b,
            (ArturoVal::AttributeLabel(a), ArturoVal::AttributeLabel(b)) => a == b,
            (ArturoVal::Path(a), ArturoVal::Path(b)) => a == b,
            (ArturoVal::PathLabel(a), ArturoVal::PathLabel(b)) => a == b,
            (ArturoVal::PathLiteral(a), ArturoVal::PathLiteral(b)) => a == b,
            (ArturoVal::Symbol(a), ArturoVal::Symbol(b)) => a == b,
            (ArturoVal::SymbolLiteral(a), ArturoVal::SymbolLiteral(b)) => a == b,
            (ArturoVal::Regex(a), ArturoVal::Regex(b)) => a == b,
            (ArturoVal::Color(a), ArturoVal::Color(b)) => a == b,
            (ArturoVal::Date(a), ArturoVal::Date(b)) => a == b,
            (ArturoVal::Quantity(av, au), ArturoVal::Quantity(bv, bu)) => au == bu && av == bv,
            (ArturoVal::Unit(a), ArturoVal::Unit(b)) => a == b,
            (ArturoVal::Binary(a), ArturoVal::Binary(b)) => a == b,
            (ArturoVal::Inline(a), ArturoVal::Inline(b)) => a == b,
            (ArturoVal::Block(a), ArturoVal::Block(b)) => a == b,
            (ArturoVal::Range(a), ArturoVal::Range(b)) => a == b,
            (ArturoVal::Dictionary(a), ArturoVal::Dictionary(b)) => a == b,
            (ArturoVal::Object(a), ArturoVal::Object(b)) => a == b,
            (ArturoVal::Store(a), ArturoVal::Store(b)) => Rc::ptr_eq(a, b),
            (ArturoVal::Database(a), ArturoVal::Database(b)) => Rc::ptr_eq(a, b),
            (ArturoVal::Socket(a), ArturoVal::Socket(b)) => Rc::ptr_eq(a, b),
            (ArturoVal::Function(a), ArturoVal::Function(b)) => match (&**a, &**b) {
                (FunctionVal::Builtin(x), FunctionVal::Builtin(y)) => x.name == y.name,
                _ => Rc::ptr_eq(a, b),
            },
            (ArturoVal::Bytecode(a), ArturoVal::Bytecode(b)) => a == b,
            _ => false,
        }
    }
}

impl Eq for ArturoVal {}

impl PartialOrd for ArturoVal {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        self.compare(other)
    }
}

// ============================================================================
// Hashing
// ============================================================================

// Numerically equal values must hash alike: the memoization cache keys calls
// by argument tuple, and 1, 1.0 and 1/1 are the same argument.
impl Hash for ArturoVal {
    fn hash<H: Hasher>(&self, state: &mut H) {
        match self {
            ArturoVal::Null => 0u8.hash(state),
            ArturoVal::Nothing => 1u8.hash(state),
            ArturoVal::Logical(b) => (2u8, b).hash(state),
            _ if self.is_numeric() => hash_numeric(self, state),
            ArturoVal::Version(v) => (4u8, v).hash(state),
            ArturoVal::Type(t) => (5u8, t).hash(state),
            ArturoVal::Char(c) => (6u8, c).hash(state),
            ArturoVal::String(s) => (7u8, s).hash(state),
            ArturoVal::Word(s) => (8u8, s).hash(state),
            ArturoVal::Literal(s) => (9u8, s).hash(state),
            ArturoVal::Label(s) => (10u8, s).hash(state),
            ArturoVal::Attribute(s) => (11u8, s).hash(state),
            ArturoVal::AttributeLabel(s) => (12u8, s).hash(state),
            ArturoVal::Path(p) | ArturoVal::PathLabel(p) | ArturoVal::PathLiteral(p) => {
                13u8.hash(state);
                for seg in p.iter() {
                    seg.hash(state);
                }
            }
            ArturoVal::Symbol(s) => (14u8, s).hash(state),
            ArturoVal::SymbolLiteral(s) => (15u8, s).hash(state),
            ArturoVal::Regex(r) => (16u8, &r.pattern).hash(state),
            ArturoVal::Color(c) => (17u8, c).hash(state),
            ArturoVal::Date(d) => (18u8, d.timestamp(), d.timestamp_subsec_nanos()).hash(state),
            ArturoVal::Quantity(v, u) => {
                19u8.hash(state);
                v.hash(state);
                u.hash(state);
            }
            ArturoVal::Unit(u) => (20u8, u).hash(state),
            ArturoVal::Binary(b) => (21u8, b).hash(state),
            ArturoVal::Inline(b) | ArturoVal::Block(b) => {
                22u8.hash(state);
                for item in b.items().iter() {
                    item.hash(state);
                }
            }
            ArturoVal::Range(r) => (23u8, r).hash(state),
            ArturoVal::Dictionary(d) => {
                24u8.hash(state);
                for (k, v) in d.borrow().iter() {
                    k.hash(state);
                    v.hash(state);
                }
            }
            ArturoVal::Object(o) => {
                25u8.hash(state);
                o.proto().hash(state);
                for (k, v) in o.fields().iter() {
                    k.hash(state);
                    v.hash(state);
                }
            }
            ArturoVal::Store(s) => (26u8, Rc::as_ptr(s) as usize).hash(state),
            ArturoVal::Function(f) => (27u8, Rc::as_ptr(f) as *const () as usize).hash(state),
            ArturoVal::Bytecode(t) => {
                28u8.hash(state);
                t.instructions.hash(state);
            }
            ArturoVal::Database(d) => (29u8, Rc::as_ptr(d) as usize).hash(state),
            ArturoVal::Socket(s) => (30u8, Rc::as_ptr(s) as usize).hash(state),
            _ => unreachable!("numeric variants are handled above"),
        }
    }
}

fn hash_numeric<H: Hasher>(v: &ArturoVal, state: &mut H) {
    if let ArturoVal::Complex(c) = v {
        if c.im != 0.0 {
            (3u8, 2u8, c.re.to_bits(), c.im.to_bits()).hash(state);
            return;
        }
        (3u8, 1u8, c.re.to_bits()).hash(state);
        return;
    }
    if let Some(i) = v.exact_i64() {
        (3u8, 0u8, i).hash(state);
        return;
    }
    match v.as_f64() {
        Some(f) => (3u8, 1u8, f.to_bits()).hash(state),
        // A big integer beyond f64 range: hash its decimal form.
        None => {
            if let ArturoVal::BigInteger(b) = v {
                (3u8, 3u8, b.to_string()).hash(state)
            }
        }
    }
}

// ============================================================================
// Printing
// ============================================================================

/// Format a float so it survives reparsing as a float.
pub fn format_floating(f: f64) -> String {
    if f.is_nan() {
        return "nan".to_string();
    }
    if f.is_infinite() {
        return if f > 0.0 { "∞" } else { "-∞" }.to_string();
    }
    if f.fract() == 0.0 && f.abs() < 1e15 {
        format!("{:.1}", f)
    } else {
        format!("{}", f)
    }
}

impl fmt::Display for ArturoVal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ArturoVal::Null => write!(f, "null"),
            ArturoVal::Nothing => Ok(()),
            ArturoVal::Logical(b) => write!(f, "{}", b),
            ArturoVal::Integer(i) => write!(f, "{}", i),
            ArturoVal::BigInteger(b) => write!(f, "{}", b),
            ArturoVal::Floating(x) => write!(f, "{}", format_floating(*x)),
            ArturoVal::Complex(c) => {
                if c.im.is_sign_negative() {
                    write!(
                        f,
                        "{}{}i",
                        format_floating(c.re),
                        format_floating(c.im)
                    )
                } else {
                    write!(
                        f,
                        "{}+{}i",
                        format_floating(c.re),
                        format_floating(c.im)
                    )
                }
            }
            ArturoVal::Rational(r) => write!(f, "{}/{}", r.numer(), r.denom()),
            ArturoVal::BigRational(r) => write!(f, "{}/{}", r.numer(), r.denom()),
            ArturoVal::Version(v) => write!(f, "{}", v),
            ArturoVal::Type(t) => write!(f, "{}", t),
            ArturoVal::Char(c) => write!(f, "{}", c),
            ArturoVal::String(s) => write!(f, "{}", s),
            ArturoVal::Word(s) => write!(f, "{}", s),
            ArturoVal::Literal(s) => write!(f, "{}", s),
            ArturoVal::Label(s) => write!(f, "{}:", s),
            ArturoVal::Attribute(s) => write!(f, ".{}", s),
            ArturoVal::AttributeLabel(s) => write!(f, ".{}:", s),
            ArturoVal::Path(p) | ArturoVal::PathLiteral(p) => write_path(f, p, false),
            ArturoVal::PathLabel(p) => write_path(f, p, true),
            ArturoVal::Symbol(s) | ArturoVal::SymbolLiteral(s) => write!(f, "{}", s),
            ArturoVal::Regex(r) => write!(f, "{}", r),
            ArturoVal::Color(c) => write!(f, "{}", c),
            ArturoVal::Date(d) => write!(f, "{}", d.format("%Y-%m-%dT%H:%M:%S%:z")),
            ArturoVal::Quantity(v, u) => write!(f, "{}`{}", v, u),
            ArturoVal::Unit(u) => write!(f, "`{}", u),
            ArturoVal::Binary(bytes) => {
                for (i, b) in bytes.iter().enumerate() {
                    if i > 0 {
                        write!(f, " ")?;
                    }
                    write!(f, "{:02X}", b)?;
                }
                Ok(())
            }
            ArturoVal::Inline(b) => {
                write!(f, "(")?;
                write_items(f, &b.items())?;
                write!(f, ")")
            }
            ArturoVal::Block(b) => {
                write!(f, "[")?;
                write_items(f, &b.items())?;
                write!(f, "]")
            }
            ArturoVal::Range(r) => write!(f, "{}", r),
            ArturoVal::Dictionary(d) => {
                write!(f, "[")?;
                for (i, (k, v)) in d.borrow().iter().enumerate() {
                    if i > 0 {
                        write!(f, " ")?;
                    }
                    write!(f, "{}:{}", k, v)?;
                }
                write!(f, "]")
            }
            ArturoVal::Object(o) => {
                write!(f, "[")?;
                let mut first = true;
                for (k, v) in o.fields().iter() {
                    if matches!(v, ArturoVal::Function(_)) {
                        continue;
                    }
                    if !first {
                        write!(f, " ")?;
                    }
                    first = false;
                    write!(f, "{}:{}", k, v)?;
                }
                write!(f, "]")
            }
            ArturoVal::Store(s) => write!(f, "#<store {}>", s.path),
            ArturoVal::Function(fun) => match &**fun {
                FunctionVal::User(u) => {
                    write!(f, "#<function [")?;
                    for (i, p) in u.params.iter().enumerate() {
                        if i > 0 {
                            write!(f, " ")?;
                        }
                        write!(f, "{}", p)?;
                    }
                    write!(f, "]>")
                }
                FunctionVal::Builtin(b) => write!(f, "#<builtin {}>", b.name),
            },
            ArturoVal::Bytecode(t) => write!(
                f,
                "#<bytecode {} constants, {} bytes>",
                t.constants.len(),
                t.instructions.len()
            ),
            ArturoVal::Database(d) => write!(f, "#<database {}>", d.descriptor),
            ArturoVal::Socket(s) => write!(f, "#<socket {}>", s.descriptor),
        }
    }
}

fn write_items(f: &mut fmt::Formatter<'_>, items: &[ArturoVal]) -> fmt::Result {
    for (i, item) in items.iter().enumerate() {
        if i > 0 {
            write!(f, " ")?;
        }
        match item {
            // Strings nested inside containers keep their quotes so the
            // output stays readable.
            ArturoVal::String(s) => write!(f, "\"{}\"", s)?,
            other => write!(f, "{}", other)?,
        }
    }
    Ok(())
}

fn write_path(f: &mut fmt::Formatter<'_>, segments: &[ArturoVal], label: bool) -> fmt::Result {
    for (i, seg) in segments.iter().enumerate() {
        if i > 0 {
            write!(f, "\\")?;
        }
        write!(f, "{}", seg)?;
    }
    if label {
        write!(f, ":")?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_numeric_equality_across_kinds() {
        assert_eq!(ArturoVal::Integer(1), ArturoVal::Floating(1.0));
        assert_eq!(
            ArturoVal::Integer(2),
            ArturoVal::big_integer(BigInt::from(2))
        );
        assert_eq!(ArturoVal::rational(4, 2), ArturoVal::Integer(2));
        assert_ne!(ArturoVal::Integer(1), ArturoVal::String(Rc::from("1")));
    }

    #[test]
    fn test_cross_kind_equality_is_false() {
        assert_ne!(ArturoVal::word("a"), ArturoVal::literal("a"));
        assert_ne!(ArturoVal::string("a"), ArturoVal::word("a"));
        assert_ne!(ArturoVal::Null, ArturoVal::Logical(false));
    }

    #[test]
    fn test_compare_partial() {
        assert_eq!(
            ArturoVal::Integer(1).compare(&ArturoVal::Floating(2.0)),
            Some(Ordering::Less)
        );
        assert_eq!(
            ArturoVal::string("a").compare(&ArturoVal::string("b")),
            Some(Ordering::Less)
        );
        assert_eq!(ArturoVal::string("a").compare(&ArturoVal::Integer(1)), None);
        assert_eq!(ArturoVal::word("x").compare(&ArturoVal::literal("x")), None);
    }

    #[test]
    fn test_big_integer_normalization() {
        assert!(matches!(
            ArturoVal::big_integer(BigInt::from(42)),
            ArturoVal::Integer(42)
        ));
        let big = BigInt::from(i64::MAX) * 2;
        assert!(matches!(
            ArturoVal::big_integer(big),
            ArturoVal::BigInteger(_)
        ));
    }

    #[test]
    fn test_range_iteration() {
        let r = RangeVal::new(1, 5, 2);
        let vals: Vec<ArturoVal> = r.iter().collect();
        assert_eq!(
            vals,
            vec![
                ArturoVal::Integer(1),
                ArturoVal::Integer(3),
                ArturoVal::Integer(5)
            ]
        );

        let down = RangeVal::new(3, 1, 1);
        let vals: Vec<ArturoVal> = down.iter().collect();
        assert_eq!(vals.len(), 3);
        assert_eq!(vals[0], ArturoVal::Integer(3));
        assert_eq!(vals[2], ArturoVal::Integer(1));
    }

    #[test]
    fn test_char_range() {
        let r = RangeVal::chars('a', 'c', 1);
        let vals: Vec<ArturoVal> = r.iter().collect();
        assert_eq!(
            vals,
            vec![
                ArturoVal::Char('a'),
                ArturoVal::Char('b'),
                ArturoVal::Char('c')
            ]
        );
    }

    #[test]
    fn test_color_hex() {
        let c = Color::from_hex("FF0000").unwrap();
        assert_eq!(c, Color::rgb(255, 0, 0));
        assert_eq!(c.to_string(), "#FF0000");
        let short = Color::from_hex("f0a").unwrap();
        assert_eq!(short, Color::rgb(255, 0, 170));
    }

    #[test]
    fn test_version_ordering() {
        let a = VersionVal::parse("1.2.3").unwrap();
        let b = VersionVal::parse("1.10.0").unwrap();
        assert!(a < b);
        let pre = VersionVal::parse("1.2.3-rc1").unwrap();
        assert!(pre < a);
    }

    #[test]
    fn test_hash_consistency_for_equal_numerics() {
        use std::collections::hash_map::DefaultHasher;
        let h = |v: &ArturoVal| {
            let mut s = DefaultHasher::new();
            v.hash(&mut s);
            s.finish()
        };
        assert_eq!(h(&ArturoVal::Integer(7)), h(&ArturoVal::Floating(7.0)));
        assert_eq!(h(&ArturoVal::rational(1, 2)), h(&ArturoVal::Floating(0.5)));
    }

    #[test]
    fn test_truthiness() {
        assert!(!ArturoVal::Null.is_truthy());
        assert!(!ArturoVal::Logical(false).is_truthy());
        assert!(ArturoVal::Integer(0).is_truthy());
        assert!(ArturoVal::string("").is_truthy());
    }

    #[test]
    fn test_translation_constant_interning() {
        let mut t = Translation::new();
        let a = t.add_constant(ArturoVal::string("x")).unwrap();
        let b = t.add_constant(ArturoVal::string("x")).unwrap();
        assert_eq!(a, b);
        let c = t.add_constant(ArturoVal::word("x")).unwrap();
        assert_ne!(a, c);
    }

    #[test]
    fn test_block_display() {
        let b = ArturoVal::block(vec![
            ArturoVal::word("print"),
            ArturoVal::string("hi"),
            ArturoVal::Integer(3),
        ]);
        assert_eq!(b.to_string(), "[print \"hi\" 3]");
    }
}
