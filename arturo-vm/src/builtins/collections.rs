// arturo-vm - Bytecode translator and virtual machine for the Arturo programming language
// Copyright (c) 2026 The Arturo Project Contributors. MIT licensed.

//! Collection operations and the collection generators.

use std::rc::Rc;

use arturo_core::{Error, Result};
use std::cell::RefCell;

use arturo_parser::{
    ArturoDict, ArturoObject, ArturoVal, FunctionVal, KindSet, RangeVal, TypeVal, UserFunction,
    ValueKind,
};
use chrono::{Datelike, Timelike};

use crate::builtins::{any, blockish, builtin, integer, logical, string, textual, Attrs, Registry};
use crate::opcode::OpCode;
use crate::vm::Vm;

fn sized_kinds() -> KindSet {
    KindSet::of(&[
        ValueKind::Block,
        ValueKind::Inline,
        ValueKind::String,
        ValueKind::Dictionary,
        ValueKind::Object,
        ValueKind::Range,
        ValueKind::Binary,
    ])
}

fn indexable_kinds() -> KindSet {
    sized_kinds().or(KindSet::of(&[ValueKind::Date, ValueKind::Bytecode]))
}

// ============================================================================
// Element access
// ============================================================================

fn index_block(len: usize, index: i64) -> Result<usize> {
    if index < 0 || index as usize >= len {
        return Err(Error::index_out_of_bounds(index, len));
    }
    Ok(index as usize)
}

/// Indexed or keyed access shared by `get` and path lookups.
pub fn get_element(container: &ArturoVal, key: &ArturoVal) -> Result<ArturoVal> {
    match container {
        ArturoVal::Block(b) | ArturoVal::Inline(b) => {
            let index = want_index("get", key)?;
            let idx = index_block(b.len(), index)?;
            Ok(b.get(idx).unwrap_or(ArturoVal::Null))
        }
        ArturoVal::String(s) => {
            let index = want_index("get", key)?;
            let chars: Vec<char> = s.chars().collect();
            let idx = index_block(chars.len(), index)?;
            Ok(ArturoVal::Char(chars[idx]))
        }
        ArturoVal::Binary(bytes) => {
            let index = want_index("get", key)?;
            let idx = index_block(bytes.len(), index)?;
            Ok(ArturoVal::Integer(bytes[idx] as i64))
        }
        ArturoVal::Dictionary(d) => {
            let name = want_key("get", key)?;
            Ok(d.get(&name).unwrap_or(ArturoVal::Null))
        }
        ArturoVal::Object(o) => {
            let name = want_key("get", key)?;
            Ok(o
                .get(&name)
                .map(|v| bind_method(o, v))
                .unwrap_or(ArturoVal::Null))
        }
        ArturoVal::Range(r) => {
            let index = want_index("get", key)?;
            if index < 0 {
                return Err(Error::index_out_of_bounds(index, r.len().unwrap_or(0)));
            }
            r.iter()
                .nth(index as usize)
                .ok_or_else(|| Error::index_out_of_bounds(index, r.len().unwrap_or(0)))
        }
        ArturoVal::Date(d) => {
            let name = want_key("get", key)?;
            let value = match name.as_str() {
                "year" => ArturoVal::Integer(d.year() as i64),
                "month" => ArturoVal::Integer(d.month() as i64),
                "day" => ArturoVal::Integer(d.day() as i64),
                "hour" => ArturoVal::Integer(d.hour() as i64),
                "minute" => ArturoVal::Integer(d.minute() as i64),
                "second" => ArturoVal::Integer(d.second() as i64),
                "timestamp" => ArturoVal::Integer(d.timestamp()),
                _ => ArturoVal::Null,
            };
            Ok(value)
        }
        ArturoVal::Bytecode(t) => {
            let name = want_key("get", key)?;
            let value = match name.as_str() {
                "data" => ArturoVal::block(t.constants.clone()),
                "code" => ArturoVal::block(
                    t.instructions
                        .iter()
                        .map(|b| ArturoVal::Integer(*b as i64))
                        .collect(),
                ),
                _ => ArturoVal::Null,
            };
            Ok(value)
        }
        other => Err(Error::type_mismatch(
            "get",
            "collection",
            sized_kinds().describe(),
            other.type_name(),
        )),
    }
}

/// Keyed or indexed mutation shared by `set` and path assignment.
pub fn set_element(container: &ArturoVal, key: &ArturoVal, value: ArturoVal) -> Result<()> {
    match container {
        ArturoVal::Block(b) | ArturoVal::Inline(b) => {
            let index = want_index("set", key)?;
            let len = b.len();
            let idx = index_block(len, index)?;
            b.inner().items.borrow_mut()[idx] = value;
            Ok(())
        }
        ArturoVal::Dictionary(d) => {
            let name = want_key("set", key)?;
            d.set(&name, value);
            Ok(())
        }
        ArturoVal::Object(o) => {
            let name = want_key("set", key)?;
            o.set(&name, value);
            Ok(())
        }
        other => Err(Error::type_mismatch(
            "set",
            "collection",
            ":block :dictionary :object",
            other.type_name(),
        )),
    }
}

/// A method read off an object comes back with its `this` parameter already
/// satisfied, through the function's import mechanism.
fn bind_method(obj: &ArturoObject, value: ArturoVal) -> ArturoVal {
    let ArturoVal::Function(f) = &value else {
        return value;
    };
    let FunctionVal::User(u) = &**f else {
        return value;
    };
    if u.params.first().map(|p| &**p) != Some("this") {
        return value;
    }

    let imports = ArturoDict::new();
    imports.set("this", ArturoVal::Object(obj.clone()));
    if let Some(existing) = &u.imports {
        for (k, v) in existing.borrow().iter() {
            if k != "this" {
                imports.set(k, v.clone());
            }
        }
    }

    let bound = UserFunction {
        params: u.params[1..].to_vec(),
        param_kinds: u.param_kinds[1..].to_vec(),
        body: u.body.clone(),
        imports: Some(imports),
        exports: u.exports.clone(),
        memoize: u.memoize,
        inline: u.inline,
        info: u.info.clone(),
        translation: RefCell::new(None),
    };
    ArturoVal::Function(Rc::new(FunctionVal::User(bound)))
}

fn want_index(name: &'static str, key: &ArturoVal) -> Result<i64> {
    key.exact_i64().ok_or_else(|| {
        Error::type_mismatch(name, "index", ":integer", key.type_name())
    })
}

fn want_key(name: &'static str, key: &ArturoVal) -> Result<String> {
    match key {
        ArturoVal::String(s) | ArturoVal::Word(s) | ArturoVal::Literal(s) => Ok(s.to_string()),
        ArturoVal::Integer(i) => Ok(i.to_string()),
        other => Err(Error::type_mismatch(
            name,
            "key",
            ":string :word :literal",
            other.type_name(),
        )),
    }
}

// ============================================================================
// Builtins
// ============================================================================

fn builtin_get(vm: &mut Vm, args: &[ArturoVal], _attrs: &Attrs) -> Result<()> {
    vm.stack.push(get_element(&args[0], &args[1])?)
}

fn builtin_set(vm: &mut Vm, args: &[ArturoVal], _attrs: &Attrs) -> Result<()> {
    set_element(&args[0], &args[1], args[2].clone())
}

fn builtin_size(vm: &mut Vm, args: &[ArturoVal], _attrs: &Attrs) -> Result<()> {
    let size = match &args[0] {
        ArturoVal::Block(b) | ArturoVal::Inline(b) => b.len(),
        ArturoVal::String(s) => s.chars().count(),
        ArturoVal::Dictionary(d) => d.len(),
        ArturoVal::Object(o) => o.fields().len(),
        ArturoVal::Binary(b) => b.len(),
        ArturoVal::Range(r) => r
            .len()
            .ok_or_else(|| Error::internal("An infinite range has no size"))?,
        other => {
            return Err(Error::type_mismatch(
                "size",
                "collection",
                sized_kinds().describe(),
                other.type_name(),
            ));
        }
    };
    vm.stack.push(ArturoVal::Integer(size as i64))
}

fn builtin_append(vm: &mut Vm, args: &[ArturoVal], _attrs: &Attrs) -> Result<()> {
    let result = match (&args[0], &args[1]) {
        (ArturoVal::String(a), b) => {
            let mut s = a.to_string();
            s.push_str(&to_plain_string(b));
            ArturoVal::string(s)
        }
        (ArturoVal::Char(a), b) => {
            let mut s = a.to_string();
            s.push_str(&to_plain_string(b));
            ArturoVal::string(s)
        }
        (ArturoVal::Block(a), ArturoVal::Block(b)) => {
            let mut items = a.to_vec();
            items.extend(b.to_vec());
            ArturoVal::block(items)
        }
        (ArturoVal::Block(a), b) => {
            let mut items = a.to_vec();
            items.push(b.clone());
            ArturoVal::block(items)
        }
        (ArturoVal::Binary(a), ArturoVal::Integer(byte)) if (0..=255).contains(byte) => {
            let mut bytes = (**a).clone();
            bytes.push(*byte as u8);
            ArturoVal::Binary(Rc::new(bytes))
        }
        (a, b) => {
            return Err(Error::type_mismatch(
                "append",
                "collection",
                ":string :char :block :binary",
                if a.kind() == ValueKind::Integer {
                    b.type_name()
                } else {
                    a.type_name()
                },
            ));
        }
    };
    vm.stack.push(result)
}

fn to_plain_string(v: &ArturoVal) -> String {
    match v {
        ArturoVal::String(s) => s.to_string(),
        other => other.to_string(),
    }
}

fn builtin_reverse(vm: &mut Vm, args: &[ArturoVal], _attrs: &Attrs) -> Result<()> {
    let result = match &args[0] {
        ArturoVal::String(s) => ArturoVal::string(s.chars().rev().collect::<String>()),
        ArturoVal::Block(b) | ArturoVal::Inline(b) => {
            let mut items = b.to_vec();
            items.reverse();
            ArturoVal::block(items)
        }
        other => {
            return Err(Error::type_mismatch(
                "reverse",
                "collection",
                ":string :block",
                other.type_name(),
            ));
        }
    };
    vm.stack.push(result)
}

fn builtin_split(vm: &mut Vm, args: &[ArturoVal], attrs: &Attrs) -> Result<()> {
    let text = match &args[0] {
        ArturoVal::String(s) => s.to_string(),
        other => {
            return Err(Error::type_mismatch(
                "split",
                "value",
                ":string",
                other.type_name(),
            ));
        }
    };
    let parts: Vec<ArturoVal> = if attrs.get("words").map(|v| v.is_truthy()).unwrap_or(false) {
        text.split_whitespace().map(ArturoVal::string).collect()
    } else if attrs.get("lines").map(|v| v.is_truthy()).unwrap_or(false) {
        text.lines().map(ArturoVal::string).collect()
    } else if let Some(sep) = attrs.get("by") {
        let sep = to_plain_string(sep);
        text.split(sep.as_str()).map(ArturoVal::string).collect()
    } else {
        text.chars().map(|c| ArturoVal::string(c.to_string())).collect()
    };
    vm.stack.push(ArturoVal::block(parts))
}

fn builtin_join(vm: &mut Vm, args: &[ArturoVal], attrs: &Attrs) -> Result<()> {
    let sep = attrs.get("with").map(to_plain_string).unwrap_or_default();
    let ArturoVal::Block(b) = &args[0] else {
        return Err(Error::type_mismatch(
            "join",
            "collection",
            ":block",
            args[0].type_name(),
        ));
    };
    let joined = b
        .items()
        .iter()
        .map(to_plain_string)
        .collect::<Vec<_>>()
        .join(&sep);
    vm.stack.push(ArturoVal::string(joined))
}

fn builtin_replace(vm: &mut Vm, args: &[ArturoVal], _attrs: &Attrs) -> Result<()> {
    let result = match (&args[0], &args[1]) {
        (ArturoVal::String(s), ArturoVal::String(what)) => {
            ArturoVal::string(s.replace(&**what, &to_plain_string(&args[2])))
        }
        (ArturoVal::String(s), ArturoVal::Regex(re)) => ArturoVal::string(
            re.compiled
                .replace_all(s, to_plain_string(&args[2]).as_str())
                .to_string(),
        ),
        (ArturoVal::Block(b), what) => {
            let items = b
                .to_vec()
                .into_iter()
                .map(|item| if item == *what { args[2].clone() } else { item })
                .collect();
            ArturoVal::block(items)
        }
        (a, _) => {
            return Err(Error::type_mismatch(
                "replace",
                "collection",
                ":string :block",
                a.type_name(),
            ));
        }
    };
    vm.stack.push(result)
}

fn builtin_first(vm: &mut Vm, args: &[ArturoVal], _attrs: &Attrs) -> Result<()> {
    let result = match &args[0] {
        ArturoVal::Block(b) | ArturoVal::Inline(b) => b.get(0).unwrap_or(ArturoVal::Null),
        ArturoVal::String(s) => s.chars().next().map(ArturoVal::Char).unwrap_or(ArturoVal::Null),
        ArturoVal::Range(r) => r.iter().next().unwrap_or(ArturoVal::Null),
        other => {
            return Err(Error::type_mismatch(
                "first",
                "collection",
                ":block :string :range",
                other.type_name(),
            ));
        }
    };
    vm.stack.push(result)
}

fn builtin_last(vm: &mut Vm, args: &[ArturoVal], _attrs: &Attrs) -> Result<()> {
    let result = match &args[0] {
        ArturoVal::Block(b) | ArturoVal::Inline(b) => {
            let len = b.len();
            if len == 0 {
                ArturoVal::Null
            } else {
                b.get(len - 1).unwrap_or(ArturoVal::Null)
            }
        }
        ArturoVal::String(s) => s.chars().last().map(ArturoVal::Char).unwrap_or(ArturoVal::Null),
        ArturoVal::Range(r) => {
            if r.infinite {
                ArturoVal::Null
            } else {
                r.iter().last().unwrap_or(ArturoVal::Null)
            }
        }
        other => {
            return Err(Error::type_mismatch(
                "last",
                "collection",
                ":block :string :range",
                other.type_name(),
            ));
        }
    };
    vm.stack.push(result)
}

fn builtin_contains(vm: &mut Vm, args: &[ArturoVal], _attrs: &Attrs) -> Result<()> {
    let found = match (&args[0], &args[1]) {
        (ArturoVal::String(s), needle) => s.contains(to_plain_string(needle).as_str()),
        (ArturoVal::Block(b) | ArturoVal::Inline(b), needle) => {
            b.items().iter().any(|item| item == needle)
        }
        (ArturoVal::Dictionary(d), needle) => d.borrow().values().any(|v| v == needle),
        (ArturoVal::Range(r), needle) => match needle.exact_i64() {
            Some(_) => r.iter().take(1_000_000).any(|v| &v == needle),
            None => false,
        },
        (a, _) => {
            return Err(Error::type_mismatch(
                "contains?",
                "collection",
                ":string :block :dictionary :range",
                a.type_name(),
            ));
        }
    };
    vm.stack.push(ArturoVal::Logical(found))
}

fn builtin_sort(vm: &mut Vm, args: &[ArturoVal], attrs: &Attrs) -> Result<()> {
    let ArturoVal::Block(b) = &args[0] else {
        return Err(Error::type_mismatch(
            "sort",
            "collection",
            ":block",
            args[0].type_name(),
        ));
    };
    let mut items = b.to_vec();
    items.sort_by(|a, b| a.compare(b).unwrap_or(std::cmp::Ordering::Equal));
    if attrs.get("descending").map(|v| v.is_truthy()).unwrap_or(false) {
        items.reverse();
    }
    vm.stack.push(ArturoVal::block(items))
}

fn builtin_keys(vm: &mut Vm, args: &[ArturoVal], _attrs: &Attrs) -> Result<()> {
    let keys: Vec<ArturoVal> = match &args[0] {
        ArturoVal::Dictionary(d) => d.keys().into_iter().map(ArturoVal::string).collect(),
        ArturoVal::Object(o) => o.fields().keys().map(ArturoVal::string).collect(),
        other => {
            return Err(Error::type_mismatch(
                "keys",
                "collection",
                ":dictionary :object",
                other.type_name(),
            ));
        }
    };
    vm.stack.push(ArturoVal::block(keys))
}

fn builtin_values(vm: &mut Vm, args: &[ArturoVal], _attrs: &Attrs) -> Result<()> {
    let values: Vec<ArturoVal> = match &args[0] {
        ArturoVal::Dictionary(d) => d.borrow().values().cloned().collect(),
        ArturoVal::Object(o) => o.fields().values().cloned().collect(),
        other => {
            return Err(Error::type_mismatch(
                "values",
                "collection",
                ":dictionary :object",
                other.type_name(),
            ));
        }
    };
    vm.stack.push(ArturoVal::block(values))
}

// ============================================================================
// Generators
// ============================================================================

fn builtin_array(vm: &mut Vm, args: &[ArturoVal], _attrs: &Attrs) -> Result<()> {
    let items = match &args[0] {
        ArturoVal::Block(_) | ArturoVal::Inline(_) => vm.exec_collect(&args[0])?,
        ArturoVal::Range(r) => {
            if r.infinite {
                return Err(Error::internal("An infinite range cannot materialize"));
            }
            r.iter().collect()
        }
        ArturoVal::String(s) => s
            .chars()
            .map(|c| ArturoVal::string(c.to_string()))
            .collect(),
        other => vec![other.clone()],
    };
    vm.stack.push(ArturoVal::block(items))
}

fn builtin_dictionary(vm: &mut Vm, args: &[ArturoVal], _attrs: &Attrs) -> Result<()> {
    let ArturoVal::Block(block) = &args[0] else {
        return Err(Error::type_mismatch(
            "dictionary",
            "block",
            ":block",
            args[0].type_name(),
        ));
    };
    let map = vm.exec_dictionary_block(block)?;
    vm.stack.push(ArturoVal::dictionary(map))
}

/// Build a user function from a params block and a body block. Attributes
/// select memoization, inline execution, imports and exports.
fn builtin_function(vm: &mut Vm, args: &[ArturoVal], attrs: &Attrs) -> Result<()> {
    let ArturoVal::Block(params_block) = &args[0] else {
        return Err(Error::type_mismatch(
            "function",
            "params",
            ":block",
            args[0].type_name(),
        ));
    };
    let ArturoVal::Block(body) = &args[1] else {
        return Err(Error::type_mismatch(
            "function",
            "body",
            ":block",
            args[1].type_name(),
        ));
    };

    let mut params: Vec<Rc<str>> = Vec::new();
    let mut param_kinds: Vec<Option<KindSet>> = Vec::new();
    for item in params_block.items().iter() {
        match item {
            ArturoVal::Word(name) | ArturoVal::Literal(name) => {
                params.push(name.clone());
                param_kinds.push(None);
            }
            // A type literal constrains the parameter before it.
            ArturoVal::Type(TypeVal::Builtin(kind)) => {
                if let Some(last) = param_kinds.last_mut() {
                    let set = last
                        .map(|s| s.or(KindSet::only(*kind)))
                        .unwrap_or_else(|| KindSet::only(*kind));
                    *last = Some(set);
                }
            }
            ArturoVal::Type(TypeVal::User(_)) => {
                if let Some(last) = param_kinds.last_mut() {
                    let set = last
                        .map(|s| s.or(KindSet::only(ValueKind::Object)))
                        .unwrap_or_else(|| KindSet::only(ValueKind::Object));
                    *last = Some(set);
                }
            }
            _ => {}
        }
    }

    let mut func = UserFunction::new(params, body.clone());
    func.param_kinds = param_kinds;
    func.memoize = attrs.get("memoize").map(|v| v.is_truthy()).unwrap_or(false);
    func.inline = attrs.get("inline").map(|v| v.is_truthy()).unwrap_or(false);
    if let Some(ArturoVal::Dictionary(imports)) = attrs.get("import") {
        func.imports = Some(imports.clone());
    }
    if let Some(ArturoVal::Block(exports)) = attrs.get("export") {
        func.exports = exports
            .items()
            .iter()
            .filter_map(|item| match item {
                ArturoVal::Word(n) | ArturoVal::Literal(n) => Some(n.clone()),
                _ => None,
            })
            .collect();
    }

    vm.stack
        .push(ArturoVal::Function(Rc::new(FunctionVal::User(func))))
}

fn builtin_range(vm: &mut Vm, args: &[ArturoVal], attrs: &Attrs) -> Result<()> {
    let step = match attrs.get("step") {
        Some(v) => v.exact_i64().ok_or_else(|| {
            Error::type_mismatch("range", "step", ":integer", v.type_name())
        })?,
        None => 1,
    };
    if step == 0 {
        return Err(Error::range_zero_step());
    }

    let range = match (&args[0], &args[1]) {
        (ArturoVal::Char(a), ArturoVal::Char(b)) => RangeVal::chars(*a, *b, step),
        (a, b) => {
            let start = a.exact_i64().ok_or_else(|| {
                Error::type_mismatch("range", "from", ":integer :char", a.type_name())
            })?;
            let stop = b.exact_i64().ok_or_else(|| {
                Error::type_mismatch("range", "to", ":integer :char", b.type_name())
            })?;
            RangeVal::new(start, stop, step)
        }
    };
    vm.stack.push(ArturoVal::Range(Rc::new(range)))
}

pub(crate) fn register(reg: &mut Registry) {
    reg.add(builtin(
        "get",
        "element of a collection at the given index or key",
        &[("collection", indexable_kinds()), ("key", any())],
        &[],
        any(),
        "get [1 2 3] 0",
        Some(OpCode::Get),
        builtin_get,
    ));
    reg.add(builtin(
        "set",
        "write an element of a collection at the given index or key",
        &[
            ("collection", sized_kinds()),
            ("key", any()),
            ("value", any()),
        ],
        &[],
        KindSet::NONE,
        "set d 'name \"Jane\"",
        Some(OpCode::Set),
        builtin_set,
    ));
    reg.add(builtin(
        "size",
        "number of elements in a collection",
        &[("collection", sized_kinds())],
        &[],
        integer(),
        "size [1 2 3]",
        Some(OpCode::Size),
        builtin_size,
    ));
    reg.add(builtin(
        "append",
        "a copy of the collection with the value appended",
        &[("collection", any()), ("value", any())],
        &[],
        any(),
        "append [1 2] 3",
        Some(OpCode::Append),
        builtin_append,
    ));
    reg.add(builtin(
        "reverse",
        "a reversed copy of a string or block",
        &[
            ("collection", KindSet::of(&[ValueKind::String, ValueKind::Block, ValueKind::Inline])),
        ],
        &[],
        any(),
        "reverse [1 2 3]",
        Some(OpCode::Reverse),
        builtin_reverse,
    ));
    reg.add(builtin(
        "split",
        "split a string into a block of parts",
        &[("value", string())],
        &[
            ("by", textual(), "separator to split at"),
            ("words", logical(), "split at whitespace"),
            ("lines", logical(), "split at line breaks"),
        ],
        KindSet::only(ValueKind::Block),
        "split.words \"hello there world\"",
        Some(OpCode::Split),
        builtin_split,
    ));
    reg.add(builtin(
        "join",
        "join a block of values into a single string",
        &[("collection", blockish())],
        &[("with", textual(), "separator between elements")],
        string(),
        "join.with: \",\" [\"a\" \"b\"]",
        Some(OpCode::Join),
        builtin_join,
    ));
    reg.add(builtin(
        "replace",
        "replace occurrences inside a string or block",
        &[
            ("collection", KindSet::of(&[ValueKind::String, ValueKind::Block])),
            ("what", any()),
            ("with", any()),
        ],
        &[],
        any(),
        "replace \"hello\" \"l\" \"L\"",
        Some(OpCode::Replace),
        builtin_replace,
    ));
    reg.add(builtin(
        "first",
        "the first element of a collection, or null when empty",
        &[
            ("collection", KindSet::of(&[ValueKind::Block, ValueKind::Inline, ValueKind::String, ValueKind::Range])),
        ],
        &[],
        any(),
        "first [1 2 3]",
        None,
        builtin_first,
    ));
    reg.add(builtin(
        "last",
        "the last element of a collection, or null when empty",
        &[
            ("collection", KindSet::of(&[ValueKind::Block, ValueKind::Inline, ValueKind::String, ValueKind::Range])),
        ],
        &[],
        any(),
        "last [1 2 3]",
        None,
        builtin_last,
    ));
    reg.add(builtin(
        "contains?",
        "whether a collection contains the given value",
        &[
            ("collection", KindSet::of(&[ValueKind::String, ValueKind::Block, ValueKind::Inline, ValueKind::Dictionary, ValueKind::Range])),
            ("value", any()),
        ],
        &[],
        logical(),
        "contains? [1 2 3] 2",
        None,
        builtin_contains,
    ));
    reg.add(builtin(
        "sort",
        "a sorted copy of a block",
        &[("collection", KindSet::only(ValueKind::Block))],
        &[("descending", logical(), "sort in descending order")],
        KindSet::only(ValueKind::Block),
        "sort [3 1 2]",
        None,
        builtin_sort,
    ));
    reg.add(builtin(
        "keys",
        "the keys of a dictionary or object, as a block",
        &[("collection", KindSet::of(&[ValueKind::Dictionary, ValueKind::Object]))],
        &[],
        KindSet::only(ValueKind::Block),
        "keys #[a: 1 b: 2]",
        None,
        builtin_keys,
    ));
    reg.add(builtin(
        "values",
        "the values of a dictionary or object, as a block",
        &[("collection", KindSet::of(&[ValueKind::Dictionary, ValueKind::Object]))],
        &[],
        KindSet::only(ValueKind::Block),
        "values #[a: 1 b: 2]",
        None,
        builtin_values,
    ));
    reg.add(builtin(
        "array",
        "materialize a block, range or string into a fresh array",
        &[("source", any())],
        &[],
        KindSet::only(ValueKind::Block),
        "array 1..5",
        Some(OpCode::Array),
        builtin_array,
    ));
    reg.add(builtin(
        "dictionary",
        "execute a block and collect its definitions into a dictionary",
        &[("block", KindSet::only(ValueKind::Block))],
        &[],
        KindSet::only(ValueKind::Dictionary),
        "dictionary [name: \"Jane\" age: 33]",
        Some(OpCode::Dict),
        builtin_dictionary,
    ));
    reg.add(builtin(
        "function",
        "build a function from a parameter block and a body block",
        &[("params", KindSet::only(ValueKind::Block)), ("body", KindSet::only(ValueKind::Block))],
        &[
            ("memoize", logical(), "cache results per argument tuple"),
            ("inline", logical(), "run in the caller's scope, without a frame"),
            ("import", KindSet::only(ValueKind::Dictionary), "symbols merged into the call scope"),
            ("export", KindSet::only(ValueKind::Block), "symbols propagated back to the caller"),
        ],
        KindSet::only(ValueKind::Function),
        "add1: function [x][x + 1]",
        Some(OpCode::Func),
        builtin_function,
    ));
    reg.add(builtin(
        "range",
        "build a range between two bounds",
        &[
            ("from", KindSet::of(&[ValueKind::Integer, ValueKind::Char])),
            ("to", KindSet::of(&[ValueKind::Integer, ValueKind::Char])),
        ],
        &[("step", integer(), "iteration step, defaults to 1")],
        KindSet::only(ValueKind::Range),
        "range 1 10",
        Some(OpCode::Range),
        builtin_range,
    ));
}
