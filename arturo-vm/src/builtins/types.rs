// arturo-vm - Bytecode translator and virtual machine for the Arturo programming language
// Copyright (c) 2026 The Arturo Project Contributors. MIT licensed.

//! User-type definition and reflection builtins.

use arturo_core::{Error, Result};
use arturo_parser::{ArturoVal, KindSet, TypeVal, ValueKind};

use crate::builtins::{any, builtin, logical, textual, Attrs, Registry};
use crate::vm::Vm;

/// `define :type [fields] [prototype]`.
///
/// The prototype block executes as a dictionary; its functions become
/// methods, with `init`, `print` and `compare` transformed into the
/// `doInit`/`doPrint`/`doCompare` hooks. `.as:` inherits another type's
/// methods first, `.having:` extends the field list.
fn builtin_define(vm: &mut Vm, args: &[ArturoVal], attrs: &Attrs) -> Result<()> {
    let ArturoVal::Type(TypeVal::User(type_name)) = &args[0] else {
        return Err(Error::type_mismatch(
            "define",
            "type",
            "a user :type",
            args[0].type_name(),
        ));
    };
    let ArturoVal::Block(fields_block) = &args[1] else {
        return Err(Error::type_mismatch(
            "define",
            "fields",
            ":block",
            args[1].type_name(),
        ));
    };
    let ArturoVal::Block(proto_block) = &args[2] else {
        return Err(Error::type_mismatch(
            "define",
            "prototype",
            ":block",
            args[2].type_name(),
        ));
    };

    let methods = vm.exec_dictionary_block(proto_block)?;

    let proto_rc = vm.types.define(type_name);
    {
        let mut proto = proto_rc.borrow_mut();
        proto.reset();

        for item in fields_block.items().iter() {
            if let ArturoVal::Word(n) | ArturoVal::Literal(n) = item {
                proto.fields.push(n.clone());
            }
        }
        if let Some(ArturoVal::Block(extra)) = attrs.get("having") {
            for item in extra.items().iter() {
                if let ArturoVal::Word(n) | ArturoVal::Literal(n) = item {
                    proto.fields.push(n.clone());
                }
            }
        }
    }

    // Inherited methods install first so the prototype's own override them.
    if let Some(ArturoVal::Type(parent)) = attrs.get("as") {
        let parent_rc = vm.types.get(parent.name()).ok_or_else(|| {
            Error::symbol_not_found(format!(":{}", parent.name()))
        })?;
        let parent_proto = parent_rc.borrow();
        let mut proto = proto_rc.borrow_mut();
        proto.inherits = Some(parent_proto.name.clone());
        for (k, v) in parent_proto.methods.iter() {
            proto.methods.insert(k.clone(), v.clone());
        }
        proto.do_init = parent_proto.do_init.clone();
        proto.do_print = parent_proto.do_print.clone();
        proto.do_compare = parent_proto.do_compare.clone();
    }

    {
        let mut proto = proto_rc.borrow_mut();
        for (name, value) in methods {
            proto.install_method(&name, value);
        }
    }

    Ok(())
}

/// Type predicate: `is? :integer 5`, `is? :person p`.
fn builtin_is(vm: &mut Vm, args: &[ArturoVal], _attrs: &Attrs) -> Result<()> {
    let ArturoVal::Type(target) = &args[0] else {
        return Err(Error::type_mismatch(
            "is?",
            "type",
            ":type",
            args[0].type_name(),
        ));
    };
    let matches = match target {
        TypeVal::Builtin(kind) => args[1].kind() == *kind,
        TypeVal::User(name) => match &args[1] {
            ArturoVal::Object(obj) => {
                // Walk the inheritance chain through the registry.
                let mut current = Some(obj.proto().to_string());
                let mut found = false;
                while let Some(proto_name) = current {
                    if proto_name == **name {
                        found = true;
                        break;
                    }
                    current = vm
                        .types
                        .get(&proto_name)
                        .and_then(|p| p.borrow().inherits.clone())
                        .map(|n| n.to_string());
                }
                found
            }
            _ => false,
        },
    };
    vm.stack.push(ArturoVal::Logical(matches))
}

fn builtin_type(vm: &mut Vm, args: &[ArturoVal], _attrs: &Attrs) -> Result<()> {
    let t = match &args[0] {
        ArturoVal::Object(obj) => TypeVal::User(std::rc::Rc::from(obj.proto())),
        other => TypeVal::Builtin(other.kind()),
    };
    vm.stack.push(ArturoVal::Type(t))
}

/// Value of a named attribute of the current function call, or null.
fn builtin_attr(vm: &mut Vm, args: &[ArturoVal], _attrs: &Attrs) -> Result<()> {
    let name = args[0].text().ok_or_else(|| {
        Error::type_mismatch("attr", "name", ":string :word :literal", args[0].type_name())
    })?;
    let value = vm.fn_attr(name).unwrap_or(ArturoVal::Null);
    vm.stack.push(value)
}

fn builtin_attr_p(vm: &mut Vm, args: &[ArturoVal], _attrs: &Attrs) -> Result<()> {
    let name = args[0].text().ok_or_else(|| {
        Error::type_mismatch("attr?", "name", ":string :word :literal", args[0].type_name())
    })?;
    let present = vm.fn_attr(name).is_some();
    vm.stack.push(ArturoVal::Logical(present))
}

fn builtin_throw(_vm: &mut Vm, args: &[ArturoVal], _attrs: &Attrs) -> Result<()> {
    Err(Error::thrown(args[0].clone()))
}

pub(crate) fn register(reg: &mut Registry) {
    reg.add(builtin(
        "define",
        "define a user type from a field list and a prototype block",
        &[
            ("type", KindSet::only(ValueKind::Type)),
            ("fields", KindSet::only(ValueKind::Block)),
            ("prototype", KindSet::only(ValueKind::Block)),
        ],
        &[
            ("as", KindSet::only(ValueKind::Type), "parent type to inherit methods from"),
            ("having", KindSet::only(ValueKind::Block), "additional constructor fields"),
        ],
        KindSet::NONE,
        "define :person [name age][]",
        None,
        builtin_define,
    ));
    reg.add(builtin(
        "is?",
        "whether a value has the given type",
        &[("type", KindSet::only(ValueKind::Type)), ("value", any())],
        &[],
        logical(),
        "is? :integer 5",
        None,
        builtin_is,
    ));
    reg.add(builtin(
        "type",
        "the type of a value",
        &[("value", any())],
        &[],
        KindSet::only(ValueKind::Type),
        "type 5",
        None,
        builtin_type,
    ));
    reg.add(builtin(
        "attr",
        "value of a named attribute of the current call, or null",
        &[("name", textual())],
        &[],
        any(),
        "greet: $[name][print attr 'prefix]",
        None,
        builtin_attr,
    ));
    reg.add(builtin(
        "attr?",
        "whether the current call received a named attribute",
        &[("name", textual())],
        &[],
        logical(),
        "greet: $[name][if attr? 'loud [print \"!\"]]",
        None,
        builtin_attr_p,
    ));
    reg.add(builtin(
        "throw",
        "raise a user error carrying the given value",
        &[("value", any())],
        &[],
        KindSet::NONE,
        "throw \"something went wrong\"",
        None,
        builtin_throw,
    ));
}
