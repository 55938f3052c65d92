// arturo-core - User-defined type prototypes
// Copyright (c) 2026 The Arturo Project Contributors. MIT licensed.

//! User-defined types.
//!
//! A `Prototype` records a type's field list, its method table and the magic
//! hooks derived from `init`, `print` and `compare`. All prototypes are owned
//! by the `TypeRegistry`; inheritance is a name key into the registry, never
//! an owning reference, so cycles cannot leak.

use std::cell::RefCell;
use std::rc::Rc;

use arturo_parser::{ArturoVal, FunctionVal, UserFunction};
use indexmap::IndexMap;

/// A user-defined type.
#[derive(Debug, Default)]
pub struct Prototype {
    pub name: Rc<str>,
    /// Field names consumed, in order, by the default constructor.
    pub fields: Vec<Rc<str>>,
    pub methods: IndexMap<String, ArturoVal>,
    /// Parent type name, resolved through the registry.
    pub inherits: Option<Rc<str>>,
    /// Derived hook: the `init` magic method with `this` prepended.
    pub do_init: Option<ArturoVal>,
    /// Derived hook: the `print` magic method with `this` prepended.
    pub do_print: Option<ArturoVal>,
    /// Derived hook: the `compare` magic method with `this` prepended.
    pub do_compare: Option<ArturoVal>,
}

impl Prototype {
    pub fn new(name: impl AsRef<str>) -> Prototype {
        Prototype {
            name: Rc::from(name.as_ref()),
            ..Default::default()
        }
    }

    /// Clear fields, methods and hooks, keeping the name. Redefinition
    /// starts from a clean slate.
    pub fn reset(&mut self) {
        self.fields.clear();
        self.methods.clear();
        self.inherits = None;
        self.do_init = None;
        self.do_print = None;
        self.do_compare = None;
    }

    /// Install a method, routing the magic names to their hooks.
    pub fn install_method(&mut self, name: &str, value: ArturoVal) {
        match name {
            "init" => self.do_init = bind_this(&value),
            "print" => self.do_print = bind_this(&value),
            "compare" => self.do_compare = bind_this(&value),
            _ => {
                let bound = bind_this(&value).unwrap_or(value);
                self.methods.insert(name.to_string(), bound);
            }
        }
    }
}

/// Owner of every prototype in a VM instance.
#[derive(Debug, Default)]
pub struct TypeRegistry {
    protos: IndexMap<String, Rc<RefCell<Prototype>>>,
}

impl TypeRegistry {
    pub fn new() -> TypeRegistry {
        TypeRegistry {
            protos: IndexMap::new(),
        }
    }

    /// Fetch or create the prototype for a type name.
    pub fn define(&mut self, name: &str) -> Rc<RefCell<Prototype>> {
        self.protos
            .entry(name.to_string())
            .or_insert_with(|| Rc::new(RefCell::new(Prototype::new(name))))
            .clone()
    }

    pub fn get(&self, name: &str) -> Option<Rc<RefCell<Prototype>>> {
        self.protos.get(name).cloned()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.protos.contains_key(name)
    }

    pub fn names(&self) -> Vec<String> {
        self.protos.keys().cloned().collect()
    }
}

/// Rebuild a user function so it receives the object as its first
/// parameter. Builtins and non-functions pass through as `None`.
pub fn bind_this(value: &ArturoVal) -> Option<ArturoVal> {
    let ArturoVal::Function(f) = value else {
        return None;
    };
    let FunctionVal::User(u) = &**f else {
        return None;
    };
    let mut params: Vec<Rc<str>> = Vec::with_capacity(u.params.len() + 1);
    params.push(Rc::from("this"));
    params.extend(u.params.iter().cloned());
    let mut param_kinds = vec![None];
    param_kinds.extend(u.param_kinds.iter().cloned());
    let bound = UserFunction {
        params,
        param_kinds,
        body: u.body.clone(),
        imports: u.imports.clone(),
        exports: u.exports.clone(),
        memoize: u.memoize,
        inline: u.inline,
        info: u.info.clone(),
        translation: RefCell::new(None),
    };
    Some(ArturoVal::Function(Rc::new(FunctionVal::User(bound))))
}

#[cfg(test)]
mod tests {
    use super::*;
    use arturo_parser::ArturoBlock;

    fn make_fn(params: &[&str]) -> ArturoVal {
        let f = UserFunction::new(
            params.iter().map(|p| Rc::from(*p)).collect(),
            ArturoBlock::new(vec![]),
        );
        ArturoVal::Function(Rc::new(FunctionVal::User(f)))
    }

    #[test]
    fn test_bind_this_prepends_parameter() {
        let f = make_fn(&["a", "b"]);
        let bound = bind_this(&f).unwrap();
        match bound {
            ArturoVal::Function(rc) => match &*rc {
                FunctionVal::User(u) => {
                    assert_eq!(u.params.len(), 3);
                    assert_eq!(&*u.params[0], "this");
                    assert_eq!(&*u.params[1], "a");
                }
                _ => panic!("expected user function"),
            },
            _ => panic!("expected function"),
        }
    }

    #[test]
    fn test_magic_methods_become_hooks() {
        let mut proto = Prototype::new("person");
        proto.install_method("init", make_fn(&["name"]));
        proto.install_method("greet", make_fn(&[]));
        assert!(proto.do_init.is_some());
        assert!(proto.methods.contains_key("greet"));
        assert!(!proto.methods.contains_key("init"));
    }

    #[test]
    fn test_registry_owns_prototypes() {
        let mut reg = TypeRegistry::new();
        let p = reg.define("person");
        p.borrow_mut().fields.push(Rc::from("name"));
        let again = reg.get("person").unwrap();
        assert_eq!(again.borrow().fields.len(), 1);
    }
}
