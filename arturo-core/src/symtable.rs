// arturo-core - Symbol table and scoping for the Arturo VM
// Copyright (c) 2026 The Arturo Project Contributors. MIT licensed.

//! The symbol table: insertion-ordered scopes with two-level resolution.
//!
//! The bottom scope holds globals. Each user-function call pushes one scope;
//! lookup checks the topmost scope first and falls back to the globals.
//! Blocks execute in the current scope; the helpers here give iteration
//! builtins save-and-restore bindings and give dictionary blocks the
//! snapshot/diff discipline.

use arturo_parser::ArturoVal;
use indexmap::IndexMap;

/// One scope level: an insertion-ordered name to value mapping.
pub type Scope = IndexMap<String, ArturoVal>;

/// The VM's symbol table.
#[derive(Debug, Default)]
pub struct SymTable {
    scopes: Vec<Scope>,
}

impl SymTable {
    /// Create a table with an empty global scope.
    pub fn new() -> SymTable {
        SymTable {
            scopes: vec![Scope::new()],
        }
    }

    /// Number of scopes, including the global one.
    pub fn depth(&self) -> usize {
        self.scopes.len()
    }

    /// Push a fresh scope (a user-function frame).
    pub fn push_scope(&mut self, scope: Scope) {
        self.scopes.push(scope);
    }

    /// Pop the topmost scope. The global scope is never popped.
    pub fn pop_scope(&mut self) -> Scope {
        debug_assert!(self.scopes.len() > 1, "attempted to pop the global scope");
        self.scopes.pop().unwrap_or_default()
    }

    /// Look up a name: topmost scope first, then the globals.
    pub fn get(&self, name: &str) -> Option<&ArturoVal> {
        if let Some(top) = self.scopes.last() {
            if let Some(v) = top.get(name) {
                return Some(v);
            }
        }
        if self.scopes.len() > 1 {
            return self.scopes[0].get(name);
        }
        None
    }

    /// Whether a name resolves at all.
    pub fn is_defined(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    /// Bind a name in the current scope.
    pub fn set(&mut self, name: &str, value: ArturoVal) {
        self.scopes
            .last_mut()
            .expect("symbol table always has a scope")
            .insert(name.to_string(), value);
    }

    /// Bind a name in the global scope regardless of depth.
    pub fn set_global(&mut self, name: &str, value: ArturoVal) {
        self.scopes[0].insert(name.to_string(), value);
    }

    /// Clone of the current scope, for snapshot/restore.
    pub fn snapshot(&self) -> Scope {
        self.scopes.last().cloned().unwrap_or_default()
    }

    /// Replace the current scope with a snapshot.
    pub fn restore(&mut self, snapshot: Scope) {
        if let Some(top) = self.scopes.last_mut() {
            *top = snapshot;
        }
    }

    /// Symbols newly introduced or changed in the current scope relative to
    /// a snapshot, in insertion order. Dictionary blocks collect these.
    pub fn diff_since(&self, snapshot: &Scope) -> Scope {
        let mut out = Scope::new();
        if let Some(top) = self.scopes.last() {
            for (k, v) in top.iter() {
                match snapshot.get(k) {
                    Some(old) if old == v => {}
                    _ => {
                        out.insert(k.clone(), v.clone());
                    }
                }
            }
        }
        out
    }

    /// Drop names that a snapshot did not contain, keeping updated values of
    /// the ones it did. Scoped block execution merges back this way unless
    /// exec-in-parent is requested.
    pub fn retain_existing(&mut self, snapshot: &Scope) {
        if let Some(top) = self.scopes.last_mut() {
            top.retain(|k, _| snapshot.contains_key(k));
        }
    }

    /// Record the current values of some names, for save-and-restore around
    /// a block executed with argument bindings.
    pub fn save_bindings(&self, names: &[&str]) -> Vec<(String, Option<ArturoVal>)> {
        let top = self.scopes.last();
        names
            .iter()
            .map(|n| {
                (
                    n.to_string(),
                    top.and_then(|s| s.get(*n).cloned()),
                )
            })
            .collect()
    }

    /// Undo `save_bindings`: prior values come back, names that did not
    /// exist disappear again.
    pub fn restore_bindings(&mut self, saved: Vec<(String, Option<ArturoVal>)>) {
        if let Some(top) = self.scopes.last_mut() {
            for (name, value) in saved {
                match value {
                    Some(v) => {
                        top.insert(name, v);
                    }
                    None => {
                        top.shift_remove(&name);
                    }
                }
            }
        }
    }

    /// All names visible from the current scope, globals included.
    pub fn visible_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.scopes[0].keys().cloned().collect();
        if self.scopes.len() > 1 {
            if let Some(top) = self.scopes.last() {
                for k in top.keys() {
                    if !names.contains(k) {
                        names.push(k.clone());
                    }
                }
            }
        }
        names
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_set_and_get() {
        let mut t = SymTable::new();
        t.set("x", ArturoVal::Integer(42));
        assert_eq!(t.get("x"), Some(&ArturoVal::Integer(42)));
        assert_eq!(t.get("y"), None);
    }

    #[test]
    fn test_function_scope_shadows_global() {
        let mut t = SymTable::new();
        t.set("x", ArturoVal::Integer(1));
        t.push_scope(Scope::new());
        t.set("x", ArturoVal::Integer(2));
        assert_eq!(t.get("x"), Some(&ArturoVal::Integer(2)));
        t.pop_scope();
        assert_eq!(t.get("x"), Some(&ArturoVal::Integer(1)));
    }

    #[test]
    fn test_global_fallback_from_scope() {
        let mut t = SymTable::new();
        t.set("g", ArturoVal::Integer(7));
        t.push_scope(Scope::new());
        assert_eq!(t.get("g"), Some(&ArturoVal::Integer(7)));
    }

    #[test]
    fn test_diff_since_collects_new_and_changed() {
        let mut t = SymTable::new();
        t.set("a", ArturoVal::Integer(1));
        let snap = t.snapshot();
        t.set("a", ArturoVal::Integer(9));
        t.set("b", ArturoVal::Integer(2));
        let diff = t.diff_since(&snap);
        assert_eq!(diff.len(), 2);
        assert_eq!(diff.get("a"), Some(&ArturoVal::Integer(9)));
        assert_eq!(diff.get("b"), Some(&ArturoVal::Integer(2)));
    }

    #[test]
    fn test_save_restore_bindings() {
        let mut t = SymTable::new();
        t.set("x", ArturoVal::Integer(1));
        let saved = t.save_bindings(&["x", "y"]);
        t.set("x", ArturoVal::Integer(100));
        t.set("y", ArturoVal::Integer(200));
        t.restore_bindings(saved);
        assert_eq!(t.get("x"), Some(&ArturoVal::Integer(1)));
        assert_eq!(t.get("y"), None);
    }

    #[test]
    fn test_retain_existing() {
        let mut t = SymTable::new();
        t.set("a", ArturoVal::Integer(1));
        let snap = t.snapshot();
        t.set("a", ArturoVal::Integer(5));
        t.set("tmp", ArturoVal::Integer(0));
        t.retain_existing(&snap);
        assert_eq!(t.get("a"), Some(&ArturoVal::Integer(5)));
        assert_eq!(t.get("tmp"), None);
    }
}
