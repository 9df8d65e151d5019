//! Per-file index: everything learned about one translation unit or header.
//!
//! Built by a single front-end pass on one thread, then handed off whole to
//! persistence. Nothing here locks; files indexed in parallel never share an
//! `IndexFile`.

use super::def::VarParent;
use super::entity::{Entity, IndexFunc, IndexType, IndexVar, add_usage};
use super::func_ref::IndexFuncRef;
use super::id_cache::{IdCache, UsrMap};
use crate::util::push_unique;
use cxref_api::{
    Diagnostic, FuncHandle, Handle, HandleKind, LanguageId, Range, TypeHandle, Usr, VarHandle,
};
use serde::{Deserialize, Serialize};

/// Anything the front-end can derive a usr from, e.g. an AST cursor.
pub trait UsrSource {
    fn usr(&self) -> Usr;
}

impl UsrSource for Usr {
    fn usr(&self) -> Usr {
        self.clone()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct IndexInclude {
    /// Line of the `#include`; enough to make it clickable.
    pub line: u32,
    /// Absolute path of the included file.
    pub resolved_path: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct IndexFile {
    pub path: String,
    pub args: Vec<String>,
    pub last_modification_time: i64,
    pub language: LanguageId,

    /// Translation unit whose parse produced this file. For a header this is
    /// the source file to re-index when the header changes.
    pub import_file: String,

    /// Ranges the preprocessor skipped.
    pub skipped_by_preprocessor: Vec<Range>,

    pub includes: Vec<IndexInclude>,
    pub dependencies: Vec<String>,
    pub types: Vec<IndexType>,
    pub funcs: Vec<IndexFunc>,
    pub vars: Vec<IndexVar>,

    /// Rebuilt from the entity vectors on decode.
    #[serde(skip)]
    pub id_cache: IdCache,

    // Process-lifetime only.
    #[serde(skip)]
    pub diagnostics: Vec<Diagnostic>,
    #[serde(skip)]
    pub file_contents: String,
}

fn lookup<E: Entity>(entities: &[E], handle: Handle<E::Kind>) -> Option<&E> {
    entities.get(handle.index()?)
}

fn lookup_mut<E: Entity>(entities: &mut [E], handle: Handle<E::Kind>) -> Option<&mut E> {
    entities.get_mut(handle.index()?)
}

impl IndexFile {
    pub fn new(path: impl Into<String>, contents: impl Into<String>) -> Self {
        let path = path.into();
        Self {
            id_cache: IdCache::new(path.clone()),
            path,
            file_contents: contents.into(),
            ..Default::default()
        }
    }

    // ---- Identity ----

    pub fn resolve_type(&mut self, usr: impl Into<Usr>) -> TypeHandle {
        self.id_cache.types.resolve(usr.into(), &mut self.types)
    }

    pub fn resolve_func(&mut self, usr: impl Into<Usr>) -> FuncHandle {
        self.id_cache.funcs.resolve(usr.into(), &mut self.funcs)
    }

    pub fn resolve_var(&mut self, usr: impl Into<Usr>) -> VarHandle {
        self.id_cache.vars.resolve(usr.into(), &mut self.vars)
    }

    pub fn resolve_type_cursor(&mut self, cursor: &impl UsrSource) -> TypeHandle {
        self.resolve_type(cursor.usr())
    }

    pub fn resolve_func_cursor(&mut self, cursor: &impl UsrSource) -> FuncHandle {
        self.resolve_func(cursor.usr())
    }

    pub fn resolve_var_cursor(&mut self, cursor: &impl UsrSource) -> VarHandle {
        self.resolve_var(cursor.usr())
    }

    pub fn lookup_type(&self, handle: TypeHandle) -> Option<&IndexType> {
        lookup(&self.types, handle)
    }

    pub fn lookup_func(&self, handle: FuncHandle) -> Option<&IndexFunc> {
        lookup(&self.funcs, handle)
    }

    pub fn lookup_var(&self, handle: VarHandle) -> Option<&IndexVar> {
        lookup(&self.vars, handle)
    }

    pub fn lookup_type_mut(&mut self, handle: TypeHandle) -> Option<&mut IndexType> {
        lookup_mut(&mut self.types, handle)
    }

    pub fn lookup_func_mut(&mut self, handle: FuncHandle) -> Option<&mut IndexFunc> {
        lookup_mut(&mut self.funcs, handle)
    }

    pub fn lookup_var_mut(&mut self, handle: VarHandle) -> Option<&mut IndexVar> {
        lookup_mut(&mut self.vars, handle)
    }

    // ---- Facts reported by the front-end ----

    /// Fold a language-indicative construct into the file classification.
    pub fn observe_language(&mut self, observed: LanguageId) -> LanguageId {
        self.language = self.language.promote(observed);
        self.language
    }

    /// Record a usage of `ty`. `is_definition` keeps the definition site at
    /// the front of `uses`.
    pub fn add_type_usage(&mut self, ty: TypeHandle, range: Range, is_definition: bool) -> bool {
        let found = self
            .lookup_type_mut(ty)
            .map(|t| add_usage(&mut t.uses, range, is_definition));
        debug_assert!(found.is_some(), "unknown {:?}", ty);
        found.unwrap_or(false)
    }

    pub fn add_var_usage(&mut self, var: VarHandle, range: Range, is_definition: bool) -> bool {
        let found = self
            .lookup_var_mut(var)
            .map(|v| add_usage(&mut v.uses, range, is_definition));
        debug_assert!(found.is_some(), "unknown {:?}", var);
        found.unwrap_or(false)
    }

    /// Record a call on both ends: the callee's `callers` and, when the call
    /// is made inside a function, that function's `callees`.
    pub fn add_call(
        &mut self,
        caller: Option<FuncHandle>,
        callee: FuncHandle,
        loc: Range,
        is_implicit: bool,
    ) {
        let caller_id = caller.unwrap_or_else(FuncHandle::invalid);
        let target = self.lookup_func_mut(callee);
        debug_assert!(target.is_some(), "unknown callee {:?}", callee);
        if let Some(target) = target {
            target.add_caller(IndexFuncRef::new(caller_id, loc, is_implicit));
        }

        if let Some(source) = caller {
            if let Some(source) = self.lookup_func_mut(source) {
                source
                    .def
                    .add_callee(IndexFuncRef::new(callee, loc, is_implicit));
            }
        }
    }

    /// `derived` inherits from `parent`.
    pub fn add_type_parent(&mut self, derived: TypeHandle, parent: TypeHandle) {
        if let Some(child) = self.lookup_type_mut(derived) {
            child.def.add_parent(parent);
        }
        if let Some(base) = self.lookup_type_mut(parent) {
            base.add_derived(derived);
        }
    }

    /// `derived` overrides `base`.
    pub fn add_func_override(&mut self, derived: FuncHandle, base: FuncHandle) {
        if let Some(child) = self.lookup_func_mut(derived) {
            child.def.add_base(base);
        }
        if let Some(parent) = self.lookup_func_mut(base) {
            parent.add_derived(derived);
        }
    }

    /// `var` is declared with type `ty`.
    pub fn add_type_instance(&mut self, ty: TypeHandle, var: VarHandle) {
        if let Some(t) = self.lookup_type_mut(ty) {
            t.add_instance(var);
        }
        if let Some(v) = self.lookup_var_mut(var) {
            v.def.variable_type.get_or_insert(ty);
        }
    }

    pub fn add_include(&mut self, line: u32, resolved_path: impl Into<String>) {
        self.includes.push(IndexInclude {
            line,
            resolved_path: resolved_path.into(),
        });
    }

    pub fn add_dependency(&mut self, path: impl Into<String>) -> bool {
        let path = path.into();
        if path == self.path {
            return false;
        }
        push_unique(&mut self.dependencies, path)
    }

    pub fn add_skipped_range(&mut self, range: Range) {
        self.skipped_by_preprocessor.push(range);
    }

    pub fn add_diagnostic(&mut self, diagnostic: Diagnostic) {
        self.diagnostics.push(diagnostic);
    }

    // ---- Integrity ----

    /// Restore the identity cache after decoding.
    pub fn rebuild_id_cache(&mut self) -> Result<(), String> {
        let mut cache = IdCache::new(self.path.clone());
        cache.types = UsrMap::rebuild(&self.types)?;
        cache.funcs = UsrMap::rebuild(&self.funcs)?;
        cache.vars = UsrMap::rebuild(&self.vars)?;
        self.id_cache = cache;
        Ok(())
    }

    /// Every handle stored in a relationship must name an entity of this
    /// file. Call sites outside any function are the one allowed absence.
    pub fn check_references(&self) -> Result<(), String> {
        fn check<K: HandleKind>(what: &str, handle: Handle<K>, len: usize) -> Result<(), String> {
            match handle.index() {
                Some(i) if i < len => Ok(()),
                _ => Err(format!("{} refers to missing {:?}", what, handle)),
            }
        }
        let (nt, nf, nv) = (self.types.len(), self.funcs.len(), self.vars.len());

        for ty in &self.types {
            let what = ty.usr.as_str();
            if let Some(alias) = ty.def.alias_of {
                check(what, alias, nt)?;
            }
            for &h in ty.def.parents.iter().chain(&ty.def.types).chain(&ty.derived) {
                check(what, h, nt)?;
            }
            for &h in &ty.def.funcs {
                check(what, h, nf)?;
            }
            for &h in ty.def.vars.iter().chain(&ty.instances) {
                check(what, h, nv)?;
            }
        }

        for func in &self.funcs {
            let what = func.usr.as_str();
            if let Some(owner) = func.def.declaring_type {
                check(what, owner, nt)?;
            }
            for &h in func.def.base.iter().chain(&func.derived) {
                check(what, h, nf)?;
            }
            for &h in &func.def.locals {
                check(what, h, nv)?;
            }
            for r in &func.def.callees {
                check(what, r.id, nf)?;
            }
            for r in &func.callers {
                if let Some(h) = r.function() {
                    check(what, h, nf)?;
                }
            }
        }

        for var in &self.vars {
            let what = var.usr.as_str();
            if let Some(ty) = var.def.variable_type {
                check(what, ty, nt)?;
            }
            match var.def.parent {
                VarParent::Type(h) => check(what, h, nt)?,
                VarParent::Func(h) => check(what, h, nf)?,
                VarParent::None | VarParent::File => {}
            }
        }

        Ok(())
    }

    /// Compare everything that a cache file records; transient fields and the
    /// derived identity cache are ignored.
    pub fn persisted_eq(&self, other: &Self) -> bool {
        fn all_eq<T>(a: &[T], b: &[T], eq: impl Fn(&T, &T) -> bool) -> bool {
            a.len() == b.len() && a.iter().zip(b).all(|(x, y)| eq(x, y))
        }

        self.path == other.path
            && self.args == other.args
            && self.last_modification_time == other.last_modification_time
            && self.language == other.language
            && self.import_file == other.import_file
            && self.skipped_by_preprocessor == other.skipped_by_preprocessor
            && self.includes == other.includes
            && self.dependencies == other.dependencies
            && all_eq(&self.types, &other.types, IndexType::persisted_eq)
            && all_eq(&self.funcs, &other.funcs, IndexFunc::persisted_eq)
            && all_eq(&self.vars, &other.vars, IndexVar::persisted_eq)
    }

    pub fn entity_count(&self) -> usize {
        self.types.len() + self.funcs.len() + self.vars.len()
    }

    /// Human-readable dump, the JSON cache form pretty-printed.
    pub fn to_pretty_json(&self) -> crate::Result<String> {
        crate::storage::to_pretty_json(self)
    }
}
