//! Indexed entities: identity, definition, and the reverse relationships
//! (who derives from, calls, or uses this symbol) that are not part of the
//! definition itself.
//!
//! Entities compare, hash and order by handle alone. Use `persisted_eq` to
//! compare everything that is written to a cache file.

use super::def::{FuncDef, TypeDef, VarDef};
use super::func_ref::IndexFuncRef;
use crate::util::push_unique;
use cxref_api::{
    FuncHandle, FuncKind, Handle, HandleKind, Range, TypeHandle, TypeKind, Usr, VarHandle,
    VarKind,
};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::hash::{Hash, Hasher};

pub trait Entity {
    type Kind: HandleKind;

    fn create(id: Handle<Self::Kind>, usr: Usr) -> Self;
    fn id(&self) -> Handle<Self::Kind>;
    fn usr(&self) -> &Usr;
}

macro_rules! impl_entity {
    ($entity:ident, $kind:ty) => {
        impl Entity for $entity {
            type Kind = $kind;

            fn create(id: Handle<$kind>, usr: Usr) -> Self {
                Self {
                    usr,
                    id,
                    ..Default::default()
                }
            }

            fn id(&self) -> Handle<$kind> {
                self.id
            }

            fn usr(&self) -> &Usr {
                &self.usr
            }
        }

        impl PartialEq for $entity {
            fn eq(&self, other: &Self) -> bool {
                self.id == other.id
            }
        }

        impl Eq for $entity {}

        impl PartialOrd for $entity {
            fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
                Some(self.cmp(other))
            }
        }

        impl Ord for $entity {
            fn cmp(&self, other: &Self) -> Ordering {
                self.id.cmp(&other.id)
            }
        }

        impl Hash for $entity {
            fn hash<H: Hasher>(&self, state: &mut H) {
                self.id.hash(state);
            }
        }
    };
}

/// Record a usage range once. The single entry point for growing `uses`
/// lists, so any future dedup policy lives here.
///
/// `insert_first` puts the range at the front, which is where the definition
/// site goes.
pub fn add_usage(uses: &mut Vec<Range>, range: Range, insert_first: bool) -> bool {
    if uses.contains(&range) {
        return false;
    }
    if insert_first {
        uses.insert(0, range);
    } else {
        uses.push(range);
    }
    true
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct IndexType {
    pub usr: Usr,
    pub id: TypeHandle,
    pub def: TypeDef,

    /// Immediate derived types.
    pub derived: Vec<TypeHandle>,
    /// Variables declared with this type.
    pub instances: Vec<VarHandle>,
    /// Every usage; rename works off this list. Grow it through `add_usage`.
    pub uses: Vec<Range>,
}

impl_entity!(IndexType, TypeKind);

impl IndexType {
    pub fn add_usage(&mut self, range: Range) -> bool {
        add_usage(&mut self.uses, range, false)
    }

    pub fn add_definition_usage(&mut self, range: Range) -> bool {
        add_usage(&mut self.uses, range, true)
    }

    pub fn add_derived(&mut self, derived: TypeHandle) -> bool {
        push_unique(&mut self.derived, derived)
    }

    pub fn add_instance(&mut self, var: VarHandle) -> bool {
        push_unique(&mut self.instances, var)
    }

    pub fn persisted_eq(&self, other: &Self) -> bool {
        self.usr == other.usr
            && self.id == other.id
            && self.def == other.def
            && self.derived == other.derived
            && self.instances == other.instances
            && self.uses == other.uses
    }
}

/// A forward declaration of a function.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct FuncDeclaration {
    /// Range of the function name only.
    pub spelling: Range,
    pub extent: Range,
    /// Source text of the declaration.
    pub content: String,
    pub param_spellings: Vec<Range>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct IndexFunc {
    pub usr: Usr,
    pub id: FuncHandle,
    pub def: FuncDef,

    pub declarations: Vec<FuncDeclaration>,
    /// Methods that directly override this one.
    pub derived: Vec<FuncHandle>,
    /// Call sites of this function. A caller without a function handle is a
    /// call made outside any function body.
    ///
    /// The complete usage set also includes the declaration spellings and
    /// `def.definition_spelling`.
    pub callers: Vec<IndexFuncRef>,
}

impl_entity!(IndexFunc, FuncKind);

impl IndexFunc {
    /// Record a call site, once per caller and location.
    pub fn add_caller(&mut self, caller: IndexFuncRef) -> bool {
        if self.callers.iter().any(|c| c.same_call_site(&caller)) {
            return false;
        }
        self.callers.push(caller);
        true
    }

    pub fn add_derived(&mut self, derived: FuncHandle) -> bool {
        push_unique(&mut self.derived, derived)
    }

    pub fn add_declaration(&mut self, declaration: FuncDeclaration) -> bool {
        if self
            .declarations
            .iter()
            .any(|d| d.spelling == declaration.spelling)
        {
            return false;
        }
        self.declarations.push(declaration);
        true
    }

    pub fn persisted_eq(&self, other: &Self) -> bool {
        self.usr == other.usr
            && self.id == other.id
            && self.def == other.def
            && self.declarations == other.declarations
            && self.derived == other.derived
            && self.callers == other.callers
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct IndexVar {
    pub usr: Usr,
    pub id: VarHandle,
    pub def: VarDef,

    pub declarations: Vec<Range>,
    pub uses: Vec<Range>,
}

impl_entity!(IndexVar, VarKind);

impl IndexVar {
    pub fn add_usage(&mut self, range: Range) -> bool {
        add_usage(&mut self.uses, range, false)
    }

    pub fn add_definition_usage(&mut self, range: Range) -> bool {
        add_usage(&mut self.uses, range, true)
    }

    pub fn add_declaration(&mut self, range: Range) -> bool {
        push_unique(&mut self.declarations, range)
    }

    pub fn persisted_eq(&self, other: &Self) -> bool {
        self.usr == other.usr
            && self.id == other.id
            && self.def == other.def
            && self.declarations == other.declarations
            && self.uses == other.uses
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_identity_is_handle_only() {
        let mut a = IndexType::create(TypeHandle::new(1), Usr::from("c:@S@A"));
        let b = IndexType::create(TypeHandle::new(1), Usr::from("c:@S@B"));
        a.def.detailed_name = "A".to_string();

        assert_eq!(a, b);
        assert!(!a.persisted_eq(&b));

        let set: HashSet<_> = [a, b].into_iter().collect();
        assert_eq!(set.len(), 1);
    }

    #[test]
    fn test_entities_sort_by_handle() {
        let mut vars = vec![
            IndexVar::create(VarHandle::new(2), Usr::from("b")),
            IndexVar::create(VarHandle::new(0), Usr::from("z")),
            IndexVar::create(VarHandle::new(1), Usr::from("a")),
        ];
        vars.sort();
        let ids: Vec<u32> = vars.iter().map(|v| v.id.raw()).collect();
        assert_eq!(ids, vec![0, 1, 2]);
    }

    #[test]
    fn test_add_usage_skips_duplicates() {
        let mut var = IndexVar::create(VarHandle::new(0), Usr::from("c:@x"));
        let site = Range::from_coords(3, 1, 3, 2);
        assert!(var.add_usage(site));
        assert!(!var.add_usage(site));
        assert_eq!(var.uses, vec![site]);

        let def_site = Range::from_coords(1, 5, 1, 6);
        assert!(var.add_definition_usage(def_site));
        assert!(!var.add_definition_usage(site));
        assert_eq!(var.uses, vec![def_site, site]);
    }

    #[test]
    fn test_add_caller_dedups_by_call_site() {
        let mut func = IndexFunc::create(FuncHandle::new(0), Usr::from("c:@F@f#"));
        let site = Range::from_coords(8, 3, 8, 4);
        assert!(func.add_caller(IndexFuncRef::outside_function(site, false)));
        assert!(!func.add_caller(IndexFuncRef::outside_function(site, true)));
        assert!(func.add_caller(IndexFuncRef::new(FuncHandle::new(2), site, false)));
        assert_eq!(func.callers.len(), 2);
    }
}
