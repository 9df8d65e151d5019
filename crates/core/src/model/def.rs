//! Definition records: the attribute half of an entity.
//!
//! Metadata fields (`detailed_name`, `hover`, `comments`, `kind`) are
//! first-write-wins: a secondary declaration never overwrites what an earlier
//! one recorded. The defining ranges are only set by the unit that holds the
//! real definition. Relationship lists accumulate.
//!
//! Two equalities exist. Derived `PartialEq` compares every persisted field
//! and is what round-trips are checked against. [`Definition::is_content_equal`]
//! is the narrower change-detection comparison; it ignores classification
//! fields such as `kind`, `storage` and the short-name slice.

use super::func_ref::IndexFuncRef;
use crate::util::push_unique;
use cxref_api::{
    ClangSymbolKind, FuncHandle, Range, StorageClass, SymbolKind, TypeHandle, VarHandle,
};
use serde::{Deserialize, Serialize};

/// Mutable view over the fields every definition kind shares.
pub struct CommonFieldsMut<'a> {
    pub detailed_name: &'a mut String,
    pub short_name_offset: &'a mut u32,
    pub short_name_size: &'a mut u32,
    pub hover: &'a mut String,
    pub comments: &'a mut String,
    pub definition_spelling: &'a mut Option<Range>,
    pub definition_extent: &'a mut Option<Range>,
}

pub trait Definition {
    fn detailed_name(&self) -> &str;
    fn short_name_offset(&self) -> u32;
    fn short_name_size(&self) -> u32;
    fn hover(&self) -> &str;
    fn comments(&self) -> &str;
    fn definition_spelling(&self) -> Option<Range>;
    fn definition_extent(&self) -> Option<Range>;
    fn common_mut(&mut self) -> CommonFieldsMut<'_>;

    /// Change-detection equality; see the module docs.
    fn is_content_equal(&self, other: &Self) -> bool
    where
        Self: Sized;

    /// The bare identifier inside `detailed_name`. Empty when the recorded
    /// slice does not fit the name.
    fn short_name(&self) -> &str {
        let start = self.short_name_offset() as usize;
        let end = start + self.short_name_size() as usize;
        self.detailed_name().get(start..end).unwrap_or("")
    }

    fn has_definition(&self) -> bool {
        self.definition_spelling().is_some()
    }

    fn set_detailed_name(
        &mut self,
        name: impl Into<String>,
        short_name_offset: usize,
        short_name_size: usize,
    ) -> bool {
        let fields = self.common_mut();
        if !fields.detailed_name.is_empty() {
            return false;
        }
        *fields.detailed_name = name.into();
        *fields.short_name_offset = u32::try_from(short_name_offset).unwrap_or(0);
        *fields.short_name_size = u32::try_from(short_name_size).unwrap_or(0);
        true
    }

    fn set_hover(&mut self, hover: impl Into<String>) -> bool {
        set_once(self.common_mut().hover, hover.into())
    }

    fn set_comments(&mut self, comments: impl Into<String>) -> bool {
        set_once(self.common_mut().comments, comments.into())
    }

    /// Record the defining occurrence. Only the first real definition wins.
    fn set_definition(&mut self, spelling: Range, extent: Range) -> bool {
        let fields = self.common_mut();
        if fields.definition_spelling.is_some() || fields.definition_extent.is_some() {
            return false;
        }
        *fields.definition_spelling = Some(spelling);
        *fields.definition_extent = Some(extent);
        true
    }
}

fn set_once(slot: &mut String, value: String) -> bool {
    if !slot.is_empty() || value.is_empty() {
        return false;
    }
    *slot = value;
    true
}

macro_rules! impl_common_fields {
    () => {
        fn detailed_name(&self) -> &str {
            &self.detailed_name
        }

        fn short_name_offset(&self) -> u32 {
            self.short_name_offset
        }

        fn short_name_size(&self) -> u32 {
            self.short_name_size
        }

        fn hover(&self) -> &str {
            &self.hover
        }

        fn comments(&self) -> &str {
            &self.comments
        }

        fn definition_spelling(&self) -> Option<Range> {
            self.definition_spelling
        }

        fn definition_extent(&self) -> Option<Range> {
            self.definition_extent
        }

        fn common_mut(&mut self) -> CommonFieldsMut<'_> {
            CommonFieldsMut {
                detailed_name: &mut self.detailed_name,
                short_name_offset: &mut self.short_name_offset,
                short_name_size: &mut self.short_name_size,
                hover: &mut self.hover,
                comments: &mut self.comments,
                definition_spelling: &mut self.definition_spelling,
                definition_extent: &mut self.definition_extent,
            }
        }
    };
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct TypeDef {
    pub detailed_name: String,
    pub short_name_offset: u32,
    pub short_name_size: u32,
    pub kind: ClangSymbolKind,
    pub hover: String,
    pub comments: String,

    // A type's declaration is rarely interesting on its own, so only the
    // definition is tracked.
    pub definition_spelling: Option<Range>,
    pub definition_extent: Option<Range>,

    /// Set when this type is a typedef/using alias of another.
    pub alias_of: Option<TypeHandle>,
    /// Immediate base types.
    pub parents: Vec<TypeHandle>,

    // Members declared inside this type.
    pub types: Vec<TypeHandle>,
    pub funcs: Vec<FuncHandle>,
    pub vars: Vec<VarHandle>,
}

impl Definition for TypeDef {
    impl_common_fields!();

    fn is_content_equal(&self, other: &Self) -> bool {
        self.detailed_name == other.detailed_name
            && self.definition_spelling == other.definition_spelling
            && self.definition_extent == other.definition_extent
            && self.alias_of == other.alias_of
            && self.parents == other.parents
            && self.types == other.types
            && self.funcs == other.funcs
            && self.vars == other.vars
            && self.hover == other.hover
            && self.comments == other.comments
    }
}

impl TypeDef {
    pub fn add_parent(&mut self, parent: TypeHandle) -> bool {
        push_unique(&mut self.parents, parent)
    }

    pub fn add_member_type(&mut self, ty: TypeHandle) -> bool {
        push_unique(&mut self.types, ty)
    }

    pub fn add_member_func(&mut self, func: FuncHandle) -> bool {
        push_unique(&mut self.funcs, func)
    }

    pub fn add_member_var(&mut self, var: VarHandle) -> bool {
        push_unique(&mut self.vars, var)
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct FuncDef {
    pub detailed_name: String,
    pub short_name_offset: u32,
    pub short_name_size: u32,
    pub kind: ClangSymbolKind,
    pub storage: StorageClass,
    pub hover: String,
    pub comments: String,
    pub definition_spelling: Option<Range>,
    pub definition_extent: Option<Range>,

    /// Enclosing type when this function is a method.
    pub declaring_type: Option<TypeHandle>,
    /// Methods this one overrides.
    pub base: Vec<FuncHandle>,
    /// Variables declared in the body.
    pub locals: Vec<VarHandle>,
    /// Calls made from the body.
    pub callees: Vec<IndexFuncRef>,
}

impl Definition for FuncDef {
    impl_common_fields!();

    fn is_content_equal(&self, other: &Self) -> bool {
        self.detailed_name == other.detailed_name
            && self.hover == other.hover
            && self.definition_spelling == other.definition_spelling
            && self.definition_extent == other.definition_extent
            && self.declaring_type == other.declaring_type
            && self.base == other.base
            && self.locals == other.locals
            && self.callees.len() == other.callees.len()
            && self
                .callees
                .iter()
                .zip(&other.callees)
                .all(|(a, b)| a.same_call_site(b))
            && self.comments == other.comments
    }
}

impl FuncDef {
    pub fn add_base(&mut self, base: FuncHandle) -> bool {
        push_unique(&mut self.base, base)
    }

    pub fn add_local(&mut self, var: VarHandle) -> bool {
        push_unique(&mut self.locals, var)
    }

    /// Record a call made from this function, once per call site.
    pub fn add_callee(&mut self, callee: IndexFuncRef) -> bool {
        if self.callees.iter().any(|c| c.same_call_site(&callee)) {
            return false;
        }
        self.callees.push(callee);
        true
    }
}

/// What a variable is declared inside of.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VarParent {
    #[default]
    None,
    File,
    Type(TypeHandle),
    Func(FuncHandle),
}

impl VarParent {
    pub fn kind(&self) -> SymbolKind {
        match self {
            VarParent::None => SymbolKind::Invalid,
            VarParent::File => SymbolKind::File,
            VarParent::Type(_) => SymbolKind::Type,
            VarParent::Func(_) => SymbolKind::Func,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct VarDef {
    pub detailed_name: String,
    pub short_name_offset: u32,
    pub short_name_size: u32,
    pub hover: String,
    pub comments: String,
    pub definition_spelling: Option<Range>,
    pub definition_extent: Option<Range>,

    pub variable_type: Option<TypeHandle>,
    pub parent: VarParent,

    pub kind: ClangSymbolKind,
    // A variable can be seen both with `None` and with `Extern` storage; the
    // first one recorded is kept.
    pub storage: StorageClass,
}

impl Definition for VarDef {
    impl_common_fields!();

    fn is_content_equal(&self, other: &Self) -> bool {
        self.detailed_name == other.detailed_name
            && self.hover == other.hover
            && self.definition_spelling == other.definition_spelling
            && self.definition_extent == other.definition_extent
            && self.variable_type == other.variable_type
            && self.comments == other.comments
    }
}

impl VarDef {
    pub fn is_local(&self) -> bool {
        matches!(
            self.kind,
            ClangSymbolKind::Parameter | ClangSymbolKind::Variable
        )
    }

    pub fn is_macro(&self) -> bool {
        self.kind == ClangSymbolKind::Macro
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_short_name_slices_detailed_name() {
        let mut def = FuncDef::default();
        assert!(def.set_detailed_name("void ns::Foo::bar(int)", 14, 3));
        assert_eq!(def.short_name(), "bar");
    }

    #[test]
    fn test_short_name_out_of_bounds_is_empty() {
        let def = TypeDef {
            detailed_name: "Foo".to_string(),
            short_name_offset: 2,
            short_name_size: 9,
            ..Default::default()
        };
        assert_eq!(def.short_name(), "");
    }

    #[test]
    fn test_metadata_is_first_write_wins() {
        let mut def = VarDef::default();
        assert!(def.set_detailed_name("int counter", 4, 7));
        assert!(!def.set_detailed_name("extern int counter", 11, 7));
        assert_eq!(def.detailed_name, "int counter");

        assert!(!def.set_hover(""));
        assert!(def.set_hover("int counter = 0"));
        assert!(!def.set_hover("int counter"));
        assert_eq!(def.hover, "int counter = 0");

        assert!(def.set_comments("/// total"));
        assert!(!def.set_comments("/// other"));
    }

    #[test]
    fn test_first_real_definition_wins() {
        let mut def = TypeDef::default();
        assert!(!def.has_definition());
        let spelling = Range::from_coords(1, 7, 1, 10);
        let extent = Range::from_coords(1, 1, 3, 2);
        assert!(def.set_definition(spelling, extent));
        assert!(!def.set_definition(Range::from_coords(9, 1, 9, 2), extent));
        assert_eq!(def.definition_spelling, Some(spelling));
    }

    #[test]
    fn test_content_equality_ignores_kind() {
        let a = TypeDef {
            detailed_name: "Foo".to_string(),
            kind: ClangSymbolKind::Class,
            ..Default::default()
        };
        let b = TypeDef {
            kind: ClangSymbolKind::Struct,
            ..a.clone()
        };
        assert!(a.is_content_equal(&b));
        assert_ne!(a, b);
    }

    #[test]
    fn test_callee_dedup_ignores_implicit_flag() {
        let mut def = FuncDef::default();
        let site = Range::from_coords(4, 2, 4, 8);
        assert!(def.add_callee(IndexFuncRef::new(FuncHandle::new(3), site, false)));
        assert!(!def.add_callee(IndexFuncRef::new(FuncHandle::new(3), site, true)));
        assert!(def.add_callee(IndexFuncRef::new(FuncHandle::new(4), site, false)));
        assert_eq!(def.callees.len(), 2);
    }

    #[test]
    fn test_var_predicates() {
        let mut var = VarDef {
            kind: ClangSymbolKind::Parameter,
            ..Default::default()
        };
        assert!(var.is_local());
        var.kind = ClangSymbolKind::Field;
        assert!(!var.is_local());
        var.kind = ClangSymbolKind::Macro;
        assert!(var.is_macro());
    }

    #[test]
    fn test_var_parent_kind() {
        assert_eq!(VarParent::None.kind(), SymbolKind::Invalid);
        assert_eq!(VarParent::Func(FuncHandle::new(0)).kind(), SymbolKind::Func);
        assert_eq!(VarParent::Type(TypeHandle::new(0)).kind(), SymbolKind::Type);
    }
}
