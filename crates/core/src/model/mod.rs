pub mod def;
pub mod entity;
pub mod func_ref;
pub mod id_cache;
pub mod index_file;

pub use def::{Definition, FuncDef, TypeDef, VarDef, VarParent};
pub use entity::{Entity, FuncDeclaration, IndexFunc, IndexType, IndexVar, add_usage};
pub use func_ref::IndexFuncRef;
pub use id_cache::{IdCache, UsrMap};
pub use index_file::{IndexFile, IndexInclude, UsrSource};

// Re-export the value types entities are built from
pub use cxref_api::models::{
    ClangSymbolKind, Diagnostic, DiagnosticSeverity, FuncHandle, Handle, LanguageId, Position,
    Range, StorageClass, SymbolKind, TypeHandle, Usr, VarHandle,
};
