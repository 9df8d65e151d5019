use super::entity::Entity;
use cxref_api::{FuncKind, Handle, HandleKind, TypeKind, Usr, VarKind};
use std::collections::HashMap;
use std::fmt;

/// Bidirectional `Usr <-> Handle` map for one entity kind.
///
/// Both directions are only ever written together, so a usr maps to at most
/// one handle and a handle to at most one usr.
#[derive(Clone)]
pub struct UsrMap<K> {
    by_usr: HashMap<Usr, Handle<K>>,
    by_handle: HashMap<Handle<K>, Usr>,
}

impl<K> Default for UsrMap<K> {
    fn default() -> Self {
        Self {
            by_usr: HashMap::new(),
            by_handle: HashMap::new(),
        }
    }
}

impl<K: HandleKind> fmt::Debug for UsrMap<K> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UsrMap")
            .field("kind", &K::NAME)
            .field("by_usr", &self.by_usr)
            .finish()
    }
}

impl<K: HandleKind> UsrMap<K> {
    pub fn handle(&self, usr: &Usr) -> Option<Handle<K>> {
        self.by_usr.get(usr).copied()
    }

    pub fn usr(&self, handle: Handle<K>) -> Option<&Usr> {
        self.by_handle.get(&handle)
    }

    pub fn len(&self) -> usize {
        self.by_usr.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_usr.is_empty()
    }

    /// Get-or-create: an unseen usr gets the next handle and a fresh entity
    /// appended to `entities`.
    pub fn resolve<E>(&mut self, usr: Usr, entities: &mut Vec<E>) -> Handle<K>
    where
        E: Entity<Kind = K>,
    {
        if let Some(handle) = self.by_usr.get(&usr) {
            return *handle;
        }

        let handle = Handle::next_for_len(entities.len());
        tracing::trace!(kind = K::NAME, usr = %usr, handle = handle.raw(), "new entity");
        entities.push(E::create(handle, usr.clone()));
        self.insert(usr, handle);
        handle
    }

    /// Rebuild from a decoded entity vector. Every entity must sit at the
    /// position its handle names, and usrs must be unique.
    pub fn rebuild<E>(entities: &[E]) -> Result<Self, String>
    where
        E: Entity<Kind = K>,
    {
        let mut map = Self::default();
        for (position, entity) in entities.iter().enumerate() {
            if entity.id().index() != Some(position) {
                return Err(format!(
                    "{} at position {} carries handle {:?}",
                    K::NAME,
                    position,
                    entity.id()
                ));
            }
            if map.by_usr.contains_key(entity.usr()) {
                return Err(format!("duplicate {} usr {}", K::NAME, entity.usr()));
            }
            map.insert(entity.usr().clone(), entity.id());
        }
        Ok(map)
    }

    fn insert(&mut self, usr: Usr, handle: Handle<K>) {
        debug_assert!(!self.by_handle.contains_key(&handle));
        self.by_handle.insert(handle, usr.clone());
        self.by_usr.insert(usr, handle);
    }
}

/// Per-file identity cache; never shared between index files.
#[derive(Debug, Clone, Default)]
pub struct IdCache {
    pub primary_file: String,
    pub types: UsrMap<TypeKind>,
    pub funcs: UsrMap<FuncKind>,
    pub vars: UsrMap<VarKind>,
}

impl IdCache {
    pub fn new(primary_file: impl Into<String>) -> Self {
        Self {
            primary_file: primary_file.into(),
            ..Default::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::IndexType;
    use cxref_api::TypeHandle;

    #[test]
    fn test_resolve_is_get_or_create() {
        let mut map = UsrMap::<TypeKind>::default();
        let mut types: Vec<IndexType> = Vec::new();

        let a = map.resolve(Usr::from("c:@S@A"), &mut types);
        let b = map.resolve(Usr::from("c:@S@B"), &mut types);
        let a_again = map.resolve(Usr::from("c:@S@A"), &mut types);

        assert_eq!(a, TypeHandle::new(0));
        assert_eq!(b, TypeHandle::new(1));
        assert_eq!(a, a_again);
        assert_eq!(types.len(), 2);
        assert_eq!(map.usr(b).map(Usr::as_str), Some("c:@S@B"));
        assert_eq!(map.handle(&Usr::from("c:@S@A")), Some(a));
    }

    #[test]
    fn test_rebuild_rejects_misplaced_handle() {
        let mut types = vec![
            IndexType::create(TypeHandle::new(0), Usr::from("a")),
            IndexType::create(TypeHandle::new(5), Usr::from("b")),
        ];
        assert!(UsrMap::rebuild(&types).is_err());

        types[1].id = TypeHandle::new(1);
        let map = UsrMap::rebuild(&types).unwrap();
        assert_eq!(map.len(), 2);
    }

    #[test]
    fn test_rebuild_rejects_duplicate_usr() {
        let types = vec![
            IndexType::create(TypeHandle::new(0), Usr::from("a")),
            IndexType::create(TypeHandle::new(1), Usr::from("a")),
        ];
        assert!(UsrMap::rebuild(&types).is_err());
    }
}
