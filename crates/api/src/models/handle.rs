//! File-scoped typed handles.
//!
//! A handle is an index into one of the entity vectors of a single index
//! file. Handles are only meaningful inside the file that issued them: two
//! files routinely reuse the same raw value for unrelated symbols, so the
//! [`Usr`](super::Usr) is the only key that may cross a file boundary.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::cmp::Ordering;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::marker::PhantomData;

pub type RawId = u32;

/// Marker for the entity kind a handle points into.
pub trait HandleKind: 'static {
    const NAME: &'static str;
}

#[derive(Debug, Clone)]
pub enum TypeKind {}

#[derive(Debug, Clone)]
pub enum FuncKind {}

#[derive(Debug, Clone)]
pub enum VarKind {}

impl HandleKind for TypeKind {
    const NAME: &'static str = "Type";
}

impl HandleKind for FuncKind {
    const NAME: &'static str = "Func";
}

impl HandleKind for VarKind {
    const NAME: &'static str = "Var";
}

/// Strongly-typed integer reference to an entity of kind `K`.
///
/// The maximum raw value is reserved as the invalid sentinel, which is also
/// the `Default`. Comparing handles obtained from different index files is a
/// caller error that the value itself cannot detect.
pub struct Handle<K> {
    raw: RawId,
    _kind: PhantomData<fn() -> K>,
}

pub type TypeHandle = Handle<TypeKind>;
pub type FuncHandle = Handle<FuncKind>;
pub type VarHandle = Handle<VarKind>;

impl<K> Handle<K> {
    pub const INVALID_RAW: RawId = RawId::MAX;

    #[inline]
    pub const fn new(raw: RawId) -> Self {
        Self {
            raw,
            _kind: PhantomData,
        }
    }

    #[inline]
    pub const fn invalid() -> Self {
        Self::new(Self::INVALID_RAW)
    }

    #[inline]
    pub const fn has_value(self) -> bool {
        self.raw != Self::INVALID_RAW
    }

    #[inline]
    pub const fn raw(self) -> RawId {
        self.raw
    }

    /// Position in the owning entity vector, `None` for the sentinel.
    #[inline]
    pub fn index(self) -> Option<usize> {
        self.has_value().then_some(self.raw as usize)
    }

    /// Handle for the next entity appended to a vector of `len` entities.
    pub fn next_for_len(len: usize) -> Self {
        debug_assert!(len < Self::INVALID_RAW as usize, "handle space exhausted");
        Self::new(len as RawId)
    }
}

impl<K> Clone for Handle<K> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<K> Copy for Handle<K> {}

impl<K> Default for Handle<K> {
    fn default() -> Self {
        Self::invalid()
    }
}

impl<K> PartialEq for Handle<K> {
    fn eq(&self, other: &Self) -> bool {
        self.raw == other.raw
    }
}

impl<K> Eq for Handle<K> {}

impl<K> PartialOrd for Handle<K> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl<K> Ord for Handle<K> {
    fn cmp(&self, other: &Self) -> Ordering {
        self.raw.cmp(&other.raw)
    }
}

impl<K> Hash for Handle<K> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.raw.hash(state);
    }
}

impl<K: HandleKind> fmt::Debug for Handle<K> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.has_value() {
            write!(f, "{}Handle({})", K::NAME, self.raw)
        } else {
            write!(f, "{}Handle(invalid)", K::NAME)
        }
    }
}

impl<K> Serialize for Handle<K> {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_u32(self.raw)
    }
}

impl<'de, K> Deserialize<'de> for Handle<K> {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        RawId::deserialize(deserializer).map(Self::new)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_sentinel() {
        let h = TypeHandle::invalid();
        assert!(!h.has_value());
        assert_eq!(h.raw(), u32::MAX);
        assert_eq!(h.index(), None);
        assert_eq!(TypeHandle::default(), h);
    }

    #[test]
    fn test_every_other_value_is_valid() {
        assert!(FuncHandle::new(0).has_value());
        assert!(FuncHandle::new(u32::MAX - 1).has_value());
        assert_eq!(FuncHandle::new(7).index(), Some(7));
    }

    #[test]
    fn test_ordering_follows_raw_value() {
        let mut handles = vec![VarHandle::new(3), VarHandle::invalid(), VarHandle::new(1)];
        handles.sort();
        assert_eq!(
            handles,
            vec![VarHandle::new(1), VarHandle::new(3), VarHandle::invalid()]
        );
    }

    #[test]
    fn test_debug_names_kind() {
        assert_eq!(format!("{:?}", TypeHandle::new(4)), "TypeHandle(4)");
        assert_eq!(format!("{:?}", FuncHandle::invalid()), "FuncHandle(invalid)");
    }

    #[test]
    fn test_serializes_as_plain_integer() {
        let json = serde_json::to_string(&TypeHandle::new(12)).unwrap();
        assert_eq!(json, "12");
        let back: TypeHandle = serde_json::from_str(&json).unwrap();
        assert_eq!(back, TypeHandle::new(12));
    }
}
