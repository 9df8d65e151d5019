use cxref_api::{ApiError, FuncHandle, Range};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

/// One call site: the calling function (absent for calls made outside any
/// function body, e.g. global initializers), where the call happens, and
/// whether the call is implicit (constructor/destructor calls and the like).
///
/// Persisted as `["~"] handle "@" range`, with `-1` standing for an absent
/// caller. External tools read that text, so the shape is fixed.
///
/// `==` and `Ord` consider all three fields; relationship lists dedup with
/// [`IndexFuncRef::same_call_site`] instead, which ignores `is_implicit`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub struct IndexFuncRef {
    pub id: FuncHandle,
    pub loc: Range,
    pub is_implicit: bool,
}

impl IndexFuncRef {
    pub fn new(id: FuncHandle, loc: Range, is_implicit: bool) -> Self {
        Self {
            id,
            loc,
            is_implicit,
        }
    }

    /// A call made outside of any function body.
    pub fn outside_function(loc: Range, is_implicit: bool) -> Self {
        Self::new(FuncHandle::invalid(), loc, is_implicit)
    }

    pub fn function(&self) -> Option<FuncHandle> {
        self.id.has_value().then_some(self.id)
    }

    pub fn same_call_site(&self, other: &IndexFuncRef) -> bool {
        self.id == other.id && self.loc == other.loc
    }
}

impl fmt::Display for IndexFuncRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_implicit {
            f.write_str("~")?;
        }
        // The handle is unsigned; the sentinel is spelled -1.
        if self.id.has_value() {
            write!(f, "{}", self.id.raw())?;
        } else {
            f.write_str("-1")?;
        }
        write!(f, "@{}", self.loc)
    }
}

impl FromStr for IndexFuncRef {
    type Err = ApiError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || ApiError::InvalidFuncRef(s.to_string());

        let (is_implicit, rest) = match s.strip_prefix('~') {
            Some(rest) => (true, rest),
            None => (false, s),
        };
        let (id, loc) = rest.split_once('@').ok_or_else(invalid)?;

        let id = match id {
            "-1" => FuncHandle::invalid(),
            raw => FuncHandle::new(raw.parse().map_err(|_| invalid())?),
        };
        let loc = loc.parse::<Range>().map_err(|_| invalid())?;

        Ok(Self::new(id, loc, is_implicit))
    }
}

impl Serialize for IndexFuncRef {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for IndexFuncRef {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let text = String::deserialize(deserializer)?;
        text.parse().map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn loc() -> Range {
        Range::from_coords(10, 4, 10, 9)
    }

    #[test]
    fn test_encode_implicit_call_without_caller() {
        let r = IndexFuncRef::new(FuncHandle::invalid(), loc(), true);
        assert_eq!(r.to_string(), format!("~-1@{}", loc()));
        assert_eq!(r.to_string(), "~-1@10:4-10:9");

        let back: IndexFuncRef = "~-1@10:4-10:9".parse().unwrap();
        assert_eq!(back.function(), None);
        assert!(back.is_implicit);
        assert_eq!(back.loc, loc());
    }

    #[test]
    fn test_encode_explicit_call() {
        let r = IndexFuncRef::new(FuncHandle::new(42), loc(), false);
        assert_eq!(r.to_string(), "42@10:4-10:9");
        assert_eq!("42@10:4-10:9".parse::<IndexFuncRef>().unwrap(), r);
    }

    #[test]
    fn test_rejects_malformed_text() {
        for bad in ["", "42", "@1:1-1:2", "x@1:1-1:2", "-2@1:1-1:2", "~~1@1:1-1:2", "1@1:1"] {
            assert!(bad.parse::<IndexFuncRef>().is_err(), "accepted {:?}", bad);
        }
    }

    #[test]
    fn test_two_equalities() {
        let explicit = IndexFuncRef::new(FuncHandle::new(1), loc(), false);
        let implicit = IndexFuncRef::new(FuncHandle::new(1), loc(), true);
        assert_ne!(explicit, implicit);
        assert!(explicit.same_call_site(&implicit));
        assert!(explicit < implicit);
    }

    #[test]
    fn test_serde_uses_text_form() {
        let r = IndexFuncRef::outside_function(loc(), false);
        let json = serde_json::to_string(&r).unwrap();
        assert_eq!(json, "\"-1@10:4-10:9\"");
        let back: IndexFuncRef = serde_json::from_str(&json).unwrap();
        assert_eq!(back, r);
    }
}
