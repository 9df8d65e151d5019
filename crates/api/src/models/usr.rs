use serde::{Deserialize, Serialize};
use smol_str::SmolStr;
use std::fmt;

/// Project-wide symbol identity.
///
/// Derived by the front-end from a symbol's mangled signature; the same symbol
/// seen from two translation units yields the same `Usr`. Treated as opaque.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Usr(SmolStr);

impl Usr {
    pub fn new(key: impl AsRef<str>) -> Self {
        Self(SmolStr::new(key))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Display for Usr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for Usr {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

impl From<String> for Usr {
    fn from(s: String) -> Self {
        Self(SmolStr::from(s))
    }
}

impl AsRef<str> for Usr {
    fn as_ref(&self) -> &str {
        self.as_str()
    }
}
