use serde::{Deserialize, Serialize};
use std::fmt;

/// File-level language classification.
///
/// `Unknown < C < Cpp` form a chain that a file only ever climbs during one
/// indexing pass. `ObjC` sits outside the chain and is terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LanguageId {
    #[default]
    Unknown,
    C,
    Cpp,
    ObjC,
}

impl LanguageId {
    fn rank(self) -> u8 {
        match self {
            LanguageId::Unknown => 0,
            LanguageId::C => 1,
            LanguageId::Cpp => 2,
            LanguageId::ObjC => 3,
        }
    }

    /// Fold a newly observed construct into the current classification.
    pub fn promote(self, observed: LanguageId) -> LanguageId {
        match (self, observed) {
            (LanguageId::ObjC, _) | (_, LanguageId::ObjC) => LanguageId::ObjC,
            (current, observed) if observed.rank() > current.rank() => observed,
            (current, _) => current,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            LanguageId::Unknown => "unknown",
            LanguageId::C => "c",
            LanguageId::Cpp => "cpp",
            LanguageId::ObjC => "objc",
        }
    }
}

impl fmt::Display for LanguageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ALL: [LanguageId; 4] = [
        LanguageId::Unknown,
        LanguageId::C,
        LanguageId::Cpp,
        LanguageId::ObjC,
    ];

    #[test]
    fn test_promote_climbs_chain() {
        let lang = LanguageId::Unknown
            .promote(LanguageId::C)
            .promote(LanguageId::Cpp);
        assert_eq!(lang, LanguageId::Cpp);
    }

    #[test]
    fn test_promote_never_downgrades() {
        assert_eq!(LanguageId::Cpp.promote(LanguageId::C), LanguageId::Cpp);
        assert_eq!(LanguageId::Cpp.promote(LanguageId::Unknown), LanguageId::Cpp);
        assert_eq!(LanguageId::C.promote(LanguageId::Unknown), LanguageId::C);
    }

    #[test]
    fn test_objc_is_terminal() {
        for lang in ALL {
            assert_eq!(LanguageId::ObjC.promote(lang), LanguageId::ObjC);
            assert_eq!(lang.promote(LanguageId::ObjC), LanguageId::ObjC);
        }
    }

    #[test]
    fn test_result_is_supremum_of_chain_events() {
        let events = [
            LanguageId::C,
            LanguageId::Unknown,
            LanguageId::Cpp,
            LanguageId::C,
            LanguageId::Unknown,
        ];
        let lang = events
            .iter()
            .fold(LanguageId::Unknown, |acc, ev| acc.promote(*ev));
        assert_eq!(lang, LanguageId::Cpp);
    }

    #[test]
    fn test_display_matches_serde_name() {
        for lang in ALL {
            let json = serde_json::to_string(&lang).unwrap();
            assert_eq!(json, format!("\"{}\"", lang));
        }
    }
}
