use crate::error::{ApiError, ApiResult};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub struct Position {
    pub line: u32,
    pub column: u32,
}

impl Position {
    pub const fn new(line: u32, column: u32) -> Self {
        Self { line, column }
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.line, self.column)
    }
}

/// Source range. Its textual form `line:col-line:col` is embedded verbatim in
/// function reference strings, so it must stay stable.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub struct Range {
    pub start: Position,
    pub end: Position,
}

impl Range {
    pub const fn new(start: Position, end: Position) -> Self {
        Self { start, end }
    }

    pub const fn from_coords(start_line: u32, start_col: u32, end_line: u32, end_col: u32) -> Self {
        Self::new(
            Position::new(start_line, start_col),
            Position::new(end_line, end_col),
        )
    }
}

impl fmt::Display for Range {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.start, self.end)
    }
}

impl FromStr for Range {
    type Err = ApiError;

    fn from_str(s: &str) -> ApiResult<Self> {
        let invalid = || ApiError::InvalidRange(s.to_string());
        let parse_pos = |part: &str| -> Option<Position> {
            let (line, col) = part.split_once(':')?;
            Some(Position::new(line.parse().ok()?, col.parse().ok()?))
        };

        let (start, end) = s.split_once('-').ok_or_else(invalid)?;
        Ok(Range::new(
            parse_pos(start).ok_or_else(invalid)?,
            parse_pos(end).ok_or_else(invalid)?,
        ))
    }
}

/// Coarse entity kind. The order matters: `Var > Func > Type > File`, so when
/// several symbols share a location a descending sort puts vars and funcs
/// first.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
#[serde(rename_all = "lowercase")]
pub enum SymbolKind {
    #[default]
    Invalid,
    File,
    Type,
    Func,
    Var,
}

/// Fine-grained declaration kind reported by the front-end.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[serde(rename_all = "snake_case")]
pub enum ClangSymbolKind {
    #[default]
    Unknown,
    Module,
    Namespace,
    NamespaceAlias,
    Macro,
    Enum,
    Struct,
    Class,
    Protocol,
    Extension,
    Union,
    TypeAlias,
    Function,
    Variable,
    Field,
    EnumConstant,
    InstanceMethod,
    ClassMethod,
    StaticMethod,
    InstanceProperty,
    ClassProperty,
    StaticProperty,
    Constructor,
    Destructor,
    ConversionFunction,
    Parameter,
    Using,
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[serde(rename_all = "snake_case")]
pub enum StorageClass {
    #[default]
    Invalid,
    None,
    Extern,
    Static,
    PrivateExtern,
    Auto,
    Register,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_range_text_form() {
        let range = Range::from_coords(3, 5, 3, 12);
        assert_eq!(range.to_string(), "3:5-3:12");
        assert_eq!("3:5-3:12".parse::<Range>().unwrap(), range);
    }

    #[test]
    fn test_range_rejects_malformed_text() {
        for bad in ["", "3:5", "3-4", "a:b-c:d", "1:2-3", "1:2-3:-4"] {
            assert!(bad.parse::<Range>().is_err(), "accepted {:?}", bad);
        }
    }

    #[test]
    fn test_symbol_kind_ranks_var_and_func_last() {
        assert!(SymbolKind::Var > SymbolKind::Type);
        assert!(SymbolKind::Func > SymbolKind::File);
    }
}
