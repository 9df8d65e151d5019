//! Cache configuration and format version constants.

use crate::error::{CxrefError, Result};
use crate::storage::Format;
use std::path::PathBuf;

/// Bumped on any schema change. A different major version always forces a
/// rebuild, for both representations.
pub const MAJOR_VERSION: u32 = 12;

/// Only the JSON form tolerates a differing minor version; MessagePack caches
/// are rejected on any difference.
pub const MINOR_VERSION: u32 = 0;

pub const CACHE_DIR_ENV: &str = "CXREF_CACHE_DIR";
pub const CACHE_FORMAT_ENV: &str = "CXREF_CACHE_FORMAT";
pub const CACHE_COMPRESS_ENV: &str = "CXREF_CACHE_COMPRESS";
pub const LOG_FILTER_ENV: &str = "CXREF_LOG";

const DEFAULT_ROOT_DIR: &str = ".cxref";

/// Base directory for everything cxref writes locally (`~/.cxref`).
pub fn default_root() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(DEFAULT_ROOT_DIR)
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheConfig {
    pub cache_dir: PathBuf,
    pub format: Format,
    /// zstd-compress MessagePack payloads on store.
    pub compress: bool,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            cache_dir: default_root().join("cache"),
            format: Format::MessagePack,
            compress: true,
        }
    }
}

impl CacheConfig {
    pub fn new(cache_dir: impl Into<PathBuf>, format: Format) -> Self {
        Self {
            cache_dir: cache_dir.into(),
            format,
            ..Self::default()
        }
    }

    /// Defaults overridden by `CXREF_CACHE_DIR`, `CXREF_CACHE_FORMAT` and
    /// `CXREF_CACHE_COMPRESS`.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Same as [`from_env`](Self::from_env), reading variables through `var`.
    pub fn from_lookup(var: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let mut config = Self::default();

        if let Some(dir) = var(CACHE_DIR_ENV) {
            config.cache_dir = PathBuf::from(dir);
        }
        if let Some(format) = var(CACHE_FORMAT_ENV) {
            config.format = format.parse()?;
        }
        if let Some(flag) = var(CACHE_COMPRESS_ENV) {
            config.compress = parse_flag(&flag).ok_or_else(|| {
                CxrefError::Config(format!("{}={:?} is not a boolean", CACHE_COMPRESS_ENV, flag))
            })?;
        }

        Ok(config)
    }
}

fn parse_flag(value: &str) -> Option<bool> {
    match value.trim().to_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_uses_binary_format() {
        let config = CacheConfig::default();
        assert_eq!(config.format, Format::MessagePack);
        assert!(config.compress);
        assert!(config.cache_dir.ends_with(".cxref/cache"));
    }

    fn lookup<'a>(vars: &'a [(&'a str, &'a str)]) -> impl Fn(&str) -> Option<String> + 'a {
        move |key: &str| {
            vars.iter()
                .find(|(k, _)| *k == key)
                .map(|(_, v)| v.to_string())
        }
    }

    #[test]
    fn test_from_lookup_applies_overrides() {
        let config = CacheConfig::from_lookup(lookup(&[
            (CACHE_DIR_ENV, "/var/cache/cxref"),
            (CACHE_FORMAT_ENV, "json"),
            (CACHE_COMPRESS_ENV, "off"),
        ]))
        .unwrap();
        assert_eq!(config.cache_dir, PathBuf::from("/var/cache/cxref"));
        assert_eq!(config.format, Format::Json);
        assert!(!config.compress);
    }

    #[test]
    fn test_from_lookup_without_vars_is_default() {
        assert_eq!(
            CacheConfig::from_lookup(lookup(&[])).unwrap(),
            CacheConfig::default()
        );
    }

    #[test]
    fn test_from_lookup_rejects_bad_values() {
        let bad_format = CacheConfig::from_lookup(lookup(&[(CACHE_FORMAT_ENV, "yaml")]));
        assert!(matches!(bad_format, Err(CxrefError::Config(_))));

        let bad_flag = CacheConfig::from_lookup(lookup(&[(CACHE_COMPRESS_ENV, "maybe")]));
        assert!(matches!(bad_flag, Err(CxrefError::Config(_))));
    }

    #[test]
    fn test_parse_flag() {
        assert_eq!(parse_flag("0"), Some(false));
        assert_eq!(parse_flag(" TRUE "), Some(true));
        assert_eq!(parse_flag("maybe"), None);
    }
}
