use crate::storage::Format;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum CxrefError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("MessagePack encoding error: {0}")]
    MsgpackEncode(#[from] rmp_serde::encode::Error),
    #[error("Cache decode error: {0}")]
    Decode(#[from] DecodeError),
    #[error("Configuration error: {0}")]
    Config(String),
}

/// Why a cache payload could not be turned back into an index file.
///
/// Every variant is recoverable: the source file is the truth, so callers
/// discard the payload and re-index.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DecodeError {
    #[error(
        "{format} cache version {found_major}.{found_minor} does not match {expected_major}.{expected_minor}"
    )]
    VersionMismatch {
        format: Format,
        found_major: u32,
        found_minor: u32,
        expected_major: u32,
        expected_minor: u32,
    },
    #[error("corrupt cache data: {0}")]
    CorruptData(String),
}

impl DecodeError {
    pub fn corrupt(detail: impl std::fmt::Display) -> Self {
        DecodeError::CorruptData(detail.to_string())
    }

    pub fn is_version_mismatch(&self) -> bool {
        matches!(self, DecodeError::VersionMismatch { .. })
    }
}

pub type Result<T> = std::result::Result<T, CxrefError>;
