//! Versioned encode/decode of an [`IndexFile`].
//!
//! Both forms carry `(MAJOR_VERSION, MINOR_VERSION)`:
//! - JSON is self-describing. The versions are top-level fields, unknown
//!   fields are ignored and missing ones take their defaults, so only a major
//!   version change invalidates it.
//! - MessagePack is positional (`[major, minor, file]`, structs as arrays) and
//!   cannot survive any schema change, so any version difference invalidates.
//!
//! Decoding is pure: the same bytes always yield the same result, and a
//! failed decode hands back nothing partial.

use crate::config::{MAJOR_VERSION, MINOR_VERSION};
use crate::error::{CxrefError, DecodeError, Result};
use crate::model::IndexFile;
use serde::de::IgnoredAny;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Format {
    Json,
    MessagePack,
}

impl Format {
    pub const ALL: [Format; 2] = [Format::Json, Format::MessagePack];

    pub fn extension(&self) -> &'static str {
        match self {
            Format::Json => "json",
            Format::MessagePack => "mpack",
        }
    }

    pub fn from_extension(ext: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|f| f.extension() == ext)
    }

    pub fn from_path(path: &std::path::Path) -> Option<Self> {
        path.extension()
            .and_then(|e| e.to_str())
            .and_then(Self::from_extension)
    }
}

impl fmt::Display for Format {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Format::Json => write!(f, "json"),
            Format::MessagePack => write!(f, "msgpack"),
        }
    }
}

impl FromStr for Format {
    type Err = CxrefError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "json" => Ok(Format::Json),
            "msgpack" | "messagepack" | "mpack" => Ok(Format::MessagePack),
            other => Err(CxrefError::Config(format!("unknown cache format: {}", other))),
        }
    }
}

#[derive(Serialize)]
struct JsonEnvelope<'a> {
    major_version: u32,
    minor_version: u32,
    #[serde(flatten)]
    file: &'a IndexFile,
}

/// `(major, minor)` pair embedded in every cache payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SchemaVersion {
    pub major: u32,
    pub minor: u32,
}

impl SchemaVersion {
    pub const CURRENT: SchemaVersion = SchemaVersion {
        major: MAJOR_VERSION,
        minor: MINOR_VERSION,
    };
}

impl fmt::Display for SchemaVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.major, self.minor)
    }
}

// The minor version is read as an arbitrary value so that a malformed one
// can never hide a major mismatch.
#[derive(Deserialize)]
struct JsonVersion {
    major_version: Option<u32>,
    #[serde(default)]
    minor_version: Option<serde_json::Value>,
}

pub fn encode(file: &IndexFile, format: Format) -> Result<Vec<u8>> {
    match format {
        Format::Json => Ok(serde_json::to_vec(&json_envelope(file))?),
        Format::MessagePack => Ok(rmp_serde::to_vec(&(MAJOR_VERSION, MINOR_VERSION, file))?),
    }
}

pub fn to_pretty_json(file: &IndexFile) -> Result<String> {
    Ok(serde_json::to_string_pretty(&json_envelope(file))?)
}

fn json_envelope(file: &IndexFile) -> JsonEnvelope<'_> {
    JsonEnvelope {
        major_version: MAJOR_VERSION,
        minor_version: MINOR_VERSION,
        file,
    }
}

pub fn decode(bytes: &[u8], format: Format) -> std::result::Result<IndexFile, DecodeError> {
    let mut file = match format {
        Format::Json => decode_json(bytes)?,
        Format::MessagePack => decode_msgpack(bytes)?,
    };
    file.rebuild_id_cache().map_err(DecodeError::CorruptData)?;
    file.check_references().map_err(DecodeError::CorruptData)?;
    Ok(file)
}

/// Read the version header of an encoded payload without decoding the body.
///
/// A JSON minor version that is missing or not a `u32` reads as 0.
pub fn peek_version(bytes: &[u8], format: Format) -> std::result::Result<SchemaVersion, DecodeError> {
    match format {
        Format::Json => {
            let version: JsonVersion =
                serde_json::from_slice(bytes).map_err(DecodeError::corrupt)?;
            let major = version
                .major_version
                .ok_or_else(|| DecodeError::corrupt("missing major_version"))?;
            let minor = version
                .minor_version
                .and_then(|v| v.as_u64())
                .and_then(|v| u32::try_from(v).ok())
                .unwrap_or(0);
            Ok(SchemaVersion { major, minor })
        }
        Format::MessagePack => {
            let (major, minor, _body) = rmp_serde::from_slice::<(u32, u32, IgnoredAny)>(bytes)
                .map_err(DecodeError::corrupt)?;
            Ok(SchemaVersion { major, minor })
        }
    }
}

fn decode_json(bytes: &[u8]) -> std::result::Result<IndexFile, DecodeError> {
    let found = peek_version(bytes, Format::Json)?;

    if found.major != MAJOR_VERSION {
        return Err(mismatch(Format::Json, found));
    }
    if found.minor != MINOR_VERSION {
        tracing::debug!(
            found = found.minor,
            expected = MINOR_VERSION,
            "accepting JSON cache with different minor version"
        );
    }

    serde_json::from_slice(bytes).map_err(DecodeError::corrupt)
}

fn decode_msgpack(bytes: &[u8]) -> std::result::Result<IndexFile, DecodeError> {
    // Read the header without committing to the body layout.
    let found = peek_version(bytes, Format::MessagePack)?;

    if found != SchemaVersion::CURRENT {
        return Err(mismatch(Format::MessagePack, found));
    }

    let (_, _, file) =
        rmp_serde::from_slice::<(u32, u32, IndexFile)>(bytes).map_err(DecodeError::corrupt)?;
    Ok(file)
}

fn mismatch(format: Format, found: SchemaVersion) -> DecodeError {
    DecodeError::VersionMismatch {
        format,
        found_major: found.major,
        found_minor: found.minor,
        expected_major: MAJOR_VERSION,
        expected_minor: MINOR_VERSION,
    }
}
