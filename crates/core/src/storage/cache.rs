//! On-disk cache of index files, one file per indexed source.
//!
//! A cache file is named after the xxh3 hash of the source's normalized
//! path, so the same source always lands in the same slot. The source text
//! captured at index time is kept next to it as `<hash>.src`.

use super::codec::{self, Format, SchemaVersion};
use crate::config::CacheConfig;
use crate::error::{CxrefError, DecodeError, Result};
use crate::model::IndexFile;
use crate::util::normalize_path;
use std::borrow::Cow;
use std::fs;
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};
use std::time::SystemTime;
use xxhash_rust::xxh3::xxh3_64;

const ZSTD_MAGIC: [u8; 4] = [0x28, 0xB5, 0x2F, 0xFD];
const CONTENTS_EXTENSION: &str = "src";
const TEMP_EXTENSION: &str = "tmp";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheEntry {
    pub path: PathBuf,
    pub format: Format,
    pub size_bytes: u64,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CacheStats {
    pub cache_dir: PathBuf,
    pub index_files: usize,
    pub json_files: usize,
    pub msgpack_files: usize,
    pub contents_files: usize,
    pub total_bytes: u64,
}

pub struct CacheStore {
    config: CacheConfig,
}

impl CacheStore {
    pub fn new(config: CacheConfig) -> Self {
        Self { config }
    }

    pub fn from_env() -> Result<Self> {
        Ok(Self::new(CacheConfig::from_env()?))
    }

    pub fn config(&self) -> &CacheConfig {
        &self.config
    }

    /// Cache file for `source` in the configured format.
    pub fn cache_path(&self, source: &Path) -> PathBuf {
        self.path_with_extension(source, self.config.format.extension())
    }

    pub fn contents_path(&self, source: &Path) -> PathBuf {
        self.path_with_extension(source, CONTENTS_EXTENSION)
    }

    fn path_with_extension(&self, source: &Path, extension: &str) -> PathBuf {
        let key = normalize_path(source);
        let hash = xxh3_64(key.to_string_lossy().as_bytes());
        self.config
            .cache_dir
            .join(format!("{:016x}.{}", hash, extension))
    }

    /// Write `file` to its cache slot, replacing any previous entry.
    pub fn store(&self, file: &IndexFile) -> Result<PathBuf> {
        let source = Path::new(&file.path);
        fs::create_dir_all(&self.config.cache_dir)?;

        let path = self.cache_path(source);
        write_cache_file(&path, file, self.config.format, self.config.compress)?;
        write_atomic(&self.contents_path(source), file.file_contents.as_bytes())?;

        tracing::info!(
            "Cached {} ({} entities) at {}",
            file.path,
            file.entity_count(),
            path.display()
        );
        Ok(path)
    }

    /// Cached index for `source`, if there is a usable one.
    ///
    /// A slot that cannot be read or decoded (old version, corrupt bytes) is
    /// deleted and reported as a miss, so the next store starts clean. Cache
    /// trouble never becomes an error here.
    pub fn load(&self, source: &Path) -> Result<Option<IndexFile>> {
        let path = self.cache_path(source);
        let bytes = match fs::read(&path) {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => {
                tracing::warn!("Discarding unreadable cache {}: {}", path.display(), e);
                self.discard(source);
                return Ok(None);
            }
        };

        match decode_cache_bytes(&bytes, self.config.format) {
            Ok(file) => {
                tracing::debug!("Loaded cache {}", path.display());
                Ok(Some(file))
            }
            Err(err) => {
                let reason = if err.is_version_mismatch() {
                    "version mismatch"
                } else {
                    "corrupt data"
                };
                tracing::warn!(
                    "Discarding cache {} ({}): {}. Will re-index.",
                    path.display(),
                    reason,
                    err
                );
                self.discard(source);
                Ok(None)
            }
        }
    }

    fn discard(&self, source: &Path) {
        if let Err(e) = self.remove(source) {
            tracing::warn!("Could not remove cache for {}: {}", source.display(), e);
        }
    }

    /// Like [`load`](Self::load), but an entry indexed from a different
    /// revision of the source (by modification time) is also a miss.
    pub fn load_if_fresh(&self, source: &Path, mtime: i64) -> Result<Option<IndexFile>> {
        Ok(self.load(source)?.filter(|file| {
            let fresh = file.last_modification_time == mtime;
            if !fresh {
                tracing::debug!(
                    "Stale cache for {} (cached mtime {}, current {})",
                    source.display(),
                    file.last_modification_time,
                    mtime
                );
            }
            fresh
        }))
    }

    /// Source text as it was when `source` was last stored.
    pub fn load_contents(&self, source: &Path) -> Result<Option<String>> {
        let path = self.contents_path(source);
        match fs::read_to_string(&path) {
            Ok(contents) => Ok(Some(contents)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => {
                tracing::warn!("Ignoring unreadable snapshot {}: {}", path.display(), e);
                Ok(None)
            }
        }
    }

    /// Remove every cache file for `source`, in any format. Every slot is
    /// attempted; the first failure is returned afterwards.
    pub fn remove(&self, source: &Path) -> Result<bool> {
        let mut removed = false;
        let mut first_error = None;
        let extensions = Format::ALL
            .iter()
            .map(|f| f.extension())
            .chain([CONTENTS_EXTENSION]);
        for extension in extensions {
            match remove_if_exists(&self.path_with_extension(source, extension)) {
                Ok(hit) => removed |= hit,
                Err(e) => {
                    first_error.get_or_insert(e);
                }
            }
        }
        match first_error {
            Some(e) => Err(e),
            None => Ok(removed),
        }
    }

    /// Index cache files currently in the cache directory.
    pub fn entries(&self) -> Result<Vec<CacheEntry>> {
        let mut entries = Vec::new();
        for path in self.cache_dir_files()? {
            if let Some(format) = Format::from_path(&path) {
                let size_bytes = fs::metadata(&path)?.len();
                entries.push(CacheEntry {
                    path,
                    format,
                    size_bytes,
                });
            }
        }
        entries.sort_by(|a, b| a.path.cmp(&b.path));
        Ok(entries)
    }

    /// Remove every cache, contents and leftover temp file. Returns how many
    /// files were deleted.
    pub fn clear(&self) -> Result<usize> {
        let mut count = 0;
        for path in self.cache_dir_files()? {
            if is_cache_artifact(&path) && remove_if_exists(&path)? {
                count += 1;
            }
        }
        tracing::info!(
            "Cleared {} files from {}",
            count,
            self.config.cache_dir.display()
        );
        Ok(count)
    }

    pub fn stats(&self) -> Result<CacheStats> {
        let mut stats = CacheStats {
            cache_dir: self.config.cache_dir.clone(),
            ..Default::default()
        };

        for path in self.cache_dir_files()? {
            if !is_cache_artifact(&path) {
                continue;
            }
            stats.total_bytes += fs::metadata(&path)?.len();
            match Format::from_path(&path) {
                Some(Format::Json) => stats.json_files += 1,
                Some(Format::MessagePack) => stats.msgpack_files += 1,
                None if has_extension(&path, CONTENTS_EXTENSION) => stats.contents_files += 1,
                None => {}
            }
        }
        stats.index_files = stats.json_files + stats.msgpack_files;
        Ok(stats)
    }

    fn cache_dir_files(&self) -> Result<Vec<PathBuf>> {
        let dir = &self.config.cache_dir;
        if !dir.exists() {
            return Ok(Vec::new());
        }

        let mut files = Vec::new();
        for entry in fs::read_dir(dir)? {
            let entry = entry?;
            if entry.file_type()?.is_file() {
                files.push(entry.path());
            }
        }
        Ok(files)
    }
}

fn has_extension(path: &Path, extension: &str) -> bool {
    path.extension().is_some_and(|e| e == extension)
}

fn is_cache_artifact(path: &Path) -> bool {
    Format::from_path(path).is_some()
        || has_extension(path, CONTENTS_EXTENSION)
        || has_extension(path, TEMP_EXTENSION)
}

fn remove_if_exists(path: &Path) -> Result<bool> {
    match fs::remove_file(path) {
        Ok(()) => Ok(true),
        Err(e) if e.kind() == ErrorKind::NotFound => Ok(false),
        Err(e) => Err(e.into()),
    }
}

/// Write to a uniquely named sibling temp file, then rename it over `path`.
/// Readers never observe a half-written cache, and concurrent writers of one
/// slot each publish a complete file; the last rename wins.
fn write_atomic(path: &Path, bytes: &[u8]) -> Result<()> {
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    let mut temp = tempfile::Builder::new()
        .prefix(".cxref-")
        .suffix(&format!(".{}", TEMP_EXTENSION))
        .tempfile_in(dir)?;
    temp.write_all(bytes)?;
    temp.persist(path).map_err(|e| e.error)?;
    Ok(())
}

fn decompress(bytes: &[u8]) -> std::result::Result<Cow<'_, [u8]>, DecodeError> {
    if bytes.starts_with(&ZSTD_MAGIC) {
        let decompressed = zstd::decode_all(bytes).map_err(DecodeError::corrupt)?;
        Ok(Cow::Owned(decompressed))
    } else {
        Ok(Cow::Borrowed(bytes))
    }
}

/// Decode a cache payload, unwrapping zstd compression when present.
fn decode_cache_bytes(
    bytes: &[u8],
    format: Format,
) -> std::result::Result<IndexFile, DecodeError> {
    codec::decode(&decompress(bytes)?, format)
}

fn read_payload(path: &Path) -> Result<(Format, Vec<u8>)> {
    let format = Format::from_path(path).ok_or_else(|| {
        CxrefError::Config(format!(
            "{} is not a cache file (expected .json or .mpack)",
            path.display()
        ))
    })?;
    Ok((format, fs::read(path)?))
}

/// Encode `file` and write it to `path` atomically. Only the MessagePack
/// form is ever compressed.
pub fn write_cache_file(path: &Path, file: &IndexFile, format: Format, compress: bool) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }

    let bytes = codec::encode(file, format)?;
    let bytes = if compress && format == Format::MessagePack {
        zstd::encode_all(&bytes[..], 0)?
    } else {
        bytes
    };
    write_atomic(path, &bytes)
}

/// Decode a single cache file, taking its format from the extension.
pub fn read_cache_file(path: &Path) -> Result<IndexFile> {
    let (format, bytes) = read_payload(path)?;
    Ok(decode_cache_bytes(&bytes, format)?)
}

/// Schema version recorded in a cache file, read without decoding the body.
pub fn read_cache_version(path: &Path) -> Result<SchemaVersion> {
    let (format, bytes) = read_payload(path)?;
    Ok(codec::peek_version(&decompress(&bytes)?, format)?)
}

/// Modification time of `path` in seconds since the Unix epoch, the value
/// stored in `last_modification_time`.
pub fn source_mtime(path: &Path) -> Result<i64> {
    let modified = fs::metadata(path)?.modified()?;
    let secs = match modified.duration_since(SystemTime::UNIX_EPOCH) {
        Ok(d) => d.as_secs() as i64,
        Err(before_epoch) => -(before_epoch.duration().as_secs() as i64),
    };
    Ok(secs)
}
