pub mod cache;
pub mod codec;

pub use cache::{
    CacheEntry, CacheStats, CacheStore, read_cache_file, read_cache_version, source_mtime,
    write_cache_file,
};
pub use codec::{Format, SchemaVersion, decode, encode, peek_version, to_pretty_json};
