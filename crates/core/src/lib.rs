//! Per-file symbol index model for C-family sources, and its versioned
//! on-disk cache.

pub mod config;
pub mod error;
pub mod logging;
pub mod model;
pub mod storage;
pub mod util;

pub use config::CacheConfig;
pub use error::{CxrefError, DecodeError, Result};
pub use model::IndexFile;
pub use storage::{CacheStore, Format};
