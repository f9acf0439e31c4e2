//! Cache Module
//!
//! A cost-bounded memory tier, a size-bounded disk tier, and the façade that
//! cascades reads and fans out writes across them.

mod codec;
mod disk;
pub mod dispatch;
mod entry;
mod key_encoding;
mod lru;
mod memory;
pub mod platform;
mod stats;
mod tiered;


// Re-export public types
pub use codec::{BytesCodec, Codec, JsonCodec};
pub use disk::{cache_directory_for, DiskStore};
pub use dispatch::{DispatchHandle, Dispatcher};
pub use entry::{DiskIndexEntry, MemoryEntry};
pub use key_encoding::{decode_key, encode_key};
pub use lru::LruTracker;
pub use memory::MemoryStore;
pub use platform::{
    BackgroundScope, BackgroundTaskGuard, ManualPressureSource, NoopBackgroundScope,
    PressureSource,
};
pub use stats::TierStats;
pub use tiered::Cache;

// == Public Constants ==
/// Directory under `{root}/{name}` that holds the disk tier's files.
pub const DISK_DIRECTORY_PREFIX: &str = "objects";
