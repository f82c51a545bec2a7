//! Storage layer: review store, write-ahead log, and CSV snapshots.
//!
//! Reviews live in memory inside a single [`ReviewStore`]. Durability is
//! provided by a `SyncWriteAheadLog` (CRC32 + fsync) that is periodically
//! folded into a CSV snapshot (atomic temp-file + rename).

/// CSV snapshot save/load with atomic writes.
pub mod persistence;
/// The owning review store.
pub mod store;
/// Write-Ahead Log with CRC32 checksums.
pub mod wal;

pub use persistence::{load_snapshot, save_snapshot};
pub use store::{ReviewStore, StoreOptions};
pub use wal::{ReplayStats, SyncWriteAheadLog, WalEntry};
