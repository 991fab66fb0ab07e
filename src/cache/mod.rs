//! Generic snapshot cache for paginated remote listings.
//!
//! This module is independent of GitHub and provides:
//! - A JSON snapshot store with atomic writes and a disabled mode
//! - A staleness check against a configurable sync interval
//! - An incremental synchronizer that stops at the first already-cached page
//!   and allows one run per store path at a time

mod storage;
mod sync;
mod traits;

pub use storage::{Snapshot, SnapshotStore};
pub use sync::{PageMerge, SyncError, Synchronizer};
pub use traits::{Cacheable, Page, PageFetcher};
