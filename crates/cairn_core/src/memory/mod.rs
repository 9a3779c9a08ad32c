//! # Memory Management
//!
//! Bucketed slot allocation with stable indices.
//!
//! ## Design Philosophy
//!
//! - Storage grows one fixed-size bucket at a time, existing slots never move
//! - Every index stays valid until it is erased
//! - Free slots are tracked by a bitmask, so scans skip holes in one step

mod bucket;
mod pool;

pub use bucket::{Bucket, BucketIter, BucketIterMut, BUCKET_CAPACITY};
pub use pool::Pool;
