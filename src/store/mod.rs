//! Nested bucket storage.
//!
//! A store is a tree of buckets. Every bucket maps byte keys either to a
//! value or to another bucket. Buckets are addressed by their key path from
//! the root bucket; the root itself is the empty path and never holds values.

pub mod bucket;
pub mod file;
pub mod tx;

pub use bucket::{Bucket, Entry};
pub use file::{Database, OpenOptions};
pub use tx::Tx;

use crate::error::StoreResult;

/// A bucket or value key.
pub type Key = Vec<u8>;

/// What a key inside a bucket refers to.
#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub enum EntryKind {
    Value,
    Bucket,
}

/// Read and write access to a store for the duration of one transaction.
///
/// Methods take `&self` so that many navigation handles can share a single
/// transaction; implementations use interior mutability for writes.
pub trait Transaction {
    /// Direct children of `bucket` in ascending key order.
    ///
    /// A path that does not name a bucket has no children.
    fn entries(&self, bucket: &[Key]) -> Vec<(Key, EntryKind)>;

    /// Whether `bucket` names an existing bucket.
    fn has_bucket(&self, bucket: &[Key]) -> bool;

    /// The value stored at `key` in `bucket`, if any.
    fn get(&self, bucket: &[Key], key: &[u8]) -> Option<Vec<u8>>;

    /// Store `value` at `key` in `bucket`, replacing an existing value.
    fn put(&self, bucket: &[Key], key: &[u8], value: &[u8]) -> StoreResult<()>;

    /// Create a new, empty bucket named `key` inside `bucket`.
    fn create_bucket(&self, bucket: &[Key], key: &[u8]) -> StoreResult<()>;
}
