use std::cell::{Cell, RefCell};

use tracing::debug;

use super::{Bucket, Database, EntryKind, Key, Transaction};
use crate::error::{StoreError, StoreResult};

/// A read-write transaction over a whole store.
///
/// The tree is copied out of the database when the transaction begins and
/// written back by [`Tx::commit`]. Dropping the transaction without
/// committing discards every change.
pub struct Tx<'db> {
    root: RefCell<Bucket>,
    dirty: Cell<bool>,
    db: Option<&'db mut Database>,
}

impl Tx<'static> {
    /// A transaction that is not backed by any file.
    pub fn in_memory() -> Self {
        Self::from_bucket(Bucket::new())
    }

    pub fn from_bucket(root: Bucket) -> Self {
        Self {
            root: RefCell::new(root),
            dirty: Cell::new(false),
            db: None,
        }
    }
}

impl<'db> Tx<'db> {
    pub(super) fn new(db: &'db mut Database) -> Self {
        Self {
            root: RefCell::new(db.root().clone()),
            dirty: Cell::new(false),
            db: Some(db),
        }
    }

    /// Whether a write happened since the transaction began.
    pub fn is_dirty(&self) -> bool {
        self.dirty.get()
    }

    /// Persist the changes made in this transaction.
    pub fn commit(self) -> StoreResult<()> {
        let root = self.root.into_inner();
        match self.db {
            Some(db) if self.dirty.get() => db.write(root),
            Some(_) => {
                debug!("nothing to commit");
                Ok(())
            }
            None => Ok(()),
        }
    }

    pub fn rollback(self) {
        debug!(dirty = self.dirty.get(), "rolling back transaction");
    }

    /// A snapshot of the tree as seen by this transaction.
    #[cfg(test)]
    pub fn snapshot(&self) -> Bucket {
        self.root.borrow().clone()
    }

    fn write_with<T>(
        &self,
        bucket: &[Key],
        f: impl FnOnce(&mut Bucket) -> StoreResult<T>,
    ) -> StoreResult<T> {
        let mut root = self.root.borrow_mut();
        let target = root.walk_mut(bucket).ok_or(StoreError::BucketNotFound)?;
        let result = f(target)?;
        self.dirty.set(true);
        Ok(result)
    }
}

impl Transaction for Tx<'_> {
    fn entries(&self, bucket: &[Key]) -> Vec<(Key, EntryKind)> {
        let root = self.root.borrow();
        root.walk(bucket)
            .map(|b| b.entries().map(|(k, e)| (k.clone(), e.kind())).collect())
            .unwrap_or_default()
    }

    fn has_bucket(&self, bucket: &[Key]) -> bool {
        self.root.borrow().walk(bucket).is_some()
    }

    fn get(&self, bucket: &[Key], key: &[u8]) -> Option<Vec<u8>> {
        if bucket.is_empty() {
            return None;
        }
        let root = self.root.borrow();
        root.walk(bucket)?.get(key).map(<[u8]>::to_vec)
    }

    fn put(&self, bucket: &[Key], key: &[u8], value: &[u8]) -> StoreResult<()> {
        if bucket.is_empty() {
            return Err(StoreError::ValueAtRoot);
        }
        self.write_with(bucket, |b| b.put(key, value))
    }

    fn create_bucket(&self, bucket: &[Key], key: &[u8]) -> StoreResult<()> {
        self.write_with(bucket, |b| b.create_bucket(key))
    }
}
