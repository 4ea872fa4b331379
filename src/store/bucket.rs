use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::{EntryKind, Key};
use crate::error::{StoreError, StoreResult};

/// An entry of a bucket: either a raw value or a nested bucket.
#[derive(Serialize, Deserialize, Debug, Clone, Eq, PartialEq)]
pub enum Entry {
    Value(Vec<u8>),
    Bucket(Bucket),
}

impl Entry {
    pub fn kind(&self) -> EntryKind {
        match self {
            Entry::Value(_) => EntryKind::Value,
            Entry::Bucket(_) => EntryKind::Bucket,
        }
    }
}

/// A named group of entries, kept in key order.
#[derive(Serialize, Deserialize, Debug, Default, Clone, Eq, PartialEq)]
pub struct Bucket {
    entries: BTreeMap<Key, Entry>,
}

impl Bucket {
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn entries(&self) -> impl Iterator<Item = (&Key, &Entry)> {
        self.entries.iter()
    }

    pub fn bucket(&self, name: &[u8]) -> Option<&Bucket> {
        match self.entries.get(name) {
            Some(Entry::Bucket(bucket)) => Some(bucket),
            _ => None,
        }
    }

    pub fn bucket_mut(&mut self, name: &[u8]) -> Option<&mut Bucket> {
        match self.entries.get_mut(name) {
            Some(Entry::Bucket(bucket)) => Some(bucket),
            _ => None,
        }
    }

    /// Follow `path` down from this bucket.
    pub fn walk(&self, path: &[Key]) -> Option<&Bucket> {
        path.iter().try_fold(self, |bucket, name| bucket.bucket(name))
    }

    pub fn walk_mut(&mut self, path: &[Key]) -> Option<&mut Bucket> {
        path.iter().try_fold(self, |bucket, name| bucket.bucket_mut(name))
    }

    pub fn get(&self, key: &[u8]) -> Option<&[u8]> {
        match self.entries.get(key) {
            Some(Entry::Value(value)) => Some(value),
            _ => None,
        }
    }

    pub fn put(&mut self, key: &[u8], value: &[u8]) -> StoreResult<()> {
        if key.is_empty() {
            return Err(StoreError::KeyRequired);
        }

        if let Some(Entry::Bucket(_)) = self.entries.get(key) {
            return Err(StoreError::IncompatibleValue);
        }

        self.entries.insert(key.to_vec(), Entry::Value(value.to_vec()));
        Ok(())
    }

    pub fn create_bucket(&mut self, key: &[u8]) -> StoreResult<()> {
        if key.is_empty() {
            return Err(StoreError::BucketNameRequired);
        }

        match self.entries.get(key) {
            Some(Entry::Bucket(_)) => Err(StoreError::BucketExists),
            Some(Entry::Value(_)) => Err(StoreError::IncompatibleValue),
            None => {
                self.entries.insert(key.to_vec(), Entry::Bucket(Bucket::new()));
                Ok(())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_put_then_get() {
        // Arrange
        let mut bucket = Bucket::new();

        // Act
        bucket.put(b"name", b"ferris").unwrap();

        // Assert
        assert_eq!(bucket.get(b"name"), Some(&b"ferris"[..]));
        assert_eq!(bucket.get(b"missing"), None);
    }

    #[test]
    fn test_put_overwrites_value() {
        let mut bucket = Bucket::new();
        bucket.put(b"k", b"one").unwrap();
        bucket.put(b"k", b"two").unwrap();

        assert_eq!(bucket.get(b"k"), Some(&b"two"[..]));
    }

    #[test]
    fn test_put_rejects_empty_key_and_buckets() {
        // Arrange
        let mut bucket = Bucket::new();
        bucket.create_bucket(b"nested").unwrap();

        // Act
        let empty = bucket.put(b"", b"v");
        let over_bucket = bucket.put(b"nested", b"v");

        // Assert
        assert!(matches!(empty, Err(StoreError::KeyRequired)));
        assert!(matches!(over_bucket, Err(StoreError::IncompatibleValue)));
        assert!(bucket.bucket(b"nested").is_some());
    }

    #[test]
    fn test_create_bucket_conflicts() {
        // Arrange
        let mut bucket = Bucket::new();
        bucket.create_bucket(b"b").unwrap();
        bucket.put(b"v", b"1").unwrap();

        // Act & Assert
        assert!(matches!(
            bucket.create_bucket(b"b"),
            Err(StoreError::BucketExists)
        ));
        assert!(matches!(
            bucket.create_bucket(b"v"),
            Err(StoreError::IncompatibleValue)
        ));
        assert_eq!(bucket.get(b"v"), Some(&b"1"[..]));
        assert!(bucket.bucket(b"b").is_some_and(Bucket::is_empty));
        assert!(matches!(
            bucket.create_bucket(b""),
            Err(StoreError::BucketNameRequired)
        ));
    }

    #[test]
    fn test_walk_nested_buckets() {
        // Arrange
        let mut root = Bucket::new();
        root.create_bucket(b"a").unwrap();
        let a = root.bucket_mut(b"a").unwrap();
        a.create_bucket(b"b").unwrap();
        a.bucket_mut(b"b").unwrap().put(b"leaf", b"x").unwrap();

        // Act
        let found = root.walk(&[b"a".to_vec(), b"b".to_vec()]);
        let missing = root.walk(&[b"a".to_vec(), b"nope".to_vec()]);

        // Assert
        assert_eq!(found.and_then(|b| b.get(b"leaf")), Some(&b"x"[..]));
        assert!(missing.is_none());
        assert_eq!(root.walk(&[]), Some(&root));
    }

    #[test]
    fn test_entries_are_key_ordered() {
        let mut bucket = Bucket::new();
        bucket.put(b"zeta", b"1").unwrap();
        bucket.create_bucket(b"alpha").unwrap();
        bucket.put(b"mid", b"2").unwrap();

        let keys: Vec<(&[u8], EntryKind)> = bucket
            .entries()
            .map(|(k, e)| (k.as_slice(), e.kind()))
            .collect();

        assert_eq!(
            keys,
            vec![
                (&b"alpha"[..], EntryKind::Bucket),
                (&b"mid"[..], EntryKind::Value),
                (&b"zeta"[..], EntryKind::Value),
            ]
        );
    }
}
