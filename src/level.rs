use std::{fmt, rc::Rc};

use tracing::trace;

use crate::error::StoreResult;
use crate::store::{EntryKind, Key, Transaction};

/// A position in the bucket tree.
///
/// Levels are cheap, immutable handles into one transaction: moving around
/// never changes a level, it hands back a new one. Each bucket level keeps
/// its parent so that `..` can walk back up.
#[derive(Clone)]
pub struct Level<'tx> {
    tx: &'tx dyn Transaction,
    node: Node<'tx>,
}

#[derive(Clone)]
enum Node<'tx> {
    Root,
    Bucket {
        path: Rc<[Key]>,
        parent: Rc<Level<'tx>>,
    },
}

impl<'tx> Level<'tx> {
    pub fn root(tx: &'tx dyn Transaction) -> Self {
        Self {
            tx,
            node: Node::Root,
        }
    }

    #[inline]
    pub fn is_root(&self) -> bool {
        matches!(self.node, Node::Root)
    }

    /// Key path of this level's bucket, empty at root.
    pub fn path(&self) -> &[Key] {
        match &self.node {
            Node::Root => &[],
            Node::Bucket { path, .. } => &path[..],
        }
    }

    /// The path rendered for humans, e.g. `/users/ferris`.
    pub fn display_path(&self) -> String {
        if self.is_root() {
            return "/".into();
        }
        self.path()
            .iter()
            .map(|key| format!("/{}", String::from_utf8_lossy(key)))
            .collect()
    }

    /// The parent level, or `None` at root.
    pub fn prev(&self) -> Option<Level<'tx>> {
        match &self.node {
            Node::Root => None,
            Node::Bucket { parent, .. } => Some(Level::clone(parent)),
        }
    }

    /// The root this level descends from.
    pub fn top(&self) -> Level<'tx> {
        let mut level = self.clone();
        while let Some(parent) = level.prev() {
            level = parent;
        }
        level
    }

    /// Step into the bucket `name` directly below this level.
    pub fn cd(&self, name: &str) -> Option<Level<'tx>> {
        let mut path = self.path().to_vec();
        path.push(name.as_bytes().to_vec());

        if !self.tx.has_bucket(&path) {
            trace!(name, from = %self.display_path(), "no such bucket");
            return None;
        }

        Some(Self {
            tx: self.tx,
            node: Node::Bucket {
                path: path.into(),
                parent: Rc::new(self.clone()),
            },
        })
    }

    /// Keys below this level in store order; bucket keys end with `/`.
    pub fn list(&self) -> Vec<String> {
        self.tx
            .entries(self.path())
            .into_iter()
            .map(|(key, kind)| {
                let name = String::from_utf8_lossy(&key);
                match kind {
                    EntryKind::Value => name.into_owned(),
                    EntryKind::Bucket => format!("{name}/"),
                }
            })
            .collect()
    }

    /// The value stored at `key`. Root never holds values.
    pub fn get(&self, key: &str) -> Option<Vec<u8>> {
        match self.node {
            Node::Root => None,
            Node::Bucket { .. } => self.tx.get(self.path(), key.as_bytes()),
        }
    }

    pub fn put(&self, key: &str, value: &str) -> StoreResult<()> {
        self.tx.put(self.path(), key.as_bytes(), value.as_bytes())
    }

    /// Create an empty bucket named `key` below this level.
    pub fn mkdir(&self, key: &str) -> StoreResult<()> {
        self.tx.create_bucket(self.path(), key.as_bytes())
    }
}

impl PartialEq for Level<'_> {
    fn eq(&self, other: &Self) -> bool {
        std::ptr::addr_eq(self.tx, other.tx) && self.path() == other.path()
    }
}

impl Eq for Level<'_> {}

impl fmt::Debug for Level<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Level").field(&self.display_path()).finish()
    }
}
