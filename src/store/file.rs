use std::{
    fs::File,
    io::{BufReader, BufWriter, Read, Seek, SeekFrom, Write},
    path::{Path, PathBuf},
    thread,
    time::{Duration, Instant},
};

use nix::{
    errno::Errno,
    fcntl::{Flock, FlockArg},
};
use serde::{Deserialize, Serialize};
use tracing::{debug, trace};

use super::{Bucket, Tx};
use crate::error::{StoreError, StoreResult};

const STORE_MAGIC: u32 = 0x6275_6b74;
const STORE_VERSION: u32 = 1;
const LOCK_RETRY_INTERVAL: Duration = Duration::from_millis(50);

/// How long to wait for the file lock when none is given.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(1);

#[inline]
fn calculate_checksum<S>(s: &S) -> StoreResult<u32>
where
    S: Serialize,
{
    let mut hasher = crc32fast::Hasher::new();
    hasher.update(&bincode::serialize(s)?);
    Ok(hasher.finalize())
}

/// On-disk layout of a store.
#[derive(Serialize, Deserialize, Debug)]
struct StoreFile {
    magic: u32,
    version: u32,
    checksum: u32,
    root: Bucket,
}

impl StoreFile {
    fn new(root: Bucket) -> StoreResult<Self> {
        let checksum = calculate_checksum(&root)?;
        Ok(Self {
            magic: STORE_MAGIC,
            version: STORE_VERSION,
            checksum,
            root,
        })
    }

    fn serialize_into<W>(&self, w: W) -> StoreResult<()>
    where
        W: Write,
    {
        bincode::serialize_into(w, self).map_err(Into::into)
    }

    fn deserialize_from<R>(r: R) -> StoreResult<Self>
    where
        R: Read,
    {
        let file: Self =
            bincode::deserialize_from(r).map_err(|e| StoreError::Corrupt(e.to_string()))?;

        if file.magic != STORE_MAGIC {
            return Err(StoreError::Corrupt("not a bucket store".into()));
        }
        if file.version != STORE_VERSION {
            return Err(StoreError::Corrupt(format!(
                "unsupported version {}",
                file.version
            )));
        }
        if file.checksum != calculate_checksum(&file.root)? {
            return Err(StoreError::Corrupt("checksum verification failed".into()));
        }

        Ok(file)
    }
}

/// Settings used when opening a [`Database`].
#[derive(Debug, Clone)]
pub struct OpenOptions {
    /// Give up waiting for the file lock after this long.
    pub timeout: Duration,
    /// Create an empty store when the file does not exist.
    pub create: bool,
}

impl Default for OpenOptions {
    fn default() -> Self {
        Self {
            timeout: DEFAULT_TIMEOUT,
            create: false,
        }
    }
}

/// A store file held open under an exclusive lock.
///
/// The lock is released when the database is dropped.
pub struct Database {
    path: PathBuf,
    file: Flock<File>,
    root: Bucket,
}

impl Database {
    pub fn open<P>(path: P, options: &OpenOptions) -> StoreResult<Self>
    where
        P: AsRef<Path>,
    {
        let path = path.as_ref().to_path_buf();

        let file = match std::fs::metadata(&path) {
            Ok(_) => std::fs::OpenOptions::new()
                .read(true)
                .write(true)
                .open(&path)?,
            Err(source) if options.create && source.kind() == std::io::ErrorKind::NotFound => {
                debug!(path = %path.display(), "creating new store");
                std::fs::OpenOptions::new()
                    .read(true)
                    .write(true)
                    .create_new(true)
                    .open(&path)?
            }
            Err(source) => return Err(StoreError::NotFound { path, source }),
        };

        let mut file = Self::lock(file, options.timeout)?;

        let root = if file.metadata()?.len() == 0 {
            Bucket::new()
        } else {
            file.seek(SeekFrom::Start(0))?;
            StoreFile::deserialize_from(BufReader::new(&mut *file))?.root
        };

        debug!(path = %path.display(), "opened store");
        Ok(Self { path, file, root })
    }

    fn lock(file: File, timeout: Duration) -> StoreResult<Flock<File>> {
        let deadline = Instant::now() + timeout;
        let mut file = file;

        loop {
            match Flock::lock(file, FlockArg::LockExclusiveNonblock) {
                Ok(locked) => return Ok(locked),
                Err((unlocked, errno)) if errno == Errno::EWOULDBLOCK => {
                    if Instant::now() >= deadline {
                        return Err(StoreError::Timeout);
                    }
                    trace!("store is locked, retrying");
                    file = unlocked;
                    thread::sleep(LOCK_RETRY_INTERVAL);
                }
                Err((_, errno)) => return Err(errno.into()),
            }
        }
    }

    pub fn root(&self) -> &Bucket {
        &self.root
    }

    /// Begin the read-write transaction.
    pub fn begin(&mut self) -> Tx<'_> {
        Tx::new(self)
    }

    pub(super) fn write(&mut self, root: Bucket) -> StoreResult<()> {
        let store = StoreFile::new(root)?;

        self.file.set_len(0)?;
        self.file.seek(SeekFrom::Start(0))?;
        let mut buf = BufWriter::new(&mut *self.file);
        store.serialize_into(&mut buf)?;
        buf.flush()?;
        drop(buf);
        self.file.sync_all()?;

        debug!(path = %self.path.display(), "committed store");
        self.root = store.root;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::Transaction;
    use anyhow::Result;
    use tempfile::tempdir;

    fn create() -> OpenOptions {
        OpenOptions {
            create: true,
            ..Default::default()
        }
    }

    #[test]
    fn test_missing_file_is_an_error() -> Result<()> {
        let dir = tempdir()?;
        let path = dir.path().join("missing.db");

        let result = Database::open(&path, &OpenOptions::default());

        assert!(matches!(result, Err(StoreError::NotFound { .. })));
        assert!(!path.exists());
        Ok(())
    }

    #[test]
    fn test_create_new_store() -> Result<()> {
        // Arrange
        let dir = tempdir()?;
        let path = dir.path().join("new.db");

        // Act
        let db = Database::open(&path, &create())?;

        // Assert
        assert!(path.exists());
        assert!(db.root().is_empty());
        Ok(())
    }

    #[test]
    fn test_commit_persists_changes() -> Result<()> {
        // Arrange
        let dir = tempdir()?;
        let path = dir.path().join("persist.db");

        // Act
        {
            let mut db = Database::open(&path, &create())?;
            let tx = db.begin();
            tx.create_bucket(&[], b"users")?;
            tx.put(&[b"users".to_vec()], b"ferris", b"crab")?;
            tx.commit()?;
        }

        // Assert
        let mut db = Database::open(&path, &OpenOptions::default())?;
        let tx = db.begin();
        assert_eq!(
            tx.get(&[b"users".to_vec()], b"ferris"),
            Some(b"crab".to_vec())
        );
        Ok(())
    }

    #[test]
    fn test_rollback_discards_changes() -> Result<()> {
        let dir = tempdir()?;
        let path = dir.path().join("rollback.db");

        {
            let mut db = Database::open(&path, &create())?;
            let tx = db.begin();
            tx.create_bucket(&[], b"scratch")?;
            tx.rollback();
        }

        let db = Database::open(&path, &OpenOptions::default())?;
        assert!(db.root().is_empty());
        Ok(())
    }

    #[test]
    fn test_corrupt_file_is_rejected() -> Result<()> {
        // Arrange
        let dir = tempdir()?;
        let path = dir.path().join("corrupt.db");
        std::fs::write(&path, b"definitely not a store")?;

        // Act
        let result = Database::open(&path, &OpenOptions::default());

        // Assert
        assert!(matches!(result, Err(StoreError::Corrupt(_))));
        Ok(())
    }

    #[test]
    fn test_checksum_mismatch_is_rejected() -> Result<()> {
        // Arrange
        let dir = tempdir()?;
        let path = dir.path().join("tampered.db");
        let mut root = Bucket::new();
        root.create_bucket(b"a")?;
        root.bucket_mut(b"a").unwrap().put(b"k", b"v")?;
        let mut store = StoreFile::new(root)?;
        store.checksum ^= 1;
        store.serialize_into(File::create(&path)?)?;

        // Act
        let result = Database::open(&path, &OpenOptions::default());

        // Assert
        assert!(matches!(result, Err(StoreError::Corrupt(_))));
        Ok(())
    }

    #[test]
    fn test_second_open_times_out() -> Result<()> {
        // Arrange
        let dir = tempdir()?;
        let path = dir.path().join("locked.db");
        let _held = Database::open(&path, &create())?;

        // Act
        let options = OpenOptions {
            timeout: Duration::from_millis(100),
            create: false,
        };
        let result = Database::open(&path, &options);

        // Assert
        assert!(matches!(result, Err(StoreError::Timeout)));
        Ok(())
    }
}
