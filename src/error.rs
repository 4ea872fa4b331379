use std::path::PathBuf;

use miette::Diagnostic;
use thiserror::Error;

/// Errors raised by the bucket store and its transactions.
#[derive(Debug, Diagnostic, Error)]
pub enum StoreError {
    #[error("key required")]
    #[diagnostic(code(bucketsh::store::key_required))]
    KeyRequired,

    #[error("bucket name required")]
    #[diagnostic(code(bucketsh::store::bucket_name_required))]
    BucketNameRequired,

    #[error("bucket already exists")]
    #[diagnostic(code(bucketsh::store::bucket_exists))]
    BucketExists,

    /// A value was written over a bucket, or a bucket over a value.
    #[error("incompatible value")]
    #[diagnostic(code(bucketsh::store::incompatible_value))]
    IncompatibleValue,

    #[error("bucket not found")]
    #[diagnostic(code(bucketsh::store::bucket_not_found))]
    BucketNotFound,

    #[error("cannot store values at root level")]
    #[diagnostic(code(bucketsh::store::value_at_root))]
    ValueAtRoot,

    #[error("unable to stat database file {}", path.display())]
    #[diagnostic(
        code(bucketsh::store::not_found),
        help("pass --create to start a new, empty store at this path")
    )]
    NotFound {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("timed out waiting for the database lock")]
    #[diagnostic(
        code(bucketsh::store::timeout),
        help("another process holds this store open; close it or raise --timeout")
    )]
    Timeout,

    #[error("invalid store file: {0}")]
    #[diagnostic(code(bucketsh::store::corrupt))]
    Corrupt(String),

    #[error(transparent)]
    #[diagnostic(code(bucketsh::store::io))]
    Io(#[from] std::io::Error),

    #[error("unable to encode store")]
    #[diagnostic(code(bucketsh::store::encode))]
    Encode(#[from] bincode::Error),

    #[error("unable to lock database file")]
    #[diagnostic(code(bucketsh::store::lock))]
    Lock(#[from] nix::errno::Errno),
}

pub type StoreResult<T> = Result<T, StoreError>;

/// Recoverable failures of a single shell command.
///
/// None of these end the session; they are printed and the current level
/// stays where it was.
#[derive(Debug, Diagnostic, Error)]
pub enum CommandError {
    /// A path segment did not name an existing bucket.
    #[error("Unable to {action} {path}")]
    #[diagnostic(code(bucketsh::command::navigation))]
    Navigation { action: String, path: String },

    /// The command was called without its required arguments.
    #[error("{0}")]
    #[diagnostic(code(bucketsh::command::missing_operand))]
    MissingOperand(&'static str),

    /// The store refused the write.
    #[error("Unable to {action}: {source}")]
    #[diagnostic(code(bucketsh::command::write_rejected))]
    WriteRejected {
        action: String,
        #[source]
        source: StoreError,
    },

    #[error("Unrecognized command: {0}")]
    #[diagnostic(
        code(bucketsh::command::unknown),
        help("type 'help' for list of commands")
    )]
    UnknownCommand(String),

    #[error("No data at key {0}")]
    #[diagnostic(code(bucketsh::command::no_data))]
    NoData(String),
}
