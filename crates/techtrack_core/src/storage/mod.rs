//! Durable key-value blob storage.
//!
//! # Responsibility
//! - Define the `KvStore` contract the record store writes through to.
//! - Provide SQLite-backed and in-process implementations.
//!
//! # Invariants
//! - Values are opaque UTF-8 strings; callers own the encoding.
//! - `set` replaces the whole value for a key.

use crate::db::DbError;
use std::error::Error;
use std::fmt::{Display, Formatter};

mod memory;
mod sqlite;

pub use memory::MemoryKvStore;
pub use sqlite::SqliteKvStore;

pub type StorageResult<T> = Result<T, StorageError>;

/// Failure reading or writing durable storage.
#[derive(Debug)]
pub enum StorageError {
    Db(DbError),
    /// The value does not fit the configured storage quota.
    QuotaExceeded {
        key: String,
        bytes: usize,
        quota: usize,
    },
}

impl Display for StorageError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Db(err) => write!(f, "{err}"),
            Self::QuotaExceeded { key, bytes, quota } => write!(
                f,
                "storage quota exceeded for `{key}`: {bytes} bytes > {quota} bytes"
            ),
        }
    }
}

impl Error for StorageError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Db(err) => Some(err),
            Self::QuotaExceeded { .. } => None,
        }
    }
}

impl From<DbError> for StorageError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<rusqlite::Error> for StorageError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}

/// Key-value blob store surviving process restarts.
///
/// Implementations are single-threaded: `MemoryKvStore` uses interior
/// mutability and `SqliteKvStore` borrows one connection, so neither is
/// `Sync`. Hosts must not share a store across threads; serialize access
/// and open one per call instead, as the FFI layer does.
pub trait KvStore {
    /// Returns the stored value, or `None` when the key was never written.
    fn get(&self, key: &str) -> StorageResult<Option<String>>;
    /// Replaces the value stored under `key`.
    fn set(&self, key: &str, value: &str) -> StorageResult<()>;
}
