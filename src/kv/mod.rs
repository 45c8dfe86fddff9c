//! Key-Value Storage
//!
//! Durable string-to-string mapping that the pin store persists into. One
//! record per username; values are whole serialized pin lists.
//!
//! Backends:
//!
//! - [`MemoryStore`]: process-local map, used by tests and `backend: memory`
//! - [`LibsqlStore`]: `kv` table in a local or Turso-replicated libsql database
//! - [`ObjectStore`]: one S3 object per key
//!
//! Individual `get`/`put` calls are atomic per backend. There is no
//! transaction spanning a read and the following write.

use std::future::Future;

use crate::error::KvError;

mod memory;
mod s3;
mod sqlite;

pub use memory::MemoryStore;
pub use s3::ObjectStore;
pub use sqlite::LibsqlStore;

pub trait KeyValueStore: Send + Sync + 'static {
    /// `Ok(None)` when nothing is stored under `key`.
    fn get(&self, key: &str) -> impl Future<Output = Result<Option<String>, KvError>> + Send;

    fn put(&self, key: &str, value: String) -> impl Future<Output = Result<(), KvError>> + Send;
}
