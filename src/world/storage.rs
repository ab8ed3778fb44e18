//! Key-value store protocol and its sled-backed implementation.
//!
//! The world layers only ever talk to [`KvStore`]. Records are flat field maps
//! addressed by string keys; counters live in their own namespace.

use std::future::Future;
use std::path::{Path, PathBuf};

use log::{debug, trace};
use sled::IVec;

use crate::world::errors::WorldError;
use crate::world::types::FieldMap;

const TREE_RECORDS: &str = "redmud_records";
const TREE_COUNTERS: &str = "redmud_counters";

/// Operations the world layers need from the underlying store.
///
/// Reads of a missing record yield `None`, never an empty map. A record whose
/// last field is removed stops existing.
pub trait KvStore: Send + Sync {
    /// Merge `fields` into the record at `key`, creating it if needed.
    fn hset_all(
        &self,
        key: &str,
        fields: &FieldMap,
    ) -> impl Future<Output = Result<(), WorldError>> + Send;

    fn hget_all(&self, key: &str)
        -> impl Future<Output = Result<Option<FieldMap>, WorldError>> + Send;

    fn hset(
        &self,
        key: &str,
        field: &str,
        value: &str,
    ) -> impl Future<Output = Result<(), WorldError>> + Send;

    fn hget(
        &self,
        key: &str,
        field: &str,
    ) -> impl Future<Output = Result<Option<String>, WorldError>> + Send;

    /// Remove one field. Returns whether it was present.
    fn hdel(&self, key: &str, field: &str) -> impl Future<Output = Result<bool, WorldError>> + Send;

    /// Number of fields in the record (0 when absent).
    fn hlen(&self, key: &str) -> impl Future<Output = Result<usize, WorldError>> + Send;

    /// Atomically add `delta` to an integer field and return the new value.
    fn hincr_by(
        &self,
        key: &str,
        field: &str,
        delta: i64,
    ) -> impl Future<Output = Result<i64, WorldError>> + Send;

    /// Atomically increment a named counter and return the new value.
    fn incr(&self, key: &str) -> impl Future<Output = Result<i64, WorldError>> + Send;

    /// Remove a record (or counter). Returns whether anything was removed.
    fn del(&self, key: &str) -> impl Future<Output = Result<bool, WorldError>> + Send;

    /// Drop every record and counter.
    fn flush_all(&self) -> impl Future<Output = Result<(), WorldError>> + Send;
}

/// Helper builder so tests can easily create throwaway stores with custom paths.
pub struct SledStoreBuilder {
    path: PathBuf,
    flush_writes: bool,
}

impl SledStoreBuilder {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            flush_writes: true,
        }
    }

    /// Skip the fsync after every write (faster, for scratch databases).
    pub fn without_flush(mut self) -> Self {
        self.flush_writes = false;
        self
    }

    pub fn open(self) -> Result<SledStore, WorldError> {
        SledStore::open_with_options(self.path, self.flush_writes)
    }
}

/// Sled-backed persistence for world records and counters.
pub struct SledStore {
    _db: sled::Db,
    records: sled::Tree,
    counters: sled::Tree,
    flush_writes: bool,
}

impl SledStore {
    /// Open (or create) the store rooted at `path`.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, WorldError> {
        Self::open_with_options(path, true)
    }

    fn open_with_options<P: AsRef<Path>>(path: P, flush_writes: bool) -> Result<Self, WorldError> {
        let path_ref = path.as_ref();
        std::fs::create_dir_all(path_ref)?;
        let db = sled::open(path_ref)?;
        let records = db.open_tree(TREE_RECORDS)?;
        let counters = db.open_tree(TREE_COUNTERS)?;
        debug!("Opened world store at {}", path_ref.display());
        Ok(Self {
            _db: db,
            records,
            counters,
            flush_writes,
        })
    }

    fn serialize(fields: &FieldMap) -> Result<Vec<u8>, WorldError> {
        Ok(bincode::serialize(fields)?)
    }

    fn deserialize(bytes: &[u8]) -> Result<FieldMap, WorldError> {
        Ok(bincode::deserialize::<FieldMap>(bytes)?)
    }

    fn decode_counter(key: &str, bytes: &[u8]) -> Result<i64, WorldError> {
        let raw: [u8; 8] = bytes
            .try_into()
            .map_err(|_| WorldError::Corrupt(key.to_string()))?;
        Ok(i64::from_be_bytes(raw))
    }

    fn flush(&self, tree: &sled::Tree) -> Result<(), WorldError> {
        if self.flush_writes {
            tree.flush()?;
        }
        Ok(())
    }

    /// Read-modify-write one record with compare-and-swap, retrying on contention.
    ///
    /// An empty map after `apply` removes the record.
    fn update_record<R>(
        &self,
        key: &str,
        mut apply: impl FnMut(&mut FieldMap) -> Result<R, WorldError>,
    ) -> Result<R, WorldError> {
        loop {
            let current: Option<IVec> = self.records.get(key)?;
            let mut fields = match &current {
                Some(bytes) => Self::deserialize(bytes)?,
                None => FieldMap::new(),
            };
            let result = apply(&mut fields)?;
            let next = if fields.is_empty() {
                None
            } else {
                Some(Self::serialize(&fields)?)
            };
            match self.records.compare_and_swap(key, current, next)? {
                Ok(()) => {
                    self.flush(&self.records)?;
                    return Ok(result);
                }
                Err(_) => trace!("CAS contention on {}, retrying", key),
            }
        }
    }
}

impl KvStore for SledStore {
    async fn hset_all(&self, key: &str, fields: &FieldMap) -> Result<(), WorldError> {
        if fields.is_empty() {
            return Ok(());
        }
        self.update_record(key, |record| {
            record.extend(fields.iter().map(|(k, v)| (k.clone(), v.clone())));
            Ok(())
        })
    }

    async fn hget_all(&self, key: &str) -> Result<Option<FieldMap>, WorldError> {
        match self.records.get(key)? {
            Some(bytes) => Ok(Some(Self::deserialize(&bytes)?)),
            None => Ok(None),
        }
    }

    async fn hset(&self, key: &str, field: &str, value: &str) -> Result<(), WorldError> {
        self.update_record(key, |record| {
            record.insert(field.to_string(), value.to_string());
            Ok(())
        })
    }

    async fn hget(&self, key: &str, field: &str) -> Result<Option<String>, WorldError> {
        let record = self.hget_all(key).await?;
        Ok(record.and_then(|mut fields| fields.remove(field)))
    }

    async fn hdel(&self, key: &str, field: &str) -> Result<bool, WorldError> {
        if self.records.get(key)?.is_none() {
            return Ok(false);
        }
        self.update_record(key, |record| Ok(record.remove(field).is_some()))
    }

    async fn hlen(&self, key: &str) -> Result<usize, WorldError> {
        Ok(self.hget_all(key).await?.map_or(0, |fields| fields.len()))
    }

    async fn hincr_by(&self, key: &str, field: &str, delta: i64) -> Result<i64, WorldError> {
        self.update_record(key, |record| {
            let current = match record.get(field) {
                Some(raw) => raw.parse::<i64>().map_err(|_| WorldError::Corrupt(key.to_string()))?,
                None => 0,
            };
            let next = current + delta;
            record.insert(field.to_string(), next.to_string());
            Ok(next)
        })
    }

    async fn incr(&self, key: &str) -> Result<i64, WorldError> {
        loop {
            let current = self.counters.get(key)?;
            let value = match &current {
                Some(bytes) => Self::decode_counter(key, bytes)?,
                None => 0,
            };
            let next = value + 1;
            let swapped = self
                .counters
                .compare_and_swap(key, current, Some(next.to_be_bytes().to_vec()))?;
            if swapped.is_ok() {
                self.flush(&self.counters)?;
                return Ok(next);
            }
            trace!("counter contention on {}, retrying", key);
        }
    }

    async fn del(&self, key: &str) -> Result<bool, WorldError> {
        let record = self.records.remove(key)?;
        let counter = self.counters.remove(key)?;
        self.flush(&self.records)?;
        self.flush(&self.counters)?;
        Ok(record.is_some() || counter.is_some())
    }

    async fn flush_all(&self) -> Result<(), WorldError> {
        self.records.clear()?;
        self.counters.clear()?;
        self.flush(&self.records)?;
        self.flush(&self.counters)?;
        debug!("Flushed all world records");
        Ok(())
    }
}
