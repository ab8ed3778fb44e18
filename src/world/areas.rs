//! Area records: creation, partial updates, size bookkeeping and room-number
//! allocation.

use std::sync::Arc;

use log::{debug, info};

use crate::logutil::escape_log;
use crate::world::errors::WorldError;
use crate::world::keys::{build_area_code, build_room_counter_code, extract_area_code};
use crate::world::storage::KvStore;
use crate::world::types::{AreaRecord, AreaUpdate, EmptyAreaPolicy, SizeChange, FIELD_SIZE};

/// CRUD over area records. Every method accepts a bare area code (`KDV`) or a
/// full area key (`AREAS:KDV`).
pub struct AreaStore<S> {
    store: Arc<S>,
    policy: EmptyAreaPolicy,
}

impl<S> Clone for AreaStore<S> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
            policy: self.policy,
        }
    }
}

impl<S: KvStore> AreaStore<S> {
    pub fn new(store: Arc<S>, policy: EmptyAreaPolicy) -> Self {
        Self { store, policy }
    }

    pub fn policy(&self) -> EmptyAreaPolicy {
        self.policy
    }

    /// Write a new area record. `size` always starts at zero; an existing record
    /// under the same code is overwritten.
    pub async fn create_area(&self, code: &str, data: &AreaRecord) -> Result<AreaRecord, WorldError> {
        let key = build_area_code(code);
        let record = AreaRecord {
            size: 0,
            ..data.clone()
        };
        self.store.hset_all(&key, &record.to_fields()).await?;
        info!("Created area {} ({})", key, escape_log(&record.name));
        Ok(record)
    }

    pub async fn get_area(&self, code: &str) -> Result<Option<AreaRecord>, WorldError> {
        let key = build_area_code(code);
        match self.store.hget_all(&key).await? {
            Some(fields) => Ok(Some(AreaRecord::from_fields(&key, fields)?)),
            None => Ok(None),
        }
    }

    pub async fn area_exists(&self, code: &str) -> Result<bool, WorldError> {
        Ok(self.store.hlen(&build_area_code(code)).await? > 0)
    }

    /// Merge the provided fields into the area record. `size` is never touched.
    pub async fn set_area(&self, code: &str, update: &AreaUpdate) -> Result<(), WorldError> {
        let key = build_area_code(code);
        let fields = update.to_fields();
        debug!("Updating area {} ({} fields)", key, fields.len());
        self.store.hset_all(&key, &fields).await
    }

    /// Allocate the next room number for an area and count the room in `size`.
    ///
    /// The counter is an atomic store increment, so concurrent callers always get
    /// distinct numbers. Numbers are never handed out twice, even after deletes.
    pub async fn reserve_room_number(&self, code: &str) -> Result<u64, WorldError> {
        let counter_key = build_room_counter_code(code);
        let number = self.store.incr(&counter_key).await?;
        let size = self.increment_size(code, 1).await?;
        debug!(
            "Reserved room {} in {} (size now {})",
            number,
            extract_area_code(code),
            size.size
        );
        u64::try_from(number).map_err(|_| WorldError::Corrupt(counter_key))
    }

    /// Grow (or, with a negative delta, shrink) an area. Never purges it.
    pub async fn increment_size(&self, code: &str, delta: i64) -> Result<SizeChange, WorldError> {
        self.adjust_size(code, delta, false).await
    }

    /// Shrink an area, purging it under [`EmptyAreaPolicy::Purge`] once it is
    /// empty. Returns `None` when the area has no record; it is left alone
    /// rather than recreated with a negative size.
    pub async fn decrement_size(
        &self,
        code: &str,
        delta: i64,
    ) -> Result<Option<SizeChange>, WorldError> {
        if !self.area_exists(code).await? {
            debug!("Skipping size decrement for missing area {}", build_area_code(code));
            return Ok(None);
        }
        self.adjust_size(code, -delta, true).await.map(Some)
    }

    async fn adjust_size(
        &self,
        code: &str,
        delta: i64,
        purge_allowed: bool,
    ) -> Result<SizeChange, WorldError> {
        let key = build_area_code(code);
        let size = self.store.hincr_by(&key, FIELD_SIZE, delta).await?;
        let area_deleted = purge_allowed && size <= 0 && self.policy == EmptyAreaPolicy::Purge;
        if area_deleted {
            self.store.del(&key).await?;
            info!("Area {} is empty, purged", key);
        }
        Ok(SizeChange { size, area_deleted })
    }

    /// Remove the area record unconditionally. Its rooms are left alone.
    pub async fn delete_area(&self, code: &str) -> Result<bool, WorldError> {
        let key = build_area_code(code);
        let removed = self.store.del(&key).await?;
        info!("Deleted area {} (existed: {})", key, removed);
        Ok(removed)
    }
}
