//! Room records. Numbering and area size are delegated to [`AreaStore`]; exits
//! are handled in [`crate::world::connections`].

use std::sync::Arc;

use log::{debug, info, warn};

use crate::logutil::escape_log;
use crate::world::areas::AreaStore;
use crate::world::errors::WorldError;
use crate::world::keys::extract_area_code;
use crate::world::storage::KvStore;
use crate::world::types::{NewRoom, RoomDeletion, RoomId, RoomRecord, RoomUpdate};

pub struct RoomStore<S> {
    pub(crate) store: Arc<S>,
    areas: AreaStore<S>,
}

impl<S> Clone for RoomStore<S> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
            areas: self.areas.clone(),
        }
    }
}

impl<S: KvStore> RoomStore<S> {
    pub fn new(store: Arc<S>, areas: AreaStore<S>) -> Self {
        Self { store, areas }
    }

    pub fn areas(&self) -> &AreaStore<S> {
        &self.areas
    }

    /// Create a room in an area and return the stored record, including the
    /// assigned room number.
    ///
    /// `area_code` may be a bare code or a full area key; the record is always
    /// stamped with the bare code. `data` is only read.
    pub async fn add_room(&self, area_code: &str, data: &NewRoom) -> Result<RoomRecord, WorldError> {
        let area_code = extract_area_code(area_code);
        if !self.areas.area_exists(area_code).await? {
            return Err(WorldError::AreaNotFound(area_code.to_string()));
        }

        let room_number = self.areas.reserve_room_number(area_code).await?;
        let record = RoomRecord::stamped(area_code, room_number, data);
        self.store
            .hset_all(&record.id().key(), &record.to_fields())
            .await?;
        info!(
            "Added room {} ({})",
            record.id(),
            escape_log(&record.name)
        );
        Ok(record)
    }

    /// Read a room with its exits attached, or `None` if there is no such room.
    pub async fn get_room(
        &self,
        area_code: &str,
        room_number: u64,
    ) -> Result<Option<RoomRecord>, WorldError> {
        let id = RoomId::new(extract_area_code(area_code), room_number);
        let key = id.key();
        let Some(fields) = self.store.hget_all(&key).await? else {
            return Ok(None);
        };
        let exits = self.store.hget_all(&id.exits_key()).await?;
        Ok(Some(RoomRecord::from_fields(&key, &id, fields, exits)?))
    }

    /// Merge the provided fields into an existing room. Exits are not touched.
    ///
    /// Returns `false` without writing anything when the room does not exist.
    pub async fn set_room(
        &self,
        area_code: &str,
        room_number: u64,
        update: &RoomUpdate,
    ) -> Result<bool, WorldError> {
        let id = RoomId::new(extract_area_code(area_code), room_number);
        let key = id.key();
        if self.store.hlen(&key).await? == 0 {
            debug!("Update of missing room {}", id);
            return Ok(false);
        }
        let fields = update.to_fields();
        debug!("Updating room {} ({} fields)", id, fields.len());
        self.store.hset_all(&key, &fields).await?;
        Ok(true)
    }

    /// Delete a room and its exits, then shrink its area.
    ///
    /// The steps are independent writes: a failure after the room is gone leaves
    /// the area size one too high.
    pub async fn delete_room(
        &self,
        area_code: &str,
        room_number: u64,
    ) -> Result<RoomDeletion, WorldError> {
        let id = RoomId::new(extract_area_code(area_code), room_number);
        if !self.store.del(&id.key()).await? {
            debug!("Delete of missing room {}", id);
            return Ok(RoomDeletion::NotFound);
        }
        self.store.del(&id.exits_key()).await?;

        info!("Deleted room {}", id);
        let Some(change) = self.areas.decrement_size(&id.area_code, 1).await? else {
            warn!("Room {} belonged to an area with no record", id);
            return Ok(RoomDeletion::DeletedWithoutArea);
        };
        if change.size < 0 {
            warn!("Area {} size went negative ({})", id.area_code, change.size);
        }
        if change.area_deleted {
            Ok(RoomDeletion::DeletedWithArea)
        } else {
            Ok(RoomDeletion::Deleted {
                area_size: change.size,
            })
        }
    }
}
