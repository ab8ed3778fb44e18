//! Exits between rooms.
//!
//! An exit is one field in the source room's exits record: command -> destination
//! room key. A connection is two exits written independently, so a failure between
//! the writes leaves a one-way link behind; nothing is rolled back.

use log::{debug, info};

use crate::world::errors::WorldError;
use crate::world::rooms::RoomStore;
use crate::world::storage::KvStore;
use crate::world::types::{Exit, ExitMap, RoomId};

impl<S: KvStore> RoomStore<S> {
    /// Point `direction` in `source` at `dest`. The destination is not touched.
    pub async fn set_connection(
        &self,
        direction: &str,
        source: &RoomId,
        dest: &RoomId,
    ) -> Result<(), WorldError> {
        self.store
            .hset(&source.exits_key(), direction, &dest.key())
            .await?;
        debug!("Exit {} --{}--> {}", source, direction, dest);
        Ok(())
    }

    /// Remove one exit. Returns whether the exit existed.
    pub async fn unset_connection(&self, direction: &str, source: &RoomId) -> Result<bool, WorldError> {
        let exits_key = source.exits_key();
        let removed = self.store.hdel(&exits_key, direction).await?;
        self.drop_exits_if_empty(&exits_key).await?;
        if removed {
            debug!("Removed exit {} from {}", direction, source);
        }
        Ok(removed)
    }

    /// Link two rooms both ways, each side with its own command.
    pub async fn connect_rooms(&self, a: &Exit, b: &Exit) -> Result<(), WorldError> {
        self.set_connection(&a.command, &a.source, &b.source).await?;
        self.set_connection(&b.command, &b.source, &a.source).await?;
        info!(
            "Connected {} ({}) <-> {} ({})",
            a.source, a.command, b.source, b.command
        );
        Ok(())
    }

    /// Remove every exit from `a` leading to `b` and from `b` leading to `a`.
    /// Returns how many exits were removed.
    pub async fn disconnect_rooms(&self, a: &RoomId, b: &RoomId) -> Result<usize, WorldError> {
        let removed = self.remove_exits_to(a, b).await? + self.remove_exits_to(b, a).await?;
        info!("Disconnected {} and {} ({} exits)", a, b, removed);
        Ok(removed)
    }

    /// The exits of a room, or `None` if it has none.
    pub async fn exits_of(&self, room: &RoomId) -> Result<Option<ExitMap>, WorldError> {
        Ok(self
            .store
            .hget_all(&room.exits_key())
            .await?
            .filter(|exits| !exits.is_empty()))
    }

    async fn remove_exits_to(&self, source: &RoomId, dest: &RoomId) -> Result<usize, WorldError> {
        let Some(exits) = self.exits_of(source).await? else {
            return Ok(0);
        };
        let dest_key = dest.key();
        let exits_key = source.exits_key();
        let mut removed = 0;
        for (direction, _) in exits.iter().filter(|(_, target)| **target == dest_key) {
            if self.store.hdel(&exits_key, direction).await? {
                removed += 1;
            }
        }
        self.drop_exits_if_empty(&exits_key).await?;
        Ok(removed)
    }

    async fn drop_exits_if_empty(&self, exits_key: &str) -> Result<(), WorldError> {
        if self.store.hlen(exits_key).await? == 0 {
            self.store.del(exits_key).await?;
        }
        Ok(())
    }
}
