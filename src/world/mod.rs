//! RedMUD world persistence: areas, rooms and the exits between them, mapped
//! onto a key-value store.
//!
//! Layers, leaf first:
//!
//! - [`keys`] builds the store keys (`AREAS:KDV`, `RM:KDV:1`, `RM:KDV:1:EXITS`)
//! - [`storage`] defines the [`KvStore`] protocol and the sled implementation
//! - [`areas`] owns area records, their `size` and room-number allocation
//! - [`rooms`] owns room records and, through [`connections`], their exits
//!
//! A [`World`] wires one shared store handle into both stores.

pub mod areas;
pub mod connections;
pub mod errors;
pub mod keys;
pub mod rooms;
pub mod seed;
pub mod storage;
pub mod types;

use std::sync::Arc;

pub use areas::AreaStore;
pub use errors::WorldError;
pub use rooms::RoomStore;
pub use seed::{apply_seed, load_seed_from_json, SeedReport, WorldSeed};
pub use storage::{KvStore, SledStore, SledStoreBuilder};
pub use types::*;

/// Area and room stores sharing one injected store handle.
pub struct World<S> {
    store: Arc<S>,
    rooms: RoomStore<S>,
}

impl<S> Clone for World<S> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
            rooms: self.rooms.clone(),
        }
    }
}

impl<S: KvStore> World<S> {
    pub fn new(store: S, policy: EmptyAreaPolicy) -> Self {
        Self::with_shared(Arc::new(store), policy)
    }

    pub fn with_shared(store: Arc<S>, policy: EmptyAreaPolicy) -> Self {
        let areas = AreaStore::new(Arc::clone(&store), policy);
        let rooms = RoomStore::new(Arc::clone(&store), areas);
        Self { store, rooms }
    }

    pub fn areas(&self) -> &AreaStore<S> {
        self.rooms.areas()
    }

    pub fn rooms(&self) -> &RoomStore<S> {
        &self.rooms
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Clear every record in the underlying store.
    pub async fn flush_all(&self) -> Result<(), WorldError> {
        self.store.flush_all().await
    }
}

impl World<SledStore> {
    /// Open a sled-backed world at `path`.
    pub fn open_sled(
        path: impl Into<std::path::PathBuf>,
        policy: EmptyAreaPolicy,
    ) -> Result<Self, WorldError> {
        Ok(Self::new(SledStoreBuilder::new(path).open()?, policy))
    }
}
