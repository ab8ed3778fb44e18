//! Test utilities & fixtures.
//! Throwaway sled-backed worlds plus the Kobold Valley / Goblin Cave areas used
//! across the integration tests.

#![allow(dead_code)] // each test binary uses a different subset

use redmud::world::{AreaRecord, EmptyAreaPolicy, NewRoom, SledStore, SledStoreBuilder, World};
use tempfile::TempDir;

pub fn open_world(policy: EmptyAreaPolicy) -> (World<SledStore>, TempDir) {
    let dir = TempDir::new().expect("tempdir");
    let store = SledStoreBuilder::new(dir.path())
        .without_flush()
        .open()
        .expect("store");
    (World::new(store, policy), dir)
}

pub fn kobold_valley() -> AreaRecord {
    AreaRecord::new("Kobold Valley", "A valley filled with dangerous Kobolds.")
}

pub fn goblin_cave() -> AreaRecord {
    AreaRecord::new("Goblin Cave", "A cave filled with goblins.")
}

pub fn western_overlook() -> NewRoom {
    NewRoom::new(
        "Western Overlook",
        "A short cliff overlooks a small, fertile valley. You can see scores of Kobolds milling about doing whatever it is Kobolds do.",
    )
}

pub fn cave_entrance() -> NewRoom {
    NewRoom::new("Cave Entrance", "The opening to this dank cave reeks of Goblin.")
}

pub fn narrow_corridor() -> NewRoom {
    NewRoom::new("Narrow Corridor", "The cave stretches on into the darkness. ")
}

/// A world with both areas created and empty.
pub async fn world_with_areas(policy: EmptyAreaPolicy) -> (World<SledStore>, TempDir) {
    let (world, dir) = open_world(policy);
    world
        .areas()
        .create_area("KDV", &kobold_valley())
        .await
        .expect("create KDV");
    world
        .areas()
        .create_area("GCV", &goblin_cave())
        .await
        .expect("create GCV");
    (world, dir)
}
