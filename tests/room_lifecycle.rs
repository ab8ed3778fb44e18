//! Integration tests for room creation, reads, updates and deletion, including
//! the area size bookkeeping that rides along with them.
mod common;

use std::sync::Arc;

use common::{cave_entrance, narrow_corridor, western_overlook, world_with_areas};
use redmud::world::keys::build_room_code;
use redmud::world::{
    EmptyAreaPolicy, KvStore, NewRoom, RoomDeletion, RoomUpdate, SledStore, World, WorldError,
};

#[tokio::test]
async fn first_room_in_kobold_valley() {
    let (world, _dir) = world_with_areas(EmptyAreaPolicy::Purge).await;
    assert_eq!(world.areas().get_area("KDV").await.unwrap().unwrap().size, 0);

    let room = world.rooms().add_room("KDV", &western_overlook()).await.unwrap();
    assert_eq!(room.room_number, 1);
    assert_eq!(room.area_code, "KDV");
    assert_eq!(room.name, "Western Overlook");
    assert!(room.exits.is_none());

    assert_eq!(world.areas().get_area("KDV").await.unwrap().unwrap().size, 1);

    let stored = world.store().hget_all(&build_room_code("KDV", 1)).await.unwrap().unwrap();
    assert_eq!(stored.get("areacode").map(String::as_str), Some("KDV"));
    assert_eq!(stored.get("roomnumber").map(String::as_str), Some("1"));
}

#[tokio::test]
async fn area_key_is_accepted_and_stamped_as_bare_code() {
    let (world, _dir) = world_with_areas(EmptyAreaPolicy::Purge).await;
    let room = world.rooms().add_room("AREAS:GCV", &cave_entrance()).await.unwrap();
    assert_eq!(room.area_code, "GCV");
    assert_eq!(room.room_number, 1);

    let fetched = world.rooms().get_room("GCV", 1).await.unwrap().unwrap();
    assert_eq!(fetched, room);
}

#[tokio::test]
async fn add_room_leaves_caller_data_untouched() {
    let (world, _dir) = world_with_areas(EmptyAreaPolicy::Purge).await;
    let entrance = cave_entrance();
    let tunnel = narrow_corridor();
    let (first, second) = tokio::join!(
        world.rooms().add_room("GCV", &entrance),
        world.rooms().add_room("GCV", &tunnel),
    );
    first.unwrap();
    second.unwrap();
    assert_eq!(entrance, cave_entrance());
    assert_eq!(tunnel, narrow_corridor());
}

#[tokio::test]
async fn sequential_room_numbers_increase() {
    let (world, _dir) = world_with_areas(EmptyAreaPolicy::Purge).await;
    let mut numbers = Vec::new();
    for i in 0..5 {
        let room = world
            .rooms()
            .add_room("GCV", &NewRoom::new(&format!("Tunnel {i}"), "Dark."))
            .await
            .unwrap();
        numbers.push(room.room_number);
    }
    assert_eq!(numbers, vec![1, 2, 3, 4, 5]);
    assert_eq!(world.areas().get_area("GCV").await.unwrap().unwrap().size, 5);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_adds_get_distinct_numbers() {
    let (world, _dir) = world_with_areas(EmptyAreaPolicy::Purge).await;
    let world: Arc<World<SledStore>> = Arc::new(world);

    let mut handles = Vec::new();
    for i in 0..16 {
        let world = Arc::clone(&world);
        handles.push(tokio::spawn(async move {
            let room = NewRoom::new(&format!("Warren {i}"), "Kobold burrows.");
            world.rooms().add_room("KDV", &room).await
        }));
    }

    let mut numbers = Vec::new();
    for handle in handles {
        numbers.push(handle.await.expect("join").expect("add room").room_number);
    }
    numbers.sort_unstable();
    assert_eq!(numbers, (1..=16).collect::<Vec<u64>>());
    assert_eq!(world.areas().get_area("KDV").await.unwrap().unwrap().size, 16);
}

#[tokio::test]
async fn adding_to_missing_area_fails_without_side_effects() {
    let (world, _dir) = world_with_areas(EmptyAreaPolicy::Purge).await;
    let err = world.rooms().add_room("NOPE", &cave_entrance()).await.unwrap_err();
    assert!(matches!(err, WorldError::AreaNotFound(code) if code == "NOPE"));
    assert!(world.areas().get_area("NOPE").await.unwrap().is_none());
    assert!(world.rooms().get_room("NOPE", 1).await.unwrap().is_none());
}

#[tokio::test]
async fn missing_room_reads_as_none() {
    let (world, _dir) = world_with_areas(EmptyAreaPolicy::Purge).await;
    assert!(world.rooms().get_room("KDV", 9).await.unwrap().is_none());
}

#[tokio::test]
async fn set_room_merges_fields() {
    let (world, _dir) = world_with_areas(EmptyAreaPolicy::Purge).await;
    world.rooms().add_room("KDV", &western_overlook()).await.unwrap();

    let update = RoomUpdate {
        name: Some("Western Overlook".into()),
        description: Some("A hole in the western rockface opens into a dark cave.".into()),
    };
    let before = update.clone();
    world.rooms().set_room("KDV", 1, &update).await.unwrap();
    assert_eq!(update, before);

    let room = world.rooms().get_room("KDV", 1).await.unwrap().unwrap();
    assert_eq!(room.area_code, "KDV");
    assert_eq!(room.room_number, 1);
    assert_eq!(room.name, "Western Overlook");
    assert_eq!(
        room.description,
        "A hole in the western rockface opens into a dark cave."
    );
}

#[tokio::test]
async fn set_room_does_not_touch_exits() {
    let (world, _dir) = world_with_areas(EmptyAreaPolicy::Purge).await;
    let overlook = world.rooms().add_room("KDV", &western_overlook()).await.unwrap();
    let entrance = world.rooms().add_room("GCV", &cave_entrance()).await.unwrap();
    world
        .rooms()
        .set_connection("west", &overlook.id(), &entrance.id())
        .await
        .unwrap();

    world
        .rooms()
        .set_room(
            "KDV",
            1,
            &RoomUpdate {
                name: Some("Overlook".into()),
                ..Default::default()
            },
        )
        .await
        .unwrap();

    let room = world.rooms().get_room("KDV", 1).await.unwrap().unwrap();
    assert_eq!(room.name, "Overlook");
    assert_eq!(room.exit("west"), Some("RM:GCV:1"));
}

#[tokio::test]
async fn deleting_rooms_shrinks_then_purges_area() {
    let (world, _dir) = world_with_areas(EmptyAreaPolicy::Purge).await;
    world.rooms().add_room("GCV", &cave_entrance()).await.unwrap();
    world.rooms().add_room("GCV", &narrow_corridor()).await.unwrap();
    assert_eq!(world.areas().get_area("GCV").await.unwrap().unwrap().size, 2);

    let first = world.rooms().delete_room("GCV", 1).await.unwrap();
    assert_eq!(first, RoomDeletion::Deleted { area_size: 1 });
    assert_eq!(world.areas().get_area("GCV").await.unwrap().unwrap().size, 1);
    assert!(world.rooms().get_room("GCV", 1).await.unwrap().is_none());

    let last = world.rooms().delete_room("GCV", 2).await.unwrap();
    assert_eq!(last, RoomDeletion::DeletedWithArea);
    assert!(world.areas().get_area("GCV").await.unwrap().is_none());

    // Kobold Valley never had rooms and is unaffected.
    assert!(world.areas().get_area("KDV").await.unwrap().is_some());
}

#[tokio::test]
async fn retain_policy_keeps_emptied_area() {
    let (world, _dir) = world_with_areas(EmptyAreaPolicy::Retain).await;
    world.rooms().add_room("GCV", &cave_entrance()).await.unwrap();
    let outcome = world.rooms().delete_room("GCV", 1).await.unwrap();
    assert_eq!(outcome, RoomDeletion::Deleted { area_size: 0 });
    let area = world.areas().get_area("GCV").await.unwrap().unwrap();
    assert_eq!(area.size, 0);
    assert_eq!(area.name, "Goblin Cave");

    // Numbers are never reused.
    let next = world.rooms().add_room("GCV", &narrow_corridor()).await.unwrap();
    assert_eq!(next.room_number, 2);
}

#[tokio::test]
async fn deleting_missing_room_changes_nothing() {
    let (world, _dir) = world_with_areas(EmptyAreaPolicy::Purge).await;
    world.rooms().add_room("GCV", &cave_entrance()).await.unwrap();
    let outcome = world.rooms().delete_room("GCV", 7).await.unwrap();
    assert_eq!(outcome, RoomDeletion::NotFound);
    assert_eq!(world.areas().get_area("GCV").await.unwrap().unwrap().size, 1);
}

#[tokio::test]
async fn set_room_on_missing_room_writes_nothing() {
    let (world, _dir) = world_with_areas(EmptyAreaPolicy::Purge).await;
    world.rooms().add_room("GCV", &cave_entrance()).await.unwrap();

    let update = RoomUpdate {
        name: Some("Ghost".into()),
        ..Default::default()
    };
    assert!(!world.rooms().set_room("GCV", 5, &update).await.unwrap());
    assert!(world.rooms().get_room("GCV", 5).await.unwrap().is_none());

    // No phantom record to delete, so the area size is not pulled down.
    let outcome = world.rooms().delete_room("GCV", 5).await.unwrap();
    assert_eq!(outcome, RoomDeletion::NotFound);
    assert_eq!(world.areas().get_area("GCV").await.unwrap().unwrap().size, 1);

    assert!(world.rooms().set_room("GCV", 1, &update).await.unwrap());
    let room = world.rooms().get_room("GCV", 1).await.unwrap().unwrap();
    assert_eq!(room.name, "Ghost");
}

#[tokio::test]
async fn deleting_room_of_deleted_area_reports_missing_area() {
    let (world, _dir) = world_with_areas(EmptyAreaPolicy::Purge).await;
    world.rooms().add_room("GCV", &cave_entrance()).await.unwrap();
    assert!(world.areas().delete_area("GCV").await.unwrap());

    let outcome = world.rooms().delete_room("GCV", 1).await.unwrap();
    assert_eq!(outcome, RoomDeletion::DeletedWithoutArea);
    assert!(world.rooms().get_room("GCV", 1).await.unwrap().is_none());
    assert!(!world.areas().area_exists("GCV").await.unwrap());
}

#[tokio::test]
async fn delete_room_removes_its_exits() {
    let (world, _dir) = world_with_areas(EmptyAreaPolicy::Retain).await;
    let entrance = world.rooms().add_room("GCV", &cave_entrance()).await.unwrap();
    let tunnel = world.rooms().add_room("GCV", &narrow_corridor()).await.unwrap();
    world
        .rooms()
        .set_connection("east", &entrance.id(), &tunnel.id())
        .await
        .unwrap();

    world.rooms().delete_room("GCV", 1).await.unwrap();
    assert!(world
        .store()
        .hget_all(&entrance.id().exits_key())
        .await
        .unwrap()
        .is_none());
}
