//! World seeding from JSON files.
//!
//! A seed lists areas with their rooms in creation order, plus the connections
//! between rooms. Room numbers in connections refer to the numbers the rooms
//! receive when seeded into empty areas (1, 2, ...).
//!
//! ```json
//! {
//!   "areas": [
//!     { "code": "KDV", "name": "Kobold Valley", "description": "...",
//!       "rooms": [ { "name": "Western Overlook", "description": "..." } ] }
//!   ],
//!   "connections": [
//!     { "from": ["KDV", 1], "command": "west", "to": ["GCV", 1], "back": "east" }
//!   ]
//! }
//! ```

use std::collections::HashMap;
use std::fs;
use std::path::Path;

use log::{info, warn};
use serde::{Deserialize, Serialize};

use crate::world::errors::WorldError;
use crate::world::rooms::RoomStore;
use crate::world::storage::KvStore;
use crate::world::types::{AreaRecord, Exit, NewRoom, RoomId};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorldSeed {
    #[serde(default)]
    pub areas: Vec<AreaSeed>,
    #[serde(default)]
    pub connections: Vec<ConnectionSeed>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AreaSeed {
    pub code: String,
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub rooms: Vec<NewRoom>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConnectionSeed {
    pub from: (String, u64),
    pub command: String,
    pub to: (String, u64),
    /// Command for the return exit. One-way exit when absent.
    #[serde(default)]
    pub back: Option<String>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SeedReport {
    pub areas: usize,
    pub rooms: usize,
    pub exits: usize,
}

pub fn load_seed_from_json<P: AsRef<Path>>(path: P) -> Result<WorldSeed, WorldError> {
    let path = path.as_ref();
    let contents = fs::read_to_string(path)?;
    serde_json::from_str(&contents)
        .map_err(|e| WorldError::Seed(format!("Failed to parse {}: {}", path.display(), e)))
}

pub fn parse_seed(contents: &str) -> Result<WorldSeed, WorldError> {
    serde_json::from_str(contents).map_err(|e| WorldError::Seed(e.to_string()))
}

/// Write a seed into the store. Missing areas are created, rooms appended, then
/// connections written. Seed room numbers are mapped onto the numbers actually
/// assigned, so seeding into a non-empty area still links the right rooms.
pub async fn apply_seed<S: KvStore>(
    rooms: &RoomStore<S>,
    seed: &WorldSeed,
) -> Result<SeedReport, WorldError> {
    let mut report = SeedReport::default();
    let mut assigned: HashMap<(String, u64), u64> = HashMap::new();

    for area in &seed.areas {
        if rooms.areas().area_exists(&area.code).await? {
            info!("Area {} already exists, appending rooms", area.code);
        } else {
            rooms
                .areas()
                .create_area(&area.code, &AreaRecord::new(&area.name, &area.description))
                .await?;
            report.areas += 1;
        }
        for (index, room) in area.rooms.iter().enumerate() {
            let record = rooms.add_room(&area.code, room).await?;
            assigned.insert((area.code.clone(), index as u64 + 1), record.room_number);
            report.rooms += 1;
        }
    }

    let resolve = |(code, number): &(String, u64)| {
        let number = assigned
            .get(&(code.clone(), *number))
            .copied()
            .unwrap_or(*number);
        RoomId::new(code, number)
    };

    for link in &seed.connections {
        let from = resolve(&link.from);
        let to = resolve(&link.to);
        match &link.back {
            Some(back) => {
                rooms
                    .connect_rooms(&Exit::new(from, &link.command), &Exit::new(to, back))
                    .await?;
                report.exits += 2;
            }
            None => {
                rooms.set_connection(&link.command, &from, &to).await?;
                report.exits += 1;
            }
        }
    }

    if seed.areas.is_empty() && !seed.connections.is_empty() {
        warn!("Seed only contains connections; rooms are expected to exist already");
    }
    info!(
        "Seeded {} areas, {} rooms, {} exits",
        report.areas, report.rooms, report.exits
    );
    Ok(report)
}
