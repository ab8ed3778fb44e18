use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::world::errors::WorldError;
use crate::world::keys::{
    build_room_code, build_room_exits_code, extract_area_code, parse_room_number,
};

/// Flat field map as held by the store for a single record.
pub type FieldMap = BTreeMap<String, String>;

/// Exit direction/command -> destination room key.
pub type ExitMap = BTreeMap<String, String>;

pub const FIELD_NAME: &str = "name";
pub const FIELD_DESCRIPTION: &str = "description";
pub const FIELD_SIZE: &str = "size";
pub const FIELD_AREA_CODE: &str = "areacode";
pub const FIELD_ROOM_NUMBER: &str = "roomnumber";

/// What to do with an area whose last room has been deleted.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EmptyAreaPolicy {
    /// Delete the area record once its size drops to zero.
    #[default]
    Purge,
    /// Keep the area around with a size of zero.
    Retain,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AreaRecord {
    pub name: String,
    pub description: String,
    #[serde(default)]
    pub size: u64,
}

impl AreaRecord {
    pub fn new(name: &str, description: &str) -> Self {
        Self {
            name: name.to_string(),
            description: description.to_string(),
            size: 0,
        }
    }

    pub(crate) fn to_fields(&self) -> FieldMap {
        let mut fields = FieldMap::new();
        fields.insert(FIELD_NAME.to_string(), self.name.clone());
        fields.insert(FIELD_DESCRIPTION.to_string(), self.description.clone());
        fields.insert(FIELD_SIZE.to_string(), self.size.to_string());
        fields
    }

    /// Rebuild a record from stored fields, coercing `size` to an integer.
    ///
    /// Missing text fields read as empty: the size counter is adjusted with
    /// atomic field increments and can outlive a concurrently purged record.
    pub(crate) fn from_fields(key: &str, mut fields: FieldMap) -> Result<Self, WorldError> {
        let size = match fields.remove(FIELD_SIZE) {
            None => 0,
            Some(raw) => match raw.parse::<i64>() {
                Ok(n) => n.max(0) as u64,
                Err(_) => {
                    return Err(WorldError::InvalidField {
                        key: key.to_string(),
                        field: FIELD_SIZE,
                        value: raw,
                    })
                }
            },
        };
        Ok(Self {
            name: fields.remove(FIELD_NAME).unwrap_or_default(),
            description: fields.remove(FIELD_DESCRIPTION).unwrap_or_default(),
            size,
        })
    }
}

/// Partial area update; `None` fields are left untouched. There is no way to set
/// `size` through an update.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AreaUpdate {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
}

impl AreaUpdate {
    pub(crate) fn to_fields(&self) -> FieldMap {
        let mut fields = FieldMap::new();
        if let Some(name) = &self.name {
            fields.insert(FIELD_NAME.to_string(), name.clone());
        }
        if let Some(description) = &self.description {
            fields.insert(FIELD_DESCRIPTION.to_string(), description.clone());
        }
        fields
    }
}

/// Fully-addressed room: area code plus room number.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct RoomId {
    #[serde(rename = "areacode")]
    pub area_code: String,
    #[serde(rename = "roomnumber")]
    pub room_number: u64,
}

impl RoomId {
    pub fn new(area_code: &str, room_number: u64) -> Self {
        Self {
            area_code: area_code.to_string(),
            room_number,
        }
    }

    /// Store key of the room record.
    pub fn key(&self) -> String {
        build_room_code(&self.area_code, self.room_number)
    }

    /// Store key of the room's exits record.
    pub fn exits_key(&self) -> String {
        build_room_exits_code(&self.area_code, self.room_number)
    }
}

/// Parses `AREA:NUMBER`, where `AREA` may be a bare code or a full area key
/// (`AREAS:KDV:1` is room 1 of `KDV`).
impl FromStr for RoomId {
    type Err = WorldError;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        let (area, number) = raw
            .rsplit_once(':')
            .ok_or_else(|| WorldError::InvalidRoomRef(raw.to_string()))?;
        let area = extract_area_code(area.trim());
        if area.is_empty() {
            return Err(WorldError::InvalidRoomRef(raw.to_string()));
        }
        Ok(Self::new(area, parse_room_number(number)?))
    }
}

impl fmt::Display for RoomId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}#{}", self.area_code, self.room_number)
    }
}

/// Caller-supplied data for a room that does not exist yet.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewRoom {
    pub name: String,
    pub description: String,
}

impl NewRoom {
    pub fn new(name: &str, description: &str) -> Self {
        Self {
            name: name.to_string(),
            description: description.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoomRecord {
    #[serde(rename = "areacode")]
    pub area_code: String,
    #[serde(rename = "roomnumber")]
    pub room_number: u64,
    pub name: String,
    pub description: String,
    /// Never `Some` of an empty map.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exits: Option<ExitMap>,
}

impl RoomRecord {
    /// Stamp identity onto a copy of the caller's data.
    pub fn stamped(area_code: &str, room_number: u64, data: &NewRoom) -> Self {
        Self {
            area_code: area_code.to_string(),
            room_number,
            name: data.name.clone(),
            description: data.description.clone(),
            exits: None,
        }
    }

    pub fn id(&self) -> RoomId {
        RoomId::new(&self.area_code, self.room_number)
    }

    /// Destination key for an exit command, if the room has one.
    pub fn exit(&self, command: &str) -> Option<&str> {
        self.exits
            .as_ref()
            .and_then(|exits| exits.get(command))
            .map(String::as_str)
    }

    pub(crate) fn to_fields(&self) -> FieldMap {
        let mut fields = FieldMap::new();
        fields.insert(FIELD_AREA_CODE.to_string(), self.area_code.clone());
        fields.insert(FIELD_ROOM_NUMBER.to_string(), self.room_number.to_string());
        fields.insert(FIELD_NAME.to_string(), self.name.clone());
        fields.insert(FIELD_DESCRIPTION.to_string(), self.description.clone());
        fields
    }

    pub(crate) fn from_fields(
        key: &str,
        id: &RoomId,
        mut fields: FieldMap,
        exits: Option<ExitMap>,
    ) -> Result<Self, WorldError> {
        let room_number = match fields.remove(FIELD_ROOM_NUMBER) {
            None => id.room_number,
            Some(raw) => raw.parse::<u64>().map_err(|_| WorldError::InvalidField {
                key: key.to_string(),
                field: FIELD_ROOM_NUMBER,
                value: raw,
            })?,
        };
        Ok(Self {
            area_code: fields
                .remove(FIELD_AREA_CODE)
                .unwrap_or_else(|| id.area_code.clone()),
            room_number,
            name: fields.remove(FIELD_NAME).unwrap_or_default(),
            description: fields.remove(FIELD_DESCRIPTION).unwrap_or_default(),
            exits: exits.filter(|map| !map.is_empty()),
        })
    }
}

/// Partial room update; identity fields and exits are not reachable through it.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoomUpdate {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
}

impl RoomUpdate {
    pub(crate) fn to_fields(&self) -> FieldMap {
        let mut fields = FieldMap::new();
        if let Some(name) = &self.name {
            fields.insert(FIELD_NAME.to_string(), name.clone());
        }
        if let Some(description) = &self.description {
            fields.insert(FIELD_DESCRIPTION.to_string(), description.clone());
        }
        fields
    }
}

/// One side of a connection: the room the exit leaves from and its command.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Exit {
    pub source: RoomId,
    pub command: String,
}

impl Exit {
    pub fn new(source: RoomId, command: &str) -> Self {
        Self {
            source,
            command: command.to_string(),
        }
    }
}

/// Result of adjusting an area's size.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SizeChange {
    pub size: i64,
    pub area_deleted: bool,
}

/// Outcome of deleting a room.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RoomDeletion {
    /// No room record existed; nothing was changed.
    NotFound,
    /// Room removed, its area survives.
    Deleted { area_size: i64 },
    /// Room removed and its area was purged because it became empty.
    DeletedWithArea,
    /// Room removed, but its area record was already gone (e.g. `delete_area`).
    DeletedWithoutArea,
}
