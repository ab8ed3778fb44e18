//! Store key ("code") builders.
//!
//! Every record lives under a deterministic key assembled from colon-joined
//! segments. Keys are always rebuilt from identifiers, never read back out of
//! stored data.

use crate::world::errors::WorldError;

/// Kind tag for area records.
pub const AREAS_KEY: &str = "AREAS";
/// Kind tag for room records.
pub const ROOMS_KEY: &str = "RM";
/// Sub-key tag for a room's exits record.
pub const ROOMS_EXIT_KEY: &str = "EXITS";
/// Sub-key tag for an area's room-number counter.
pub const ROOM_COUNTER_KEY: &str = "ROOMNUM";

const DELIMITER: &str = ":";

/// Join segments with the key delimiter.
pub fn build_code<S: AsRef<str>>(segments: &[S]) -> String {
    segments
        .iter()
        .map(AsRef::as_ref)
        .collect::<Vec<_>>()
        .join(DELIMITER)
}

fn area_prefix() -> String {
    format!("{}{}", AREAS_KEY, DELIMITER)
}

/// Build a full area key. A code that is already a full area key is returned as is.
pub fn build_area_code(area_code: &str) -> String {
    if area_code.starts_with(&area_prefix()) {
        area_code.to_string()
    } else {
        build_code(&[AREAS_KEY, area_code])
    }
}

/// Strip the area kind prefix, if present.
pub fn extract_area_code(area_code: &str) -> &str {
    area_code
        .strip_prefix(&area_prefix())
        .unwrap_or(area_code)
}

pub fn build_room_code(area_code: &str, room_number: u64) -> String {
    build_code(&[ROOMS_KEY, area_code, room_number.to_string().as_str()])
}

pub fn build_room_exits_code(area_code: &str, room_number: u64) -> String {
    build_code(&[
        ROOMS_KEY,
        area_code,
        room_number.to_string().as_str(),
        ROOMS_EXIT_KEY,
    ])
}

/// Append the exits tag to an already-built room key. The input is not re-validated.
pub fn convert_room_to_exits_code(room_code: &str) -> String {
    build_code(&[room_code, ROOMS_EXIT_KEY])
}

/// Key of the monotonically increasing room-number counter for an area.
pub fn build_room_counter_code(area_code: &str) -> String {
    build_code(&[build_area_code(area_code).as_str(), ROOM_COUNTER_KEY])
}

/// Parse a textual room number (CLI input, stored fields).
///
/// Room numbers are positive integers; anything else is rejected before the
/// store is touched.
pub fn parse_room_number(raw: &str) -> Result<u64, WorldError> {
    match raw.trim().parse::<u64>() {
        Ok(n) if n > 0 => Ok(n),
        _ => Err(WorldError::InvalidRoomNumber(raw.to_string())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn area_code_is_idempotent() {
        let once = build_area_code("KDV");
        assert_eq!(once, "AREAS:KDV");
        assert_eq!(build_area_code(&once), once);
    }

    #[test]
    fn extract_reverses_build() {
        for code in ["KDV", "GCV", "A", ""] {
            assert_eq!(extract_area_code(&build_area_code(code)), code);
        }
        assert_eq!(extract_area_code("GCV"), "GCV");
    }

    #[test]
    fn room_codes_keep_segment_order() {
        assert_eq!(build_room_code("GCV", 2), "RM:GCV:2");
        assert_eq!(build_room_exits_code("GCV", 2), "RM:GCV:2:EXITS");
        assert_eq!(
            convert_room_to_exits_code(&build_room_code("KDV", 1)),
            build_room_exits_code("KDV", 1)
        );
    }

    #[test]
    fn counter_code_accepts_bare_or_full_area() {
        assert_eq!(build_room_counter_code("KDV"), "AREAS:KDV:ROOMNUM");
        assert_eq!(build_room_counter_code("AREAS:KDV"), "AREAS:KDV:ROOMNUM");
    }

    #[test]
    fn room_number_parsing_rejects_non_integers() {
        assert_eq!(parse_room_number("7").unwrap(), 7);
        assert_eq!(parse_room_number(" 12 ").unwrap(), 12);
        for bad in ["", "0", "-1", "1.5", "west"] {
            assert!(
                matches!(parse_room_number(bad), Err(WorldError::InvalidRoomNumber(_))),
                "{bad:?} should be rejected"
            );
        }
    }
}
