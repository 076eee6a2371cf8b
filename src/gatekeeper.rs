//! Door-fit admission check.
//!
//! Cargo is assumed rotatable: the longest edge rides along the fuselage,
//! so only the two smaller edges of the worst (largest-volume) piece have
//! to clear a door opening. Doors are tried smallest first so lower-deck
//! cargo is tagged with the lower-deck entry point.

use crate::model::CargoRequest;

/// Clear opening of a cargo door, in cm.
#[derive(Clone, Copy, Debug)]
pub struct DoorSpec {
    pub max_h: f64,
    pub max_w: f64,
}

pub const LOWER_DOOR: DoorSpec = DoorSpec { max_h: 167.0, max_w: 264.0 };
pub const SIDE_DOOR: DoorSpec = DoorSpec { max_h: 305.0, max_w: 340.0 };
pub const NOSE_DOOR: DoorSpec = DoorSpec { max_h: 244.0, max_w: 269.0 };

/// Where the cargo can enter the aircraft.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DoorEntry {
    /// No dimensions given; handled as loose cargo.
    Loose,
    LowerDeck,
    MainSide,
    MainNose,
}

impl std::fmt::Display for DoorEntry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            DoorEntry::Loose => "Loose",
            DoorEntry::LowerDeck => "Lower",
            DoorEntry::MainSide => "Main-SCD",
            DoorEntry::MainNose => "Main-Nose",
        })
    }
}

fn clears(door: &DoorSpec, min_dim: f64, mid_dim: f64) -> bool {
    mid_dim <= door.max_h && min_dim <= door.max_w
}

/// Checks whether the cargo fits through any door.
///
/// Returns the entry point on success, or the human-readable rejection
/// reason. The check is pure, so re-submitting a rejected cargo yields the
/// same reason.
pub fn validate_door_entry(cargo: &CargoRequest) -> Result<DoorEntry, String> {
    let Some(piece) = cargo.largest_piece() else {
        return Ok(DoorEntry::Loose);
    };

    let (min_dim, mid_dim, _) = piece.sorted_edges();

    if clears(&LOWER_DOOR, min_dim, mid_dim) {
        return Ok(DoorEntry::LowerDeck);
    }
    if clears(&SIDE_DOOR, min_dim, mid_dim) {
        return Ok(DoorEntry::MainSide);
    }
    if clears(&NOSE_DOOR, min_dim, mid_dim) {
        return Ok(DoorEntry::MainNose);
    }

    Err(format!(
        "Dims {}x{}cm exceed all doors.",
        min_dim as i64, mid_dim as i64
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::BoxDims;

    fn cargo_with_dims(dims: Vec<BoxDims>) -> CargoRequest {
        CargoRequest {
            id: "C1".to_string(),
            destination: "LAX".to_string(),
            weight: 100.0,
            volume: 1.0,
            pieces: 1,
            dims,
            shc: Vec::new(),
            uld_type: None,
        }
    }

    #[test]
    fn no_dims_passes_as_loose() {
        let result = validate_door_entry(&cargo_with_dims(Vec::new()));
        assert_eq!(result, Ok(DoorEntry::Loose));
    }

    #[test]
    fn small_piece_enters_lower_deck() {
        let c = cargo_with_dims(vec![BoxDims { l: 120.0, w: 100.0, h: 150.0 }]);
        assert_eq!(validate_door_entry(&c), Ok(DoorEntry::LowerDeck));
    }

    #[test]
    fn tall_piece_needs_the_side_door() {
        // mid edge 250 clears the 305 cm side door but not the lower deck
        let c = cargo_with_dims(vec![BoxDims { l: 400.0, w: 250.0, h: 180.0 }]);
        assert_eq!(validate_door_entry(&c), Ok(DoorEntry::MainSide));
    }

    #[test]
    fn oversized_piece_is_rejected_with_stable_reason() {
        let c = cargo_with_dims(vec![BoxDims { l: 500.0, w: 400.0, h: 350.0 }]);
        let first = validate_door_entry(&c).unwrap_err();
        assert_eq!(first, "Dims 350x400cm exceed all doors.");
        // idempotent: same cargo, same reason
        assert_eq!(validate_door_entry(&c).unwrap_err(), first);
    }

    #[test]
    fn worst_piece_drives_the_check() {
        let c = cargo_with_dims(vec![
            BoxDims { l: 50.0, w: 50.0, h: 50.0 },
            BoxDims { l: 500.0, w: 400.0, h: 350.0 },
        ]);
        assert!(validate_door_entry(&c).is_err());
    }
}
