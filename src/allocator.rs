//! Position assignment under interlock, linear-load and deck constraints.
//!
//! ULDs are placed biggest-first: 16/20-ft pallets need the scarce
//! main-deck Center berths, lower-deck pallets need the Center berths of
//! the holds, containers and standard pallets take what remains. Within a
//! type, berths fill front to back.
//!
//! The conflict data is asymmetric on purpose, so a candidate is checked
//! BOTH ways: none of its own conflicts may be occupied, and it may not
//! appear in any occupied position's conflict list. Do not replace the
//! reverse lookup with pre-symmetrized data without auditing every pair.

use std::collections::BTreeSet;

use crate::aircraft::{AircraftMap, Deck, Position, PositionKind};
use crate::model::PackedUld;
use crate::structural;
use crate::uld::UldType;

/// Placement priority: lower sorts earlier.
fn priority(uld_type: UldType) -> u8 {
    match uld_type {
        UldType::G | UldType::R => 0,
        UldType::MLower | UldType::ALower => 1,
        UldType::K => 2,
        UldType::M | UldType::MQ7 | UldType::A => 3,
    }
}

/// Berths a ULD type may occupy.
fn candidate_kinds(uld_type: UldType) -> (Deck, &'static [PositionKind]) {
    match uld_type {
        UldType::G | UldType::R => (Deck::Main, &[PositionKind::Center]),
        UldType::M | UldType::MQ7 | UldType::A => {
            (Deck::Main, &[PositionKind::Left, PositionKind::Right])
        }
        UldType::MLower | UldType::ALower => (Deck::Lower, &[PositionKind::Center]),
        UldType::K => (Deck::Lower, &[PositionKind::Left, PositionKind::Right]),
    }
}

fn blocked(candidate: &Position, occupied: &BTreeSet<String>, map: &AircraftMap) -> bool {
    if occupied.contains(&candidate.id) {
        return true;
    }
    // forward: the candidate's own conflict list
    if candidate.conflicts.iter().any(|c| occupied.contains(c)) {
        return true;
    }
    // reverse: an occupied position that straddles into the candidate
    occupied.iter().any(|occ| {
        map.get(occ)
            .is_some_and(|pos| pos.conflicts.iter().any(|c| c == &candidate.id))
    })
}

/// Assigns every ULD a position, or leaves it unassigned when no berth
/// passes the interlock and linear-load checks. Unassigned ULDs are a
/// reported outcome, not an error.
pub fn allocate(ulds: &mut [PackedUld], map: &AircraftMap) {
    // respect positions fixed by an earlier pass
    let mut occupied: BTreeSet<String> = ulds
        .iter()
        .filter_map(|u| u.assigned_position.clone())
        .collect();

    let mut order: Vec<usize> = (0..ulds.len()).collect();
    order.sort_by(|&a, &b| {
        priority(ulds[a].uld_type)
            .cmp(&priority(ulds[b].uld_type))
            .then_with(|| ulds[a].id.cmp(&ulds[b].id))
    });

    for idx in order {
        let uld = &ulds[idx];
        if uld.assigned_position.is_some() {
            continue;
        }

        let (deck, kinds) = candidate_kinds(uld.uld_type);
        let mut candidates = map.candidates(deck, kinds);
        candidates.sort_by(|a, b| {
            a.arm
                .partial_cmp(&b.arm)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then_with(|| a.id.cmp(&b.id))
        });

        let chosen = candidates.into_iter().find(|pos| {
            !blocked(pos, &occupied, map) && structural::check_linear_load(uld, pos.arm).is_ok()
        });

        let uld = &mut ulds[idx];
        match chosen {
            Some(pos) => {
                uld.assigned_position = Some(pos.id.clone());
                uld.assigned_arm = pos.arm;
                occupied.insert(pos.id.clone());
            }
            None => uld.assigned_position = None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{AdmittedCargo, CargoRequest};

    fn uld(id: &str, uld_type: UldType, weight: f64) -> PackedUld {
        let mut u = PackedUld::new(id, uld_type, "LAX");
        u.push(AdmittedCargo::unassessed(CargoRequest {
            id: format!("{}-c", id),
            destination: "LAX".to_string(),
            weight,
            volume: 1.0,
            pieces: 1,
            dims: Vec::new(),
            shc: Vec::new(),
            uld_type: None,
        }));
        u
    }

    fn snapshot_without(disabled: &[&str]) -> AircraftMap {
        let set = disabled.iter().map(|s| s.to_string()).collect();
        AircraftMap::base().snapshot(&set).unwrap()
    }

    #[test]
    fn pallets_fill_front_to_back_by_type() {
        let map = snapshot_without(&[]);
        let mut ulds = vec![
            uld("OPT-001", UldType::M, 1000.0),
            uld("OPT-002", UldType::M, 1000.0),
        ];
        allocate(&mut ulds, &map);
        // first available main-deck L/R berth by arm is row C (588 in)
        assert_eq!(ulds[0].assigned_position.as_deref(), Some("CL"));
        assert_eq!(ulds[1].assigned_position.as_deref(), Some("CR"));
    }

    #[test]
    fn center_pallet_blocks_own_and_next_row() {
        // force the first G onto EC by disabling everything forward of it
        let map = snapshot_without(&["A1", "A2", "B", "CC", "DC", "CL", "CR", "DL", "DR"]);
        let mut ulds = vec![uld("FRC-G-1", UldType::G, 4000.0), uld("FRC-G-2", UldType::G, 4000.0)];
        allocate(&mut ulds, &map);

        assert_eq!(ulds[0].assigned_position.as_deref(), Some("EC"));
        // FC conflicts with EC only via EC's own list; the reverse check
        // must catch it and land the second pallet one row further back.
        assert_eq!(ulds[1].assigned_position.as_deref(), Some("GC"));

        // EC blocks EL/ER/FL/FR, GC blocks GL/GR/HL/HR; the next free L/R
        // berth for an M pallet is row J.
        let mut all: Vec<PackedUld> = ulds.clone();
        all.push(uld("OPT-001", UldType::M, 1000.0));
        allocate(&mut all, &map);
        assert_eq!(all[2].assigned_position.as_deref(), Some("JL"));
    }

    #[test]
    fn occupied_satellite_blocks_the_center() {
        // Park an M pallet on EL first, then let a G look for a Center
        // berth: EC's own conflict list names EL, so EC must be skipped.
        let map = snapshot_without(&["A1", "A2", "B", "CC", "DC", "CL", "CR", "DL", "DR"]);
        let mut ulds = vec![uld("OPT-001", UldType::M, 1000.0)];
        allocate(&mut ulds, &map);
        assert_eq!(ulds[0].assigned_position.as_deref(), Some("EL"));

        ulds.push(uld("FRC-G-1", UldType::G, 4000.0));
        allocate(&mut ulds, &map);
        // EC blocked by the occupied EL; FC is the next Center berth and
        // nothing occupied straddles into it.
        assert_eq!(ulds[1].assigned_position.as_deref(), Some("FC"));
    }

    #[test]
    fn lower_deck_types_use_their_own_berths() {
        let map = snapshot_without(&[]);
        let mut ulds = vec![
            uld("OPT-001", UldType::MLower, 1000.0),
            uld("OPT-002", UldType::K, 500.0),
        ];
        allocate(&mut ulds, &map);
        // forward-most lower Center is 11P (513.2 in)
        assert_eq!(ulds[0].assigned_position.as_deref(), Some("11P"));
        // 11L/11R conflict with the occupied 11P; first free L/R is 12L
        assert_eq!(ulds[1].assigned_position.as_deref(), Some("12L"));
    }

    #[test]
    fn unplaceable_uld_stays_unassigned() {
        // a K container with every lower L/R berth disabled
        let disabled: Vec<&str> = vec![
            "11L", "11R", "12L", "12R", "13L", "13R", "21L", "21R", "22L", "22R", "23L", "23R",
            "24L", "24R", "25L", "25R", "31L", "31R", "32L", "32R", "33L", "33R", "41L", "41R",
            "42L", "42R", "43L", "43R", "44L", "44R", "45L", "45R",
        ];
        let map = snapshot_without(&disabled);
        let mut ulds = vec![uld("OPT-001", UldType::K, 500.0)];
        allocate(&mut ulds, &map);
        assert!(ulds[0].assigned_position.is_none());
    }

    #[test]
    fn linear_load_pushes_heavy_pallets_aft_of_the_nose() {
        // 10 t gross on a 20-ft pallet is 41.9 kg/in, above the 38.5 kg/in
        // nose band covering A1/A2/B; the first legal Center berth is CC in
        // the 77.1 band.
        let mut ulds = vec![uld("FRC-G-1", UldType::G, 9500.0)];
        allocate(&mut ulds, &snapshot_without(&[]));
        assert_eq!(ulds[0].assigned_position.as_deref(), Some("CC"));
    }
}
