//! B747-400F position map: decks, centroid arms, interlocks and the
//! structural limit tables.
//!
//! The map exists in two forms. `AircraftMap::base()` builds the immutable
//! factory configuration; `snapshot` derives a per-flight copy with
//! inoperative positions removed. Planning never touches shared state, so
//! restrictions applied to one flight cannot leak into another.
//!
//! Conflict lists in the static data are intentionally asymmetric (a
//! lower-deck L/R position lists only its Center twin, while the Center
//! lists every berth its pallet straddles). The allocator checks both
//! directions; do not pre-symmetrize the data here.

use std::collections::{BTreeMap, BTreeSet};

use crate::model::PlanningError;

/// Deck a position belongs to.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Deck {
    Main,
    Lower,
}

/// Lateral kind of a position.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PositionKind {
    Left,
    Right,
    Center,
}

/// One loadable floor position.
#[derive(Clone, Debug)]
pub struct Position {
    pub id: String,
    pub deck: Deck,
    pub kind: PositionKind,
    /// Centroid arm in inches from the reference datum.
    pub arm: f64,
    /// Positions physically blocked while this one is occupied.
    pub conflicts: Vec<String>,
}

/// A cumulative weight band along the fuselage.
#[derive(Clone, Copy, Debug)]
pub struct ZoneLimit {
    pub name: &'static str,
    pub start: f64,
    pub end: f64,
    pub limit: f64,
}

/// Main-deck row zones and their centroid arms. Rows A/B and T are fixed
/// Center-only positions and listed separately.
const ROW_ZONES: &[(&str, f64)] = &[
    ("C", 588.0),
    ("D", 714.0),
    ("E", 840.0),
    ("F", 966.0),
    ("G", 1092.0),
    ("H", 1218.0),
    ("J", 1344.0),
    ("K", 1470.0),
    ("L", 1596.0),
    ("M", 1722.0),
    ("P", 1848.0),
    ("Q", 1939.0),
    ("R", 2029.0),
    ("S", 2155.0),
];

const FIXED_MAIN_CENTERS: &[(&str, f64)] = &[
    ("A1", 320.0),
    ("A2", 379.0),
    ("B", 453.0),
    ("T", 2296.0),
];

const LOWER_POSITIONS: &[(&str, PositionKind, f64, &[&str])] = &[
    ("11P", PositionKind::Center, 513.2, &["11L", "11R"]),
    ("11L", PositionKind::Left, 510.4, &["11P"]),
    ("11R", PositionKind::Right, 510.4, &["11P"]),
    ("12P", PositionKind::Center, 610.2, &["12L", "12R", "13L", "13R"]),
    ("12L", PositionKind::Left, 571.6, &["12P"]),
    ("12R", PositionKind::Right, 571.6, &["12P"]),
    ("13L", PositionKind::Left, 632.9, &["12P"]),
    ("13R", PositionKind::Right, 632.9, &["12P"]),
    ("21P", PositionKind::Center, 744.7, &["21L", "21R", "22L", "22R"]),
    ("21L", PositionKind::Left, 713.9, &["21P"]),
    ("21R", PositionKind::Right, 713.9, &["21P"]),
    ("22L", PositionKind::Left, 774.4, &["21P"]),
    ("22R", PositionKind::Right, 774.4, &["21P"]),
    ("22P", PositionKind::Center, 841.7, &["23L", "23R"]),
    ("23L", PositionKind::Left, 834.9, &["22P"]),
    ("23R", PositionKind::Right, 834.9, &["22P"]),
    ("23P", PositionKind::Center, 938.7, &["24L", "24R", "25L", "25R"]),
    ("24L", PositionKind::Left, 895.4, &["23P"]),
    ("24R", PositionKind::Right, 895.4, &["23P"]),
    ("25L", PositionKind::Left, 956.4, &["23P"]),
    ("25R", PositionKind::Right, 956.4, &["23P"]),
    ("31P", PositionKind::Center, 1534.6, &["31L", "31R", "32L", "32R"]),
    ("31L", PositionKind::Left, 1517.0, &["31P"]),
    ("31R", PositionKind::Right, 1517.0, &["31P"]),
    ("32L", PositionKind::Left, 1577.4, &["31P"]),
    ("32R", PositionKind::Right, 1577.4, &["31P"]),
    ("32P", PositionKind::Center, 1631.6, &["33L", "33R"]),
    ("33L", PositionKind::Left, 1637.9, &["32P"]),
    ("33R", PositionKind::Right, 1637.9, &["32P"]),
    ("41P", PositionKind::Center, 1728.6, &["41L", "41R", "42L", "42R"]),
    ("41L", PositionKind::Left, 1698.4, &["41P"]),
    ("41R", PositionKind::Right, 1698.4, &["41P"]),
    ("42L", PositionKind::Left, 1758.9, &["41P"]),
    ("42R", PositionKind::Right, 1758.9, &["41P"]),
    ("42P", PositionKind::Center, 1825.6, &["43L", "43R"]),
    ("43L", PositionKind::Left, 1820.6, &["42P"]),
    ("43R", PositionKind::Right, 1820.6, &["42P"]),
    ("44L", PositionKind::Left, 1882.4, &[]),
    ("44R", PositionKind::Right, 1882.4, &[]),
    ("45L", PositionKind::Left, 1944.2, &[]),
    ("45R", PositionKind::Right, 1944.2, &[]),
];

/// Linear load limit bands: (start arm, end arm, kg per inch).
const LINEAR_LIMITS: &[(f64, f64, f64)] = &[
    (0.0, 525.0, 38.5),
    (525.0, 1000.0, 77.1),
    (1000.0, 1480.0, 131.5),
    (1480.0, 1920.0, 77.1),
    (1920.0, 2500.0, 16.3),
];

/// Cumulative zone limits (pivot weights, Figure 33.1.18).
const ZONE_LIMITS: &[ZoneLimit] = &[
    ZoneLimit { name: "FWD_LOWER", start: 360.0, end: 1000.0, limit: 27_669.0 },
    ZoneLimit { name: "WINGBOX", start: 1000.0, end: 1480.0, limit: 45_000.0 },
    ZoneLimit { name: "AFT_LOWER", start: 1480.0, end: 1900.0, limit: 26_081.0 },
    ZoneLimit { name: "BULK", start: 1900.0, end: 2160.0, limit: 4_408.0 },
];

/// Linear load limit at an arm. The final band extends to infinity.
pub fn linear_limit(arm: f64) -> f64 {
    for &(start, end, limit) in LINEAR_LIMITS {
        if start <= arm && arm < end {
            return limit;
        }
    }
    LINEAR_LIMITS[LINEAR_LIMITS.len() - 1].2
}

/// The zone limit table.
pub fn zone_limits() -> &'static [ZoneLimit] {
    ZONE_LIMITS
}

/// Catalogue of loadable positions, keyed by position id.
#[derive(Clone, Debug)]
pub struct AircraftMap {
    positions: BTreeMap<String, Position>,
}

impl AircraftMap {
    /// Builds the factory position map.
    pub fn base() -> Self {
        let mut positions = BTreeMap::new();

        for &(id, arm) in FIXED_MAIN_CENTERS {
            positions.insert(
                id.to_string(),
                Position {
                    id: id.to_string(),
                    deck: Deck::Main,
                    kind: PositionKind::Center,
                    arm,
                    conflicts: Vec::new(),
                },
            );
        }

        for (i, &(zone, arm)) in ROW_ZONES.iter().enumerate() {
            let center_id = format!("{}C", zone);
            for (suffix, kind) in [("L", PositionKind::Left), ("R", PositionKind::Right)] {
                let id = format!("{}{}", zone, suffix);
                positions.insert(
                    id.clone(),
                    Position {
                        id,
                        deck: Deck::Main,
                        kind,
                        arm,
                        conflicts: vec![center_id.clone()],
                    },
                );
            }

            // A 20-ft pallet on a row Center straddles into the next row.
            let mut conflicts = vec![format!("{}L", zone), format!("{}R", zone)];
            if let Some(&(next, _)) = ROW_ZONES.get(i + 1) {
                conflicts.push(format!("{}L", next));
                conflicts.push(format!("{}R", next));
                conflicts.push(format!("{}C", next));
            }
            positions.insert(
                center_id.clone(),
                Position {
                    id: center_id,
                    deck: Deck::Main,
                    kind: PositionKind::Center,
                    arm,
                    conflicts,
                },
            );
        }

        for &(id, kind, arm, conflicts) in LOWER_POSITIONS {
            positions.insert(
                id.to_string(),
                Position {
                    id: id.to_string(),
                    deck: Deck::Lower,
                    kind,
                    arm,
                    conflicts: conflicts.iter().map(|c| c.to_string()).collect(),
                },
            );
        }

        Self { positions }
    }

    /// Derives a per-flight map with the given positions removed.
    ///
    /// Validates conflict references against the full map first: a conflict
    /// naming an unknown position means the map data itself is broken, which
    /// is fatal rather than something planning can work around.
    pub fn snapshot(&self, disabled: &BTreeSet<String>) -> Result<Self, PlanningError> {
        self.validate()?;
        let positions = self
            .positions
            .iter()
            .filter(|(id, _)| !disabled.contains(*id))
            .map(|(id, pos)| (id.clone(), pos.clone()))
            .collect();
        Ok(Self { positions })
    }

    fn validate(&self) -> Result<(), PlanningError> {
        for pos in self.positions.values() {
            for conflict in &pos.conflicts {
                if !self.positions.contains_key(conflict) {
                    return Err(PlanningError::InvalidMap(format!(
                        "position {} lists unknown conflict {}",
                        pos.id, conflict
                    )));
                }
            }
        }
        Ok(())
    }

    pub fn get(&self, id: &str) -> Option<&Position> {
        self.positions.get(id)
    }

    /// Positions on a deck matching one of the given kinds, in id order.
    pub fn candidates(&self, deck: Deck, kinds: &[PositionKind]) -> Vec<&Position> {
        self.positions
            .values()
            .filter(|p| p.deck == deck && kinds.contains(&p.kind))
            .collect()
    }

    #[cfg(test)]
    pub fn insert_for_test(&mut self, pos: Position) {
        self.positions.insert(pos.id.clone(), pos);
    }
}
