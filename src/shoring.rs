//! Shoring calculator and ULD type recommender.
//!
//! Three independent reinforcement needs are summed per cargo:
//! floor pressure above the panel limit, linear load above the station
//! limit at the reference arm, and contour overhang on lower-deck pallets.
//! Plywood and skid weight is derived from softwood density; the added
//! height feeds back into the stacking estimate.

use crate::aircraft;
use crate::model::CargoRequest;
use crate::uld::{self, UldType};

/// Floor panel pressure limit in kg/m².
pub const FLOOR_LIMIT_KG_M2: f64 = 976.0;
/// Density of shoring material in kg/m³.
pub const SHORING_DENSITY: f64 = 600.0;
/// Usable pallet width; wider pieces overhang the lower-deck contour.
const CONTOUR_WIDTH_CM: f64 = 244.0;
/// Tallest piece that still fits the lower hold.
pub const LOWER_DECK_MAX_HEIGHT_CM: f64 = 163.0;

/// Outcome of a shoring calculation.
#[derive(Clone, Debug, Default)]
pub struct ShoringAssessment {
    pub needed: bool,
    /// Reinforcement weight in kg.
    pub added_weight: f64,
    /// Extra stacking height in cm.
    pub added_height: f64,
    pub reasons: Vec<String>,
}

/// Computes the reinforcement cost of carrying the cargo on the given ULD
/// type at the given arm. Cargo without dims needs no shoring.
pub fn calculate_shoring_needs(
    cargo: &CargoRequest,
    uld_type: UldType,
    arm: f64,
) -> ShoringAssessment {
    let mut res = ShoringAssessment::default();
    let Some(piece) = cargo.largest_footprint() else {
        return res;
    };

    let piece_weight = cargo.per_piece_weight();
    let area_m2 = piece.footprint() / 10_000.0;

    // A. Floor pressure: spread with a 2 cm plywood base over the full ULD
    // footprint.
    let pressure = if area_m2 > 0.0 { piece_weight / area_m2 } else { f64::MAX };
    if pressure > FLOOR_LIMIT_KG_M2 {
        let base_m2 = uld::spec(uld_type).footprint_m2();
        res.added_weight += base_m2 * 0.02 * SHORING_DENSITY;
        res.added_height += 2.0;
        res.reasons.push(format!(
            "Area Load ({:.0} > {})",
            pressure, FLOOR_LIMIT_KG_M2
        ));
    }

    // B. Linear load: three 10x10 cm skids long enough to dilute the load
    // below the station limit.
    let limit_linear = aircraft::linear_limit(arm);
    let actual_linear = piece_weight / (piece.l / 2.54);
    if actual_linear > limit_linear {
        let required_len_cm = piece_weight / limit_linear * 2.54;
        let skid_vol_m3 = 3.0 * 0.1 * (required_len_cm / 100.0) * 0.1;
        res.added_weight += skid_vol_m3 * SHORING_DENSITY;
        res.added_height += 10.0;
        res.reasons.push(format!(
            "Linear Load ({:.1} > {})",
            actual_linear, limit_linear
        ));
    }

    // C. Contour overhang, lower-deck pallets only. Only the increment over
    // what A/B already added counts.
    if matches!(uld_type, UldType::MLower | UldType::ALower) && piece.w > CONTOUR_WIDTH_CM {
        let overhang = (piece.w - CONTOUR_WIDTH_CM) / 2.0;
        let required_height = overhang / 1.5 + 5.0;
        if required_height > res.added_height {
            let diff = required_height - res.added_height;
            res.added_weight += area_m2 * (diff / 100.0) * SHORING_DENSITY;
            res.added_height = required_height;
            res.reasons
                .push(format!("Contour Overhang ({:.1}cm)", overhang));
        }
    }

    res.needed = !res.reasons.is_empty();
    res
}

/// ULD type chosen for a cargo.
#[derive(Clone, Copy, Debug)]
pub struct UldRecommendation {
    pub uld_type: UldType,
    /// Oversize cargo tied to the seat tracks rather than a certified ULD.
    pub floating: bool,
}

impl UldRecommendation {
    fn of(uld_type: UldType, floating: bool) -> Self {
        Self { uld_type, floating }
    }
}

/// Picks a ULD type from height, weight and volume. Assumes the cargo has
/// already been exploded to a single piece.
pub fn recommend_type(cargo: &CargoRequest) -> UldRecommendation {
    let height = cargo.max_height();
    if height > 0.0 && height <= LOWER_DECK_MAX_HEIGHT_CM {
        // small and light enough for an LD3 container, else a lower pallet
        if cargo.weight < 1500.0 && cargo.volume < 4.0 {
            return UldRecommendation::of(UldType::K, false);
        }
        return UldRecommendation::of(UldType::MLower, false);
    }

    // weight tiers: 10-ft, 16-ft, 20-ft, then tie-down beyond certification
    let weight = cargo.weight;
    if weight > uld::spec(UldType::G).max_gross {
        return UldRecommendation::of(UldType::G, true);
    }
    if weight > uld::spec(UldType::R).max_gross {
        return UldRecommendation::of(UldType::G, false);
    }
    if weight > uld::spec(UldType::M).max_gross {
        return UldRecommendation::of(UldType::R, false);
    }
    UldRecommendation::of(UldType::M, false)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::BoxDims;

    fn cargo(weight: f64, volume: f64, dims: Vec<BoxDims>) -> CargoRequest {
        CargoRequest {
            id: "C1".to_string(),
            destination: "LAX".to_string(),
            weight,
            volume,
            pieces: 1,
            dims,
            shc: Vec::new(),
            uld_type: None,
        }
    }

    #[test]
    fn no_dims_no_shoring() {
        let res = calculate_shoring_needs(&cargo(5000.0, 4.0, Vec::new()), UldType::M, 320.0);
        assert!(!res.needed);
        assert_eq!(res.added_weight, 0.0);
    }

    #[test]
    fn concentrated_load_gets_a_plywood_base() {
        // 1 m² footprint carrying 1200 kg -> 1200 kg/m² > 976
        let c = cargo(1200.0, 1.0, vec![BoxDims { l: 100.0, w: 100.0, h: 100.0 }]);
        let res = calculate_shoring_needs(&c, UldType::M, 320.0);
        assert!(res.needed);
        // 7.74 m² x 0.02 m x 600 kg/m³ ≈ 92.9 kg
        assert!((res.added_weight - 92.9).abs() < 0.5);
        assert!((res.added_height - 2.0).abs() < 1e-9);
        assert!(res.reasons[0].starts_with("Area Load"));
    }

    #[test]
    fn short_heavy_piece_needs_skids() {
        // 100 cm long piece at 2000 kg: 2000 / 39.37 in ≈ 50.8 kg/in > 38.5
        // (forward arm), footprint pressure 2000/3 kg/m² is fine.
        let c = cargo(2000.0, 5.0, vec![BoxDims { l: 100.0, w: 300.0, h: 180.0 }]);
        let res = calculate_shoring_needs(&c, UldType::M, 320.0);
        assert!(res.needed);
        assert!((res.added_height - 10.0).abs() < 1e-9);
        assert!(res.reasons.iter().any(|r| r.starts_with("Linear Load")));
    }

    #[test]
    fn wide_piece_on_lower_pallet_needs_wedges() {
        let c = cargo(800.0, 5.0, vec![BoxDims { l: 300.0, w: 280.0, h: 150.0 }]);
        let res = calculate_shoring_needs(&c, UldType::MLower, 320.0);
        assert!(res.needed);
        // overhang 18 cm per side -> 18/1.5 + 5 = 17 cm of wedge height
        assert!((res.added_height - 17.0).abs() < 1e-9);
        assert!(res.reasons.iter().any(|r| r.starts_with("Contour Overhang")));

        // same piece on a main-deck pallet: no contour rule
        let res_main = calculate_shoring_needs(&c, UldType::M, 320.0);
        assert!(!res_main.reasons.iter().any(|r| r.starts_with("Contour")));
    }

    #[test]
    fn overhang_only_adds_the_increment() {
        // heavy and wide: linear shoring already adds 10 cm, wedge needs 17
        let c = cargo(2500.0, 6.0, vec![BoxDims { l: 100.0, w: 280.0, h: 150.0 }]);
        let res = calculate_shoring_needs(&c, UldType::MLower, 320.0);
        assert!((res.added_height - 17.0).abs() < 1e-9);
    }

    #[test]
    fn recommendation_tiers_by_weight() {
        assert_eq!(recommend_type(&cargo(500.0, 2.0, Vec::new())).uld_type, UldType::M);
        assert_eq!(recommend_type(&cargo(7000.0, 8.0, Vec::new())).uld_type, UldType::R);
        assert_eq!(recommend_type(&cargo(12000.0, 9.0, Vec::new())).uld_type, UldType::G);
        let floating = recommend_type(&cargo(14000.0, 10.0, Vec::new()));
        assert_eq!(floating.uld_type, UldType::G);
        assert!(floating.floating);
    }

    #[test]
    fn low_pieces_go_below_deck() {
        let small = cargo(900.0, 3.0, vec![BoxDims { l: 100.0, w: 100.0, h: 150.0 }]);
        assert_eq!(recommend_type(&small).uld_type, UldType::K);
        let big = cargo(3000.0, 8.0, vec![BoxDims { l: 300.0, w: 200.0, h: 160.0 }]);
        assert_eq!(recommend_type(&big).uld_type, UldType::MLower);
        // taller than 163 cm goes to the main deck
        let tall = cargo(900.0, 3.0, vec![BoxDims { l: 100.0, w: 100.0, h: 170.0 }]);
        assert_eq!(recommend_type(&tall).uld_type, UldType::M);
    }
}
