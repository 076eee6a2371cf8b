//! Structural integrity checks: per-station linear load and cumulative
//! zone weight limits.

use crate::aircraft;
use crate::model::PackedUld;
use crate::uld;

/// Checks the ULD's running load (kg per inch along the fuselage) against
/// the station limit at the given arm.
pub fn check_linear_load(uld: &PackedUld, arm: f64) -> Result<(), String> {
    let spec = uld::spec(uld.uld_type);
    let limit = aircraft::linear_limit(arm);
    let linear_load = uld.gross_weight() / spec.len_in;

    if linear_load > limit {
        return Err(format!(
            "Load {:.1} kg/in > Limit {} kg/in",
            linear_load, limit
        ));
    }
    Ok(())
}

/// Sums the gross weight of assigned ULDs per zone band and returns one
/// warning per over-limit zone. A ULD sitting on a shared band boundary
/// counts toward every zone containing its arm.
pub fn check_zone_limits(packed_ulds: &[PackedUld]) -> Vec<String> {
    let zones = aircraft::zone_limits();
    let mut zone_weights = vec![0.0; zones.len()];

    for uld in packed_ulds {
        if uld.assigned_position.is_none() {
            continue;
        }
        for (i, zone) in zones.iter().enumerate() {
            if zone.start <= uld.assigned_arm && uld.assigned_arm <= zone.end {
                zone_weights[i] += uld.gross_weight();
            }
        }
    }

    zones
        .iter()
        .zip(zone_weights)
        .filter(|(zone, weight)| *weight > zone.limit)
        .map(|(zone, weight)| {
            format!(
                "Zone {} Overweight! {:.0} > Limit {}",
                zone.name, weight, zone.limit
            )
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{AdmittedCargo, CargoRequest, PackedUld};
    use crate::uld::UldType;

    fn uld_with_weight(id: &str, uld_type: UldType, weight: f64) -> PackedUld {
        let mut uld = PackedUld::new(id, uld_type, "LAX");
        uld.push(AdmittedCargo::unassessed(CargoRequest {
            id: format!("{}-c", id),
            destination: "LAX".to_string(),
            weight,
            volume: 1.0,
            pieces: 1,
            dims: Vec::new(),
            shc: Vec::new(),
            uld_type: None,
        }));
        uld
    }

    #[test]
    fn linear_load_respects_station_bands() {
        // 6000 + 120 tare over 125 in = 48.96 kg/in
        let uld = uld_with_weight("U1", UldType::M, 6000.0);
        // forward stations allow 38.5 kg/in
        assert!(check_linear_load(&uld, 320.0).is_err());
        // over the wing box 131.5 kg/in is available
        assert!(check_linear_load(&uld, 1200.0).is_ok());
    }

    #[test]
    fn zone_check_flags_overweight_bands() {
        // BULK zone (1900-2160) is limited to 4408 kg
        let mut a = uld_with_weight("U1", UldType::M, 3000.0);
        a.assigned_position = Some("QL".to_string());
        a.assigned_arm = 1939.0;
        let mut b = uld_with_weight("U2", UldType::M, 2500.0);
        b.assigned_position = Some("QR".to_string());
        b.assigned_arm = 1939.0;

        let warnings = check_zone_limits(&[a, b]);
        assert_eq!(warnings.len(), 1);
        assert!(warnings[0].contains("BULK"));
    }

    #[test]
    fn unassigned_ulds_do_not_count() {
        let uld = uld_with_weight("U1", UldType::G, 13000.0);
        assert!(check_zone_limits(&[uld]).is_empty());
    }

    #[test]
    fn boundary_arm_counts_in_both_zones() {
        // arm 1480 belongs to WINGBOX (1000-1480) and AFT_LOWER (1480-1900)
        let mut uld = uld_with_weight("U1", UldType::G, 13000.0);
        uld.assigned_position = Some("KC".to_string());
        uld.assigned_arm = 1480.0;
        // neither zone limit is exceeded by a single 13.5 t ULD
        assert!(check_zone_limits(std::slice::from_ref(&uld)).is_empty());

        // stack enough weight on the boundary to trip only AFT_LOWER
        let mut heavy = uld_with_weight("U2", UldType::G, 13000.0);
        heavy.assigned_position = Some("LC".to_string());
        heavy.assigned_arm = 1480.0;
        let warnings = check_zone_limits(&[uld, heavy]);
        assert_eq!(warnings.len(), 1);
        assert!(warnings[0].contains("AFT_LOWER"));
    }
}
