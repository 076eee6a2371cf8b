//! Contract for an optional revenue layer.
//!
//! Yield optimization is not part of the planning pipeline. A future
//! revenue engine plugs in through `DisplacementEvaluator`: given a cargo,
//! a target position and the current load, it prices the berths the
//! placement would block and decides whether the move pays for itself. The
//! core never calls this; it exists so the pipeline's data model and a
//! revenue layer agree on the boundary.

use crate::model::{CargoRequest, PackedUld};

/// Cost/benefit verdict for placing one cargo at one position.
#[allow(dead_code)]
#[derive(Clone, Debug)]
pub struct DisplacementAssessment {
    /// Positions the placement would make unusable.
    pub blocked_positions: Vec<String>,
    /// Revenue value of the blocked positions.
    pub displacement_cost: f64,
    /// Cargo revenue minus displacement cost.
    pub net_profit: f64,
    /// Whether the placement is physically and structurally possible.
    pub loadable: bool,
    /// Why not, when `loadable` is false.
    pub rejection_reason: Option<String>,
}

/// Prices the displacement of placing `cargo` at `target_position` given
/// the ULDs already on the aircraft.
#[allow(dead_code)]
pub trait DisplacementEvaluator {
    fn evaluate_displacement(
        &self,
        cargo: &CargoRequest,
        target_position: &str,
        current_load: &[PackedUld],
    ) -> DisplacementAssessment;
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Minimal evaluator standing in for a revenue engine.
    struct FlatRate {
        berth_value: f64,
    }

    impl DisplacementEvaluator for FlatRate {
        fn evaluate_displacement(
            &self,
            cargo: &CargoRequest,
            target_position: &str,
            current_load: &[PackedUld],
        ) -> DisplacementAssessment {
            let occupied = current_load
                .iter()
                .any(|u| u.assigned_position.as_deref() == Some(target_position));
            if occupied {
                return DisplacementAssessment {
                    blocked_positions: Vec::new(),
                    displacement_cost: 0.0,
                    net_profit: 0.0,
                    loadable: false,
                    rejection_reason: Some("position occupied".to_string()),
                };
            }
            let cost = self.berth_value;
            DisplacementAssessment {
                blocked_positions: vec![target_position.to_string()],
                displacement_cost: cost,
                net_profit: cargo.weight - cost,
                loadable: true,
                rejection_reason: None,
            }
        }
    }

    #[test]
    fn evaluator_contract_round_trips() {
        let evaluator = FlatRate { berth_value: 100.0 };
        let cargo = CargoRequest {
            id: "C1".to_string(),
            destination: "LAX".to_string(),
            weight: 500.0,
            volume: 2.0,
            pieces: 1,
            dims: Vec::new(),
            shc: Vec::new(),
            uld_type: None,
        };
        let assessment = evaluator.evaluate_displacement(&cargo, "CL", &[]);
        assert!(assessment.loadable);
        assert_eq!(assessment.blocked_positions, vec!["CL"]);
        assert!((assessment.net_profit - 400.0).abs() < 1e-9);
    }
}
