//! Integration surface for sales and RMS systems.
//!
//! `FlightRepository` memoizes per-flight state behind one mutex per flight
//! id: the route, the bookings confirmed so far, forced groups and the
//! positions marked inoperative. Every confirmation re-runs a fresh
//! planning pass over all accumulated cargo against a fresh map snapshot,
//! so restrictions and bookings of one flight never leak into another.
//! Completed flights are evicted explicitly.

use std::collections::{BTreeSet, HashMap};
use std::sync::{Arc, Mutex};

use crate::aircraft::AircraftMap;
use crate::model::{CargoRequest, ForcedGroup, PlanningError, Report};
use crate::planner::{CorePlanningEngine, PlannerConfig};

/// Everything remembered about one flight between bookings.
#[derive(Debug, Default)]
struct FlightState {
    route: Vec<String>,
    restrictions: BTreeSet<String>,
    bookings: Vec<CargoRequest>,
    forced_groups: Vec<ForcedGroup>,
}

/// In-memory store of flight planning state.
#[derive(Default)]
pub struct FlightRepository {
    flights: Mutex<HashMap<String, Arc<Mutex<FlightState>>>>,
}

impl FlightRepository {
    pub fn new() -> Self {
        Self::default()
    }

    fn flight(&self, flight_id: &str, route: &[String]) -> Arc<Mutex<FlightState>> {
        let mut flights = self.flights.lock().expect("flight repository poisoned");
        flights
            .entry(flight_id.to_string())
            .or_insert_with(|| {
                Arc::new(Mutex::new(FlightState {
                    route: route.to_vec(),
                    ..FlightState::default()
                }))
            })
            .clone()
    }

    /// Processes a booking for a specific flight.
    ///
    /// `restrictions` are position ids marked inoperative for this flight
    /// only; they accumulate over bookings. The returned report covers all
    /// cargo confirmed so far.
    pub fn confirm_booking(
        &self,
        flight_id: &str,
        route: &[String],
        cargos: Vec<CargoRequest>,
        forced_groups: Vec<ForcedGroup>,
        restrictions: Option<Vec<String>>,
        config: &PlannerConfig,
    ) -> Result<Report, PlanningError> {
        let flight = self.flight(flight_id, route);
        let mut state = flight.lock().expect("flight state poisoned");

        if let Some(restrictions) = restrictions {
            println!(
                "✈️ [{}] Applying ad-hoc restrictions: {:?}",
                flight_id, restrictions
            );
            state.restrictions.extend(restrictions);
        }
        state.bookings.extend(cargos);
        state.forced_groups.extend(forced_groups);

        let map = AircraftMap::base().snapshot(&state.restrictions)?;
        let bookings = state.bookings.clone();
        let forced = state.forced_groups.clone();
        let mut engine = CorePlanningEngine::new(map, *config);
        engine.plan_flight(bookings, &forced)
    }

    /// Drops a completed flight. Returns whether it existed.
    pub fn close_flight(&self, flight_id: &str) -> bool {
        let mut flights = self.flights.lock().expect("flight repository poisoned");
        flights.remove(flight_id).is_some()
    }

    /// Route the flight was registered with, if it exists.
    #[allow(dead_code)]
    pub fn route_of(&self, flight_id: &str) -> Option<Vec<String>> {
        let flights = self.flights.lock().expect("flight repository poisoned");
        flights
            .get(flight_id)
            .map(|state| state.lock().expect("flight state poisoned").route.clone())
    }
}

/// Stateless planning for sales inquiries. Nothing is persisted.
pub fn simulate_loading_needs(
    cargos: Vec<CargoRequest>,
    config: &PlannerConfig,
) -> Result<Report, PlanningError> {
    let map = AircraftMap::base().snapshot(&BTreeSet::new())?;
    let mut engine = CorePlanningEngine::new(map, *config);
    engine.plan_flight(cargos, &[])
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cargo(id: &str, weight: f64, volume: f64) -> CargoRequest {
        CargoRequest {
            id: id.to_string(),
            destination: "LAX".to_string(),
            weight,
            volume,
            pieces: 1,
            dims: Vec::new(),
            shc: Vec::new(),
            uld_type: None,
        }
    }

    #[test]
    fn simulation_matches_a_fresh_planning_pass() {
        let config = PlannerConfig::default();
        let cargos: Vec<CargoRequest> =
            (1..=10).map(|i| cargo(&format!("C{:02}", i), 600.0, 2.0)).collect();

        let simulated = simulate_loading_needs(cargos.clone(), &config).unwrap();

        let map = AircraftMap::base().snapshot(&BTreeSet::new()).unwrap();
        let mut engine = CorePlanningEngine::new(map, config);
        let planned = engine.plan_flight(cargos, &[]).unwrap();

        assert_eq!(simulated.summary.total_ulds, planned.summary.total_ulds);
        assert_eq!(simulated.rejected, planned.rejected);
    }

    #[test]
    fn bookings_accumulate_per_flight() {
        let repo = FlightRepository::new();
        let config = PlannerConfig::default();
        let route = vec!["TPE".to_string(), "LAX".to_string()];

        let first = repo
            .confirm_booking("CI-5148", &route, vec![cargo("C1", 500.0, 2.0)], Vec::new(), None, &config)
            .unwrap();
        assert_eq!(first.summary.total_ulds, 1);

        // ten more bookings re-plan the whole flight, not just the delta
        let more: Vec<CargoRequest> =
            (2..=11).map(|i| cargo(&format!("C{:02}", i), 600.0, 2.0)).collect();
        let second = repo
            .confirm_booking("CI-5148", &route, more, Vec::new(), None, &config)
            .unwrap();
        assert!(second.summary.total_ulds >= 2);

        // a different flight starts empty
        let other = repo
            .confirm_booking("CI-0006", &route, vec![cargo("D1", 500.0, 2.0)], Vec::new(), None, &config)
            .unwrap();
        assert_eq!(other.summary.total_ulds, 1);
    }

    #[test]
    fn restrictions_stay_per_flight() {
        let repo = FlightRepository::new();
        let config = PlannerConfig::default();
        let route = vec!["TPE".to_string(), "LAX".to_string()];

        // every main-deck L/R berth forward of row E is out on this flight
        let restricted: Vec<String> =
            ["CL", "CR", "DL", "DR"].iter().map(|s| s.to_string()).collect();
        let report = repo
            .confirm_booking(
                "CI-5148",
                &route,
                vec![cargo("C1", 500.0, 2.0)],
                Vec::new(),
                Some(restricted),
                &config,
            )
            .unwrap();
        assert_eq!(report.visualization[0].pos, "EL");

        // the sibling flight still sees the full map
        let clean = repo
            .confirm_booking("CI-0006", &route, vec![cargo("D1", 500.0, 2.0)], Vec::new(), None, &config)
            .unwrap();
        assert_eq!(clean.visualization[0].pos, "CL");
    }

    #[test]
    fn closing_a_flight_evicts_its_state() {
        let repo = FlightRepository::new();
        let config = PlannerConfig::default();
        let route = vec!["TPE".to_string()];

        repo.confirm_booking("CI-5148", &route, vec![cargo("C1", 500.0, 2.0)], Vec::new(), None, &config)
            .unwrap();
        assert_eq!(repo.route_of("CI-5148"), Some(route.clone()));
        assert!(repo.close_flight("CI-5148"));
        assert!(!repo.close_flight("CI-5148"));
        assert_eq!(repo.route_of("CI-5148"), None);
    }
}
