//! Core planning pipeline.
//!
//! A planning run walks the booking list through cascading phases:
//! - Phase 0: validate and explode multi-piece requests into piece clones
//! - Phase 0.5: pack operator-forced groups into their pre-allocated ULDs
//! - Phase 1: per-cargo admission (door fit, type recommendation, shoring),
//!   then heuristic packing for special cargo and geometric packing for
//!   dimensioned cargo
//! - Phase 2: batch-optimize the remaining volumetric cargo per deck and
//!   destination, with the MIP bin packer minimizing the ULD count
//! - Phase 3: aircraft allocation under interlocks and structural limits
//! - Phase 4: report assembly
//!
//! Each run is a pure function of (map snapshot, cargo list, forced
//! groups): state is reset on entry and every sort carries a cargo-id
//! tiebreaker, so equal inputs plan identically.

use std::collections::{BTreeMap, BTreeSet};

use serde::Serialize;

use crate::aircraft::AircraftMap;
use crate::allocator;
use crate::gatekeeper;
use crate::model::{
    ActionRequiredEntry, AdmittedCargo, CargoRequest, FLOATING_LOAD_NOTE, ForcedGroup, PackedUld,
    PlanningError, PlanningFeedback, RejectedCargo, Report, ReportSummary, UldStatus,
    VisualizationRow,
};
use crate::packer;
use crate::segregation;
use crate::shoring;
use crate::solver::{self, BinItem};
use crate::structural;
use crate::uld::{self, UldType};

/// Tunables of the planning pipeline.
#[derive(Clone, Copy, Debug)]
pub struct PlannerConfig {
    /// Gross-weight fraction at which a geometrically packed ULD closes.
    pub closure_threshold: f64,
    /// Fraction of a ULD's volume usable in practice.
    pub packing_loss_factor: f64,
    /// Conservative arm (inches) used for shoring before allocation.
    pub reference_arm_in: f64,
}

impl PlannerConfig {
    pub const DEFAULT_CLOSURE_THRESHOLD: f64 = 0.95;
    pub const DEFAULT_PACKING_LOSS_FACTOR: f64 = 0.85;
    pub const DEFAULT_REFERENCE_ARM_IN: f64 = 320.0;

    /// Creates a builder for custom configuration.
    pub fn builder() -> PlannerConfigBuilder {
        PlannerConfigBuilder::default()
    }
}

impl Default for PlannerConfig {
    fn default() -> Self {
        Self {
            closure_threshold: Self::DEFAULT_CLOSURE_THRESHOLD,
            packing_loss_factor: Self::DEFAULT_PACKING_LOSS_FACTOR,
            reference_arm_in: Self::DEFAULT_REFERENCE_ARM_IN,
        }
    }
}

/// Builder for `PlannerConfig`.
#[derive(Clone, Debug, Default)]
pub struct PlannerConfigBuilder {
    config: Option<PlannerConfig>,
}

impl PlannerConfigBuilder {
    fn config(&mut self) -> &mut PlannerConfig {
        self.config.get_or_insert_with(PlannerConfig::default)
    }

    pub fn closure_threshold(mut self, value: f64) -> Self {
        self.config().closure_threshold = value;
        self
    }

    pub fn packing_loss_factor(mut self, value: f64) -> Self {
        self.config().packing_loss_factor = value;
        self
    }

    pub fn reference_arm_in(mut self, value: f64) -> Self {
        self.config().reference_arm_in = value;
        self
    }

    pub fn build(mut self) -> PlannerConfig {
        *self.config()
    }
}

/// Events emitted while planning, for live streaming to a frontend.
#[derive(Clone, Debug, Serialize)]
#[serde(tag = "type")]
pub enum PlanEvent {
    CargoRejected {
        id: String,
        reason: String,
    },
    UldOpened {
        id: String,
        uld_type: String,
        contour: String,
        destination: String,
    },
    ItemPacked {
        uld_id: String,
        cargo_id: String,
        weight: f64,
    },
    UldAssigned {
        uld_id: String,
        position: String,
        arm: f64,
    },
    UldUnassigned {
        uld_id: String,
    },
    Finished {
        total_ulds: usize,
        rejected: usize,
        warnings: usize,
    },
}

/// Splits multi-piece requests into per-piece clones `{id-i, weight/n,
/// volume/n, pieces=1}`.
fn explode(cargos: Vec<CargoRequest>) -> Vec<CargoRequest> {
    let mut out = Vec::new();
    for cargo in cargos {
        if cargo.pieces > 1 {
            let weight = cargo.weight / cargo.pieces as f64;
            let volume = cargo.volume / cargo.pieces as f64;
            for i in 1..=cargo.pieces {
                out.push(CargoRequest {
                    id: format!("{}-{}", cargo.id, i),
                    destination: cargo.destination.clone(),
                    weight,
                    volume,
                    pieces: 1,
                    dims: cargo.dims.clone(),
                    shc: cargo.shc.clone(),
                    uld_type: cargo.uld_type,
                });
            }
        } else {
            out.push(cargo);
        }
    }
    out
}

/// Matches a piece clone back to its forced group: exact id, or the
/// `"{id}-<piece>"` form explosion produces.
fn in_group(cargo: &CargoRequest, group: &ForcedGroup) -> bool {
    group
        .cargo_ids
        .iter()
        .any(|gid| cargo.id == *gid || cargo.id.starts_with(&format!("{}-", gid)))
}

/// The planning engine for one flight.
///
/// Owns its aircraft map snapshot; restrictions applied to this flight
/// never touch other flights.
pub struct CorePlanningEngine {
    map: AircraftMap,
    config: PlannerConfig,
    packed_ulds: Vec<PackedUld>,
    rejected: Vec<RejectedCargo>,
    action_required: Vec<PlanningFeedback>,
    uld_seq: usize,
}

impl CorePlanningEngine {
    pub fn new(map: AircraftMap, config: PlannerConfig) -> Self {
        Self {
            map,
            config,
            packed_ulds: Vec::new(),
            rejected: Vec::new(),
            action_required: Vec::new(),
            uld_seq: 0,
        }
    }

    /// Plans the flight. A fresh pass over all cargos; prior state is
    /// discarded.
    pub fn plan_flight(
        &mut self,
        cargos: Vec<CargoRequest>,
        forced_groups: &[ForcedGroup],
    ) -> Result<Report, PlanningError> {
        self.plan_flight_with_progress(cargos, forced_groups, |_| {})
    }

    /// Like `plan_flight`, invoking the callback for every step worth
    /// showing live (suitable for SSE).
    pub fn plan_flight_with_progress(
        &mut self,
        cargos: Vec<CargoRequest>,
        forced_groups: &[ForcedGroup],
        mut on_event: impl FnMut(&PlanEvent),
    ) -> Result<Report, PlanningError> {
        self.run(cargos, forced_groups, &mut on_event)
    }

    fn run(
        &mut self,
        cargos: Vec<CargoRequest>,
        forced_groups: &[ForcedGroup],
        on_event: &mut dyn FnMut(&PlanEvent),
    ) -> Result<Report, PlanningError> {
        self.packed_ulds.clear();
        self.rejected.clear();
        self.action_required.clear();
        self.uld_seq = 0;

        // Phase 0: input validation, then explosion
        let mut accepted = Vec::new();
        for cargo in cargos {
            match cargo.validate() {
                Ok(()) => accepted.push(cargo),
                Err(err) => self.reject(cargo.id.clone(), err.to_string(), on_event),
            }
        }
        let exploded = explode(accepted);

        // Phase 0.5: forced groups take their cargo out of the normal flow
        let mut processed: BTreeSet<String> = BTreeSet::new();
        for group in forced_groups {
            let members: Vec<CargoRequest> = exploded
                .iter()
                .filter(|c| in_group(c, group) && !processed.contains(&c.id))
                .cloned()
                .collect();
            if members.is_empty() {
                continue;
            }
            for member in &members {
                processed.insert(member.id.clone());
            }
            self.pack_forced_group(group, members, on_event);
        }

        // Phase 1: admission
        let mut deferred: Vec<CargoRequest> = Vec::new();
        for cargo in exploded {
            if processed.contains(&cargo.id) {
                continue;
            }
            if let Err(reason) = gatekeeper::validate_door_entry(&cargo) {
                self.reject(cargo.id.clone(), reason, on_event);
                continue;
            }

            let rec = shoring::recommend_type(&cargo);
            let assessment =
                shoring::calculate_shoring_needs(&cargo, rec.uld_type, self.config.reference_arm_in);

            let special = cargo.uld_type.is_some()
                || !matches!(rec.uld_type, UldType::M | UldType::MLower | UldType::K)
                || !cargo.shc.is_empty()
                || assessment.needed
                || rec.floating;

            if special {
                let target = cargo.uld_type.unwrap_or(rec.uld_type);
                let item = AdmittedCargo { cargo, shoring: assessment };
                self.heuristic_pack(item, target, rec.floating, on_event);
            } else if !cargo.dims.is_empty() {
                let item = AdmittedCargo { cargo, shoring: assessment };
                self.pack_3d(item, rec.uld_type, on_event);
            } else {
                deferred.push(cargo);
            }
        }

        // Phase 2: volumetric top-up per deck
        let (lower, main): (Vec<_>, Vec<_>) = deferred.into_iter().partition(|c| {
            let h = c.max_height();
            h > 0.0 && h <= shoring::LOWER_DECK_MAX_HEIGHT_CM
        });
        if !lower.is_empty() {
            self.smart_batch(lower, UldType::MLower, on_event);
        }
        if !main.is_empty() {
            self.smart_batch(main, UldType::M, on_event);
        }

        // Phase 3: allocation
        allocator::allocate(&mut self.packed_ulds, &self.map);
        for uld in &self.packed_ulds {
            match &uld.assigned_position {
                Some(position) => on_event(&PlanEvent::UldAssigned {
                    uld_id: uld.id.clone(),
                    position: position.clone(),
                    arm: uld.assigned_arm,
                }),
                None => on_event(&PlanEvent::UldUnassigned { uld_id: uld.id.clone() }),
            }
        }

        // A non-floating ULD above its certification at this point is a
        // planner bug, not an operator problem.
        for uld in &self.packed_ulds {
            let spec = uld::spec(uld.uld_type);
            if !uld.is_floating() && uld.gross_weight() > spec.max_gross + 1e-6 {
                return Err(PlanningError::Inconsistent(format!(
                    "ULD {} gross {:.1} kg exceeds {} certification {:.1} kg",
                    uld.id,
                    uld.gross_weight(),
                    uld.uld_type,
                    spec.max_gross
                )));
            }
        }

        // Phase 4: report
        let report = self.generate_report();
        on_event(&PlanEvent::Finished {
            total_ulds: report.summary.total_ulds,
            rejected: report.rejected.len(),
            warnings: report.summary.warnings.len(),
        });
        Ok(report)
    }

    fn next_uld_id(&mut self, prefix: &str) -> String {
        self.uld_seq += 1;
        format!("{}-{:03}", prefix, self.uld_seq)
    }

    fn reject(&mut self, id: String, reason: String, on_event: &mut dyn FnMut(&PlanEvent)) {
        on_event(&PlanEvent::CargoRejected { id: id.clone(), reason: reason.clone() });
        self.rejected.push(RejectedCargo { id, reason });
    }

    /// Phase 0.5: first-fit-decreasing into at most `max_uld_count` ULDs of
    /// the forced type. Overflow goes to `action_required`, never rejected.
    fn pack_forced_group(
        &mut self,
        group: &ForcedGroup,
        cargos: Vec<CargoRequest>,
        on_event: &mut dyn FnMut(&PlanEvent),
    ) {
        let loss = self.config.packing_loss_factor;
        let destination = cargos[0].destination.clone();
        let mut group_ulds: Vec<PackedUld> = (1..=group.max_uld_count)
            .map(|i| {
                PackedUld::new(
                    format!("FRC-{}-{}", group.group_id, i),
                    group.target_uld_type,
                    destination.clone(),
                )
            })
            .collect();

        let mut sorted = cargos;
        sorted.sort_by(|a, b| {
            b.weight
                .partial_cmp(&a.weight)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then_with(|| {
                    b.volume
                        .partial_cmp(&a.volume)
                        .unwrap_or(std::cmp::Ordering::Equal)
                })
                .then_with(|| a.id.cmp(&b.id))
        });

        let mut leftovers: Vec<AdmittedCargo> = Vec::new();
        for cargo in sorted {
            let item = AdmittedCargo::unassessed(cargo);
            let slot = group_ulds.iter_mut().find(|u| {
                u.fits(&item, loss) && segregation::compatible(&u.shc_codes, &item.cargo.shc)
            });
            match slot {
                Some(uld) => {
                    on_event(&PlanEvent::ItemPacked {
                        uld_id: uld.id.clone(),
                        cargo_id: item.cargo.id.clone(),
                        weight: item.effective_weight(),
                    });
                    uld.push(item);
                }
                None => leftovers.push(item),
            }
        }

        for mut uld in group_ulds {
            if uld.items.is_empty() {
                continue;
            }
            uld.status = UldStatus::Closed;
            uld.is_pure = true;
            on_event(&PlanEvent::UldOpened {
                id: uld.id.clone(),
                uld_type: uld.uld_type.to_string(),
                contour: uld.contour.to_string(),
                destination: uld.destination.clone(),
            });
            self.packed_ulds.push(uld);
        }

        if !leftovers.is_empty() {
            let leftover_weight: f64 = leftovers.iter().map(|c| c.effective_weight()).sum();
            let message = format!(
                "Group {} overflow: {} pcs ({:.1}kg).",
                group.group_id,
                leftovers.len(),
                leftover_weight
            );
            self.action_required.push(PlanningFeedback {
                group_id: group.group_id.clone(),
                message,
                remaining: leftovers,
            });
        }
    }

    /// Special-cargo path: first fit into an open compatible ULD, else a
    /// fresh one. Floating loads always ride alone and close immediately.
    fn heuristic_pack(
        &mut self,
        item: AdmittedCargo,
        target: UldType,
        floating: bool,
        on_event: &mut dyn FnMut(&PlanEvent),
    ) {
        let loss = self.config.packing_loss_factor;
        if !floating {
            let slot = self.packed_ulds.iter_mut().find(|u| {
                u.uld_type == target
                    && u.status == UldStatus::Open
                    && !u.is_pure
                    && u.destination == item.cargo.destination
                    && segregation::compatible(&u.shc_codes, &item.cargo.shc)
                    && u.fits(&item, loss)
            });
            if let Some(uld) = slot {
                on_event(&PlanEvent::ItemPacked {
                    uld_id: uld.id.clone(),
                    cargo_id: item.cargo.id.clone(),
                    weight: item.effective_weight(),
                });
                uld.push(item);
                return;
            }

            // even an empty ULD of the target type cannot take it
            let spec = uld::spec(target);
            if item.effective_weight() + spec.tare > spec.max_gross
                || item.cargo.volume > spec.effective_volume(loss)
            {
                self.reject(
                    item.cargo.id.clone(),
                    format!("Exceeds {} capacity", target),
                    on_event,
                );
                return;
            }
        }

        let id = self.next_uld_id(if floating { "FLT" } else { "SPL" });
        let mut uld = PackedUld::new(id, target, item.cargo.destination.clone());
        on_event(&PlanEvent::UldOpened {
            id: uld.id.clone(),
            uld_type: uld.uld_type.to_string(),
            contour: uld.contour.to_string(),
            destination: uld.destination.clone(),
        });
        on_event(&PlanEvent::ItemPacked {
            uld_id: uld.id.clone(),
            cargo_id: item.cargo.id.clone(),
            weight: item.effective_weight(),
        });
        uld.push(item);
        if floating {
            uld.status = UldStatus::Closed;
            uld.shoring_note = FLOATING_LOAD_NOTE.to_string();
        }
        self.packed_ulds.push(uld);
    }

    /// Dimensioned-cargo path: piece clones consolidate into open ULDs of
    /// the same dims up to the geometric ceiling, the capacity caps and the
    /// closure threshold.
    fn pack_3d(
        &mut self,
        item: AdmittedCargo,
        target: UldType,
        on_event: &mut dyn FnMut(&PlanEvent),
    ) {
        let dims = item.cargo.dims[0];
        let ceiling = packer::max_pieces_per_uld(&dims, target);
        if ceiling == 0 {
            self.reject(
                item.cargo.id.clone(),
                format!("Dims cannot fit {}", target),
                on_event,
            );
            return;
        }

        let spec = uld::spec(target);
        if item.effective_weight() + spec.tare > spec.max_gross {
            self.reject(
                item.cargo.id.clone(),
                format!("Single piece too heavy for {}", target),
                on_event,
            );
            return;
        }

        let loss = self.config.packing_loss_factor;
        let closure = self.config.closure_threshold;
        let slot = self.packed_ulds.iter_mut().find(|u| {
            u.uld_type == target
                && u.status == UldStatus::Open
                && u.destination == item.cargo.destination
                && u.items
                    .first()
                    .is_some_and(|first| first.cargo.dims.first() == Some(&dims))
                && u.piece_count() < ceiling
                && segregation::compatible(&u.shc_codes, &item.cargo.shc)
                && u.fits(&item, loss)
        });
        if let Some(uld) = slot {
            on_event(&PlanEvent::ItemPacked {
                uld_id: uld.id.clone(),
                cargo_id: item.cargo.id.clone(),
                weight: item.effective_weight(),
            });
            uld.push(item);
            if uld.gross_weight() >= spec.max_gross * closure {
                uld.status = UldStatus::Closed;
            }
            return;
        }

        let id = self.next_uld_id("3D");
        let mut uld = PackedUld::new(id, target, item.cargo.destination.clone());
        on_event(&PlanEvent::UldOpened {
            id: uld.id.clone(),
            uld_type: uld.uld_type.to_string(),
            contour: uld.contour.to_string(),
            destination: uld.destination.clone(),
        });
        on_event(&PlanEvent::ItemPacked {
            uld_id: uld.id.clone(),
            cargo_id: item.cargo.id.clone(),
            weight: item.effective_weight(),
        });
        uld.push(item);
        if uld.gross_weight() >= spec.max_gross * closure {
            uld.status = UldStatus::Closed;
        }
        self.packed_ulds.push(uld);
    }

    /// Phase 2: first-fit-decreasing into open ULDs of the target type,
    /// then the MIP bin packer on the residue, per destination.
    fn smart_batch(
        &mut self,
        cargos: Vec<CargoRequest>,
        target: UldType,
        on_event: &mut dyn FnMut(&PlanEvent),
    ) {
        let loss = self.config.packing_loss_factor;
        let spec = uld::spec(target);

        let mut groups: BTreeMap<String, Vec<CargoRequest>> = BTreeMap::new();
        for cargo in explode(cargos) {
            groups.entry(cargo.destination.clone()).or_default().push(cargo);
        }

        for (destination, mut items) in groups {
            items.sort_by(|a, b| {
                b.weight
                    .partial_cmp(&a.weight)
                    .unwrap_or(std::cmp::Ordering::Equal)
                    .then_with(|| {
                        b.volume
                            .partial_cmp(&a.volume)
                            .unwrap_or(std::cmp::Ordering::Equal)
                    })
                    .then_with(|| a.id.cmp(&b.id))
            });

            let mut residue: Vec<CargoRequest> = Vec::new();
            for cargo in items {
                let item = AdmittedCargo::unassessed(cargo);
                let slot = self.packed_ulds.iter_mut().find(|u| {
                    u.status == UldStatus::Open
                        && !u.is_pure
                        && u.destination == destination
                        && u.uld_type == target
                        && segregation::compatible(&u.shc_codes, &item.cargo.shc)
                        && u.fits(&item, loss)
                });
                match slot {
                    Some(uld) => {
                        on_event(&PlanEvent::ItemPacked {
                            uld_id: uld.id.clone(),
                            cargo_id: item.cargo.id.clone(),
                            weight: item.effective_weight(),
                        });
                        uld.push(item);
                    }
                    None => residue.push(item.cargo),
                }
            }

            if residue.is_empty() {
                continue;
            }

            let bin_items: Vec<BinItem> = residue
                .iter()
                .map(|c| BinItem { weight: c.weight, volume: c.volume })
                .collect();
            match solver::pack_min_bins(&bin_items, spec.net_capacity(), spec.effective_volume(loss))
            {
                Ok(bins) => {
                    for members in bins {
                        let id = self.next_uld_id("OPT");
                        let mut uld = PackedUld::new(id, target, destination.clone());
                        on_event(&PlanEvent::UldOpened {
                            id: uld.id.clone(),
                            uld_type: uld.uld_type.to_string(),
                            contour: uld.contour.to_string(),
                            destination: uld.destination.clone(),
                        });
                        for index in members {
                            let item = AdmittedCargo::unassessed(residue[index].clone());
                            on_event(&PlanEvent::ItemPacked {
                                uld_id: uld.id.clone(),
                                cargo_id: item.cargo.id.clone(),
                                weight: item.effective_weight(),
                            });
                            uld.push(item);
                        }
                        self.packed_ulds.push(uld);
                    }
                }
                Err(_) => self.first_fit_fallback(residue, target, &destination, on_event),
            }
        }
    }

    /// Heuristic residue packing when the solver reports no solution.
    fn first_fit_fallback(
        &mut self,
        residue: Vec<CargoRequest>,
        target: UldType,
        destination: &str,
        on_event: &mut dyn FnMut(&PlanEvent),
    ) {
        let loss = self.config.packing_loss_factor;
        let spec = uld::spec(target);
        let mut new_ulds: Vec<PackedUld> = Vec::new();

        for cargo in residue {
            let item = AdmittedCargo::unassessed(cargo);
            if item.effective_weight() + spec.tare > spec.max_gross
                || item.cargo.volume > spec.effective_volume(loss)
            {
                self.reject(
                    item.cargo.id.clone(),
                    format!("Exceeds {} capacity", target),
                    on_event,
                );
                continue;
            }
            if let Some(uld) = new_ulds.iter_mut().find(|u| u.fits(&item, loss)) {
                on_event(&PlanEvent::ItemPacked {
                    uld_id: uld.id.clone(),
                    cargo_id: item.cargo.id.clone(),
                    weight: item.effective_weight(),
                });
                uld.push(item);
            } else {
                let id = self.next_uld_id("OPT");
                let mut uld = PackedUld::new(id, target, destination);
                on_event(&PlanEvent::UldOpened {
                    id: uld.id.clone(),
                    uld_type: uld.uld_type.to_string(),
                    contour: uld.contour.to_string(),
                    destination: uld.destination.clone(),
                });
                on_event(&PlanEvent::ItemPacked {
                    uld_id: uld.id.clone(),
                    cargo_id: item.cargo.id.clone(),
                    weight: item.effective_weight(),
                });
                uld.push(item);
                new_ulds.push(uld);
            }
        }
        self.packed_ulds.extend(new_ulds);
    }

    fn generate_report(&self) -> Report {
        let warnings = structural::check_zone_limits(&self.packed_ulds);

        let visualization = self
            .packed_ulds
            .iter()
            .map(|uld| {
                let contents = uld
                    .items
                    .iter()
                    .map(|item| {
                        let shc = if item.cargo.shc.is_empty() {
                            String::new()
                        } else {
                            format!(" [{}]", item.cargo.shc.join(","))
                        };
                        format!(
                            "{} ({:.0}kg, {}{})",
                            item.cargo.id,
                            item.effective_weight(),
                            item.cargo.destination,
                            shc
                        )
                    })
                    .collect();
                VisualizationRow {
                    pos: uld
                        .assigned_position
                        .clone()
                        .unwrap_or_else(|| "UNASSIGNED".to_string()),
                    uld: uld.id.clone(),
                    uld_type: uld.uld_type.to_string(),
                    weight: format!("{:.0}", uld.gross_weight()),
                    arm: uld.assigned_arm,
                    dest: uld.destination.clone(),
                    contents,
                }
            })
            .collect();

        Report {
            summary: ReportSummary {
                total_ulds: self.packed_ulds.len(),
                total_weight: self.packed_ulds.iter().map(|u| u.gross_weight()).sum(),
                warnings,
            },
            rejected: self.rejected.clone(),
            action_required: self
                .action_required
                .iter()
                .map(|feedback| ActionRequiredEntry {
                    group_id: feedback.group_id.clone(),
                    message: feedback.message.clone(),
                    leftover_count: feedback.remaining.len(),
                })
                .collect(),
            visualization,
        }
    }

    /// The packed ULDs of the last run, mainly for invariant checks.
    pub fn packed_ulds(&self) -> &[PackedUld] {
        &self.packed_ulds
    }
}
