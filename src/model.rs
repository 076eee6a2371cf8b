//! Data model for the load planning pipeline.
//!
//! This module defines the structures flowing through the planner:
//! - `CargoRequest`: a booking line as submitted, never mutated
//! - `AdmittedCargo`: a request plus the shoring assessment admission added
//! - `PackedUld`: a built-up unit load device with its running totals
//! - `Report`: the payload handed back to the operator
//!
//! Recoverable problems (door rejection, forced-group overflow) travel as
//! data inside the report; `PlanningError` is reserved for configuration or
//! consistency failures that abort the planning call.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};
#[allow(unused_imports)]
use serde_json::json;
use utoipa::ToSchema;

use crate::shoring::ShoringAssessment;
use crate::uld::{self, Contour, UldType};

/// Validation error for booking input.
///
/// Violations are reported back as rejections with a reason; they never
/// abort a planning call.
#[derive(Debug, Clone)]
pub enum ValidationError {
    InvalidWeight(String),
    InvalidVolume(String),
    InvalidPieces(String),
    InvalidDimension(String),
    MissingDestination(String),
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ValidationError::InvalidWeight(msg) => write!(f, "Invalid weight: {}", msg),
            ValidationError::InvalidVolume(msg) => write!(f, "Invalid volume: {}", msg),
            ValidationError::InvalidPieces(msg) => write!(f, "Invalid piece count: {}", msg),
            ValidationError::InvalidDimension(msg) => write!(f, "Invalid dimension: {}", msg),
            ValidationError::MissingDestination(msg) => {
                write!(f, "Missing destination: {}", msg)
            }
        }
    }
}

impl std::error::Error for ValidationError {}

/// Fatal planning failure. Everything recoverable is report data instead.
#[derive(Debug, Clone)]
pub enum PlanningError {
    /// The aircraft map references positions that do not exist.
    InvalidMap(String),
    /// A packed ULD violates its own certification after packing.
    Inconsistent(String),
}

impl std::fmt::Display for PlanningError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PlanningError::InvalidMap(msg) => write!(f, "Invalid aircraft map: {}", msg),
            PlanningError::Inconsistent(msg) => write!(f, "Planning inconsistency: {}", msg),
        }
    }
}

impl std::error::Error for PlanningError {}

fn validate_positive(value: f64, name: &str) -> Result<(), String> {
    if value <= 0.0 || value.is_nan() || value.is_infinite() {
        return Err(format!("{} must be positive, got: {}", name, value));
    }
    Ok(())
}

/// Outer dimensions of one piece, in centimetres.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct BoxDims {
    pub l: f64,
    pub w: f64,
    pub h: f64,
}

impl BoxDims {
    pub fn volume(&self) -> f64 {
        self.l * self.w * self.h
    }

    pub fn footprint(&self) -> f64 {
        self.l * self.w
    }

    /// Edges sorted ascending: (min, mid, max).
    pub fn sorted_edges(&self) -> (f64, f64, f64) {
        let mut edges = [self.l, self.w, self.h];
        edges.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));
        (edges[0], edges[1], edges[2])
    }
}

/// A booking line as submitted by sales.
///
/// # Fields
/// * `weight` - total chargeable weight in kg across all pieces
/// * `volume` - total volume in m³ across all pieces
/// * `dims` - per-piece outer dimensions in cm, when known
/// * `shc` - special handling codes (AVI, RRY, ...)
/// * `uld_type` - operator-forced ULD type, if any
#[derive(Clone, Debug, Serialize, Deserialize, ToSchema)]
#[schema(example = json!({
    "id": "AWB-001", "destination": "LAX", "weight": 500.0, "volume": 2.0,
    "pieces": 1, "dims": [], "shc": []
}))]
pub struct CargoRequest {
    pub id: String,
    pub destination: String,
    pub weight: f64,
    pub volume: f64,
    pub pieces: u32,
    #[serde(default)]
    pub dims: Vec<BoxDims>,
    #[serde(default)]
    pub shc: Vec<String>,
    #[serde(default)]
    #[schema(nullable = true)]
    pub uld_type: Option<UldType>,
}

impl CargoRequest {
    /// Checks the request against the booking contract.
    pub fn validate(&self) -> Result<(), ValidationError> {
        validate_positive(self.weight, "Weight").map_err(ValidationError::InvalidWeight)?;
        validate_positive(self.volume, "Volume").map_err(ValidationError::InvalidVolume)?;
        if self.pieces < 1 {
            return Err(ValidationError::InvalidPieces(format!(
                "pieces must be at least 1, got: {}",
                self.pieces
            )));
        }
        if self.destination.trim().is_empty() {
            return Err(ValidationError::MissingDestination(format!(
                "cargo {} has no destination",
                self.id
            )));
        }
        for dim in &self.dims {
            validate_positive(dim.l, "Length").map_err(ValidationError::InvalidDimension)?;
            validate_positive(dim.w, "Width").map_err(ValidationError::InvalidDimension)?;
            validate_positive(dim.h, "Height").map_err(ValidationError::InvalidDimension)?;
        }
        Ok(())
    }

    /// Tallest piece height in cm; 0 when no dims were given.
    pub fn max_height(&self) -> f64 {
        self.dims.iter().map(|d| d.h).fold(0.0, f64::max)
    }

    /// The piece with the largest volume, the worst case for door entry.
    pub fn largest_piece(&self) -> Option<&BoxDims> {
        self.dims.iter().max_by(|a, b| {
            a.volume()
                .partial_cmp(&b.volume())
                .unwrap_or(std::cmp::Ordering::Equal)
        })
    }

    /// The piece with the largest floor footprint, sizing the shoring base.
    pub fn largest_footprint(&self) -> Option<&BoxDims> {
        self.dims.iter().max_by(|a, b| {
            a.footprint()
                .partial_cmp(&b.footprint())
                .unwrap_or(std::cmp::Ordering::Equal)
        })
    }

    /// Weight of one piece in kg.
    pub fn per_piece_weight(&self) -> f64 {
        self.weight / self.pieces.max(1) as f64
    }
}

/// A cargo request that passed admission, carrying its shoring assessment.
///
/// The submitted request stays untouched; packing works with the effective
/// weight and height so the reinforcement cost is traceable per item.
#[derive(Clone, Debug)]
pub struct AdmittedCargo {
    pub cargo: CargoRequest,
    pub shoring: ShoringAssessment,
}

impl AdmittedCargo {
    /// Admission without a shoring assessment (forced groups, deferred
    /// volumetric cargo).
    pub fn unassessed(cargo: CargoRequest) -> Self {
        Self {
            cargo,
            shoring: ShoringAssessment::default(),
        }
    }

    /// Weight the aircraft actually carries for this item.
    pub fn effective_weight(&self) -> f64 {
        self.cargo.weight + self.shoring.added_weight
    }

    /// Stacking height of the first piece including shoring, in cm.
    #[allow(dead_code)]
    pub fn effective_height(&self) -> f64 {
        self.cargo.dims.first().map(|d| d.h).unwrap_or(0.0) + self.shoring.added_height
    }
}

/// Lifecycle state of a ULD under construction.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum UldStatus {
    Open,
    Closed,
}

impl std::fmt::Display for UldStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            UldStatus::Open => "OPEN",
            UldStatus::Closed => "CLOSED",
        })
    }
}

/// Note set on ULDs carrying oversize cargo tied directly to seat tracks.
pub const FLOATING_LOAD_NOTE: &str = "FLOATING LOAD";

/// A built-up unit load device.
#[derive(Clone, Debug)]
pub struct PackedUld {
    pub id: String,
    pub uld_type: UldType,
    pub contour: Contour,
    pub destination: String,
    pub items: Vec<AdmittedCargo>,
    /// Sum of original item weights, before shoring.
    pub total_weight: f64,
    pub total_volume: f64,
    pub is_pure: bool,
    pub status: UldStatus,
    pub shc_codes: BTreeSet<String>,
    pub assigned_position: Option<String>,
    pub assigned_arm: f64,
    /// Sum of reinforcement weight added for the items aboard.
    pub shoring_weight: f64,
    pub shoring_note: String,
}

impl PackedUld {
    pub fn new(id: impl Into<String>, uld_type: UldType, destination: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            uld_type,
            contour: uld::spec(uld_type).contour,
            destination: destination.into(),
            items: Vec::new(),
            total_weight: 0.0,
            total_volume: 0.0,
            is_pure: false,
            status: UldStatus::Open,
            shc_codes: BTreeSet::new(),
            assigned_position: None,
            assigned_arm: 0.0,
            shoring_weight: 0.0,
            shoring_note: String::new(),
        }
    }

    /// Weight the position carries: contents + tare + shoring.
    pub fn gross_weight(&self) -> f64 {
        self.total_weight + uld::spec(self.uld_type).tare + self.shoring_weight
    }

    /// Whether the item fits within the remaining weight and volume budget.
    pub fn fits(&self, item: &AdmittedCargo, loss_factor: f64) -> bool {
        let spec = uld::spec(self.uld_type);
        self.gross_weight() + item.effective_weight() <= spec.max_gross
            && self.total_volume + item.cargo.volume <= spec.effective_volume(loss_factor)
    }

    /// Adds the item, updating totals and the shoring ledger.
    pub fn push(&mut self, item: AdmittedCargo) {
        self.total_weight += item.cargo.weight;
        self.total_volume += item.cargo.volume;
        self.shoring_weight += item.shoring.added_weight;
        self.shc_codes.extend(item.cargo.shc.iter().cloned());
        for reason in &item.shoring.reasons {
            if !self.shoring_note.is_empty() {
                self.shoring_note.push_str("; ");
            }
            self.shoring_note.push_str(reason);
        }
        self.items.push(item);
    }

    /// Pieces aboard (items are piece clones after explosion).
    pub fn piece_count(&self) -> u32 {
        self.items.iter().map(|i| i.cargo.pieces).sum()
    }

    /// Floating loads are tied to the seat tracks and exceed the nominal
    /// pallet certification by definition.
    pub fn is_floating(&self) -> bool {
        self.shoring_note == FLOATING_LOAD_NOTE
    }
}

/// An operator directive binding cargos into at most `max_uld_count` ULDs
/// of a fixed type.
#[derive(Clone, Debug, Serialize, Deserialize, ToSchema)]
pub struct ForcedGroup {
    pub group_id: String,
    pub cargo_ids: Vec<String>,
    pub target_uld_type: UldType,
    pub max_uld_count: usize,
}

/// Forced-group overflow awaiting an operator decision. The leftover cargo
/// is neither rejected nor dropped.
#[derive(Clone, Debug)]
pub struct PlanningFeedback {
    pub group_id: String,
    pub message: String,
    pub remaining: Vec<AdmittedCargo>,
}

/// Totals and structural warnings for the whole plan.
#[derive(Clone, Debug, Serialize, ToSchema)]
pub struct ReportSummary {
    pub total_ulds: usize,
    pub total_weight: f64,
    pub warnings: Vec<String>,
}

/// A cargo the planner could not place at all.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, ToSchema)]
pub struct RejectedCargo {
    pub id: String,
    pub reason: String,
}

#[derive(Clone, Debug, Serialize, ToSchema)]
pub struct ActionRequiredEntry {
    pub group_id: String,
    pub message: String,
    pub leftover_count: usize,
}

/// One row of the load plan, including unassigned ULDs: an UNASSIGNED row
/// is the operator's signal that the aircraft ran out of feasible berths.
#[derive(Clone, Debug, Serialize, ToSchema)]
pub struct VisualizationRow {
    pub pos: String,
    pub uld: String,
    #[serde(rename = "type")]
    pub uld_type: String,
    pub weight: String,
    pub arm: f64,
    pub dest: String,
    pub contents: Vec<String>,
}

/// Planning result handed back to the operator.
#[derive(Clone, Debug, Serialize, ToSchema)]
pub struct Report {
    pub summary: ReportSummary,
    pub rejected: Vec<RejectedCargo>,
    pub action_required: Vec<ActionRequiredEntry>,
    pub visualization: Vec<VisualizationRow>,
}
