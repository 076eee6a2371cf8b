//! ULD (Unit Load Device) catalogue for the B747-400F.
//!
//! Every pallet and container type the planner may use is described by a
//! static `UldSpec`: certified gross weight, tare, usable volume, base
//! footprint and the contour it is built up to. The catalogue is total —
//! every `UldType` has a spec, so lookups never fail.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Vertical silhouette a ULD is built to.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub enum Contour {
    Q6,
    Q7,
    #[serde(rename = "FLAT")]
    Flat,
    #[serde(rename = "LD3")]
    Ld3,
    #[serde(rename = "LOWER")]
    Lower,
}

impl std::fmt::Display for Contour {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Contour::Q6 => "Q6",
            Contour::Q7 => "Q7",
            Contour::Flat => "FLAT",
            Contour::Ld3 => "LD3",
            Contour::Lower => "LOWER",
        };
        f.write_str(s)
    }
}

/// ULD types available on the aircraft.
///
/// Wire representation matches the operational short codes
/// (`"M"`, `"M_Q7"`, `"A"`, `"R"`, `"G"`, `"K"`, `"M_LOWER"`, `"A_LOWER"`).
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, ToSchema)]
pub enum UldType {
    M,
    #[serde(rename = "M_Q7")]
    MQ7,
    A,
    R,
    G,
    K,
    #[serde(rename = "M_LOWER")]
    MLower,
    #[serde(rename = "A_LOWER")]
    ALower,
}

impl std::fmt::Display for UldType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            UldType::M => "M",
            UldType::MQ7 => "M_Q7",
            UldType::A => "A",
            UldType::R => "R",
            UldType::G => "G",
            UldType::K => "K",
            UldType::MLower => "M_LOWER",
            UldType::ALower => "A_LOWER",
        })
    }
}

impl std::str::FromStr for UldType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "M" => Ok(UldType::M),
            "M_Q7" => Ok(UldType::MQ7),
            "A" => Ok(UldType::A),
            "R" => Ok(UldType::R),
            "G" => Ok(UldType::G),
            "K" => Ok(UldType::K),
            "M_LOWER" => Ok(UldType::MLower),
            "A_LOWER" => Ok(UldType::ALower),
            other => Err(format!("unknown ULD type '{}'", other)),
        }
    }
}

/// Certified limits and geometry of one ULD type.
///
/// # Fields
/// * `max_gross` - certified gross weight in kg (contents + tare + shoring)
/// * `tare` - empty weight in kg
/// * `max_vol` - usable volume in m³ before the packing loss factor
/// * `len_in` / `wid_in` - base footprint in inches
#[derive(Clone, Copy, Debug)]
pub struct UldSpec {
    pub contour: Contour,
    pub max_gross: f64,
    pub tare: f64,
    pub max_vol: f64,
    pub len_in: f64,
    pub wid_in: f64,
}

impl UldSpec {
    /// Net weight capacity left for contents and shoring.
    pub fn net_capacity(&self) -> f64 {
        self.max_gross - self.tare
    }

    /// Usable volume after applying the packing loss factor.
    pub fn effective_volume(&self, loss_factor: f64) -> f64 {
        self.max_vol * loss_factor
    }

    /// Base footprint in m².
    pub fn footprint_m2(&self) -> f64 {
        (self.len_in * 2.54 * self.wid_in * 2.54) / 10_000.0
    }
}

/// Returns the spec for a ULD type. Total over `UldType`.
pub fn spec(uld_type: UldType) -> &'static UldSpec {
    match uld_type {
        UldType::M => &UldSpec {
            contour: Contour::Q6,
            max_gross: 6804.0,
            tare: 120.0,
            max_vol: 19.0,
            len_in: 125.0,
            wid_in: 96.0,
        },
        UldType::MQ7 => &UldSpec {
            contour: Contour::Q7,
            max_gross: 6804.0,
            tare: 120.0,
            max_vol: 24.0,
            len_in: 125.0,
            wid_in: 96.0,
        },
        UldType::A => &UldSpec {
            contour: Contour::Q6,
            max_gross: 6033.0,
            tare: 110.0,
            max_vol: 17.0,
            len_in: 125.0,
            wid_in: 88.0,
        },
        UldType::R => &UldSpec {
            contour: Contour::Flat,
            max_gross: 11340.0,
            tare: 400.0,
            max_vol: 27.0,
            len_in: 196.0,
            wid_in: 96.0,
        },
        UldType::G => &UldSpec {
            contour: Contour::Flat,
            max_gross: 13608.0,
            tare: 500.0,
            max_vol: 33.0,
            len_in: 238.5,
            wid_in: 96.0,
        },
        UldType::K => &UldSpec {
            contour: Contour::Ld3,
            max_gross: 1587.0,
            tare: 90.0,
            max_vol: 4.3,
            len_in: 61.5,
            wid_in: 60.4,
        },
        UldType::MLower => &UldSpec {
            contour: Contour::Lower,
            max_gross: 5035.0,
            tare: 120.0,
            max_vol: 11.5,
            len_in: 125.0,
            wid_in: 96.0,
        },
        UldType::ALower => &UldSpec {
            contour: Contour::Lower,
            max_gross: 4626.0,
            tare: 110.0,
            max_vol: 10.5,
            len_in: 125.0,
            wid_in: 88.0,
        },
    }
}
