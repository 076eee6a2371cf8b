//! Pieces-per-ULD geometric ceiling.
//!
//! The planner does not track per-piece coordinates; it approximates 3D
//! packing by tiling the ULD base in both piece orientations and stacking
//! whole tiers up to the contour height.

use crate::model::BoxDims;
use crate::uld::{self, Contour, UldType};

/// Usable stacking height of a ULD type in cm.
fn stacking_height(uld_type: UldType) -> f64 {
    if uld_type == UldType::MLower {
        return 163.0;
    }
    match uld::spec(uld_type).contour {
        Contour::Q6 => 244.0,
        Contour::Q7 => 300.0,
        _ => 160.0,
    }
}

/// Upper bound on identical pieces per ULD, from base tiling and tier
/// stacking. Zero means the piece cannot be carried on this ULD type at
/// all.
pub fn max_pieces_per_uld(dims: &BoxDims, uld_type: UldType) -> u32 {
    let spec = uld::spec(uld_type);
    let uld_l = spec.len_in * 2.54;
    let uld_w = spec.wid_in * 2.54;
    let uld_h = stacking_height(uld_type);

    if dims.h > uld_h || dims.l > uld_l || dims.w > uld_w {
        // the piece may still fit rotated 90° on the base
        if dims.h > uld_h || dims.w > uld_l || dims.l > uld_w {
            return 0;
        }
    }

    let base_a = (uld_l / dims.l).floor() * (uld_w / dims.w).floor();
    let base_b = (uld_l / dims.w).floor() * (uld_w / dims.l).floor();
    let best_base = base_a.max(base_b);
    let tiers = if dims.h > 0.0 { (uld_h / dims.h).floor() } else { 1.0 };
    (best_base * tiers) as u32
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cube_metre_boxes_tile_a_pallet() {
        // M pallet base is 317.5 x 243.8 cm with 244 cm of Q6 height:
        // 3 x 2 per tier, 2 tiers
        let dims = BoxDims { l: 100.0, w: 100.0, h: 100.0 };
        assert_eq!(max_pieces_per_uld(&dims, UldType::M), 12);
    }

    #[test]
    fn rotation_picks_the_better_base_orientation() {
        // 150x80: lengthwise 2x3=6, rotated 3x1=3 -> 6 per tier
        let dims = BoxDims { l: 150.0, w: 80.0, h: 200.0 };
        assert_eq!(max_pieces_per_uld(&dims, UldType::M), 6);
    }

    #[test]
    fn piece_wider_than_the_pallet_fits_zero() {
        let dims = BoxDims { l: 400.0, w: 250.0, h: 180.0 };
        assert_eq!(max_pieces_per_uld(&dims, UldType::M), 0);
    }

    #[test]
    fn lower_pallet_uses_its_own_height() {
        let dims = BoxDims { l: 100.0, w: 100.0, h: 163.0 };
        assert_eq!(max_pieces_per_uld(&dims, UldType::MLower), 6);
        // too tall for the 160 cm LD3 shell
        assert_eq!(max_pieces_per_uld(&dims, UldType::K), 0);
    }
}
