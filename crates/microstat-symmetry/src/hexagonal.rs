//! Hexagonal (6/mmm) Laue class.

use crate::{
    color_from_weights, crystal_direction, ops_from_table, BinLayout, CrystalStructure, LaueOps,
};
use microstat_math::{homochoric_magnitude, Quat, Vec3};
use std::f64::consts::{FRAC_PI_2, FRAC_PI_3, FRAC_PI_6};

const H: f64 = 0.866_025_403_784_438_6;

/// The 12 rotations of the hexagonal prism as `(x, y, z, w)`.
const HEXAGONAL_TABLE: [[f64; 4]; 12] = [
    [0.0, 0.0, 0.0, 1.0],
    [0.0, 0.0, 0.5, H],
    [0.0, 0.0, H, 0.5],
    [0.0, 0.0, 1.0, 0.0],
    [0.0, 0.0, H, -0.5],
    [0.0, 0.0, 0.5, -H],
    [1.0, 0.0, 0.0, 0.0],
    [H, 0.5, 0.0, 0.0],
    [0.5, H, 0.0, 0.0],
    [0.0, 1.0, 0.0, 0.0],
    [-0.5, H, 0.0, 0.0],
    [-H, 0.5, 0.0, 0.0],
];

/// Largest disorientation angle between two hexagonal orientations (93.8 deg).
pub const MAX_DISORIENTATION: f64 = 1.637_826;

/// Hexagonal symmetry operations.
#[derive(Debug, Clone)]
pub struct HexagonalOps {
    ops: Vec<Quat>,
}

impl HexagonalOps {
    /// Create the operator set.
    pub fn new() -> Self {
        Self {
            ops: ops_from_table(&HEXAGONAL_TABLE),
        }
    }
}

impl Default for HexagonalOps {
    fn default() -> Self {
        Self::new()
    }
}

impl LaueOps for HexagonalOps {
    fn structure(&self) -> CrystalStructure {
        CrystalStructure::Hexagonal
    }

    fn symmetry_ops(&self) -> &[Quat] {
        &self.ops
    }

    fn odf_layout(&self) -> BinLayout {
        let basal = homochoric_magnitude(FRAC_PI_2);
        BinLayout {
            extent: [basal, basal, homochoric_magnitude(FRAC_PI_6)],
            bins: [36, 36, 12],
        }
    }

    fn mdf_layout(&self) -> BinLayout {
        let e = homochoric_magnitude(MAX_DISORIENTATION);
        BinLayout {
            extent: [e; 3],
            bins: [36, 36, 12],
        }
    }

    /// Colors [0001], [2-1-10] and [10-10] red, green, blue.
    fn ipf_color(&self, q: &Quat, sample_dir: &Vec3) -> [u8; 3] {
        let Some(d) = crystal_direction(q, sample_dir) else {
            return [0, 0, 0];
        };
        let polar = d.z.abs().min(1.0).acos() / FRAC_PI_2;
        let mut azimuth = d.y.abs().atan2(d.x.abs()) % FRAC_PI_3;
        if azimuth > FRAC_PI_6 {
            azimuth = FRAC_PI_3 - azimuth;
        }
        let t = azimuth / FRAC_PI_6;
        color_from_weights(1.0 - polar, polar * (1.0 - t), polar * t)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use microstat_math::Euler;

    #[test]
    fn test_sixty_degrees_about_c_is_equivalent() {
        let ops = HexagonalOps::new();
        let q1 = Euler::from_degrees(0.0, 0.0, 0.0).to_quat();
        let q2 = Euler::from_degrees(60.0, 0.0, 0.0).to_quat();
        assert!(ops.disorientation(&q1, &q2).angle < 1e-6);
    }

    #[test]
    fn test_ninety_about_c_folds_to_thirty() {
        let ops = HexagonalOps::new();
        let q1 = Euler::from_degrees(0.0, 0.0, 0.0).to_quat();
        let q2 = Euler::from_degrees(90.0, 0.0, 0.0).to_quat();
        assert_relative_eq!(ops.disorientation(&q1, &q2).degrees(), 30.0, epsilon = 1e-9);
    }

    #[test]
    fn test_layouts() {
        let ops = HexagonalOps::new();
        assert_eq!(ops.odf_layout().len(), 36 * 36 * 12);
        assert_eq!(ops.mdf_layout().len(), 36 * 36 * 12);
        assert_eq!(ops.misorientation_bin_index(&Vec3::zeros()), 0);
    }

    #[test]
    fn test_ipf_c_axis_is_red() {
        let ops = HexagonalOps::new();
        let q = Euler::from_degrees(0.0, 0.0, 0.0).to_quat();
        assert_eq!(ops.ipf_color(&q, &Vec3::z()), [255, 0, 0]);
        assert_eq!(ops.ipf_color(&q, &Vec3::x()), [0, 255, 0]);
    }
}
