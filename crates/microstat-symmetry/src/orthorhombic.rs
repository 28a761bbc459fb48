//! Orthorhombic (mmm) Laue class.

use crate::{
    color_from_weights, crystal_direction, ops_from_table, BinLayout, CrystalStructure, LaueOps,
};
use microstat_math::{homochoric_magnitude, Quat, Vec3};
use std::f64::consts::FRAC_PI_2;

/// Identity and the three two-fold rotations as `(x, y, z, w)`.
const ORTHORHOMBIC_TABLE: [[f64; 4]; 4] = [
    [0.0, 0.0, 0.0, 1.0],
    [1.0, 0.0, 0.0, 0.0],
    [0.0, 1.0, 0.0, 0.0],
    [0.0, 0.0, 1.0, 0.0],
];

/// Largest disorientation angle between two orthorhombic orientations.
pub const MAX_DISORIENTATION: f64 = 2.094_395_102_393_195_5;

/// Orthorhombic symmetry operations.
#[derive(Debug, Clone)]
pub struct OrthoRhombicOps {
    ops: Vec<Quat>,
}

impl OrthoRhombicOps {
    /// Create the operator set.
    pub fn new() -> Self {
        Self {
            ops: ops_from_table(&ORTHORHOMBIC_TABLE),
        }
    }
}

impl Default for OrthoRhombicOps {
    fn default() -> Self {
        Self::new()
    }
}

impl LaueOps for OrthoRhombicOps {
    fn structure(&self) -> CrystalStructure {
        CrystalStructure::Orthorhombic
    }

    fn symmetry_ops(&self) -> &[Quat] {
        &self.ops
    }

    fn odf_layout(&self) -> BinLayout {
        BinLayout {
            extent: [homochoric_magnitude(FRAC_PI_2); 3],
            bins: [36; 3],
        }
    }

    fn mdf_layout(&self) -> BinLayout {
        BinLayout {
            extent: [homochoric_magnitude(MAX_DISORIENTATION); 3],
            bins: [36; 3],
        }
    }

    /// Colors [001], [100] and [010] red, green, blue.
    fn ipf_color(&self, q: &Quat, sample_dir: &Vec3) -> [u8; 3] {
        match crystal_direction(q, sample_dir) {
            Some(d) => color_from_weights(d.z.abs(), d.x.abs(), d.y.abs()),
            None => [0, 0, 0],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use microstat_math::Euler;

    #[test]
    fn test_half_turn_is_equivalent() {
        let ops = OrthoRhombicOps::new();
        let q1 = Euler::from_degrees(0.0, 0.0, 0.0).to_quat();
        let q2 = Euler::from_degrees(180.0, 0.0, 0.0).to_quat();
        assert!(ops.disorientation(&q1, &q2).angle < 1e-6);
    }

    #[test]
    fn test_quarter_turn_is_not_equivalent() {
        let ops = OrthoRhombicOps::new();
        let q1 = Euler::from_degrees(0.0, 0.0, 0.0).to_quat();
        let q2 = Euler::from_degrees(90.0, 0.0, 0.0).to_quat();
        assert_relative_eq!(ops.disorientation(&q1, &q2).degrees(), 90.0, epsilon = 1e-9);
    }

    #[test]
    fn test_ipf_axes() {
        let ops = OrthoRhombicOps::new();
        let q = Euler::from_degrees(0.0, 0.0, 0.0).to_quat();
        assert_eq!(ops.ipf_color(&q, &Vec3::y()), [0, 0, 255]);
    }
}
