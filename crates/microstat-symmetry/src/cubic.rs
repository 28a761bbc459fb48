//! Cubic (m-3m) Laue class.

use crate::{
    color_from_weights, crystal_direction, ops_from_table, BinLayout, CrystalStructure, LaueOps,
    SchmidFactor,
};
use microstat_math::{homochoric_magnitude, sample_to_crystal, Quat, Vec3};
use std::f64::consts::{FRAC_1_SQRT_2, FRAC_PI_4, SQRT_2};

const R: f64 = FRAC_1_SQRT_2;

/// The 24 rotations of the cube as `(x, y, z, w)`.
const CUBIC_TABLE: [[f64; 4]; 24] = [
    [0.0, 0.0, 0.0, 1.0],
    [1.0, 0.0, 0.0, 0.0],
    [0.0, 1.0, 0.0, 0.0],
    [0.0, 0.0, 1.0, 0.0],
    [R, 0.0, 0.0, R],
    [0.0, R, 0.0, R],
    [0.0, 0.0, R, R],
    [-R, 0.0, 0.0, R],
    [0.0, -R, 0.0, R],
    [0.0, 0.0, -R, R],
    [R, R, 0.0, 0.0],
    [-R, R, 0.0, 0.0],
    [0.0, R, R, 0.0],
    [0.0, -R, R, 0.0],
    [R, 0.0, R, 0.0],
    [-R, 0.0, R, 0.0],
    [0.5, 0.5, 0.5, 0.5],
    [-0.5, -0.5, -0.5, 0.5],
    [0.5, -0.5, 0.5, 0.5],
    [-0.5, 0.5, -0.5, 0.5],
    [-0.5, 0.5, 0.5, 0.5],
    [0.5, -0.5, -0.5, 0.5],
    [-0.5, -0.5, 0.5, 0.5],
    [0.5, 0.5, -0.5, 0.5],
];

/// {111} plane / <110> direction pairs of the 12 FCC slip systems, as
/// indices into the plane and direction cosine lists of
/// [`CubicOps::schmid_factor`].
const SLIP_SYSTEMS: [(usize, usize); 12] = [
    (0, 5),
    (0, 3),
    (0, 2),
    (1, 2),
    (1, 1),
    (1, 4),
    (2, 0),
    (2, 4),
    (2, 3),
    (3, 0),
    (3, 1),
    (3, 5),
];

/// {111} normals matching the plane cosines of [`CubicOps::schmid_factor`].
const SLIP_PLANES: [Vec3; 4] = [
    Vec3::new(1.0, 1.0, 1.0),
    Vec3::new(1.0, 1.0, -1.0),
    Vec3::new(1.0, -1.0, 1.0),
    Vec3::new(-1.0, 1.0, 1.0),
];

/// <110> directions matching the direction cosines of [`CubicOps::schmid_factor`].
const SLIP_DIRECTIONS: [Vec3; 6] = [
    Vec3::new(1.0, 1.0, 0.0),
    Vec3::new(1.0, 0.0, 1.0),
    Vec3::new(1.0, -1.0, 0.0),
    Vec3::new(1.0, 0.0, -1.0),
    Vec3::new(0.0, 1.0, 1.0),
    Vec3::new(0.0, 1.0, -1.0),
];

/// Largest disorientation angle between two cubic orientations (62.8 deg).
pub const MAX_DISORIENTATION: f64 = 1.096_056_815_240_625_6;

/// Cubic symmetry operations.
#[derive(Debug, Clone)]
pub struct CubicOps {
    ops: Vec<Quat>,
}

impl CubicOps {
    /// Create the operator set.
    pub fn new() -> Self {
        Self {
            ops: ops_from_table(&CUBIC_TABLE),
        }
    }
}

impl Default for CubicOps {
    fn default() -> Self {
        Self::new()
    }
}

impl LaueOps for CubicOps {
    fn structure(&self) -> CrystalStructure {
        CrystalStructure::Cubic
    }

    fn symmetry_ops(&self) -> &[Quat] {
        &self.ops
    }

    fn odf_layout(&self) -> BinLayout {
        let e = homochoric_magnitude(FRAC_PI_4);
        BinLayout {
            extent: [e; 3],
            bins: [18; 3],
        }
    }

    fn mdf_layout(&self) -> BinLayout {
        let e = homochoric_magnitude(MAX_DISORIENTATION);
        BinLayout {
            extent: [e; 3],
            bins: [18; 3],
        }
    }

    /// Colors the standard triangle [001]-[101]-[111] red, green, blue.
    fn ipf_color(&self, q: &Quat, sample_dir: &Vec3) -> [u8; 3] {
        let Some(d) = crystal_direction(q, sample_dir) else {
            return [0, 0, 0];
        };
        let mut c = [d.x.abs(), d.y.abs(), d.z.abs()];
        c.sort_by(|a, b| a.total_cmp(b));
        // c[2] >= c[1] >= c[0] maps onto z >= x >= y
        let (y, x, z) = (c[0], c[1], c[2]);
        color_from_weights(z - x, x - y, y)
    }

    fn schmid_factor(&self, q: &Quat, load: &Vec3) -> Option<SchmidFactor> {
        let l = sample_to_crystal(q, load);
        let mag = l.norm();
        if mag <= 0.0 {
            return None;
        }
        let (x, y, z) = (l.x, l.y, l.z);
        let sqrt_3 = 3.0_f64.sqrt();
        let planes =
            [x + y + z, x + y - z, x - y + z, -x + y + z].map(|v| v.abs() / (mag * sqrt_3));
        let directions =
            [x + y, x + z, x - y, x - z, y + z, y - z].map(|v| v.abs() / (mag * SQRT_2));

        let mut best = SchmidFactor {
            factor: -1.0,
            slip_system: 0,
        };
        for (i, &(p, d)) in SLIP_SYSTEMS.iter().enumerate() {
            let m = planes[p] * directions[d];
            if m > best.factor {
                best = SchmidFactor {
                    factor: m,
                    slip_system: i,
                };
            }
        }
        Some(best)
    }

    fn slip_system_count(&self) -> usize {
        SLIP_SYSTEMS.len()
    }

    fn slip_system(&self, index: usize) -> Option<(Vec3, Vec3)> {
        let &(p, d) = SLIP_SYSTEMS.get(index)?;
        Some((
            SLIP_PLANES[p].normalize(),
            SLIP_DIRECTIONS[d].normalize(),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use microstat_math::{quat_dot, rotation_angle, Euler};

    #[test]
    fn test_quarter_turn_is_equivalent() {
        let ops = CubicOps::new();
        let q1 = Euler::from_degrees(0.0, 0.0, 0.0).to_quat();
        let q2 = Euler::from_degrees(90.0, 0.0, 0.0).to_quat();
        assert!(ops.disorientation(&q1, &q2).angle < 1e-6);
    }

    #[test]
    fn test_small_rotation() {
        let ops = CubicOps::new();
        let q1 = Euler::from_degrees(0.0, 0.0, 0.0).to_quat();
        let q2 = Euler::from_degrees(10.0, 0.0, 0.0).to_quat();
        let d = ops.disorientation(&q1, &q2);
        assert_relative_eq!(d.degrees(), 10.0, epsilon = 1e-9);
        assert_relative_eq!(d.axis.z.abs(), 1.0, epsilon = 1e-9);
    }

    #[test]
    fn test_disorientation_folds_past_45() {
        let ops = CubicOps::new();
        let q1 = Euler::from_degrees(0.0, 0.0, 0.0).to_quat();
        let q2 = Euler::from_degrees(50.0, 0.0, 0.0).to_quat();
        assert_relative_eq!(ops.disorientation(&q1, &q2).degrees(), 40.0, epsilon = 1e-9);
    }

    #[test]
    fn test_disorientation_is_symmetric() {
        let ops = CubicOps::new();
        let q1 = Euler::from_degrees(20.0, 35.0, 70.0).to_quat();
        let q2 = Euler::from_degrees(140.0, 80.0, 10.0).to_quat();
        let a = ops.disorientation(&q1, &q2).angle;
        let b = ops.disorientation(&q2, &q1).angle;
        assert_relative_eq!(a, b, epsilon = 1e-9);
        assert!(a <= MAX_DISORIENTATION + 1e-6);
    }

    #[test]
    fn test_reduce_to_fundamental_zone() {
        let ops = CubicOps::new();
        let q = Euler::from_degrees(200.0, 100.0, 300.0).to_quat();
        let r = ops.reduce_to_fundamental_zone(&q);
        assert!(r.w >= 0.0);
        assert!(rotation_angle(&r) <= rotation_angle(&q) + 1e-12);
        // r is one of the symmetric equivalents of q
        let matches = ops
            .symmetry_ops()
            .iter()
            .any(|s| (quat_dot(&(q * s), &r).abs() - 1.0).abs() < 1e-9);
        assert!(matches);
    }

    #[test]
    fn test_equivalents_share_odf_bin() {
        let ops = CubicOps::new();
        let q = Euler::from_degrees(12.0, 33.0, 21.0).to_quat();
        let bin = ops.rodrigues_bin_index(&q);
        assert!(bin < ops.odf_layout().len());
        for s in ops.symmetry_ops() {
            assert_eq!(ops.rodrigues_bin_index(&(q * s)), bin);
        }
    }

    #[test]
    fn test_nearest_equivalent() {
        let ops = CubicOps::new();
        let reference = Euler::from_degrees(2.0, 0.0, 0.0).to_quat();
        let q = Euler::from_degrees(91.0, 0.0, 0.0).to_quat();
        let n = ops.nearest_equivalent(&reference, &q);
        // 91 deg about z is 1 deg about z after a quarter turn
        assert!(quat_dot(&reference, &n) > 0.9999);
    }

    #[test]
    fn test_schmid_factor_along_001() {
        let ops = CubicOps::new();
        let q = Euler::from_degrees(0.0, 0.0, 0.0).to_quat();
        let s = ops.schmid_factor(&q, &Vec3::z()).unwrap();
        assert_relative_eq!(s.factor, 1.0 / 6.0_f64.sqrt(), epsilon = 1e-12);
        assert_eq!(s.slip_system, 0);
    }

    #[test]
    fn test_ipf_corners() {
        let ops = CubicOps::new();
        let q = Euler::from_degrees(0.0, 0.0, 0.0).to_quat();
        assert_eq!(ops.ipf_color(&q, &Vec3::z()), [255, 0, 0]);
        assert_eq!(ops.ipf_color(&q, &Vec3::new(1.0, 0.0, 1.0)), [0, 255, 0]);
        assert_eq!(ops.ipf_color(&q, &Vec3::new(1.0, 1.0, 1.0)), [0, 0, 255]);
    }

    #[test]
    fn test_slip_systems_lie_in_their_planes() {
        let ops = CubicOps::new();
        assert_eq!(ops.slip_system_count(), 12);
        for i in 0..12 {
            let (n, d) = ops.slip_system(i).unwrap();
            assert_relative_eq!(n.dot(&d), 0.0, epsilon = 1e-12);
        }
        assert!(ops.slip_system(12).is_none());
    }

    #[test]
    fn test_slip_transmission() {
        let ops = CubicOps::new();
        let q = Euler::from_degrees(0.0, 0.0, 0.0).to_quat();
        assert_relative_eq!(ops.slip_transmission(&q, 3, &q).unwrap(), 1.0, epsilon = 1e-12);

        // a quarter turn is a symmetry of the cube, so some system still aligns
        let turned = Euler::from_degrees(90.0, 0.0, 0.0).to_quat();
        assert_relative_eq!(
            ops.slip_transmission(&q, 0, &turned).unwrap(),
            1.0,
            epsilon = 1e-12
        );

        let tilted = Euler::from_degrees(30.0, 20.0, 10.0).to_quat();
        let m = ops.slip_transmission(&q, 0, &tilted).unwrap();
        assert!(m > 0.0 && m < 1.0);
    }
}
