#![warn(missing_docs)]

//! Crystal symmetry capability for the microstat characterization engine.
//!
//! Each Laue class is represented by a type implementing [`LaueOps`]. The
//! trait supplies the rotational symmetry operators of the class and the
//! layout of its orientation (ODF) and misorientation (MDF) histograms; the
//! orientation algorithms built on top of the operators (fundamental-zone
//! reduction, nearest equivalent, disorientation, binning) are provided
//! methods shared by every class.
//!
//! # Example
//!
//! ```ignore
//! use microstat_math::Euler;
//! use microstat_symmetry::{ops_for, CrystalStructure};
//!
//! let ops = ops_for(CrystalStructure::Cubic).unwrap();
//! let q1 = Euler::from_degrees(0.0, 0.0, 0.0).to_quat();
//! let q2 = Euler::from_degrees(95.0, 0.0, 0.0).to_quat();
//! let d = ops.disorientation(&q1, &q2);
//! assert!((d.degrees() - 5.0).abs() < 1e-9);
//! ```

pub mod cubic;
pub mod hexagonal;
pub mod orthorhombic;

pub use cubic::CubicOps;
pub use hexagonal::HexagonalOps;
pub use orthorhombic::OrthoRhombicOps;

use microstat_math::{
    crystal_to_sample, positive_hemisphere, quat_dot, quat_xyzw, sample_to_crystal, AxisAngle,
    Euler, Quat, Vec3,
};
use serde::{Deserialize, Serialize};
use std::fmt::Debug;
use std::sync::Arc;

/// Crystal structure (Laue class) of a phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CrystalStructure {
    /// Cubic high (m-3m).
    Cubic,
    /// Hexagonal high (6/mmm).
    Hexagonal,
    /// Orthorhombic (mmm).
    Orthorhombic,
    /// Structure not known; no symmetry operations are applied.
    Unknown,
}

impl std::fmt::Display for CrystalStructure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            CrystalStructure::Cubic => "cubic",
            CrystalStructure::Hexagonal => "hexagonal",
            CrystalStructure::Orthorhombic => "orthorhombic",
            CrystalStructure::Unknown => "unknown",
        };
        f.write_str(name)
    }
}

/// The symmetry capability for a known crystal structure.
///
/// Returns `None` for [`CrystalStructure::Unknown`].
pub fn ops_for(structure: CrystalStructure) -> Option<Arc<dyn LaueOps>> {
    match structure {
        CrystalStructure::Cubic => Some(Arc::new(CubicOps::new())),
        CrystalStructure::Hexagonal => Some(Arc::new(HexagonalOps::new())),
        CrystalStructure::Orthorhombic => Some(Arc::new(OrthoRhombicOps::new())),
        CrystalStructure::Unknown => None,
    }
}

/// Build a list of symmetry quaternions from `(x, y, z, w)` rows.
pub(crate) fn ops_from_table(table: &[[f64; 4]]) -> Vec<Quat> {
    table
        .iter()
        .map(|r| quat_xyzw(r[0], r[1], r[2], r[3]))
        .collect()
}

// =============================================================================
// Histogram layout
// =============================================================================

/// Three-dimensional histogram layout over homochoric space.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BinLayout {
    /// Half-width of the binned region along each axis.
    pub extent: [f64; 3],
    /// Number of bins along each axis.
    pub bins: [usize; 3],
}

impl BinLayout {
    /// Total number of bins.
    pub fn len(&self) -> usize {
        self.bins[0] * self.bins[1] * self.bins[2]
    }

    /// Whether the layout has no bins.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Bin for a point in `[-extent, extent]`, clamped to the edge bins.
    pub fn centered_index(&self, h: &Vec3) -> usize {
        let mut b = [0usize; 3];
        for k in 0..3 {
            let step = 2.0 * self.extent[k] / self.bins[k] as f64;
            b[k] = clamp_bin((h[k] + self.extent[k]) / step, self.bins[k]);
        }
        self.flatten(b)
    }

    /// Bin for the absolute components of a point, covering `[0, extent]`.
    pub fn origin_index(&self, h: &Vec3) -> usize {
        let mut b = [0usize; 3];
        for k in 0..3 {
            let step = self.extent[k] / self.bins[k] as f64;
            b[k] = clamp_bin(h[k].abs() / step, self.bins[k]);
        }
        self.flatten(b)
    }

    fn flatten(&self, b: [usize; 3]) -> usize {
        b[2] * self.bins[0] * self.bins[1] + b[1] * self.bins[0] + b[0]
    }
}

fn clamp_bin(v: f64, n: usize) -> usize {
    if v.is_nan() || v <= 0.0 {
        0
    } else {
        (v.floor() as usize).min(n - 1)
    }
}

// =============================================================================
// Laue class operations
// =============================================================================

/// Maximum Schmid factor over the slip systems of a crystal.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SchmidFactor {
    /// Largest Schmid factor.
    pub factor: f64,
    /// Index of the slip system achieving it.
    pub slip_system: usize,
}

/// Orientation operations of one Laue class.
///
/// Implementors provide the symmetry operators and histogram layouts; the
/// remaining methods work for any class. Symmetry acts on the crystal side
/// of an orientation: the equivalents of `q` are `q * s` for each operator
/// `s`.
pub trait LaueOps: Send + Sync + Debug {
    /// The crystal structure these operations describe.
    fn structure(&self) -> CrystalStructure;

    /// Rotational symmetry operators, identity first.
    fn symmetry_ops(&self) -> &[Quat];

    /// Layout of the orientation distribution histogram.
    fn odf_layout(&self) -> BinLayout;

    /// Layout of the misorientation distribution histogram.
    fn mdf_layout(&self) -> BinLayout;

    /// Inverse pole figure color of `sample_dir` seen from orientation `q`.
    fn ipf_color(&self, q: &Quat, sample_dir: &Vec3) -> [u8; 3];

    /// Maximum Schmid factor for a load along `load` (sample frame).
    ///
    /// Only classes with a defined slip system family return a value.
    fn schmid_factor(&self, _q: &Quat, _load: &Vec3) -> Option<SchmidFactor> {
        None
    }

    /// Number of slip systems known to [`LaueOps::slip_system`].
    fn slip_system_count(&self) -> usize {
        0
    }

    /// Unit plane normal and slip direction of slip system `index`, in
    /// crystal coordinates.
    fn slip_system(&self, _index: usize) -> Option<(Vec3, Vec3)> {
        None
    }

    /// Slip transmission factor `|n1.n2| |d1.d2|` from slip system
    /// `slip_system` of `q1` to the best aligned slip system of `q2`,
    /// compared in the sample frame.
    fn slip_transmission(&self, q1: &Quat, slip_system: usize, q2: &Quat) -> Option<f64> {
        let (n, d) = self.slip_system(slip_system)?;
        let n1 = crystal_to_sample(q1, &n);
        let d1 = crystal_to_sample(q1, &d);
        (0..self.slip_system_count())
            .filter_map(|i| self.slip_system(i))
            .map(|(n, d)| {
                let n2 = crystal_to_sample(q2, &n);
                let d2 = crystal_to_sample(q2, &d);
                n1.dot(&n2).abs() * d1.dot(&d2).abs()
            })
            .reduce(f64::max)
    }

    /// Quaternion for Bunge Euler angles.
    fn euler_to_quat(&self, e: &Euler) -> Quat {
        e.to_quat()
    }

    /// The symmetric equivalent of `q` with the smallest rotation angle,
    /// in the `w >= 0` hemisphere.
    fn reduce_to_fundamental_zone(&self, q: &Quat) -> Quat {
        let mut best = *q;
        let mut best_w = -1.0;
        for s in self.symmetry_ops() {
            let candidate = q * s;
            if candidate.w.abs() > best_w {
                best_w = candidate.w.abs();
                best = candidate;
            }
        }
        positive_hemisphere(&best)
    }

    /// The symmetric equivalent of `q` (with sign) closest to `reference`.
    ///
    /// `reference` does not need to be normalized.
    fn nearest_equivalent(&self, reference: &Quat, q: &Quat) -> Quat {
        let mut best = *q;
        let mut best_dot = -1.0;
        for s in self.symmetry_ops() {
            let candidate = q * s;
            let d = quat_dot(reference, &candidate);
            if d.abs() > best_dot {
                best_dot = d.abs();
                best = if d < 0.0 { -candidate } else { candidate };
            }
        }
        best
    }

    /// Minimum misorientation between `q1` and `q2` over all symmetric
    /// equivalents.
    fn disorientation(&self, q1: &Quat, q2: &Quat) -> AxisAngle {
        let delta = q1.conjugate() * q2;
        let mut best = delta;
        let mut best_w = -1.0;
        for s in self.symmetry_ops() {
            let candidate = delta * s;
            if candidate.w.abs() > best_w {
                best_w = candidate.w.abs();
                best = candidate;
            }
        }
        AxisAngle::from_quat(&best)
    }

    /// ODF bin of an orientation after fundamental-zone reduction.
    fn rodrigues_bin_index(&self, q: &Quat) -> usize {
        let reduced = self.reduce_to_fundamental_zone(q);
        let h = AxisAngle::from_quat(&reduced).homochoric();
        self.odf_layout().centered_index(&h)
    }

    /// MDF bin of a disorientation given in homochoric coordinates.
    fn misorientation_bin_index(&self, h: &Vec3) -> usize {
        self.mdf_layout().origin_index(h)
    }
}

/// Scale a color triple so its largest channel is 255.
pub(crate) fn color_from_weights(r: f64, g: f64, b: f64) -> [u8; 3] {
    let m = r.max(g).max(b);
    if m <= 0.0 || !m.is_finite() {
        return [0, 0, 0];
    }
    let scale = |v: f64| ((v.max(0.0) / m) * 255.0).round() as u8;
    [scale(r), scale(g), scale(b)]
}

/// Unit crystal-frame direction of a sample direction, or `None` if it is zero.
pub(crate) fn crystal_direction(q: &Quat, sample_dir: &Vec3) -> Option<Vec3> {
    let d = sample_to_crystal(q, sample_dir);
    let n = d.norm();
    if n > 0.0 {
        Some(d / n)
    } else {
        None
    }
}
