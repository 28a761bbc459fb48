//! Grain centroids, volumes, second moments and best-fit ellipsoids.
//!
//! Pass 1 ([`find_centroids`]) counts voxels and averages their positions.
//! Pass 2 ([`find_moments`]) integrates the second-moment tensor about each
//! centroid, sampling every voxel at the 8 points offset by a quarter voxel
//! along each axis (4 points in 2D). The principal moments come from the
//! closed-form roots of the tensor's characteristic cubic ([`find_axes`]),
//! and the principal directions from a symmetric eigendecomposition
//! ([`find_axis_directions`]).

use crate::grain::GrainArena;
use crate::grid::Microstructure;
use crate::phase::PhaseSummary;
use microstat_math::{Euler, Mat3, Vec3};
use nalgebra::SymmetricEigen;
use serde::{Deserialize, Serialize};
use std::f64::consts::PI;

/// Second-moment (inertia) tensor of a grain about its centroid.
///
/// Off-diagonal terms carry the usual negative sign of products of inertia.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct InertiaTensor {
    /// Integral of y^2 + z^2.
    pub ixx: f64,
    /// Integral of x^2 + z^2.
    pub iyy: f64,
    /// Integral of x^2 + y^2.
    pub izz: f64,
    /// Minus the integral of xy.
    pub ixy: f64,
    /// Minus the integral of yz.
    pub iyz: f64,
    /// Minus the integral of xz.
    pub ixz: f64,
}

impl InertiaTensor {
    /// Tensor as a symmetric matrix.
    pub fn to_matrix(&self) -> Mat3 {
        Mat3::new(
            self.ixx, self.ixy, self.ixz, self.ixy, self.iyy, self.iyz, self.ixz, self.iyz,
            self.izz,
        )
    }
}

/// Principal moments and the matching ellipsoid of a tensor.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PrincipalShape {
    /// Principal moments, largest first.
    pub moments: [f64; 3],
    /// Ellipsoid semi-axes `a >= b >= c`; zero if degenerate.
    pub radii: [f64; 3],
    /// b/a, or 0 if degenerate.
    pub b_over_a: f64,
    /// c/a, or 0 if degenerate.
    pub c_over_a: f64,
}

// =============================================================================
// Pass 1: counts, volumes, centroids
// =============================================================================

/// Count voxels, compute centroid, volume and equivalent diameter per grain,
/// and collect per-phase volume totals.
///
/// Returns one summary per phase slot (index 0 unused).
pub fn find_centroids(
    volume: &Microstructure,
    grains: &mut GrainArena,
    phase_slots: usize,
) -> Vec<PhaseSummary> {
    let geometry = &volume.geometry;
    let mut sums = vec![Vec3::zeros(); grains.slot_count()];
    for (_, grain) in grains.active_mut() {
        grain.voxel_count = 0;
    }
    for i in 0..volume.len() {
        let id = volume.grain(i);
        if id == 0 {
            continue;
        }
        grains[id].voxel_count += 1;
        sums[id] += geometry.position(i);
    }

    let voxel_volume = geometry.voxel_volume();
    let is_2d = geometry.is_2d();
    let mut phases = vec![PhaseSummary::default(); phase_slots];
    for (id, grain) in grains.active_mut() {
        let n = grain.voxel_count as f64;
        grain.centroid = sums[id] / n;
        grain.volume = n * voxel_volume;
        grain.equivalent_diameter = equivalent_diameter(grain.volume, is_2d);

        let Some(summary) = usize::try_from(grain.phase)
            .ok()
            .and_then(|p| phases.get_mut(p))
        else {
            continue;
        };
        if summary.grain_count == 0 {
            summary.min_diameter = grain.equivalent_diameter;
            summary.max_diameter = grain.equivalent_diameter;
        } else {
            summary.min_diameter = summary.min_diameter.min(grain.equivalent_diameter);
            summary.max_diameter = summary.max_diameter.max(grain.equivalent_diameter);
        }
        summary.total_volume += grain.volume;
        summary.grain_count += 1;
    }

    let all: f64 = phases.iter().map(|p| p.total_volume).sum();
    if all > 0.0 {
        for summary in &mut phases {
            summary.fraction = summary.total_volume / all;
        }
    }
    log::info!(
        "centroids: {} grains, total volume {:.4}",
        grains.active_count(),
        all
    );
    phases
}

/// Diameter of the sphere (circle in 2D) with the given volume (area).
pub fn equivalent_diameter(volume: f64, is_2d: bool) -> f64 {
    if is_2d {
        2.0 * (volume / PI).sqrt()
    } else {
        2.0 * (0.75 * volume / PI).cbrt()
    }
}

// =============================================================================
// Pass 2: second moments
// =============================================================================

/// Integrate the second-moment tensor and shape factor of every grain.
///
/// Requires [`find_centroids`].
pub fn find_moments(volume: &Microstructure, grains: &mut GrainArena) {
    let geometry = &volume.geometry;
    let [rx, ry, rz] = geometry.spacing;
    let is_2d = geometry.is_2d();

    let offsets: Vec<Vec3> = if is_2d {
        [(-1.0, -1.0), (1.0, -1.0), (-1.0, 1.0), (1.0, 1.0)]
            .iter()
            .map(|&(sx, sy)| Vec3::new(sx * rx / 4.0, sy * ry / 4.0, 0.0))
            .collect()
    } else {
        let mut v = Vec::with_capacity(8);
        for sz in [-1.0, 1.0] {
            for sy in [-1.0, 1.0] {
                for sx in [-1.0, 1.0] {
                    v.push(Vec3::new(sx * rx / 4.0, sy * ry / 4.0, sz * rz / 4.0));
                }
            }
        }
        v
    };

    // u200, u020, u002, u110, u011, u101
    let mut acc = vec![[0.0f64; 6]; grains.slot_count()];
    for i in 0..volume.len() {
        let id = volume.grain(i);
        if id == 0 {
            continue;
        }
        let rel = geometry.position(i) - grains[id].centroid;
        let a = &mut acc[id];
        for off in &offsets {
            let p = rel + off;
            let (x, y, z) = (p.x, p.y, p.z);
            a[0] += y * y + z * z;
            a[1] += x * x + z * z;
            a[2] += x * x + y * y;
            a[3] += x * y;
            a[4] += y * z;
            a[5] += x * z;
        }
    }

    let weight = if is_2d {
        (rx / 2.0) * (ry / 2.0)
    } else {
        (rx / 2.0) * (ry / 2.0) * (rz / 2.0)
    };
    for (id, grain) in grains.active_mut() {
        let a = acc[id].map(|v| v * weight);
        grain.inertia = InertiaTensor {
            ixx: a[0],
            iyy: a[1],
            izz: a[2],
            ixy: -a[3],
            iyz: -a[4],
            ixz: -a[5],
        };
        grain.omega3 = if is_2d {
            0.0
        } else {
            omega3(grain.volume, &grain.inertia)
        };
    }
}

/// Shape factor comparing a grain's moments to those of a sphere of equal
/// volume.
///
/// Ellipsoids score 1; the result is clamped to `[0, 1]` and is 0 for a
/// zero volume or a singular moment tensor.
pub fn omega3(volume: f64, t: &InertiaTensor) -> f64 {
    if volume <= 0.0 {
        return 0.0;
    }
    let (u200, u020, u002) = (t.ixx, t.iyy, t.izz);
    let (u110, u011, u101) = (-t.ixy, -t.iyz, -t.ixz);
    // plain second moments of x, y and z
    let sx = (u020 + u002 - u200) / 2.0;
    let sy = (u200 + u002 - u020) / 2.0;
    let sz = (u200 + u020 - u002) / 2.0;
    let det = sx * sy * sz + 2.0 * u110 * u101 * u011
        - sx * u011 * u011
        - sy * u101 * u101
        - sz * u110 * u110;
    if det <= 0.0 {
        return 0.0;
    }
    let o3 = volume.powi(5) / det / (2000.0 * PI * PI / 9.0);
    if o3.is_finite() {
        o3.clamp(0.0, 1.0)
    } else {
        0.0
    }
}

// =============================================================================
// Principal moments and axes
// =============================================================================

/// Eigenvalues of the moment tensor, largest first, from the trigonometric
/// solution of its characteristic cubic.
pub fn principal_moments(t: &InertiaTensor) -> [f64; 3] {
    let (ixx, iyy, izz) = (t.ixx, t.iyy, t.izz);
    let (ixy, iyz, ixz) = (t.ixy, t.iyz, t.ixz);

    let b = -(ixx + iyy + izz);
    let c = ixx * izz + ixx * iyy + iyy * izz - ixz * ixz - ixy * ixy - iyz * iyz;
    let d = ixz * ixz * iyy + ixy * ixy * izz + iyz * iyz * ixx
        - ixx * iyy * izz
        - 2.0 * ixy * iyz * ixz;

    let f = (3.0 * c - b * b) / 3.0;
    let g = (2.0 * b * b * b - 9.0 * b * c + 27.0 * d) / 27.0;
    let h = g * g / 4.0 + f * f * f / 27.0;
    let r = (g * g / 4.0 - h).max(0.0).sqrt();
    let theta = if r > 0.0 {
        (-g / (2.0 * r)).clamp(-1.0, 1.0).acos()
    } else {
        0.0
    };
    let j = r.cbrt();
    let (s, k) = (theta / 3.0).sin_cos();
    let sqrt_3 = 3.0_f64.sqrt();
    let shift = -b / 3.0;

    let r1 = 2.0 * j * k + shift;
    let r2 = -j * (k - sqrt_3 * s) + shift;
    let r3 = -j * (k + sqrt_3 * s) + shift;
    [r1, r2, r3]
}

/// Semi-axes of the uniform ellipsoid with the given principal moments
/// (largest first), or `None` when they do not describe one.
pub fn ellipsoid_radii(moments: [f64; 3]) -> Option<[f64; 3]> {
    let [i1, i2, i3] = moments.map(|m| 15.0 * m / (4.0 * PI));
    let a2 = (i1 + i2 - i3) / 2.0;
    let b2 = (i1 + i3 - i2) / 2.0;
    let c2 = (i2 + i3 - i1) / 2.0;
    if a2 <= 0.0 || b2 <= 0.0 || c2 <= 0.0 {
        return None;
    }
    let a = (a2.powi(4) / (b2 * c2)).powf(0.1);
    let b = (b2 / a2).sqrt() * a;
    let c = a2 / (a.powi(3) * b);
    Some([a, b, c])
}

/// Principal moments, ellipsoid and aspect ratios of a 3D moment tensor.
pub fn principal_shape(t: &InertiaTensor) -> PrincipalShape {
    let moments = principal_moments(t);
    match ellipsoid_radii(moments) {
        Some(radii) if radii[0] > 0.0 => PrincipalShape {
            moments,
            radii,
            b_over_a: (radii[1] / radii[0]).clamp(0.0, 1.0),
            c_over_a: (radii[2] / radii[0]).clamp(0.0, 1.0),
        },
        _ => PrincipalShape {
            moments,
            radii: [0.0; 3],
            b_over_a: 0.0,
            c_over_a: 0.0,
        },
    }
}

/// Principal moments, ellipse and aspect ratio of a 2D moment tensor.
///
/// Only `ixx`, `iyy` and `ixy` are read; c/a is always 0.
pub fn principal_shape_2d(t: &InertiaTensor) -> PrincipalShape {
    let mean = (t.ixx + t.iyy) / 2.0;
    let spread = (((t.ixx - t.iyy) / 2.0).powi(2) + t.ixy * t.ixy).sqrt();
    let (l1, l2) = (mean + spread, mean - spread);
    let moments = [l1, l2, 0.0];
    if l1 <= 0.0 || l2 <= 0.0 {
        return PrincipalShape {
            moments,
            radii: [0.0; 3],
            b_over_a: 0.0,
            c_over_a: 0.0,
        };
    }
    let scale = (4.0 / PI).powf(0.25);
    let a = scale * (l1.powi(3) / l2).powf(0.125);
    let b = scale * (l2.powi(3) / l1).powf(0.125);
    PrincipalShape {
        moments,
        radii: [a, b, 0.0],
        b_over_a: (b / a).clamp(0.0, 1.0),
        c_over_a: 0.0,
    }
}

/// Fill principal moments, radii and aspect ratios of every grain.
///
/// Requires [`find_moments`].
pub fn find_axes(grains: &mut GrainArena, is_2d: bool) {
    for (_, grain) in grains.active_mut() {
        let shape = if is_2d {
            principal_shape_2d(&grain.inertia)
        } else {
            principal_shape(&grain.inertia)
        };
        grain.principal_moments = shape.moments;
        grain.radii = shape.radii;
        grain.b_over_a = shape.b_over_a;
        grain.c_over_a = shape.c_over_a;
    }
}

/// Principal directions of a moment tensor as a right-handed frame.
///
/// Columns are ordered by increasing moment, so the first column runs along
/// the longest semi-axis.
pub fn principal_frame(t: &InertiaTensor) -> Mat3 {
    let eig = SymmetricEigen::new(t.to_matrix());
    let mut order = [0usize, 1, 2];
    order.sort_by(|&a, &b| eig.eigenvalues[a].total_cmp(&eig.eigenvalues[b]));
    let n1: Vec3 = eig.eigenvectors.column(order[0]).into_owned();
    let n2: Vec3 = eig.eigenvectors.column(order[1]).into_owned();
    let n3 = n1.cross(&n2);
    if n3.norm() < 1e-12 {
        return Mat3::identity();
    }
    Mat3::from_columns(&[n1, n2, n3])
}

/// Fill principal directions and their Euler angles for every grain.
///
/// Requires [`find_moments`].
pub fn find_axis_directions(grains: &mut GrainArena) {
    for (_, grain) in grains.active_mut() {
        grain.axes = principal_frame(&grain.inertia);
        grain.axis_euler = Euler::from_matrix(&grain.axes);
    }
}
