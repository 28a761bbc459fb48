#![warn(missing_docs)]

//! Orientation math for the microstat characterization engine.
//!
//! Thin wrappers around nalgebra providing the domain types used to
//! describe crystal orientations: Bunge Euler angles, unit quaternions,
//! axis-angle pairs, and homochoric coordinates, plus tolerance constants.
//!
//! Quaternions describe the active rotation that carries crystal axes onto
//! sample axes. The matching Bunge matrix [`Euler::to_matrix`] is the
//! passive (sample to crystal) matrix, i.e. the transpose of that rotation.

use nalgebra::{Matrix3, Quaternion, UnitQuaternion, Vector3};
use serde::{Deserialize, Serialize};
use std::f64::consts::TAU;

/// A vector in 3D space.
pub type Vec3 = Vector3<f64>;

/// A 3x3 matrix.
pub type Mat3 = Matrix3<f64>;

/// An orientation quaternion, stored as `(w, i, j, k)` by nalgebra.
pub type Quat = Quaternion<f64>;

/// Build a quaternion from `(x, y, z, w)` components.
pub fn quat_xyzw(x: f64, y: f64, z: f64, w: f64) -> Quat {
    Quat::new(w, x, y, z)
}

/// The identity orientation.
pub fn identity_quat() -> Quat {
    Quat::identity()
}

/// Normalize `q`, falling back to the identity for a zero quaternion.
pub fn normalize_or_identity(q: &Quat) -> Quat {
    let n = q.norm();
    if n > Tolerance::DEFAULT.linear {
        *q / n
    } else {
        Quat::identity()
    }
}

/// Flip `q` into the `w >= 0` hemisphere.
pub fn positive_hemisphere(q: &Quat) -> Quat {
    if q.w < 0.0 {
        -*q
    } else {
        *q
    }
}

/// Rotation angle (radians, in `[0, pi]`) of a unit quaternion.
pub fn rotation_angle(q: &Quat) -> f64 {
    2.0 * q.w.abs().min(1.0).acos()
}

/// 4D dot product of two quaternions.
pub fn quat_dot(a: &Quat, b: &Quat) -> f64 {
    a.coords.dot(&b.coords)
}

/// Express a sample-frame direction in the crystal frame of orientation `q`.
pub fn sample_to_crystal(q: &Quat, v: &Vec3) -> Vec3 {
    UnitQuaternion::new_normalize(*q).inverse_transform_vector(v)
}

/// Express a crystal-frame direction in the sample frame of orientation `q`.
pub fn crystal_to_sample(q: &Quat, v: &Vec3) -> Vec3 {
    UnitQuaternion::new_normalize(*q).transform_vector(v)
}

/// Bunge Euler angles `(phi1, Phi, phi2)` in radians.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Euler {
    /// First rotation about Z.
    pub phi1: f64,
    /// Rotation about the rotated X axis.
    pub phi: f64,
    /// Second rotation about Z.
    pub phi2: f64,
}

impl Euler {
    /// Create from three angles in radians.
    pub fn new(phi1: f64, phi: f64, phi2: f64) -> Self {
        Self { phi1, phi, phi2 }
    }

    /// Create from three angles in degrees.
    pub fn from_degrees(phi1: f64, phi: f64, phi2: f64) -> Self {
        Self::new(phi1.to_radians(), phi.to_radians(), phi2.to_radians())
    }

    /// The angles as an array.
    pub fn to_array(&self) -> [f64; 3] {
        [self.phi1, self.phi, self.phi2]
    }

    /// Quaternion for this orientation.
    pub fn to_quat(&self) -> Quat {
        let (s, c) = (self.phi / 2.0).sin_cos();
        let sum = (self.phi1 + self.phi2) / 2.0;
        let diff = (self.phi1 - self.phi2) / 2.0;
        quat_xyzw(s * diff.cos(), s * diff.sin(), c * sum.sin(), c * sum.cos())
    }

    /// Recover Euler angles from a unit quaternion.
    ///
    /// `phi1` and `phi2` are wrapped to `[0, 2pi)`. When `Phi` is 0 or pi
    /// only one of them is determined and `phi2` is set to zero.
    pub fn from_quat(q: &Quat) -> Self {
        let tol = Tolerance::DEFAULT.angular;
        let (x, y, z, w) = (q.i, q.j, q.k, q.w);
        let axial = (z * z + w * w).sqrt();
        let planar = (x * x + y * y).sqrt();
        let phi = 2.0 * planar.atan2(axial);
        let (phi1, phi2) = if planar < tol {
            (2.0 * z.atan2(w), 0.0)
        } else if axial < tol {
            (2.0 * y.atan2(x), 0.0)
        } else {
            let sum = z.atan2(w);
            let diff = y.atan2(x);
            (sum + diff, sum - diff)
        };
        Self {
            phi1: wrap_angle(phi1),
            phi,
            phi2: wrap_angle(phi2),
        }
    }

    /// Passive (sample to crystal) orientation matrix.
    pub fn to_matrix(&self) -> Mat3 {
        let (s1, c1) = self.phi1.sin_cos();
        let (s, c) = self.phi.sin_cos();
        let (s2, c2) = self.phi2.sin_cos();
        Mat3::new(
            c1 * c2 - s1 * s2 * c,
            s1 * c2 + c1 * s2 * c,
            s2 * s,
            -c1 * s2 - s1 * c2 * c,
            -s1 * s2 + c1 * c2 * c,
            c2 * s,
            s1 * s,
            -c1 * s,
            c,
        )
    }

    /// Recover Euler angles from a passive orientation matrix.
    pub fn from_matrix(g: &Mat3) -> Self {
        let phi = g[(2, 2)].clamp(-1.0, 1.0).acos();
        let (phi1, phi2) = if phi.sin().abs() > Tolerance::DEFAULT.angular {
            (g[(2, 0)].atan2(-g[(2, 1)]), g[(0, 2)].atan2(g[(1, 2)]))
        } else {
            (g[(0, 1)].atan2(g[(0, 0)]), 0.0)
        };
        Self {
            phi1: wrap_angle(phi1),
            phi,
            phi2: wrap_angle(phi2),
        }
    }
}

/// Wrap an angle into `[0, 2pi)`.
pub fn wrap_angle(a: f64) -> f64 {
    let w = a.rem_euclid(TAU);
    if w >= TAU {
        0.0
    } else {
        w
    }
}

/// A rotation expressed as a unit axis and an angle in radians.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AxisAngle {
    /// Unit rotation axis.
    pub axis: Vec3,
    /// Rotation angle in radians, in `[0, pi]`.
    pub angle: f64,
}

impl AxisAngle {
    /// Zero rotation; the axis defaults to Z.
    pub fn identity() -> Self {
        Self {
            axis: Vec3::z(),
            angle: 0.0,
        }
    }

    /// Axis-angle pair of a unit quaternion, taken in the `w >= 0` hemisphere.
    pub fn from_quat(q: &Quat) -> Self {
        let q = positive_hemisphere(q);
        let angle = 2.0 * q.w.clamp(-1.0, 1.0).acos();
        let v = Vec3::new(q.i, q.j, q.k);
        let n = v.norm();
        if n > Tolerance::DEFAULT.linear && angle > 0.0 {
            Self { axis: v / n, angle }
        } else {
            Self::identity()
        }
    }

    /// Angle in degrees.
    pub fn degrees(&self) -> f64 {
        self.angle.to_degrees()
    }

    /// Homochoric coordinates of this rotation.
    pub fn homochoric(&self) -> Vec3 {
        self.axis * homochoric_magnitude(self.angle)
    }
}

/// Length of the homochoric vector for a rotation angle `w` (radians).
pub fn homochoric_magnitude(w: f64) -> f64 {
    (0.75 * (w - w.sin())).cbrt()
}

/// Tolerance constants for orientation comparisons.
#[derive(Debug, Clone, Copy)]
pub struct Tolerance {
    /// Tolerance on vector and quaternion norms.
    pub linear: f64,
    /// Angular tolerance in radians.
    pub angular: f64,
}

impl Tolerance {
    /// Default tolerances (1e-12 on norms, 1e-9 rad angular).
    pub const DEFAULT: Self = Self {
        linear: 1e-12,
        angular: 1e-9,
    };

    /// Check if a scalar is effectively zero.
    pub fn is_zero(&self, d: f64) -> bool {
        d.abs() < self.linear
    }
}

impl Default for Tolerance {
    fn default() -> Self {
        Self::DEFAULT
    }
}
