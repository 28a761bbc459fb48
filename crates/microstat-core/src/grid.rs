//! Voxel grid geometry and the caller-owned microstructure arrays.

use crate::error::{MicrostatError, Result};
use crate::phase::PhaseTable;
use microstat_math::{Euler, Quat, Vec3};
use serde::{Deserialize, Serialize};

/// Axis crossed by each entry of [`Geometry::face_neighbors`].
pub const FACE_AXES: [usize; 6] = [2, 1, 0, 0, 1, 2];

/// Grid dimensions and voxel spacing.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Geometry {
    /// Number of voxels along x, y, z.
    pub dims: [usize; 3],
    /// Voxel edge lengths along x, y, z.
    pub spacing: [f64; 3],
}

impl Geometry {
    /// Create a geometry.
    pub fn new(dims: [usize; 3], spacing: [f64; 3]) -> Self {
        Self { dims, spacing }
    }

    /// Total number of voxels.
    pub fn voxel_count(&self) -> usize {
        self.dims[0] * self.dims[1] * self.dims[2]
    }

    /// A single-plane grid is treated as a 2D section.
    pub fn is_2d(&self) -> bool {
        self.dims[2] == 1
    }

    /// Volume of one voxel (area of one pixel in 2D).
    pub fn voxel_volume(&self) -> f64 {
        let [rx, ry, rz] = self.spacing;
        if self.is_2d() {
            rx * ry
        } else {
            rx * ry * rz
        }
    }

    /// Linear index of `(x, y, z)`; x varies fastest.
    pub fn index(&self, x: usize, y: usize, z: usize) -> usize {
        (z * self.dims[1] + y) * self.dims[0] + x
    }

    /// Column, row and plane of a linear index.
    pub fn coords(&self, i: usize) -> [usize; 3] {
        let [nx, ny, _] = self.dims;
        [i % nx, (i / nx) % ny, i / (nx * ny)]
    }

    /// Physical position of a voxel (column * spacing, etc.).
    pub fn position(&self, i: usize) -> Vec3 {
        let [x, y, z] = self.coords(i);
        Vec3::new(
            x as f64 * self.spacing[0],
            y as f64 * self.spacing[1],
            z as f64 * self.spacing[2],
        )
    }

    /// Whether a voxel lies on the outer faces of the grid.
    ///
    /// In 2D only the x and y edges count.
    pub fn on_boundary(&self, i: usize) -> bool {
        let c = self.coords(i);
        let axes = if self.is_2d() { 2 } else { 3 };
        (0..axes).any(|k| c[k] == 0 || c[k] == self.dims[k] - 1)
    }

    /// The six face neighbors of a voxel in the order -z, -y, -x, +x, +y, +z.
    ///
    /// Directions that leave the grid are `None`.
    pub fn face_neighbors(&self, i: usize) -> [Option<usize>; 6] {
        let [x, y, z] = self.coords(i);
        let [nx, ny, nz] = self.dims;
        let plane = nx * ny;
        [
            (z > 0).then(|| i - plane),
            (y > 0).then(|| i - nx),
            (x > 0).then(|| i - 1),
            (x + 1 < nx).then(|| i + 1),
            (y + 1 < ny).then(|| i + nx),
            (z + 1 < nz).then(|| i + plane),
        ]
    }

    /// Voxels of the cube of half-width `radius` around `i`, clipped at the
    /// grid edges, excluding `i` itself.
    pub fn kernel(&self, i: usize, radius: usize) -> impl Iterator<Item = usize> + '_ {
        let c = self.coords(i);
        let lo = |k: usize| c[k].saturating_sub(radius);
        let hi = |k: usize| (c[k] + radius).min(self.dims[k] - 1);
        let (x0, x1, y0, y1, z0, z1) = (lo(0), hi(0), lo(1), hi(1), lo(2), hi(2));
        (z0..=z1)
            .flat_map(move |z| {
                (y0..=y1).flat_map(move |y| (x0..=x1).map(move |x| self.index(x, y, z)))
            })
            .filter(move |&j| j != i)
    }
}

/// The caller-owned voxel arrays.
///
/// Arrays are stored per voxel in grid order (x fastest, then y, then z).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Microstructure {
    /// Grid geometry.
    pub geometry: Geometry,
    /// Grain id per voxel; 0 marks an unassigned voxel.
    pub grain_ids: Vec<i32>,
    /// Phase id per voxel (1-based).
    pub phases: Vec<i32>,
    /// Bunge Euler angles per voxel, in radians.
    pub eulers: Vec<[f32; 3]>,
}

impl Microstructure {
    /// Assemble a microstructure from its arrays.
    pub fn new(
        geometry: Geometry,
        grain_ids: Vec<i32>,
        phases: Vec<i32>,
        eulers: Vec<[f32; 3]>,
    ) -> Self {
        Self {
            geometry,
            grain_ids,
            phases,
            eulers,
        }
    }

    /// A microstructure where every voxel is phase 1 with zero Euler angles.
    pub fn single_phase(geometry: Geometry, grain_ids: Vec<i32>) -> Self {
        let n = grain_ids.len();
        Self::new(geometry, grain_ids, vec![1; n], vec![[0.0; 3]; n])
    }

    /// Number of voxels.
    pub fn len(&self) -> usize {
        self.grain_ids.len()
    }

    /// Whether the microstructure has no voxels.
    pub fn is_empty(&self) -> bool {
        self.grain_ids.is_empty()
    }

    /// Grain id of voxel `i`; negative ids read as unassigned.
    pub fn grain(&self, i: usize) -> usize {
        self.grain_ids[i].max(0) as usize
    }

    /// Phase id of voxel `i`.
    pub fn phase(&self, i: usize) -> i32 {
        self.phases[i]
    }

    /// Euler angles of voxel `i`.
    pub fn euler(&self, i: usize) -> Euler {
        let [a, b, c] = self.eulers[i];
        Euler::new(a as f64, b as f64, c as f64)
    }

    /// Check the arrays against the grid and the phase table.
    ///
    /// Returns the largest grain id.
    pub fn validate(&self, phases: &PhaseTable) -> Result<usize> {
        let g = &self.geometry;
        if g.dims.iter().any(|&d| d == 0) {
            return Err(MicrostatError::InvalidDimensions(g.dims));
        }
        if g.spacing.iter().any(|&s| !(s.is_finite() && s > 0.0)) {
            return Err(MicrostatError::InvalidSpacing(g.spacing));
        }
        let expected = g.voxel_count();
        for (field, actual) in [
            ("grain_ids", self.grain_ids.len()),
            ("phases", self.phases.len()),
            ("eulers", self.eulers.len()),
        ] {
            if actual != expected {
                return Err(MicrostatError::SizeMismatch {
                    field,
                    expected,
                    actual,
                });
            }
        }

        let mut max_id = 0;
        for (voxel, &id) in self.grain_ids.iter().enumerate() {
            if id < 0 {
                return Err(MicrostatError::NegativeGrainId { voxel, id });
            }
            if id == 0 {
                continue;
            }
            let phase = self.phases[voxel];
            if phases.get(phase).is_none() {
                return Err(MicrostatError::UnknownPhase { voxel, phase });
            }
            max_id = max_id.max(id as usize);
        }
        if max_id == 0 {
            return Err(MicrostatError::NoGrains);
        }
        Ok(max_id)
    }
}

/// Per-voxel values written by the characterization passes.
#[derive(Debug, Clone, Default)]
pub struct VoxelFields {
    /// Symmetry-reduced orientation of each voxel.
    pub quats: Vec<Quat>,
    /// Kernel average misorientation (degrees).
    pub kernel_misorientation: Vec<f64>,
    /// Misorientation from the grain's average orientation (degrees).
    pub grain_misorientation: Vec<f64>,
    /// Local misorientation gradient (degrees).
    pub misorientation_gradient: Vec<f64>,
    /// Surface voxel flag.
    pub surface_voxel: Vec<bool>,
}
