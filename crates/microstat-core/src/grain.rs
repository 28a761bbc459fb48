//! Grain records and the id-indexed grain arena.

use crate::grid::Microstructure;
use crate::moments::InertiaTensor;
use microstat_math::{identity_quat, Euler, Mat3, Quat, Vec3};
use std::collections::BTreeMap;
use std::ops::{Index, IndexMut};

/// Everything the passes learn about one grain.
#[derive(Debug, Clone)]
pub struct Grain {
    /// Phase id of the grain.
    pub phase: i32,
    /// Whether any voxel carries this id.
    pub active: bool,
    /// Number of voxels.
    pub voxel_count: usize,
    /// Physical volume (area in 2D).
    pub volume: f64,
    /// Centroid in physical coordinates.
    pub centroid: Vec3,
    /// Diameter of the sphere (circle in 2D) of equal volume.
    pub equivalent_diameter: f64,
    /// Second-moment tensor about the centroid.
    pub inertia: InertiaTensor,
    /// Principal moments, largest first.
    pub principal_moments: [f64; 3],
    /// Ellipsoid semi-axis lengths `a >= b >= c`.
    pub radii: [f64; 3],
    /// Aspect ratio b/a.
    pub b_over_a: f64,
    /// Aspect ratio c/a.
    pub c_over_a: f64,
    /// Shape factor in `[0, 1]`.
    pub omega3: f64,
    /// Principal axis directions as columns, longest semi-axis first.
    pub axes: Mat3,
    /// Euler angles of the principal frame.
    pub axis_euler: Euler,
    /// Average orientation.
    pub avg_quat: Quat,
    /// Average orientation as Euler angles.
    pub avg_euler: Euler,
    /// Grain average misorientation (degrees).
    pub gam: f64,
    /// Inverse pole figure color.
    pub ipf_color: [u8; 3],
    /// Largest Schmid factor.
    pub schmid_factor: f64,
    /// Slip system with the largest Schmid factor.
    pub slip_system: usize,
    /// Neighboring grain id to shared boundary area.
    pub neighbors: BTreeMap<usize, f64>,
    /// Neighboring grain id to homochoric disorientation.
    pub misorientations: BTreeMap<usize, Vec3>,
    /// Grains whose centroid lies within 1, 2 and 3 equivalent radii.
    pub neighborhood: [u32; 3],
    /// Grain touches the grid boundary or unassigned voxels.
    pub surface_grain: bool,
    /// Centroid lies outside the shrunk bounding box.
    pub outside_bounding_box: bool,
}

impl Default for Grain {
    fn default() -> Self {
        Self {
            phase: 0,
            active: false,
            voxel_count: 0,
            volume: 0.0,
            centroid: Vec3::zeros(),
            equivalent_diameter: 0.0,
            inertia: InertiaTensor::default(),
            principal_moments: [0.0; 3],
            radii: [0.0; 3],
            b_over_a: 0.0,
            c_over_a: 0.0,
            omega3: 0.0,
            axes: Mat3::identity(),
            axis_euler: Euler::default(),
            avg_quat: identity_quat(),
            avg_euler: Euler::default(),
            gam: 0.0,
            ipf_color: [0; 3],
            schmid_factor: 0.0,
            slip_system: 0,
            neighbors: BTreeMap::new(),
            misorientations: BTreeMap::new(),
            neighborhood: [0; 3],
            surface_grain: false,
            outside_bounding_box: false,
        }
    }
}

impl Grain {
    /// Aspect ratio c/b, 0 when b/a is 0.
    pub fn c_over_b(&self) -> f64 {
        if self.b_over_a > 0.0 {
            self.c_over_a / self.b_over_a
        } else {
            0.0
        }
    }

    /// Number of distinct neighboring grains.
    pub fn neighbor_count(&self) -> usize {
        self.neighbors.len()
    }
}

/// Grains indexed by grain id.
///
/// Slot 0 always exists and stands for unassigned voxels; it is never
/// active and never counted.
#[derive(Debug, Clone)]
pub struct GrainArena {
    grains: Vec<Grain>,
}

impl Default for GrainArena {
    fn default() -> Self {
        Self::new()
    }
}

impl GrainArena {
    /// Arena holding only the unassigned slot.
    pub fn new() -> Self {
        Self {
            grains: vec![Grain::default()],
        }
    }

    /// Create a grain for every id present in `volume`.
    ///
    /// A grain takes the phase of the first voxel seen with its id.
    pub fn from_microstructure(volume: &Microstructure) -> Self {
        let mut arena = Self::new();
        for i in 0..volume.len() {
            let id = volume.grain(i);
            if id == 0 {
                continue;
            }
            let grain = arena.get_or_insert(id);
            if !grain.active {
                grain.active = true;
                grain.phase = volume.phase(i);
            }
        }
        arena
    }

    /// The grain with `id`, growing the arena if needed.
    pub fn get_or_insert(&mut self, id: usize) -> &mut Grain {
        if id >= self.grains.len() {
            self.grains.resize_with(id + 1, Grain::default);
        }
        &mut self.grains[id]
    }

    /// The grain with `id`, if the arena reaches that far.
    pub fn get(&self, id: usize) -> Option<&Grain> {
        self.grains.get(id)
    }

    /// Mutable access to the grain with `id`.
    pub fn get_mut(&mut self, id: usize) -> Option<&mut Grain> {
        self.grains.get_mut(id)
    }

    /// Number of slots including slot 0.
    pub fn slot_count(&self) -> usize {
        self.grains.len()
    }

    /// Active grains with their ids.
    pub fn active(&self) -> impl Iterator<Item = (usize, &Grain)> {
        self.grains
            .iter()
            .enumerate()
            .skip(1)
            .filter(|(_, g)| g.active)
    }

    /// Mutable iterator over active grains with their ids.
    pub fn active_mut(&mut self) -> impl Iterator<Item = (usize, &mut Grain)> {
        self.grains
            .iter_mut()
            .enumerate()
            .skip(1)
            .filter(|(_, g)| g.active)
    }

    /// Number of active grains.
    pub fn active_count(&self) -> usize {
        self.active().count()
    }
}

impl Index<usize> for GrainArena {
    type Output = Grain;

    fn index(&self, id: usize) -> &Grain {
        &self.grains[id]
    }
}

impl IndexMut<usize> for GrainArena {
    fn index_mut(&mut self, id: usize) -> &mut Grain {
        &mut self.grains[id]
    }
}
