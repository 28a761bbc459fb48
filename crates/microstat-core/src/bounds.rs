//! Shrunk bounding box used to exclude edge-biased grains from statistics.
//!
//! The box starts at the physical extent of the crop box. Every surface
//! grain whose centroid is not outside pulls the nearest face it does not
//! already touch in to its centroid, one face per grain, in grain id order.
//! Grains whose centroid ends up on or outside the box are flagged.

use crate::grain::GrainArena;
use crate::grid::{Geometry, Microstructure};
use crate::surface::CropBox;
use microstat_math::Vec3;
use serde::{Deserialize, Serialize};

/// Axis-aligned box in physical coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    /// Lower corner.
    pub min: [f64; 3],
    /// Upper corner.
    pub max: [f64; 3],
}

impl BoundingBox {
    /// Physical extent of a crop box.
    pub fn from_crop(crop: &CropBox, geometry: &Geometry) -> Self {
        let s = geometry.spacing;
        Self {
            min: [0, 1, 2].map(|k| crop.min[k] as f64 * s[k]),
            max: [0, 1, 2].map(|k| crop.max[k] as f64 * s[k]),
        }
    }

    /// Whether `p` lies on or outside any face, ignoring z for 2D grids.
    pub fn excludes(&self, p: &Vec3, is_2d: bool) -> bool {
        let axes = if is_2d { 2 } else { 3 };
        (0..axes).any(|k| p[k] <= self.min[k] || p[k] >= self.max[k])
    }
}

/// Shrink the box around the surface grains and flag the grains outside it.
///
/// Every voxel's surface flag is overwritten with its grain's outside flag;
/// unassigned voxels are always flagged. Requires centroids.
pub fn find_bounding_box_grains(
    volume: &Microstructure,
    grains: &mut GrainArena,
    crop: &CropBox,
    surface_voxel: &mut [bool],
) -> BoundingBox {
    let geometry = &volume.geometry;
    let is_2d = geometry.is_2d();
    let axes = if is_2d { 2 } else { 3 };
    let mut bbox = BoundingBox::from_crop(crop, geometry);

    for (_, grain) in grains.active() {
        if !grain.surface_grain {
            continue;
        }
        let c = grain.centroid;
        // inward distance to each face, lower faces first
        let mut nearest: Option<(usize, bool, f64)> = None;
        let mut inside = true;
        for k in 0..axes {
            for (upper, d) in [(false, c[k] - bbox.min[k]), (true, bbox.max[k] - c[k])] {
                if d < 0.0 {
                    inside = false;
                }
                if d > 0.0 && nearest.map_or(true, |(_, _, best)| d < best) {
                    nearest = Some((k, upper, d));
                }
            }
        }
        if !inside {
            continue;
        }
        if let Some((k, upper, _)) = nearest {
            if upper {
                bbox.max[k] = c[k];
            } else {
                bbox.min[k] = c[k];
            }
        }
    }

    let mut outside = 0usize;
    for (_, grain) in grains.active_mut() {
        grain.outside_bounding_box = bbox.excludes(&grain.centroid, is_2d);
        if grain.outside_bounding_box {
            outside += 1;
        }
    }
    for (i, flag) in surface_voxel.iter_mut().enumerate() {
        let id = volume.grain(i);
        *flag = id == 0 || grains[id].outside_bounding_box;
    }
    log::info!(
        "bounding box {:?}..{:?}: {} grains outside",
        bbox.min,
        bbox.max,
        outside
    );
    bbox
}
