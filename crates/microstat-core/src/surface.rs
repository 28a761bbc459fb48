//! Surface grain detection and the populated extent of the grid.

use crate::grain::GrainArena;
use crate::grid::Microstructure;
use serde::{Deserialize, Serialize};

/// Column/row/plane extent of all voxels with a positive grain id.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CropBox {
    /// Smallest x, y, z index.
    pub min: [usize; 3],
    /// Largest x, y, z index.
    pub max: [usize; 3],
}

/// Flag grains that touch the grid boundary or an unassigned voxel.
///
/// Returns the crop box of the assigned voxels. The grid must contain at
/// least one grain voxel; for an empty grid the box collapses to the origin.
pub fn find_surface_grains(volume: &Microstructure, grains: &mut GrainArena) -> CropBox {
    let geometry = &volume.geometry;
    let mut min = geometry.dims;
    let mut max = [0usize; 3];

    for (_, grain) in grains.active_mut() {
        grain.surface_grain = false;
    }

    for i in 0..volume.len() {
        let id = volume.grain(i);
        if id == 0 {
            continue;
        }
        let c = geometry.coords(i);
        for k in 0..3 {
            min[k] = min[k].min(c[k]);
            max[k] = max[k].max(c[k]);
        }

        let touches_unassigned = geometry
            .face_neighbors(i)
            .iter()
            .flatten()
            .any(|&j| volume.grain(j) == 0);
        if geometry.on_boundary(i) || touches_unassigned {
            grains[id].surface_grain = true;
        }
    }

    if min[0] > max[0] {
        min = [0; 3];
    }
    let crop = CropBox { min, max };
    log::debug!("crop box {:?}..{:?}", crop.min, crop.max);
    crop
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grid::Geometry;

    #[test]
    fn test_interior_grain_is_not_surface() {
        // 3x3x3 shell of grain 1 around a single voxel of grain 2
        let g = Geometry::new([3, 3, 3], [1.0; 3]);
        let mut ids = vec![1; 27];
        ids[g.index(1, 1, 1)] = 2;
        let m = Microstructure::single_phase(g, ids);
        let mut grains = GrainArena::from_microstructure(&m);
        let crop = find_surface_grains(&m, &mut grains);
        assert!(grains[1].surface_grain);
        assert!(!grains[2].surface_grain);
        assert_eq!(crop.min, [0, 0, 0]);
        assert_eq!(crop.max, [2, 2, 2]);
    }

    #[test]
    fn test_unassigned_neighbor_makes_surface() {
        let g = Geometry::new([3, 3, 3], [1.0; 3]);
        let mut ids = vec![1; 27];
        ids[g.index(1, 1, 1)] = 2;
        ids[g.index(1, 1, 2)] = 0;
        let m = Microstructure::single_phase(g, ids);
        let mut grains = GrainArena::from_microstructure(&m);
        find_surface_grains(&m, &mut grains);
        assert!(grains[2].surface_grain);
    }

    #[test]
    fn test_crop_box_ignores_unassigned() {
        let g = Geometry::new([4, 1, 1], [1.0; 3]);
        let m = Microstructure::single_phase(g, vec![0, 1, 1, 0]);
        let mut grains = GrainArena::from_microstructure(&m);
        let crop = find_surface_grains(&m, &mut grains);
        assert_eq!(crop.min[0], 1);
        assert_eq!(crop.max[0], 2);
    }
}
