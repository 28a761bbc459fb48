//! Grain adjacency, shared boundary area, and surface voxel flags.
//!
//! One scan over the grid visits the six face neighbors of every grain
//! voxel. Each face shared by two different positive grain ids adds one face
//! area to both grains' neighbor entries, so the relation is symmetric with a
//! single area per pair.

use crate::grain::GrainArena;
use crate::grid::{Geometry, Microstructure, FACE_AXES};
use serde::{Deserialize, Serialize};

/// How the area of one shared voxel face is computed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FaceAreaConvention {
    /// Every face counts `spacing.x * spacing.y`, whichever direction it
    /// faces. Matches historical neighbor statistics.
    #[default]
    XyPlane,
    /// Each face counts the area perpendicular to the axis it crosses.
    PerDirection,
}

impl FaceAreaConvention {
    /// Area of a face crossed along `axis`.
    pub fn face_area(&self, geometry: &Geometry, axis: usize) -> f64 {
        let [rx, ry, rz] = geometry.spacing;
        match self {
            FaceAreaConvention::XyPlane => rx * ry,
            FaceAreaConvention::PerDirection if geometry.is_2d() => match axis {
                0 => ry,
                _ => rx,
            },
            FaceAreaConvention::PerDirection => match axis {
                0 => ry * rz,
                1 => rx * rz,
                _ => rx * ry,
            },
        }
    }
}

/// Output of [`find_neighbors`] besides the per-grain neighbor lists.
#[derive(Debug, Clone, Default)]
pub struct NeighborGraph {
    /// Boundary area attributed to each phase, indexed by phase id.
    pub total_boundary_area: Vec<f64>,
    /// Voxels with no face neighbor in a different grain.
    pub surface_voxel: Vec<bool>,
}

/// Whether the boundary between `lo < hi` counts toward the phase total of
/// `lo`.
///
/// Only pairs within one phase count, and of those every pair except a
/// surface lower grain next to an interior higher grain.
pub fn counts_toward_total(grains: &GrainArena, lo: usize, hi: usize) -> bool {
    grains[lo].phase == grains[hi].phase
        && (!grains[lo].surface_grain || grains[hi].surface_grain)
}

/// Build neighbor lists with shared areas and flag surface voxels.
///
/// Rebuilds every active grain's neighbor list from scratch, so running it
/// twice gives the same result. `phase_slots` is the length of the per-phase
/// totals (phase table size + 1).
pub fn find_neighbors(
    volume: &Microstructure,
    grains: &mut GrainArena,
    convention: FaceAreaConvention,
    phase_slots: usize,
) -> NeighborGraph {
    let geometry = &volume.geometry;
    let face_areas: [f64; 3] = [0, 1, 2].map(|axis| convention.face_area(geometry, axis));

    for (_, grain) in grains.active_mut() {
        grain.neighbors.clear();
    }

    let mut surface_voxel = vec![true; volume.len()];
    for (i, flag) in surface_voxel.iter_mut().enumerate() {
        let id = volume.grain(i);
        if id == 0 {
            continue;
        }
        let mut foreign = 0;
        for (dir, neighbor) in geometry.face_neighbors(i).into_iter().enumerate() {
            let Some(j) = neighbor else { continue };
            let other = volume.grain(j);
            if other == 0 || other == id {
                continue;
            }
            foreign += 1;
            *grains[id].neighbors.entry(other).or_insert(0.0) += face_areas[FACE_AXES[dir]];
        }
        *flag = foreign == 0;
    }

    let grains: &GrainArena = grains;
    let mut total_boundary_area = vec![0.0; phase_slots];
    for (lo, grain) in grains.active() {
        let Ok(phase) = usize::try_from(grain.phase) else {
            continue;
        };
        if phase >= phase_slots {
            continue;
        }
        for (&hi, &area) in grain.neighbors.range(lo + 1..) {
            if counts_toward_total(grains, lo, hi) {
                total_boundary_area[phase] += area;
            }
        }
    }

    let pairs: usize = grains.active().map(|(_, g)| g.neighbors.len()).sum::<usize>() / 2;
    log::info!("neighbor graph: {} grain pairs", pairs);
    for (phase, area) in total_boundary_area.iter().enumerate().skip(1) {
        log::debug!("phase {} boundary area {:.4}", phase, area);
    }

    NeighborGraph {
        total_boundary_area,
        surface_voxel,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::surface::find_surface_grains;

    fn two_layer() -> Microstructure {
        let g = Geometry::new([2, 2, 2], [1.0, 2.0, 3.0]);
        Microstructure::single_phase(g, vec![1, 1, 1, 1, 2, 2, 2, 2])
    }

    #[test]
    fn test_two_layers_share_one_boundary() {
        let m = two_layer();
        let mut grains = GrainArena::from_microstructure(&m);
        find_surface_grains(&m, &mut grains);
        let graph = find_neighbors(&m, &mut grains, FaceAreaConvention::XyPlane, 2);

        // 4 faces of 1.0 * 2.0
        assert_eq!(grains[1].neighbors.get(&2), Some(&8.0));
        assert_eq!(grains[2].neighbors.get(&1), Some(&8.0));
        assert_eq!(grains[1].neighbor_count(), 1);
        assert!((graph.total_boundary_area[1] - 8.0).abs() < 1e-12);
        // every voxel touches the other layer
        assert!(graph.surface_voxel.iter().all(|&s| !s));
    }

    #[test]
    fn test_per_direction_area() {
        let g = Geometry::new([2, 1, 1], [1.0, 2.0, 3.0]);
        let m = Microstructure::single_phase(g, vec![1, 2]);
        let mut grains = GrainArena::from_microstructure(&m);
        find_neighbors(&m, &mut grains, FaceAreaConvention::PerDirection, 2);
        // 2D grid: an x-crossing face is one y edge long
        assert_eq!(grains[1].neighbors.get(&2), Some(&2.0));

        let g3 = Geometry::new([2, 1, 2], [1.0, 2.0, 3.0]);
        let m3 = Microstructure::single_phase(g3, vec![1, 2, 1, 2]);
        let mut grains3 = GrainArena::from_microstructure(&m3);
        find_neighbors(&m3, &mut grains3, FaceAreaConvention::PerDirection, 2);
        assert_eq!(grains3[1].neighbors.get(&2), Some(&12.0));
    }

    #[test]
    fn test_idempotent() {
        let m = two_layer();
        let mut grains = GrainArena::from_microstructure(&m);
        find_surface_grains(&m, &mut grains);
        let first = find_neighbors(&m, &mut grains, FaceAreaConvention::XyPlane, 2);
        let lists = grains[1].neighbors.clone();
        let second = find_neighbors(&m, &mut grains, FaceAreaConvention::XyPlane, 2);
        assert_eq!(grains[1].neighbors, lists);
        assert_eq!(first.total_boundary_area, second.total_boundary_area);
    }

    #[test]
    fn test_unassigned_voxels_are_not_neighbors() {
        let g = Geometry::new([3, 1, 1], [1.0; 3]);
        let m = Microstructure::single_phase(g, vec![1, 0, 2]);
        let mut grains = GrainArena::from_microstructure(&m);
        let graph = find_neighbors(&m, &mut grains, FaceAreaConvention::XyPlane, 2);
        assert!(grains[1].neighbors.is_empty());
        assert!(graph.surface_voxel[0]);
    }

    #[test]
    fn test_surface_pair_attribution() {
        let mut grains = GrainArena::new();
        grains.get_or_insert(1).surface_grain = true;
        grains.get_or_insert(2).surface_grain = false;
        grains.get_or_insert(3).surface_grain = true;
        assert!(!counts_toward_total(&grains, 1, 2));
        assert!(counts_toward_total(&grains, 2, 3));
        assert!(counts_toward_total(&grains, 1, 3));
    }

    #[test]
    fn test_cross_phase_boundary_not_totaled() {
        let g = Geometry::new([3, 1, 1], [1.0; 3]);
        let m = Microstructure::new(g, vec![1, 2, 3], vec![1, 1, 2], vec![[0.0; 3]; 3]);
        let mut grains = GrainArena::from_microstructure(&m);
        let graph = find_neighbors(&m, &mut grains, FaceAreaConvention::XyPlane, 3);

        assert_eq!(grains[2].neighbors.get(&3), Some(&1.0));
        assert!(!counts_toward_total(&grains, 2, 3));
        assert!((graph.total_boundary_area[1] - 1.0).abs() < 1e-12);
        assert_eq!(graph.total_boundary_area[2], 0.0);
    }
}
