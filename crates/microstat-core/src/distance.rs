//! Distance from every grain voxel to the nearest boundary, triple line and
//! quadruple point.
//!
//! A voxel's coordination is the number of distinct foreign grain ids among
//! its face neighbors. Voxels with coordination of at least 1, 2 or 3 seed
//! the boundary, triple-line and quadruple-point channels. Each channel is a
//! multi-source breadth-first search over grain voxels that carries the
//! nearest seed along; the channels share nothing but the input and run in
//! parallel.

use crate::grid::Microstructure;
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;

/// Which channels to compute and how to measure distance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DistanceSettings {
    /// Report breadth-first step counts instead of physical distances.
    pub manhattan_only: bool,
    /// Compute distance to grain boundaries.
    pub boundaries: bool,
    /// Compute distance to triple lines.
    pub triple_lines: bool,
    /// Compute distance to quadruple points.
    pub quad_points: bool,
}

impl Default for DistanceSettings {
    fn default() -> Self {
        Self {
            manhattan_only: false,
            boundaries: true,
            triple_lines: true,
            quad_points: true,
        }
    }
}

/// Kind of feature a channel measures distance to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Feature {
    /// Grain boundary (two grains meet).
    Boundary,
    /// Triple line (three grains meet).
    TripleLine,
    /// Quadruple point (four grains meet).
    QuadPoint,
}

impl Feature {
    /// Minimum coordination of a seed voxel.
    pub fn min_coordination(&self) -> u8 {
        match self {
            Feature::Boundary => 1,
            Feature::TripleLine => 2,
            Feature::QuadPoint => 3,
        }
    }
}

/// One distance channel.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct DistanceMap {
    /// Distance per voxel; -1 where no seed was reached.
    pub distance: Vec<f64>,
    /// Voxel index of the nearest seed; -1 where none was reached.
    pub nearest: Vec<i64>,
}

/// The three distance channels, `None` when disabled.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct DistanceMaps {
    /// Distance to the nearest grain boundary.
    pub boundary: Option<DistanceMap>,
    /// Distance to the nearest triple line.
    pub triple_line: Option<DistanceMap>,
    /// Distance to the nearest quadruple point.
    pub quad_point: Option<DistanceMap>,
}

/// Number of distinct foreign grain ids among each voxel's face neighbors.
///
/// Unassigned voxels and unassigned neighbors count as 0.
pub fn coordination(volume: &Microstructure) -> Vec<u8> {
    let geometry = &volume.geometry;
    (0..volume.len())
        .map(|i| {
            let id = volume.grain(i);
            if id == 0 {
                return 0;
            }
            let mut seen = [0usize; 6];
            let mut n = 0usize;
            for j in geometry.face_neighbors(i).into_iter().flatten() {
                let other = volume.grain(j);
                if other != 0 && other != id && !seen[..n].contains(&other) {
                    seen[n] = other;
                    n += 1;
                }
            }
            n as u8
        })
        .collect()
}

/// Breadth-first distance from the seeds of one feature kind.
pub fn map_distance(
    volume: &Microstructure,
    coordination: &[u8],
    feature: Feature,
    manhattan_only: bool,
) -> DistanceMap {
    let geometry = &volume.geometry;
    let n = volume.len();
    let mut distance = vec![-1.0; n];
    let mut nearest = vec![-1i64; n];
    let mut steps = vec![0u32; n];
    let mut queue = VecDeque::new();

    let min = feature.min_coordination();
    for i in 0..n {
        if volume.grain(i) > 0 && coordination[i] >= min {
            distance[i] = 0.0;
            nearest[i] = i as i64;
            queue.push_back(i);
        }
    }

    while let Some(i) = queue.pop_front() {
        let seed = nearest[i];
        for j in geometry.face_neighbors(i).into_iter().flatten() {
            if volume.grain(j) == 0 || nearest[j] >= 0 {
                continue;
            }
            nearest[j] = seed;
            steps[j] = steps[i] + 1;
            distance[j] = if manhattan_only {
                steps[j] as f64
            } else {
                (geometry.position(j) - geometry.position(seed as usize)).norm()
            };
            queue.push_back(j);
        }
    }
    DistanceMap { distance, nearest }
}

/// Compute the enabled channels in parallel.
pub fn find_distances(volume: &Microstructure, settings: &DistanceSettings) -> DistanceMaps {
    let coord = coordination(volume);
    let run = |enabled: bool, feature: Feature| {
        enabled.then(|| map_distance(volume, &coord, feature, settings.manhattan_only))
    };
    let (boundary, (triple_line, quad_point)) = rayon::join(
        || run(settings.boundaries, Feature::Boundary),
        || {
            rayon::join(
                || run(settings.triple_lines, Feature::TripleLine),
                || run(settings.quad_points, Feature::QuadPoint),
            )
        },
    );
    log::info!("distance maps: {} voxels", volume.len());
    DistanceMaps {
        boundary,
        triple_line,
        quad_point,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grid::Geometry;

    #[test]
    fn test_coordination() {
        // 2x2 section with three grains
        let g = Geometry::new([2, 2, 1], [1.0; 3]);
        let m = Microstructure::single_phase(g, vec![1, 2, 3, 3]);
        assert_eq!(coordination(&m), vec![2, 2, 1, 1]);
    }

    #[test]
    fn test_boundary_distance_on_a_line() {
        let g = Geometry::new([6, 1, 1], [0.5, 1.0, 1.0]);
        let m = Microstructure::single_phase(g, vec![1, 1, 1, 2, 2, 2]);
        let maps = find_distances(&m, &DistanceSettings::default());
        let gb = maps.boundary.unwrap();
        assert_eq!(gb.nearest[0], 2);
        assert!((gb.distance[0] - 1.0).abs() < 1e-12);
        assert_eq!(gb.distance[2], 0.0);
        assert!((gb.distance[5] - 1.0).abs() < 1e-12);
        // no grain voxel touches two foreign grains
        let tj = maps.triple_line.unwrap();
        assert!(tj.distance.iter().all(|&d| d == -1.0));
        assert!(tj.nearest.iter().all(|&s| s == -1));
    }

    #[test]
    fn test_manhattan_steps() {
        let g = Geometry::new([4, 1, 1], [2.0, 1.0, 1.0]);
        let m = Microstructure::single_phase(g, vec![1, 1, 1, 2]);
        let settings = DistanceSettings {
            manhattan_only: true,
            ..Default::default()
        };
        let gb = find_distances(&m, &settings).boundary.unwrap();
        assert_eq!(gb.distance, vec![2.0, 1.0, 0.0, 0.0]);
    }

    #[test]
    fn test_unassigned_voxels_block_propagation() {
        let g = Geometry::new([5, 1, 1], [1.0; 3]);
        let m = Microstructure::single_phase(g, vec![1, 2, 0, 1, 1]);
        let gb = map_distance(&m, &coordination(&m), Feature::Boundary, true);
        assert_eq!(gb.distance[2], -1.0);
        assert_eq!(gb.distance[3], -1.0);
        assert_eq!(gb.distance[4], -1.0);
    }

    #[test]
    fn test_disabled_channels() {
        let g = Geometry::new([2, 1, 1], [1.0; 3]);
        let m = Microstructure::single_phase(g, vec![1, 2]);
        let settings = DistanceSettings {
            quad_points: false,
            ..Default::default()
        };
        let maps = find_distances(&m, &settings);
        assert!(maps.boundary.is_some());
        assert!(maps.quad_point.is_none());
    }
}
