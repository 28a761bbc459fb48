//! Kernel, grain-average and grain-pair misorientation.
//!
//! All angles are disorientations in degrees. Voxels with grain id 0 get 0
//! for every per-voxel value.

use crate::error::{MicrostatError, Result};
use crate::grain::GrainArena;
use crate::grid::Microstructure;
use crate::neighbors::counts_toward_total;
use crate::phase::PhaseTable;
use microstat_math::{AxisAngle, Quat, Vec3};
use microstat_symmetry::LaueOps;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

/// Homochoric coordinates stored for a pair of grains in different phases.
pub const CROSS_PHASE_SENTINEL: [f64; 3] = [-100.0, -100.0, -100.0];

/// Kernel and cutoff parameters.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MisorientationSettings {
    /// Half-width of the cubic kernel in voxels (1 gives 3x3x3).
    pub kernel_radius: usize,
    /// Neighbors at or above this disorientation (degrees) are left out of
    /// the kernel average.
    pub cutoff_degrees: f64,
}

impl Default for MisorientationSettings {
    fn default() -> Self {
        Self {
            kernel_radius: 1,
            cutoff_degrees: 5.0,
        }
    }
}

impl MisorientationSettings {
    /// Validate settings.
    pub fn validate(&self) -> Result<()> {
        if self.kernel_radius == 0 {
            return Err(MicrostatError::InvalidSettings(
                "kernel_radius must be at least 1".into(),
            ));
        }
        if !(self.cutoff_degrees.is_finite() && self.cutoff_degrees > 0.0) {
            return Err(MicrostatError::InvalidSettings(
                "cutoff_degrees must be positive".into(),
            ));
        }
        Ok(())
    }
}

/// Disorientation angle in degrees, without symmetry when `ops` is `None`.
fn angle_between(ops: Option<&dyn LaueOps>, q1: &Quat, q2: &Quat) -> f64 {
    match ops {
        Some(ops) => ops.disorientation(q1, q2).degrees(),
        None => AxisAngle::from_quat(&(q1.conjugate() * q2)).degrees(),
    }
}

/// Kernel average misorientation of every voxel.
///
/// Averages the disorientations to same-phase grain voxels in the kernel
/// that fall below the cutoff; 0 when none qualify.
pub fn kernel_misorientation(
    volume: &Microstructure,
    phases: &PhaseTable,
    quats: &[Quat],
    settings: &MisorientationSettings,
) -> Vec<f64> {
    let geometry = &volume.geometry;
    let kam: Vec<f64> = (0..volume.len())
        .into_par_iter()
        .map(|i| {
            if volume.grain(i) == 0 {
                return 0.0;
            }
            let phase = volume.phase(i);
            let ops = phases.ops(phase);
            let mut sum = 0.0;
            let mut n = 0usize;
            for j in geometry.kernel(i, settings.kernel_radius) {
                if volume.grain(j) == 0 || volume.phase(j) != phase {
                    continue;
                }
                let d = angle_between(ops, &quats[i], &quats[j]);
                if d < settings.cutoff_degrees {
                    sum += d;
                    n += 1;
                }
            }
            if n > 0 {
                sum / n as f64
            } else {
                0.0
            }
        })
        .collect();
    log::info!("kernel misorientation: {} voxels", volume.len());
    kam
}

/// Misorientation of every voxel from its grain's average orientation.
///
/// Also stores the per-grain mean (GAM). Requires average orientations.
pub fn grain_misorientation(
    volume: &Microstructure,
    grains: &mut GrainArena,
    phases: &PhaseTable,
    quats: &[Quat],
) -> Vec<f64> {
    let mut values = vec![0.0; volume.len()];
    let mut sums = vec![0.0; grains.slot_count()];
    let mut counts = vec![0usize; grains.slot_count()];
    for (i, value) in values.iter_mut().enumerate() {
        let id = volume.grain(i);
        if id == 0 {
            continue;
        }
        let grain = &grains[id];
        let d = angle_between(phases.ops(grain.phase), &grain.avg_quat, &quats[i]);
        *value = d;
        sums[id] += d;
        counts[id] += 1;
    }
    for (id, grain) in grains.active_mut() {
        grain.gam = if counts[id] > 0 {
            sums[id] / counts[id] as f64
        } else {
            0.0
        };
    }
    values
}

/// Local misorientation gradient: mean absolute difference of the
/// grain misorientation values between a voxel and the same-grain voxels of
/// its kernel.
pub fn misorientation_gradient(
    volume: &Microstructure,
    grain_misorientation: &[f64],
    kernel_radius: usize,
) -> Vec<f64> {
    let geometry = &volume.geometry;
    let mut lmg = vec![0.0; volume.len()];
    for (i, value) in lmg.iter_mut().enumerate() {
        let id = volume.grain(i);
        if id == 0 {
            continue;
        }
        let mut sum = 0.0;
        let mut n = 0usize;
        for j in geometry.kernel(i, kernel_radius) {
            if volume.grain(j) != id {
                continue;
            }
            sum += (grain_misorientation[i] - grain_misorientation[j]).abs();
            n += 1;
        }
        if n > 0 {
            *value = sum / n as f64;
        }
    }
    lmg
}

/// Disorientation of every neighboring grain pair and the per-phase
/// misorientation distribution.
///
/// Each pair's homochoric disorientation is stored on both grains. Pairs in
/// different phases, or in a phase without symmetry operations, get
/// [`CROSS_PHASE_SENTINEL`] and are not binned. Counted pairs add their
/// shared area over the phase's total boundary area to the bin, so a
/// phase's distribution sums to 1. Returns one histogram per phase slot,
/// empty for phases without operations.
pub fn find_misorientations(
    grains: &mut GrainArena,
    phases: &PhaseTable,
    total_boundary_area: &[f64],
) -> Vec<Vec<f64>> {
    let mut mdf: Vec<Vec<f64>> = vec![Vec::new(); phases.slot_count()];
    for (phase, info) in phases.iter() {
        if let Some(ops) = &info.ops {
            mdf[phase as usize] = vec![0.0; ops.mdf_layout().len()];
        }
    }

    let pairs: Vec<(usize, usize, f64)> = grains
        .active()
        .flat_map(|(lo, g)| g.neighbors.range(lo + 1..).map(move |(&hi, &a)| (lo, hi, a)))
        .collect();
    for (_, grain) in grains.active_mut() {
        grain.misorientations.clear();
    }

    let sentinel = Vec3::from(CROSS_PHASE_SENTINEL);
    let mut binned = 0usize;
    for (lo, hi, area) in pairs {
        let phase = grains[lo].phase;
        let ops = if grains[hi].phase == phase {
            phases.ops(phase)
        } else {
            None
        };
        let h = match ops {
            Some(ops) => ops
                .disorientation(&grains[lo].avg_quat, &grains[hi].avg_quat)
                .homochoric(),
            None => sentinel,
        };
        grains[lo].misorientations.insert(hi, h);
        grains[hi].misorientations.insert(lo, h);

        let Some(ops) = ops else { continue };
        if !counts_toward_total(grains, lo, hi) {
            continue;
        }
        let total = total_boundary_area
            .get(phase as usize)
            .copied()
            .unwrap_or(0.0);
        if total > 0.0 {
            mdf[phase as usize][ops.misorientation_bin_index(&h)] += area / total;
            binned += 1;
        }
    }

    for (phase, info) in phases.iter() {
        let total = total_boundary_area
            .get(phase as usize)
            .copied()
            .unwrap_or(0.0);
        if info.ops.is_some() && total <= 0.0 {
            log::warn!("phase {} has no counted boundary area; MDF left empty", phase);
        }
    }
    log::info!("misorientation distribution: {} pairs binned", binned);
    mdf
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grid::Geometry;
    use crate::neighbors::{find_neighbors, FaceAreaConvention};
    use crate::orientation::{find_average_orientations, voxel_quats};
    use crate::phase::PhaseInfo;
    use crate::surface::find_surface_grains;
    use microstat_symmetry::CrystalStructure;

    fn cubic() -> PhaseTable {
        PhaseTable::new(vec![PhaseInfo::primary(CrystalStructure::Cubic)])
    }

    fn line(eulers: Vec<[f32; 3]>, ids: Vec<i32>) -> Microstructure {
        let n = ids.len();
        let g = Geometry::new([n, 1, 1], [1.0; 3]);
        Microstructure::new(g, ids, vec![1; n], eulers)
    }

    #[test]
    fn test_kernel_cutoff() {
        let d3 = 3.0f32.to_radians();
        let d20 = 20.0f32.to_radians();
        let m = line(vec![[0.0; 3], [d3, 0.0, 0.0], [d20, 0.0, 0.0]], vec![1, 1, 1]);
        let table = cubic();
        let quats = voxel_quats(&m, &table);
        let kam = kernel_misorientation(&m, &table, &quats, &MisorientationSettings::default());
        assert!((kam[0] - 3.0).abs() < 1e-3);
        // the 17 degree neighbor is above the cutoff
        assert!((kam[1] - 3.0).abs() < 1e-3);
        assert_eq!(kam[2], 0.0);
    }

    #[test]
    fn test_uniform_grain_has_zero_gam() {
        let m = line(vec![[0.3, 0.2, 0.1]; 4], vec![1; 4]);
        let table = cubic();
        let quats = voxel_quats(&m, &table);
        let mut grains = GrainArena::from_microstructure(&m);
        find_average_orientations(&m, &mut grains, &table, &quats);
        let values = grain_misorientation(&m, &mut grains, &table, &quats);
        assert!(grains[1].gam < 1e-3);
        assert!(values.iter().all(|&v| v < 1e-3));
        let lmg = misorientation_gradient(&m, &values, 1);
        assert!(lmg.iter().all(|&v| v < 1e-3));
    }

    #[test]
    fn test_gradient_ignores_other_grains() {
        let m = line(vec![[0.0; 3]; 3], vec![1, 1, 2]);
        let lmg = misorientation_gradient(&m, &[1.0, 3.0, 50.0], 1);
        assert!((lmg[0] - 2.0).abs() < 1e-12);
        assert!((lmg[1] - 2.0).abs() < 1e-12);
        assert_eq!(lmg[2], 0.0);
    }

    #[test]
    fn test_cross_phase_sentinel() {
        let g = Geometry::new([2, 1, 1], [1.0; 3]);
        let m = Microstructure::new(g, vec![1, 2], vec![1, 2], vec![[0.0; 3]; 2]);
        let table = PhaseTable::new(vec![
            PhaseInfo::primary(CrystalStructure::Cubic),
            PhaseInfo::primary(CrystalStructure::Hexagonal),
        ]);
        let mut grains = GrainArena::from_microstructure(&m);
        find_surface_grains(&m, &mut grains);
        let graph = find_neighbors(&m, &mut grains, FaceAreaConvention::XyPlane, 3);
        let mdf = find_misorientations(&mut grains, &table, &graph.total_boundary_area);
        let sentinel = Vec3::from(CROSS_PHASE_SENTINEL);
        assert_eq!(grains[1].misorientations.get(&2), Some(&sentinel));
        assert_eq!(grains[2].misorientations.get(&1), Some(&sentinel));
        assert!(mdf[1].iter().all(|&v| v == 0.0));
        assert!(mdf[2].iter().all(|&v| v == 0.0));
    }

    #[test]
    fn test_mdf_normalized() {
        let d = 40.0f32.to_radians();
        let m = line(
            vec![[0.0; 3], [0.0; 3], [d, 0.0, 0.0], [d, 0.0, 0.0]],
            vec![1, 1, 2, 2],
        );
        let table = cubic();
        let quats = voxel_quats(&m, &table);
        let mut grains = GrainArena::from_microstructure(&m);
        find_surface_grains(&m, &mut grains);
        let graph = find_neighbors(&m, &mut grains, FaceAreaConvention::XyPlane, 2);
        find_average_orientations(&m, &mut grains, &table, &quats);
        let mdf = find_misorientations(&mut grains, &table, &graph.total_boundary_area);
        let total: f64 = mdf[1].iter().sum();
        assert!((total - 1.0).abs() < 1e-12);
        assert_eq!(mdf[1].len(), 18 * 18 * 18);
        let h = grains[1].misorientations[&2];
        assert!(h.norm() > 0.0);
        assert_eq!(grains[2].misorientations[&1], h);
    }

    #[test]
    fn test_settings_validate() {
        assert!(MisorientationSettings::default().validate().is_ok());
        let bad = MisorientationSettings {
            kernel_radius: 0,
            ..Default::default()
        };
        assert!(bad.validate().is_err());
    }
}
