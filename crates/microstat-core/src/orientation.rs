//! Per-voxel quaternions and per-grain average orientations.

use crate::grain::GrainArena;
use crate::grid::Microstructure;
use crate::phase::PhaseTable;
use microstat_math::{identity_quat, normalize_or_identity, quat_dot, Euler, Quat};
use rayon::prelude::*;

/// Quaternion of every voxel, reduced to the fundamental zone of its phase.
///
/// Voxels of a phase without symmetry operations keep the raw quaternion.
pub fn voxel_quats(volume: &Microstructure, phases: &PhaseTable) -> Vec<Quat> {
    (0..volume.len())
        .into_par_iter()
        .map(|i| {
            let e = volume.euler(i);
            match phases.ops(volume.phase(i)) {
                Some(ops) => ops.reduce_to_fundamental_zone(&ops.euler_to_quat(&e)),
                None => e.to_quat(),
            }
        })
        .collect()
}

/// Average the voxel orientations of every grain.
///
/// Each voxel adds the symmetric equivalent of its quaternion closest to the
/// grain's running sum, so equivalent orientations do not cancel. The sum is
/// divided by the voxel count and normalized; an empty grain gets the
/// identity.
pub fn find_average_orientations(
    volume: &Microstructure,
    grains: &mut GrainArena,
    phases: &PhaseTable,
    quats: &[Quat],
) {
    let zero = Quat::new(0.0, 0.0, 0.0, 0.0);
    let mut sums = vec![zero; grains.slot_count()];
    let mut counts = vec![0usize; grains.slot_count()];

    for (i, q) in quats.iter().enumerate() {
        let id = volume.grain(i);
        if id == 0 {
            continue;
        }
        if counts[id] == 0 {
            sums[id] = *q;
        } else {
            let aligned = match phases.ops(grains[id].phase) {
                Some(ops) => ops.nearest_equivalent(&sums[id], q),
                None if quat_dot(&sums[id], q) < 0.0 => -*q,
                None => *q,
            };
            sums[id] += aligned;
        }
        counts[id] += 1;
    }

    for (id, grain) in grains.active_mut() {
        grain.avg_quat = if counts[id] == 0 {
            identity_quat()
        } else {
            normalize_or_identity(&(sums[id] / counts[id] as f64))
        };
        grain.avg_euler = Euler::from_quat(&grain.avg_quat);
    }
    log::info!("average orientations: {} grains", grains.active_count());
}
