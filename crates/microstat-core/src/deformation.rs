//! Local deformation measures binned against grain structure.
//!
//! Every grain voxel contributes its kernel misorientation (KAM), grain
//! misorientation (GAM) and misorientation gradient (LMG) to three
//! distributions, and to trend tables keyed by the voxel's distance to the
//! nearest boundary, triple line and quadruple point. Voxels close to a
//! boundary are also binned by properties of the grain pair that boundary
//! separates: the Schmid factor, the Schmid factor ratio, the slip
//! transmission factor and the disorientation.

use crate::distance::{DistanceMap, DistanceMaps};
use crate::grain::GrainArena;
use crate::grid::{Microstructure, VoxelFields};
use crate::phase::PhaseTable;
use serde::Serialize;

/// Bins of the KAM, GAM and LMG distributions.
pub const DISTRIBUTION_BINS: usize = 25;

/// Bins of each trend table.
pub const TREND_BINS: usize = 10;

const KAM_BIN_WIDTH: f64 = 0.2;
const GAM_BIN_WIDTH: f64 = 0.8;
const LMG_BIN_WIDTH: f64 = 0.1;
const SCHMID_OFFSET: f64 = 0.25;
const SCHMID_BIN_WIDTH: f64 = 0.025;
const MISMATCH_BIN_WIDTH: f64 = 0.2;
const TRANSMISSION_OFFSET: f64 = 0.4;
const TRANSMISSION_BIN_WIDTH: f64 = 0.06;
const DISORIENTATION_BIN_WIDTH: f64 = 10.0;

/// Voxels closer than this to a boundary enter the grain-pair tables.
pub const NEAR_BOUNDARY: f64 = 6.0;

/// Count and mean deformation measures of the voxels in one bin.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct TrendBin {
    /// Voxels in the bin.
    pub count: usize,
    /// Mean kernel misorientation (degrees).
    pub kam: f64,
    /// Mean grain misorientation (degrees).
    pub gam: f64,
    /// Mean misorientation gradient (degrees).
    pub lmg: f64,
}

impl TrendBin {
    fn add(&mut self, s: &Sample) {
        self.count += 1;
        self.kam += s.kam;
        self.gam += s.gam;
        self.lmg += s.lmg;
    }

    /// Turn the accumulated sums into means.
    fn finish(&mut self) {
        if self.count > 0 {
            let n = self.count as f64;
            self.kam /= n;
            self.gam /= n;
            self.lmg /= n;
        }
    }
}

#[derive(Debug, Clone, Copy)]
struct Sample {
    kam: f64,
    gam: f64,
    lmg: f64,
}

/// Deformation distributions and trend tables of a run.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DeformationStats {
    /// Voxel counts per 0.2 degree KAM bin.
    pub kam_distribution: Vec<usize>,
    /// Voxel counts per 0.8 degree GAM bin.
    pub gam_distribution: Vec<usize>,
    /// Voxel counts per 0.1 degree LMG bin.
    pub lmg_distribution: Vec<usize>,
    /// By whole distance units to the nearest boundary.
    pub versus_boundary_distance: Vec<TrendBin>,
    /// By whole distance units to the nearest triple line.
    pub versus_triple_line_distance: Vec<TrendBin>,
    /// By whole distance units to the nearest quadruple point.
    pub versus_quad_point_distance: Vec<TrendBin>,
    /// Near-boundary voxels by their grain's Schmid factor.
    pub versus_schmid_factor: Vec<TrendBin>,
    /// Near-boundary voxels by the Schmid factor ratio across the boundary.
    pub versus_schmid_mismatch: Vec<TrendBin>,
    /// Near-boundary voxels by the slip transmission factor across the
    /// boundary.
    pub versus_slip_transmission: Vec<TrendBin>,
    /// Near-boundary voxels by the disorientation across the boundary.
    pub versus_disorientation: Vec<TrendBin>,
    /// Schmid factor tables, one per boundary distance bin.
    pub schmid_factor_by_distance: Vec<Vec<TrendBin>>,
    /// Schmid factor ratio tables, one per boundary distance bin.
    pub schmid_mismatch_by_distance: Vec<Vec<TrendBin>>,
    /// Slip transmission tables, one per boundary distance bin.
    pub slip_transmission_by_distance: Vec<Vec<TrendBin>>,
    /// Disorientation tables, one per boundary distance bin.
    pub disorientation_by_distance: Vec<Vec<TrendBin>>,
    /// Slip transmission tables, one per Schmid factor ratio bin.
    pub slip_transmission_by_mismatch: Vec<Vec<TrendBin>>,
}

fn table() -> Vec<TrendBin> {
    vec![TrendBin::default(); TREND_BINS]
}

fn nested() -> Vec<Vec<TrendBin>> {
    vec![table(); TREND_BINS]
}

impl Default for DeformationStats {
    fn default() -> Self {
        Self {
            kam_distribution: vec![0; DISTRIBUTION_BINS],
            gam_distribution: vec![0; DISTRIBUTION_BINS],
            lmg_distribution: vec![0; DISTRIBUTION_BINS],
            versus_boundary_distance: table(),
            versus_triple_line_distance: table(),
            versus_quad_point_distance: table(),
            versus_schmid_factor: table(),
            versus_schmid_mismatch: table(),
            versus_slip_transmission: table(),
            versus_disorientation: table(),
            schmid_factor_by_distance: nested(),
            schmid_mismatch_by_distance: nested(),
            slip_transmission_by_distance: nested(),
            disorientation_by_distance: nested(),
            slip_transmission_by_mismatch: nested(),
        }
    }
}

impl DeformationStats {
    fn finish(&mut self) {
        let flat = [
            &mut self.versus_boundary_distance,
            &mut self.versus_triple_line_distance,
            &mut self.versus_quad_point_distance,
            &mut self.versus_schmid_factor,
            &mut self.versus_schmid_mismatch,
            &mut self.versus_slip_transmission,
            &mut self.versus_disorientation,
        ];
        let nested = [
            &mut self.schmid_factor_by_distance,
            &mut self.schmid_mismatch_by_distance,
            &mut self.slip_transmission_by_distance,
            &mut self.disorientation_by_distance,
            &mut self.slip_transmission_by_mismatch,
        ];
        flat.into_iter()
            .chain(nested.into_iter().flat_map(|t| t.iter_mut()))
            .flat_map(|t| t.iter_mut())
            .for_each(TrendBin::finish);
    }
}

// =============================================================================
// Binning
// =============================================================================

/// Bin of `value` in bins of `width` starting at `offset`, truncated toward
/// zero and clamped into `0..n`.
pub fn bin_index(value: f64, offset: f64, width: f64, n: usize) -> usize {
    clamp_bin(((value - offset) / width).trunc(), n)
}

fn clamp_bin(b: f64, n: usize) -> usize {
    if b > 0.0 {
        (b as usize).min(n - 1)
    } else {
        0
    }
}

/// Bin of a Schmid factor ratio.
///
/// Ratios of at least 1 fill bins 5 and up in steps of 0.2; smaller ratios
/// fill bins 4 and down by the same steps of their inverse.
pub fn mismatch_bin(ratio: f64) -> usize {
    let b = if ratio >= 1.0 {
        ((ratio - 1.0) / MISMATCH_BIN_WIDTH).trunc() + 5.0
    } else {
        4.0 - ((1.0 / ratio - 1.0) / MISMATCH_BIN_WIDTH).trunc()
    };
    clamp_bin(b, TREND_BINS)
}

/// Whole-distance bin of voxel `i` in a channel, `None` if it was not
/// reached.
fn distance_bin(map: &DistanceMap, i: usize) -> Option<usize> {
    let d = map.distance[i];
    (d >= 0.0).then(|| bin_index(d, 0.0, 1.0, TREND_BINS))
}

/// Grain on the far side of the boundary nearest to voxel `i` of grain
/// `own`.
///
/// That is the grain of the nearest boundary seed when it differs from
/// `own`, else the first other grain face-adjacent to the seed.
pub fn grain_across(
    volume: &Microstructure,
    boundary: &DistanceMap,
    i: usize,
    own: usize,
) -> Option<usize> {
    let seed = usize::try_from(boundary.nearest[i]).ok()?;
    let seed_grain = volume.grain(seed);
    if seed_grain != 0 && seed_grain != own {
        return Some(seed_grain);
    }
    volume
        .geometry
        .face_neighbors(seed)
        .into_iter()
        .flatten()
        .map(|j| volume.grain(j))
        .find(|&g| g != 0 && g != own)
}

// =============================================================================
// Aggregation
// =============================================================================

/// Bins of the grain-pair measures for a voxel next to a boundary.
#[derive(Debug, Clone, Copy, Default)]
struct PairBins {
    schmid_factor: Option<usize>,
    schmid_mismatch: Option<usize>,
    slip_transmission: Option<usize>,
    disorientation: Option<usize>,
}

fn pair_bins(
    grains: &GrainArena,
    phases: &PhaseTable,
    own: usize,
    other: Option<usize>,
) -> PairBins {
    let g = &grains[own];
    let mut bins = PairBins {
        schmid_factor: Some(bin_index(
            g.schmid_factor,
            SCHMID_OFFSET,
            SCHMID_BIN_WIDTH,
            TREND_BINS,
        )),
        ..Default::default()
    };
    let Some(other) = other else {
        return bins;
    };
    let h = &grains[other];
    if h.schmid_factor > 0.0 {
        bins.schmid_mismatch = Some(mismatch_bin(g.schmid_factor / h.schmid_factor));
    }
    let ops = if g.phase == h.phase {
        phases.ops(g.phase)
    } else {
        None
    };
    if let Some(ops) = ops {
        bins.slip_transmission = ops
            .slip_transmission(&g.avg_quat, g.slip_system, &h.avg_quat)
            .map(|m| bin_index(m, TRANSMISSION_OFFSET, TRANSMISSION_BIN_WIDTH, TREND_BINS));
        let w = ops.disorientation(&g.avg_quat, &h.avg_quat).degrees();
        bins.disorientation = Some(bin_index(w, 0.0, DISORIENTATION_BIN_WIDTH, TREND_BINS));
    }
    bins
}

/// Bin every grain voxel's KAM, GAM and LMG into the distributions and
/// trend tables.
///
/// Requires the crystal response (Schmid factors and slip systems) and
/// average orientations. Channels that were not computed leave their tables
/// empty; without the boundary channel the grain-pair tables stay empty too.
pub fn find_deformation_stats(
    volume: &Microstructure,
    grains: &GrainArena,
    phases: &PhaseTable,
    voxels: &VoxelFields,
    distances: &DistanceMaps,
) -> DeformationStats {
    let mut stats = DeformationStats::default();
    let mut near = 0usize;

    for i in 0..volume.len() {
        let own = volume.grain(i);
        if own == 0 {
            continue;
        }
        let s = Sample {
            kam: voxels.kernel_misorientation[i],
            gam: voxels.grain_misorientation[i],
            lmg: voxels.misorientation_gradient[i],
        };
        stats.kam_distribution[bin_index(s.kam, 0.0, KAM_BIN_WIDTH, DISTRIBUTION_BINS)] += 1;
        stats.gam_distribution[bin_index(s.gam, 0.0, GAM_BIN_WIDTH, DISTRIBUTION_BINS)] += 1;
        stats.lmg_distribution[bin_index(s.lmg, 0.0, LMG_BIN_WIDTH, DISTRIBUTION_BINS)] += 1;

        for (map, trend) in [
            (&distances.triple_line, &mut stats.versus_triple_line_distance),
            (&distances.quad_point, &mut stats.versus_quad_point_distance),
        ] {
            if let Some(b) = map.as_ref().and_then(|m| distance_bin(m, i)) {
                trend[b].add(&s);
            }
        }

        let Some(boundary) = &distances.boundary else {
            continue;
        };
        let Some(d) = distance_bin(boundary, i) else {
            continue;
        };
        stats.versus_boundary_distance[d].add(&s);

        let other = grain_across(volume, boundary, i, own);
        let bins = pair_bins(grains, phases, own, other);
        if boundary.distance[i] < NEAR_BOUNDARY {
            near += 1;
            for (bin, trend) in [
                (bins.schmid_factor, &mut stats.versus_schmid_factor),
                (bins.schmid_mismatch, &mut stats.versus_schmid_mismatch),
                (bins.slip_transmission, &mut stats.versus_slip_transmission),
                (bins.disorientation, &mut stats.versus_disorientation),
            ] {
                if let Some(b) = bin {
                    trend[b].add(&s);
                }
            }
        }
        for (bin, tables) in [
            (bins.schmid_factor, &mut stats.schmid_factor_by_distance),
            (bins.schmid_mismatch, &mut stats.schmid_mismatch_by_distance),
            (bins.slip_transmission, &mut stats.slip_transmission_by_distance),
            (bins.disorientation, &mut stats.disorientation_by_distance),
        ] {
            if let Some(b) = bin {
                tables[d][b].add(&s);
            }
        }
        if let (Some(m), Some(t)) = (bins.schmid_mismatch, bins.slip_transmission) {
            stats.slip_transmission_by_mismatch[m][t].add(&s);
        }
    }

    stats.finish();
    log::info!(
        "deformation statistics: {} voxels, {} near a boundary",
        stats.kam_distribution.iter().sum::<usize>(),
        near
    );
    stats
}
