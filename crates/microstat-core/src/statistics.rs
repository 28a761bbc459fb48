//! Per-phase size, shape, texture and neighborhood distributions.
//!
//! Size-binned statistics cover the active grains of a phase that lie inside
//! the shrunk bounding box. Texture (ODF) and principal-axis histograms
//! cover the active grains that do not touch the grid surface.

use crate::error::{MicrostatError, Result};
use crate::grain::{Grain, GrainArena};
use crate::phase::{PhaseSummary, PhaseTable, PhaseType};
use microstat_math::{Euler, Mat3, Vec3};
use microstat_symmetry::CrystalStructure;
use serde::{Deserialize, Serialize};
use std::f64::consts::PI;

/// Bins per Euler angle in the principal-axis histogram.
pub const AXIS_ODF_BINS: usize = 36;

/// Row sign flips that map a principal frame onto its equivalent
/// right-handed frames.
const AXIS_SIGNS: [[f64; 3]; 4] = [
    [1.0, 1.0, 1.0],
    [-1.0, 1.0, -1.0],
    [1.0, -1.0, -1.0],
    [-1.0, -1.0, 1.0],
];

/// Aggregation parameters.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StatisticsSettings {
    /// Width of a diameter bin (physical units).
    pub size_bin_step: f64,
    /// Accumulate the orientation distribution.
    pub odf: bool,
    /// Accumulate the misorientation distribution.
    pub mdf: bool,
    /// Accumulate the principal-axis orientation histogram.
    pub axis_odf: bool,
}

impl Default for StatisticsSettings {
    fn default() -> Self {
        Self {
            size_bin_step: 1.0,
            odf: true,
            mdf: true,
            axis_odf: true,
        }
    }
}

impl StatisticsSettings {
    /// Validate settings.
    pub fn validate(&self) -> Result<()> {
        if !(self.size_bin_step.is_finite() && self.size_bin_step > 0.0) {
            return Err(MicrostatError::InvalidSettings(
                "size_bin_step must be positive".into(),
            ));
        }
        Ok(())
    }
}

/// Mean and population standard deviation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct MeanStd {
    /// Mean.
    pub mean: f64,
    /// Standard deviation.
    pub std: f64,
}

impl MeanStd {
    /// Statistics of a sample; zero for an empty one.
    pub fn of(values: &[f64]) -> Self {
        if values.is_empty() {
            return Self::default();
        }
        let n = values.len() as f64;
        let mean = values.iter().sum::<f64>() / n;
        let var = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / n;
        Self {
            mean,
            std: var.sqrt(),
        }
    }
}

/// Mean, standard deviation and the beta distribution with the same first
/// two moments.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct BetaFit {
    /// Mean.
    pub mean: f64,
    /// Standard deviation.
    pub std: f64,
    /// Beta shape parameter alpha.
    pub alpha: f64,
    /// Beta shape parameter beta.
    pub beta: f64,
}

impl BetaFit {
    /// Method-of-moments fit; alpha and beta stay 0 for zero variance.
    pub fn of(values: &[f64]) -> Self {
        let MeanStd { mean, std } = MeanStd::of(values);
        let var = std * std;
        let mut fit = Self {
            mean,
            std,
            alpha: 0.0,
            beta: 0.0,
        };
        if var > 0.0 {
            let t = mean * (1.0 - mean) / var - 1.0;
            if t.is_finite() {
                fit.alpha = mean * t;
                fit.beta = (1.0 - mean) * t;
            }
        }
        fit
    }
}

/// Statistics of the grains in one diameter bin.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SizeBin {
    /// Lower diameter edge of the bin.
    pub diameter: f64,
    /// Number of grains in the bin.
    pub count: usize,
    /// Aspect ratio b/a.
    pub b_over_a: BetaFit,
    /// Aspect ratio c/a.
    pub c_over_a: BetaFit,
    /// Aspect ratio c/b.
    pub c_over_b: BetaFit,
    /// Shape factor.
    pub omega3: BetaFit,
    /// Schmid factor.
    pub schmid_factor: MeanStd,
    /// Grains within 1, 2 and 3 equivalent radii.
    pub neighborhood: [MeanStd; 3],
    /// `(count, n2 - n1, n1, log2((n3 - n1) / (n2 - n1)))` from the
    /// neighborhood means.
    pub neighborhood_fit: [f64; 4],
}

/// Everything aggregated for one phase.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PhaseStatistics {
    /// Phase id.
    pub phase: i32,
    /// Crystal structure.
    pub structure: CrystalStructure,
    /// Role of the phase.
    pub phase_type: PhaseType,
    /// Volume, fraction, diameter range and boundary area.
    pub summary: PhaseSummary,
    /// Grains that entered the size statistics.
    pub counted_grains: usize,
    /// Mean and standard deviation of ln(diameter).
    pub log_diameter: MeanStd,
    /// Diameter bin width.
    pub bin_step: f64,
    /// Diameter bins starting at the smallest diameter.
    pub size_bins: Vec<SizeBin>,
    /// Volume-weighted orientation distribution.
    pub odf: Vec<f64>,
    /// Boundary-area-weighted misorientation distribution.
    pub mdf: Vec<f64>,
    /// Principal-axis orientation counts over 36^3 bins.
    pub axis_odf: Vec<f64>,
    /// Number of axis samples binned.
    pub total_axes: usize,
}

/// Number of diameter bins spanning `[min, max]`.
pub fn bin_count(min: f64, max: f64, step: f64) -> usize {
    if max <= min {
        1
    } else {
        ((max - min) / step).floor() as usize + 1
    }
}

fn field(group: &[&Grain], f: impl Fn(&Grain) -> f64) -> Vec<f64> {
    group.iter().map(|g| f(g)).collect()
}

fn size_bins(members: &[&Grain], min: f64, step: f64, numbins: usize) -> Vec<SizeBin> {
    let mut grouped: Vec<Vec<&Grain>> = vec![Vec::new(); numbins];
    for &g in members {
        let b = (((g.equivalent_diameter - min) / step).max(0.0) as usize).min(numbins - 1);
        grouped[b].push(g);
    }

    grouped
        .iter()
        .enumerate()
        .map(|(b, group)| {
            let mut bin = SizeBin {
                diameter: min + b as f64 * step,
                count: group.len(),
                ..Default::default()
            };
            if group.len() < 2 {
                return bin;
            }
            bin.b_over_a = BetaFit::of(&field(group, |g| g.b_over_a));
            bin.c_over_a = BetaFit::of(&field(group, |g| g.c_over_a));
            bin.c_over_b = BetaFit::of(&field(group, |g| g.c_over_b()));
            bin.omega3 = BetaFit::of(&field(group, |g| g.omega3));
            bin.schmid_factor = MeanStd::of(&field(group, |g| g.schmid_factor));
            for k in 0..3 {
                bin.neighborhood[k] = MeanStd::of(&field(group, |g| g.neighborhood[k] as f64));
            }
            bin.neighborhood_fit = neighborhood_fit(group.len(), &bin.neighborhood);
            bin
        })
        .collect()
}

/// Power-law fit of the neighborhood means of one bin.
///
/// The exponent is 0 when the shells do not grow.
pub fn neighborhood_fit(count: usize, shells: &[MeanStd; 3]) -> [f64; 4] {
    let (n1, n2, n3) = (shells[0].mean, shells[1].mean, shells[2].mean);
    let rise = n2 - n1;
    let exponent = if rise > 0.0 && n3 - n1 > 0.0 {
        ((n3 - n1) / rise).log2()
    } else {
        0.0
    };
    [count as f64, rise, n1, exponent]
}

/// Bin of a principal frame's Euler angles, if all lie in `[0, pi)`.
pub fn axis_bin(e: &Euler) -> Option<usize> {
    let step = PI / AXIS_ODF_BINS as f64;
    let mut b = [0usize; 3];
    for (k, angle) in e.to_array().into_iter().enumerate() {
        if !(0.0..PI).contains(&angle) {
            return None;
        }
        b[k] = ((angle / step) as usize).min(AXIS_ODF_BINS - 1);
    }
    Some(b[2] * AXIS_ODF_BINS * AXIS_ODF_BINS + b[1] * AXIS_ODF_BINS + b[0])
}

/// Add the sign variants of a principal frame to the axis histogram.
///
/// `axes` holds the principal directions as columns; each variant flips two
/// of its rows before the Bunge angles are read off. Returns the number of
/// variants binned.
pub fn bin_principal_frame(axes: &Mat3, histogram: &mut [f64]) -> usize {
    let mut binned = 0;
    for signs in AXIS_SIGNS {
        let flipped = Mat3::from_diagonal(&Vec3::from(signs)) * axes;
        if let Some(bin) = axis_bin(&Euler::from_matrix(&flipped)) {
            histogram[bin] += 1.0;
            binned += 1;
        }
    }
    binned
}

/// Aggregate the statistics of every phase.
///
/// `summaries` and `mdf` are indexed by phase id.
pub fn find_phase_statistics(
    grains: &GrainArena,
    phases: &PhaseTable,
    summaries: &[PhaseSummary],
    mdf: &[Vec<f64>],
    settings: &StatisticsSettings,
) -> Vec<PhaseStatistics> {
    let step = settings.size_bin_step;
    phases
        .iter()
        .map(|(phase, info)| {
            let summary = summaries
                .get(phase as usize)
                .cloned()
                .unwrap_or_default();
            let in_phase: Vec<&Grain> = grains
                .active()
                .map(|(_, g)| g)
                .filter(|g| g.phase == phase)
                .collect();
            let counted: Vec<&Grain> = in_phase
                .iter()
                .copied()
                .filter(|g| !g.outside_bounding_box)
                .collect();

            let numbins = bin_count(summary.min_diameter, summary.max_diameter, step);
            let log_diameters: Vec<f64> = counted
                .iter()
                .filter(|g| g.equivalent_diameter > 0.0)
                .map(|g| g.equivalent_diameter.ln())
                .collect();

            let mut odf = Vec::new();
            if let (true, Some(ops)) = (settings.odf, &info.ops) {
                odf = vec![0.0; ops.odf_layout().len()];
                if summary.total_volume > 0.0 {
                    for g in in_phase.iter().filter(|g| !g.surface_grain) {
                        odf[ops.rodrigues_bin_index(&g.avg_quat)] +=
                            g.volume / summary.total_volume;
                    }
                }
            }

            let mut axis_odf = Vec::new();
            let mut total_axes = 0;
            if settings.axis_odf {
                axis_odf = vec![0.0; AXIS_ODF_BINS.pow(3)];
                for g in in_phase.iter().filter(|g| !g.surface_grain) {
                    total_axes += bin_principal_frame(&g.axes, &mut axis_odf);
                }
            }

            let mdf = if settings.mdf {
                mdf.get(phase as usize).cloned().unwrap_or_default()
            } else {
                Vec::new()
            };

            log::debug!(
                "phase {}: {} grains, {} counted, {} size bins",
                phase,
                in_phase.len(),
                counted.len(),
                numbins
            );
            PhaseStatistics {
                phase,
                structure: info.structure,
                phase_type: info.phase_type,
                counted_grains: counted.len(),
                log_diameter: MeanStd::of(&log_diameters),
                bin_step: step,
                size_bins: size_bins(&counted, summary.min_diameter, step, numbins),
                summary,
                odf,
                mdf,
                axis_odf,
                total_axes,
            }
        })
        .collect()
}
