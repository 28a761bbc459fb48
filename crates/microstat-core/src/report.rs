//! Writers for the per-grain table, the per-phase statistics and the
//! deformation trends.

use crate::deformation::DeformationStats;
use crate::error::Result;
use crate::grain::{Grain, GrainArena};
use crate::statistics::PhaseStatistics;
use serde::{Deserialize, Serialize};
use std::io::Write;

/// Output formatting and the column groups of the grain table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReportSettings {
    /// Separator between table columns.
    pub delimiter: String,
    /// Equivalent diameter and the bounding box flag.
    pub sizes: bool,
    /// Aspect ratios and omega3.
    pub shapes: bool,
    /// Neighbor count.
    pub neighbors: bool,
    /// Average Euler angles.
    pub orientations: bool,
}

impl Default for ReportSettings {
    fn default() -> Self {
        Self {
            delimiter: " ".into(),
            sizes: true,
            shapes: true,
            neighbors: true,
            orientations: true,
        }
    }
}

// =============================================================================
// Grain table
// =============================================================================

type Cell = fn(&Grain) -> String;

fn float(v: f64) -> String {
    format!("{:.6}", v)
}

fn flag(v: bool) -> String {
    u8::from(v).to_string()
}

/// Columns after `Grain_ID`, in output order, for the enabled groups.
fn grain_columns(settings: &ReportSettings) -> Vec<(&'static str, Cell)> {
    let mut columns: Vec<(&'static str, Cell)> = Vec::new();
    if settings.orientations {
        columns.push(("Phi1", |g: &Grain| float(g.avg_euler.phi1)));
        columns.push(("PHI", |g: &Grain| float(g.avg_euler.phi)));
        columns.push(("Phi2", |g: &Grain| float(g.avg_euler.phi2)));
    }
    if settings.sizes {
        columns.push(("EquivDiam", |g: &Grain| float(g.equivalent_diameter)));
    }
    if settings.shapes {
        columns.push(("B/A", |g: &Grain| float(g.b_over_a)));
        columns.push(("C/A", |g: &Grain| float(g.c_over_a)));
        columns.push(("Omega3", |g: &Grain| float(g.omega3)));
    }
    if settings.sizes {
        columns.push(("OutsideBoundingBox", |g: &Grain| flag(g.outside_bounding_box)));
    }
    if settings.neighbors {
        columns.push(("NumNeighbors", |g: &Grain| g.neighbor_count().to_string()));
    }
    columns.push(("SurfaceFeature", |g: &Grain| flag(g.surface_grain)));
    columns
}

/// Column names of the grain table for `settings`.
pub fn grain_table_columns(settings: &ReportSettings) -> Vec<&'static str> {
    std::iter::once("Grain_ID")
        .chain(grain_columns(settings).into_iter().map(|(name, _)| name))
        .collect()
}

/// Write the grain count, a header line and one row per active grain.
///
/// Euler angles are written in radians; flags as 0/1. Disabled column
/// groups are left out of both header and rows.
pub fn write_grain_table<W: Write>(
    out: &mut W,
    grains: &GrainArena,
    settings: &ReportSettings,
) -> Result<()> {
    let sep = settings.delimiter.as_str();
    let columns = grain_columns(settings);
    writeln!(out, "{}", grains.active_count())?;
    writeln!(out, "{}", grain_table_columns(settings).join(sep))?;
    for (id, g) in grains.active() {
        let row: Vec<String> = std::iter::once(id.to_string())
            .chain(columns.iter().map(|(_, cell)| cell(g)))
            .collect();
        writeln!(out, "{}", row.join(sep))?;
    }
    Ok(())
}

// =============================================================================
// JSON records
// =============================================================================

/// Write the per-phase statistics as pretty-printed JSON.
pub fn write_statistics_json<W: Write>(out: &mut W, stats: &[PhaseStatistics]) -> Result<()> {
    serde_json::to_writer_pretty(&mut *out, stats)?;
    writeln!(out)?;
    Ok(())
}

/// Write the deformation distributions and trend tables as pretty-printed
/// JSON.
pub fn write_deformation_json<W: Write>(out: &mut W, stats: &DeformationStats) -> Result<()> {
    serde_json::to_writer_pretty(&mut *out, stats)?;
    writeln!(out)?;
    Ok(())
}
