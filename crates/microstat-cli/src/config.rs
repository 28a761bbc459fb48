//! TOML job configuration.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::Deserialize;

use microstat_core::{
    CharacterizeSettings, DistanceSettings, FaceAreaConvention, MisorientationSettings,
    PhaseInfo, PhaseTable, PhaseType, ReportSettings, ResponseSettings, StatisticsSettings,
};
use microstat_symmetry::CrystalStructure;

/// Top-level job configuration.
#[derive(Debug, Deserialize)]
pub struct JobConfig {
    pub input: InputConfig,
    /// Phase table, phase 1 first. Defaults to a single cubic phase.
    #[serde(default = "default_phases")]
    pub phases: Vec<PhaseConfig>,
    #[serde(default)]
    pub neighbors: NeighborConfig,
    #[serde(default)]
    pub misorientation: MisorientationSettings,
    #[serde(default)]
    pub response: ResponseSettings,
    #[serde(default)]
    pub statistics: StatisticsSettings,
    #[serde(default)]
    pub distance: DistanceSettings,
    #[serde(default)]
    pub output: OutputConfig,
}

/// Input files.
#[derive(Debug, Deserialize)]
pub struct InputConfig {
    /// JSON voxel volume, relative to the job file.
    pub volume: PathBuf,
}

/// One phase table entry.
#[derive(Debug, Clone, Deserialize)]
pub struct PhaseConfig {
    pub structure: CrystalStructure,
    #[serde(default)]
    pub phase_type: PhaseType,
}

/// Neighbor graph options.
#[derive(Debug, Default, Deserialize)]
pub struct NeighborConfig {
    #[serde(default)]
    pub face_area: FaceAreaConvention,
}

/// Output configuration.
#[derive(Debug, Deserialize)]
pub struct OutputConfig {
    /// Output directory (default: "./output").
    #[serde(default = "default_output_dir")]
    pub directory: String,
    /// Column separator of the grain table (default: a space).
    #[serde(default = "default_delimiter")]
    pub delimiter: String,
    /// Write grains.txt (default: true).
    #[serde(default = "default_true")]
    pub grain_table: bool,
    /// Write statistics.json (default: true).
    #[serde(default = "default_true")]
    pub statistics: bool,
    /// Write deformation.json (default: true).
    #[serde(default = "default_true")]
    pub deformation: bool,
    /// Grain table size columns (default: true).
    #[serde(default = "default_true")]
    pub sizes: bool,
    /// Grain table shape columns (default: true).
    #[serde(default = "default_true")]
    pub shapes: bool,
    /// Grain table neighbor count column (default: true).
    #[serde(default = "default_true")]
    pub neighbors: bool,
    /// Grain table Euler angle columns (default: true).
    #[serde(default = "default_true")]
    pub orientations: bool,
    /// Write the per-voxel values to voxels.json (default: false).
    #[serde(default)]
    pub voxel_fields: bool,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            directory: default_output_dir(),
            delimiter: default_delimiter(),
            grain_table: true,
            statistics: true,
            deformation: true,
            sizes: true,
            shapes: true,
            neighbors: true,
            orientations: true,
            voxel_fields: false,
        }
    }
}

fn default_phases() -> Vec<PhaseConfig> {
    vec![PhaseConfig {
        structure: CrystalStructure::Cubic,
        phase_type: PhaseType::Primary,
    }]
}
fn default_output_dir() -> String {
    "./output".into()
}
fn default_delimiter() -> String {
    " ".into()
}
fn default_true() -> bool {
    true
}

impl JobConfig {
    /// Engine settings collected from the sections.
    pub fn settings(&self) -> CharacterizeSettings {
        CharacterizeSettings {
            face_area: self.neighbors.face_area,
            misorientation: self.misorientation,
            response: self.response,
            statistics: self.statistics,
            distance: self.distance,
        }
    }

    /// Phase table with the built-in symmetry operations.
    pub fn phase_table(&self) -> PhaseTable {
        PhaseTable::new(
            self.phases
                .iter()
                .map(|p| PhaseInfo::new(p.structure, p.phase_type))
                .collect(),
        )
    }

    /// Report formatting.
    pub fn report(&self) -> ReportSettings {
        ReportSettings {
            delimiter: self.output.delimiter.clone(),
            sizes: self.output.sizes,
            shapes: self.output.shapes,
            neighbors: self.output.neighbors,
            orientations: self.output.orientations,
        }
    }
}

/// Load and parse a TOML job configuration file.
pub fn load_config(path: &Path) -> Result<JobConfig> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("reading job file {}", path.display()))?;
    let config: JobConfig = toml::from_str(&content)
        .with_context(|| format!("parsing job file {}", path.display()))?;
    if config.phases.is_empty() {
        anyhow::bail!("job file {} lists no phases", path.display());
    }
    config.settings().validate()?;
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_minimal_job() {
        let job: JobConfig = toml::from_str(
            r#"
            [input]
            volume = "grid.json"
            "#,
        )
        .unwrap();
        assert_eq!(job.phases.len(), 1);
        assert_eq!(job.phases[0].structure, CrystalStructure::Cubic);
        assert_eq!(job.output.delimiter, " ");
        assert!(job.output.grain_table);
        assert!(job.output.deformation);
        assert_eq!(job.settings(), CharacterizeSettings::default());
        assert_eq!(job.report(), ReportSettings::default());
    }

    #[test]
    fn test_full_job() {
        let job: JobConfig = toml::from_str(
            r#"
            [input]
            volume = "grid.json"

            [[phases]]
            structure = "hexagonal"
            phase_type = "matrix"

            [[phases]]
            structure = "cubic"
            phase_type = "precipitate"

            [neighbors]
            face_area = "per_direction"

            [misorientation]
            kernel_radius = 2
            cutoff_degrees = 3.0

            [statistics]
            size_bin_step = 0.5
            axis_odf = false

            [distance]
            manhattan_only = true

            [output]
            directory = "out"
            delimiter = ","
            shapes = false
            deformation = false
            "#,
        )
        .unwrap();
        let table = job.phase_table();
        assert_eq!(table.len(), 2);
        assert_eq!(table.get(1).unwrap().structure, CrystalStructure::Hexagonal);
        assert_eq!(table.get(2).unwrap().phase_type, PhaseType::Precipitate);
        let settings = job.settings();
        assert_eq!(settings.face_area, FaceAreaConvention::PerDirection);
        assert_eq!(settings.misorientation.kernel_radius, 2);
        assert_eq!(settings.statistics.size_bin_step, 0.5);
        assert!(!settings.statistics.axis_odf);
        assert!(settings.statistics.odf);
        assert!(settings.distance.manhattan_only);
        let report = job.report();
        assert_eq!(report.delimiter, ",");
        assert!(!report.shapes);
        assert!(report.sizes && report.neighbors && report.orientations);
        assert!(!job.output.deformation);
    }
}
