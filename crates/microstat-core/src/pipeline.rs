//! The full characterization run.

use crate::bounds::{find_bounding_box_grains, BoundingBox};
use crate::deformation::{find_deformation_stats, DeformationStats};
use crate::distance::{find_distances, DistanceMaps, DistanceSettings};
use crate::error::Result;
use crate::grain::GrainArena;
use crate::grid::{Geometry, Microstructure, VoxelFields};
use crate::misorientation::{
    find_misorientations, grain_misorientation, kernel_misorientation, misorientation_gradient,
    MisorientationSettings,
};
use crate::moments::{find_axes, find_axis_directions, find_centroids, find_moments};
use crate::neighborhood::find_neighborhoods;
use crate::neighbors::{find_neighbors, FaceAreaConvention};
use crate::orientation::{find_average_orientations, voxel_quats};
use crate::phase::{PhaseSummary, PhaseTable};
use crate::response::{find_crystal_response, ResponseSettings};
use crate::statistics::{find_phase_statistics, PhaseStatistics, StatisticsSettings};
use crate::surface::{find_surface_grains, CropBox};
use serde::{Deserialize, Serialize};

/// Parameters of a characterization run.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CharacterizeSettings {
    /// Area of one shared voxel face.
    pub face_area: FaceAreaConvention,
    /// Kernel misorientation parameters.
    pub misorientation: MisorientationSettings,
    /// Loading and reference directions.
    pub response: ResponseSettings,
    /// Size binning and histogram switches.
    pub statistics: StatisticsSettings,
    /// Distance channels.
    pub distance: DistanceSettings,
}

impl CharacterizeSettings {
    /// Validate settings.
    pub fn validate(&self) -> Result<()> {
        self.misorientation.validate()?;
        self.response.validate()?;
        self.statistics.validate()?;
        Ok(())
    }
}

/// Result of [`characterize`].
#[derive(Debug, Clone)]
pub struct Characterization {
    /// Geometry of the characterized grid.
    pub geometry: Geometry,
    /// Every grain with its derived attributes.
    pub grains: GrainArena,
    /// Per-phase totals, indexed by phase id.
    pub phases: Vec<PhaseSummary>,
    /// Per-phase distributions, one per phase table entry.
    pub statistics: Vec<PhaseStatistics>,
    /// Per-voxel values.
    pub voxels: VoxelFields,
    /// Distance channels.
    pub distances: DistanceMaps,
    /// Deformation measures binned against the grain structure.
    pub deformation: DeformationStats,
    /// Extent of the assigned voxels.
    pub crop: CropBox,
    /// Shrunk bounding box.
    pub bounding_box: BoundingBox,
}

/// Characterize every grain of a microstructure.
///
/// Inputs are validated before any pass runs; afterwards the passes cannot
/// fail.
pub fn characterize(
    volume: &Microstructure,
    phases: &PhaseTable,
    settings: &CharacterizeSettings,
) -> Result<Characterization> {
    settings.validate()?;
    let max_id = volume.validate(phases)?;
    let geometry = &volume.geometry;
    log::info!(
        "characterizing {}x{}x{} grid, max grain id {}",
        geometry.dims[0],
        geometry.dims[1],
        geometry.dims[2],
        max_id
    );

    let slots = phases.slot_count();
    let mut grains = GrainArena::from_microstructure(volume);
    let crop = find_surface_grains(volume, &mut grains);
    let graph = find_neighbors(volume, &mut grains, settings.face_area, slots);

    let mut summaries = find_centroids(volume, &mut grains, slots);
    for (summary, area) in summaries.iter_mut().zip(&graph.total_boundary_area) {
        summary.total_boundary_area = *area;
    }
    find_moments(volume, &mut grains);
    find_axes(&mut grains, geometry.is_2d());
    find_axis_directions(&mut grains);
    find_neighborhoods(&mut grains);

    let quats = voxel_quats(volume, phases);
    find_average_orientations(volume, &mut grains, phases, &quats);
    let kam = kernel_misorientation(volume, phases, &quats, &settings.misorientation);
    let gam = grain_misorientation(volume, &mut grains, phases, &quats);
    let lmg = misorientation_gradient(volume, &gam, settings.misorientation.kernel_radius);
    let mdf = find_misorientations(&mut grains, phases, &graph.total_boundary_area);

    find_crystal_response(&mut grains, phases, &settings.response);

    let mut surface_voxel = graph.surface_voxel;
    let bounding_box = find_bounding_box_grains(volume, &mut grains, &crop, &mut surface_voxel);

    let statistics =
        find_phase_statistics(&grains, phases, &summaries, &mdf, &settings.statistics);
    let distances = find_distances(volume, &settings.distance);
    let voxels = VoxelFields {
        quats,
        kernel_misorientation: kam,
        grain_misorientation: gam,
        misorientation_gradient: lmg,
        surface_voxel,
    };
    let deformation = find_deformation_stats(volume, &grains, phases, &voxels, &distances);

    log::info!("characterized {} grains", grains.active_count());
    Ok(Characterization {
        geometry: *geometry,
        grains,
        phases: summaries,
        statistics,
        voxels,
        distances,
        deformation,
        crop,
        bounding_box,
    })
}
