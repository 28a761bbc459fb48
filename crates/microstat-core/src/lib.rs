#![warn(missing_docs)]

//! Grain characterization for voxelized polycrystalline microstructures.
//!
//! Given a grid where every voxel carries a grain id, a phase id and Bunge
//! Euler angles, this crate derives per-grain topology (neighbors and shared
//! boundary area), geometry (centroid, volume, best-fit ellipsoid, shape
//! factor), average orientation, and local, intragranular and grain-pair
//! misorientation, then aggregates them into per-phase distributions and
//! deformation trend tables.
//!
//! # Example
//!
//! ```ignore
//! use microstat_core::{characterize, CharacterizeSettings, Geometry, Microstructure};
//! use microstat_core::{PhaseInfo, PhaseTable};
//! use microstat_symmetry::CrystalStructure;
//!
//! let geometry = Geometry::new([2, 2, 2], [1.0; 3]);
//! let volume = Microstructure::single_phase(geometry, vec![1, 1, 1, 1, 2, 2, 2, 2]);
//! let phases = PhaseTable::new(vec![PhaseInfo::primary(CrystalStructure::Cubic)]);
//! let result = characterize(&volume, &phases, &CharacterizeSettings::default())?;
//!
//! println!("Grains: {}", result.grains.active_count());
//! println!("Phase 1 fraction: {:.3}", result.phases[1].fraction);
//! ```

pub mod bounds;
pub mod deformation;
pub mod distance;
pub mod error;
pub mod grain;
pub mod grid;
pub mod misorientation;
pub mod moments;
pub mod neighborhood;
pub mod neighbors;
pub mod orientation;
pub mod phase;
pub mod pipeline;
pub mod report;
pub mod response;
pub mod statistics;
pub mod surface;

pub use bounds::{find_bounding_box_grains, BoundingBox};
pub use deformation::{
    find_deformation_stats, grain_across, DeformationStats, TrendBin, DISTRIBUTION_BINS, TREND_BINS,
};
pub use distance::{find_distances, DistanceMap, DistanceMaps, DistanceSettings, Feature};
pub use error::{MicrostatError, Result};
pub use grain::{Grain, GrainArena};
pub use grid::{Geometry, Microstructure, VoxelFields};
pub use misorientation::{
    find_misorientations, grain_misorientation, kernel_misorientation, misorientation_gradient,
    MisorientationSettings, CROSS_PHASE_SENTINEL,
};
pub use moments::{
    find_axes, find_axis_directions, find_centroids, find_moments, omega3, principal_shape,
    InertiaTensor, PrincipalShape,
};
pub use neighborhood::find_neighborhoods;
pub use neighbors::{counts_toward_total, find_neighbors, FaceAreaConvention, NeighborGraph};
pub use orientation::{find_average_orientations, voxel_quats};
pub use phase::{PhaseInfo, PhaseSummary, PhaseTable, PhaseType};
pub use pipeline::{characterize, CharacterizeSettings, Characterization};
pub use report::{
    grain_table_columns, write_deformation_json, write_grain_table, write_statistics_json,
    ReportSettings,
};
pub use response::{find_crystal_response, ResponseSettings};
pub use statistics::{
    find_phase_statistics, BetaFit, MeanStd, PhaseStatistics, SizeBin, StatisticsSettings,
};
pub use surface::{find_surface_grains, CropBox};
