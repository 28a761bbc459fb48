//! Error types for grain characterization.

use thiserror::Error;

/// Errors that can occur while characterizing a microstructure.
///
/// All of these are raised before any pass runs; the passes themselves
/// resolve degenerate cases to zeroed statistics instead of failing.
#[derive(Error, Debug)]
pub enum MicrostatError {
    /// A per-voxel array does not match the grid size.
    #[error("{field} has {actual} entries, expected {expected}")]
    SizeMismatch {
        /// Name of the offending array.
        field: &'static str,
        /// Voxel count implied by the grid dimensions.
        expected: usize,
        /// Length of the array.
        actual: usize,
    },

    /// Grid has a zero dimension.
    #[error("invalid grid dimensions {0:?}")]
    InvalidDimensions([usize; 3]),

    /// Voxel spacing is not positive and finite.
    #[error("invalid voxel spacing {0:?}")]
    InvalidSpacing([f64; 3]),

    /// No voxel carries a positive grain id.
    #[error("volume contains no grains")]
    NoGrains,

    /// A grain voxel refers to a phase with no entry in the phase table.
    #[error("voxel {voxel} has phase {phase}, which is not in the phase table")]
    UnknownPhase {
        /// Voxel index.
        voxel: usize,
        /// Phase id found.
        phase: i32,
    },

    /// A voxel carries a negative grain id.
    #[error("voxel {voxel} has negative grain id {id}")]
    NegativeGrainId {
        /// Voxel index.
        voxel: usize,
        /// Grain id found.
        id: i32,
    },

    /// Invalid characterization settings.
    #[error("invalid settings: {0}")]
    InvalidSettings(String),

    /// Writing a report failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Serializing a report failed.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Result type for characterization operations.
pub type Result<T> = std::result::Result<T, MicrostatError>;
