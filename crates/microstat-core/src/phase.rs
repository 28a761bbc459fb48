//! Phase descriptions and per-phase volume/boundary totals.

use microstat_symmetry::{ops_for, CrystalStructure, LaueOps};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Role of a phase in the microstructure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PhaseType {
    /// Primary (majority) phase.
    #[default]
    Primary,
    /// Second-phase precipitates.
    Precipitate,
    /// Transformation product.
    Transformation,
    /// Matrix phase.
    Matrix,
    /// Boundary phase.
    Boundary,
    /// Not specified.
    Unknown,
}

/// One entry of the phase table.
#[derive(Debug, Clone)]
pub struct PhaseInfo {
    /// Crystal structure of the phase.
    pub structure: CrystalStructure,
    /// Role of the phase.
    pub phase_type: PhaseType,
    /// Symmetry capability; `None` for an unknown structure.
    pub ops: Option<Arc<dyn LaueOps>>,
}

impl PhaseInfo {
    /// Phase with the built-in symmetry operations for `structure`.
    pub fn new(structure: CrystalStructure, phase_type: PhaseType) -> Self {
        Self {
            structure,
            phase_type,
            ops: ops_for(structure),
        }
    }

    /// Primary phase of the given structure.
    pub fn primary(structure: CrystalStructure) -> Self {
        Self::new(structure, PhaseType::Primary)
    }

    /// Phase with caller-supplied symmetry operations.
    pub fn with_ops(ops: Arc<dyn LaueOps>, phase_type: PhaseType) -> Self {
        Self {
            structure: ops.structure(),
            phase_type,
            ops: Some(ops),
        }
    }
}

/// Phases of a run, addressed by 1-based phase id.
#[derive(Debug, Clone, Default)]
pub struct PhaseTable {
    entries: Vec<PhaseInfo>,
}

impl PhaseTable {
    /// Table whose first entry is phase 1.
    pub fn new(entries: Vec<PhaseInfo>) -> Self {
        Self { entries }
    }

    /// Look up a phase id.
    pub fn get(&self, phase: i32) -> Option<&PhaseInfo> {
        if phase < 1 {
            return None;
        }
        self.entries.get(phase as usize - 1)
    }

    /// Symmetry operations of a phase, if it has any.
    pub fn ops(&self, phase: i32) -> Option<&dyn LaueOps> {
        self.get(phase).and_then(|p| p.ops.as_deref())
    }

    /// Number of phases.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the table is empty.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Length of per-phase arrays indexed by phase id (slot 0 unused).
    pub fn slot_count(&self) -> usize {
        self.entries.len() + 1
    }

    /// Phase ids with their entries.
    pub fn iter(&self) -> impl Iterator<Item = (i32, &PhaseInfo)> {
        self.entries
            .iter()
            .enumerate()
            .map(|(i, p)| (i as i32 + 1, p))
    }
}

/// Per-phase totals collected by the grain passes.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PhaseSummary {
    /// Sum of grain volumes.
    pub total_volume: f64,
    /// Share of the total grain volume.
    pub fraction: f64,
    /// Smallest equivalent diameter.
    pub min_diameter: f64,
    /// Largest equivalent diameter.
    pub max_diameter: f64,
    /// Grain boundary area attributed to the phase.
    pub total_boundary_area: f64,
    /// Number of active grains.
    pub grain_count: usize,
}
