//! Per-grain Schmid factors and inverse pole figure colors.

use crate::error::{MicrostatError, Result};
use crate::grain::GrainArena;
use crate::phase::PhaseTable;
use microstat_math::Vec3;
use serde::{Deserialize, Serialize};

/// Sample directions for the crystal response.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ResponseSettings {
    /// Loading axis for the Schmid factor.
    pub loading_direction: [f64; 3],
    /// Sample direction colored in the inverse pole figure, sample Y unless
    /// configured.
    pub reference_direction: [f64; 3],
}

impl Default for ResponseSettings {
    fn default() -> Self {
        Self {
            loading_direction: [0.0, 0.0, 1.0],
            reference_direction: [0.0, 1.0, 0.0],
        }
    }
}

impl ResponseSettings {
    /// Validate settings.
    pub fn validate(&self) -> Result<()> {
        for (name, dir) in [
            ("loading_direction", self.loading_direction),
            ("reference_direction", self.reference_direction),
        ] {
            let v = Vec3::from(dir);
            if !(v.norm() > 0.0 && v.iter().all(|c| c.is_finite())) {
                return Err(MicrostatError::InvalidSettings(format!(
                    "{name} must be a finite non-zero vector"
                )));
            }
        }
        Ok(())
    }
}

/// Fill the IPF color, Schmid factor and slip system of every grain from
/// its average orientation.
///
/// Grains of a phase without symmetry operations, or whose class defines no
/// slip systems, keep a zero Schmid factor.
pub fn find_crystal_response(
    grains: &mut GrainArena,
    phases: &PhaseTable,
    settings: &ResponseSettings,
) {
    let load = Vec3::from(settings.loading_direction);
    let reference = Vec3::from(settings.reference_direction);
    for (_, grain) in grains.active_mut() {
        let Some(ops) = phases.ops(grain.phase) else {
            grain.ipf_color = [0; 3];
            grain.schmid_factor = 0.0;
            grain.slip_system = 0;
            continue;
        };
        grain.ipf_color = ops.ipf_color(&grain.avg_quat, &reference);
        match ops.schmid_factor(&grain.avg_quat, &load) {
            Some(sf) => {
                grain.schmid_factor = sf.factor;
                grain.slip_system = sf.slip_system;
            }
            None => {
                grain.schmid_factor = 0.0;
                grain.slip_system = 0;
            }
        }
    }
}
