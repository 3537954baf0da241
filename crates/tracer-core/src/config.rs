use serde::{Deserialize, Serialize};

use crate::error::{Result, TracerError};

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TracerConfig {
    /// 0 silent, 1 seeding summary, 2 also per-step advection timing.
    pub verbose: u32,
    /// First horizontal index of the single column seeded per tile.
    pub seed_column: i32,
    /// Fractional position inside the seeded cell (0.5 = center). The
    /// vertical entry is relative to the terrain layer, not the cell.
    pub seed_offset: [f64; 3],
    /// Count particles that crossed more than one layer in a step.
    pub check_layer_crossings: bool,
}

impl Default for TracerConfig {
    fn default() -> Self {
        Self {
            verbose: 0,
            seed_column: 3,
            seed_offset: [0.5, 0.5, 0.5],
            check_layer_crossings: false,
        }
    }
}

impl TracerConfig {
    pub fn validate(&self) -> Result<()> {
        for (d, &r) in self.seed_offset.iter().enumerate() {
            if !(0.0..=1.0).contains(&r) {
                return Err(TracerError::InvalidConfig(format!(
                    "seed_offset[{d}] = {r} outside [0, 1]"
                )));
            }
        }
        Ok(())
    }
}
