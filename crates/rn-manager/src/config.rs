//! Road-routing configuration.
//!
//! # TOML format
//!
//! Every key is optional; missing keys take the defaults below.
//!
//! ```toml
//! enabled            = true
//! min_distance       = 200.0   # below this, walk straight
//! max_detour_ratio   = 1.5     # road trip ≤ ratio × straight line
//! max_entry_distance = 150.0   # search radius for the nearest road node
//! max_expansions     = 20000   # A* node-expansion cap
//! ```

use std::path::Path;

use serde::{Deserialize, Serialize};

use rn_spatial::pathfinder::DEFAULT_MAX_EXPANSIONS;

use crate::{ManagerError, ManagerResult};

/// Tunables for [`crate::RoadNetworkManager`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RoadNetworkConfig {
    /// Global feature switch.  When `false` every path request falls back to
    /// direct movement.
    pub enabled: bool,

    /// Straight-line trips shorter than this (world units) never use roads.
    pub min_distance: f32,

    /// Upper bound on `(road cost + entry distances) / straight-line distance`.
    pub max_detour_ratio: f32,

    /// Maximum distance from a trip endpoint to the road node it joins at.
    pub max_entry_distance: f32,

    /// Node-expansion cap handed to the default A* pathfinder.
    pub max_expansions: usize,
}

impl Default for RoadNetworkConfig {
    fn default() -> Self {
        Self {
            enabled:            true,
            min_distance:       200.0,
            max_detour_ratio:   1.5,
            max_entry_distance: 150.0,
            max_expansions:     DEFAULT_MAX_EXPANSIONS,
        }
    }
}

impl RoadNetworkConfig {
    /// Parse and validate a TOML document.
    pub fn from_toml_str(text: &str) -> ManagerResult<Self> {
        let config: Self = toml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    /// Read, parse and validate a TOML file.
    pub fn load(path: &Path) -> ManagerResult<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::from_toml_str(&text)
    }

    pub fn validate(&self) -> ManagerResult<()> {
        if !(self.min_distance >= 0.0) {
            return Err(ManagerError::Config(format!(
                "min_distance must be >= 0, got {}",
                self.min_distance
            )));
        }
        if !(self.max_detour_ratio > 0.0) {
            return Err(ManagerError::Config(format!(
                "max_detour_ratio must be > 0, got {}",
                self.max_detour_ratio
            )));
        }
        if !(self.max_entry_distance >= 0.0) {
            return Err(ManagerError::Config(format!(
                "max_entry_distance must be >= 0, got {}",
                self.max_entry_distance
            )));
        }
        if self.max_expansions == 0 {
            return Err(ManagerError::Config("max_expansions must be > 0".into()));
        }
        Ok(())
    }
}
