//! Mesher configuration.

use serde::{Deserialize, Serialize};

use crate::error::MeshError;

/// How faces on the outer boundary of the world are treated.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EdgeBehavior {
    /// Outside the world counts as solid: no outward faces at the map edge.
    #[default]
    Solid,
    /// Outside the world counts as air: map-edge faces are emitted.
    Open,
}

impl EdgeBehavior {
    #[inline]
    pub fn is_solid(self) -> bool {
        self == EdgeBehavior::Solid
    }
}

/// Configuration for a meshing run.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MesherConfig {
    /// Treatment of the world boundary.
    pub edge_behavior: EdgeBehavior,

    /// Mesh chunks on the rayon thread pool. Output is identical either way.
    pub parallel: bool,
}

impl Default for MesherConfig {
    fn default() -> Self {
        Self {
            edge_behavior: EdgeBehavior::Solid,
            parallel: true,
        }
    }
}

impl MesherConfig {
    /// Single-threaded config (WASM, tests, tiny regions).
    pub fn sequential() -> Self {
        Self {
            parallel: false,
            ..Self::default()
        }
    }

    /// Config that emits faces on the world boundary.
    pub fn open_edges() -> Self {
        Self {
            edge_behavior: EdgeBehavior::Open,
            ..Self::default()
        }
    }

    /// Parse from TOML. Missing keys keep their defaults.
    ///
    /// ```
    /// use terrain_mesher::{EdgeBehavior, MesherConfig};
    ///
    /// let config = MesherConfig::from_toml_str("edge_behavior = \"open\"").unwrap();
    /// assert_eq!(config.edge_behavior, EdgeBehavior::Open);
    /// assert!(config.parallel);
    /// ```
    pub fn from_toml_str(text: &str) -> Result<Self, MeshError> {
        toml::from_str(text).map_err(|e| MeshError::InvalidConfig(e.to_string()))
    }
}
