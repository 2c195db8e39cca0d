//! Tolerances for the resolvers and the aggregate world configuration

use super::solver::DEFAULT_DEPENDENCE_EPSILON;
use crate::config::{Config, ConfigError};
use crate::spatial::OctreeConfig;
use serde::{Deserialize, Serialize};

/// Numeric tolerances used by the narrow phase
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CollisionConfig {
    /// Slack subtracted from `radius²` in the sphere-plane penetration test
    pub plane_epsilon: f32,

    /// Relative determinant below which a plane basis counts as degenerate
    pub solver_epsilon: f32,
}

impl Default for CollisionConfig {
    fn default() -> Self {
        Self {
            plane_epsilon: 1e-5,
            solver_epsilon: DEFAULT_DEPENDENCE_EPSILON,
        }
    }
}

impl Config for CollisionConfig {
    fn validate(&self) -> Result<(), ConfigError> {
        for (name, value) in [
            ("plane_epsilon", self.plane_epsilon),
            ("solver_epsilon", self.solver_epsilon),
        ] {
            if !value.is_finite() || value < 0.0 {
                return Err(ConfigError::Invalid(format!(
                    "{name} must be finite and non-negative, got {value}"
                )));
            }
        }
        Ok(())
    }
}

/// Everything a [`CollisionWorld`](super::CollisionWorld) needs to be built
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WorldConfig {
    /// Spatial index layout
    pub octree: OctreeConfig,

    /// Narrow-phase tolerances
    pub collision: CollisionConfig,
}

impl Config for WorldConfig {
    fn validate(&self) -> Result<(), ConfigError> {
        self.octree.validate()?;
        self.collision.validate()
    }
}
