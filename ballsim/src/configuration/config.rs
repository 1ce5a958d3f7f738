//! Configuration types for loading simulation scenarios from YAML.
//!
//! This module defines a thin, `serde`-deserializable representation of a
//! simulation scenario. A scenario consists of:
//!
//! - [`EngineConfig`]     – engine options (visiting order of the pair query)
//! - [`ContainerConfig`]  – shape of the container (frustum or box)
//! - [`ParametersConfig`] – population, physical constants and run length
//! - [`BodyConfig`]       – optional explicit initial state for each body
//! - [`ScenarioConfig`]   – top-level wrapper used to load a scenario from YAML
//!
//! # YAML format
//! An example scenario YAML matching these types:
//!
//! ```yaml
//! engine:
//!   visit_order: "inverse"  # or "shuffled"
//!
//! container:
//!   kind: "frustum"         # or "box" with half_extents: [x, y, z]
//!   fov_y: 0.8              # vertical field of view, radians
//!   aspect: 1.333
//!   near: 5.0
//!   far: 30.0
//!
//! parameters:
//!   frames: 600             # frames to run
//!   seed: 42                # deterministic seed
//!   count: 150              # bodies placed at random
//!   radius_min: 0.4
//!   radius_max: 0.8
//!   density: 1.0
//!   inertia_factor: 0.5     # optional, default 0.5
//!   speed: 0.05             # per frame
//!   spin: 0.02              # per frame
//!   friction: 0.2
//!   wall_friction: 0.2
//!   gravity: [0.0, 0.0, 0.0]  # optional
//!
//! bodies:                   # optional, replaces random placement
//!   - x: [ 0.0, 0.0, -10.0 ]
//!     v: [ 0.01, 0.0, 0.0 ]
//!     radius: 0.5
//! ```
//!
//! The engine then maps this configuration into its internal runtime scenario
//! representation (`Engine`, `Parameters`, `Container`, `Bodies`).

use serde::Deserialize;

/// Order bodies take their turn in the sphere-sphere query
/// `visit_order: "inverse"` or `visit_order: "shuffled"`
#[derive(Deserialize, Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum VisitOrderConfig {
    #[default]
    #[serde(rename = "inverse")] // inverse tree permutation, deterministic
    Inverse,

    #[serde(rename = "shuffled")] // fresh random permutation every frame
    Shuffled,
}

/// High-level engine configuration
#[derive(Deserialize, Debug, Default)]
pub struct EngineConfig {
    #[serde(default)]
    pub visit_order: VisitOrderConfig,
}

/// Shape of the container, selected by `kind`
#[derive(Deserialize, Debug, Clone, PartialEq)]
#[serde(tag = "kind")]
pub enum ContainerConfig {
    /// Truncated viewing frustum of a camera at the origin looking down -z
    #[serde(rename = "frustum")]
    Frustum {
        fov_y: f64,  // vertical field of view in radians
        aspect: f64, // width / height
        near: f64,   // distance of the near face
        far: f64,    // distance of the far face
    },

    /// Axis-aligned box centred on the origin
    #[serde(rename = "box")]
    Cuboid { half_extents: Vec<f64> },
}

fn default_inertia_factor() -> f64 {
    0.5
}

fn default_gravity() -> Vec<f64> {
    vec![0.0; 3]
}

/// Global numerical and physical parameters for a scenario
#[derive(Deserialize, Debug, Clone)]
pub struct ParametersConfig {
    pub frames: usize,    // frames to run
    pub seed: u64,        // deterministic seed to make runs reproducable
    #[serde(default)]
    pub count: usize,     // bodies placed at random, ignored with explicit bodies
    pub radius_min: f64,  // smallest random radius
    pub radius_max: f64,  // largest random radius
    pub density: f64,     // mass per squared radius
    #[serde(default = "default_inertia_factor")]
    pub inertia_factor: f64, // moment of inertia scale
    pub speed: f64,       // largest initial speed per frame
    #[serde(default)]
    pub spin: f64,        // largest initial angular speed per frame
    pub friction: f64,    // sphere-sphere friction coefficient
    pub wall_friction: f64, // sphere-wall friction coefficient
    #[serde(default = "default_gravity")]
    pub gravity: Vec<f64>, // constant velocity kick per frame
}

/// Configuration for a single body's initial state
#[derive(Deserialize, Debug, Clone)]
pub struct BodyConfig {
    pub x: Vec<f64>, // Initial position
    pub v: Vec<f64>, // Initial velocity per frame
    pub radius: f64, // Radius; mass and moment follow from it and the density
    #[serde(default)]
    pub w: Option<Vec<f64>>, // Initial angular velocity per frame, zero if absent
}

/// Top-level scenario configuration loaded from YAML.
#[derive(Deserialize, Debug)]
pub struct ScenarioConfig {
    #[serde(default)]
    pub engine: EngineConfig, // Engine-level configuration
    pub container: ContainerConfig, // Shape of the container
    pub parameters: ParametersConfig, // Global numerical and physical parameters
    #[serde(default)]
    pub bodies: Vec<BodyConfig>, // Explicit bodies; empty means random placement
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn minimal_box_scenario_fills_defaults() {
        let yaml = r#"
container:
  kind: "box"
  half_extents: [2.0, 2.0, 2.0]
parameters:
  frames: 5
  seed: 1
  count: 10
  radius_min: 0.1
  radius_max: 0.2
  density: 1.0
  speed: 0.01
  friction: 0.0
  wall_friction: 0.0
"#;
        let cfg: ScenarioConfig = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(cfg.engine.visit_order, VisitOrderConfig::Inverse);
        assert_eq!(cfg.container, ContainerConfig::Cuboid { half_extents: vec![2.0; 3] });
        assert_eq!(cfg.parameters.inertia_factor, 0.5);
        assert_eq!(cfg.parameters.gravity, vec![0.0; 3]);
        assert_eq!(cfg.parameters.spin, 0.0);
        assert!(cfg.bodies.is_empty());
    }

    #[test]
    fn unknown_container_kind_is_rejected() {
        let yaml = r#"
container:
  kind: "sphere"
parameters:
  frames: 5
  seed: 1
  radius_min: 0.1
  radius_max: 0.2
  density: 1.0
  speed: 0.01
  friction: 0.0
  wall_friction: 0.0
"#;
        assert!(serde_yaml::from_str::<ScenarioConfig>(yaml).is_err());
    }
}
