//! Build fully-initialized simulation scenarios from configuration
//!
//! Takes a `ScenarioConfig` (YAML-facing) and produces the runtime bundle
//! `Scenario`, containing:
//! - engine settings (`Engine`)
//! - numerical parameters (`Parameters`)
//! - body state (`Bodies`), placed at random or taken from the file
//! - the container walls, the spatial index and the session RNG
//!
//! A `Scenario` is then driven one frame at a time with [`Scenario::step`]:
//! gravity kick and drift, tree rebuild plus collision response, orientation
//! update.

use nalgebra::Matrix4;
use tracing::{debug, info, trace, warn};

use crate::configuration::config::{BodyConfig, ContainerConfig, ScenarioConfig, VisitOrderConfig};
use crate::simulation::collision;
use crate::simulation::engine::Engine;
use crate::simulation::error::{SimError, SimResult};
use crate::simulation::integrator;
use crate::simulation::kdtree::{KdTree, VisitOrder};
use crate::simulation::params::Parameters;
use crate::simulation::random::XorShiftRng;
use crate::simulation::select;
use crate::simulation::states::{Bodies, Body, NVec3};
use crate::simulation::walls::{Container, Walls};

/// Draws per body before random placement gives up.
pub const PLACEMENT_ATTEMPTS: usize = 10_000;

/// Contacts resolved during one frame.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FrameStats {
    pub frame: u64,
    pub sphere_contacts: usize,
    pub wall_contacts: usize,
}

/// Runtime bundle of one simulation session.
#[derive(Debug, Clone)]
pub struct Scenario {
    pub engine: Engine,
    pub parameters: Parameters,
    container: Container,
    walls: Walls,
    bodies: Bodies,
    tree: KdTree,
    rng: XorShiftRng,
    draw_order: Vec<usize>, // back-to-front, kept nearly sorted across frames
    frame: u64,
}

impl Scenario {
    pub fn build_scenario(cfg: ScenarioConfig) -> SimResult<Self> {
        // Engine (runtime) from EngineConfig
        let engine = Engine {
            visit_order: match cfg.engine.visit_order {
                VisitOrderConfig::Inverse => VisitOrder::InverseIndex,
                VisitOrderConfig::Shuffled => VisitOrder::Shuffled,
            },
        };

        // Container (runtime) from ContainerConfig
        let container = match cfg.container {
            ContainerConfig::Frustum { fov_y, aspect, near, far } => {
                Container::Frustum { fov_y, aspect, near, far }
            }
            ContainerConfig::Cuboid { half_extents } => Container::Cuboid {
                half_extents: vec3("half_extents", &half_extents)?,
            },
        };

        // Parameters (runtime) from ParametersConfig
        let p_cfg = cfg.parameters;
        let parameters = Parameters {
            frames: p_cfg.frames,
            seed: p_cfg.seed,
            count: p_cfg.count,
            radius_min: p_cfg.radius_min,
            radius_max: p_cfg.radius_max,
            density: p_cfg.density,
            inertia_factor: p_cfg.inertia_factor,
            speed: p_cfg.speed,
            spin: p_cfg.spin,
            friction: p_cfg.friction,
            wall_friction: p_cfg.wall_friction,
            gravity: vec3("gravity", &p_cfg.gravity)?,
        };

        if cfg.bodies.is_empty() {
            Self::random(engine, parameters, container)
        } else {
            // Bodies: map `BodyConfig` -> runtime `Body` using nalgebra vectors
            let bodies = cfg
                .bodies
                .iter()
                .map(|bc| body_from_config(bc, &parameters))
                .collect::<SimResult<Vec<Body>>>()?;
            Self::with_bodies(engine, parameters, container, &bodies)
        }
    }

    /// Scenario with `parameters.count` bodies scattered by rejection
    /// sampling against the walls.
    pub fn random(engine: Engine, parameters: Parameters, container: Container) -> SimResult<Self> {
        let mut scenario = Self::empty(engine, parameters, container)?;
        let count = scenario.parameters.count;
        scenario.grow_capacity(count)?;
        scenario.bodies.set_count(count)?;

        let (lo, hi) = scenario.walls.bounds();
        let p = &scenario.parameters;
        for n in 0..count {
            let radius = scenario.rng.range(p.radius_min, p.radius_max);
            let x = (0..PLACEMENT_ATTEMPTS)
                .map(|_| scenario.rng.in_box(&lo, &hi))
                .find(|x| scenario.walls.contains(x, radius))
                .ok_or(SimError::Placement { body: n, attempts: PLACEMENT_ATTEMPTS })?;
            let v = scenario.rng.in_unit_ball() * p.speed;
            let spin = scenario.rng.direction() * scenario.rng.range(0.0, p.spin);
            let mut body = Body::sphere(x, v, radius, p.density, p.inertia_factor).with_spin(spin);
            body.u = scenario.rng.direction() * scenario.rng.range(0.0, std::f64::consts::PI);
            scenario.bodies.set(n, &body);
        }

        info!(
            count,
            max_radius = scenario.bodies.max_radius(),
            container = ?scenario.container,
            "scenario placed at random"
        );
        Ok(scenario)
    }

    /// Scenario holding exactly `bodies`.
    pub fn with_bodies(
        engine: Engine,
        parameters: Parameters,
        container: Container,
        bodies: &[Body],
    ) -> SimResult<Self> {
        let mut scenario = Self::empty(engine, parameters, container)?;
        scenario.grow_capacity(bodies.len())?;
        scenario.bodies.set_count(bodies.len())?;
        for (n, body) in bodies.iter().enumerate() {
            if !scenario.walls.contains(&body.x, body.radius) {
                warn!(body = n, x = ?body.x, "body starts outside the container");
            }
            scenario.bodies.set(n, body);
        }
        scenario.parameters.count = bodies.len();

        info!(count = bodies.len(), container = ?scenario.container, "scenario built from explicit bodies");
        Ok(scenario)
    }

    fn empty(engine: Engine, parameters: Parameters, container: Container) -> SimResult<Self> {
        parameters.validate()?;
        container.validate()?;
        let rng = XorShiftRng::new(parameters.seed);
        Ok(Self {
            engine,
            parameters,
            container,
            walls: container.walls(),
            bodies: Bodies::new(),
            tree: KdTree::new(),
            rng,
            draw_order: Vec::new(),
            frame: 0,
        })
    }

    // =====================================================================================
    // accessors
    // =====================================================================================

    pub fn bodies(&self) -> &Bodies {
        &self.bodies
    }

    pub fn walls(&self) -> &Walls {
        &self.walls
    }

    pub fn container(&self) -> &Container {
        &self.container
    }

    pub fn tree(&self) -> &KdTree {
        &self.tree
    }

    /// Frames stepped so far.
    pub fn frame(&self) -> u64 {
        self.frame
    }

    // =====================================================================================
    // sizing and container
    // =====================================================================================

    /// Make room for `count` bodies in every per-body and per-node array.
    pub fn grow_capacity(&mut self, count: usize) -> SimResult<()> {
        self.tree.grow_capacity(count)?;
        self.bodies.grow_capacity(count)?;
        Ok(())
    }

    /// Replace wall `index` (0 near, 1 far, 2..=5 sides).
    pub fn set_wall(&mut self, index: usize, anchor: NVec3, normal: NVec3) -> SimResult<()> {
        self.walls.set_wall(index, anchor, normal)
    }

    /// Rebuild all six walls for a new container shape, e.g. after the
    /// viewport aspect changed. Bodies are left where they are.
    pub fn resize_container(&mut self, container: Container) -> SimResult<()> {
        container.validate()?;
        self.container = container;
        self.walls = container.walls();
        info!(container = ?self.container, "container resized");
        Ok(())
    }

    // =====================================================================================
    // frame pipeline
    // =====================================================================================

    /// Run one frame: kick and drift, collide, turn.
    pub fn step(&mut self) -> SimResult<FrameStats> {
        self.advance_linear();
        let mut stats = self.rebuild_and_collide()?;
        self.advance_angular();

        self.frame += 1;
        stats.frame = self.frame;
        debug!(
            frame = stats.frame,
            sphere_contacts = stats.sphere_contacts,
            wall_contacts = stats.wall_contacts,
            "frame done"
        );
        Ok(stats)
    }

    /// Rebuild the spatial index over the current positions and resolve every
    /// sphere-sphere and sphere-wall contact in place.
    pub fn rebuild_and_collide(&mut self) -> SimResult<FrameStats> {
        let mut stats = FrameStats { frame: self.frame, ..FrameStats::default() };
        self.tree.build(self.bodies.positions())?;

        let max_radius = self.bodies.max_radius();
        let friction = self.parameters.friction;
        let wall_friction = self.parameters.wall_friction;
        let (x, mut motion) = self.bodies.split_motion();

        self.tree.for_each_pair(x, 2.0 * max_radius, self.engine.visit_order, &mut self.rng, |a, b| {
            if collision::bounce(x, &mut motion, a, b, friction) {
                stats.sphere_contacts += 1;
            }
        });

        for wall in self.walls.iter() {
            self.tree.for_each_near_wall(wall, max_radius, |n| {
                if collision::wall_bounce(&x[n], &mut motion, n, wall, wall_friction) {
                    stats.wall_contacts += 1;
                }
            });
        }
        Ok(stats)
    }

    /// Linear then angular update over all bodies, without collisions.
    pub fn advance(&mut self) {
        self.advance_linear();
        self.advance_angular();
    }

    fn advance_linear(&mut self) {
        let n = self.bodies.count();
        if self.parameters.gravity != NVec3::zeros() {
            integrator::apply_gravity(&mut self.bodies.v[..n], &self.parameters.gravity);
        }
        integrator::advance_linear(&mut self.bodies.x[..n], &self.bodies.v[..n]);
    }

    fn advance_angular(&mut self) {
        let n = self.bodies.count();
        integrator::advance_angular(&mut self.bodies.u[..n], &self.bodies.w[..n]);
    }

    // =====================================================================================
    // render side
    // =====================================================================================

    /// Model transform of body `n`.
    pub fn compute(&self, n: usize) -> Matrix4<f64> {
        integrator::compute(&self.bodies.x[n], &self.bodies.u[n])
    }

    /// Model transforms of all bodies, in body order.
    pub fn transforms(&self) -> impl Iterator<Item = Matrix4<f64>> + '_ {
        self.bodies
            .positions()
            .iter()
            .zip(self.bodies.orientations())
            .map(|(x, u)| integrator::compute(x, u))
    }

    /// Body ids ordered back to front (ascending `z`, the camera looks down
    /// `-z`).
    pub fn draw_order(&mut self) -> &[usize] {
        let n = self.bodies.count();
        if self.draw_order.len() != n {
            self.draw_order = (0..n).collect();
        }
        let x = &self.bodies.x;
        if !select::resort(&mut self.draw_order, |b| x[b].z) {
            trace!(frame = self.frame, "draw order drifted, fully re-sorted");
        }
        &self.draw_order
    }
}

fn vec3(name: &str, values: &[f64]) -> SimResult<NVec3> {
    match values {
        [x, y, z] => Ok(NVec3::new(*x, *y, *z)),
        _ => Err(SimError::Config(format!("{name} needs 3 components, got {}", values.len()))),
    }
}

fn body_from_config(bc: &BodyConfig, p: &Parameters) -> SimResult<Body> {
    if !(bc.radius > 0.0) {
        return Err(SimError::Config(format!("body radius {} is not positive", bc.radius)));
    }
    let w = match &bc.w {
        Some(w) => vec3("w", w)?,
        None => NVec3::zeros(),
    };
    Ok(Body::sphere(vec3("x", &bc.x)?, vec3("v", &bc.v)?, bc.radius, p.density, p.inertia_factor).with_spin(w))
}
