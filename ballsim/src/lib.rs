pub mod simulation;
pub mod configuration;
pub mod benchmark;

pub use simulation::error::{SimError, SimResult};
pub use simulation::states::{Bodies, Body, Motion, NVec3};
pub use simulation::walls::{Container, Wall, Walls, WALL_COUNT};
pub use simulation::kdtree::{KdTree, VisitOrder};
pub use simulation::collision::{bounce, wall_bounce};
pub use simulation::integrator::{advance_angular, advance_linear, apply_gravity, compute};
pub use simulation::random::XorShiftRng;
pub use simulation::engine::Engine;
pub use simulation::params::Parameters;
pub use simulation::scenario::{FrameStats, Scenario};

pub use configuration::config::{BodyConfig, ContainerConfig, EngineConfig, ParametersConfig, ScenarioConfig, VisitOrderConfig};

pub use benchmark::benchmark::{bench_collide, bench_collide_curve};
