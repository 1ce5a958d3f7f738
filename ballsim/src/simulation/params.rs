//! Numerical and physical parameters for the simulation
//!
//! `Parameters` holds runtime settings:
//! - how many frames to run and the session seed,
//! - the body population (count, radius range, density, inertia scaling),
//! - initial speed and spin scales,
//! - friction against other bodies and against the walls,
//! - an optional constant gravity kick per frame

use super::error::{SimError, SimResult};
use super::states::NVec3;

#[derive(Debug, Clone)]
pub struct Parameters {
    pub frames: usize, // frames to run
    pub seed: u64, // deterministic seed
    pub count: usize, // bodies placed at random
    pub radius_min: f64, // radii drawn uniformly from [radius_min, radius_max)
    pub radius_max: f64,
    pub density: f64, // m = density r^2
    pub inertia_factor: f64, // l = inertia_factor density r^4
    pub speed: f64, // largest initial speed, per frame
    pub spin: f64, // largest initial angular speed, per frame
    pub friction: f64, // sphere-sphere
    pub wall_friction: f64, // sphere-wall
    pub gravity: NVec3, // added to every velocity each frame
}

impl Parameters {
    pub fn validate(&self) -> SimResult<()> {
        let check = |ok: bool, what: &str| {
            if ok {
                Ok(())
            } else {
                Err(SimError::Config(what.to_string()))
            }
        };
        check(self.radius_min > 0.0, "radius_min must be positive")?;
        check(self.radius_max >= self.radius_min, "radius_max must not be below radius_min")?;
        check(self.density > 0.0, "density must be positive")?;
        check(self.inertia_factor > 0.0, "inertia_factor must be positive")?;
        check(self.speed >= 0.0 && self.spin >= 0.0, "speed and spin must not be negative")?;
        check((0.0..=1.0).contains(&self.friction), "friction must lie in [0, 1]")?;
        check((0.0..=1.0).contains(&self.wall_friction), "wall_friction must lie in [0, 1]")?;
        check(self.gravity.iter().all(|g| g.is_finite()), "gravity must be finite")
    }
}
