//! The six planes bounding the container.
//!
//! Each wall is an anchor point plus a unit normal facing the interior, so a
//! point `y` is inside the container when `(y - anchor)·normal > 0` for all
//! six walls. Walls 0 and 1 are the near and far faces, 2 to 5 the sides
//! (left, right, bottom, top).
//!
//! Two container shapes are supported: an axis-aligned box centred on the
//! origin, and the truncated viewing frustum of a camera at the origin looking
//! down `-z`, which is what the screensaver bounces its bodies around in.

use super::error::{SimError, SimResult};
use super::states::NVec3;

pub const WALL_COUNT: usize = 6;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Wall {
    pub anchor: NVec3,
    pub normal: NVec3, // unit, pointing into the container
}

impl Wall {
    pub fn new(anchor: NVec3, normal: NVec3) -> Self {
        Self { anchor, normal }
    }

    /// Signed distance of `p` from the plane, positive inside.
    #[inline]
    pub fn distance(&self, p: &NVec3) -> f64 {
        (p - self.anchor).dot(&self.normal)
    }
}

/// Shape of the container the walls are built from.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Container {
    Frustum { fov_y: f64, aspect: f64, near: f64, far: f64 },
    Cuboid { half_extents: NVec3 },
}

impl Container {
    pub fn walls(&self) -> Walls {
        match *self {
            Container::Frustum { fov_y, aspect, near, far } => Walls::frustum(fov_y, aspect, near, far),
            Container::Cuboid { half_extents } => Walls::cuboid(half_extents),
        }
    }

    /// Reject shapes that enclose no volume.
    pub fn validate(&self) -> SimResult<()> {
        let ok = match *self {
            Container::Frustum { fov_y, aspect, near, far } => {
                fov_y > 0.0 && fov_y < std::f64::consts::PI && aspect > 0.0 && near > 0.0 && far > near
            }
            Container::Cuboid { half_extents } => half_extents.iter().all(|&h| h > 0.0),
        };
        if ok {
            Ok(())
        } else {
            Err(SimError::Config(format!("degenerate container {self:?}")))
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Walls {
    walls: [Wall; WALL_COUNT],
    lo: NVec3, // box enclosing the container, used for rejection sampling
    hi: NVec3,
}

impl Walls {
    /// Box `[-half, half]` on every axis. Near/far are the `+z`/`-z` faces.
    pub fn cuboid(half: NVec3) -> Self {
        let walls = [
            Wall::new(NVec3::new(0.0, 0.0, half.z), -NVec3::z()),
            Wall::new(NVec3::new(0.0, 0.0, -half.z), NVec3::z()),
            Wall::new(NVec3::new(-half.x, 0.0, 0.0), NVec3::x()),
            Wall::new(NVec3::new(half.x, 0.0, 0.0), -NVec3::x()),
            Wall::new(NVec3::new(0.0, -half.y, 0.0), NVec3::y()),
            Wall::new(NVec3::new(0.0, half.y, 0.0), -NVec3::y()),
        ];
        Self { walls, lo: -half, hi: half }
    }

    /// Frustum of a camera at the origin looking down `-z` with vertical field
    /// of view `fov_y` (radians), width/height `aspect`, clipped to
    /// `near..far` in front of the camera.
    pub fn frustum(fov_y: f64, aspect: f64, near: f64, far: f64) -> Self {
        let ty = (0.5 * fov_y).tan();
        let tx = ty * aspect;

        // side planes pass through the eye; inward normals tilt toward -z
        let side = |a: NVec3| a.normalize();
        let walls = [
            Wall::new(NVec3::new(0.0, 0.0, -near), -NVec3::z()),
            Wall::new(NVec3::new(0.0, 0.0, -far), NVec3::z()),
            Wall::new(NVec3::zeros(), side(NVec3::new(1.0, 0.0, -tx))),
            Wall::new(NVec3::zeros(), side(NVec3::new(-1.0, 0.0, -tx))),
            Wall::new(NVec3::zeros(), side(NVec3::new(0.0, 1.0, -ty))),
            Wall::new(NVec3::zeros(), side(NVec3::new(0.0, -1.0, -ty))),
        ];
        let lo = NVec3::new(-far * tx, -far * ty, -far);
        let hi = NVec3::new(far * tx, far * ty, -near);
        Self { walls, lo, hi }
    }

    pub fn get(&self, index: usize) -> &Wall {
        &self.walls[index]
    }

    pub fn iter(&self) -> impl Iterator<Item = &Wall> {
        self.walls.iter()
    }

    /// Replace wall `index`. The normal is normalized; a zero normal is the
    /// caller's problem and yields NaN distances.
    pub fn set_wall(&mut self, index: usize, anchor: NVec3, normal: NVec3) -> SimResult<()> {
        let wall = self
            .walls
            .get_mut(index)
            .ok_or_else(|| SimError::Config(format!("wall index {index} out of range 0..{WALL_COUNT}")))?;
        *wall = Wall::new(anchor, normal.normalize());
        Ok(())
    }

    /// Corners of a box enclosing the container.
    pub fn bounds(&self) -> (NVec3, NVec3) {
        (self.lo, self.hi)
    }

    /// Whether a sphere of `radius` at `p` sits entirely inside.
    pub fn contains(&self, p: &NVec3, radius: f64) -> bool {
        self.walls.iter().all(|w| w.distance(p) >= radius)
    }
}
