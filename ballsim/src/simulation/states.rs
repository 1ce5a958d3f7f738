//! Core state types for the sphere simulation.
//!
//! Bodies live in parallel columns (`Bodies`) indexed `0..count`:
//! position `x`, velocity `v`, orientation `u` (axis-angle), angular velocity
//! `w`, radius `r`, mass `m` and moment of inertia `l`. The columns are grown
//! together through [`storage::grow_columns`](super::storage::grow_columns)
//! and always share one length.
//!
//! `Body` is the single-body view used to read or write one slot.

use nalgebra::Vector3;

use super::error::{SimError, SimResult};
use super::storage;

pub type NVec3 = Vector3<f64>;

/// One rigid sphere.
#[derive(Debug, Clone, PartialEq)]
pub struct Body {
    pub x: NVec3, // position
    pub v: NVec3, // velocity, per frame
    pub u: NVec3, // orientation (axis * angle)
    pub w: NVec3, // angular velocity (axis * angle per frame)
    pub radius: f64,
    pub mass: f64,
    pub moment: f64, // moment of inertia
}

impl Body {
    /// A sphere whose mass and moment follow from its radius:
    /// `m = density·r²`, `l = inertia_factor·density·r⁴`.
    pub fn sphere(x: NVec3, v: NVec3, radius: f64, density: f64, inertia_factor: f64) -> Self {
        let r2 = radius * radius;
        Self {
            x,
            v,
            u: NVec3::zeros(),
            w: NVec3::zeros(),
            radius,
            mass: density * r2,
            moment: inertia_factor * density * r2 * r2,
        }
    }

    pub fn with_spin(mut self, w: NVec3) -> Self {
        self.w = w;
        self
    }
}

/// Mutable velocities next to the read-only physical constants, handed to the
/// collision response while positions stay borrowed by the spatial index.
pub struct Motion<'a> {
    pub v: &'a mut [NVec3],
    pub w: &'a mut [NVec3],
    pub r: &'a [f64],
    pub m: &'a [f64],
    pub l: &'a [f64],
}

/// All bodies of a simulation as parallel columns.
#[derive(Debug, Clone, Default)]
pub struct Bodies {
    count: usize,
    max_radius: f64, // largest radius among the live bodies
    pub(crate) x: Vec<NVec3>,
    pub(crate) v: Vec<NVec3>,
    pub(crate) u: Vec<NVec3>,
    pub(crate) w: Vec<NVec3>,
    pub(crate) r: Vec<f64>,
    pub(crate) m: Vec<f64>,
    pub(crate) l: Vec<f64>,
}

impl Bodies {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of live bodies.
    pub fn count(&self) -> usize {
        self.count
    }

    /// Common length of every column.
    pub fn capacity(&self) -> usize {
        self.x.len()
    }

    /// Largest radius among the live bodies.
    pub fn max_radius(&self) -> f64 {
        self.max_radius
    }

    /// Grow every column to hold at least `count` bodies, keeping contents.
    pub fn grow_capacity(&mut self, count: usize) -> SimResult<()> {
        storage::grow_columns(
            &mut [
                &mut self.x,
                &mut self.v,
                &mut self.u,
                &mut self.w,
                &mut self.r,
                &mut self.m,
                &mut self.l,
            ],
            count,
        )?;
        Ok(())
    }

    /// Change the number of live bodies. Capacity must already be there.
    pub fn set_count(&mut self, count: usize) -> SimResult<()> {
        if count > self.capacity() {
            return Err(SimError::Config(format!(
                "count {count} exceeds capacity {}",
                self.capacity()
            )));
        }
        self.count = count;
        self.max_radius = self.r[..count].iter().copied().fold(0.0, f64::max);
        Ok(())
    }

    /// Overwrite slot `n` (which must be below `count`).
    pub fn set(&mut self, n: usize, body: &Body) {
        self.x[n] = body.x;
        self.v[n] = body.v;
        self.u[n] = body.u;
        self.w[n] = body.w;
        self.r[n] = body.radius;
        self.m[n] = body.mass;
        self.l[n] = body.moment;
        self.max_radius = self.max_radius.max(body.radius);
    }

    pub fn get(&self, n: usize) -> Body {
        Body {
            x: self.x[n],
            v: self.v[n],
            u: self.u[n],
            w: self.w[n],
            radius: self.r[n],
            mass: self.m[n],
            moment: self.l[n],
        }
    }

    pub fn positions(&self) -> &[NVec3] {
        &self.x[..self.count]
    }

    pub fn velocities(&self) -> &[NVec3] {
        &self.v[..self.count]
    }

    pub fn orientations(&self) -> &[NVec3] {
        &self.u[..self.count]
    }

    pub fn angular_velocities(&self) -> &[NVec3] {
        &self.w[..self.count]
    }

    pub fn radii(&self) -> &[f64] {
        &self.r[..self.count]
    }

    /// Positions for reading alongside mutable velocities.
    pub fn split_motion(&mut self) -> (&[NVec3], Motion<'_>) {
        let n = self.count;
        (
            &self.x[..n],
            Motion {
                v: &mut self.v[..n],
                w: &mut self.w[..n],
                r: &self.r[..n],
                m: &self.m[..n],
                l: &self.l[..n],
            },
        )
    }

    // diagnostics ==========================================================================

    /// Total kinetic energy, linear plus rotational.
    pub fn kinetic_energy(&self) -> f64 {
        let n = self.count;
        (0..n)
            .map(|i| {
                0.5 * self.m[i] * self.v[i].norm_squared() + 0.5 * self.l[i] * self.w[i].norm_squared()
            })
            .sum()
    }

    /// Total linear momentum.
    pub fn momentum(&self) -> NVec3 {
        (0..self.count).map(|i| self.v[i] * self.m[i]).sum()
    }

    /// Total angular momentum about the origin, orbital plus spin.
    pub fn angular_momentum(&self) -> NVec3 {
        (0..self.count)
            .map(|i| self.x[i].cross(&self.v[i]) * self.m[i] + self.w[i] * self.l[i])
            .sum()
    }
}
