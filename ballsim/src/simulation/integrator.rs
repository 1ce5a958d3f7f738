//! Fixed-step integrators for the sphere simulation
//!
//! Velocities are pre-scaled to one frame, so every step is a unit step:
//! - [`apply_gravity`] / [`advance_linear`]: kick then drift, `x += v`
//! - [`advance_angular`]: compose each orientation with its angular velocity
//! - [`compute`]: the 4x4 transform handed to the renderer
//!
//! Orientations are axis-angle vectors. Composing two rotations in that form
//! has no closed form valid everywhere, so `advance_angular` integrates
//! the tangent equation
//!
//! ```text
//! du/dt = J⁻¹(u) w,   J⁻¹(u) = I - ½[u]× + c(θ)[u]×²,   θ = |u|
//! c(θ) = 1/θ² - 1/(2θ tan(θ/2))
//! ```
//!
//! with one midpoint step per frame, then folds `u` back to length ≤ π.

use std::f64::consts::{PI, TAU};

use nalgebra::{Isometry3, Matrix4};

use super::states::NVec3;

// fold once |u|² passes this, a hair above π² to avoid flip-flopping at π
const FOLD_THRESHOLD: f64 = PI * PI + 1e-9;

// below this θ², c(θ) comes from its Taylor series
const SERIES_LIMIT: f64 = 1e-6;

/// `v[n] += g` for every body.
pub fn apply_gravity(v: &mut [NVec3], g: &NVec3) {
    for vn in v.iter_mut() {
        *vn += g;
    }
}

/// Drift: `x[n] += v[n]` for every body.
pub fn advance_linear(x: &mut [NVec3], v: &[NVec3]) {
    for (xn, vn) in x.iter_mut().zip(v) {
        *xn += vn;
    }
}

/// Compose every orientation `u[n]` with one frame of angular velocity
/// `w[n]`, keeping `|u| ≤ π`.
pub fn advance_angular(u: &mut [NVec3], w: &[NVec3]) {
    for (un, wn) in u.iter_mut().zip(w) {
        *un = fold(compose(un, wn));
    }
}

/// Second-order composition of orientation `u` with rotation `w`.
pub fn compose(u: &NVec3, w: &NVec3) -> NVec3 {
    let k1 = tangent(u, w);
    let mid = u + k1 * 0.5;
    u + tangent(&mid, w)
}

/// Rate of change of the axis-angle vector `u` under angular velocity `w`.
fn tangent(u: &NVec3, w: &NVec3) -> NVec3 {
    let theta2 = u.norm_squared();
    let c = if theta2 < SERIES_LIMIT {
        1.0 / 12.0 + theta2 / 720.0
    } else {
        let theta = theta2.sqrt();
        1.0 / theta2 - 1.0 / (2.0 * theta * (0.5 * theta).tan())
    };
    let uw = u.cross(w);
    w - uw * 0.5 + u.cross(&uw) * c
}

/// Map `u` to the representative of the same rotation with `|u| ≤ π`.
pub fn fold(mut u: NVec3) -> NVec3 {
    let mut len2 = u.norm_squared();
    while len2 > FOLD_THRESHOLD {
        let len = len2.sqrt();
        u *= 1.0 - TAU / len;
        len2 = u.norm_squared();
    }
    u
}

/// Homogeneous transform: rotation by axis-angle `u`, then translation to `x`.
pub fn compute(x: &NVec3, u: &NVec3) -> Matrix4<f64> {
    Isometry3::new(*x, *u).to_homogeneous()
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use nalgebra::{Matrix3, Rotation3};

    // inverse left Jacobian as a matrix
    fn tangent_matrix(u: &NVec3) -> Matrix3<f64> {
        Matrix3::from_columns(&[
            tangent(u, &NVec3::x()),
            tangent(u, &NVec3::y()),
            tangent(u, &NVec3::z()),
        ])
    }

    #[test]
    fn drift_adds_velocity() {
        let mut x = vec![NVec3::new(1.0, 2.0, 3.0), NVec3::zeros()];
        let v = vec![NVec3::new(0.5, 0.0, -1.0), NVec3::new(0.0, 0.25, 0.0)];
        advance_linear(&mut x, &v);
        assert_eq!(x[0], NVec3::new(1.5, 2.0, 2.0));
        assert_eq!(x[1], NVec3::new(0.0, 0.25, 0.0));
    }

    #[test]
    fn gravity_kicks_every_body() {
        let mut v = vec![NVec3::zeros(); 3];
        apply_gravity(&mut v, &NVec3::new(0.0, -0.01, 0.0));
        assert!(v.iter().all(|vn| *vn == NVec3::new(0.0, -0.01, 0.0)));
    }

    #[test]
    fn parallel_rotations_add() {
        let u = NVec3::new(0.3, 0.0, 0.0);
        let w = NVec3::new(0.1, 0.0, 0.0);
        assert_relative_eq!(compose(&u, &w), NVec3::new(0.4, 0.0, 0.0), epsilon = 1e-15);
    }

    #[test]
    fn composition_tracks_exact_rotation() {
        let u = NVec3::new(0.7, -0.4, 1.1);
        let w = NVec3::new(0.01, 0.015, -0.005);
        let exact = Rotation3::new(w) * Rotation3::new(u);
        let stepped = Rotation3::new(compose(&u, &w));
        assert_relative_eq!(stepped.matrix(), exact.matrix(), epsilon = 1e-5);

        // first order would be off by far more
        let naive = Rotation3::new(u + w);
        assert!((naive.matrix() - exact.matrix()).norm() > 1e-3);
    }

    #[test]
    fn fold_keeps_the_rotation() {
        let u = NVec3::new(2.0, 2.0, 1.5); // |u| > π
        let folded = fold(u);
        assert!(folded.norm() <= PI + 1e-9);
        assert_relative_eq!(
            Rotation3::new(folded).matrix(),
            Rotation3::new(u).matrix(),
            epsilon = 1e-12
        );
    }

    #[test]
    fn orientation_stays_bounded_over_many_frames() {
        let mut u = vec![NVec3::zeros(), NVec3::new(3.0, 0.0, 0.0)];
        let w = vec![NVec3::new(0.3, 0.2, 0.1), NVec3::new(-0.05, 0.4, 0.0)];
        for _ in 0..10_000 {
            advance_angular(&mut u, &w);
            for un in &u {
                assert!(un.norm() <= PI + 1e-6, "|u| = {}", un.norm());
            }
        }
    }

    #[test]
    fn small_angle_branch_is_continuous() {
        let w = NVec3::new(0.0, 0.1, 0.0);
        let below = tangent(&NVec3::new(0.0009, 0.0, 0.0), &w);
        let above = tangent(&NVec3::new(0.0011, 0.0, 0.0), &w);
        assert_relative_eq!(below, above, epsilon = 1e-4);
        assert_relative_eq!(tangent_matrix(&NVec3::zeros()), Matrix3::identity(), epsilon = 1e-15);
    }

    #[test]
    fn transform_places_and_turns() {
        let x = NVec3::new(1.0, 2.0, 3.0);
        let u = NVec3::new(0.0, 0.0, PI / 2.0);
        let m = compute(&x, &u);
        let p = m * nalgebra::Vector4::new(1.0, 0.0, 0.0, 1.0);
        assert_relative_eq!(p, nalgebra::Vector4::new(1.0, 3.0, 3.0, 1.0), epsilon = 1e-12);
    }
}
