//! Closed-form impulse response for sphere-sphere and sphere-wall contacts
//!
//! Both responses follow the same recipe:
//!
//! 1. bail out unless the bodies penetrate *and* approach each other,
//! 2. take the relative velocity `g` of the two surfaces at the contact point
//!    (linear velocity plus spin), split it into a normal part `gn` and a slip
//!    part `gt`,
//! 3. pick the impulse direction `u = gn + friction * gt`,
//! 4. solve for the single multiplier `λ` that keeps total kinetic energy
//!    unchanged when the impulse `λu` (and its torque) is applied:
//!
//! ```text
//! λ = 2 (u·g) / (uᵀ K u)
//! ```
//!
//! where `uᵀ K u` sums `|u|²/m` and `|arm × u|²/l` over the bodies involved.
//! Linear momentum is conserved because the pair receives equal and opposite
//! impulses; angular momentum because both act at one shared contact point.
//!
//! A vanishing denominator or coincident centres skip the contact for this
//! frame. Nothing is written in that case, nor for separating or
//! non-touching pairs.

use tracing::trace;

use super::states::{Motion, NVec3};
use super::walls::Wall;

/// Resolve a contact between spheres `a` and `b`.
///
/// Only pairs already closer than `ra + rb` count; a pair that will touch
/// after the next drift is handled on that frame. Returns `true` when an impulse was applied.
pub fn bounce(x: &[NVec3], motion: &mut Motion<'_>, a: usize, b: usize, friction: f64) -> bool {
    let s = x[b] - x[a];
    let (ra, rb) = (motion.r[a], motion.r[b]);
    let reach = ra + rb;
    let dist2 = s.norm_squared();
    if dist2 >= reach * reach {
        return false;
    }
    if (motion.v[b] - motion.v[a]).dot(&s) >= 0.0 {
        return false;
    }

    let dist = dist2.sqrt();
    if dist <= f64::EPSILON * reach {
        trace!(a, b, "coincident centres, contact skipped");
        return false;
    }
    let n = s / dist;

    // contact point splits the centre line in the ratio of the radii
    let arm_a = n * (dist * ra / reach);
    let arm_b = arm_a - s;

    let g = (motion.v[a] + motion.w[a].cross(&arm_a)) - (motion.v[b] + motion.w[b].cross(&arm_b));
    let gn = n * g.dot(&n);
    let dir = gn + (g - gn) * friction;

    let torque_a = arm_a.cross(&dir);
    let torque_b = arm_b.cross(&dir);
    let (ma, mb) = (motion.m[a], motion.m[b]);
    let (la, lb) = (motion.l[a], motion.l[b]);

    let denom = dir.norm_squared() * (ma.recip() + mb.recip())
        + torque_a.norm_squared() / la
        + torque_b.norm_squared() / lb;
    let lambda = 2.0 * dir.dot(&g) / denom;
    if !(denom > 0.0) || !lambda.is_finite() {
        trace!(a, b, denom, "degenerate impulse, contact skipped");
        return false;
    }

    motion.v[a] -= dir * (lambda / ma);
    motion.w[a] -= torque_a * (lambda / la);
    motion.v[b] += dir * (lambda / mb);
    motion.w[b] += torque_b * (lambda / lb);
    true
}

/// Resolve a contact between sphere `n` at `x` and `wall`.
///
/// The wall is immovable, so only the sphere's own mass and moment enter the
/// multiplier. Returns `true` when an impulse was applied.
pub fn wall_bounce(x: &NVec3, motion: &mut Motion<'_>, n: usize, wall: &Wall, friction: f64) -> bool {
    let r = motion.r[n];
    if wall.distance(x) >= r {
        return false;
    }
    let normal = wall.normal;
    let v = motion.v[n];
    if v.dot(&normal) >= 0.0 {
        return false;
    }

    let arm = normal * -r;
    let g = v + motion.w[n].cross(&arm);
    let gn = normal * g.dot(&normal);
    let dir = gn + (g - gn) * friction;

    let torque = arm.cross(&dir);
    let (m, l) = (motion.m[n], motion.l[n]);
    let denom = dir.norm_squared() / m + torque.norm_squared() / l;
    let lambda = 2.0 * dir.dot(&g) / denom;
    if !(denom > 0.0) || !lambda.is_finite() {
        trace!(n, denom, "degenerate wall impulse, contact skipped");
        return false;
    }

    motion.v[n] -= dir * (lambda / m);
    motion.w[n] -= torque * (lambda / l);
    true
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::simulation::states::{Bodies, Body};
    use approx::assert_relative_eq;

    fn bodies_from(list: &[Body]) -> Bodies {
        let mut bodies = Bodies::new();
        bodies.grow_capacity(list.len()).unwrap();
        bodies.set_count(list.len()).unwrap();
        for (n, b) in list.iter().enumerate() {
            bodies.set(n, b);
        }
        bodies
    }

    fn unit_ball(x: NVec3, v: NVec3) -> Body {
        Body {
            x,
            v,
            u: NVec3::zeros(),
            w: NVec3::zeros(),
            radius: 1.0,
            mass: 1.0,
            moment: 0.4,
        }
    }

    fn collide(bodies: &mut Bodies, friction: f64) -> bool {
        let (x, mut motion) = bodies.split_motion();
        bounce(x, &mut motion, 0, 1, friction)
    }

    fn head_on(gap: f64) -> Bodies {
        bodies_from(&[
            unit_ball(NVec3::new(-1.0 - gap, 0.0, 0.0), NVec3::new(1.0, 0.0, 0.0)),
            unit_ball(NVec3::new(1.0 + gap, 0.0, 0.0), NVec3::new(-1.0, 0.0, 0.0)),
        ])
    }

    #[test]
    fn head_on_pair_exchanges_velocities() {
        let mut bodies = head_on(-0.01);
        assert!(collide(&mut bodies, 0.0));

        assert_relative_eq!(bodies.velocities()[0], NVec3::new(-1.0, 0.0, 0.0), epsilon = 1e-12);
        assert_relative_eq!(bodies.velocities()[1], NVec3::new(1.0, 0.0, 0.0), epsilon = 1e-12);
        assert_eq!(bodies.angular_velocities()[0], NVec3::zeros());
        assert_eq!(bodies.angular_velocities()[1], NVec3::zeros());
    }

    #[test]
    fn head_on_pair_short_of_contact_waits_for_the_drift() {
        // centres 2.02 apart: not touching yet, so nothing happens
        let mut bodies = head_on(0.01);
        let before = (bodies.get(0), bodies.get(1));
        assert!(!collide(&mut bodies, 0.0));
        assert_eq!((bodies.get(0), bodies.get(1)), before);

        // one frame of drift brings them to ±0.01, then the swap happens
        let n = bodies.count();
        crate::simulation::integrator::advance_linear(&mut bodies.x[..n], &bodies.v[..n]);
        assert!(collide(&mut bodies, 0.0));
        assert_relative_eq!(bodies.velocities()[0], NVec3::new(-1.0, 0.0, 0.0), epsilon = 1e-12);
        assert_relative_eq!(bodies.velocities()[1], NVec3::new(1.0, 0.0, 0.0), epsilon = 1e-12);
    }

    #[test]
    fn oblique_frictionless_contact_conserves_everything() {
        let mut bodies = bodies_from(&[
            Body::sphere(NVec3::new(0.0, 0.0, 0.0), NVec3::new(0.3, 0.1, -0.2), 0.7, 1.0, 0.5)
                .with_spin(NVec3::new(0.0, 0.2, 0.1)),
            Body::sphere(NVec3::new(0.9, 0.6, 0.1), NVec3::new(-0.2, 0.0, 0.05), 0.5, 1.0, 0.5)
                .with_spin(NVec3::new(-0.1, 0.0, 0.3)),
        ]);
        let (p0, l0, e0) = (bodies.momentum(), bodies.angular_momentum(), bodies.kinetic_energy());
        let w0 = bodies.angular_velocities().to_vec();

        assert!(collide(&mut bodies, 0.0));

        assert_relative_eq!(bodies.momentum(), p0, epsilon = 1e-12);
        assert_relative_eq!(bodies.angular_momentum(), l0, epsilon = 1e-12);
        assert_relative_eq!(bodies.kinetic_energy(), e0, max_relative = 1e-12);
        // no friction, no torque
        assert_relative_eq!(bodies.angular_velocities()[0], w0[0], epsilon = 1e-12);
        assert_relative_eq!(bodies.angular_velocities()[1], w0[1], epsilon = 1e-12);
    }

    #[test]
    fn friction_spins_bodies_and_still_conserves() {
        let mut bodies = bodies_from(&[
            Body::sphere(NVec3::new(0.0, 0.0, 0.0), NVec3::new(0.4, 0.3, 0.0), 0.6, 1.0, 0.5),
            Body::sphere(NVec3::new(1.1, 0.2, 0.0), NVec3::new(-0.2, -0.3, 0.1), 0.6, 1.0, 0.5),
        ]);
        let (p0, l0, e0) = (bodies.momentum(), bodies.angular_momentum(), bodies.kinetic_energy());

        assert!(collide(&mut bodies, 0.5));

        assert!(bodies.angular_velocities()[0].norm() > 1e-6);
        assert_relative_eq!(bodies.momentum(), p0, epsilon = 1e-12);
        assert_relative_eq!(bodies.angular_momentum(), l0, epsilon = 1e-12);
        assert_relative_eq!(bodies.kinetic_energy(), e0, max_relative = 1e-12);
    }

    #[test]
    fn separating_or_distant_pairs_are_untouched() {
        let cases = [
            // overlapping but moving apart
            (NVec3::new(1.5, 0.0, 0.0), NVec3::new(-1.0, 0.0, 0.0), NVec3::new(1.0, 0.0, 0.0)),
            // approaching but not touching
            (NVec3::new(2.5, 0.0, 0.0), NVec3::new(1.0, 0.0, 0.0), NVec3::new(-1.0, 0.0, 0.0)),
        ];
        for (xb, va, vb) in cases {
            let mut bodies = bodies_from(&[
                unit_ball(NVec3::zeros(), va).with_spin(NVec3::new(0.1, 0.2, 0.3)),
                unit_ball(xb, vb).with_spin(NVec3::new(-0.3, 0.0, 0.1)),
            ]);
            let before = (bodies.get(0), bodies.get(1));
            assert!(!collide(&mut bodies, 0.4));
            assert_eq!((bodies.get(0), bodies.get(1)), before);
        }
    }

    #[test]
    fn coincident_centres_are_skipped() {
        let mut bodies = bodies_from(&[
            unit_ball(NVec3::zeros(), NVec3::new(1.0, 0.0, 0.0)),
            unit_ball(NVec3::zeros(), NVec3::new(-1.0, 0.0, 0.0)),
        ]);
        let before = (bodies.get(0), bodies.get(1));
        assert!(!collide(&mut bodies, 0.0));
        assert_eq!((bodies.get(0), bodies.get(1)), before);
    }

    #[test]
    fn wall_reflects_normal_velocity() {
        let wall = Wall::new(NVec3::zeros(), NVec3::x());
        let mut bodies = bodies_from(&[unit_ball(NVec3::new(-0.5, 0.0, 0.0), NVec3::new(-1.0, 0.0, 0.0))]);
        let (x, mut motion) = bodies.split_motion();
        assert!(wall_bounce(&x[0], &mut motion, 0, &wall, 0.0));
        assert_relative_eq!(bodies.velocities()[0].x, 1.0, epsilon = 1e-12);
    }

    #[test]
    fn rough_wall_trades_slip_for_spin_without_losing_energy() {
        let wall = Wall::new(NVec3::zeros(), NVec3::y());
        let mut bodies = bodies_from(&[Body::sphere(
            NVec3::new(0.0, 0.5, 0.0),
            NVec3::new(0.8, -0.5, 0.0),
            0.6,
            1.0,
            0.5,
        )]);
        let e0 = bodies.kinetic_energy();
        let (x, mut motion) = bodies.split_motion();
        assert!(wall_bounce(&x[0], &mut motion, 0, &wall, 0.7));

        let b = bodies.get(0);
        assert!(b.v.y > 0.0);
        assert!(b.w.z.abs() > 1e-6);
        assert_relative_eq!(bodies.kinetic_energy(), e0, max_relative = 1e-12);
    }

    #[test]
    fn wall_ignores_receding_or_clear_bodies() {
        let wall = Wall::new(NVec3::zeros(), NVec3::x());
        for (x, v) in [
            (NVec3::new(-0.5, 0.0, 0.0), NVec3::new(1.0, 0.0, 0.0)),
            (NVec3::new(2.0, 0.0, 0.0), NVec3::new(-1.0, 0.0, 0.0)),
        ] {
            let mut bodies = bodies_from(&[unit_ball(x, v)]);
            let before = bodies.get(0);
            let (xs, mut motion) = bodies.split_motion();
            assert!(!wall_bounce(&xs[0], &mut motion, 0, &wall, 0.3));
            assert_eq!(bodies.get(0), before);
        }
    }
}
