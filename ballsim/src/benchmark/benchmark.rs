//! Timing curves for the collision pass
//!
//! Compares the kd-tree traversal against the direct all-pairs loop on the
//! same body set. Output is plain text or CSV, paste into a spreadsheet to
//! graph.

use std::time::Instant;

use crate::simulation::collision::bounce;
use crate::simulation::error::SimResult;
use crate::simulation::kdtree::{KdTree, VisitOrder};
use crate::simulation::random::XorShiftRng;
use crate::simulation::states::{Bodies, Body, NVec3};

const RADIUS: f64 = 0.05;

/// Deterministic body set of size `n`, spread over a cube of side ~10 with
/// velocities pointing at the centre so plenty of pairs approach each other.
fn make_bodies(n: usize) -> SimResult<Bodies> {
    let mut bodies = Bodies::new();
    bodies.grow_capacity(n)?;
    bodies.set_count(n)?;

    for i in 0..n {
        let i_f = i as f64;
        // deterministic positions, no rng needed
        let x = NVec3::new(
            (i_f * 0.37).sin() * 5.0,
            (i_f * 0.13).cos() * 5.0,
            (i_f * 0.07).sin() * 5.0,
        );
        let v = -x * 0.001;
        bodies.set(i, &Body::sphere(x, v, RADIUS, 1.0, 0.5));
    }
    Ok(bodies)
}

/// One tree rebuild plus pair query, `hit(a, b)` for every contact resolved.
fn collide_tree<F>(bodies: &mut Bodies, tree: &mut KdTree, rng: &mut XorShiftRng, mut hit: F) -> SimResult<()>
where
    F: FnMut(usize, usize),
{
    tree.build(bodies.positions())?;
    let reach = 2.0 * bodies.max_radius();
    let (x, mut motion) = bodies.split_motion();
    tree.for_each_pair(x, reach, VisitOrder::InverseIndex, rng, |a, b| {
        if bounce(x, &mut motion, a, b, 0.0) {
            hit(a, b);
        }
    });
    Ok(())
}

/// Every pair tested, `hit(a, b)` for every contact resolved.
fn collide_direct<F>(bodies: &mut Bodies, mut hit: F)
where
    F: FnMut(usize, usize),
{
    let (x, mut motion) = bodies.split_motion();
    for b in 0..x.len() {
        for a in 0..b {
            if bounce(x, &mut motion, a, b, 0.0) {
                hit(a, b);
            }
        }
    }
}

pub fn bench_collide() -> SimResult<()> {
    // Different system sizes to test
    let ns = [200, 400, 800, 1600, 3200, 6400];

    for n in ns {
        let template = make_bodies(n)?;
        let mut tree = KdTree::new();
        let mut rng = XorShiftRng::new(42);

        // Warm up
        collide_tree(&mut template.clone(), &mut tree, &mut rng, |_, _| {})?;

        // Time direct
        let mut direct = template.clone();
        let mut c_direct = 0;
        let t0 = Instant::now();
        collide_direct(&mut direct, |_, _| c_direct += 1);
        let dt_direct = t0.elapsed().as_secs_f64();

        // Time tree
        let mut bodies = template.clone();
        let mut c_tree = 0;
        let t1 = Instant::now();
        collide_tree(&mut bodies, &mut tree, &mut rng, |_, _| c_tree += 1)?;
        let dt_tree = t1.elapsed().as_secs_f64();

        println!(
            "N = {n:5}, direct = {:8.6} s ({c_direct} contacts), tree = {:8.6} s ({c_tree} contacts)",
            dt_direct, dt_tree
        );
    }
    Ok(())
}

/// Collision pass cost for a range of n, as CSV
pub fn bench_collide_curve() -> SimResult<()> {
    println!("N,direct_ms,tree_ms");

    let mut tree = KdTree::new();
    let mut rng = XorShiftRng::new(42);

    // Steps of 400 to give smoother graph
    for n in (400..=12800).step_by(400) {
        // Small n: average over a few passes to smooth noise
        let passes_direct = if n <= 1600 { 5 } else { 1 };
        let passes_tree = if n <= 4000 { 10 } else { 3 };

        let template = make_bodies(n)?;

        let t0 = Instant::now();
        for _ in 0..passes_direct {
            collide_direct(&mut template.clone(), |_, _| {});
        }
        let ms_direct = t0.elapsed().as_secs_f64() * 1000.0 / passes_direct as f64;

        let t1 = Instant::now();
        for _ in 0..passes_tree {
            collide_tree(&mut template.clone(), &mut tree, &mut rng, |_, _| {})?;
        }
        let ms_tree = t1.elapsed().as_secs_f64() * 1000.0 / passes_tree as f64;

        println!("{},{:.6},{:.6}", n, ms_direct, ms_tree);
    }
    Ok(())
}
