//! # Implicit kd-tree over the moving bodies
//!
//! The tree is rebuilt from scratch every frame. It is never stored as node
//! objects: a permutation `index` of body ids is partitioned level by level,
//! and the only per-node data is one split coordinate for each non-leaf node.
//!
//! ## Layout
//!
//! - Nodes are numbered breadth-first, root `0`, children of `m` are `2m+1`
//!   and `2m+2`. The `i`-th node of level `ℓ` is node `2^ℓ - 1 + i`.
//! - That node covers tree positions `[⌊i·n/2^ℓ⌋, ⌊(i+1)·n/2^ℓ⌋)` of `index`
//!   and splits at `⌊(2i+1)·n/2^(ℓ+1)⌋`, the first position of its right child.
//! - Level `ℓ` splits on coordinate `ℓ mod 3`. Left of the split every body
//!   has that coordinate ≤ the split value, right of it ≥.
//! - Depth is `⌊log2(⌊n / LEAF_SIZE⌋)⌋`, so leaves hold `LEAF_SIZE` to
//!   `2·LEAF_SIZE` bodies. Fewer than `2·LEAF_SIZE` bodies make a single leaf.
//!
//! ## Queries
//!
//! - [`KdTree::for_each_pair`] offers every unordered pair of bodies closer
//!   than `reach` exactly once. A body only looks at bodies *earlier* in the
//!   tree permutation, which is decided from node ranges alone.
//! - [`KdTree::for_each_near_wall`] offers every body whose centre may be
//!   within `reach` of a wall plane, pruning with each node's critical
//!   corner.
//!
//! Both walks use a fixed-size explicit stack sized from [`MAX_DEPTH`].

use rand::seq::SliceRandom;

use super::error::{SimError, SimResult};
use super::random::XorShiftRng;
use super::select;
use super::states::NVec3;
use super::storage;
use super::walls::Wall;

/// Target number of bodies per leaf.
pub const LEAF_SIZE: usize = 3;

/// Deepest tree the traversal stacks can hold.
pub const MAX_DEPTH: usize = 24;

/// Largest body count whose tree stays within [`MAX_DEPTH`].
pub const MAX_BODIES: usize = (LEAF_SIZE << (MAX_DEPTH + 1)) - 1;

// below this tree position a body scans its predecessors directly
const DIRECT_LIMIT: usize = 7;

const STACK_SIZE: usize = 2 * MAX_DEPTH + 2;

/// Order in which bodies take their turn in the sphere-sphere query.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum VisitOrder {
    /// The inverse tree permutation read as a list of body ids.
    /// Deterministic, with a mild directional bias.
    #[default]
    InverseIndex,
    /// Fresh Fisher-Yates shuffle every frame.
    Shuffled,
}

/// Tree depth for `count` bodies.
pub fn depth_for(count: usize) -> usize {
    if count < 2 * LEAF_SIZE {
        0
    } else {
        (count / LEAF_SIZE).ilog2() as usize
    }
}

/// A node addressed by level and position within the level.
#[derive(Debug, Clone, Copy, Default)]
struct Cell {
    level: usize,
    i: usize,
}

impl Cell {
    const ROOT: Cell = Cell { level: 0, i: 0 };

    fn id(self) -> usize {
        (1 << self.level) - 1 + self.i
    }

    fn left(self) -> Cell {
        Cell { level: self.level + 1, i: 2 * self.i }
    }

    fn right(self) -> Cell {
        Cell { level: self.level + 1, i: 2 * self.i + 1 }
    }
}

/// Bounded LIFO used by both traversals.
struct Stack<T> {
    items: [T; STACK_SIZE],
    len: usize,
}

impl<T: Copy> Stack<T> {
    fn new(fill: T) -> Self {
        Self { items: [fill; STACK_SIZE], len: 0 }
    }

    fn push(&mut self, item: T) {
        self.items[self.len] = item;
        self.len += 1;
    }

    fn pop(&mut self) -> Option<T> {
        if self.len == 0 {
            return None;
        }
        self.len -= 1;
        Some(self.items[self.len])
    }
}

#[derive(Debug, Clone, Default)]
pub struct KdTree {
    count: usize,
    depth: usize,
    index: Vec<usize>,    // tree position -> body id
    position: Vec<usize>, // body id -> tree position
    split: Vec<f64>,      // split value per non-leaf node
    visit: Vec<usize>,    // visiting permutation for the pair query
}

impl KdTree {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn count(&self) -> usize {
        self.count
    }

    pub fn depth(&self) -> usize {
        self.depth
    }

    /// Body ids in tree order.
    pub fn index(&self) -> &[usize] {
        &self.index[..self.count]
    }

    /// Tree position of each body.
    pub fn positions(&self) -> &[usize] {
        &self.position[..self.count]
    }

    /// Split value of non-leaf node `node`.
    pub fn split(&self, node: usize) -> f64 {
        self.split[node]
    }

    /// Range `[begin, end)` of the `i`-th node on `level`.
    pub fn node_range(&self, level: usize, i: usize) -> (usize, usize) {
        (self.start(level, i), self.start(level, i + 1))
    }

    /// Split position of the `i`-th node on `level`.
    pub fn node_mid(&self, level: usize, i: usize) -> usize {
        self.start(level + 1, 2 * i + 1)
    }

    #[inline]
    fn start(&self, level: usize, i: usize) -> usize {
        ((i as u64 * self.count as u64) >> level) as usize
    }

    /// Make room for a tree over `count` bodies.
    pub fn grow_capacity(&mut self, count: usize) -> SimResult<()> {
        if count > MAX_BODIES {
            return Err(SimError::TooManyBodies { requested: count, max: MAX_BODIES });
        }
        storage::grow_columns(&mut [&mut self.index, &mut self.position, &mut self.visit], count)?;
        let interior = (1usize << depth_for(count)) - 1;
        storage::grow_columns(&mut [&mut self.split], interior)?;
        Ok(())
    }

    /// Rebuild the tree over `x`.
    ///
    /// When the body count is unchanged the previous frame's permutation is
    /// the starting point, which is already close to partitioned.
    pub fn build(&mut self, x: &[NVec3]) -> SimResult<()> {
        let count = x.len();
        self.grow_capacity(count)?;
        if count != self.count {
            for (q, slot) in self.index[..count].iter_mut().enumerate() {
                *slot = q;
            }
            self.count = count;
        }
        self.depth = depth_for(count);

        for level in 0..self.depth {
            let d = level % 3;
            for i in 0..(1usize << level) {
                let (begin, end) = self.node_range(level, i);
                let mid = self.node_mid(level, i);
                select::select_nth(&mut self.index[begin..end], mid - begin, |b| x[b][d]);
                self.split[Cell { level, i }.id()] = x[self.index[mid]][d];
            }
        }

        for (q, &b) in self.index[..count].iter().enumerate() {
            self.position[b] = q;
        }
        Ok(())
    }

    /// Call `f(earlier, body)` once for every unordered pair of bodies whose
    /// centres may lie within `reach` of each other.
    ///
    /// `earlier` precedes `body` in the tree permutation. Bodies take turns
    /// in `order`.
    pub fn for_each_pair<F>(&mut self, x: &[NVec3], reach: f64, order: VisitOrder, rng: &mut XorShiftRng, mut f: F)
    where
        F: FnMut(usize, usize),
    {
        let count = self.count;
        match order {
            VisitOrder::InverseIndex => {
                self.visit[..count].copy_from_slice(&self.position[..count]);
            }
            VisitOrder::Shuffled => {
                for (k, slot) in self.visit[..count].iter_mut().enumerate() {
                    *slot = k;
                }
                self.visit[..count].shuffle(rng);
            }
        }

        for k in 0..count {
            let n = self.visit[k];
            self.pairs_with(x, n, reach, &mut f);
        }
    }

    fn pairs_with<F>(&self, x: &[NVec3], n: usize, reach: f64, f: &mut F)
    where
        F: FnMut(usize, usize),
    {
        let p = self.position[n];
        if p < DIRECT_LIMIT || self.depth == 0 {
            for &earlier in &self.index[..p] {
                f(earlier, n);
            }
            return;
        }

        let c = x[n];
        let mut stack = Stack::new(Cell::ROOT);
        stack.push(Cell::ROOT);
        while let Some(cell) = stack.pop() {
            let (begin, end) = self.node_range(cell.level, cell.i);
            // nothing in this node comes before n
            if begin >= p {
                continue;
            }
            if cell.level == self.depth {
                for &earlier in &self.index[begin..end.min(p)] {
                    f(earlier, n);
                }
                continue;
            }

            let d = cell.level % 3;
            let s = self.split[cell.id()];
            if c[d] + reach >= s {
                stack.push(cell.right());
            }
            if c[d] - reach <= s {
                stack.push(cell.left());
            }
        }
    }

    /// Call `f(body)` for every body whose centre may be closer than `reach`
    /// to the plane of `wall`.
    pub fn for_each_near_wall<F>(&self, wall: &Wall, reach: f64, mut f: F)
    where
        F: FnMut(usize),
    {
        if self.count == 0 {
            return;
        }

        // the root region is unbounded; its critical corner sits at infinity
        let root_corner = NVec3::from_fn(|d, _| {
            if wall.normal[d] >= 0.0 {
                f64::NEG_INFINITY
            } else {
                f64::INFINITY
            }
        });

        let mut stack = Stack::new((Cell::ROOT, root_corner));
        stack.push((Cell::ROOT, root_corner));
        while let Some((mut cell, corner)) = stack.pop() {
            while cell.level < self.depth {
                let d = cell.level % 3;
                let s = self.split[cell.id()];
                let (favourite, other) = if wall.normal[d] >= 0.0 {
                    (cell.left(), cell.right())
                } else {
                    (cell.right(), cell.left())
                };

                let mut other_corner = corner;
                other_corner[d] = s;
                if corner_distance(wall, &other_corner) < reach {
                    stack.push((other, other_corner));
                }
                cell = favourite;
            }

            let (begin, end) = self.node_range(cell.level, cell.i);
            for &b in &self.index[begin..end] {
                f(b);
            }
        }
    }
}

/// Signed wall distance of a corner that may have infinite coordinates.
/// Axes the normal ignores are skipped so `0·∞` never shows up.
fn corner_distance(wall: &Wall, corner: &NVec3) -> f64 {
    (0..3)
        .filter(|&d| wall.normal[d] != 0.0)
        .map(|d| (corner[d] - wall.anchor[d]) * wall.normal[d])
        .sum()
}
