//! Order statistics over permutations of body indices
//!
//! All routines reorder a slice of body ids by a floating-point key looked up
//! through a closure, never touching the body data itself:
//! - [`select_nth`]: median-of-three quickselect, insertion sort below a cutoff
//! - [`sort_by_key`]: quicksort sharing the same partition step
//! - [`resort`]: insertion sort for permutations that are already nearly in
//!   order (the previous frame's order), with a fallback to [`sort_by_key`]
//!
//! Every scan stops as soon as a comparison fails, so a stray NaN key cannot
//! walk it off the end of the slice.

// Below this many elements insertion sort beats partitioning
const INSERTION_CUTOFF: usize = 8;

fn insertion_sort<F>(perm: &mut [usize], key: &F)
where
    F: Fn(usize) -> f64,
{
    for i in 1..perm.len() {
        let item = perm[i];
        let k = key(item);
        let mut j = i;
        while j > 0 && key(perm[j - 1]) > k {
            perm[j] = perm[j - 1];
            j -= 1;
        }
        perm[j] = item;
    }
}

/// Order `perm[lo]`, `perm[mid]`, `perm[hi - 1]` by key and return the
/// median key. Leaves the smallest at `lo` and the largest at `hi - 1`, which
/// keeps the Hoare scans inside the range.
fn median_of_three<F>(perm: &mut [usize], lo: usize, hi: usize, key: &F) -> f64
where
    F: Fn(usize) -> f64,
{
    let mid = lo + (hi - lo) / 2;
    let last = hi - 1;
    if key(perm[mid]) < key(perm[lo]) {
        perm.swap(mid, lo);
    }
    if key(perm[last]) < key(perm[lo]) {
        perm.swap(last, lo);
    }
    if key(perm[last]) < key(perm[mid]) {
        perm.swap(last, mid);
    }
    key(perm[mid])
}

/// Hoare partition of `perm[lo..hi]` (at least 3 elements).
///
/// Returns `split` with every key in `lo..split` ≤ pivot ≤ every key in
/// `split..hi`, both sides non-empty.
fn partition<F>(perm: &mut [usize], lo: usize, hi: usize, key: &F) -> usize
where
    F: Fn(usize) -> f64,
{
    let pivot = median_of_three(perm, lo, hi, key);
    let mut i = lo;
    let mut j = hi - 1;
    loop {
        while key(perm[i]) < pivot {
            i += 1;
        }
        while key(perm[j]) > pivot {
            j -= 1;
        }
        if i >= j {
            return j + 1;
        }
        perm.swap(i, j);
        i += 1;
        j -= 1;
    }
}

/// Rearrange `perm` so that `perm[nth]` holds the element of rank `nth`,
/// everything before it has a key ≤ and everything after a key ≥.
pub fn select_nth<F>(perm: &mut [usize], nth: usize, key: F)
where
    F: Fn(usize) -> f64,
{
    if nth >= perm.len() {
        return;
    }
    let mut lo = 0;
    let mut hi = perm.len();
    while hi - lo > INSERTION_CUTOFF {
        let split = partition(perm, lo, hi, &key);
        if nth < split {
            hi = split;
        } else {
            lo = split;
        }
    }
    insertion_sort(&mut perm[lo..hi], &key);
}

/// Sort `perm` by ascending key.
pub fn sort_by_key<F>(perm: &mut [usize], key: F)
where
    F: Fn(usize) -> f64,
{
    let mut pending = vec![(0, perm.len())];
    while let Some((lo, hi)) = pending.pop() {
        if hi - lo <= INSERTION_CUTOFF {
            insertion_sort(&mut perm[lo..hi], &key);
            continue;
        }
        let split = partition(perm, lo, hi, &key);
        pending.push((lo, split));
        pending.push((split, hi));
    }
}

/// Re-sort a permutation that was sorted last frame.
///
/// Runs an insertion sort and gives up once it has shifted more than
/// `4 * len` elements, finishing with [`sort_by_key`] instead. Returns `true`
/// when the insertion pass was enough.
pub fn resort<F>(perm: &mut [usize], key: F) -> bool
where
    F: Fn(usize) -> f64,
{
    let budget = 4 * perm.len();
    let mut shifts = 0;
    for i in 1..perm.len() {
        let item = perm[i];
        let k = key(item);
        let mut j = i;
        while j > 0 && key(perm[j - 1]) > k {
            perm[j] = perm[j - 1];
            j -= 1;
            shifts += 1;
        }
        perm[j] = item;
        if shifts > budget {
            sort_by_key(perm, key);
            return false;
        }
    }
    true
}
