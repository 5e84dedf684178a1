//! Bin distributors
//!
//! Assign `n` logical elements (matrix block-rows or block-columns) to a
//! fixed number of bins, one bin per process along a grid axis. Three modes:
//!
//! 1. **Uniform random**: no load guarantee; acceptable for coarse or test
//!    distributions only.
//! 2. **Cyclic**: element `i` goes to bin `i % nbins`; deterministic and
//!    balanced when element sizes are uniform.
//! 3. **Weighted**: greedy min-heap balancing by element size. A variant of
//!    the longest-processing-time heuristic with a max-bin-load bound of
//!    `(2 - 1/nbins)` times optimal.

use std::cmp::Reverse;
use std::collections::BinaryHeap;

use rand::Rng;

/// Assigns each of `n` elements to a uniform-random bin in `[0, nbins)`.
///
/// Draws from the supplied generator so callers control determinism; tests
/// seed a `StdRng`.
///
/// # Panics
///
/// Panics if `nbins` is zero.
pub fn uniform_random_bins<R: Rng + ?Sized>(n: usize, nbins: usize, rng: &mut R) -> Vec<usize> {
    assert!(nbins > 0, "number of bins must be positive");
    (0..n).map(|_| rng.gen_range(0..nbins)).collect()
}

/// Assigns element `i` to bin `i % nbins`.
///
/// # Panics
///
/// Panics if `nbins` is zero.
pub fn cyclic_bins(n: usize, nbins: usize) -> Vec<usize> {
    assert!(nbins > 0, "number of bins must be positive");
    (0..n).map(|i| i % nbins).collect()
}

/// Assigns elements to bins by greedy load balancing.
///
/// Elements are visited in input order; each goes to the currently lightest
/// bin, whose load then grows by the element's weight. Ties on load break
/// toward the lowest bin index, making the result a pure function of the
/// weight sequence.
///
/// # Panics
///
/// Panics if `nbins` is zero or any weight is zero.
pub fn weighted_bins(weights: &[usize], nbins: usize) -> Vec<usize> {
    assert!(nbins > 0, "number of bins must be positive");

    // Min-heap over (load, bin); the tuple order gives the tie-break.
    let mut heap: BinaryHeap<Reverse<(u64, usize)>> = (0..nbins).map(|b| Reverse((0, b))).collect();

    let mut bins = Vec::with_capacity(weights.len());
    for (i, &w) in weights.iter().enumerate() {
        assert!(w > 0, "element weight must be positive (element {})", i);

        let Reverse((load, bin)) = heap.pop().expect("heap holds one entry per bin");
        bins.push(bin);
        heap.push(Reverse((load + w as u64, bin)));
    }

    bins
}
