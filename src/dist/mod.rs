//! Element-to-bin distributions
//!
//! A [`Distribution`] records, for every element along one matrix dimension
//! (block-rows or block-columns), the bin it is assigned to — and, when bins
//! are subdivided for rectangular-grid balancing, the image within that bin.
//! Distributions are created once per layout change and are immutable
//! afterwards apart from [`Distribution::replace_assignment`], which is the
//! single mutation point and invalidates the lazily-built local-element
//! cache.

pub mod binning;
pub mod rebin;

use std::sync::OnceLock;

use rand::Rng;

pub use binning::{cyclic_bins, uniform_random_bins, weighted_bins};
pub use rebin::{rebin, rebin_distribution, rebin_parameters, RebinParams, RebinResult};

/// An ordered assignment of elements to bins, with optional images.
#[derive(Debug, Clone)]
pub struct Distribution {
    bins: Vec<usize>,
    images: Option<Vec<usize>>,
    nbins: usize,
    nimages: usize,
    /// Per-bin lists of global element indices, built on first query.
    locals: OnceLock<Vec<Vec<usize>>>,
}

impl PartialEq for Distribution {
    fn eq(&self, other: &Self) -> bool {
        // The lazy cache is derived state and never part of equality.
        self.bins == other.bins
            && self.images == other.images
            && self.nbins == other.nbins
            && self.nimages == other.nimages
    }
}

impl Eq for Distribution {}

impl Distribution {
    /// Creates a distribution without images.
    ///
    /// # Panics
    ///
    /// Panics if `nbins` is zero or any bin index is out of range.
    pub fn new(bins: Vec<usize>, nbins: usize) -> Self {
        assert!(nbins > 0, "number of bins must be positive");
        for (i, &b) in bins.iter().enumerate() {
            assert!(b < nbins, "bin {} out of range for element {}", b, i);
        }
        Self {
            bins,
            images: None,
            nbins,
            nimages: 1,
            locals: OnceLock::new(),
        }
    }

    /// Creates a distribution with per-element images, as produced by
    /// rebinning onto a non-commensurate grid axis.
    ///
    /// # Panics
    ///
    /// Panics if the image array length differs from the bin array length,
    /// if `nbins` or `nimages` is zero, or if any bin or image index is out
    /// of range.
    pub fn with_images(
        bins: Vec<usize>,
        images: Vec<usize>,
        nbins: usize,
        nimages: usize,
    ) -> Self {
        assert!(nbins > 0, "number of bins must be positive");
        assert!(nimages > 0, "image count must be positive");
        assert_eq!(
            bins.len(),
            images.len(),
            "bin and image arrays must have equal length"
        );
        for (i, &b) in bins.iter().enumerate() {
            assert!(b < nbins, "bin {} out of range for element {}", b, i);
        }
        for (i, &im) in images.iter().enumerate() {
            assert!(im < nimages, "image {} out of range for element {}", im, i);
        }
        let images = if nimages == 1 { None } else { Some(images) };
        Self {
            bins,
            images,
            nbins,
            nimages,
            locals: OnceLock::new(),
        }
    }

    /// Cyclic distribution: element `i` in bin `i % nbins`.
    pub fn cyclic(n: usize, nbins: usize) -> Self {
        Self::new(cyclic_bins(n, nbins), nbins)
    }

    /// Uniform-random distribution. No load guarantee; intended for coarse
    /// or test layouts.
    pub fn random<R: Rng + ?Sized>(n: usize, nbins: usize, rng: &mut R) -> Self {
        Self::new(uniform_random_bins(n, nbins, rng), nbins)
    }

    /// Greedy size-balanced distribution; see
    /// [`weighted_bins`](binning::weighted_bins).
    pub fn weighted(weights: &[usize], nbins: usize) -> Self {
        Self::new(weighted_bins(weights, nbins), nbins)
    }

    /// Number of elements covered.
    pub fn len(&self) -> usize {
        self.bins.len()
    }

    /// Whether the distribution covers no elements.
    pub fn is_empty(&self) -> bool {
        self.bins.is_empty()
    }

    /// Number of bins.
    pub fn nbins(&self) -> usize {
        self.nbins
    }

    /// Number of images per bin (1 when bins are not subdivided).
    pub fn nimages(&self) -> usize {
        self.nimages
    }

    /// The full element-to-bin array.
    pub fn bins(&self) -> &[usize] {
        &self.bins
    }

    /// The full element-to-image array, if bins are subdivided.
    pub fn images(&self) -> Option<&[usize]> {
        self.images.as_deref()
    }

    /// Bin of one element.
    #[inline]
    pub fn bin_of(&self, element: usize) -> usize {
        self.bins[element]
    }

    /// Image of one element (0 when bins are not subdivided).
    #[inline]
    pub fn image_of(&self, element: usize) -> usize {
        match &self.images {
            Some(images) => images[element],
            None => 0,
        }
    }

    /// Global element indices assigned to `bin`, ascending.
    ///
    /// The per-bin lists are materialized on the first call and cached for
    /// the life of the assignment.
    pub fn local_elements(&self, bin: usize) -> &[usize] {
        assert!(bin < self.nbins, "bin {} out of range", bin);
        &self.local_element_lists()[bin]
    }

    /// All per-bin element lists, indexed by bin.
    pub fn local_element_lists(&self) -> &[Vec<usize>] {
        self.locals
            .get_or_init(|| local_index_lists(&self.bins, self.nbins))
    }

    /// Replaces the whole assignment. This is the only mutation point; the
    /// local-element cache is invalidated here and nowhere else.
    ///
    /// # Panics
    ///
    /// Same contracts as [`Distribution::new`] /
    /// [`Distribution::with_images`].
    pub fn replace_assignment(
        &mut self,
        bins: Vec<usize>,
        images: Option<Vec<usize>>,
        nbins: usize,
        nimages: usize,
    ) {
        *self = match images {
            Some(images) => Self::with_images(bins, images, nbins, nimages),
            None => {
                assert_eq!(nimages, 1, "image count must be 1 without an image array");
                Self::new(bins, nbins)
            }
        };
    }

    /// Number of elements in each bin.
    pub fn bin_loads(&self) -> Vec<usize> {
        let mut loads = vec![0usize; self.nbins];
        for &b in &self.bins {
            loads[b] += 1;
        }
        loads
    }

    /// Load statistics, optionally weighted by per-element size.
    ///
    /// # Panics
    ///
    /// Panics if a weight array is given whose length differs from the
    /// element count.
    pub fn summary(&self, weights: Option<&[usize]>) -> DistributionSummary {
        if let Some(w) = weights {
            assert_eq!(
                w.len(),
                self.bins.len(),
                "weight array length must equal the element count"
            );
        }

        let mut loads = vec![0u64; self.nbins];
        for (i, &b) in self.bins.iter().enumerate() {
            loads[b] += weights.map_or(1, |w| w[i] as u64);
        }

        DistributionSummary {
            n_elements: self.bins.len(),
            nbins: self.nbins,
            min_load: loads.iter().copied().min().unwrap_or(0),
            max_load: loads.iter().copied().max().unwrap_or(0),
            total_load: loads.iter().sum(),
        }
    }
}

/// Inverts an element-to-bin array into per-bin element lists.
///
/// Single linear pass with a per-bin insert cursor; each list comes out in
/// ascending global-index order because elements are visited in that order.
///
/// # Panics
///
/// Panics if any bin index is out of range.
pub fn local_index_lists(bins: &[usize], nbins: usize) -> Vec<Vec<usize>> {
    assert!(nbins > 0, "number of bins must be positive");

    let mut counts = vec![0usize; nbins];
    for (i, &b) in bins.iter().enumerate() {
        assert!(b < nbins, "bin {} out of range for element {}", b, i);
        counts[b] += 1;
    }

    let mut lists: Vec<Vec<usize>> = counts.iter().map(|&c| Vec::with_capacity(c)).collect();
    for (i, &b) in bins.iter().enumerate() {
        lists[b].push(i);
    }

    lists
}

/// Per-bin load statistics for a distribution.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DistributionSummary {
    /// Number of elements covered.
    pub n_elements: usize,
    /// Number of bins.
    pub nbins: usize,
    /// Smallest bin load.
    pub min_load: u64,
    /// Largest bin load.
    pub max_load: u64,
    /// Sum of all loads.
    pub total_load: u64,
}

impl DistributionSummary {
    /// Mean load per bin.
    pub fn mean_load(&self) -> f64 {
        self.total_load as f64 / self.nbins as f64
    }

    /// Ratio of the largest bin load to the mean load; 1.0 is perfectly
    /// balanced. Zero total load reports as balanced.
    pub fn imbalance(&self) -> f64 {
        if self.total_load == 0 {
            return 1.0;
        }
        self.max_load as f64 / self.mean_load()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_basic_accessors() {
        let dist = Distribution::new(vec![2, 0, 1, 0], 3);
        assert_eq!(dist.len(), 4);
        assert_eq!(dist.nbins(), 3);
        assert_eq!(dist.nimages(), 1);
        assert_eq!(dist.bin_of(0), 2);
        assert_eq!(dist.image_of(0), 0);
        assert_eq!(dist.images(), None);
    }

    #[test]
    fn test_with_images_single_image_collapses() {
        let dist = Distribution::with_images(vec![0, 1], vec![0, 0], 2, 1);
        assert_eq!(dist.images(), None);
        assert_eq!(dist.nimages(), 1);
    }

    #[test]
    fn test_local_elements_ordered_and_complete() {
        let dist = Distribution::new(vec![1, 0, 1, 2, 1, 0], 3);

        assert_eq!(dist.local_elements(0), &[1, 5]);
        assert_eq!(dist.local_elements(1), &[0, 2, 4]);
        assert_eq!(dist.local_elements(2), &[3]);
    }

    #[test]
    fn test_local_lists_empty_bin() {
        let dist = Distribution::new(vec![0, 0, 2], 3);
        assert!(dist.local_elements(1).is_empty());
    }

    #[test]
    fn test_mapper_round_trip() {
        // Re-deriving the assignment from list membership reproduces it
        let bins = vec![3, 1, 0, 1, 2, 3, 3, 0];
        let lists = local_index_lists(&bins, 4);

        let mut rebuilt = vec![usize::MAX; bins.len()];
        for (bin, list) in lists.iter().enumerate() {
            for &el in list {
                rebuilt[el] = bin;
            }
        }
        assert_eq!(rebuilt, bins);
    }

    #[test]
    fn test_replace_assignment_invalidates_cache() {
        let mut dist = Distribution::new(vec![0, 1, 0], 2);
        assert_eq!(dist.local_elements(0), &[0, 2]);

        dist.replace_assignment(vec![1, 1, 0], None, 2, 1);
        assert_eq!(dist.local_elements(0), &[2]);
        assert_eq!(dist.local_elements(1), &[0, 1]);
    }

    #[test]
    fn test_summary_unweighted() {
        let dist = Distribution::new(vec![0, 0, 0, 1], 2);
        let s = dist.summary(None);
        assert_eq!(s.max_load, 3);
        assert_eq!(s.min_load, 1);
        assert_eq!(s.total_load, 4);
        assert!((s.mean_load() - 2.0).abs() < 1e-12);
        assert!((s.imbalance() - 1.5).abs() < 1e-12);
    }

    #[test]
    fn test_summary_weighted() {
        let dist = Distribution::new(vec![0, 1, 1], 2);
        let s = dist.summary(Some(&[10, 3, 4]));
        assert_eq!(s.max_load, 10);
        assert_eq!(s.min_load, 7);
        assert_eq!(s.total_load, 17);
    }

    #[test]
    #[should_panic(expected = "out of range")]
    fn test_bin_out_of_range_rejected() {
        Distribution::new(vec![0, 3], 3);
    }

    #[test]
    #[should_panic(expected = "equal length")]
    fn test_mismatched_images_rejected() {
        Distribution::with_images(vec![0, 1], vec![0], 2, 2);
    }

    #[test]
    fn test_equality_ignores_cache() {
        let a = Distribution::new(vec![0, 1, 0], 2);
        let b = Distribution::new(vec![0, 1, 0], 2);
        let _ = a.local_element_lists(); // materialize one side only
        assert_eq!(a, b);
    }
}
