//! Rebinning engine
//!
//! Maps a distribution over `nbins_src` bins onto a differently-shaped set of
//! `nbins_dst` bins, as needed when a matrix dimension moves to a grid axis
//! with a different process count (transposition onto a rectangular grid
//! being the common case). Bins are subdivided into *virtual slots*: each
//! source bin splits across `multiplicity` slots and each destination bin
//! absorbs `nimages` of them, so that
//! `nbins_src * multiplicity == nbins_dst * nimages` and locality of the
//! source assignment survives the reshape.

use log::warn;

use crate::dist::Distribution;
use crate::utils::gcd;

/// Minimal multiplicity/image pair relating two bin counts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RebinParams {
    /// Number of virtual slots each source bin splits across.
    pub multiplicity: usize,
    /// Number of virtual slots each destination bin absorbs.
    pub nimages: usize,
}

/// Derives the minimal rebinning parameters for a source/destination bin
/// count pair: `multiplicity = nbins_dst / gcd`, `nimages = nbins_src / gcd`
/// (equivalently `lcm(nbins_src, nbins_dst) / nbins_dst`).
///
/// # Panics
///
/// Panics if either bin count is zero.
pub fn rebin_parameters(nbins_src: usize, nbins_dst: usize) -> RebinParams {
    assert!(
        nbins_src > 0 && nbins_dst > 0,
        "bin counts must be positive, got {} -> {}",
        nbins_src,
        nbins_dst
    );
    let g = gcd(nbins_src, nbins_dst);
    RebinParams {
        multiplicity: nbins_dst / g,
        nimages: nbins_src / g,
    }
}

/// A rebinned assignment: per-element destination bin and image.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RebinResult {
    /// Destination bin per element, in `[0, nbins_dst)`.
    pub bins: Vec<usize>,
    /// Image per element, in `[0, nimages)`.
    pub images: Vec<usize>,
}

/// Recomputes a per-element bin assignment for a new bin count.
///
/// Walks the elements in input order, keeping one round-robin counter per
/// source bin: element in source bin `b` takes virtual slot
/// `b * multiplicity + counter(b)`, lands in destination bin
/// `slot / nimages` with image `slot % nimages`, and advances the counter
/// modulo `multiplicity`. The walk is order-dependent by design; callers must
/// present elements in a stable order.
///
/// Output positions `source_bins.len()..n_out` have no source assignment and
/// are filled from the cyclic bin `i % nbins_src` to keep padding
/// deterministic.
///
/// The derived source bin count is `(nbins_dst * nimages) / multiplicity`;
/// when the division has a remainder the parameters are not commensurate, a
/// warning is logged, and the truncated value is used best-effort.
///
/// # Panics
///
/// Panics if `nbins_dst`, `multiplicity` or `nimages` is zero, if the derived
/// source bin count is zero, or if a source bin is out of range.
pub fn rebin_distribution(
    source_bins: &[usize],
    n_out: usize,
    nbins_dst: usize,
    multiplicity: usize,
    nimages: usize,
) -> RebinResult {
    assert!(nbins_dst > 0, "number of destination bins must be positive");
    assert!(multiplicity > 0, "multiplicity must be positive");
    assert!(nimages > 0, "image count must be positive");

    if (nbins_dst * nimages) % multiplicity != 0 {
        warn!(
            "rebinning {} bins x {} images is not commensurate with multiplicity {}; \
             proceeding best-effort",
            nbins_dst, nimages, multiplicity
        );
    }
    let nbins_src = (nbins_dst * nimages) / multiplicity;
    assert!(
        nbins_src > 0,
        "derived source bin count is zero (multiplicity {} exceeds {} bins x {} images)",
        multiplicity,
        nbins_dst,
        nimages
    );

    let mut bins = Vec::with_capacity(n_out);
    let mut images = Vec::with_capacity(n_out);
    let mut counters = vec![0usize; nbins_src];

    for i in 0..n_out {
        let bin = if i < source_bins.len() {
            let b = source_bins[i];
            assert!(
                b < nbins_src,
                "source bin {} out of range for {} source bins (element {})",
                b,
                nbins_src,
                i
            );
            b
        } else {
            i % nbins_src
        };

        let slot = bin * multiplicity + counters[bin];
        bins.push(slot / nimages);
        images.push(slot % nimages);
        counters[bin] = (counters[bin] + 1) % multiplicity;
    }

    RebinResult { bins, images }
}

/// Rebins a whole [`Distribution`] onto `nbins_dst` bins with minimal
/// parameters, preserving the element count.
pub fn rebin(dist: &Distribution, nbins_dst: usize) -> Distribution {
    let params = rebin_parameters(dist.nbins(), nbins_dst);
    let result = rebin_distribution(
        dist.bins(),
        dist.len(),
        nbins_dst,
        params.multiplicity,
        params.nimages,
    );
    Distribution::with_images(result.bins, result.images, nbins_dst, params.nimages)
}
