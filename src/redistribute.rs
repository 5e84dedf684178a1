//! Block redistribution planning
//!
//! A layout change (new distributions, new grid shape, a symmetry flag
//! gained or lost) moves blocks between processes. The planner walks the
//! local block directory once and assigns every live block its destination
//! rank under the target layout, grouping entries per rank in storage order
//! so the packer can serialize each rank's batch sequentially.
//!
//! Coordinates are canonicalized under the *target* symmetry before the
//! owner lookup. When canonicalization swaps a block, or the source stored
//! its data transposed, the plan entry's transpose flag tells the packer to
//! transpose the payload in flight; both together cancel.
//!
//! The per-block destination computation is independent across blocks, so
//! it runs as a rayon parallel map once the block count crosses the
//! configured threshold. The grouping pass stays serial either way and the
//! resulting plan is identical.

use log::debug;
use rayon::prelude::*;

use crate::config::EngineConfig;
use crate::dist::Distribution;
use crate::grid::ProcessGrid;
use crate::matrix::directory::{BlockDirectory, BlockEntry};
use crate::matrix::locate::stored_coordinates;

/// One block movement of a shuffle plan.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ShuffleEntry {
    /// Position of the block in the source directory arrays.
    pub index: usize,
    /// Target stored block-row (after target-symmetry canonicalization).
    pub row: usize,
    /// Target stored block-column.
    pub col: usize,
    /// 1-based data offset in the source heap.
    pub offset: usize,
    /// Whether the payload must be transposed while packing.
    pub transpose: bool,
}

/// Live blocks grouped by destination rank, each group in source storage
/// order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShufflePlan {
    per_rank: Vec<Vec<ShuffleEntry>>,
    n_blocks: usize,
}

impl ShufflePlan {
    /// Number of destination ranks (the target grid size).
    pub fn n_ranks(&self) -> usize {
        self.per_rank.len()
    }

    /// Total number of blocks moved by the plan.
    pub fn n_blocks(&self) -> usize {
        self.n_blocks
    }

    pub fn is_empty(&self) -> bool {
        self.n_blocks == 0
    }

    /// The blocks bound for `rank`, in source storage order.
    pub fn for_rank(&self, rank: usize) -> &[ShuffleEntry] {
        &self.per_rank[rank]
    }

    /// Iterates over `(rank, entries)` pairs, skipping ranks that receive
    /// nothing.
    pub fn ranks(&self) -> impl Iterator<Item = (usize, &[ShuffleEntry])> {
        self.per_rank
            .iter()
            .enumerate()
            .filter(|(_, entries)| !entries.is_empty())
            .map(|(rank, entries)| (rank, entries.as_slice()))
    }
}

/// Plans the movement of every live local block to its owner under a target
/// layout.
///
/// # Arguments
///
/// * `dir` - The process-local block directory being redistributed
/// * `row_dist` - Target block-row distribution
/// * `col_dist` - Target block-column distribution
/// * `grid` - Target process grid; its ranks must be dense in
///   `[0, grid.size())`
/// * `symmetric` - Target matrix symmetry; when set, coordinates are
///   canonicalized before the owner lookup
/// * `config` - Engine configuration (parallelism threshold, verification)
///
/// # Panics
///
/// Panics if the distribution lengths do not match the directory shape, if
/// the distribution bin counts do not match the grid shape, or if a
/// symmetric target is requested for a non-square directory.
pub fn redistribution_plan(
    dir: &BlockDirectory,
    row_dist: &Distribution,
    col_dist: &Distribution,
    grid: &ProcessGrid,
    symmetric: bool,
    config: &EngineConfig,
) -> ShufflePlan {
    assert_eq!(
        row_dist.len(),
        dir.nblkrows(),
        "row distribution must cover every block-row"
    );
    assert_eq!(
        col_dist.len(),
        dir.nblkcols(),
        "column distribution must cover every block-column"
    );
    assert_eq!(
        row_dist.nbins(),
        grid.nprow(),
        "row distribution bins must match the grid's row count"
    );
    assert_eq!(
        col_dist.nbins(),
        grid.npcol(),
        "column distribution bins must match the grid's column count"
    );
    if symmetric {
        assert_eq!(
            dir.nblkrows(),
            dir.nblkcols(),
            "a symmetric target requires a square block structure"
        );
    }

    let live: Vec<BlockEntry> = dir.live_blocks().collect();
    let n_ranks = grid.size();

    let route = |entry: &BlockEntry| -> (usize, ShuffleEntry) {
        let (row, col, swapped) = stored_coordinates(entry.row, entry.col, symmetric);
        let rank = grid.rank(row_dist.bin_of(row), col_dist.bin_of(col));
        assert!(
            rank < n_ranks,
            "grid rank {} is not dense in [0, {})",
            rank,
            n_ranks
        );
        let moved = ShuffleEntry {
            index: entry.index,
            row,
            col,
            offset: entry.offset,
            transpose: entry.transposed != swapped,
        };
        (rank, moved)
    };

    let routed: Vec<(usize, ShuffleEntry)> = if config.should_parallelize(live.len()) {
        live.par_iter().map(route).collect()
    } else {
        live.iter().map(route).collect()
    };

    let mut per_rank = vec![Vec::new(); n_ranks];
    for (rank, entry) in routed {
        per_rank[rank].push(entry);
    }

    let plan = ShufflePlan {
        per_rank,
        n_blocks: live.len(),
    };

    debug!(
        "redistribution plan: {} blocks to {} of {} ranks",
        plan.n_blocks,
        plan.ranks().count(),
        n_ranks
    );

    if config.careful {
        verify_plan(&plan, &live);
    }
    plan
}

/// Re-checks that the plan is a permutation of the live block set.
fn verify_plan(plan: &ShufflePlan, live: &[BlockEntry]) {
    let planned: usize = plan.per_rank.iter().map(Vec::len).sum();
    assert_eq!(
        planned,
        live.len(),
        "plan covers {} of {} live blocks",
        planned,
        live.len()
    );

    let mut seen: Vec<usize> = plan
        .per_rank
        .iter()
        .flat_map(|entries| entries.iter().map(|e| e.index))
        .collect();
    seen.sort_unstable();
    let mut expected: Vec<usize> = live.iter().map(|e| e.index).collect();
    expected.sort_unstable();
    assert_eq!(seen, expected, "plan is not a permutation of the live set");
}
