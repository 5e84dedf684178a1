//! Reblocking plans
//!
//! When the same axis is partitioned two different ways, every source block
//! overlaps a contiguous range of destination blocks. The planner sweeps
//! both partitions with a two-pointer pass and records each overlap as a
//! copy instruction: which destination block, how many elements, and the
//! offsets inside the source and destination blocks. Executing the
//! instructions in order copies an axis from one blocking to the other
//! without ever consulting element coordinates.
//!
//! For `s` non-empty source and `d` non-empty destination blocks the sweep
//! emits at most `s + d - 1` overlaps, since every instruction exhausts at
//! least one side.

use log::debug;

use crate::config::EngineConfig;

/// One copy instruction of a reblocking plan.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BlockOverlap {
    /// Destination block receiving this range.
    pub dst_block: usize,
    /// Number of overlapping elements; always positive.
    pub len: usize,
    /// Start of the range inside the source block.
    pub src_offset: usize,
    /// Start of the range inside the destination block.
    pub dst_offset: usize,
}

/// The full set of copy instructions mapping one blocking of an axis onto
/// another, grouped by source block.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReblockPlan {
    overlaps: Vec<BlockOverlap>,
    /// Per source block: first overlap index and overlap count.
    src_spans: Vec<(usize, usize)>,
    n_dst_blocks: usize,
    total: usize,
}

impl ReblockPlan {
    /// All copy instructions in sweep order (ascending source block, then
    /// ascending offset).
    pub fn overlaps(&self) -> &[BlockOverlap] {
        &self.overlaps
    }

    /// The instructions feeding out of source block `src_block`. Empty for
    /// zero-length blocks.
    pub fn for_source(&self, src_block: usize) -> &[BlockOverlap] {
        let (first, count) = self.src_spans[src_block];
        &self.overlaps[first..first + count]
    }

    pub fn n_src_blocks(&self) -> usize {
        self.src_spans.len()
    }

    pub fn n_dst_blocks(&self) -> usize {
        self.n_dst_blocks
    }

    /// Total number of elements moved by the plan (the axis length).
    pub fn total_elements(&self) -> usize {
        self.total
    }

    pub fn len(&self) -> usize {
        self.overlaps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.overlaps.is_empty()
    }
}

/// Builds the reblocking plan between two partitions of the same axis.
///
/// Zero-length blocks on either side are skipped without emitting
/// instructions.
///
/// # Arguments
///
/// * `src_sizes` - Block sizes of the current partition
/// * `dst_sizes` - Block sizes of the target partition
/// * `config` - Engine configuration; `careful` re-verifies conservation
///
/// # Panics
///
/// Panics if the two partitions do not cover the same number of elements.
pub fn reblocking_plan(
    src_sizes: &[usize],
    dst_sizes: &[usize],
    config: &EngineConfig,
) -> ReblockPlan {
    let total_src: usize = src_sizes.iter().sum();
    let total_dst: usize = dst_sizes.iter().sum();
    assert_eq!(
        total_src, total_dst,
        "source and destination partitions must cover the same axis length"
    );

    let mut overlaps = Vec::with_capacity(src_sizes.len() + dst_sizes.len());
    let mut src_spans = Vec::with_capacity(src_sizes.len());

    let mut next_dst = 0usize;
    let mut cur_dst = 0usize;
    let mut rem_dst = 0usize;
    let mut dst_offset = 0usize;

    for &src_size in src_sizes {
        let first = overlaps.len();
        let mut rem_src = src_size;
        let mut src_offset = 0usize;
        while rem_src > 0 {
            while rem_dst == 0 {
                // Equal totals guarantee a destination block remains.
                cur_dst = next_dst;
                rem_dst = dst_sizes[cur_dst];
                dst_offset = 0;
                next_dst += 1;
            }
            let len = rem_src.min(rem_dst);
            overlaps.push(BlockOverlap {
                dst_block: cur_dst,
                len,
                src_offset,
                dst_offset,
            });
            src_offset += len;
            dst_offset += len;
            rem_src -= len;
            rem_dst -= len;
        }
        src_spans.push((first, overlaps.len() - first));
    }

    debug!(
        "reblocking plan: {} overlaps, {} -> {} blocks, {} elements",
        overlaps.len(),
        src_sizes.len(),
        dst_sizes.len(),
        total_src
    );

    let plan = ReblockPlan {
        overlaps,
        src_spans,
        n_dst_blocks: dst_sizes.len(),
        total: total_src,
    };

    if config.careful {
        verify_plan(&plan, src_sizes, dst_sizes);
    }
    plan
}

/// Re-derives the conservation properties of a finished plan.
fn verify_plan(plan: &ReblockPlan, src_sizes: &[usize], dst_sizes: &[usize]) {
    let moved: usize = plan.overlaps.iter().map(|o| o.len).sum();
    assert_eq!(
        moved, plan.total,
        "plan moves {} of {} elements",
        moved, plan.total
    );

    let mut per_dst = vec![0usize; dst_sizes.len()];
    for o in &plan.overlaps {
        assert!(o.len > 0, "zero-length overlap emitted");
        per_dst[o.dst_block] += o.len;
    }
    for (j, (&filled, &size)) in per_dst.iter().zip(dst_sizes).enumerate() {
        assert_eq!(filled, size, "destination block {} not exactly filled", j);
    }

    let nonzero_src = src_sizes.iter().filter(|&&s| s > 0).count();
    let nonzero_dst = dst_sizes.iter().filter(|&&s| s > 0).count();
    if plan.total > 0 {
        assert!(
            plan.overlaps.len() <= nonzero_src + nonzero_dst - 1,
            "plan has {} overlaps, bound is {}",
            plan.overlaps.len(),
            nonzero_src + nonzero_dst - 1
        );
    }
}
