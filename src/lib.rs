//! # blockgrid: distribution engine for block-sparse matrices
//!
//! blockgrid maps the tiles of a block-sparse matrix onto a 2-D process
//! grid and keeps them findable: deterministic ownership for every block,
//! collision-free lookup inside a process, and plans for moving blocks when
//! the layout changes.
//!
//! ## Overview
//!
//! This library implements the distribution layer of a distributed
//! block-sparse matrix, with a focus on:
//!
//! - Deterministic placement: every (row, column) block has exactly one
//!   owning rank, derivable on any process without communication
//! - Load balance: greedy weighted binning with a bounded worst case
//! - Layout agility: rebinning between grid shapes, reblocking between
//!   block-size partitions, and planned redistribution of stored blocks
//!
//! ## Components
//!
//! 1. **Distributions** (`dist`): element-to-bin assignments with optional
//!    per-bin images, plus inversion into per-bin element lists.
//!
//! 2. **Rebinning** (`dist::rebin`): remapping a distribution onto a
//!    different bin count through the multiplicity/image scheme.
//!
//! 3. **Process grid** (`grid`): the 2-D rank array, its transpose, and the
//!    block ownership query.
//!
//! 4. **Block directory and locator** (`matrix`): the per-process CSR-like
//!    block index with symmetry canonicalization, lazy deletion, and
//!    transpose-aware lookup.
//!
//! 5. **Reblocking planner** (`matrix::reblock`): overlap structure between
//!    two blockings of the same axis.
//!
//! 6. **Redistribution planner** (`redistribute`): per-rank shuffle plans
//!    for moving stored blocks to a new layout.
//!
//! ## Usage
//!
//! Deriving the owner of a block:
//!
//! ```
//! use blockgrid::{block_owner, Distribution, ProcessGrid};
//!
//! let rows = Distribution::cyclic(6, 2);
//! let cols = Distribution::cyclic(6, 3);
//! let grid = ProcessGrid::column_major(2, 3);
//!
//! assert_eq!(block_owner(&grid, &rows, &cols, 4, 5, false), 4);
//! ```
//!
//! Looking up a block inside the owning process:
//!
//! ```
//! use blockgrid::{locate, BlockDirectory};
//!
//! let dir = BlockDirectory::from_coordinates(&[(0, 0), (1, 0)], &[2, 2], &[3, 3], false);
//!
//! let hit = locate(&dir, 1, 0).unwrap();
//! assert_eq!(hit.offset, 7);
//! assert!(locate(&dir, 0, 1).is_none());
//! ```

pub mod config;
pub mod dist;
pub mod grid;
pub mod matrix;
pub mod redistribute;
pub mod utils;

// Re-export primary components
pub use config::EngineConfig;
pub use dist::{local_index_lists, Distribution, DistributionSummary};
pub use dist::{rebin, rebin_parameters, RebinParams};
pub use grid::{block_owner, ProcessGrid};
pub use matrix::{
    locate, locate_with_cursor, stored_coordinates, BlockDirectory, BlockEntry, BlockLocation,
    BlockMove, LookupCursor,
};
pub use matrix::{reblocking_plan, BlockOverlap, ReblockPlan};
pub use redistribute::{redistribution_plan, ShuffleEntry, ShufflePlan};
pub use utils::formats::{from_csr, to_csr};

/// Version information for the blockgrid library
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
