//! Per-process block directory
//!
//! A CSR-like index over the *blocks* a process stores: block-rows are
//! grouped by a row-pointer array, column indices within a row run are
//! strictly ascending, and each entry carries a signed block pointer. The
//! pointer encodes three things at once: zero marks a logically-deleted
//! block, the sign marks data stored as the transpose of its logical
//! orientation, and the magnitude is the data offset in the storage
//! collaborator's heap. Offsets are 1-based so that zero stays free for the
//! deleted marker.
//!
//! The directory owns no block data. It is rebuilt wholesale when the block
//! structure changes and is read-only in between, which is what makes
//! lock-free concurrent lookups safe.

use log::debug;

use crate::matrix::locate::{locate, stored_coordinates};
use crate::utils::exclusive_scan;

/// Block index of one process-local matrix panel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BlockDirectory {
    nblkrows: usize,
    nblkcols: usize,
    row_ptr: Vec<usize>,
    col_idx: Vec<usize>,
    blk_ptr: Vec<i64>,
    symmetric: bool,
}

/// One live directory entry, as yielded by [`BlockDirectory::live_blocks`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BlockEntry {
    /// Stored block-row.
    pub row: usize,
    /// Stored block-column.
    pub col: usize,
    /// Position in the directory arrays.
    pub index: usize,
    /// 1-based data offset.
    pub offset: usize,
    /// Whether the data is stored transposed relative to `(row, col)`.
    pub transposed: bool,
}

/// A data relocation emitted by [`BlockDirectory::compact`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BlockMove {
    /// 1-based offset before compaction.
    pub old_offset: usize,
    /// 1-based offset after compaction.
    pub new_offset: usize,
    /// Number of data elements to move.
    pub len: usize,
}

impl BlockDirectory {
    /// Wraps index arrays supplied by the matrix storage collaborator.
    ///
    /// # Panics
    ///
    /// Panics if the arrays are inconsistent: `row_ptr` must have
    /// `nblkrows + 1` monotone entries starting at 0 and ending at the entry
    /// count, column indices must be strictly ascending within each row run
    /// and in range, and a symmetric directory must be square with every
    /// stored coordinate on the canonical side of the checkerboard.
    pub fn new(
        nblkrows: usize,
        nblkcols: usize,
        row_ptr: Vec<usize>,
        col_idx: Vec<usize>,
        blk_ptr: Vec<i64>,
        symmetric: bool,
    ) -> Self {
        assert_eq!(
            row_ptr.len(),
            nblkrows + 1,
            "row_ptr.len() must be nblkrows + 1"
        );
        assert_eq!(row_ptr[0], 0, "row_ptr must start at 0");
        assert_eq!(
            *row_ptr.last().expect("row_ptr is non-empty"),
            col_idx.len(),
            "row_ptr must end at the entry count"
        );
        assert_eq!(
            col_idx.len(),
            blk_ptr.len(),
            "col_idx.len() must equal blk_ptr.len()"
        );
        if symmetric {
            assert_eq!(
                nblkrows, nblkcols,
                "a symmetric directory must be square in blocks"
            );
        }

        for r in 0..nblkrows {
            assert!(
                row_ptr[r] <= row_ptr[r + 1],
                "row_ptr must be monotone (row {})",
                r
            );
            let run = &col_idx[row_ptr[r]..row_ptr[r + 1]];
            for (k, &c) in run.iter().enumerate() {
                assert!(
                    c < nblkcols,
                    "column index {} out of bounds in row {} (nblkcols = {})",
                    c,
                    r,
                    nblkcols
                );
                if k > 0 {
                    assert!(
                        run[k - 1] < c,
                        "column indices must be strictly ascending in row {}",
                        r
                    );
                }
                if symmetric {
                    let (sr, sc, _) = stored_coordinates(r, c, true);
                    assert!(
                        sr == r && sc == c,
                        "block ({}, {}) is not on the canonical side of a symmetric directory",
                        r,
                        c
                    );
                }
            }
        }

        Self {
            nblkrows,
            nblkcols,
            row_ptr,
            col_idx,
            blk_ptr,
            symmetric,
        }
    }

    /// Builds a directory from unsorted logical block coordinates.
    ///
    /// Data offsets are assigned in `(row, col)` order, 1-based, each block
    /// occupying `row_size * col_size` elements; all pointers come out
    /// positive (data stored in logical orientation).
    ///
    /// # Panics
    ///
    /// Panics on duplicate or out-of-range coordinates, and — when
    /// `symmetric` is set — on any coordinate not already canonical under
    /// the checkerboard rule. Canonicalizing is the caller's decision, not
    /// something to apply silently to its input.
    pub fn from_coordinates(
        coords: &[(usize, usize)],
        row_blk_sizes: &[usize],
        col_blk_sizes: &[usize],
        symmetric: bool,
    ) -> Self {
        let nblkrows = row_blk_sizes.len();
        let nblkcols = col_blk_sizes.len();

        let mut sorted = coords.to_vec();
        sorted.sort_unstable();
        for w in sorted.windows(2) {
            assert!(
                w[0] != w[1],
                "duplicate block coordinate ({}, {})",
                w[0].0,
                w[0].1
            );
        }

        let mut counts = vec![0usize; nblkrows];
        for &(r, c) in &sorted {
            assert!(r < nblkrows, "block row {} out of range", r);
            assert!(c < nblkcols, "block column {} out of range", c);
            counts[r] += 1;
        }
        let row_ptr = exclusive_scan(&counts);

        let mut col_idx = Vec::with_capacity(sorted.len());
        let mut blk_ptr = Vec::with_capacity(sorted.len());
        let mut next_offset = 1i64;
        for &(r, c) in &sorted {
            col_idx.push(c);
            blk_ptr.push(next_offset);
            next_offset += (row_blk_sizes[r] * col_blk_sizes[c]) as i64;
        }

        debug!(
            "built block directory: {} blocks over {} x {} block rows/cols",
            sorted.len(),
            nblkrows,
            nblkcols
        );

        Self::new(nblkrows, nblkcols, row_ptr, col_idx, blk_ptr, symmetric)
    }

    /// Number of block-rows.
    pub fn nblkrows(&self) -> usize {
        self.nblkrows
    }

    /// Number of block-columns.
    pub fn nblkcols(&self) -> usize {
        self.nblkcols
    }

    /// Whether only the canonical half of a symmetric matrix is stored.
    pub fn symmetric(&self) -> bool {
        self.symmetric
    }

    /// Number of index entries, deleted ones included.
    pub fn n_entries(&self) -> usize {
        self.col_idx.len()
    }

    /// Number of live (non-deleted) blocks.
    pub fn n_live_blocks(&self) -> usize {
        self.blk_ptr.iter().filter(|&&p| p != 0).count()
    }

    /// The row-pointer array.
    pub fn row_ptr(&self) -> &[usize] {
        &self.row_ptr
    }

    /// The column-index array.
    pub fn col_indices(&self) -> &[usize] {
        &self.col_idx
    }

    /// The signed block-pointer array.
    pub fn block_pointers(&self) -> &[i64] {
        &self.blk_ptr
    }

    /// Index range of block-row `row`'s entries.
    #[inline]
    pub(crate) fn row_run(&self, row: usize) -> std::ops::Range<usize> {
        self.row_ptr[row]..self.row_ptr[row + 1]
    }

    /// Iterates over live blocks in storage order.
    pub fn live_blocks(&self) -> impl Iterator<Item = BlockEntry> + '_ {
        (0..self.nblkrows).flat_map(move |r| {
            self.row_run(r).filter_map(move |idx| {
                let p = self.blk_ptr[idx];
                if p == 0 {
                    return None;
                }
                Some(BlockEntry {
                    row: r,
                    col: self.col_idx[idx],
                    index: idx,
                    offset: p.unsigned_abs() as usize,
                    transposed: p < 0,
                })
            })
        })
    }

    /// Marks the block at logical `(row, col)` deleted and returns whether a
    /// live block was there. The entry stays in the index; its pointer
    /// becomes zero.
    pub fn delete(&mut self, row: usize, col: usize) -> bool {
        match locate(self, row, col) {
            Some(loc) => {
                self.blk_ptr[loc.block] = 0;
                true
            }
            None => false,
        }
    }

    /// Rebuilds the index without deleted entries, reassigning contiguous
    /// 1-based offsets in storage order. Returns one [`BlockMove`] per live
    /// block so the storage collaborator can relocate its data heap to
    /// match; moves are emitted in ascending `new_offset` order and never
    /// overlap destructively when applied front to back.
    ///
    /// # Panics
    ///
    /// Panics if the size vectors do not match the directory shape.
    pub fn compact(&mut self, row_blk_sizes: &[usize], col_blk_sizes: &[usize]) -> Vec<BlockMove> {
        assert_eq!(
            row_blk_sizes.len(),
            self.nblkrows,
            "row size vector must have one entry per block-row"
        );
        assert_eq!(
            col_blk_sizes.len(),
            self.nblkcols,
            "column size vector must have one entry per block-column"
        );

        let live = self.n_live_blocks();
        let mut counts = vec![0usize; self.nblkrows];
        for entry in self.live_blocks() {
            counts[entry.row] += 1;
        }
        let new_row_ptr = exclusive_scan(&counts);

        let mut new_col_idx = Vec::with_capacity(live);
        let mut new_blk_ptr = Vec::with_capacity(live);
        let mut moves = Vec::with_capacity(live);
        let mut next_offset = 1usize;
        for entry in self.live_blocks() {
            let len = row_blk_sizes[entry.row] * col_blk_sizes[entry.col];
            moves.push(BlockMove {
                old_offset: entry.offset,
                new_offset: next_offset,
                len,
            });
            new_col_idx.push(entry.col);
            let signed = next_offset as i64;
            new_blk_ptr.push(if entry.transposed { -signed } else { signed });
            next_offset += len;
        }

        debug!(
            "compacted block directory: {} live of {} entries kept",
            live,
            self.n_entries()
        );

        self.row_ptr = new_row_ptr;
        self.col_idx = new_col_idx;
        self.blk_ptr = new_blk_ptr;
        moves
    }
}
