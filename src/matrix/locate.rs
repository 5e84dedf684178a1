//! Block lookup
//!
//! Finding a block is a three-step walk: canonicalize the requested
//! coordinates (symmetric matrices store only one orientation of each
//! off-diagonal pair), slice the row run out of the directory, and binary
//! search the run's ascending column indices. A zero block pointer at the
//! found position means the block was deleted and the lookup misses.
//!
//! The orientation flag returned to the caller combines two independent
//! transposes: the coordinate swap applied during canonicalization and the
//! stored-transposed sign of the block pointer. Either alone means the data
//! is the transpose of what the caller asked for; both together cancel.
//!
//! Lookups take `&BlockDirectory` and touch no shared mutable state, so any
//! number of threads may search the same directory concurrently.

use crate::matrix::directory::BlockDirectory;

/// Checkerboard side test: true when the stored orientation of `(row, col)`
/// is the swapped one. The two orientations of any off-diagonal pair land on
/// opposite sides; diagonal coordinates never swap.
#[inline]
fn checker_transpose(row: usize, col: usize) -> bool {
    ((row + col) & 1 == 1) == (col >= row)
}

/// Maps logical block coordinates to stored ones.
///
/// For a non-symmetric matrix this is the identity. For a symmetric matrix
/// the checkerboard rule picks which orientation of each off-diagonal pair
/// is stored; the returned flag says whether the coordinates were swapped,
/// in which case the stored data is the transpose of the logical block.
///
/// # Returns
///
/// `(stored_row, stored_col, swapped)`.
pub fn stored_coordinates(row: usize, col: usize, symmetric: bool) -> (usize, usize, bool) {
    if symmetric && checker_transpose(row, col) {
        (col, row, true)
    } else {
        (row, col, false)
    }
}

/// A successful block lookup.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BlockLocation {
    /// Stored block-row (after canonicalization).
    pub row: usize,
    /// Stored block-column (after canonicalization).
    pub col: usize,
    /// Position in the directory arrays.
    pub block: usize,
    /// 1-based data offset.
    pub offset: usize,
    /// Whether the stored data is the transpose of the *requested* block.
    pub transposed: bool,
}

/// Looks up the block at logical `(row, col)`.
///
/// Returns `None` when no entry exists or the entry is deleted.
///
/// # Panics
///
/// Panics if `row` or `col` is outside the directory's block shape.
pub fn locate(dir: &BlockDirectory, row: usize, col: usize) -> Option<BlockLocation> {
    assert!(
        row < dir.nblkrows(),
        "block row {} out of range (nblkrows = {})",
        row,
        dir.nblkrows()
    );
    assert!(
        col < dir.nblkcols(),
        "block column {} out of range (nblkcols = {})",
        col,
        dir.nblkcols()
    );

    let (srow, scol, swapped) = stored_coordinates(row, col, dir.symmetric());
    let run = dir.row_run(srow);
    let pos = dir.col_indices()[run.clone()].binary_search(&scol).ok()?;
    finish_lookup(dir, srow, scol, swapped, run.start + pos)
}

#[inline]
fn finish_lookup(
    dir: &BlockDirectory,
    srow: usize,
    scol: usize,
    swapped: bool,
    index: usize,
) -> Option<BlockLocation> {
    let p = dir.block_pointers()[index];
    if p == 0 {
        return None;
    }
    Some(BlockLocation {
        row: srow,
        col: scol,
        block: index,
        offset: p.unsigned_abs() as usize,
        transposed: swapped != (p < 0),
    })
}

/// Resumable lookup state for sweeps in ascending column order.
///
/// A cursor remembers where the previous search in a row run ended and
/// restarts the binary search there, shrinking the window as a sweep
/// advances. Queries that move to another row or backward in column fall
/// back to the full run, so results are always identical to [`locate`].
///
/// The cursor holds positions into the directory arrays and must be
/// discarded after [`BlockDirectory::compact`] rebuilds them. Deletions are
/// harmless since they leave the index structure in place.
#[derive(Debug, Clone, Copy, Default)]
pub struct LookupCursor {
    valid: bool,
    row: usize,
    col: usize,
    lower: usize,
}

impl LookupCursor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Forgets the remembered position; the next lookup searches a full run.
    pub fn reset(&mut self) {
        self.valid = false;
    }
}

/// Like [`locate`], narrowing the search window with `cursor` when queries
/// arrive in ascending column order within one stored row.
pub fn locate_with_cursor(
    dir: &BlockDirectory,
    row: usize,
    col: usize,
    cursor: &mut LookupCursor,
) -> Option<BlockLocation> {
    assert!(
        row < dir.nblkrows(),
        "block row {} out of range (nblkrows = {})",
        row,
        dir.nblkrows()
    );
    assert!(
        col < dir.nblkcols(),
        "block column {} out of range (nblkcols = {})",
        col,
        dir.nblkcols()
    );

    let (srow, scol, swapped) = stored_coordinates(row, col, dir.symmetric());
    let run = dir.row_run(srow);
    let lo = if cursor.valid && cursor.row == srow && scol >= cursor.col {
        cursor.lower
    } else {
        run.start
    };

    // Entries below `lo` all carry columns below `scol`, so the narrowed
    // window sees exactly the candidates the full run would.
    let found = dir.col_indices()[lo..run.end].binary_search(&scol);
    let next = match found {
        Ok(p) | Err(p) => p,
    };
    *cursor = LookupCursor {
        valid: true,
        row: srow,
        col: scol,
        lower: lo + next,
    };

    let pos = found.ok()?;
    finish_lookup(dir, srow, scol, swapped, lo + pos)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn plain_directory() -> BlockDirectory {
        // 3x4 block structure, uniform 2x2 blocks:
        //   row 0: columns 1, 3
        //   row 1: (empty)
        //   row 2: columns 0, 2, 3
        BlockDirectory::from_coordinates(
            &[(0, 1), (0, 3), (2, 0), (2, 2), (2, 3)],
            &[2, 2, 2],
            &[2, 2, 2, 2],
            false,
        )
    }

    fn symmetric_directory() -> BlockDirectory {
        // Canonical coordinates only: (0,0) diagonal, (1,0) for the
        // {(0,1),(1,0)} pair, (0,2) for the {(0,2),(2,0)} pair.
        BlockDirectory::from_coordinates(&[(0, 0), (1, 0), (0, 2)], &[2, 2, 2], &[2, 2, 2], true)
    }

    #[test]
    fn test_checkerboard_picks_one_orientation_per_pair() {
        for r in 0..8 {
            for c in 0..8 {
                if r == c {
                    assert!(!checker_transpose(r, c), "diagonal ({}, {}) swapped", r, c);
                } else {
                    assert_ne!(
                        checker_transpose(r, c),
                        checker_transpose(c, r),
                        "pair ({}, {}) must swap exactly once",
                        r,
                        c
                    );
                }
            }
        }
    }

    #[test]
    fn test_stored_coordinates_symmetric() {
        // Odd coordinate sum stores the lower orientation
        assert_eq!(stored_coordinates(0, 1, true), (1, 0, true));
        assert_eq!(stored_coordinates(1, 0, true), (1, 0, false));
        // Even coordinate sum stores the upper orientation
        assert_eq!(stored_coordinates(0, 2, true), (0, 2, false));
        assert_eq!(stored_coordinates(2, 0, true), (0, 2, true));
        // Diagonal is untouched
        assert_eq!(stored_coordinates(3, 3, true), (3, 3, false));
    }

    #[test]
    fn test_stored_coordinates_non_symmetric_identity() {
        assert_eq!(stored_coordinates(0, 1, false), (0, 1, false));
        assert_eq!(stored_coordinates(2, 0, false), (2, 0, false));
    }

    #[test]
    fn test_locate_hit_and_miss() {
        let dir = plain_directory();

        let loc = locate(&dir, 0, 3).unwrap();
        assert_eq!(loc.block, 1);
        assert_eq!(loc.offset, 5);
        assert!(!loc.transposed);

        // Absent column inside a populated row
        assert!(locate(&dir, 0, 2).is_none());
        // Empty row
        assert!(locate(&dir, 1, 1).is_none());
    }

    #[test]
    fn test_locate_skips_deleted() {
        let mut dir = plain_directory();
        assert!(locate(&dir, 2, 2).is_some());
        dir.delete(2, 2);
        assert!(locate(&dir, 2, 2).is_none());
        // Neighbours in the same run are unaffected
        assert!(locate(&dir, 2, 0).is_some());
        assert!(locate(&dir, 2, 3).is_some());
    }

    #[test]
    fn test_locate_symmetric_pair_orientation() {
        let dir = symmetric_directory();

        // Both requests resolve to the same stored block with opposite
        // orientation flags.
        let canonical = locate(&dir, 1, 0).unwrap();
        let swapped = locate(&dir, 0, 1).unwrap();
        assert_eq!(canonical.block, swapped.block);
        assert_eq!(canonical.offset, swapped.offset);
        assert!(!canonical.transposed);
        assert!(swapped.transposed);

        let diag = locate(&dir, 0, 0).unwrap();
        assert!(!diag.transposed);
    }

    #[test]
    fn test_locate_sign_flips_orientation() {
        // Same structure as symmetric_directory(), but block (1, 0) is
        // stored transposed (negative pointer).
        let dir = BlockDirectory::new(
            3,
            3,
            vec![0, 2, 3, 3],
            vec![0, 2, 0],
            vec![1, 5, -9],
            true,
        );

        // The stored data of (1, 0) is already in (0, 1) orientation, so the
        // swapped request is the one that comes back untransposed.
        assert!(locate(&dir, 1, 0).unwrap().transposed);
        assert!(!locate(&dir, 0, 1).unwrap().transposed);
    }

    #[test]
    fn test_cursor_matches_plain_locate() {
        let dir = plain_directory();
        let mut cursor = LookupCursor::new();

        // Ascending sweep across row 2, including misses
        for col in 0..4 {
            let plain = locate(&dir, 2, col);
            let cursored = locate_with_cursor(&dir, 2, col, &mut cursor);
            assert_eq!(plain, cursored, "column {}", col);
        }
    }

    #[test]
    fn test_cursor_survives_row_change_and_backward_query() {
        let dir = plain_directory();
        let mut cursor = LookupCursor::new();

        assert!(locate_with_cursor(&dir, 2, 3, &mut cursor).is_some());
        // Row change falls back to a full search
        assert!(locate_with_cursor(&dir, 0, 1, &mut cursor).is_some());
        // Backward column within the row does too
        assert!(locate_with_cursor(&dir, 2, 3, &mut cursor).is_some());
        assert!(locate_with_cursor(&dir, 2, 0, &mut cursor).is_some());
        // Repeating the same query is still a hit
        assert!(locate_with_cursor(&dir, 2, 0, &mut cursor).is_some());
    }

    #[test]
    fn test_cursor_sees_deletions() {
        let mut dir = plain_directory();
        let mut cursor = LookupCursor::new();

        assert!(locate_with_cursor(&dir, 2, 0, &mut cursor).is_some());
        dir.delete(2, 2);
        assert!(locate_with_cursor(&dir, 2, 2, &mut cursor).is_none());
        assert!(locate_with_cursor(&dir, 2, 3, &mut cursor).is_some());
    }

    #[test]
    #[should_panic(expected = "out of range")]
    fn test_locate_rejects_out_of_range() {
        locate(&plain_directory(), 3, 0);
    }
}
