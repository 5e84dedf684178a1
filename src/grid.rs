//! 2-D process grid index
//!
//! Maps a (row-bin, column-bin) pair to a physical process rank. The grid is
//! supplied by the environment (an MPI Cartesian communicator, a BLACS
//! context, a test fixture); this module never invents ranks, it only indexes
//! and transposes the array it is given.

use ndarray::Array2;

use crate::dist::Distribution;
use crate::matrix::stored_coordinates;

/// A 2-D array of process ranks of shape `(nprow, npcol)`.
///
/// Transposition swaps the logical axes while leaving the physical ranks in
/// place: `transposed().rank(i, j) == rank(j, i)`. A block placed for a
/// transposed access pattern therefore lands on the same physical process as
/// the corresponding non-transposed block, which is what makes in-place
/// transposition possible.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProcessGrid {
    ranks: Array2<usize>,
}

impl ProcessGrid {
    /// Creates a grid from a rank array supplied by the process-grid
    /// provider.
    ///
    /// # Panics
    ///
    /// Panics if the array is empty along either axis.
    pub fn new(ranks: Array2<usize>) -> Self {
        assert!(
            ranks.nrows() > 0 && ranks.ncols() > 0,
            "process grid must be non-empty, got shape {:?}",
            ranks.dim()
        );
        Self { ranks }
    }

    /// Builds the ranks `0..nprow*npcol` in column-major order, the layout
    /// BLACS-style environments hand out.
    pub fn column_major(nprow: usize, npcol: usize) -> Self {
        assert!(nprow > 0 && npcol > 0, "process grid must be non-empty");
        Self {
            ranks: Array2::from_shape_fn((nprow, npcol), |(i, j)| j * nprow + i),
        }
    }

    /// Builds the ranks `0..nprow*npcol` in row-major order, the layout
    /// MPI Cartesian communicators hand out.
    pub fn row_major(nprow: usize, npcol: usize) -> Self {
        assert!(nprow > 0 && npcol > 0, "process grid must be non-empty");
        Self {
            ranks: Array2::from_shape_fn((nprow, npcol), |(i, j)| i * npcol + j),
        }
    }

    /// Number of process rows.
    pub fn nprow(&self) -> usize {
        self.ranks.nrows()
    }

    /// Number of process columns.
    pub fn npcol(&self) -> usize {
        self.ranks.ncols()
    }

    /// Total number of grid slots.
    pub fn size(&self) -> usize {
        self.ranks.len()
    }

    /// The rank owning grid position `(row_bin, col_bin)`.
    ///
    /// # Panics
    ///
    /// Panics if either coordinate is outside the grid shape.
    #[inline]
    pub fn rank(&self, row_bin: usize, col_bin: usize) -> usize {
        self.ranks[(row_bin, col_bin)]
    }

    /// The grid with logical axes swapped and physical ranks untouched.
    pub fn transposed(&self) -> ProcessGrid {
        ProcessGrid {
            ranks: self.ranks.t().to_owned(),
        }
    }

    /// Grid coordinates of a rank, or `None` if the rank does not appear.
    ///
    /// Linear scan; ranks are not required to be dense or sorted.
    pub fn coords_of(&self, rank: usize) -> Option<(usize, usize)> {
        self.ranks
            .indexed_iter()
            .find(|&(_, &r)| r == rank)
            .map(|(coords, _)| coords)
    }
}

/// The rank owning logical block `(row, col)` under the given layout.
///
/// For a symmetric matrix the coordinates are first canonicalized with the
/// checkerboard rule, so both `(row, col)` and `(col, row)` resolve to the
/// same rank. The row and column distributions must cover the block-row and
/// block-column counts of the matrix in question.
pub fn block_owner(
    grid: &ProcessGrid,
    row_dist: &Distribution,
    col_dist: &Distribution,
    row: usize,
    col: usize,
    symmetric: bool,
) -> usize {
    let (srow, scol, _) = stored_coordinates(row, col, symmetric);
    grid.rank(row_dist.bin_of(srow), col_dist.bin_of(scol))
}
