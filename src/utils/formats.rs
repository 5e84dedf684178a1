//! Conversions between the block format and element-level sparse matrices
//!
//! Foreign solvers want plain element CSR, not blocks. Export flattens the
//! local block panel into an `sprs::CsMat` whose rows sit at their global
//! positions; import derives block membership from a CSR pattern and packs
//! a block data heap, zero-filling the elements a member block covers but
//! the pattern lacks.

use num_traits::Num;
use sprs::CsMat;
use std::collections::HashMap;

use crate::matrix::directory::BlockDirectory;
use crate::utils::{exclusive_scan, partition_of};

/// Flattens a block panel into an element-level CSR matrix.
///
/// Rows are placed in the global frame: the first `first_row` rows of the
/// result are empty and the local rows follow, so stacking every process's
/// chunk reassembles the full matrix. `first_row` is the process's global
/// first-row offset, already resolved by the communication layer.
///
/// Block payloads are read from `data` at their directory offsets, row-major
/// in stored orientation; negative-pointer blocks are un-transposed on the
/// fly. Deleted blocks contribute nothing.
///
/// # Panics
///
/// Panics if the directory is symmetric (desymmetrize first; the implied
/// half of a stored block may belong to another process's rows), if the size
/// vectors do not match the directory shape, or if `data` is shorter than
/// the highest block end.
pub fn to_csr<T>(
    dir: &BlockDirectory,
    row_blk_sizes: &[usize],
    col_blk_sizes: &[usize],
    data: &[T],
    first_row: usize,
) -> CsMat<T>
where
    T: Copy + Num + Default,
{
    assert!(
        !dir.symmetric(),
        "symmetric directories must be desymmetrized before element export"
    );
    assert_eq!(
        row_blk_sizes.len(),
        dir.nblkrows(),
        "row size vector must have one entry per block-row"
    );
    assert_eq!(
        col_blk_sizes.len(),
        dir.nblkcols(),
        "column size vector must have one entry per block-column"
    );
    for entry in dir.live_blocks() {
        let end = entry.offset - 1 + row_blk_sizes[entry.row] * col_blk_sizes[entry.col];
        assert!(
            end <= data.len(),
            "block ({}, {}) ends at {} but the data heap holds {}",
            entry.row,
            entry.col,
            end,
            data.len()
        );
    }

    let local_rows: usize = row_blk_sizes.iter().sum();
    let ncols: usize = col_blk_sizes.iter().sum();
    let col_base = exclusive_scan(col_blk_sizes);

    let mut indptr = vec![0usize; first_row + 1];
    let mut indices = Vec::new();
    let mut values = Vec::new();

    for r in 0..dir.nblkrows() {
        let rsize = row_blk_sizes[r];
        for i in 0..rsize {
            for idx in dir.row_run(r) {
                let p = dir.block_pointers()[idx];
                if p == 0 {
                    continue;
                }
                let c = dir.col_indices()[idx];
                let csize = col_blk_sizes[c];
                let base = p.unsigned_abs() as usize - 1;
                for j in 0..csize {
                    // A negative pointer stores the csize x rsize transpose.
                    let v = if p < 0 {
                        data[base + j * rsize + i]
                    } else {
                        data[base + i * csize + j]
                    };
                    indices.push(col_base[c] + j);
                    values.push(v);
                }
            }
            indptr.push(indices.len());
        }
    }

    CsMat::new((first_row + local_rows, ncols), indptr, indices, values)
}

/// Derives a block panel from an element-level CSR matrix.
///
/// A block is a member when the pattern touches at least one of its
/// elements. Returns the directory plus the packed data heap; heap elements
/// the pattern does not cover are zero.
///
/// # Panics
///
/// Panics if the matrix shape does not match the totals of the size vectors.
pub fn from_csr<T>(
    matrix: CsMat<T>,
    row_blk_sizes: &[usize],
    col_blk_sizes: &[usize],
) -> (BlockDirectory, Vec<T>)
where
    T: Copy + Num + Default,
{
    let matrix = if matrix.is_csr() {
        matrix
    } else {
        matrix.to_csr()
    };

    let nrows: usize = row_blk_sizes.iter().sum();
    let ncols: usize = col_blk_sizes.iter().sum();
    assert_eq!(
        matrix.shape(),
        (nrows, ncols),
        "matrix shape must match the block size totals"
    );

    let row_base = exclusive_scan(row_blk_sizes);
    let col_base = exclusive_scan(col_blk_sizes);

    let mut members: Vec<(usize, usize)> = Vec::new();
    for (er, row_vec) in matrix.outer_iterator().enumerate() {
        if row_vec.nnz() == 0 {
            continue;
        }
        let br = partition_of(&row_base, er);
        for (ec, _) in row_vec.iter() {
            members.push((br, partition_of(&col_base, ec)));
        }
    }
    members.sort_unstable();
    members.dedup();

    let dir = BlockDirectory::from_coordinates(&members, row_blk_sizes, col_blk_sizes, false);

    let heap_len: usize = members
        .iter()
        .map(|&(br, bc)| row_blk_sizes[br] * col_blk_sizes[bc])
        .sum();
    let mut heap = vec![T::zero(); heap_len];

    let offsets: HashMap<(usize, usize), usize> = dir
        .live_blocks()
        .map(|e| ((e.row, e.col), e.offset - 1))
        .collect();

    for (er, row_vec) in matrix.outer_iterator().enumerate() {
        for (ec, &v) in row_vec.iter() {
            let br = partition_of(&row_base, er);
            let bc = partition_of(&col_base, ec);
            let base = offsets[&(br, bc)];
            let i = er - row_base[br];
            let j = ec - col_base[bc];
            heap[base + i * col_blk_sizes[bc] + j] = v;
        }
    }

    (dir, heap)
}
