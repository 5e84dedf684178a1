//! Shared index algebra: prefix scans, divisor arithmetic, partition search

pub mod formats;

/// Computes an exclusive prefix sum (scan) for a slice of sizes.
///
/// The result has one more element than the input; `result[i]` is the offset
/// at which element `i` starts and `result[input.len()]` is the total. Applied
/// to a block-size vector this yields the block boundary array.
pub fn exclusive_scan(input: &[usize]) -> Vec<usize> {
    let mut result = Vec::with_capacity(input.len() + 1);
    let mut sum = 0;

    result.push(0); // First boundary is always 0

    for &val in input {
        sum += val;
        result.push(sum);
    }

    result
}

/// Greatest common divisor (Euclid).
pub fn gcd(mut a: usize, mut b: usize) -> usize {
    while b != 0 {
        let t = b;
        b = a % b;
        a = t;
    }
    a
}

/// Least common multiple.
///
/// # Panics
///
/// Panics if both arguments are zero.
pub fn lcm(a: usize, b: usize) -> usize {
    assert!(a != 0 || b != 0, "lcm(0, 0) is undefined");
    if a == 0 || b == 0 {
        return 0;
    }
    a / gcd(a, b) * b
}

/// Finds the partition containing a global element index.
///
/// `boundaries` is an exclusive-scan array as produced by [`exclusive_scan`];
/// returns `i` such that `boundaries[i] <= index < boundaries[i + 1]`,
/// skipping zero-length partitions.
///
/// # Panics
///
/// Panics if `index` lies beyond the last boundary.
pub fn partition_of(boundaries: &[usize], index: usize) -> usize {
    let total = *boundaries.last().expect("boundary array must be non-empty");
    assert!(
        index < total,
        "index {} out of range (total {})",
        index,
        total
    );

    // partition_point gives the first boundary strictly greater than index;
    // the containing partition starts one boundary earlier.
    boundaries.partition_point(|&b| b <= index) - 1
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exclusive_scan() {
        let input = vec![1, 2, 3, 4];
        let expected = vec![0, 1, 3, 6, 10];
        assert_eq!(exclusive_scan(&input), expected);

        let input = vec![0, 0, 5, 0];
        let expected = vec![0, 0, 0, 5, 5];
        assert_eq!(exclusive_scan(&input), expected);
    }

    #[test]
    fn test_gcd_lcm() {
        assert_eq!(gcd(12, 18), 6);
        assert_eq!(gcd(7, 13), 1);
        assert_eq!(gcd(0, 5), 5);
        assert_eq!(lcm(4, 6), 12);
        assert_eq!(lcm(5, 1), 5);
        assert_eq!(lcm(0, 3), 0);
    }

    #[test]
    fn test_partition_of() {
        // Three partitions of sizes 3, 3, 4 covering [0, 10)
        let boundaries = exclusive_scan(&[3, 3, 4]);
        assert_eq!(partition_of(&boundaries, 0), 0);
        assert_eq!(partition_of(&boundaries, 2), 0);
        assert_eq!(partition_of(&boundaries, 3), 1);
        assert_eq!(partition_of(&boundaries, 6), 2);
        assert_eq!(partition_of(&boundaries, 9), 2);
    }

    #[test]
    fn test_partition_of_skips_empty() {
        // Zero-length partition in the middle never owns an index
        let boundaries = exclusive_scan(&[2, 0, 3]);
        assert_eq!(partition_of(&boundaries, 1), 0);
        assert_eq!(partition_of(&boundaries, 2), 2);
    }

    #[test]
    #[should_panic(expected = "out of range")]
    fn test_partition_of_out_of_range() {
        let boundaries = exclusive_scan(&[2, 2]);
        partition_of(&boundaries, 4);
    }
}
