//! Digit reduction with master-number preservation.
//!
//! All numerology values flow through [`reduce_to_single_digit_or_master`].
//! No other function in the workspace is allowed to collapse a running sum.

/// Master numbers. Terminal: reduction stops as soon as a running sum hits one.
pub const MASTER_NUMBERS: [u32; 4] = [11, 22, 33, 44];

/// Check whether `n` is a master number.
pub fn is_master(n: u64) -> bool {
    MASTER_NUMBERS.iter().any(|&m| u64::from(m) == n)
}

/// Check whether `n` is a valid terminal numerology value: [1,9] or a master number.
pub fn is_valid_terminal(n: u32) -> bool {
    (1..=9).contains(&n) || is_master(u64::from(n))
}

/// Sum the decimal digits of `n`.
pub fn digit_sum(mut n: u64) -> u64 {
    let mut sum = 0;
    while n > 0 {
        sum += n % 10;
        n /= 10;
    }
    sum
}

/// Reduce `n` to a single digit, halting on master numbers.
///
/// The master check runs before every summation step, so a running sum of
/// 22 stays 22 rather than collapsing to 4. The result is always in
/// `[0, 9]` or one of [`MASTER_NUMBERS`], and already-reduced values are
/// fixed points.
pub fn reduce_to_single_digit_or_master(n: u64) -> u32 {
    let mut current = n;
    loop {
        if current <= 9 || is_master(current) {
            // Both branches are at most 44
            return current as u32;
        }
        current = digit_sum(current);
    }
}
