// True for zero and for every power of two.
pub fn is_power_of_two_or_zero(n: u64) -> bool {
    n & n.wrapping_sub(1) == 0
}

// Number of address bits needed to index n locations. Zero for n <= 1.
pub fn ceil_log2(n: u64) -> i64 {
    if n <= 1 {
        0
    } else {
        i64::from(64 - (n - 1).leading_zeros())
    }
}
