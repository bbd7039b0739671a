//! Round scoring
//!
//! A single kill is worth 1 point; clearing several pigs with one stroke pays
//! the triangular number of the kill count, so a multi-kill outscores the
//! same kills taken one at a time.

/// Score delta for a resolved round with `kills` eliminated targets.
///
/// 0 -> 0, 1 -> 1, k -> k*(k+1)/2 for k >= 2 (2 -> 3, 3 -> 6, 4 -> 10, 5 -> 15).
pub fn round_score(kills: u32) -> u64 {
    match kills {
        0 => 0,
        1 => 1,
        k => u64::from(k) * u64::from(k + 1) / 2,
    }
}
