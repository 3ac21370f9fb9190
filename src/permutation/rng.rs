//! Deterministic per-permutation random streams.
//!
//! Permutation `p` of an analysis always draws from the same generator,
//! seeded by a SplitMix64 mix of the analysis base seed and `p`. Workers
//! covering different permutation ranges, or threads scheduled in any
//! order, therefore reproduce exactly the relabellings a single process
//! would have drawn.
use rand::SeedableRng;
use rand_xoshiro::Xoshiro256PlusPlus;
use std::time::{SystemTime, UNIX_EPOCH};

/// SplitMix64 finaliser applied to `base + counter · φ`.
#[inline]
pub fn counter_rng_seed(base_seed: u64, counter: u64) -> u64 {
    let mut z = base_seed.wrapping_add(counter.wrapping_mul(0x9e37_79b9_7f4a_7c15));
    z = (z ^ (z >> 30)).wrapping_mul(0xbf58_476d_1ce4_e5b9);
    z = (z ^ (z >> 27)).wrapping_mul(0x94d0_49bb_1331_11eb);
    z ^ (z >> 31)
}

/// Generator for permutation index `p`.
pub fn permutation_rng(base_seed: u64, p: usize) -> Xoshiro256PlusPlus {
    Xoshiro256PlusPlus::seed_from_u64(counter_rng_seed(base_seed, p as u64))
}

/// Base seed from the wall clock and process id.
///
/// Concurrent workers started in the same instant still diverge through the
/// pid; the chosen seed is persisted so later workers reuse it.
pub fn seed_from_clock() -> u64 {
    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_nanos() as u64)
        .unwrap_or(0);
    counter_rng_seed(nanos, std::process::id() as u64)
}
