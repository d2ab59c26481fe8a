// ============================================================
// Layer 4 — Seeded Record Shuffling
// ============================================================
// The batch assemblers always walk records in dataset order.
// Callers who want a different order each epoch shuffle the
// records first, with a seeded RNG so a run can be reproduced.
//
// Uses Fisher-Yates via rand::seq::SliceRandom on a StdRng
// seeded from (seed, epoch).

use rand::{rngs::StdRng, seq::SliceRandom, SeedableRng};

/// Shuffle `items` in place, deterministically for a given seed and epoch.
pub fn shuffle_records<T>(items: &mut [T], seed: u64, epoch: u64) {
    let mut rng = StdRng::seed_from_u64(seed.wrapping_add(epoch));
    items.shuffle(&mut rng);

    tracing::debug!("Shuffled {} records (seed={}, epoch={})", items.len(), seed, epoch);
}
