//! Random source construction.
//!
//! Seeded generators use ChaCha8, whose output stream is fixed by the seed on every
//! platform. Unseeded generators mix OS entropy with the wall clock and a per-process
//! sequence number, so two calls made within the same clock tick still diverge.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{SystemTime, UNIX_EPOCH};

use rand::rngs::OsRng;
use rand::{RngCore, SeedableRng};
use rand_chacha::ChaCha8Rng;

/// Distance between seeds derived from one base seed.
pub const SEED_STRIDE: u64 = 1000;

static SEQUENCE: AtomicU64 = AtomicU64::new(0);

/// Builds the generator for one call: deterministic when `seed` is given.
pub fn seeded_rng(seed: Option<u64>) -> ChaCha8Rng {
    ChaCha8Rng::seed_from_u64(seed.unwrap_or_else(fresh_seed))
}

/// Seed for `index`-th unit (asset, event) under `base`.
#[must_use]
pub fn derive_seed(base: u64, index: usize) -> u64 {
    base.wrapping_add((index as u64).wrapping_mul(SEED_STRIDE))
}

/// Non-reproducible seed, distinct for every call in the process.
pub fn fresh_seed() -> u64 {
    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_nanos() as u64)
        .unwrap_or_default();
    let sequence = SEQUENCE.fetch_add(1, Ordering::Relaxed);
    let entropy = os_entropy().unwrap_or_default();

    splitmix64(nanos ^ splitmix64(sequence) ^ entropy)
}

fn splitmix64(mut x: u64) -> u64 {
    x = x.wrapping_add(0x9E37_79B9_7F4A_7C15);
    x = (x ^ (x >> 30)).wrapping_mul(0xBF58_476D_1CE4_E5B9);
    x = (x ^ (x >> 27)).wrapping_mul(0x94D0_49BB_1331_11EB);
    x ^ (x >> 31)
}

fn os_entropy() -> Option<u64> {
    let mut buf = [0u8; 8];
    OsRng.try_fill_bytes(&mut buf).ok()?;
    Some(u64::from_le_bytes(buf))
}
