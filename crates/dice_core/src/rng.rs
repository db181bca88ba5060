//! Pluggable RNG interface.
//!
//! Callers install a `Box<dyn DiceRng>` rather than juggling raw state
//! pointers; the default implementation seeds a `rand_chacha::ChaCha20Rng`
//! by placing a `u64` in the first 8 bytes of its 32-byte seed.

use std::time::{SystemTime, UNIX_EPOCH};

use rand_chacha::ChaCha20Rng;
use rand_core::{RngCore, SeedableRng};

/// Capability trait satisfied by any pluggable RNG the context can install.
///
/// `roll`/`rand` never panic: out-of-range inputs return sentinel values
/// rather than erroring, since the evaluator is responsible for validating
/// `sides`/`count` against policy *before* calling in.
pub trait DiceRng {
    /// Re-seed the generator. A seed of zero derives a seed from the wall
    /// clock.
    fn init(&mut self, seed: u64);

    /// Roll a single `sides`-sided die, returning a value in `[1, sides]`.
    /// Returns `-1` if `sides <= 0`.
    fn roll(&mut self, sides: i32) -> i32;

    /// Draw a value in `[0, max)`. Returns `0` if `max == 0`.
    fn rand(&mut self, max: u64) -> u64;

    /// Release any internal state. The default implementation is a no-op;
    /// RNGs that hold external resources should override it.
    fn cleanup(&mut self) {}
}

/// Default deterministic RNG, backed by ChaCha20.
pub struct ChaChaDiceRng {
    rng: ChaCha20Rng,
}

impl ChaChaDiceRng {
    pub fn new(seed: u64) -> Self {
        ChaChaDiceRng { rng: ChaCha20Rng::from_seed(seed_bytes(seed)) }
    }
}

fn seed_bytes(seed: u64) -> [u8; 32] {
    let mut bytes = [0u8; 32];
    bytes[..8].copy_from_slice(&seed.to_le_bytes());
    bytes
}

/// Derive a seed from the wall clock for the `seed == 0` convention.
fn wall_clock_seed() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_nanos() as u64)
        .unwrap_or(0x9E3779B97F4A7C15)
}

impl DiceRng for ChaChaDiceRng {
    fn init(&mut self, seed: u64) {
        let effective = if seed == 0 { wall_clock_seed() } else { seed };
        self.rng = ChaCha20Rng::from_seed(seed_bytes(effective));
    }

    fn roll(&mut self, sides: i32) -> i32 {
        if sides <= 0 {
            return -1;
        }
        let n = sides as u64;
        (unbiased_below(&mut self.rng, n) + 1) as i32
    }

    fn rand(&mut self, max: u64) -> u64 {
        if max == 0 {
            return 0;
        }
        unbiased_below(&mut self.rng, max)
    }
}

impl Default for ChaChaDiceRng {
    fn default() -> Self {
        ChaChaDiceRng::new(wall_clock_seed())
    }
}

/// Unbiased integer in `[0, n)` via rejection sampling on the top of the
/// `u64` range.
fn unbiased_below(rng: &mut ChaCha20Rng, n: u64) -> u64 {
    debug_assert!(n > 0);
    let zone = u64::MAX - (u64::MAX % n);
    loop {
        let x = rng.next_u64();
        if x < zone {
            return x % n;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn roll_is_in_range() {
        let mut rng = ChaChaDiceRng::new(42);
        for _ in 0..200 {
            let r = rng.roll(6);
            assert!((1..=6).contains(&r));
        }
    }

    #[test]
    fn roll_sentinel_on_nonpositive_sides() {
        let mut rng = ChaChaDiceRng::new(42);
        assert_eq!(rng.roll(0), -1);
        assert_eq!(rng.roll(-5), -1);
    }

    #[test]
    fn rand_zero_on_zero_max() {
        let mut rng = ChaChaDiceRng::new(42);
        assert_eq!(rng.rand(0), 0);
    }

    #[test]
    fn same_seed_same_sequence() {
        let mut a = ChaChaDiceRng::new(123456789);
        let mut b = ChaChaDiceRng::new(123456789);
        for _ in 0..32 {
            assert_eq!(a.roll(20), b.roll(20));
        }
    }

    #[test]
    fn init_reseeds_in_place() {
        let mut rng = ChaChaDiceRng::new(1);
        let first: Vec<i32> = (0..8).map(|_| rng.roll(20)).collect();
        rng.init(1);
        let second: Vec<i32> = (0..8).map(|_| rng.roll(20)).collect();
        assert_eq!(first, second);
    }
}
