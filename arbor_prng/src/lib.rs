// Deterministic, portable pseudo-random number generator.
//
// Implements xoshiro256++ (Blackman & Vigna, 2019) with SplitMix64 seed
// expansion. Hand-rolled with zero external dependencies so that output is
// identical across platforms, compiler versions, and optimization levels.
//
// This crate is the single source of randomness for the arbor sequencer.
// The traversal engine owns one instance for branch decisions and a second,
// independent instance for auxiliary draws (internal seed refreshes, bulk
// randomization), so that auxiliary consumers never disturb the branch
// stream.
//
// **Critical constraint: determinism.** Every method must produce identical
// output given the same prior state. The sequencer reseeds the branch
// stream at the start of every pass; a given seed pair must replay the same
// forward sequence of draws every time. There is no rewind: stepping the
// sequencer backwards restores recorded state, never generator state.

use serde::{Deserialize, Serialize};

/// Xoshiro256++ PRNG, reset from a pair of seed values.
///
/// `reset(a, b)` rebuilds the full 256-bit state from the two seeds, so
/// `reset` followed by N `uniform()` calls yields the same N values on
/// every run. The two seeds may be equal; the sequencer commonly feeds the
/// same refreshed seed into both slots.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct TreeRng {
    s: [u64; 4],
}

impl TreeRng {
    /// Create a generator seeded from two `u64` values.
    pub fn new(seed_a: u64, seed_b: u64) -> Self {
        let mut rng = TreeRng { s: [0; 4] };
        rng.reset(seed_a, seed_b);
        rng
    }

    /// Deterministically rebuild the internal state from a seed pair.
    ///
    /// Each seed drives its own SplitMix64 stream and fills half of the
    /// 256-bit state, so both seeds always contribute.
    pub fn reset(&mut self, seed_a: u64, seed_b: u64) {
        let mut sm_a = seed_a;
        let mut sm_b = seed_b;
        self.s = [
            splitmix64(&mut sm_a),
            splitmix64(&mut sm_a),
            splitmix64(&mut sm_b),
            splitmix64(&mut sm_b),
        ];
    }

    /// Generate the next `u64` in the sequence.
    pub fn next_u64(&mut self) -> u64 {
        let result = (self.s[0].wrapping_add(self.s[3]))
            .rotate_left(23)
            .wrapping_add(self.s[0]);

        let t = self.s[1] << 17;

        self.s[2] ^= self.s[0];
        self.s[3] ^= self.s[1];
        self.s[1] ^= self.s[2];
        self.s[0] ^= self.s[3];

        self.s[2] ^= t;
        self.s[3] = self.s[3].rotate_left(45);

        result
    }

    /// Generate a uniform `f32` in [0, 1), consuming one draw.
    ///
    /// Uses the upper 24 bits of a `u64` to fill the f32 mantissa, which
    /// gives full single precision.
    pub fn uniform(&mut self) -> f32 {
        (self.next_u64() >> 40) as f32 / (1u64 << 24) as f32
    }

    /// Generate a uniform `f64` in [0, 1), consuming one draw.
    ///
    /// Uses the upper 53 bits of a `u64` (52-bit mantissa + implicit bit).
    pub fn next_f64(&mut self) -> f64 {
        (self.next_u64() >> 11) as f64 / (1u64 << 53) as f64
    }
}

/// SplitMix64, used only to expand seeds into xoshiro256++ state.
///
/// The standard recommendation from the xoshiro authors for turning small
/// seeds into well-distributed state words.
fn splitmix64(state: &mut u64) -> u64 {
    *state = state.wrapping_add(0x9e37_79b9_7f4a_7c15);
    let mut z = *state;
    z = (z ^ (z >> 30)).wrapping_mul(0xbf58_476d_1ce4_e5b9);
    z = (z ^ (z >> 27)).wrapping_mul(0x94d0_49bb_1331_11eb);
    z ^ (z >> 31)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn determinism_same_seed_pair_same_output() {
        let mut a = TreeRng::new(42, 42);
        let mut b = TreeRng::new(42, 42);
        for _ in 0..1000 {
            assert_eq!(a.next_u64(), b.next_u64());
        }
    }

    #[test]
    fn reset_replays_the_sequence() {
        let mut rng = TreeRng::new(7, 11);
        let first: Vec<u64> = (0..100).map(|_| rng.next_u64()).collect();
        rng.reset(7, 11);
        let second: Vec<u64> = (0..100).map(|_| rng.next_u64()).collect();
        assert_eq!(first, second);
    }

    #[test]
    fn both_seeds_matter() {
        let mut a = TreeRng::new(1, 2);
        let mut b = TreeRng::new(1, 3);
        let mut c = TreeRng::new(4, 2);
        let v = a.next_u64();
        assert_ne!(v, b.next_u64());
        assert_ne!(v, c.next_u64());
    }

    #[test]
    fn uniform_in_unit_range() {
        let mut rng = TreeRng::new(12345, 678);
        for _ in 0..10_000 {
            let v = rng.uniform();
            assert!((0.0..1.0).contains(&v), "uniform out of range: {v}");
        }
    }

    #[test]
    fn uniform_covers_both_halves() {
        let mut rng = TreeRng::new(9, 9);
        let mut low = 0;
        let n = 10_000;
        for _ in 0..n {
            if rng.uniform() < 0.5 {
                low += 1;
            }
        }
        // Should be roughly 50% ± 5%
        let pct = low as f64 / n as f64;
        assert!(
            (0.45..0.55).contains(&pct),
            "uniform below 0.5 should be ~50%, got {:.1}%",
            pct * 100.0
        );
    }

    #[test]
    fn next_f64_in_unit_range() {
        let mut rng = TreeRng::new(555, 0);
        for _ in 0..10_000 {
            let v = rng.next_f64();
            assert!((0.0..1.0).contains(&v), "f64 out of range: {v}");
        }
    }

    #[test]
    fn serialization_roundtrip() {
        let mut rng = TreeRng::new(42, 43);
        // Advance state
        for _ in 0..100 {
            rng.next_u64();
        }
        let json = serde_json::to_string(&rng).unwrap();
        let mut restored: TreeRng = serde_json::from_str(&json).unwrap();
        // Continued sequences should match.
        for _ in 0..100 {
            assert_eq!(rng.next_u64(), restored.next_u64());
        }
    }

    /// The sequence from a fixed seed pair must be stable across compiles.
    /// If this test ever breaks, determinism has been violated.
    #[test]
    fn known_sequence_is_stable() {
        let mut rng = TreeRng::new(0, 0);
        let vals: Vec<u64> = (0..5).map(|_| rng.next_u64()).collect();
        let mut rng2 = TreeRng::new(0, 0);
        let vals2: Vec<u64> = (0..5).map(|_| rng2.next_u64()).collect();
        assert_eq!(vals, vals2);
    }
}
