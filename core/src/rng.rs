//! Deterministic random number generation.
//!
//! RULE: Nothing in the game core may call a platform RNG.
//! All randomness flows through FeatureRng instances derived
//! from the single session seed.
//!
//! Each feature gets its own RNG stream, seeded deterministically
//! from (master_seed XOR slot_index). This means:
//!   - Adding a new feature never changes existing features' streams.
//!   - Each feature's stream is fully reproducible in isolation.

use rand::SeedableRng;
use rand_pcg::Pcg64Mcg;

/// A named, deterministic RNG for a single feature.
#[derive(Clone)]
pub struct FeatureRng {
    pub name: &'static str,
    inner: Pcg64Mcg,
}

impl FeatureRng {
    /// Create a feature RNG from the master seed and a stable
    /// slot index. The index must never change once assigned.
    pub fn new(master_seed: u64, slot_index: u64) -> Self {
        let derived_seed = master_seed ^ (slot_index.wrapping_mul(0x9e37_79b9_7f4a_7c15));
        Self {
            name: "unnamed",
            inner: Pcg64Mcg::seed_from_u64(derived_seed),
        }
    }

    pub fn with_name(mut self, name: &'static str) -> Self {
        self.name = name;
        self
    }

    /// Roll a float in [0.0, 1.0).
    pub fn next_f64(&mut self) -> f64 {
        use rand::RngCore;
        let bits = self.inner.next_u64();
        (bits >> 11) as f64 * (1.0 / (1u64 << 53) as f64)
    }

    /// Draw a raw u64 (full range).
    pub fn next_u64(&mut self) -> u64 {
        use rand::RngCore;
        self.inner.next_u64()
    }

    /// Derive an independent stream, e.g. one per mini-game round.
    pub fn fork(&mut self, name: &'static str) -> FeatureRng {
        Self {
            name,
            inner: Pcg64Mcg::seed_from_u64(self.next_u64()),
        }
    }

    /// Roll a u64 in [0, n).
    pub fn next_u64_below(&mut self, n: u64) -> u64 {
        use rand::RngCore;
        assert!(n > 0, "n must be > 0");
        self.inner.next_u64() % n
    }

    /// Roll an integer uniformly in [lo, hi] (inclusive).
    pub fn range_inclusive(&mut self, lo: u64, hi: u64) -> u64 {
        use rand::Rng;
        assert!(lo <= hi, "empty range {lo}..={hi}");
        self.inner.gen_range(lo..=hi)
    }

    /// Bernoulli trial: returns true with probability p.
    pub fn chance(&mut self, p: f64) -> bool {
        self.next_f64() < p
    }

    /// One character from `[0-9a-z]`.
    pub fn base36_char(&mut self) -> char {
        const ALPHABET: &[u8] = b"0123456789abcdefghijklmnopqrstuvwxyz";
        ALPHABET[self.next_u64_below(ALPHABET.len() as u64) as usize] as char
    }

    /// Fisher–Yates shuffle in place.
    pub fn shuffle<T>(&mut self, items: &mut [T]) {
        use rand::seq::SliceRandom;
        items.shuffle(&mut self.inner);
    }
}

/// Hands out the per-feature RNG streams for one session.
pub struct RngBank {
    master_seed: u64,
}

impl RngBank {
    pub fn new(master_seed: u64) -> Self {
        Self { master_seed }
    }

    pub fn master_seed(&self) -> u64 {
        self.master_seed
    }

    pub fn for_slot(&self, slot: RngSlot) -> FeatureRng {
        FeatureRng::new(self.master_seed, slot as u64).with_name(slot.name())
    }
}

/// Stable slot assignments.
/// NEVER reorder or remove entries. Only append.
/// Reordering changes every feature's seed.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[repr(u64)]
pub enum RngSlot {
    DailyBonus = 0,
    DailyReward = 1,
    DropGame = 2,
    AlbumQuiz = 3,
    Wallet = 4,
}

impl RngSlot {
    pub fn name(&self) -> &'static str {
        match self {
            Self::DailyBonus => "daily_bonus",
            Self::DailyReward => "daily_reward",
            Self::DropGame => "drop_game",
            Self::AlbumQuiz => "album_quiz",
            Self::Wallet => "wallet",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn same_seed_same_stream() {
        let bank_a = RngBank::new(7);
        let bank_b = RngBank::new(7);
        let mut a = bank_a.for_slot(RngSlot::DailyBonus);
        let mut b = bank_b.for_slot(RngSlot::DailyBonus);
        for _ in 0..32 {
            assert_eq!(a.range_inclusive(100, 1000), b.range_inclusive(100, 1000));
        }
    }

    #[test]
    fn slots_are_independent_streams() {
        let bank = RngBank::new(7);
        let mut a = bank.for_slot(RngSlot::DailyBonus);
        let mut b = bank.for_slot(RngSlot::DropGame);
        let draws_a: Vec<u64> = (0..8).map(|_| a.next_u64_below(1_000_000)).collect();
        let draws_b: Vec<u64> = (0..8).map(|_| b.next_u64_below(1_000_000)).collect();
        assert_ne!(draws_a, draws_b);
    }

    #[test]
    fn range_inclusive_stays_in_bounds() {
        let mut rng = RngBank::new(99).for_slot(RngSlot::DailyReward);
        for _ in 0..1_000 {
            let v = rng.range_inclusive(100, 1000);
            assert!((100..=1000).contains(&v));
        }
    }

    #[test]
    fn base36_chars_are_lowercase_alphanumeric() {
        let mut rng = RngBank::new(3).for_slot(RngSlot::Wallet);
        for _ in 0..200 {
            let c = rng.base36_char();
            assert!(c.is_ascii_digit() || c.is_ascii_lowercase());
        }
    }
}
