//! Deterministic random number generation.
//!
//! RULE: Nothing in the generator may call any platform RNG.
//! All randomness flows through SubsystemRng instances derived
//! from the single master seed in the config.
//!
//! Streams are keyed by (stage slot, key). The key is a player id for
//! per-player stages and a day index for the activity scheduler, so:
//!   - a player's attributes and sessions never depend on any other player
//!   - per-player work can run on any thread in any order
//!   - adding a stage never changes existing stages' streams

use rand::{seq::SliceRandom, Rng, RngCore, SeedableRng};
use rand_pcg::Pcg64Mcg;

const GOLDEN_GAMMA: u64 = 0x9e37_79b9_7f4a_7c15;

/// A named, deterministic RNG for a single stage (and optionally key).
pub struct SubsystemRng {
    pub name: &'static str,
    inner: Pcg64Mcg,
}

impl SubsystemRng {
    /// Create a stage RNG from the master seed and a stable slot index.
    pub fn new(master_seed: u64, subsystem_index: u64) -> Self {
        let derived_seed = master_seed ^ subsystem_index.wrapping_mul(GOLDEN_GAMMA);
        Self {
            name: "unnamed",
            inner: Pcg64Mcg::seed_from_u64(derived_seed),
        }
    }

    /// Create a keyed stream: one per (slot, player) or (slot, day).
    pub fn keyed(master_seed: u64, subsystem_index: u64, key: u64) -> Self {
        let slot_seed = master_seed ^ subsystem_index.wrapping_mul(GOLDEN_GAMMA);
        let derived_seed = splitmix64(slot_seed ^ splitmix64(key.wrapping_add(GOLDEN_GAMMA)));
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
        let bits = self.inner.next_u64();
        (bits >> 11) as f64 * (1.0 / (1u64 << 53) as f64)
    }

    /// Draw a raw u64 (full range).
    pub fn next_u64(&mut self) -> u64 {
        self.inner.next_u64()
    }

    /// Roll an integer in [lo, hi]. Returns `lo` when the range is empty.
    pub fn range_inclusive(&mut self, lo: i64, hi: i64) -> i64 {
        if hi <= lo {
            return lo;
        }
        self.inner.gen_range(lo..=hi)
    }

    /// Roll a float in [lo, hi).
    pub fn uniform(&mut self, lo: f64, hi: f64) -> f64 {
        lo + (hi - lo) * self.next_f64()
    }

    /// Bernoulli trial: returns true with probability p.
    pub fn chance(&mut self, p: f64) -> bool {
        self.next_f64() < p
    }

    /// Sample from a simplified Pareto distribution.
    /// x_min: minimum value, alpha: shape parameter (higher = less skewed).
    pub fn pareto(&mut self, x_min: f64, alpha: f64) -> f64 {
        let u = self.next_f64().max(1e-10);
        x_min * u.powf(-1.0 / alpha)
    }

    /// Exponential with the given mean.
    pub fn exponential(&mut self, mean: f64) -> f64 {
        let u = self.next_f64();
        -mean * (1.0 - u).ln()
    }

    /// Standard normal via Box–Muller.
    pub fn standard_normal(&mut self) -> f64 {
        let u1 = self.next_f64().max(1e-12);
        let u2 = self.next_f64();
        (-2.0 * u1.ln()).sqrt() * (2.0 * std::f64::consts::PI * u2).cos()
    }

    /// Log-normal parameterised by its median.
    pub fn log_normal(&mut self, median: f64, sigma: f64) -> f64 {
        (median.ln() + sigma * self.standard_normal()).exp()
    }

    pub fn shuffle<T>(&mut self, items: &mut [T]) {
        items.shuffle(&mut self.inner);
    }
}

/// SplitMix64 finalizer. Decorrelates adjacent keys before seeding.
fn splitmix64(mut z: u64) -> u64 {
    z = z.wrapping_add(GOLDEN_GAMMA);
    z = (z ^ (z >> 30)).wrapping_mul(0xbf58_476d_1ce4_e5b9);
    z = (z ^ (z >> 27)).wrapping_mul(0x94d0_49bb_1331_11eb);
    z ^ (z >> 31)
}

/// All stage RNGs for a single run, indexed by stable slot.
#[derive(Debug, Clone, Copy)]
pub struct RngBank {
    master_seed: u64,
}

impl RngBank {
    pub fn new(master_seed: u64) -> Self {
        Self { master_seed }
    }

    /// One stream for a whole stage.
    pub fn for_stage(&self, slot: StageSlot) -> SubsystemRng {
        SubsystemRng::new(self.master_seed, slot as u64).with_name(slot.name())
    }

    /// One stream per (stage, player id).
    pub fn for_player(&self, slot: StageSlot, player_id: u32) -> SubsystemRng {
        SubsystemRng::keyed(self.master_seed, slot as u64, u64::from(player_id))
            .with_name(slot.name())
    }

    /// One stream per (stage, day).
    pub fn for_day(&self, slot: StageSlot, day: u32) -> SubsystemRng {
        SubsystemRng::keyed(self.master_seed, slot as u64, u64::from(day) | (1 << 40))
            .with_name(slot.name())
    }
}

/// Stable stage slot assignments.
/// NEVER reorder or remove entries, only append.
/// Reordering changes every stage's seed.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[repr(u64)]
pub enum StageSlot {
    DauCurve   = 0,
    Population = 1,
    Activity   = 2,
    Sessions   = 3,
    Purchases  = 4,
    Teams      = 5,
    // Add new stages here (append only).
}

impl StageSlot {
    pub fn name(&self) -> &'static str {
        match self {
            Self::DauCurve   => "dau_curve",
            Self::Population => "population",
            Self::Activity   => "activity",
            Self::Sessions   => "sessions",
            Self::Purchases  => "purchases",
            Self::Teams      => "teams",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn player_streams_are_reproducible_and_distinct() {
        let bank = RngBank::new(42);
        let a1: Vec<u64> = {
            let mut r = bank.for_player(StageSlot::Sessions, 7);
            (0..4).map(|_| r.next_u64()).collect()
        };
        let a2: Vec<u64> = {
            let mut r = bank.for_player(StageSlot::Sessions, 7);
            (0..4).map(|_| r.next_u64()).collect()
        };
        let b: Vec<u64> = {
            let mut r = bank.for_player(StageSlot::Sessions, 8);
            (0..4).map(|_| r.next_u64()).collect()
        };
        let c: Vec<u64> = {
            let mut r = bank.for_player(StageSlot::Purchases, 7);
            (0..4).map(|_| r.next_u64()).collect()
        };
        assert_eq!(a1, a2);
        assert_ne!(a1, b);
        assert_ne!(a1, c);
    }

    #[test]
    fn day_and_player_keys_do_not_collide() {
        let bank = RngBank::new(9);
        let mut by_player = bank.for_player(StageSlot::Activity, 3);
        let mut by_day = bank.for_day(StageSlot::Activity, 3);
        assert_ne!(by_player.next_u64(), by_day.next_u64());
    }

    #[test]
    fn range_inclusive_handles_degenerate_range() {
        let mut rng = RngBank::new(1).for_stage(StageSlot::Teams);
        assert_eq!(rng.range_inclusive(5, 5), 5);
        assert_eq!(rng.range_inclusive(5, 2), 5);
        for _ in 0..100 {
            let v = rng.range_inclusive(1, 3);
            assert!((1..=3).contains(&v));
        }
    }
}
