//! Randomness capability used by the roulette.
//!
//! Every draw in the reward engine goes through [`RandomSource`], so tests can
//! script exact rolls and production code can use a seeded [`StdRng`].

use std::collections::VecDeque;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// A source of uniform integer draws.
pub trait RandomSource {
    /// Return a uniformly distributed value in `[0, upper)`.
    ///
    /// Callers never pass `upper == 0`.
    fn below(&mut self, upper: usize) -> usize;
}

/// Entropy-seeded generator used by the server.
#[derive(Debug, Clone)]
pub struct SystemRandom(StdRng);

impl SystemRandom {
    pub fn new() -> Self {
        Self(StdRng::from_entropy())
    }

    pub fn seeded(seed: u64) -> Self {
        Self(StdRng::seed_from_u64(seed))
    }
}

impl Default for SystemRandom {
    fn default() -> Self {
        Self::new()
    }
}

impl RandomSource for SystemRandom {
    fn below(&mut self, upper: usize) -> usize {
        self.0.gen_range(0..upper)
    }
}

/// Replays a fixed sequence of rolls.
///
/// Each roll is reduced modulo `upper`; once the sequence is exhausted every
/// draw returns 0.
#[derive(Debug, Clone, Default)]
pub struct ScriptedRandom {
    rolls: VecDeque<usize>,
}

impl ScriptedRandom {
    pub fn new(rolls: impl IntoIterator<Item = usize>) -> Self {
        Self {
            rolls: rolls.into_iter().collect(),
        }
    }

    pub fn remaining(&self) -> usize {
        self.rolls.len()
    }
}

impl RandomSource for ScriptedRandom {
    fn below(&mut self, upper: usize) -> usize {
        self.rolls.pop_front().map_or(0, |roll| roll % upper)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scripted_replays_in_order() {
        let mut rng = ScriptedRandom::new([3, 42, 7]);
        assert_eq!(rng.below(10), 3);
        assert_eq!(rng.below(100), 42);
        assert_eq!(rng.below(5), 2);
        assert_eq!(rng.remaining(), 0);
        assert_eq!(rng.below(5), 0);
    }

    #[test]
    fn system_random_stays_in_range() {
        let mut rng = SystemRandom::seeded(7);
        for _ in 0..1_000 {
            assert!(rng.below(100) < 100);
        }
        assert_eq!(rng.below(1), 0);
    }
}
