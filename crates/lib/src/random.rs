//! Probability and index draws behind a trait, so the decision engine's
//! branching can be driven deterministically in tests.

use rand::Rng;
use std::collections::VecDeque;

/// Source of random decisions: probability draws and uniform index picks.
pub trait Draw {
    /// True with probability `p`. Values outside [0, 1] are clamped.
    fn chance(&mut self, p: f64) -> bool;

    /// Uniform index in `0..len`. `len` must be non-zero.
    fn index(&mut self, len: usize) -> usize;
}

/// Thread-local RNG backed draw, used by the running bot.
#[derive(Debug, Default)]
pub struct ThreadDraw;

impl Draw for ThreadDraw {
    fn chance(&mut self, p: f64) -> bool {
        rand::rng().random_bool(p.clamp(0.0, 1.0))
    }

    fn index(&mut self, len: usize) -> usize {
        rand::rng().random_range(0..len)
    }
}

/// Deterministic draw fed from pre-scripted outcomes (for tests or replay).
/// Panics when asked for more outcomes than were scripted.
#[derive(Debug, Default)]
pub struct ScriptedDraw {
    chances: VecDeque<bool>,
    indices: VecDeque<usize>,
}

impl ScriptedDraw {
    pub fn new(
        chances: impl IntoIterator<Item = bool>,
        indices: impl IntoIterator<Item = usize>,
    ) -> Self {
        Self {
            chances: chances.into_iter().collect(),
            indices: indices.into_iter().collect(),
        }
    }
}

impl Draw for ScriptedDraw {
    fn chance(&mut self, _p: f64) -> bool {
        self.chances
            .pop_front()
            .expect("scripted draw ran out of chance outcomes")
    }

    fn index(&mut self, len: usize) -> usize {
        let i = self
            .indices
            .pop_front()
            .expect("scripted draw ran out of index outcomes");
        assert!(i < len, "scripted index {} out of range 0..{}", i, len);
        i
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn thread_draw_honors_extremes() {
        let mut draw = ThreadDraw;
        for _ in 0..100 {
            assert!(!draw.chance(0.0));
            assert!(draw.chance(1.0));
        }
    }

    #[test]
    fn scripted_draw_replays_in_order() {
        let mut draw = ScriptedDraw::new([true, false], [2]);
        assert!(draw.chance(0.5));
        assert!(!draw.chance(0.5));
        assert_eq!(draw.index(3), 2);
    }
}
