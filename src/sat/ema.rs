#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
//! Exponential moving averages with a smoothed warm-up schedule.
//!
//! A plain EMA with a small target `alpha` would be dominated for a long
//! time by its zero initial value. Instead the update uses an upper
//! approximation `beta` of `alpha` that starts at 1 and halves after
//! exponentially longer waiting periods, tracing the sequence
//!
//! ```text
//! 1; 1/2, 1/2; 1/4, 1/4, 1/4, 1/4; 1/8 (x8); ...
//! ```
//!
//! until it reaches `alpha`, where it stays. Early samples therefore count
//! fully while the long-run responsiveness converges to `alpha`.

use crate::sat::configs::Options;

#[derive(Debug, Clone, Default)]
pub struct Ema {
    value: f64,
    alpha: f64,
    beta: f64,
    wait: u64,
    period: u64,
}

impl Ema {
    #[must_use]
    pub fn new(alpha: f64) -> Self {
        debug_assert!((0.0..=1.0).contains(&alpha));
        Self {
            value: 0.0,
            alpha,
            beta: 1.0,
            wait: 0,
            period: 0,
        }
    }

    #[must_use]
    pub const fn get(&self) -> f64 {
        self.value
    }

    /// Current smoothing factor; exposed for tests of the warm-up
    /// schedule.
    #[cfg(test)]
    pub(crate) const fn beta(&self) -> f64 {
        self.beta
    }

    pub fn update(&mut self, y: f64) {
        self.value += self.beta * (y - self.value);
        if self.beta <= self.alpha {
            return;
        }
        if self.wait > 0 {
            self.wait -= 1;
            return;
        }
        self.period = 2 * (self.period + 1) - 1;
        self.wait = self.period;
        self.beta *= 0.5;
        if self.beta < self.alpha {
            self.beta = self.alpha;
        }
    }
}

/// The five averages steering restarts and reduction.
#[derive(Debug, Clone, Default)]
pub struct Emas {
    /// Fast learned-glue average: the numerator of the restart trigger.
    pub glue_fast: Ema,
    /// Slow learned-glue average: the restart baseline.
    pub glue_slow: Ema,
    /// Backjump-distance average, used to delay unpromising restarts.
    pub jump: Ema,
    /// Glue of redundant clauses resolved in conflicts.
    pub resolved_glue: Ema,
    /// Size of redundant clauses resolved in conflicts.
    pub resolved_size: Ema,
}

impl Emas {
    #[must_use]
    pub fn new(options: &Options) -> Self {
        Self {
            glue_fast: Ema::new(options.ema_glue_fast),
            glue_slow: Ema::new(options.ema_glue_slow),
            jump: Ema::new(options.ema_jump),
            resolved_glue: Ema::new(options.ema_resolved),
            resolved_size: Ema::new(options.ema_resolved),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_first_update_takes_sample_fully() {
        let mut ema = Ema::new(1e-5);
        ema.update(4.0);
        assert!((ema.get() - 4.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_beta_halving_schedule() {
        let mut ema = Ema::new(0.0);
        let mut observed = Vec::new();
        for _ in 0..15 {
            observed.push(ema.beta());
            ema.update(1.0);
        }
        let expected = [
            1.0, 0.5, 0.5, 0.25, 0.25, 0.25, 0.25, 0.125, 0.125, 0.125, 0.125, 0.125, 0.125,
            0.125, 0.125,
        ];
        assert_eq!(observed.as_slice(), expected.as_slice());
    }

    #[test]
    fn test_beta_clamps_to_alpha() {
        let mut ema = Ema::new(0.3);
        for _ in 0..10 {
            ema.update(1.0);
        }
        assert!((ema.beta() - 0.3).abs() < f64::EPSILON);
    }

    #[test]
    fn test_converges_to_constant_signal() {
        let mut ema = Ema::new(3e-2);
        for _ in 0..1000 {
            ema.update(7.0);
        }
        assert!((ema.get() - 7.0).abs() < 1e-6);
    }
}
