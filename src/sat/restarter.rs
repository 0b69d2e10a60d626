#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
//! The restart controller.
//!
//! A restart is attractive when recent learned clauses are markedly worse
//! than the long-run average: the fast glue EMA exceeding the slow one by
//! a configured margin is the trigger. The delay rule additionally holds
//! a restart back while the current decision level is still below a
//! fraction of the average backjump distance, since the search would give
//! up progress a backjump is about to reclaim anyway. Every rejected
//! check pushes the next one out by the restart interval.

use crate::sat::configs::Options;
use crate::sat::ema::Emas;
use crate::sat::stats::Stats;

#[derive(Debug, Clone, Default)]
pub struct Restarter {
    enabled: bool,
    delay: bool,
    delay_lim: f64,
    margin: f64,
    interval: u64,
    /// Conflict count after which the next check may fire.
    limit: u64,
}

impl Restarter {
    #[must_use]
    pub fn new(options: &Options) -> Self {
        Self {
            enabled: options.restart,
            delay: options.restart_delay,
            delay_lim: options.restart_delay_lim,
            margin: options.restart_margin,
            interval: options.restart_int,
            limit: options.restart_int,
        }
    }

    /// Whether to restart now. Rejections (margin not met, or delayed)
    /// defer the next check by the restart interval.
    pub fn restarting(&mut self, level: u32, emas: &Emas, stats: &mut Stats) -> bool {
        if !self.enabled {
            return false;
        }
        if stats.conflicts <= self.limit {
            return false;
        }
        let slow = emas.glue_slow.get();
        let fast = emas.glue_fast.get();
        let limit = (1.0 + self.margin) * slow;
        if limit > fast {
            log::debug!("restart not forced: glue slow {slow:.2} fast {fast:.2}");
            self.limit = stats.conflicts + self.interval;
            return false;
        }
        if self.delay && f64::from(level) < self.delay_lim * emas.jump.get() {
            log::debug!("restart delayed at level {level}");
            self.limit = stats.conflicts + self.interval;
            stats.delayed += 1;
            return false;
        }
        true
    }

    /// Bookkeeping once the driver has performed the backjump.
    pub fn on_restart(&mut self, stats: &mut Stats) {
        stats.restarts += 1;
        self.limit = stats.conflicts + self.interval;
    }
}
