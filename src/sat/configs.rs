#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
//! Solver options.
//!
//! Every option has a declared range; `clamped` pins out-of-range values
//! back into it at configuration time, so the engine itself never sees an
//! invalid setting.

/// Tuning knobs of the search engine, with their defaults.
#[derive(Debug, Clone, PartialEq)]
pub struct Options {
    /// Target alpha of the fast learned-glue EMA. Range `[0, 1]`.
    pub ema_glue_fast: f64,
    /// Target alpha of the slow learned-glue EMA. Range `[0, 1]`.
    pub ema_glue_slow: f64,
    /// Target alpha of the backjump EMA. Range `[0, 1]`.
    pub ema_jump: f64,
    /// Target alpha of the resolved glue and size EMAs. Range `[0, 1]`.
    pub ema_resolved: f64,
    /// Garbage collect learned clauses.
    pub reduce: bool,
    /// Additionally protect clauses under the resolved glue & size EMAs.
    pub reduce_dynamic: bool,
    /// Growth of the reduce increment after each reduction.
    /// Range `[1, 1e9]`.
    pub reduce_inc: u64,
    /// Conflicts before the first reduction, and the initial increment.
    /// Range `[0, 1e9]`.
    pub reduce_init: u64,
    /// Enable restarting.
    pub restart: bool,
    /// Enable the restart delay heuristic.
    pub restart_delay: bool,
    /// Delay a restart while the level is below this fraction of the
    /// jump EMA. Range `[0, 1]`.
    pub restart_delay_lim: f64,
    /// Minimum conflict spacing between restart checks. Range `[1, 1e9]`.
    pub restart_int: u64,
    /// Required slow-to-fast glue margin. Range `[0, 10]`.
    pub restart_margin: f64,
    /// Enable trail reuse on restart.
    pub reuse_trail: bool,
}

impl Default for Options {
    fn default() -> Self {
        Self {
            ema_glue_fast: 3e-2,
            ema_glue_slow: 1e-5,
            ema_jump: 1e-6,
            ema_resolved: 1e-6,
            reduce: true,
            reduce_dynamic: true,
            reduce_inc: 300,
            reduce_init: 2000,
            restart: true,
            restart_delay: true,
            restart_delay_lim: 0.5,
            restart_int: 10,
            restart_margin: 0.2,
            reuse_trail: true,
        }
    }
}

const MAX_LIMIT: u64 = 1_000_000_000;

impl Options {
    /// Pins every value into its declared range.
    #[must_use]
    pub fn clamped(mut self) -> Self {
        self.ema_glue_fast = self.ema_glue_fast.clamp(0.0, 1.0);
        self.ema_glue_slow = self.ema_glue_slow.clamp(0.0, 1.0);
        self.ema_jump = self.ema_jump.clamp(0.0, 1.0);
        self.ema_resolved = self.ema_resolved.clamp(0.0, 1.0);
        self.reduce_inc = self.reduce_inc.clamp(1, MAX_LIMIT);
        self.reduce_init = self.reduce_init.min(MAX_LIMIT);
        self.restart_delay_lim = self.restart_delay_lim.clamp(0.0, 1.0);
        self.restart_int = self.restart_int.clamp(1, MAX_LIMIT);
        self.restart_margin = self.restart_margin.clamp(0.0, 10.0);
        self
    }

    /// `(name, value)` pairs in option order, for the `c --name=value`
    /// listing printed before solving.
    #[must_use]
    pub fn describe(&self) -> Vec<(&'static str, String)> {
        vec![
            ("emagluefast", format!("{}", self.ema_glue_fast)),
            ("emaglueslow", format!("{}", self.ema_glue_slow)),
            ("emajump", format!("{}", self.ema_jump)),
            ("emaresolved", format!("{}", self.ema_resolved)),
            ("reduce", format!("{}", u8::from(self.reduce))),
            ("reducedynamic", format!("{}", u8::from(self.reduce_dynamic))),
            ("reduceinc", format!("{}", self.reduce_inc)),
            ("reduceinit", format!("{}", self.reduce_init)),
            ("restart", format!("{}", u8::from(self.restart))),
            ("restartdelay", format!("{}", u8::from(self.restart_delay))),
            ("restartdelaylim", format!("{}", self.restart_delay_lim)),
            ("restartint", format!("{}", self.restart_int)),
            ("restartmargin", format!("{}", self.restart_margin)),
            ("reusetrail", format!("{}", u8::from(self.reuse_trail))),
        ]
    }
}
