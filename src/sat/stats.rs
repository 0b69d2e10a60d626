#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::cast_precision_loss)]
//! Search counters, progress reports and the final statistics block.
//!
//! All diagnostic output goes to stdout as DIMACS `c `-prefixed comment
//! lines, so it never interferes with the `s`/`v` result lines.

/// Counters accumulated by the reducer.
#[derive(Debug, Clone, Copy, Default)]
pub struct ReduceStats {
    pub count: u64,
    /// Clauses collected over all reductions.
    pub clauses: u64,
    /// Bytes reclaimed over all reductions.
    pub bytes: u64,
}

/// Aggregate counters of one solve.
#[derive(Debug, Clone, Copy, Default)]
pub struct Stats {
    pub conflicts: u64,
    pub decisions: u64,
    pub restarts: u64,
    /// Restarts that kept a nonempty trail prefix.
    pub reused: u64,
    /// Restarts suppressed by the delay heuristic.
    pub delayed: u64,
    pub reports: u64,
    /// Literals drained by the propagator.
    pub propagations: u64,
    /// Assigned variables skipped while searching for a decision.
    pub searched: u64,
    /// Variables bumped in the VMTF queue.
    pub bumped: u64,
    pub learned_units: u64,
    pub reduce: ReduceStats,
}

pub(crate) fn relative(a: f64, b: f64) -> f64 {
    if b == 0.0 {
        0.0
    } else {
        a / b
    }
}

pub(crate) fn percent(a: f64, b: f64) -> f64 {
    relative(100.0 * a, b)
}

/// One progress row. The header is printed before the first row.
#[allow(clippy::too_many_arguments)]
pub fn report(
    kind: char,
    stats: &mut Stats,
    seconds: f64,
    megabytes: f64,
    redundant: usize,
    jump: f64,
    irredundant: usize,
    active: u64,
) {
    if stats.reports == 0 {
        println!("c");
        println!("c                                 redundant average irredundant");
        println!("c     seconds     MB   conflicts   clauses     jump   clauses variables");
        println!("c");
    }
    stats.reports += 1;
    println!(
        "c {kind} {seconds:9.2} {megabytes:6.0} {:11} {redundant:9} {jump:8.1} {irredundant:9} {active:9}",
        stats.conflicts
    );
}

/// The closing statistics block.
pub fn print_summary(stats: &Stats, seconds: f64, peak_bytes: usize) {
    let t = seconds;
    println!("c");
    println!(
        "c conflicts:     {:15}   {:10.2}   (per second)",
        stats.conflicts,
        relative(stats.conflicts as f64, t)
    );
    println!(
        "c decisions:     {:15}   {:10.2}   (per second)",
        stats.decisions,
        relative(stats.decisions as f64, t)
    );
    println!(
        "c reductions:    {:15}   {:10.2}   (conflicts per reduction)",
        stats.reduce.count,
        relative(stats.conflicts as f64, stats.reduce.count as f64)
    );
    println!(
        "c restarts:      {:15}   {:10.2}   (conflicts per restart)",
        stats.restarts,
        relative(stats.conflicts as f64, stats.restarts as f64)
    );
    println!(
        "c propagations:  {:15}   {:10.2}   (millions per second)",
        stats.propagations,
        relative(stats.propagations as f64 / 1e6, t)
    );
    println!(
        "c bumped:        {:15}   {:10.2}   (per conflict)",
        stats.bumped,
        relative(stats.bumped as f64, stats.conflicts as f64)
    );
    println!(
        "c reused:        {:15}   {:10.2} % (per restart)",
        stats.reused,
        percent(stats.reused as f64, stats.restarts as f64)
    );
    println!(
        "c delayed:       {:15}   {:10.2} % (per restart)",
        stats.delayed,
        percent(stats.delayed as f64, stats.restarts as f64)
    );
    println!(
        "c units:         {:15}   {:10.2}   (conflicts per unit)",
        stats.learned_units,
        relative(stats.conflicts as f64, stats.learned_units as f64)
    );
    println!(
        "c searched:      {:15}   {:10.2}   (per decision)",
        stats.searched,
        relative(stats.searched as f64, stats.decisions as f64)
    );
    println!(
        "c collected:     {:15}   {:10.2}   (clauses and MB)",
        stats.reduce.clauses,
        stats.reduce.bytes as f64 / f64::from(1u32 << 20)
    );
    println!(
        "c maxbytes:      {:15}   {:10.2}   MB",
        peak_bytes,
        peak_bytes as f64 / f64::from(1u32 << 20)
    );
    println!("c time:          {:15}   {t:10.2}   seconds", "");
    println!("c");
}
