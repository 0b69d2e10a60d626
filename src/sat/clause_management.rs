#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::cast_possible_truncation)]
//! Periodic reduction of the learned-clause database.
//!
//! Reduction collects roughly half of the collectible learned clauses,
//! preferring to drop those longest unused in conflicts, then highest
//! glue, then largest. Clauses currently serving as antecedents are
//! protected for the duration, root-satisfied clauses in both pools are
//! swept when new root assignments arrived since the last reduction, and
//! watch lists are purged of garbage before anything is freed, so no
//! dangling watch or reason survives a collection.

use crate::sat::assignment::VarStore;
use crate::sat::clause_storage::LiteralStorage;
use crate::sat::cnf::{ClauseRef, Cnf};
use crate::sat::configs::Options;
use crate::sat::ema::Emas;
use crate::sat::literal::Literal;
use crate::sat::propagation::Propagator;
use crate::sat::stats::Stats;
use crate::sat::trail::Trail;
use std::cmp::Reverse;

#[derive(Debug, Clone, Default)]
pub struct Reducer {
    enabled: bool,
    dynamic: bool,
    /// Conflict count that triggers the next reduction.
    limit: u64,
    /// Current distance between reductions; grows by `inc_step` each time.
    inc: u64,
    inc_step: u64,
    /// Clauses not resolved since this conflict index are collectible.
    resolved_watermark: u64,
    /// Root-level assignment count at the last reduction.
    fixed_watermark: u32,
}

impl Reducer {
    #[must_use]
    pub fn new(options: &Options) -> Self {
        Self {
            enabled: options.reduce,
            dynamic: options.reduce_dynamic,
            limit: options.reduce_init,
            inc: options.reduce_init,
            inc_step: options.reduce_inc,
            resolved_watermark: 0,
            fixed_watermark: 0,
        }
    }

    #[must_use]
    pub fn reducing(&self, stats: &Stats) -> bool {
        self.enabled && stats.conflicts >= self.limit
    }

    /// One full reduction pass over the clause database.
    pub fn reduce<L: Literal, S: LiteralStorage<L>>(
        &mut self,
        cnf: &mut Cnf<L, S>,
        trail: &Trail<L>,
        vars: &VarStore,
        propagator: &mut Propagator<L, S>,
        emas: &Emas,
        stats: &mut Stats,
    ) {
        stats.reduce.count += 1;
        log::debug!("reduce {}", stats.reduce.count);

        Self::set_reason_flags(cnf, trail, vars, true);

        let new_fixed = self.fixed_watermark < vars.fixed;
        if new_fixed {
            Self::mark_satisfied_pool(cnf, false, vars);
            Self::mark_satisfied_pool(cnf, true, vars);
        }
        self.mark_collectible(cnf, emas);

        Self::set_reason_flags(cnf, trail, vars, false);

        propagator.flush_garbage(cnf, vars);

        if new_fixed {
            Self::collect_pool(cnf, false, stats);
        }
        Self::collect_pool(cnf, true, stats);

        self.inc += self.inc_step;
        self.limit = stats.conflicts + self.inc;
        self.resolved_watermark = stats.conflicts;
        self.fixed_watermark = vars.fixed;
    }

    /// Marks (or unmarks) every clause that is the antecedent of an
    /// assignment above the root level.
    fn set_reason_flags<L: Literal, S: LiteralStorage<L>>(
        cnf: &mut Cnf<L, S>,
        trail: &Trail<L>,
        vars: &VarStore,
        value: bool,
    ) {
        for lit in trail.iter() {
            let var = lit.variable();
            if vars.level(var) == 0 {
                continue;
            }
            if let Some(reason) = vars.reason(var) {
                cnf[reason].reason = value;
            }
        }
    }

    /// Marks non-reason clauses of one pool that contain a root-true
    /// literal.
    fn mark_satisfied_pool<L: Literal, S: LiteralStorage<L>>(
        cnf: &mut Cnf<L, S>,
        redundant: bool,
        vars: &VarStore,
    ) {
        let pool_len = if redundant {
            cnf.redundant.len()
        } else {
            cnf.irredundant.len()
        };
        for i in 0..pool_len {
            let cref = if redundant {
                cnf.redundant[i]
            } else {
                cnf.irredundant[i]
            };
            let clause = &cnf[cref];
            if clause.reason {
                continue;
            }
            if clause.iter().any(|&lit| vars.fixed_value(lit) == Some(true)) {
                cnf[cref].garbage = true;
            }
        }
    }

    /// Selects collectible learned clauses and marks the worse half as
    /// garbage.
    fn mark_collectible<L: Literal, S: LiteralStorage<L>>(&self, cnf: &mut Cnf<L, S>, emas: &Emas) {
        let mut work: Vec<ClauseRef> = Vec::new();
        for i in 0..cnf.redundant.len() {
            let cref = cnf.redundant[i];
            let clause = &cnf[cref];
            debug_assert!(clause.redundant);
            if clause.reason || clause.garbage {
                continue;
            }
            if clause.glue <= 2 || clause.len() <= 3 {
                continue;
            }
            if clause.resolved > self.resolved_watermark {
                continue;
            }
            if self.dynamic
                && f64::from(clause.glue) < emas.resolved_glue.get()
                && (clause.len() as f64) < emas.resolved_size.get()
            {
                continue;
            }
            work.push(cref);
        }
        work.sort_unstable_by_key(|&cref| {
            let clause = &cnf[cref];
            (clause.resolved, Reverse(clause.glue), Reverse(clause.len()))
        });
        let target = work.len() / 2;
        for &cref in &work[..target] {
            cnf[cref].garbage = true;
        }
    }

    /// Frees the garbage clauses of one pool and compacts its reference
    /// vector.
    fn collect_pool<L: Literal, S: LiteralStorage<L>>(
        cnf: &mut Cnf<L, S>,
        redundant: bool,
        stats: &mut Stats,
    ) {
        let refs = if redundant {
            std::mem::take(&mut cnf.redundant)
        } else {
            std::mem::take(&mut cnf.irredundant)
        };
        let mut kept = Vec::with_capacity(refs.len());
        for cref in refs {
            if cnf[cref].garbage {
                stats.reduce.clauses += 1;
                stats.reduce.bytes += cnf.delete_clause(cref) as u64;
            } else {
                kept.push(cref);
            }
        }
        if redundant {
            cnf.redundant = kept;
        } else {
            cnf.irredundant = kept;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sat::literal::PackedLiteral;
    use smallvec::SmallVec;

    type TestCnf = Cnf<PackedLiteral, SmallVec<[PackedLiteral; 8]>>;
    type TestPropagator = Propagator<PackedLiteral, SmallVec<[PackedLiteral; 8]>>;

    fn lits(values: &[i32]) -> Vec<PackedLiteral> {
        values.iter().map(|&v| PackedLiteral::from_dimacs(v)).collect()
    }

    fn learned(cnf: &mut TestCnf, values: &[i32], glue: u32, resolved: u64) -> ClauseRef {
        cnf.add_clause(&lits(values), true, glue, resolved)
    }

    struct Harness {
        cnf: TestCnf,
        trail: Trail<PackedLiteral>,
        vars: VarStore,
        propagator: TestPropagator,
        emas: Emas,
        stats: Stats,
        reducer: Reducer,
    }

    fn setup(max_var: u32) -> Harness {
        let options = Options::default();
        Harness {
            cnf: TestCnf::new(max_var),
            trail: Trail::new(max_var as usize),
            vars: VarStore::new(max_var),
            propagator: TestPropagator::new(max_var),
            emas: Emas::new(&options),
            stats: Stats::default(),
            reducer: Reducer::new(&options),
        }
    }

    fn run_reduce(h: &mut Harness) {
        h.reducer.reduce(
            &mut h.cnf,
            &h.trail,
            &h.vars,
            &mut h.propagator,
            &h.emas,
            &mut h.stats,
        );
    }

    #[test]
    fn test_trigger_grows_geometrically() {
        let options = Options::default();
        let mut h = setup(4);
        let mut stats = Stats::default();
        stats.conflicts = options.reduce_init;
        assert!(h.reducer.reducing(&stats));
        h.stats.conflicts = stats.conflicts;
        run_reduce(&mut h);
        // next trigger sits at conflicts + (init + inc)
        assert!(!h.reducer.reducing(&h.stats));
        h.stats.conflicts += options.reduce_init + options.reduce_inc;
        assert!(h.reducer.reducing(&h.stats));
    }

    #[test]
    fn test_marks_half_of_collectible_clauses() {
        let mut h = setup(12);
        h.stats.conflicts = 100;
        // four collectible clauses with distinct resolved stamps
        let worst = learned(&mut h.cnf, &[1, 2, 3, 4], 6, 1);
        let bad = learned(&mut h.cnf, &[2, 3, 4, 5], 5, 2);
        let good = learned(&mut h.cnf, &[3, 4, 5, 6], 5, 3);
        let best = learned(&mut h.cnf, &[4, 5, 6, 7], 4, 4);
        for cref in [worst, bad, good, best] {
            h.propagator.watch_clause(cref, &h.cnf);
        }
        h.reducer.resolved_watermark = 50;
        run_reduce(&mut h);
        assert_eq!(h.cnf.num_redundant(), 2);
        assert!(h.cnf.redundant.contains(&good));
        assert!(h.cnf.redundant.contains(&best));
        assert_eq!(h.stats.reduce.clauses, 2);
        assert!(h.stats.reduce.bytes > 0);
        // no surviving watch points at a collected clause
        for v in 1..=12 {
            for polarity in [false, true] {
                let lit = PackedLiteral::new(v, polarity);
                for w in h.propagator.watch_list(lit) {
                    assert!(!h.cnf[w.clause].garbage);
                    assert!(h.cnf.redundant.contains(&w.clause));
                }
            }
        }
    }

    #[test]
    fn test_low_glue_and_short_clauses_are_kept() {
        let mut h = setup(8);
        h.stats.conflicts = 100;
        let glued = learned(&mut h.cnf, &[1, 2, 3, 4], 2, 0);
        let short = learned(&mut h.cnf, &[1, 2, 3], 9, 0);
        let loose = learned(&mut h.cnf, &[1, 2, 3, 4, 5], 9, 0);
        let loose2 = learned(&mut h.cnf, &[2, 3, 4, 5, 6], 9, 0);
        for cref in [glued, short, loose, loose2] {
            h.propagator.watch_clause(cref, &h.cnf);
        }
        h.reducer.resolved_watermark = 50;
        run_reduce(&mut h);
        assert!(h.cnf.redundant.contains(&glued));
        assert!(h.cnf.redundant.contains(&short));
        assert_eq!(h.cnf.num_redundant(), 3);
    }

    #[test]
    fn test_reason_clauses_survive() {
        let mut h = setup(6);
        h.stats.conflicts = 100;
        let reason = learned(&mut h.cnf, &[1, 2, 3, 4], 9, 0);
        let other = learned(&mut h.cnf, &[2, 3, 4, 5], 9, 0);
        let other2 = learned(&mut h.cnf, &[3, 4, 5, 6], 9, 0);
        for cref in [reason, other, other2] {
            h.propagator.watch_clause(cref, &h.cnf);
        }
        h.trail.push_level(PackedLiteral::from_dimacs(2));
        h.trail.assign(&mut h.vars, PackedLiteral::from_dimacs(2), None);
        h.trail
            .assign(&mut h.vars, PackedLiteral::from_dimacs(1), Some(reason));
        h.reducer.resolved_watermark = 50;
        run_reduce(&mut h);
        assert!(h.cnf.redundant.contains(&reason));
        assert!(!h.cnf[reason].reason, "protection is transient");
    }

    #[test]
    fn test_root_satisfied_clauses_swept() {
        let mut h = setup(5);
        h.cnf.add_original_clause(lits(&[1, 2, 3]));
        h.cnf.add_original_clause(lits(&[-1, 4, 5]));
        for cref in h.cnf.irredundant.clone() {
            h.propagator.watch_clause(cref, &h.cnf);
        }
        // root-level assignment of 1 satisfies the first clause
        h.trail.assign(&mut h.vars, PackedLiteral::from_dimacs(1), None);
        run_reduce(&mut h);
        assert_eq!(h.cnf.num_irredundant(), 1);
        // the watch lists of the fixed variable are fully cleared
        assert!(h.propagator.watch_list(PackedLiteral::from_dimacs(1)).is_empty());
        assert!(h.propagator.watch_list(PackedLiteral::from_dimacs(-1)).is_empty());
    }

    #[test]
    fn test_disabled_reducer_never_triggers() {
        let options = Options {
            reduce: false,
            ..Options::default()
        };
        let reducer = Reducer::new(&options);
        let mut stats = Stats::default();
        stats.conflicts = u64::MAX;
        assert!(!reducer.reducing(&stats));
    }
}
