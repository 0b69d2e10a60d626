#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::cast_precision_loss)]
//! The CDCL search driver.
//!
//! `Cdcl` owns every component and runs the search as a priority ladder,
//! checked in order on each iteration: an unsatisfiable state returns
//! UNSAT; pending trail literals propagate and a conflict is analyzed; a
//! raised progress flag reports; a fully assigned trail returns SAT; then
//! restarting, reducing, and finally deciding. Control flows top-down
//! from here; the components communicate through the trail, the variable
//! store and the clause database.

use crate::sat::assignment::VarStore;
use crate::sat::clause_management::Reducer;
use crate::sat::clause_storage::LiteralStorage;
use crate::sat::cnf::{ClauseRef, Cnf};
use crate::sat::configs::Options;
use crate::sat::conflict_analysis::Analyser;
use crate::sat::ema::Emas;
use crate::sat::literal::{Literal, PackedLiteral};
use crate::sat::proof::Proof;
use crate::sat::propagation::Propagator;
use crate::sat::restarter::Restarter;
use crate::sat::solver::{Solutions, Solver, Verdict};
use crate::sat::stats::{self, Stats};
use crate::sat::trail::Trail;
use crate::sat::variable_selection::VmtfQueue;
use smallvec::SmallVec;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Instant;

#[derive(Debug)]
pub struct Cdcl<L: Literal = PackedLiteral, S: LiteralStorage<L> = SmallVec<[L; 8]>> {
    pub cnf: Cnf<L, S>,
    vars: VarStore,
    trail: Trail<L>,
    queue: VmtfQueue,
    propagator: Propagator<L, S>,
    analyser: Analyser<L, S>,
    restarter: Restarter,
    reducer: Reducer,
    emas: Emas,
    stats: Stats,
    options: Options,
    proof: Option<Proof>,
    unsat: bool,
    installed: bool,
    started: Instant,
    terminate: Option<Arc<AtomicBool>>,
}

impl<L: Literal, S: LiteralStorage<L>> Cdcl<L, S> {
    /// Attaches a DRAT proof sink; traces are appended from then on.
    pub fn set_proof(&mut self, proof: Proof) {
        self.proof = Some(proof);
    }

    /// Hands back the proof sink, typically to flush it after solving.
    pub fn take_proof(&mut self) -> Option<Proof> {
        self.proof.take()
    }

    /// Installs a flag that stops the search at the next loop iteration.
    pub fn set_terminate(&mut self, flag: Arc<AtomicBool>) {
        self.terminate = Some(flag);
    }

    #[must_use]
    pub const fn options(&self) -> &Options {
        &self.options
    }

    fn satisfied(&self) -> bool {
        self.trail.len() == self.cnf.max_var as usize
    }

    /// Assigns the original units once, before the first search step.
    /// Clashing units make the formula unsatisfiable on the spot.
    fn install(&mut self) {
        if self.installed {
            return;
        }
        self.installed = true;
        if self.cnf.found_empty {
            log::info!("original empty clause");
            self.unsat = true;
        }
        let units = std::mem::take(&mut self.cnf.units);
        for &lit in &units {
            match self.vars.value(lit) {
                None => self.trail.assign(&mut self.vars, lit, None),
                Some(true) => log::debug!("duplicate unit {}", lit.to_dimacs()),
                Some(false) => {
                    if !self.unsat {
                        log::info!("clashing units");
                        if let Some(proof) = self.proof.as_mut() {
                            proof.add_empty();
                        }
                        self.unsat = true;
                    }
                }
            }
        }
        // the unit list stays around for witness verification
        self.cnf.units = units;
    }

    fn analyse(&mut self, conflict: ClauseRef) {
        if self.trail.level() == 0 {
            log::info!("learned empty clause");
            if let Some(proof) = self.proof.as_mut() {
                proof.add_empty();
            }
            self.unsat = true;
            return;
        }
        let learnt = self.analyser.analyse(
            conflict,
            &mut self.cnf,
            &mut self.trail,
            &self.vars,
            &mut self.emas,
            &mut self.stats,
        );
        let asserting = self.analyser.clause()[0];
        let driving = if learnt.size == 1 {
            self.stats.learned_units += 1;
            if let Some(proof) = self.proof.as_mut() {
                proof.add_unit(asserting);
            }
            None
        } else {
            let cref =
                self.cnf
                    .add_clause(self.analyser.clause(), true, learnt.glue, self.stats.conflicts);
            self.propagator.watch_clause(cref, &self.cnf);
            if let Some(proof) = self.proof.as_mut() {
                proof.add_clause(self.analyser.clause());
            }
            Some(cref)
        };
        self.trail.backtrack(learnt.jump, &mut self.vars, &mut self.queue);
        self.trail.assign(&mut self.vars, asserting, driving);
        self.analyser
            .bump_and_clear(learnt.uip.variable(), &self.vars, &mut self.queue, &mut self.stats);
        self.analyser.clear_levels(&mut self.trail);
    }

    /// The largest prefix of decision levels whose decisions are still
    /// preferred over the next decision candidate.
    fn reuse_trail(&mut self) -> u32 {
        if !self.options.reuse_trail {
            return 0;
        }
        let candidate = self.queue.next_decision(&self.vars, &mut self.stats);
        let limit = self.queue.bumped(candidate);
        let mut target = 0;
        while target < self.trail.level()
            && self.queue.bumped(self.trail.decision_of(target + 1).variable()) > limit
        {
            target += 1;
        }
        if target > 0 {
            self.stats.reused += 1;
            log::debug!("reusing trail up to level {target}");
        }
        target
    }

    fn restart(&mut self) {
        let target = self.reuse_trail();
        self.trail.backtrack(target, &mut self.vars, &mut self.queue);
        self.restarter.on_restart(&mut self.stats);
    }

    fn reduce(&mut self) {
        self.reducer.reduce(
            &mut self.cnf,
            &self.trail,
            &self.vars,
            &mut self.propagator,
            &self.emas,
            &mut self.stats,
        );
        self.report('-');
    }

    fn decide(&mut self) {
        let var = self.queue.next_decision(&self.vars, &mut self.stats);
        let decision = L::new(var, self.vars.saved_phase(var));
        self.stats.decisions += 1;
        self.trail.push_level(decision);
        self.trail.assign(&mut self.vars, decision, None);
        log::debug!("decide {}", decision.to_dimacs());
    }

    fn report(&mut self, kind: char) {
        let seconds = self.started.elapsed().as_secs_f64();
        let megabytes = self.cnf.peak_bytes() as f64 / f64::from(1u32 << 20);
        let active = u64::from(self.cnf.max_var).saturating_sub(u64::from(self.vars.fixed));
        stats::report(
            kind,
            &mut self.stats,
            seconds,
            megabytes,
            self.cnf.num_redundant(),
            self.emas.jump.get(),
            self.cnf.num_irredundant(),
            active,
        );
    }

    fn interrupted(&self) -> bool {
        self.terminate
            .as_ref()
            .is_some_and(|flag| flag.load(Ordering::Relaxed))
    }

    /// Structural self-check used by the test suite: the watch invariant,
    /// the trail invariant and the VMTF queue invariant.
    pub fn check_invariants(&self) {
        for pool in [&self.cnf.irredundant, &self.cnf.redundant] {
            for &cref in pool {
                let clause = &self.cnf[cref];
                assert!(clause.len() >= 2);
                assert!(!clause.garbage);
                for slot in 0..2 {
                    let lit = clause[slot];
                    if self.vars.fixed_value(lit).is_some() {
                        // watch lists of root-fixed variables are dropped
                        continue;
                    }
                    let occurrences = self
                        .propagator
                        .watch_list(lit)
                        .iter()
                        .filter(|w| w.clause == cref)
                        .count();
                    assert_eq!(occurrences, 1, "clause {cref:?} must watch {lit:?} once");
                }
            }
        }
        assert!(self.trail.propagated <= self.trail.len());
        for &lit in self.trail.iter() {
            assert_eq!(self.vars.value(lit), Some(true));
        }
        self.queue.check_invariant(&self.vars);
    }
}

impl<L: Literal, S: LiteralStorage<L>> Solver<L, S> for Cdcl<L, S> {
    fn new(cnf: Cnf<L, S>, options: Options) -> Self {
        let options = options.clamped();
        let max_var = cnf.max_var;
        let mut propagator = Propagator::new(max_var);
        for pool in [&cnf.irredundant, &cnf.redundant] {
            for &cref in pool {
                propagator.watch_clause(cref, &cnf);
            }
        }
        let emas = Emas::new(&options);
        let restarter = Restarter::new(&options);
        let reducer = Reducer::new(&options);
        Self {
            vars: VarStore::new(max_var),
            trail: Trail::new(max_var as usize),
            queue: VmtfQueue::new(max_var),
            propagator,
            analyser: Analyser::new(max_var),
            restarter,
            reducer,
            emas,
            stats: Stats::default(),
            options,
            proof: None,
            unsat: false,
            installed: false,
            started: Instant::now(),
            terminate: None,
            cnf,
        }
    }

    fn solve(&mut self) -> Verdict {
        self.started = Instant::now();
        self.install();
        loop {
            if self.unsat {
                return Verdict::Unsatisfiable;
            }
            if self.interrupted() {
                return Verdict::Unknown;
            }
            if let Some(conflict) =
                self.propagator
                    .propagate(&mut self.trail, &mut self.vars, &mut self.cnf, &mut self.stats)
            {
                self.analyse(conflict);
            } else if self.vars.take_iterating() {
                self.report('i');
            } else if self.satisfied() {
                debug_assert!(self.cnf.verify(&self.solutions()));
                return Verdict::Satisfiable;
            } else if self
                .restarter
                .restarting(self.trail.level(), &self.emas, &mut self.stats)
            {
                self.restart();
            } else if self.reducer.reducing(&self.stats) {
                self.reduce();
            } else {
                self.decide();
            }
        }
    }

    fn solutions(&self) -> Solutions {
        self.vars.solutions()
    }

    fn stats(&self) -> &Stats {
        &self.stats
    }
}

impl<L: Literal, S: LiteralStorage<L>> Cdcl<L, S> {
    /// Elapsed wall time and peak clause bytes, for the final statistics.
    #[must_use]
    pub fn summary(&self) -> (f64, usize) {
        (self.started.elapsed().as_secs_f64(), self.cnf.peak_bytes())
    }
}
