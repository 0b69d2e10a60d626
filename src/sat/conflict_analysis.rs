#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::cast_possible_truncation)]
//! First-UIP conflict analysis.
//!
//! Starting from the conflicting clause, the analyzer resolves backwards
//! along the trail against the antecedents of current-level literals
//! until a single current-level literal remains: the first unique
//! implication point. The emerging clause collects the below-level
//! literals seen on the way; its glue is the number of distinct levels
//! encountered. The analyzer also feeds the learned-glue and jump EMAs,
//! stamps resolved redundant clauses, and afterwards bumps every seen
//! variable in ascending stamp order so the VMTF queue reflects the
//! resolution order.

use crate::sat::assignment::VarStore;
use crate::sat::clause_storage::LiteralStorage;
use crate::sat::cnf::{ClauseRef, Cnf};
use crate::sat::ema::Emas;
use crate::sat::literal::{Literal, Variable};
use crate::sat::stats::Stats;
use crate::sat::trail::Trail;
use crate::sat::variable_selection::VmtfQueue;
use bit_vec::BitVec;
use std::marker::PhantomData;

/// Shape of one analysis: the UIP (as assigned, i.e. true), the backjump
/// level, and the learned clause's glue and size. The clause itself stays
/// in the analyzer's buffer until [`Analyser::clear_levels`] runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Learnt<L: Literal> {
    pub uip: L,
    pub jump: u32,
    pub glue: u32,
    pub size: usize,
}

#[derive(Debug, Clone, Default)]
pub struct Analyser<L: Literal, S: LiteralStorage<L>> {
    seen: BitVec,
    seen_literals: Vec<L>,
    seen_levels: Vec<u32>,
    learned: Vec<L>,
    marker: PhantomData<*const S>,
}

impl<L: Literal, S: LiteralStorage<L>> Analyser<L, S> {
    #[must_use]
    pub fn new(max_var: Variable) -> Self {
        Self {
            seen: BitVec::from_elem(max_var as usize + 1, false),
            seen_literals: Vec::new(),
            seen_levels: Vec::new(),
            learned: Vec::new(),
            marker: PhantomData,
        }
    }

    /// The learned clause of the last analysis, UIP negation first,
    /// remaining literals in descending level order.
    #[must_use]
    pub fn clause(&self) -> &[L] {
        &self.learned
    }

    /// Resolves the conflict down to the first UIP. Requires the current
    /// level to be positive; root-level conflicts are handled by the
    /// driver as immediate unsatisfiability.
    pub fn analyse(
        &mut self,
        conflict: ClauseRef,
        cnf: &mut Cnf<L, S>,
        trail: &mut Trail<L>,
        vars: &VarStore,
        emas: &mut Emas,
        stats: &mut Stats,
    ) -> Learnt<L> {
        let level = trail.level();
        debug_assert!(level > 0);
        debug_assert!(self.learned.is_empty());
        debug_assert!(self.seen_literals.is_empty());
        debug_assert!(self.seen_levels.is_empty());

        let mut reason = conflict;
        let mut open: u32 = 0;
        let mut i = trail.len();
        let uip = loop {
            self.bump_clause(reason, cnf, emas, stats);
            for idx in 0..cnf[reason].len() {
                let lit = cnf[reason][idx];
                if self.analyse_literal(lit, vars, trail, level) {
                    open += 1;
                }
            }
            let uip = loop {
                i -= 1;
                let lit = trail.lit(i);
                if self.seen[lit.variable() as usize] {
                    break lit;
                }
            };
            open -= 1;
            if open == 0 {
                break uip;
            }
            let Some(antecedent) = vars.reason(uip.variable()) else {
                debug_assert!(false, "open literal {uip:?} has no antecedent");
                break uip;
            };
            reason = antecedent;
        };
        log::debug!("first UIP {}", uip.to_dimacs());

        self.learned.push(uip.negated());
        self.learned
            .sort_unstable_by(|a, b| vars.level(b.variable()).cmp(&vars.level(a.variable())));
        debug_assert_eq!(self.learned[0], uip.negated());
        debug_assert!(self
            .learned
            .iter()
            .all(|&lit| vars.value(lit) == Some(false)));

        let glue = self.seen_levels.len() as u32;
        emas.glue_slow.update(f64::from(glue));
        emas.glue_fast.update(f64::from(glue));
        self.minimize_clause();

        let jump = if self.learned.len() == 1 {
            0
        } else {
            vars.level(self.learned[1].variable())
        };
        debug_assert!(jump < level);
        emas.jump.update(f64::from(jump));

        Learnt {
            uip,
            jump,
            glue,
            size: self.learned.len(),
        }
    }

    /// Considers one literal of the current reason clause: literals
    /// assigned above the root level and not yet seen are recorded, and
    /// below-level ones join the emerging clause. Returns whether the
    /// literal sits on the current level.
    fn analyse_literal(&mut self, lit: L, vars: &VarStore, trail: &mut Trail<L>, level: u32) -> bool {
        let var = lit.variable();
        if self.seen[var as usize] {
            return false;
        }
        let lit_level = vars.level(var);
        if lit_level == 0 {
            return false;
        }
        debug_assert_eq!(vars.value(lit), Some(false));
        if lit_level < level {
            self.learned.push(lit);
        }
        if trail.bump_level_seen(lit_level) == 0 {
            self.seen_levels.push(lit_level);
        }
        self.seen.set(var as usize, true);
        self.seen_literals.push(lit);
        lit_level == level
    }

    /// Stamps a resolved redundant clause and feeds its size and glue
    /// into the resolved EMAs.
    fn bump_clause(&self, cref: ClauseRef, cnf: &mut Cnf<L, S>, emas: &mut Emas, stats: &Stats) {
        let clause = &mut cnf[cref];
        if !clause.redundant {
            return;
        }
        clause.resolved = stats.conflicts;
        emas.resolved_size.update(clause.len() as f64);
        emas.resolved_glue.update(f64::from(clause.glue));
    }

    /// Learned-clause minimization hook; declared but intentionally not
    /// performed.
    fn minimize_clause(&mut self) {}

    /// Bumps every variable seen in this analysis, in ascending stamp
    /// order, and clears their seen flags. Must run after the backjump so
    /// the cursor update sees current assignments.
    pub fn bump_and_clear(
        &mut self,
        uip: Variable,
        vars: &VarStore,
        queue: &mut VmtfQueue,
        stats: &mut Stats,
    ) {
        let mut lits = std::mem::take(&mut self.seen_literals);
        lits.sort_unstable_by_key(|lit| queue.bumped(lit.variable()));
        for lit in lits.drain(..) {
            let var = lit.variable();
            debug_assert!(self.seen[var as usize]);
            self.seen.set(var as usize, false);
            queue.bump(var, uip, vars);
        }
        self.seen_literals = lits;
        stats.bumped = queue.bumps();
    }

    /// Resets the per-level counters touched by the last analysis and
    /// drops the learned-clause buffer.
    pub fn clear_levels(&mut self, trail: &mut Trail<L>) {
        for level in self.seen_levels.drain(..) {
            trail.clear_level_seen(level);
        }
        self.learned.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sat::configs::Options;
    use crate::sat::propagation::Propagator;
    use smallvec::SmallVec;

    use crate::sat::literal::PackedLiteral;

    type TestCnf = Cnf<PackedLiteral, SmallVec<[PackedLiteral; 8]>>;
    type TestAnalyser = Analyser<PackedLiteral, SmallVec<[PackedLiteral; 8]>>;

    fn lit(value: i32) -> PackedLiteral {
        PackedLiteral::from_dimacs(value)
    }

    /// Decision 1 implies 2 and 3, which clash in clause `-2 -3`.
    /// The first UIP is variable 1, so the learned clause is the unit -1.
    #[test]
    fn test_simple_first_uip() {
        let mut cnf = TestCnf::from_dimacs_clauses(&[vec![-1, 2], vec![-1, 3], vec![-2, -3]]);
        let mut propagator: Propagator<PackedLiteral, SmallVec<[PackedLiteral; 8]>> =
            Propagator::new(cnf.max_var);
        for cref in cnf.irredundant.clone() {
            propagator.watch_clause(cref, &cnf);
        }
        let mut trail = Trail::new(3);
        let mut vars = VarStore::new(3);
        let mut stats = Stats::default();
        let mut emas = Emas::new(&Options::default());

        trail.push_level(lit(1));
        trail.assign(&mut vars, lit(1), None);
        let conflict = propagator
            .propagate(&mut trail, &mut vars, &mut cnf, &mut stats)
            .expect("the chain must conflict");

        let mut analyser = TestAnalyser::new(cnf.max_var);
        let learnt = analyser.analyse(conflict, &mut cnf, &mut trail, &vars, &mut emas, &mut stats);

        assert_eq!(learnt.size, 1);
        assert_eq!(learnt.jump, 0);
        assert_eq!(learnt.glue, 1);
        assert_eq!(learnt.uip, lit(1));
        assert_eq!(analyser.clause(), &[lit(-1)]);
        assert!((emas.glue_fast.get() - 1.0).abs() < f64::EPSILON);
    }

    /// Two decisions; the conflict resolves to a two-literal clause whose
    /// second literal pins the backjump to level 1.
    #[test]
    fn test_learned_clause_orders_levels() {
        let mut cnf = TestCnf::from_dimacs_clauses(&[vec![-1, -2, 3], vec![-3, -2, 4], vec![-4, -3, -2]]);
        let mut propagator: Propagator<PackedLiteral, SmallVec<[PackedLiteral; 8]>> =
            Propagator::new(cnf.max_var);
        for cref in cnf.irredundant.clone() {
            propagator.watch_clause(cref, &cnf);
        }
        let mut trail = Trail::new(4);
        let mut vars = VarStore::new(4);
        let mut stats = Stats::default();
        let mut emas = Emas::new(&Options::default());

        trail.push_level(lit(1));
        trail.assign(&mut vars, lit(1), None);
        assert!(propagator
            .propagate(&mut trail, &mut vars, &mut cnf, &mut stats)
            .is_none());
        trail.push_level(lit(2));
        trail.assign(&mut vars, lit(2), None);
        let conflict = propagator
            .propagate(&mut trail, &mut vars, &mut cnf, &mut stats)
            .expect("level 2 must conflict");

        let mut analyser = TestAnalyser::new(cnf.max_var);
        let learnt = analyser.analyse(conflict, &mut cnf, &mut trail, &vars, &mut emas, &mut stats);

        assert!(learnt.size >= 2);
        // slot 0 is the UIP negation at the conflict level
        assert_eq!(analyser.clause()[0], learnt.uip.negated());
        assert_eq!(vars.level(learnt.uip.variable()), 2);
        // slot 1 holds the second-highest level, which is the jump target
        assert_eq!(vars.level(analyser.clause()[1].variable()), learnt.jump);
        assert_eq!(learnt.jump, 1);
        assert!(analyser
            .clause()
            .iter()
            .all(|&l| vars.value(l) == Some(false)));
    }

    #[test]
    fn test_bump_and_clear_resets_state() {
        let mut cnf = TestCnf::from_dimacs_clauses(&[vec![-1, 2], vec![-1, 3], vec![-2, -3]]);
        let mut propagator: Propagator<PackedLiteral, SmallVec<[PackedLiteral; 8]>> =
            Propagator::new(cnf.max_var);
        for cref in cnf.irredundant.clone() {
            propagator.watch_clause(cref, &cnf);
        }
        let mut trail = Trail::new(3);
        let mut vars = VarStore::new(3);
        let mut queue = VmtfQueue::new(3);
        let mut stats = Stats::default();
        let mut emas = Emas::new(&Options::default());

        trail.push_level(lit(1));
        trail.assign(&mut vars, lit(1), None);
        let conflict = propagator
            .propagate(&mut trail, &mut vars, &mut cnf, &mut stats)
            .expect("must conflict");
        let learnt = analyse_helper(&mut cnf, &mut trail, &mut vars, &mut emas, &mut stats, conflict);

        let mut analyser = learnt.0;
        trail.backtrack(0, &mut vars, &mut queue);
        trail.assign(&mut vars, analyser.clause()[0], None);
        analyser.bump_and_clear(learnt.1.uip.variable(), &vars, &mut queue, &mut stats);
        analyser.clear_levels(&mut trail);

        assert!(analyser.clause().is_empty());
        assert!(stats.bumped > 0);
        // the seen variables moved to the queue tail
        let order = queue.order();
        assert_eq!(order.len(), 3);
    }

    fn analyse_helper(
        cnf: &mut TestCnf,
        trail: &mut Trail<PackedLiteral>,
        vars: &mut VarStore,
        emas: &mut Emas,
        stats: &mut Stats,
        conflict: ClauseRef,
    ) -> (TestAnalyser, Learnt<PackedLiteral>) {
        let mut analyser = TestAnalyser::new(cnf.max_var);
        let learnt = analyser.analyse(conflict, cnf, trail, vars, emas, stats);
        (analyser, learnt)
    }
}
