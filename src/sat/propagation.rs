#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::cast_possible_truncation)]
//! Unit propagation with two watched literals.
//!
//! Every clause of size two or more is watched by its first two literals.
//! A watch entry carries a blocking literal (a hint only, possibly stale)
//! and the cached clause size, so binary clauses are handled without
//! touching the clause at all. Propagation drains the trail in FIFO order
//! and visits the watch list of the falsified side of each drained
//! literal, compacting the list in place with separate read and write
//! cursors.
//!
//! Invariants on entry and exit: each clause of size >= 2 sits on exactly
//! the watch lists of its slots 0 and 1, and when a clause forces an
//! assignment the forced literal is in slot 0.

use crate::sat::assignment::VarStore;
use crate::sat::clause_storage::LiteralStorage;
use crate::sat::cnf::{ClauseRef, Cnf};
use crate::sat::literal::{Literal, Variable};
use crate::sat::stats::Stats;
use crate::sat::trail::Trail;
use smallvec::SmallVec;
use std::marker::PhantomData;

/// A (blocking literal, cached size, clause) triple on a watch list.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Watch<L: Literal> {
    pub blit: L,
    pub size: u32,
    pub clause: ClauseRef,
}

type WatchList<L> = SmallVec<[Watch<L>; 4]>;

#[derive(Debug, Clone, Default)]
pub struct Propagator<L: Literal, S: LiteralStorage<L>> {
    watches: Vec<WatchList<L>>,
    marker: PhantomData<*const S>,
}

impl<L: Literal, S: LiteralStorage<L>> Propagator<L, S> {
    #[must_use]
    pub fn new(max_var: Variable) -> Self {
        Self {
            watches: vec![WatchList::new(); 2 * (max_var as usize + 1)],
            marker: PhantomData,
        }
    }

    /// Puts a clause on the watch lists of its first two literals, each
    /// blocking with the other.
    pub fn watch_clause(&mut self, cref: ClauseRef, cnf: &Cnf<L, S>) {
        let clause = &cnf[cref];
        debug_assert!(clause.len() >= 2);
        let size = clause.len() as u32;
        let l0 = clause[0];
        let l1 = clause[1];
        self.watch_literal(l0, l1, cref, size);
        self.watch_literal(l1, l0, cref, size);
    }

    fn watch_literal(&mut self, lit: L, blit: L, cref: ClauseRef, size: u32) {
        self.watches[lit.index()].push(Watch {
            blit,
            size,
            clause: cref,
        });
    }

    /// The watch list of one literal, for invariant checks.
    #[must_use]
    pub fn watch_list(&self, lit: L) -> &[Watch<L>] {
        &self.watches[lit.index()]
    }

    /// Drains pending trail literals, maintaining the watch invariant.
    /// Returns the conflicting clause if one is found.
    pub fn propagate(
        &mut self,
        trail: &mut Trail<L>,
        vars: &mut VarStore,
        cnf: &mut Cnf<L, S>,
        stats: &mut Stats,
    ) -> Option<ClauseRef> {
        let mut conflict = None;
        while conflict.is_none() && trail.propagated < trail.len() {
            let lit = trail.lit(trail.propagated);
            trail.propagated += 1;
            stats.propagations += 1;
            debug_assert_eq!(vars.value(lit), Some(true));
            log::trace!("propagating {}", lit.to_dimacs());

            let not_lit = lit.negated();
            let idx = not_lit.index();
            let mut ws = std::mem::take(&mut self.watches[idx]);
            let mut i = 0;
            let mut j = 0;
            while conflict.is_none() && i < ws.len() {
                let w = ws[i];
                ws[j] = w;
                i += 1;
                j += 1;
                let blocking = vars.value(w.blit);
                if blocking == Some(true) {
                    continue;
                }
                if w.size == 2 {
                    // the other literal of a binary clause is the blit
                    if blocking == Some(false) {
                        conflict = Some(w.clause);
                    } else {
                        trail.assign(vars, w.blit, Some(w.clause));
                    }
                    continue;
                }
                let cref = w.clause;
                {
                    let clause = &mut cnf[cref];
                    debug_assert_eq!(clause.len() as u32, w.size);
                    if clause[1] != not_lit {
                        clause.swap(0, 1);
                    }
                    debug_assert_eq!(clause[1], not_lit);
                }
                let other = cnf[cref][0];
                let u = vars.value(other);
                if u == Some(true) {
                    ws[j - 1].blit = other;
                    continue;
                }
                let size = w.size as usize;
                let mut k = 2;
                let mut v = Some(false);
                while k < size {
                    v = vars.value(cnf[cref][k]);
                    if v != Some(false) {
                        break;
                    }
                    k += 1;
                }
                if v == Some(true) {
                    ws[j - 1].blit = cnf[cref][k];
                } else if v.is_none() {
                    // move the watch to the replacement literal
                    let replacement = {
                        let clause = &mut cnf[cref];
                        clause.swap(1, k);
                        clause[1]
                    };
                    self.watch_literal(replacement, not_lit, cref, w.size);
                    j -= 1;
                } else if u.is_none() {
                    trail.assign(vars, other, Some(cref));
                } else {
                    conflict = Some(cref);
                }
            }
            while i < ws.len() {
                ws[j] = ws[i];
                j += 1;
                i += 1;
            }
            ws.truncate(j);
            self.watches[idx] = ws;
        }
        if let Some(cref) = conflict {
            stats.conflicts += 1;
            log::debug!("conflict in clause {cref:?} at conflict {}", stats.conflicts);
        }
        conflict
    }

    /// Drops watches of garbage clauses and clears both lists of every
    /// root-fixed variable; used by the reducer before collection.
    pub fn flush_garbage(&mut self, cnf: &Cnf<L, S>, vars: &VarStore) {
        let max_var = (self.watches.len() / 2 - 1) as Variable;
        for var in 1..=max_var {
            if vars.fixed_value(L::new(var, true)).is_some() {
                self.watches[L::new(var, false).index()] = WatchList::new();
                self.watches[L::new(var, true).index()] = WatchList::new();
            } else {
                for polarity in [false, true] {
                    self.watches[L::new(var, polarity).index()]
                        .retain(|w| !cnf[w.clause].garbage);
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sat::literal::PackedLiteral;

    type TestCnf = Cnf<PackedLiteral, SmallVec<[PackedLiteral; 8]>>;
    type TestPropagator = Propagator<PackedLiteral, SmallVec<[PackedLiteral; 8]>>;

    fn lit(value: i32) -> PackedLiteral {
        PackedLiteral::from_dimacs(value)
    }

    struct Harness {
        cnf: TestCnf,
        propagator: TestPropagator,
        trail: Trail<PackedLiteral>,
        vars: VarStore,
        stats: Stats,
    }

    fn setup(clauses: &[Vec<i32>], max_var: u32) -> Harness {
        let mut cnf = TestCnf::from_dimacs_clauses(clauses);
        cnf.max_var = cnf.max_var.max(max_var);
        let mut propagator = TestPropagator::new(cnf.max_var);
        for cref in cnf.irredundant.clone() {
            propagator.watch_clause(cref, &cnf);
        }
        let trail = Trail::new(cnf.max_var as usize);
        let vars = VarStore::new(cnf.max_var);
        Harness {
            cnf,
            propagator,
            trail,
            vars,
            stats: Stats::default(),
        }
    }

    fn decide(h: &mut Harness, value: i32) {
        h.trail.push_level(lit(value));
        h.trail.assign(&mut h.vars, lit(value), None);
    }

    #[test]
    fn test_watches_attach_to_first_two_literals() {
        let h = setup(&[vec![1, 2, -3], vec![-1, 4]], 5);
        let first = h.cnf.irredundant[0];
        let second = h.cnf.irredundant[1];
        assert!(h.propagator.watch_list(lit(1)).iter().any(|w| w.clause == first));
        assert!(h.propagator.watch_list(lit(2)).iter().any(|w| w.clause == first));
        assert!(h.propagator.watch_list(lit(-3)).is_empty());
        assert!(h.propagator.watch_list(lit(-1)).iter().any(|w| w.clause == second));
        assert!(h.propagator.watch_list(lit(4)).iter().any(|w| w.clause == second));
    }

    #[test]
    fn test_chain_propagation() {
        let mut h = setup(&[vec![-1, 2], vec![-2, 3]], 4);
        decide(&mut h, 1);
        let conflict =
            h.propagator
                .propagate(&mut h.trail, &mut h.vars, &mut h.cnf, &mut h.stats);
        assert!(conflict.is_none());
        assert_eq!(h.trail.len(), 3);
        assert_eq!(h.vars.value(lit(2)), Some(true));
        assert_eq!(h.vars.value(lit(3)), Some(true));
        assert_eq!(h.vars.reason(2), Some(h.cnf.irredundant[0]));
        assert_eq!(h.vars.reason(3), Some(h.cnf.irredundant[1]));
        assert_eq!(h.stats.propagations, 3);
    }

    #[test]
    fn test_binary_conflict() {
        let mut h = setup(&[vec![-1, 2], vec![-1, -2]], 3);
        decide(&mut h, 1);
        let conflict =
            h.propagator
                .propagate(&mut h.trail, &mut h.vars, &mut h.cnf, &mut h.stats);
        assert_eq!(conflict, Some(h.cnf.irredundant[1]));
        assert_eq!(h.stats.conflicts, 1);
    }

    #[test]
    fn test_watch_migrates_to_unassigned_literal() {
        let mut h = setup(&[vec![-1, 2, 3, -4]], 5);
        decide(&mut h, 1);
        let conflict =
            h.propagator
                .propagate(&mut h.trail, &mut h.vars, &mut h.cnf, &mut h.stats);
        assert!(conflict.is_none());
        let cref = h.cnf.irredundant[0];
        // the falsified watch -1 was replaced; slots 0 and 1 hold the
        // watched literals
        let c0 = h.cnf[cref][0];
        let c1 = h.cnf[cref][1];
        assert!(h.propagator.watch_list(c0).iter().any(|w| w.clause == cref));
        assert!(h.propagator.watch_list(c1).iter().any(|w| w.clause == cref));
        assert!(!h.propagator.watch_list(lit(-1)).iter().any(|w| w.clause == cref));
    }

    #[test]
    fn test_long_clause_unit_propagates_slot_zero() {
        let mut h = setup(&[vec![1, 2, 3]], 3);
        decide(&mut h, -1);
        assert!(h
            .propagator
            .propagate(&mut h.trail, &mut h.vars, &mut h.cnf, &mut h.stats)
            .is_none());
        decide(&mut h, -2);
        assert!(h
            .propagator
            .propagate(&mut h.trail, &mut h.vars, &mut h.cnf, &mut h.stats)
            .is_none());
        assert_eq!(h.vars.value(lit(3)), Some(true));
        let cref = h.cnf.irredundant[0];
        assert_eq!(h.vars.reason(3), Some(cref));
        assert_eq!(h.cnf[cref][0], lit(3));
    }

    #[test]
    fn test_long_clause_conflict() {
        let mut h = setup(&[vec![1, 2, 3]], 3);
        for v in [-1, -2, -3] {
            decide(&mut h, v);
        }
        let conflict =
            h.propagator
                .propagate(&mut h.trail, &mut h.vars, &mut h.cnf, &mut h.stats);
        assert_eq!(conflict, Some(h.cnf.irredundant[0]));
    }

    #[test]
    fn test_blocking_literal_skips_clause() {
        let mut h = setup(&[vec![1, 2, 3]], 3);
        decide(&mut h, 2);
        assert!(h
            .propagator
            .propagate(&mut h.trail, &mut h.vars, &mut h.cnf, &mut h.stats)
            .is_none());
        // 2 satisfies the clause; falsifying 1 must keep the watch intact
        decide(&mut h, -1);
        assert!(h
            .propagator
            .propagate(&mut h.trail, &mut h.vars, &mut h.cnf, &mut h.stats)
            .is_none());
        let cref = h.cnf.irredundant[0];
        let on_lists = [1, 2, 3]
            .iter()
            .map(|&v| {
                usize::from(h.propagator.watch_list(lit(v)).iter().any(|w| w.clause == cref))
            })
            .sum::<usize>();
        assert_eq!(on_lists, 2);
    }
}
