#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::cast_possible_truncation)]
//! The assignment trail and the decision levels that partition it.
//!
//! The trail is the append-only sequence of assigned literals in
//! assignment order; `propagated` is the BFS cursor of the propagator.
//! Each decision opens a level recording its decision literal; level 0 is
//! the root level whose decision slot holds the sentinel literal. Each
//! level also carries a transient counter used during conflict analysis.

use crate::sat::assignment::VarStore;
use crate::sat::cnf::ClauseRef;
use crate::sat::literal::Literal;
use crate::sat::variable_selection::VmtfQueue;

#[derive(Debug, Clone, Default)]
pub struct Level<L: Literal> {
    /// Decision literal that opened this level; the sentinel at level 0.
    pub decision: L,
    /// Variables of this level seen during the current conflict analysis.
    pub seen: u32,
}

#[derive(Debug, Clone)]
pub struct Trail<L: Literal> {
    lits: Vec<L>,
    /// Literals before this index have been propagated; the rest are
    /// pending.
    pub propagated: usize,
    levels: Vec<Level<L>>,
}

impl<L: Literal> Trail<L> {
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        Self {
            lits: Vec::with_capacity(capacity),
            propagated: 0,
            levels: vec![Level::default()],
        }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.lits.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.lits.is_empty()
    }

    /// The current decision level.
    #[must_use]
    pub fn level(&self) -> u32 {
        (self.levels.len() - 1) as u32
    }

    #[inline]
    #[must_use]
    pub fn lit(&self, index: usize) -> L {
        self.lits[index]
    }

    pub fn iter(&self) -> std::slice::Iter<L> {
        self.lits.iter()
    }

    pub fn push(&mut self, lit: L) {
        self.lits.push(lit);
    }

    /// Makes `lit` true at the current level and appends it to the trail.
    pub fn assign(&mut self, vars: &mut VarStore, lit: L, reason: Option<ClauseRef>) {
        vars.assign(lit, self.level(), reason);
        self.lits.push(lit);
    }

    /// Opens a new decision level for `decision`.
    pub fn push_level(&mut self, decision: L) {
        self.levels.push(Level { decision, seen: 0 });
    }

    #[must_use]
    pub fn decision_of(&self, level: u32) -> L {
        self.levels[level as usize].decision
    }

    #[must_use]
    pub fn level_seen(&self, level: u32) -> u32 {
        self.levels[level as usize].seen
    }

    pub fn bump_level_seen(&mut self, level: u32) -> u32 {
        let seen = &mut self.levels[level as usize].seen;
        let before = *seen;
        *seen += 1;
        before
    }

    /// Levels above the backjump target are gone by the time analysis
    /// cleanup runs; only surviving entries need their counter reset.
    pub fn clear_level_seen(&mut self, level: u32) {
        if let Some(entry) = self.levels.get_mut(level as usize) {
            entry.seen = 0;
        }
    }

    /// Backtracks to `target`: pops trail entries until the decision
    /// literal of level `target + 1` has been unassigned, truncates the
    /// level list, and clamps the propagation cursor. A no-op when
    /// `target` is the current level.
    pub fn backtrack(&mut self, target: u32, vars: &mut VarStore, queue: &mut VmtfQueue) {
        debug_assert!(target <= self.level());
        if target == self.level() {
            return;
        }
        log::debug!("backtracking to decision level {target}");
        let decision = self.levels[target as usize + 1].decision;
        while let Some(lit) = self.lits.pop() {
            vars.unassign(lit.variable());
            queue.on_unassign(lit.variable());
            if lit == decision {
                break;
            }
        }
        if self.lits.len() < self.propagated {
            self.propagated = self.lits.len();
        }
        self.levels.truncate(target as usize + 1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sat::literal::PackedLiteral;

    fn lit(value: i32) -> PackedLiteral {
        PackedLiteral::from_dimacs(value)
    }

    fn assign(trail: &mut Trail<PackedLiteral>, vars: &mut VarStore, l: PackedLiteral) {
        vars.assign(l, trail.level(), None);
        trail.push(l);
    }

    #[test]
    fn test_levels_partition_trail() {
        let mut trail = Trail::new(4);
        let mut vars = VarStore::new(4);
        assign(&mut trail, &mut vars, lit(1));
        trail.push_level(lit(2));
        assign(&mut trail, &mut vars, lit(2));
        assign(&mut trail, &mut vars, lit(3));
        assert_eq!(trail.level(), 1);
        assert_eq!(trail.decision_of(1), lit(2));
        assert_eq!(vars.level(3), 1);
        assert_eq!(vars.level(1), 0);
    }

    #[test]
    fn test_backtrack_pops_through_decision() {
        let mut trail = Trail::new(4);
        let mut vars = VarStore::new(4);
        let mut queue = VmtfQueue::new(4);
        assign(&mut trail, &mut vars, lit(1));
        trail.push_level(lit(2));
        assign(&mut trail, &mut vars, lit(2));
        trail.push_level(lit(-3));
        assign(&mut trail, &mut vars, lit(-3));
        assign(&mut trail, &mut vars, lit(4));
        trail.propagated = 4;

        trail.backtrack(0, &mut vars, &mut queue);
        assert_eq!(trail.level(), 0);
        assert_eq!(trail.len(), 1);
        assert_eq!(trail.propagated, 1);
        assert!(vars.is_assigned(1));
        assert!(!vars.is_assigned(2));
        assert!(!vars.is_assigned(3));
        assert!(!vars.is_assigned(4));
    }

    #[test]
    fn test_backtrack_to_current_level_is_noop() {
        let mut trail = Trail::new(2);
        let mut vars = VarStore::new(2);
        let mut queue = VmtfQueue::new(2);
        trail.push_level(lit(1));
        assign(&mut trail, &mut vars, lit(1));
        trail.backtrack(1, &mut vars, &mut queue);
        assert_eq!(trail.len(), 1);
        assert!(vars.is_assigned(1));
    }
}
