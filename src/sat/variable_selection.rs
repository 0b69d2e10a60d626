#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::cast_possible_truncation)]
//! The VMTF (variable move-to-front) decision queue.
//!
//! All variables sit on a doubly linked list ordered by their `bumped`
//! stamp, ascending from `first` to `last`. Bumping a variable dequeues it
//! and re-enqueues it at the tail with a fresh stamp, so recently
//! conflict-involved variables cluster at the end. The `search` cursor
//! points at the candidate for the next decision; every variable strictly
//! after it (toward `last`) is assigned. Decisions walk `prev` links from
//! the cursor until an unassigned variable appears, which makes a bump
//! O(1) and a decision O(skipped assigned variables).

use crate::sat::assignment::VarStore;
use crate::sat::literal::Variable;
use crate::sat::stats::Stats;

#[derive(Debug, Clone, Copy, Default)]
struct Link {
    prev: Variable,
    next: Variable,
}

#[derive(Debug, Clone, Default)]
pub struct VmtfQueue {
    links: Vec<Link>,
    bumped: Vec<u64>,
    first: Variable,
    last: Variable,
    /// Next decision candidate; 0 only when there are no variables.
    search: Variable,
    stamp: u64,
}

impl VmtfQueue {
    /// Builds the queue in index order with strictly increasing stamps,
    /// the cursor at the tail.
    #[must_use]
    pub fn new(max_var: Variable) -> Self {
        let slots = max_var as usize + 1;
        let mut queue = Self {
            links: vec![Link::default(); slots],
            bumped: vec![0; slots],
            first: 0,
            last: 0,
            search: 0,
            stamp: 0,
        };
        let mut prev = 0;
        for var in 1..=max_var {
            queue.links[var as usize].prev = prev;
            if prev == 0 {
                queue.first = var;
            } else {
                queue.links[prev as usize].next = var;
            }
            queue.stamp += 1;
            queue.bumped[var as usize] = queue.stamp;
            prev = var;
        }
        queue.last = prev;
        queue.search = prev;
        queue
    }

    #[inline]
    #[must_use]
    pub fn bumped(&self, var: Variable) -> u64 {
        self.bumped[var as usize]
    }

    /// Total bump stamps handed out, for the statistics report.
    #[must_use]
    pub const fn bumps(&self) -> u64 {
        self.stamp
    }

    /// Advances the cursor to the next unassigned variable and returns
    /// it, counting skipped assigned variables as searched.
    pub fn next_decision(&mut self, vars: &VarStore, stats: &mut Stats) -> Variable {
        while vars.is_assigned(self.search) {
            self.search = self.links[self.search as usize].prev;
            stats.searched += 1;
        }
        debug_assert_ne!(self.search, 0);
        self.search
    }

    /// Re-enables an unassigned variable as a decision candidate without
    /// requeueing: the cursor only moves if the variable is more recently
    /// bumped than the current candidate.
    pub fn on_unassign(&mut self, var: Variable) {
        if self.bumped(self.search) >= self.bumped(var) {
            return;
        }
        self.search = var;
    }

    /// Moves a variable to the tail with a fresh stamp. Variables already
    /// at the tail keep their position and stamp. When the bumped
    /// variable is unassigned and not excluded, the cursor follows it so
    /// the next decision picks it up.
    pub fn bump(&mut self, var: Variable, exclude: Variable, vars: &VarStore) {
        let idx = var as usize;
        if self.links[idx].next == 0 {
            return;
        }
        if self.search == var {
            let link = self.links[idx];
            self.search = if link.prev == 0 { link.next } else { link.prev };
        }
        self.dequeue(var);
        self.enqueue(var);
        self.stamp += 1;
        self.bumped[idx] = self.stamp;
        if var != exclude && !vars.is_assigned(var) {
            self.search = var;
        }
        log::trace!("bumped and moved to front {var}");
    }

    fn dequeue(&mut self, var: Variable) {
        let Link { prev, next } = self.links[var as usize];
        if prev == 0 {
            self.first = next;
        } else {
            self.links[prev as usize].next = next;
        }
        if next == 0 {
            self.last = prev;
        } else {
            self.links[next as usize].prev = prev;
        }
    }

    fn enqueue(&mut self, var: Variable) {
        let idx = var as usize;
        self.links[idx].prev = self.last;
        self.links[idx].next = 0;
        if self.last == 0 {
            self.first = var;
        } else {
            self.links[self.last as usize].next = var;
        }
        self.last = var;
    }

    /// Walks the queue front to back, for invariant checking.
    #[must_use]
    pub fn order(&self) -> Vec<Variable> {
        let mut order = Vec::new();
        let mut var = self.first;
        while var != 0 {
            order.push(var);
            var = self.links[var as usize].next;
        }
        order
    }

    /// Asserts the queue invariants: every variable appears exactly once,
    /// stamps strictly increase toward the tail, and everything after the
    /// cursor is assigned.
    pub fn check_invariant(&self, vars: &VarStore) {
        let order = self.order();
        assert_eq!(order.len(), self.links.len() - 1);
        for pair in order.windows(2) {
            assert!(self.bumped(pair[0]) < self.bumped(pair[1]));
        }
        let mut var = if self.search == 0 {
            0
        } else {
            self.links[self.search as usize].next
        };
        while var != 0 {
            assert!(vars.is_assigned(var), "variable {var} after the cursor");
            var = self.links[var as usize].next;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sat::literal::{Literal, PackedLiteral};

    #[test]
    fn test_initial_order_and_cursor() {
        let queue = VmtfQueue::new(4);
        assert_eq!(queue.order(), vec![1, 2, 3, 4]);
        assert_eq!(queue.search, 4);
        assert!(queue.bumped(1) < queue.bumped(4));
    }

    #[test]
    fn test_next_decision_skips_assigned() {
        let mut queue = VmtfQueue::new(3);
        let mut vars = VarStore::new(3);
        let mut stats = Stats::default();
        vars.assign(PackedLiteral::new(3, true), 1, None);
        assert_eq!(queue.next_decision(&vars, &mut stats), 2);
        assert_eq!(stats.searched, 1);
    }

    #[test]
    fn test_bump_moves_to_tail() {
        let mut queue = VmtfQueue::new(4);
        let vars = VarStore::new(4);
        queue.bump(2, 0, &vars);
        assert_eq!(queue.order(), vec![1, 3, 4, 2]);
        assert!(queue.bumped(2) > queue.bumped(4));
        // unassigned and not excluded, so the cursor follows
        assert_eq!(queue.search, 2);
    }

    #[test]
    fn test_bump_tail_is_noop() {
        let mut queue = VmtfQueue::new(3);
        let vars = VarStore::new(3);
        let stamp = queue.bumped(3);
        queue.bump(3, 0, &vars);
        assert_eq!(queue.order(), vec![1, 2, 3]);
        assert_eq!(queue.bumped(3), stamp);
    }

    #[test]
    fn test_unassign_moves_cursor_to_fresher_variable() {
        let mut queue = VmtfQueue::new(4);
        let mut vars = VarStore::new(4);
        let mut stats = Stats::default();
        for var in [4, 3] {
            vars.assign(PackedLiteral::new(var, true), 1, None);
        }
        assert_eq!(queue.next_decision(&vars, &mut stats), 2);
        // variable 4 is more recently stamped than the cursor at 2
        queue.on_unassign(4);
        assert_eq!(queue.search, 4);
        queue.on_unassign(3);
        assert_eq!(queue.search, 4);
    }
}
