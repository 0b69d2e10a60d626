#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(unsafe_code, clippy::cast_possible_truncation)]
//! Per-variable assignment state.
//!
//! `VarStore` owns the dense tables the rest of the engine reads on every
//! step: the tri-state value of each variable, the saved phase used when
//! the variable is next picked as a decision, the decision level and
//! antecedent of each assignment, and the count of root-level (fixed)
//! variables. Variables are 1-based; slot 0 is the sentinel.

use crate::sat::cnf::ClauseRef;
use crate::sat::literal::{Literal, Variable};
use crate::sat::solver::Solutions;
use itertools::Itertools;

/// Assignment state of a propositional variable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum VarState {
    #[default]
    Unassigned,
    Assigned(bool),
}

impl From<VarState> for Option<bool> {
    fn from(state: VarState) -> Self {
        match state {
            VarState::Assigned(b) => Some(b),
            VarState::Unassigned => None,
        }
    }
}

/// Dense per-variable tables, indexed by variable.
#[derive(Debug, Clone, Default)]
pub struct VarStore {
    values: Vec<VarState>,
    phases: Vec<bool>,
    levels: Vec<u32>,
    reasons: Vec<Option<ClauseRef>>,
    /// Number of variables assigned at the root level.
    pub fixed: u32,
    /// Raised when a root-level assignment happens; the search driver
    /// clears it when it emits a progress report.
    pub iterating: bool,
}

impl VarStore {
    #[must_use]
    pub fn new(max_var: Variable) -> Self {
        let slots = max_var as usize + 1;
        Self {
            values: vec![VarState::Unassigned; slots],
            // Saved phases default to negative, so a fresh decision
            // assigns the negative literal.
            phases: vec![false; slots],
            levels: vec![0; slots],
            reasons: vec![None; slots],
            fixed: 0,
            iterating: false,
        }
    }

    #[must_use]
    pub fn num_vars(&self) -> usize {
        self.values.len().saturating_sub(1)
    }

    #[inline]
    #[must_use]
    pub fn var_state(&self, var: Variable) -> VarState {
        // Safety: variables are bounded by `max_var` from parsing on.
        unsafe { *self.values.get_unchecked(var as usize) }
    }

    /// The truth value of a literal, or `None` if unassigned.
    #[inline]
    #[must_use]
    pub fn value<L: Literal>(&self, lit: L) -> Option<bool> {
        Option::<bool>::from(self.var_state(lit.variable())).map(|b| b == lit.polarity())
    }

    /// The truth value of a literal if it was assigned at the root level,
    /// else `None`.
    #[inline]
    #[must_use]
    pub fn fixed_value<L: Literal>(&self, lit: L) -> Option<bool> {
        if self.level(lit.variable()) != 0 {
            return None;
        }
        self.value(lit)
    }

    #[inline]
    #[must_use]
    pub fn is_assigned(&self, var: Variable) -> bool {
        self.var_state(var) != VarState::Unassigned
    }

    #[inline]
    #[must_use]
    pub fn level(&self, var: Variable) -> u32 {
        unsafe { *self.levels.get_unchecked(var as usize) }
    }

    #[inline]
    #[must_use]
    pub fn reason(&self, var: Variable) -> Option<ClauseRef> {
        unsafe { *self.reasons.get_unchecked(var as usize) }
    }

    /// The sign the variable last carried, for phase saving.
    #[inline]
    #[must_use]
    pub fn saved_phase(&self, var: Variable) -> bool {
        unsafe { *self.phases.get_unchecked(var as usize) }
    }

    /// Makes a literal true. Requires the variable to be unassigned.
    /// Root-level assignments bump the fixed counter and raise
    /// `iterating` so the driver reports progress.
    pub fn assign<L: Literal>(&mut self, lit: L, level: u32, reason: Option<ClauseRef>) {
        let var = lit.variable() as usize;
        debug_assert_eq!(self.values[var], VarState::Unassigned, "assigning {lit:?} twice");
        self.values[var] = VarState::Assigned(lit.polarity());
        self.phases[var] = lit.polarity();
        self.levels[var] = level;
        self.reasons[var] = reason;
        if level == 0 {
            self.fixed += 1;
            self.iterating = true;
        }
        log::trace!("assign {} at level {level}", lit.to_dimacs());
    }

    /// Clears the value of a variable; level, phase and reason keep their
    /// last contents (level and reason are only meaningful while
    /// assigned).
    pub fn unassign(&mut self, var: Variable) {
        debug_assert!(self.is_assigned(var));
        self.values[var as usize] = VarState::Unassigned;
    }

    /// Clears `iterating`, returning whether it was raised.
    pub fn take_iterating(&mut self) -> bool {
        std::mem::take(&mut self.iterating)
    }

    /// The current full assignment as a witness. Only meaningful once
    /// every variable is assigned.
    #[must_use]
    pub fn solutions(&self) -> Solutions {
        Solutions::new(
            &self
                .values
                .iter()
                .enumerate()
                .skip(1)
                .filter_map(|(var, state)| {
                    #[allow(clippy::cast_possible_wrap)]
                    let var = var as i32;
                    match state {
                        VarState::Assigned(true) => Some(var),
                        VarState::Assigned(false) => Some(-var),
                        VarState::Unassigned => None,
                    }
                })
                .collect_vec(),
        )
    }
}
