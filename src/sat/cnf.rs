#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(unsafe_code, clippy::cast_possible_truncation, clippy::cast_sign_loss)]
//! The clause database.
//!
//! All clauses live in a single slab arena addressed by stable
//! [`ClauseRef`]s, partitioned into two pools: irredundant (input) clauses
//! and redundant (learned) clauses. Collection never moves a clause, so
//! watch lists and reason pointers stay valid for exactly as long as the
//! reducer's protocol promises; freed slots are recycled through a free
//! list. Clause bytes are accounted on allocation and deallocation and the
//! peak is reported in the final statistics.

use crate::sat::clause::Clause;
use crate::sat::clause_storage::LiteralStorage;
use crate::sat::literal::{Literal, PackedLiteral, Variable};
use crate::sat::solver::Solutions;
use itertools::Itertools;
use smallvec::SmallVec;
use std::cmp::Ordering;
use std::ops::{Index, IndexMut};

/// Stable handle to a clause in the arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ClauseRef(u32);

impl ClauseRef {
    #[must_use]
    pub const fn as_usize(self) -> usize {
        self.0 as usize
    }
}

/// Outcome of offering one original clause to the database.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AddedClause<L> {
    /// Tautological or duplicate-free empty offering; nothing stored.
    Tautology,
    /// The clause collapsed to a single literal.
    Unit(L),
    /// The clause was empty: the formula is trivially unsatisfiable.
    Empty,
    /// A clause of two or more literals was stored.
    Stored(ClauseRef),
}

/// A CNF formula and the clause database it grows into during search.
#[derive(Debug, Clone, Default)]
pub struct Cnf<L: Literal = PackedLiteral, S: LiteralStorage<L> = SmallVec<[L; 8]>> {
    arena: Vec<Clause<L, S>>,
    free: Vec<ClauseRef>,
    /// Original clauses, in input order.
    pub irredundant: Vec<ClauseRef>,
    /// Learned clauses, in learn order.
    pub redundant: Vec<ClauseRef>,
    /// Original unit clauses, to be assigned when solving starts.
    pub units: Vec<L>,
    /// An original empty clause was read.
    pub found_empty: bool,
    /// Highest variable index; variables are `1..=max_var`.
    pub max_var: Variable,
    live: u64,
    max_live: u64,
    bytes: usize,
    max_bytes: usize,
}

impl<L: Literal, S: LiteralStorage<L>> Cnf<L, S> {
    #[must_use]
    pub fn new(max_var: Variable) -> Self {
        Self {
            max_var,
            ..Self::default()
        }
    }

    /// Builds a formula from DIMACS-style signed clauses, inferring
    /// `max_var`. Convenient for tests and programmatic construction.
    #[must_use]
    pub fn from_dimacs_clauses(clauses: &[Vec<i32>]) -> Self {
        let max_var = clauses
            .iter()
            .flatten()
            .map(|lit| lit.unsigned_abs())
            .max()
            .unwrap_or(0);
        let mut cnf = Self::new(max_var);
        for clause in clauses {
            let lits = clauses_to_lits(clause);
            cnf.add_original_clause(lits);
        }
        cnf
    }

    /// Offers one original clause: sorts and deduplicates its literals,
    /// silently discards tautologies, and routes empty and unit clauses to
    /// their dedicated slots instead of the arena.
    pub fn add_original_clause(&mut self, mut lits: Vec<L>) -> AddedClause<L> {
        lits.sort_unstable_by(|a, b| compare_dimacs(*a, *b));
        let mut out = Vec::with_capacity(lits.len());
        let mut prev: Option<L> = None;
        for lit in lits {
            if prev == Some(lit) {
                continue;
            }
            if prev == Some(lit.negated()) {
                return AddedClause::Tautology;
            }
            out.push(lit);
            prev = Some(lit);
        }
        match out.len() {
            0 => {
                self.found_empty = true;
                AddedClause::Empty
            }
            1 => {
                self.units.push(out[0]);
                AddedClause::Unit(out[0])
            }
            _ => AddedClause::Stored(self.add_clause(&out, false, 0, 0)),
        }
    }

    /// Allocates a clause in the appropriate pool, stamping `resolved`
    /// with the current conflict index.
    pub fn add_clause(&mut self, lits: &[L], redundant: bool, glue: u32, resolved: u64) -> ClauseRef {
        debug_assert!(lits.len() >= 2, "unit and empty clauses are not stored");
        let clause = Clause::new(lits, redundant, glue, resolved);
        self.bytes += clause.bytes();
        if self.bytes > self.max_bytes {
            self.max_bytes = self.bytes;
        }
        let cref = if let Some(cref) = self.free.pop() {
            self.arena[cref.as_usize()] = clause;
            cref
        } else {
            let cref = ClauseRef(self.arena.len() as u32);
            self.arena.push(clause);
            cref
        };
        if redundant {
            self.redundant.push(cref);
        } else {
            self.irredundant.push(cref);
        }
        self.live += 1;
        if self.live > self.max_live {
            self.max_live = self.live;
        }
        cref
    }

    /// Frees a clause slot. The caller is responsible for having removed
    /// every watch and reason reference first; the pool vectors are
    /// compacted by the reducer, not here.
    pub fn delete_clause(&mut self, cref: ClauseRef) -> usize {
        let clause = &mut self.arena[cref.as_usize()];
        debug_assert!(!clause.reason, "reason clauses must not be collected");
        let bytes = clause.bytes();
        debug_assert!(self.bytes >= bytes);
        self.bytes -= bytes;
        debug_assert!(self.live > 0);
        self.live -= 1;
        clause.clear();
        self.free.push(cref);
        bytes
    }

    #[must_use]
    pub fn num_irredundant(&self) -> usize {
        self.irredundant.len()
    }

    #[must_use]
    pub fn num_redundant(&self) -> usize {
        self.redundant.len()
    }

    #[must_use]
    pub const fn live_clauses(&self) -> u64 {
        self.live
    }

    #[must_use]
    pub const fn current_bytes(&self) -> usize {
        self.bytes
    }

    #[must_use]
    pub const fn peak_bytes(&self) -> usize {
        self.max_bytes
    }

    /// Checks a witness against every stored original clause and unit.
    #[must_use]
    pub fn verify(&self, solutions: &Solutions) -> bool {
        let clause_ok = self.irredundant.iter().all(|&cref| {
            self[cref]
                .iter()
                .any(|lit| solutions.contains(lit.to_dimacs()))
        });
        clause_ok && self.units.iter().all(|lit| solutions.contains(lit.to_dimacs()))
    }
}

/// DIMACS literal order: by variable, negative before positive.
fn compare_dimacs<L: Literal>(a: L, b: L) -> Ordering {
    a.variable()
        .cmp(&b.variable())
        .then_with(|| a.polarity().cmp(&b.polarity()))
}

fn clauses_to_lits<L: Literal>(clause: &[i32]) -> Vec<L> {
    clause.iter().map(|&v| L::from_dimacs(v)).collect_vec()
}

impl<L: Literal, S: LiteralStorage<L>> Index<ClauseRef> for Cnf<L, S> {
    type Output = Clause<L, S>;

    fn index(&self, cref: ClauseRef) -> &Self::Output {
        // Safety: clause refs are only created by `add_clause` and stay
        // within the arena, which never shrinks.
        unsafe { self.arena.get_unchecked(cref.as_usize()) }
    }
}

impl<L: Literal, S: LiteralStorage<L>> IndexMut<ClauseRef> for Cnf<L, S> {
    fn index_mut(&mut self, cref: ClauseRef) -> &mut Self::Output {
        // Safety: as for `Index`.
        unsafe { self.arena.get_unchecked_mut(cref.as_usize()) }
    }
}
