#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
//! The solver-facing surface: verdicts, witnesses, and the `Solver` trait
//! implemented by the CDCL engine.

use crate::sat::clause_storage::LiteralStorage;
use crate::sat::cnf::Cnf;
use crate::sat::configs::Options;
use crate::sat::literal::Literal;
use crate::sat::stats::Stats;
use itertools::Itertools;
use rustc_hash::FxHashSet;
use std::fmt;

/// Result of a solve: the conventional SAT-competition trichotomy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Verdict {
    Satisfiable,
    Unsatisfiable,
    /// The solve was interrupted before reaching a verdict.
    #[default]
    Unknown,
}

impl Verdict {
    /// The conventional process exit code: 10 for SAT, 20 for UNSAT,
    /// 0 when no verdict was reached.
    #[must_use]
    pub const fn exit_code(self) -> i32 {
        match self {
            Self::Satisfiable => 10,
            Self::Unsatisfiable => 20,
            Self::Unknown => 0,
        }
    }
}

/// A complete satisfying assignment as signed DIMACS literals.
#[derive(Debug, Clone, Default)]
pub struct Solutions {
    sorted: Vec<i32>,
    set: FxHashSet<i32>,
}

impl Solutions {
    #[must_use]
    pub fn new(literals: &[i32]) -> Self {
        let sorted = literals
            .iter()
            .copied()
            .sorted_unstable_by_key(|lit| lit.unsigned_abs())
            .collect_vec();
        let set = sorted.iter().copied().collect();
        Self { sorted, set }
    }

    /// Whether the witness makes this signed literal true.
    #[must_use]
    pub fn contains(&self, literal: i32) -> bool {
        self.set.contains(&literal)
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.sorted.is_empty()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.sorted.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = i32> + '_ {
        self.sorted.iter().copied()
    }
}

impl PartialEq for Solutions {
    fn eq(&self, other: &Self) -> bool {
        self.sorted == other.sorted
    }
}

impl Eq for Solutions {}

impl fmt::Display for Solutions {
    /// Competition `v`-line format: literals wrapped near 78 columns,
    /// terminated by `v 0`.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut column = 0;
        for lit in &self.sorted {
            let rendered = format!(" {lit}");
            if column == 0 {
                f.write_str("v")?;
                column = 1;
            } else if column + rendered.len() > 78 {
                f.write_str("\nv")?;
                column = 1;
            }
            f.write_str(&rendered)?;
            column += rendered.len();
        }
        if column > 0 {
            f.write_str("\n")?;
        }
        f.write_str("v 0")
    }
}

/// Common interface of the solving engines.
pub trait Solver<L: Literal, S: LiteralStorage<L>> {
    fn new(cnf: Cnf<L, S>, options: Options) -> Self;

    /// Runs the search to a verdict (or until interrupted).
    fn solve(&mut self) -> Verdict;

    /// The witness of the last `Satisfiable` verdict.
    fn solutions(&self) -> Solutions;

    fn stats(&self) -> &Stats;
}
