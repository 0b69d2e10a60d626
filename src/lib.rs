#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
//! A conflict-driven clause-learning (CDCL) SAT solver.
//!
//! Given a propositional formula in conjunctive normal form, the solver
//! decides satisfiability, returns a witness for satisfiable formulas,
//! and can emit a DRAT refutation proof for unsatisfiable ones. The
//! search engine combines two-watched-literal propagation, first-UIP
//! clause learning, VMTF decisions with phase saving, glue-EMA-driven
//! restarts with trail reuse, and periodic reduction of the learned
//! clause database.
//!
//! ```
//! use gluesat::sat::cdcl::Cdcl;
//! use gluesat::sat::configs::Options;
//! use gluesat::sat::dimacs::parse_dimacs_text;
//! use gluesat::sat::solver::{Solver, Verdict};
//!
//! let cnf = parse_dimacs_text("p cnf 2 2\n1 2 0\n-1 2 0\n").unwrap();
//! let mut solver: Cdcl = Cdcl::new(cnf, Options::default());
//! assert_eq!(solver.solve(), Verdict::Satisfiable);
//! assert!(solver.solutions().contains(2));
//! ```

pub mod sat;
