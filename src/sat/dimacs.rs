#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
//! A strict parser for the DIMACS CNF format.
//!
//! The expected shape is `c` comment lines, one `p cnf <vars> <clauses>`
//! header, then `<clauses>` whitespace-separated clauses each terminated
//! by `0`. Comments may also appear between clauses, and a `%`
//! end-of-data marker (common in benchmark archives) stops parsing.
//! Violations are reported as values carrying the offending line number;
//! the binary prefixes them with the file name. Tautological clauses are
//! discarded during construction, and unit and empty clauses are routed
//! to the solver rather than stored.

use crate::sat::clause_storage::LiteralStorage;
use crate::sat::cnf::Cnf;
use crate::sat::literal::Literal;
use flate2::read::GzDecoder;
use std::io::{self, BufRead, BufReader};
use std::num::IntErrorKind;
use std::path::Path;
use thiserror::Error;
use xz2::read::XzDecoder;

#[derive(Debug, Error)]
pub enum DimacsError {
    #[error("line {line}: expected 'p cnf <vars> <clauses>' header, found '{found}'")]
    BadHeader { line: usize, found: String },
    #[error("line {line}: expected literal, found '{token}'")]
    BadLiteral { line: usize, token: String },
    #[error("line {line}: literal '{token}' too large")]
    LiteralOverflow { line: usize, token: String },
    #[error("line {line}: literal {literal} exceeds maximum variable {max_var}")]
    LiteralBound {
        line: usize,
        literal: i32,
        max_var: u32,
    },
    #[error("line {line}: more than {expected} clauses")]
    TooManyClauses { line: usize, expected: u64 },
    #[error("line {line}: last clause without terminating '0'")]
    MissingTerminator { line: usize },
    #[error("unexpected end of file: expected {expected} clauses, found {found}")]
    ClauseMissing { expected: u64, found: u64 },
    #[error("unexpected end of file: missing 'p cnf' header")]
    MissingHeader,
    #[error(transparent)]
    Io(#[from] io::Error),
}

/// Parses DIMACS data from any buffered reader.
///
/// # Errors
///
/// Returns a [`DimacsError`] describing the first violation, with the
/// line it occurred on.
pub fn parse_dimacs<R: BufRead, L: Literal, S: LiteralStorage<L>>(
    reader: R,
) -> Result<Cnf<L, S>, DimacsError> {
    let mut lineno = 0;
    let mut lines = reader.lines();

    let (max_var, num_clauses) = loop {
        let Some(line) = lines.next() else {
            return Err(DimacsError::MissingHeader);
        };
        let line = line?;
        lineno += 1;
        let trimmed = line.trim();
        if trimmed.is_empty() || trimmed.starts_with('c') {
            continue;
        }
        break parse_header(trimmed, lineno)?;
    };
    log::info!("found 'p cnf {max_var} {num_clauses}' header");

    let mut cnf = Cnf::new(max_var);
    let mut clause: Vec<L> = Vec::new();
    let mut parsed: u64 = 0;
    let mut done = false;

    'lines: for line in lines {
        let line = line?;
        lineno += 1;
        let trimmed = line.trim();
        if trimmed.is_empty() || trimmed.starts_with('c') {
            continue;
        }
        for token in trimmed.split_whitespace() {
            if token == "%" {
                done = true;
                break 'lines;
            }
            if token == "c" {
                continue 'lines;
            }
            let literal = parse_literal(token, lineno, max_var)?;
            if literal == 0 {
                if parsed >= num_clauses {
                    return Err(DimacsError::TooManyClauses {
                        line: lineno,
                        expected: num_clauses,
                    });
                }
                parsed += 1;
                cnf.add_original_clause(std::mem::take(&mut clause));
            } else {
                clause.push(L::from_dimacs(literal));
            }
        }
    }

    if !clause.is_empty() {
        return Err(DimacsError::MissingTerminator { line: lineno });
    }
    if !done && parsed < num_clauses {
        return Err(DimacsError::ClauseMissing {
            expected: num_clauses,
            found: parsed,
        });
    }
    log::info!("parsed {parsed} clauses");
    Ok(cnf)
}

fn parse_header(line: &str, lineno: usize) -> Result<(u32, u64), DimacsError> {
    let bad = || DimacsError::BadHeader {
        line: lineno,
        found: line.to_string(),
    };
    let mut parts = line.split_whitespace();
    if parts.next() != Some("p") || parts.next() != Some("cnf") {
        return Err(bad());
    }
    let max_var = parts.next().ok_or_else(bad)?.parse().map_err(|_| bad())?;
    let num_clauses = parts.next().ok_or_else(bad)?.parse().map_err(|_| bad())?;
    if parts.next().is_some() {
        return Err(bad());
    }
    Ok((max_var, num_clauses))
}

fn parse_literal(token: &str, lineno: usize, max_var: u32) -> Result<i32, DimacsError> {
    let literal: i32 = token.parse().map_err(|e: std::num::ParseIntError| {
        if matches!(e.kind(), IntErrorKind::PosOverflow | IntErrorKind::NegOverflow) {
            DimacsError::LiteralOverflow {
                line: lineno,
                token: token.to_string(),
            }
        } else {
            DimacsError::BadLiteral {
                line: lineno,
                token: token.to_string(),
            }
        }
    })?;
    if literal.unsigned_abs() > max_var {
        return Err(DimacsError::LiteralBound {
            line: lineno,
            literal,
            max_var,
        });
    }
    Ok(literal)
}

/// Parses DIMACS data held in a string; convenient for tests.
///
/// # Errors
///
/// As for [`parse_dimacs`].
pub fn parse_dimacs_text<L: Literal, S: LiteralStorage<L>>(
    text: &str,
) -> Result<Cnf<L, S>, DimacsError> {
    parse_dimacs(io::Cursor::new(text))
}

/// Opens and parses a DIMACS file; `.gz` and `.xz` files are decompressed
/// on the read path.
///
/// # Errors
///
/// I/O failures and format violations both surface as [`DimacsError`].
pub fn parse_file<L: Literal, S: LiteralStorage<L>>(path: &Path) -> Result<Cnf<L, S>, DimacsError> {
    let file = std::fs::File::open(path)?;
    match path.extension().and_then(|e| e.to_str()) {
        Some("gz") => parse_dimacs(BufReader::new(GzDecoder::new(file))),
        Some("xz") => parse_dimacs(BufReader::new(XzDecoder::new(file))),
        _ => parse_dimacs(BufReader::new(file)),
    }
}
