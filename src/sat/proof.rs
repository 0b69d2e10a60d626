#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
//! DRAT proof emission.
//!
//! The proof is an append-only text sink: every learned clause is written
//! as its literals terminated by `0`, and deriving the empty clause
//! writes a bare `0`. Nothing is ever rewound, so a truncated file is
//! simply an incomplete proof. Write failures are remembered and
//! surfaced once by `finish` rather than aborting the search.

use crate::sat::literal::Literal;
use std::io::{self, Write};

pub struct Proof {
    out: Box<dyn Write + Send>,
    error: Option<io::Error>,
}

impl std::fmt::Debug for Proof {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Proof").field("error", &self.error).finish()
    }
}

impl Proof {
    pub fn new<W: Write + Send + 'static>(out: W) -> Self {
        Self {
            out: Box::new(out),
            error: None,
        }
    }

    /// Traces a learned clause.
    pub fn add_clause<L: Literal>(&mut self, literals: &[L]) {
        let mut line = String::new();
        for lit in literals {
            line.push_str(&lit.to_dimacs().to_string());
            line.push(' ');
        }
        line.push_str("0\n");
        self.write(line.as_bytes());
    }

    /// Traces a learned unit clause.
    pub fn add_unit<L: Literal>(&mut self, literal: L) {
        self.write(format!("{} 0\n", literal.to_dimacs()).as_bytes());
    }

    /// Traces the empty clause.
    pub fn add_empty(&mut self) {
        self.write(b"0\n");
    }

    fn write(&mut self, bytes: &[u8]) {
        if self.error.is_some() {
            return;
        }
        if let Err(e) = self.out.write_all(bytes) {
            log::warn!("dropping proof trace: {e}");
            self.error = Some(e);
        }
    }

    /// Flushes the sink and reports the first write error, if any.
    ///
    /// # Errors
    ///
    /// Returns the sticky write error or the flush failure.
    pub fn finish(&mut self) -> io::Result<()> {
        if let Some(e) = self.error.take() {
            return Err(e);
        }
        self.out.flush()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sat::literal::PackedLiteral;
    use std::sync::{Arc, Mutex};

    #[derive(Clone, Default)]
    struct SharedSink(Arc<Mutex<Vec<u8>>>);

    impl Write for SharedSink {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    fn lit(value: i32) -> PackedLiteral {
        PackedLiteral::from_dimacs(value)
    }

    #[test]
    fn test_trace_format() {
        let sink = SharedSink::default();
        let mut proof = Proof::new(sink.clone());
        proof.add_clause(&[lit(-1), lit(2)]);
        proof.add_unit(lit(3));
        proof.add_empty();
        assert!(proof.finish().is_ok());
        let written = String::from_utf8(sink.0.lock().unwrap().clone()).unwrap();
        assert_eq!(written, "-1 2 0\n3 0\n0\n");
    }

    #[test]
    fn test_write_error_is_sticky_and_reported_once() {
        struct Failing;
        impl Write for Failing {
            fn write(&mut self, _: &[u8]) -> io::Result<usize> {
                Err(io::Error::new(io::ErrorKind::Other, "full"))
            }
            fn flush(&mut self) -> io::Result<()> {
                Ok(())
            }
        }
        let mut proof = Proof::new(Failing);
        proof.add_empty();
        proof.add_unit(lit(1));
        assert!(proof.finish().is_err());
        assert!(proof.finish().is_ok());
    }
}
