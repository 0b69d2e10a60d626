#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
//! The command-line front end.
//!
//! Follows the conventional SAT-solver interface: a DIMACS input (file,
//! `-`, or stdin; `.gz`/`.xz` transparently decompressed), an optional
//! DRAT proof output (file or `-` for stdout), `--name=value` flags for
//! every solver option, `s`/`v` result lines, and exit codes 10 and 20.
//! SIGINT/SIGTERM raise a flag the search polls; an interrupted run
//! prints `s UNKNOWN` and the accumulated statistics.

use clap::{ArgAction, Parser};
use gluesat::sat::cdcl::Cdcl;
use gluesat::sat::configs::Options;
use gluesat::sat::dimacs::{parse_dimacs, parse_file};
use gluesat::sat::proof::Proof;
use gluesat::sat::solver::{Solver, Verdict};
use gluesat::sat::stats;
use std::io::{BufWriter, Write};
use std::path::PathBuf;
use std::sync::atomic::AtomicBool;
use std::sync::Arc;

#[derive(Parser, Debug)]
#[command(
    name = "gluesat",
    version,
    about = "A CDCL SAT solver",
    after_help = "Reads a DIMACS CNF formula ('-' or no <INPUT> for stdin; .gz and .xz \
                  files are decompressed) and prints 's SATISFIABLE' with a witness or \
                  's UNSATISFIABLE'. With <PROOF> ('-' for stdout) a DRAT refutation \
                  proof is written. Exit codes: 10 satisfiable, 20 unsatisfiable."
)]
struct Cli {
    /// DIMACS CNF input file
    input: Option<PathBuf>,

    /// DRAT proof output file
    proof: Option<PathBuf>,

    /// Suppress banner, progress and statistics lines
    #[arg(short, long)]
    quiet: bool,

    /// Alpha of the fast learned-glue EMA
    #[arg(long, default_value_t = 3e-2)]
    emagluefast: f64,

    /// Alpha of the slow learned-glue EMA
    #[arg(long, default_value_t = 1e-5)]
    emaglueslow: f64,

    /// Alpha of the backjump EMA
    #[arg(long, default_value_t = 1e-6)]
    emajump: f64,

    /// Alpha of the resolved glue and size EMAs
    #[arg(long, default_value_t = 1e-6)]
    emaresolved: f64,

    /// Garbage collect learned clauses
    #[arg(long, default_value_t = true, action = ArgAction::Set)]
    reduce: bool,

    /// Protect clauses under the resolved glue and size EMAs
    #[arg(long, default_value_t = true, action = ArgAction::Set)]
    reducedynamic: bool,

    /// Reduce limit increment growth
    #[arg(long, default_value_t = 300)]
    reduceinc: u64,

    /// Initial reduce limit and increment
    #[arg(long, default_value_t = 2000)]
    reduceinit: u64,

    /// Enable restarting
    #[arg(long, default_value_t = true, action = ArgAction::Set)]
    restart: bool,

    /// Delay restarts below a fraction of the jump EMA
    #[arg(long, default_value_t = true, action = ArgAction::Set)]
    restartdelay: bool,

    /// Level to jump-EMA ratio below which restarts are delayed
    #[arg(long, default_value_t = 0.5)]
    restartdelaylim: f64,

    /// Minimum conflicts between restart checks
    #[arg(long, default_value_t = 10)]
    restartint: u64,

    /// Required slow-to-fast glue margin
    #[arg(long, default_value_t = 0.2)]
    restartmargin: f64,

    /// Enable trail reuse on restart
    #[arg(long, default_value_t = true, action = ArgAction::Set)]
    reusetrail: bool,
}

impl Cli {
    fn options(&self) -> Options {
        Options {
            ema_glue_fast: self.emagluefast,
            ema_glue_slow: self.emaglueslow,
            ema_jump: self.emajump,
            ema_resolved: self.emaresolved,
            reduce: self.reduce,
            reduce_dynamic: self.reducedynamic,
            reduce_inc: self.reduceinc,
            reduce_init: self.reduceinit,
            restart: self.restart,
            restart_delay: self.restartdelay,
            restart_delay_lim: self.restartdelaylim,
            restart_int: self.restartint,
            restart_margin: self.restartmargin,
            reuse_trail: self.reusetrail,
        }
        .clamped()
    }
}

fn die(message: &std::fmt::Arguments) -> i32 {
    eprintln!("gluesat: error: {message}");
    1
}

macro_rules! die {
    ($($arg:tt)*) => {
        return die(&format_args!($($arg)*))
    };
}

/// Runs the solver; returns the process exit code.
pub fn run() -> i32 {
    env_logger::init();
    let cli = Cli::parse();
    let quiet = cli.quiet;

    if !quiet {
        println!("c gluesat {}", env!("CARGO_PKG_VERSION"));
        println!("c a CDCL SAT solver");
    }

    let interrupt = Arc::new(AtomicBool::new(false));
    for signal in [signal_hook::consts::SIGINT, signal_hook::consts::SIGTERM] {
        if let Err(e) = signal_hook::flag::register(signal, Arc::clone(&interrupt)) {
            log::warn!("could not register handler for signal {signal}: {e}");
        }
    }

    let (input_name, cnf) = match &cli.input {
        None => ("<stdin>".to_string(), parse_dimacs(std::io::stdin().lock())),
        Some(path) if path.as_os_str() == "-" => {
            ("<stdin>".to_string(), parse_dimacs(std::io::stdin().lock()))
        }
        Some(path) => (path.display().to_string(), parse_file(path)),
    };
    if !quiet {
        println!("c reading DIMACS file from '{input_name}'");
    }
    let cnf = match cnf {
        Ok(cnf) => cnf,
        Err(e) => die!("{input_name}: {e}"),
    };

    let options = cli.options();
    if !quiet {
        for (name, value) in options.describe() {
            println!("c --{name}={value}");
        }
    }

    let mut solver: Cdcl = Cdcl::new(cnf, options);
    solver.set_terminate(Arc::clone(&interrupt));

    if let Some(path) = &cli.proof {
        if path.as_os_str() == "-" {
            solver.set_proof(Proof::new(std::io::stdout()));
            if !quiet {
                println!("c writing DRAT proof to '<stdout>'");
            }
        } else {
            match std::fs::File::create(path) {
                Ok(file) => {
                    solver.set_proof(Proof::new(BufWriter::new(file)));
                    if !quiet {
                        println!("c writing DRAT proof to '{}'", path.display());
                    }
                }
                Err(e) => die!("can not write DRAT proof to '{}': {e}", path.display()),
            }
        }
    }

    let verdict = solver.solve();

    match verdict {
        Verdict::Satisfiable => {
            println!("s SATISFIABLE");
            println!("{}", solver.solutions());
        }
        Verdict::Unsatisfiable => {
            println!("s UNSATISFIABLE");
        }
        Verdict::Unknown => {
            println!("s UNKNOWN");
        }
    }
    let _ = std::io::stdout().flush();

    if let Some(mut proof) = solver.take_proof() {
        if let Err(e) = proof.finish() {
            die!("writing DRAT proof failed: {e}");
        }
    }

    if !quiet {
        let (seconds, peak_bytes) = solver.summary();
        stats::print_summary(solver.stats(), seconds, peak_bytes);
        print_allocator_stats();
        println!("c exit {}", verdict.exit_code());
    }
    verdict.exit_code()
}

/// Peak resident memory as seen by jemalloc, when available.
#[cfg(not(target_env = "msvc"))]
fn print_allocator_stats() {
    use tikv_jemalloc_ctl::{epoch, stats};
    if let (Ok(_), Ok(resident)) = (epoch::advance(), stats::resident::read()) {
        #[allow(clippy::cast_precision_loss)]
        let megabytes = resident as f64 / f64::from(1u32 << 20);
        println!("c resident:      {resident:15}   {megabytes:10.2}   MB (jemalloc)");
    }
}

#[cfg(target_env = "msvc")]
fn print_allocator_stats() {}
