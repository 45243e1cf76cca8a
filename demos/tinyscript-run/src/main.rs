//! Minimal host for the `tinyscript` crate: run a script file to
//! completion, or drop into a line-at-a-time REPL when none is given.

use clap::Parser;
use std::fs;
use std::io::{self, Write};
use tinyscript::{Host, Interp, SymbolKind, Value};

/// Run a tinyscript source file, or start an interactive REPL if none is
/// given.
#[derive(Parser, Debug)]
#[command(about, long_about = None)]
struct Args {
    /// Script file to run. Omit to start a REPL.
    script: Option<String>,

    /// Arena byte budget handed to the interpreter.
    #[arg(long, default_value_t = 1 << 20)]
    arena_bytes: usize,

    /// Print a diagnostic line on parse/runtime errors.
    #[arg(long, default_value_t = false)]
    verbose: bool,
}

struct StdoutHost;

impl Host for StdoutHost {
    fn out_char(&mut self, c: u8) {
        let stdout = io::stdout();
        let mut lock = stdout.lock();
        let _ = lock.write_all(&[c]);
        let _ = lock.flush();
    }
}

/// A custom builtin a host can register on top of the standard library:
/// `dsqr(x, y)` returns `x*x + y*y`.
fn dsqr(x: Value, y: Value, _a: Value, _b: Value) -> Value {
    x.wrapping_mul(x).wrapping_add(y.wrapping_mul(y))
}

fn new_interp(args: &Args) -> Interp {
    let mut interp = Interp::new(args.arena_bytes).expect("arena budget too small to start up");
    interp.set_verbose(args.verbose);
    interp.define_stdlib().expect("standard library registration");
    interp
        .define("dsqr", SymbolKind::Builtin { arity: 2, func: dsqr }, 0)
        .expect("dsqr registration");
    interp
}

fn run_file(path: &str, args: &Args) {
    let source = match fs::read_to_string(path) {
        Ok(s) => s,
        Err(e) => {
            eprintln!("{path}: {e}");
            std::process::exit(1);
        }
    };
    let mut interp = new_interp(args);
    let mut host = StdoutHost;
    if let Err(e) = interp.run(&source, false, true, &mut host) {
        eprintln!("script error: {e}");
        std::process::exit(1);
    }
}

fn repl(args: &Args) {
    let mut interp = new_interp(args);
    let mut host = StdoutHost;
    let stdin = io::stdin();
    loop {
        print!("> ");
        let _ = io::stdout().flush();
        let mut line = String::new();
        // A REPL line is freshly allocated every iteration, so any name it
        // defines must be independently copied to outlive it.
        if stdin.read_line(&mut line).unwrap_or(0) == 0 {
            break;
        }
        if let Err(e) = interp.run(&line, true, true, &mut host) {
            println!("error: {e}");
        }
    }
}

fn main() {
    let args = Args::parse();
    match &args.script {
        Some(path) => run_file(path, &args),
        None => repl(&args),
    }
}
