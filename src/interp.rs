//! Driver: arena setup, keyword/operator registration, and the two
//! re-entrant run entry points (`run` for hosts and user procedures,
//! `run_nested` for `if`/`while`/bare-block bodies that must let a
//! `return` keep bubbling instead of being collapsed into a value).

use crate::arena::Arena;
use crate::error::{Status, TsError};
use crate::lexer::Lexer;
use crate::stmt::exec_block;
use crate::strview::StringView;
use crate::symbol::{Keyword, Symbol, SymbolKind};
use crate::Value;

/// A host's character I/O hooks. `in_char` is declared for parity with
/// the original's `inchar`/`outchar` pair but the core never calls it --
/// it exists purely so a REPL-style host can implement both halves of
/// one trait.
pub trait Host {
    fn out_char(&mut self, c: u8);
    fn in_char(&mut self) -> Option<u8> {
        None
    }
}

/// One interpreter instance: its arena plus the handful of settings a
/// host can flip. Everything the original kept in module-wide globals
/// (the instruction pointer, current token, stack tops, the shared
/// return slot) lives either here or, for the parse-position state that
/// only matters within a single `run` call, as local variables inside
/// `run`/`run_nested` -- nothing is global, so two `Interp`s never
/// interfere with each other.
pub struct Interp {
    arena: Arena,
    verbose: bool,
}

impl Interp {
    /// Creates an interpreter with the given arena byte budget and
    /// registers the reserved words and the standard operator table
    /// (§6 of the spec this crate implements: `*` `/` at level 1, `+` `-`
    /// at level 2, `&` `|` `^` `<<` `>>` at level 3, the comparisons at
    /// level 4). Level 5 is left empty for a host to register its own
    /// lowest-precedence operator.
    pub fn new(arena_capacity_bytes: usize) -> Result<Self, TsError> {
        let mut interp = Interp { arena: Arena::new(arena_capacity_bytes), verbose: false };
        interp.register_keywords()?;
        interp.register_standard_operators()?;
        Ok(interp)
    }

    pub fn set_verbose(&mut self, verbose: bool) {
        self.verbose = verbose;
    }

    /// Registers the optional standard library (`not`, `bool`, the
    /// `list_*` byte-buffer family) on this instance. A host that wants a
    /// minimal, allocation-free instance can skip calling this.
    pub fn define_stdlib(&mut self) -> Result<(), TsError> {
        crate::stdlib::define_stdlib(self)
    }

    pub(crate) fn arena(&self) -> &Arena {
        &self.arena
    }

    pub(crate) fn arena_mut(&mut self) -> &mut Arena {
        &mut self.arena
    }

    fn register_keywords(&mut self) -> Result<(), TsError> {
        use Keyword::*;
        for (name, kw) in [
            ("if", If),
            ("else", Else),
            ("while", While),
            ("print", Print),
            ("var", Var),
            ("func", Func),
            ("return", Return),
        ] {
            self.define(name, SymbolKind::Keyword(kw), 0)?;
        }
        Ok(())
    }

    fn register_standard_operators(&mut self) -> Result<(), TsError> {
        for (name, level, func) in STANDARD_OPERATORS {
            self.define(name, SymbolKind::Operator { level: *level, func: *func }, 0)?;
        }
        Ok(())
    }

    /// Appends one symbol table entry. For `Int` symbols, `value` is the
    /// initial value; for every other kind it is carried along on the
    /// `Symbol` but not consulted (the behavior lives in the `kind`'s own
    /// function pointer / arity / level / index).
    pub fn define(&mut self, name: &str, kind: SymbolKind, value: Value) -> Result<(), TsError> {
        if let SymbolKind::Builtin { arity, .. } = kind {
            if arity as usize > crate::MAX_BUILTIN_PARAMS {
                return Err(TsError::TooManyArgs);
            }
        }
        self.arena
            .push_symbol(Symbol { name: StringView::new(name), kind, value })
            .map(|_| ())
    }

    /// Runs `source` against this interpreter. `save_strings` charges the
    /// arena budget for any identifier/body text captured by `var` or
    /// `func` during this call (captured `StringView`s are always
    /// independently owned in this port, so the flag only affects
    /// accounting, never correctness -- see `DESIGN.md`). `top_level`
    /// controls whether symbols defined directly in `source` persist
    /// after the call returns; a `return` anywhere in `source` becomes
    /// this call's result (0 if the script never returns).
    pub fn run(
        &mut self,
        source: &str,
        save_strings: bool,
        top_level: bool,
        host: &mut dyn Host,
    ) -> Result<Value, TsError> {
        let mark = self.arena.mark();
        let outcome = self.exec_source(source, save_strings, host, top_level);
        if !top_level {
            self.arena.restore(mark);
        }
        match outcome? {
            Status::Return(v) => Ok(v),
            Status::Ok | Status::Else => Ok(0),
        }
    }

    /// Runs `source` as a nested block (an `if`/`while` body or a bare
    /// `{ ... }` statement): always its own scope, and a `return` inside
    /// it is *not* collapsed -- it keeps propagating as `Status::Return`
    /// so the enclosing `while`/script can see it and stop too.
    pub(crate) fn run_nested(
        &mut self,
        source: &str,
        save_strings: bool,
        host: &mut dyn Host,
    ) -> Result<Status, TsError> {
        let mark = self.arena.mark();
        let outcome = self.exec_source(source, save_strings, host, false);
        self.arena.restore(mark);
        outcome
    }

    fn exec_source(
        &mut self,
        source: &str,
        save_strings: bool,
        host: &mut dyn Host,
        report_errors: bool,
    ) -> Result<Status, TsError> {
        let mut lexer = Lexer::new(source);
        let first = lexer.next_token(&self.arena, false);
        let mut cur = match first {
            Ok(t) => t,
            Err(e) => {
                if report_errors && self.verbose {
                    self.report_error(host, e, lexer.remaining());
                }
                return Err(e);
            }
        };
        let result = exec_block(&mut lexer, &mut cur, self, host, save_strings);
        if let Err(e) = result {
            if report_errors && self.verbose {
                self.report_error(host, e, lexer.remaining());
            }
            return Err(e);
        }
        result
    }

    fn report_error(&self, host: &mut dyn Host, err: TsError, remaining: &str) {
        for b in format!("error: {err}\n").bytes() {
            host.out_char(b);
        }
        let snippet_len = remaining.len().min(32);
        for b in format!("near: {:?}\n", &remaining[..snippet_len]).bytes() {
            host.out_char(b);
        }
    }
}

fn op_mul(a: Value, b: Value) -> Value {
    a.wrapping_mul(b)
}
fn op_div(a: Value, b: Value) -> Value {
    if b == 0 {
        0
    } else {
        a.wrapping_div(b)
    }
}
fn op_add(a: Value, b: Value) -> Value {
    a.wrapping_add(b)
}
fn op_sub(a: Value, b: Value) -> Value {
    a.wrapping_sub(b)
}
fn op_and(a: Value, b: Value) -> Value {
    a & b
}
fn op_or(a: Value, b: Value) -> Value {
    a | b
}
fn op_xor(a: Value, b: Value) -> Value {
    a ^ b
}
fn op_shl(a: Value, b: Value) -> Value {
    a.wrapping_shl(b as u32)
}
fn op_shr(a: Value, b: Value) -> Value {
    a.wrapping_shr(b as u32)
}
fn op_eq(a: Value, b: Value) -> Value {
    (a == b) as Value
}
fn op_ne(a: Value, b: Value) -> Value {
    (a != b) as Value
}
fn op_lt(a: Value, b: Value) -> Value {
    (a < b) as Value
}
fn op_le(a: Value, b: Value) -> Value {
    (a <= b) as Value
}
fn op_gt(a: Value, b: Value) -> Value {
    (a > b) as Value
}
fn op_ge(a: Value, b: Value) -> Value {
    (a >= b) as Value
}

/// The default operator table from §6: level 1 = tightest-binding.
/// Division and shift semantics for negative operands are left to the
/// host to override via `Interp::define` -- the spec this crate
/// implements explicitly calls that an open question; these defaults
/// (truncating division, zero-on-divide-by-zero, masked wrapping
/// shifts) are a safe, panic-free baseline, not a claimed "correct"
/// answer.
const STANDARD_OPERATORS: &[(&str, u8, crate::symbol::OperatorFn)] = &[
    ("*", 1, op_mul),
    ("/", 1, op_div),
    ("+", 2, op_add),
    ("-", 2, op_sub),
    ("&", 3, op_and),
    ("|", 3, op_or),
    ("^", 3, op_xor),
    ("<<", 3, op_shl),
    (">>", 3, op_shr),
    ("=", 4, op_eq),
    ("<>", 4, op_ne),
    ("<", 4, op_lt),
    ("<=", 4, op_le),
    (">", 4, op_gt),
    (">=", 4, op_ge),
];

#[cfg(test)]
mod tests {
    use super::*;

    struct Sink(Vec<u8>);
    impl Host for Sink {
        fn out_char(&mut self, c: u8) {
            self.0.push(c);
        }
    }

    #[test]
    fn empty_script_is_ok_and_leaves_no_trace() {
        let mut interp = Interp::new(4096).unwrap();
        let mut host = Sink(Vec::new());
        assert_eq!(interp.run("", false, true, &mut host), Ok(0));
        assert!(host.0.is_empty());
    }

    #[test]
    fn top_level_variables_persist_across_separate_run_calls() {
        let mut interp = Interp::new(4096).unwrap();
        let mut host = Sink(Vec::new());
        interp.run("var a = 1", false, true, &mut host).unwrap();
        let (r, out) = {
            interp.run("print a", false, true, &mut host).unwrap();
            (0, String::from_utf8(host.0.clone()).unwrap())
        };
        let _ = r;
        assert_eq!(out, "1\n");
    }

    #[test]
    fn non_top_level_variables_are_invisible_afterwards() {
        let mut interp = Interp::new(4096).unwrap();
        let mut host = Sink(Vec::new());
        interp.run("var a = 1", false, false, &mut host).unwrap();
        let err = interp.run("print a", false, true, &mut host);
        assert_eq!(err, Err(TsError::Syntax));
    }

    #[test]
    fn user_procedure_call_computes_square() {
        let mut interp = Interp::new(8192).unwrap();
        let mut host = Sink(Vec::new());
        let out = interp.run("func sq(x) { return x*x }; print sq(7)", false, true, &mut host);
        assert_eq!(out, Ok(0));
        assert_eq!(String::from_utf8(host.0).unwrap(), "49\n");
    }

    #[test]
    fn builtin_arity_mismatch_is_reported_without_corrupting_the_stack() {
        let mut interp = Interp::new(8192).unwrap();
        fn add2(a: Value, b: Value, _c: Value, _d: Value) -> Value {
            a + b
        }
        interp.define("add2", SymbolKind::Builtin { arity: 2, func: add2 }, 0).unwrap();
        let mut host = Sink(Vec::new());
        let depth_before = interp.arena().val_depth();
        let err = interp.run("print add2(1,2,3)", false, true, &mut host);
        assert_eq!(err, Err(TsError::BadArgs));
        assert_eq!(interp.arena().val_depth(), depth_before);
    }

    #[test]
    fn too_many_formal_params_is_reported() {
        let mut interp = Interp::new(8192).unwrap();
        let mut host = Sink(Vec::new());
        let err = interp.run("func f(a,b,c,d,e) { return a }", false, true, &mut host);
        assert_eq!(err, Err(TsError::TooManyArgs));
    }

    #[test]
    fn unterminated_brace_body_is_a_syntax_error() {
        let mut interp = Interp::new(4096).unwrap();
        let mut host = Sink(Vec::new());
        let err = interp.run("if (1) { x = 1", false, true, &mut host);
        assert_eq!(err, Err(TsError::Syntax));
    }

    #[test]
    fn hex_literal_with_no_digits_is_syntax_error() {
        let mut interp = Interp::new(4096).unwrap();
        let mut host = Sink(Vec::new());
        let err = interp.run("print 0x", false, true, &mut host);
        assert_eq!(err, Err(TsError::Syntax));
    }

    #[test]
    fn host_defined_operator_can_shadow_the_default_division() {
        let mut interp = Interp::new(4096).unwrap();
        fn safe_div(a: Value, b: Value) -> Value {
            if b == 0 {
                -1
            } else {
                a / b
            }
        }
        interp.define("/", SymbolKind::Operator { level: 1, func: safe_div }, 0).unwrap();
        let mut host = Sink(Vec::new());
        interp.run("print 7/0", false, true, &mut host).unwrap();
        assert_eq!(String::from_utf8(host.0).unwrap(), "-1\n");
    }
}
