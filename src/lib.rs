//! A tiny embeddable scripting language for resource-constrained hosts.
//!
//! An [`Interp`] owns a single fixed-size [`arena::Arena`] that backs both
//! its symbol table and its value stack; a script never allocates outside
//! that budget. There is no AST and no bytecode: `var`, `if`, `while`,
//! `func`, and expressions are tokenized, parsed, and evaluated in one
//! pass, with control-flow bodies kept as unparsed text and re-lexed each
//! time they run.
//!
//! ```
//! use tinyscript::{Host, Interp};
//!
//! struct Stdout;
//! impl Host for Stdout {
//!     fn out_char(&mut self, c: u8) {
//!         print!("{}", c as char);
//!     }
//! }
//!
//! let mut interp = Interp::new(4096).unwrap();
//! let mut host = Stdout;
//! interp.run("var x = 6 * 7; print x", false, true, &mut host).unwrap();
//! ```

#![deny(unsafe_code)]

pub mod arena;
pub mod error;
mod expr;
pub mod interp;
pub mod lexer;
pub mod stdlib;
mod stmt;
pub mod strview;
pub mod symbol;

pub use error::TsError;
pub use interp::{Host, Interp};
pub use strview::StringView;
pub use symbol::{BuiltinFn, Keyword, OperatorFn, Symbol, SymbolKind, UserProc};

/// The scripting language's only scalar type: a machine-word signed
/// integer. There are no floats, no strings-as-values, and no booleans --
/// truth is "nonzero", exactly as every comparison and condition below
/// treats it.
pub type Value = i64;

/// Number of registered operator precedence levels. Levels 1-4 are
/// populated by [`Interp::new`]'s standard table (`*` `/`, `+` `-`, the
/// bitwise operators, the comparisons); level 5 is reserved for a host to
/// register its own loosest-binding operator.
pub const MAX_EXPR_LEVEL: u8 = 5;

/// Every builtin and user procedure call is filled into a fixed-size,
/// four-slot argument array before the call executes, regardless of its
/// declared arity -- this is what lets [`symbol::BuiltinFn`] be a plain
/// function pointer instead of a closure over a variable-length slice.
pub const MAX_BUILTIN_PARAMS: usize = 4;
